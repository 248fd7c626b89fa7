//! Aztec wallet-RPC adapter.
//!
//! Maps the dapp-facing `aztec_*` method surface onto [`AzguardClient`]
//! operations. Accounts cross this boundary as bare addresses; the client keeps
//! them chain-qualified.

use std::fmt;
use std::str::FromStr;

use azguard_protocol::{
	Action, AuthwitContent, CaipAccount, DappMetadata, EncodedCall, Operation, OperationResult,
	PermissionGrant, SimulateViewsResult,
};
use azguard_runtime::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::AzguardClient;
use crate::handlers::Subscription;

/// Chains requested by [`AdapterOptions::new`].
pub const DEFAULT_CHAINS: &[&str] = &["aztec:31337", "aztec:11155111"];

/// Operation kinds requested by [`AdapterOptions::new`].
pub const DEFAULT_OPERATION_KINDS: &[&str] = &[
	"send_transaction",
	"add_private_authwit",
	"call",
	"encoded_call",
	"simulate_views",
];

/// What the adapter asks for when a dapp requests accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterOptions {
	/// Page origin, used as the dapp name and url.
	pub origin: String,
	pub chains: Vec<String>,
	pub methods: Vec<String>,
}

impl AdapterOptions {
	pub fn new(origin: impl Into<String>) -> Self {
		Self {
			origin: origin.into(),
			chains: DEFAULT_CHAINS.iter().map(|c| c.to_string()).collect(),
			methods: DEFAULT_OPERATION_KINDS.iter().map(|m| m.to_string()).collect(),
		}
	}

	pub fn dapp_metadata(&self) -> DappMetadata {
		DappMetadata::new(&self.origin).with_url(&self.origin)
	}

	pub fn permission(&self) -> PermissionGrant {
		PermissionGrant::new()
			.with_chains(self.chains.iter().cloned())
			.with_methods(self.methods.iter().cloned())
	}
}

/// Methods exposed to dapps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletMethod {
	RequestAccounts,
	Accounts,
	SendTransaction,
	Call,
	WatchAssets,
}

impl WalletMethod {
	pub const ALL: [WalletMethod; 5] = [
		WalletMethod::RequestAccounts,
		WalletMethod::Accounts,
		WalletMethod::SendTransaction,
		WalletMethod::Call,
		WalletMethod::WatchAssets,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			WalletMethod::RequestAccounts => "aztec_requestAccounts",
			WalletMethod::Accounts => "aztec_accounts",
			WalletMethod::SendTransaction => "aztec_sendTransaction",
			WalletMethod::Call => "aztec_call",
			WalletMethod::WatchAssets => "wallet_watchAssets",
		}
	}
}

impl FromStr for WalletMethod {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		WalletMethod::ALL
			.into_iter()
			.find(|m| m.as_str() == s)
			.ok_or_else(|| Error::UnsupportedMethod(s.to_string()))
	}
}

impl fmt::Display for WalletMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// `{method, params}` as sent by a dapp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
	pub method: String,
	#[serde(default)]
	pub params: Vec<Value>,
}

impl RpcRequest {
	pub fn new(method: impl Into<String>, params: Vec<Value>) -> Self {
		Self {
			method: method.into(),
			params,
		}
	}
}

/// Authorization witness for `caller` to perform `action`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthWitness {
	pub caller: String,
	pub action: EncodedCall,
}

/// Params of `aztec_sendTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionRequest {
	pub from: String,
	#[serde(default)]
	pub calls: Vec<EncodedCall>,
	#[serde(default)]
	pub auth_witnesses: Vec<AuthWitness>,
}

/// Params of `aztec_call`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRequest {
	pub from: String,
	#[serde(default)]
	pub calls: Vec<EncodedCall>,
}

/// Builds the `send_transaction` operation: authwit actions first, then calls.
pub fn send_transaction_operation(
	account: CaipAccount,
	request: &SendTransactionRequest,
) -> Operation {
	let authwits = request.auth_witnesses.iter().map(|witness| Action::AddPrivateAuthwit {
		content: AuthwitContent::encoded(&witness.caller, witness.action.clone()),
	});
	let calls = request.calls.iter().cloned().map(Action::EncodedCall);

	Operation::SendTransaction {
		account,
		actions: authwits.chain(calls).collect(),
	}
}

/// Builds the `simulate_views` operation with one encoded call per call.
pub fn simulate_views_operation(account: CaipAccount, request: &CallRequest) -> Operation {
	Operation::SimulateViews {
		account,
		calls: request.calls.iter().cloned().map(Action::EncodedCall).collect(),
	}
}

/// Dapp-facing wallet-RPC surface over an [`AzguardClient`].
pub struct AztecWalletAdapter {
	client: AzguardClient,
	options: AdapterOptions,
	_subscriptions: Vec<Subscription>,
}

impl AztecWalletAdapter {
	pub fn new(client: AzguardClient, options: AdapterOptions) -> Self {
		// Re-emission towards dapps is not defined yet; the subscriptions only trace.
		let subscriptions = vec![
			client.on_accounts_changed().subscribe(|accounts| {
				tracing::debug!(accounts = accounts.len(), "Wallet accounts changed");
				Ok(())
			}),
			client.on_disconnected().subscribe(|_| {
				tracing::debug!("Wallet session closed");
				Ok(())
			}),
		];

		Self {
			client,
			options,
			_subscriptions: subscriptions,
		}
	}

	pub fn client(&self) -> &AzguardClient {
		&self.client
	}

	pub fn options(&self) -> &AdapterOptions {
		&self.options
	}

	/// Dispatches `request` to the matching method with its params spread positionally.
	pub async fn request(&self, request: RpcRequest) -> Result<Value> {
		let method: WalletMethod = request.method.parse()?;
		tracing::debug!(method = %method, params = request.params.len(), "Wallet RPC request");

		match method {
			WalletMethod::RequestAccounts => Ok(serde_json::to_value(self.request_accounts().await?)?),
			WalletMethod::Accounts => Ok(serde_json::to_value(self.accounts())?),
			WalletMethod::SendTransaction => {
				let params: SendTransactionRequest = param(&request.params, 0, method)?;
				Ok(Value::String(self.send_transaction(&params).await?))
			}
			WalletMethod::Call => {
				let params: CallRequest = param(&request.params, 0, method)?;
				Ok(serde_json::to_value(self.call(&params).await?)?)
			}
			WalletMethod::WatchAssets => {
				self.watch_assets();
				Ok(Value::Null)
			}
		}
	}

	/// Connects with the adapter's dapp metadata and optional permission, then
	/// returns the approved addresses.
	pub async fn request_accounts(&self) -> Result<Vec<String>> {
		let permission = [self.options.permission()];
		self.client
			.connect(&self.options.dapp_metadata(), &[], Some(&permission))
			.await?;
		Ok(self.accounts())
	}

	/// Approved addresses without their chain prefix.
	pub fn accounts(&self) -> Vec<String> {
		self.client
			.accounts()
			.iter()
			.map(|account| account.address().to_string())
			.collect()
	}

	/// Sends a transaction and returns its hash.
	pub async fn send_transaction(&self, request: &SendTransactionRequest) -> Result<String> {
		let account = self.resolve_account(&request.from)?;
		let operation = send_transaction_operation(account, request);

		match self.execute_single(operation).await? {
			OperationResult::Ok { result } => serde_json::from_value(result)
				.map_err(|e| Error::ProtocolError(format!("unexpected transaction hash: {e}"))),
			OperationResult::Failed { error } => Err(Error::OperationFailed(error)),
			OperationResult::Skipped => {
				Err(Error::OperationFailed("transaction was skipped".to_string()))
			}
		}
	}

	/// Simulates view calls and returns one result array per call.
	pub async fn call(&self, request: &CallRequest) -> Result<Vec<Vec<String>>> {
		let account = self.resolve_account(&request.from)?;
		let operation = simulate_views_operation(account, request);

		match self.execute_single(operation).await? {
			OperationResult::Ok { result } => {
				let views: SimulateViewsResult = serde_json::from_value(result)
					.map_err(|e| Error::ProtocolError(format!("unexpected simulation result: {e}")))?;
				Ok(views.encoded)
			}
			OperationResult::Failed { error } => Err(Error::SimulationFailed(error)),
			OperationResult::Skipped => {
				Err(Error::SimulationFailed("simulation was skipped".to_string()))
			}
		}
	}

	/// Accepted and ignored.
	pub fn watch_assets(&self) {}

	/// Finds the approved account whose qualified identifier ends with `address`.
	fn resolve_account(&self, address: &str) -> Result<CaipAccount> {
		self.client
			.accounts()
			.into_iter()
			.find(|account| account.matches_address(address))
			.ok_or_else(|| Error::Unauthorized(address.to_string()))
	}

	async fn execute_single(&self, operation: Operation) -> Result<OperationResult> {
		self.client
			.execute(std::slice::from_ref(&operation))
			.await?
			.into_iter()
			.next()
			.ok_or_else(|| Error::ProtocolError("empty result batch".to_string()))
	}
}

impl fmt::Debug for AztecWalletAdapter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AztecWalletAdapter")
			.field("client", &self.client)
			.field("options", &self.options)
			.finish()
	}
}

fn param<T: DeserializeOwned>(params: &[Value], index: usize, method: WalletMethod) -> Result<T> {
	let value = params
		.get(index)
		.cloned()
		.ok_or_else(|| Error::InvalidParams(format!("{method}: missing parameter {index}")))?;
	serde_json::from_value(value).map_err(|e| Error::InvalidParams(format!("{method}: {e}")))
}
