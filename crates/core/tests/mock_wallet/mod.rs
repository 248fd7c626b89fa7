// Scripted in-memory wallet used by the integration tests.
//
// Implements the probe, extension and channel boundaries. Operation batches
// honour the skip-on-failure contract: after the first failed operation every
// remaining position reports `skipped`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use azguard::{
	CaipAccount, Channel, Error, Extension, ExtensionProbe, Operation, OperationResult,
	PermissionGrant, Result, Session,
};
use azguard_runtime::{LookupFuture, PushCallback, RequestFuture};
use parking_lot::Mutex;
use serde_json::{Value, json};

pub const TX_HASH: &str = "0x7a11ce";

#[derive(Default)]
struct WalletState {
	sessions: HashMap<String, Session>,
	next_session: u32,
	/// Operation kind that fails, with the reported message
	failing_kind: Option<(String, String)>,
}

pub struct MockWallet {
	version: String,
	accounts: Vec<CaipAccount>,
	state: Mutex<WalletState>,
	subscribers: Mutex<HashMap<String, Vec<PushCallback>>>,
	requests: Mutex<Vec<(String, Vec<Value>)>>,
}

impl MockWallet {
	pub fn new(version: &str, accounts: &[&str]) -> Arc<Self> {
		Arc::new(Self {
			version: version.to_string(),
			accounts: accounts.iter().map(|a| CaipAccount::from(*a)).collect(),
			state: Mutex::new(WalletState::default()),
			subscribers: Mutex::new(HashMap::new()),
			requests: Mutex::new(Vec::new()),
		})
	}

	/// Wallet reporting the client's own version.
	pub fn compatible(accounts: &[&str]) -> Arc<Self> {
		Self::new(azguard_runtime::CLIENT_VERSION, accounts)
	}

	/// Registers a live session the wallet will report from `get_session`.
	pub fn insert_session(&self, session: Session) {
		self.state.lock().sessions.insert(session.id.clone(), session);
	}

	/// Makes every operation of `kind` fail with `message`.
	pub fn fail_operations(&self, kind: &str, message: &str) {
		self.state.lock().failing_kind = Some((kind.to_string(), message.to_string()));
	}

	/// Delivers a push notification to the client's subscribers.
	pub fn push(&self, event: &str, params: Vec<Value>) {
		let callbacks = self
			.subscribers
			.lock()
			.get(event)
			.cloned()
			.unwrap_or_default();
		for callback in callbacks {
			callback(params.clone());
		}
	}

	pub fn requests(&self) -> Vec<(String, Vec<Value>)> {
		self.requests.lock().clone()
	}

	pub fn requests_for(&self, method: &str) -> Vec<Vec<Value>> {
		self.requests
			.lock()
			.iter()
			.filter(|(m, _)| m == method)
			.map(|(_, params)| params.clone())
			.collect()
	}

	pub fn subscriber_count(&self, event: &str) -> usize {
		self.subscribers.lock().get(event).map_or(0, Vec::len)
	}

	fn handle(&self, method: &str, params: &[Value]) -> Result<Value> {
		match method {
			"connect" => {
				let mut permissions: Vec<PermissionGrant> =
					serde_json::from_value(params[1].clone()).unwrap();
				if let Some(optional) = params.get(2).filter(|v| !v.is_null()) {
					permissions.extend(serde_json::from_value::<Vec<PermissionGrant>>(optional.clone()).unwrap());
				}

				let mut state = self.state.lock();
				state.next_session += 1;
				let session = Session {
					id: format!("session-{}", state.next_session),
					accounts: self.accounts.clone(),
					permissions,
				};
				state.sessions.insert(session.id.clone(), session.clone());
				Ok(serde_json::to_value(session)?)
			}
			"get_session" => {
				let id = params[0].as_str().unwrap_or_default();
				Ok(serde_json::to_value(self.state.lock().sessions.get(id))?)
			}
			"close_session" => {
				let id = params[0].as_str().unwrap_or_default().to_string();
				self.state.lock().sessions.remove(&id);
				self.push("session_closed", vec![json!(id)]);
				Ok(Value::Null)
			}
			"get_wallet_info" => Ok(json!({"name": "Azguard", "version": self.version})),
			"execute" => {
				let id = params[0].as_str().unwrap_or_default();
				if !self.state.lock().sessions.contains_key(id) {
					return Err(Error::Remote {
						name: "Error".to_string(),
						message: format!("Session {id} not found"),
					});
				}
				let operations: Vec<Operation> = serde_json::from_value(params[1].clone())?;
				Ok(serde_json::to_value(self.run_batch(&operations))?)
			}
			other => Err(Error::Remote {
				name: "Error".to_string(),
				message: format!("Unknown method {other}"),
			}),
		}
	}

	fn run_batch(&self, operations: &[Operation]) -> Vec<OperationResult> {
		let failing = self.state.lock().failing_kind.clone();
		let mut failed = false;

		operations
			.iter()
			.map(|op| {
				if failed {
					return OperationResult::Skipped;
				}
				if let Some((kind, message)) = &failing {
					if op.kind() == kind {
						failed = true;
						return OperationResult::failed(message.clone());
					}
				}
				match op {
					Operation::SendTransaction { .. } => OperationResult::ok(json!(TX_HASH)),
					Operation::SimulateViews { calls, .. } => OperationResult::ok(json!({
						"encoded": calls.iter().enumerate().map(|(i, _)| vec![format!("0x{i}")]).collect::<Vec<_>>(),
						"decoded": calls.iter().enumerate().map(|(i, _)| json!(i)).collect::<Vec<_>>(),
					})),
					_ => OperationResult::ok(Value::Null),
				}
			})
			.collect()
	}
}

impl Channel for MockWallet {
	fn request(&self, method: &str, params: Vec<Value>) -> RequestFuture<'_> {
		self.requests.lock().push((method.to_string(), params.clone()));
		let result = self.handle(method, &params);
		Box::pin(async move { result })
	}

	fn on(&self, event: &str, callback: PushCallback) {
		self.subscribers
			.lock()
			.entry(event.to_string())
			.or_default()
			.push(callback);
	}
}

pub struct MockExtension(pub Arc<MockWallet>);

impl Extension for MockExtension {
	fn version(&self) -> &str {
		&self.0.version
	}

	fn create_client(&self) -> Arc<dyn Channel> {
		Arc::clone(&self.0) as Arc<dyn Channel>
	}
}

/// Probe that finds `wallet` on every lookup, or never when `None`.
pub struct MockProbe {
	wallet: Option<Arc<MockWallet>>,
}

impl MockProbe {
	pub fn installed(wallet: &Arc<MockWallet>) -> Self {
		Self {
			wallet: Some(Arc::clone(wallet)),
		}
	}

	pub fn absent() -> Self {
		Self { wallet: None }
	}
}

impl ExtensionProbe for MockProbe {
	fn lookup(&self) -> LookupFuture<'_> {
		let found = self
			.wallet
			.as_ref()
			.map(|w| Arc::new(MockExtension(Arc::clone(w))) as Arc<dyn Extension>);
		Box::pin(async move { found })
	}
}
