//! Operation batches and their tagged results.
//!
//! A batch is submitted with a single `execute` request. Results come back in
//! the same order; once one operation fails the wallet skips the rest of the
//! batch and reports [`OperationResult::Skipped`] for those positions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::session::CaipAccount;

/// Contract call described by contract address, function name and arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
	pub contract: String,
	pub method: String,
	#[serde(default)]
	pub args: Vec<Value>,
}

/// Contract call already encoded to a target, function selector and field args.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedCall {
	pub to: String,
	pub selector: String,
	#[serde(default)]
	pub args: Vec<String>,
}

/// What an authorization witness authorizes `caller` to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthwitContent {
	Call {
		caller: String,
		contract: String,
		method: String,
		#[serde(default)]
		args: Vec<Value>,
	},
	EncodedCall {
		caller: String,
		to: String,
		selector: String,
		#[serde(default)]
		args: Vec<String>,
	},
}

impl AuthwitContent {
	/// Wraps an encoded call as authwit content for `caller`.
	pub fn encoded(caller: impl Into<String>, call: EncodedCall) -> Self {
		Self::EncodedCall {
			caller: caller.into(),
			to: call.to,
			selector: call.selector,
			args: call.args,
		}
	}
}

/// Unit of work composed inside a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
	Call(Call),
	EncodedCall(EncodedCall),
	AddPrivateAuthwit { content: AuthwitContent },
	AddPublicAuthwit { content: AuthwitContent },
}

/// Operation submitted in an `execute` batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
	SendTransaction {
		account: CaipAccount,
		actions: Vec<Action>,
	},
	SimulateTransaction {
		account: CaipAccount,
		actions: Vec<Action>,
	},
	SimulateViews {
		account: CaipAccount,
		calls: Vec<Action>,
	},
	RegisterContract {
		chain: String,
		address: String,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		instance: Option<Value>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		artifact: Option<Value>,
	},
	RegisterSender {
		chain: String,
		address: String,
	},
}

impl Operation {
	/// Returns the `kind` tag this operation serializes with.
	pub fn kind(&self) -> &'static str {
		match self {
			Operation::SendTransaction { .. } => "send_transaction",
			Operation::SimulateTransaction { .. } => "simulate_transaction",
			Operation::SimulateViews { .. } => "simulate_views",
			Operation::RegisterContract { .. } => "register_contract",
			Operation::RegisterSender { .. } => "register_sender",
		}
	}
}

/// Result of one operation in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OperationResult {
	Ok {
		#[serde(default)]
		result: Value,
	},
	Failed {
		error: String,
	},
	/// Not attempted because an earlier operation in the batch failed.
	Skipped,
}

impl OperationResult {
	pub fn ok(result: Value) -> Self {
		Self::Ok { result }
	}

	pub fn failed(error: impl Into<String>) -> Self {
		Self::Failed {
			error: error.into(),
		}
	}

	pub fn is_ok(&self) -> bool {
		matches!(self, Self::Ok { .. })
	}

	pub fn is_skipped(&self) -> bool {
		matches!(self, Self::Skipped)
	}

	/// Returns the status tag (`ok`, `failed`, `skipped`).
	pub fn status(&self) -> &'static str {
		match self {
			Self::Ok { .. } => "ok",
			Self::Failed { .. } => "failed",
			Self::Skipped => "skipped",
		}
	}

	/// Returns the wallet-reported error message for a failed operation.
	pub fn error(&self) -> Option<&str> {
		match self {
			Self::Failed { error } => Some(error),
			_ => None,
		}
	}
}

/// Payload of a successful `simulate_views` operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateViewsResult {
	/// Raw field-encoded return values, one entry per call.
	#[serde(default)]
	pub encoded: Vec<Vec<String>>,
	/// Return values decoded against the contract ABI, one entry per call.
	#[serde(default)]
	pub decoded: Vec<Value>,
}
