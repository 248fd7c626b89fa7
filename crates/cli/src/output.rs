//! Result envelope printed on stdout by every command.
//!
//! ```json
//! { "ok": true, "command": "accounts", "data": ["aztec:31337:0x..."] }
//! ```
//!
//! On failure `data` is replaced by
//! `"error": { "code": "NOT_CONNECTED", "message": "..." }` and the process
//! exits with status 1.

use std::fmt;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	NotInstalled,
	NotConnected,
	Unauthorized,
	UnsupportedMethod,
	OperationFailed,
	SimulationFailed,
	InvalidInput,
	WalletError,
	Timeout,
	InternalError,
}

impl fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			ErrorCode::NotInstalled => "NOT_INSTALLED",
			ErrorCode::NotConnected => "NOT_CONNECTED",
			ErrorCode::Unauthorized => "UNAUTHORIZED",
			ErrorCode::UnsupportedMethod => "UNSUPPORTED_METHOD",
			ErrorCode::OperationFailed => "OPERATION_FAILED",
			ErrorCode::SimulationFailed => "SIMULATION_FAILED",
			ErrorCode::InvalidInput => "INVALID_INPUT",
			ErrorCode::WalletError => "WALLET_ERROR",
			ErrorCode::Timeout => "TIMEOUT",
			ErrorCode::InternalError => "INTERNAL_ERROR",
		};
		f.write_str(s)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandError {
	pub code: ErrorCode,
	pub message: String,
	/// Error name reported by the wallet, if any
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandResult<T: Serialize> {
	pub ok: bool,
	pub command: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,
}

impl<T: Serialize> CommandResult<T> {
	pub fn success(command: impl Into<String>, data: T) -> Self {
		Self {
			ok: true,
			command: command.into(),
			data: Some(data),
			error: None,
		}
	}

	pub fn failure(command: impl Into<String>, error: CommandError) -> Self {
		Self {
			ok: false,
			command: command.into(),
			data: None,
			error: Some(error),
		}
	}
}

pub fn print_result<T: Serialize>(result: &CommandResult<T>) {
	if let Ok(json) = serde_json::to_string_pretty(result) {
		println!("{json}");
	}
}

/// One-line error summary for humans.
pub fn print_error_stderr(error: &CommandError) {
	let _ = writeln!(io::stderr().lock(), "error [{}]: {}", error.code, error.message);
}
