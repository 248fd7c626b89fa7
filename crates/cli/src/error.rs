use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("Azguard wallet not detected at {endpoint}")]
	NotDetected { endpoint: String },

	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error("timeout after {ms}ms waiting for: {condition}")]
	Timeout { ms: u64, condition: String },

	#[error(transparent)]
	Wallet(#[from] azguard::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

impl CliError {
	/// Converts this error to the structured form printed on stdout.
	pub fn to_command_error(&self) -> CommandError {
		let code = match self {
			CliError::NotDetected { .. } => ErrorCode::NotInstalled,
			CliError::InvalidInput(_) => ErrorCode::InvalidInput,
			CliError::Timeout { .. } => ErrorCode::Timeout,
			CliError::Wallet(err) => wallet_code(err),
			CliError::Io(_) | CliError::Json(_) | CliError::Anyhow(_) => ErrorCode::InternalError,
		};

		let name = match self {
			CliError::Wallet(err) => err.error_name().map(str::to_string),
			_ => None,
		};

		CommandError {
			code,
			message: self.to_string(),
			name,
		}
	}
}

fn wallet_code(err: &azguard::Error) -> ErrorCode {
	use azguard::Error;

	match err {
		Error::NotInstalled => ErrorCode::NotInstalled,
		Error::NotConnected => ErrorCode::NotConnected,
		Error::Unauthorized(_) => ErrorCode::Unauthorized,
		Error::UnsupportedMethod(_) => ErrorCode::UnsupportedMethod,
		Error::OperationFailed(_) => ErrorCode::OperationFailed,
		Error::SimulationFailed(_) => ErrorCode::SimulationFailed,
		Error::InvalidParams(_) => ErrorCode::InvalidInput,
		Error::Timeout(_) => ErrorCode::Timeout,
		Error::Remote { .. } => ErrorCode::WalletError,
		_ => ErrorCode::InternalError,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_wallet_errors_keep_their_code() {
		let err = CliError::from(azguard::Error::Unauthorized("0x1".to_string()));
		let cmd = err.to_command_error();

		assert_eq!(cmd.code, ErrorCode::Unauthorized);
		assert!(cmd.message.contains("0x1"));
	}

	#[test]
	fn test_remote_errors_carry_name() {
		let err = CliError::from(azguard::Error::Remote {
			name: "SessionError".to_string(),
			message: "expired".to_string(),
		});
		let cmd = err.to_command_error();

		assert_eq!(cmd.code, ErrorCode::WalletError);
		assert_eq!(cmd.name.as_deref(), Some("SessionError"));
	}

	#[test]
	fn test_not_detected_maps_to_not_installed() {
		let err = CliError::NotDetected {
			endpoint: "ws://127.0.0.1:1".to_string(),
		};
		assert_eq!(err.to_command_error().code, ErrorCode::NotInstalled);
	}
}
