//! Error types for the Azguard runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the wallet client, adapter and transports.
#[derive(Debug, Error)]
pub enum Error {
	/// No wallet extension was detected, so there is no RPC channel.
	#[error("Azguard wallet is not installed")]
	NotInstalled,

	/// A channel is bound but no session is held.
	#[error("Azguard wallet is not connected")]
	NotConnected,

	/// The requested account is not among the session's approved accounts.
	#[error("Unauthorized account: {0}")]
	Unauthorized(String),

	/// Adapter dispatch miss.
	#[error("Unsupported method: {0}")]
	UnsupportedMethod(String),

	/// A submitted operation did not complete with status `ok`.
	#[error("Operation failed: {0}")]
	OperationFailed(String),

	/// A view simulation did not complete with status `ok`.
	#[error("Simulation failed: {0}")]
	SimulationFailed(String),

	/// Malformed arguments passed to an adapter method.
	#[error("Invalid params: {0}")]
	InvalidParams(String),

	/// Error reported by the wallet for a request.
	#[error("{name}: {message}")]
	Remote {
		/// Error type name (defaults to "Error")
		name: String,
		message: String,
	},

	/// Failed to establish a connection with the wallet relay.
	#[error("Failed to connect to wallet relay: {0}")]
	ConnectionFailed(String),

	/// Transport-level error (socket or pipe).
	#[error("Transport error: {0}")]
	TransportError(String),

	/// Protocol-level error (unexpected frame or payload shape).
	#[error("Protocol error: {0}")]
	ProtocolError(String),

	/// Channel closed before a response arrived.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,

	/// Session storage could not be read or written.
	#[error("Storage error: {0}")]
	Storage(String),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// Timeout waiting for operation.
	#[error("Timeout: {0}")]
	Timeout(String),
}

impl Error {
	/// Returns true if no wallet channel is bound.
	pub fn is_not_installed(&self) -> bool {
		matches!(self, Error::NotInstalled)
	}

	/// Returns true if the call required a session and none was held.
	pub fn is_not_connected(&self) -> bool {
		matches!(self, Error::NotConnected)
	}

	/// Returns true if the failure came from the operation batch itself.
	pub fn is_operation_failure(&self) -> bool {
		matches!(self, Error::OperationFailed(_) | Error::SimulationFailed(_))
	}

	/// Returns the error name if this is a Remote error.
	pub fn error_name(&self) -> Option<&str> {
		match self {
			Error::Remote { name, .. } => Some(name),
			_ => None,
		}
	}
}
