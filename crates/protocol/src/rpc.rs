//! JSON-RPC frames exchanged with the wallet relay.
//!
//! # Message Flow
//!
//! 1. The relay greets every new socket with a [`Hello`] carrying the wallet version
//! 2. The client sends [`Request`]s with sequential ids
//! 3. The relay answers each with a [`Response`] (result or error)
//! 4. At any time the relay may send a [`PushEvent`] (`session_updated`, `session_closed`)

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// RPC method names understood by the wallet.
pub mod methods {
	pub const CONNECT: &str = "connect";
	pub const CLOSE_SESSION: &str = "close_session";
	pub const EXECUTE: &str = "execute";
	pub const GET_WALLET_INFO: &str = "get_wallet_info";
	pub const GET_SESSION: &str = "get_session";
}

/// Push notifications emitted by the wallet.
pub mod events {
	pub const SESSION_UPDATED: &str = "session_updated";
	pub const SESSION_CLOSED: &str = "session_closed";
}

/// Greeting sent by the relay when a socket opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hello {
	pub version: String,
}

/// Request sent to the wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
	/// Unique request ID for correlating responses
	pub id: u32,
	pub method: String,
	/// Positional arguments
	#[serde(default)]
	pub params: Vec<Value>,
}

/// Response from the wallet, carrying either `result` or `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
	pub id: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<ErrorPayload>,
}

/// Error reported by the wallet for a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
}

/// Server-initiated notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushEvent {
	pub event: String,
	#[serde(default)]
	pub params: Vec<Value>,
}

/// Any frame the relay may send.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
	/// Has an `id` field
	Response(Response),
	/// Has an `event` field
	Push(PushEvent),
	Hello(Hello),
	/// Forward-compatible catch-all
	Unknown(Value),
}
