//! Azguard Runtime - channel, detection, transport and storage plumbing
//!
//! This crate provides the low-level infrastructure the wallet client sits on:
//!
//! - **Channel**: the request/push boundary implemented by the wallet
//! - **Probe**: detecting the extension and polling for it with a timeout
//! - **Compatibility**: client/wallet version checks
//! - **Connection**: JSON-RPC request/response correlation and push dispatch
//! - **Transport**: length-prefixed pipes and WebSocket frames
//! - **Storage**: persisted session identifiers
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │     azguard     │  Session store + wallet-RPC adapter
//! └────────┬────────┘
//!          │ Channel / ExtensionProbe / SessionStorage
//! ┌────────▼────────┐
//! │ azguard-runtime │
//! │  ┌───────────┐  │
//! │  │ Relay     │  │  Detection over a local relay
//! │  └─────┬─────┘  │
//! │  ┌─────▼─────┐  │
//! │  │ Connection│  │  JSON-RPC correlation
//! │  └─────┬─────┘  │
//! │  ┌─────▼─────┐  │
//! │  │ Transport │  │  Pipe/WebSocket frames
//! │  └───────────┘  │
//! └─────────────────┘
//! ```

pub mod channel;
pub mod compat;
pub mod connection;
pub mod error;
pub mod probe;
pub mod relay;
pub mod storage;
pub mod transport;

// Re-export key types at crate root
pub use channel::{Channel, PushCallback, RequestFuture};
pub use compat::{CLIENT_VERSION, is_compatible, versions_compatible};
pub use connection::Connection;
pub use error::{Error, Result};
pub use probe::{Extension, ExtensionProbe, LookupFuture, POLL_INTERVAL, wait_for_extension};
pub use relay::{ConnectedExtension, DEFAULT_RELAY_URL, RelayProbe};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, session_key};
pub use transport::{PipeTransport, TransportParts, WebSocketTransport};
