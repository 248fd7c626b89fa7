//! Wallet reached through a local relay.
//!
//! Native consumers have no browser global to inspect. Instead the wallet
//! extension bridges its RPC object to a local WebSocket relay; a socket that
//! opens and greets with [`Hello`] counts as an installed extension.

use std::sync::Arc;
use std::time::Duration;

use azguard_protocol::Hello;

use crate::channel::Channel;
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::probe::{Extension, ExtensionProbe, LookupFuture};
use crate::transport::{TransportParts, WebSocketTransport};

/// Default relay endpoint.
pub const DEFAULT_RELAY_URL: &str = "ws://127.0.0.1:19988/azguard";

/// Default time allowed for the relay greeting.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(500);

/// Extension handle backed by a live [`Connection`].
pub struct ConnectedExtension {
	version: String,
	connection: Arc<Connection>,
}

impl ConnectedExtension {
	/// Reads the greeting from `parts`, then starts the connection.
	pub async fn handshake(mut parts: TransportParts, timeout: Duration) -> Result<Self> {
		let first = tokio::time::timeout(timeout, parts.receiver.recv())
			.await
			.map_err(|_| Error::Timeout(format!("no greeting within {}ms", timeout.as_millis())))?
			.ok_or(Error::ChannelClosed)?;

		let hello: Hello = serde_json::from_value(first)
			.map_err(|e| Error::ProtocolError(format!("expected greeting: {e}")))?;

		Ok(Self {
			version: hello.version,
			connection: Connection::spawn(parts),
		})
	}
}

impl Extension for ConnectedExtension {
	fn version(&self) -> &str {
		&self.version
	}

	fn create_client(&self) -> Arc<dyn Channel> {
		Arc::clone(&self.connection) as Arc<dyn Channel>
	}
}

/// Probe that detects the wallet by connecting to its WebSocket relay.
#[derive(Debug, Clone)]
pub struct RelayProbe {
	url: String,
	handshake_timeout: Duration,
}

impl RelayProbe {
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
		}
	}

	pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
		self.handshake_timeout = timeout;
		self
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	async fn try_connect(&self) -> Result<ConnectedExtension> {
		let parts = WebSocketTransport::connect(&self.url).await?;
		ConnectedExtension::handshake(parts, self.handshake_timeout).await
	}
}

impl Default for RelayProbe {
	fn default() -> Self {
		Self::new(DEFAULT_RELAY_URL)
	}
}

impl ExtensionProbe for RelayProbe {
	fn lookup(&self) -> LookupFuture<'_> {
		Box::pin(async move {
			match self.try_connect().await {
				Ok(extension) => Some(Arc::new(extension) as Arc<dyn Extension>),
				Err(e) => {
					tracing::trace!(url = %self.url, error = %e, "Relay not available");
					None
				}
			}
		})
	}
}
