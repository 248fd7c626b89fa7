//! Extension detection.
//!
//! The wallet announces itself through a well-known handle exposing its version
//! and a factory for RPC channels. [`ExtensionProbe`] abstracts how that handle
//! is looked up, so the client can be driven by a browser global, a local relay
//! or a test double.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::channel::Channel;

/// Interval between presence checks while waiting for the extension.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Boxed future returned by [`ExtensionProbe::lookup`].
pub type LookupFuture<'a> = Pin<Box<dyn Future<Output = Option<Arc<dyn Extension>>> + Send + 'a>>;

/// Handle exposed by an installed wallet extension.
pub trait Extension: Send + Sync {
	/// Version string reported by the wallet.
	fn version(&self) -> &str;

	/// Creates an RPC channel bound to the wallet.
	fn create_client(&self) -> Arc<dyn Channel>;
}

/// Looks up the extension handle once, without waiting.
pub trait ExtensionProbe: Send + Sync {
	fn lookup(&self) -> LookupFuture<'_>;
}

/// Polls `probe` every [`POLL_INTERVAL`] until it finds the extension or `timeout` elapses.
///
/// Each tick waits first, then checks. The remaining budget is decremented by one
/// tick per miss and the wait gives up as soon as it reaches zero or below, so a
/// zero timeout checks exactly once and the call never hangs.
pub async fn wait_for_extension(
	probe: &dyn ExtensionProbe,
	timeout: Duration,
) -> Option<Arc<dyn Extension>> {
	let tick = POLL_INTERVAL.as_millis() as i64;
	let mut remaining = i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX);

	loop {
		tokio::time::sleep(POLL_INTERVAL).await;

		if let Some(extension) = probe.lookup().await {
			tracing::debug!(version = extension.version(), "Wallet extension detected");
			return Some(extension);
		}

		remaining -= tick;
		if remaining <= 0 {
			tracing::debug!(timeout_ms = timeout.as_millis() as u64, "Wallet extension not detected");
			return None;
		}
	}
}
