//! Channel - the RPC handle obtained from a detected wallet extension.
//!
//! The wallet implements [`Channel`]; the client only depends on this boundary.
//! Requests are positional (`request(method, [args..])`) and pushes are
//! delivered to callbacks registered with [`Channel::on`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;

/// Boxed future returned by [`Channel::request`].
pub type RequestFuture<'a> = Pin<Box<dyn Future<Output = Result<Value>> + Send + 'a>>;

/// Callback receiving the positional params of a push notification.
pub type PushCallback = Arc<dyn Fn(Vec<Value>) + Send + Sync>;

/// Request/response and subscription primitive exposed by the wallet.
pub trait Channel: Send + Sync {
	/// Sends a request and awaits the wallet's response.
	fn request(&self, method: &str, params: Vec<Value>) -> RequestFuture<'_>;

	/// Subscribes `callback` to the push notification named `event`.
	fn on(&self, event: &str, callback: PushCallback);
}

impl<'a> dyn Channel + 'a {
	/// Sends a request and deserializes the response into `R`.
	pub async fn send<R: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> Result<R> {
		let response = self.request(method, params).await?;
		serde_json::from_value(response).map_err(Into::into)
	}

	/// Sends a request whose response carries no data.
	pub async fn send_no_result(&self, method: &str, params: Vec<Value>) -> Result<()> {
		let _: Value = self.request(method, params).await?;
		Ok(())
	}
}
