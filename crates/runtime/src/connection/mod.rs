//! JSON-RPC connection to the wallet.
//!
//! Implements [`Channel`] on top of a [`TransportParts`] pair:
//! - Generating unique request IDs
//! - Correlating responses with pending requests
//! - Distinguishing pushes from responses
//! - Fanning pushes out to `on` subscribers
//!
//! # Message Flow
//!
//! 1. Caller invokes `request()` with method and positional params
//! 2. Connection generates a unique ID and parks a oneshot sender
//! 3. Request is serialized and queued on the transport
//! 4. The run loop receives the response and completes the oneshot
//! 5. Pushes (`{event, params}`) are delivered to subscribers in arrival order

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicU32, Ordering};
use std::task::{Context, Poll};

use azguard_protocol::{ErrorPayload, Message, PushEvent, Request};
use parking_lot::Mutex as ParkingLotMutex;
use serde_json::Value;
use tokio::sync::Mutex as TokioMutex;
use tokio::sync::{mpsc, oneshot};

use crate::channel::{Channel, PushCallback, RequestFuture};
use crate::error::{Error, Result};
use crate::transport::TransportParts;

/// Pending request callbacks keyed by request ID.
type CallbackMap = Arc<TokioMutex<HashMap<u32, oneshot::Sender<Result<Value>>>>>;

/// RAII guard ensuring callback cleanup when a request future is dropped.
struct CancelGuard {
	id: u32,
	callbacks: CallbackMap,
	completed: bool,
}

impl CancelGuard {
	fn new(id: u32, callbacks: CallbackMap) -> Self {
		Self {
			id,
			callbacks,
			completed: false,
		}
	}

	fn complete(&mut self) {
		self.completed = true;
	}
}

impl Drop for CancelGuard {
	fn drop(&mut self) {
		if self.completed {
			return;
		}

		let id = self.id;
		let callbacks = Arc::clone(&self.callbacks);

		if let Ok(handle) = tokio::runtime::Handle::try_current() {
			handle.spawn(async move {
				if callbacks.lock().await.remove(&id).is_some() {
					tracing::debug!(id, "CancelGuard: removed orphaned callback");
				}
			});
		}
	}
}

/// Future awaiting one response, cleaning up its callback if dropped early.
struct ResponseFuture {
	rx: oneshot::Receiver<Result<Value>>,
	guard: CancelGuard,
}

impl Future for ResponseFuture {
	type Output = Result<Value>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.rx).poll(cx) {
			Poll::Ready(result) => {
				self.guard.complete();
				Poll::Ready(result.map_err(|_| Error::ChannelClosed).and_then(|r| r))
			}
			Poll::Pending => Poll::Pending,
		}
	}
}

/// Receiving side handed to the run loop.
struct Inbound {
	frames: mpsc::UnboundedReceiver<Value>,
	/// Resolves once the owning [`Connection`] is dropped
	closed: oneshot::Receiver<()>,
}

/// JSON-RPC connection to the wallet.
///
/// Uses sequential request IDs and oneshot channels for correlation. Dropping
/// the last handle closes the outbound side of the transport and stops the run
/// loop.
pub struct Connection {
	/// Sequential request ID counter
	last_id: AtomicU32,
	/// Pending request callbacks keyed by request ID
	callbacks: CallbackMap,
	/// Outbound frames, drained by the transport writer
	outbound_tx: mpsc::UnboundedSender<Value>,
	/// Inbound frames (taken by run())
	inbound: TokioMutex<Option<Inbound>>,
	/// Dropped with the connection, signalling the run loop
	_closed_tx: oneshot::Sender<()>,
	/// Push subscribers keyed by event name
	subscribers: ParkingLotMutex<HashMap<String, Vec<PushCallback>>>,
}

impl Connection {
	/// Creates a connection over `parts`. Call [`run`](Self::run) to start reading.
	pub fn new(parts: TransportParts) -> Self {
		let TransportParts { sender, receiver } = parts;
		let (closed_tx, closed_rx) = oneshot::channel();

		Self {
			last_id: AtomicU32::new(0),
			callbacks: Arc::new(TokioMutex::new(HashMap::new())),
			outbound_tx: sender,
			inbound: TokioMutex::new(Some(Inbound {
				frames: receiver,
				closed: closed_rx,
			})),
			_closed_tx: closed_tx,
			subscribers: ParkingLotMutex::new(HashMap::new()),
		}
	}

	/// Creates a connection and spawns its run loop.
	///
	/// The run loop only holds a weak reference, so the transport is released
	/// when the returned handle and its clones are dropped.
	pub fn spawn(parts: TransportParts) -> Arc<Self> {
		let connection = Arc::new(Self::new(parts));
		tokio::spawn(Self::run(Arc::downgrade(&connection)));
		connection
	}

	/// Reads frames until the transport closes or the connection is dropped,
	/// then fails all pending requests.
	pub async fn run(connection: Weak<Self>) {
		let Some(strong) = connection.upgrade() else {
			return;
		};
		let Some(Inbound { mut frames, mut closed }) = strong.inbound.lock().await.take() else {
			tracing::warn!("Connection run loop already started");
			return;
		};
		let callbacks = Arc::clone(&strong.callbacks);
		drop(strong);

		loop {
			let value = tokio::select! {
				frame = frames.recv() => match frame {
					Some(value) => value,
					None => {
						tracing::debug!("Transport closed");
						break;
					}
				},
				_ = &mut closed => {
					tracing::debug!("Connection dropped, stopping run loop");
					break;
				}
			};
			let Some(strong) = connection.upgrade() else {
				break;
			};

			let message = match serde_json::from_value::<Message>(value) {
				Ok(message) => message,
				Err(e) => {
					tracing::warn!(error = %e, "Dropping undecodable frame");
					continue;
				}
			};
			if let Err(e) = strong.dispatch(message).await {
				tracing::warn!(error = %e, "Failed to dispatch frame");
			}
		}

		let pending: Vec<_> = callbacks.lock().await.drain().collect();
		if !pending.is_empty() {
			tracing::debug!(pending = pending.len(), "Failing pending requests");
		}
		for (_, tx) in pending {
			let _ = tx.send(Err(Error::ChannelClosed));
		}
	}

	/// Sends a request to the wallet and awaits the response.
	pub async fn send_message(&self, method: &str, params: Vec<Value>) -> Result<Value> {
		let id = self.last_id.fetch_add(1, Ordering::SeqCst);

		tracing::debug!(id, method, "Sending request");

		let (tx, rx) = oneshot::channel();
		self.callbacks.lock().await.insert(id, tx);

		let guard = CancelGuard::new(id, Arc::clone(&self.callbacks));

		let request = Request {
			id,
			method: method.to_string(),
			params,
		};

		self.outbound_tx
			.send(serde_json::to_value(&request)?)
			.map_err(|_| Error::ChannelClosed)?;

		ResponseFuture { rx, guard }.await
	}

	/// Routes one inbound frame.
	pub(crate) async fn dispatch(&self, message: Message) -> Result<()> {
		match message {
			Message::Response(response) => {
				tracing::debug!(id = response.id, "Received response");

				let Some(tx) = self.callbacks.lock().await.remove(&response.id) else {
					return Err(Error::ProtocolError(format!(
						"Cannot find request to respond: id={}",
						response.id
					)));
				};

				let result = match response.error {
					Some(payload) => Err(parse_protocol_error(payload)),
					None => Ok(response.result.unwrap_or(Value::Null)),
				};
				let _ = tx.send(result);
				Ok(())
			}
			Message::Push(push) => {
				self.dispatch_push(push);
				Ok(())
			}
			Message::Hello(hello) => {
				tracing::debug!(version = %hello.version, "Ignoring repeated greeting");
				Ok(())
			}
			Message::Unknown(value) => {
				tracing::debug!(frame = %value, "Ignoring unknown frame");
				Ok(())
			}
		}
	}

	fn dispatch_push(&self, push: PushEvent) {
		let callbacks: Vec<PushCallback> = self
			.subscribers
			.lock()
			.get(&push.event)
			.cloned()
			.unwrap_or_default();

		tracing::debug!(event = %push.event, subscribers = callbacks.len(), "Received push");

		for callback in callbacks {
			callback(push.params.clone());
		}
	}
}

impl Channel for Connection {
	fn request(&self, method: &str, params: Vec<Value>) -> RequestFuture<'_> {
		let method = method.to_string();
		Box::pin(async move { self.send_message(&method, params).await })
	}

	fn on(&self, event: &str, callback: PushCallback) {
		self.subscribers
			.lock()
			.entry(event.to_string())
			.or_default()
			.push(callback);
	}
}

/// Converts a wallet error payload into [`Error::Remote`].
pub(crate) fn parse_protocol_error(payload: ErrorPayload) -> Error {
	Error::Remote {
		name: payload.name.unwrap_or_else(|| "Error".to_string()),
		message: payload.message,
	}
}
