//! Message transports to the wallet.
//!
//! Every transport is reduced to a pair of unbounded channels of JSON values
//! ([`TransportParts`]); background tasks move frames between those channels
//! and the underlying pipe or socket.
//!
//! - [`PipeTransport`]: 4-byte little-endian length prefix followed by JSON,
//!   the framing browsers use for native messaging hosts
//! - [`WebSocketTransport`]: one JSON document per text frame

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::error::{Error, Result};

/// Upper bound for a single length-prefixed frame.
pub const MAX_FRAME_LEN: usize = 32 * 1024 * 1024;

/// Outbound and inbound halves of a running transport.
pub struct TransportParts {
	/// Frames queued here are written to the wallet.
	pub sender: mpsc::UnboundedSender<Value>,
	/// Frames read from the wallet, closed when the transport ends.
	pub receiver: mpsc::UnboundedReceiver<Value>,
}

impl TransportParts {
	/// Creates two in-memory ends wired to each other.
	pub fn pair() -> (TransportParts, TransportParts) {
		let (a_tx, b_rx) = mpsc::unbounded_channel();
		let (b_tx, a_rx) = mpsc::unbounded_channel();
		(
			TransportParts {
				sender: a_tx,
				receiver: a_rx,
			},
			TransportParts {
				sender: b_tx,
				receiver: b_rx,
			},
		)
	}
}

/// Length-prefixed JSON over a pair of byte streams.
pub struct PipeTransport;

impl PipeTransport {
	/// Spawns reader and writer tasks over `writer`/`reader`.
	pub fn spawn<W, R>(writer: W, reader: R) -> TransportParts
	where
		W: AsyncWrite + Unpin + Send + 'static,
		R: AsyncRead + Unpin + Send + 'static,
	{
		let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Value>();
		let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<Value>();

		tokio::spawn(async move {
			let mut writer = writer;
			while let Some(message) = outbound_rx.recv().await {
				if let Err(e) = write_frame(&mut writer, &message).await {
					tracing::warn!(error = %e, "Pipe writer stopped");
					break;
				}
			}
		});

		tokio::spawn(async move {
			let mut reader = reader;
			loop {
				match read_frame(&mut reader).await {
					Ok(Some(message)) => {
						if inbound_tx.send(message).is_err() {
							break;
						}
					}
					Ok(None) => {
						tracing::debug!("Pipe reached end of stream");
						break;
					}
					Err(e) => {
						tracing::warn!(error = %e, "Pipe reader stopped");
						break;
					}
				}
			}
		});

		TransportParts {
			sender: outbound_tx,
			receiver: inbound_rx,
		}
	}
}

/// Writes one length-prefixed JSON frame.
pub async fn write_frame<W>(writer: &mut W, message: &Value) -> Result<()>
where
	W: AsyncWrite + Unpin,
{
	let bytes = serde_json::to_vec(message)?;
	let length = u32::try_from(bytes.len())
		.map_err(|_| Error::TransportError(format!("frame too large: {} bytes", bytes.len())))?;

	writer.write_all(&length.to_le_bytes()).await?;
	writer.write_all(&bytes).await?;
	writer.flush().await?;
	Ok(())
}

/// Reads one length-prefixed JSON frame, or `None` on a clean end of stream.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Value>>
where
	R: AsyncRead + Unpin,
{
	let mut len_buf = [0u8; 4];
	match reader.read_exact(&mut len_buf).await {
		Ok(_) => {}
		Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
		Err(e) => return Err(e.into()),
	}

	let length = u32::from_le_bytes(len_buf) as usize;
	if length > MAX_FRAME_LEN {
		return Err(Error::TransportError(format!(
			"frame of {length} bytes exceeds limit of {MAX_FRAME_LEN}"
		)));
	}

	let mut buf = vec![0u8; length];
	reader.read_exact(&mut buf).await?;
	Ok(Some(serde_json::from_slice(&buf)?))
}

/// JSON text frames over a WebSocket.
pub struct WebSocketTransport;

impl WebSocketTransport {
	/// Connects to `url` and spawns reader and writer tasks.
	pub async fn connect(url: &str) -> Result<TransportParts> {
		let (stream, _) = tokio_tungstenite::connect_async(url)
			.await
			.map_err(|e| Error::ConnectionFailed(format!("{url}: {e}")))?;
		let (mut sink, mut source) = stream.split();

		let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Value>();
		let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<Value>();

		tokio::spawn(async move {
			while let Some(message) = outbound_rx.recv().await {
				if let Err(e) = sink.send(WsMessage::Text(message.to_string())).await {
					tracing::warn!(error = %e, "WebSocket writer stopped");
					break;
				}
			}
			let _ = sink.close().await;
		});

		tokio::spawn(async move {
			while let Some(frame) = source.next().await {
				let parsed = match frame {
					Ok(WsMessage::Text(text)) => serde_json::from_str::<Value>(&text),
					Ok(WsMessage::Binary(bytes)) => serde_json::from_slice::<Value>(&bytes),
					Ok(WsMessage::Close(_)) => break,
					Ok(_) => continue,
					Err(e) => {
						tracing::warn!(error = %e, "WebSocket reader stopped");
						break;
					}
				};
				match parsed {
					Ok(value) => {
						if inbound_tx.send(value).is_err() {
							break;
						}
					}
					Err(e) => tracing::warn!(error = %e, "Dropping malformed frame"),
				}
			}
		});

		Ok(TransportParts {
			sender: outbound_tx,
			receiver: inbound_rx,
		})
	}
}
