use crate::error::TransportError;
use crate::event::{Inbound, TransportEvent};
use crate::retry::{RetryConfig, RetryPolicy};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::collections::VecDeque;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone)]
pub struct WsConfig {
	pub url: String,
	pub retry: RetryConfig,
}

impl WsConfig {
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			retry: RetryConfig::default(),
		}
	}

	pub fn with_retry(mut self, retry: RetryConfig) -> Self {
		self.retry = retry;
		self
	}
}

#[derive(Debug)]
enum Command {
	Send(String),
	ForceReconnect,
	Close,
}

/// WebSocket client owning one physical connection and its retry loop.
///
/// The dispatch task starts on construction and emits [`TransportEvent`]s
/// over the returned channel. Sends while disconnected are queued (unbounded
/// FIFO) and flushed in order after the next successful open; the queue is a
/// best-effort buffer, not a delivery guarantee.
pub struct WsClient {
	commands: mpsc::UnboundedSender<Command>,
	connected: watch::Receiver<bool>,
}

impl WsClient {
	/// Spawn the connection task; connecting begins immediately
	pub fn connect(config: WsConfig) -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
		let (event_tx, event_rx) = mpsc::unbounded_channel();
		let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
		let (conn_tx, conn_rx) = watch::channel(false);

		tokio::spawn(run_connection(config, cmd_rx, event_tx, conn_tx));

		(
			Self {
				commands: cmd_tx,
				connected: conn_rx,
			},
			event_rx,
		)
	}

	/// Queue or send a raw text frame; never errors while disconnected
	pub fn send_text(&self, text: impl Into<String>) {
		if self.commands.send(Command::Send(text.into())).is_err() {
			debug!("send after close dropped");
		}
	}

	/// Serialize a payload as JSON and send it
	pub fn send_json<T: Serialize>(&self, data: &T) -> Result<(), TransportError> {
		let text = serde_json::to_string(data)?;
		self.send_text(text);
		Ok(())
	}

	/// Consolidated manual-reconnect entry point.
	///
	/// Resets the retry ceiling and reconnects immediately, including from
	/// the terminal exhausted state.
	pub fn force_reconnect(&self) {
		let _ = self.commands.send(Command::ForceReconnect);
	}

	/// Cancel any pending reconnect, close the socket, clear the send queue.
	/// Closing an already-closed client is a no-op.
	pub fn close(&self) {
		let _ = self.commands.send(Command::Close);
	}

	pub fn is_connected(&self) -> bool {
		*self.connected.borrow()
	}
}

enum SessionEnd {
	Lost(String),
	ForceReconnect,
	Close,
}

enum RetryWait {
	Proceed,
	ForceReconnect,
	Close,
}

async fn run_connection(config: WsConfig, mut commands: mpsc::UnboundedReceiver<Command>, events: mpsc::UnboundedSender<TransportEvent>, connected: watch::Sender<bool>) {
	let mut policy = RetryPolicy::new(config.retry.clone());
	let mut queue: VecDeque<String> = VecDeque::new();

	loop {
		debug!("connecting to {}", config.url);
		match connect_async(&config.url).await {
			Ok((socket, _)) => {
				policy.record_success();
				let _ = connected.send(true);
				if events.send(TransportEvent::Opened).is_err() {
					return;
				}
				info!("websocket open: {}", config.url);

				let end = run_session(socket, &mut commands, &events, &mut queue).await;
				let _ = connected.send(false);

				match end {
					SessionEnd::Close => {
						queue.clear();
						let _ = events.send(TransportEvent::Closed);
						return;
					}
					SessionEnd::ForceReconnect => {
						policy.reset();
						continue;
					}
					SessionEnd::Lost(reason) => {
						if events.send(TransportEvent::Errored(reason)).is_err() {
							return;
						}
					}
				}
			}
			Err(e) => {
				let _ = connected.send(false);
				if events.send(TransportEvent::Errored(e.to_string())).is_err() {
					return;
				}
			}
		}

		match policy.next_attempt() {
			Some(delay) => match wait_for_retry(delay, &mut commands, &mut queue).await {
				RetryWait::Proceed => {}
				RetryWait::ForceReconnect => policy.reset(),
				RetryWait::Close => {
					queue.clear();
					let _ = events.send(TransportEvent::Closed);
					return;
				}
			},
			None => {
				warn!("reconnect attempts exhausted for {}", config.url);
				let _ = events.send(TransportEvent::Closed);

				// Terminal until an explicit force-reconnect
				loop {
					match commands.recv().await {
						Some(Command::ForceReconnect) => {
							policy.reset();
							break;
						}
						Some(Command::Send(text)) => queue.push_back(text),
						Some(Command::Close) | None => {
							queue.clear();
							return;
						}
					}
				}
			}
		}
	}
}

async fn run_session(socket: WsStream, commands: &mut mpsc::UnboundedReceiver<Command>, events: &mpsc::UnboundedSender<TransportEvent>, queue: &mut VecDeque<String>) -> SessionEnd {
	let (mut sink, mut stream) = socket.split();

	// Flush queued sends in order before anything else
	while let Some(text) = queue.pop_front() {
		if let Err(e) = sink.send(Message::Text(text.clone().into())).await {
			queue.push_front(text);
			return SessionEnd::Lost(e.to_string());
		}
	}

	loop {
		tokio::select! {
			frame = stream.next() => match frame {
				Some(Ok(Message::Text(text))) => {
					if events.send(TransportEvent::Message(Inbound::from_text(text.as_str()))).is_err() {
						return SessionEnd::Close;
					}
				}
				Some(Ok(Message::Ping(payload))) => {
					let _ = sink.send(Message::Pong(payload)).await;
				}
				Some(Ok(Message::Close(_))) => return SessionEnd::Lost("close frame received".to_string()),
				Some(Ok(_)) => {}
				Some(Err(e)) => return SessionEnd::Lost(e.to_string()),
				None => return SessionEnd::Lost("stream ended".to_string()),
			},
			cmd = commands.recv() => match cmd {
				Some(Command::Send(text)) => {
					if let Err(e) = sink.send(Message::Text(text.clone().into())).await {
						queue.push_front(text);
						return SessionEnd::Lost(e.to_string());
					}
				}
				Some(Command::ForceReconnect) => {
					let _ = sink.send(Message::Close(None)).await;
					return SessionEnd::ForceReconnect;
				}
				Some(Command::Close) | None => {
					let _ = sink.send(Message::Close(None)).await;
					return SessionEnd::Close;
				}
			}
		}
	}
}

async fn wait_for_retry(delay: std::time::Duration, commands: &mut mpsc::UnboundedReceiver<Command>, queue: &mut VecDeque<String>) -> RetryWait {
	let sleep = tokio::time::sleep(delay);
	tokio::pin!(sleep);

	loop {
		tokio::select! {
			() = &mut sleep => return RetryWait::Proceed,
			cmd = commands.recv() => match cmd {
				Some(Command::Send(text)) => queue.push_back(text),
				Some(Command::ForceReconnect) => return RetryWait::ForceReconnect,
				Some(Command::Close) | None => return RetryWait::Close,
			}
		}
	}
}
