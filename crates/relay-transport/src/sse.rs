use crate::event::{Inbound, TransportEvent};
use crate::retry::{RetryConfig, RetryPolicy};
use futures_util::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct SseConfig {
	pub url: String,
	pub retry: RetryConfig,
}

impl SseConfig {
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
	ForceReconnect,
	Close,
}

/// SSE stream client with the same typed event stream and fixed-interval
/// retry as [`WsClient`](crate::ws::WsClient). Receive-only: SSE has no send
/// path. Named events carry their label on [`Inbound::event`]; unparseable
/// bodies are delivered raw, matching the WebSocket policy.
pub struct SseClient {
	commands: mpsc::UnboundedSender<Command>,
	connected: watch::Receiver<bool>,
}

impl SseClient {
	/// Spawn the stream task; connecting begins immediately
	pub fn connect(config: SseConfig) -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
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

	pub fn force_reconnect(&self) {
		let _ = self.commands.send(Command::ForceReconnect);
	}

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

async fn run_connection(config: SseConfig, mut commands: mpsc::UnboundedReceiver<Command>, events: mpsc::UnboundedSender<TransportEvent>, connected: watch::Sender<bool>) {
	let client = reqwest::Client::new();
	let mut policy = RetryPolicy::new(config.retry.clone());

	loop {
		debug!("opening sse stream: {}", config.url);
		let end = match EventSource::new(client.get(&config.url)) {
			Ok(source) => run_session(source, &mut policy, &mut commands, &events, &connected).await,
			Err(e) => SessionEnd::Lost(e.to_string()),
		};
		let _ = connected.send(false);

		match end {
			SessionEnd::Close => {
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

		match policy.next_attempt() {
			Some(delay) => match wait_for_retry(delay, &mut commands).await {
				RetryWait::Proceed => {}
				RetryWait::ForceReconnect => policy.reset(),
				RetryWait::Close => {
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
						Some(Command::Close) | None => return,
					}
				}
			}
		}
	}
}

async fn run_session(
	mut source: EventSource,
	policy: &mut RetryPolicy,
	commands: &mut mpsc::UnboundedReceiver<Command>,
	events: &mpsc::UnboundedSender<TransportEvent>,
	connected: &watch::Sender<bool>,
) -> SessionEnd {
	loop {
		tokio::select! {
			item = source.next() => match item {
				Some(Ok(Event::Open)) => {
					policy.record_success();
					let _ = connected.send(true);
					if events.send(TransportEvent::Opened).is_err() {
						source.close();
						return SessionEnd::Close;
					}
					info!("sse stream open");
				}
				Some(Ok(Event::Message(msg))) => {
					let inbound = Inbound::from_text(&msg.data).with_event(&msg.event);
					if events.send(TransportEvent::Message(inbound)).is_err() {
						source.close();
						return SessionEnd::Close;
					}
				}
				Some(Err(e)) => {
					source.close();
					return SessionEnd::Lost(e.to_string());
				}
				None => return SessionEnd::Lost("stream ended".to_string()),
			},
			cmd = commands.recv() => match cmd {
				Some(Command::ForceReconnect) => {
					source.close();
					return SessionEnd::ForceReconnect;
				}
				Some(Command::Close) | None => {
					source.close();
					return SessionEnd::Close;
				}
			}
		}
	}
}

async fn wait_for_retry(delay: std::time::Duration, commands: &mut mpsc::UnboundedReceiver<Command>) -> RetryWait {
	let sleep = tokio::time::sleep(delay);
	tokio::pin!(sleep);

	loop {
		tokio::select! {
			() = &mut sleep => return RetryWait::Proceed,
			cmd = commands.recv() => match cmd {
				Some(Command::ForceReconnect) => return RetryWait::ForceReconnect,
				Some(Command::Close) | None => return RetryWait::Close,
			}
		}
	}
}
