use crate::command::{HubCommand, SendOutcome};
use crate::context::{ContextSnapshot, ErrorReport, RelayContext};
use crate::notify::{Notifier, LATENCY_NOTIFY_THRESHOLD};
use relay_events::{DedupeWindow, Envelope, EventKind, Payload};
use relay_transport::{Inbound, RetryConfig, TransportEvent, WsClient, WsConfig};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Fixed retry cadence for the primary upstream socket
pub const PRIMARY_RETRY_INTERVAL: Duration = Duration::from_secs(5);
/// Fixed retry cadence for the error-reporting socket
pub const ERROR_RETRY_INTERVAL: Duration = Duration::from_secs(30);

const BROADCAST_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct HubConfig {
	pub server_url: String,
	pub error_url: String,
}

/// One applied update, fanned out to every subscriber
#[derive(Debug, Clone, PartialEq)]
pub enum HubUpdate {
	ContextSync(Value),
	ContextUpdate(Value),
	Error(ErrorReport),
}

/// Cloneable handle into the hub's dispatch task
#[derive(Clone)]
pub struct HubHandle {
	commands: mpsc::UnboundedSender<HubCommand>,
	broadcaster: async_broadcast::Sender<HubUpdate>,
}

impl HubHandle {
	/// New fan-out subscriber; lagging receivers lose the oldest updates
	pub fn subscribe(&self) -> async_broadcast::Receiver<HubUpdate> {
		self.broadcaster.new_receiver()
	}

	pub async fn context(&self) -> Option<ContextSnapshot> {
		let (reply, rx) = oneshot::channel();
		self.commands.send(HubCommand::GetContext { reply }).ok()?;
		rx.await.ok()
	}

	pub async fn send_to_server(&self, data: Value) -> SendOutcome {
		self.request(|reply| HubCommand::SendToServer { data, reply }).await
	}

	pub async fn ai_prompt(&self, data: Value) -> SendOutcome {
		self.request(|reply| HubCommand::AiPrompt { data, reply }).await
	}

	pub async fn reconnect(&self) -> bool {
		let (reply, rx) = oneshot::channel();
		if self.commands.send(HubCommand::Reconnect { reply }).is_err() {
			return false;
		}
		rx.await.unwrap_or(false)
	}

	/// Fire-and-forget error intake
	pub fn report_error(&self, report: ErrorReport) {
		if self.commands.send(HubCommand::ErrorDetected { report }).is_err() {
			debug!("error report after hub shutdown dropped");
		}
	}

	async fn request(&self, make: impl FnOnce(oneshot::Sender<SendOutcome>) -> HubCommand) -> SendOutcome {
		let (reply, rx) = oneshot::channel();
		if self.commands.send(make(reply)).is_err() {
			return SendOutcome::failed("hub is shut down");
		}
		rx.await.unwrap_or_else(|_| SendOutcome::failed("hub dropped the request"))
	}
}

/// Background relay: one primary upstream socket, one error-reporting socket,
/// the context state, and best-effort fan-out to subscribers.
pub struct RelayHub {
	context: RelayContext,
	primary: WsClient,
	error_socket: WsClient,
	error_window: DedupeWindow,
	broadcaster: async_broadcast::Sender<HubUpdate>,
	// Keeps the channel open while no subscriber is active
	_keepalive: async_broadcast::InactiveReceiver<HubUpdate>,
	notifier: Arc<dyn Notifier>,
}

impl RelayHub {
	/// Spawn the dispatch task; both upstream sockets start connecting
	/// immediately on their own uncoordinated retry loops.
	pub fn start(config: HubConfig, notifier: Arc<dyn Notifier>, shutdown: CancellationToken) -> (HubHandle, JoinHandle<()>) {
		let primary_config = WsConfig::new(&config.server_url).with_retry(RetryConfig::forever(PRIMARY_RETRY_INTERVAL));
		let error_config = WsConfig::new(&config.error_url).with_retry(RetryConfig::forever(ERROR_RETRY_INTERVAL));

		let (primary, primary_events) = WsClient::connect(primary_config);
		let (error_socket, error_events) = WsClient::connect(error_config);

		let (mut broadcaster, receiver) = async_broadcast::broadcast(BROADCAST_CAPACITY);
		broadcaster.set_overflow(true);
		broadcaster.set_await_active(false);

		let (commands_tx, commands_rx) = mpsc::unbounded_channel();
		let handle = HubHandle {
			commands: commands_tx,
			broadcaster: broadcaster.clone(),
		};

		let hub = Self {
			context: RelayContext::new(),
			primary,
			error_socket,
			error_window: DedupeWindow::default(),
			broadcaster,
			_keepalive: receiver.deactivate(),
			notifier,
		};

		let task = tokio::spawn(hub.run(commands_rx, primary_events, error_events, shutdown));
		(handle, task)
	}

	async fn run(
		mut self,
		mut commands: mpsc::UnboundedReceiver<HubCommand>,
		mut primary_events: mpsc::UnboundedReceiver<TransportEvent>,
		mut error_events: mpsc::UnboundedReceiver<TransportEvent>,
		shutdown: CancellationToken,
	) {
		info!("relay hub started");
		let mut error_stream_open = true;

		loop {
			tokio::select! {
				event = primary_events.recv() => match event {
					Some(event) => self.on_primary_event(event),
					None => break,
				},
				event = error_events.recv(), if error_stream_open => match event {
					Some(event) => on_error_socket_event(&event),
					None => error_stream_open = false,
				},
				command = commands.recv() => match command {
					Some(command) => self.on_command(command),
					None => break,
				},
				_ = shutdown.cancelled() => break,
			}
		}

		self.primary.close();
		self.error_socket.close();
		info!("relay hub stopped");
	}

	fn on_primary_event(&mut self, event: TransportEvent) {
		match event {
			TransportEvent::Opened => {
				self.context.connected = true;
				info!("upstream connected");
			}
			TransportEvent::Closed => {
				self.context.connected = false;
				info!("upstream closed");
			}
			TransportEvent::Errored(reason) => {
				self.context.connected = false;
				debug!("upstream error: {reason}");
			}
			TransportEvent::Message(inbound) => self.on_upstream_message(&inbound),
		}
	}

	fn on_upstream_message(&mut self, inbound: &Inbound) {
		let value = match &inbound.payload {
			Payload::Json(value) => value.clone(),
			Payload::Raw(text) => {
				debug!("unstructured upstream frame ({} bytes) ignored", text.len());
				return;
			}
		};

		let envelope = Envelope::from_value(value);
		match envelope.kind {
			EventKind::ContextSync => {
				self.context.apply_sync(&envelope.payload);
				self.fan_out(HubUpdate::ContextSync(envelope.payload));
			}
			EventKind::ContextUpdate => {
				if let Some(latency_ms) = self.context.apply_update(&envelope.payload) {
					let latency = Duration::from_millis(latency_ms);
					if latency > LATENCY_NOTIFY_THRESHOLD {
						self.notifier.high_latency(latency);
					}
				}
				self.fan_out(HubUpdate::ContextUpdate(envelope.payload));
			}
			other => debug!("upstream frame kind {other} not consumed by the hub"),
		}
	}

	fn on_command(&mut self, command: HubCommand) {
		match command {
			HubCommand::GetContext { reply } => {
				let _ = reply.send(self.context.snapshot());
			}
			HubCommand::SendToServer { data, reply } => {
				let _ = reply.send(self.forward_upstream(EventKind::SendToServer, data));
			}
			HubCommand::AiPrompt { data, reply } => {
				let _ = reply.send(self.forward_upstream(EventKind::AiPrompt, data));
			}
			HubCommand::Reconnect { reply } => {
				self.primary.force_reconnect();
				let _ = reply.send(true);
			}
			HubCommand::ErrorDetected { report } => self.on_error_detected(report),
		}
	}

	/// Wrap a payload in the wire envelope and queue it on the primary socket
	fn forward_upstream(&self, kind: EventKind, data: Value) -> SendOutcome {
		let frame = Envelope::new(kind, data).to_value();
		match self.primary.send_json(&frame) {
			Ok(()) => SendOutcome::ok(),
			Err(e) => SendOutcome::failed(e.to_string()),
		}
	}

	fn on_error_detected(&mut self, report: ErrorReport) {
		if !self.error_window.accept(&report.message) {
			debug!("duplicate error suppressed: {}", report.message);
			return;
		}

		warn!("error detected: {}", report.message);
		self.context.record_error(report.clone());

		// Best effort; sends queue while the error socket reconnects
		let frame = match serde_json::to_value(&report) {
			Ok(value) => Envelope::new(EventKind::ErrorDetected, serde_json::json!({ "error": value })).to_value(),
			Err(e) => {
				warn!("error report not serializable: {e}");
				return;
			}
		};
		if let Err(e) = self.error_socket.send_json(&frame) {
			debug!("error forward failed: {e}");
		}

		// An error while the upstream is down usually means the relay lost
		// its server; kick the primary's reconnect once instead of waiting
		// out the retry interval.
		if !self.primary.is_connected() {
			self.primary.force_reconnect();
		}

		self.fan_out(HubUpdate::Error(report));
	}

	fn fan_out(&self, update: HubUpdate) {
		// Overflow is enabled: slow subscribers lose old updates, the hub
		// never blocks on them
		if let Err(e) = self.broadcaster.try_broadcast(update) {
			debug!("fan-out skipped: {e}");
		}
	}
}

fn on_error_socket_event(event: &TransportEvent) {
	match event {
		TransportEvent::Opened => info!("error socket connected"),
		TransportEvent::Closed => info!("error socket closed"),
		TransportEvent::Errored(reason) => debug!("error socket: {reason}"),
		TransportEvent::Message(_) => {}
	}
}
