use crate::connection::Connection;
use crate::errors::RegistryError;
use dashmap::DashMap;
use relay_events::{BoundedLog, EndpointId, MessageRecord};
use relay_transport::{Inbound, SseClient, TransportEvent, WsClient};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Global message-log capacity, shared across all connections
pub const MESSAGE_LOG_CAPACITY: usize = 1000;

/// One configured `{id, url}` monitoring target
#[derive(Debug, Clone)]
pub struct Endpoint {
	pub id: EndpointId,
	pub url: String,
}

impl Endpoint {
	pub fn new(id: impl Into<Arc<str>>, url: impl Into<String>) -> Self {
		Self {
			id: EndpointId::new(id),
			url: url.into(),
		}
	}
}

/// Seam over the concrete transport so entries can be closed and manually
/// reconnected without the registry knowing which transport backs them
pub trait TransportHandle: Send + Sync {
	fn close(&self);
	fn force_reconnect(&self);
}

impl TransportHandle for WsClient {
	fn close(&self) {
		WsClient::close(self);
	}

	fn force_reconnect(&self) {
		WsClient::force_reconnect(self);
	}
}

impl TransportHandle for SseClient {
	fn close(&self) {
		SseClient::close(self);
	}

	fn force_reconnect(&self) {
		SseClient::force_reconnect(self);
	}
}

struct Entry {
	connection: Connection,
	handle: Option<Box<dyn TransportHandle>>,
}

/// Owns the set of monitored connections and the global message log.
///
/// All mutation happens through event handlers; pausing stops observation
/// without touching the underlying connections.
pub struct Registry {
	entries: DashMap<EndpointId, Entry>,
	message_log: Mutex<BoundedLog<MessageRecord>>,
	paused: AtomicBool,
}

impl Registry {
	pub fn new() -> Self {
		Self {
			entries: DashMap::new(),
			message_log: Mutex::new(BoundedLog::new(MESSAGE_LOG_CAPACITY)),
			paused: AtomicBool::new(false),
		}
	}

	/// Register an endpoint with its live transport handle.
	///
	/// An existing entry for the same id has its transport closed first
	/// (never two live sockets per id) and its cumulative counters carried
	/// forward into the fresh entry (soft reset).
	pub fn connect(&self, endpoint: Endpoint, handle: Box<dyn TransportHandle>) {
		match self.entries.get_mut(&endpoint.id) {
			Some(mut entry) => {
				if let Some(old) = entry.handle.take() {
					old.close();
				}
				info!("soft reset for endpoint {}", endpoint.id);
				entry.connection = Connection::carried_over(&entry.connection, endpoint.url);
				entry.handle = Some(handle);
			}
			None => {
				debug!("registering endpoint {}", endpoint.id);
				self.entries.insert(
					endpoint.id.clone(),
					Entry {
						connection: Connection::new(endpoint.id, endpoint.url),
						handle: Some(handle),
					},
				);
			}
		}
	}

	/// Close the transport and fold the ended session into total uptime
	pub fn disconnect(&self, id: &EndpointId) -> Result<(), RegistryError> {
		let mut entry = self.entries.get_mut(id).ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
		if let Some(handle) = entry.handle.take() {
			handle.close();
		}
		entry.connection.mark_disconnected();
		Ok(())
	}

	/// Manual reconnect for one endpoint
	pub fn force_reconnect(&self, id: &EndpointId) -> Result<(), RegistryError> {
		let entry = self.entries.get(id).ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
		match &entry.handle {
			Some(handle) => handle.force_reconnect(),
			None => warn!("force reconnect on endpoint {id} with no transport"),
		}
		Ok(())
	}

	/// Explicit teardown of one monitored endpoint
	pub fn remove(&self, id: &EndpointId) -> Option<Connection> {
		self.entries.remove(id).map(|(_, mut entry)| {
			if let Some(handle) = entry.handle.take() {
				handle.close();
			}
			entry.connection
		})
	}

	/// Stop observing: messages are discarded without updating any counter.
	/// Connections stay up.
	pub fn pause(&self) {
		self.paused.store(true, Ordering::Relaxed);
	}

	pub fn resume(&self) {
		self.paused.store(false, Ordering::Relaxed);
	}

	pub fn is_paused(&self) -> bool {
		self.paused.load(Ordering::Relaxed)
	}

	/// Apply one transport event to the owning connection
	pub fn handle_event(&self, id: &EndpointId, event: TransportEvent) {
		match event {
			TransportEvent::Opened => {
				if let Some(mut entry) = self.entries.get_mut(id) {
					entry.connection.mark_connected();
				}
			}
			TransportEvent::Message(inbound) => self.record_message(id, &inbound),
			TransportEvent::Errored(reason) => {
				if let Some(mut entry) = self.entries.get_mut(id) {
					entry.connection.mark_error(reason);
					entry.connection.record_retry();
				}
			}
			TransportEvent::Closed => {
				if let Some(mut entry) = self.entries.get_mut(id) {
					entry.connection.mark_disconnected();
				}
			}
		}
	}

	/// Append to the global log and fold per-connection counters
	pub fn record_message(&self, id: &EndpointId, inbound: &Inbound) {
		if self.is_paused() {
			return;
		}

		let Some(mut entry) = self.entries.get_mut(id) else {
			warn!("message for unknown endpoint {id} dropped");
			return;
		};

		let record = MessageRecord::new(id.clone(), event_label(inbound), inbound.payload.clone(), inbound.size);
		entry.connection.record_message(&record);

		if let Ok(mut log) = self.message_log.lock() {
			log.push(record);
		}
	}

	/// Zero cumulative counters for one endpoint (explicit "clear stats")
	pub fn clear_stats(&self, id: &EndpointId) -> Result<(), RegistryError> {
		let mut entry = self.entries.get_mut(id).ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
		entry.connection.clear_stats();
		Ok(())
	}

	pub fn connection(&self, id: &EndpointId) -> Option<Connection> {
		self.entries.get(id).map(|entry| entry.connection.clone())
	}

	pub fn connections(&self) -> Vec<Connection> {
		self.entries.iter().map(|entry| entry.connection.clone()).collect()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn message_count(&self) -> usize {
		self.message_log.lock().map(|log| log.len()).unwrap_or(0)
	}

	/// Snapshot of the global message log, oldest first
	pub fn messages(&self) -> Vec<MessageRecord> {
		self.message_log.lock().map(|log| log.iter().cloned().collect()).unwrap_or_default()
	}

	/// Close every transport; entries and stats stay for inspection
	pub fn close_all(&self) {
		for mut entry in self.entries.iter_mut() {
			if let Some(handle) = entry.handle.take() {
				handle.close();
			}
		}
	}
}

impl Default for Registry {
	fn default() -> Self {
		Self::new()
	}
}

/// Drive one endpoint's transport events into the registry
pub fn spawn_monitor(registry: Arc<Registry>, id: EndpointId, mut events: mpsc::UnboundedReceiver<TransportEvent>) -> JoinHandle<()> {
	tokio::spawn(async move {
		while let Some(event) = events.recv().await {
			registry.handle_event(&id, event);
		}
		debug!("monitor for endpoint {id} finished");
	})
}

fn event_label(inbound: &Inbound) -> String {
	if let Some(event) = &inbound.event {
		return event.clone();
	}
	inbound
		.payload
		.as_json()
		.and_then(|value| value.get("type"))
		.and_then(|t| t.as_str())
		.unwrap_or("message")
		.to_string()
}
