use chrono::{DateTime, Utc};
use relay_events::{BoundedLog, EndpointId, MessageRecord};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Ring-buffer capacity for recent latency samples
pub const LATENCY_CAPACITY: usize = 100;

/// Lifecycle of one monitored endpoint; states are mutually exclusive
#[derive(Debug, Clone)]
pub enum ConnectionState {
	Connecting,
	Connected { connected_at: Instant },
	Disconnected,
	Error { reason: String },
}

impl fmt::Display for ConnectionState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConnectionState::Connecting => write!(f, "Connecting"),
			ConnectionState::Connected { .. } => write!(f, "Connected"),
			ConnectionState::Disconnected => write!(f, "Disconnected"),
			ConnectionState::Error { reason } => write!(f, "Error({reason})"),
		}
	}
}

/// One monitored transport endpoint with its accumulated stats.
///
/// Mutated in place by the registry's event handlers; destroyed only when
/// monitoring is explicitly torn down.
#[derive(Debug, Clone)]
pub struct Connection {
	pub id: EndpointId,
	pub url: String,
	pub state: ConnectionState,
	pub connected_at: Option<DateTime<Utc>>,
	pub disconnected_at: Option<DateTime<Utc>>,
	pub last_message_at: Option<DateTime<Utc>>,
	pub messages_received: u64,
	pub bytes_received: u64,
	pub reconnect_attempts: u32,
	/// Event-type label occurrence counts
	pub event_types: HashMap<String, u64>,
	/// Recent latency samples, oldest evicted beyond capacity
	pub latency: BoundedLog<Duration>,
	/// Connected time accumulated across closed sessions.
	/// Never includes the live session; that is computed on demand.
	pub total_uptime: Duration,
}

impl Connection {
	pub fn new(id: EndpointId, url: impl Into<String>) -> Self {
		Self {
			id,
			url: url.into(),
			state: ConnectionState::Connecting,
			connected_at: None,
			disconnected_at: None,
			last_message_at: None,
			messages_received: 0,
			bytes_received: 0,
			reconnect_attempts: 0,
			event_types: HashMap::new(),
			latency: BoundedLog::new(LATENCY_CAPACITY),
			total_uptime: Duration::ZERO,
		}
	}

	/// Soft reset: a fresh entry for the same id carrying forward the prior
	/// session's cumulative counters, so manual reconnects keep history.
	pub fn carried_over(prior: &Connection, url: impl Into<String>) -> Self {
		Self {
			id: prior.id.clone(),
			url: url.into(),
			state: ConnectionState::Connecting,
			connected_at: None,
			disconnected_at: None,
			last_message_at: prior.last_message_at,
			messages_received: prior.messages_received,
			bytes_received: prior.bytes_received,
			reconnect_attempts: prior.reconnect_attempts,
			event_types: prior.event_types.clone(),
			latency: prior.latency.clone(),
			total_uptime: prior.current_total_uptime(Instant::now()),
		}
	}

	pub fn is_connected(&self) -> bool {
		matches!(self.state, ConnectionState::Connected { .. })
	}

	pub fn mark_connected(&mut self) {
		self.state = ConnectionState::Connected { connected_at: Instant::now() };
		self.connected_at = Some(Utc::now());
		self.reconnect_attempts = 0;
	}

	pub fn mark_disconnected(&mut self) {
		self.end_session();
		self.state = ConnectionState::Disconnected;
		self.disconnected_at = Some(Utc::now());
	}

	pub fn mark_error(&mut self, reason: String) {
		self.end_session();
		self.state = ConnectionState::Error { reason };
		self.disconnected_at = Some(Utc::now());
	}

	pub fn mark_connecting(&mut self) {
		self.end_session();
		self.state = ConnectionState::Connecting;
	}

	pub fn record_retry(&mut self) {
		self.reconnect_attempts += 1;
	}

	/// Fold counters for one received message
	pub fn record_message(&mut self, record: &MessageRecord) {
		self.messages_received += 1;
		self.bytes_received += record.size as u64;
		self.last_message_at = Some(record.timestamp);
		*self.event_types.entry(record.event_type.clone()).or_insert(0) += 1;
		if let Some(latency) = record.latency {
			self.latency.push(latency);
		}
	}

	/// Total uptime including the live session, as of `now`
	pub fn current_total_uptime(&self, now: Instant) -> Duration {
		match self.state {
			ConnectionState::Connected { connected_at } => self.total_uptime + now.saturating_duration_since(connected_at),
			_ => self.total_uptime,
		}
	}

	/// Explicit stats reset; the only operation that zeroes cumulative
	/// counters (soft-reset reconnects never do)
	pub fn clear_stats(&mut self) {
		self.messages_received = 0;
		self.bytes_received = 0;
		self.reconnect_attempts = 0;
		self.event_types.clear();
		self.latency.clear();
		self.total_uptime = Duration::ZERO;
	}

	// Session uptime only advances on the connected -> closed transition
	fn end_session(&mut self) {
		if let ConnectionState::Connected { connected_at } = self.state {
			self.total_uptime += connected_at.elapsed();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use relay_events::Payload;

	fn test_connection() -> Connection {
		Connection::new(EndpointId::new("github-events"), "ws://localhost:4000/events")
	}

	fn record(size: usize, label: &str) -> MessageRecord {
		MessageRecord::new(EndpointId::new("github-events"), label.to_string(), Payload::Raw("x".repeat(size)), size)
	}

	#[test]
	fn test_new_connection_starts_connecting() {
		let conn = test_connection();
		assert!(matches!(conn.state, ConnectionState::Connecting));
		assert_eq!(conn.total_uptime, Duration::ZERO);
		assert!(conn.connected_at.is_none());
	}

	#[test]
	fn test_uptime_accumulates_across_sessions() {
		let mut conn = test_connection();

		// Two sessions of 50s and 30s, stamped in the past
		conn.state = ConnectionState::Connected {
			connected_at: Instant::now() - Duration::from_secs(50),
		};
		conn.mark_disconnected();
		conn.state = ConnectionState::Connected {
			connected_at: Instant::now() - Duration::from_secs(30),
		};
		conn.mark_disconnected();

		let total = conn.total_uptime;
		assert!(total >= Duration::from_secs(80));
		assert!(total < Duration::from_secs(81));
	}

	#[test]
	fn test_live_session_not_folded_into_total() {
		let mut conn = test_connection();
		conn.state = ConnectionState::Connected {
			connected_at: Instant::now() - Duration::from_secs(30),
		};

		assert_eq!(conn.total_uptime, Duration::ZERO);
		let current = conn.current_total_uptime(Instant::now());
		assert!(current >= Duration::from_secs(30));
	}

	#[test]
	fn test_error_transition_also_ends_session() {
		let mut conn = test_connection();
		conn.state = ConnectionState::Connected {
			connected_at: Instant::now() - Duration::from_secs(10),
		};
		conn.mark_error("socket reset".to_string());

		assert!(conn.total_uptime >= Duration::from_secs(10));
		assert!(matches!(conn.state, ConnectionState::Error { .. }));
		assert!(conn.disconnected_at.is_some());
	}

	#[test]
	fn test_connect_resets_reconnect_attempts() {
		let mut conn = test_connection();
		conn.record_retry();
		conn.record_retry();
		assert_eq!(conn.reconnect_attempts, 2);

		conn.mark_connected();
		assert_eq!(conn.reconnect_attempts, 0);
		assert!(conn.is_connected());
	}

	#[test]
	fn test_record_message_updates_counters() {
		let mut conn = test_connection();

		conn.record_message(&record(10, "context-update"));
		conn.record_message(&record(5, "context-update"));
		conn.record_message(&record(3, "server-log"));

		assert_eq!(conn.messages_received, 3);
		assert_eq!(conn.bytes_received, 18);
		assert_eq!(conn.event_types.get("context-update"), Some(&2));
		assert_eq!(conn.event_types.get("server-log"), Some(&1));
		assert!(conn.last_message_at.is_some());
	}

	#[test]
	fn test_latency_ring_is_bounded() {
		let mut conn = test_connection();
		for i in 0..150 {
			conn.latency.push(Duration::from_millis(i));
		}
		assert_eq!(conn.latency.len(), LATENCY_CAPACITY);
		assert_eq!(conn.latency.front(), Some(&Duration::from_millis(50)));
	}

	#[test]
	fn test_carried_over_preserves_cumulative_counters() {
		let mut prior = test_connection();
		prior.record_message(&record(10, "context-update"));
		prior.record_retry();
		prior.state = ConnectionState::Connected {
			connected_at: Instant::now() - Duration::from_secs(5),
		};

		let fresh = Connection::carried_over(&prior, "ws://localhost:4001/events");

		assert_eq!(fresh.messages_received, 1);
		assert_eq!(fresh.bytes_received, 10);
		assert_eq!(fresh.reconnect_attempts, 1);
		assert_eq!(fresh.event_types.get("context-update"), Some(&1));
		assert!(fresh.total_uptime >= Duration::from_secs(5));
		assert!(matches!(fresh.state, ConnectionState::Connecting));
		assert_eq!(fresh.url, "ws://localhost:4001/events");
	}

	#[test]
	fn test_clear_stats_zeroes_everything_cumulative() {
		let mut conn = test_connection();
		conn.record_message(&record(10, "context-update"));
		conn.record_retry();
		conn.total_uptime = Duration::from_secs(100);

		conn.clear_stats();

		assert_eq!(conn.messages_received, 0);
		assert_eq!(conn.bytes_received, 0);
		assert_eq!(conn.reconnect_attempts, 0);
		assert!(conn.event_types.is_empty());
		assert!(conn.latency.is_empty());
		assert_eq!(conn.total_uptime, Duration::ZERO);
	}
}
