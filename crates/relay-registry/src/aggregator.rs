use crate::connection::Connection;
use crate::registry::Registry;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// How often the aggregator recomputes and publishes
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Fleet-wide rollup published once per tick
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelayMetrics {
	pub total_connections: usize,
	pub active_connections: usize,
	pub total_messages: u64,
	pub total_bytes: u64,
	/// Pooled mean over every connection's recent latency samples
	pub average_latency: Duration,
	/// Longest cumulative uptime across the fleet, live sessions included
	pub uptime: Duration,
	/// Share of connections currently in the error state, in percent
	pub error_rate: f64,
}

/// Fold a snapshot of connections into fleet metrics as of `now`
pub fn compute(connections: &[Connection], now: Instant) -> RelayMetrics {
	let total_connections = connections.len();
	let active_connections = connections.iter().filter(|conn| conn.is_connected()).count();
	let total_messages = connections.iter().map(|conn| conn.messages_received).sum();
	let total_bytes = connections.iter().map(|conn| conn.bytes_received).sum();

	let mut latency_sum = Duration::ZERO;
	let mut latency_count = 0u32;
	for conn in connections {
		for sample in conn.latency.iter() {
			latency_sum += *sample;
			latency_count += 1;
		}
	}
	let average_latency = if latency_count == 0 { Duration::ZERO } else { latency_sum / latency_count };

	let uptime = connections.iter().map(|conn| conn.current_total_uptime(now)).max().unwrap_or(Duration::ZERO);

	let errored = connections.iter().filter(|conn| matches!(conn.state, crate::connection::ConnectionState::Error { .. })).count();
	let error_rate = if total_connections == 0 {
		0.0
	} else {
		errored as f64 / total_connections as f64 * 100.0
	};

	RelayMetrics {
		total_connections,
		active_connections,
		total_messages,
		total_bytes,
		average_latency,
		uptime,
		error_rate,
	}
}

/// Periodic rollup task; publishes over a watch channel so late or slow
/// subscribers only ever see the latest snapshot
pub struct MetricsAggregator {
	registry: Arc<Registry>,
	tick: Duration,
	sender: watch::Sender<RelayMetrics>,
	shutdown: CancellationToken,
}

impl MetricsAggregator {
	pub fn new(registry: Arc<Registry>, shutdown: CancellationToken) -> Self {
		let (sender, _) = watch::channel(RelayMetrics::default());
		Self {
			registry,
			tick: TICK_INTERVAL,
			sender,
			shutdown,
		}
	}

	/// Shorter tick for tests
	pub fn with_tick(mut self, tick: Duration) -> Self {
		self.tick = tick;
		self
	}

	pub fn subscribe(&self) -> watch::Receiver<RelayMetrics> {
		self.sender.subscribe()
	}

	pub fn start(self) -> JoinHandle<()> {
		tokio::spawn(async move {
			info!("metrics aggregator started, tick {:?}", self.tick);
			let mut ticker = interval(self.tick);

			loop {
				tokio::select! {
					_ = ticker.tick() => {
						let snapshot = self.registry.connections();
						let metrics = compute(&snapshot, Instant::now());
						debug!(
							active = metrics.active_connections,
							total = metrics.total_connections,
							messages = metrics.total_messages,
							"metrics tick"
						);
						let _ = self.sender.send(metrics);
					}
					_ = self.shutdown.cancelled() => {
						info!("metrics aggregator shutting down");
						break;
					}
				}
			}
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::connection::ConnectionState;
	use relay_events::{EndpointId, MessageRecord, Payload};

	fn connection(id: &str) -> Connection {
		Connection::new(EndpointId::new(id), format!("ws://localhost:4000/{id}"))
	}

	#[test]
	fn test_compute_on_empty_fleet() {
		let metrics = compute(&[], Instant::now());
		assert_eq!(metrics, RelayMetrics::default());
	}

	#[test]
	fn test_uptime_takes_the_longest_connection() {
		let now = Instant::now();

		// Stored 50s, disconnected
		let mut a = connection("a");
		a.total_uptime = Duration::from_secs(50);
		a.state = ConnectionState::Disconnected;

		// Live for 30s, nothing stored
		let mut b = connection("b");
		b.state = ConnectionState::Connected {
			connected_at: now - Duration::from_secs(30),
		};

		let metrics = compute(&[a, b], now);
		assert_eq!(metrics.uptime, Duration::from_secs(50));
		assert_eq!(metrics.active_connections, 1);
		assert_eq!(metrics.total_connections, 2);
	}

	#[test]
	fn test_totals_sum_across_connections() {
		let mut a = connection("a");
		let mut b = connection("b");
		for i in 0..3 {
			a.record_message(&MessageRecord::new(a.id.clone(), "message".into(), Payload::Raw("xxxx".into()), 4 + i));
		}
		b.record_message(&MessageRecord::new(b.id.clone(), "message".into(), Payload::Raw("yy".into()), 2));

		let metrics = compute(&[a, b], Instant::now());
		assert_eq!(metrics.total_messages, 4);
		assert_eq!(metrics.total_bytes, 4 + 5 + 6 + 2);
	}

	#[test]
	fn test_average_latency_pools_all_samples() {
		let mut a = connection("a");
		a.latency.push(Duration::from_millis(10));
		a.latency.push(Duration::from_millis(20));
		let mut b = connection("b");
		b.latency.push(Duration::from_millis(60));

		let metrics = compute(&[a, b], Instant::now());
		assert_eq!(metrics.average_latency, Duration::from_millis(30));
	}

	#[test]
	fn test_error_rate_is_a_percentage() {
		let mut a = connection("a");
		a.state = ConnectionState::Error { reason: "socket reset".into() };
		let b = connection("b");
		let c = connection("c");
		let d = connection("d");

		let metrics = compute(&[a, b, c, d], Instant::now());
		assert!((metrics.error_rate - 25.0).abs() < f64::EPSILON);
	}

	#[tokio::test]
	async fn test_aggregator_publishes_on_a_cadence() {
		let registry = Arc::new(Registry::new());
		let shutdown = CancellationToken::new();
		let aggregator = MetricsAggregator::new(Arc::clone(&registry), shutdown.clone()).with_tick(Duration::from_millis(10));
		let mut updates = aggregator.subscribe();
		let handle = aggregator.start();

		updates.changed().await.unwrap();
		assert_eq!(updates.borrow().total_connections, 0);

		shutdown.cancel();
		handle.await.unwrap();
	}
}
