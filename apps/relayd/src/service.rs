use crate::config::Config;
use crate::error::Result;
use relay_hub::{HubConfig, NullNotifier, RelayHub};
use relay_registry::{spawn_monitor, Endpoint, MetricsAggregator, Registry};
use relay_transport::{SseClient, SseConfig, WsClient, WsConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Wires the registry, aggregator, hub, and monitored endpoints together
/// and runs until a shutdown signal.
pub struct RelayService {
	config: Config,
}

impl RelayService {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	pub async fn run(self) -> Result<()> {
		let shutdown = CancellationToken::new();
		let registry = Arc::new(Registry::new());

		for (id, url) in &self.config.endpoints {
			info!("monitoring endpoint {id} at {url}");
			let endpoint = Endpoint::new(id.as_str(), url.clone());
			let endpoint_id = endpoint.id.clone();

			if url.starts_with("http") {
				let (client, events) = SseClient::connect(SseConfig::new(url));
				registry.connect(endpoint, Box::new(client));
				spawn_monitor(Arc::clone(&registry), endpoint_id, events);
			} else {
				let (client, events) = WsClient::connect(WsConfig::new(url));
				registry.connect(endpoint, Box::new(client));
				spawn_monitor(Arc::clone(&registry), endpoint_id, events);
			}
		}

		let aggregator = MetricsAggregator::new(Arc::clone(&registry), shutdown.clone());
		let mut metrics = aggregator.subscribe();
		let aggregator_task = aggregator.start();

		// Surface the 1 Hz rollup in the logs
		let metrics_shutdown = shutdown.clone();
		let metrics_task = tokio::spawn(async move {
			loop {
				tokio::select! {
					changed = metrics.changed() => {
						if changed.is_err() {
							break;
						}
						let snapshot = metrics.borrow().clone();
						info!(
							active = snapshot.active_connections,
							total = snapshot.total_connections,
							messages = snapshot.total_messages,
							bytes = snapshot.total_bytes,
							"relay metrics"
						);
					}
					_ = metrics_shutdown.cancelled() => break,
				}
			}
		});

		let hub_config = HubConfig {
			server_url: self.config.server_url.clone(),
			error_url: self.config.error_url.clone(),
		};
		let (_hub, hub_task) = RelayHub::start(hub_config, Arc::new(NullNotifier), shutdown.clone());

		info!("relay service running, press ctrl-c to stop");
		if let Err(e) = tokio::signal::ctrl_c().await {
			error!("failed to listen for shutdown signal: {e}");
		}

		info!("shutting down");
		shutdown.cancel();
		registry.close_all();

		let _ = hub_task.await;
		let _ = aggregator_task.await;
		let _ = metrics_task.await;

		info!("relay service stopped");
		Ok(())
	}
}
