use relayd::{Config, RelayService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::registry()
		.with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "relayd=info,relay_hub=info,relay_registry=info,relay_transport=info".into()))
		.with(tracing_subscriber::fmt::layer())
		.init();

	let config = Config::from_env()?;
	tracing::info!("configuration loaded, upstream: {}", config.server_url);

	let service = RelayService::new(config);
	service.run().await?;

	tracing::info!("relayd shutdown complete");
	Ok(())
}
