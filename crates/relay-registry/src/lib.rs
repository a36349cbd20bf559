pub mod aggregator;
pub mod connection;
pub mod errors;
pub mod registry;

pub use aggregator::{compute, MetricsAggregator, RelayMetrics};
pub use connection::{Connection, ConnectionState};
pub use errors::RegistryError;
pub use registry::{spawn_monitor, Endpoint, Registry, TransportHandle, MESSAGE_LOG_CAPACITY};
