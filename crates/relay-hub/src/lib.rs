pub mod command;
pub mod context;
pub mod hub;
pub mod notify;

pub use command::{HubCommand, SendOutcome};
pub use context::{ContextSnapshot, ErrorReport, RelayContext, ERRORS_CAPACITY, EVENTS_CAPACITY, PATTERNS_CAPACITY};
pub use hub::{HubConfig, HubHandle, HubUpdate, RelayHub, ERROR_RETRY_INTERVAL, PRIMARY_RETRY_INTERVAL};
pub use notify::{Notifier, NullNotifier, LATENCY_NOTIFY_THRESHOLD};
