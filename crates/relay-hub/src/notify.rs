use std::time::Duration;
use tracing::warn;

/// Updates reporting more than this fire the notifier. Fixed on purpose;
/// making it configurable invited threshold drift between installs.
pub const LATENCY_NOTIFY_THRESHOLD: Duration = Duration::from_millis(100);

/// Sink for high-latency alerts raised by the hub's dispatch loop.
///
/// Implementations should return quickly; the hub calls this inline.
pub trait Notifier: Send + Sync {
	fn high_latency(&self, latency: Duration);
}

/// Logs instead of notifying; the default for headless runs
pub struct NullNotifier;

impl Notifier for NullNotifier {
	fn high_latency(&self, latency: Duration) {
		warn!("high relay latency: {}ms", latency.as_millis());
	}
}
