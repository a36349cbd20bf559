use std::time::Duration;

/// Fixed-interval reconnect policy.
///
/// The delay never grows between attempts; `max_reconnect_attempts: None`
/// retries forever (the relay's upstream sockets use this).
#[derive(Debug, Clone)]
pub struct RetryConfig {
	pub reconnect_interval: Duration,
	pub max_reconnect_attempts: Option<u32>,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			reconnect_interval: Duration::from_millis(3000),
			max_reconnect_attempts: Some(5),
		}
	}
}

impl RetryConfig {
	pub fn forever(reconnect_interval: Duration) -> Self {
		Self {
			reconnect_interval,
			max_reconnect_attempts: None,
		}
	}
}

#[derive(Debug)]
pub struct RetryPolicy {
	config: RetryConfig,
	attempts: u32,
}

impl RetryPolicy {
	pub fn new(config: RetryConfig) -> Self {
		Self { config, attempts: 0 }
	}

	/// Reconnect attempts since the last successful open
	pub fn attempts(&self) -> u32 {
		self.attempts
	}

	/// Register a failure and return the delay before the next attempt.
	///
	/// `None` means the ceiling is exhausted: the caller must stop retrying
	/// until an explicit reset.
	pub fn next_attempt(&mut self) -> Option<Duration> {
		if let Some(max) = self.config.max_reconnect_attempts {
			if self.attempts >= max {
				return None;
			}
		}
		self.attempts += 1;
		Some(self.config.reconnect_interval)
	}

	/// Reset after a successful open
	pub fn record_success(&mut self) {
		self.attempts = 0;
	}

	/// Manual reset (force-reconnect path)
	pub fn reset(&mut self) {
		self.attempts = 0;
	}
}
