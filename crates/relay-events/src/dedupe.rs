use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_DEDUPE_WINDOW: Duration = Duration::from_secs(1);

/// Coalesces identical messages arriving inside a suppression window.
///
/// Only the first occurrence is acted upon; later identical texts inside the
/// window are rejected to prevent notification storms.
#[derive(Debug)]
pub struct DedupeWindow {
	window: Duration,
	last_seen: HashMap<String, Instant>,
}

impl DedupeWindow {
	pub fn new(window: Duration) -> Self {
		Self {
			window,
			last_seen: HashMap::new(),
		}
	}

	/// Whether `text` should be acted upon at the current time
	pub fn accept(&mut self, text: &str) -> bool {
		self.accept_at(text, Instant::now())
	}

	/// Clock-injected variant of [`accept`](Self::accept)
	pub fn accept_at(&mut self, text: &str, now: Instant) -> bool {
		self.prune(now);
		match self.last_seen.get(text) {
			Some(seen) if now.duration_since(*seen) < self.window => false,
			_ => {
				self.last_seen.insert(text.to_string(), now);
				true
			}
		}
	}

	fn prune(&mut self, now: Instant) {
		let window = self.window;
		self.last_seen.retain(|_, seen| now.duration_since(*seen) < window);
	}
}

impl Default for DedupeWindow {
	fn default() -> Self {
		Self::new(DEFAULT_DEDUPE_WINDOW)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_first_occurrence_accepted() {
		let mut window = DedupeWindow::default();
		assert!(window.accept("boom"));
	}

	#[test]
	fn test_duplicate_inside_window_rejected() {
		let mut window = DedupeWindow::default();
		let start = Instant::now();

		assert!(window.accept_at("boom", start));
		assert!(!window.accept_at("boom", start + Duration::from_millis(500)));
	}

	#[test]
	fn test_duplicate_after_window_accepted() {
		let mut window = DedupeWindow::default();
		let start = Instant::now();

		assert!(window.accept_at("boom", start));
		assert!(window.accept_at("boom", start + Duration::from_millis(2000)));
	}

	#[test]
	fn test_distinct_texts_do_not_suppress_each_other() {
		let mut window = DedupeWindow::default();
		let start = Instant::now();

		assert!(window.accept_at("boom", start));
		assert!(window.accept_at("bang", start + Duration::from_millis(100)));
	}

	#[test]
	fn test_stale_entries_are_pruned() {
		let mut window = DedupeWindow::new(Duration::from_millis(100));
		let start = Instant::now();

		window.accept_at("a", start);
		window.accept_at("b", start);
		window.accept_at("c", start + Duration::from_millis(500));
		assert_eq!(window.last_seen.len(), 1);
	}
}
