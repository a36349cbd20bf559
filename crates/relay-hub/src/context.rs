use chrono::{DateTime, Utc};
use relay_events::BoundedLog;
use serde::Serialize;
use serde_json::{Map, Value};

pub const PATTERNS_CAPACITY: usize = 50;
pub const EVENTS_CAPACITY: usize = 100;
pub const ERRORS_CAPACITY: usize = 10;

/// One accepted error report, after duplicate suppression
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub detail: Option<Value>,
	pub at: DateTime<Utc>,
}

impl ErrorReport {
	pub fn new(message: impl Into<String>, detail: Option<Value>) -> Self {
		Self {
			message: message.into(),
			detail,
			at: Utc::now(),
		}
	}
}

/// Relay state owned by the hub's dispatch task.
///
/// Constructed by the hub and never shared; everything outside the hub sees
/// it through [`ContextSnapshot`] copies.
#[derive(Debug)]
pub struct RelayContext {
	pub connected: bool,
	pub last_update: Option<DateTime<Utc>>,
	metrics: Map<String, Value>,
	patterns: BoundedLog<Value>,
	events: BoundedLog<Value>,
	errors: BoundedLog<ErrorReport>,
}

impl RelayContext {
	pub fn new() -> Self {
		Self {
			connected: false,
			last_update: None,
			metrics: Map::new(),
			patterns: BoundedLog::new(PATTERNS_CAPACITY),
			events: BoundedLog::new(EVENTS_CAPACITY),
			errors: BoundedLog::new(ERRORS_CAPACITY),
		}
	}

	/// Merge a full server state push into the context (shallow).
	///
	/// Recognized containers replace their local counterpart; every other
	/// top-level key lands in the metrics map.
	pub fn apply_sync(&mut self, state: &Value) {
		let Some(object) = state.as_object() else {
			return;
		};

		for (key, value) in object {
			match (key.as_str(), value) {
				("metrics", Value::Object(map)) => self.merge_metrics(map),
				("patterns", Value::Array(items)) => {
					self.patterns.clear();
					for item in items {
						self.patterns.push(item.clone());
					}
				}
				("events", Value::Array(items)) => {
					self.events.clear();
					for item in items {
						self.events.push(item.clone());
					}
				}
				_ => {
					self.metrics.insert(key.clone(), value.clone());
				}
			}
		}
		self.last_update = Some(Utc::now());
	}

	/// Fold one incremental update into the context.
	///
	/// Returns the update's reported latency in milliseconds, when present,
	/// so the caller can decide whether to raise a notification.
	pub fn apply_update(&mut self, update: &Value) -> Option<u64> {
		let object = update.as_object()?;

		if let Some(event) = object.get("event") {
			self.events.push(event.clone());
		}
		if let Some(Value::Array(items)) = object.get("patterns") {
			for item in items {
				self.patterns.push(item.clone());
			}
		}
		if let Some(Value::Object(map)) = object.get("metrics") {
			self.merge_metrics(map);
		}
		self.last_update = Some(Utc::now());

		object.get("latency").and_then(Value::as_u64)
	}

	pub fn record_error(&mut self, report: ErrorReport) {
		self.errors.push(report);
		self.last_update = Some(Utc::now());
	}

	/// Copy for readers outside the hub task, newest entries first
	pub fn snapshot(&self) -> ContextSnapshot {
		ContextSnapshot {
			connected: self.connected,
			last_update: self.last_update,
			metrics: self.metrics.clone(),
			patterns: self.patterns.iter_newest_first().cloned().collect(),
			events: self.events.iter_newest_first().cloned().collect(),
			errors: self.errors.iter_newest_first().cloned().collect(),
		}
	}

	fn merge_metrics(&mut self, map: &Map<String, Value>) {
		for (key, value) in map {
			self.metrics.insert(key.clone(), value.clone());
		}
	}
}

impl Default for RelayContext {
	fn default() -> Self {
		Self::new()
	}
}

/// Point-in-time copy of the relay context
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextSnapshot {
	pub connected: bool,
	pub last_update: Option<DateTime<Utc>>,
	pub metrics: Map<String, Value>,
	pub patterns: Vec<Value>,
	pub events: Vec<Value>,
	pub errors: Vec<ErrorReport>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_sync_merges_metrics_and_loose_keys() {
		let mut ctx = RelayContext::new();
		ctx.apply_sync(&json!({
			"metrics": { "cpu": 40 },
			"build": "ok"
		}));
		ctx.apply_sync(&json!({
			"metrics": { "cpu": 55, "mem": 12 }
		}));

		let snap = ctx.snapshot();
		assert_eq!(snap.metrics["cpu"], 55);
		assert_eq!(snap.metrics["mem"], 12);
		assert_eq!(snap.metrics["build"], "ok");
		assert!(snap.last_update.is_some());
	}

	#[test]
	fn test_sync_replaces_pattern_and_event_lists() {
		let mut ctx = RelayContext::new();
		ctx.apply_update(&json!({ "event": {"id": "stale"} }));
		ctx.apply_sync(&json!({
			"patterns": ["a", "b"],
			"events": [{"id": "fresh"}]
		}));

		let snap = ctx.snapshot();
		assert_eq!(snap.patterns, vec![json!("b"), json!("a")]);
		assert_eq!(snap.events, vec![json!({"id": "fresh"})]);
	}

	#[test]
	fn test_update_appends_and_reports_latency() {
		let mut ctx = RelayContext::new();
		let latency = ctx.apply_update(&json!({
			"event": {"id": 1},
			"patterns": ["p1"],
			"metrics": {"cpu": 10},
			"latency": 150
		}));

		assert_eq!(latency, Some(150));
		let snap = ctx.snapshot();
		assert_eq!(snap.events.len(), 1);
		assert_eq!(snap.patterns, vec![json!("p1")]);
		assert_eq!(snap.metrics["cpu"], 10);
	}

	#[test]
	fn test_update_without_latency_reports_none() {
		let mut ctx = RelayContext::new();
		assert_eq!(ctx.apply_update(&json!({ "event": {} })), None);
		assert_eq!(ctx.apply_update(&json!("not an object")), None);
	}

	#[test]
	fn test_bounded_lists_keep_newest() {
		let mut ctx = RelayContext::new();
		for i in 0..EVENTS_CAPACITY + 20 {
			ctx.apply_update(&json!({ "event": i }));
		}
		for i in 0..ERRORS_CAPACITY + 5 {
			ctx.record_error(ErrorReport::new(format!("err {i}"), None));
		}

		let snap = ctx.snapshot();
		assert_eq!(snap.events.len(), EVENTS_CAPACITY);
		assert_eq!(snap.events[0], json!(EVENTS_CAPACITY + 19));
		assert_eq!(snap.errors.len(), ERRORS_CAPACITY);
		assert_eq!(snap.errors[0].message, format!("err {}", ERRORS_CAPACITY + 4));
	}
}
