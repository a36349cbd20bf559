use crate::envelope::Payload;
use crate::types::{EndpointId, MessageId};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// One received payload, immutable once created
#[derive(Debug, Clone)]
pub struct MessageRecord {
	pub id: MessageId,
	pub connection_id: EndpointId,
	pub timestamp: DateTime<Utc>,
	/// Event label; the generic label when the transport did not tag it
	pub event_type: String,
	pub data: Payload,
	/// UTF-8 byte length of the raw frame
	pub size: usize,
	/// Derived as receipt time minus the payload's `timestamp` field
	pub latency: Option<Duration>,
}

impl MessageRecord {
	pub fn new(connection_id: EndpointId, event_type: String, data: Payload, size: usize) -> Self {
		let timestamp = Utc::now();
		let latency = data.timestamp_ms().and_then(|sent_ms| {
			let delta = timestamp.timestamp_millis().saturating_sub(sent_ms);
			u64::try_from(delta).ok().map(Duration::from_millis)
		});

		Self {
			id: MessageId::new(),
			connection_id,
			timestamp,
			event_type,
			data,
			size,
			latency,
		}
	}
}
