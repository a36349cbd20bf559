use relay_events::Payload;

/// One inbound frame after the parse attempt
#[derive(Debug, Clone, PartialEq)]
pub struct Inbound {
	pub payload: Payload,
	/// UTF-8 byte length of the raw frame
	pub size: usize,
	/// SSE named-event label; `None` on WebSocket and default SSE events
	pub event: Option<String>,
}

impl Inbound {
	pub fn from_text(text: &str) -> Self {
		Self {
			payload: Payload::parse(text),
			size: text.len(),
			event: None,
		}
	}

	pub fn with_event(mut self, event: &str) -> Self {
		if !event.is_empty() && event != "message" {
			self.event = Some(event.to_string());
		}
		self
	}
}

/// Typed per-connection event stream.
///
/// Each transport runs one dispatch task emitting these over a single
/// channel; consumers run one receive loop instead of installing callbacks.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
	Opened,
	Message(Inbound),
	Errored(String),
	Closed,
}
