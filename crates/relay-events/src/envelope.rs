use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Wire-level event labels carried in the `type` field of JSON frames
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EventKind {
	ContextSync,
	ContextUpdate,
	GetContext,
	SendToServer,
	Reconnect,
	ErrorDetected,
	AiPrompt,
	GithubEvent,
	ServerLog,
	SseUpdate,
	Error,
	/// Default label for untagged frames
	#[default]
	Message,
	/// Preserved label for types this relay does not consume
	Unknown(String),
}

impl EventKind {
	pub fn label(&self) -> &str {
		match self {
			EventKind::ContextSync => "context-sync",
			EventKind::ContextUpdate => "context-update",
			EventKind::GetContext => "get-context",
			EventKind::SendToServer => "send-to-server",
			EventKind::Reconnect => "reconnect",
			EventKind::ErrorDetected => "error-detected",
			EventKind::AiPrompt => "ai-prompt",
			EventKind::GithubEvent => "github-event",
			EventKind::ServerLog => "server-log",
			EventKind::SseUpdate => "sse-update",
			EventKind::Error => "error",
			EventKind::Message => "message",
			EventKind::Unknown(label) => label,
		}
	}
}

impl fmt::Display for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.label())
	}
}

impl FromStr for EventKind {
	type Err = std::convert::Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s {
			"context-sync" => EventKind::ContextSync,
			"context-update" => EventKind::ContextUpdate,
			"get-context" => EventKind::GetContext,
			"send-to-server" => EventKind::SendToServer,
			"reconnect" => EventKind::Reconnect,
			"error-detected" => EventKind::ErrorDetected,
			"ai-prompt" => EventKind::AiPrompt,
			"github-event" => EventKind::GithubEvent,
			"server-log" => EventKind::ServerLog,
			"sse-update" => EventKind::SseUpdate,
			"error" => EventKind::Error,
			"message" => EventKind::Message,
			other => EventKind::Unknown(other.to_string()),
		})
	}
}

/// Inbound payload after the parse attempt.
///
/// Unparseable frames are delivered raw rather than dropped; the same policy
/// applies to both WebSocket and SSE transports.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
	Json(Value),
	Raw(String),
}

impl Payload {
	/// Parse a raw text frame, falling back to raw delivery
	pub fn parse(text: &str) -> Self {
		match serde_json::from_str::<Value>(text) {
			Ok(value) => Payload::Json(value),
			Err(_) => Payload::Raw(text.to_string()),
		}
	}

	pub fn is_raw(&self) -> bool {
		matches!(self, Payload::Raw(_))
	}

	/// Epoch-millisecond `timestamp` field, when the payload carries one
	pub fn timestamp_ms(&self) -> Option<i64> {
		match self {
			Payload::Json(value) => value.get("timestamp").and_then(Value::as_i64),
			Payload::Raw(_) => None,
		}
	}

	pub fn as_json(&self) -> Option<&Value> {
		match self {
			Payload::Json(value) => Some(value),
			Payload::Raw(_) => None,
		}
	}
}

/// One JSON text frame: `{type: string, ...payload}`
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
	pub kind: EventKind,
	pub payload: Value,
}

impl Envelope {
	pub fn new(kind: EventKind, payload: Value) -> Self {
		Self { kind, payload }
	}

	/// Build an envelope from an already-parsed value.
	///
	/// Frames without a string `type` field get the generic label and keep
	/// the whole value as payload.
	pub fn from_value(value: Value) -> Self {
		match value {
			Value::Object(mut map) => {
				let kind = map
					.remove("type")
					.and_then(|t| t.as_str().map(|s| s.parse::<EventKind>().unwrap_or_default()))
					.unwrap_or_default();
				Self {
					kind,
					payload: Value::Object(map),
				}
			}
			other => Self {
				kind: EventKind::Message,
				payload: other,
			},
		}
	}

	/// Parse a raw text frame into an envelope
	pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str::<Value>(text).map(Self::from_value)
	}

	/// Serialize back to the `{type, ...payload}` wire form
	pub fn to_value(&self) -> Value {
		match &self.payload {
			Value::Object(map) => {
				let mut out = map.clone();
				out.insert("type".to_string(), Value::String(self.kind.label().to_string()));
				Value::Object(out)
			}
			other => serde_json::json!({ "type": self.kind.label(), "data": other }),
		}
	}

	pub fn to_json_string(&self) -> String {
		self.to_value().to_string()
	}
}
