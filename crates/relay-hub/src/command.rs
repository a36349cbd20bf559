use crate::context::{ContextSnapshot, ErrorReport};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::oneshot;

/// Reply for upstream-forwarding commands
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendOutcome {
	pub success: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl SendOutcome {
	pub fn ok() -> Self {
		Self { success: true, error: None }
	}

	pub fn failed(error: impl Into<String>) -> Self {
		Self {
			success: false,
			error: Some(error.into()),
		}
	}
}

/// Control surface of the hub, one request per message.
///
/// Replies travel over oneshot channels; fire-and-forget commands have none.
#[derive(Debug)]
pub enum HubCommand {
	GetContext { reply: oneshot::Sender<ContextSnapshot> },
	SendToServer { data: Value, reply: oneshot::Sender<SendOutcome> },
	Reconnect { reply: oneshot::Sender<bool> },
	ErrorDetected { report: ErrorReport },
	AiPrompt { data: Value, reply: oneshot::Sender<SendOutcome> },
}
