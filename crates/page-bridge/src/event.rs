use serde::Serialize;
use serde_json::Value;

/// One observed DOM mutation, reduced to the fields the filters look at
#[derive(Debug, Clone, Default, Serialize)]
pub struct DomMutation {
	/// Lowercase tag names of added nodes
	pub added_tags: Vec<String>,
	/// Class attribute values of added nodes
	pub added_classes: Vec<String>,
	/// Attribute name, when the mutation changed one
	pub changed_attribute: Option<String>,
}

/// A page error or unhandled rejection
#[derive(Debug, Clone, Serialize)]
pub struct PageError {
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub source: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub stack: Option<String>,
}

/// One completed resource load from the page's performance stream
#[derive(Debug, Clone, Serialize)]
pub struct ResourceLoad {
	pub name: String,
	pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextSource {
	Selected,
	Pasted,
}

/// Text captured from a selection or paste, a code-detection candidate
#[derive(Debug, Clone, Serialize)]
pub struct TextCapture {
	pub text: String,
	pub source: TextSource,
}

/// Everything the page observers emit toward the bridge
#[derive(Debug, Clone)]
pub enum PageEvent {
	Mutation(DomMutation),
	Error(PageError),
	Resource(ResourceLoad),
	Text(TextCapture),
}

impl DomMutation {
	pub fn added(tag: &str, class: &str) -> Self {
		Self {
			added_tags: vec![tag.to_string()],
			added_classes: vec![class.to_string()],
			changed_attribute: None,
		}
	}

	pub fn attribute_change(name: &str) -> Self {
		Self {
			changed_attribute: Some(name.to_string()),
			..Self::default()
		}
	}
}

impl PageError {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			source: None,
			stack: None,
		}
	}

	pub fn detail(&self) -> Option<Value> {
		if self.source.is_none() && self.stack.is_none() {
			return None;
		}
		serde_json::to_value(self).ok()
	}
}
