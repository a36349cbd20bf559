use thiserror::Error;

/// Failures surfaced to callers directly.
///
/// Connection-level failures never appear here; they travel the event stream
/// as `Errored` and feed the retry loop instead.
#[derive(Error, Debug)]
pub enum TransportError {
	#[error("payload serialization failed: {0}")]
	Serialize(#[from] serde_json::Error),
}
