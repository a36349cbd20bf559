pub mod bounded;
pub mod dedupe;
pub mod envelope;
pub mod record;
pub mod types;

pub use bounded::BoundedLog;
pub use dedupe::DedupeWindow;
pub use envelope::{Envelope, EventKind, Payload};
pub use record::MessageRecord;
pub use types::{EndpointId, MessageId};
