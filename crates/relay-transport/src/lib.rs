pub mod error;
pub mod event;
pub mod retry;
pub mod sse;
pub mod ws;

pub use error::TransportError;
pub use event::{Inbound, TransportEvent};
pub use retry::{RetryConfig, RetryPolicy};
pub use sse::{SseClient, SseConfig};
pub use ws::{WsClient, WsConfig};
