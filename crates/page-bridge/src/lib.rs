pub mod bridge;
pub mod chain;
pub mod event;
pub mod filters;

pub use bridge::spawn_bridge;
pub use chain::ErrorChain;
pub use event::{DomMutation, PageError, PageEvent, ResourceLoad, TextCapture, TextSource};
pub use filters::{is_code_capture, is_relevant_mutation, is_relevant_resource};
