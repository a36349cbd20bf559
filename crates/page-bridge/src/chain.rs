use crate::event::PageError;

type Handler = Box<dyn Fn(&PageError) + Send + Sync>;

/// Error-handler chain that never replaces an installed handler.
///
/// Installing prepends; dispatch runs the newest handler first and then every
/// previously installed one, so earlier observers keep seeing errors.
#[derive(Default)]
pub struct ErrorChain {
	handlers: Vec<Handler>,
}

impl ErrorChain {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn install<F>(&mut self, handler: F)
	where
		F: Fn(&PageError) + Send + Sync + 'static,
	{
		self.handlers.insert(0, Box::new(handler));
	}

	pub fn dispatch(&self, error: &PageError) {
		for handler in &self.handlers {
			handler(error);
		}
	}

	pub fn len(&self) -> usize {
		self.handlers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.handlers.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::{Arc, Mutex};

	#[test]
	fn test_every_installed_handler_still_runs() {
		let seen = Arc::new(Mutex::new(Vec::new()));
		let mut chain = ErrorChain::new();

		for name in ["first", "second", "third"] {
			let seen = Arc::clone(&seen);
			chain.install(move |error| seen.lock().unwrap().push(format!("{name}: {}", error.message)));
		}

		chain.dispatch(&PageError::new("boom"));

		let seen = seen.lock().unwrap();
		assert_eq!(seen.len(), 3);
		// Newest first, but nothing dropped
		assert_eq!(seen[0], "third: boom");
		assert_eq!(seen[2], "first: boom");
	}

	#[test]
	fn test_empty_chain_dispatch_is_a_no_op() {
		let chain = ErrorChain::new();
		chain.dispatch(&PageError::new("boom"));
		assert!(chain.is_empty());
	}
}
