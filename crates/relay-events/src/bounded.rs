use std::collections::VecDeque;

/// Fixed-capacity log that evicts its oldest entry on overflow.
///
/// Insertion order is arrival order; the only bound on memory growth in the
/// relay is this eviction policy.
#[derive(Debug, Clone)]
pub struct BoundedLog<T> {
	entries: VecDeque<T>,
	capacity: usize,
}

impl<T> BoundedLog<T> {
	pub fn new(capacity: usize) -> Self {
		Self {
			entries: VecDeque::with_capacity(capacity),
			capacity,
		}
	}

	/// Append an entry, evicting the oldest when full
	pub fn push(&mut self, entry: T) {
		if self.entries.len() == self.capacity {
			self.entries.pop_front();
		}
		self.entries.push_back(entry);
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	/// Oldest entry still retained
	pub fn front(&self) -> Option<&T> {
		self.entries.front()
	}

	/// Most recent entry
	pub fn back(&self) -> Option<&T> {
		self.entries.back()
	}

	/// Oldest-to-newest iteration
	pub fn iter(&self) -> impl Iterator<Item = &T> {
		self.entries.iter()
	}

	/// Newest-to-oldest iteration
	pub fn iter_newest_first(&self) -> impl Iterator<Item = &T> {
		self.entries.iter().rev()
	}

	pub fn clear(&mut self) {
		self.entries.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_push_below_capacity_keeps_everything() {
		let mut log = BoundedLog::new(3);
		log.push(1);
		log.push(2);
		assert_eq!(log.len(), 2);
		assert_eq!(log.front(), Some(&1));
		assert_eq!(log.back(), Some(&2));
	}

	#[test]
	fn test_overflow_evicts_oldest_first() {
		let mut log = BoundedLog::new(3);
		for i in 1..=5 {
			log.push(i);
		}
		assert_eq!(log.len(), 3);
		assert_eq!(log.iter().copied().collect::<Vec<_>>(), vec![3, 4, 5]);
	}

	#[test]
	fn test_length_never_exceeds_capacity() {
		let mut log = BoundedLog::new(1000);
		for i in 0..1050 {
			log.push(i);
		}
		assert_eq!(log.len(), 1000);
		// Oldest 50 evicted, first retained element is #51 (zero-based 50)
		assert_eq!(log.front(), Some(&50));
		assert_eq!(log.back(), Some(&1049));
	}

	#[test]
	fn test_newest_first_iteration() {
		let mut log = BoundedLog::new(2);
		log.push("a");
		log.push("b");
		log.push("c");
		assert_eq!(log.iter_newest_first().copied().collect::<Vec<_>>(), vec!["c", "b"]);
	}

	#[test]
	fn test_retains_most_recent_in_arrival_order() {
		let mut log = BoundedLog::new(4);
		for i in 0..100 {
			log.push(i);
			assert!(log.len() <= 4);
		}
		assert_eq!(log.iter().copied().collect::<Vec<_>>(), vec![96, 97, 98, 99]);
	}
}
