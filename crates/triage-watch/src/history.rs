//! Bounded history store
//!
//! Fixed-capacity, insertion-ordered record keeper used for both RCA
//! reports and deployment announcements. Newest entries sit at the front;
//! once at capacity, every insertion evicts the oldest entry.

use std::collections::VecDeque;

/// Generic fixed-capacity container, newest first
#[derive(Debug, Clone)]
pub struct BoundedHistory<T> {
    capacity: usize,
    items: VecDeque<T>,
}

impl<T> BoundedHistory<T> {
    /// Create a store holding at most `capacity` entries
    ///
    /// A zero capacity is clamped to one so `push` always retains the
    /// newest entry.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            items: VecDeque::new(),
        }
    }

    /// Insert at the front, evicting the rearmost entry once at capacity
    pub fn push(&mut self, item: T) {
        self.items.push_front(item);
        while self.items.len() > self.capacity {
            self.items.pop_back();
        }
    }

    /// Up to `limit` entries from the front, newest first
    #[must_use]
    pub fn list(&self, limit: usize) -> Vec<T>
    where
        T: Clone,
    {
        self.items.iter().take(limit).cloned().collect()
    }

    /// Iterate newest first
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Mutable iteration, newest first
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }

    /// Number of stored entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Configured capacity
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_keeps_newest_first() {
        let mut history = BoundedHistory::new(5);
        history.push(1);
        history.push(2);
        history.push(3);

        assert_eq!(history.list(10), vec![3, 2, 1]);
        assert_eq!(history.list(2), vec![3, 2]);
    }

    #[test]
    fn capacity_evicts_oldest() {
        let capacity = 4;
        let mut history = BoundedHistory::new(capacity);
        for i in 0..=capacity {
            history.push(i);
        }

        assert_eq!(history.len(), capacity);
        // The very first pushed item is gone.
        assert!(!history.list(capacity).contains(&0));
        assert_eq!(history.list(capacity), vec![4, 3, 2, 1]);
    }

    #[test]
    fn zero_capacity_clamped() {
        let mut history = BoundedHistory::new(0);
        history.push("only");
        assert_eq!(history.len(), 1);
        assert_eq!(history.capacity(), 1);
    }

    #[test]
    fn list_on_empty() {
        let history: BoundedHistory<u32> = BoundedHistory::new(3);
        assert!(history.is_empty());
        assert!(history.list(5).is_empty());
    }
}
