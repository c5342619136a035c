//! Fixed-capacity circular buffer.

/// Appends until full, then overwrites the oldest element.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<T>,
    capacity: usize,
    head: usize,
}

impl<T> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            head: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    /// Slot of the oldest element once the buffer has wrapped.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Inserts `item`, returning the element it displaced. With zero
    /// capacity the item itself comes back.
    pub fn push(&mut self, item: T) -> Option<T> {
        if self.capacity == 0 {
            return Some(item);
        }
        if self.slots.len() < self.capacity {
            self.slots.push(item);
            return None;
        }
        let old = std::mem::replace(&mut self.slots[self.head], item);
        self.head = (self.head + 1) % self.capacity;
        Some(old)
    }

    /// Elements in storage order (not age order).
    pub fn as_slice(&self) -> &[T] {
        &self.slots
    }

    /// Elements oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let (newer, older) = self.slots.split_at(self.head);
        older.iter().chain(newer.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_then_wrap() {
        let mut ring = RingBuffer::new(3);
        assert_eq!(ring.push(1), None);
        assert_eq!(ring.push(2), None);
        assert_eq!(ring.push(3), None);
        assert!(ring.is_full());
        assert_eq!(ring.push(4), Some(1));
        assert_eq!(ring.push(5), Some(2));
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(ring.as_slice(), &[4, 5, 3]);
        assert_eq!(ring.head(), 2);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut ring = RingBuffer::new(4);
        for i in 0..50 {
            ring.push(i);
            assert!(ring.len() <= 4);
        }
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![46, 47, 48, 49]);
    }

    #[test]
    fn test_zero_capacity_rejects() {
        let mut ring = RingBuffer::new(0);
        assert_eq!(ring.push(7), Some(7));
        assert!(ring.is_empty());
    }
}
