//! Version-stamped cache cell.

/// A cached value tagged with the key it was computed for. The value is
/// fresh only while the caller's current key equals the stamp.
#[derive(Debug, Clone)]
pub struct Memo<K, T> {
    stamp: Option<K>,
    value: T,
}

impl<K: PartialEq + Copy, T> Memo<K, T> {
    /// A stale cell around an initial value.
    pub fn new(value: T) -> Self {
        Self { stamp: None, value }
    }

    pub fn is_fresh(&self, key: K) -> bool {
        self.stamp == Some(key)
    }

    /// The value, if it was computed for `key`.
    pub fn get(&self, key: K) -> Option<&T> {
        if self.is_fresh(key) {
            Some(&self.value)
        } else {
            None
        }
    }

    /// Recomputes in place when stale, then returns the fresh value.
    pub fn refresh_with<F>(&mut self, key: K, update: F) -> &T
    where
        F: FnOnce(&mut T),
    {
        if !self.is_fresh(key) {
            update(&mut self.value);
            self.stamp = Some(key);
        }
        &self.value
    }
}
