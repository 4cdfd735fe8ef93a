use super::TreeMap;
use crate::raw::RawRbTree;

impl<K, V> TreeMap<K, V> {
    /// Creates an empty map with capacity for at least `capacity` entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_collections::IntIntMap;
    ///
    /// let map = IntIntMap::with_capacity(16);
    /// assert!(map.is_empty());
    /// assert!(map.capacity() >= 16);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(capacity) for memory allocation.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        TreeMap {
            tree: RawRbTree::with_capacity(capacity),
        }
    }

    /// Creates an empty map that holds at most `max_len` entries.
    ///
    /// Once full, inserting a new key fails with
    /// [`Error::MemoryAllocationFailed`](crate::Error::MemoryAllocationFailed). Replacing the
    /// value of an existing key still succeeds.
    #[must_use]
    pub fn with_max_len(max_len: usize) -> Self {
        let mut tree = RawRbTree::new();
        tree.set_limit(max_len);
        TreeMap { tree }
    }

    /// Returns the number of entries the map can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.tree.capacity()
    }

    /// Returns the most entries the map will ever hold.
    #[must_use]
    pub const fn max_len(&self) -> usize {
        self.tree.limit()
    }
}
