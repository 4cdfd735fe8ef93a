use super::TreeSet;
use crate::raw::RawRbTree;

impl<T> TreeSet<T> {
    /// Creates an empty set with capacity for at least `capacity` values.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_collections::IntSet;
    ///
    /// let set = IntSet::with_capacity(16);
    /// assert!(set.is_empty());
    /// assert!(set.capacity() >= 16);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(capacity) for memory allocation.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        TreeSet {
            tree: RawRbTree::with_capacity(capacity),
        }
    }

    /// Creates an empty set that holds at most `max_len` values.
    ///
    /// Once full, [`add`](TreeSet::add) fails with
    /// [`Error::MemoryAllocationFailed`](crate::Error::MemoryAllocationFailed), exactly as it does
    /// when the allocator itself gives out.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_collections::{Error, IntSet};
    ///
    /// let mut set = IntSet::with_max_len(1);
    /// set.add(1).unwrap();
    /// assert_eq!(set.add(2), Err(Error::MemoryAllocationFailed));
    /// assert_eq!(set.len(), 1);
    /// ```
    #[must_use]
    pub fn with_max_len(max_len: usize) -> Self {
        let mut tree = RawRbTree::new();
        tree.set_limit(max_len);
        TreeSet { tree }
    }

    /// Returns the number of values the set can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.tree.capacity()
    }

    /// Returns the most values the set will ever hold.
    #[must_use]
    pub const fn max_len(&self) -> usize {
        self.tree.limit()
    }
}
