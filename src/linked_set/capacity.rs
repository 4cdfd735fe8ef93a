use super::LinkedTreeSet;
use crate::raw::{RawList, RawRbTree};

impl<T> LinkedTreeSet<T> {
    /// Creates an empty set with room for at least `capacity` values in both indices.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_collections::LinkedIntSet;
    ///
    /// let set = LinkedIntSet::with_capacity(8);
    /// assert!(set.capacity() >= 8);
    /// ```
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        LinkedTreeSet {
            list: RawList::with_capacity(capacity),
            index: RawRbTree::with_capacity(capacity),
        }
    }

    /// Creates an empty set that holds at most `max_len` values.
    ///
    /// Once full, every inserting operation fails with
    /// [`Error::MemoryAllocationFailed`](crate::Error::MemoryAllocationFailed).
    #[must_use]
    pub fn with_max_len(max_len: usize) -> Self {
        let mut list = RawList::new();
        list.set_limit(max_len);
        let mut index = RawRbTree::new();
        index.set_limit(max_len);
        LinkedTreeSet { list, index }
    }

    /// Returns the number of values the set can hold without reallocating either index.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.list.capacity().min(self.index.capacity())
    }

    /// Returns the most values the set will hold, as set by [`with_max_len`](Self::with_max_len).
    #[must_use]
    pub const fn max_len(&self) -> usize {
        self.list.limit()
    }
}
