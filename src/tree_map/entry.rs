use core::fmt;

/// One key/value pair stored in a [`TreeMap`](crate::TreeMap).
///
/// Entries are what a map's [`Item`](crate::Item)s name: [`TreeMap::entry`](crate::TreeMap::entry)
/// borrows one, and the map's [`Stream`](crate::Stream) implementation yields them. The key is
/// immutable while the entry is in a map; the value is replaced through
/// [`TreeMap::entry_set_value`](crate::TreeMap::entry_set_value).
///
/// # Examples
///
/// ```
/// use rbtree_collections::IntIntMap;
///
/// let mut map = IntIntMap::new();
/// let item = map.add(1, 100).unwrap();
///
/// let entry = map.entry(item).unwrap();
/// assert_eq!(entry.key(), &1);
/// assert_eq!(entry.value(), &100);
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
}

impl<K, V> Entry<K, V> {
    /// Pairs `key` with `value`.
    #[must_use]
    pub const fn new(key: K, value: V) -> Self {
        Entry { key, value }
    }

    /// Returns a reference to the key.
    #[must_use]
    pub const fn key(&self) -> &K {
        &self.key
    }

    /// Returns a reference to the value.
    #[must_use]
    pub const fn value(&self) -> &V {
        &self.value
    }

    /// Splits the entry into its key and value.
    #[must_use]
    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Entry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry").field("key", &self.key).field("value", &self.value).finish()
    }
}
