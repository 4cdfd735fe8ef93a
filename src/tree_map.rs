use alloc::string::String;
use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;
use core::mem;
use core::ptr::NonNull;

use tracing::debug;

use crate::capability::{Collection, Item, Map, SortedMap, Stream, copy_entries_into};
use crate::error::{Error, Result};
use crate::raw::{Handle, RawRbTree, Search, Slot, TreeIter};

mod capacity;
mod entry;

pub use entry::Entry;

/// A map from `i32` to `i32` in ascending key order.
pub type IntIntMap = TreeMap<i32, i32>;

/// A map from owned strings to pointers the map does not own.
///
/// The map never dereferences or frees the pointers; keeping them valid is the caller's business.
pub type StrPtrMap<T> = TreeMap<String, NonNull<T>>;

/// An ordered map based on a red-black tree.
///
/// Keys and values are moved into the map and dropped on removal (or handed back by
/// [`take`](TreeMap::take) and [`take_item`](TreeMap::take_item)). Traversal through
/// [`first`](TreeMap::first) and [`next`](TreeMap::next), or through [`iter`](TreeMap::iter),
/// visits entries in ascending key order.
///
/// # Examples
///
/// ```
/// use rbtree_collections::{Error, IntIntMap};
///
/// let mut map = IntIntMap::new();
/// map.add(1, 10).unwrap();
/// map.add(2, 20).unwrap();
/// assert_eq!(map.add(1, 11), Err(Error::KeyAlreadyExists));
///
/// assert_eq!(map.set(1, 11), Ok(Some(10)));
/// assert_eq!(map.get_value(&1), Ok(&11));
///
/// let item = map.higher(&1).unwrap();
/// assert_eq!(map.entry(item).unwrap().key(), &2);
/// ```
pub struct TreeMap<K, V> {
    tree: RawRbTree<Entry<K, V>>,
}

/// An iterator over the entries of a [`TreeMap`], in ascending key order.
///
/// This `struct` is created by the [`iter`](TreeMap::iter) method on [`TreeMap`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K, V> {
    inner: TreeIter<'a, Entry<K, V>>,
}

impl<K, V> TreeMap<K, V> {
    /// Makes a new, empty `TreeMap`.
    ///
    /// Does not allocate anything on its own.
    #[must_use]
    pub const fn new() -> Self {
        TreeMap { tree: RawRbTree::new() }
    }

    /// Returns the number of entries in the map.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if the map contains no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Drops every entry in the map.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Gets an iterator over the entries of the map, sorted by key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter { inner: self.tree.iter() }
    }

    /// Returns the item of the entry with the smallest key.
    ///
    /// # Errors
    ///
    /// [`Error::MapIsEmpty`] if the map is empty.
    pub fn first(&self) -> Result<Item> {
        self.tree.first().map(Item).ok_or(Error::MapIsEmpty)
    }

    /// Returns the item of the entry with the largest key.
    ///
    /// # Errors
    ///
    /// [`Error::MapIsEmpty`] if the map is empty.
    pub fn last(&self) -> Result<Item> {
        self.tree.last().map(Item).ok_or(Error::MapIsEmpty)
    }

    /// Returns the item of the entry with the next larger key.
    ///
    /// # Errors
    ///
    /// [`Error::ItemIsInvalid`] if `item` is stale, [`Error::EndOfSequence`] at the largest key.
    pub fn next(&self, item: Item) -> Result<Item> {
        let h = self.live(item)?;
        self.tree.next(h).map(Item).ok_or(Error::EndOfSequence)
    }

    /// Returns the item of the entry with the next smaller key.
    ///
    /// # Errors
    ///
    /// [`Error::ItemIsInvalid`] if `item` is stale, [`Error::EndOfSequence`] at the smallest key.
    pub fn prev(&self, item: Item) -> Result<Item> {
        let h = self.live(item)?;
        self.tree.prev(h).map(Item).ok_or(Error::EndOfSequence)
    }

    /// Returns the entry `item` names.
    ///
    /// # Errors
    ///
    /// [`Error::ItemIsInvalid`] if `item` is stale.
    pub fn entry(&self, item: Item) -> Result<&Entry<K, V>> {
        self.tree.try_get(item.0).ok_or(Error::ItemIsInvalid)
    }

    /// Replaces the value of the entry `item` names and returns the old value.
    ///
    /// # Errors
    ///
    /// [`Error::ItemIsInvalid`] if `item` is stale.
    pub fn entry_set_value(&mut self, item: Item, value: V) -> Result<V> {
        let h = self.live(item)?;
        Ok(mem::replace(&mut self.tree.get_mut(h).value, value))
    }

    /// Removes and drops the entry `item` names.
    ///
    /// # Errors
    ///
    /// [`Error::ItemIsInvalid`] if `item` is stale.
    pub fn remove_item(&mut self, item: Item) -> Result<()> {
        self.take_item(item).map(drop)
    }

    /// Removes the entry `item` names and returns its key and value.
    ///
    /// # Errors
    ///
    /// [`Error::ItemIsInvalid`] if `item` is stale.
    pub fn take_item(&mut self, item: Item) -> Result<(K, V)> {
        let h = self.live(item)?;
        Ok(self.tree.remove(h).into_parts())
    }

    fn live(&self, item: Item) -> Result<Handle> {
        if self.tree.contains(item.0) { Ok(item.0) } else { Err(Error::ItemIsInvalid) }
    }
}

impl<K: Ord, V> TreeMap<K, V> {
    /// Adds a new entry and returns its item.
    ///
    /// # Errors
    ///
    /// - [`Error::KeyAlreadyExists`] if the key is present; the map is unchanged.
    /// - [`Error::MemoryAllocationFailed`] if no node could be allocated; the map is unchanged.
    ///
    /// In both cases `key` and `value` are dropped.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn add(&mut self, key: K, value: V) -> Result<Item> {
        let slot = match self.tree.search_by(|e| e.key.cmp(&key)) {
            Search::Found(_) => return Err(Error::KeyAlreadyExists),
            Search::Vacant(slot) => slot,
        };
        self.commit(slot, Entry::new(key, value))
    }

    /// Inserts an entry, replacing the value if the key is already present.
    ///
    /// Returns the replaced value, if any. The stored key is kept when a value is replaced.
    ///
    /// # Errors
    ///
    /// [`Error::MemoryAllocationFailed`] if the key is new and no node could be allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_collections::IntIntMap;
    ///
    /// let mut map = IntIntMap::new();
    /// assert_eq!(map.set(7, 1), Ok(None));
    /// assert_eq!(map.set(7, 2), Ok(Some(1)));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn set(&mut self, key: K, value: V) -> Result<Option<V>> {
        match self.tree.search_by(|e| e.key.cmp(&key)) {
            Search::Found(h) => Ok(Some(mem::replace(&mut self.tree.get_mut(h).value, value))),
            Search::Vacant(slot) => self.commit(slot, Entry::new(key, value)).map(|_| None),
        }
    }

    fn commit(&mut self, slot: Slot, entry: Entry<K, V>) -> Result<Item> {
        match self.tree.insert_at(slot, entry) {
            Ok(h) => Ok(Item(h)),
            Err(_rejected) => {
                debug!(len = self.tree.len(), "tree map node allocation failed");
                Err(Error::MemoryAllocationFailed)
            }
        }
    }

    /// Removes and drops the entry for `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if the key is not present.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<()>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.take(key).map(drop)
    }

    /// Removes the entry for `key` and returns its value.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if the key is not present.
    pub fn take<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let h = self.find(key).ok_or(Error::KeyNotFound)?;
        Ok(self.tree.remove(h).value)
    }

    /// Returns `true` if the map contains an entry for `key`.
    #[must_use]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.find(key).is_some()
    }

    /// Returns the item of the entry for `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if the key is not present.
    pub fn get<Q>(&self, key: &Q) -> Result<Item>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.find(key).map(Item).ok_or(Error::KeyNotFound)
    }

    /// Returns a reference to the value for `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if the key is not present.
    pub fn get_value<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.find(key).map(|h| &self.tree.get(h).value).ok_or(Error::KeyNotFound)
    }

    /// Returns the item of the entry with the least key greater than or equal to `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if every key is less than `key`.
    pub fn ceiling<Q>(&self, key: &Q) -> Result<Item>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.tree.ceiling_by(|e| e.key.borrow().cmp(key)).map(Item).ok_or(Error::KeyNotFound)
    }

    /// Returns the item of the entry with the greatest key less than or equal to `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if every key is greater than `key`.
    pub fn floor<Q>(&self, key: &Q) -> Result<Item>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.tree.floor_by(|e| e.key.borrow().cmp(key)).map(Item).ok_or(Error::KeyNotFound)
    }

    /// Returns the item of the entry with the least key strictly greater than `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if no key is greater than `key`.
    pub fn higher<Q>(&self, key: &Q) -> Result<Item>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.tree.higher_by(|e| e.key.borrow().cmp(key)).map(Item).ok_or(Error::KeyNotFound)
    }

    /// Returns the item of the entry with the greatest key strictly less than `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if no key is less than `key`.
    pub fn lower<Q>(&self, key: &Q) -> Result<Item>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.tree.lower_by(|e| e.key.borrow().cmp(key)).map(Item).ok_or(Error::KeyNotFound)
    }

    /// Builds a map from clones of every entry of `source`.
    ///
    /// Later entries with an already-copied key are skipped (the first one wins).
    ///
    /// # Errors
    ///
    /// [`Error::MemoryAllocationFailed`] if a node could not be allocated, or any traversal error
    /// `source` reports.
    pub fn from_stream<S>(source: &S) -> Result<Self>
    where
        S: Stream<Element = Entry<K, V>> + ?Sized,
        K: Clone,
        V: Clone,
    {
        let mut map = Self::new();
        map.extend_from_stream(source)?;
        Ok(map)
    }

    /// Adds clones of every entry of `source` whose key is not already present.
    ///
    /// Returns the number of entries added. On failure the map keeps the entries added so far.
    ///
    /// # Errors
    ///
    /// As for [`from_stream`](Self::from_stream).
    pub fn extend_from_stream<S>(&mut self, source: &S) -> Result<usize>
    where
        S: Stream<Element = Entry<K, V>> + ?Sized,
        K: Clone,
        V: Clone,
    {
        copy_entries_into(source, self)
    }

    fn find<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.tree.find_by(|e| e.key.borrow().cmp(key))
    }
}

impl<K, V> Stream for TreeMap<K, V> {
    type Element = Entry<K, V>;

    fn first(&self) -> Result<Item> {
        TreeMap::first(self)
    }

    fn next(&self, item: Item) -> Result<Item> {
        TreeMap::next(self, item)
    }

    fn element(&self, item: Item) -> Result<&Entry<K, V>> {
        TreeMap::entry(self, item)
    }

    fn remove_item(&mut self, item: Item) -> Result<()> {
        TreeMap::remove_item(self, item)
    }
}

impl<K, V> Collection for TreeMap<K, V> {
    fn count(&self) -> usize {
        self.len()
    }

    fn last(&self) -> Result<Item> {
        TreeMap::last(self)
    }

    fn prev(&self, item: Item) -> Result<Item> {
        TreeMap::prev(self, item)
    }
}

impl<K: Ord, V> Map for TreeMap<K, V> {
    type Key = K;
    type Value = V;

    fn add(&mut self, key: K, value: V) -> Result<Item> {
        TreeMap::add(self, key, value)
    }

    fn set(&mut self, key: K, value: V) -> Result<Option<V>> {
        TreeMap::set(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Result<()> {
        TreeMap::remove(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        TreeMap::contains(self, key)
    }

    fn get(&self, key: &K) -> Result<Item> {
        TreeMap::get(self, key)
    }

    fn entry_set_value(&mut self, item: Item, value: V) -> Result<V> {
        TreeMap::entry_set_value(self, item, value)
    }
}

impl<K: Ord, V> SortedMap for TreeMap<K, V> {
    fn ceiling(&self, key: &K) -> Result<Item> {
        TreeMap::ceiling(self, key)
    }

    fn floor(&self, key: &K) -> Result<Item> {
        TreeMap::floor(self, key)
    }

    fn higher(&self, key: &K) -> Result<Item> {
        TreeMap::higher(self, key)
    }

    fn lower(&self, key: &K) -> Result<Item> {
        TreeMap::lower(self, key)
    }
}

impl<K: Clone, V: Clone> Clone for TreeMap<K, V> {
    fn clone(&self) -> Self {
        TreeMap { tree: self.tree.clone() }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for TreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> Default for TreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for TreeMap<K, V> {
    fn eq(&self, other: &TreeMap<K, V>) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for TreeMap<K, V> {}

impl<'a, K, V> IntoIterator for &'a TreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        self.inner.next().map(|e| (&e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<(&'a K, &'a V)> {
        self.inner.next_back().map(|e| (&e.key, &e.value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter { inner: self.inner.clone() }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}
