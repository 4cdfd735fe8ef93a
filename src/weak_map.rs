use alloc::rc::{Rc, Weak};
use alloc::string::String;
use core::borrow::Borrow;
use core::fmt;

use tracing::debug;

use crate::capability::{Collection, Item, Map, SortedMap, Stream, copy_entries_into};
use crate::error::{Error, Result};
use crate::tree_map::{Entry, Iter, TreeMap};

/// A map from owned strings to weakly referenced values.
pub type StrWeakMap<T> = WeakValueMap<String, T>;

/// An ordered map whose values are [`Weak`] references.
///
/// The map owns each weak handle but never the referent. A handle may only enter the map while
/// its referent is alive: [`add`](Self::add), [`set`](Self::set) and
/// [`entry_set_value`](Self::entry_set_value) fail with [`Error::StrongIsInvalid`], leaving the map
/// untouched, when every [`Rc`] to the referent has already been dropped. Referents can still be
/// released after insertion; [`upgrade`](Self::upgrade) reports that, and
/// [`purge_invalid`](Self::purge_invalid) drops such entries.
///
/// Removal never looks at the referent, so entries with released referents can always be removed.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use rbtree_collections::{Error, StrWeakMap};
///
/// let mut map = StrWeakMap::new();
/// let owner = Rc::new(42);
/// map.add("answer".to_string(), Rc::downgrade(&owner)).unwrap();
/// assert_eq!(*map.upgrade("answer").unwrap(), 42);
///
/// let gone = Rc::new(0);
/// let weak = Rc::downgrade(&gone);
/// drop(gone);
/// assert_eq!(map.add("gone".to_string(), weak), Err(Error::StrongIsInvalid));
/// assert_eq!(map.len(), 1);
///
/// drop(owner);
/// assert_eq!(map.upgrade("answer").map(|rc| *rc), Err(Error::StrongIsInvalid));
/// ```
pub struct WeakValueMap<K, T> {
    map: TreeMap<K, Weak<T>>,
}

fn ensure_live<T>(weak: &Weak<T>) -> Result<()> {
    if weak.strong_count() == 0 { Err(Error::StrongIsInvalid) } else { Ok(()) }
}

impl<K, T> WeakValueMap<K, T> {
    /// Makes a new, empty `WeakValueMap`.
    #[must_use]
    pub const fn new() -> Self {
        WeakValueMap { map: TreeMap::new() }
    }

    /// Creates an empty map with capacity for at least `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        WeakValueMap {
            map: TreeMap::with_capacity(capacity),
        }
    }

    /// Creates an empty map that holds at most `max_len` entries.
    #[must_use]
    pub fn with_max_len(max_len: usize) -> Self {
        WeakValueMap {
            map: TreeMap::with_max_len(max_len),
        }
    }

    /// Returns the number of entries the map can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.map.capacity()
    }

    /// Returns the most entries the map will hold.
    #[must_use]
    pub const fn max_len(&self) -> usize {
        self.map.max_len()
    }

    /// Returns the number of entries, counting those whose referent has died.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the map holds no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Drops every entry. Referents are unaffected.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Gets an iterator over the entries of the map, sorted by key.
    pub fn iter(&self) -> Iter<'_, K, Weak<T>> {
        self.map.iter()
    }

    /// Returns the item of the entry with the smallest key.
    ///
    /// # Errors
    ///
    /// [`Error::MapIsEmpty`] if the map is empty.
    pub fn first(&self) -> Result<Item> {
        self.map.first()
    }

    /// Returns the item of the entry with the largest key.
    ///
    /// # Errors
    ///
    /// [`Error::MapIsEmpty`] if the map is empty.
    pub fn last(&self) -> Result<Item> {
        self.map.last()
    }

    /// Returns the item of the entry after `item` in key order.
    ///
    /// # Errors
    ///
    /// [`Error::ItemIsInvalid`] if `item` is stale, [`Error::EndOfSequence`] at the largest key.
    pub fn next(&self, item: Item) -> Result<Item> {
        self.map.next(item)
    }

    /// Returns the item of the entry before `item` in key order.
    ///
    /// # Errors
    ///
    /// [`Error::ItemIsInvalid`] if `item` is stale, [`Error::EndOfSequence`] at the smallest key.
    pub fn prev(&self, item: Item) -> Result<Item> {
        self.map.prev(item)
    }

    /// Borrows the entry `item` names.
    ///
    /// # Errors
    ///
    /// [`Error::ItemIsInvalid`] if `item` is stale.
    pub fn entry(&self, item: Item) -> Result<&Entry<K, Weak<T>>> {
        self.map.entry(item)
    }

    /// Replaces the weak handle of the entry `item` names, returning the old handle.
    ///
    /// # Errors
    ///
    /// - [`Error::ItemIsInvalid`] if `item` is stale.
    /// - [`Error::StrongIsInvalid`] if `value`'s referent has been released.
    pub fn entry_set_value(&mut self, item: Item, value: Weak<T>) -> Result<Weak<T>> {
        self.map.entry(item)?;
        ensure_live(&value)?;
        self.map.entry_set_value(item, value)
    }

    /// Removes and drops the entry `item` names.
    ///
    /// # Errors
    ///
    /// [`Error::ItemIsInvalid`] if `item` is stale.
    pub fn remove_item(&mut self, item: Item) -> Result<()> {
        self.map.remove_item(item)
    }

    /// Removes the entry `item` names and returns its key and handle.
    ///
    /// # Errors
    ///
    /// [`Error::ItemIsInvalid`] if `item` is stale.
    pub fn take_item(&mut self, item: Item) -> Result<(K, Weak<T>)> {
        self.map.take_item(item)
    }

    /// Drops every entry whose referent has been released and returns how many were dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::rc::Rc;
    /// use rbtree_collections::WeakValueMap;
    ///
    /// let kept = Rc::new("kept");
    /// let dropped = Rc::new("dropped");
    ///
    /// let mut map = WeakValueMap::new();
    /// map.add(1, Rc::downgrade(&kept)).unwrap();
    /// map.add(2, Rc::downgrade(&dropped)).unwrap();
    ///
    /// drop(dropped);
    /// assert_eq!(map.purge_invalid(), 1);
    /// assert_eq!(map.len(), 1);
    /// assert!(map.contains(&1));
    /// ```
    pub fn purge_invalid(&mut self) -> usize {
        let mut removed = 0;
        let mut cursor = self.map.first().ok();

        while let Some(item) = cursor {
            cursor = self.map.next(item).ok();
            let released = self.map.entry(item).is_ok_and(|e| e.value().strong_count() == 0);
            if released && self.map.remove_item(item).is_ok() {
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(removed, remaining = self.map.len(), "purged entries with released referents");
        }
        removed
    }
}

impl<K: Ord, T> WeakValueMap<K, T> {
    /// Adds a new entry and returns its item.
    ///
    /// # Errors
    ///
    /// - [`Error::StrongIsInvalid`] if `value`'s referent has been released. Checked first.
    /// - [`Error::KeyAlreadyExists`] if the key is present.
    /// - [`Error::MemoryAllocationFailed`] if no node could be allocated.
    ///
    /// The map is unchanged on every error.
    pub fn add(&mut self, key: K, value: Weak<T>) -> Result<Item> {
        ensure_live(&value)?;
        self.map.add(key, value)
    }

    /// Inserts an entry, replacing the handle if the key is already present.
    ///
    /// # Errors
    ///
    /// - [`Error::StrongIsInvalid`] if `value`'s referent has been released. Checked first.
    /// - [`Error::MemoryAllocationFailed`] if the key is new and no node could be allocated.
    pub fn set(&mut self, key: K, value: Weak<T>) -> Result<Option<Weak<T>>> {
        ensure_live(&value)?;
        self.map.set(key, value)
    }

    /// Removes and drops the entry for `key`, whether or not its referent is alive.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if the key is not present.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<()>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.map.remove(key)
    }

    /// Removes the entry for `key` and returns its handle.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if the key is not present.
    pub fn take<Q>(&mut self, key: &Q) -> Result<Weak<T>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.map.take(key)
    }

    /// Returns `true` if an entry for `key` is present, live or not.
    #[must_use]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.map.contains(key)
    }

    /// Returns the item holding the entry for `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if the key is not present.
    pub fn get<Q>(&self, key: &Q) -> Result<Item>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.map.get(key)
    }

    /// Returns the weak handle stored for `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if the key is not present.
    pub fn get_value<Q>(&self, key: &Q) -> Result<&Weak<T>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.map.get_value(key)
    }

    /// Returns a strong reference to the referent stored for `key`.
    ///
    /// # Errors
    ///
    /// - [`Error::KeyNotFound`] if the key is not present.
    /// - [`Error::StrongIsInvalid`] if the referent has been released.
    pub fn upgrade<Q>(&self, key: &Q) -> Result<Rc<T>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.map.get_value(key)?.upgrade().ok_or(Error::StrongIsInvalid)
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
        self.map.ceiling(key)
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
        self.map.floor(key)
    }

    /// Returns the item of the entry with the least key greater than `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if no key is greater than `key`.
    pub fn higher<Q>(&self, key: &Q) -> Result<Item>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.map.higher(key)
    }

    /// Returns the item of the entry with the greatest key less than `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if no key is less than `key`.
    pub fn lower<Q>(&self, key: &Q) -> Result<Item>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.map.lower(key)
    }

    /// Builds a map from every entry of `source`.
    ///
    /// # Errors
    ///
    /// Stops at the first entry that cannot be added, including one whose referent has been
    /// released ([`Error::StrongIsInvalid`]). Duplicate keys are skipped, not errors.
    pub fn from_stream<S>(source: &S) -> Result<Self>
    where
        S: Stream<Element = Entry<K, Weak<T>>> + ?Sized,
        K: Clone,
    {
        let mut map = Self::new();
        map.extend_from_stream(source)?;
        Ok(map)
    }

    /// Adds every entry of `source` whose key is not already present.
    ///
    /// # Errors
    ///
    /// As for [`from_stream`](Self::from_stream). The map keeps the entries added so far.
    pub fn extend_from_stream<S>(&mut self, source: &S) -> Result<usize>
    where
        S: Stream<Element = Entry<K, Weak<T>>> + ?Sized,
        K: Clone,
    {
        copy_entries_into(source, self)
    }
}

impl<K, T> Stream for WeakValueMap<K, T> {
    type Element = Entry<K, Weak<T>>;

    fn first(&self) -> Result<Item> {
        self.map.first()
    }

    fn next(&self, item: Item) -> Result<Item> {
        self.map.next(item)
    }

    fn element(&self, item: Item) -> Result<&Entry<K, Weak<T>>> {
        self.map.entry(item)
    }

    fn remove_item(&mut self, item: Item) -> Result<()> {
        self.map.remove_item(item)
    }
}

impl<K, T> Collection for WeakValueMap<K, T> {
    fn count(&self) -> usize {
        self.map.len()
    }

    fn last(&self) -> Result<Item> {
        self.map.last()
    }

    fn prev(&self, item: Item) -> Result<Item> {
        self.map.prev(item)
    }
}

impl<K: Ord, T> Map for WeakValueMap<K, T> {
    type Key = K;
    type Value = Weak<T>;

    fn add(&mut self, key: K, value: Weak<T>) -> Result<Item> {
        WeakValueMap::add(self, key, value)
    }

    fn set(&mut self, key: K, value: Weak<T>) -> Result<Option<Weak<T>>> {
        WeakValueMap::set(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Result<()> {
        WeakValueMap::remove(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        WeakValueMap::contains(self, key)
    }

    fn get(&self, key: &K) -> Result<Item> {
        WeakValueMap::get(self, key)
    }

    fn entry_set_value(&mut self, item: Item, value: Weak<T>) -> Result<Weak<T>> {
        WeakValueMap::entry_set_value(self, item, value)
    }
}

impl<K: Ord, T> SortedMap for WeakValueMap<K, T> {
    fn ceiling(&self, key: &K) -> Result<Item> {
        WeakValueMap::ceiling(self, key)
    }

    fn floor(&self, key: &K) -> Result<Item> {
        WeakValueMap::floor(self, key)
    }

    fn higher(&self, key: &K) -> Result<Item> {
        WeakValueMap::higher(self, key)
    }

    fn lower(&self, key: &K) -> Result<Item> {
        WeakValueMap::lower(self, key)
    }
}

impl<K: Clone, T> Clone for WeakValueMap<K, T> {
    fn clone(&self) -> Self {
        WeakValueMap { map: self.map.clone() }
    }
}

impl<K: fmt::Debug, T: fmt::Debug> fmt::Debug for WeakValueMap<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.map.iter().map(|(k, w)| (k, w.upgrade()))).finish()
    }
}

impl<K, T> Default for WeakValueMap<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, K, T> IntoIterator for &'a WeakValueMap<K, T> {
    type Item = (&'a K, &'a Weak<T>);
    type IntoIter = Iter<'a, K, Weak<T>>;

    fn into_iter(self) -> Iter<'a, K, Weak<T>> {
        self.iter()
    }
}
