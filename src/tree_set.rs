use alloc::string::String;
use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;

use tracing::debug;

use crate::capability::{Collection, Item, OrderedSet, Set, SortedSet, Stream, copy_into};
use crate::error::{Error, Result};
use crate::raw::{Handle, RawRbTree, Search, TreeIter};

mod capacity;

/// A set of `i32`s in ascending order.
pub type IntSet = TreeSet<i32>;

/// A set of owned strings in lexicographic order.
pub type StrSet = TreeSet<String>;

/// An ordered set based on a red-black tree.
///
/// Values are moved into the set on insertion and dropped on removal (or handed back by
/// [`take`](TreeSet::take)). Traversal through [`first`](TreeSet::first) and
/// [`next`](TreeSet::next), or through [`iter`](TreeSet::iter), visits values in ascending order.
///
/// It is a logic error for a value to be modified in such a way that its ordering relative to
/// any other value, as determined by the [`Ord`] trait, changes while it is in the set.
///
/// # Examples
///
/// ```
/// use rbtree_collections::{Error, IntSet};
///
/// let mut set = IntSet::new();
/// set.add(5).unwrap();
/// assert_eq!(set.len(), 1);
/// assert_eq!(set.add(5), Err(Error::ValueAlreadyExists));
///
/// let first = set.first().unwrap();
/// assert_eq!(set.element(first), Ok(&5));
///
/// set.remove(&5).unwrap();
/// assert!(set.is_empty());
/// ```
pub struct TreeSet<T> {
    tree: RawRbTree<T>,
}

/// An iterator over the values of a [`TreeSet`], in ascending order.
///
/// This `struct` is created by the [`iter`](TreeSet::iter) method on [`TreeSet`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, T> {
    inner: TreeIter<'a, T>,
}

impl<T> TreeSet<T> {
    /// Makes a new, empty `TreeSet`.
    ///
    /// Does not allocate anything on its own.
    #[must_use]
    pub const fn new() -> Self {
        TreeSet { tree: RawRbTree::new() }
    }

    /// Returns the number of values in the set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if the set contains no values.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Drops every value in the set.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Gets an iterator that visits the values in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_collections::IntSet;
    ///
    /// let mut set = IntSet::new();
    /// for v in [3, 1, 2] {
    ///     set.add(v).unwrap();
    /// }
    /// assert_eq!(set.iter().copied().collect::<Vec<_>>(), [1, 2, 3]);
    /// ```
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { inner: self.tree.iter() }
    }

    /// Returns the item of the smallest value.
    ///
    /// # Errors
    ///
    /// [`Error::SetIsEmpty`] if the set is empty.
    pub fn first(&self) -> Result<Item> {
        self.tree.first().map(Item).ok_or(Error::SetIsEmpty)
    }

    /// Returns the item of the largest value.
    ///
    /// # Errors
    ///
    /// [`Error::SetIsEmpty`] if the set is empty.
    pub fn last(&self) -> Result<Item> {
        self.tree.last().map(Item).ok_or(Error::SetIsEmpty)
    }

    /// Returns the item of the next larger value.
    ///
    /// # Errors
    ///
    /// [`Error::ItemIsInvalid`] if `item` is stale, [`Error::EndOfSequence`] at the largest value.
    pub fn next(&self, item: Item) -> Result<Item> {
        let h = self.live(item)?;
        self.tree.next(h).map(Item).ok_or(Error::EndOfSequence)
    }

    /// Returns the item of the next smaller value.
    ///
    /// # Errors
    ///
    /// [`Error::ItemIsInvalid`] if `item` is stale, [`Error::EndOfSequence`] at the smallest value.
    pub fn prev(&self, item: Item) -> Result<Item> {
        let h = self.live(item)?;
        self.tree.prev(h).map(Item).ok_or(Error::EndOfSequence)
    }

    /// Returns the value `item` names.
    ///
    /// # Errors
    ///
    /// [`Error::ItemIsInvalid`] if `item` is stale.
    pub fn element(&self, item: Item) -> Result<&T> {
        self.tree.try_get(item.0).ok_or(Error::ItemIsInvalid)
    }

    /// Removes and drops the value `item` names.
    ///
    /// # Errors
    ///
    /// [`Error::ItemIsInvalid`] if `item` is stale.
    pub fn remove_item(&mut self, item: Item) -> Result<()> {
        self.take_item(item).map(drop)
    }

    /// Removes the value `item` names and returns it.
    ///
    /// # Errors
    ///
    /// [`Error::ItemIsInvalid`] if `item` is stale.
    pub fn take_item(&mut self, item: Item) -> Result<T> {
        let h = self.live(item)?;
        Ok(self.tree.remove(h))
    }

    fn live(&self, item: Item) -> Result<Handle> {
        if self.tree.contains(item.0) { Ok(item.0) } else { Err(Error::ItemIsInvalid) }
    }
}

impl<T: Ord> TreeSet<T> {
    /// Adds a value to the set and returns its item.
    ///
    /// # Errors
    ///
    /// - [`Error::ValueAlreadyExists`] if an equal value is present; the set is unchanged and
    ///   `value` is dropped.
    /// - [`Error::MemoryAllocationFailed`] if no node could be allocated; the set is unchanged
    ///   and `value` is dropped.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn add(&mut self, value: T) -> Result<Item> {
        let slot = match self.tree.search_by(|e| e.cmp(&value)) {
            Search::Found(_) => return Err(Error::ValueAlreadyExists),
            Search::Vacant(slot) => slot,
        };

        match self.tree.insert_at(slot, value) {
            Ok(h) => Ok(Item(h)),
            Err(_rejected) => {
                debug!(len = self.tree.len(), "tree set node allocation failed");
                Err(Error::MemoryAllocationFailed)
            }
        }
    }

    /// Removes and drops the value equal to `value`.
    ///
    /// The value may be any borrowed form of the set's value type, but the ordering on the
    /// borrowed form *must* match the ordering on the value type.
    ///
    /// # Errors
    ///
    /// [`Error::ValueNotFound`] if no equal value is present.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_collections::{Error, StrSet};
    ///
    /// let mut set = StrSet::new();
    /// set.add("apple".to_string()).unwrap();
    /// assert_eq!(set.remove("apple"), Ok(()));
    /// assert_eq!(set.remove("apple"), Err(Error::ValueNotFound));
    /// ```
    pub fn remove<Q>(&mut self, value: &Q) -> Result<()>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.take(value).map(drop)
    }

    /// Removes the value equal to `value` and returns it.
    ///
    /// # Errors
    ///
    /// [`Error::ValueNotFound`] if no equal value is present.
    pub fn take<Q>(&mut self, value: &Q) -> Result<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let h = self.tree.find_by(|e| e.borrow().cmp(value)).ok_or(Error::ValueNotFound)?;
        Ok(self.tree.remove(h))
    }

    /// Returns `true` if the set contains a value equal to `value`.
    #[must_use]
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.tree.find_by(|e| e.borrow().cmp(value)).is_some()
    }

    /// Returns the item of the value equal to `value`.
    ///
    /// # Errors
    ///
    /// [`Error::ValueNotFound`] if no equal value is present.
    pub fn get<Q>(&self, value: &Q) -> Result<Item>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.tree.find_by(|e| e.borrow().cmp(value)).map(Item).ok_or(Error::ValueNotFound)
    }

    /// Returns the item of the least value greater than or equal to `value`.
    ///
    /// # Errors
    ///
    /// [`Error::ValueNotFound`] if every value is less than `value`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_collections::IntSet;
    ///
    /// let mut set = IntSet::new();
    /// for v in [10, 20, 30] {
    ///     set.add(v).unwrap();
    /// }
    /// let item = set.ceiling(&15).unwrap();
    /// assert_eq!(set.element(item), Ok(&20));
    /// assert_eq!(set.element(set.floor(&15).unwrap()), Ok(&10));
    /// assert!(set.higher(&30).is_err());
    /// ```
    pub fn ceiling<Q>(&self, value: &Q) -> Result<Item>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.tree.ceiling_by(|e| e.borrow().cmp(value)).map(Item).ok_or(Error::ValueNotFound)
    }

    /// Returns the item of the greatest value less than or equal to `value`.
    ///
    /// # Errors
    ///
    /// [`Error::ValueNotFound`] if every value is greater than `value`.
    pub fn floor<Q>(&self, value: &Q) -> Result<Item>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.tree.floor_by(|e| e.borrow().cmp(value)).map(Item).ok_or(Error::ValueNotFound)
    }

    /// Returns the item of the least value strictly greater than `value`.
    ///
    /// # Errors
    ///
    /// [`Error::ValueNotFound`] if no value is greater than `value`.
    pub fn higher<Q>(&self, value: &Q) -> Result<Item>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.tree.higher_by(|e| e.borrow().cmp(value)).map(Item).ok_or(Error::ValueNotFound)
    }

    /// Returns the item of the greatest value strictly less than `value`.
    ///
    /// # Errors
    ///
    /// [`Error::ValueNotFound`] if no value is less than `value`.
    pub fn lower<Q>(&self, value: &Q) -> Result<Item>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.tree.lower_by(|e| e.borrow().cmp(value)).map(Item).ok_or(Error::ValueNotFound)
    }

    /// Builds a set from clones of every element of `source`.
    ///
    /// Duplicates in `source` are skipped (the first one wins).
    ///
    /// # Errors
    ///
    /// [`Error::MemoryAllocationFailed`] if a node could not be allocated, or any traversal error
    /// `source` reports.
    pub fn from_stream<S>(source: &S) -> Result<Self>
    where
        S: Stream<Element = T> + ?Sized,
        T: Clone,
    {
        let mut set = Self::new();
        set.extend_from_stream(source)?;
        Ok(set)
    }

    /// Adds clones of every element of `source`, skipping values already present.
    ///
    /// Returns the number of values added. On failure the set keeps the values added so far.
    ///
    /// # Errors
    ///
    /// As for [`from_stream`](Self::from_stream).
    pub fn extend_from_stream<S>(&mut self, source: &S) -> Result<usize>
    where
        S: Stream<Element = T> + ?Sized,
        T: Clone,
    {
        copy_into(source, self)
    }
}

impl<T> Stream for TreeSet<T> {
    type Element = T;

    fn first(&self) -> Result<Item> {
        TreeSet::first(self)
    }

    fn next(&self, item: Item) -> Result<Item> {
        TreeSet::next(self, item)
    }

    fn element(&self, item: Item) -> Result<&T> {
        TreeSet::element(self, item)
    }

    fn remove_item(&mut self, item: Item) -> Result<()> {
        TreeSet::remove_item(self, item)
    }
}

impl<T> Collection for TreeSet<T> {
    fn count(&self) -> usize {
        self.len()
    }

    fn last(&self) -> Result<Item> {
        TreeSet::last(self)
    }

    fn prev(&self, item: Item) -> Result<Item> {
        TreeSet::prev(self, item)
    }
}

impl<T: Ord> Set for TreeSet<T> {
    fn add(&mut self, value: T) -> Result<Item> {
        TreeSet::add(self, value)
    }

    fn remove(&mut self, value: &T) -> Result<()> {
        TreeSet::remove(self, value)
    }

    fn contains(&self, value: &T) -> bool {
        TreeSet::contains(self, value)
    }

    fn get(&self, value: &T) -> Result<Item> {
        TreeSet::get(self, value)
    }
}

impl<T: Ord> OrderedSet for TreeSet<T> {}

impl<T: Ord> SortedSet for TreeSet<T> {
    fn ceiling(&self, value: &T) -> Result<Item> {
        TreeSet::ceiling(self, value)
    }

    fn floor(&self, value: &T) -> Result<Item> {
        TreeSet::floor(self, value)
    }

    fn higher(&self, value: &T) -> Result<Item> {
        TreeSet::higher(self, value)
    }

    fn lower(&self, value: &T) -> Result<Item> {
        TreeSet::lower(self, value)
    }
}

impl<T: Clone> Clone for TreeSet<T> {
    fn clone(&self) -> Self {
        TreeSet { tree: self.tree.clone() }
    }
}

impl<T: fmt::Debug> fmt::Debug for TreeSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T> Default for TreeSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialEq> PartialEq for TreeSet<T> {
    fn eq(&self, other: &TreeSet<T>) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for TreeSet<T> {}

impl<'a, T> IntoIterator for &'a TreeSet<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        self.inner.next_back()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter { inner: self.inner.clone() }
    }
}

impl<T: fmt::Debug> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}
