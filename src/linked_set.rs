use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;

use tracing::debug;

use crate::capability::{Collection, Item, OrderedSet, Set, Stream, copy_into};
use crate::error::{Error, Result};
use crate::raw::{Handle, ListIter, RawList, RawRbTree, Search, Slot, TreeIter};

mod capacity;

/// A linked set of `i32`s.
pub type LinkedIntSet = LinkedTreeSet<i32>;

/// A set that keeps its values in a caller-controlled order while indexing them by value.
///
/// Every value sits in two indices at once: a doubly linked list, whose order is decided by
/// [`append`](Self::append), [`prepend`](Self::prepend), [`insert_after`](Self::insert_after) and
/// [`insert_before`](Self::insert_before), and a red-black tree keyed by value, which enforces
/// uniqueness and answers lookups in O(log n). Both indices always hold exactly the same values;
/// an insertion that cannot be completed in both is undone in both.
///
/// [`first`](Self::first), [`next`](Self::next) and [`iter`](Self::iter) follow list order.
/// [`lowest`](Self::lowest), [`higher`](Self::higher) and [`sorted_iter`](Self::sorted_iter)
/// follow value order. Every [`Item`] names a list position, so a value found by a sorted search
/// can be used as an anchor or traversal point in list order.
///
/// # Examples
///
/// ```
/// use rbtree_collections::LinkedIntSet;
///
/// let mut set = LinkedIntSet::new();
/// set.append(10).unwrap();
/// set.append(20).unwrap();
/// set.prepend(5).unwrap();
/// assert_eq!(set.iter().copied().collect::<Vec<_>>(), [5, 10, 20]);
///
/// let ten = set.get(&10).unwrap();
/// set.insert_after(ten, 1).unwrap();
/// assert_eq!(set.iter().copied().collect::<Vec<_>>(), [5, 10, 1, 20]);
/// assert_eq!(set.sorted_iter().copied().collect::<Vec<_>>(), [1, 5, 10, 20]);
///
/// assert_eq!(set.element(set.lowest().unwrap()), Ok(&1));
/// assert_eq!(set.element(set.highest().unwrap()), Ok(&20));
/// ```
pub struct LinkedTreeSet<T> {
    list: RawList<T>,
    // List handles ordered by the values they name.
    index: RawRbTree<Handle>,
}

/// An iterator over the values of a [`LinkedTreeSet`] in list order.
///
/// This `struct` is created by the [`iter`](LinkedTreeSet::iter) method on [`LinkedTreeSet`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, T> {
    inner: ListIter<'a, T>,
}

/// An iterator over the values of a [`LinkedTreeSet`] in ascending order.
///
/// This `struct` is created by the [`sorted_iter`](LinkedTreeSet::sorted_iter) method on
/// [`LinkedTreeSet`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct SortedIter<'a, T> {
    list: &'a RawList<T>,
    inner: TreeIter<'a, Handle>,
}

#[derive(Clone, Copy)]
enum Place {
    Front,
    Back,
    After(Item),
    Before(Item),
}

impl<T> LinkedTreeSet<T> {
    /// Makes a new, empty `LinkedTreeSet`.
    #[must_use]
    pub const fn new() -> Self {
        LinkedTreeSet {
            list: RawList::new(),
            index: RawRbTree::new(),
        }
    }

    /// Returns the number of values in the set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.list.len()
    }

    /// Returns `true` if the set holds no values.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Drops every value in the set.
    pub fn clear(&mut self) {
        self.index.clear();
        self.list.clear();
    }

    /// Gets an iterator that visits the values in list order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { inner: self.list.iter() }
    }

    /// Gets an iterator that visits the values in ascending order.
    pub fn sorted_iter(&self) -> SortedIter<'_, T> {
        SortedIter {
            list: &self.list,
            inner: self.index.iter(),
        }
    }

    /// Returns the item at the front of the list.
    ///
    /// # Errors
    ///
    /// [`Error::SetIsEmpty`] if the set is empty.
    pub fn first(&self) -> Result<Item> {
        self.list.first().map(Item).ok_or(Error::SetIsEmpty)
    }

    /// Returns the item at the back of the list.
    ///
    /// # Errors
    ///
    /// [`Error::SetIsEmpty`] if the set is empty.
    pub fn last(&self) -> Result<Item> {
        self.list.last().map(Item).ok_or(Error::SetIsEmpty)
    }

    /// Returns the item after `item` in list order.
    ///
    /// # Errors
    ///
    /// [`Error::ItemIsInvalid`] if `item` is stale, [`Error::EndOfSequence`] at the back.
    pub fn next(&self, item: Item) -> Result<Item> {
        let h = self.live(item)?;
        self.list.next(h).map(Item).ok_or(Error::EndOfSequence)
    }

    /// Returns the item before `item` in list order.
    ///
    /// # Errors
    ///
    /// [`Error::ItemIsInvalid`] if `item` is stale, [`Error::EndOfSequence`] at the front.
    pub fn prev(&self, item: Item) -> Result<Item> {
        let h = self.live(item)?;
        self.list.prev(h).map(Item).ok_or(Error::EndOfSequence)
    }

    /// Returns the item of the smallest value.
    ///
    /// # Errors
    ///
    /// [`Error::SetIsEmpty`] if the set is empty.
    pub fn lowest(&self) -> Result<Item> {
        self.index.first().map(|t| self.item_at(t)).ok_or(Error::SetIsEmpty)
    }

    /// Returns the item of the largest value.
    ///
    /// # Errors
    ///
    /// [`Error::SetIsEmpty`] if the set is empty.
    pub fn highest(&self) -> Result<Item> {
        self.index.last().map(|t| self.item_at(t)).ok_or(Error::SetIsEmpty)
    }

    /// Borrows the value `item` names.
    ///
    /// # Errors
    ///
    /// [`Error::ItemIsInvalid`] if `item` is stale.
    pub fn element(&self, item: Item) -> Result<&T> {
        self.list.try_get(item.0).ok_or(Error::ItemIsInvalid)
    }

    fn live(&self, item: Item) -> Result<Handle> {
        if self.list.contains(item.0) { Ok(item.0) } else { Err(Error::ItemIsInvalid) }
    }

    // Maps a tree node to the list item it indexes.
    fn item_at(&self, tree_node: Handle) -> Item {
        Item(*self.index.get(tree_node))
    }
}

impl<T: Ord> LinkedTreeSet<T> {
    /// Adds `value` at the back of the list.
    ///
    /// # Errors
    ///
    /// - [`Error::ValueAlreadyExists`] if an equal value is present.
    /// - [`Error::MemoryAllocationFailed`] if either index could not allocate a node.
    ///
    /// The set is unchanged on every error.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn append(&mut self, value: T) -> Result<Item> {
        self.insert(value, Place::Back)
    }

    /// Adds `value` at the front of the list.
    ///
    /// # Errors
    ///
    /// As for [`append`](Self::append).
    pub fn prepend(&mut self, value: T) -> Result<Item> {
        self.insert(value, Place::Front)
    }

    /// Adds `value` directly after `anchor` in list order.
    ///
    /// # Errors
    ///
    /// - [`Error::ValueAlreadyExists`] if an equal value is present. Checked first.
    /// - [`Error::ItemIsInvalid`] if `anchor` is stale.
    /// - [`Error::MemoryAllocationFailed`] if either index could not allocate a node.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_collections::{Error, LinkedIntSet};
    ///
    /// let mut set = LinkedIntSet::new();
    /// let a = set.append(1).unwrap();
    /// set.append(3).unwrap();
    /// set.insert_after(a, 2).unwrap();
    /// assert_eq!(set.iter().copied().collect::<Vec<_>>(), [1, 2, 3]);
    ///
    /// set.remove(&1).unwrap();
    /// assert_eq!(set.insert_after(a, 4), Err(Error::ItemIsInvalid));
    /// ```
    pub fn insert_after(&mut self, anchor: Item, value: T) -> Result<Item> {
        self.insert(value, Place::After(anchor))
    }

    /// Adds `value` directly before `anchor` in list order.
    ///
    /// # Errors
    ///
    /// As for [`insert_after`](Self::insert_after).
    pub fn insert_before(&mut self, anchor: Item, value: T) -> Result<Item> {
        self.insert(value, Place::Before(anchor))
    }

    /// Adds `value` at the back of the list; the same as [`append`](Self::append).
    ///
    /// # Errors
    ///
    /// As for [`append`](Self::append).
    pub fn add(&mut self, value: T) -> Result<Item> {
        self.append(value)
    }

    /// Removes and drops the value equal to `value`.
    ///
    /// # Errors
    ///
    /// [`Error::ValueNotFound`] if no equal value is present.
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
        let t = self.find(value).ok_or(Error::ValueNotFound)?;
        let h = self.index.remove(t);
        Ok(self.list.unlink(h))
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
        let t = self.find(self.list.get(h)).ok_or(Error::ItemIsInvalid)?;
        self.index.remove(t);
        Ok(self.list.unlink(h))
    }

    /// Returns `true` if a value equal to `value` is present.
    #[must_use]
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.find(value).is_some()
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
        self.find(value).map(|t| self.item_at(t)).ok_or(Error::ValueNotFound)
    }

    /// Returns the item of the least value greater than or equal to `value`.
    ///
    /// # Errors
    ///
    /// [`Error::ValueNotFound`] if every value is less than `value`.
    pub fn ceiling<Q>(&self, value: &Q) -> Result<Item>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let list = &self.list;
        self.index
            .ceiling_by(|h| list.get(*h).borrow().cmp(value))
            .map(|t| self.item_at(t))
            .ok_or(Error::ValueNotFound)
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
        let list = &self.list;
        self.index
            .floor_by(|h| list.get(*h).borrow().cmp(value))
            .map(|t| self.item_at(t))
            .ok_or(Error::ValueNotFound)
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
        let list = &self.list;
        self.index
            .higher_by(|h| list.get(*h).borrow().cmp(value))
            .map(|t| self.item_at(t))
            .ok_or(Error::ValueNotFound)
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
        let list = &self.list;
        self.index
            .lower_by(|h| list.get(*h).borrow().cmp(value))
            .map(|t| self.item_at(t))
            .ok_or(Error::ValueNotFound)
    }

    /// Builds a set from clones of every element of `source`, keeping `source` order.
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

    /// Appends clones of every element of `source` not already present, in `source` order.
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

    // Returns the tree node indexing the value equal to `value`.
    fn find<Q>(&self, value: &Q) -> Option<Handle>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let list = &self.list;
        self.index.find_by(|h| list.get(*h).borrow().cmp(value))
    }

    fn vacancy(&self, value: &T) -> Result<Slot> {
        let list = &self.list;
        match self.index.search_by(|h| list.get(*h).cmp(value)) {
            Search::Found(_) => Err(Error::ValueAlreadyExists),
            Search::Vacant(slot) => Ok(slot),
        }
    }

    // Links the value into the list first, then commits its handle to the tree slot found by
    // `vacancy`. The list node is unlinked again if the tree cannot take it.
    fn insert(&mut self, value: T, place: Place) -> Result<Item> {
        let slot = self.vacancy(&value)?;

        let linked = match place {
            Place::Front => self.list.push_front(value),
            Place::Back => self.list.push_back(value),
            Place::After(anchor) => {
                let anchor = self.live(anchor)?;
                self.list.insert_after(anchor, value)
            }
            Place::Before(anchor) => {
                let anchor = self.live(anchor)?;
                self.list.insert_before(anchor, value)
            }
        };

        let Ok(h) = linked else {
            debug!(len = self.len(), "linked set list node allocation failed");
            return Err(Error::MemoryAllocationFailed);
        };

        match self.index.insert_at(slot, h) {
            Ok(_) => Ok(Item(h)),
            Err(_) => {
                drop(self.list.unlink(h));
                debug!(len = self.len(), "linked set index node allocation failed; list node unlinked");
                Err(Error::MemoryAllocationFailed)
            }
        }
    }
}

impl<T: Ord> Stream for LinkedTreeSet<T> {
    type Element = T;

    fn first(&self) -> Result<Item> {
        LinkedTreeSet::first(self)
    }

    fn next(&self, item: Item) -> Result<Item> {
        LinkedTreeSet::next(self, item)
    }

    fn element(&self, item: Item) -> Result<&T> {
        LinkedTreeSet::element(self, item)
    }

    fn remove_item(&mut self, item: Item) -> Result<()> {
        LinkedTreeSet::remove_item(self, item)
    }
}

impl<T: Ord> Collection for LinkedTreeSet<T> {
    fn count(&self) -> usize {
        self.len()
    }

    fn last(&self) -> Result<Item> {
        LinkedTreeSet::last(self)
    }

    fn prev(&self, item: Item) -> Result<Item> {
        LinkedTreeSet::prev(self, item)
    }
}

impl<T: Ord> Set for LinkedTreeSet<T> {
    fn add(&mut self, value: T) -> Result<Item> {
        LinkedTreeSet::add(self, value)
    }

    fn remove(&mut self, value: &T) -> Result<()> {
        LinkedTreeSet::remove(self, value)
    }

    fn contains(&self, value: &T) -> bool {
        LinkedTreeSet::contains(self, value)
    }

    fn get(&self, value: &T) -> Result<Item> {
        LinkedTreeSet::get(self, value)
    }
}

impl<T: Ord> OrderedSet for LinkedTreeSet<T> {}

impl<T: Clone> Clone for LinkedTreeSet<T> {
    fn clone(&self) -> Self {
        LinkedTreeSet {
            list: self.list.clone(),
            index: self.index.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for LinkedTreeSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T> Default for LinkedTreeSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Two linked sets are equal when they hold equal values in the same list order.
impl<T: PartialEq> PartialEq for LinkedTreeSet<T> {
    fn eq(&self, other: &LinkedTreeSet<T>) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for LinkedTreeSet<T> {}

impl<'a, T> IntoIterator for &'a LinkedTreeSet<T> {
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

impl<T: fmt::Debug> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter { inner: self.inner.clone() }
    }
}

impl<'a, T> Iterator for SortedIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        self.inner.next().map(|h| self.list.get(*h))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, T> DoubleEndedIterator for SortedIter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        self.inner.next_back().map(|h| self.list.get(*h))
    }
}

impl<T> ExactSizeIterator for SortedIter<'_, T> {}

impl<T> FusedIterator for SortedIter<'_, T> {}

impl<T: fmt::Debug> fmt::Debug for SortedIter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<T> Clone for SortedIter<'_, T> {
    fn clone(&self) -> Self {
        SortedIter {
            list: self.list,
            inner: self.inner.clone(),
        }
    }
}
