//! The capability stack: progressively richer views of one container.
//!
//! ```text
//! Stream -> Collection -> Set -> OrderedSet -> SortedSet
//!                      \-> Map -> SortedMap
//! ```
//!
//! Each trait is a supertrait-refinement of the one before it, so anything written against a
//! weak capability (say, "any [`Stream`]") works for every container. All traits are
//! dyn-compatible; use `&dyn SortedSet<Element = i32>` where the concrete container is not known,
//! and the concrete type everywhere else.
//!
//! Positions are named by [`Item`]s, opaque handles that stay valid until the element they name
//! is removed.

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::raw::Handle;
use crate::tree_map::Entry;

/// A stable handle to one element of a container.
///
/// An `Item` is only meaningful for the container that produced it. It stays valid until its
/// element is removed; after that, operations taking it report [`Error::ItemIsInvalid`] until a
/// later insertion reuses the slot, at which point the old `Item` names the new element. Using an
/// `Item` with a different container, or after its element was removed, is a logic error: the
/// result is unspecified but safe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Item(pub(crate) Handle);

/// A traversable, mutable sequence of elements.
///
/// No ordering or uniqueness is implied.
pub trait Stream {
    /// The element type an [`Item`] names.
    type Element;

    /// Returns the first item, or the container's "empty" error.
    fn first(&self) -> Result<Item>;

    /// Returns the item after `item`, or [`Error::EndOfSequence`].
    fn next(&self, item: Item) -> Result<Item>;

    /// Returns the element `item` names.
    fn element(&self, item: Item) -> Result<&Self::Element>;

    /// Removes the element `item` names, dropping it.
    fn remove_item(&mut self, item: Item) -> Result<()>;
}

/// A bounded, bidirectionally traversable [`Stream`].
pub trait Collection: Stream {
    /// Returns the number of elements.
    fn count(&self) -> usize;

    /// Returns the last item, or the container's "empty" error.
    fn last(&self) -> Result<Item>;

    /// Returns the item before `item`, or [`Error::EndOfSequence`].
    fn prev(&self, item: Item) -> Result<Item>;
}

/// A [`Collection`] of unique values.
pub trait Set: Collection {
    /// Adds `value`, taking ownership of it. Fails with [`Error::ValueAlreadyExists`] if an equal
    /// value is present.
    fn add(&mut self, value: Self::Element) -> Result<Item>;

    /// Removes and drops the value equal to `value`.
    fn remove(&mut self, value: &Self::Element) -> Result<()>;

    /// Returns true if an equal value is present.
    fn contains(&self, value: &Self::Element) -> bool;

    /// Returns the item holding the value equal to `value`.
    fn get(&self, value: &Self::Element) -> Result<Item>;
}

/// A [`Set`] whose traversal order is meaningful to the caller (insertion or linkage order,
/// not necessarily value order).
pub trait OrderedSet: Set {}

/// An [`OrderedSet`] whose traversal order is value order, with nearest-neighbour search.
///
/// All searches fail with [`Error::ValueNotFound`] when no value qualifies.
pub trait SortedSet: OrderedSet {
    /// The least value `>= value`.
    fn ceiling(&self, value: &Self::Element) -> Result<Item>;

    /// The greatest value `<= value`.
    fn floor(&self, value: &Self::Element) -> Result<Item>;

    /// The least value `> value`.
    fn higher(&self, value: &Self::Element) -> Result<Item>;

    /// The greatest value `< value`.
    fn lower(&self, value: &Self::Element) -> Result<Item>;
}

/// A [`Collection`] of entries with unique keys.
pub trait Map: Collection {
    /// The type entries are ordered and found by.
    type Key;
    /// The type stored alongside each key.
    type Value;

    /// Adds a new entry. Fails with [`Error::KeyAlreadyExists`] if the key is present.
    fn add(&mut self, key: Self::Key, value: Self::Value) -> Result<Item>;

    /// Inserts or replaces the entry for `key`, returning the replaced value.
    fn set(&mut self, key: Self::Key, value: Self::Value) -> Result<Option<Self::Value>>;

    /// Removes and drops the entry for `key`.
    fn remove(&mut self, key: &Self::Key) -> Result<()>;

    /// Returns true if an entry for `key` is present.
    fn contains(&self, key: &Self::Key) -> bool;

    /// Returns the item holding the entry for `key`.
    fn get(&self, key: &Self::Key) -> Result<Item>;

    /// Replaces the value of the entry `item` names, returning the old value.
    fn entry_set_value(&mut self, item: Item, value: Self::Value) -> Result<Self::Value>;
}

/// A [`Map`] traversed in key order, with nearest-neighbour search by key.
///
/// All searches fail with [`Error::KeyNotFound`] when no key qualifies.
pub trait SortedMap: Map {
    /// The entry with the least key `>= key`.
    fn ceiling(&self, key: &Self::Key) -> Result<Item>;

    /// The entry with the greatest key `<= key`.
    fn floor(&self, key: &Self::Key) -> Result<Item>;

    /// The entry with the least key `> key`.
    fn higher(&self, key: &Self::Key) -> Result<Item>;

    /// The entry with the greatest key `< key`.
    fn lower(&self, key: &Self::Key) -> Result<Item>;
}

/// Adds a clone of every element of `source` to `dest`, in `source` order.
///
/// The first of several equal elements wins; later duplicates are skipped. Any other failure,
/// such as [`Error::MemoryAllocationFailed`], stops the copy immediately and leaves `dest` holding
/// what was copied so far. Returns the number of elements added.
///
/// # Examples
///
/// ```
/// use rbtree_collections::{IntSet, LinkedIntSet, copy_into};
///
/// let mut linked = LinkedIntSet::new();
/// for v in [30, 10, 20] {
///     linked.append(v).unwrap();
/// }
///
/// let mut sorted = IntSet::new();
/// sorted.add(10).unwrap();
/// assert_eq!(copy_into(&linked, &mut sorted), Ok(2));
/// assert_eq!(sorted.iter().copied().collect::<Vec<_>>(), [10, 20, 30]);
/// ```
pub fn copy_into<S, D>(source: &S, dest: &mut D) -> Result<usize>
where
    S: Stream + ?Sized,
    D: Set<Element = S::Element> + ?Sized,
    S::Element: Clone,
{
    let mut added = 0;
    walk(source, |element| match dest.add(element.clone()) {
        Ok(_) => {
            added += 1;
            Ok(())
        }
        Err(Error::ValueAlreadyExists) => {
            trace!("skipping duplicate source element");
            Ok(())
        }
        Err(err) => {
            debug!(error = %err, added, "bulk copy stopped");
            Err(err)
        }
    })?;
    Ok(added)
}

/// Adds a clone of every entry of `source` to `dest`; the map analogue of [`copy_into`].
///
/// Entries whose key is already present are skipped.
pub fn copy_entries_into<S, D>(source: &S, dest: &mut D) -> Result<usize>
where
    S: Stream<Element = Entry<D::Key, D::Value>> + ?Sized,
    D: Map + ?Sized,
    D::Key: Clone,
    D::Value: Clone,
{
    let mut added = 0;
    walk(source, |entry| match dest.add(entry.key().clone(), entry.value().clone()) {
        Ok(_) => {
            added += 1;
            Ok(())
        }
        Err(Error::KeyAlreadyExists) => {
            trace!("skipping duplicate source key");
            Ok(())
        }
        Err(err) => {
            debug!(error = %err, added, "bulk entry copy stopped");
            Err(err)
        }
    })?;
    Ok(added)
}

// Visits every element of `source` from `first` through `next`.
fn walk<S, F>(source: &S, mut f: F) -> Result<()>
where
    S: Stream + ?Sized,
    F: FnMut(&S::Element) -> Result<()>,
{
    let mut item = match source.first() {
        Ok(item) => item,
        Err(err) if err.is_empty_collection() => return Ok(()),
        Err(err) => return Err(err),
    };

    loop {
        f(source.element(item)?)?;
        item = match source.next(item) {
            Ok(next) => next,
            Err(Error::EndOfSequence) => return Ok(()),
            Err(err) => return Err(err),
        };
    }
}
