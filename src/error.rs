//! Error type shared by every container.

use thiserror::Error;

/// Result type alias using the crate's [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

/// Why a container operation failed.
///
/// Every failing operation reports exactly one of these and leaves the container as it was
/// before the call. Conditions that only differ by container flavour (set vs. map) keep
/// separate variants so callers can match on them precisely.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// An equal value is already in the set.
    #[error("value already exists")]
    ValueAlreadyExists,

    /// An entry with an equal key is already in the map.
    #[error("key already exists")]
    KeyAlreadyExists,

    /// No equal value is in the set, or no value satisfies a nearest-neighbour search.
    #[error("value not found")]
    ValueNotFound,

    /// No entry with an equal key is in the map, or no key satisfies a nearest-neighbour search.
    #[error("key not found")]
    KeyNotFound,

    /// The [`Item`](crate::Item) does not name a live element of this container.
    #[error("item is invalid")]
    ItemIsInvalid,

    /// The set has no elements.
    #[error("set is empty")]
    SetIsEmpty,

    /// The map has no entries.
    #[error("map is empty")]
    MapIsEmpty,

    /// A traversal stepped past the first or last element.
    #[error("end of sequence")]
    EndOfSequence,

    /// No node could be allocated for the new element.
    #[error("memory allocation failed")]
    MemoryAllocationFailed,

    /// The weak reference's strong owner has already been released.
    #[error("strong is invalid")]
    StrongIsInvalid,
}

impl Error {
    /// Returns true for the "nothing to traverse" conditions a [`Stream`](crate::Stream) reports
    /// from `first` on an empty container.
    #[must_use]
    pub const fn is_empty_collection(self) -> bool {
        matches!(self, Error::SetIsEmpty | Error::MapIsEmpty)
    }
}
