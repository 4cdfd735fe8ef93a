//! Red-black tree collections behind a layered capability interface.
//!
//! This crate provides four ordered containers built on one arena-backed red-black tree:
//!
//! - [`TreeSet`] - a set of unique values in ascending order
//! - [`TreeMap`] - a map of unique keys in ascending order
//! - [`WeakValueMap`] - a map whose values are [`Weak`](alloc::rc::Weak) references that must be
//!   live when inserted
//! - [`LinkedTreeSet`] - a set indexed both by value and by a caller-controlled linked order
//!
//! Each container implements the capability traits it can honour, from [`Stream`] (walk and
//! remove) through [`SortedSet`] or [`SortedMap`] (value-ordered traversal and nearest-neighbour
//! search), so code written against a capability works with any container providing it.
//! [`LinkedTreeSet`] stops at [`OrderedSet`], since it traverses in list order, and offers its
//! nearest-neighbour search as inherent methods. Positions are named by [`Item`] handles, and
//! every fallible operation returns an [`Error`] naming exactly what went wrong.
//!
//! # Example
//!
//! ```
//! use rbtree_collections::{Error, IntSet, LinkedIntSet, OrderedSet, SortedSet, copy_into};
//!
//! let mut order = LinkedIntSet::new();
//! order.append(10).unwrap();
//! order.append(20).unwrap();
//! order.prepend(30).unwrap();
//! assert_eq!(order.iter().copied().collect::<Vec<_>>(), [30, 10, 20]);
//!
//! let mut sorted = IntSet::new();
//! assert_eq!(copy_into(&order, &mut sorted), Ok(3));
//! assert_eq!(sorted.add(10), Err(Error::ValueAlreadyExists));
//!
//! // Membership through one trait object, each walked in its own order.
//! for set in [&sorted as &dyn OrderedSet<Element = i32>, &order] {
//!     assert!(set.contains(&20));
//!     assert_eq!(set.get(&15), Err(Error::ValueNotFound));
//! }
//!
//! // Nearest-neighbour search by value.
//! assert_eq!(sorted.element(SortedSet::ceiling(&sorted, &12).unwrap()), Ok(&20));
//! assert_eq!(order.element(order.ceiling(&12).unwrap()), Ok(&20));
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **Stable items** - An [`Item`] stays valid until its element is removed
//! - **Atomic failure** - A failed insertion leaves the container exactly as it was, including
//!   when node allocation fails (see [`TreeSet::with_max_len`])

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod raw;

pub mod capability;
pub mod error;
pub mod linked_set;
pub mod tree_map;
pub mod tree_set;
pub mod weak_map;

pub use capability::{
    Collection, Item, Map, OrderedSet, Set, SortedMap, SortedSet, Stream, copy_entries_into, copy_into,
};
pub use error::{Error, Result};
pub use linked_set::{LinkedIntSet, LinkedTreeSet};
pub use tree_map::{Entry, IntIntMap, StrPtrMap, TreeMap};
pub use tree_set::{IntSet, StrSet, TreeSet};
pub use weak_map::{StrWeakMap, WeakValueMap};
