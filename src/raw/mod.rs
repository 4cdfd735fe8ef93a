mod arena;
mod handle;
mod list;
mod node;
mod raw_rbtree;

pub(crate) use handle::Handle;
pub(crate) use list::{Iter as ListIter, RawList};
pub(crate) use node::{Search, Slot};
pub(crate) use raw_rbtree::{Iter as TreeIter, RawRbTree};
