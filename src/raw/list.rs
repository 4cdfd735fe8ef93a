use super::arena::Arena;
use super::handle::Handle;

#[derive(Clone)]
struct ListNode<T> {
    value: T,
    prev: Option<Handle>,
    next: Option<Handle>,
}

/// Doubly linked list whose nodes live in an [`Arena`].
///
/// Node handles stay valid until the node is unlinked, so callers can splice next to any node
/// in O(1). Allocation can fail (see [`Arena::try_alloc`]); the value is handed back when it does.
#[derive(Clone)]
pub(crate) struct RawList<T> {
    nodes: Arena<ListNode<T>>,
    head: Option<Handle>,
    tail: Option<Handle>,
}

impl<T> RawList<T> {
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            head: None,
            tail: None,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    pub(crate) fn set_limit(&mut self, limit: usize) {
        self.nodes.set_limit(limit);
    }

    pub(crate) const fn limit(&self) -> usize {
        self.nodes.limit()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    pub(crate) const fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.head = None;
        self.tail = None;
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        &self.nodes.get(handle).value
    }

    #[inline]
    pub(crate) fn try_get(&self, handle: Handle) -> Option<&T> {
        self.nodes.try_get(handle).map(|node| &node.value)
    }

    #[inline]
    pub(crate) fn contains(&self, handle: Handle) -> bool {
        self.nodes.contains(handle)
    }

    pub(crate) const fn first(&self) -> Option<Handle> {
        self.head
    }

    pub(crate) const fn last(&self) -> Option<Handle> {
        self.tail
    }

    #[inline]
    pub(crate) fn next(&self, handle: Handle) -> Option<Handle> {
        self.nodes.get(handle).next
    }

    #[inline]
    pub(crate) fn prev(&self, handle: Handle) -> Option<Handle> {
        self.nodes.get(handle).prev
    }

    pub(crate) fn push_front(&mut self, value: T) -> Result<Handle, T> {
        self.link(value, None, self.head)
    }

    pub(crate) fn push_back(&mut self, value: T) -> Result<Handle, T> {
        self.link(value, self.tail, None)
    }

    /// Links `value` directly after `anchor`.
    pub(crate) fn insert_after(&mut self, anchor: Handle, value: T) -> Result<Handle, T> {
        let next = self.next(anchor);
        self.link(value, Some(anchor), next)
    }

    /// Links `value` directly before `anchor`.
    pub(crate) fn insert_before(&mut self, anchor: Handle, value: T) -> Result<Handle, T> {
        let prev = self.prev(anchor);
        self.link(value, prev, Some(anchor))
    }

    /// Unlinks the node at `handle` and returns its value.
    pub(crate) fn unlink(&mut self, handle: Handle) -> T {
        let ListNode { value, prev, next } = self.nodes.take(handle);

        match prev {
            Some(p) => self.nodes.get_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes.get_mut(n).prev = prev,
            None => self.tail = prev,
        }

        value
    }

    /// Returns an iterator over the values in list order.
    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            front: self.head,
            back: self.tail,
            remaining: self.len(),
        }
    }

    // `prev` and `next` must be adjacent (or the matching end of the list).
    fn link(&mut self, value: T, prev: Option<Handle>, next: Option<Handle>) -> Result<Handle, T> {
        let handle = self.nodes.try_alloc(ListNode { value, prev, next }).map_err(|node| node.value)?;

        match prev {
            Some(p) => self.nodes.get_mut(p).next = Some(handle),
            None => self.head = Some(handle),
        }
        match next {
            Some(n) => self.nodes.get_mut(n).prev = Some(handle),
            None => self.tail = Some(handle),
        }

        Ok(handle)
    }
}

impl<T> Default for RawList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a [`RawList`] in link order.
pub(crate) struct Iter<'a, T> {
    list: &'a RawList<T>,
    front: Option<Handle>,
    back: Option<Handle>,
    remaining: usize,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            list: self.list,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let h = self.front?;
        self.front = self.list.next(h);
        self.remaining -= 1;
        Some(self.list.get(h))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let h = self.back?;
        self.back = self.list.prev(h);
        self.remaining -= 1;
        Some(self.list.get(h))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
