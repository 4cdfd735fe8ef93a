use alloc::vec::Vec;

use super::handle::Handle;

/// Slot storage with a free list and an optional element budget.
///
/// Allocation is fallible: it fails once `limit` slots are in use, when the slot index no
/// longer fits a [`Handle`], or when the backing `Vec` cannot grow. The element is handed back
/// on failure so the caller decides its fate. Releasing a slot never allocates.
#[derive(Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<Handle>,
    limit: usize,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            limit: Handle::MAX,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::with_capacity(capacity),
            limit: Handle::MAX,
        }
    }

    /// Caps the number of live elements at `limit` (never above [`Handle::MAX`]).
    pub(crate) fn set_limit(&mut self, limit: usize) {
        self.limit = limit.min(Handle::MAX);
    }

    pub(crate) const fn limit(&self) -> usize {
        self.limit
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    pub(crate) const fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len())
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores `element` and returns its handle, or gives `element` back if no slot is available.
    pub(crate) fn try_alloc(&mut self, element: T) -> Result<Handle, T> {
        if self.len() >= self.limit {
            return Err(element);
        }

        if let Some(h) = self.free.pop() {
            self.slots[h.index()] = Some(element);
            return Ok(h);
        }

        let Some(handle) = Handle::new(self.slots.len()) else {
            return Err(element);
        };

        // Keep room in the free list for every slot so `take` stays allocation free.
        let free_room = self.slots.len() + 1 - self.free.len();
        if self.slots.try_reserve(1).is_err() || self.free.try_reserve(free_room).is_err() {
            return Err(element);
        }

        self.slots.push(Some(element));
        Ok(handle)
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        self.slots[handle.index()].as_ref().expect("`Arena::get()` - `handle` is invalid!")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut T {
        self.slots[handle.index()].as_mut().expect("`Arena::get_mut()` - `handle` is invalid!")
    }

    /// Returns the element at `handle`, or `None` if the slot is vacant or out of range.
    #[inline]
    pub(crate) fn try_get(&self, handle: Handle) -> Option<&T> {
        self.slots.get(handle.index()).and_then(Option::as_ref)
    }

    #[inline]
    pub(crate) fn contains(&self, handle: Handle) -> bool {
        self.try_get(handle).is_some()
    }

    pub(crate) fn take(&mut self, handle: Handle) -> T {
        let element = self.slots[handle.index()].take().expect("`Arena::take()` - `handle` is invalid!");
        self.free.push(handle);
        element
    }

    /// Drops every element. The limit is kept.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn arena_capacity() {
        let arena: Arena<u32> = Arena::with_capacity(10);
        assert_eq!(arena.capacity(), 10);
        assert_eq!(arena.limit(), Handle::MAX);
    }

    #[test]
    fn limit_rejects_and_returns_element() {
        let mut arena: Arena<u32> = Arena::new();
        arena.set_limit(2);

        let a = arena.try_alloc(1).unwrap();
        let _b = arena.try_alloc(2).unwrap();
        assert_eq!(arena.try_alloc(3), Err(3));
        assert_eq!(arena.len(), 2);

        // Freed slots are reusable up to the limit again.
        assert_eq!(arena.take(a), 1);
        let c = arena.try_alloc(4).unwrap();
        assert_eq!(c, a);
        assert_eq!(*arena.get(c), 4);
        assert_eq!(arena.try_alloc(5), Err(5));
    }

    #[test]
    fn limit_is_clamped_to_handle_range() {
        let mut arena: Arena<u8> = Arena::new();
        arena.set_limit(usize::MAX);
        assert_eq!(arena.limit(), Handle::MAX);
    }

    #[test]
    fn stale_handles_are_detected() {
        let mut arena: Arena<u32> = Arena::new();
        let a = arena.try_alloc(7).unwrap();
        assert!(arena.contains(a));
        arena.take(a);
        assert!(!arena.contains(a));
        assert_eq!(arena.try_get(a), None);
        assert_eq!(arena.try_get(Handle::new(40).unwrap()), None);
    }

    proptest! {
        #[test]
        fn arena_behaves_like_vec(operations in prop::collection::vec(strategy(), 0..256)) {
            let mut model: Vec<(Handle, u32)> = Vec::new();
            let mut arena: Arena<u32> = Arena::new();
            arena.set_limit(64);

            for operation in operations {
                match operation {
                    Operation::Alloc(value) => match arena.try_alloc(value) {
                        Ok(handle) => model.push((handle, value)),
                        Err(returned) => {
                            prop_assert_eq!(returned, value);
                            prop_assert_eq!(model.len(), 64);
                        }
                    },
                    Operation::GetMut(which, value) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let handle = model[index].0;
                        *arena.get_mut(handle) = value;
                        model[index].1 = value;
                    }
                    Operation::Take(which) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let handle = model[index].0;
                        let value1 = arena.take(handle);
                        let (_, value2) = model.swap_remove(index);
                        prop_assert_eq!(value1, value2);
                        prop_assert!(!arena.contains(handle));
                    }
                    Operation::Clear => {
                        arena.clear();
                        model.clear();
                    }
                }

                prop_assert_eq!(arena.len(), model.len());
                prop_assert_eq!(arena.is_empty(), model.is_empty());

                for &(handle, value) in &model {
                    prop_assert_eq!(*arena.get(handle), value);
                }
            }
        }
    }

    #[derive(Clone, Debug)]
    enum Operation {
        Alloc(u32),
        GetMut(usize, u32),
        Take(usize),
        Clear,
    }

    fn strategy() -> impl Strategy<Value = Operation> {
        prop_oneof![
            20 => any::<u32>().prop_map(Operation::Alloc),
            5 => (any::<usize>(), any::<u32>()).prop_map(|(which, value)| Operation::GetMut(which, value)),
            8 => any::<usize>().prop_map(Operation::Take),
            1 => Just(Operation::Clear),
        ]
    }
}
