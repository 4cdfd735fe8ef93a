use core::cmp::Ordering;
use core::iter::FusedIterator;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{Color, Node, Search, Side, Slot};

/// The red-black tree backing every typed container.
///
/// The tree knows nothing about how its elements are ordered. Every lookup takes a comparator closure
/// that returns the ordering of a stored element relative to the target, the same contract as
/// [`slice::binary_search_by`]. Insertion is two-phase: [`search_by`](Self::search_by) yields a
/// [`Slot`], and [`insert_at`](Self::insert_at) commits an element there. No other mutation may
/// happen in between.
#[derive(Clone)]
pub(crate) struct RawRbTree<T> {
    /// Arena storing all tree nodes. Node handles are stable until removal.
    nodes: Arena<Node<T>>,
    /// Handle to the root node, if the tree is non-empty.
    root: Option<Handle>,
}

impl<T> RawRbTree<T> {
    /// Creates a new, empty tree.
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
        }
    }

    /// Creates a new tree with room for `capacity` nodes.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            root: None,
        }
    }

    /// Caps the number of nodes. Insertions past the cap fail as allocation failures.
    pub(crate) fn set_limit(&mut self, limit: usize) {
        self.nodes.set_limit(limit);
    }

    pub(crate) const fn limit(&self) -> usize {
        self.nodes.limit()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Returns the number of elements in the tree.
    pub(crate) const fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drops every element.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        &self.node(handle).element
    }

    /// Returns a mutable reference to an element.
    ///
    /// The caller must not change anything the tree is ordered by.
    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut T {
        &mut self.node_mut(handle).element
    }

    #[inline]
    pub(crate) fn try_get(&self, handle: Handle) -> Option<&T> {
        self.nodes.try_get(handle).map(|node| &node.element)
    }

    #[inline]
    pub(crate) fn contains(&self, handle: Handle) -> bool {
        self.nodes.contains(handle)
    }

    /// Returns the smallest element's node.
    pub(crate) fn first(&self) -> Option<Handle> {
        self.root.map(|root| self.extreme(root, Side::Left))
    }

    /// Returns the largest element's node.
    pub(crate) fn last(&self) -> Option<Handle> {
        self.root.map(|root| self.extreme(root, Side::Right))
    }

    /// Returns the in-order successor of `handle`.
    pub(crate) fn next(&self, handle: Handle) -> Option<Handle> {
        self.step(handle, Side::Right)
    }

    /// Returns the in-order predecessor of `handle`.
    pub(crate) fn prev(&self, handle: Handle) -> Option<Handle> {
        self.step(handle, Side::Left)
    }

    /// Returns an in-order iterator over the elements.
    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter {
            tree: self,
            front: self.first(),
            back: self.last(),
            remaining: self.len(),
        }
    }

    /// Probes for an element. `f` returns the ordering of a stored element relative to the target.
    pub(crate) fn search_by<F>(&self, mut f: F) -> Search
    where
        F: FnMut(&T) -> Ordering,
    {
        let mut parent = None;
        let mut side = Side::Left;
        let mut current = self.root;

        while let Some(h) = current {
            let node = self.node(h);
            match f(&node.element) {
                Ordering::Less => side = Side::Right,
                Ordering::Greater => side = Side::Left,
                Ordering::Equal => return Search::Found(h),
            }
            parent = Some(h);
            current = node.child(side);
        }

        Search::Vacant(Slot { parent, side })
    }

    /// Returns the node holding an element equal to the target, if any.
    pub(crate) fn find_by<F>(&self, f: F) -> Option<Handle>
    where
        F: FnMut(&T) -> Ordering,
    {
        match self.search_by(f) {
            Search::Found(h) => Some(h),
            Search::Vacant(_) => None,
        }
    }

    /// Returns the first node whose element is `>=` the target.
    pub(crate) fn ceiling_by<F>(&self, f: F) -> Option<Handle>
    where
        F: FnMut(&T) -> Ordering,
    {
        self.bound_by(f, Side::Right, true)
    }

    /// Returns the first node whose element is `>` the target.
    pub(crate) fn higher_by<F>(&self, f: F) -> Option<Handle>
    where
        F: FnMut(&T) -> Ordering,
    {
        self.bound_by(f, Side::Right, false)
    }

    /// Returns the last node whose element is `<=` the target.
    pub(crate) fn floor_by<F>(&self, f: F) -> Option<Handle>
    where
        F: FnMut(&T) -> Ordering,
    {
        self.bound_by(f, Side::Left, true)
    }

    /// Returns the last node whose element is `<` the target.
    pub(crate) fn lower_by<F>(&self, f: F) -> Option<Handle>
    where
        F: FnMut(&T) -> Ordering,
    {
        self.bound_by(f, Side::Left, false)
    }

    // Nearest-neighbour search. `toward` is the side of the target the answer lies on.
    fn bound_by<F>(&self, mut f: F, toward: Side, inclusive: bool) -> Option<Handle>
    where
        F: FnMut(&T) -> Ordering,
    {
        let mut best = None;
        let mut current = self.root;

        while let Some(h) = current {
            let node = self.node(h);
            let side = match (f(&node.element), toward) {
                (Ordering::Equal, _) if inclusive => return Some(h),
                (Ordering::Greater, Side::Right) | (Ordering::Less, Side::Left) => {
                    best = Some(h);
                    toward.opposite()
                }
                (Ordering::Equal | Ordering::Less, Side::Right) => Side::Right,
                (Ordering::Equal | Ordering::Greater, Side::Left) => Side::Left,
            };
            current = node.child(side);
        }

        best
    }

    /// Attaches `element` at `slot` and rebalances.
    ///
    /// `slot` must come from a [`search_by`](Self::search_by) on the current tree. If no node can
    /// be allocated the element is handed back and the tree is untouched.
    pub(crate) fn insert_at(&mut self, slot: Slot, element: T) -> Result<Handle, T> {
        debug_assert!(
            slot.parent.is_some() || self.root.is_none(),
            "`RawRbTree::insert_at()` - stale slot!"
        );

        let handle = self.nodes.try_alloc(Node::new(element, slot.parent)).map_err(|node| node.element)?;

        match slot.parent {
            None => self.root = Some(handle),
            Some(parent) => self.node_mut(parent).set_child(slot.side, Some(handle)),
        }

        self.insert_fixup(handle);
        Ok(handle)
    }

    /// Unlinks the node at `handle`, rebalances, and returns its element.
    pub(crate) fn remove(&mut self, z: Handle) -> T {
        let node = self.node(z);
        let (left, right, z_color, z_parent) = (node.left, node.right, node.color, node.parent);

        // `x` takes the place of the node that physically leaves the tree. It may be nil, so its
        // parent is tracked separately.
        let (x, x_parent, removed_color) = match (left, right) {
            (None, _) => {
                self.transplant(z, right);
                (right, z_parent, z_color)
            }
            (_, None) => {
                self.transplant(z, left);
                (left, z_parent, z_color)
            }
            (Some(l), Some(r)) => {
                let y = self.extreme(r, Side::Left);
                let y_color = self.node(y).color;
                let x = self.node(y).right;

                let x_parent = if y == r {
                    Some(y)
                } else {
                    let y_parent = self.node(y).parent;
                    self.transplant(y, x);
                    self.node_mut(y).right = Some(r);
                    self.node_mut(r).parent = Some(y);
                    y_parent
                };

                self.transplant(z, Some(y));
                let y_node = self.node_mut(y);
                y_node.left = Some(l);
                y_node.color = z_color;
                self.node_mut(l).parent = Some(y);

                (x, x_parent, y_color)
            }
        };

        if removed_color == Color::Black {
            self.remove_fixup(x, x_parent);
        }

        self.nodes.take(z).element
    }

    // ─── Internals ─────────────────────────────────────────────────────────────

    #[inline]
    fn node(&self, handle: Handle) -> &Node<T> {
        self.nodes.get(handle)
    }

    #[inline]
    fn node_mut(&mut self, handle: Handle) -> &mut Node<T> {
        self.nodes.get_mut(handle)
    }

    #[inline]
    fn color(&self, handle: Option<Handle>) -> Color {
        handle.map_or(Color::Black, |h| self.node(h).color)
    }

    #[inline]
    fn paint(&mut self, handle: Option<Handle>, color: Color) {
        if let Some(h) = handle {
            self.node_mut(h).color = color;
        }
    }

    /// Which side of `parent` the node `child` hangs on.
    #[inline]
    fn side_of(&self, child: Handle, parent: Handle) -> Side {
        if self.node(parent).left == Some(child) { Side::Left } else { Side::Right }
    }

    /// Follows `side` links from `handle` to the end.
    fn extreme(&self, mut handle: Handle, side: Side) -> Handle {
        while let Some(child) = self.node(handle).child(side) {
            handle = child;
        }
        handle
    }

    /// In-order neighbour in direction `side`.
    fn step(&self, handle: Handle, side: Side) -> Option<Handle> {
        if let Some(child) = self.node(handle).child(side) {
            return Some(self.extreme(child, side.opposite()));
        }

        let mut current = handle;
        while let Some(parent) = self.node(current).parent {
            if self.node(parent).child(side.opposite()) == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    /// Points `old`'s parent (or the root) at `new`.
    fn replace_child(&mut self, parent: Option<Handle>, old: Handle, new: Option<Handle>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                let side = self.side_of(old, p);
                self.node_mut(p).set_child(side, new);
            }
        }
    }

    /// Replaces the subtree rooted at `u` with the subtree rooted at `v`.
    fn transplant(&mut self, u: Handle, v: Option<Handle>) {
        let parent = self.node(u).parent;
        self.replace_child(parent, u, v);
        if let Some(v) = v {
            self.node_mut(v).parent = parent;
        }
    }

    /// Rotates `x` down towards `side`; its child on the opposite side takes its place.
    fn rotate(&mut self, x: Handle, side: Side) {
        let other = side.opposite();
        let Some(y) = self.node(x).child(other) else {
            return;
        };

        let inner = self.node(y).child(side);
        self.node_mut(x).set_child(other, inner);
        if let Some(inner) = inner {
            self.node_mut(inner).parent = Some(x);
        }

        let parent = self.node(x).parent;
        self.node_mut(y).parent = parent;
        self.replace_child(parent, x, Some(y));

        self.node_mut(y).set_child(side, Some(x));
        self.node_mut(x).parent = Some(y);
    }

    fn insert_fixup(&mut self, mut z: Handle) {
        while let Some(mut parent) = self.node(z).parent
            && self.node(parent).color == Color::Red
        {
            // A red node is never the root, so the grandparent exists.
            let Some(grand) = self.node(parent).parent else {
                break;
            };
            let side = self.side_of(parent, grand);
            let uncle = self.node(grand).child(side.opposite());

            if self.color(uncle) == Color::Red {
                self.paint(Some(parent), Color::Black);
                self.paint(uncle, Color::Black);
                self.paint(Some(grand), Color::Red);
                z = grand;
                continue;
            }

            if self.side_of(z, parent) != side {
                // Inner grandchild: rotate it to the outside first.
                self.rotate(parent, side);
                core::mem::swap(&mut z, &mut parent);
            }

            self.paint(Some(parent), Color::Black);
            self.paint(Some(grand), Color::Red);
            self.rotate(grand, side.opposite());
        }

        self.paint(self.root, Color::Black);
    }

    fn remove_fixup(&mut self, mut x: Option<Handle>, mut parent: Option<Handle>) {
        while x != self.root && self.color(x) == Color::Black {
            let Some(p) = parent else {
                break;
            };
            let side = if self.node(p).left == x { Side::Left } else { Side::Right };
            let other = side.opposite();

            // `x` carries an extra black, so its sibling subtree has black height >= 1.
            let Some(mut w) = self.node(p).child(other) else {
                break;
            };

            if self.node(w).color == Color::Red {
                self.paint(Some(w), Color::Black);
                self.paint(Some(p), Color::Red);
                self.rotate(p, side);
                let Some(sibling) = self.node(p).child(other) else {
                    break;
                };
                w = sibling;
            }

            let near = self.node(w).child(side);
            let far = self.node(w).child(other);

            if self.color(near) == Color::Black && self.color(far) == Color::Black {
                self.paint(Some(w), Color::Red);
                x = Some(p);
                parent = self.node(p).parent;
                continue;
            }

            if self.color(far) == Color::Black {
                self.paint(near, Color::Black);
                self.paint(Some(w), Color::Red);
                self.rotate(w, other);
                let Some(sibling) = self.node(p).child(other) else {
                    break;
                };
                w = sibling;
            }

            let p_color = self.node(p).color;
            self.paint(Some(w), p_color);
            self.paint(Some(p), Color::Black);
            let far = self.node(w).child(other);
            self.paint(far, Color::Black);
            self.rotate(p, side);
            x = self.root;
            parent = None;
        }

        self.paint(x, Color::Black);
    }
}

impl<T> Default for RawRbTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// In-order iterator over a [`RawRbTree`].
pub(crate) struct Iter<'a, T> {
    tree: &'a RawRbTree<T>,
    front: Option<Handle>,
    back: Option<Handle>,
    remaining: usize,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
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
        self.front = self.tree.next(h);
        self.remaining -= 1;
        Some(self.tree.get(h))
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
        self.back = self.tree.prev(h);
        self.remaining -= 1;
        Some(self.tree.get(h))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::manual_assert, clippy::uninlined_format_args)]
mod tests {
    use super::*;
    use alloc::collections::BTreeSet;
    use alloc::string::String;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    impl<T: Ord> RawRbTree<T> {
        /// Validates all red-black invariants. Panics with a descriptive message if any are violated.
        pub(crate) fn validate_invariants(&self) {
            self.validate_invariants_by(Ord::cmp);
        }
    }

    impl<T> RawRbTree<T> {
        /// As [`validate_invariants`](Self::validate_invariants), ordering elements by `cmp`.
        pub(crate) fn validate_invariants_by<F>(&self, mut cmp: F)
        where
            F: FnMut(&T, &T) -> Ordering,
        {
            let mut errors: Vec<String> = Vec::new();

            match self.root {
                None => {
                    if self.len() != 0 {
                        errors.push(alloc::format!("empty tree has len {}", self.len()));
                    }
                }
                Some(root) => {
                    if self.node(root).parent.is_some() {
                        errors.push(String::from("root has a parent"));
                    }
                    if self.node(root).color != Color::Black {
                        errors.push(String::from("root is red"));
                    }
                    let mut count = 0;
                    self.validate_node(root, &mut count, &mut errors);
                    if count != self.len() {
                        errors.push(alloc::format!("len mismatch: len={}, reachable={}", self.len(), count));
                    }
                }
            }

            let in_order: Vec<&T> = self.iter().collect();
            if in_order.windows(2).any(|w| cmp(w[0], w[1]) != Ordering::Less) {
                errors.push(String::from("in-order walk is not strictly increasing"));
            }
            if in_order.len() != self.len() {
                errors.push(alloc::format!("iter yielded {} of {}", in_order.len(), self.len()));
            }

            assert!(errors.is_empty(), "Tree invariant violations:\n{}", errors.join("\n"));
        }

        // Returns the black height of the subtree.
        fn validate_node(&self, handle: Handle, count: &mut usize, errors: &mut Vec<String>) -> usize {
            *count += 1;
            let node = self.node(handle);

            for child in [node.left, node.right].into_iter().flatten() {
                if self.node(child).parent != Some(handle) {
                    errors.push(alloc::format!("broken parent link at {:?}", child));
                }
                if node.color == Color::Red && self.node(child).color == Color::Red {
                    errors.push(alloc::format!("red node {:?} has a red child", handle));
                }
            }

            let left = node.left.map_or(1, |l| self.validate_node(l, count, errors));
            let right = node.right.map_or(1, |r| self.validate_node(r, count, errors));
            if left != right {
                errors.push(alloc::format!("black height mismatch at {:?}: {} vs {}", handle, left, right));
            }

            left + usize::from(node.color == Color::Black)
        }
    }

    fn insert(tree: &mut RawRbTree<i32>, value: i32) -> bool {
        match tree.search_by(|e| e.cmp(&value)) {
            Search::Found(_) => false,
            Search::Vacant(slot) => {
                tree.insert_at(slot, value).unwrap();
                true
            }
        }
    }

    fn remove(tree: &mut RawRbTree<i32>, value: i32) -> bool {
        match tree.find_by(|e| e.cmp(&value)) {
            Some(h) => {
                assert_eq!(tree.remove(h), value);
                true
            }
            None => false,
        }
    }

    #[test]
    fn ascending_and_descending_inserts_stay_balanced() {
        let mut tree = RawRbTree::new();
        for v in 0..500 {
            assert!(insert(&mut tree, v));
        }
        tree.validate_invariants();
        for v in (500..1000).rev() {
            assert!(insert(&mut tree, v));
        }
        tree.validate_invariants();
        assert_eq!(tree.len(), 1000);
        assert!(tree.iter().copied().eq(0..1000));
        assert!(tree.iter().rev().copied().eq((0..1000).rev()));

        for v in (0..1000).step_by(3) {
            assert!(remove(&mut tree, v));
            tree.validate_invariants();
        }
    }

    #[test]
    fn bounds() {
        let mut tree = RawRbTree::new();
        for v in [10, 20, 30] {
            insert(&mut tree, v);
        }
        let at = |h: Option<Handle>| h.map(|h| *tree.get(h));

        assert_eq!(at(tree.ceiling_by(|e| e.cmp(&20))), Some(20));
        assert_eq!(at(tree.ceiling_by(|e| e.cmp(&21))), Some(30));
        assert_eq!(at(tree.ceiling_by(|e| e.cmp(&31))), None);
        assert_eq!(at(tree.higher_by(|e| e.cmp(&20))), Some(30));
        assert_eq!(at(tree.higher_by(|e| e.cmp(&5))), Some(10));
        assert_eq!(at(tree.floor_by(|e| e.cmp(&20))), Some(20));
        assert_eq!(at(tree.floor_by(|e| e.cmp(&19))), Some(10));
        assert_eq!(at(tree.floor_by(|e| e.cmp(&9))), None);
        assert_eq!(at(tree.lower_by(|e| e.cmp(&20))), Some(10));
        assert_eq!(at(tree.lower_by(|e| e.cmp(&10))), None);
        assert_eq!(at(tree.lower_by(|e| e.cmp(&99))), Some(30));
    }

    #[test]
    fn exhausted_arena_hands_element_back() {
        let mut tree = RawRbTree::new();
        tree.set_limit(2);
        assert!(insert(&mut tree, 1));
        assert!(insert(&mut tree, 2));

        let Search::Vacant(slot) = tree.search_by(|e| e.cmp(&3)) else {
            panic!("3 is not in the tree");
        };
        assert_eq!(tree.insert_at(slot, 3), Err(3));
        assert_eq!(tree.len(), 2);
        tree.validate_invariants();
    }

    #[test]
    fn neighbours_walk_in_order() {
        let mut tree = RawRbTree::new();
        for v in [5, 1, 4, 2, 3] {
            insert(&mut tree, v);
        }
        let first = tree.first().unwrap();
        assert_eq!(*tree.get(first), 1);
        assert_eq!(tree.prev(first), None);

        let last = tree.last().unwrap();
        assert_eq!(*tree.get(last), 5);
        assert_eq!(tree.next(last), None);

        let mut walked = Vec::new();
        let mut cursor = Some(first);
        while let Some(h) = cursor {
            walked.push(*tree.get(h));
            cursor = tree.next(h);
        }
        assert_eq!(walked, [1, 2, 3, 4, 5]);
    }

    proptest! {
        #[test]
        fn tree_matches_btreeset(ops in prop::collection::vec((any::<bool>(), 0i32..200), 0..400)) {
            let mut tree = RawRbTree::new();
            let mut model = BTreeSet::new();

            for (is_insert, value) in ops {
                if is_insert {
                    prop_assert_eq!(insert(&mut tree, value), model.insert(value));
                } else {
                    prop_assert_eq!(remove(&mut tree, value), model.remove(&value));
                }
                tree.validate_invariants();
                prop_assert_eq!(tree.len(), model.len());
            }

            prop_assert!(tree.iter().eq(model.iter()));
        }
    }
}
