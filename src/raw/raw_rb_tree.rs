use alloc::vec::Vec;
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;

use log::{debug, trace};
use smallvec::SmallVec;

use super::arena::Arena;
use super::handle::{Handle, Link};
use super::node::{Color, LEAF_COLOR, Node, Side};
use crate::InvariantViolation;

/// The red-black tree backing `RBTreeSet`.
#[derive(Clone)]
pub(crate) struct RawRBTree<T> {
    /// Arena storing all tree nodes.
    nodes: Arena<Node<T>>,
    /// Handle to the root node, if the tree is non-empty.
    root: Link,
}

/// A child position in the tree: slot `side` of `parent`, currently holding `link`.
///
/// Deletion hands one of these to the fix-up so the double-black position is known by where it
/// sits, even when the slot is empty.
#[derive(Clone, Copy, Debug)]
struct Slot {
    parent: Link,
    side: Side,
    link: Link,
}

/// A double-ended in-order cursor pair over a [`RawRBTree`].
pub(crate) struct RawIter<'a, T> {
    tree: Option<&'a RawRBTree<T>>,
    front: Link,
    back: Link,
    remaining: usize,
}

impl<T> RawRBTree<T> {
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

    pub(crate) const fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    #[inline]
    pub(crate) fn key(&self, handle: Handle) -> &T {
        self.nodes[handle].key()
    }

    /// Color of a link; an empty link is the black leaf.
    #[inline]
    fn color(&self, link: Link) -> Color {
        link.map_or(LEAF_COLOR, |handle| self.nodes[handle].color())
    }

    #[inline]
    fn is_red(&self, link: Link) -> bool {
        self.color(link) == Color::Red
    }

    /// Returns the side of its parent that `node` hangs on.
    fn side_of(&self, node: Handle) -> Side {
        let parent = self.nodes[node].parent().expect("`RawRBTree::side_of()` - `node` is the root!");
        self.nodes[parent].side_of(node).expect("`RawRBTree::side_of()` - parent does not own `node`!")
    }

    /// Follows `side` links from `node` to the end of the spine.
    fn extreme(&self, mut node: Handle, side: Side) -> Handle {
        while let Some(child) = self.nodes[node].child(side) {
            node = child;
        }
        node
    }

    /// Returns the node holding the smallest key in the subtree rooted at `node`.
    pub(crate) fn minimum(&self, node: Handle) -> Handle {
        self.extreme(node, Side::Left)
    }

    /// Returns the node holding the largest key in the subtree rooted at `node`.
    pub(crate) fn maximum(&self, node: Handle) -> Handle {
        self.extreme(node, Side::Right)
    }

    pub(crate) fn first(&self) -> Link {
        self.root.map(|root| self.minimum(root))
    }

    pub(crate) fn last(&self) -> Link {
        self.root.map(|root| self.maximum(root))
    }

    /// In-order neighbor of `node` in direction `side` (`Right` is the successor).
    fn step(&self, mut node: Handle, side: Side) -> Link {
        if let Some(child) = self.nodes[node].child(side) {
            return Some(self.extreme(child, side.opposite()));
        }
        while let Some(parent) = self.nodes[node].parent() {
            if self.nodes[parent].child(side) != Some(node) {
                return Some(parent);
            }
            node = parent;
        }
        None
    }

    pub(crate) fn successor(&self, node: Handle) -> Link {
        self.step(node, Side::Right)
    }

    pub(crate) fn predecessor(&self, node: Handle) -> Link {
        self.step(node, Side::Left)
    }

    /// Number of nodes on the longest root-to-leaf path (0 for an empty tree).
    pub(crate) fn height(&self) -> usize {
        let mut stack: SmallVec<[(Handle, usize); 64]> = SmallVec::new();
        stack.extend(self.root.map(|root| (root, 1)));

        let mut height = 0;
        while let Some((node, depth)) = stack.pop() {
            height = height.max(depth);
            let node = &self.nodes[node];
            stack.extend([node.left(), node.right()].into_iter().flatten().map(|child| (child, depth + 1)));
        }
        height
    }

    pub(crate) fn iter(&self) -> RawIter<'_, T> {
        RawIter {
            tree: Some(self),
            front: self.first(),
            back: self.last(),
            remaining: self.len(),
        }
    }

    /// Moves every key out in ascending order.
    pub(crate) fn into_sorted_vec(mut self) -> Vec<T> {
        let mut order = Vec::with_capacity(self.len());
        let mut next = self.first();
        while let Some(node) = next {
            order.push(node);
            next = self.successor(node);
        }
        order.into_iter().map(|node| self.nodes.remove(node).into_key()).collect()
    }

    // ─── Structural primitives ──────────────────────────────────────────────

    /// Puts `new` into the child slot of `parent` that holds `old`, or makes it the root when
    /// `parent` is `None`, and points `new` back at `parent`.
    fn replace_child(&mut self, parent: Link, old: Handle, new: Link) {
        match parent {
            None => self.root = new,
            Some(parent) => {
                let side =
                    self.nodes[parent].side_of(old).expect("`RawRBTree::replace_child()` - `old` is not a child!");
                self.nodes[parent].set_child(side, new);
            }
        }
        if let Some(new) = new {
            self.nodes[new].set_parent(parent);
        }
    }

    /// Rotates `node` down toward `side`, lifting its child on the other side into its place.
    /// `Side::Left` is a left rotation, `Side::Right` a right rotation. Colors are untouched.
    fn rotate(&mut self, node: Handle, side: Side) {
        let lifted = self.nodes[node].child(side.opposite()).expect("`RawRBTree::rotate()` - no child to lift!");

        let inner = self.nodes[lifted].child(side);
        self.nodes[node].set_child(side.opposite(), inner);
        if let Some(inner) = inner {
            self.nodes[inner].set_parent(Some(node));
        }

        let parent = self.nodes[node].parent();
        self.replace_child(parent, node, Some(lifted));

        self.nodes[lifted].set_child(side, Some(node));
        self.nodes[node].set_parent(Some(lifted));
    }

    // ─── Insertion ──────────────────────────────────────────────────────────

    /// Restores the red-black invariants after `node` was attached as a red leaf.
    fn insert_fixup(&mut self, mut node: Handle) {
        while let Some(parent) = self.nodes[node].parent() {
            if !self.nodes[parent].is_red() {
                break;
            }

            // A red node is never the root, so the grandparent exists.
            let grandparent =
                self.nodes[parent].parent().expect("`RawRBTree::insert_fixup()` - red node at the root!");
            let side = self.side_of(parent);
            let uncle = self.nodes[grandparent].child(side.opposite());

            if let Some(uncle) = uncle.filter(|&uncle| self.nodes[uncle].is_red()) {
                trace!("insert fix-up: red uncle {uncle:?}, recoloring {grandparent:?}");
                self.nodes[parent].set_color(Color::Black);
                self.nodes[uncle].set_color(Color::Black);
                self.nodes[grandparent].set_color(Color::Red);
                node = grandparent;
                continue;
            }

            let top = if self.side_of(node) == side {
                parent
            } else {
                trace!("insert fix-up: inner child {node:?}, rotating {parent:?} {side:?}");
                self.rotate(parent, side);
                node
            };

            trace!("insert fix-up: rotating {grandparent:?} {:?}", side.opposite());
            self.nodes[top].set_color(Color::Black);
            self.nodes[grandparent].set_color(Color::Red);
            self.rotate(grandparent, side.opposite());
            break;
        }

        if let Some(root) = self.root {
            self.nodes[root].set_color(Color::Black);
        }
    }

    // ─── Deletion ───────────────────────────────────────────────────────────

    pub(crate) fn pop_first(&mut self) -> Option<T> {
        let first = self.first()?;
        Some(self.delete_node(first))
    }

    pub(crate) fn pop_last(&mut self) -> Option<T> {
        let last = self.last()?;
        Some(self.delete_node(last))
    }

    /// Unlinks `node`, frees its slot, and rebalances. Returns the node's key.
    fn delete_node(&mut self, node: Handle) -> T {
        let (left, right, parent) = {
            let node = &self.nodes[node];
            (node.left(), node.right(), node.parent())
        };

        // The color that physically left the tree and the slot it left from.
        let (removed_color, slot) = match (left, right) {
            (None, child) | (child, None) => {
                let side = if parent.is_some() { self.side_of(node) } else { Side::Left };
                self.replace_child(parent, node, child);
                let slot = Slot {
                    parent,
                    side,
                    link: child,
                };
                (self.nodes[node].color(), slot)
            }
            (Some(left), Some(right)) => {
                let successor = self.minimum(right);
                let successor_color = self.nodes[successor].color();
                let successor_right = self.nodes[successor].right();

                let slot = if successor == right {
                    Slot {
                        parent: Some(successor),
                        side: Side::Right,
                        link: successor_right,
                    }
                } else {
                    let successor_parent = self.nodes[successor].parent();
                    self.replace_child(successor_parent, successor, successor_right);
                    self.nodes[successor].set_child(Side::Right, Some(right));
                    self.nodes[right].set_parent(Some(successor));
                    Slot {
                        parent: successor_parent,
                        side: Side::Left,
                        link: successor_right,
                    }
                };

                self.replace_child(parent, node, Some(successor));
                self.nodes[successor].set_child(Side::Left, Some(left));
                self.nodes[left].set_parent(Some(successor));
                let color = self.nodes[node].color();
                self.nodes[successor].set_color(color);

                (successor_color, slot)
            }
        };

        let key = self.nodes.remove(node).into_key();
        if removed_color == Color::Black {
            self.delete_fixup(slot);
        }
        key
    }

    /// Resolves the missing black unit at `slot` left behind by removing a black node.
    fn delete_fixup(&mut self, slot: Slot) {
        let Slot {
            mut parent,
            mut side,
            mut link,
        } = slot;

        while let Some(above) = parent {
            if self.is_red(link) {
                break;
            }

            let mut sibling = self.sibling(above, side);
            if self.nodes[sibling].is_red() {
                trace!("delete fix-up: red sibling {sibling:?}, rotating {above:?} {side:?}");
                self.nodes[sibling].set_color(Color::Black);
                self.nodes[above].set_color(Color::Red);
                self.rotate(above, side);
                sibling = self.sibling(above, side);
            }

            let near = self.nodes[sibling].child(side);
            let far = self.nodes[sibling].child(side.opposite());

            if !self.is_red(near) && !self.is_red(far) {
                trace!("delete fix-up: black sibling {sibling:?}, moving deficiency to {above:?}");
                self.nodes[sibling].set_color(Color::Red);
                link = Some(above);
                parent = self.nodes[above].parent();
                if parent.is_some() {
                    side = self.side_of(above);
                }
                continue;
            }

            if !self.is_red(far) {
                trace!("delete fix-up: red near nephew, rotating {sibling:?} {:?}", side.opposite());
                if let Some(near) = near {
                    self.nodes[near].set_color(Color::Black);
                }
                self.nodes[sibling].set_color(Color::Red);
                self.rotate(sibling, side.opposite());
                sibling = self.sibling(above, side);
            }

            trace!("delete fix-up: red far nephew, rotating {above:?} {side:?}");
            let color = self.nodes[above].color();
            self.nodes[sibling].set_color(color);
            self.nodes[above].set_color(Color::Black);
            if let Some(far) = self.nodes[sibling].child(side.opposite()) {
                self.nodes[far].set_color(Color::Black);
            }
            self.rotate(above, side);
            link = self.root;
            break;
        }

        if let Some(link) = link {
            self.nodes[link].set_color(Color::Black);
        }
    }

    /// The child of `parent` opposite `side`. A black-height deficiency below `parent` on
    /// `side` means the other side carries at least one black node, so it is never empty.
    fn sibling(&self, parent: Handle, side: Side) -> Handle {
        self.nodes[parent].child(side.opposite()).expect("`RawRBTree::sibling()` - deficient slot has no sibling!")
    }
}

impl<T: Ord> RawRBTree<T> {
    /// Finds the node holding a key equal to `key`.
    pub(crate) fn search<Q>(&self, key: &Q) -> Link
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root;
        while let Some(node) = current {
            current = match key.cmp(self.nodes[node].key().borrow()) {
                Ordering::Less => self.nodes[node].left(),
                Ordering::Greater => self.nodes[node].right(),
                Ordering::Equal => return Some(node),
            };
        }
        None
    }

    /// Inserts `key` as a new red leaf and rebalances. Returns `false`, leaving the tree
    /// untouched, if an equal key is already stored.
    pub(crate) fn insert(&mut self, key: T) -> bool {
        let mut parent = None;
        let mut side = Side::Left;
        let mut current = self.root;

        while let Some(node) = current {
            side = match key.cmp(self.nodes[node].key()) {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => return false,
            };
            parent = current;
            current = self.nodes[node].child(side);
        }

        let node = self.nodes.insert(Node::new(key, parent));
        match parent {
            None => self.root = Some(node),
            Some(parent) => self.nodes[parent].set_child(side, Some(node)),
        }

        self.insert_fixup(node);
        true
    }

    /// Removes the key equal to `key`, if any, and returns it.
    pub(crate) fn delete<Q>(&mut self, key: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let node = self.search(key)?;
        Some(self.delete_node(node))
    }

    /// Checks every red-black and structural invariant. On success returns the black-height:
    /// the number of black nodes on each path from the root down to an empty slot.
    pub(crate) fn check_invariants(&self) -> Result<usize, InvariantViolation> {
        let result = self.check_structure();
        if let Err(violation) = &result {
            debug!("red-black invariant violated: {violation}");
        }
        result
    }

    fn check_structure(&self) -> Result<usize, InvariantViolation> {
        let Some(root) = self.root else {
            return match self.len() {
                0 => Ok(0),
                stored => Err(InvariantViolation::LengthMismatch {
                    reachable: 0,
                    stored,
                }),
            };
        };

        if self.nodes[root].parent().is_some() {
            return Err(InvariantViolation::RootHasParent);
        }
        if self.nodes[root].is_red() {
            return Err(InvariantViolation::RedRoot);
        }

        let mut reachable = 0;
        let black_height = self.check_subtree(root, 0, &mut reachable)?;
        if reachable != self.len() {
            return Err(InvariantViolation::LengthMismatch {
                reachable,
                stored: self.len(),
            });
        }

        // The links form a proper tree now, so the in-order walk terminates.
        let mut keys = self.iter();
        let mut previous = keys.next();
        for (position, key) in keys.enumerate() {
            if previous.is_some_and(|previous| previous >= key) {
                return Err(InvariantViolation::OutOfOrder {
                    position,
                });
            }
            previous = Some(key);
        }

        Ok(black_height)
    }

    /// Validates the subtree at `node` and returns its black-height, counting `node` itself.
    fn check_subtree(&self, node: Handle, depth: usize, reachable: &mut usize) -> Result<usize, InvariantViolation> {
        *reachable += 1;
        let current = &self.nodes[node];

        let mut heights = [0; 2];
        for (height, side) in heights.iter_mut().zip([Side::Left, Side::Right]) {
            let Some(child) = current.child(side) else {
                continue;
            };
            if self.nodes[child].parent() != Some(node) {
                return Err(InvariantViolation::BrokenParentLink {
                    depth: depth + 1,
                });
            }
            if current.is_red() && self.nodes[child].is_red() {
                return Err(InvariantViolation::RedRedEdge {
                    depth,
                });
            }
            *height = self.check_subtree(child, depth + 1, reachable)?;
        }

        let [left, right] = heights;
        if left != right {
            return Err(InvariantViolation::BlackHeightMismatch {
                depth,
                left,
                right,
            });
        }
        Ok(left + usize::from(!current.is_red()))
    }
}

impl<'a, T> Iterator for RawIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let tree = self.tree?;
        let node = self.front?;
        self.front = tree.successor(node);
        self.remaining -= 1;
        Some(tree.key(node))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for RawIter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let tree = self.tree?;
        let node = self.back?;
        self.back = tree.predecessor(node);
        self.remaining -= 1;
        Some(tree.key(node))
    }
}

impl<T> ExactSizeIterator for RawIter<'_, T> {}

impl<T> Clone for RawIter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<T> Default for RawIter<'_, T> {
    fn default() -> Self {
        Self {
            tree: None,
            front: None,
            back: None,
            remaining: 0,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for RawIter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::collections::BTreeSet;
    use alloc::vec;
    use proptest::prelude::*;

    fn tree_from<const N: usize>(keys: [i32; N]) -> RawRBTree<i32> {
        let mut tree = RawRBTree::new();
        for key in keys {
            assert!(tree.insert(key));
        }
        tree
    }

    fn keys(tree: &RawRBTree<i32>) -> Vec<i32> {
        tree.iter().copied().collect()
    }

    fn key_of(tree: &RawRBTree<i32>, link: Link) -> Option<i32> {
        link.map(|node| *tree.key(node))
    }

    /// `2^height <= (n + 1)^2`, i.e. `height <= 2 * log2(n + 1)`.
    fn within_height_bound(height: usize, len: usize) -> bool {
        let len = len as u128;
        height < 128 && (1u128 << height) <= (len + 1) * (len + 1)
    }

    #[test]
    fn empty_tree() {
        let mut tree: RawRBTree<i32> = RawRBTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.search(&1), None);
        assert_eq!(tree.first(), None);
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.check_invariants(), Ok(0));
        assert_eq!(tree.delete(&1), None);
        assert_eq!(tree.pop_first(), None);
        assert_eq!(tree.pop_last(), None);
        assert_eq!(tree.iter().next(), None);
    }

    #[test]
    fn seven_inserts_balance_under_fifty() {
        let tree = tree_from([50, 40, 60, 30, 70, 20, 80]);
        assert_eq!(keys(&tree), [20, 30, 40, 50, 60, 70, 80]);

        let root = tree.root.unwrap();
        assert_eq!(*tree.key(root), 50);
        assert_eq!(tree.nodes[root].color(), Color::Black);
        assert_eq!(key_of(&tree, tree.nodes[root].left()), Some(30));
        assert_eq!(key_of(&tree, tree.nodes[root].right()), Some(70));
        assert_eq!(tree.height(), 3);
        assert_eq!(tree.check_invariants(), Ok(2));
    }

    #[test]
    fn deleting_a_two_child_node_promotes_its_successor() {
        let mut tree = tree_from([50, 40, 60, 30, 70, 20, 80]);
        assert_eq!(tree.delete(&30), Some(30));

        assert_eq!(keys(&tree), [20, 40, 50, 60, 70, 80]);
        assert_eq!(tree.search(&30), None);
        let root = tree.root.unwrap();
        let left = tree.nodes[root].left().unwrap();
        assert_eq!(*tree.key(left), 40);
        assert_eq!(tree.nodes[left].color(), Color::Black);
        assert_eq!(key_of(&tree, tree.nodes[left].left()), Some(20));
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn deleting_the_root_of_a_single_node_tree_empties_it() {
        let mut tree = tree_from([1]);
        assert_eq!(tree.delete(&1), Some(1));
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.check_invariants(), Ok(0));
    }

    #[test]
    fn deleting_a_root_with_one_child() {
        let mut tree = tree_from([1, 2]);
        assert_eq!(tree.delete(&1), Some(1));
        let root = tree.root.unwrap();
        assert_eq!(*tree.key(root), 2);
        assert_eq!(tree.nodes[root].parent(), None);
        assert_eq!(tree.check_invariants(), Ok(1));
    }

    #[test]
    fn deleting_a_deep_successor_relinks_its_right_child() {
        let mut tree = tree_from([10, 5, 20, 15, 30, 17]);
        assert!(tree.check_invariants().is_ok());
        assert_eq!(tree.delete(&10), Some(10));
        assert_eq!(keys(&tree), [5, 15, 17, 20, 30]);
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn black_leaf_deletions_rebalance() {
        let mut tree = tree_from([1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        for key in [1, 3, 2, 9, 10, 5] {
            assert_eq!(tree.delete(&key), Some(key));
            assert!(tree.check_invariants().is_ok(), "after deleting {key}: {:?}", tree.check_invariants());
        }
        assert_eq!(keys(&tree), [4, 6, 7, 8]);
    }

    #[test]
    fn odd_keys_survive_deleting_evens() {
        let mut tree = RawRBTree::new();
        for key in 1..=100 {
            tree.insert(key);
        }
        for key in (2..=100).step_by(2) {
            assert_eq!(tree.delete(&key), Some(key));
        }
        assert!(tree.check_invariants().is_ok());
        assert_eq!(keys(&tree), (1..=99).step_by(2).collect::<Vec<_>>());
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut tree = tree_from([2, 1, 3]);
        assert!(!tree.insert(2));
        assert_eq!(tree.len(), 3);
        assert_eq!(keys(&tree), [1, 2, 3]);
    }

    #[test]
    fn deleting_an_absent_key_twice_changes_nothing() {
        let mut tree = tree_from([4, 2, 6, 1, 3]);
        let before = keys(&tree);
        let root = tree.root;
        assert_eq!(tree.delete(&5), None);
        assert_eq!(tree.delete(&5), None);
        assert_eq!(keys(&tree), before);
        assert_eq!(tree.root, root);
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn rotating_the_root_moves_the_root_link() {
        let mut tree = tree_from([2, 1, 3]);
        let two = tree.root.unwrap();

        tree.rotate(two, Side::Left);
        let three = tree.root.unwrap();
        assert_eq!(*tree.key(three), 3);
        assert_eq!(tree.nodes[three].parent(), None);
        assert_eq!(tree.nodes[three].left(), Some(two));
        assert_eq!(tree.nodes[two].parent(), Some(three));
        assert_eq!(key_of(&tree, tree.nodes[two].left()), Some(1));
        assert_eq!(tree.nodes[two].right(), None);
        assert_eq!(keys(&tree), [1, 2, 3]);

        tree.rotate(three, Side::Right);
        assert_eq!(tree.root, Some(two));
        assert_eq!(tree.nodes[two].right(), Some(three));
        assert_eq!(tree.nodes[three].parent(), Some(two));
        assert_eq!(keys(&tree), [1, 2, 3]);
    }

    #[test]
    fn rotating_an_inner_node_keeps_its_parent_link() {
        let mut tree = tree_from([4, 2, 6, 1, 3, 5, 7]);
        let four = tree.root.unwrap();
        let two = tree.nodes[four].left().unwrap();

        tree.rotate(two, Side::Right);
        let one = tree.nodes[four].left().unwrap();
        assert_eq!(*tree.key(one), 1);
        assert_eq!(tree.nodes[one].parent(), Some(four));
        assert_eq!(tree.nodes[one].right(), Some(two));
        assert_eq!(key_of(&tree, tree.nodes[two].left()), None);
        assert_eq!(key_of(&tree, tree.nodes[two].right()), Some(3));
        assert_eq!(tree.root, Some(four));
        assert_eq!(keys(&tree), [1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn minimum_and_maximum_of_subtrees() {
        let tree = tree_from([50, 40, 60, 30, 70, 20, 80]);
        let root = tree.root.unwrap();
        assert_eq!(*tree.key(tree.minimum(root)), 20);
        assert_eq!(*tree.key(tree.maximum(root)), 80);

        let right = tree.nodes[root].right().unwrap();
        assert_eq!(*tree.key(tree.minimum(right)), 60);
        let leaf = tree.minimum(right);
        assert_eq!(tree.minimum(leaf), leaf);
    }

    #[test]
    fn iteration_meets_in_the_middle() {
        let tree = tree_from([3, 1, 4, 5, 9, 2, 6]);
        let mut iter = tree.iter();
        assert_eq!(iter.len(), 7);
        assert_eq!(iter.next(), Some(&1));
        assert_eq!(iter.next_back(), Some(&9));
        assert_eq!(iter.next_back(), Some(&6));
        assert_eq!(iter.len(), 4);
        assert_eq!(iter.clone().collect::<Vec<_>>(), [&2, &3, &4, &5]);
        assert_eq!(iter.next(), Some(&2));
        assert_eq!(iter.next(), Some(&3));
        assert_eq!(iter.next_back(), Some(&5));
        assert_eq!(iter.next(), Some(&4));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn pops_take_from_both_ends() {
        let mut tree = tree_from([5, 3, 8, 1, 4]);
        assert_eq!(tree.pop_first(), Some(1));
        assert_eq!(tree.pop_last(), Some(8));
        assert!(tree.check_invariants().is_ok());
        assert_eq!(tree.into_sorted_vec(), vec![3, 4, 5]);
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut tree = tree_from([1, 2, 3]);
        tree.delete(&2);
        tree.insert(7);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.capacity(), tree.nodes.capacity());
        assert_eq!(keys(&tree), [1, 3, 7]);
    }

    #[test]
    fn checker_reports_a_red_root() {
        let mut tree = tree_from([1]);
        let root = tree.root.unwrap();
        tree.nodes[root].set_color(Color::Red);
        assert_eq!(tree.check_invariants(), Err(InvariantViolation::RedRoot));
    }

    #[test]
    fn checker_reports_a_red_red_edge() {
        let mut tree = tree_from([2, 1, 3, 4]);
        // 4 hangs red below the black 3; painting 3 red makes two reds in a row.
        let three = tree.search(&3).unwrap();
        tree.nodes[three].set_color(Color::Red);
        assert_eq!(
            tree.check_invariants(),
            Err(InvariantViolation::RedRedEdge {
                depth: 1,
            })
        );
    }

    #[test]
    fn checker_reports_a_black_height_mismatch() {
        let mut tree = tree_from([2, 1, 3]);
        let one = tree.search(&1).unwrap();
        tree.nodes[one].set_color(Color::Black);
        assert_eq!(
            tree.check_invariants(),
            Err(InvariantViolation::BlackHeightMismatch {
                depth: 0,
                left: 1,
                right: 0,
            })
        );
    }

    #[test]
    fn checker_reports_keys_out_of_order() {
        let mut tree = tree_from([2, 1, 3]);
        let one = tree.search(&1).unwrap();
        let three = tree.search(&3).unwrap();
        let root = tree.root.unwrap();
        tree.nodes[root].set_child(Side::Left, Some(three));
        tree.nodes[root].set_child(Side::Right, Some(one));
        assert_eq!(
            tree.check_invariants(),
            Err(InvariantViolation::OutOfOrder {
                position: 0,
            })
        );
    }

    #[test]
    fn checker_reports_a_broken_parent_link() {
        let mut tree = tree_from([2, 1, 3]);
        let three = tree.search(&3).unwrap();
        tree.nodes[three].set_parent(None);
        assert_eq!(
            tree.check_invariants(),
            Err(InvariantViolation::BrokenParentLink {
                depth: 1,
            })
        );
    }

    // Test operations enum for property testing
    #[derive(Clone, Debug)]
    enum Op {
        Insert(i32),
        Delete(i32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0i32..1000).prop_map(Op::Insert),
            2 => (0i32..1000).prop_map(Op::Delete),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn invariants_hold_after_every_operation(ops in prop::collection::vec(op_strategy(), 0..500)) {
            let mut tree = RawRBTree::new();
            let mut model = BTreeSet::new();

            for op in ops {
                match op {
                    Op::Insert(key) => {
                        prop_assert_eq!(tree.insert(key), model.insert(key));
                    }
                    Op::Delete(key) => {
                        prop_assert_eq!(tree.delete(&key), model.take(&key));
                    }
                }
                let checked = tree.check_invariants();
                prop_assert!(checked.is_ok(), "{:?}", checked);
                prop_assert_eq!(tree.len(), model.len());
            }

            prop_assert_eq!(keys(&tree), model.into_iter().collect::<Vec<_>>());
        }

        #[test]
        fn search_finds_exactly_the_stored_keys(
            stored in prop::collection::vec(0i32..400, 0..200),
            probes in prop::collection::vec(0i32..400, 0..100),
        ) {
            let mut tree = RawRBTree::new();
            for &key in &stored {
                tree.insert(key);
            }
            for probe in probes {
                let found = tree.search(&probe).map(|node| *tree.key(node));
                prop_assert_eq!(found, stored.contains(&probe).then_some(probe));
            }
        }

        #[test]
        fn height_stays_logarithmic(keys in prop::collection::vec(any::<i32>(), 1..2000)) {
            let mut tree = RawRBTree::new();
            for key in keys {
                tree.insert(key);
            }
            prop_assert!(within_height_bound(tree.height(), tree.len()), "height {} for {} keys", tree.height(), tree.len());
        }

        #[test]
        fn draining_from_either_end_stays_balanced(count in 1usize..300, from_front in any::<bool>()) {
            let mut tree = RawRBTree::new();
            for key in 0..count {
                tree.insert(key);
            }
            for expected in 0..count {
                let popped = if from_front { tree.pop_first() } else { tree.pop_last() };
                let expected = if from_front { expected } else { count - 1 - expected };
                prop_assert_eq!(popped, Some(expected));
                prop_assert!(tree.check_invariants().is_ok());
            }
            prop_assert!(tree.is_empty());
        }
    }

    #[test]
    fn ascending_inserts_respect_the_height_bound() {
        let mut tree = RawRBTree::new();
        for key in 0..4096 {
            tree.insert(key);
            assert!(within_height_bound(tree.height(), tree.len()));
        }
        assert!(tree.check_invariants().is_ok());
    }
}
