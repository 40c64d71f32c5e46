use super::RBTreeSet;
use crate::raw::RawRBTree;

impl<T> RBTreeSet<T> {
    /// Creates an empty set with room for at least `capacity` elements before the node arena
    /// reallocates.
    ///
    /// This is an extension and is not part of the standard `BTreeSet` API.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_tree::RBTreeSet;
    ///
    /// let set: RBTreeSet<i32> = RBTreeSet::with_capacity(16);
    /// assert!(set.is_empty());
    /// assert!(set.capacity() >= 16);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(capacity) for memory allocation.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        RBTreeSet {
            tree: RawRBTree::with_capacity(capacity),
        }
    }

    /// Returns the number of elements the set can hold without reallocating its node arena.
    ///
    /// Slots freed by removals are reused before the arena grows, so the capacity never
    /// shrinks on its own.
    ///
    /// This is an extension and is not part of the standard `BTreeSet` API.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_tree::RBTreeSet;
    ///
    /// let mut set = RBTreeSet::with_capacity(4);
    /// let before = set.capacity();
    /// for n in 0..4 {
    ///     set.insert(n);
    /// }
    /// set.remove(&0);
    /// set.insert(9);
    /// assert_eq!(set.capacity(), before);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.tree.capacity()
    }
}
