use thiserror::Error;

/// A broken red-black tree invariant, as reported by
/// [`RBTreeSet::check_invariants`](crate::RBTreeSet::check_invariants).
///
/// A correct set never produces one of these. Seeing one means the key type's [`Ord`]
/// implementation is not a total order, or a key's ordering changed while it was stored.
///
/// Depths count edges from the root, so the root is at depth 0.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("root is red")]
    RedRoot,

    #[error("root has a parent link")]
    RootHasParent,

    #[error("node at depth {depth} does not link back to its parent")]
    BrokenParentLink { depth: usize },

    #[error("red node at depth {depth} has a red child")]
    RedRedEdge { depth: usize },

    #[error("node at depth {depth} has black-height {left} on the left and {right} on the right")]
    BlackHeightMismatch { depth: usize, left: usize, right: usize },

    #[error("keys at in-order positions {position} and {} are not strictly increasing", .position + 1)]
    OutOfOrder { position: usize },

    #[error("reached {reachable} nodes from the root but {stored} are stored")]
    LengthMismatch { reachable: usize, stored: usize },
}
