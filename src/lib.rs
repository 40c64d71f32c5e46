//! An arena-backed red-black tree set for Rust.
//!
//! This crate provides [`RBTreeSet`], an ordered set with the familiar `BTreeSet` API, built on
//! a classic red-black tree:
//!
//! - [`insert`](RBTreeSet::insert), [`remove`](RBTreeSet::remove) and
//!   [`get`](RBTreeSet::get) in O(log n)
//! - [`first`](RBTreeSet::first) / [`last`](RBTreeSet::last) for the minimum and maximum
//! - [`iter`](RBTreeSet::iter) for a lazy, restartable, ascending traversal
//! - [`check_invariants`](RBTreeSet::check_invariants) to verify the red-black rules and read
//!   back the tree's black-height
//!
//! # Example
//!
//! ```
//! use rb_tree::RBTreeSet;
//!
//! let mut set: RBTreeSet<u32> = (1..=100).collect();
//! for even in (2..=100).step_by(2) {
//!     set.remove(&even);
//! }
//!
//! assert_eq!(set.len(), 50);
//! assert!(set.iter().copied().eq((1..=99).step_by(2)));
//! assert!(set.check_invariants().is_ok());
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **No unsafe code** - Nodes live in an arena and link to each other through handles
//! - **Logarithmic height** - At most `2 * log2(n + 1)` under any sequence of inserts and removals
//!
//! # Implementation
//!
//! Each node stores its key, a color, and `left`/`right`/`parent` handles into the arena. Empty
//! child slots count as black leaves. Insertion attaches a red leaf and repairs red-red
//! conflicts by recoloring and at most two rotations; removal splices out a node with at most
//! one child (the in-order successor when the target has two) and resolves any lost black
//! unit by walking up from the vacated slot. Rebalancing steps are reported through the
//! [`log`] facade at `trace` level.

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

mod error;
mod raw;

pub mod rb_tree_set;

pub use error::InvariantViolation;
pub use rb_tree_set::RBTreeSet;
