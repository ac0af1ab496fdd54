//! A randomized binary search tree (RBST): an ordered key→value map that
//! stays balanced by chance rather than by rotation-height or color
//! bookkeeping, following the classical construction described in
//! <http://kukuruku.co/hub/cpp/randomized-binary-search-trees>.
//!
//! Instead of storing a random priority per node, the tree re-derives
//! randomized balance at mutation time: an insertion promotes the new node
//! to the root of the subtree it enters with probability `1/(size + 1)`, and
//! a removal rejoins the orphaned children under a root chosen with
//! probability proportional to subtree size. Both decisions draw from an
//! injected random source, and both leave the expected height at `O(log n)`
//! — the treap guarantee without a persisted priority field.
//!
//! Keys are dynamically typed [`Key`] values (numbers, booleans, text,
//! opaque values, and the absent sentinel) under one fixed cross-kind total
//! order; payloads are arbitrary and opaque to the tree. Duplicate keys may
//! coexist as distinct nodes.
//!
//! ```
//! use rbst::{Key, Rbst};
//!
//! let mut tree = Rbst::new();
//! tree.insert("pear", 3);
//! tree.insert("apple", 1);
//! tree.insert(42, 0);
//!
//! assert_eq!(tree.get(&Key::from("apple")), Some(&1));
//!
//! // Inclusive range scan, in ascending key order.
//! let mut keys = Vec::new();
//! tree.for_each_in_range(&Key::from("a"), &Key::from("z"), |node| {
//!     keys.push(node.key().clone());
//! });
//! assert_eq!(keys, vec![Key::from("apple"), Key::from("pear")]);
//! ```
//!
//! The tree is purely in-memory and single-threaded: no operation blocks,
//! suspends, or touches I/O, and callers sharing a tree across threads must
//! provide their own locking.

mod key;
mod tree;

pub use crate::key::Key;
pub use crate::tree::{Node, Rbst};
