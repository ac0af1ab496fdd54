//! A randomized binary search tree over heterogeneous keys.
//!
//! Balance emerges from probability-weighted structural choices instead of
//! tracked height or color metadata:
//!
//! 1. **Insertion** promotes the new node to the root of the subtree it is
//!    entering with probability `1/(size + 1)`, by recursing with a
//!    root-insertion that rotates the old root beneath the newcomer. Every
//!    node therefore ends up at the root of its subtree with the probability
//!    it would have under a uniformly random insertion order, and the
//!    expected height stays `O(log n)` without a stored priority field.
//! 2. **Removal** replaces the deleted node with the join of its children,
//!    picking the side that supplies the new root with probability
//!    proportional to its node count.
//!
//! The subtree size kept on every node doubles as the randomization weight
//! and as the `len` bookkeeping.
//!
//! ## Design decisions
//!
//! - Keys are [`Key`] values, so one tree can mix numbers, booleans, text,
//!   opaque values, and the absent sentinel; the cross-kind order lives
//!   entirely in `Key`'s `Ord`.
//! - Duplicate keys are kept as distinct nodes: insertion never updates an
//!   existing entry, and ties descend right.
//! - `Opaque`-rank keys are never promoted to the root by the insertion
//!   coin-flip. They have no ordering of their own, so the rotation chain a
//!   root-insertion performs is meaningless for them; they always take the
//!   ordinary recursive path. This is a deliberate limitation.
//! - The random source is injected, never a hidden global. `new` seeds a
//!   [`StdRng`] from entropy; tests pass a seeded generator through
//!   [`Rbst::with_rng`] for reproducible shapes.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::key::Key;

type Link<V> = Option<Box<Node<V>>>;

/// A node in the tree: a key, its payload, and the subtree it roots.
pub struct Node<V> {
    key: Key,
    value: V,
    left: Link<V>,
    right: Link<V>,
    size: usize,
}

impl<V> Node<V> {
    fn new(key: Key, value: V) -> Self {
        Node {
            key,
            value,
            left: None,
            right: None,
            size: 1,
        }
    }

    /// The key this node was inserted under.
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// The payload this node carries. Opaque to the tree.
    pub fn value(&self) -> &V {
        &self.value
    }

    // Recomputes this node's size from its children.
    fn fix_size(&mut self) {
        self.size = 1 + size(&self.left) + size(&self.right);
    }
}

// Size of a possibly-empty subtree.
fn size<V>(link: &Link<V>) -> usize {
    link.as_ref().map_or(0, |n| n.size)
}

/// A randomized binary search tree: an ordered key→value container.
///
/// Keys are [`Key`] values; payloads are any `V`. Duplicate keys may
/// coexist as distinct nodes. All operations run in expected `O(log n)`
/// thanks to the randomized balance; none of them suspends, blocks, or
/// performs I/O. The tree is not internally synchronized — callers sharing
/// it across threads must impose their own locking.
pub struct Rbst<V, R = StdRng> {
    root: Link<V>,
    rng: R,
}

impl<V> Rbst<V> {
    /// Creates an empty tree with an entropy-seeded random source.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl<V> Default for Rbst<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, R> Rbst<V, R> {
    /// Creates an empty tree using the given random source.
    ///
    /// The generator drives every balance decision, so a seeded generator
    /// makes tree shapes reproducible. Its statistical quality is what the
    /// expected `O(log n)` height rests on.
    pub fn with_rng(rng: R) -> Self {
        Rbst { root: None, rng }
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        size(&self.root)
    }

    /// Whether the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Removes every node.
    pub fn clear(&mut self) {
        self.root = None;
    }

    /// Finds a node whose key compares equal to `key`, or `None`.
    ///
    /// Descends iteratively from the root and stops at the first match; with
    /// duplicate keys this is the topmost matching node.
    pub fn find(&self, key: &Key) -> Option<&Node<V>> {
        let mut cur = self.root.as_deref();
        while let Some(n) = cur {
            cur = match key.cmp(&n.key) {
                std::cmp::Ordering::Less => n.left.as_deref(),
                std::cmp::Ordering::Greater => n.right.as_deref(),
                std::cmp::Ordering::Equal => return Some(n),
            };
        }
        None
    }

    /// The value of the first node matching `key`, or `None`.
    pub fn get(&self, key: &Key) -> Option<&V> {
        self.find(key).map(Node::value)
    }

    /// Whether any node's key compares equal to `key`.
    pub fn contains(&self, key: &Key) -> bool {
        self.find(key).is_some()
    }

    /// Calls `f` once per node, in ascending key order.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&Node<V>),
    {
        Self::walk(self.root.as_deref(), &mut f);
    }

    fn walk<F>(node: Option<&Node<V>>, f: &mut F)
    where
        F: FnMut(&Node<V>),
    {
        if let Some(n) = node {
            Self::walk(n.left.as_deref(), f);
            f(n);
            Self::walk(n.right.as_deref(), f);
        }
    }

    /// Calls `f` once per node whose key lies in the inclusive range
    /// `[lo, hi]`, in ascending key order.
    ///
    /// The walk is iterative: an explicit stack emulates an in-order cursor
    /// seeded at the first node with key ≥ `lo`, and a sentinel — the last
    /// in-order node with key ≤ `hi` — marks where the walk ends. The full
    /// in-order sequence is never materialized, and the tree is not touched
    /// by the traversal itself; `f` visits `k` matches in amortized
    /// `O(log n + k)`. An inverted range (`lo > hi`) visits nothing.
    pub fn for_each_in_range<F>(&self, lo: &Key, hi: &Key, mut f: F)
    where
        F: FnMut(&Node<V>),
    {
        let Some(root) = self.root.as_deref() else {
            return;
        };
        // Stack the descent path toward the first node with key >= lo.
        // Entries below the bound are filtered out when popped.
        let mut stack = Vec::new();
        let mut cur = Some(root);
        while let Some(n) = cur {
            stack.push(n);
            cur = if n.key < *lo {
                n.right.as_deref()
            } else {
                n.left.as_deref()
            };
        }
        let seeded: Vec<*const Node<V>> =
            stack.iter().map(|n| *n as *const Node<V>).collect();
        // Locate the sentinel: the last in-order node with key <= hi.
        let mut sentinel = root as *const Node<V>;
        let mut cur = Some(root);
        while let Some(n) = cur {
            sentinel = n as *const Node<V>;
            cur = if n.key > *hi {
                n.left.as_deref()
            } else {
                n.right.as_deref()
            };
        }
        while let Some(n) = stack.pop() {
            if n.key >= *lo && n.key <= *hi {
                f(n);
            }
            if std::ptr::eq(n, sentinel) {
                return;
            }
            // Continue the in-order walk into the right child, unless the
            // seed descent already stacked it.
            if let Some(right) = n.right.as_deref() {
                if !seeded.iter().any(|&p| std::ptr::eq(p, right)) {
                    let mut cur = Some(right);
                    while let Some(c) = cur {
                        stack.push(c);
                        cur = c.left.as_deref();
                    }
                }
            }
        }
    }

    /// Longest root-to-leaf path; 0 for an empty tree.
    pub fn height(&self) -> usize {
        Self::height_of(self.root.as_deref())
    }

    fn height_of(node: Option<&Node<V>>) -> usize {
        match node {
            None => 0,
            Some(n) => {
                1 + Self::height_of(n.left.as_deref()).max(Self::height_of(n.right.as_deref()))
            }
        }
    }

    /// Depth-indented in-order listing of the tree, for diagnostics.
    pub fn dump(&self) -> String
    where
        V: fmt::Debug,
    {
        let mut out = String::new();
        Self::dump_node(self.root.as_deref(), 0, &mut out);
        out
    }

    fn dump_node(node: Option<&Node<V>>, depth: usize, out: &mut String)
    where
        V: fmt::Debug,
    {
        use std::fmt::Write as _;
        if let Some(n) = node {
            Self::dump_node(n.left.as_deref(), depth + 1, out);
            let _ = writeln!(out, "{:width$}{} => {:?}", "", n.key, n.value, width = depth * 2);
            Self::dump_node(n.right.as_deref(), depth + 1, out);
        }
    }
}

impl<V, R: Rng> Rbst<V, R> {
    /// Inserts a new node for `key` and `value`.
    ///
    /// Always adds a node: an existing entry with an equal key is kept, and
    /// the newcomer lands to its right in traversal order. With probability
    /// `1/(len + 1)` the new node becomes the root.
    pub fn insert(&mut self, key: impl Into<Key>, value: V) {
        let root = self.root.take();
        self.root = Some(Self::insert_node(root, key.into(), value, &mut self.rng));
    }

    /// Removes the first node (in top-down order) whose key compares equal
    /// to `key`. Returns whether a node was removed; removing a key that is
    /// not present is a no-op.
    pub fn remove(&mut self, key: &Key) -> bool {
        let (root, removed) = Self::remove_node(self.root.take(), key, &mut self.rng);
        self.root = root;
        removed
    }

    fn insert_node(node: Link<V>, key: Key, value: V, rng: &mut R) -> Box<Node<V>> {
        match node {
            None => Box::new(Node::new(key, value)),
            Some(mut n) => {
                // The newcomer takes this subtree's root with probability
                // 1/(size + 1). Opaque-rank keys never do.
                if key.is_ordered() && rng.gen_range(0..=n.size) == 0 {
                    return Self::insert_root(Some(n), key, value);
                }
                if key < n.key {
                    n.left = Some(Self::insert_node(n.left.take(), key, value, rng));
                } else {
                    n.right = Some(Self::insert_node(n.right.take(), key, value, rng));
                }
                n.fix_size();
                n
            }
        }
    }

    // Plants the new node as the root of this subtree: recurse into the
    // matching child, then rotate the old root beneath the newcomer.
    fn insert_root(node: Link<V>, key: Key, value: V) -> Box<Node<V>> {
        match node {
            None => Box::new(Node::new(key, value)),
            Some(mut n) => {
                if key < n.key {
                    n.left = Some(Self::insert_root(n.left.take(), key, value));
                    Self::rotate_right(n)
                } else {
                    n.right = Some(Self::insert_root(n.right.take(), key, value));
                    Self::rotate_left(n)
                }
            }
        }
    }

    /// Joins two subtrees into one.
    ///
    /// Every key in `left` must compare less than or equal to every key in
    /// `right`; that is the caller's responsibility and is not re-validated
    /// here. The side that supplies the new root is chosen with probability
    /// proportional to its size, which keeps the expected height of the
    /// result logarithmic.
    fn join(left: Link<V>, right: Link<V>, rng: &mut R) -> Link<V> {
        match (left, right) {
            (None, right) => right,
            (left, None) => left,
            (Some(mut l), Some(mut r)) => {
                let total = l.size + r.size;
                if rng.gen_range(0..total) < l.size {
                    l.right = Self::join(l.right.take(), Some(r), rng);
                    l.fix_size();
                    Some(l)
                } else {
                    r.left = Self::join(Some(l), r.left.take(), rng);
                    r.fix_size();
                    Some(r)
                }
            }
        }
    }

    fn remove_node(node: Link<V>, key: &Key, rng: &mut R) -> (Link<V>, bool) {
        match node {
            None => (None, false),
            Some(mut n) => match key.cmp(&n.key) {
                std::cmp::Ordering::Less => {
                    let (left, removed) = Self::remove_node(n.left.take(), key, rng);
                    n.left = left;
                    n.fix_size();
                    (Some(n), removed)
                }
                std::cmp::Ordering::Greater => {
                    let (right, removed) = Self::remove_node(n.right.take(), key, rng);
                    n.right = right;
                    n.fix_size();
                    (Some(n), removed)
                }
                std::cmp::Ordering::Equal => {
                    // Detach the node; its children are joined in its place.
                    (Self::join(n.left.take(), n.right.take(), rng), true)
                }
            },
        }
    }

    // Rotate left: the right child becomes the subtree root. Sizes are
    // recomputed demoted node first. The right child must exist.
    fn rotate_left(mut node: Box<Node<V>>) -> Box<Node<V>> {
        let mut root = node.right.take().unwrap();
        node.right = root.left.take();
        node.fix_size();
        root.left = Some(node);
        root.fix_size();
        root
    }

    // Rotate right: mirror of rotate_left. The left child must exist.
    fn rotate_right(mut node: Box<Node<V>>) -> Box<Node<V>> {
        let mut root = node.left.take().unwrap();
        node.left = root.right.take();
        node.fix_size();
        root.right = Some(node);
        root.fix_size();
        root
    }
}

impl<V, R> fmt::Debug for Rbst<V, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rbst")
            .field("len", &self.len())
            .field("height", &self.height())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded<V>(seed: u64) -> Rbst<V, StdRng> {
        Rbst::with_rng(StdRng::seed_from_u64(seed))
    }

    impl<V> Node<V> {
        // Checks BST order and size bookkeeping for the whole subtree and
        // returns its node count. `lo` is the nearest ancestor we turned
        // right at (keys here must be >= it), `hi` the nearest we turned
        // left at (keys here must be strictly below it).
        fn check(&self, lo: Option<&Key>, hi: Option<&Key>) -> usize {
            if let Some(lo) = lo {
                assert!(self.key >= *lo, "key below its subtree's lower bound");
            }
            if let Some(hi) = hi {
                assert!(self.key < *hi, "key at or above its subtree's upper bound");
            }
            let left = self
                .left
                .as_deref()
                .map_or(0, |n| n.check(lo, Some(&self.key)));
            let right = self
                .right
                .as_deref()
                .map_or(0, |n| n.check(Some(&self.key), hi));
            assert_eq!(self.size, 1 + left + right, "stale subtree size");
            self.size
        }
    }

    impl<V, R> Rbst<V, R> {
        fn check_invariants(&self) {
            if let Some(root) = self.root.as_deref() {
                root.check(None, None);
            }
        }
    }

    #[test]
    fn test_insert_and_find() {
        let mut tree = seeded(42);
        tree.insert(5, "five");
        tree.insert(3, "three");
        tree.insert(7, "seven");

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.get(&Key::from(3)), Some(&"three"));
        assert_eq!(tree.get(&Key::from(7)), Some(&"seven"));
        assert!(tree.contains(&Key::from(5)));
        assert!(tree.find(&Key::from(1)).is_none());
        tree.check_invariants();
    }

    #[test]
    fn test_duplicate_keys_coexist() {
        let mut tree = seeded(1);
        tree.insert("a", 1);
        tree.insert("a", 2);
        tree.insert("a", 3);
        assert_eq!(tree.len(), 3);
        tree.check_invariants();

        let mut values = Vec::new();
        tree.for_each(|n| values.push(*n.value()));
        values.sort_unstable();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_remove() {
        let mut tree = seeded(42);
        tree.insert(5, ());
        tree.insert(3, ());
        tree.insert(7, ());

        assert!(tree.remove(&Key::from(3)));
        assert!(!tree.contains(&Key::from(3)));
        assert_eq!(tree.len(), 2);
        assert!(!tree.remove(&Key::from(3))); // already removed
        tree.check_invariants();
    }

    #[test]
    fn test_remove_takes_one_duplicate_per_call() {
        let mut tree = seeded(7);
        tree.insert("dup", 1);
        tree.insert("dup", 2);
        tree.insert("other", 0);

        assert!(tree.remove(&Key::from("dup")));
        assert_eq!(tree.len(), 2);
        assert!(tree.contains(&Key::from("dup")));
        assert!(tree.contains(&Key::from("other")));

        assert!(tree.remove(&Key::from("dup")));
        assert!(!tree.contains(&Key::from("dup")));
        tree.check_invariants();
    }

    #[test]
    fn test_noop_removal_leaves_tree_unchanged() {
        let mut tree = seeded(3);
        for i in 0..50 {
            tree.insert(i, i * 10);
        }
        let mut before = Vec::new();
        tree.for_each(|n| before.push((n.key().clone(), *n.value())));

        assert!(!tree.remove(&Key::from(999)));
        assert!(!tree.remove(&Key::Absent));

        let mut after = Vec::new();
        tree.for_each(|n| after.push((n.key().clone(), *n.value())));
        assert_eq!(before, after);
        tree.check_invariants();
    }

    #[test]
    fn test_invariants_after_random_ops() {
        let mut driver = StdRng::seed_from_u64(99);
        let mut tree: Rbst<u32, StdRng> = seeded(100);
        for step in 0..500u32 {
            let k = driver.gen_range(0..40);
            if driver.gen_bool(0.6) {
                tree.insert(k, step);
            } else {
                tree.remove(&Key::from(k));
            }
            tree.check_invariants();
        }
    }

    #[test]
    fn test_invariants_with_mixed_key_kinds() {
        let mut tree = seeded(8);
        let keys = [
            Key::from(1),
            Key::from(-2.5),
            Key::from(true),
            Key::from(false),
            Key::from("m"),
            Key::from("a"),
            Key::Opaque,
            Key::Opaque,
            Key::Absent,
        ];
        for (i, key) in keys.iter().enumerate() {
            tree.insert(key.clone(), i);
            tree.check_invariants();
        }
        assert_eq!(tree.len(), keys.len());

        assert!(tree.contains(&Key::Opaque));
        assert!(tree.remove(&Key::Opaque));
        tree.check_invariants();
        assert_eq!(tree.len(), keys.len() - 1);
    }

    fn range_oracle(tree: &Rbst<u32, StdRng>, lo: &Key, hi: &Key) -> Vec<(Key, u32)> {
        let mut out = Vec::new();
        tree.for_each(|n| {
            if n.key() >= lo && n.key() <= hi {
                out.push((n.key().clone(), *n.value()));
            }
        });
        out
    }

    #[test]
    fn test_range_matches_in_order_scan() {
        let mut driver = StdRng::seed_from_u64(4);
        let mut tree: Rbst<u32, StdRng> = seeded(5);
        for step in 0..300u32 {
            tree.insert(driver.gen_range(0..50), step);
        }
        let bounds = [-1.0, 0.0, 7.0, 24.5, 25.0, 49.0, 50.0, 100.0];
        for &lo in &bounds {
            for &hi in &bounds {
                let lo = Key::from(lo);
                let hi = Key::from(hi);
                let mut got = Vec::new();
                tree.for_each_in_range(&lo, &hi, |n| got.push((n.key().clone(), *n.value())));
                assert_eq!(got, range_oracle(&tree, &lo, &hi), "range [{lo}, {hi}]");
            }
        }
    }

    #[test]
    fn test_full_range_spans_every_kind() {
        let mut tree = seeded(6);
        for key in [Key::from(3), Key::from("a"), Key::from(true), Key::Absent] {
            tree.insert(key, ());
        }
        let mut got = Vec::new();
        tree.for_each_in_range(&Key::from(f64::NEG_INFINITY), &Key::Absent, |n| {
            got.push(n.key().clone())
        });
        assert_eq!(
            got,
            vec![Key::from(3), Key::from(true), Key::from("a"), Key::Absent]
        );
    }

    #[test]
    fn test_range_on_empty_tree() {
        let tree: Rbst<(), StdRng> = seeded(0);
        let mut visited = 0;
        tree.for_each_in_range(&Key::from(0), &Key::Absent, |_| visited += 1);
        assert_eq!(visited, 0);
    }

    #[test]
    fn test_range_visits_duplicates_once_each() {
        let mut tree = seeded(11);
        for v in 0..5u32 {
            tree.insert(2, v);
        }
        tree.insert(1, 100);
        tree.insert(3, 200);

        let mut got = Vec::new();
        tree.for_each_in_range(&Key::from(2), &Key::from(2), |n| got.push(*n.value()));
        got.sort_unstable();
        assert_eq!(got, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_sequential_insertion_stays_balanced() {
        // Ascending insertion degenerates a plain BST to a list; here the
        // randomized root promotion keeps the height logarithmic. The bound
        // is the generous 4·log2(n) statistical one, checked on the average
        // over several seeds.
        let n = 1000usize;
        let bound = 4.0 * (n as f64).log2();
        let mut total = 0usize;
        for seed in 0..8 {
            let mut tree = seeded(seed);
            for i in 0..n {
                tree.insert(i as f64, ());
            }
            total += tree.height();
        }
        let average = total as f64 / 8.0;
        assert!(average <= bound, "average height {average} exceeds {bound}");
    }

    #[test]
    fn test_height() {
        let mut tree = seeded(2);
        assert_eq!(tree.height(), 0);
        tree.insert(1, ());
        assert_eq!(tree.height(), 1);
        tree.insert(2, ());
        assert_eq!(tree.height(), 2);
    }

    #[test]
    fn test_clear() {
        let mut tree = seeded(33);
        tree.insert(1, ());
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert!(!tree.contains(&Key::from(1)));
    }

    #[test]
    fn test_dump_lists_nodes_in_order() {
        let mut tree = seeded(13);
        tree.insert(2, "b");
        tree.insert(1, "a");
        tree.insert(3, "c");

        let dump = tree.dump();
        assert_eq!(dump.lines().count(), 3);
        let positions: Vec<usize> = ["1 =>", "2 =>", "3 =>"]
            .iter()
            .map(|needle| dump.find(needle).unwrap())
            .collect();
        assert!(positions[0] < positions[1] && positions[1] < positions[2]);
    }

    #[test]
    fn test_debug_summary() {
        let mut tree = seeded(21);
        tree.insert(1, ());
        let summary = format!("{tree:?}");
        assert!(summary.contains("len: 1"));
    }
}
