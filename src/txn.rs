// Copyright 2026 Radixtx Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Transactions
//!
//! A [`Txn`] accumulates writes against a base root. The first write along
//! a path clones each node it passes through; the clones carry the
//! transaction's id, so later writes in the same transaction recognize them
//! and mutate in place. Nothing is visible to the tree handle until
//! [`commit`](Txn::commit), which publishes the new `(root, size)` state in
//! one atomic swap and then fires the watch signals of everything the
//! transaction replaced (when mutation tracking is on).

use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::node::{longest_common_prefix, Edge, Leaf, Node};
use crate::tree::Tree;
use crate::watch::Watch;

/// Tracked watch channels past this count switch the transaction to coarse
/// notification: commit walks old and new trees instead of keeping the set.
const NOTIFY_TRACK_LIMIT: usize = 8192;

/// Transaction ids are handed out once and never reused, so a node tagged
/// with an id is private to exactly one transaction, ever.
static NEXT_TXN_ID: AtomicU64 = AtomicU64::new(1);

fn next_txn_id() -> u64 {
    NEXT_TXN_ID.fetch_add(1, AtomicOrdering::Relaxed)
}

/// A mutable builder over one version of a [`Tree`].
///
/// Transactions are single-threaded; independent transactions on the same
/// tree may run concurrently and serialize at commit.
pub struct Txn<'t, T> {
    tree: &'t Tree<T>,
    /// Root this transaction was opened on.
    snap: Arc<Node<T>>,
    /// Working root, including uncommitted writes.
    root: Arc<Node<T>>,
    size: usize,
    /// Clones made by this transaction carry this id; see `write_node`.
    id: u64,
    track_mutate: bool,
    track_channels: FxHashSet<Watch>,
    track_overflow: bool,
}

impl<'t, T> Txn<'t, T> {
    pub(crate) fn new(tree: &'t Tree<T>) -> Self {
        let state = tree.current();
        Txn {
            tree,
            snap: Arc::clone(&state.root),
            root: Arc::clone(&state.root),
            size: state.size,
            id: next_txn_id(),
            track_mutate: false,
            track_channels: FxHashSet::default(),
            track_overflow: false,
        }
    }

    /// Enables or disables mutation tracking. With tracking on, commit
    /// closes the watch signal of every node and leaf this transaction
    /// replaces or removes.
    pub fn track_mutate(&mut self, enabled: bool) {
        self.track_mutate = enabled;
    }

    /// The transaction's working root, including uncommitted writes.
    pub fn root(&self) -> Arc<Node<T>> {
        Arc::clone(&self.root)
    }

    /// Looks up `k` in the working tree.
    pub fn get(&self, k: &[u8]) -> Option<&T> {
        self.root.get(k)
    }

    /// Looks up `k` in the working tree, returning the deepest watch
    /// observed on the descent.
    pub fn get_watch(&self, k: &[u8]) -> (Watch, Option<&T>) {
        self.root.get_watch(k)
    }

    /// Forks a transaction carrying the current uncommitted state.
    ///
    /// After the fork the two transactions are fully independent. Both lose
    /// in-place write access to nodes cloned so far (either could be
    /// holding them), so their next writes re-clone the touched paths.
    pub fn fork(&mut self) -> Txn<'t, T> {
        self.id = next_txn_id();
        Txn {
            tree: self.tree,
            snap: Arc::clone(&self.snap),
            root: Arc::clone(&self.root),
            size: self.size,
            id: next_txn_id(),
            track_mutate: false,
            track_channels: FxHashSet::default(),
            track_overflow: false,
        }
    }

    fn track_channel(&mut self, watch: Watch) {
        if self.track_overflow {
            return;
        }
        if self.track_channels.len() >= NOTIFY_TRACK_LIMIT {
            self.track_overflow = true;
            self.track_channels.clear();
            return;
        }
        self.track_channels.insert(watch);
    }

    /// Makes the node in `slot` privately writable.
    ///
    /// A node already tagged with this transaction's id is left alone;
    /// anything else is shallow-cloned (leaf and children stay shared), the
    /// clone gets a fresh watch slot, and the displaced node's watch is
    /// tracked for closing. `for_leaf_update` additionally tracks the
    /// leaf's own watch, for writes that replace or remove it.
    fn write_node(&mut self, slot: &mut Arc<Node<T>>, for_leaf_update: bool) {
        if slot.owner == self.id {
            if self.track_mutate && for_leaf_update {
                if let Some(leaf) = &slot.leaf {
                    let watch = leaf.watch().clone();
                    self.track_channel(watch);
                }
            }
            return;
        }

        if self.track_mutate {
            let watch = slot.watch().clone();
            self.track_channel(watch);
            if for_leaf_update {
                if let Some(leaf) = &slot.leaf {
                    let watch = leaf.watch().clone();
                    self.track_channel(watch);
                }
            }
        }

        let mut copy = Node::clone(slot);
        copy.owner = self.id;
        *slot = Arc::new(copy);
    }

    /// Takes the working root out of the transaction so the recursion can
    /// borrow it mutably alongside `self`. The snapshot stands in and is
    /// never observed while a write is in flight.
    fn detach_root(&mut self) -> Arc<Node<T>> {
        std::mem::replace(&mut self.root, Arc::clone(&self.snap))
    }

    /// Inserts `k = v`, returning the previous value if the key existed.
    pub fn insert(&mut self, k: &[u8], v: T) -> Option<T>
    where
        T: Clone,
    {
        let mut root = self.detach_root();
        let old = self.insert_rec(&mut root, k, k, v);
        self.root = root;
        if old.is_none() {
            self.size += 1;
        }
        old
    }

    fn insert_rec(&mut self, slot: &mut Arc<Node<T>>, k: &[u8], search: &[u8], v: T) -> Option<T>
    where
        T: Clone,
    {
        // Key exhausted: the leaf belongs on this node.
        if search.is_empty() {
            let old = slot.leaf.as_ref().map(|l| l.val.clone());
            self.write_node(slot, true);
            let n = Arc::make_mut(slot);
            n.leaf = Some(Arc::new(Leaf::new(k, v)));
            return old;
        }

        let label = search[0];
        let (idx, common, child_prefix_len) = match slot.get_edge(label) {
            Some((idx, child)) => (
                idx,
                longest_common_prefix(search, &child.prefix),
                child.prefix.len(),
            ),
            None => {
                // No edge to follow: hang a new leaf node off this one.
                self.write_node(slot, false);
                let mut leaf_node = Node::new(self.id, search.into());
                leaf_node.leaf = Some(Arc::new(Leaf::new(k, v)));
                let n = Arc::make_mut(slot);
                n.add_edge(Edge {
                    label,
                    node: Arc::new(leaf_node),
                });
                return None;
            }
        };

        if common == child_prefix_len {
            // The child's whole prefix matches: descend.
            self.write_node(slot, false);
            let n = Arc::make_mut(slot);
            return self.insert_rec(&mut n.edges[idx].node, k, &search[common..], v);
        }

        // The search key diverges inside the child's prefix: split the edge
        // with an intermediate node holding the common part.
        self.write_node(slot, false);

        let mut child_arc = Arc::clone(&slot.edges[idx].node);
        self.write_node(&mut child_arc, false);
        {
            let child = Arc::make_mut(&mut child_arc);
            child.prefix = child.prefix[common..].into();
        }

        let mut split = Node::new(self.id, search[..common].into());
        split.add_edge(Edge {
            label: child_arc.prefix[0],
            node: child_arc,
        });

        let rest = &search[common..];
        if rest.is_empty() {
            // The new key ends at the split point.
            split.leaf = Some(Arc::new(Leaf::new(k, v)));
        } else {
            let mut leaf_node = Node::new(self.id, rest.into());
            leaf_node.leaf = Some(Arc::new(Leaf::new(k, v)));
            split.add_edge(Edge {
                label: rest[0],
                node: Arc::new(leaf_node),
            });
        }

        let n = Arc::make_mut(slot);
        n.replace_edge(label, Arc::new(split));
        None
    }

    /// Applies aligned key/value slices in order within this transaction.
    /// No intermediate state is observable through the tree handle.
    pub fn bulk_insert<K: AsRef<[u8]>>(&mut self, keys: &[K], values: Vec<T>) -> Result<()>
    where
        T: Clone,
    {
        if keys.len() != values.len() {
            return Err(Error::BulkLengthMismatch {
                keys: keys.len(),
                values: values.len(),
            });
        }
        for (k, v) in keys.iter().zip(values) {
            self.insert(k.as_ref(), v);
        }
        Ok(())
    }

    /// Deletes `k`, returning the removed value. Absent keys change
    /// nothing: no clone, no size change, no notification.
    pub fn delete(&mut self, k: &[u8]) -> Option<T>
    where
        T: Clone,
    {
        self.root.get(k)?;
        let mut root = self.detach_root();
        let leaf = self.delete_rec(&mut root, true, k);
        self.root = root;
        let leaf = leaf?;
        self.size -= 1;
        Some(leaf.val.clone())
    }

    fn delete_rec(
        &mut self,
        slot: &mut Arc<Node<T>>,
        is_root: bool,
        search: &[u8],
    ) -> Option<Arc<Leaf<T>>> {
        if search.is_empty() {
            if !slot.is_leaf() {
                return None;
            }
            self.write_node(slot, true);
            let n = Arc::make_mut(slot);
            let old = n.leaf.take();
            // Path compression: a non-root node left with one child and no
            // leaf absorbs the child.
            if !is_root && n.edges.len() == 1 {
                self.merge_child(n);
            }
            return old;
        }

        let label = search[0];
        let (idx, child_prefix_len) = match slot.get_edge(label) {
            Some((idx, child)) if search.starts_with(&child.prefix) => (idx, child.prefix.len()),
            _ => return None,
        };

        self.write_node(slot, false);
        let n = Arc::make_mut(slot);
        let leaf = self.delete_rec(&mut n.edges[idx].node, false, &search[child_prefix_len..])?;

        let child = &n.edges[idx].node;
        if child.leaf.is_none() && child.edges.is_empty() {
            n.del_edge(label);
            if !is_root && n.edges.len() == 1 && !n.is_leaf() {
                self.merge_child(n);
            }
        }
        Some(leaf)
    }

    /// Deletes every key at or under `prefix`. Returns whether the descent
    /// reached the prefix (and therefore the tree changed).
    pub fn delete_prefix(&mut self, prefix: &[u8]) -> bool {
        // Verify the prefix is reachable before cloning anything.
        if !Self::prefix_reachable(&self.root, prefix) {
            return false;
        }
        let mut root = self.detach_root();
        let removed = self.delete_prefix_rec(&mut root, true, prefix);
        self.root = root;
        match removed {
            Some(count) => {
                self.size -= count;
                true
            }
            None => false,
        }
    }

    fn prefix_reachable(root: &Node<T>, prefix: &[u8]) -> bool {
        let mut n = root;
        let mut search = prefix;
        loop {
            if search.is_empty() {
                return true;
            }
            let Some((_, child)) = n.get_edge(search[0]) else {
                return false;
            };
            if search.starts_with(&child.prefix) {
                search = &search[child.prefix.len()..];
                n = child.as_ref();
            } else if child.prefix.starts_with(search) {
                // The prefix ends inside the child's compressed path; the
                // whole child subtree is under it.
                return true;
            } else {
                return false;
            }
        }
    }

    fn delete_prefix_rec(
        &mut self,
        slot: &mut Arc<Node<T>>,
        is_root: bool,
        search: &[u8],
    ) -> Option<usize> {
        if search.is_empty() {
            // This node roots the doomed subtree. Count and track it from
            // the original version, then gut the writable copy; the parent
            // frame splices out the empty shell.
            let doomed = Arc::clone(slot);
            self.write_node(slot, true);
            let n = Arc::make_mut(slot);
            n.leaf = None;
            n.edges.clear();
            return Some(self.track_subtree(&doomed));
        }

        let label = search[0];
        let (idx, advance) = match slot.get_edge(label) {
            Some((idx, child)) if search.starts_with(&child.prefix) => (idx, child.prefix.len()),
            Some((idx, child)) if child.prefix.starts_with(search) => (idx, search.len()),
            _ => return None,
        };

        self.write_node(slot, false);
        let n = Arc::make_mut(slot);
        let removed = self.delete_prefix_rec(&mut n.edges[idx].node, false, &search[advance..])?;

        let child = &n.edges[idx].node;
        if child.leaf.is_none() && child.edges.is_empty() {
            n.del_edge(label);
            if !is_root && n.edges.len() == 1 && !n.is_leaf() {
                self.merge_child(n);
            }
        }
        Some(removed)
    }

    /// Counts the leaves of `n`'s subtree and tracks every watch in it.
    fn track_subtree(&mut self, n: &Arc<Node<T>>) -> usize {
        let mut leaves = 0;
        if self.track_mutate {
            let watch = n.watch().clone();
            self.track_channel(watch);
        }
        if let Some(leaf) = &n.leaf {
            leaves += 1;
            if self.track_mutate {
                let watch = leaf.watch().clone();
                self.track_channel(watch);
            }
        }
        for e in &n.edges {
            leaves += self.track_subtree(&e.node);
        }
        leaves
    }

    /// Absorbs `n`'s single child: concatenated prefix, the child's leaf
    /// and edges. The caller guarantees `n` has exactly one edge.
    fn merge_child(&mut self, n: &mut Node<T>) {
        let child = Arc::clone(&n.edges[0].node);
        if self.track_mutate {
            let watch = child.watch().clone();
            self.track_channel(watch);
        }

        let mut prefix = Vec::with_capacity(n.prefix.len() + child.prefix.len());
        prefix.extend_from_slice(&n.prefix);
        prefix.extend_from_slice(&child.prefix);
        n.prefix = prefix.into_boxed_slice();
        n.leaf = child.leaf.clone();
        n.edges = child.edges.clone();
    }

    /// Publishes the working state and fires tracked watch signals.
    /// Returns the committed root.
    pub fn commit(&mut self) -> Arc<Node<T>> {
        let root = self.commit_only();
        if self.track_mutate {
            self.notify();
        }
        root
    }

    /// Publishes the working state without notifying. [`notify`](Txn::notify)
    /// can still be called afterwards.
    pub fn commit_only(&mut self) -> Arc<Node<T>> {
        self.tree.publish(Arc::clone(&self.root), self.size);
        // Published nodes are shared property now; further writes in this
        // transaction must clone them again.
        self.id = next_txn_id();
        Arc::clone(&self.root)
    }

    /// Closes the watch signals of everything this transaction replaced.
    ///
    /// Fires after publication, so an observer woken by a signal reloads
    /// the tree handle into the post-commit state. On tracking overflow the
    /// tracked set is gone; the old and new trees are walked in lockstep
    /// instead and every stale watch found is closed.
    pub fn notify(&mut self) {
        if !self.track_mutate {
            return;
        }
        if self.track_overflow {
            self.slow_notify();
        } else {
            for watch in self.track_channels.drain() {
                watch.close();
            }
        }
        self.track_channels = FxHashSet::default();
        self.track_overflow = false;
    }

    /// Pre-order lockstep walk of the base snapshot against the new root,
    /// comparing accumulated paths. Snapshot nodes with no identical
    /// counterpart in the new tree are stale; their watches close.
    fn slow_notify(&mut self) {
        let snap = Arc::clone(&self.snap);
        let root = Arc::clone(&self.root);
        let mut snap_iter = snap.raw_iter();
        let mut root_iter = root.raw_iter();

        while let Some(snap_elem) = snap_iter.front() {
            let Some(root_elem) = root_iter.front() else {
                // The new tree is exhausted; everything left is stale.
                close_stale(snap_elem);
                snap_iter.next();
                continue;
            };

            match snap_iter.path().cmp(root_iter.path()) {
                Ordering::Less => {
                    // Present in the snapshot only: deleted.
                    close_stale(snap_elem);
                    snap_iter.next();
                }
                Ordering::Greater => {
                    // Present in the new tree only: added.
                    root_iter.next();
                }
                Ordering::Equal => {
                    if !std::ptr::eq(snap_elem, root_elem) {
                        snap_elem.watch().close();
                        if let Some(snap_leaf) = &snap_elem.leaf {
                            let shared = root_elem
                                .leaf
                                .as_ref()
                                .is_some_and(|l| Arc::ptr_eq(snap_leaf, l));
                            if !shared {
                                snap_leaf.watch().close();
                            }
                        }
                    }
                    snap_iter.next();
                    root_iter.next();
                }
            }
        }
    }
}

fn close_stale<T>(n: &Node<T>) {
    n.watch().close();
    if let Some(leaf) = &n.leaf {
        leaf.watch().close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncommitted_writes_are_private() {
        let tree: Tree<u32> = Tree::new();
        let mut txn = tree.txn();

        txn.insert(b"k", 1);
        assert_eq!(txn.get(b"k"), Some(&1));
        assert_eq!(tree.get(b"k"), None);
        assert_eq!(tree.len(), 0);

        txn.commit();
        assert_eq!(tree.get(b"k"), Some(1));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_structural_sharing_of_untouched_subtrees() {
        let tree: Tree<u32> = Tree::new();
        for k in [&b"aa"[..], b"ab", b"ba", b"bb"] {
            tree.insert(k, 0);
        }

        let before = tree.root();
        tree.insert(b"ac", 1);
        let after = tree.root();

        // The "b" subtree was untouched and must be pointer-identical.
        let (_, b_before) = before.get_edge(b'b').unwrap();
        let (_, b_after) = after.get_edge(b'b').unwrap();
        assert!(Arc::ptr_eq(b_before, b_after));

        // The "a" subtree was rewritten.
        let (_, a_before) = before.get_edge(b'a').unwrap();
        let (_, a_after) = after.get_edge(b'a').unwrap();
        assert!(!Arc::ptr_eq(a_before, a_after));
    }

    #[test]
    fn test_same_path_written_once_stays_private() {
        let tree: Tree<u32> = Tree::new();
        tree.insert(b"aaa", 0);
        tree.insert(b"aab", 0);

        let mut txn = tree.txn();
        txn.insert(b"aaa", 1);
        // Record the private clone's identity without pinning it: a live
        // root handle would force the next write to re-clone.
        let mid_ptr = {
            let root = txn.root();
            let (_, child) = root.get_edge(b'a').unwrap();
            Arc::as_ptr(child) as usize
        };
        txn.insert(b"aab", 2);

        // The shared "aa" node was cloned by the first insert and reused in
        // place by the second.
        let end = txn.root();
        let (_, end_child) = end.get_edge(b'a').unwrap();
        assert_eq!(Arc::as_ptr(end_child) as usize, mid_ptr);
    }

    #[test]
    fn test_delete_of_absent_key_clones_nothing() {
        let tree: Tree<u32> = Tree::new();
        tree.insert(b"present", 1);

        let mut txn = tree.txn();
        assert_eq!(txn.delete(b"absent"), None);
        let root_after = txn.root();
        assert!(Arc::ptr_eq(&tree.root(), &root_after));
    }

    #[test]
    fn test_delete_merges_single_child_chains() {
        let tree: Tree<u32> = Tree::new();
        tree.insert(b"foo", 1);
        tree.insert(b"foobar", 2);
        tree.insert(b"foozip", 3);

        tree.delete(b"foobar");
        let root = tree.root();

        // After the merge the "foo" node's single remaining child chain is
        // compressed: one edge from root, then at most one more level.
        let (_, foo) = root.get_edge(b'f').unwrap();
        assert_eq!(&*foo.prefix, b"foo");
        assert_eq!(foo.edges.len(), 1);
        assert_eq!(&*foo.edges[0].node.prefix, b"zip");

        tree.delete(b"foo");
        let root = tree.root();
        let (_, merged) = root.get_edge(b'f').unwrap();
        assert_eq!(&*merged.prefix, b"foozip");
        assert!(merged.edges.is_empty());
    }

    #[test]
    fn test_insert_then_delete_restores_key_set() {
        let tree: Tree<u32> = Tree::new();
        for k in [&b"a"[..], b"ab", b"abc", b"b"] {
            tree.insert(k, 0);
        }
        let before: Vec<_> = tree.root().iter().map(|(k, _)| k.to_vec()).collect();

        tree.insert(b"aa", 9);
        tree.delete(b"aa");

        let after: Vec<_> = tree.root().iter().map(|(k, _)| k.to_vec()).collect();
        assert_eq!(before, after);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_fork_is_independent() {
        let tree: Tree<u32> = Tree::new();
        let mut txn = tree.txn();
        txn.insert(b"shared", 1);

        let mut forked = txn.fork();
        forked.insert(b"fork-only", 2);
        txn.insert(b"txn-only", 3);

        assert_eq!(txn.get(b"shared"), Some(&1));
        assert_eq!(forked.get(b"shared"), Some(&1));
        assert_eq!(txn.get(b"fork-only"), None);
        assert_eq!(forked.get(b"txn-only"), None);

        forked.commit();
        assert_eq!(tree.get(b"fork-only"), Some(2));
        assert_eq!(tree.get(b"txn-only"), None);
    }

    #[test]
    fn test_bulk_insert_applies_in_order() {
        let tree: Tree<u32> = Tree::new();
        let mut txn = tree.txn();

        let keys: Vec<&[u8]> = vec![b"a", b"b", b"a"];
        txn.bulk_insert(&keys, vec![1, 2, 3]).unwrap();
        txn.commit();

        // The later "a" wins.
        assert_eq!(tree.get(b"a"), Some(3));
        assert_eq!(tree.get(b"b"), Some(2));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_bulk_insert_length_mismatch() {
        let tree: Tree<u32> = Tree::new();
        let mut txn = tree.txn();
        let keys: Vec<&[u8]> = vec![b"a", b"b"];
        let err = txn.bulk_insert(&keys, vec![1]).unwrap_err();
        assert_eq!(err, Error::BulkLengthMismatch { keys: 2, values: 1 });
    }

    #[test]
    fn test_watch_closes_on_tracked_commit() {
        let tree: Tree<u32> = Tree::new();
        tree.insert(b"x", 0);

        let root = tree.root();
        let (watch, val) = root.get_watch(b"x");
        assert_eq!(val, Some(&0));
        assert!(!watch.is_closed());

        let mut txn = tree.txn();
        txn.track_mutate(true);
        txn.insert(b"x", 1);
        txn.commit();

        assert!(watch.is_closed());
    }

    #[test]
    fn test_watch_of_untouched_subtree_stays_open() {
        let tree: Tree<u32> = Tree::new();
        tree.insert(b"left", 0);
        tree.insert(b"right", 0);

        let root = tree.root();
        let (left_watch, _) = root.get_watch(b"left");

        let mut txn = tree.txn();
        txn.track_mutate(true);
        txn.insert(b"right", 1);
        txn.commit();

        assert!(!left_watch.is_closed());
    }

    #[test]
    fn test_untracked_commit_does_not_notify() {
        let tree: Tree<u32> = Tree::new();
        tree.insert(b"x", 0);

        let (watch, _) = tree.root().get_watch(b"x");
        tree.insert(b"x", 1);
        assert!(!watch.is_closed());
    }

    #[test]
    fn test_commit_only_then_notify() {
        let tree: Tree<u32> = Tree::new();
        tree.insert(b"x", 0);

        let (watch, _) = tree.root().get_watch(b"x");

        let mut txn = tree.txn();
        txn.track_mutate(true);
        txn.insert(b"x", 1);
        txn.commit_only();

        assert_eq!(tree.get(b"x"), Some(1));
        assert!(!watch.is_closed());

        txn.notify();
        assert!(watch.is_closed());
    }

    #[test]
    fn test_double_delete_does_not_notify_again() {
        let tree: Tree<u32> = Tree::new();
        tree.insert(b"a", 0);
        tree.insert(b"b", 0);

        let mut txn = tree.txn();
        txn.track_mutate(true);
        assert_eq!(txn.delete(b"a"), Some(0));
        txn.commit();

        let (b_watch, _) = tree.root().get_watch(b"b");
        let mut txn = tree.txn();
        txn.track_mutate(true);
        assert_eq!(txn.delete(b"a"), None);
        txn.commit();

        assert!(!b_watch.is_closed());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_delete_prefix_counts_and_tracks() {
        let tree: Tree<u32> = Tree::new();
        for k in [&b"foo"[..], b"foobar", b"foozip", b"other"] {
            tree.insert(k, 0);
        }

        let (foo_watch, _) = tree.root().get_watch(b"foobar");

        let mut txn = tree.txn();
        txn.track_mutate(true);
        assert!(txn.delete_prefix(b"foo"));
        txn.commit();

        assert_eq!(tree.len(), 1);
        assert!(foo_watch.is_closed());

        let mut remaining = Vec::new();
        tree.walk_prefix(b"foo", |k, _| {
            remaining.push(k.to_vec());
            false
        });
        assert!(remaining.is_empty());
    }

    #[test]
    fn test_delete_prefix_inside_edge_label() {
        let tree: Tree<u32> = Tree::new();
        for k in [&b"foobar"[..], b"foobaz", b"other"] {
            tree.insert(k, 0);
        }

        // "foo" ends inside the compressed "fooba" edge.
        assert!(tree.delete_prefix(b"foo"));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get(b"other"), Some(0));
    }

    #[test]
    fn test_delete_prefix_missing_is_noop() {
        let tree: Tree<u32> = Tree::new();
        tree.insert(b"abc", 0);

        let before = tree.root();
        let mut txn = tree.txn();
        assert!(!txn.delete_prefix(b"zzz"));
        assert!(Arc::ptr_eq(&before, &txn.root()));
    }

    #[test]
    fn test_notify_overflow_falls_back_to_tree_diff() {
        let tree: Tree<u32> = Tree::new();
        {
            let mut txn = tree.txn();
            for i in 0..NOTIFY_TRACK_LIMIT + 500 {
                txn.insert(format!("key-{i:05}").as_bytes(), i as u32);
            }
            txn.insert(b"survivor", 0);
            txn.commit();
        }

        let root = tree.root();
        let (doomed_watch, _) = root.get_watch(b"key-00042");
        let (survivor_watch, _) = root.get_watch(b"survivor");

        let mut txn = tree.txn();
        txn.track_mutate(true);
        assert!(txn.delete_prefix(b"key-"));
        assert!(txn.track_overflow);
        txn.commit();

        assert!(doomed_watch.is_closed());
        assert!(!survivor_watch.is_closed());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_dropping_last_root_closes_watches() {
        let tree: Tree<u32> = Tree::new();
        tree.insert(b"gone", 0);

        let root = tree.root();
        let (watch, _) = root.get_watch(b"gone");

        // Replace the tree's state entirely, then drop our pin.
        tree.delete(b"gone");
        assert!(!watch.is_closed());
        drop(root);
        assert!(watch.is_closed());
    }
}
