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

//! Tree handle
//!
//! A [`Tree`] is a shared handle over an immutable `(root, size)` state
//! record. Readers snapshot the record lock-free and traverse it without
//! synchronization; committing a transaction stores a new record with one
//! atomic swap, so `len()` always agrees with the root it was read with.
//! Roots obtained before a commit stay fully usable - they simply describe
//! an older version.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::node::Node;
use crate::txn::Txn;
use crate::watch::Watch;

/// One committed version of the tree: a root and the number of keys
/// reachable from it. Swapped as a unit so the pair is always consistent.
pub(crate) struct TreeState<T> {
    pub(crate) root: Arc<Node<T>>,
    pub(crate) size: usize,
}

/// An immutable radix tree keyed by byte sequences.
///
/// Every mutation produces a new version that structurally shares all
/// untouched subtrees with its predecessor. The handle always exposes the
/// latest committed version; concurrent commits serialize on the swap and
/// the last one wins.
///
/// Single operations can go through [`insert`](Tree::insert) /
/// [`delete`](Tree::delete) / [`delete_prefix`](Tree::delete_prefix);
/// batches and mutation notification go through [`txn`](Tree::txn).
pub struct Tree<T> {
    state: ArcSwap<TreeState<T>>,
}

impl<T> Tree<T> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Tree {
            state: ArcSwap::from_pointee(TreeState {
                root: Arc::new(Node::new(0, Box::from(&b""[..]))),
                size: 0,
            }),
        }
    }

    /// Number of keys in the latest committed version.
    pub fn len(&self) -> usize {
        self.state.load().size
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the current root for read-only traversal.
    ///
    /// The returned node pins one version of the tree: reads through it are
    /// unaffected by any later commit.
    pub fn root(&self) -> Arc<Node<T>> {
        Arc::clone(&self.state.load().root)
    }

    /// Opens a transaction on the current root.
    pub fn txn(&self) -> Txn<'_, T> {
        Txn::new(self)
    }

    pub(crate) fn current(&self) -> Arc<TreeState<T>> {
        self.state.load_full()
    }

    pub(crate) fn publish(&self, root: Arc<Node<T>>, size: usize) {
        self.state.store(Arc::new(TreeState { root, size }));
    }

    /// Looks up `k` in the latest committed version.
    pub fn get(&self, k: &[u8]) -> Option<T>
    where
        T: Clone,
    {
        self.state.load().root.get(k).cloned()
    }

    /// Looks up `k` and returns the deepest watch observed on the descent.
    pub fn get_watch(&self, k: &[u8]) -> (Watch, Option<T>)
    where
        T: Clone,
    {
        let state = self.state.load();
        let (watch, val) = state.root.get_watch(k);
        (watch, val.cloned())
    }

    /// Longest stored key that is a prefix of `k`.
    pub fn longest_prefix(&self, k: &[u8]) -> Option<(Vec<u8>, T)>
    where
        T: Clone,
    {
        let state = self.state.load();
        state
            .root
            .longest_prefix(k)
            .map(|(key, val)| (key.to_vec(), val.clone()))
    }

    /// Smallest key in the tree.
    pub fn minimum(&self) -> Option<(Vec<u8>, T)>
    where
        T: Clone,
    {
        let state = self.state.load();
        state
            .root
            .minimum()
            .map(|(key, val)| (key.to_vec(), val.clone()))
    }

    /// Largest key in the tree.
    pub fn maximum(&self) -> Option<(Vec<u8>, T)>
    where
        T: Clone,
    {
        let state = self.state.load();
        state
            .root
            .maximum()
            .map(|(key, val)| (key.to_vec(), val.clone()))
    }

    /// Pre-order walk of the whole tree. `f` returns `true` to stop early.
    pub fn walk<F>(&self, f: F)
    where
        F: FnMut(&[u8], &T) -> bool,
    {
        self.state.load().root.walk(f);
    }

    /// Reverse pre-order walk of the whole tree.
    pub fn walk_backwards<F>(&self, f: F)
    where
        F: FnMut(&[u8], &T) -> bool,
    {
        self.state.load().root.walk_backwards(f);
    }

    /// Walks every key at or under `prefix`.
    pub fn walk_prefix<F>(&self, prefix: &[u8], f: F)
    where
        F: FnMut(&[u8], &T) -> bool,
    {
        self.state.load().root.walk_prefix(prefix, f);
    }

    /// Walks the leaves on the root-to-`path` chain.
    pub fn walk_path<F>(&self, path: &[u8], f: F)
    where
        F: FnMut(&[u8], &T) -> bool,
    {
        self.state.load().root.walk_path(path, f);
    }

    /// Inserts `k = v` in a single-operation transaction, returning the
    /// previous value if the key existed.
    pub fn insert(&self, k: &[u8], v: T) -> Option<T>
    where
        T: Clone,
    {
        let mut txn = self.txn();
        let old = txn.insert(k, v);
        txn.commit();
        old
    }

    /// Deletes `k` in a single-operation transaction, returning the removed
    /// value. Absent keys are a no-op.
    pub fn delete(&self, k: &[u8]) -> Option<T>
    where
        T: Clone,
    {
        let mut txn = self.txn();
        let old = txn.delete(k);
        txn.commit();
        old
    }

    /// Deletes every key under `prefix` in a single-operation transaction.
    /// Returns whether the tree changed.
    pub fn delete_prefix(&self, prefix: &[u8]) -> bool {
        let mut txn = self.txn();
        let changed = txn.delete_prefix(prefix);
        txn.commit();
        changed
    }
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Tree::new()
    }
}

impl<T: Clone> FromIterator<(Vec<u8>, T)> for Tree<T> {
    fn from_iter<I: IntoIterator<Item = (Vec<u8>, T)>>(iter: I) -> Self {
        let tree = Tree::new();
        {
            let mut txn = tree.txn();
            for (k, v) in iter {
                txn.insert(&k, v);
            }
            txn.commit();
        }
        tree
    }
}

impl<T> std::fmt::Debug for Tree<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree").field("len", &self.len()).finish()
    }
}
