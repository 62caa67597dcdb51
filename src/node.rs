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

//! Immutable radix tree nodes
//!
//! A [`Node`] carries a compressed prefix, an optional leaf, and a sorted
//! edge table keyed by the first byte of each child's prefix. Nodes are
//! never mutated once they are reachable from a committed root; writes go
//! through [`Txn`](crate::Txn), which clones the path it touches.
//!
//! All read operations live here and operate on `&Node`, so they work the
//! same on a committed root, an old root held by a reader, or the working
//! root of an open transaction.

use std::sync::Arc;
use std::sync::OnceLock;

use smallvec::SmallVec;

use crate::iter::{Iter, PathIter, RawIter, ReverseIter};
use crate::watch::Watch;

/// A key/value pair stored in the tree.
///
/// The leaf owns a copy of the full key so iteration can hand out key bytes
/// without reassembling them from prefixes. Leaves are shared between tree
/// versions until the value is replaced.
pub(crate) struct Leaf<T> {
    pub(crate) key: Box<[u8]>,
    pub(crate) val: T,
    watch: OnceLock<Watch>,
}

impl<T> Leaf<T> {
    pub(crate) fn new(key: &[u8], val: T) -> Self {
        Leaf {
            key: key.into(),
            val,
            watch: OnceLock::new(),
        }
    }

    pub(crate) fn watch(&self) -> &Watch {
        self.watch.get_or_init(Watch::new)
    }
}

impl<T> Drop for Leaf<T> {
    fn drop(&mut self) {
        // The last reference is going away, so the key is gone forever;
        // release anyone still observing it.
        if let Some(w) = self.watch.get() {
            w.close();
        }
    }
}

/// An edge to a child node. `label` always equals `node.prefix[0]`.
pub(crate) struct Edge<T> {
    pub(crate) label: u8,
    pub(crate) node: Arc<Node<T>>,
}

impl<T> Clone for Edge<T> {
    fn clone(&self) -> Self {
        Edge {
            label: self.label,
            node: Arc::clone(&self.node),
        }
    }
}

/// An immutable node in the radix tree.
///
/// Obtained from [`Tree::root`](crate::Tree::root) or
/// [`Txn::root`](crate::Txn::root); all read operations on a node see the
/// fixed snapshot that root represents.
pub struct Node<T> {
    /// Id of the transaction that created this node. Transaction ids are
    /// never reused, so a match against a live transaction's id proves the
    /// node is private to it and safe to mutate in place.
    pub(crate) owner: u64,
    /// Compressed path segment above this node; empty only at the root.
    pub(crate) prefix: Box<[u8]>,
    pub(crate) leaf: Option<Arc<Leaf<T>>>,
    /// Sorted strictly ascending by label.
    pub(crate) edges: SmallVec<[Edge<T>; 4]>,
    watch: OnceLock<Watch>,
}

impl<T> Clone for Node<T> {
    fn clone(&self) -> Self {
        // A copy is a fresh version of this subtree root: it starts with an
        // unobserved watch slot, while the old node keeps the observed one.
        Node {
            owner: self.owner,
            prefix: self.prefix.clone(),
            leaf: self.leaf.clone(),
            edges: self.edges.clone(),
            watch: OnceLock::new(),
        }
    }
}

impl<T> Drop for Node<T> {
    fn drop(&mut self) {
        if let Some(w) = self.watch.get() {
            w.close();
        }
    }
}

impl<T> Node<T> {
    pub(crate) fn new(owner: u64, prefix: Box<[u8]>) -> Self {
        Node {
            owner,
            prefix,
            leaf: None,
            edges: SmallVec::new(),
            watch: OnceLock::new(),
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.leaf.is_some()
    }

    /// The node's watch signal, allocated on first observation. Racing
    /// callers converge on a single shared handle.
    pub(crate) fn watch(&self) -> &Watch {
        self.watch.get_or_init(Watch::new)
    }

    fn edge_search(&self, label: u8) -> Result<usize, usize> {
        self.edges.binary_search_by_key(&label, |e| e.label)
    }

    pub(crate) fn get_edge(&self, label: u8) -> Option<(usize, &Arc<Node<T>>)> {
        match self.edge_search(label) {
            Ok(idx) => Some((idx, &self.edges[idx].node)),
            Err(_) => None,
        }
    }

    /// First edge whose label is >= `label`, exact or not.
    pub(crate) fn lower_bound_edge(&self, label: u8) -> Option<(usize, &Arc<Node<T>>)> {
        let idx = match self.edge_search(label) {
            Ok(idx) | Err(idx) => idx,
        };
        if idx < self.edges.len() {
            Some((idx, &self.edges[idx].node))
        } else {
            None
        }
    }

    /// Inserts an edge at its sorted position. The caller guarantees no
    /// edge with the same label exists.
    pub(crate) fn add_edge(&mut self, e: Edge<T>) {
        let idx = match self.edge_search(e.label) {
            Ok(idx) | Err(idx) => idx,
        };
        self.edges.insert(idx, e);
    }

    /// Swaps the child of an existing edge. A missing edge means the tree
    /// is corrupt, which is unrecoverable.
    pub(crate) fn replace_edge(&mut self, label: u8, node: Arc<Node<T>>) {
        match self.edge_search(label) {
            Ok(idx) => self.edges[idx].node = node,
            Err(_) => panic!("replacing missing edge"),
        }
    }

    pub(crate) fn del_edge(&mut self, label: u8) {
        if let Ok(idx) = self.edge_search(label) {
            self.edges.remove(idx);
        }
    }

    /// Looks up `k`, returning a reference to its value.
    pub fn get(&self, k: &[u8]) -> Option<&T> {
        let mut n = self;
        let mut search = k;
        loop {
            if search.is_empty() {
                return match &n.leaf {
                    Some(leaf) => Some(&leaf.val),
                    None => None,
                };
            }
            let (_, child) = n.get_edge(search[0])?;
            n = child.as_ref();
            if search.starts_with(&n.prefix) {
                search = &search[n.prefix.len()..];
            } else {
                return None;
            }
        }
    }

    /// Looks up `k` and returns the deepest watch signal observed on the
    /// way down along with the value, if any.
    ///
    /// On a hit the watch is the leaf's own signal; on a miss it is the
    /// watch of the last node successfully entered. A write anywhere below
    /// that point closes the returned handle.
    pub fn get_watch(&self, k: &[u8]) -> (Watch, Option<&T>) {
        let mut n = self;
        let mut search = k;
        let mut watch = n.watch().clone();
        loop {
            if search.is_empty() {
                if let Some(leaf) = &n.leaf {
                    return (leaf.watch().clone(), Some(&leaf.val));
                }
                break;
            }

            match n.get_edge(search[0]) {
                Some((_, child)) => n = child.as_ref(),
                None => break,
            }

            // Narrow to the finest granularity the search reaches.
            watch = n.watch().clone();

            if search.starts_with(&n.prefix) {
                search = &search[n.prefix.len()..];
            } else {
                break;
            }
        }
        (watch, None)
    }

    /// Returns the longest stored key that is a prefix of `k`.
    pub fn longest_prefix(&self, k: &[u8]) -> Option<(&[u8], &T)> {
        let mut last: Option<&Leaf<T>> = None;
        let mut n = self;
        let mut search = k;
        loop {
            if n.is_leaf() {
                last = n.leaf.as_deref();
            }
            if search.is_empty() {
                break;
            }
            match n.get_edge(search[0]) {
                Some((_, child)) => n = child.as_ref(),
                None => break,
            }
            if search.starts_with(&n.prefix) {
                search = &search[n.prefix.len()..];
            } else {
                break;
            }
        }
        last.map(|leaf| (&*leaf.key, &leaf.val))
    }

    /// Smallest key in the subtree.
    ///
    /// A leaf on an internal node is the shortest key reachable through
    /// that point, so the first leaf met going down edge 0 is the minimum.
    pub fn minimum(&self) -> Option<(&[u8], &T)> {
        let mut n = self;
        loop {
            if let Some(leaf) = &n.leaf {
                return Some((&leaf.key, &leaf.val));
            }
            match n.edges.first() {
                Some(e) => n = e.node.as_ref(),
                None => return None,
            }
        }
    }

    /// Largest key in the subtree.
    ///
    /// Descends through the last edge before checking for a leaf: any
    /// descendant key is strictly greater than an internal node's own key,
    /// so an internal leaf is shadowed. Deliberately asymmetric with
    /// [`minimum`](Node::minimum).
    pub fn maximum(&self) -> Option<(&[u8], &T)> {
        let mut n = self;
        loop {
            if let Some(e) = n.edges.last() {
                n = e.node.as_ref();
                continue;
            }
            return match &n.leaf {
                Some(leaf) => Some((&leaf.key, &leaf.val)),
                None => None,
            };
        }
    }

    /// Pre-order walk of every key under this node. `f` returns `true` to
    /// stop early.
    pub fn walk<F>(&self, mut f: F)
    where
        F: FnMut(&[u8], &T) -> bool,
    {
        recursive_walk(self, &mut f);
    }

    /// Reverse pre-order walk: each node's leaf first, then its children
    /// from largest to smallest label.
    ///
    /// Pre-order puts a leaf before everything below it even here, so a
    /// leaf on an internal node comes out before its (larger) descendants.
    /// For strictly descending key order use
    /// [`reverse_iter`](Node::reverse_iter).
    pub fn walk_backwards<F>(&self, mut f: F)
    where
        F: FnMut(&[u8], &T) -> bool,
    {
        reverse_recursive_walk(self, &mut f);
    }

    /// Walks every key at or under `prefix` in pre-order.
    pub fn walk_prefix<F>(&self, prefix: &[u8], mut f: F)
    where
        F: FnMut(&[u8], &T) -> bool,
    {
        let mut n = self;
        let mut search = prefix;
        loop {
            if search.is_empty() {
                recursive_walk(n, &mut f);
                return;
            }

            match n.get_edge(search[0]) {
                Some((_, child)) => n = child.as_ref(),
                None => return,
            }

            if search.starts_with(&n.prefix) {
                search = &search[n.prefix.len()..];
            } else if n.prefix.starts_with(search) {
                // The prefix ends inside this child's compressed path, so
                // the whole child subtree is under it.
                recursive_walk(n, &mut f);
                return;
            } else {
                return;
            }
        }
    }

    /// Walks the keys *above* `path`: every leaf on the root-to-`path`
    /// chain, in root-to-leaf order.
    pub fn walk_path<F>(&self, path: &[u8], mut f: F)
    where
        F: FnMut(&[u8], &T) -> bool,
    {
        let mut iter = self.path_iter(path);
        while let Some((k, v)) = iter.next() {
            if f(k, v) {
                return;
            }
        }
    }

    /// Pre-order cursor over the subtree.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Reverse pre-order cursor over the subtree.
    pub fn reverse_iter(&self) -> ReverseIter<'_, T> {
        ReverseIter::new(self)
    }

    /// Cursor over the leaves on the path from this node toward `path`.
    pub fn path_iter<'a>(&'a self, path: &'a [u8]) -> PathIter<'a, T> {
        PathIter::new(self, path)
    }

    /// Pre-order cursor over *nodes* (not leaves), carrying accumulated
    /// paths. Drives the commit-time notification diff.
    pub(crate) fn raw_iter(&self) -> RawIter<'_, T> {
        RawIter::new(self)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("prefix", &self.prefix)
            .field("leaf", &self.leaf.as_ref().map(|l| (&l.key, &l.val)))
            .field("edges", &self.edges.len())
            .finish()
    }
}

fn recursive_walk<T, F>(n: &Node<T>, f: &mut F) -> bool
where
    F: FnMut(&[u8], &T) -> bool,
{
    if let Some(leaf) = &n.leaf {
        if f(&leaf.key, &leaf.val) {
            return true;
        }
    }
    for e in &n.edges {
        if recursive_walk(&e.node, f) {
            return true;
        }
    }
    false
}

fn reverse_recursive_walk<T, F>(n: &Node<T>, f: &mut F) -> bool
where
    F: FnMut(&[u8], &T) -> bool,
{
    if let Some(leaf) = &n.leaf {
        if f(&leaf.key, &leaf.val) {
            return true;
        }
    }
    for e in n.edges.iter().rev() {
        if reverse_recursive_walk(&e.node, f) {
            return true;
        }
    }
    false
}

/// Length of the longest common prefix of `a` and `b`.
pub(crate) fn longest_common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}
