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

//! Reverse pre-order cursor

use std::cmp::Ordering;

use rustc_hash::FxHashSet;

use crate::iter::{Frame, Iter};
use crate::node::{Edge, Node};
use crate::watch::Watch;

/// Reverse pre-order cursor yielding `(key, value)` pairs in descending
/// unsigned-lexicographic key order.
///
/// In reverse order a parent's own leaf must come out *after* its entire
/// subtree, so the cursor tracks which parents have already had their
/// children pushed: the first pop of a parent expands it, the second pop
/// emits its leaf.
pub struct ReverseIter<'a, T> {
    i: Iter<'a, T>,
    /// Identities of nodes whose children are already on the stack.
    expanded: FxHashSet<usize>,
}

impl<'a, T> ReverseIter<'a, T> {
    pub(crate) fn new(root: &'a Node<T>) -> Self {
        ReverseIter {
            i: Iter::new(root),
            expanded: FxHashSet::default(),
        }
    }

    /// Positions the cursor at the subtree covering `prefix`.
    pub fn seek_prefix(&mut self, prefix: &[u8]) {
        self.i.seek_prefix_watch(prefix);
    }

    /// Like [`seek_prefix`](ReverseIter::seek_prefix), and returns the
    /// deepest watch signal observed during the descent.
    pub fn seek_prefix_watch(&mut self, prefix: &[u8]) -> Watch {
        self.i.seek_prefix_watch(prefix)
    }

    /// Positions the cursor on the largest key <= `key`.
    pub fn seek_reverse_lower_bound(&mut self, key: &[u8]) {
        self.i.stack = Some(Vec::new());
        self.i.node = None;
        let mut n = self.i.root;
        let mut search = key;

        loop {
            let prefix_cmp = if n.prefix.len() < search.len() {
                n.prefix.as_ref().cmp(&search[..n.prefix.len()])
            } else {
                n.prefix.as_ref().cmp(search)
            };

            match prefix_cmp {
                Ordering::Less => {
                    // Every key in this subtree sorts before the search
                    // key, so the bound is this subtree's maximum. Leave
                    // the node unexpanded; reverse iteration descends into
                    // it and surfaces the maximum first.
                    self.push(Frame::Single(n), false);
                    return;
                }
                Ordering::Greater => {
                    // Nothing in this subtree can be <= key.
                    return;
                }
                Ordering::Equal => {}
            }

            if let Some(leaf) = &n.leaf {
                if &*leaf.key == key {
                    self.push(Frame::Single(n), true);
                    return;
                }
                // The leaf's key is a strict prefix of the search key, so
                // it sorts before it. With no children it is the bound;
                // with children a closer bound may still exist below.
                if n.edges.is_empty() {
                    self.push(Frame::Single(n), true);
                    return;
                }
                self.push(Frame::Single(n), true);
            }

            search = &search[n.prefix.len()..];
            if search.is_empty() {
                return;
            }

            let (idx, lower) = match n.lower_bound_edge(search[0]) {
                Some((idx, child)) => (idx, Some(child)),
                None => (n.edges.len(), None),
            };

            // Edges before the lower-bound edge are strictly less than the
            // search key; all of their keys qualify.
            if idx > 0 {
                self.push(Frame::Edges(&n.edges[..idx]), false);
            }

            match lower {
                Some(child) => n = child.as_ref(),
                None => return,
            }
        }
    }

    fn push(&mut self, frame: Frame<'a, T>, expand: bool) {
        if expand {
            if let Frame::Single(n) = &frame {
                self.expanded.insert(*n as *const Node<T> as usize);
            }
        }
        self.i.stack.get_or_insert_with(Vec::new).push(frame);
    }

    /// Returns the previous `(key, value)` pair in descending key order.
    pub fn previous(&mut self) -> Option<(&'a [u8], &'a T)> {
        let node = self.i.node;
        let stack = self.i.stack.get_or_insert_with(|| {
            let mut frames = Vec::new();
            if let Some(n) = node {
                frames.push(Frame::Single(n));
            }
            frames
        });

        while let Some(top) = stack.last_mut() {
            // Take the last node out of the top frame; edges are sorted
            // ascending, so the stack's LIFO order visits the largest
            // child first.
            let elem = match top {
                Frame::Single(n) => {
                    let n = *n;
                    stack.pop();
                    n
                }
                Frame::Edges(edges) => {
                    let slice: &'a [Edge<T>] = *edges;
                    let n = slice[slice.len() - 1].node.as_ref();
                    if slice.len() > 1 {
                        *edges = &slice[..slice.len() - 1];
                    } else {
                        stack.pop();
                    }
                    n
                }
            };

            let id = elem as *const Node<T> as usize;
            let already_expanded = self.expanded.contains(&id);

            if !already_expanded && !elem.edges.is_empty() {
                // First visit: re-push the node below its children so its
                // leaf comes out once the subtree is drained.
                self.expanded.insert(id);
                stack.push(Frame::Single(elem));
                stack.push(Frame::Edges(&elem.edges));
                continue;
            }

            if already_expanded {
                self.expanded.remove(&id);
            }

            if let Some(leaf) = &elem.leaf {
                return Some((&leaf.key, &leaf.val));
            }
        }
        None
    }
}

impl<'a, T> Iterator for ReverseIter<'a, T> {
    type Item = (&'a [u8], &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        self.previous()
    }
}
