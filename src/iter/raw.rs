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

//! Raw node-level cursor
//!
//! Unlike the leaf-yielding cursors, this one surfaces every node together
//! with its accumulated path. Two trees walked in lockstep with it can be
//! diffed by path, which is how an overflowed transaction finds the stale
//! watches it must close.

use crate::node::{Edge, Node};

enum RawFrame<'a, T> {
    Single(&'a Node<T>),
    Edges(&'a [Edge<T>]),
}

/// Pre-order cursor over all nodes of a subtree, tracking the concatenated
/// prefix bytes down to the current node.
pub(crate) struct RawIter<'a, T> {
    /// Each entry pairs the path *above* the pending nodes with the nodes.
    stack: Vec<(Vec<u8>, RawFrame<'a, T>)>,
    pos: Option<&'a Node<T>>,
    path: Vec<u8>,
}

impl<'a, T> RawIter<'a, T> {
    pub(crate) fn new(root: &'a Node<T>) -> Self {
        let mut iter = RawIter {
            stack: vec![(Vec::new(), RawFrame::Single(root))],
            pos: None,
            path: Vec::new(),
        };
        iter.next();
        iter
    }

    /// Node the cursor is positioned on; `None` once exhausted.
    pub(crate) fn front(&self) -> Option<&'a Node<T>> {
        self.pos
    }

    /// Accumulated prefix bytes of the current node.
    pub(crate) fn path(&self) -> &[u8] {
        &self.path
    }

    /// Advances to the next node in pre-order.
    pub(crate) fn next(&mut self) {
        while let Some((path, frame)) = self.stack.last_mut() {
            let (parent_path, elem) = match frame {
                RawFrame::Single(n) => {
                    let n = *n;
                    let p = std::mem::take(path);
                    self.stack.pop();
                    (p, n)
                }
                RawFrame::Edges(edges) => {
                    let slice: &'a [Edge<T>] = *edges;
                    let n = slice[0].node.as_ref();
                    let p = path.clone();
                    if slice.len() > 1 {
                        *edges = &slice[1..];
                    } else {
                        self.stack.pop();
                    }
                    (p, n)
                }
            };

            let mut full = parent_path;
            full.extend_from_slice(&elem.prefix);
            if !elem.edges.is_empty() {
                self.stack.push((full.clone(), RawFrame::Edges(&elem.edges)));
            }
            self.pos = Some(elem);
            self.path = full;
            return;
        }
        self.pos = None;
        self.path.clear();
    }
}
