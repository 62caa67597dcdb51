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

//! Root-to-key path cursor

use crate::node::Node;

/// Cursor over the leaves on the path from a node toward a key: every
/// stored key that is a prefix of the target, in root-to-target order.
pub struct PathIter<'a, T> {
    node: Option<&'a Node<T>>,
    path: &'a [u8],
}

impl<'a, T> PathIter<'a, T> {
    pub(crate) fn new(node: &'a Node<T>, path: &'a [u8]) -> Self {
        PathIter {
            node: Some(node),
            path,
        }
    }

    /// Returns the next leaf along the path.
    pub fn next(&mut self) -> Option<(&'a [u8], &'a T)> {
        while let Some(current) = self.node {
            // Line up the successor before emitting, so emission order is
            // independent of how far the descent gets.
            self.node = self.step(current);
            if let Some(leaf) = &current.leaf {
                return Some((&leaf.key, &leaf.val));
            }
        }
        None
    }

    fn step(&mut self, current: &'a Node<T>) -> Option<&'a Node<T>> {
        if self.path.is_empty() {
            return None;
        }
        let (_, child) = current.get_edge(self.path[0])?;
        if self.path.starts_with(&child.prefix) {
            self.path = &self.path[child.prefix.len()..];
            Some(child.as_ref())
        } else {
            None
        }
    }
}

impl<'a, T> Iterator for PathIter<'a, T> {
    type Item = (&'a [u8], &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        PathIter::next(self)
    }
}
