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

//! # Radixtx - immutable transactional radix tree
//!
//! An ordered, persistent radix tree keyed by arbitrary byte sequences.
//! Every mutation produces a new version that structurally shares all
//! untouched subtrees with its predecessor, so readers holding an old root
//! keep a consistent snapshot forever, without locks.
//!
//! ## Key Features
//!
//! - **Persistent versions** - old roots stay valid and read-concurrent
//!   after any number of commits
//! - **Transactions** - batch writes with amortized copy-on-write; nothing
//!   is visible until an atomic commit
//! - **Watch signals** - per-subtree one-shot notifications that fire when
//!   a committed write invalidates the subtree
//! - **Ordered traversal** - longest-prefix and min/max lookups, prefix and
//!   path walks, forward/reverse cursors with lower-bound seeks
//!
//! ## Quick Start
//!
//! ```rust
//! use radixtx::Tree;
//!
//! let tree = Tree::new();
//! tree.insert(b"foo", 1);
//! tree.insert(b"foobar", 2);
//!
//! // Reads pin one version of the tree.
//! let root = tree.root();
//! assert_eq!(root.get(b"foo"), Some(&1));
//! assert_eq!(root.longest_prefix(b"foozap"), Some((&b"foo"[..], &1)));
//!
//! // Batched writes through a transaction.
//! let mut txn = tree.txn();
//! txn.insert(b"baz", 3);
//! txn.delete(b"foo");
//! txn.commit();
//!
//! // The old root is unaffected by the commit.
//! assert_eq!(root.get(b"foo"), Some(&1));
//! assert_eq!(tree.get(b"foo"), None);
//! ```
//!
//! ## Modules
//!
//! - [`tree`] - the shared handle over committed versions ([`Tree`])
//! - [`node`] - immutable nodes and all read operations ([`Node`])
//! - [`txn`] - the copy-on-write write path ([`Txn`])
//! - [`iter`] - stack-based cursors ([`Iter`], [`ReverseIter`], [`PathIter`])
//! - [`watch`] - one-shot subtree invalidation signals ([`Watch`])
//! - [`error`] - error types ([`Error`], [`Result`])

pub mod error;
pub mod iter;
pub mod node;
pub mod tree;
pub mod txn;
pub mod watch;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use iter::{Iter, PathIter, ReverseIter};
pub use node::Node;
pub use tree::Tree;
pub use txn::Txn;
pub use watch::Watch;
