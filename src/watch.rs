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

//! One-shot broadcast signals for subtree invalidation
//!
//! Every node and leaf in the tree can lazily allocate a [`Watch`]. Readers
//! obtain the handle during a descent (see `get_watch` and the iterator
//! `seek_prefix_watch` operations) and observe it to learn when any write
//! may have affected that subtree. The committing transaction closes the
//! signal after the new root is published; a closed watch never reopens,
//! since the node that owned it is unreachable from every later root.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

struct WatchInner {
    /// Fast-path completion flag; set exactly once, under `lock`.
    closed: AtomicBool,
    lock: Mutex<()>,
    done: Condvar,
}

/// Handle to a one-shot broadcast completion signal.
///
/// Cloning the handle is cheap and every clone observes the same signal.
/// The tree closes a watch when the node carrying it is replaced or removed
/// by a committed transaction that tracks mutations, or when the node's
/// last reference is dropped.
#[derive(Clone)]
pub struct Watch {
    inner: Arc<WatchInner>,
}

impl Watch {
    pub(crate) fn new() -> Self {
        Watch {
            inner: Arc::new(WatchInner {
                closed: AtomicBool::new(false),
                lock: Mutex::new(()),
                done: Condvar::new(),
            }),
        }
    }

    /// Returns true once the signal has fired.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Blocks the calling thread until the signal fires.
    ///
    /// Returns immediately if the watch is already closed. The tree core
    /// never calls this; waiting is always the observer's decision.
    pub fn wait(&self) {
        if self.is_closed() {
            return;
        }
        let mut guard = self.inner.lock.lock();
        while !self.inner.closed.load(Ordering::Acquire) {
            self.inner.done.wait(&mut guard);
        }
    }

    /// Blocks until the signal fires or `timeout` elapses.
    ///
    /// Returns true if the watch is closed when this call returns.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_closed() {
            return true;
        }
        let deadline = Instant::now() + timeout;
        let mut guard = self.inner.lock.lock();
        while !self.inner.closed.load(Ordering::Acquire) {
            if self.inner.done.wait_until(&mut guard, deadline).timed_out() {
                return self.inner.closed.load(Ordering::Acquire);
            }
        }
        true
    }

    /// Fires the signal. Idempotent; all current and future observers see
    /// completion.
    pub(crate) fn close(&self) {
        // The store happens under the lock so a waiter cannot check the
        // flag, miss the update, and then sleep past the notification.
        let _guard = self.inner.lock.lock();
        if !self.inner.closed.swap(true, Ordering::Release) {
            self.inner.done.notify_all();
        }
    }
}

// Equality and hashing follow handle identity, not closed state, so a
// transaction can dedup the set of watches it must close on commit.
impl PartialEq for Watch {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Watch {}

impl Hash for Watch {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.inner) as usize).hash(state);
    }
}

impl fmt::Debug for Watch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watch")
            .field("closed", &self.is_closed())
            .finish()
    }
}
