// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Per-waiter record: what a blocked thread asked for and how its wait ended.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, Thread};

/// Access mode requested from a [`ResourceLock`](crate::ResourceLock).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LockMode {
    /// Read access; any number of shared holders may coexist.
    Shared,
    /// Read and write access; excludes every other holder.
    Exclusive,
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockMode::Shared => f.write_str("shared"),
            LockMode::Exclusive => f.write_str("exclusive"),
        }
    }
}

const WAITING: u8 = 0;
const CLAIMED: u8 = 1; // picked for a grant by a releaser
const TIMED_OUT: u8 = 2; // owner gave up

/// One blocked thread.
///
/// `status` leaves `WAITING` exactly once: either a releaser claims the node
/// (and will wake it) or the owner marks it timed out. `awake` is written once,
/// by whoever wakes the node, after the grant is visible in the lock word.
pub(crate) struct WaitNode {
    mode: LockMode,
    owner: Thread,
    status: AtomicU8,
    awake: AtomicBool,
    /// Next node of the same wake batch, woken by this node's owner.
    successor: OnceLock<Arc<WaitNode>>,
}

impl WaitNode {
    /// A fresh node owned by the calling thread.
    pub(crate) fn for_current(mode: LockMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            owner: thread::current(),
            status: AtomicU8::new(WAITING),
            awake: AtomicBool::new(false),
            successor: OnceLock::new(),
        })
    }

    pub(crate) fn mode(&self) -> LockMode {
        self.mode
    }

    pub(crate) fn owner(&self) -> &Thread {
        &self.owner
    }

    pub(crate) fn is_timed_out(&self) -> bool {
        self.status.load(Ordering::Acquire) == TIMED_OUT
    }

    /// Reserve this node for a grant. Fails if the owner already timed out.
    pub(crate) fn claim(&self) -> bool {
        self.status
            .compare_exchange(WAITING, CLAIMED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Mark the node dead. Fails if a releaser claimed it first, in which
    /// case the grant has been (or is being) applied and a wake will follow.
    pub(crate) fn time_out(&self) -> bool {
        self.status
            .compare_exchange(WAITING, TIMED_OUT, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn is_awake(&self) -> bool {
        self.awake.load(Ordering::Acquire)
    }

    pub(crate) fn set_awake(&self) {
        let was = self.awake.swap(true, Ordering::Release);
        debug_assert!(!was, "wait node woken twice");
    }

    pub(crate) fn link_successor(&self, next: Arc<WaitNode>) {
        let linked = self.successor.set(next).is_ok();
        debug_assert!(linked, "wait node already has a successor");
    }

    pub(crate) fn successor(&self) -> Option<&Arc<WaitNode>> {
        self.successor.get()
    }
}

impl fmt::Debug for WaitNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.status.load(Ordering::Relaxed) {
            WAITING => "waiting",
            CLAIMED => "claimed",
            _ => "timed-out",
        };
        f.debug_struct("WaitNode")
            .field("mode", &self.mode)
            .field("owner", &self.owner.id())
            .field("status", &status)
            .field("awake", &self.awake.load(Ordering::Relaxed))
            .finish()
    }
}
