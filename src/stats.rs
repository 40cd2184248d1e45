// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Observability for a resource lock: a decoded view of the lock word and
// slow-path counters. The fast paths never touch the counters.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::lock_word::Word;

/// Snapshot of a lock's state, taken from a single load of its lock word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockState {
    /// Threads currently holding shared access.
    pub shared: u32,
    /// Whether an exclusive holder owns the lock.
    pub exclusive: bool,
    /// Blocked requests registered but not yet granted.
    pub waiters: u32,
}

impl LockState {
    /// No holder and no registered waiter.
    pub fn is_free(&self) -> bool {
        self.shared == 0 && !self.exclusive && self.waiters == 0
    }
}

impl From<Word> for LockState {
    fn from(w: Word) -> Self {
        Self {
            shared: w.shared(),
            exclusive: w.exclusive(),
            waiters: w.waiters(),
        }
    }
}

/// Cumulative slow-path counters of one lock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LockStats {
    /// Acquisitions that missed the fast path.
    pub slow_path: u64,
    /// Acquisitions that queued and parked.
    pub parked: u64,
    /// Acquisitions that gave up at their deadline.
    pub timeouts: u64,
    /// Waiters granted and woken by a release.
    pub wakes: u64,
}

#[derive(Default)]
pub(crate) struct Counters {
    slow_path: AtomicU64,
    parked: AtomicU64,
    timeouts: AtomicU64,
    wakes: AtomicU64,
}

impl Counters {
    pub(crate) fn slow_path(&self) {
        self.slow_path.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn parked(&self) {
        self.parked.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn woke(&self, n: u32) {
        self.wakes.fetch_add(u64::from(n), Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> LockStats {
        LockStats {
            slow_path: self.slow_path.load(Ordering::Relaxed),
            parked: self.parked.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            wakes: self.wakes.load(Ordering::Relaxed),
        }
    }
}
