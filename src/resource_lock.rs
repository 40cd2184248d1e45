// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Timeout-aware shared/exclusive lock for one resource (block, row, table).
//
// Fast paths are a CAS on the lock word and never allocate or park. On
// contention a caller registers in the lock word and queues a wait node in
// one step under the queue mutex, then parks. Releases hand ownership over:
// the releaser claims a compatible batch, applies the grant to the lock word
// and wakes the first node; each woken reader wakes the next one.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crossbeam_utils::{Backoff, CachePadded};
use log::{debug, error, trace};

use crate::lock_word::{Admission, LockWord};
use crate::park_gate::{self, Wakeup};
use crate::stats::Counters;
use crate::wait_list::{Batch, WaitList};
use crate::wait_node::WaitNode;
use crate::{
    ExclusiveGuard, LockConfig, LockMode, LockState, LockStats, LockTimeout, SharedGuard,
};

/// A shared/exclusive lock protecting one resource.
///
/// Any number of threads may hold shared access at once; exclusive access
/// excludes every other holder. Once any request is queued, new shared
/// requests queue behind it, so a pending writer is not starved by a stream
/// of readers. Waiters are granted in arrival order: an exclusive waiter
/// alone, or the whole run of shared waiters at the head of the queue.
///
/// Every successful `acquire_*` must be matched by exactly one `release_*`
/// from the same logical owner; the guard API does this automatically.
pub struct ResourceLock {
    word: CachePadded<LockWord>,
    waiters: Mutex<WaitList>,
    config: LockConfig,
    counters: Counters,
}

impl ResourceLock {
    /// Create an unnamed lock with the default configuration.
    pub fn new() -> Self {
        Self::with_config(LockConfig::default())
    }

    /// Create a lock with a diagnostic name.
    pub fn named(name: &str) -> Self {
        Self::with_config(LockConfig::new(name))
    }

    pub fn with_config(config: LockConfig) -> Self {
        Self {
            word: CachePadded::new(LockWord::new()),
            waiters: Mutex::new(WaitList::new()),
            config,
            counters: Counters::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Decoded view of the lock word.
    pub fn state(&self) -> LockState {
        self.word.load().into()
    }

    pub fn stats(&self) -> LockStats {
        self.counters.snapshot()
    }

    /// Acquire shared access, waiting at most `timeout`.
    ///
    /// The fast path is always attempted, even with a zero timeout.
    pub fn acquire_shared(&self, timeout: Duration) -> Result<(), LockTimeout> {
        if self.try_fast(LockMode::Shared, !timeout.is_zero()) {
            return Ok(());
        }
        self.acquire_slow(LockMode::Shared, timeout)
    }

    /// Acquire exclusive access, waiting at most `timeout`.
    pub fn acquire_exclusive(&self, timeout: Duration) -> Result<(), LockTimeout> {
        if self.try_fast(LockMode::Exclusive, !timeout.is_zero()) {
            return Ok(());
        }
        self.acquire_slow(LockMode::Exclusive, timeout)
    }

    /// Take shared access only if no writer holds or waits. Never blocks.
    pub fn try_acquire_shared(&self) -> bool {
        self.word.try_fast_shared()
    }

    /// Take exclusive access only if the lock is completely free. Never
    /// blocks and never queues; for call sites with a non-blocking fallback.
    pub fn try_acquire_exclusive(&self) -> bool {
        self.word.try_no_wait_exclusive()
    }

    /// Release shared access. The last reader out wakes the queued waiters.
    pub fn release_shared(&self) {
        let Some(prev) = self.word.release_shared() else {
            error!("lock `{}`: release_shared without a shared holder", self.name());
            debug_assert!(false, "release_shared without a matching acquire_shared");
            return;
        };
        if prev.shared() == 1 && prev.waiters() > 0 {
            self.wake_waiters();
        }
    }

    /// Release exclusive access and wake the next compatible batch.
    pub fn release_exclusive(&self) {
        let Some(prev) = self.word.release_exclusive() else {
            error!("lock `{}`: release_exclusive without an exclusive holder", self.name());
            debug_assert!(false, "release_exclusive without a matching acquire_exclusive");
            return;
        };
        if prev.waiters() > 0 {
            self.wake_waiters();
        }
    }

    /// Turn shared access into exclusive access without releasing it.
    ///
    /// Succeeds only when the caller is the sole reader and nobody is
    /// queued. On failure the caller still holds shared access.
    pub fn try_upgrade(&self) -> bool {
        self.word.try_upgrade()
    }

    /// Turn exclusive access into shared access without releasing it, then
    /// let queued readers in alongside.
    pub fn downgrade(&self) {
        let Some(prev) = self.word.downgrade() else {
            error!("lock `{}`: downgrade without an exclusive holder", self.name());
            debug_assert!(false, "downgrade without holding exclusive access");
            return;
        };
        if prev.waiters() > 0 {
            self.wake_waiters();
        }
    }

    /// Shared access as a guard that releases on drop.
    pub fn lock_shared(&self, timeout: Duration) -> Result<SharedGuard<'_>, LockTimeout> {
        self.acquire_shared(timeout)?;
        Ok(SharedGuard::new(self))
    }

    /// Exclusive access as a guard that releases on drop.
    pub fn lock_exclusive(&self, timeout: Duration) -> Result<ExclusiveGuard<'_>, LockTimeout> {
        self.acquire_exclusive(timeout)?;
        Ok(ExclusiveGuard::new(self))
    }

    pub fn try_lock_shared(&self) -> Option<SharedGuard<'_>> {
        self.try_acquire_shared().then(|| SharedGuard::new(self))
    }

    pub fn try_lock_exclusive(&self) -> Option<ExclusiveGuard<'_>> {
        self.try_acquire_exclusive().then(|| ExclusiveGuard::new(self))
    }

    /// [`lock_shared`](Self::lock_shared) with the configured default timeout.
    pub fn read(&self) -> Result<SharedGuard<'_>, LockTimeout> {
        self.lock_shared(self.config.default_timeout)
    }

    /// [`lock_exclusive`](Self::lock_exclusive) with the configured default timeout.
    pub fn write(&self) -> Result<ExclusiveGuard<'_>, LockTimeout> {
        self.lock_exclusive(self.config.default_timeout)
    }

    fn try_fast(&self, mode: LockMode, spin: bool) -> bool {
        let attempt = || match mode {
            LockMode::Shared => self.word.try_fast_shared(),
            LockMode::Exclusive => self.word.try_no_wait_exclusive(),
        };
        if attempt() {
            return true;
        }
        if !spin || !self.config.spin {
            return false;
        }
        let backoff = Backoff::new();
        while !backoff.is_completed() {
            backoff.snooze();
            if attempt() {
                return true;
            }
        }
        false
    }

    fn acquire_slow(&self, mode: LockMode, timeout: Duration) -> Result<(), LockTimeout> {
        self.counters.slow_path();
        let start = Instant::now();
        if timeout.is_zero() {
            self.counters.timeout();
            return Err(LockTimeout::new(mode, self.name(), timeout));
        }
        // `None` when the deadline is beyond what `Instant` can represent.
        let deadline = start.checked_add(timeout);
        trace!("lock `{}`: {mode} request contended ({:?})", self.name(), self.word.load());

        let node = WaitNode::for_current(mode);
        {
            let mut list = self.lock_list();
            match self.word.register_intent(mode) {
                Admission::Granted => return Ok(()),
                Admission::Queued => list.push(Arc::clone(&node)),
            }
        }

        self.counters.parked();
        match park_gate::park_until(&node, deadline) {
            Wakeup::Woken => {
                if let Some(next) = node.successor() {
                    park_gate::wake(next);
                }
                trace!(
                    "lock `{}`: {mode} granted after {:?}",
                    self.name(),
                    start.elapsed()
                );
                Ok(())
            }
            Wakeup::TimedOut => {
                self.abandon(&node);
                self.counters.timeout();
                debug!("lock `{}`: {mode} request timed out after {timeout:?}", self.name());
                Err(LockTimeout::new(mode, self.name(), timeout))
            }
        }
    }

    /// Undo the registration of a timed-out node. If that leaves waiters
    /// behind it that can now be granted, grant them.
    fn abandon(&self, node: &Arc<WaitNode>) {
        let batch = {
            let mut list = self.lock_list();
            list.remove(node);
            let word = self.word.withdraw();
            if word.waiters() > 0 {
                self.detach_batch(&mut list)
            } else {
                None
            }
        };
        if let Some(batch) = batch {
            self.dispatch(batch);
        }
    }

    fn wake_waiters(&self) {
        let batch = {
            let mut list = self.lock_list();
            self.detach_batch(&mut list)
        };
        if let Some(batch) = batch {
            self.dispatch(batch);
        }
    }

    /// Claim the next batch and make it the holder in the lock word. Must
    /// run under the queue mutex so no registration interleaves.
    fn detach_batch(&self, list: &mut WaitList) -> Option<Batch> {
        let batch = list.pop_compatible_batch(self.word.load())?;
        self.word.grant(batch.mode(), batch.len());
        Some(batch)
    }

    fn dispatch(&self, batch: Batch) {
        park_gate::wake(batch.head());
        self.counters.woke(batch.len());
        trace!(
            "lock `{}`: woke {} {} waiter(s)",
            self.name(),
            batch.len(),
            batch.mode()
        );
    }

    fn lock_list(&self) -> MutexGuard<'_, WaitList> {
        // Nothing panics while the queue is held; recover rather than poison.
        self.waiters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ResourceLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResourceLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceLock")
            .field("name", &self.name())
            .field("state", &self.state())
            .finish()
    }
}
