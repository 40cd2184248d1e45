// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Packed lock state, updated only through compare-and-swap.
// - Low 32 bits count shared holders.
// - Bits 32..=62 count registered waiters (shared and exclusive).
// - High bit marks the confirmed exclusive holder.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::LockMode;

const S_MASK: u64 = u32::MAX as u64; // shared holder count
const S_ONE: u64 = 1;
const Q_SHIFT: u32 = 32;
const Q_ONE: u64 = 1 << Q_SHIFT; // one registered waiter
const Q_MASK: u64 = (i32::MAX as u64) << Q_SHIFT;
const X_FLAG: u64 = 1 << 63; // confirmed exclusive holder

/// One decoded value of the lock word.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct Word(u64);

impl Word {
    pub(crate) const FREE: Word = Word(0);

    /// Number of threads holding shared access.
    pub(crate) fn shared(self) -> u32 {
        (self.0 & S_MASK) as u32
    }

    /// Number of waiters registered but not yet granted.
    pub(crate) fn waiters(self) -> u32 {
        ((self.0 & Q_MASK) >> Q_SHIFT) as u32
    }

    /// Whether an exclusive holder owns the resource.
    pub(crate) fn exclusive(self) -> bool {
        self.0 & X_FLAG != 0
    }

    /// Non-zero while an exclusive holder exists or any waiter is registered.
    /// New shared holders are only admitted on the fast path when this is 0.
    pub(crate) fn exclusive_activity(self) -> u32 {
        (self.0 >> Q_SHIFT) as u32
    }

    /// Whether a waiter of `mode` at the head of the queue can be granted
    /// against this state.
    pub(crate) fn admits(self, mode: LockMode) -> bool {
        match mode {
            LockMode::Shared => !self.exclusive(),
            LockMode::Exclusive => !self.exclusive() && self.shared() == 0,
        }
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Word")
            .field("shared", &self.shared())
            .field("waiters", &self.waiters())
            .field("exclusive", &self.exclusive())
            .finish()
    }
}

/// Outcome of registering a slow-path request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Admission {
    /// The request was granted in the same CAS; nothing was registered.
    Granted,
    /// The request is registered as a waiter and must be queued.
    Queued,
}

/// The packed shared/exclusive state of one resource lock.
pub(crate) struct LockWord {
    bits: AtomicU64,
}

impl LockWord {
    pub(crate) const fn new() -> Self {
        Self {
            bits: AtomicU64::new(0),
        }
    }

    pub(crate) fn load(&self) -> Word {
        Word(self.bits.load(Ordering::Acquire))
    }

    /// Take shared access iff there is no exclusive activity at all.
    /// Returns `false` without touching the word otherwise.
    pub(crate) fn try_fast_shared(&self) -> bool {
        let mut old = self.bits.load(Ordering::Relaxed);
        loop {
            if Word(old).exclusive_activity() != 0 {
                return false;
            }
            debug_assert!(Word(old).shared() < u32::MAX, "shared holder count overflow");
            match self.bits.compare_exchange_weak(
                old,
                old + S_ONE,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(cur) => old = cur,
            }
        }
    }

    /// Single CAS from fully free to one confirmed exclusive holder.
    pub(crate) fn try_no_wait_exclusive(&self) -> bool {
        self.bits
            .compare_exchange(0, X_FLAG, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Grant `mode` immediately if the word allows it, otherwise register one
    /// more waiter. Both outcomes are a single CAS, so the decision and the
    /// registration cannot be separated by a release.
    ///
    /// Exclusive requests are only granted against a completely free word;
    /// shared requests only when there is no exclusive activity. A request
    /// therefore never overtakes an already registered waiter.
    pub(crate) fn register_intent(&self, mode: LockMode) -> Admission {
        let mut old = self.bits.load(Ordering::Relaxed);
        loop {
            let w = Word(old);
            let (new, admission) = match mode {
                LockMode::Shared if w.exclusive_activity() == 0 => (old + S_ONE, Admission::Granted),
                LockMode::Exclusive if w == Word::FREE => (X_FLAG, Admission::Granted),
                _ => {
                    debug_assert!(w.waiters() < i32::MAX as u32, "waiter count overflow");
                    (old + Q_ONE, Admission::Queued)
                }
            };
            match self
                .bits
                .compare_exchange_weak(old, new, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return admission,
                Err(cur) => old = cur,
            }
        }
    }

    /// Undo one registration whose waiter gave up. Returns the new word.
    pub(crate) fn withdraw(&self) -> Word {
        let prev = self.bits.fetch_sub(Q_ONE, Ordering::AcqRel);
        debug_assert!(Word(prev).waiters() > 0, "withdraw without a registered waiter");
        Word(prev - Q_ONE)
    }

    /// Convert `count` registered waiters of `mode` into holders.
    ///
    /// Callers must have claimed the waiters and checked [`Word::admits`]
    /// against a word that still carries their registrations; nothing else
    /// can make the grant invalid in between.
    pub(crate) fn grant(&self, mode: LockMode, count: u32) -> Word {
        let delta_q = Q_ONE * u64::from(count);
        let mut old = self.bits.load(Ordering::Relaxed);
        loop {
            let w = Word(old);
            debug_assert!(w.waiters() >= count, "granting unregistered waiters: {w:?}");
            debug_assert!(w.admits(mode), "grant of {mode} against {w:?}");
            let new = match mode {
                LockMode::Shared => old - delta_q + S_ONE * u64::from(count),
                LockMode::Exclusive => {
                    debug_assert_eq!(count, 1);
                    (old - delta_q) | X_FLAG
                }
            };
            match self
                .bits
                .compare_exchange_weak(old, new, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return Word(new),
                Err(cur) => old = cur,
            }
        }
    }

    /// Drop one shared holder. Returns the previous word, or `None` if there
    /// was no shared holder to drop (the word is left unchanged).
    pub(crate) fn release_shared(&self) -> Option<Word> {
        self.bits
            .fetch_update(Ordering::Release, Ordering::Relaxed, |old| {
                (Word(old).shared() > 0).then(|| old - S_ONE)
            })
            .ok()
            .map(Word)
    }

    /// Drop the exclusive holder. Returns the previous word, or `None` if no
    /// exclusive holder was present.
    pub(crate) fn release_exclusive(&self) -> Option<Word> {
        self.bits
            .fetch_update(Ordering::Release, Ordering::Relaxed, |old| {
                Word(old).exclusive().then(|| old & !X_FLAG)
            })
            .ok()
            .map(Word)
    }

    /// Sole shared holder with nobody registered becomes the exclusive holder.
    pub(crate) fn try_upgrade(&self) -> bool {
        self.bits
            .compare_exchange(S_ONE, X_FLAG, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Exclusive holder becomes a shared holder. Returns the previous word, or
    /// `None` if no exclusive holder was present.
    pub(crate) fn downgrade(&self) -> Option<Word> {
        self.bits
            .fetch_update(Ordering::AcqRel, Ordering::Relaxed, |old| {
                let w = Word(old);
                (w.exclusive() && w.shared() == 0).then(|| (old & !X_FLAG) + S_ONE)
            })
            .ok()
            .map(Word)
    }
}
