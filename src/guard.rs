// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// RAII guards over a ResourceLock: the matching release runs on drop.

use std::fmt;
use std::mem;

use crate::ResourceLock;

/// Shared access to a [`ResourceLock`], released on drop.
#[must_use = "dropping the guard releases the lock immediately"]
pub struct SharedGuard<'a> {
    lock: &'a ResourceLock,
}

impl<'a> SharedGuard<'a> {
    pub(crate) fn new(lock: &'a ResourceLock) -> Self {
        Self { lock }
    }

    pub fn lock(&self) -> &'a ResourceLock {
        self.lock
    }

    /// Try to become the exclusive holder. Gives the shared guard back if
    /// other readers are present or anyone is queued.
    pub fn try_upgrade(self) -> Result<ExclusiveGuard<'a>, Self> {
        if self.lock.try_upgrade() {
            let lock = self.lock;
            mem::forget(self);
            Ok(ExclusiveGuard::new(lock))
        } else {
            Err(self)
        }
    }
}

impl Drop for SharedGuard<'_> {
    fn drop(&mut self) {
        self.lock.release_shared();
    }
}

impl fmt::Debug for SharedGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedGuard").field("lock", &self.lock.name()).finish()
    }
}

/// Exclusive access to a [`ResourceLock`], released on drop.
#[must_use = "dropping the guard releases the lock immediately"]
pub struct ExclusiveGuard<'a> {
    lock: &'a ResourceLock,
}

impl<'a> ExclusiveGuard<'a> {
    pub(crate) fn new(lock: &'a ResourceLock) -> Self {
        Self { lock }
    }

    pub fn lock(&self) -> &'a ResourceLock {
        self.lock
    }

    /// Keep read access while letting queued readers in.
    pub fn downgrade(self) -> SharedGuard<'a> {
        self.lock.downgrade();
        let lock = self.lock;
        mem::forget(self);
        SharedGuard::new(lock)
    }
}

impl Drop for ExclusiveGuard<'_> {
    fn drop(&mut self) {
        self.lock.release_exclusive();
    }
}

impl fmt::Debug for ExclusiveGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExclusiveGuard").field("lock", &self.lock.name()).finish()
    }
}
