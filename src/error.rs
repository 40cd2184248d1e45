// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// The one recoverable failure of a resource lock.

use std::time::Duration;

use thiserror::Error;

use crate::LockMode;

/// The deadline elapsed before the requested mode could be granted.
///
/// The lock is left as if the call had never been made. Callers may retry
/// with a fresh timeout or abort the surrounding operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("timed out after {timeout:?} waiting for {mode} access to lock `{lock}`")]
pub struct LockTimeout {
    mode: LockMode,
    lock: String,
    timeout: Duration,
}

impl LockTimeout {
    pub(crate) fn new(mode: LockMode, lock: &str, timeout: Duration) -> Self {
        Self {
            mode,
            lock: lock.to_owned(),
            timeout,
        }
    }

    /// The mode that was requested.
    pub fn mode(&self) -> LockMode {
        self.mode
    }

    /// Name of the lock that timed out.
    pub fn lock_name(&self) -> &str {
        &self.lock
    }

    /// The timeout the caller supplied.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
