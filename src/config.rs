// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors

use std::time::Duration;

/// Timeout used by [`ResourceLock::read`](crate::ResourceLock::read) and
/// [`ResourceLock::write`](crate::ResourceLock::write).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration for a [`ResourceLock`](crate::ResourceLock).
#[derive(Clone, Debug)]
pub struct LockConfig {
    /// Diagnostic name shown in errors, logs and `Debug` output
    /// (e.g. `"row-lock:accounts:7"`).
    pub name: String,
    /// Timeout for the `read()` / `write()` guard helpers.
    pub default_timeout: Duration,
    /// Retry the fast path with a bounded backoff before parking.
    pub spin: bool,
}

impl LockConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            default_timeout: DEFAULT_TIMEOUT,
            spin: true,
        }
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self::new("anonymous")
    }
}
