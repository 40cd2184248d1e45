// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Timeout-aware shared/exclusive lock for storage-engine resources.
// Packed atomic lock word on the fast path; FIFO wait queue, thread parking
// and batched reader wake-ups on the slow path.

mod lock_word;
mod park_gate;
mod wait_list;

mod wait_node;
pub use wait_node::LockMode;

mod config;
pub use config::{LockConfig, DEFAULT_TIMEOUT};

mod error;
pub use error::LockTimeout;

mod stats;
pub use stats::{LockState, LockStats};

mod guard;
pub use guard::{ExclusiveGuard, SharedGuard};

mod resource_lock;
pub use resource_lock::ResourceLock;
