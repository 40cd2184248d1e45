// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Deadline-bounded thread suspension for wait nodes.
// Built on std thread parking: an unpark that races ahead of the park is
// remembered by the thread's park token, so a wake can never be lost.

use std::thread;
use std::time::Instant;

use crate::wait_node::WaitNode;

/// How a parked wait ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Wakeup {
    /// A releaser granted the request and woke the node.
    Woken,
    /// The deadline passed first; the node is marked dead.
    TimedOut,
}

/// Block the calling thread (the node's owner) until the node is woken or
/// `deadline` passes. `None` waits without a deadline.
///
/// Spurious returns from the park are absorbed by re-checking the wake flag.
/// If the deadline passes after a releaser has claimed the node, the grant
/// is already committed, so the wait continues until the wake arrives.
pub(crate) fn park_until(node: &WaitNode, deadline: Option<Instant>) -> Wakeup {
    debug_assert_eq!(node.owner().id(), thread::current().id());
    let mut deadline = deadline;
    loop {
        if node.is_awake() {
            return Wakeup::Woken;
        }
        match deadline {
            None => thread::park(),
            Some(at) => {
                let now = Instant::now();
                if now >= at {
                    if node.time_out() {
                        return Wakeup::TimedOut;
                    }
                    deadline = None;
                    continue;
                }
                thread::park_timeout(at - now);
            }
        }
    }
}

/// Mark a claimed node awake and resume its owner. A timed-out node is left
/// alone.
pub(crate) fn wake(node: &WaitNode) {
    if node.is_timed_out() {
        return;
    }
    node.set_awake();
    node.owner().unpark();
}
