// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Arrival-ordered queue of blocked threads.
// Wake policy: a live exclusive node at the head wakes alone; otherwise the
// run of shared nodes starting at the head wakes together. Timed-out nodes of
// either kind are spliced out wherever the scan meets them and never woken.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::lock_word::Word;
use crate::wait_node::WaitNode;
use crate::LockMode;

/// Nodes detached from the queue for one wake-up.
///
/// Every node is already claimed and linked to the next through its
/// successor slot, so waking `head` propagates through the whole batch.
pub(crate) struct Batch {
    head: Arc<WaitNode>,
    tail: Arc<WaitNode>,
    mode: LockMode,
    len: u32,
}

impl Batch {
    fn start(node: Arc<WaitNode>) -> Self {
        Self {
            mode: node.mode(),
            tail: Arc::clone(&node),
            head: node,
            len: 1,
        }
    }

    fn append(&mut self, node: Arc<WaitNode>) {
        self.tail.link_successor(Arc::clone(&node));
        self.tail = node;
        self.len += 1;
    }

    pub(crate) fn head(&self) -> &Arc<WaitNode> {
        &self.head
    }

    pub(crate) fn mode(&self) -> LockMode {
        self.mode
    }

    pub(crate) fn len(&self) -> u32 {
        self.len
    }
}

/// FIFO of waiters. Always accessed under the owning lock's queue mutex.
pub(crate) struct WaitList {
    queue: VecDeque<Arc<WaitNode>>,
}

impl WaitList {
    pub(crate) const fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    pub(crate) fn push(&mut self, node: Arc<WaitNode>) {
        self.queue.push_back(node);
    }

    /// Queued nodes, including dead ones not yet spliced out.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    /// Splice a specific node out, wherever it sits.
    pub(crate) fn remove(&mut self, node: &Arc<WaitNode>) -> bool {
        match self.queue.iter().position(|n| Arc::ptr_eq(n, node)) {
            Some(idx) => {
                self.queue.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Detach and claim the next compatible batch that `word` lets in.
    ///
    /// Returns `None` when the queue is empty (after dropping dead nodes) or
    /// when its head cannot be granted against `word` yet.
    pub(crate) fn pop_compatible_batch(&mut self, word: Word) -> Option<Batch> {
        let mut batch: Option<Batch> = None;
        while let Some(front) = self.queue.front() {
            if front.is_timed_out() {
                self.queue.pop_front();
                continue;
            }
            let mode = front.mode();
            let fits = match &batch {
                None => word.admits(mode),
                Some(b) => b.mode() == LockMode::Shared && mode == LockMode::Shared,
            };
            if !fits {
                break;
            }
            let Some(node) = self.queue.pop_front() else {
                break;
            };
            // Lost the race against the owner's timeout: the node is dead.
            if !node.claim() {
                continue;
            }
            match &mut batch {
                None => batch = Some(Batch::start(node)),
                Some(b) => b.append(node),
            }
            if mode == LockMode::Exclusive {
                break;
            }
        }
        batch
    }
}
