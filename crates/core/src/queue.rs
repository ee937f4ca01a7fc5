//! Interactive input queue shared between the UI and the agent loop.
//!
//! The UI pushes raw user strings; the loop pops them FIFO when it goes idle.
//! Waiting is a genuine suspend/resume on a [`Notify`]: `push` stores a
//! permit, so a push that lands before the loop starts waiting is not lost.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct InteractiveQueue {
    items: Mutex<VecDeque<String>>,
    notify: Notify,
    closed: AtomicBool,
}

impl InteractiveQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an input and wake the loop if it is idle.
    pub fn push(&self, input: impl Into<String>) {
        self.lock().push_back(input.into());
        self.notify.notify_one();
    }

    /// Pop the earliest input, if any.
    pub fn pop(&self) -> Option<String> {
        self.lock().pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Mark the end of input. Already queued entries are still delivered.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Wait until an input is available and pop it.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub async fn next(&self) -> Option<String> {
        loop {
            if let Some(input) = self.pop() {
                return Some(input);
            }
            if self.is_closed() {
                return None;
            }
            self.notify.notified().await;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<String>> {
        // A poisoned queue still holds valid strings.
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }
}
