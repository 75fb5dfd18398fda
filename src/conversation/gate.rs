//! Single-flight generation gate and its overflow queue.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Admits at most one generation at a time.
///
/// Cloning shares the same slot. A session swaps in a fresh gate on reset,
/// so a stale in-flight call keeps only the old, orphaned permit.
#[derive(Debug, Clone)]
pub struct GenerationGate {
    slot: Arc<Semaphore>,
}

/// Held for the duration of one generation. Dropping it reopens the gate.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl Default for GenerationGate {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationGate {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Semaphore::new(1)),
        }
    }

    /// Take the slot if it is free. Never waits.
    pub fn try_enter(&self) -> Option<GatePermit> {
        Arc::clone(&self.slot)
            .try_acquire_owned()
            .ok()
            .map(|permit| GatePermit { _permit: permit })
    }

    /// Wait for the slot. `None` once the gate has been retired.
    pub async fn enter(&self) -> Option<GatePermit> {
        Arc::clone(&self.slot)
            .acquire_owned()
            .await
            .ok()
            .map(|permit| GatePermit { _permit: permit })
    }

    pub fn is_busy(&self) -> bool {
        self.slot.available_permits() == 0
    }

    /// Wake every waiter with `None`; used when the session is reset.
    pub fn retire(&self) {
        self.slot.close();
    }
}

/// A driving-party fragment waiting for the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFragment {
    pub text: String,
    pub speaker: Option<String>,
}

/// Fragments accepted while a turn is open or a generation is in flight.
#[derive(Debug, Default)]
pub struct PendingQueue {
    fragments: VecDeque<PendingFragment>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: &str, speaker: Option<&str>) {
        self.fragments.push_back(PendingFragment {
            text: text.trim().to_string(),
            speaker: speaker.map(str::to_string),
        });
    }

    /// Remove everything and join it into one utterance.
    ///
    /// Returns `None` when nothing non-blank was queued.
    pub fn drain_merged(&mut self) -> Option<String> {
        let mut merged = String::new();
        for fragment in self.fragments.drain(..) {
            append_fragment(&mut merged, &fragment.text);
        }
        (!merged.is_empty()).then_some(merged)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn clear(&mut self) -> usize {
        let dropped = self.fragments.len();
        self.fragments.clear();
        dropped
    }
}

/// Join speech fragments with a single space, skipping blanks.
pub fn append_fragment(base: &mut String, next: &str) {
    let next = next.trim();
    if next.is_empty() {
        return;
    }
    if !base.is_empty() {
        base.push(' ');
    }
    base.push_str(next);
}
