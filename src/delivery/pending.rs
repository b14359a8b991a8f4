//! Pending message pool.
//!
//! Tracks outbound messages awaiting an ack. The pool is plain data: the
//! messenger owns the shared sweep timer and performs the resends and
//! completions a [`Sweep`] asks for, outside the pool's lock.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use rustc_hash::FxHashMap;
use tracing::{trace, warn};

use crate::identifiers::{MessageId, WindowId};
use crate::protocol::MessageEnvelope;

// ============================================================================
// Delivery
// ============================================================================

/// Final outcome of one send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delivery {
    /// A matching ack arrived.
    Delivered,
    /// The retry budget ran out, or the messenger closed first.
    Failed,
}

impl Delivery {
    /// Returns `true` for [`Delivery::Delivered`].
    #[inline]
    #[must_use]
    pub fn is_delivered(self) -> bool {
        self == Self::Delivered
    }
}

impl From<Delivery> for bool {
    fn from(delivery: Delivery) -> Self {
        delivery.is_delivered()
    }
}

/// Completion callback, fired exactly once per pending entry.
pub type Completion = Box<dyn FnOnce(Delivery) + Send>;

// ============================================================================
// PendingEntry
// ============================================================================

/// One message awaiting its ack.
pub struct PendingEntry {
    /// The envelope as it is (re)sent; `attempt` grows with each sweep.
    pub message: MessageEnvelope,
    /// Original target; `None` means the whole frame tree.
    pub target: Option<WindowId>,
    completion: Completion,
}

impl fmt::Debug for PendingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingEntry")
            .field("message", &self.message)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl PendingEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(message: MessageEnvelope, target: Option<WindowId>, completion: Completion) -> Self {
        Self {
            message,
            target,
            completion,
        }
    }

    /// Consumes the entry and reports the outcome.
    pub fn complete(self, delivery: Delivery) {
        (self.completion)(delivery);
    }

    /// Like [`complete`](Self::complete), but a panicking completion is
    /// caught and logged.
    ///
    /// Returns `false` if the completion panicked.
    pub fn settle(self, delivery: Delivery) -> bool {
        let id = self.message.id;
        let completion = self.completion;

        if catch_unwind(AssertUnwindSafe(move || completion(delivery))).is_err() {
            warn!(%id, ?delivery, "Completion panicked");
            return false;
        }
        true
    }
}

// ============================================================================
// Sweep
// ============================================================================

/// Work produced by one sweep tick.
#[derive(Debug, Default)]
pub struct Sweep {
    /// Messages to post again, with their original targets.
    pub resend: Vec<(MessageEnvelope, Option<WindowId>)>,
    /// Entries removed for exceeding the retry budget.
    pub exhausted: Vec<PendingEntry>,
}

impl Sweep {
    /// Returns `true` if the tick produced no work.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resend.is_empty() && self.exhausted.is_empty()
    }
}

// ============================================================================
// PendingPool
// ============================================================================

/// Outbound messages keyed by id.
#[derive(Debug, Default)]
pub struct PendingPool {
    entries: FxHashMap<MessageId, PendingEntry>,
}

impl PendingPool {
    /// Creates an empty pool.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new outbound message.
    ///
    /// An entry already stored under the same id is displaced and returned;
    /// callers should treat that as a bug in id generation.
    pub fn record(
        &mut self,
        message: MessageEnvelope,
        target: Option<WindowId>,
        completion: Completion,
    ) -> Option<PendingEntry> {
        let id = message.id;
        let displaced = self
            .entries
            .insert(id, PendingEntry::new(message, target, completion));

        if displaced.is_some() {
            warn!(%id, "Pending entry displaced by duplicate id");
        }
        displaced
    }

    /// Removes the entry matching an ack.
    ///
    /// Returns `None` for unknown ids (already resolved or exhausted).
    pub fn resolve(&mut self, id: MessageId) -> Option<PendingEntry> {
        self.entries.remove(&id)
    }

    /// Runs one sweep tick.
    ///
    /// The ids present at the start of the tick are snapshotted and visited
    /// in ascending order. Each visited entry's `attempt` grows by one; an
    /// entry whose attempt then exceeds `max_attempts` is removed and
    /// returned as exhausted, every other one is returned for resend.
    pub fn sweep(&mut self, max_attempts: u32) -> Sweep {
        let mut ids: Vec<MessageId> = self.entries.keys().copied().collect();
        ids.sort_unstable();

        let mut sweep = Sweep::default();

        for id in ids {
            let Some(entry) = self.entries.get_mut(&id) else {
                continue;
            };

            entry.message.attempt += 1;

            if entry.message.attempt > max_attempts {
                if let Some(entry) = self.entries.remove(&id) {
                    sweep.exhausted.push(entry);
                }
            } else {
                trace!(%id, attempt = entry.message.attempt, "Scheduling resend");
                sweep.resend.push((entry.message.clone(), entry.target));
            }
        }

        sweep
    }

    /// Returns the current attempt counter of an entry.
    #[inline]
    #[must_use]
    pub fn attempt(&self, id: MessageId) -> Option<u32> {
        self.entries.get(&id).map(|entry| entry.message.attempt)
    }

    /// Returns `true` if the id is pending.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: MessageId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Returns the number of pending entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is pending.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes and returns every entry.
    pub fn drain(&mut self) -> Vec<PendingEntry> {
        self.entries.drain().map(|(_, entry)| entry).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde_json::json;

    type Outcomes = Arc<Mutex<Vec<(u64, Delivery)>>>;

    fn recorder(outcomes: &Outcomes, id: u64) -> Completion {
        let outcomes = Arc::clone(outcomes);
        Box::new(move |delivery| outcomes.lock().push((id, delivery)))
    }

    fn message(id: u64) -> MessageEnvelope {
        MessageEnvelope::new(MessageId::new(id), "ping", json!(null))
    }

    #[test]
    fn test_resolve_removes_exactly_once() {
        let outcomes = Outcomes::default();
        let mut pool = PendingPool::new();
        pool.record(message(1), None, recorder(&outcomes, 1));

        let entry = pool.resolve(MessageId::new(1)).expect("pending");
        entry.complete(Delivery::Delivered);

        assert!(pool.resolve(MessageId::new(1)).is_none());
        assert!(pool.is_empty());
        assert_eq!(*outcomes.lock(), vec![(1, Delivery::Delivered)]);
    }

    #[test]
    fn test_record_starts_at_attempt_zero() {
        let outcomes = Outcomes::default();
        let mut pool = PendingPool::new();
        pool.record(message(1), Some(WindowId::new(2)), recorder(&outcomes, 1));
        assert_eq!(pool.attempt(MessageId::new(1)), Some(0));
    }

    #[test]
    fn test_sweep_increments_and_resends() {
        let outcomes = Outcomes::default();
        let mut pool = PendingPool::new();
        pool.record(message(1), Some(WindowId::new(2)), recorder(&outcomes, 1));

        let sweep = pool.sweep(20);
        assert!(sweep.exhausted.is_empty());
        assert_eq!(sweep.resend.len(), 1);
        assert_eq!(sweep.resend[0].0.attempt, 1);
        assert_eq!(sweep.resend[0].1, Some(WindowId::new(2)));
        assert_eq!(pool.attempt(MessageId::new(1)), Some(1));
    }

    #[test]
    fn test_exhaustion_after_max_attempts() {
        let outcomes = Outcomes::default();
        let mut pool = PendingPool::new();
        pool.record(message(1), None, recorder(&outcomes, 1));

        let mut resends = 0;
        for _ in 0..20 {
            let sweep = pool.sweep(20);
            assert!(sweep.exhausted.is_empty());
            resends += sweep.resend.len();
        }
        assert_eq!(resends, 20);
        assert_eq!(pool.attempt(MessageId::new(1)), Some(20));

        let sweep = pool.sweep(20);
        assert!(sweep.resend.is_empty());
        assert_eq!(sweep.exhausted.len(), 1);
        for entry in sweep.exhausted {
            entry.complete(Delivery::Failed);
        }

        assert!(pool.is_empty());
        assert!(pool.sweep(20).is_empty());
        assert_eq!(*outcomes.lock(), vec![(1, Delivery::Failed)]);
    }

    #[test]
    fn test_independent_entries() {
        let outcomes = Outcomes::default();
        let mut pool = PendingPool::new();
        pool.record(message(1), Some(WindowId::new(2)), recorder(&outcomes, 1));
        pool.record(message(2), Some(WindowId::new(3)), recorder(&outcomes, 2));

        pool.sweep(20);
        pool.sweep(20);
        pool.resolve(MessageId::new(1))
            .expect("pending")
            .complete(Delivery::Delivered);
        let sweep = pool.sweep(20);

        assert_eq!(sweep.resend.len(), 1);
        assert_eq!(sweep.resend[0].0.id, MessageId::new(2));
        assert_eq!(pool.attempt(MessageId::new(2)), Some(3));
        assert!(!pool.contains(MessageId::new(1)));
        assert_eq!(*outcomes.lock(), vec![(1, Delivery::Delivered)]);
    }

    #[test]
    fn test_sweep_visits_ids_in_ascending_order() {
        let outcomes = Outcomes::default();
        let mut pool = PendingPool::new();
        for id in [5, 1, 3] {
            pool.record(message(id), None, recorder(&outcomes, id));
        }

        let order: Vec<_> = pool
            .sweep(20)
            .resend
            .into_iter()
            .map(|(message, _)| message.id.as_u64())
            .collect();
        assert_eq!(order, vec![1, 3, 5]);
    }

    #[test]
    fn test_duplicate_id_displaces() {
        let outcomes = Outcomes::default();
        let mut pool = PendingPool::new();
        assert!(pool.record(message(1), None, recorder(&outcomes, 1)).is_none());
        assert!(pool.record(message(1), None, recorder(&outcomes, 1)).is_some());
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_drain() {
        let outcomes = Outcomes::default();
        let mut pool = PendingPool::new();
        pool.record(message(1), None, recorder(&outcomes, 1));
        pool.record(message(2), None, recorder(&outcomes, 2));

        let drained = pool.drain();
        assert_eq!(drained.len(), 2);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_settle_contains_panicking_completion() {
        let outcomes = Outcomes::default();
        let mut pool = PendingPool::new();
        pool.record(message(1), None, Box::new(|_: Delivery| panic!("completion failure")));
        pool.record(message(2), None, recorder(&outcomes, 2));

        let settled: Vec<bool> = pool
            .sweep(0)
            .exhausted
            .into_iter()
            .map(|entry| entry.settle(Delivery::Failed))
            .collect();

        assert_eq!(settled, vec![false, true]);
        assert_eq!(*outcomes.lock(), vec![(2, Delivery::Failed)]);
    }

    #[test]
    fn test_delivery_into_bool() {
        assert!(bool::from(Delivery::Delivered));
        assert!(!bool::from(Delivery::Failed));
    }
}
