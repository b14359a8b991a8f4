//! Shared retry timer.
//!
//! One sweep task exists per messenger. Every send (acks included) aborts the
//! scheduled task and spawns a fresh one, so the sweep fires one interval
//! after the most recent outbound activity. A sweep resends each pending
//! message to its original target, which in turn schedules the next sweep.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tokio::time::sleep;
use tracing::{trace, warn};

use crate::delivery::{Delivery, Sweep};
use crate::identifiers::WindowId;
use crate::protocol::Envelope;

use super::core::MessengerInner;

// ============================================================================
// MessengerInner - Send + Schedule
// ============================================================================

impl MessengerInner {
    /// Posts an envelope and restarts the sweep countdown.
    pub(crate) fn send(self: &Arc<Self>, envelope: &Envelope, target: Option<WindowId>) {
        let posted = self.outbox.post(envelope, target);
        trace!(id = %envelope.id(), ?target, posted, "Envelope sent");
        self.schedule_sweep();
    }

    /// Replaces the scheduled sweep with one firing a full interval from now.
    pub(crate) fn schedule_sweep(self: &Arc<Self>) {
        if self.is_closed() {
            return;
        }

        let weak = Arc::downgrade(self);
        let interval = self.options.sweep_interval;

        let task = self.runtime.spawn(async move {
            sleep(interval).await;
            if let Some(inner) = weak.upgrade() {
                inner.run_sweep();
            }
        });

        // Aborting the running sweep from inside itself is harmless: the
        // sweep body never yields, so the task finishes first.
        if let Some(previous) = self.sweep_task.lock().replace(task) {
            previous.abort();
        }
    }

    /// Executes one sweep tick.
    ///
    /// Resends and the next schedule go out before any completion runs, so
    /// a misbehaving completion cannot stall the remaining entries.
    pub(crate) fn run_sweep(self: &Arc<Self>) {
        let Sweep { resend, exhausted } = self.pending.lock().sweep(self.options.max_attempts);

        if !resend.is_empty() {
            for (message, target) in resend {
                let envelope = Envelope::Message(message);
                let posted = self.outbox.post(&envelope, target);
                trace!(id = %envelope.id(), ?target, posted, "Envelope resent");
            }
            self.schedule_sweep();
        }

        for entry in exhausted {
            warn!(
                id = %entry.message.id,
                message_type = %entry.message.message_type,
                target = ?entry.target,
                attempts = entry.message.attempt,
                "Delivery failed, retry budget exhausted"
            );
            entry.settle(Delivery::Failed);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use serde_json::json;
    use tokio::time::sleep;

    use crate::delivery::Delivery;
    use crate::messenger::test_support::{init_tracing, messages_to, messenger_for, outcome};
    use crate::transport::MemoryHub;

    #[tokio::test(start_paused = true)]
    async fn test_unacked_message_fails_after_max_attempts() {
        init_tracing();
        let hub = MemoryHub::new();
        let top = hub.add_top();
        let silent = hub.add_frame(top, "#silent").expect("frame");
        let messenger = messenger_for(&hub, top);

        let failures = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&failures);
        let id = messenger.send_to_window("ping", json!("x"), silent, move |delivery| {
            assert_eq!(delivery, Delivery::Failed);
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sleep(Duration::from_secs(10)).await;

        let attempts: Vec<u32> = messages_to(&hub, silent)
            .into_iter()
            .inspect(|message| assert_eq!(message.id, id))
            .map(|message| message.attempt)
            .collect();
        assert_eq!(attempts, (0..=20).collect::<Vec<_>>());
        assert_eq!(failures.load(Ordering::SeqCst), 1);
        assert_eq!(messenger.pending_count(), 0);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(messages_to(&hub, silent).len(), 21);
        assert_eq!(failures.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_takes_interval_times_attempts() {
        let hub = MemoryHub::new();
        let top = hub.add_top();
        let silent = hub.add_frame(top, "#silent").expect("frame");
        let messenger = messenger_for(&hub, top);

        let started = tokio::time::Instant::now();
        let (on_done, rx) = outcome();
        messenger.send_to_window("ping", json!(null), silent, on_done);

        assert_eq!(rx.await.expect("outcome"), Delivery::Failed);
        let worst_case = messenger.options().max_delivery_time();
        let elapsed = started.elapsed();
        assert!(elapsed >= worst_case, "failed early: {elapsed:?}");
        assert!(elapsed < worst_case + messenger.options().sweep_interval);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_messages_share_one_schedule() {
        let hub = MemoryHub::new();
        let top = hub.add_top();
        let left = hub.add_frame(top, "#left").expect("frame");
        let right = hub.add_frame(top, "#right").expect("frame");
        let messenger = messenger_for(&hub, top);

        messenger.send_to_window("ping", json!(1), left, |_| {});
        sleep(Duration::from_millis(100)).await;
        messenger.send_to_window("ping", json!(2), right, |_| {});

        // The second send restarted the countdown: nothing resent at 250 ms.
        sleep(Duration::from_millis(200)).await;
        assert_eq!(messages_to(&hub, left).len(), 1);

        // One sweep at 350 ms resends both.
        sleep(Duration::from_millis(100)).await;
        assert_eq!(messages_to(&hub, left).len(), 2);
        assert_eq!(messages_to(&hub, right).len(), 2);
        assert_eq!(messenger.pending_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_listener_receives_resend_and_acks() {
        init_tracing();
        let hub = MemoryHub::new();
        let top = hub.add_top();
        let late = hub.add_frame(top, "#late").expect("frame");
        let messenger = messenger_for(&hub, top);

        let (on_done, rx) = outcome();
        messenger.send_to_window("hello", json!("again"), late, on_done);

        sleep(Duration::from_millis(600)).await;
        let receiver = messenger_for(&hub, late);
        let bodies = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = Arc::clone(&bodies);
        receiver.on("hello", move |body, _| sink.lock().push(body.clone()));

        assert_eq!(rx.await.expect("outcome"), Delivery::Delivered);
        assert_eq!(*bodies.lock(), vec![json!("again")]);
        assert_eq!(messenger.pending_count(), 0);

        let sent = messages_to(&hub, late).len();
        sleep(Duration::from_secs(5)).await;
        assert_eq!(messages_to(&hub, late).len(), sent);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_retry_budget() {
        let hub = MemoryHub::new();
        let top = hub.add_top();
        let silent = hub.add_frame(top, "#silent").expect("frame");
        let messenger = crate::Messenger::builder()
            .endpoint(Arc::new(hub.endpoint(top)))
            .sweep_interval(Duration::from_millis(10))
            .max_attempts(2)
            .build()
            .expect("messenger");

        let (on_done, rx) = outcome();
        messenger.send_to_window("ping", json!(null), silent, on_done);
        assert_eq!(rx.await.expect("outcome"), Delivery::Failed);
        assert_eq!(messages_to(&hub, silent).len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_completion_does_not_stall_sweep() {
        let hub = MemoryHub::new();
        let top = hub.add_top();
        let silent = hub.add_frame(top, "#silent").expect("frame");
        let messenger = crate::Messenger::builder()
            .endpoint(Arc::new(hub.endpoint(top)))
            .sweep_interval(Duration::from_millis(10))
            .max_attempts(2)
            .build()
            .expect("messenger");

        messenger.send_to_window("first", json!(null), silent, |_| panic!("completion failure"));
        sleep(Duration::from_millis(15)).await;

        // One sweep behind the first message.
        let (on_done, rx) = outcome();
        let later = messenger.send_to_window("later", json!(null), silent, on_done);

        assert_eq!(rx.await.expect("outcome"), Delivery::Failed);
        let attempts: Vec<u32> = messages_to(&hub, silent)
            .into_iter()
            .filter(|message| message.id == later)
            .map(|message| message.attempt)
            .collect();
        assert_eq!(attempts, vec![0, 1, 2]);
        assert_eq!(messenger.pending_count(), 0);
    }
}
