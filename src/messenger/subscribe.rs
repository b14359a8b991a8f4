//! Subscription management and local triggering.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};

use serde_json::Value;
use tracing::{debug, trace};

use crate::dispatch::{Subscriber, SubscriptionKind};
use crate::identifiers::{ElementRef, SubscriptionId};

use super::core::{Messenger, MessengerInner};

// ============================================================================
// Subscription
// ============================================================================

/// Handle to a registered subscriber.
///
/// Dropping the handle does not unsubscribe; call
/// [`unsubscribe`](Self::unsubscribe) explicitly.
pub struct Subscription {
    id: SubscriptionId,
    kind: SubscriptionKind,
    message_type: String,
    count: usize,
    inner: Weak<MessengerInner>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("message_type", &self.message_type)
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}

impl Subscription {
    /// Returns the subscription id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns whether this is a persistent or one-shot subscription.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> SubscriptionKind {
        self.kind
    }

    /// Returns the subscribed message type.
    #[inline]
    #[must_use]
    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    /// Subscriber count for this type and kind right after registration.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Removes the subscriber.
    ///
    /// Returns `false` if the messenger is gone, the subscriber was already
    /// removed, or a one-shot subscriber already fired.
    pub fn unsubscribe(self) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };

        let removed = inner
            .subscriptions
            .lock()
            .remove(self.kind, &self.message_type, self.id);

        if removed {
            debug!(id = %self.id, message_type = %self.message_type, "Unsubscribed");
        }
        removed
    }
}

// ============================================================================
// Messenger - Subscribe
// ============================================================================

impl Messenger {
    /// Registers a subscriber for every message of `message_type`.
    ///
    /// The subscriber receives the body and, when the sender is one of this
    /// window's direct child frames, the frame's embedding element.
    pub fn on<F>(&self, message_type: impl Into<String>, subscriber: F) -> Subscription
    where
        F: Fn(&Value, Option<&ElementRef>) + Send + Sync + 'static,
    {
        self.subscribe(SubscriptionKind::Persistent, message_type.into(), Arc::new(subscriber))
    }

    /// Registers a subscriber for the next message of `message_type` only.
    pub fn once<F>(&self, message_type: impl Into<String>, subscriber: F) -> Subscription
    where
        F: Fn(&Value, Option<&ElementRef>) + Send + Sync + 'static,
    {
        self.subscribe(SubscriptionKind::Once, message_type.into(), Arc::new(subscriber))
    }

    /// Runs the persistent subscribers for `message_type` locally.
    ///
    /// Nothing is posted or acked, one-shot subscribers are left alone and
    /// the sender element is always `None`. Returns the number of
    /// subscribers invoked.
    pub fn trigger(&self, message_type: &str, body: Value) -> usize {
        let subscribers = self.inner.subscriptions.lock().persistent(message_type);
        trace!(message_type, count = subscribers.len(), "Local trigger");

        for subscriber in &subscribers {
            subscriber(&body, None);
        }
        subscribers.len()
    }

    /// Returns the number of subscribers of one kind for a type.
    #[must_use]
    pub fn subscriber_count(&self, kind: SubscriptionKind, message_type: &str) -> usize {
        self.inner.subscriptions.lock().count(kind, message_type)
    }

    fn subscribe(
        &self,
        kind: SubscriptionKind,
        message_type: String,
        subscriber: Subscriber,
    ) -> Subscription {
        let (id, count) = self
            .inner
            .subscriptions
            .lock()
            .add(kind, &message_type, subscriber);

        debug!(%id, ?kind, %message_type, count, "Subscribed");

        Subscription {
            id,
            kind,
            message_type,
            count,
            inner: Arc::downgrade(&self.inner),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
