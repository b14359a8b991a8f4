//! Subscription tables.
//!
//! Persistent and one-shot subscribers live in two independent maps keyed
//! by message type. Each subscriber carries a [`SubscriptionId`] so it can be
//! removed without relying on its position.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::identifiers::{ElementRef, SubscriptionId};

// ============================================================================
// Types
// ============================================================================

/// Subscriber callback.
///
/// Receives the message body and the embedding element of the sender when the
/// sender is a known child frame.
pub type Subscriber = Arc<dyn Fn(&Value, Option<&ElementRef>) + Send + Sync>;

/// Which table a subscription lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionKind {
    /// Fires on every matching message.
    Persistent,
    /// Fires on the next matching message only.
    Once,
}

type Entries = FxHashMap<String, Vec<(SubscriptionId, Subscriber)>>;

// ============================================================================
// SubscriptionTable
// ============================================================================

/// Persistent and one-shot subscribers by message type.
#[derive(Default)]
pub struct SubscriptionTable {
    persistent: Entries,
    once: Entries,
    next_id: u64,
}

impl fmt::Debug for SubscriptionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts = |entries: &Entries| -> Vec<(String, usize)> {
            entries.iter().map(|(k, v)| (k.clone(), v.len())).collect()
        };
        f.debug_struct("SubscriptionTable")
            .field("persistent", &counts(&self.persistent))
            .field("once", &counts(&self.once))
            .finish()
    }
}

impl SubscriptionTable {
    /// Creates empty tables.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber in the given table.
    ///
    /// Returns the new subscription's id and the subscriber count for the
    /// type after registration.
    pub fn add(
        &mut self,
        kind: SubscriptionKind,
        message_type: &str,
        subscriber: Subscriber,
    ) -> (SubscriptionId, usize) {
        self.next_id += 1;
        let id = SubscriptionId::new(self.next_id);

        let list = self
            .entries_mut(kind)
            .entry(message_type.to_string())
            .or_default();
        list.push((id, subscriber));

        (id, list.len())
    }

    /// Registers a persistent subscriber.
    #[inline]
    pub fn on(&mut self, message_type: &str, subscriber: Subscriber) -> (SubscriptionId, usize) {
        self.add(SubscriptionKind::Persistent, message_type, subscriber)
    }

    /// Registers a one-shot subscriber.
    #[inline]
    pub fn once(&mut self, message_type: &str, subscriber: Subscriber) -> (SubscriptionId, usize) {
        self.add(SubscriptionKind::Once, message_type, subscriber)
    }

    /// Removes and returns every one-shot subscriber for a type.
    pub fn take_once(&mut self, message_type: &str) -> Vec<Subscriber> {
        self.once
            .remove(message_type)
            .map(|list| list.into_iter().map(|(_, subscriber)| subscriber).collect())
            .unwrap_or_default()
    }

    /// Returns the persistent subscribers for a type, in registration order.
    #[must_use]
    pub fn persistent(&self, message_type: &str) -> Vec<Subscriber> {
        self.persistent
            .get(message_type)
            .map(|list| list.iter().map(|(_, s)| Arc::clone(s)).collect())
            .unwrap_or_default()
    }

    /// Removes one subscriber.
    ///
    /// Returns `false` if it was already removed (or, for one-shot
    /// subscribers, already fired).
    pub fn remove(&mut self, kind: SubscriptionKind, message_type: &str, id: SubscriptionId) -> bool {
        let entries = self.entries_mut(kind);
        let Some(list) = entries.get_mut(message_type) else {
            return false;
        };

        let before = list.len();
        list.retain(|(existing, _)| *existing != id);
        let removed = list.len() != before;

        if list.is_empty() {
            entries.remove(message_type);
        }
        removed
    }

    /// Returns the number of subscribers for a type in one table.
    #[must_use]
    pub fn count(&self, kind: SubscriptionKind, message_type: &str) -> usize {
        self.entries(kind).get(message_type).map_or(0, Vec::len)
    }

    fn entries(&self, kind: SubscriptionKind) -> &Entries {
        match kind {
            SubscriptionKind::Persistent => &self.persistent,
            SubscriptionKind::Once => &self.once,
        }
    }

    fn entries_mut(&mut self, kind: SubscriptionKind) -> &mut Entries {
        match kind {
            SubscriptionKind::Persistent => &mut self.persistent,
            SubscriptionKind::Once => &mut self.once,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
