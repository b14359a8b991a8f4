//! Type-safe identifiers for windows, messages and subscriptions.
//!
//! Newtype wrappers prevent mixing a window handle with a message id at
//! compile time.
//!
//! | Type | Wraps | Purpose |
//! |------|-------|---------|
//! | [`WindowId`] | `u64` | A window context (page or frame) |
//! | [`MessageId`] | `u64` | One outstanding message awaiting ack |
//! | [`SubscriptionId`] | `u64` | One registered subscriber |
//! | [`ListenerId`] | `u64` | One installed inbound listener |
//! | [`ElementRef`] | `Arc<str>` | Embedding element of a child frame |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// ============================================================================
// WindowId
// ============================================================================

/// Handle to a window context reachable through the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(u64);

impl WindowId {
    /// Creates a window ID from a raw handle value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw handle value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window-{}", self.0)
    }
}

// ============================================================================
// MessageId
// ============================================================================

/// Identifier of one message envelope.
///
/// Serialized as a bare JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    /// Creates a message ID from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-instance monotonic source of [`MessageId`]s.
///
/// Ids start at 1 and never repeat for the lifetime of the generator.
#[derive(Debug)]
pub struct MessageIdGenerator {
    next: AtomicU64,
}

impl MessageIdGenerator {
    /// Creates a generator whose first id is 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Returns the next unused id.
    #[inline]
    pub fn next_id(&self) -> MessageId {
        MessageId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for MessageIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SubscriptionId
// ============================================================================

/// Stable identifier of one registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Creates a subscription ID from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

// ============================================================================
// ListenerId
// ============================================================================

/// Token for one installed inbound listener.
///
/// Returned by [`Transport::set_listener`](crate::Transport::set_listener)
/// and required to remove that listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Creates a listener ID from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

// ============================================================================
// ElementRef
// ============================================================================

/// Opaque reference to the element that embeds a child frame.
///
/// The frame query provider decides what the string means (a selector, a
/// DOM node key, ...). Cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(Arc<str>);

impl ElementRef {
    /// Creates an element reference.
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self(value.into())
    }

    /// Returns the reference as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ElementRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ElementRef {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_is_monotonic_from_one() {
        let ids = MessageIdGenerator::new();
        assert_eq!(ids.next_id(), MessageId::new(1));
        assert_eq!(ids.next_id(), MessageId::new(2));
        assert_eq!(ids.next_id(), MessageId::new(3));
    }

    #[test]
    fn test_generators_are_independent() {
        let a = MessageIdGenerator::new();
        let b = MessageIdGenerator::new();
        a.next_id();
        assert_eq!(b.next_id(), MessageId::new(1));
    }

    #[test]
    fn test_message_id_serializes_as_number() {
        let json = serde_json::to_string(&MessageId::new(42)).expect("serialize");
        assert_eq!(json, "42");
    }

    #[test]
    fn test_display() {
        assert_eq!(WindowId::new(3).to_string(), "window-3");
        assert_eq!(SubscriptionId::new(9).to_string(), "sub-9");
        assert_eq!(ListenerId::new(2).to_string(), "listener-2");
        assert_eq!(ElementRef::from("#chat").to_string(), "#chat");
    }
}
