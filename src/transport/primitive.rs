//! Cross-window send/receive primitive.
//!
//! The primitive is fire-and-forget: a successful [`Transport::post`] only
//! means the payload was handed off, not that anyone received it.

// ============================================================================
// Imports
// ============================================================================

use crate::error::Result;
use crate::identifiers::{ListenerId, WindowId};

// ============================================================================
// Types
// ============================================================================

/// A raw payload received from another window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Serialized envelope as posted by the sender.
    pub payload: String,
    /// Window that posted the payload.
    pub source: WindowId,
}

impl InboundEvent {
    /// Creates an inbound event.
    #[inline]
    #[must_use]
    pub fn new(payload: impl Into<String>, source: WindowId) -> Self {
        Self {
            payload: payload.into(),
            source,
        }
    }
}

/// Inbound handler callback type.
///
/// Called once for each payload posted to the current window.
pub type InboundHandler = Box<dyn Fn(InboundEvent) + Send + Sync>;

// ============================================================================
// Transport
// ============================================================================

/// The raw string transport between window contexts.
pub trait Transport: Send + Sync {
    /// Posts a payload to one window.
    ///
    /// # Errors
    ///
    /// Implementations return [`Error::WindowClosed`](crate::Error::WindowClosed)
    /// or [`Error::Transport`](crate::Error::Transport) when the hand-off fails.
    fn post(&self, target: WindowId, payload: &str) -> Result<()>;

    /// Installs the handler for payloads posted to the current window.
    ///
    /// Replaces any previously installed handler. The returned token
    /// identifies this installation.
    fn set_listener(&self, handler: InboundHandler) -> ListenerId;

    /// Removes the handler installed under `listener`.
    ///
    /// A stale token (its handler was already replaced) leaves the current
    /// handler in place.
    fn clear_listener(&self, listener: ListenerId);
}
