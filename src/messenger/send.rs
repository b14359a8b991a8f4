//! Outbound send operations.
//!
//! Every operation records the message as pending before posting it, so an
//! ack can never outrun its entry. Completion callbacks run exactly once with
//! [`Delivery::Delivered`] or [`Delivery::Failed`].

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::delivery::{Completion, Delivery};
use crate::identifiers::{MessageId, WindowId};
use crate::protocol::{Envelope, MessageEnvelope};

use super::core::{Messenger, MessengerInner};

// ============================================================================
// Messenger - Send Operations
// ============================================================================

impl Messenger {
    /// Sends a message to every live window in the whole frame tree.
    ///
    /// The tree includes the top window, and therefore possibly this
    /// window itself. The first ack from any recipient resolves the send.
    pub fn broadcast<F>(&self, message_type: impl Into<String>, body: Value, on_done: F) -> MessageId
    where
        F: FnOnce(Delivery) + Send + 'static,
    {
        self.inner
            .send_tracked(message_type.into(), body, None, Box::new(on_done))
    }

    /// Sends a message to the parent window.
    ///
    /// Returns `None`, without invoking `on_done`, when there is no parent
    /// context.
    pub fn send_to_parent<F>(
        &self,
        message_type: impl Into<String>,
        body: Value,
        on_done: F,
    ) -> Option<MessageId>
    where
        F: FnOnce(Delivery) + Send + 'static,
    {
        let Some(parent) = self.inner.registry.parent() else {
            debug!("No parent context, send skipped");
            return None;
        };

        Some(
            self.inner
                .send_tracked(message_type.into(), body, Some(parent), Box::new(on_done)),
        )
    }

    /// Sends one independent message to each child frame found at
    /// construction.
    ///
    /// Each child gets its own id and pending entry; `on_done` runs once per
    /// child.
    pub fn send_to_children<F>(
        &self,
        message_type: impl Into<String>,
        body: Value,
        on_done: F,
    ) -> Vec<MessageId>
    where
        F: Fn(Delivery) + Send + Sync + 'static,
    {
        let message_type = message_type.into();
        let on_done = Arc::new(on_done);

        self.inner
            .registry
            .clients()
            .iter()
            .map(|client| {
                let on_done = Arc::clone(&on_done);
                self.inner.send_tracked(
                    message_type.clone(),
                    body.clone(),
                    Some(client.window),
                    Box::new(move |delivery| on_done(delivery)),
                )
            })
            .collect()
    }

    /// Sends a message to one explicit window.
    pub fn send_to_window<F>(
        &self,
        message_type: impl Into<String>,
        body: Value,
        target: WindowId,
        on_done: F,
    ) -> MessageId
    where
        F: FnOnce(Delivery) + Send + 'static,
    {
        self.inner
            .send_tracked(message_type.into(), body, Some(target), Box::new(on_done))
    }
}

// ============================================================================
// MessengerInner - Tracked Send
// ============================================================================

impl MessengerInner {
    /// Records a fresh message as pending and posts it.
    pub(crate) fn send_tracked(
        self: &Arc<Self>,
        message_type: String,
        body: Value,
        target: Option<WindowId>,
        completion: Completion,
    ) -> MessageId {
        let id = self.ids.next_id();
        let message = MessageEnvelope::new(id, message_type, body);
        let envelope = Envelope::Message(message.clone());

        let displaced = {
            let mut pending = self.pending.lock();
            if self.is_closed() {
                drop(pending);
                warn!(%id, message_type = %message.message_type, "Send after close");
                completion(Delivery::Failed);
                return id;
            }
            pending.record(message, target, completion)
        };

        if let Some(displaced) = displaced {
            displaced.complete(Delivery::Failed);
        }

        debug!(%id, ?target, "Message pending");
        self.send(&envelope, target);
        id
    }
}

// ============================================================================
// Tests
// ============================================================================
