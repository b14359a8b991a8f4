//! Inbound pipeline.
//!
//! Every payload delivered by the transport goes through
//! [`MessengerInner::handle_inbound`]:
//!
//! | Payload | Action |
//! |---------|--------|
//! | not an envelope | dropped |
//! | `{"ack": id}` | resolves the pending entry, unknown ids ignored |
//! | message | ack to source, then one-shot, then persistent subscribers |
//!
//! Repeated deliveries of the same message are dispatched again; receivers
//! are expected to be idempotent.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing::{debug, trace};

use crate::delivery::Delivery;
use crate::identifiers::{MessageId, WindowId};
use crate::protocol::{Envelope, MessageEnvelope};
use crate::transport::InboundEvent;

use super::core::MessengerInner;

// ============================================================================
// MessengerInner - Inbound
// ============================================================================

impl MessengerInner {
    /// Entry point for the transport listener.
    pub(crate) fn handle_inbound(self: &Arc<Self>, event: InboundEvent) {
        if self.is_closed() {
            return;
        }

        let envelope = match Envelope::decode(&event.payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                trace!(source = %event.source, error = %e, "Ignoring foreign payload");
                return;
            }
        };

        match envelope {
            Envelope::Ack(ack) => self.resolve(ack.ack),
            Envelope::Message(message) => self.dispatch(message, event.source),
        }
    }

    /// Completes the pending entry for an acked id.
    fn resolve(&self, id: MessageId) {
        let entry = self.pending.lock().resolve(id);

        match entry {
            Some(entry) => {
                debug!(%id, attempts = entry.message.attempt, "Message acked");
                entry.complete(Delivery::Delivered);
            }
            None => trace!(%id, "Ack for unknown or settled message"),
        }
    }

    /// Acks a message and hands it to the subscribers.
    fn dispatch(self: &Arc<Self>, message: MessageEnvelope, source: WindowId) {
        let sender = self.registry.element_for(source).cloned();

        trace!(
            id = %message.id,
            message_type = %message.message_type,
            attempt = message.attempt,
            %source,
            "Message received"
        );

        self.send(&Envelope::ack(message.id), Some(source));

        let once = self.subscriptions.lock().take_once(&message.message_type);
        for subscriber in &once {
            subscriber(&message.body, sender.as_ref());
        }

        let persistent = self.subscriptions.lock().persistent(&message.message_type);
        for subscriber in &persistent {
            subscriber(&message.body, sender.as_ref());
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
