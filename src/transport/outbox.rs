//! Outbound envelope posting.
//!
//! [`Outbox`] serializes an envelope once and hands the string to the
//! transport, either for a single target or for every live window in the
//! tree. Post failures are logged and swallowed: the retry sweep, not the
//! caller, deals with lost payloads.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::frames::FrameRegistry;
use crate::identifiers::WindowId;
use crate::protocol::Envelope;

use super::Transport;

// ============================================================================
// Outbox
// ============================================================================

/// Serializes envelopes and posts them through the transport.
pub struct Outbox {
    transport: Arc<dyn Transport>,
    registry: Arc<FrameRegistry>,
}

impl fmt::Debug for Outbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outbox")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Outbox {
    /// Creates an outbox over a transport and frame registry.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, registry: Arc<FrameRegistry>) -> Self {
        Self {
            transport,
            registry,
        }
    }

    /// Posts an envelope.
    ///
    /// With `target = None` the envelope goes to every live window of the
    /// whole tree, the top window included. Returns the number of windows
    /// the payload was handed to.
    pub fn post(&self, envelope: &Envelope, target: Option<WindowId>) -> usize {
        let payload = match envelope.encode() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(id = %envelope.id(), error = %e, "Failed to encode envelope");
                return 0;
            }
        };

        match target {
            Some(window) => usize::from(self.post_one(window, &payload)),
            None => self
                .registry
                .all_frames_in_tree()
                .into_iter()
                .filter(|&window| self.registry.is_live(window))
                .filter(|&window| self.post_one(window, &payload))
                .count(),
        }
    }

    /// Posts one payload; returns `true` on hand-off.
    fn post_one(&self, window: WindowId, payload: &str) -> bool {
        match self.transport.post(window, payload) {
            Ok(()) => {
                trace!(%window, payload, "Posted payload");
                true
            }
            Err(e) => {
                debug!(%window, error = %e, "Post failed");
                false
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;
    use serde_json::json;

    use crate::error::{Error, Result};
    use crate::frames::{ClientWindow, FrameQuery};
    use crate::identifiers::{ListenerId, MessageId};
    use crate::protocol::MessageEnvelope;
    use crate::transport::InboundHandler;

    /// Records posts; window 3 refuses them.
    #[derive(Default)]
    struct RecordingTransport {
        posts: Mutex<Vec<(WindowId, String)>>,
    }

    impl Transport for RecordingTransport {
        fn post(&self, target: WindowId, payload: &str) -> Result<()> {
            if target == WindowId::new(3) {
                return Err(Error::window_closed(target));
            }
            self.posts.lock().push((target, payload.to_string()));
            Ok(())
        }

        fn set_listener(&self, _handler: InboundHandler) -> ListenerId {
            ListenerId::new(1)
        }

        fn clear_listener(&self, _listener: ListenerId) {}
    }

    /// Tree 1 -> [2, 3, 4], 4 is dead.
    struct Tree;

    impl FrameQuery for Tree {
        fn parent_window(&self) -> Option<WindowId> {
            None
        }

        fn top_window(&self) -> WindowId {
            WindowId::new(1)
        }

        fn child_frames(&self) -> Vec<ClientWindow> {
            Vec::new()
        }

        fn frames_of(&self, window: WindowId) -> Vec<WindowId> {
            if window == WindowId::new(1) {
                vec![WindowId::new(2), WindowId::new(3), WindowId::new(4)]
            } else {
                Vec::new()
            }
        }

        fn is_live(&self, window: WindowId) -> bool {
            window != WindowId::new(4)
        }
    }

    fn outbox() -> (Outbox, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        let registry = Arc::new(FrameRegistry::discover(Arc::new(Tree)));
        (Outbox::new(transport.clone(), registry), transport)
    }

    #[test]
    fn test_post_to_target_serializes() {
        let (outbox, transport) = outbox();
        let posted = outbox.post(&Envelope::ack(MessageId::new(9)), Some(WindowId::new(2)));

        assert_eq!(posted, 1);
        assert_eq!(
            *transport.posts.lock(),
            vec![(WindowId::new(2), r#"{"ack":9}"#.to_string())]
        );
    }

    #[test]
    fn test_broadcast_skips_dead_and_swallows_failures() {
        let (outbox, transport) = outbox();
        let message = MessageEnvelope::new(MessageId::new(1), "greet", json!("hi"));
        let posted = outbox.post(&message.into(), None);

        // 2 and the top succeed, 3 refuses, 4 is dead.
        assert_eq!(posted, 2);
        let targets: Vec<_> = transport.posts.lock().iter().map(|(w, _)| *w).collect();
        assert_eq!(targets, vec![WindowId::new(2), WindowId::new(1)]);
    }

    #[test]
    fn test_post_failure_is_not_reported() {
        let (outbox, transport) = outbox();
        let posted = outbox.post(&Envelope::ack(MessageId::new(1)), Some(WindowId::new(3)));
        assert_eq!(posted, 0);
        assert!(transport.posts.lock().is_empty());
    }
}
