//! Shared helpers for messenger tests.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

use crate::delivery::Delivery;
use crate::identifiers::WindowId;
use crate::protocol::{Envelope, MessageEnvelope};
use crate::transport::MemoryHub;

use super::core::Messenger;

/// Installs a test-writer subscriber once; honours `RUST_LOG`.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Builds a default-option messenger for one hub window.
pub(crate) fn messenger_for(hub: &MemoryHub, window: WindowId) -> Messenger {
    Messenger::builder()
        .endpoint(Arc::new(hub.endpoint(window)))
        .build()
        .expect("messenger")
}

/// Completion that forwards the outcome to a oneshot receiver.
pub(crate) fn outcome() -> (
    impl FnOnce(Delivery) + Send + 'static,
    oneshot::Receiver<Delivery>,
) {
    let (tx, rx) = oneshot::channel();
    let on_done = move |delivery| {
        let _ = tx.send(delivery);
    };
    (on_done, rx)
}

/// Message envelopes posted to `window`, in post order. Acks are skipped.
pub(crate) fn messages_to(hub: &MemoryHub, window: WindowId) -> Vec<MessageEnvelope> {
    hub.posts_to(window)
        .into_iter()
        .filter_map(|post| match Envelope::decode(&post.payload) {
            Ok(Envelope::Message(message)) => Some(message),
            _ => None,
        })
        .collect()
}
