//! Core messenger struct, construction and teardown.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::delivery::{Delivery, PendingPool};
use crate::dispatch::SubscriptionTable;
use crate::error::Result;
use crate::frames::{ClientWindow, FrameQuery, FrameRegistry};
use crate::identifiers::{ListenerId, MessageIdGenerator};
use crate::transport::{Outbox, Transport};

use super::builder::MessengerBuilder;
use super::options::MessengerOptions;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for a messenger.
///
/// The inbound listener and the sweep task only hold weak references, so
/// dropping the [`Messenger`] releases everything.
pub(crate) struct MessengerInner {
    /// Retry settings.
    pub options: MessengerOptions,
    /// Raw primitive, kept for listener teardown.
    pub transport: Arc<dyn Transport>,
    /// Token of the inbound listener this messenger installed.
    pub listener: Mutex<Option<ListenerId>>,
    /// Child frame snapshot.
    pub registry: Arc<FrameRegistry>,
    /// Serializing sender.
    pub outbox: Outbox,
    /// Messages awaiting ack.
    pub pending: Mutex<PendingPool>,
    /// Subscribers by message type.
    pub subscriptions: Mutex<SubscriptionTable>,
    /// The single debounced sweep timer.
    pub sweep_task: Mutex<Option<JoinHandle<()>>>,
    /// Message id source.
    pub ids: MessageIdGenerator,
    /// Runtime the sweep timer is spawned on.
    pub runtime: Handle,
    /// Set once by `close`.
    pub closed: AtomicBool,
}

impl MessengerInner {
    #[inline]
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Messenger
// ============================================================================

/// Reliable publish/subscribe messaging for one window.
///
/// Construction discovers the window's child frames and starts listening
/// for inbound payloads right away. Outbound messages are retried on a shared
/// timer until acked or until the retry budget runs out.
///
/// # Example
///
/// ```ignore
/// let messenger = Messenger::builder().endpoint(endpoint).build()?;
///
/// messenger.on("greet", |body, sender| {
///     println!("{body} from {sender:?}");
/// });
///
/// messenger.broadcast("greet", json!("hello"), |delivery| {
///     println!("broadcast: {delivery:?}");
/// });
/// ```
pub struct Messenger {
    pub(crate) inner: Arc<MessengerInner>,
}

impl fmt::Debug for Messenger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Messenger")
            .field("options", &self.inner.options)
            .field("clients", &self.inner.registry.clients().len())
            .field("pending", &self.pending_count())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Messenger - Constructor
// ============================================================================

impl Messenger {
    /// Creates a builder.
    #[inline]
    #[must_use]
    pub fn builder() -> MessengerBuilder {
        MessengerBuilder::new()
    }

    /// Creates a messenger with default options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if called outside a
    /// tokio runtime.
    pub fn new(transport: Arc<dyn Transport>, frames: Arc<dyn FrameQuery>) -> Result<Self> {
        MessengerBuilder::new()
            .transport(transport)
            .frames(frames)
            .build()
    }

    /// Discovers frames, wires the inbound listener and returns the handle.
    pub(crate) fn start(
        options: MessengerOptions,
        transport: Arc<dyn Transport>,
        frames: Arc<dyn FrameQuery>,
        runtime: Handle,
    ) -> Self {
        let registry = Arc::new(FrameRegistry::discover(frames));
        let outbox = Outbox::new(Arc::clone(&transport), Arc::clone(&registry));

        let inner = Arc::new(MessengerInner {
            options,
            transport: Arc::clone(&transport),
            listener: Mutex::new(None),
            registry,
            outbox,
            pending: Mutex::new(PendingPool::new()),
            subscriptions: Mutex::new(SubscriptionTable::new()),
            sweep_task: Mutex::new(None),
            ids: MessageIdGenerator::new(),
            runtime,
            closed: AtomicBool::new(false),
        });

        let weak = Arc::downgrade(&inner);
        let listener = transport.set_listener(Box::new(move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_inbound(event);
            }
        }));
        *inner.listener.lock() = Some(listener);

        info!(
            clients = inner.registry.clients().len(),
            parent = ?inner.registry.parent(),
            "Messenger started"
        );

        Self { inner }
    }
}

// ============================================================================
// Messenger - Accessors
// ============================================================================

impl Messenger {
    /// Returns the retry settings.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &MessengerOptions {
        &self.inner.options
    }

    /// Returns the child frames discovered at construction.
    #[inline]
    #[must_use]
    pub fn client_windows(&self) -> &[ClientWindow] {
        self.inner.registry.clients()
    }

    /// Returns the number of messages awaiting ack.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// Returns `true` once [`close`](Self::close) has run.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

// ============================================================================
// Messenger - Lifecycle
// ============================================================================

impl Messenger {
    /// Detaches from the transport and fails everything still pending.
    ///
    /// This is called automatically on drop. Later sends complete with
    /// [`Delivery::Failed`] without touching the transport.
    pub fn close(&self) {
        let drained = {
            let mut pending = self.inner.pending.lock();
            if self.inner.closed.swap(true, Ordering::SeqCst) {
                return;
            }
            pending.drain()
        };

        // Only our own listener; a newer messenger on the same window keeps its.
        let listener = self.inner.listener.lock().take();
        if let Some(listener) = listener {
            self.inner.transport.clear_listener(listener);
        }

        if let Some(task) = self.inner.sweep_task.lock().take() {
            task.abort();
        }

        let count = drained.len();
        for entry in drained {
            entry.settle(Delivery::Failed);
        }

        if count > 0 {
            debug!(count, "Failed pending messages on close");
        }
        info!("Messenger closed");
    }
}

impl Drop for Messenger {
    fn drop(&mut self) {
        self.close();
    }
}

// ============================================================================
// Tests
// ============================================================================
