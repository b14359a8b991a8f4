//! Frame Relay - Reliable publish/subscribe messaging across frames.
//!
//! This library layers acknowledged, retried delivery on top of a raw,
//! fire-and-forget cross-window primitive (the `postMessage` model).
//!
//! # Architecture
//!
//! Every window in a page tree runs its own [`Messenger`]:
//!
//! - **Outbound**: each message is recorded as pending, posted, and resent by
//!   one shared sweep timer until an `{"ack": id}` comes back or the retry
//!   budget runs out
//! - **Inbound**: each message is acked to its source immediately, then
//!   handed to one-shot and persistent subscribers for its type
//!
//! Key design principles:
//!
//! - Delivery is at-least-once; receivers must tolerate duplicates
//! - Every send completes exactly once with [`Delivery::Delivered`] or
//!   [`Delivery::Failed`]
//! - No lock is held while the transport, a subscriber or a completion runs
//! - Foreign payloads sharing the channel are silently ignored
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use frame_relay::{MemoryHub, Messenger, Result};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let hub = MemoryHub::new();
//!     let top = hub.add_top();
//!     let chat = hub.add_frame(top, "#chat")?;
//!
//!     let page = Messenger::builder().endpoint(Arc::new(hub.endpoint(top))).build()?;
//!     let frame = Messenger::builder().endpoint(Arc::new(hub.endpoint(chat))).build()?;
//!
//!     page.on("ready", |body, sender| {
//!         println!("{body} from {sender:?}");
//!     });
//!
//!     frame.send_to_parent("ready", json!({"version": 1}), |delivery| {
//!         println!("ready: {delivery:?}");
//!     });
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`messenger`] | [`Messenger`], builder and options |
//! | [`delivery`] | Pending pool and [`Delivery`] outcome |
//! | [`dispatch`] | Subscription tables |
//! | [`frames`] | [`FrameQuery`] and [`FrameRegistry`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Wire envelopes |
//! | [`transport`] | [`Transport`] primitive, outbox, in-memory hub |

// ============================================================================
// Modules
// ============================================================================

/// Pending message bookkeeping.
pub mod delivery;

/// Subscriber tables.
pub mod dispatch;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Frame topology and discovery.
pub mod frames;

/// Type-safe identifiers for windows, messages and subscriptions.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// The messenger facade.
///
/// Use [`Messenger::builder()`] to create a configured instance.
pub mod messenger;

/// Wire envelope types.
pub mod protocol;

/// Transport primitive and in-process implementation.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Messenger types
pub use messenger::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_SWEEP_INTERVAL, Messenger, MessengerBuilder, MessengerOptions,
    Subscription,
};

// Delivery and dispatch types
pub use delivery::Delivery;
pub use dispatch::SubscriptionKind;

// Error types
pub use error::{Error, Result};

// Frame types
pub use frames::{ClientWindow, FrameQuery, FrameRegistry};

// Identifier types
pub use identifiers::{ElementRef, ListenerId, MessageId, SubscriptionId, WindowId};

// Protocol types
pub use protocol::{AckEnvelope, Envelope, MessageEnvelope};

// Transport types
pub use transport::{InboundEvent, InboundHandler, MemoryEndpoint, MemoryHub, PostRecord, Transport};
