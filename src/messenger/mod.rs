//! Reliable cross-frame messenger.
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | [`Messenger`] struct, construction, close |
//! | `builder` | [`MessengerBuilder`] |
//! | `options` | [`MessengerOptions`] and defaults |
//! | `send` | Broadcast / parent / children / window sends |
//! | `subscribe` | `on`, `once`, `trigger`, [`Subscription`] |
//! | `inbound` | Decode, ack, dispatch |
//! | `sweep` | Shared debounced retry timer |

// ============================================================================
// Submodules
// ============================================================================

/// Builder pattern for messenger configuration.
pub mod builder;

/// Core messenger types.
pub mod core;

/// Retry configuration.
pub mod options;

/// Subscription handles.
pub mod subscribe;

mod inbound;
mod send;
mod sweep;

#[cfg(test)]
pub(crate) mod test_support;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::MessengerBuilder;
pub use core::Messenger;
pub use options::{DEFAULT_MAX_ATTEMPTS, DEFAULT_SWEEP_INTERVAL, MessengerOptions};
pub use subscribe::Subscription;
