//! Publish/subscribe dispatch tables.
//!
//! The inbound pipeline itself lives on [`Messenger`](crate::Messenger); this
//! module only holds who is listening for what.

// ============================================================================
// Submodules
// ============================================================================

/// Persistent and one-shot subscription tables.
pub mod table;

// ============================================================================
// Re-exports
// ============================================================================

pub use table::{Subscriber, SubscriptionKind, SubscriptionTable};
