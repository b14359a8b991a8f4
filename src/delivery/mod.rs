//! Reliable delivery bookkeeping.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`PendingPool`] | Messages awaiting ack, keyed by id |
//! | [`Sweep`] | Resends and exhausted entries produced by one tick |
//! | [`Delivery`] | Outcome reported to the sender's completion |

// ============================================================================
// Submodules
// ============================================================================

/// Pending pool and sweep bookkeeping.
pub mod pending;

// ============================================================================
// Re-exports
// ============================================================================

pub use pending::{Completion, Delivery, PendingEntry, PendingPool, Sweep};
