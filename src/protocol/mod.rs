//! Wire protocol message types.
//!
//! This module defines the payload format exchanged between windows.
//!
//! # Protocol Overview
//!
//! | Envelope | Direction | Purpose |
//! |----------|-----------|---------|
//! | `Message` | Sender → Receiver | Typed notification, retried until acked |
//! | `Ack` | Receiver → Sender | Confirms receipt of one message id |
//!
//! Payloads are always JSON strings; the transport primitive never sees
//! structured values.

// ============================================================================
// Submodules
// ============================================================================

/// Message and ack envelopes.
pub mod envelope;

// ============================================================================
// Re-exports
// ============================================================================

pub use envelope::{AckEnvelope, Envelope, MessageEnvelope};
