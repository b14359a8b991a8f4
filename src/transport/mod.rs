//! Transport layer.
//!
//! This module wraps the raw, fire-and-forget cross-window primitive.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Messenger (A)  │      post(target, string)    │  Messenger (B)  │
//! │                 │─────────────────────────────►│                 │
//! │  Outbox         │                              │  Inbound        │
//! │  → Transport    │◄─────────────────────────────│  dispatcher     │
//! │                 │        {"ack": id}           │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `primitive` | [`Transport`] trait and inbound event types |
//! | `outbox` | Envelope serialization and targeted / tree-wide posting |
//! | `memory` | In-process window tree for tests and loopback use |

// ============================================================================
// Submodules
// ============================================================================

/// In-process window tree.
pub mod memory;

/// Envelope serialization and posting.
pub mod outbox;

/// Raw send/receive primitive.
pub mod primitive;

// ============================================================================
// Re-exports
// ============================================================================

pub use memory::{MemoryEndpoint, MemoryHub, PostRecord};
pub use outbox::Outbox;
pub use primitive::{InboundEvent, InboundHandler, Transport};
