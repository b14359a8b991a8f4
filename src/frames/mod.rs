//! Frame topology.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`FrameQuery`] | Provider of the window tree (external collaborator) |
//! | [`ClientWindow`] | A direct child frame and its embedding element |
//! | [`FrameRegistry`] | Startup snapshot of child frames + tree walk |

// ============================================================================
// Submodules
// ============================================================================

/// Child frame snapshot and whole-tree discovery.
pub mod registry;

// ============================================================================
// Re-exports
// ============================================================================

pub use registry::{ClientWindow, FrameQuery, FrameRegistry};
