//! Frame discovery.
//!
//! [`FrameRegistry`] snapshots the directly embedded child frames once, at
//! construction, and walks the whole window tree on demand for broadcasts.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::identifiers::{ElementRef, WindowId};

// ============================================================================
// FrameQuery
// ============================================================================

/// Provider of frame topology for the current window.
///
/// Implemented by whatever owns the document (a DOM binding, a test
/// harness, [`MemoryEndpoint`](crate::transport::MemoryEndpoint)).
pub trait FrameQuery: Send + Sync {
    /// Returns the parent window, or `None` when there is no parent context.
    fn parent_window(&self) -> Option<WindowId>;

    /// Returns the top-level window of the tree.
    fn top_window(&self) -> WindowId;

    /// Lists the current document's direct child frames in document order.
    fn child_frames(&self) -> Vec<ClientWindow>;

    /// Lists the direct child frames of any window in the tree.
    fn frames_of(&self, window: WindowId) -> Vec<WindowId>;

    /// Returns `true` if the window still resolves to a live context.
    fn is_live(&self, _window: WindowId) -> bool {
        true
    }
}

// ============================================================================
// ClientWindow
// ============================================================================

/// A direct child frame discovered at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientWindow {
    /// Window handle of the frame's content.
    pub window: WindowId,
    /// Element embedding the frame.
    pub element: ElementRef,
}

impl ClientWindow {
    /// Creates a client window record.
    #[inline]
    #[must_use]
    pub fn new(window: WindowId, element: impl Into<ElementRef>) -> Self {
        Self {
            window,
            element: element.into(),
        }
    }
}

// ============================================================================
// FrameRegistry
// ============================================================================

/// Snapshot of the child frames plus access to the live tree.
pub struct FrameRegistry {
    query: Arc<dyn FrameQuery>,
    clients: Vec<ClientWindow>,
}

impl fmt::Debug for FrameRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameRegistry")
            .field("clients", &self.clients)
            .finish_non_exhaustive()
    }
}

impl FrameRegistry {
    /// Discovers the direct child frames once.
    ///
    /// The result is not refreshed; frames added later are treated as
    /// unknown senders.
    pub fn discover(query: Arc<dyn FrameQuery>) -> Self {
        let clients = query.child_frames();
        debug!(count = clients.len(), "Discovered child frames");
        Self { query, clients }
    }

    /// Returns the child frames in document order.
    #[inline]
    #[must_use]
    pub fn clients(&self) -> &[ClientWindow] {
        &self.clients
    }

    /// Returns the embedding element of a known child frame.
    #[must_use]
    pub fn element_for(&self, window: WindowId) -> Option<&ElementRef> {
        self.clients
            .iter()
            .find(|client| client.window == window)
            .map(|client| &client.element)
    }

    /// Returns the parent window, if any.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<WindowId> {
        self.query.parent_window()
    }

    /// Returns `true` if the window still resolves to a live context.
    #[inline]
    #[must_use]
    pub fn is_live(&self, window: WindowId) -> bool {
        self.query.is_live(window)
    }

    /// Walks every frame reachable from the top window.
    ///
    /// Frames are listed depth-first in pre-order (each frame before its own
    /// descendants); the top window comes last.
    #[must_use]
    pub fn all_frames_in_tree(&self) -> Vec<WindowId> {
        let top = self.query.top_window();
        let mut visited = FxHashSet::default();
        visited.insert(top);

        let mut frames = Vec::new();
        self.collect_frames(top, &mut visited, &mut frames);
        frames.push(top);
        frames
    }

    fn collect_frames(
        &self,
        window: WindowId,
        visited: &mut FxHashSet<WindowId>,
        frames: &mut Vec<WindowId>,
    ) {
        for frame in self.query.frames_of(window) {
            // Guards providers that report cycles.
            if !visited.insert(frame) {
                continue;
            }
            frames.push(frame);
            self.collect_frames(frame, visited, frames);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use rustc_hash::FxHashMap;

    /// Static tree: 1 -> [2, 3], 2 -> [4], current window is 1.
    struct StaticTree {
        children: FxHashMap<u64, Vec<u64>>,
        dead: Vec<u64>,
    }

    impl StaticTree {
        fn new() -> Self {
            let mut children = FxHashMap::default();
            children.insert(1, vec![2, 3]);
            children.insert(2, vec![4]);
            Self {
                children,
                dead: Vec::new(),
            }
        }
    }

    impl FrameQuery for StaticTree {
        fn parent_window(&self) -> Option<WindowId> {
            None
        }

        fn top_window(&self) -> WindowId {
            WindowId::new(1)
        }

        fn child_frames(&self) -> Vec<ClientWindow> {
            vec![
                ClientWindow::new(WindowId::new(2), "#left"),
                ClientWindow::new(WindowId::new(3), "#right"),
            ]
        }

        fn frames_of(&self, window: WindowId) -> Vec<WindowId> {
            self.children
                .get(&window.as_u64())
                .map(|ids| ids.iter().copied().map(WindowId::new).collect())
                .unwrap_or_default()
        }

        fn is_live(&self, window: WindowId) -> bool {
            !self.dead.contains(&window.as_u64())
        }
    }

    fn ids(raw: &[u64]) -> Vec<WindowId> {
        raw.iter().copied().map(WindowId::new).collect()
    }

    #[test]
    fn test_discover_keeps_document_order() {
        let registry = FrameRegistry::discover(Arc::new(StaticTree::new()));
        let windows: Vec<_> = registry.clients().iter().map(|c| c.window).collect();
        assert_eq!(windows, ids(&[2, 3]));
    }

    #[test]
    fn test_element_for() {
        let registry = FrameRegistry::discover(Arc::new(StaticTree::new()));
        assert_eq!(
            registry.element_for(WindowId::new(3)),
            Some(&ElementRef::from("#right"))
        );
        assert_eq!(registry.element_for(WindowId::new(4)), None);
    }

    #[test]
    fn test_all_frames_in_tree_is_preorder_with_top_last() {
        let registry = FrameRegistry::discover(Arc::new(StaticTree::new()));
        assert_eq!(registry.all_frames_in_tree(), ids(&[2, 4, 3, 1]));
    }

    #[test]
    fn test_all_frames_in_tree_survives_cycles() {
        let mut tree = StaticTree::new();
        tree.children.insert(4, vec![1, 2]);
        let registry = FrameRegistry::discover(Arc::new(tree));
        assert_eq!(registry.all_frames_in_tree(), ids(&[2, 4, 3, 1]));
    }

    #[test]
    fn test_empty_document() {
        struct Lonely;

        impl FrameQuery for Lonely {
            fn parent_window(&self) -> Option<WindowId> {
                None
            }
            fn top_window(&self) -> WindowId {
                WindowId::new(1)
            }
            fn child_frames(&self) -> Vec<ClientWindow> {
                Vec::new()
            }
            fn frames_of(&self, _window: WindowId) -> Vec<WindowId> {
                Vec::new()
            }
        }

        let registry = FrameRegistry::discover(Arc::new(Lonely));
        assert!(registry.clients().is_empty());
        assert_eq!(registry.all_frames_in_tree(), ids(&[1]));
        assert!(registry.is_live(WindowId::new(99)));
    }

    #[test]
    fn test_is_live_delegates() {
        let mut tree = StaticTree::new();
        tree.dead.push(3);
        let registry = FrameRegistry::discover(Arc::new(tree));
        assert!(registry.is_live(WindowId::new(2)));
        assert!(!registry.is_live(WindowId::new(3)));
    }
}
