//! In-process window tree.
//!
//! [`MemoryHub`] simulates a page with nested frames. Every window gets an
//! inbox drained by its own pump task, so posts are asynchronous and keep
//! per-sender order, like `postMessage`. A [`MemoryEndpoint`] is one window's
//! view of the hub and implements both [`Transport`] and [`FrameQuery`].
//!
//! # Example
//!
//! ```ignore
//! let hub = MemoryHub::new();
//! let top = hub.add_top();
//! let chat = hub.add_frame(top, "#chat")?;
//!
//! let page = Messenger::builder().endpoint(Arc::new(hub.endpoint(top))).build()?;
//! let frame = Messenger::builder().endpoint(Arc::new(hub.endpoint(chat))).build()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::frames::{ClientWindow, FrameQuery};
use crate::identifiers::{ElementRef, ListenerId, WindowId};

use super::{InboundEvent, InboundHandler, Transport};

// ============================================================================
// Types
// ============================================================================

/// Shared listener, cloned out of the lock before invocation.
type Listener = Arc<dyn Fn(InboundEvent) + Send + Sync>;

/// One successful hand-off through the hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    /// Posting window.
    pub from: WindowId,
    /// Receiving window.
    pub to: WindowId,
    /// Serialized payload.
    pub payload: String,
}

struct WindowNode {
    parent: Option<WindowId>,
    children: Vec<WindowId>,
    element: Option<ElementRef>,
    open: bool,
    listener: Option<(ListenerId, Listener)>,
    inbox: mpsc::UnboundedSender<InboundEvent>,
}

#[derive(Default)]
struct HubState {
    windows: FxHashMap<WindowId, WindowNode>,
    next_window: u64,
    next_listener: u64,
    posts: Vec<PostRecord>,
}

// ============================================================================
// MemoryHub
// ============================================================================

/// An in-process tree of windows connected by asynchronous inboxes.
///
/// Cloning yields another handle to the same tree.
#[derive(Clone, Default)]
pub struct MemoryHub {
    state: Arc<Mutex<HubState>>,
}

impl fmt::Debug for MemoryHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemoryHub")
            .field("windows", &state.windows.len())
            .field("posts", &state.posts.len())
            .finish()
    }
}

impl MemoryHub {
    /// Creates an empty hub.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a top-level window.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime (the inbox pump is spawned).
    pub fn add_top(&self) -> WindowId {
        self.insert_window(None, None)
    }

    /// Adds a frame embedded in `parent` by `element`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FrameNotFound`] if `parent` is unknown.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime (the inbox pump is spawned).
    pub fn add_frame(&self, parent: WindowId, element: impl Into<ElementRef>) -> Result<WindowId> {
        if !self.state.lock().windows.contains_key(&parent) {
            return Err(Error::frame_not_found(parent));
        }
        Ok(self.insert_window(Some(parent), Some(element.into())))
    }

    /// Closes a window and all of its descendants.
    ///
    /// Closed windows stay in the tree but refuse posts and drop queued
    /// payloads. Returns `false` if the window was unknown or already closed.
    pub fn close(&self, window: WindowId) -> bool {
        let mut state = self.state.lock();
        let mut stack = vec![window];
        let mut closed_any = false;

        while let Some(id) = stack.pop() {
            if let Some(node) = state.windows.get_mut(&id) {
                closed_any |= node.open;
                node.open = false;
                node.listener = None;
                stack.extend(node.children.iter().copied());
            }
        }

        if closed_any {
            debug!(%window, "Window closed");
        }
        closed_any
    }

    /// Returns `true` if the window exists and is open.
    #[must_use]
    pub fn is_open(&self, window: WindowId) -> bool {
        self.state
            .lock()
            .windows
            .get(&window)
            .is_some_and(|node| node.open)
    }

    /// Returns the endpoint of one window.
    #[inline]
    #[must_use]
    pub fn endpoint(&self, window: WindowId) -> MemoryEndpoint {
        MemoryEndpoint {
            hub: self.clone(),
            window,
        }
    }

    /// Returns every successful post so far, in hand-off order.
    #[must_use]
    pub fn posts(&self) -> Vec<PostRecord> {
        self.state.lock().posts.clone()
    }

    /// Returns the posts received by one window.
    #[must_use]
    pub fn posts_to(&self, window: WindowId) -> Vec<PostRecord> {
        self.state
            .lock()
            .posts
            .iter()
            .filter(|record| record.to == window)
            .cloned()
            .collect()
    }

    /// Forgets the post log.
    pub fn clear_posts(&self) {
        self.state.lock().posts.clear();
    }
}

// ============================================================================
// MemoryHub - Internal
// ============================================================================

impl MemoryHub {
    fn insert_window(&self, parent: Option<WindowId>, element: Option<ElementRef>) -> WindowId {
        let (inbox, receiver) = mpsc::unbounded_channel();

        let window = {
            let mut state = self.state.lock();
            state.next_window += 1;
            let window = WindowId::new(state.next_window);

            state.windows.insert(
                window,
                WindowNode {
                    parent,
                    children: Vec::new(),
                    element,
                    open: true,
                    listener: None,
                    inbox,
                },
            );

            if let Some(parent) = parent
                && let Some(node) = state.windows.get_mut(&parent)
            {
                node.children.push(window);
            }

            window
        };

        tokio::spawn(Self::run_pump(Arc::downgrade(&self.state), window, receiver));

        debug!(%window, ?parent, "Window added");
        window
    }

    /// Hands a payload to the target's inbox.
    fn deliver(&self, from: WindowId, to: WindowId, payload: &str) -> Result<()> {
        let mut state = self.state.lock();

        let node = state
            .windows
            .get(&to)
            .filter(|node| node.open)
            .ok_or_else(|| Error::window_closed(to))?;

        node.inbox
            .send(InboundEvent::new(payload, from))
            .map_err(|_| Error::window_closed(to))?;

        state.posts.push(PostRecord {
            from,
            to,
            payload: payload.to_string(),
        });

        Ok(())
    }

    /// Drains one window's inbox into its current listener.
    async fn run_pump(
        state: Weak<Mutex<HubState>>,
        window: WindowId,
        mut receiver: mpsc::UnboundedReceiver<InboundEvent>,
    ) {
        while let Some(event) = receiver.recv().await {
            let Some(state) = state.upgrade() else {
                break;
            };

            let listener = state
                .lock()
                .windows
                .get(&window)
                .filter(|node| node.open)
                .and_then(|node| node.listener.as_ref().map(|(_, l)| Arc::clone(l)));

            let Some(listener) = listener else {
                trace!(%window, source = %event.source, "No listener, payload dropped");
                continue;
            };

            // A panicking listener loses this payload only; the inbox keeps draining.
            let source = event.source;
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                warn!(%window, %source, "Listener panicked, payload dropped");
            }
        }

        trace!(%window, "Inbox pump terminated");
    }

    fn with_node<T>(&self, window: WindowId, f: impl FnOnce(&WindowNode) -> T) -> Option<T> {
        self.state.lock().windows.get(&window).map(f)
    }
}

// ============================================================================
// MemoryEndpoint
// ============================================================================

/// One window's view of a [`MemoryHub`].
#[derive(Debug, Clone)]
pub struct MemoryEndpoint {
    hub: MemoryHub,
    window: WindowId,
}

impl MemoryEndpoint {
    /// Returns the window this endpoint posts from.
    #[inline]
    #[must_use]
    pub fn window(&self) -> WindowId {
        self.window
    }

    /// Returns the hub this endpoint belongs to.
    #[inline]
    #[must_use]
    pub fn hub(&self) -> &MemoryHub {
        &self.hub
    }
}

impl Transport for MemoryEndpoint {
    fn post(&self, target: WindowId, payload: &str) -> Result<()> {
        self.hub.deliver(self.window, target, payload)
    }

    fn set_listener(&self, handler: InboundHandler) -> ListenerId {
        let mut state = self.hub.state.lock();
        state.next_listener += 1;
        let id = ListenerId::new(state.next_listener);

        if let Some(node) = state.windows.get_mut(&self.window) {
            node.listener = Some((id, Arc::from(handler)));
        }
        id
    }

    fn clear_listener(&self, listener: ListenerId) {
        let mut state = self.hub.state.lock();
        let Some(node) = state.windows.get_mut(&self.window) else {
            return;
        };

        if node.listener.as_ref().is_some_and(|(id, _)| *id == listener) {
            node.listener = None;
        } else {
            trace!(window = %self.window, %listener, "Stale listener token, handler kept");
        }
    }
}

impl FrameQuery for MemoryEndpoint {
    fn parent_window(&self) -> Option<WindowId> {
        self.hub.with_node(self.window, |node| node.parent).flatten()
    }

    fn top_window(&self) -> WindowId {
        let state = self.hub.state.lock();
        let mut current = self.window;
        while let Some(parent) = state.windows.get(&current).and_then(|node| node.parent) {
            current = parent;
        }
        current
    }

    fn child_frames(&self) -> Vec<ClientWindow> {
        let state = self.hub.state.lock();
        let Some(node) = state.windows.get(&self.window) else {
            return Vec::new();
        };

        node.children
            .iter()
            .filter_map(|child| {
                let child_node = state.windows.get(child).filter(|n| n.open)?;
                let element = child_node.element.clone()?;
                Some(ClientWindow::new(*child, element))
            })
            .collect()
    }

    fn frames_of(&self, window: WindowId) -> Vec<WindowId> {
        self.hub
            .with_node(window, |node| node.children.clone())
            .unwrap_or_default()
    }

    fn is_live(&self, window: WindowId) -> bool {
        self.hub.is_open(window)
    }
}

// ============================================================================
// Tests
// ============================================================================
