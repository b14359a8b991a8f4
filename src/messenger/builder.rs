//! Builder pattern for messenger configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use frame_relay::{MemoryHub, Messenger};
//!
//! let hub = MemoryHub::new();
//! let top = hub.add_top();
//!
//! let messenger = Messenger::builder()
//!     .endpoint(Arc::new(hub.endpoint(top)))
//!     .max_attempts(5)
//!     .build()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::error::{Error, Result};
use crate::frames::FrameQuery;
use crate::transport::Transport;

use super::core::Messenger;
use super::options::MessengerOptions;

// ============================================================================
// MessengerBuilder
// ============================================================================

/// Builder for configuring a [`Messenger`] instance.
///
/// Use [`Messenger::builder()`] to create a new builder.
#[derive(Default, Clone)]
pub struct MessengerBuilder {
    /// Raw send/receive primitive.
    transport: Option<Arc<dyn Transport>>,
    /// Frame query provider.
    frames: Option<Arc<dyn FrameQuery>>,
    /// Retry settings.
    options: MessengerOptions,
}

impl fmt::Debug for MessengerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessengerBuilder")
            .field("transport", &self.transport.is_some())
            .field("frames", &self.frames.is_some())
            .field("options", &self.options)
            .finish()
    }
}

// ============================================================================
// MessengerBuilder Implementation
// ============================================================================

impl MessengerBuilder {
    /// Creates a new builder with no collaborators and default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the transport primitive.
    #[inline]
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the frame query provider.
    #[inline]
    #[must_use]
    pub fn frames(mut self, frames: Arc<dyn FrameQuery>) -> Self {
        self.frames = Some(frames);
        self
    }

    /// Sets transport and frame query provider from one value.
    #[inline]
    #[must_use]
    pub fn endpoint<E>(mut self, endpoint: Arc<E>) -> Self
    where
        E: Transport + FrameQuery + 'static,
    {
        self.transport = Some(endpoint.clone());
        self.frames = Some(endpoint);
        self
    }

    /// Replaces all retry settings.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: MessengerOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the sweep interval.
    #[inline]
    #[must_use]
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.options = self.options.with_sweep_interval(interval);
        self
    }

    /// Sets the attempt ceiling.
    #[inline]
    #[must_use]
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.options = self.options.with_max_attempts(max_attempts);
        self
    }

    /// Builds the messenger with validation.
    ///
    /// Discovers child frames and attaches the inbound listener immediately.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if transport or frame provider is not set
    /// - [`Error::Config`] if the options are invalid
    /// - [`Error::Config`] if called outside a tokio runtime
    pub fn build(self) -> Result<Messenger> {
        let transport = self
            .transport
            .ok_or_else(|| Error::config("transport is required"))?;
        let frames = self
            .frames
            .ok_or_else(|| Error::config("frame query provider is required"))?;

        self.options.validate()?;

        let runtime = Handle::try_current()
            .map_err(|_| Error::config("messenger must be built inside a tokio runtime"))?;

        Ok(Messenger::start(self.options, transport, frames, runtime))
    }
}

// ============================================================================
// Tests
// ============================================================================
