//! Error types for frame relay.
//!
//! Errors only surface from configuration, the wire codec and the transport
//! primitive. The delivery paths (send, retry, dispatch) never return them to
//! callers: outcomes are reported through the completion callback's
//! [`Delivery`](crate::Delivery) argument instead.
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Transport | [`Error::WindowClosed`], [`Error::FrameNotFound`], [`Error::Transport`] |
//! | Protocol | [`Error::Protocol`], [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

use crate::identifiers::WindowId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned by [`MessengerBuilder::build`](crate::MessengerBuilder::build)
    /// when a collaborator is missing or an option is out of range.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Target window is closed or was never reachable.
    #[error("Window closed: {window}")]
    WindowClosed {
        /// The unreachable window.
        window: WindowId,
    },

    /// Frame not found in the window tree.
    #[error("Frame not found: {window}")]
    FrameNotFound {
        /// The missing window.
        window: WindowId,
    },

    /// Transport primitive failure.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Payload is JSON but not a valid envelope.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a window closed error.
    #[inline]
    pub fn window_closed(window: WindowId) -> Self {
        Self::WindowClosed { window }
    }

    /// Creates a frame not found error.
    #[inline]
    pub fn frame_not_found(window: WindowId) -> Self {
        Self::FrameNotFound { window }
    }

    /// Creates a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error came from the transport primitive.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::WindowClosed { .. } | Self::FrameNotFound { .. } | Self::Transport { .. }
        )
    }

    /// Returns `true` if this error came from decoding or encoding a payload.
    #[inline]
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::Protocol { .. } | Self::Json(_))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::window_closed(WindowId::new(7));
        assert_eq!(err.to_string(), "Window closed: window-7");
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("missing transport");
        assert_eq!(err.to_string(), "Configuration error: missing transport");
    }

    #[test]
    fn test_is_transport_error() {
        assert!(Error::window_closed(WindowId::new(1)).is_transport_error());
        assert!(Error::frame_not_found(WindowId::new(1)).is_transport_error());
        assert!(Error::transport("gone").is_transport_error());
        assert!(!Error::config("test").is_transport_error());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
        assert!(err.is_protocol_error());
    }
}
