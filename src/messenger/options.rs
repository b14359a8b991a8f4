//! Messenger retry configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use frame_relay::MessengerOptions;
//!
//! let options = MessengerOptions::new()
//!     .with_sweep_interval(Duration::from_millis(100))
//!     .with_max_attempts(5);
//!
//! assert_eq!(options.max_delivery_time(), Duration::from_millis(600));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Delay between the last send and the next retry sweep.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_millis(250);

/// Resends allowed before a message is declared failed.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

// ============================================================================
// MessengerOptions
// ============================================================================

/// Retry settings shared by every message of one messenger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessengerOptions {
    /// Debounce interval of the shared sweep timer.
    ///
    /// Every send restarts the countdown.
    pub sweep_interval: Duration,

    /// Highest `attempt` value that is still resent.
    ///
    /// The sweep that pushes `attempt` past this value fails the message.
    pub max_attempts: u32,
}

impl MessengerOptions {
    /// Creates options with the default 250 ms interval and 20 attempts.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Sets the sweep interval.
    #[inline]
    #[must_use]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Sets the attempt ceiling.
    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Worst-case time from first send to a `Failed` outcome on a quiet
    /// messenger.
    #[inline]
    #[must_use]
    pub fn max_delivery_time(&self) -> Duration {
        self.sweep_interval
            .saturating_mul(self.max_attempts.saturating_add(1))
    }

    /// Checks the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the sweep interval is zero.
    pub fn validate(&self) -> Result<()> {
        if self.sweep_interval.is_zero() {
            return Err(Error::config("sweep interval must be greater than zero"));
        }
        Ok(())
    }
}

impl Default for MessengerOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = MessengerOptions::default();
        assert_eq!(options.sweep_interval, Duration::from_millis(250));
        assert_eq!(options.max_attempts, 20);
        assert_eq!(options.max_delivery_time(), Duration::from_millis(5250));
    }

    #[test]
    fn test_builder_methods() {
        let options = MessengerOptions::new()
            .with_sweep_interval(Duration::from_millis(10))
            .with_max_attempts(3);
        assert_eq!(options.sweep_interval, Duration::from_millis(10));
        assert_eq!(options.max_attempts, 3);
    }

    #[test]
    fn test_validate() {
        assert!(MessengerOptions::new().validate().is_ok());
        let err = MessengerOptions::new()
            .with_sweep_interval(Duration::ZERO)
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
