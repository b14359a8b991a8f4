//! Envelope message types.
//!
//! Every payload handed to the transport is one serialized [`Envelope`]:
//! either a message carrying a typed body, or an ack confirming receipt of a
//! message id.

// ============================================================================
// Imports
// ============================================================================

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Value, from_str, to_string};

use crate::error::{Error, Result};
use crate::identifiers::MessageId;

// ============================================================================
// Envelope
// ============================================================================

/// The wire unit exchanged between windows.
///
/// Decoding tries [`AckEnvelope`] first, so an object carrying both a
/// non-zero `ack` and `type` is treated as an ack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Envelope {
    /// Receipt for a previously sent message.
    Ack(AckEnvelope),
    /// Typed message awaiting an ack.
    Message(MessageEnvelope),
}

impl Envelope {
    /// Creates an ack for the given message id.
    #[inline]
    #[must_use]
    pub fn ack(id: MessageId) -> Self {
        Self::Ack(AckEnvelope { ack: id })
    }

    /// Decodes a transport payload.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the payload is not JSON or matches neither shape
    /// - [`Error::Protocol`] if a message carries an empty `type`
    pub fn decode(payload: &str) -> Result<Self> {
        let envelope: Self = from_str(payload)?;

        if let Self::Message(ref message) = envelope
            && message.message_type.is_empty()
        {
            return Err(Error::protocol("message type is empty"));
        }

        Ok(envelope)
    }

    /// Encodes the envelope as a transport payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the body cannot be serialized.
    pub fn encode(&self) -> Result<String> {
        Ok(to_string(self)?)
    }

    /// Returns the id this envelope refers to.
    #[inline]
    #[must_use]
    pub fn id(&self) -> MessageId {
        match self {
            Self::Ack(ack) => ack.ack,
            Self::Message(message) => message.id,
        }
    }
}

impl From<MessageEnvelope> for Envelope {
    fn from(message: MessageEnvelope) -> Self {
        Self::Message(message)
    }
}

// ============================================================================
// AckEnvelope
// ============================================================================

/// Acknowledges receipt of one message.
///
/// # Format
///
/// ```json
/// { "ack": 17 }
/// ```
///
/// Message ids start at 1, so `"ack": 0` does not decode as an ack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckEnvelope {
    /// Id of the acknowledged message.
    #[serde(deserialize_with = "issued_id")]
    pub ack: MessageId,
}

fn issued_id<'de, D>(deserializer: D) -> std::result::Result<MessageId, D::Error>
where
    D: Deserializer<'de>,
{
    let id = MessageId::deserialize(deserializer)?;
    if id.as_u64() == 0 {
        return Err(de::Error::custom("ack id 0 is never issued"));
    }
    Ok(id)
}

// ============================================================================
// MessageEnvelope
// ============================================================================

/// A typed message.
///
/// # Format
///
/// ```json
/// {
///   "id": 17,
///   "type": "greet",
///   "body": "hello",
///   "attempt": 0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// Id echoed back in the ack.
    pub id: MessageId,

    /// Subscription key.
    #[serde(rename = "type")]
    pub message_type: String,

    /// Arbitrary JSON payload.
    #[serde(default)]
    pub body: Value,

    /// Resend counter, 0 on the first send.
    #[serde(default)]
    pub attempt: u32,
}

impl MessageEnvelope {
    /// Creates a first-attempt message.
    #[inline]
    #[must_use]
    pub fn new(id: MessageId, message_type: impl Into<String>, body: Value) -> Self {
        Self {
            id,
            message_type: message_type.into(),
            body,
            attempt: 0,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
