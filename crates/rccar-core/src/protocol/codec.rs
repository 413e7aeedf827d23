//! JSON stream codec for Host/Client messages.
//!
//! Wire format: JSON objects written back to back on the TCP stream, without
//! a length prefix and without a separator. The reader finds message
//! boundaries by parsing one complete JSON value at a time; whitespace between
//! values is tolerated.
//!
//! ```text
//! {"type":"TurnCar","rotation":0.5}{"type":"AdjustSpeed","speed":1.0}
//! ```

use serde_json::Deserializer;
use thiserror::Error;

use crate::protocol::messages::Message;

/// Largest single message a reader buffers before giving up on the stream.
/// Real messages stay well below 1 KiB.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Errors that can occur during message encoding or decoding.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The buffer ends before the first JSON value is complete.
    #[error("insufficient data: no complete message in {available} buffered bytes")]
    InsufficientData { available: usize },

    /// The bytes are not valid JSON or do not describe a known message.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// More than [`MAX_MESSAGE_SIZE`] bytes are buffered without a complete
    /// message.
    #[error("message exceeds {max} bytes ({size} buffered)")]
    MessageTooLarge { size: usize, max: usize },

    /// The message could not be turned into JSON.
    #[error("failed to serialize message: {0}")]
    Serialize(String),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`Message`] as one compact JSON object.
///
/// # Errors
///
/// Returns [`ProtocolError::Serialize`] if serialization fails.
///
/// # Examples
///
/// ```rust
/// use rccar_core::protocol::{decode_message, encode_message};
/// use rccar_core::protocol::messages::{Message, TurnCarMessage};
///
/// let msg = Message::TurnCar(TurnCarMessage { rotation: 0.25 });
/// let bytes = encode_message(&msg).unwrap();
/// let (decoded, consumed) = decode_message(&bytes).unwrap();
/// assert_eq!(decoded, msg);
/// assert_eq!(consumed, bytes.len());
/// ```
pub fn encode_message(msg: &Message) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(msg).map_err(|e| ProtocolError::Serialize(e.to_string()))
}

/// Decodes the first complete [`Message`] at the beginning of `bytes`.
///
/// Returns the message and the number of bytes consumed (leading whitespace
/// included), so the caller can drain them from its read buffer. Bytes after
/// the first value are left untouched.
///
/// # Errors
///
/// - [`ProtocolError::InsufficientData`] when the value is still incomplete;
///   the caller should read more bytes and retry.
/// - [`ProtocolError::Malformed`] when the bytes can never become a message.
pub fn decode_message(bytes: &[u8]) -> Result<(Message, usize), ProtocolError> {
    let mut stream = Deserializer::from_slice(bytes).into_iter::<Message>();
    match stream.next() {
        Some(Ok(msg)) => Ok((msg, stream.byte_offset())),
        Some(Err(e)) if e.is_eof() => Err(ProtocolError::InsufficientData {
            available: bytes.len(),
        }),
        Some(Err(e)) => Err(ProtocolError::Malformed(e.to_string())),
        None => Err(ProtocolError::InsufficientData {
            available: bytes.len(),
        }),
    }
}

/// Number of leading ASCII whitespace bytes in `bytes`.
///
/// Readers strip these before waiting for more input so keep-alive newlines
/// between messages do not accumulate in their buffers.
pub fn leading_whitespace(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_whitespace()).count()
}
