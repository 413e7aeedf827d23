//! Error taxonomy of a session.
//!
//! Lower layers report [`ChannelError`] (socket and codec) or [`HandlerError`]
//! (role logic). The dispatch core wraps both into the closed [`SessionError`]
//! set, and every [`SessionError`] ends the session.

use std::io;

use thiserror::Error;

use crate::protocol::codec::ProtocolError;
use crate::protocol::messages::{Message, MessageType};

/// Failures of the byte stream underneath a session.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The peer closed the connection while the session was still open.
    #[error("connection closed by peer")]
    UnexpectedEof,

    /// The channel was closed locally.
    #[error("channel is closed")]
    Closed,
}

/// Failures reported by a message handler.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HandlerError {
    /// The handler was given a message of a type it does not handle.
    #[error("unexpected message {0:?}")]
    InvalidMessage(MessageType),

    /// A value lies outside its acceptable range.
    #[error("the value {value} of {name} is outside its acceptable range")]
    OutOfRange { name: &'static str, value: f32 },

    /// The peer asked for something the local side does not offer.
    #[error("feature not available: {0}")]
    FeatureDisabled(String),

    #[error("protocol version mismatch: expected {expected}, got {actual}")]
    ProtocolVersionMismatch { expected: u32, actual: u32 },

    /// The handshake failed; escalated as [`SessionError::AuthenticationFailed`].
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// A local collaborator (vehicle, camera, UI) failed.
    #[error("{0}")]
    Collaborator(String),
}

impl HandlerError {
    /// Shorthand for handlers that receive a message they were not registered for.
    pub fn unexpected(message: &Message) -> Self {
        HandlerError::InvalidMessage(message.message_type())
    }
}

/// Every condition that terminates a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No handler is registered for the received message type.
    #[error("no handler registered for {0:?}")]
    UnsupportedMessage(MessageType),

    #[error("message handler failed: {0}")]
    HandlerFailure(#[source] HandlerError),

    /// The listener loop hit EOF, a socket error or an unparsable message.
    #[error("connection problem: {0}")]
    ConnectionProblem(#[source] ChannelError),

    #[error("failed to send message: {0}")]
    WriteFailure(#[source] ChannelError),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
}

impl From<HandlerError> for SessionError {
    fn from(err: HandlerError) -> Self {
        match err {
            HandlerError::AuthenticationFailed(reason) => SessionError::AuthenticationFailed(reason),
            other => SessionError::HandlerFailure(other),
        }
    }
}

/// Delivered once to the role logic when a session ends because of an error.
#[derive(Debug)]
pub struct ConnectionLost {
    /// Where the error was raised, e.g. `"sendMessage"`.
    pub label: Option<&'static str>,
    pub cause: SessionError,
}

/// Label attached to write failures.
pub const LABEL_SEND_MESSAGE: &str = "sendMessage";

/// Label attached to problems reported by the listener loop.
pub const LABEL_CONNECTION_PROBLEM: &str = "connectionProblem";
