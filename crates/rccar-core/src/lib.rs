//! # rccar-core
//!
//! Shared library of the RC car remote link. A **Host** runs on the vehicle
//! and a **Client** is the remote control; both talk over one TCP connection
//! using the protocol defined here.
//!
//! - **`protocol`** – The typed messages and the JSON stream codec that cuts
//!   the TCP byte stream into messages.
//!
//! - **`crypto`** – Salted SHA-1 password hashing for the greeting /
//!   authentication handshake.
//!
//! - **`domain`** – Connection parameters (including the sharing URL) and
//!   positions with distance and bearing helpers.
//!
//! - **`session`** – The remote channel, the listener loop running on its own
//!   task, and the dispatch core that routes every received message to the
//!   handler registered for its type. Every failure converges on one
//!   "connection lost" notification.
//!
//! - **`service`** – Collaborators the session consumes, such as the
//!   location service.

pub mod crypto;
pub mod domain;
pub mod protocol;
pub mod service;
pub mod session;

pub use crypto::{generate_salt, hash_password};
pub use domain::{ConnectionParameter, Location, DEFAULT_PORT};
pub use protocol::codec::{decode_message, encode_message, ProtocolError};
pub use protocol::messages::{Message, MessageType, PROTOCOL_VERSION};
pub use session::{
    ConnectionLost, HandlerContext, HandlerError, MessageHandler, Session, SessionApp,
    SessionError, SessionHandle,
};
