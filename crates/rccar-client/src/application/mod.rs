//! Application layer of the Client.
//!
//! - **`client_logic`** – session setup, role state and the UI sink trait.
//! - **`handlers`** – handshake reply, feature setup and telemetry handlers.
//! - **`control`** – driving and camera commands, clamped to what the Host
//!   offered.

pub mod client_logic;
pub mod control;
pub mod handlers;
