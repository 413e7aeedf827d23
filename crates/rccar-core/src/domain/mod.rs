//! Domain values shared by Host and Client.

pub mod connection;
pub mod location;

pub use connection::{ConnectionParameter, ConnectionParameterError, DEFAULT_PORT};
pub use location::{Location, LocationSharing};
