//! Network infrastructure: waiting for the Client to connect.

pub mod socket_connector;

pub use socket_connector::{local_ipv4, SocketConnector};
