//! Storage infrastructure: the Client settings file.

pub mod config;
