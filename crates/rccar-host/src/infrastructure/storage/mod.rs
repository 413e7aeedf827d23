//! Storage infrastructure: the Host settings file.

pub mod config;
