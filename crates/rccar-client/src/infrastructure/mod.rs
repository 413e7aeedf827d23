//! Infrastructure layer for the Client.
//!
//! OS-facing adapters: connecting to the Host, the TOML settings file and
//! the console front end.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `rccar_core`, but MUST NOT be imported by `application`.

pub mod console;
pub mod network;
pub mod storage;
