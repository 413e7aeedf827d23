//! Infrastructure layer for the Host.
//!
//! OS-facing adapters: the TCP accept loop, the TOML settings file and the
//! simulated vehicle and camera used when no car hardware is attached.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `rccar_core`, but MUST NOT be imported by `application`.

pub mod camera;
pub mod network;
pub mod server;
pub mod storage;
pub mod vehicle;
