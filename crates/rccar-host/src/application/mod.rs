//! Application layer of the Host.
//!
//! Everything here talks to the car, the camera and the location source
//! through traits; the `infrastructure` layer supplies the implementations.
//!
//! - **`host_logic`** – session setup, role state and the greeting.
//! - **`handlers`** – authentication plus the command handlers it unlocks.
//! - **`cyclic_task`** – periodic battery and location reports.
//! - **`vehicle`** / **`camera`** – collaborator traits and range checks.

pub mod camera;
pub mod cyclic_task;
pub mod handlers;
pub mod host_logic;
pub mod vehicle;
