//! Vehicle adapters.
//!
//! No micro controller link ships with the Host yet; the simulated car
//! applies the same validation and keeps the last commanded state.

pub mod simulated;

pub use simulated::{SimulatedVehicle, VehicleSnapshot};
