//! In-memory car that records commands and drains its battery while driving.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::{debug, trace};

use crate::application::vehicle::{CarFeatures, VehicleControl, VehicleError};

/// Last commanded state of a [`SimulatedVehicle`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleSnapshot {
    pub speed: f32,
    pub rotation: f32,
    pub pan: f32,
    pub tilt: f32,
    pub battery_level: f32,
}

#[derive(Debug)]
struct State {
    snapshot: VehicleSnapshot,
    last_drain: Instant,
}

/// A [`VehicleControl`] without hardware behind it.
///
/// Clones share state, so one clone can be handed to a session while another
/// observes it.
#[derive(Debug, Clone)]
pub struct SimulatedVehicle {
    features: CarFeatures,
    drain_per_minute: f32,
    state: Arc<Mutex<State>>,
}

impl SimulatedVehicle {
    pub fn new(features: CarFeatures, battery_level: f32, drain_per_minute: f32) -> Self {
        Self {
            features,
            drain_per_minute,
            state: Arc::new(Mutex::new(State {
                snapshot: VehicleSnapshot {
                    speed: 0.0,
                    rotation: 0.0,
                    pan: 0.0,
                    tilt: 0.0,
                    battery_level: battery_level.clamp(0.0, 100.0),
                },
                last_drain: Instant::now(),
            })),
        }
    }

    /// Current state, or `None` if the state lock is poisoned.
    pub fn snapshot(&self) -> Option<VehicleSnapshot> {
        self.state.lock().ok().map(|s| s.snapshot)
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> Result<T, VehicleError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| VehicleError::Unavailable("vehicle state poisoned".to_string()))?;
        drain(&mut state, self.drain_per_minute);
        Ok(f(&mut state))
    }
}

/// Charges the battery for the time driven at the previous speed.
fn drain(state: &mut State, per_minute: f32) {
    let now = Instant::now();
    let minutes = now.duration_since(state.last_drain).as_secs_f32() / 60.0;
    state.last_drain = now;
    let used = per_minute * state.snapshot.speed.abs() * minutes;
    state.snapshot.battery_level = (state.snapshot.battery_level - used).max(0.0);
}

impl VehicleControl for SimulatedVehicle {
    fn features(&self) -> CarFeatures {
        self.features
    }

    fn adjust_speed(&mut self, speed: f32) -> Result<(), VehicleError> {
        if !self.features.adjustable_speed && speed != 0.0 && speed.abs() != 1.0 {
            return Err(VehicleError::Rejected(format!(
                "speed {speed} needs adjustable speed"
            )));
        }
        self.with_state(|s| s.snapshot.speed = speed)?;
        debug!(speed, "speed adjusted");
        Ok(())
    }

    fn turn_car(&mut self, rotation: f32) -> Result<(), VehicleError> {
        self.with_state(|s| s.snapshot.rotation = rotation)?;
        trace!(rotation, "steering set");
        Ok(())
    }

    fn rotate_camera(&mut self, pan: f32, tilt: f32) -> Result<(), VehicleError> {
        self.with_state(|s| {
            s.snapshot.pan = pan;
            s.snapshot.tilt = tilt;
        })?;
        trace!(pan, tilt, "camera rotated");
        Ok(())
    }

    fn battery_level(&mut self) -> Result<f32, VehicleError> {
        self.with_state(|s| s.snapshot.battery_level)
    }
}
