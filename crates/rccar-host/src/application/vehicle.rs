//! The vehicle as seen by the Host logic.
//!
//! The hardware link to the car's micro controller is platform specific; the
//! logic depends only on [`VehicleControl`]. Range checks live here so every
//! implementation gets the same validation.

use rccar_core::session::HandlerError;
use thiserror::Error;

/// Battery level (percent) below which the Host gives up the session.
pub const BATTERY_NEAR_EMPTY_PERCENT: f32 = 5.0;

/// Errors reported by a vehicle implementation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VehicleError {
    #[error("vehicle link unavailable: {0}")]
    Unavailable(String),

    #[error("vehicle rejected command: {0}")]
    Rejected(String),

    #[error("battery of the vehicle is near empty ({0:.1}%)")]
    BatteryNearEmpty(f32),
}

impl From<VehicleError> for HandlerError {
    fn from(err: VehicleError) -> Self {
        HandlerError::Collaborator(err.to_string())
    }
}

/// What the car hardware can do.
///
/// Pan/tilt bounds are magnitudes: usable pan is `[-camera_pan_min, camera_pan_max]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CarFeatures {
    pub camera_pan_min: f32,
    pub camera_pan_max: f32,
    pub camera_tilt_min: f32,
    pub camera_tilt_max: f32,
    pub adjustable_speed: bool,
    pub drive_backward: bool,
    pub battery_power: bool,
}

impl CarFeatures {
    pub fn supports_pan_camera(&self) -> bool {
        self.camera_pan_min != 0.0 || self.camera_pan_max != 0.0
    }

    pub fn supports_tilt_camera(&self) -> bool {
        self.camera_tilt_min != 0.0 || self.camera_tilt_max != 0.0
    }

    /// Validates a speed request against `[driveBackward ? -1 : 0, 1]`.
    pub fn check_speed(&self, speed: f32) -> Result<(), HandlerError> {
        let min = if self.drive_backward { -1.0 } else { 0.0 };
        check_range("speed", speed, min, 1.0)
    }

    /// Validates a steering request against `[-1, 1]`.
    pub fn check_rotation(&self, rotation: f32) -> Result<(), HandlerError> {
        check_range("rotation", rotation, -1.0, 1.0)
    }

    /// Validates a camera orientation against the pan and tilt ranges.
    pub fn check_camera(&self, pan: f32, tilt: f32) -> Result<(), HandlerError> {
        check_range("pan", pan, -self.camera_pan_min, self.camera_pan_max)?;
        check_range("tilt", tilt, -self.camera_tilt_min, self.camera_tilt_max)
    }
}

fn check_range(name: &'static str, value: f32, min: f32, max: f32) -> Result<(), HandlerError> {
    // NaN fails both comparisons, so test for the accepted interval.
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(HandlerError::OutOfRange { name, value })
    }
}

/// Commands the car understands.
#[cfg_attr(test, mockall::automock)]
pub trait VehicleControl: Send {
    fn features(&self) -> CarFeatures;

    fn adjust_speed(&mut self, speed: f32) -> Result<(), VehicleError>;

    fn turn_car(&mut self, rotation: f32) -> Result<(), VehicleError>;

    fn rotate_camera(&mut self, pan: f32, tilt: f32) -> Result<(), VehicleError>;

    /// Current charge in percent.
    fn battery_level(&mut self) -> Result<f32, VehicleError>;
}
