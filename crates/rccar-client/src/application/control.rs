//! Driving and camera commands.
//!
//! User input is clamped to what the Host offered before it is sent, so a
//! joystick overshoot never ends the session on the Host side.

use rccar_core::protocol::messages::{
    AdjustSpeedMessage, FeatureMessage, Message, RotateCameraMessage, TurnCarMessage,
};
use rccar_core::session::{HandlerContext, SessionHandle};
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::client_logic::ClientState;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// The Host has not sent its features yet.
    #[error("not authenticated yet, host features unknown")]
    NotReady,

    #[error("session is closed")]
    SessionClosed,
}

/// One user command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// `-1.0` full backward, `1.0` full forward.
    AdjustSpeed(f32),
    /// `-1.0` full left, `1.0` full right.
    TurnCar(f32),
    RotateCamera { pan: f32, tilt: f32 },
}

impl Command {
    /// The message for this command, clamped to `features`.
    pub fn to_message(self, features: Option<&FeatureMessage>) -> Result<Message, ControlError> {
        let features = features.ok_or(ControlError::NotReady)?;
        Ok(match self {
            Command::AdjustSpeed(speed) => Message::AdjustSpeed(AdjustSpeedMessage {
                speed: clamp_speed(features, speed),
            }),
            Command::TurnCar(rotation) => Message::TurnCar(TurnCarMessage {
                rotation: clamp_rotation(rotation),
            }),
            Command::RotateCamera { pan, tilt } => {
                let (pan, tilt) = clamp_camera(features, pan, tilt);
                Message::RotateCamera(RotateCameraMessage { pan, tilt })
            }
        })
    }
}

/// Clamps to `[driveBackward ? -1 : 0, 1]`.
pub fn clamp_speed(features: &FeatureMessage, speed: f32) -> f32 {
    let min = if features.drive_backward { -1.0 } else { 0.0 };
    clamp(speed, min, 1.0)
}

/// Clamps to `[-1, 1]`.
pub fn clamp_rotation(rotation: f32) -> f32 {
    clamp(rotation, -1.0, 1.0)
}

/// Clamps pan to `[-panMin, panMax]` and tilt to `[-tiltMin, tiltMax]`.
pub fn clamp_camera(features: &FeatureMessage, pan: f32, tilt: f32) -> (f32, f32) {
    (
        clamp(pan, -features.camera_pan_min, features.camera_pan_max),
        clamp(tilt, -features.camera_tilt_min, features.camera_tilt_max),
    )
}

// Never panics on inverted bounds; NaN maps to `min`.
fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value > max {
        max
    } else if value >= min {
        value
    } else {
        min
    }
}

/// Sends commands into a running Client session from another task.
#[derive(Clone)]
pub struct RemoteControl {
    handle: SessionHandle<ClientState>,
}

impl RemoteControl {
    pub fn new(handle: SessionHandle<ClientState>) -> Self {
        Self { handle }
    }

    /// Queues `command`. Commands issued before the Host's features arrived
    /// are dropped with a warning.
    pub fn send(&self, command: Command) -> Result<(), ControlError> {
        let posted = self.handle.post(move |ctx| {
            apply(ctx, command);
            Ok(())
        });
        if posted {
            Ok(())
        } else {
            Err(ControlError::SessionClosed)
        }
    }

    /// Ends the session without reporting an error.
    pub fn disconnect(&self) {
        self.handle.close();
    }
}

fn apply(ctx: &mut HandlerContext<'_, ClientState>, command: Command) {
    match command.to_message(ctx.app().features()) {
        Ok(message) => {
            debug!(?message, "sending command");
            ctx.send(message);
        }
        Err(e) => warn!(?command, "command dropped: {e}"),
    }
}
