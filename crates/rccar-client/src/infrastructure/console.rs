//! Console front end: reads commands from stdin and logs telemetry.
//!
//! ```text
//! speed <v>            v in [-1, 1]
//! turn <v>             v in [-1, 1], negative is left
//! camera <pan> <tilt>
//! quit
//! ```

use rccar_core::session::ConnectionLost;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::application::client_logic::ClientListener;
use crate::application::control::Command;

/// One line of console input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsoleInput {
    Control(Command),
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("unknown command {0:?}, expected speed, turn, camera or quit")]
    UnknownCommand(String),

    #[error("{command} expects {expected} number(s)")]
    WrongArity {
        command: &'static str,
        expected: usize,
    },

    #[error("not a number: {0:?}")]
    NotANumber(String),
}

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<ConsoleInput>, ParseError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let input = match command.to_ascii_lowercase().as_str() {
        "quit" | "exit" => ConsoleInput::Quit,
        "speed" => {
            let [speed] = numbers::<1>("speed", &args)?;
            ConsoleInput::Control(Command::AdjustSpeed(speed))
        }
        "turn" => {
            let [rotation] = numbers::<1>("turn", &args)?;
            ConsoleInput::Control(Command::TurnCar(rotation))
        }
        "camera" => {
            let [pan, tilt] = numbers::<2>("camera", &args)?;
            ConsoleInput::Control(Command::RotateCamera { pan, tilt })
        }
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(Some(input))
}

fn numbers<const N: usize>(command: &'static str, args: &[&str]) -> Result<[f32; N], ParseError> {
    if args.len() != N {
        return Err(ParseError::WrongArity {
            command,
            expected: N,
        });
    }
    let mut values = [0.0; N];
    for (value, raw) in values.iter_mut().zip(args) {
        *value = raw
            .parse()
            .map_err(|_| ParseError::NotANumber(raw.to_string()))?;
    }
    Ok(values)
}

/// A [`ClientListener`] that writes everything to the log.
#[derive(Debug, Default)]
pub struct ConsoleListener;

impl ClientListener for ConsoleListener {
    fn connection_lost(&mut self, lost: &ConnectionLost) {
        error!(label = lost.label.unwrap_or("-"), "connection lost: {}", lost.cause);
    }

    fn authentication_failed(&mut self, reason: &str) {
        error!("host rejected the password: {reason}");
    }

    fn enable_pan(&mut self, min: f32, max: f32) {
        info!("camera pan available: {} .. {}", -min, max);
    }

    fn enable_tilt(&mut self, min: f32, max: f32) {
        info!("camera tilt available: {} .. {}", -min, max);
    }

    fn enable_driving(&mut self, adjustable_speed: bool, drive_backward: bool) {
        info!(adjustable_speed, drive_backward, "ready to drive");
    }

    fn set_battery_power(&mut self, charging_level: f32) {
        if charging_level < 20.0 {
            warn!("car battery low: {charging_level:.0}%");
        } else {
            info!("car battery: {charging_level:.0}%");
        }
    }

    fn set_distance(&mut self, distance: f32, bearing_to: f32) {
        info!("car is {distance:.0} m away, bearing {bearing_to:.0}°");
    }

    fn set_bearing(&mut self, bearing: f32) {
        info!("car heading: {bearing:.0}°");
    }

    fn set_speed(&mut self, speed: f32) {
        info!("car speed: {speed:.1} m/s");
    }

    fn play_stream(&mut self, url: &str) {
        info!("camera stream: {url}");
    }

    fn stop_stream(&mut self) {}
}
