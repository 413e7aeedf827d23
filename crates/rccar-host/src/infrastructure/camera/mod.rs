//! Camera stream adapter.
//!
//! The stream itself is served by an external program (for example a
//! `ffmpeg` or `mjpg-streamer` invocation). The Host only starts and stops
//! that program and tells the Client where to find the stream.

use std::process::Stdio;

use rccar_core::protocol::messages::CameraConnectionParameterMessage;
use tokio::process::{Child, Command};
use tracing::{info, warn};

use crate::application::camera::{CameraError, CameraStreaming};

/// A stream served by an optional child process.
pub struct ProcessCamera {
    command: Option<Vec<String>>,
    parameter: CameraConnectionParameterMessage,
    child: Option<Child>,
}

impl ProcessCamera {
    /// `command` is the program followed by its arguments. Without a command
    /// the stream is assumed to be running already.
    pub fn new(command: Option<Vec<String>>, parameter: CameraConnectionParameterMessage) -> Self {
        Self {
            command,
            parameter,
            child: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }
}

impl CameraStreaming for ProcessCamera {
    fn start(&mut self) -> Result<(), CameraError> {
        if self.child.is_some() {
            return Err(CameraError::AlreadyActive);
        }
        let Some((program, args)) = self.command.as_ref().and_then(|c| c.split_first()) else {
            info!("camera stream served externally");
            return Ok(());
        };

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CameraError::Start(format!("{program}: {e}")))?;
        info!(program = %program, pid = ?child.id(), "camera streamer started");
        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.start_kill() {
                warn!("failed to stop camera streamer: {e}");
            }
        }
    }

    fn connection_parameter(&self) -> CameraConnectionParameterMessage {
        self.parameter.clone()
    }
}

impl Drop for ProcessCamera {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parameter() -> CameraConnectionParameterMessage {
        CameraConnectionParameterMessage {
            port: 8080,
            protocol: "http".to_string(),
            path: "videofeed".to_string(),
        }
    }

    #[tokio::test]
    async fn test_external_stream_starts_without_process() {
        let mut camera = ProcessCamera::new(None, parameter());

        camera.start().unwrap();

        assert!(!camera.is_running());
        assert_eq!(camera.connection_parameter(), parameter());
    }

    #[tokio::test]
    async fn test_missing_program_reports_start_error() {
        let mut camera = ProcessCamera::new(
            Some(vec!["/nonexistent/rccar-streamer".to_string()]),
            parameter(),
        );

        let result = camera.start();

        assert!(matches!(result, Err(CameraError::Start(_))));
        assert!(!camera.is_running());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_is_stopped() {
        // Arrange
        let mut camera = ProcessCamera::new(
            Some(vec!["sleep".to_string(), "30".to_string()]),
            parameter(),
        );

        // Act
        camera.start().unwrap();
        let second = camera.start();
        camera.stop();

        // Assert
        assert!(matches!(second, Err(CameraError::AlreadyActive)));
        assert!(!camera.is_running());
    }
}
