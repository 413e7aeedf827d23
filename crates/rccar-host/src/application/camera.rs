//! Camera streaming as seen by the Host logic.

use rccar_core::protocol::messages::CameraConnectionParameterMessage;
use rccar_core::session::HandlerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("failed to start camera stream: {0}")]
    Start(String),

    #[error("camera stream is already active")]
    AlreadyActive,
}

impl From<CameraError> for HandlerError {
    fn from(err: CameraError) -> Self {
        HandlerError::Collaborator(err.to_string())
    }
}

/// A running (or startable) camera stream.
#[cfg_attr(test, mockall::automock)]
pub trait CameraStreaming: Send {
    fn start(&mut self) -> Result<(), CameraError>;

    /// Stops the stream. Harmless when not running.
    fn stop(&mut self);

    /// Where the Client finds the stream; the host part is implied.
    fn connection_parameter(&self) -> CameraConnectionParameterMessage;
}

/// Creates a fresh stream each time the Client asks for the camera.
pub type CameraFactory = Box<dyn Fn() -> Box<dyn CameraStreaming> + Send>;
