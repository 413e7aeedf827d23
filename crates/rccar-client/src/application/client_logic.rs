//! Client role logic: answers the Host's greeting, sets itself up from the
//! offered features and forwards telemetry to the user interface.
//!
//! # Session flow
//!
//! ```text
//! start_client_session()
//!  ├─ register GreetingHandler
//!  └─ start listener
//!
//! Greeting ──► register {Feature, AuthenticationFailed}, send Authentication
//! Feature  ──► register telemetry/camera handlers, request cyclic updates
//! ```

use rccar_core::domain::ConnectionParameter;
use rccar_core::protocol::messages::FeatureMessage;
use rccar_core::service::location::LocationServiceFactory;
use rccar_core::session::{ConnectionLost, Session, SessionApp, SessionError};
use tokio::net::TcpStream;
use tracing::info;

use crate::application::handlers::GreetingHandler;

// ── Settings ──────────────────────────────────────────────────────────────────

/// Client preferences that shape the session.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    /// Requested battery report interval in milliseconds.
    pub battery_power_interval_ms: u32,
    /// Requested location report interval in milliseconds.
    pub location_interval_ms: u32,
    /// Ask for the camera stream when the Host offers one.
    pub camera_enabled: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            battery_power_interval_ms: 60_000,
            location_interval_ms: 1_000,
            camera_enabled: true,
        }
    }
}

// ── Listener ──────────────────────────────────────────────────────────────────

/// The user interface of the remote control.
#[cfg_attr(test, mockall::automock)]
pub trait ClientListener: Send {
    /// The session ended because of an error other than a rejected password.
    fn connection_lost(&mut self, lost: &ConnectionLost);

    /// The Host rejected the password.
    fn authentication_failed(&mut self, reason: &str);

    /// Camera pan is available in `[-min, max]`.
    fn enable_pan(&mut self, min: f32, max: f32);

    /// Camera tilt is available in `[-min, max]`.
    fn enable_tilt(&mut self, min: f32, max: f32);

    fn enable_driving(&mut self, adjustable_speed: bool, drive_backward: bool);

    /// Charge of the car's battery in percent.
    fn set_battery_power(&mut self, charging_level: f32);

    /// Distance in metres and bearing in degrees from here to the car.
    fn set_distance(&mut self, distance: f32, bearing_to: f32);

    /// Direction the car is heading, in degrees.
    fn set_bearing(&mut self, bearing: f32);

    /// Ground speed of the car in metres per second.
    fn set_speed(&mut self, speed: f32);

    /// Starts showing the camera stream at `url`.
    fn play_stream(&mut self, url: &str);

    /// Stops showing the camera stream.
    fn stop_stream(&mut self);
}

// ── State ─────────────────────────────────────────────────────────────────────

/// Everything a Client session needs besides the socket.
pub struct ClientDependencies {
    pub parameter: ConnectionParameter,
    pub settings: ClientSettings,
    /// Own position, for the distance to the car.
    pub location: Option<LocationServiceFactory>,
    pub listener: Box<dyn ClientListener>,
}

/// Role state owned by a Client [`Session`].
pub struct ClientState {
    parameter: ConnectionParameter,
    settings: ClientSettings,
    features: Option<FeatureMessage>,
    listener: Box<dyn ClientListener>,
}

impl ClientState {
    pub fn parameter(&self) -> &ConnectionParameter {
        &self.parameter
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// What the Host offered; `None` until authenticated.
    pub fn features(&self) -> Option<&FeatureMessage> {
        self.features.as_ref()
    }

    pub fn set_features(&mut self, features: FeatureMessage) {
        self.features = Some(features);
    }

    pub fn listener_mut(&mut self) -> &mut dyn ClientListener {
        self.listener.as_mut()
    }
}

impl SessionApp for ClientState {
    fn session_closed(&mut self) {
        self.listener.stop_stream();
    }

    fn connection_lost(&mut self, lost: &ConnectionLost) {
        match &lost.cause {
            SessionError::AuthenticationFailed(reason) => {
                self.listener.authentication_failed(reason)
            }
            _ => self.listener.connection_lost(lost),
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Wraps a connection to a Host into a Client session that waits for the
/// greeting. Drive it with [`Session::run`].
pub fn start_client_session(stream: TcpStream, deps: ClientDependencies) -> Session<ClientState> {
    let state = ClientState {
        parameter: deps.parameter,
        settings: deps.settings,
        features: None,
        listener: deps.listener,
    };
    let mut session = Session::new(stream, state, deps.location);
    session.register_message_handler(GreetingHandler);
    session.start();
    info!(peer = ?session.peer_addr(), "waiting for greeting");
    session
}
