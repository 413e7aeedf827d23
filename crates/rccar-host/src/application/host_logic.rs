//! Host role logic: greets the Client, authenticates it and then serves its
//! driving, camera and telemetry requests.
//!
//! # Session flow
//!
//! ```text
//! start_host_session()
//!  ├─ register AuthenticationHandler
//!  ├─ start listener
//!  └─ send Greeting { version, salt }
//!
//! Authentication ── ok ──► register command handlers, send Feature
//!                 └ bad ─► send AuthenticationFailed, end session
//! ```

use std::time::Duration;

use rccar_core::crypto::generate_salt;
use rccar_core::domain::location::LocationSharing;
use rccar_core::protocol::messages::{
    CyclicUpdateFeatureType, FeatureMessage, GreetingMessage, Message, PROTOCOL_VERSION,
};
use rccar_core::service::location::LocationServiceFactory;
use rccar_core::session::{ConnectionLost, Session, SessionApp};
use tokio::net::TcpStream;
use tracing::{info, warn};

use crate::application::camera::{CameraFactory, CameraStreaming};
use crate::application::cyclic_task::CyclicTask;
use crate::application::handlers::AuthenticationHandler;
use crate::application::vehicle::{CarFeatures, VehicleControl};

// ── Settings ──────────────────────────────────────────────────────────────────

/// What the Host owner allows a connected Client to use.
#[derive(Debug, Clone, PartialEq)]
pub struct HostSettings {
    pub password: String,
    pub share_location: bool,
    pub share_bearing: bool,
    pub share_speed: bool,
    pub share_camera: bool,
    /// Only honoured when the camera is shared.
    pub rotate_camera: bool,
    /// Time the camera stream needs before the Client may connect to it.
    pub camera_startup_delay: Duration,
}

impl HostSettings {
    pub fn can_rotate_camera(&self) -> bool {
        self.rotate_camera && self.share_camera
    }

    pub fn share_any_location_feature(&self) -> bool {
        self.share_location || self.share_bearing || self.share_speed
    }

    pub fn location_sharing(&self) -> LocationSharing {
        LocationSharing {
            position: self.share_location,
            bearing: self.share_bearing,
            speed: self.share_speed,
        }
    }
}

// ── Listener ──────────────────────────────────────────────────────────────────

/// Receives Host session events, e.g. to update a UI.
pub trait HostListener: Send {
    /// The Client authenticated successfully.
    fn connection_established(&mut self);

    /// The session ended because of an error.
    fn connection_lost(&mut self, lost: &ConnectionLost);

    /// The session was torn down, for whatever reason.
    fn session_closed(&mut self) {}
}

// ── State ─────────────────────────────────────────────────────────────────────

/// Everything a Host session needs besides the socket.
pub struct HostDependencies {
    pub settings: HostSettings,
    pub vehicle: Box<dyn VehicleControl>,
    pub camera_factory: CameraFactory,
    pub location: Option<LocationServiceFactory>,
    pub listener: Box<dyn HostListener>,
}

/// Role state owned by a Host [`Session`].
pub struct HostState {
    salt: String,
    settings: HostSettings,
    vehicle: Box<dyn VehicleControl>,
    camera_factory: CameraFactory,
    camera: Option<Box<dyn CameraStreaming>>,
    battery_task: Option<CyclicTask>,
    location_task: Option<CyclicTask>,
    listener: Box<dyn HostListener>,
}

impl HostState {
    fn new(deps: HostDependencies) -> Self {
        let features = deps.vehicle.features();
        let battery_task = features
            .battery_power
            .then(|| CyclicTask::new(CyclicUpdateFeatureType::BatteryPower));
        let location_task = deps
            .settings
            .share_any_location_feature()
            .then(|| CyclicTask::new(CyclicUpdateFeatureType::Location));

        Self {
            salt: generate_salt(),
            settings: deps.settings,
            vehicle: deps.vehicle,
            camera_factory: deps.camera_factory,
            camera: None,
            battery_task,
            location_task,
            listener: deps.listener,
        }
    }

    /// The salt of this session's greeting.
    pub fn salt(&self) -> &str {
        &self.salt
    }

    pub fn settings(&self) -> &HostSettings {
        &self.settings
    }

    pub fn car_features(&self) -> CarFeatures {
        self.vehicle.features()
    }

    pub fn vehicle_mut(&mut self) -> &mut dyn VehicleControl {
        self.vehicle.as_mut()
    }

    pub fn listener_mut(&mut self) -> &mut dyn HostListener {
        self.listener.as_mut()
    }

    /// Capability snapshot offered to an authenticated Client.
    pub fn feature_message(&self) -> FeatureMessage {
        let car = self.car_features();
        let rotate = self.settings.can_rotate_camera();
        let bound = |value: f32| if rotate { value } else { 0.0 };

        FeatureMessage {
            camera: self.settings.share_camera,
            camera_pan_min: bound(car.camera_pan_min),
            camera_pan_max: bound(car.camera_pan_max),
            camera_tilt_min: bound(car.camera_tilt_min),
            camera_tilt_max: bound(car.camera_tilt_max),
            adjustable_speed: car.adjustable_speed,
            drive_backward: car.drive_backward,
            location: self.settings.share_location,
            bearing: self.settings.share_bearing,
            speed: self.settings.share_speed,
            battery_power: car.battery_power,
        }
    }

    pub fn camera_active(&self) -> bool {
        self.camera.is_some()
    }

    pub fn camera(&self) -> Option<&dyn CameraStreaming> {
        self.camera.as_deref()
    }

    /// Creates a new camera stream from the factory; does not start it.
    pub fn create_camera(&self) -> Box<dyn CameraStreaming> {
        (self.camera_factory)()
    }

    pub fn set_camera(&mut self, camera: Option<Box<dyn CameraStreaming>>) {
        if let Some(mut previous) = std::mem::replace(&mut self.camera, camera) {
            previous.stop();
        }
    }

    /// The cyclic task for `feature`, if the Host offers that feature at all.
    pub fn cyclic_task_mut(&mut self, feature: CyclicUpdateFeatureType) -> Option<&mut CyclicTask> {
        match feature {
            CyclicUpdateFeatureType::BatteryPower => self.battery_task.as_mut(),
            CyclicUpdateFeatureType::Location => self.location_task.as_mut(),
        }
    }
}

impl SessionApp for HostState {
    fn session_closed(&mut self) {
        if let Err(e) = self.vehicle.adjust_speed(0.0) {
            warn!("failed to stop vehicle: {e}");
        }
        if let Err(e) = self.vehicle.turn_car(0.0) {
            warn!("failed to center steering: {e}");
        }
        if let Err(e) = self.vehicle.rotate_camera(0.0, 0.0) {
            warn!("failed to center camera: {e}");
        }
        self.set_camera(None);
        for task in [self.battery_task.as_mut(), self.location_task.as_mut()]
            .into_iter()
            .flatten()
        {
            task.stop();
        }
        self.listener.session_closed();
        info!("host session resources released");
    }

    fn connection_lost(&mut self, lost: &ConnectionLost) {
        self.listener.connection_lost(lost);
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Wraps an accepted Client connection into a Host session and greets the Client.
///
/// The returned session is active; drive it with [`Session::run`].
pub async fn start_host_session(
    stream: TcpStream,
    mut deps: HostDependencies,
) -> Session<HostState> {
    let location = deps.location.take();
    let state = HostState::new(deps);
    let salt = state.salt().to_string();

    let mut session = Session::new(stream, state, location);
    session.register_message_handler(AuthenticationHandler);
    session.start();
    session
        .send_message(Message::Greeting(GreetingMessage {
            version: PROTOCOL_VERSION,
            auth_salt: salt,
        }))
        .await;
    info!(peer = ?session.peer_addr(), "greeting sent");
    session
}
