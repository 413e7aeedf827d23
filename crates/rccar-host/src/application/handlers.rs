//! Host message handlers.
//!
//! Only [`AuthenticationHandler`] is registered when a session starts. A
//! successful authentication replaces it with the command handlers the
//! offered feature set allows.

use std::time::Duration;

use rccar_core::crypto::hash_password;
use rccar_core::protocol::messages::{
    AuthenticationFailedMessage, CyclicUpdateFeatureType, Message, MessageType,
};
use rccar_core::session::{HandlerContext, HandlerError, MessageHandler};
use tracing::{debug, info, warn};

use crate::application::camera::CameraError;
use crate::application::host_logic::HostState;

/// Reason sent to a Client whose password hash did not match.
pub const PASSWORD_MISMATCH_REASON: &str = "Password did not match.";

// ── Authentication ────────────────────────────────────────────────────────────

pub struct AuthenticationHandler;

impl MessageHandler<HostState> for AuthenticationHandler {
    fn message_type(&self) -> MessageType {
        MessageType::Authentication
    }

    fn handle(
        &mut self,
        message: &Message,
        ctx: &mut HandlerContext<'_, HostState>,
    ) -> Result<(), HandlerError> {
        let Message::Authentication(auth) = message else {
            return Err(HandlerError::unexpected(message));
        };
        ctx.clear_handlers();

        let state = ctx.app();
        let expected = hash_password(&state.settings().password, state.salt());
        if auth.password_hash != expected {
            warn!("client sent a wrong password hash");
            ctx.send(Message::AuthenticationFailed(AuthenticationFailedMessage {
                reason: PASSWORD_MISMATCH_REASON.to_string(),
            }));
            return Err(HandlerError::AuthenticationFailed(
                PASSWORD_MISMATCH_REASON.to_string(),
            ));
        }

        let features = ctx.app().feature_message();
        ctx.register_handler(TurnCarHandler);
        ctx.register_handler(AdjustSpeedHandler);
        if features.camera {
            ctx.register_handler(RequestCameraHandler);
            if features.supports_rotate_camera() {
                ctx.register_handler(RotateCameraHandler);
            }
        }
        if features.supports_any_location_feature() || features.battery_power {
            ctx.register_handler(SetUpCyclicUpdateHandler);
        }

        ctx.app().listener_mut().connection_established();
        info!(peer = ?ctx.peer_addr(), "client authenticated");
        ctx.send(Message::Feature(features));
        Ok(())
    }
}

// ── Driving ───────────────────────────────────────────────────────────────────

pub struct TurnCarHandler;

impl MessageHandler<HostState> for TurnCarHandler {
    fn message_type(&self) -> MessageType {
        MessageType::TurnCar
    }

    fn handle(
        &mut self,
        message: &Message,
        ctx: &mut HandlerContext<'_, HostState>,
    ) -> Result<(), HandlerError> {
        let Message::TurnCar(turn) = message else {
            return Err(HandlerError::unexpected(message));
        };
        let state = ctx.app();
        state.car_features().check_rotation(turn.rotation)?;
        state.vehicle_mut().turn_car(turn.rotation)?;
        Ok(())
    }
}

pub struct AdjustSpeedHandler;

impl MessageHandler<HostState> for AdjustSpeedHandler {
    fn message_type(&self) -> MessageType {
        MessageType::AdjustSpeed
    }

    fn handle(
        &mut self,
        message: &Message,
        ctx: &mut HandlerContext<'_, HostState>,
    ) -> Result<(), HandlerError> {
        let Message::AdjustSpeed(adjust) = message else {
            return Err(HandlerError::unexpected(message));
        };
        let state = ctx.app();
        state.car_features().check_speed(adjust.speed)?;
        state.vehicle_mut().adjust_speed(adjust.speed)?;
        Ok(())
    }
}

// ── Camera ────────────────────────────────────────────────────────────────────

pub struct RotateCameraHandler;

impl MessageHandler<HostState> for RotateCameraHandler {
    fn message_type(&self) -> MessageType {
        MessageType::RotateCamera
    }

    fn handle(
        &mut self,
        message: &Message,
        ctx: &mut HandlerContext<'_, HostState>,
    ) -> Result<(), HandlerError> {
        let Message::RotateCamera(rotate) = message else {
            return Err(HandlerError::unexpected(message));
        };
        let state = ctx.app();
        state.car_features().check_camera(rotate.pan, rotate.tilt)?;
        state.vehicle_mut().rotate_camera(rotate.pan, rotate.tilt)?;
        Ok(())
    }
}

/// Starts or stops the camera stream. The Client learns where to connect
/// once the stream had time to come up.
pub struct RequestCameraHandler;

impl MessageHandler<HostState> for RequestCameraHandler {
    fn message_type(&self) -> MessageType {
        MessageType::RequestCamera
    }

    fn handle(
        &mut self,
        message: &Message,
        ctx: &mut HandlerContext<'_, HostState>,
    ) -> Result<(), HandlerError> {
        let Message::RequestCamera(request) = message else {
            return Err(HandlerError::unexpected(message));
        };

        if !request.activate_camera {
            if ctx.app().camera_active() {
                ctx.app().set_camera(None);
                info!("camera stream stopped");
            }
            return Ok(());
        }

        let state = ctx.app();
        if state.camera_active() {
            return Err(CameraError::AlreadyActive.into());
        }
        let mut camera = state.create_camera();
        camera.start()?;
        state.set_camera(Some(camera));
        let delay: Duration = state.settings().camera_startup_delay;
        info!(delay_ms = delay.as_millis() as u64, "camera stream started");

        ctx.handle().post_delayed(delay, send_camera_parameter);
        Ok(())
    }
}

fn send_camera_parameter(ctx: &mut HandlerContext<'_, HostState>) -> Result<(), HandlerError> {
    let Some(camera) = ctx.app().camera() else {
        debug!("camera stopped before its parameters were announced");
        return Ok(());
    };
    let parameter = camera.connection_parameter();
    ctx.send(Message::CameraConnectionParameter(parameter));
    Ok(())
}

// ── Telemetry ─────────────────────────────────────────────────────────────────

/// Starts, restarts or stops a cyclic telemetry stream.
pub struct SetUpCyclicUpdateHandler;

impl MessageHandler<HostState> for SetUpCyclicUpdateHandler {
    fn message_type(&self) -> MessageType {
        MessageType::SetUpCyclicUpdate
    }

    fn handle(
        &mut self,
        message: &Message,
        ctx: &mut HandlerContext<'_, HostState>,
    ) -> Result<(), HandlerError> {
        let Message::SetUpCyclicUpdate(setup) = message else {
            return Err(HandlerError::unexpected(message));
        };
        let feature = setup.feature_type;
        if ctx.app().cyclic_task_mut(feature).is_none() {
            return Err(HandlerError::FeatureDisabled(disabled_reason(feature).to_string()));
        }

        if setup.is_enabled() && feature == CyclicUpdateFeatureType::Location {
            ctx.enable_location_service();
        }

        let handle = ctx.handle();
        let Some(task) = ctx.app().cyclic_task_mut(feature) else {
            return Ok(());
        };
        if setup.is_enabled() {
            task.start(handle, Duration::from_millis(u64::from(setup.interval)));
        } else {
            task.stop();
        }
        Ok(())
    }
}

fn disabled_reason(feature: CyclicUpdateFeatureType) -> &'static str {
    match feature {
        CyclicUpdateFeatureType::BatteryPower => {
            "Battery power isn't supported, but was requested."
        }
        CyclicUpdateFeatureType::Location => {
            "Location sharing isn't allowed, but was requested."
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rccar_core::domain::location::Location;
    use rccar_core::protocol::codec::{decode_message, encode_message, ProtocolError};
    use rccar_core::protocol::messages::{
        AdjustSpeedMessage, AuthenticationMessage, CameraConnectionParameterMessage,
        GreetingMessage, RequestCameraMessage, RotateCameraMessage, SetUpCyclicUpdateMessage,
        TurnCarMessage,
    };
    use rccar_core::service::location::FeedLocationService;
    use rccar_core::session::{ConnectionLost, Session, SessionError};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;
    use crate::application::camera::MockCameraStreaming;
    use crate::application::host_logic::{
        start_host_session, HostDependencies, HostListener, HostSettings,
    };
    use crate::application::vehicle::{CarFeatures, MockVehicleControl};

    // ── Fixtures ──────────────────────────────────────────────────────────────

    #[derive(Default)]
    struct Events {
        established: usize,
        lost: Vec<String>,
        closed: usize,
    }

    struct RecordingListener(Arc<Mutex<Events>>);

    impl HostListener for RecordingListener {
        fn connection_established(&mut self) {
            self.0.lock().unwrap().established += 1;
        }

        fn connection_lost(&mut self, lost: &ConnectionLost) {
            self.0.lock().unwrap().lost.push(lost.cause.to_string());
        }

        fn session_closed(&mut self) {
            self.0.lock().unwrap().closed += 1;
        }
    }

    fn settings() -> HostSettings {
        HostSettings {
            password: "FooBar".to_string(),
            share_location: true,
            share_bearing: true,
            share_speed: false,
            share_camera: true,
            rotate_camera: true,
            camera_startup_delay: Duration::from_millis(10),
        }
    }

    fn car() -> CarFeatures {
        CarFeatures {
            camera_pan_min: 1.0,
            camera_pan_max: 1.0,
            camera_tilt_min: 0.5,
            camera_tilt_max: 0.5,
            adjustable_speed: true,
            drive_backward: false,
            battery_power: true,
        }
    }

    /// A vehicle that accepts every command and expects the reset on close.
    fn lenient_vehicle(features: CarFeatures) -> MockVehicleControl {
        let mut vehicle = MockVehicleControl::new();
        vehicle.expect_features().return_const(features);
        vehicle.expect_adjust_speed().returning(|_| Ok(()));
        vehicle.expect_turn_car().returning(|_| Ok(()));
        vehicle.expect_rotate_camera().returning(|_, _| Ok(()));
        vehicle.expect_battery_level().returning(|| Ok(80.0));
        vehicle
    }

    fn camera_factory() -> crate::application::camera::CameraFactory {
        Box::new(|| {
            let mut camera = MockCameraStreaming::new();
            camera.expect_start().returning(|| Ok(()));
            camera.expect_stop().return_const(());
            camera
                .expect_connection_parameter()
                .return_const(CameraConnectionParameterMessage {
                    port: 8080,
                    protocol: "http".to_string(),
                    path: "videofeed".to_string(),
                });
            Box::new(camera)
        })
    }

    struct Peer {
        stream: TcpStream,
        buffer: Vec<u8>,
    }

    impl Peer {
        async fn send(&mut self, message: Message) {
            let bytes = encode_message(&message).unwrap();
            self.stream.write_all(&bytes).await.unwrap();
        }

        async fn recv(&mut self) -> Message {
            loop {
                match decode_message(&self.buffer) {
                    Ok((message, consumed)) => {
                        self.buffer.drain(..consumed);
                        return message;
                    }
                    Err(ProtocolError::InsufficientData { .. }) => {
                        let mut chunk = [0u8; 1024];
                        let n = self.stream.read(&mut chunk).await.unwrap();
                        assert!(n > 0, "host closed the connection");
                        self.buffer.extend_from_slice(&chunk[..n]);
                    }
                    Err(e) => panic!("unexpected decode error: {e}"),
                }
            }
        }
    }

    async fn connect(
        vehicle: MockVehicleControl,
        settings: HostSettings,
    ) -> (Session<HostState>, Peer, Arc<Mutex<Events>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();

        let events = Arc::new(Mutex::new(Events::default()));
        let deps = HostDependencies {
            settings,
            vehicle: Box::new(vehicle),
            camera_factory: camera_factory(),
            location: Some(Box::new(|| {
                Box::new(FeedLocationService::fixed(Location::new(52.5, 13.4)))
                    as Box<dyn rccar_core::service::location::LocationService>
            })),
            listener: Box::new(RecordingListener(events.clone())),
        };
        let session = start_host_session(server, deps).await;
        let peer = Peer {
            stream: client,
            buffer: Vec::new(),
        };
        (session, peer, events)
    }

    async fn authenticate(session: &mut Session<HostState>, peer: &mut Peer, password: &str) {
        let Message::Greeting(GreetingMessage { auth_salt, .. }) = peer.recv().await else {
            panic!("expected greeting");
        };
        peer.send(Message::Authentication(AuthenticationMessage {
            password_hash: hash_password(password, &auth_salt),
        }))
        .await;
        session.step().await;
    }

    // ── Authentication ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_correct_password_registers_command_handlers_and_sends_features() {
        // Arrange
        let (mut session, mut peer, events) = connect(lenient_vehicle(car()), settings()).await;

        // Act
        authenticate(&mut session, &mut peer, "FooBar").await;

        // Assert
        let Message::Feature(features) = peer.recv().await else {
            panic!("expected feature message");
        };
        assert!(features.camera);
        assert!(features.location);
        assert!(!features.speed);
        assert!(features.battery_power);
        assert!(!session.has_handler(MessageType::Authentication));
        for ty in [
            MessageType::TurnCar,
            MessageType::AdjustSpeed,
            MessageType::RequestCamera,
            MessageType::RotateCamera,
            MessageType::SetUpCyclicUpdate,
        ] {
            assert!(session.has_handler(ty), "{ty:?} should be registered");
        }
        assert_eq!(events.lock().unwrap().established, 1);
    }

    #[tokio::test]
    async fn test_wrong_password_sends_reason_and_ends_session() {
        // Arrange
        let (mut session, mut peer, events) = connect(lenient_vehicle(car()), settings()).await;

        // Act
        authenticate(&mut session, &mut peer, "wrong").await;

        // Assert
        assert_eq!(
            peer.recv().await,
            Message::AuthenticationFailed(AuthenticationFailedMessage {
                reason: PASSWORD_MISMATCH_REASON.to_string()
            })
        );
        assert!(session.is_closed());
        let events = events.lock().unwrap();
        assert_eq!(events.established, 0);
        assert_eq!(events.lost.len(), 1);
        assert!(events.lost[0].contains(PASSWORD_MISMATCH_REASON));
    }

    #[tokio::test]
    async fn test_minimal_host_registers_driving_handlers_only() {
        // Arrange
        let bare = CarFeatures {
            battery_power: false,
            ..CarFeatures::default()
        };
        let settings = HostSettings {
            share_location: false,
            share_bearing: false,
            share_speed: false,
            share_camera: false,
            ..settings()
        };
        let (mut session, mut peer, _) = connect(lenient_vehicle(bare), settings).await;

        // Act
        authenticate(&mut session, &mut peer, "FooBar").await;

        // Assert
        assert!(matches!(peer.recv().await, Message::Feature(_)));
        assert_eq!(session.handler_count(), 2);
        assert!(session.has_handler(MessageType::TurnCar));
        assert!(session.has_handler(MessageType::AdjustSpeed));
    }

    #[tokio::test]
    async fn test_camera_without_rotation_hides_ranges() {
        // Arrange
        let settings = HostSettings {
            rotate_camera: false,
            ..settings()
        };
        let (mut session, mut peer, _) = connect(lenient_vehicle(car()), settings).await;

        // Act
        authenticate(&mut session, &mut peer, "FooBar").await;

        // Assert
        let Message::Feature(features) = peer.recv().await else {
            panic!("expected feature message");
        };
        assert_eq!(features.camera_pan_max, 0.0);
        assert!(!features.supports_rotate_camera());
        assert!(session.has_handler(MessageType::RequestCamera));
        assert!(!session.has_handler(MessageType::RotateCamera));
    }

    // ── Driving ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_driving_commands_reach_the_vehicle() {
        // Arrange
        let mut vehicle = MockVehicleControl::new();
        vehicle.expect_features().return_const(car());
        vehicle
            .expect_adjust_speed()
            .withf(|speed| *speed == 0.75)
            .times(1)
            .returning(|_| Ok(()));
        vehicle
            .expect_turn_car()
            .withf(|rotation| *rotation == -0.5)
            .times(1)
            .returning(|_| Ok(()));
        vehicle
            .expect_rotate_camera()
            .withf(|pan, tilt| *pan == 0.5 && *tilt == -0.25)
            .times(1)
            .returning(|_, _| Ok(()));
        // Reset issued when the session is dropped.
        vehicle.expect_adjust_speed().withf(|s| *s == 0.0).returning(|_| Ok(()));
        vehicle.expect_turn_car().withf(|r| *r == 0.0).returning(|_| Ok(()));
        vehicle
            .expect_rotate_camera()
            .withf(|p, t| *p == 0.0 && *t == 0.0)
            .returning(|_, _| Ok(()));
        let (mut session, mut peer, _) = connect(vehicle, settings()).await;
        authenticate(&mut session, &mut peer, "FooBar").await;
        peer.recv().await;

        // Act
        peer.send(Message::AdjustSpeed(AdjustSpeedMessage { speed: 0.75 }))
            .await;
        session.step().await;
        peer.send(Message::TurnCar(TurnCarMessage { rotation: -0.5 }))
            .await;
        session.step().await;
        peer.send(Message::RotateCamera(RotateCameraMessage {
            pan: 0.5,
            tilt: -0.25,
        }))
        .await;
        session.step().await;

        // Assert
        assert!(!session.is_closed());
    }

    #[tokio::test]
    async fn test_backward_speed_on_forward_only_car_ends_session() {
        // Arrange
        let (mut session, mut peer, events) = connect(lenient_vehicle(car()), settings()).await;
        authenticate(&mut session, &mut peer, "FooBar").await;
        peer.recv().await;

        // Act
        peer.send(Message::AdjustSpeed(AdjustSpeedMessage { speed: -0.5 }))
            .await;
        session.step().await;

        // Assert
        assert!(session.is_closed());
        let events = events.lock().unwrap();
        assert_eq!(events.lost.len(), 1);
        assert_eq!(events.closed, 1);
    }

    // ── Camera ────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_request_camera_announces_parameters_after_startup_delay() {
        // Arrange
        let (mut session, mut peer, _) = connect(lenient_vehicle(car()), settings()).await;
        authenticate(&mut session, &mut peer, "FooBar").await;
        peer.recv().await;

        // Act
        peer.send(Message::RequestCamera(RequestCameraMessage {
            activate_camera: true,
        }))
        .await;
        session.step().await;
        session.step().await;

        // Assert
        assert!(session.app().camera_active());
        assert_eq!(
            peer.recv().await,
            Message::CameraConnectionParameter(CameraConnectionParameterMessage {
                port: 8080,
                protocol: "http".to_string(),
                path: "videofeed".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_activating_an_active_camera_is_an_error() {
        // Arrange
        let settings = HostSettings {
            camera_startup_delay: Duration::from_secs(60),
            ..settings()
        };
        let (mut session, mut peer, events) = connect(lenient_vehicle(car()), settings).await;
        authenticate(&mut session, &mut peer, "FooBar").await;
        peer.recv().await;
        let activate = Message::RequestCamera(RequestCameraMessage {
            activate_camera: true,
        });

        // Act
        peer.send(activate.clone()).await;
        session.step().await;
        peer.send(activate).await;
        session.step().await;

        // Assert
        assert!(session.is_closed());
        assert_eq!(events.lock().unwrap().lost.len(), 1);
    }

    #[tokio::test]
    async fn test_deactivating_camera_stops_stream() {
        // Arrange
        let settings = HostSettings {
            camera_startup_delay: Duration::from_secs(60),
            ..settings()
        };
        let (mut session, mut peer, _) = connect(lenient_vehicle(car()), settings).await;
        authenticate(&mut session, &mut peer, "FooBar").await;
        peer.recv().await;

        // Act
        peer.send(Message::RequestCamera(RequestCameraMessage {
            activate_camera: true,
        }))
        .await;
        session.step().await;
        peer.send(Message::RequestCamera(RequestCameraMessage {
            activate_camera: false,
        }))
        .await;
        session.step().await;

        // Assert
        assert!(!session.app().camera_active());
        assert!(!session.is_closed());
    }

    // ── Telemetry ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_battery_cyclic_update_reports_level() {
        // Arrange
        let (mut session, mut peer, _) = connect(lenient_vehicle(car()), settings()).await;
        authenticate(&mut session, &mut peer, "FooBar").await;
        peer.recv().await;

        // Act
        peer.send(Message::SetUpCyclicUpdate(SetUpCyclicUpdateMessage {
            feature_type: CyclicUpdateFeatureType::BatteryPower,
            interval: 60_000,
        }))
        .await;
        session.step().await;
        session.step().await;

        // Assert
        let Message::BatteryPower(battery) = peer.recv().await else {
            panic!("expected battery power");
        };
        assert_eq!(battery.charging_level, 80.0);
        let task = session
            .app_mut()
            .cyclic_task_mut(CyclicUpdateFeatureType::BatteryPower)
            .unwrap();
        assert!(task.is_running());
        assert_eq!(task.interval(), Some(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn test_location_cyclic_update_blanks_unshared_parts() {
        // Arrange
        let (mut session, mut peer, _) = connect(lenient_vehicle(car()), settings()).await;
        authenticate(&mut session, &mut peer, "FooBar").await;
        peer.recv().await;

        // Act
        peer.send(Message::SetUpCyclicUpdate(SetUpCyclicUpdateMessage {
            feature_type: CyclicUpdateFeatureType::Location,
            interval: 1_000,
        }))
        .await;
        session.step().await;
        session.step().await;

        // Assert
        let Message::Location(location) = peer.recv().await else {
            panic!("expected location");
        };
        assert_eq!(location.latitude, 52.5);
        assert_eq!(location.longitude, 13.4);
        assert!(!location.has_speed);
    }

    #[tokio::test]
    async fn test_interval_zero_stops_cyclic_update() {
        // Arrange
        let (mut session, mut peer, _) = connect(lenient_vehicle(car()), settings()).await;
        authenticate(&mut session, &mut peer, "FooBar").await;
        peer.recv().await;
        let setup = |interval| {
            Message::SetUpCyclicUpdate(SetUpCyclicUpdateMessage {
                feature_type: CyclicUpdateFeatureType::BatteryPower,
                interval,
            })
        };

        // Act
        peer.send(setup(60_000)).await;
        session.step().await;
        peer.send(setup(0)).await;
        // The first tick's work item may arrive before the stop request.
        while session
            .app_mut()
            .cyclic_task_mut(CyclicUpdateFeatureType::BatteryPower)
            .unwrap()
            .is_running()
        {
            session.step().await;
        }

        // Assert
        assert!(!session.is_closed());
    }

    #[tokio::test]
    async fn test_battery_request_without_battery_support_fails() {
        // Arrange
        let no_battery = CarFeatures {
            battery_power: false,
            ..car()
        };
        let (mut session, mut peer, events) =
            connect(lenient_vehicle(no_battery), settings()).await;
        authenticate(&mut session, &mut peer, "FooBar").await;
        peer.recv().await;

        // Act
        peer.send(Message::SetUpCyclicUpdate(SetUpCyclicUpdateMessage {
            feature_type: CyclicUpdateFeatureType::BatteryPower,
            interval: 1_000,
        }))
        .await;
        session.step().await;

        // Assert
        assert!(session.is_closed());
        let events = events.lock().unwrap();
        assert!(events.lost[0].contains("Battery power isn't supported"));
    }

    #[tokio::test]
    async fn test_near_empty_battery_ends_session() {
        // Arrange
        let mut vehicle = MockVehicleControl::new();
        vehicle.expect_features().return_const(car());
        vehicle.expect_battery_level().returning(|| Ok(3.0));
        vehicle.expect_adjust_speed().returning(|_| Ok(()));
        vehicle.expect_turn_car().returning(|_| Ok(()));
        vehicle.expect_rotate_camera().returning(|_, _| Ok(()));
        let (mut session, mut peer, events) = connect(vehicle, settings()).await;
        authenticate(&mut session, &mut peer, "FooBar").await;
        peer.recv().await;

        // Act
        peer.send(Message::SetUpCyclicUpdate(SetUpCyclicUpdateMessage {
            feature_type: CyclicUpdateFeatureType::BatteryPower,
            interval: 1_000,
        }))
        .await;
        session.step().await;
        session.step().await;

        // Assert
        assert!(session.is_closed());
        let events = events.lock().unwrap();
        assert!(events.lost[0].contains("near empty"));
    }

    #[test]
    fn test_collaborator_errors_map_to_handler_failure() {
        let err: HandlerError = CameraError::AlreadyActive.into();
        assert!(matches!(
            SessionError::from(err),
            SessionError::HandlerFailure(HandlerError::Collaborator(_))
        ));
    }
}
