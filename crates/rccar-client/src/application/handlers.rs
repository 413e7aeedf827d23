//! Client message handlers.

use rccar_core::crypto::hash_password;
use rccar_core::domain::Location;
use rccar_core::protocol::messages::{
    AuthenticationMessage, CyclicUpdateFeatureType, FeatureMessage, Message, MessageType,
    RequestCameraMessage, SetUpCyclicUpdateMessage, PROTOCOL_VERSION,
};
use rccar_core::session::{HandlerContext, HandlerError, MessageHandler};
use tracing::{debug, info};

use crate::application::client_logic::ClientState;

// ── Handshake ─────────────────────────────────────────────────────────────────

/// Checks the protocol version and answers with the salted password hash.
pub struct GreetingHandler;

impl MessageHandler<ClientState> for GreetingHandler {
    fn message_type(&self) -> MessageType {
        MessageType::Greeting
    }

    fn handle(
        &mut self,
        message: &Message,
        ctx: &mut HandlerContext<'_, ClientState>,
    ) -> Result<(), HandlerError> {
        let Message::Greeting(greeting) = message else {
            return Err(HandlerError::unexpected(message));
        };
        if greeting.version != PROTOCOL_VERSION {
            return Err(HandlerError::ProtocolVersionMismatch {
                expected: PROTOCOL_VERSION,
                actual: greeting.version,
            });
        }

        ctx.clear_handlers();
        ctx.register_handler(FeatureHandler);
        ctx.register_handler(AuthenticationFailedHandler);

        let password = ctx.app().parameter().password.clone().unwrap_or_default();
        ctx.send(Message::Authentication(AuthenticationMessage {
            password_hash: hash_password(&password, &greeting.auth_salt),
        }));
        debug!("authentication sent");
        Ok(())
    }
}

pub struct AuthenticationFailedHandler;

impl MessageHandler<ClientState> for AuthenticationFailedHandler {
    fn message_type(&self) -> MessageType {
        MessageType::AuthenticationFailed
    }

    fn handle(
        &mut self,
        message: &Message,
        ctx: &mut HandlerContext<'_, ClientState>,
    ) -> Result<(), HandlerError> {
        let Message::AuthenticationFailed(failed) = message else {
            return Err(HandlerError::unexpected(message));
        };
        ctx.clear_handlers();
        Err(HandlerError::AuthenticationFailed(failed.reason.clone()))
    }
}

/// Sets the Client up for what the Host offers.
pub struct FeatureHandler;

impl MessageHandler<ClientState> for FeatureHandler {
    fn message_type(&self) -> MessageType {
        MessageType::Feature
    }

    fn handle(
        &mut self,
        message: &Message,
        ctx: &mut HandlerContext<'_, ClientState>,
    ) -> Result<(), HandlerError> {
        let Message::Feature(features) = message else {
            return Err(HandlerError::unexpected(message));
        };
        let features = *features;
        info!(?features, "authenticated, host features received");

        ctx.clear_handlers();
        ctx.app().set_features(features);
        set_up_cyclic_updates(&features, ctx);
        set_up_camera(&features, ctx);
        ctx.app()
            .listener_mut()
            .enable_driving(features.adjustable_speed, features.drive_backward);
        Ok(())
    }
}

fn set_up_cyclic_updates(features: &FeatureMessage, ctx: &mut HandlerContext<'_, ClientState>) {
    let settings = ctx.app().settings().clone();

    if features.battery_power {
        ctx.register_handler(BatteryPowerHandler);
        ctx.send(Message::SetUpCyclicUpdate(SetUpCyclicUpdateMessage {
            feature_type: CyclicUpdateFeatureType::BatteryPower,
            interval: settings.battery_power_interval_ms,
        }));
    }

    if features.supports_any_location_feature() {
        ctx.register_handler(LocationHandler);
        ctx.enable_location_service();
        ctx.send(Message::SetUpCyclicUpdate(SetUpCyclicUpdateMessage {
            feature_type: CyclicUpdateFeatureType::Location,
            interval: settings.location_interval_ms,
        }));
    }
}

fn set_up_camera(features: &FeatureMessage, ctx: &mut HandlerContext<'_, ClientState>) {
    if !features.camera || !ctx.app().settings().camera_enabled {
        return;
    }
    ctx.register_handler(CameraConnectionParameterHandler);

    let listener = ctx.app().listener_mut();
    if features.supports_pan_camera() {
        listener.enable_pan(features.camera_pan_min, features.camera_pan_max);
    }
    if features.supports_tilt_camera() {
        listener.enable_tilt(features.camera_tilt_min, features.camera_tilt_max);
    }
    ctx.send(Message::RequestCamera(RequestCameraMessage {
        activate_camera: true,
    }));
}

// ── Telemetry ─────────────────────────────────────────────────────────────────

pub struct BatteryPowerHandler;

impl MessageHandler<ClientState> for BatteryPowerHandler {
    fn message_type(&self) -> MessageType {
        MessageType::BatteryPower
    }

    fn handle(
        &mut self,
        message: &Message,
        ctx: &mut HandlerContext<'_, ClientState>,
    ) -> Result<(), HandlerError> {
        let Message::BatteryPower(battery) = message else {
            return Err(HandlerError::unexpected(message));
        };
        let level = battery.charging_level;
        if !(0.0..=100.0).contains(&level) {
            return Err(HandlerError::OutOfRange {
                name: "chargingLevel",
                value: level,
            });
        }
        ctx.app().listener_mut().set_battery_power(level);
        Ok(())
    }
}

/// Shows where the car is relative to the Client, and how it moves.
pub struct LocationHandler;

impl MessageHandler<ClientState> for LocationHandler {
    fn message_type(&self) -> MessageType {
        MessageType::Location
    }

    fn handle(
        &mut self,
        message: &Message,
        ctx: &mut HandlerContext<'_, ClientState>,
    ) -> Result<(), HandlerError> {
        let Message::Location(location) = message else {
            return Err(HandlerError::unexpected(message));
        };
        let remote = Location::from(location);
        let position_shared = ctx.app().features().is_some_and(|f| f.location);

        if position_shared {
            let own = ctx
                .location_service()
                .and_then(|service| service.current_location());
            if let Some(own) = own {
                let distance = own.distance_to(&remote) as f32;
                let bearing_to = own.bearing_to(&remote) as f32;
                ctx.app().listener_mut().set_distance(distance, bearing_to);
            } else {
                debug!("own position unknown, distance skipped");
            }
        }

        let listener = ctx.app().listener_mut();
        if let Some(bearing) = remote.bearing {
            listener.set_bearing(bearing);
        }
        if let Some(speed) = remote.speed {
            listener.set_speed(speed);
        }
        Ok(())
    }
}

/// Starts the video player once the Host's stream is up.
pub struct CameraConnectionParameterHandler;

impl MessageHandler<ClientState> for CameraConnectionParameterHandler {
    fn message_type(&self) -> MessageType {
        MessageType::CameraConnectionParameter
    }

    fn handle(
        &mut self,
        message: &Message,
        ctx: &mut HandlerContext<'_, ClientState>,
    ) -> Result<(), HandlerError> {
        let Message::CameraConnectionParameter(parameter) = message else {
            return Err(HandlerError::unexpected(message));
        };
        let state = ctx.app();
        let url = parameter.to_url(&state.parameter().host);
        info!(%url, "camera stream available");
        state.listener_mut().play_stream(&url);
        Ok(())
    }
}
