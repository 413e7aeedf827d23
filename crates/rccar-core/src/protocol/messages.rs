//! All message types exchanged between the Host (vehicle) and the Client
//! (remote control).
//!
//! On the wire every message is a JSON object whose `"type"` field carries the
//! [`MessageType`] name; all other field names are camelCase.

use serde::{Deserialize, Serialize};

// ── Protocol constants ────────────────────────────────────────────────────────

/// Protocol version announced in the [`GreetingMessage`].
pub const PROTOCOL_VERSION: u32 = 1;

// ── Message type tags ─────────────────────────────────────────────────────────

/// Stable tag of every message variant. Used as the handler registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    Greeting,
    Authentication,
    AuthenticationFailed,
    Feature,
    AdjustSpeed,
    TurnCar,
    RotateCamera,
    RequestCamera,
    CameraConnectionParameter,
    SetUpCyclicUpdate,
    BatteryPower,
    Location,
}

// ── Handshake ─────────────────────────────────────────────────────────────────

/// First message of every session, sent by the Host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GreetingMessage {
    /// Protocol version spoken by the Host.
    pub version: u32,
    /// Per-session salt (40 lowercase hex chars) the Client must hash with.
    pub auth_salt: String,
}

/// The Client's answer to the greeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationMessage {
    /// `hash_password(password, auth_salt)`.
    pub password_hash: String,
}

/// Sent by the Host right before it tears down a session with a wrong password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationFailedMessage {
    pub reason: String,
}

// ── Capabilities ──────────────────────────────────────────────────────────────

/// Capability snapshot of the Host, sent once after successful authentication.
///
/// The pan/tilt bounds are magnitudes: the usable pan range is
/// `[-camera_pan_min, camera_pan_max]`, likewise for tilt.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureMessage {
    /// The Host shares a camera stream.
    pub camera: bool,
    pub camera_pan_min: f32,
    pub camera_pan_max: f32,
    pub camera_tilt_min: f32,
    pub camera_tilt_max: f32,
    /// Speed is continuous rather than on/off.
    pub adjustable_speed: bool,
    /// Negative speeds are accepted.
    pub drive_backward: bool,
    /// The Host shares its position.
    pub location: bool,
    /// The Host shares its bearing.
    pub bearing: bool,
    /// The Host shares its ground speed.
    pub speed: bool,
    /// The Host reports its battery level.
    pub battery_power: bool,
}

impl FeatureMessage {
    pub fn supports_pan_camera(&self) -> bool {
        self.camera_pan_min != 0.0 && self.camera_pan_max != 0.0
    }

    pub fn supports_tilt_camera(&self) -> bool {
        self.camera_tilt_min != 0.0 && self.camera_tilt_max != 0.0
    }

    pub fn supports_rotate_camera(&self) -> bool {
        self.supports_pan_camera() || self.supports_tilt_camera()
    }

    /// `true` when position, bearing or speed is shared.
    pub fn supports_any_location_feature(&self) -> bool {
        self.location || self.bearing || self.speed
    }
}

// ── Driving commands ──────────────────────────────────────────────────────────

/// Requested speed in `[-1, 1]`; negative values drive backward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustSpeedMessage {
    pub speed: f32,
}

/// Requested steering in `[-1, 1]`; negative values turn left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnCarMessage {
    pub rotation: f32,
}

/// Requested camera orientation within the ranges announced in [`FeatureMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotateCameraMessage {
    pub pan: f32,
    pub tilt: f32,
}

// ── Camera ────────────────────────────────────────────────────────────────────

/// Starts (`true`) or stops (`false`) the Host's camera stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCameraMessage {
    pub activate_camera: bool,
}

/// Where the Client can pick up the camera stream. The host part is the
/// address the Client is already connected to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConnectionParameterMessage {
    pub port: u16,
    /// URL scheme of the stream, e.g. `rtsp`.
    pub protocol: String,
    pub path: String,
}

impl CameraConnectionParameterMessage {
    /// Renders `protocol://host:port/path`.
    pub fn to_url(&self, host: &str) -> String {
        format!("{}://{}:{}/{}", self.protocol, host, self.port, self.path)
    }
}

// ── Telemetry ─────────────────────────────────────────────────────────────────

/// Telemetry streams the Client can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CyclicUpdateFeatureType {
    BatteryPower,
    Location,
}

/// Starts, re-times or stops a telemetry stream on the Host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetUpCyclicUpdateMessage {
    pub feature_type: CyclicUpdateFeatureType,
    /// Interval in milliseconds; `0` stops the stream.
    pub interval: u32,
}

impl SetUpCyclicUpdateMessage {
    pub fn is_enabled(&self) -> bool {
        self.interval > 0
    }
}

/// Battery charge level in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryPowerMessage {
    pub charging_level: f32,
}

/// Position report of the Host. Optional values travel with a `has*` flag;
/// a value whose flag is `false` is zero and carries no meaning.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationMessage {
    pub latitude: f64,
    pub longitude: f64,
    pub has_altitude: bool,
    pub altitude: f64,
    pub has_accuracy: bool,
    pub accuracy: f32,
    pub has_bearing: bool,
    pub bearing: f32,
    pub has_speed: bool,
    pub speed: f32,
}

// ── Top-level message enum ────────────────────────────────────────────────────

/// Every message that can travel between Host and Client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    Greeting(GreetingMessage),
    Authentication(AuthenticationMessage),
    AuthenticationFailed(AuthenticationFailedMessage),
    Feature(FeatureMessage),
    AdjustSpeed(AdjustSpeedMessage),
    TurnCar(TurnCarMessage),
    RotateCamera(RotateCameraMessage),
    RequestCamera(RequestCameraMessage),
    CameraConnectionParameter(CameraConnectionParameterMessage),
    SetUpCyclicUpdate(SetUpCyclicUpdateMessage),
    BatteryPower(BatteryPowerMessage),
    Location(LocationMessage),
}

impl Message {
    /// Returns the [`MessageType`] discriminant for this message.
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Greeting(_) => MessageType::Greeting,
            Message::Authentication(_) => MessageType::Authentication,
            Message::AuthenticationFailed(_) => MessageType::AuthenticationFailed,
            Message::Feature(_) => MessageType::Feature,
            Message::AdjustSpeed(_) => MessageType::AdjustSpeed,
            Message::TurnCar(_) => MessageType::TurnCar,
            Message::RotateCamera(_) => MessageType::RotateCamera,
            Message::RequestCamera(_) => MessageType::RequestCamera,
            Message::CameraConnectionParameter(_) => MessageType::CameraConnectionParameter,
            Message::SetUpCyclicUpdate(_) => MessageType::SetUpCyclicUpdate,
            Message::BatteryPower(_) => MessageType::BatteryPower,
            Message::Location(_) => MessageType::Location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_matches_variant() {
        let msg = Message::TurnCar(TurnCarMessage { rotation: -0.5 });
        assert_eq!(msg.message_type(), MessageType::TurnCar);

        let msg = Message::Feature(FeatureMessage::default());
        assert_eq!(msg.message_type(), MessageType::Feature);
    }

    #[test]
    fn test_pan_support_requires_both_bounds() {
        let one_sided = FeatureMessage {
            camera_pan_min: 0.0,
            camera_pan_max: 0.8,
            ..FeatureMessage::default()
        };
        assert!(!one_sided.supports_pan_camera());
        assert!(!one_sided.supports_rotate_camera());

        let both = FeatureMessage {
            camera_pan_min: 0.8,
            camera_pan_max: 0.8,
            ..FeatureMessage::default()
        };
        assert!(both.supports_pan_camera());
        assert!(both.supports_rotate_camera());
    }

    #[test]
    fn test_any_location_feature_is_union_of_flags() {
        assert!(!FeatureMessage::default().supports_any_location_feature());

        let bearing_only = FeatureMessage {
            bearing: true,
            ..FeatureMessage::default()
        };
        assert!(bearing_only.supports_any_location_feature());
    }

    #[test]
    fn test_camera_url_rendering() {
        let param = CameraConnectionParameterMessage {
            port: 8554,
            protocol: "rtsp".to_string(),
            path: "stream".to_string(),
        };
        assert_eq!(param.to_url("192.168.0.7"), "rtsp://192.168.0.7:8554/stream");
    }

    #[test]
    fn test_zero_interval_disables_cyclic_update() {
        let stop = SetUpCyclicUpdateMessage {
            feature_type: CyclicUpdateFeatureType::Location,
            interval: 0,
        };
        assert!(!stop.is_enabled());
    }
}
