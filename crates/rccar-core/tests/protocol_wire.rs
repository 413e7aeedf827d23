//! Wire compatibility tests for the rccar-core protocol codec.
//!
//! These decode hand-written JSON as a peer would put it on the wire and
//! check that the typed messages come out right, then check that a stream of
//! several messages with arbitrary whitespace is cut correctly.

use rccar_core::protocol::messages::{
    CameraConnectionParameterMessage, CyclicUpdateFeatureType, FeatureMessage, LocationMessage,
    SetUpCyclicUpdateMessage,
};
use rccar_core::{decode_message, encode_message, Message, MessageType};

fn decode_all(mut bytes: &[u8]) -> Vec<Message> {
    let mut out = Vec::new();
    while bytes.iter().any(|b| !b.is_ascii_whitespace()) {
        let (msg, consumed) = decode_message(bytes).expect("decode must succeed");
        out.push(msg);
        bytes = &bytes[consumed..];
    }
    out
}

#[test]
fn test_feature_message_from_wire() {
    let raw = br#"{"type":"Feature","camera":true,"cameraPanMin":0.5,"cameraPanMax":0.5,
        "cameraTiltMin":0.25,"cameraTiltMax":0.75,"adjustableSpeed":true,
        "driveBackward":false,"location":true,"bearing":false,"speed":true,
        "batteryPower":true}"#;

    let (msg, _) = decode_message(raw).expect("decode must succeed");

    let Message::Feature(features) = msg else {
        panic!("expected Feature, got {msg:?}");
    };
    assert_eq!(
        features,
        FeatureMessage {
            camera: true,
            camera_pan_min: 0.5,
            camera_pan_max: 0.5,
            camera_tilt_min: 0.25,
            camera_tilt_max: 0.75,
            adjustable_speed: true,
            drive_backward: false,
            location: true,
            bearing: false,
            speed: true,
            battery_power: true,
        }
    );
    assert!(features.supports_rotate_camera());
    assert!(features.supports_any_location_feature());
}

#[test]
fn test_location_message_from_wire() {
    let raw = br#"{"type":"Location","latitude":52.52,"longitude":13.405,
        "hasAltitude":false,"altitude":0.0,"hasAccuracy":true,"accuracy":4.5,
        "hasBearing":true,"bearing":270.0,"hasSpeed":false,"speed":0.0}"#;

    let (msg, consumed) = decode_message(raw).expect("decode must succeed");

    assert_eq!(consumed, raw.len());
    assert_eq!(
        msg,
        Message::Location(LocationMessage {
            latitude: 52.52,
            longitude: 13.405,
            has_accuracy: true,
            accuracy: 4.5,
            has_bearing: true,
            bearing: 270.0,
            ..LocationMessage::default()
        })
    );
}

#[test]
fn test_stream_with_whitespace_between_messages() {
    // Arrange
    let raw = b"{\"type\":\"SetUpCyclicUpdate\",\"featureType\":\"location\",\"interval\":1000}\n\
                \r\n  {\"type\":\"CameraConnectionParameter\",\"port\":8554,\"protocol\":\"rtsp\",\"path\":\"cam\"}\
                {\"type\":\"Authentication\",\"passwordHash\":\"4ddd521ed26364db37e280c91f0aa02e7876fcc7\"}\n";

    // Act
    let messages = decode_all(raw);

    // Assert
    let types: Vec<MessageType> = messages.iter().map(Message::message_type).collect();
    assert_eq!(
        types,
        vec![
            MessageType::SetUpCyclicUpdate,
            MessageType::CameraConnectionParameter,
            MessageType::Authentication,
        ]
    );
    assert_eq!(
        messages[0],
        Message::SetUpCyclicUpdate(SetUpCyclicUpdateMessage {
            feature_type: CyclicUpdateFeatureType::Location,
            interval: 1000,
        })
    );
    assert_eq!(
        messages[1],
        Message::CameraConnectionParameter(CameraConnectionParameterMessage {
            port: 8554,
            protocol: "rtsp".to_string(),
            path: "cam".to_string(),
        })
    );
}

#[test]
fn test_encoded_stream_decodes_message_by_message() {
    let sent = vec![
        Message::SetUpCyclicUpdate(SetUpCyclicUpdateMessage {
            feature_type: CyclicUpdateFeatureType::BatteryPower,
            interval: 0,
        }),
        Message::Feature(FeatureMessage::default()),
    ];
    let mut bytes = Vec::new();
    for msg in &sent {
        bytes.extend(encode_message(msg).unwrap());
    }

    assert_eq!(decode_all(&bytes), sent);
}
