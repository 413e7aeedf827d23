//! Criterion benchmarks for the JSON stream codec.
//!
//! Driving commands are sent many times per second while a user steers, so
//! their encode and decode latency is what matters most.
//!
//! Run with:
//! ```bash
//! cargo bench --package rccar-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rccar_core::protocol::codec::{decode_message, encode_message};
use rccar_core::protocol::messages::{
    AdjustSpeedMessage, FeatureMessage, LocationMessage, Message, RotateCameraMessage,
    TurnCarMessage,
};

// ── Message fixtures ──────────────────────────────────────────────────────────

fn make_turn_car() -> Message {
    Message::TurnCar(TurnCarMessage { rotation: -0.42 })
}

fn make_adjust_speed() -> Message {
    Message::AdjustSpeed(AdjustSpeedMessage { speed: 0.8 })
}

fn make_rotate_camera() -> Message {
    Message::RotateCamera(RotateCameraMessage {
        pan: 0.3,
        tilt: -0.1,
    })
}

fn make_location() -> Message {
    Message::Location(LocationMessage {
        latitude: 52.520_008,
        longitude: 13.404_954,
        has_altitude: true,
        altitude: 34.0,
        has_accuracy: true,
        accuracy: 3.5,
        has_bearing: true,
        bearing: 181.0,
        has_speed: true,
        speed: 2.2,
    })
}

fn make_feature() -> Message {
    Message::Feature(FeatureMessage {
        camera: true,
        camera_pan_min: 1.0,
        camera_pan_max: 1.0,
        camera_tilt_min: 0.5,
        camera_tilt_max: 0.5,
        adjustable_speed: true,
        drive_backward: true,
        location: true,
        bearing: true,
        speed: true,
        battery_power: true,
    })
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    for (name, msg) in [
        ("TurnCar", make_turn_car()),
        ("AdjustSpeed", make_adjust_speed()),
        ("Location", make_location()),
        ("Feature", make_feature()),
    ] {
        group.bench_function(name, |b| b.iter(|| encode_message(black_box(&msg)).unwrap()));
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for (name, msg) in [
        ("TurnCar", make_turn_car()),
        ("RotateCamera", make_rotate_camera()),
        ("Location", make_location()),
        ("Feature", make_feature()),
    ] {
        let bytes = encode_message(&msg).unwrap();
        group.bench_function(name, |b| b.iter(|| decode_message(black_box(&bytes)).unwrap()));
    }
    group.finish();
}

/// Decoding the first message out of a buffer that holds a burst of steering
/// commands, as the listener loop does after a large read.
fn bench_decode_from_burst(c: &mut Criterion) {
    let mut burst = Vec::new();
    for _ in 0..32 {
        burst.extend(encode_message(&make_turn_car()).unwrap());
        burst.extend(encode_message(&make_adjust_speed()).unwrap());
    }

    c.bench_function("decode_burst_64", |b| {
        b.iter(|| {
            let mut rest = black_box(burst.as_slice());
            while !rest.is_empty() {
                let (_, consumed) = decode_message(rest).unwrap();
                rest = &rest[consumed..];
            }
        })
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_decode_from_burst);
criterion_main!(benches);
