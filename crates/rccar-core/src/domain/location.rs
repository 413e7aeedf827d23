//! Geographic position of a peer plus great-circle helpers.

use crate::protocol::messages::LocationMessage;

/// Mean Earth radius in metres (IUGG).
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A position fix with optional extras.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Location {
    /// Degrees, positive north.
    pub latitude: f64,
    /// Degrees, positive east.
    pub longitude: f64,
    /// Metres above the WGS84 ellipsoid.
    pub altitude: Option<f64>,
    /// Horizontal accuracy radius in metres.
    pub accuracy: Option<f32>,
    /// Direction of travel in degrees clockwise from north.
    pub bearing: Option<f32>,
    /// Ground speed in metres per second.
    pub speed: Option<f32>,
}

/// Which parts of a [`Location`] the Host is allowed to share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationSharing {
    pub position: bool,
    pub bearing: bool,
    pub speed: bool,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            ..Self::default()
        }
    }

    /// Great-circle distance to `other` in metres (haversine).
    pub fn distance_to(&self, other: &Location) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
    }

    /// Initial bearing towards `other` in degrees, in `(-180, 180]`.
    pub fn bearing_to(&self, other: &Location) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let y = d_lon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
        y.atan2(x).to_degrees()
    }

    /// Builds the wire form, blanking every part that is not shared.
    pub fn to_message(&self, sharing: LocationSharing) -> LocationMessage {
        let position = sharing.position;
        LocationMessage {
            latitude: if position { self.latitude } else { 0.0 },
            longitude: if position { self.longitude } else { 0.0 },
            has_altitude: position && self.altitude.is_some(),
            altitude: self.altitude.filter(|_| position).unwrap_or_default(),
            has_accuracy: position && self.accuracy.is_some(),
            accuracy: self.accuracy.filter(|_| position).unwrap_or_default(),
            has_bearing: sharing.bearing && self.bearing.is_some(),
            bearing: self.bearing.filter(|_| sharing.bearing).unwrap_or_default(),
            has_speed: sharing.speed && self.speed.is_some(),
            speed: self.speed.filter(|_| sharing.speed).unwrap_or_default(),
        }
    }
}

impl From<&LocationMessage> for Location {
    fn from(msg: &LocationMessage) -> Self {
        Self {
            latitude: msg.latitude,
            longitude: msg.longitude,
            altitude: msg.has_altitude.then_some(msg.altitude),
            accuracy: msg.has_accuracy.then_some(msg.accuracy),
            bearing: msg.has_bearing.then_some(msg.bearing),
            speed: msg.has_speed.then_some(msg.speed),
        }
    }
}
