use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// One record of the route payload as delivered by the loader
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub latitude: f64,
    pub longitude: f64,
    /// Epoch milliseconds
    pub timestamp: i64,
}

/// A recorded position fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Latitude in degrees, [-90, 90]
    pub lat: f64,

    /// Longitude in degrees, [-180, 180]
    pub lng: f64,

    /// Time the fix was recorded
    pub timestamp: DateTime<Utc>,
}

impl Sample {
    pub fn new(lat: f64, lng: f64, timestamp: DateTime<Utc>) -> Self {
        Self { lat, lng, timestamp }
    }

    /// Build a sample from an epoch-millisecond timestamp
    ///
    /// Returns `None` if the timestamp is outside chrono's representable range.
    pub fn from_millis(lat: f64, lng: f64, millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(|timestamp| Self { lat, lng, timestamp })
    }

    /// Timestamp as epoch milliseconds
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// `(lat, lng)` pair for path drawing
    pub fn coordinate(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }

    /// Same position, ignoring time
    pub fn same_position(&self, other: &Sample) -> bool {
        self.lat == other.lat && self.lng == other.lng
    }

    /// Check that the coordinates are finite and inside the valid ranges
    pub fn has_valid_coordinates(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl From<Sample> for RouteRecord {
    fn from(sample: Sample) -> Self {
        Self {
            latitude: sample.lat,
            longitude: sample.lng,
            timestamp: sample.timestamp_millis(),
        }
    }
}
