use crate::core::Sample;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Mean Earth radius used by the spherical model
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Playback rate that corresponds to a 1.0x multiplier
pub const REFERENCE_RATE_MS: u64 = 2000;

const MS_TO_KMH: f64 = 3.6;

/// Great-circle distance in meters (haversine)
pub fn distance_meters(a: &Sample, b: &Sample) -> f64 {
    if a.same_position(b) {
        return 0.0;
    }

    // abs() keeps the result bit-identical when a and b are swapped
    let dlat = (b.lat - a.lat).abs().to_radians();
    let dlng = (b.lng - a.lng).abs().to_radians();
    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlng / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);

    EARTH_RADIUS_M * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Initial bearing from `a` towards `b`, degrees clockwise from north in [0, 360)
pub fn bearing_degrees(a: &Sample, b: &Sample) -> f64 {
    if a.same_position(b) {
        return 0.0;
    }

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let y = dlng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlng.cos();
    let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);

    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if bearing >= 360.0 { 0.0 } else { bearing }
}

/// Signed seconds from `prev` to `curr`
pub fn elapsed_seconds(prev: &Sample, curr: &Sample) -> f64 {
    (curr.timestamp - prev.timestamp).num_milliseconds() as f64 / 1000.0
}

/// Speed between two samples in km/h
///
/// Duplicate or out-of-order timestamps yield 0. The result is never
/// negative, NaN or infinite, and is not clamped to a physical maximum.
pub fn speed_kmh(prev: &Sample, curr: &Sample) -> f64 {
    let elapsed = elapsed_seconds(prev, curr);
    if elapsed <= 0.0 {
        return 0.0;
    }

    let speed = distance_meters(prev, curr) / elapsed * MS_TO_KMH;
    if speed.is_finite() { speed } else { 0.0 }
}

/// Speed over the two most recent samples at `cursor`
///
/// At cursor 0 there is no previous sample and the speed is 0.
pub fn instantaneous_speed_kmh(route: &[Sample], cursor: usize) -> f64 {
    if cursor == 0 || cursor >= route.len() {
        return 0.0;
    }
    speed_kmh(&route[cursor - 1], &route[cursor])
}

/// Average speed from the first sample up to `cursor`
pub fn average_speed_kmh(route: &[Sample], cursor: usize) -> f64 {
    if cursor == 0 || cursor >= route.len() {
        return 0.0;
    }

    let elapsed = elapsed_seconds(&route[0], &route[cursor]);
    if elapsed <= 0.0 {
        return 0.0;
    }

    let speed = traveled_distance_meters(route, cursor) / elapsed * MS_TO_KMH;
    if speed.is_finite() { speed } else { 0.0 }
}

/// Distance covered from the first sample to `cursor`
pub fn traveled_distance_meters(route: &[Sample], cursor: usize) -> f64 {
    let end = cursor.min(route.len().saturating_sub(1));
    path_length(&route[..route.len().min(end + 1)])
}

/// Distance left from `cursor` to the final sample
pub fn remaining_distance_meters(route: &[Sample], cursor: usize) -> f64 {
    if cursor >= route.len() {
        return 0.0;
    }
    path_length(&route[cursor..])
}

fn path_length(samples: &[Sample]) -> f64 {
    samples.windows(2).map(|w| distance_meters(&w[0], &w[1])).sum()
}

/// Estimated remaining time to reach the final sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Eta {
    Remaining(Duration),
    /// Route complete, or the vehicle is not moving
    NotAvailable,
}

impl Eta {
    pub fn is_available(&self) -> bool {
        matches!(self, Eta::Remaining(_))
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Eta::Remaining(d) => Some(*d),
            Eta::NotAvailable => None,
        }
    }
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let remaining = match self {
            Eta::Remaining(d) => d,
            Eta::NotAvailable => return write!(f, "N/A"),
        };

        let secs = remaining.as_secs_f64().round() as u64;
        let (hours, mins, secs) = (secs / 3600, (secs % 3600) / 60, secs % 60);

        if hours > 0 {
            write!(f, "{}h {:02}m", hours, mins)
        } else if mins > 0 {
            write!(f, "{}m {:02}s", mins, secs)
        } else {
            write!(f, "{}s", secs)
        }
    }
}

impl Serialize for Eta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// How remaining time is estimated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EtaModel {
    /// Remaining path length over the current instantaneous speed
    #[default]
    CumulativeDistance,
    /// Remaining path length over the average speed so far
    AverageExtrapolation,
}

impl FromStr for EtaModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cumulative" | "cumulative_distance" => Ok(EtaModel::CumulativeDistance),
            "average" | "average_extrapolation" => Ok(EtaModel::AverageExtrapolation),
            other => Err(format!("unknown ETA model '{}' (expected 'cumulative' or 'average')", other)),
        }
    }
}

/// ETA from `cursor` assuming `speed_kmh` holds for the rest of the route
pub fn eta_from_samples(route: &[Sample], cursor: usize, speed_kmh: f64) -> Eta {
    if cursor >= route.len().saturating_sub(1) || speed_kmh <= 0.0 || !speed_kmh.is_finite() {
        return Eta::NotAvailable;
    }

    let secs = remaining_distance_meters(route, cursor) / (speed_kmh / MS_TO_KMH);
    match Duration::try_from_secs_f64(secs) {
        Ok(d) => Eta::Remaining(d),
        Err(_) => Eta::NotAvailable,
    }
}

/// ETA from `cursor` using the speed that `model` selects
pub fn estimate_eta(route: &[Sample], cursor: usize, model: EtaModel) -> Eta {
    let speed = match model {
        EtaModel::CumulativeDistance => instantaneous_speed_kmh(route, cursor),
        EtaModel::AverageExtrapolation => average_speed_kmh(route, cursor),
    };
    eta_from_samples(route, cursor, speed)
}

/// Fraction of the route covered, in percent
pub fn progress_pct(cursor: usize, len: usize) -> f64 {
    if len <= 1 {
        return 0.0;
    }
    let last = len - 1;
    cursor.min(last) as f64 / last as f64 * 100.0
}

/// Speed multiplier shown for a tick interval (2000 ms = 1.0x)
pub fn playback_multiplier(rate_ms: u64) -> f64 {
    if rate_ms == 0 {
        return 0.0;
    }
    REFERENCE_RATE_MS as f64 / rate_ms as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(lat: f64, lng: f64, ms: i64) -> Sample {
        Sample::from_millis(lat, lng, ms).unwrap()
    }

    #[test]
    fn test_distance_symmetric() {
        let pairs = [
            (sample(17.0, 78.0, 0), sample(17.001, 78.001, 0)),
            (sample(-33.86, 151.2, 0), sample(51.5, -0.12, 0)),
            (sample(89.9, 179.9, 0), sample(-89.9, -179.9, 0)),
        ];
        for (a, b) in pairs {
            assert_eq!(distance_meters(&a, &b), distance_meters(&b, &a));
        }
    }

    #[test]
    fn test_distance_same_point_is_zero() {
        let a = sample(17.385544, 78.487471, 0);
        assert_eq!(distance_meters(&a, &a), 0.0);
        assert_eq!(distance_meters(&a, &sample(17.385544, 78.487471, 99_000)), 0.0);
    }

    #[test]
    fn test_distance_one_degree_on_equator() {
        let d = distance_meters(&sample(0.0, 0.0, 0), &sample(0.0, 1.0, 0));
        // 2 * pi * R / 360
        assert!((d - 111_194.93).abs() < 0.1, "got {}", d);
    }

    #[test]
    fn test_bearing() {
        let origin = sample(0.0, 0.0, 0);
        assert!((bearing_degrees(&origin, &sample(1.0, 0.0, 0)) - 0.0).abs() < 1e-9);
        assert!((bearing_degrees(&origin, &sample(0.0, 1.0, 0)) - 90.0).abs() < 1e-9);
        assert!((bearing_degrees(&origin, &sample(-1.0, 0.0, 0)) - 180.0).abs() < 1e-9);
        assert!((bearing_degrees(&origin, &sample(0.0, -1.0, 0)) - 270.0).abs() < 1e-9);
        assert_eq!(bearing_degrees(&origin, &origin), 0.0);
    }

    #[test]
    fn test_speed_two_samples_a_minute_apart() {
        let a = sample(17.0, 78.0, 0);
        let b = sample(17.001, 78.001, 60_000);
        let d = distance_meters(&a, &b);
        assert!((d - 150.0).abs() < 15.0, "distance {}", d);

        let speed = speed_kmh(&a, &b);
        assert!((speed - d / 60.0 * 3.6).abs() < 1e-9);
        assert!((speed - 8.4).abs() < 1.5, "speed {}", speed);
    }

    #[test]
    fn test_speed_guards() {
        let a = sample(17.0, 78.0, 1000);
        let same_time = sample(17.5, 78.5, 1000);
        let earlier = sample(17.5, 78.5, 0);
        assert_eq!(speed_kmh(&a, &same_time), 0.0);
        assert_eq!(speed_kmh(&a, &earlier), 0.0);

        // Huge distance over one millisecond is large but finite
        let far = sample(-17.0, -102.0, 1001);
        let speed = speed_kmh(&a, &far);
        assert!(speed.is_finite() && speed > 1e9);
    }

    #[test]
    fn test_instantaneous_speed_at_start_is_zero() {
        let route = vec![sample(17.0, 78.0, 0), sample(17.001, 78.001, 60_000)];
        assert_eq!(instantaneous_speed_kmh(&route, 0), 0.0);
        assert!(instantaneous_speed_kmh(&route, 1) > 0.0);
        assert_eq!(instantaneous_speed_kmh(&route, 5), 0.0);
    }

    #[test]
    fn test_eta_cumulative_distance() {
        // Evenly spaced, constant speed: 0.001 deg of latitude per 10s
        let route: Vec<Sample> = (0..5)
            .map(|i| sample(17.0 + i as f64 * 0.001, 78.0, i * 10_000))
            .collect();

        let eta = estimate_eta(&route, 1, EtaModel::CumulativeDistance);
        let secs = eta.as_duration().unwrap().as_secs_f64();
        assert!((secs - 30.0).abs() < 0.01, "eta {}", secs);

        assert_eq!(estimate_eta(&route, 4, EtaModel::CumulativeDistance), Eta::NotAvailable);
        assert_eq!(estimate_eta(&route, 0, EtaModel::CumulativeDistance), Eta::NotAvailable);
    }

    #[test]
    fn test_eta_models_differ_when_speed_changes() {
        // Slow first leg, fast second leg
        let route = vec![
            sample(17.000, 78.0, 0),
            sample(17.001, 78.0, 100_000),
            sample(17.002, 78.0, 110_000),
            sample(17.003, 78.0, 120_000),
        ];

        let cumulative = estimate_eta(&route, 2, EtaModel::CumulativeDistance);
        let average = estimate_eta(&route, 2, EtaModel::AverageExtrapolation);
        assert!((cumulative.as_duration().unwrap().as_secs_f64() - 10.0).abs() < 0.01);
        assert!((average.as_duration().unwrap().as_secs_f64() - 55.0).abs() < 0.01);
    }

    #[test]
    fn test_eta_zero_speed() {
        let route = vec![sample(17.0, 78.0, 0), sample(17.0, 78.0, 0), sample(17.1, 78.0, 10_000)];
        assert_eq!(eta_from_samples(&route, 1, 0.0), Eta::NotAvailable);
        assert_eq!(eta_from_samples(&route, usize::MAX, 5.0), Eta::NotAvailable);
        assert_eq!(eta_from_samples(&[], 0, 5.0), Eta::NotAvailable);
        assert_eq!(estimate_eta(&route, 1, EtaModel::CumulativeDistance), Eta::NotAvailable);
    }

    #[test]
    fn test_eta_display() {
        assert_eq!(Eta::NotAvailable.to_string(), "N/A");
        assert_eq!(Eta::Remaining(Duration::from_secs(12)).to_string(), "12s");
        assert_eq!(Eta::Remaining(Duration::from_secs(245)).to_string(), "4m 05s");
        assert_eq!(Eta::Remaining(Duration::from_secs(3720)).to_string(), "1h 02m");
    }

    #[test]
    fn test_progress() {
        assert_eq!(progress_pct(0, 5), 0.0);
        assert_eq!(progress_pct(2, 5), 50.0);
        assert_eq!(progress_pct(4, 5), 100.0);
        assert_eq!(progress_pct(0, 1), 0.0);
        assert_eq!(progress_pct(0, 0), 0.0);
    }

    #[test]
    fn test_eta_model_from_str() {
        assert_eq!("average".parse::<EtaModel>(), Ok(EtaModel::AverageExtrapolation));
        assert_eq!("Cumulative".parse::<EtaModel>(), Ok(EtaModel::CumulativeDistance));
        assert!("linear".parse::<EtaModel>().is_err());
    }

    #[test]
    fn test_playback_multiplier() {
        assert_eq!(playback_multiplier(2000), 1.0);
        assert_eq!(playback_multiplier(500), 4.0);
        assert_eq!(playback_multiplier(0), 0.0);
    }
}
