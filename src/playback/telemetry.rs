use crate::core::{Route, Sample};
use crate::geo::{self, Eta};
use crate::playback::{PlaybackConfig, PlaybackState};
use serde::Serialize;
use std::fmt;

/// Telemetry derived from the route and the current cursor
///
/// Never stored by the engine; every call to
/// [`PlaybackEngine::snapshot`](crate::playback::PlaybackEngine::snapshot)
/// recomputes it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    /// Sample at the cursor, `None` for an empty route
    pub position: Option<Sample>,
    pub cursor: usize,
    pub len: usize,
    pub speed_kmh: f64,
    pub eta: Eta,
    pub progress_pct: f64,
    /// Bearing from the previous sample, for marker rotation
    pub heading_deg: Option<f64>,
    pub distance_traveled_m: f64,
    pub distance_remaining_m: f64,
    pub state: PlaybackState,
    pub playing: bool,
    pub rate_ms: u64,
}

impl TelemetrySnapshot {
    pub fn capture(route: &Route, cursor: usize, state: PlaybackState, config: &PlaybackConfig) -> Self {
        let samples = route.samples();
        let position = route.get(cursor).copied();

        let heading_deg = match cursor {
            0 => None,
            _ => samples
                .get(cursor - 1)
                .zip(position.as_ref())
                .map(|(prev, curr)| geo::bearing_degrees(prev, curr)),
        };

        Self {
            position,
            cursor,
            len: route.len(),
            speed_kmh: geo::instantaneous_speed_kmh(samples, cursor),
            eta: geo::estimate_eta(samples, cursor, config.eta_model),
            progress_pct: geo::progress_pct(cursor, route.len()),
            heading_deg,
            distance_traveled_m: geo::traveled_distance_meters(samples, cursor),
            distance_remaining_m: geo::remaining_distance_meters(samples, cursor),
            state,
            playing: state == PlaybackState::Playing,
            rate_ms: config.rate_ms,
        }
    }

    /// Playback speed multiplier for display
    pub fn multiplier(&self) -> f64 {
        geo::playback_multiplier(self.rate_ms)
    }
}

impl fmt::Display for TelemetrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:>8}] ", self.state)?;
        match &self.position {
            Some(p) => write!(
                f,
                "{}/{}  {:.6}, {:.6}  {}",
                self.cursor + 1,
                self.len,
                p.lat,
                p.lng,
                p.timestamp.format("%H:%M:%S"),
            )?,
            None => write!(f, "no route")?,
        }
        write!(
            f,
            "  {:.1} km/h  ETA {}  {:.1}%  ({:.1}x)",
            self.speed_kmh,
            self.eta,
            self.progress_pct,
            self.multiplier(),
        )
    }
}
