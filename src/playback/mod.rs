pub mod driver;
pub mod engine;
pub mod scheduler;
pub mod telemetry;

pub use driver::{PlaybackCommand, PlaybackDriver, PlaybackHandle};
pub use engine::PlaybackEngine;
pub use scheduler::{DeadlineScheduler, ManualScheduler, TickId, TickScheduler};
pub use telemetry::TelemetrySnapshot;

use crate::geo::{EtaModel, REFERENCE_RATE_MS};
use serde::{Deserialize, Serialize};

/// Default interval between cursor advances
pub const DEFAULT_RATE_MS: u64 = REFERENCE_RATE_MS;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Route loaded, cursor at the start, nothing scheduled
    Idle,
    Playing,
    Paused,
    /// Cursor reached the last sample on its own
    Finished,
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Finished => "finished",
        };
        f.pad(label)
    }
}

/// Playback configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackConfig {
    pub rate_ms: u64,  // wall-clock ms per cursor step, smaller = faster
    pub eta_model: EtaModel,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            rate_ms: DEFAULT_RATE_MS,
            eta_model: EtaModel::default(),
        }
    }
}
