pub mod metrics;

pub use metrics::{
    average_speed_kmh, bearing_degrees, distance_meters, elapsed_seconds, estimate_eta,
    eta_from_samples, instantaneous_speed_kmh, playback_multiplier, progress_pct,
    remaining_distance_meters, speed_kmh, traveled_distance_meters, Eta, EtaModel,
    EARTH_RADIUS_M, REFERENCE_RATE_MS,
};
