use crate::core::{RouteRecord, Sample};
use crate::error::RouteError;
use crate::geo;
use chrono::Duration;
use tracing::{debug, warn};

/// An ordered, immutable sequence of samples for one playback session
///
/// Insertion order is chronological order. Timestamps are expected to be
/// non-decreasing but this is not enforced; telemetry handles duplicate or
/// out-of-order timestamps by reporting zero speed for that step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Route {
    samples: Vec<Sample>,
}

impl Route {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    /// The degraded empty route
    pub fn empty() -> Self {
        Self::default()
    }

    /// Convert payload records, failing on the first malformed record
    pub fn try_from_records(records: &[RouteRecord]) -> Result<Self, RouteError> {
        let mut samples = Vec::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            let sample = Sample::from_millis(record.latitude, record.longitude, record.timestamp)
                .ok_or_else(|| RouteError::Malformed {
                    index,
                    reason: format!("timestamp {} out of range", record.timestamp),
                })?;

            if !sample.has_valid_coordinates() {
                return Err(RouteError::Malformed {
                    index,
                    reason: format!("coordinates ({}, {}) out of range", record.latitude, record.longitude),
                });
            }

            samples.push(sample);
        }

        let out_of_order = samples
            .windows(2)
            .filter(|w| w[1].timestamp < w[0].timestamp)
            .count();
        if out_of_order > 0 {
            debug!("Route has {} out-of-order timestamp(s)", out_of_order);
        }

        Ok(Self { samples })
    }

    /// Convert payload records, treating a malformed list as the empty route
    pub fn from_records(records: &[RouteRecord]) -> Self {
        match Self::try_from_records(records) {
            Ok(route) => route,
            Err(e) => {
                warn!("Discarding route payload: {}", e);
                Self::empty()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// Index of the final sample, `None` for an empty route
    pub fn last_index(&self) -> Option<usize> {
        self.samples.len().checked_sub(1)
    }

    /// Samples visited so far, including the one at `cursor`
    pub fn traveled(&self, cursor: usize) -> &[Sample] {
        if self.samples.is_empty() {
            return &[];
        }
        let end = cursor.min(self.samples.len() - 1) + 1;
        &self.samples[..end]
    }

    /// Full path as `(lat, lng)` pairs
    pub fn coordinates(&self) -> Vec<(f64, f64)> {
        self.samples.iter().map(Sample::coordinate).collect()
    }

    /// Sum of great-circle distances between consecutive samples
    pub fn total_distance_meters(&self) -> f64 {
        self.samples
            .windows(2)
            .map(|w| geo::distance_meters(&w[0], &w[1]))
            .sum()
    }

    /// Time between the first and last sample
    pub fn duration(&self) -> Duration {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => last.timestamp - first.timestamp,
            _ => Duration::zero(),
        }
    }

    /// Payload records for this route
    pub fn to_records(&self) -> Vec<RouteRecord> {
        self.samples.iter().copied().map(RouteRecord::from).collect()
    }
}

impl From<Vec<Sample>> for Route {
    fn from(samples: Vec<Sample>) -> Self {
        Self::new(samples)
    }
}
