use crate::core::{Route, Sample};
use crate::error::PlaybackError;
use crate::geo::EtaModel;
use crate::playback::scheduler::{ManualScheduler, TickId, TickScheduler};
use crate::playback::{PlaybackConfig, PlaybackState, TelemetrySnapshot};
use std::time::Duration;
use tracing::{debug, info, trace};

/// Playback engine for a recorded route
///
/// Owns the cursor, the play/pause state and the one pending tick. Ticks
/// are requested from the scheduler `S` and delivered back through
/// [`on_tick`](Self::on_tick) by whoever drives the clock.
pub struct PlaybackEngine<S: TickScheduler> {
    route: Route,
    config: PlaybackConfig,
    state: PlaybackState,
    cursor: usize,
    scheduler: S,
    pending_tick: Option<TickId>,
}

impl<S: TickScheduler> PlaybackEngine<S> {
    pub fn new(route: Route, scheduler: S) -> Self {
        Self::with_config(route, scheduler, PlaybackConfig::default())
    }

    pub fn with_config(route: Route, scheduler: S, config: PlaybackConfig) -> Self {
        info!("Route loaded: {} samples", route.len());
        Self {
            route,
            config,
            state: PlaybackState::Idle,
            cursor: 0,
            scheduler,
            pending_tick: None,
        }
    }

    /// Get the route being played
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Get current cursor (index into the route)
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Get current playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Check if currently playing
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Get current tick interval
    pub fn rate_ms(&self) -> u64 {
        self.config.rate_ms
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// The tick the engine is waiting for, if any
    pub fn pending_tick(&self) -> Option<TickId> {
        self.pending_tick
    }

    /// Start or resume playback
    ///
    /// Restarts from the beginning when the cursor sits on the last sample.
    pub fn play(&mut self) {
        let Some(last) = self.route.last_index() else {
            debug!("play ignored: empty route");
            return;
        };
        if self.is_playing() {
            return;
        }

        self.cancel_pending();
        if self.cursor >= last {
            self.cursor = 0;
        }

        self.state = PlaybackState::Playing;
        if last == 0 {
            // Nothing to advance to, so no tick is needed
            debug!("play: single-sample route");
            return;
        }
        self.schedule_next();
        debug!("play from cursor {} every {} ms", self.cursor, self.config.rate_ms);
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if !self.is_playing() {
            return;
        }
        self.cancel_pending();
        self.state = PlaybackState::Paused;
        debug!("pause at cursor {}", self.cursor);
    }

    /// Stop playback and rewind to the first sample
    pub fn reset(&mut self) {
        if self.route.is_empty() {
            return;
        }
        self.cancel_pending();
        self.state = PlaybackState::Idle;
        self.cursor = 0;
        debug!("reset");
    }

    /// Change the tick interval used for future ticks
    ///
    /// A tick that is already scheduled keeps its original due time.
    pub fn set_rate(&mut self, rate_ms: u64) -> Result<(), PlaybackError> {
        if rate_ms == 0 {
            return Err(PlaybackError::InvalidArgument("rate must be greater than 0 ms".into()));
        }
        if self.route.is_empty() {
            return Ok(());
        }
        self.config.rate_ms = rate_ms;
        debug!("rate set to {} ms", rate_ms);
        Ok(())
    }

    /// Select how ETA is estimated
    pub fn set_eta_model(&mut self, model: EtaModel) {
        self.config.eta_model = model;
    }

    /// Deliver a scheduled tick
    ///
    /// Returns true if the cursor advanced. Ticks other than the pending
    /// one are stale and ignored.
    pub fn on_tick(&mut self, id: TickId) -> bool {
        if self.pending_tick != Some(id) {
            trace!("ignoring stale tick {}", id.raw());
            return false;
        }
        self.pending_tick = None;
        self.scheduler.cancel(id);

        if !self.is_playing() {
            return false;
        }
        let Some(last) = self.route.last_index() else {
            return false;
        };
        if self.cursor >= last {
            return false;
        }

        self.cursor += 1;
        if self.cursor == last {
            self.state = PlaybackState::Finished;
            info!("Playback finished after {} samples", self.route.len());
        } else {
            self.schedule_next();
        }
        trace!("tick -> cursor {}", self.cursor);
        true
    }

    /// Telemetry for the current cursor
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot::capture(&self.route, self.cursor, self.state, &self.config)
    }

    /// Samples visited so far, including the current one
    pub fn traveled_path(&self) -> &[Sample] {
        self.route.traveled(self.cursor)
    }

    /// Every sample of the route
    pub fn full_path(&self) -> &[Sample] {
        self.route.samples()
    }

    fn schedule_next(&mut self) {
        self.cancel_pending();
        let after = Duration::from_millis(self.config.rate_ms);
        self.pending_tick = Some(self.scheduler.schedule(after));
    }

    fn cancel_pending(&mut self) {
        if let Some(id) = self.pending_tick.take() {
            self.scheduler.cancel(id);
        }
    }
}

impl PlaybackEngine<ManualScheduler> {
    /// Move the virtual clock forward, firing every tick that falls due
    ///
    /// Returns the number of cursor advances.
    pub fn advance_clock(&mut self, by: Duration) -> usize {
        let target = self.scheduler.now() + by;
        let mut advanced = 0;
        while let Some(id) = self.scheduler.take_due(target) {
            if self.on_tick(id) {
                advanced += 1;
            }
        }
        self.scheduler.set_now(target);
        advanced
    }

    /// Jump the virtual clock to the next pending tick and fire it
    ///
    /// Returns false when nothing is scheduled.
    pub fn fire_next(&mut self) -> bool {
        let Some((id, due)) = self.scheduler.next_due() else {
            return false;
        };
        self.scheduler.take_due(due);
        self.on_tick(id);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RouteRecord;
    use crate::geo::Eta;

    const RATE: Duration = Duration::from_millis(2000);

    fn route(n: usize) -> Route {
        let records: Vec<RouteRecord> = (0..n)
            .map(|i| RouteRecord {
                latitude: 17.0 + i as f64 * 0.001,
                longitude: 78.0 + i as f64 * 0.001,
                timestamp: i as i64 * 10_000,
            })
            .collect();
        Route::from_records(&records)
    }

    fn engine(n: usize) -> PlaybackEngine<ManualScheduler> {
        PlaybackEngine::new(route(n), ManualScheduler::new())
    }

    #[test]
    fn test_initial_state() {
        let engine = engine(5);
        assert_eq!(engine.state(), PlaybackState::Idle);
        assert_eq!(engine.cursor(), 0);
        assert_eq!(engine.rate_ms(), 2000);
        assert!(engine.pending_tick().is_none());
    }

    #[test]
    fn test_ticks_advance_until_finished() {
        let mut engine = engine(4);
        engine.play();

        for expected in 1..=3 {
            assert_eq!(engine.advance_clock(RATE), 1);
            assert_eq!(engine.cursor(), expected);
        }
        assert_eq!(engine.state(), PlaybackState::Finished);
        assert!(!engine.is_playing());
        assert!(engine.pending_tick().is_none());

        assert_eq!(engine.advance_clock(RATE * 10), 0);
        assert_eq!(engine.cursor(), 3);
    }

    #[test]
    fn test_no_tick_before_rate_elapses() {
        let mut engine = engine(4);
        engine.play();
        assert_eq!(engine.advance_clock(Duration::from_millis(1999)), 0);
        assert_eq!(engine.cursor(), 0);
        assert_eq!(engine.advance_clock(Duration::from_millis(1)), 1);
        assert_eq!(engine.cursor(), 1);
    }

    #[test]
    fn test_pause_cancels_pending_tick() {
        let mut engine = engine(5);
        engine.play();
        engine.advance_clock(RATE);
        engine.pause();

        assert_eq!(engine.state(), PlaybackState::Paused);
        assert_eq!(engine.scheduler().pending(), 0);
        assert_eq!(engine.advance_clock(RATE * 5), 0);
        assert_eq!(engine.cursor(), 1);

        engine.play();
        engine.advance_clock(RATE);
        assert_eq!(engine.cursor(), 2);
    }

    #[test]
    fn test_pause_when_not_playing_is_noop() {
        let mut engine = engine(3);
        engine.pause();
        assert_eq!(engine.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_stale_tick_ignored() {
        let mut engine = engine(5);
        engine.play();
        let stale = engine.pending_tick().unwrap();
        engine.pause();
        engine.play();

        assert!(!engine.on_tick(stale));
        assert_eq!(engine.cursor(), 0);
        assert!(engine.pending_tick().is_some());
    }

    #[test]
    fn test_reset_from_any_state() {
        let mut engine = engine(3);

        engine.reset();
        assert_eq!((engine.cursor(), engine.state()), (0, PlaybackState::Idle));

        engine.play();
        engine.advance_clock(RATE);
        engine.reset();
        assert_eq!((engine.cursor(), engine.state()), (0, PlaybackState::Idle));
        assert_eq!(engine.scheduler().pending(), 0);

        engine.play();
        engine.advance_clock(RATE * 2);
        assert_eq!(engine.state(), PlaybackState::Finished);
        engine.reset();
        assert_eq!((engine.cursor(), engine.state()), (0, PlaybackState::Idle));
    }

    #[test]
    fn test_play_when_finished_restarts() {
        let mut engine = engine(3);
        engine.play();
        engine.advance_clock(RATE * 2);
        assert_eq!(engine.cursor(), 2);

        engine.play();
        assert_eq!(engine.cursor(), 0);
        assert!(engine.is_playing());
    }

    #[test]
    fn test_set_rate_applies_to_next_tick() {
        let mut engine = engine(5);
        engine.play();
        engine.set_rate(500).unwrap();

        // Already scheduled tick keeps its 2000 ms due time
        assert_eq!(engine.advance_clock(Duration::from_millis(500)), 0);
        assert_eq!(engine.advance_clock(Duration::from_millis(1500)), 1);
        // Following ticks use the new rate
        assert_eq!(engine.advance_clock(Duration::from_millis(500)), 1);
        assert_eq!(engine.cursor(), 2);
    }

    #[test]
    fn test_set_rate_rejects_zero() {
        let mut engine = engine(3);
        let err = engine.set_rate(0).unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidArgument(_)));
        assert_eq!(engine.rate_ms(), 2000);
    }

    #[test]
    fn test_empty_route() {
        let mut engine = PlaybackEngine::new(Route::empty(), ManualScheduler::new());
        engine.play();
        engine.pause();
        engine.reset();
        engine.set_rate(700).unwrap();

        assert_eq!(engine.state(), PlaybackState::Idle);
        assert_eq!(engine.rate_ms(), 2000);
        assert_eq!(engine.scheduler().pending(), 0);

        let snap = engine.snapshot();
        assert_eq!(snap.position, None);
        assert_eq!(snap.speed_kmh, 0.0);
        assert_eq!(snap.eta, Eta::NotAvailable);
        assert_eq!(snap.progress_pct, 0.0);
        assert!(engine.traveled_path().is_empty());
    }

    #[test]
    fn test_single_sample_route() {
        let mut engine = engine(1);
        engine.play();
        assert_eq!(engine.state(), PlaybackState::Playing);
        assert!(engine.pending_tick().is_none());

        let snap = engine.snapshot();
        assert!(snap.playing);
        assert_eq!(snap.cursor, 0);
        assert_eq!(snap.progress_pct, 0.0);

        assert_eq!(engine.advance_clock(RATE * 3), 0);
        assert_eq!(engine.cursor(), 0);
        engine.pause();
        assert_eq!(engine.state(), PlaybackState::Paused);
    }

    #[test]
    fn test_snapshot_follows_cursor() {
        let mut engine = engine(3);
        engine.play();
        assert_eq!(engine.snapshot().progress_pct, 0.0);
        assert!(engine.snapshot().playing);

        engine.advance_clock(RATE);
        let snap = engine.snapshot();
        assert_eq!(snap.cursor, 1);
        assert_eq!(snap.progress_pct, 50.0);
        assert!(snap.speed_kmh > 0.0);
        assert!(snap.eta.is_available());
        assert_eq!(engine.traveled_path().len(), 2);
        assert_eq!(engine.full_path().len(), 3);
    }

    #[test]
    fn test_fire_next_runs_to_end() {
        let mut engine = engine(6);
        engine.play();
        let mut fired = 0;
        while engine.fire_next() {
            fired += 1;
        }
        assert_eq!(fired, 5);
        assert_eq!(engine.state(), PlaybackState::Finished);
        assert_eq!(engine.scheduler().now(), RATE * 5);
    }
}
