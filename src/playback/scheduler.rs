use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Identifies one scheduled tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickId(u64);

impl TickId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Cadence port the playback engine schedules its ticks through
///
/// The engine keeps at most one tick pending and cancels it before
/// scheduling another. Implementations only have to remember when each
/// requested tick is due; delivering it back to the engine is up to
/// whoever drives the clock.
pub trait TickScheduler: Send {
    /// Request a tick `after` from now
    fn schedule(&mut self, after: Duration) -> TickId;

    /// Forget a tick. Unknown or already fired ids are ignored.
    fn cancel(&mut self, id: TickId);
}

/// Virtual-clock scheduler for tests and headless replay
///
/// Time only moves when the owner advances it, so a whole route can be
/// replayed without waiting.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    next_id: u64,
    queue: BTreeMap<TickId, Duration>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time since creation
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of ticks waiting to fire
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Earliest scheduled tick and its due time
    pub fn next_due(&self) -> Option<(TickId, Duration)> {
        self.queue
            .iter()
            .min_by_key(|(id, due)| (**due, **id))
            .map(|(id, due)| (*id, *due))
    }

    /// Remove the earliest tick due at or before `until`, moving the clock to it
    pub fn take_due(&mut self, until: Duration) -> Option<TickId> {
        let (id, due) = self.next_due().filter(|(_, due)| *due <= until)?;
        self.queue.remove(&id);
        self.now = self.now.max(due);
        Some(id)
    }

    /// Move the clock forward without firing anything
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}

impl TickScheduler for ManualScheduler {
    fn schedule(&mut self, after: Duration) -> TickId {
        let id = TickId(self.next_id);
        self.next_id += 1;
        self.queue.insert(id, self.now + after);
        id
    }

    fn cancel(&mut self, id: TickId) {
        self.queue.remove(&id);
    }
}

/// Single-slot scheduler on the tokio clock
///
/// Holds the one deadline the async driver should sleep until.
#[derive(Debug, Default)]
pub struct DeadlineScheduler {
    next_id: u64,
    slot: Option<(TickId, Instant)>,
}

impl DeadlineScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tick to fire next and when
    pub fn next_deadline(&self) -> Option<(TickId, Instant)> {
        self.slot
    }
}

impl TickScheduler for DeadlineScheduler {
    fn schedule(&mut self, after: Duration) -> TickId {
        let id = TickId(self.next_id);
        self.next_id += 1;
        if let Some((old, _)) = self.slot {
            debug!("Replacing pending tick {} with {}", old.raw(), id.raw());
        }
        self.slot = Some((id, Instant::now() + after));
        id
    }

    fn cancel(&mut self, id: TickId) {
        if matches!(self.slot, Some((pending, _)) if pending == id) {
            self.slot = None;
        }
    }
}
