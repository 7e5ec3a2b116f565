use crate::core::Route;
use crate::error::PlaybackError;
use crate::playback::scheduler::{DeadlineScheduler, TickId};
use crate::playback::{PlaybackConfig, PlaybackEngine, TelemetrySnapshot};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

/// Command queue depth between controls and the driver task
const COMMAND_BUFFER: usize = 32;

/// Command from the controls layer to the driver task
#[derive(Debug)]
pub enum PlaybackCommand {
    Play,
    Pause,
    Reset,
    SetRate(u64, oneshot::Sender<Result<(), PlaybackError>>),
    Shutdown,
}

/// Runs a playback engine on the tokio clock
///
/// One task owns the engine. Commands and ticks are handled by the same
/// `select!` loop, so neither ever observes the other half-applied.
pub struct PlaybackDriver {
    engine: PlaybackEngine<DeadlineScheduler>,
    commands: mpsc::Receiver<PlaybackCommand>,
    snapshots: watch::Sender<TelemetrySnapshot>,
}

impl PlaybackDriver {
    /// Start the driver task for `route`
    pub fn spawn(route: Route, config: PlaybackConfig) -> (PlaybackHandle, JoinHandle<()>) {
        let engine = PlaybackEngine::with_config(route, DeadlineScheduler::new(), config);
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snap_tx, snap_rx) = watch::channel(engine.snapshot());

        let driver = Self {
            engine,
            commands: cmd_rx,
            snapshots: snap_tx,
        };
        let task = tokio::spawn(driver.run());

        let handle = PlaybackHandle {
            commands: cmd_tx,
            snapshots: snap_rx,
        };
        (handle, task)
    }

    async fn run(mut self) {
        loop {
            // Re-read every pass: pause/reset clear the deadline, which
            // drops the sleep below along with any stale tick
            let deadline = self.engine.scheduler().next_deadline();

            tokio::select! {
                biased;

                cmd = self.commands.recv() => match cmd {
                    Some(PlaybackCommand::Shutdown) | None => break,
                    Some(cmd) => self.apply(cmd),
                },
                id = wait_for(deadline) => {
                    self.engine.on_tick(id);
                }
            }

            self.publish();
        }
        info!("Playback driver stopped at cursor {}", self.engine.cursor());
    }

    fn apply(&mut self, cmd: PlaybackCommand) {
        debug!("command: {:?}", cmd);
        match cmd {
            PlaybackCommand::Play => self.engine.play(),
            PlaybackCommand::Pause => self.engine.pause(),
            PlaybackCommand::Reset => self.engine.reset(),
            PlaybackCommand::SetRate(rate_ms, reply) => {
                let _ = reply.send(self.engine.set_rate(rate_ms));
            }
            PlaybackCommand::Shutdown => {}
        }
    }

    fn publish(&self) {
        let snapshot = self.engine.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }
}

async fn wait_for(deadline: Option<(TickId, Instant)>) -> TickId {
    match deadline {
        Some((id, at)) => {
            sleep_until(at).await;
            id
        }
        None => std::future::pending().await,
    }
}

/// Cloneable handle for sending commands and reading telemetry
#[derive(Clone)]
pub struct PlaybackHandle {
    commands: mpsc::Sender<PlaybackCommand>,
    snapshots: watch::Receiver<TelemetrySnapshot>,
}

impl PlaybackHandle {
    pub async fn play(&self) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::Play).await
    }

    pub async fn pause(&self) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::Pause).await
    }

    pub async fn reset(&self) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::Reset).await
    }

    /// Change the tick interval, waiting for the engine's verdict
    pub async fn set_rate(&self, rate_ms: u64) -> Result<(), PlaybackError> {
        let (tx, rx) = oneshot::channel();
        self.send(PlaybackCommand::SetRate(rate_ms, tx)).await?;
        rx.await.map_err(|_| PlaybackError::Stopped)?
    }

    /// Ask the driver task to exit
    pub async fn shutdown(&self) -> Result<(), PlaybackError> {
        self.send(PlaybackCommand::Shutdown).await
    }

    /// Latest published telemetry
    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that is notified on every telemetry change
    pub fn subscribe(&self) -> watch::Receiver<TelemetrySnapshot> {
        self.snapshots.clone()
    }

    async fn send(&self, cmd: PlaybackCommand) -> Result<(), PlaybackError> {
        self.commands.send(cmd).await.map_err(|_| PlaybackError::Stopped)
    }
}
