use anyhow::{Context, Result};
use clap::Parser;
use routeplay::config::AppSettings;
use routeplay::controls::{self, CommandMap, ControlAction};
use routeplay::geo::EtaModel;
use routeplay::input::{FileRouteSource, RouteSource};
use routeplay::playback::{ManualScheduler, PlaybackDriver, PlaybackEngine, PlaybackHandle};
use routeplay::{PlaybackState, Route, TelemetrySnapshot};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Replay a recorded route as a simulated vehicle
#[derive(Parser, Debug)]
#[command(name = "routeplay", version, about)]
struct Args {
    /// Route file (JSON array of {latitude, longitude, timestamp} or CSV)
    route: PathBuf,

    /// Milliseconds between cursor advances (500-3000)
    #[arg(long)]
    rate: Option<u64>,

    /// ETA estimate: cumulative or average
    #[arg(long)]
    eta_model: Option<EtaModel>,

    /// Start playing as soon as the route is loaded
    #[arg(long)]
    autoplay: bool,

    /// Print telemetry as JSON lines instead of text
    #[arg(long)]
    json: bool,

    /// Replay the whole route on a virtual clock without waiting
    #[arg(long)]
    fast_forward: bool,

    /// Write the effective settings to the config file and exit
    #[arg(long)]
    save_settings: bool,
}

impl Args {
    fn apply(&self, settings: &mut AppSettings) {
        if let Some(rate) = self.rate {
            settings.rate_ms = controls::clamp_rate(rate);
        }
        if let Some(model) = self.eta_model {
            settings.eta_model = model;
        }
        settings.auto_play |= self.autoplay;
        settings.json_output |= self.json;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout only carries telemetry
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("routeplay=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut settings = AppSettings::load();
    args.apply(&mut settings);

    if args.save_settings {
        let path = settings.save()?;
        info!("Settings written to {}", path.display());
        return Ok(());
    }

    let source = FileRouteSource::new(&args.route);
    let route = source
        .load()
        .await
        .with_context(|| format!("Unable to load route data from {}", source.describe()))?;
    if route.is_empty() {
        warn!("Route is empty; nothing to play");
    }

    if args.fast_forward {
        fast_forward(route, &settings);
        return Ok(());
    }

    run_interactive(route, settings).await
}

fn emit(snapshot: &TelemetrySnapshot, json: bool) {
    if json {
        match serde_json::to_string(snapshot) {
            Ok(line) => println!("{}", line),
            Err(e) => error!("Failed to encode telemetry: {}", e),
        }
    } else {
        println!("{}", snapshot);
    }
}

fn fast_forward(route: Route, settings: &AppSettings) {
    let mut engine = PlaybackEngine::with_config(route, ManualScheduler::new(), settings.playback_config());
    engine.play();
    emit(&engine.snapshot(), settings.json_output);
    while engine.fire_next() {
        emit(&engine.snapshot(), settings.json_output);
    }
}

async fn run_interactive(route: Route, settings: AppSettings) -> Result<()> {
    let json = settings.json_output;
    let (handle, task) = PlaybackDriver::spawn(route, settings.playback_config());

    let printer = tokio::spawn(relay_updates(handle.subscribe(), move |s| emit(s, json)));

    let commands = CommandMap::new();
    if !json {
        eprintln!("Commands:\n{}", commands.help_text());
    }
    if settings.auto_play {
        handle.play().await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(action) = commands.parse(&line) else {
            warn!("Unknown command '{}' (type ? for help)", line.trim());
            continue;
        };
        if action == ControlAction::Quit {
            break;
        }
        dispatch(&handle, &commands, action).await?;
    }

    handle.shutdown().await?;
    task.await?;
    // Ends once the driver drops its sender, after the final snapshot
    printer.await?;
    Ok(())
}

/// Forward every telemetry change to `sink` until the driver stops
async fn relay_updates(mut updates: watch::Receiver<TelemetrySnapshot>, mut sink: impl FnMut(&TelemetrySnapshot)) {
    let current = updates.borrow_and_update().clone();
    sink(&current);
    while updates.changed().await.is_ok() {
        let snapshot = updates.borrow_and_update().clone();
        sink(&snapshot);
    }
}

async fn dispatch(handle: &PlaybackHandle, commands: &CommandMap, action: ControlAction) -> Result<()> {
    let current = handle.snapshot();
    match action {
        ControlAction::Play => handle.play().await?,
        ControlAction::Pause => handle.pause().await?,
        ControlAction::TogglePlay => {
            if current.state == PlaybackState::Playing {
                handle.pause().await?
            } else {
                handle.play().await?
            }
        }
        ControlAction::Reset => handle.reset().await?,
        ControlAction::Faster => handle.set_rate(controls::faster(current.rate_ms)).await?,
        ControlAction::Slower => handle.set_rate(controls::slower(current.rate_ms)).await?,
        ControlAction::SetRate(ms) => handle.set_rate(controls::clamp_rate(ms)).await?,
        ControlAction::Status => println!("{}", current),
        ControlAction::Help => eprintln!("{}", commands.help_text()),
        ControlAction::Quit => {}
    }
    Ok(())
}
