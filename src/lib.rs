//! Route playback & telemetry engine
//!
//! Replays a recorded sequence of timestamped positions as a simulated
//! vehicle. The engine advances a cursor over the route on a fixed cadence
//! and derives speed, ETA and progress from the route and the cursor.
//!
//! ```rust,ignore
//! use routeplay::core::{Route, RouteRecord};
//! use routeplay::playback::{ManualScheduler, PlaybackEngine};
//!
//! let route = Route::from_records(&records);
//! let mut engine = PlaybackEngine::new(route, ManualScheduler::new());
//! engine.play();
//! engine.advance_clock(std::time::Duration::from_secs(2));
//! println!("{}", engine.snapshot());
//! ```

pub mod config;
pub mod controls;
pub mod core;
pub mod error;
pub mod geo;
pub mod input;
pub mod playback;

pub use crate::core::{Route, RouteRecord, Sample};
pub use error::{PlaybackError, RouteError};
pub use playback::{PlaybackEngine, PlaybackState, TelemetrySnapshot};
