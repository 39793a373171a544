//! Display scheduling for RoFrame
//!
//! Decides, once per tick, whether the physical display should be powered:
//! on while the tracked zone plays, and during the configured on-hours
//! otherwise. The schedule runs as a single supervised background task,
//! started lazily when the first browser connects.

mod controller;
mod supervisor;
mod window;

pub use controller::{DisplayController, DisplayPower, NoopDisplay, XsetDisplay};
pub use supervisor::{DisplaySupervisor, PlaybackSource, SupervisorPhase, TICK_PERIOD};
pub use window::{is_within_on_window, should_display};
