//! TUI (Terminal User Interface) module for speedlab.
//!
//! This module renders the live dashboard of a speed test run: phase
//! and progress, a speed gauge, the sample chart and recent history.

pub mod controller;
pub mod display_mode;
pub mod event;
pub mod progress;
pub mod renderer;
pub mod state;

pub use controller::TuiController;
pub use display_mode::DisplayMode;
pub use event::{Event, EventReader};
pub use progress::{
    BandwidthDirection, ProgressCallback, ProgressEvent, TestPhase,
};
pub use state::TuiState;
