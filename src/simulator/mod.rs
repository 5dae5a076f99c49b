//! Simulated speed test.
//!
//! The simulator produces a synthetic ping, download and upload
//! measurement over roughly fourteen seconds of wall-clock time:
//!
//! - [`signal`]: the per-tick speed formula and its random inputs
//! - [`state`]: the live [`RunState`] and its rolling sample buffer
//! - [`engine`]: pure phase transitions over a [`RunState`]
//! - [`session`]: timed, cancellable runs that record their results

pub mod config;
pub mod engine;
pub mod session;
pub mod signal;
pub mod state;

pub use config::{PhaseProfile, SimulatorConfig};
pub use engine::{ActivePhase, Simulator, TickOutcome};
pub use session::{RunHandle, SpeedTestSession};
pub use signal::{RandomSignal, SignalSource};
pub use state::{RunState, SampleBuffer, SpeedSample, SAMPLE_BUFFER_CAPACITY};
