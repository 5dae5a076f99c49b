//! Progress event types and callback interface.
//!
//! Defines the events emitted by the simulator to update the TUI
//! and the callback trait for receiving these events.

use crate::results::SpeedTestResult;
use crate::simulator::state::SpeedSample;

/// Test phases during a speed test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestPhase {
    /// No run is active
    #[default]
    Idle,
    /// Measuring ping
    Ping,
    /// Running the download phase
    Download,
    /// Running the upload phase
    Upload,
}

impl TestPhase {
    /// Bandwidth direction measured in this phase, if any.
    pub fn direction(&self) -> Option<BandwidthDirection> {
        match self {
            TestPhase::Download => Some(BandwidthDirection::Download),
            TestPhase::Upload => Some(BandwidthDirection::Upload),
            TestPhase::Idle | TestPhase::Ping => None,
        }
    }
}

/// Direction of bandwidth measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandwidthDirection {
    /// Download test
    Download,
    /// Upload test
    Upload,
}

impl BandwidthDirection {
    /// The phase measuring this direction.
    pub fn phase(&self) -> TestPhase {
        match self {
            BandwidthDirection::Download => TestPhase::Download,
            BandwidthDirection::Upload => TestPhase::Upload,
        }
    }

    /// Lowercase name, as used for sample series.
    pub fn name(&self) -> &'static str {
        match self {
            BandwidthDirection::Download => "download",
            BandwidthDirection::Upload => "upload",
        }
    }
}

/// Progress events emitted during a run.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A new run started and all live values were reset
    RunStarted,
    /// Test phase has changed
    PhaseChange(TestPhase),
    /// Ping was measured
    PingMeasurement {
        /// Ping in milliseconds
        value_ms: f64,
    },
    /// A bandwidth sample was taken
    SpeedSample {
        /// Direction of the sample
        direction: BandwidthDirection,
        /// Sampled speed in Mbps
        speed_mbps: f64,
        /// Progress through the phase, 0 to 100
        progress_percent: f64,
        /// The sample appended to the rolling buffer
        sample: SpeedSample,
    },
    /// Phase completed
    PhaseComplete(TestPhase),
    /// The run finished and its result was recorded
    RunComplete(SpeedTestResult),
    /// The run was cancelled before finishing
    Cancelled,
    /// Error occurred
    Error(String),
}

/// Callback interface for progress updates.
///
/// Implementations must be non-blocking so ticks stay on schedule.
pub trait ProgressCallback: Send + Sync {
    /// Called when a progress event occurs.
    fn on_progress(&self, event: ProgressEvent);
}
