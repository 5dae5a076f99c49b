//! TUI state management.
//!
//! Holds everything the dashboard renders: the live values of the
//! current run, its sample buffer and the recent history.

use super::progress::{BandwidthDirection, ProgressEvent, TestPhase};
use crate::history::MAX_HISTORY_ENTRIES;
use crate::results::SpeedTestResult;
use crate::simulator::config::SimulatorConfig;
use crate::simulator::state::SampleBuffer;

/// Error information for display.
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Error message
    pub message: String,
    /// Optional suggestion for resolution
    pub suggestion: Option<String>,
}

/// Bandwidth measurement state.
#[derive(Debug, Clone, Default)]
pub struct BandwidthState {
    /// Current speed in Mbps
    pub current_speed_mbps: Option<f64>,
    /// Number of samples taken in this phase
    pub samples_taken: usize,
    /// Final speed in Mbps
    pub final_speed_mbps: Option<f64>,
    /// Whether this phase is completed
    pub completed: bool,
}

/// State for the TUI display.
#[derive(Debug, Clone)]
pub struct TuiState {
    /// Current test phase
    pub phase: TestPhase,
    /// Progress through the current phase, 0 to 100
    pub progress_percent: f64,
    /// Ping of the current run in ms
    pub ping_ms: Option<f64>,
    /// Download progress and results
    pub download: BandwidthState,
    /// Upload progress and results
    pub upload: BandwidthState,
    /// Chart samples of the current run
    pub samples: SampleBuffer,
    /// Recent results, newest first
    pub history: Vec<SpeedTestResult>,
    /// Result of the last completed run
    pub last_result: Option<SpeedTestResult>,
    /// Whether the last run was cancelled
    pub cancelled: bool,
    /// Error message if any
    pub error: Option<ErrorInfo>,
    /// Terminal width for layout
    pub terminal_width: u16,
    /// Full scale of the download gauge in Mbps
    pub download_max_mbps: f64,
    /// Full scale of the upload gauge in Mbps
    pub upload_max_mbps: f64,
}

impl Default for TuiState {
    fn default() -> Self {
        Self {
            phase: TestPhase::Idle,
            progress_percent: 0.0,
            ping_ms: None,
            download: BandwidthState::default(),
            upload: BandwidthState::default(),
            samples: SampleBuffer::default(),
            history: Vec::new(),
            last_result: None,
            cancelled: false,
            error: None,
            terminal_width: 80,
            download_max_mbps: 200.0,
            upload_max_mbps: 100.0,
        }
    }
}

impl TuiState {
    /// Create a new TuiState with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scale the gauges and chart buffer to the simulator's settings.
    pub fn with_limits(mut self, config: &SimulatorConfig) -> Self {
        self.samples = SampleBuffer::new(config.sample_capacity);
        self.download_max_mbps = config.download.max_speed;
        self.upload_max_mbps = config.upload.max_speed;
        self
    }

    /// Full scale of the gauge for `direction`.
    pub fn speed_limit(&self, direction: BandwidthDirection) -> f64 {
        match direction {
            BandwidthDirection::Download => self.download_max_mbps,
            BandwidthDirection::Upload => self.upload_max_mbps,
        }
    }

    /// Replace the displayed history.
    pub fn set_history(&mut self, history: &[SpeedTestResult]) {
        self.history =
            history.iter().take(MAX_HISTORY_ENTRIES).cloned().collect();
    }

    /// Set an error state with optional suggestion.
    ///
    /// This preserves any partial results collected before the error.
    pub fn set_error(&mut self, message: String, suggestion: Option<String>) {
        self.error = Some(ErrorInfo { message, suggestion });
    }

    /// Bandwidth state for a direction.
    pub fn bandwidth(&self, direction: BandwidthDirection) -> &BandwidthState {
        match direction {
            BandwidthDirection::Download => &self.download,
            BandwidthDirection::Upload => &self.upload,
        }
    }

    fn bandwidth_mut(
        &mut self,
        direction: BandwidthDirection,
    ) -> &mut BandwidthState {
        match direction {
            BandwidthDirection::Download => &mut self.download,
            BandwidthDirection::Upload => &mut self.upload,
        }
    }

    /// Whether a run is in progress.
    pub fn is_running(&self) -> bool {
        self.phase != TestPhase::Idle
    }

    /// Update state from a progress event.
    pub fn update_from_event(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::RunStarted => {
                self.phase = TestPhase::Ping;
                self.progress_percent = 0.0;
                self.ping_ms = None;
                self.download = BandwidthState::default();
                self.upload = BandwidthState::default();
                self.samples.clear();
                self.cancelled = false;
                self.error = None;
            }
            ProgressEvent::PhaseChange(phase) => {
                self.phase = *phase;
                self.progress_percent = 0.0;
            }
            ProgressEvent::PingMeasurement { value_ms } => {
                self.ping_ms = Some(*value_ms);
            }
            ProgressEvent::SpeedSample {
                direction,
                speed_mbps,
                progress_percent,
                sample,
            } => {
                let state = self.bandwidth_mut(*direction);
                state.current_speed_mbps = Some(*speed_mbps);
                state.samples_taken += 1;
                self.progress_percent = progress_percent.clamp(0.0, 100.0);
                self.samples.push(*sample);
            }
            ProgressEvent::PhaseComplete(phase) => {
                if let Some(direction) = phase.direction() {
                    let state = self.bandwidth_mut(direction);
                    state.completed = true;
                    // Final speed is the last sampled speed
                    state.final_speed_mbps = state.current_speed_mbps;
                }
            }
            ProgressEvent::RunComplete(result) => {
                self.phase = TestPhase::Idle;
                self.progress_percent = 0.0;
                self.history.insert(0, result.clone());
                self.history.truncate(MAX_HISTORY_ENTRIES);
                self.last_result = Some(result.clone());
            }
            ProgressEvent::Cancelled => {
                self.phase = TestPhase::Idle;
                self.progress_percent = 0.0;
                self.cancelled = true;
            }
            ProgressEvent::Error(message) => {
                self.set_error(message.clone(), None);
            }
        }
    }
}
