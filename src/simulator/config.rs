//! Simulator configuration.

use std::time::Duration;

use crate::tui::progress::BandwidthDirection;

/// Shape of the synthetic signal for one bandwidth phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseProfile {
    /// How long the phase runs.
    pub duration: Duration,
    /// Lower bound of the base rate drawn at phase start, in Mbps.
    pub base_min: f64,
    /// Upper bound of the base rate drawn at phase start, in Mbps.
    pub base_max: f64,
    /// Emitted values are clamped to `[0, max_speed]` Mbps.
    pub max_speed: f64,
}

/// Configuration for the speed signal simulator.
///
/// The defaults reproduce the classic run: one second of ping, eight
/// seconds of download and five seconds of upload, sampled twice a
/// second.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// Delay before the ping value is produced.
    /// Default: 1000ms
    pub ping_delay: Duration,

    /// Inclusive range the ping is drawn from, in milliseconds.
    /// Default: 10..=40
    pub ping_min_ms: u32,
    pub ping_max_ms: u32,

    /// Download phase signal.
    /// Default: 8000ms, base 50-150 Mbps, max 200 Mbps
    pub download: PhaseProfile,

    /// Upload phase signal.
    /// Default: 5000ms, base 20-70 Mbps, max 100 Mbps
    pub upload: PhaseProfile,

    /// Wall-clock time between samples.
    /// Default: 500ms
    pub tick_interval: Duration,

    /// Capacity of the rolling sample buffer.
    /// Default: 30
    pub sample_capacity: usize,

    /// Fraction of a phase spent ramping up to the base rate.
    /// Default: 0.4
    pub ramp_fraction: f64,

    /// Divisor applied to elapsed milliseconds inside the wobble sine.
    /// Default: 800.0 (a period of roughly 5 seconds)
    pub oscillation_divisor_ms: f64,

    /// Amplitude of the wobble in Mbps.
    /// Default: 8.0
    pub oscillation_amplitude: f64,

    /// Per-tick noise is drawn from `(-jitter_amplitude, jitter_amplitude)`.
    /// Default: 3.0
    pub jitter_amplitude: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            ping_delay: Duration::from_millis(1000),
            ping_min_ms: 10,
            ping_max_ms: 40,
            download: PhaseProfile {
                duration: Duration::from_millis(8000),
                base_min: 50.0,
                base_max: 150.0,
                max_speed: 200.0,
            },
            upload: PhaseProfile {
                duration: Duration::from_millis(5000),
                base_min: 20.0,
                base_max: 70.0,
                max_speed: 100.0,
            },
            tick_interval: Duration::from_millis(500),
            sample_capacity: 30,
            ramp_fraction: 0.4,
            oscillation_divisor_ms: 800.0,
            oscillation_amplitude: 8.0,
            jitter_amplitude: 3.0,
        }
    }
}

impl SimulatorConfig {
    /// Signal profile for a bandwidth direction.
    pub fn profile(&self, direction: BandwidthDirection) -> &PhaseProfile {
        match direction {
            BandwidthDirection::Download => &self.download,
            BandwidthDirection::Upload => &self.upload,
        }
    }

    /// Total simulated time of a run, excluding tick overshoot.
    pub fn nominal_run_time(&self) -> Duration {
        self.ping_delay + self.download.duration + self.upload.duration
    }
}
