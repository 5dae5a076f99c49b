//! Phase-by-phase simulation steps.
//!
//! The [`Simulator`] owns the configuration and the signal source and
//! turns a [`RunState`] into the next one. It never sleeps; the
//! session driving it owns the clock.

use log::debug;
use std::time::Duration;

use super::config::{PhaseProfile, SimulatorConfig};
use super::signal::{progress_percent, signal_value, SignalSource};
use super::state::RunState;
use crate::results::SpeedTestResult;
use crate::tui::progress::{BandwidthDirection, TestPhase};

/// A bandwidth phase that has started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivePhase {
    /// Direction being simulated
    pub direction: BandwidthDirection,
    /// Base rate drawn when the phase started, in Mbps
    pub base_rate: f64,
    /// Signal profile of the phase
    pub profile: PhaseProfile,
}

impl ActivePhase {
    fn duration_ms(&self) -> f64 {
        self.profile.duration.as_secs_f64() * 1000.0
    }
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// A sample was taken and the phase continues.
    Sampled {
        /// State including the new sample
        state: RunState,
        /// The sampled speed in Mbps
        value: f64,
    },
    /// The phase duration has elapsed; no sample was taken.
    Finished(RunState),
}

/// Produces the synthetic measurements of a run.
pub struct Simulator<S> {
    config: SimulatorConfig,
    signal: S,
}

impl<S: SignalSource> Simulator<S> {
    pub fn new(config: SimulatorConfig, signal: S) -> Self {
        Self { config, signal }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Reset `state` for a new run and enter the ping phase.
    pub fn begin(&self, state: RunState) -> RunState {
        let mut state = state.begin();
        if state.samples.capacity() != self.config.sample_capacity {
            state = RunState::idle(self.config.sample_capacity).begin();
        }
        state
    }

    /// Draw the ping value for the run.
    pub fn measure_ping(&mut self, state: RunState) -> RunState {
        let ping = self
            .signal
            .ping_ms(self.config.ping_min_ms, self.config.ping_max_ms);
        debug!("Simulated ping: {} ms", ping);
        state.with_ping(f64::from(ping))
    }

    /// Enter the bandwidth phase for `direction`, drawing its base rate.
    pub fn start_phase(
        &mut self,
        state: RunState,
        direction: BandwidthDirection,
    ) -> (RunState, ActivePhase) {
        let profile = *self.config.profile(direction);
        let base_rate =
            self.signal.base_rate(profile.base_min, profile.base_max);
        debug!(
            "Starting {} phase: base {:.1} Mbps over {:?}",
            direction.name(),
            base_rate,
            profile.duration
        );

        let phase = ActivePhase { direction, base_rate, profile };
        (state.enter_phase(direction.phase()), phase)
    }

    /// Sample the active phase `elapsed` after it started.
    pub fn tick(
        &mut self,
        state: RunState,
        phase: &ActivePhase,
        elapsed: Duration,
    ) -> TickOutcome {
        if elapsed >= phase.profile.duration {
            return TickOutcome::Finished(state);
        }

        let elapsed_ms = elapsed.as_millis() as u64;
        let elapsed_f = elapsed.as_secs_f64() * 1000.0;
        let jitter = self.signal.jitter(self.config.jitter_amplitude);
        let value = signal_value(
            &self.config,
            &phase.profile,
            phase.base_rate,
            elapsed_f,
            jitter,
        );
        let progress = progress_percent(elapsed_f, phase.duration_ms());

        TickOutcome::Sampled {
            state: state.with_sample(
                phase.direction,
                elapsed_ms,
                progress,
                value,
            ),
            value,
        }
    }

    /// Close the run, returning the idle state and the run's result.
    pub fn finish(&self, state: RunState) -> (RunState, SpeedTestResult) {
        let result = SpeedTestResult::new(
            state.current_download,
            state.current_upload,
            state.current_ping,
        );
        (state.enter_phase(TestPhase::Idle), result)
    }
}
