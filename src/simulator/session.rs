//! Timed execution of speed test runs.
//!
//! A [`SpeedTestSession`] drives the [`Simulator`] against the tokio
//! clock, reports progress and records finished runs in the speed test
//! history. At most one run is active per session: every run is tied
//! to a [`RunHandle`] whose cancellation token is checked before each
//! tick and raced against every sleep.

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use super::engine::{Simulator, TickOutcome};
use super::signal::SignalSource;
use super::state::RunState;
use crate::errors::AppError;
use crate::history::HistoryStore;
use crate::results::SpeedTestResult;
use crate::tui::progress::{
    BandwidthDirection, ProgressCallback, ProgressEvent, TestPhase,
};

/// Handle to a started run.
///
/// Cancelling the handle stops the run at its next suspension point.
#[derive(Debug, Clone)]
pub struct RunHandle {
    id: u64,
    token: CancellationToken,
}

impl RunHandle {
    /// Sequence number of the run within its session.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Runs simulated speed tests and keeps their history.
pub struct SpeedTestSession<S> {
    simulator: Simulator<S>,
    history: HistoryStore<SpeedTestResult>,
    state: RunState,
    active: Option<RunHandle>,
    next_id: u64,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl<S: SignalSource> SpeedTestSession<S> {
    pub fn new(
        simulator: Simulator<S>,
        history: HistoryStore<SpeedTestResult>,
    ) -> Self {
        let state = RunState::idle(simulator.config().sample_capacity);
        Self {
            simulator,
            history,
            state,
            active: None,
            next_id: 0,
            progress: None,
        }
    }

    /// Report progress events to `callback`.
    pub fn with_progress(
        mut self,
        callback: Arc<dyn ProgressCallback>,
    ) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn simulator(&self) -> &Simulator<S> {
        &self.simulator
    }

    /// Live state of the current (or last) run.
    ///
    /// A run whose future was dropped reads as idle.
    pub fn state(&mut self) -> &RunState {
        self.settle();
        &self.state
    }

    pub fn history(&self) -> &HistoryStore<SpeedTestResult> {
        &self.history
    }

    /// True while a started run has neither finished nor been cancelled.
    pub fn is_running(&self) -> bool {
        self.active.as_ref().is_some_and(|handle| !handle.is_cancelled())
    }

    /// Start a new run.
    ///
    /// Fails with [`ErrorKind::RunInProgress`](crate::errors::ErrorKind)
    /// while another run is active. The returned handle is passed to
    /// [`drive`](Self::drive) to execute the run.
    pub fn start(&mut self) -> Result<RunHandle, AppError> {
        self.settle();
        if self.is_running() {
            return Err(AppError::run_in_progress());
        }
        Ok(self.launch())
    }

    /// Cancel any active run, then start a new one.
    pub fn restart(&mut self) -> RunHandle {
        self.cancel();
        self.launch()
    }

    fn launch(&mut self) -> RunHandle {
        self.next_id += 1;
        let handle =
            RunHandle { id: self.next_id, token: CancellationToken::new() };
        self.state = self.simulator.begin(std::mem::take(&mut self.state));
        self.active = Some(handle.clone());

        info!("Starting speed test run #{}", handle.id);
        self.emit(ProgressEvent::RunStarted);
        self.emit(ProgressEvent::PhaseChange(TestPhase::Ping));
        handle
    }

    /// Cancel the active run, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.active.take() {
            debug!("Cancelling speed test run #{}", handle.id);
            handle.cancel();
            self.emit(ProgressEvent::Cancelled);
        }
        self.enter_idle();
    }

    fn enter_idle(&mut self) {
        let state = std::mem::take(&mut self.state);
        self.state = state.enter_phase(TestPhase::Idle);
    }

    /// Retire an active run whose token fired without `drive` seeing it,
    /// which happens when the drive future is dropped.
    fn settle(&mut self) {
        if self.active.as_ref().is_some_and(RunHandle::is_cancelled) {
            self.cancel();
        }
    }

    /// Start a run and drive it to completion.
    pub async fn run(&mut self) -> Result<SpeedTestResult, AppError> {
        let handle = self.start()?;
        self.drive(handle).await
    }

    /// Execute the run identified by `handle`.
    ///
    /// Dropping the returned future cancels the run.
    pub async fn drive(
        &mut self,
        handle: RunHandle,
    ) -> Result<SpeedTestResult, AppError> {
        let _guard = handle.token.clone().drop_guard();

        let outcome = self.execute(&handle).await;
        if let Err(ref e) = outcome {
            if self.is_current(&handle) {
                debug!("Run #{} ended early: {}", handle.id, e.message);
                self.active = None;
                self.enter_idle();
                if e.is_cancelled() {
                    self.emit(ProgressEvent::Cancelled);
                }
            }
        }
        outcome
    }

    async fn execute(
        &mut self,
        handle: &RunHandle,
    ) -> Result<SpeedTestResult, AppError> {
        self.ensure_current(handle)?;
        let ping_delay = self.simulator.config().ping_delay;
        self.pause(handle, ping_delay).await?;

        self.ensure_current(handle)?;
        let state = std::mem::take(&mut self.state);
        self.state = self.simulator.measure_ping(state);
        self.emit(ProgressEvent::PingMeasurement {
            value_ms: self.state.current_ping,
        });
        self.emit(ProgressEvent::PhaseComplete(TestPhase::Ping));

        let directions =
            [BandwidthDirection::Download, BandwidthDirection::Upload];
        for direction in directions {
            self.run_phase(handle, direction).await?;
        }

        self.ensure_current(handle)?;
        let (state, result) =
            self.simulator.finish(std::mem::take(&mut self.state));
        self.state = state;
        self.active = None;

        if let Err(e) = self.history.append(result.clone()) {
            warn!("Could not save speed test result: {}", e);
            self.emit(ProgressEvent::Error(e.message.clone()));
        }

        info!(
            "Run #{} complete: down {:.1} Mbps, up {:.1} Mbps, ping {} ms",
            handle.id, result.download, result.upload, result.ping
        );
        self.emit(ProgressEvent::PhaseChange(TestPhase::Idle));
        self.emit(ProgressEvent::RunComplete(result.clone()));
        Ok(result)
    }

    async fn run_phase(
        &mut self,
        handle: &RunHandle,
        direction: BandwidthDirection,
    ) -> Result<(), AppError> {
        self.ensure_current(handle)?;
        let (state, phase) = self
            .simulator
            .start_phase(std::mem::take(&mut self.state), direction);
        self.state = state;
        self.emit(ProgressEvent::PhaseChange(direction.phase()));

        let tick_interval = self.simulator.config().tick_interval;
        let started = Instant::now();

        loop {
            self.ensure_current(handle)?;
            let elapsed = started.elapsed();
            let state = std::mem::take(&mut self.state);

            match self.simulator.tick(state, &phase, elapsed) {
                TickOutcome::Sampled { state, value } => {
                    self.state = state;
                    if let Some(sample) = self.state.samples.latest().copied() {
                        self.emit(ProgressEvent::SpeedSample {
                            direction,
                            speed_mbps: value,
                            progress_percent: self.state.progress_percent,
                            sample,
                        });
                    }
                    // Sleep only after the tick's work is done.
                    self.pause(handle, tick_interval).await?;
                }
                TickOutcome::Finished(state) => {
                    self.state = state;
                    self.emit(ProgressEvent::PhaseComplete(direction.phase()));
                    return Ok(());
                }
            }
        }
    }

    fn is_current(&self, handle: &RunHandle) -> bool {
        self.active.as_ref().is_some_and(|active| active.id == handle.id)
    }

    fn ensure_current(&self, handle: &RunHandle) -> Result<(), AppError> {
        if handle.is_cancelled() || !self.is_current(handle) {
            return Err(AppError::cancelled());
        }
        Ok(())
    }

    async fn pause(
        &self,
        handle: &RunHandle,
        duration: Duration,
    ) -> Result<(), AppError> {
        tokio::select! {
            _ = handle.token.cancelled() => Err(AppError::cancelled()),
            _ = sleep(duration) => Ok(()),
        }
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(ref callback) = self.progress {
            callback.on_progress(event);
        }
    }
}
