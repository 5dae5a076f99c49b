//! Live state of a speed test run.

use serde::Serialize;
use std::collections::VecDeque;

use crate::tui::progress::{BandwidthDirection, TestPhase};

/// Default capacity of the rolling sample buffer.
pub const SAMPLE_BUFFER_CAPACITY: usize = 30;

/// One point of the speed chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeedSample {
    /// Seconds since the phase started, to one decimal
    pub elapsed_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<f64>,
}

impl SpeedSample {
    /// Sample for `direction` taken `elapsed_ms` into its phase.
    pub fn new(
        direction: BandwidthDirection,
        elapsed_ms: u64,
        value: f64,
    ) -> Self {
        let elapsed_seconds = (elapsed_ms as f64 / 100.0).round() / 10.0;
        match direction {
            BandwidthDirection::Download => {
                Self { elapsed_seconds, download: Some(value), upload: None }
            }
            BandwidthDirection::Upload => {
                Self { elapsed_seconds, download: None, upload: Some(value) }
            }
        }
    }

    /// Value of this sample for `direction`, if it carries one.
    pub fn value(&self, direction: BandwidthDirection) -> Option<f64> {
        match direction {
            BandwidthDirection::Download => self.download,
            BandwidthDirection::Upload => self.upload,
        }
    }
}

/// Fixed capacity FIFO of chart samples.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: VecDeque<SpeedSample>,
    capacity: usize,
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self { samples: VecDeque::with_capacity(capacity), capacity }
    }

    /// Append a sample, evicting the oldest once full.
    pub fn push(&mut self, sample: SpeedSample) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpeedSample> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&SpeedSample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// `(elapsed_seconds, value)` points of one series, oldest first.
    pub fn series(&self, direction: BandwidthDirection) -> Vec<(f64, f64)> {
        self.samples
            .iter()
            .filter_map(|s| s.value(direction).map(|v| (s.elapsed_seconds, v)))
            .collect()
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new(SAMPLE_BUFFER_CAPACITY)
    }
}

/// State of the run in progress.
///
/// Transitions consume the state and return the next one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunState {
    /// Active phase
    pub phase: TestPhase,
    /// Progress through the active phase, 0 to 100
    pub progress_percent: f64,
    /// Latest download speed in Mbps
    pub current_download: f64,
    /// Latest upload speed in Mbps
    pub current_upload: f64,
    /// Ping in milliseconds
    pub current_ping: f64,
    /// Recent samples for the chart
    pub samples: SampleBuffer,
}

impl RunState {
    /// An idle state whose buffer holds `capacity` samples.
    pub fn idle(capacity: usize) -> Self {
        Self { samples: SampleBuffer::new(capacity), ..Self::default() }
    }

    /// Reset every value and enter the ping phase.
    pub fn begin(self) -> Self {
        let capacity = self.samples.capacity();
        Self::idle(capacity).enter_phase(TestPhase::Ping)
    }

    /// Switch to `phase`, restarting progress.
    pub fn enter_phase(mut self, phase: TestPhase) -> Self {
        self.phase = phase;
        self.progress_percent = 0.0;
        self
    }

    /// Record the measured ping.
    pub fn with_ping(mut self, ping_ms: f64) -> Self {
        self.current_ping = ping_ms;
        self
    }

    /// Record a bandwidth sample taken `elapsed_ms` into the phase.
    pub fn with_sample(
        mut self,
        direction: BandwidthDirection,
        elapsed_ms: u64,
        progress_percent: f64,
        value: f64,
    ) -> Self {
        match direction {
            BandwidthDirection::Download => self.current_download = value,
            BandwidthDirection::Upload => self.current_upload = value,
        }
        self.progress_percent = progress_percent.clamp(0.0, 100.0);
        self.samples.push(SpeedSample::new(direction, elapsed_ms, value));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sample_elapsed_rounding() {
        let sample = SpeedSample::new(BandwidthDirection::Download, 1249, 10.0);
        assert_eq!(sample.elapsed_seconds, 1.2);

        let sample = SpeedSample::new(BandwidthDirection::Upload, 1250, 10.0);
        assert_eq!(sample.elapsed_seconds, 1.3);
        assert_eq!(sample.download, None);
        assert_eq!(sample.upload, Some(10.0));
    }

    #[test]
    fn test_sample_serializes_only_its_series() {
        let sample = SpeedSample::new(BandwidthDirection::Download, 500, 42.5);
        let json = serde_json::to_value(sample).unwrap();

        assert_eq!(json["elapsed_seconds"], 0.5);
        assert_eq!(json["download"], 42.5);
        assert!(json.get("upload").is_none());
    }

    #[test]
    fn test_buffer_evicts_oldest() {
        let mut buffer = SampleBuffer::new(3);
        for ms in [0u64, 500, 1000, 1500] {
            buffer.push(SpeedSample::new(
                BandwidthDirection::Download,
                ms,
                1.0,
            ));
        }

        assert_eq!(buffer.len(), 3);
        let first = buffer.iter().next().unwrap();
        assert_eq!(first.elapsed_seconds, 0.5);
        assert_eq!(buffer.latest().unwrap().elapsed_seconds, 1.5);
    }

    #[test]
    fn test_series_filters_by_direction() {
        let mut buffer = SampleBuffer::default();
        buffer.push(SpeedSample::new(BandwidthDirection::Download, 0, 5.0));
        buffer.push(SpeedSample::new(BandwidthDirection::Upload, 0, 2.0));
        buffer.push(SpeedSample::new(BandwidthDirection::Upload, 500, 3.0));

        assert_eq!(
            buffer.series(BandwidthDirection::Download),
            vec![(0.0, 5.0)]
        );
        assert_eq!(
            buffer.series(BandwidthDirection::Upload),
            vec![(0.0, 2.0), (0.5, 3.0)]
        );
    }

    #[test]
    fn test_begin_resets_previous_run() {
        let state = RunState::idle(30)
            .begin()
            .with_ping(25.0)
            .enter_phase(TestPhase::Download)
            .with_sample(BandwidthDirection::Download, 500, 6.25, 80.0);

        let fresh = state.begin();

        assert_eq!(fresh.phase, TestPhase::Ping);
        assert_eq!(fresh.current_ping, 0.0);
        assert_eq!(fresh.current_download, 0.0);
        assert!(fresh.samples.is_empty());
        assert_eq!(fresh.samples.capacity(), 30);
    }

    #[test]
    fn test_enter_phase_resets_progress() {
        let state = RunState::idle(30)
            .enter_phase(TestPhase::Download)
            .with_sample(BandwidthDirection::Download, 4000, 50.0, 90.0)
            .enter_phase(TestPhase::Upload);

        assert_eq!(state.progress_percent, 0.0);
        assert_eq!(state.current_download, 90.0);
        assert_eq!(state.current_upload, 0.0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: the buffer never holds more than its capacity.
        #[test]
        fn prop_buffer_never_exceeds_capacity(
            capacity in 1usize..40,
            pushes in 0usize..200
        ) {
            let mut buffer = SampleBuffer::new(capacity);
            for i in 0..pushes {
                buffer.push(SpeedSample::new(
                    BandwidthDirection::Upload,
                    i as u64 * 500,
                    1.0,
                ));
                prop_assert!(buffer.len() <= capacity);
            }
            prop_assert_eq!(buffer.len(), pushes.min(capacity));
        }
    }
}
