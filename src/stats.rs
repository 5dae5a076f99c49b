//! Summary statistics over stored results.

use crate::results::SpeedTestResult;

pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> =
        values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }

    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;

    if sorted.len() % 2 == 0 {
        mean(&[sorted[mid - 1], sorted[mid]])
    } else {
        Some(sorted[mid])
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let sum = values.iter().sum::<f64>();

    Some(sum / values.len() as f64)
}

/// Medians of each metric across a speed test history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistorySummary {
    pub runs: usize,
    pub download: f64,
    pub upload: f64,
    pub ping: f64,
}

impl HistorySummary {
    pub fn from_results(results: &[SpeedTestResult]) -> Option<Self> {
        let column = |f: fn(&SpeedTestResult) -> f64| {
            median(&results.iter().map(f).collect::<Vec<_>>())
        };

        Some(Self {
            runs: results.len(),
            download: column(|r| r.download)?,
            upload: column(|r| r.upload)?,
            ping: column(|r| r.ping)?,
        })
    }
}
