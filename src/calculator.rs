//! File transfer time calculator.
//!
//! Turns a file size and an internet speed into a human readable
//! transfer time and records every calculation in its own history.

use chrono::{DateTime, Local, TimeZone};
use log::{debug, warn};

use crate::duration::format_transfer_time;
use crate::history::HistoryStore;
use crate::results::{display_timestamp, CalculationResult, TransferType};
use crate::units::{
    to_bits, to_bits_per_second, transfer_seconds, SizeUnit, SpeedUnit,
    TransferTime,
};

/// Parse a numeric field leniently.
///
/// The longest leading decimal number is used, so `"12abc"` reads as
/// 12. Empty, non-numeric and non-finite input reads as 0.
pub fn parse_number(text: &str) -> f64 {
    let text = text.trim_start();
    let end = numeric_prefix_len(text);

    match text[..end].parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Length of the leading `[+-]digits[.digits][e[+-]digits]` run.
fn numeric_prefix_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    // A lone sign or dot is not a number.
    if !bytes[digits_start..end].iter().any(u8::is_ascii_digit) {
        return 0;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    end
}

/// Inputs of one calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalculatorInput {
    pub file_size: f64,
    pub size_unit: SizeUnit,
    pub transfer_type: TransferType,
    pub internet_speed: f64,
    pub speed_unit: SpeedUnit,
}

impl Default for CalculatorInput {
    /// 1 MB downloaded at 100 Mbps.
    fn default() -> Self {
        Self {
            file_size: 1.0,
            size_unit: SizeUnit::MB,
            transfer_type: TransferType::Download,
            internet_speed: 100.0,
            speed_unit: SpeedUnit::Mbps,
        }
    }
}

impl CalculatorInput {
    /// Build an input from raw text fields, reading numbers leniently.
    pub fn from_fields(
        file_size: &str,
        size_unit: SizeUnit,
        transfer_type: TransferType,
        internet_speed: &str,
        speed_unit: SpeedUnit,
    ) -> Self {
        Self {
            file_size: parse_number(file_size),
            size_unit,
            transfer_type,
            internet_speed: parse_number(internet_speed),
            speed_unit,
        }
    }

    pub fn transfer_time(&self) -> TransferTime {
        transfer_seconds(
            to_bits(self.file_size, self.size_unit),
            to_bits_per_second(self.internet_speed, self.speed_unit),
        )
    }
}

/// Runs calculations and records them.
pub struct Calculator {
    history: HistoryStore<CalculationResult>,
}

impl Calculator {
    pub fn new(history: HistoryStore<CalculationResult>) -> Self {
        Self { history }
    }

    pub fn history(&self) -> &HistoryStore<CalculationResult> {
        &self.history
    }

    /// Calculate the transfer time for `input` and record it.
    pub fn calculate(&mut self, input: CalculatorInput) -> CalculationResult {
        self.calculate_at(input, Local::now())
    }

    /// Calculate as of `at`.
    ///
    /// A failure to persist the history is logged; the result is still
    /// recorded in memory and returned.
    pub fn calculate_at<Tz: TimeZone>(
        &mut self,
        input: CalculatorInput,
        at: DateTime<Tz>,
    ) -> CalculationResult
    where
        Tz::Offset: std::fmt::Display,
    {
        let time = input.transfer_time();
        debug!("Transfer time for {:?}: {:?}", input, time);

        let result = CalculationResult {
            id: at.timestamp_millis(),
            file_size: input.file_size,
            size_unit: input.size_unit,
            transfer_type: input.transfer_type,
            internet_speed: input.internet_speed,
            speed_unit: input.speed_unit,
            result: format_transfer_time(time),
            timestamp: display_timestamp(&at),
        };

        if let Err(e) = self.history.append(result.clone()) {
            warn!("Could not save calculation: {}", e);
        }
        result
    }
}
