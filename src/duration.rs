//! Human readable rendering of transfer durations.

use crate::units::TransferTime;

const SECONDS_PER_MINUTE: f64 = 60.0;
const SECONDS_PER_HOUR: f64 = 3600.0;
const SECONDS_PER_DAY: f64 = 86400.0;

/// Rendering used when the transfer rate is zero.
pub const NEVER_COMPLETES: &str = "Never completes";

/// Format a duration in seconds for display.
///
/// Durations are rendered in the largest band that fits:
/// milliseconds below one second, seconds with one decimal below a
/// minute, and then two whole units (minutes and seconds, hours and
/// minutes, days and hours).
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.001 {
        return "Less than 1 millisecond".to_string();
    }

    if seconds < 1.0 {
        return format!("{} milliseconds", (seconds * 1000.0).round());
    }

    if seconds < SECONDS_PER_MINUTE {
        return format!("{:.1} seconds", seconds);
    }

    let minutes = (seconds / SECONDS_PER_MINUTE).floor() as u64;
    let remaining_seconds = (seconds % SECONDS_PER_MINUTE).round() as u64;

    if seconds < SECONDS_PER_HOUR {
        return format!(
            "{} {}",
            quantity(minutes, "minute"),
            quantity(remaining_seconds, "second")
        );
    }

    // Hours and days derive from whole minutes, so leftover seconds
    // never round a band up.
    let hours = minutes / 60;
    let remaining_minutes = minutes % 60;

    if seconds < SECONDS_PER_DAY {
        return format!(
            "{} {}",
            quantity(hours, "hour"),
            quantity(remaining_minutes, "minute")
        );
    }

    let days = hours / 24;
    let remaining_hours = hours % 24;

    format!("{} {}", quantity(days, "day"), quantity(remaining_hours, "hour"))
}

/// Format a [`TransferTime`], rendering [`TransferTime::Never`] as
/// "Never completes".
pub fn format_transfer_time(time: TransferTime) -> String {
    match time {
        TransferTime::Finite(seconds) => format_duration(seconds),
        TransferTime::Never => NEVER_COMPLETES.to_string(),
    }
}

fn quantity(count: u64, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
