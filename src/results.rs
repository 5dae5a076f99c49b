//! Records kept in history.
//!
//! Both record types are immutable once created and serialize with the
//! field names used by the persisted history format, so histories
//! written by earlier versions keep loading.

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::units::{SizeUnit, SpeedUnit};

/// Locale-style timestamp, e.g. `3/14/2025, 9:26:53 AM`.
const DISPLAY_TIMESTAMP_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Render a timestamp the way history entries display it.
pub fn display_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(DISPLAY_TIMESTAMP_FORMAT).to_string()
}

/// Outcome of one completed speed test run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedTestResult {
    /// Creation time in milliseconds since the Unix epoch
    pub id: i64,
    /// Local, human readable completion time
    pub date: String,
    /// Final download speed in Mbps
    pub download: f64,
    /// Final upload speed in Mbps
    pub upload: f64,
    /// Ping in milliseconds
    pub ping: f64,
}

impl SpeedTestResult {
    /// Create a result stamped with the current local time.
    pub fn new(download: f64, upload: f64, ping: f64) -> Self {
        Self::at(Local::now(), download, upload, ping)
    }

    /// Create a result stamped with the given time.
    pub fn at<Tz: TimeZone>(
        completed: DateTime<Tz>,
        download: f64,
        upload: f64,
        ping: f64,
    ) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            id: completed.timestamp_millis(),
            date: display_timestamp(&completed),
            download,
            upload,
            ping,
        }
    }
}

/// Direction of a file transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferType {
    Download,
    Upload,
}

serde_plain::derive_display_from_serialize!(TransferType);
serde_plain::derive_fromstr_from_deserialize!(TransferType);

/// A transfer time calculation and its inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    /// Creation time in milliseconds since the Unix epoch
    pub id: i64,
    pub file_size: f64,
    pub size_unit: SizeUnit,
    pub transfer_type: TransferType,
    pub internet_speed: f64,
    pub speed_unit: SpeedUnit,
    /// Formatted transfer duration
    pub result: String,
    /// Local, human readable creation time
    pub timestamp: String,
}
