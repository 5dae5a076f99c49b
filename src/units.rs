//! File size and bandwidth unit conversion.
//!
//! All conversions use decimal (SI) multipliers: a kilobyte is 1000
//! bytes and a kilobit per second is 1000 bits per second.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unit of a file size.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum SizeUnit {
    KB,
    MB,
    GB,
    TB,
}

impl SizeUnit {
    /// All size units, smallest first.
    pub const ALL: [SizeUnit; 4] =
        [SizeUnit::KB, SizeUnit::MB, SizeUnit::GB, SizeUnit::TB];

    /// Number of bits in one of this unit.
    pub const fn bits(&self) -> f64 {
        match self {
            SizeUnit::KB => 8e3,
            SizeUnit::MB => 8e6,
            SizeUnit::GB => 8e9,
            SizeUnit::TB => 8e12,
        }
    }
}

/// Unit of a bandwidth.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum SpeedUnit {
    Kbps,
    Mbps,
    Gbps,
}

impl SpeedUnit {
    /// All speed units, slowest first.
    pub const ALL: [SpeedUnit; 3] =
        [SpeedUnit::Kbps, SpeedUnit::Mbps, SpeedUnit::Gbps];

    /// Bits per second in one of this unit.
    pub const fn bits_per_second(&self) -> f64 {
        match self {
            SpeedUnit::Kbps => 1e3,
            SpeedUnit::Mbps => 1e6,
            SpeedUnit::Gbps => 1e9,
        }
    }
}

/// Returned when a unit string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownUnit(pub String);

impl fmt::Display for UnknownUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown unit '{}'", self.0)
    }
}

impl std::error::Error for UnknownUnit {}

impl FromStr for SizeUnit {
    type Err = UnknownUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SizeUnit::ALL
            .into_iter()
            .find(|unit| unit.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownUnit(s.to_string()))
    }
}

impl FromStr for SpeedUnit {
    type Err = UnknownUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpeedUnit::ALL
            .into_iter()
            .find(|unit| unit.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownUnit(s.to_string()))
    }
}

serde_plain::derive_display_from_serialize!(SizeUnit);
serde_plain::derive_display_from_serialize!(SpeedUnit);

/// Convert a file size to bits.
pub fn to_bits(size: f64, unit: SizeUnit) -> f64 {
    size * unit.bits()
}

/// Convert a bandwidth to bits per second.
pub fn to_bits_per_second(speed: f64, unit: SpeedUnit) -> f64 {
    speed * unit.bits_per_second()
}

/// Time needed to move a payload at a given rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransferTime {
    /// The transfer completes after this many seconds.
    Finite(f64),
    /// The rate is zero or the duration does not fit in an `f64`.
    Never,
}

/// Transfer duration for `size_bits` at `rate_bps`.
///
/// A rate that is not a positive finite number, or a ratio that
/// overflows, yields [`TransferTime::Never`]. `Finite` always holds a
/// finite value.
pub fn transfer_seconds(size_bits: f64, rate_bps: f64) -> TransferTime {
    if !rate_bps.is_finite() || rate_bps <= 0.0 {
        return TransferTime::Never;
    }

    let seconds = size_bits / rate_bps;
    if !seconds.is_finite() {
        return TransferTime::Never;
    }
    TransferTime::Finite(seconds.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decimal_size_multipliers() {
        assert_eq!(to_bits(1.0, SizeUnit::KB), 8_000.0);
        assert_eq!(to_bits(1.0, SizeUnit::MB), 8_000_000.0);
        assert_eq!(to_bits(1.0, SizeUnit::GB), 8_000_000_000.0);
        assert_eq!(to_bits(1.0, SizeUnit::TB), 8_000_000_000_000.0);
    }

    #[test]
    fn test_decimal_speed_multipliers() {
        assert_eq!(to_bits_per_second(1.0, SpeedUnit::Kbps), 1_000.0);
        assert_eq!(to_bits_per_second(1.0, SpeedUnit::Mbps), 1_000_000.0);
        assert_eq!(to_bits_per_second(1.0, SpeedUnit::Gbps), 1_000_000_000.0);
    }

    #[test]
    fn test_one_megabyte_at_hundred_megabits() {
        let bits = to_bits(1.0, SizeUnit::MB);
        let rate = to_bits_per_second(100.0, SpeedUnit::Mbps);

        assert_eq!(transfer_seconds(bits, rate), TransferTime::Finite(0.08));
    }

    #[test]
    fn test_zero_rate_never_completes() {
        let bits = to_bits(5.0, SizeUnit::GB);

        assert_eq!(transfer_seconds(bits, 0.0), TransferTime::Never);
        assert_eq!(transfer_seconds(bits, -1.0), TransferTime::Never);
        assert_eq!(transfer_seconds(bits, f64::NAN), TransferTime::Never);
    }

    #[test]
    fn test_overflowing_ratio_never_completes() {
        let huge = to_bits(1e300, SizeUnit::TB);
        assert_eq!(
            transfer_seconds(huge, to_bits_per_second(1.0, SpeedUnit::Kbps)),
            TransferTime::Never
        );

        let tiny_rate = to_bits_per_second(1e-310, SpeedUnit::Kbps);
        assert!(tiny_rate > 0.0);
        assert_eq!(
            transfer_seconds(to_bits(1.0, SizeUnit::MB), tiny_rate),
            TransferTime::Never
        );
    }

    #[test]
    fn test_unit_parsing_and_display() {
        assert_eq!("mb".parse::<SizeUnit>(), Ok(SizeUnit::MB));
        assert_eq!(" TB ".parse::<SizeUnit>(), Ok(SizeUnit::TB));
        assert_eq!("gbps".parse::<SpeedUnit>(), Ok(SpeedUnit::Gbps));
        assert!("PB".parse::<SizeUnit>().is_err());
        assert_eq!(SizeUnit::GB.to_string(), "GB");
        assert_eq!(SpeedUnit::Kbps.to_string(), "Kbps");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Property: to_bits is monotonically increasing in the size.
        #[test]
        fn prop_to_bits_monotonic_in_size(
            a in 0.001f64..1e6,
            delta in 0.001f64..1e6,
            index in 0usize..4
        ) {
            let unit = SizeUnit::ALL[index];
            prop_assert!(to_bits(a + delta, unit) > to_bits(a, unit));
        }

        /// Property: at a fixed positive size, TB > GB > MB > KB.
        #[test]
        fn prop_units_strictly_ordered(size in 0.001f64..1e9) {
            let bits: Vec<f64> =
                SizeUnit::ALL.iter().map(|u| to_bits(size, *u)).collect();
            for pair in bits.windows(2) {
                prop_assert!(pair[1] > pair[0]);
            }
        }

        /// Property: any positive rate gives a finite, non-negative time.
        #[test]
        fn prop_positive_rate_is_finite(
            bits in 0.0f64..1e15,
            rate in 1.0f64..1e12
        ) {
            match transfer_seconds(bits, rate) {
                TransferTime::Finite(seconds) => {
                    prop_assert!(seconds.is_finite());
                    prop_assert!(seconds >= 0.0);
                }
                TransferTime::Never => prop_assert!(false, "unexpected Never"),
            }
        }
    }
}
