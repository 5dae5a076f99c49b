//! Synthetic bandwidth signal.
//!
//! A phase's speed ramps up to a base rate over the first part of the
//! phase, wobbles along a slow sine and picks up a little noise on
//! every tick.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::{PhaseProfile, SimulatorConfig};

/// Source of the random inputs to the simulation.
pub trait SignalSource: Send {
    /// Base rate for a phase, drawn from `[low, high]`.
    fn base_rate(&mut self, low: f64, high: f64) -> f64;

    /// Per-tick noise, drawn from `(-amplitude, amplitude)`.
    fn jitter(&mut self, amplitude: f64) -> f64;

    /// Ping in milliseconds, drawn from `[low, high]`.
    fn ping_ms(&mut self, low: u32, high: u32) -> u32;
}

/// Signal source backed by a seedable PRNG.
#[derive(Debug, Clone)]
pub struct RandomSignal {
    rng: StdRng,
}

impl RandomSignal {
    /// Seed from system entropy.
    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    /// Reproducible source for a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl SignalSource for RandomSignal {
    fn base_rate(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..=high)
    }

    fn jitter(&mut self, amplitude: f64) -> f64 {
        if amplitude <= 0.0 {
            return 0.0;
        }
        self.rng.gen_range(-amplitude..amplitude)
    }

    fn ping_ms(&mut self, low: u32, high: u32) -> u32 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..=high)
    }
}

/// Progress through a phase as a percentage, capped at 100.
pub fn progress_percent(elapsed_ms: f64, duration_ms: f64) -> f64 {
    if duration_ms <= 0.0 {
        return 100.0;
    }
    (elapsed_ms / duration_ms * 100.0).clamp(0.0, 100.0)
}

/// Speed emitted `elapsed_ms` into a phase.
///
/// The result is clamped to `[0, profile.max_speed]` and rounded to one
/// decimal place.
pub fn signal_value(
    config: &SimulatorConfig,
    profile: &PhaseProfile,
    base_rate: f64,
    elapsed_ms: f64,
    jitter: f64,
) -> f64 {
    let duration_ms = profile.duration.as_secs_f64() * 1000.0;
    let ramp_ms = duration_ms * config.ramp_fraction;
    let ramp = if ramp_ms > 0.0 {
        (elapsed_ms / ramp_ms).min(1.0)
    } else {
        1.0
    };
    let oscillation = (elapsed_ms / config.oscillation_divisor_ms).sin()
        * config.oscillation_amplitude;

    let raw = base_rate * ramp + oscillation + jitter;
    round_tenth(raw.clamp(0.0, profile.max_speed))
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
pub(crate) mod testing {
    use super::SignalSource;

    /// Deterministic source returning fixed values.
    #[derive(Debug, Clone)]
    pub struct FixedSignal {
        pub base: Option<f64>,
        pub jitter: f64,
        pub ping: u32,
    }

    impl FixedSignal {
        /// Base rate at the midpoint of each range, no noise.
        pub fn midpoint() -> Self {
            Self { base: None, jitter: 0.0, ping: 25 }
        }
    }

    impl SignalSource for FixedSignal {
        fn base_rate(&mut self, low: f64, high: f64) -> f64 {
            self.base.unwrap_or((low + high) / 2.0)
        }

        fn jitter(&mut self, _amplitude: f64) -> f64 {
            self.jitter
        }

        fn ping_ms(&mut self, _low: u32, _high: u32) -> u32 {
            self.ping
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::progress::BandwidthDirection;
    use proptest::prelude::*;

    #[test]
    fn test_ramp_reaches_base_at_forty_percent() {
        let config = SimulatorConfig::default();
        let profile = config.download;

        // sin(0) = 0 so the start is pure ramp.
        assert_eq!(signal_value(&config, &profile, 100.0, 0.0, 0.0), 0.0);

        let at_ramp_end = signal_value(&config, &profile, 100.0, 3200.0, 0.0);
        let expected = round_tenth(100.0 + (3200.0f64 / 800.0).sin() * 8.0);
        assert_eq!(at_ramp_end, expected);
    }

    #[test]
    fn test_values_are_clamped() {
        let config = SimulatorConfig::default();
        let upload = config.upload;

        assert_eq!(signal_value(&config, &upload, 500.0, 5000.0, 3.0), 100.0);
        assert_eq!(signal_value(&config, &upload, 0.0, 4000.0, -3.0), 0.0);
    }

    #[test]
    fn test_values_have_one_decimal() {
        let config = SimulatorConfig::default();
        let value =
            signal_value(&config, &config.download, 87.654, 1234.0, 1.111);
        assert_eq!(value, round_tenth(value));
        assert_eq!(format!("{:.1}", value).parse::<f64>().unwrap(), value);
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0.0, 8000.0), 0.0);
        assert_eq!(progress_percent(4000.0, 8000.0), 50.0);
        assert_eq!(progress_percent(9000.0, 8000.0), 100.0);
        assert_eq!(progress_percent(10.0, 0.0), 100.0);
    }

    #[test]
    fn test_seeded_signal_is_reproducible() {
        let mut a = RandomSignal::seeded(7);
        let mut b = RandomSignal::seeded(7);

        for _ in 0..20 {
            assert_eq!(a.base_rate(50.0, 150.0), b.base_rate(50.0, 150.0));
            assert_eq!(a.jitter(3.0), b.jitter(3.0));
            assert_eq!(a.ping_ms(10, 40), b.ping_ms(10, 40));
        }
    }

    #[test]
    fn test_random_signal_ranges() {
        let mut signal = RandomSignal::seeded(99);
        for _ in 0..1000 {
            let base = signal.base_rate(20.0, 70.0);
            assert!((20.0..=70.0).contains(&base));

            let jitter = signal.jitter(3.0);
            assert!((-3.0..3.0).contains(&jitter));

            let ping = signal.ping_ms(10, 40);
            assert!((10..=40).contains(&ping));
        }
    }

    #[test]
    fn test_ten_thousand_random_ticks_stay_in_range() {
        let config = SimulatorConfig::default();
        let mut signal = RandomSignal::seeded(2024);

        for direction in
            [BandwidthDirection::Download, BandwidthDirection::Upload]
        {
            let profile = *config.profile(direction);
            let duration_ms = profile.duration.as_secs_f64() * 1000.0;
            let base = signal.base_rate(profile.base_min, profile.base_max);

            for i in 0..10_000u32 {
                let elapsed = f64::from(i) / 10_000.0 * duration_ms;
                let jitter = signal.jitter(config.jitter_amplitude);
                let value =
                    signal_value(&config, &profile, base, elapsed, jitter);
                assert!(
                    (0.0..=profile.max_speed).contains(&value),
                    "{:?} value {} out of range",
                    direction,
                    value
                );
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        /// Property: for any base rate, time and noise the emitted value
        /// lies within [0, max] for both phases.
        #[test]
        fn prop_signal_value_clamped(
            base in -500.0f64..500.0,
            elapsed in 0.0f64..20_000.0,
            jitter in -3.0f64..3.0,
            download in any::<bool>()
        ) {
            let config = SimulatorConfig::default();
            let profile =
                if download { config.download } else { config.upload };
            let value = signal_value(&config, &profile, base, elapsed, jitter);
            prop_assert!(value >= 0.0);
            prop_assert!(value <= profile.max_speed);
        }

        /// Property: progress never decreases as time moves forward.
        #[test]
        fn prop_progress_monotonic(
            a in 0.0f64..20_000.0,
            delta in 0.0f64..5_000.0
        ) {
            prop_assert!(
                progress_percent(a + delta, 8000.0)
                    >= progress_percent(a, 8000.0)
            );
        }
    }
}
