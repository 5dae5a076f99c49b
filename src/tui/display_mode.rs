//! How a speed test run presents itself.

/// Output mode of the `test` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Live dashboard with gauges, chart and history
    Tui,
    /// Plain text summary once the run finishes
    Silent,
    /// The finished result as JSON on stdout
    Json,
}

impl DisplayMode {
    /// Pick the mode for a run.
    ///
    /// `--json` always wins; otherwise the dashboard is shown only when
    /// stdout is a terminal.
    pub fn detect(json_flag: bool, is_tty: bool) -> Self {
        match (json_flag, is_tty) {
            (true, _) => DisplayMode::Json,
            (false, true) => DisplayMode::Tui,
            (false, false) => DisplayMode::Silent,
        }
    }

    /// Whether this mode takes over the terminal.
    pub fn is_interactive(&self) -> bool {
        *self == DisplayMode::Tui
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_json_flag_wins() {
        assert_eq!(DisplayMode::detect(true, true), DisplayMode::Json);
        assert_eq!(DisplayMode::detect(true, false), DisplayMode::Json);
    }

    #[test]
    fn test_piped_output_is_silent() {
        assert_eq!(DisplayMode::detect(false, false), DisplayMode::Silent);
        assert!(!DisplayMode::Silent.is_interactive());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: the dashboard is chosen exactly when stdout is a
        /// terminal and JSON was not requested.
        #[test]
        fn prop_dashboard_only_on_tty_without_json(
            json_flag in any::<bool>(),
            is_tty in any::<bool>()
        ) {
            let mode = DisplayMode::detect(json_flag, is_tty);
            prop_assert_eq!(mode.is_interactive(), is_tty && !json_flag);
            prop_assert_eq!(mode == DisplayMode::Json, json_flag);
        }
    }
}
