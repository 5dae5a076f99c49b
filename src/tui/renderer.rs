//! TUI rendering logic using ratatui.
//!
//! Handles the actual rendering of the dashboard using ratatui widgets,
//! including layout, formatting, and color coding.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Chart, Dataset, Gauge, GraphType, Paragraph,
    },
    Frame,
};

use super::progress::{BandwidthDirection, TestPhase};
use super::state::TuiState;

/// Get color for speed value based on thresholds.
///
/// - Green: >= 100 Mbps (fast)
/// - Yellow: 25-100 Mbps (moderate)
/// - Red: < 25 Mbps (slow)
pub fn speed_color(speed_mbps: f64) -> Color {
    if speed_mbps >= 100.0 {
        Color::Green
    } else if speed_mbps >= 25.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Format a speed, switching to Kbps below 1 Mbps.
pub fn format_speed(speed_mbps: f64) -> String {
    if speed_mbps < 1.0 {
        format!("{:.0} Kbps", speed_mbps * 1000.0)
    } else {
        format!("{} Mbps", speed_mbps)
    }
}

/// Format latency value in whole milliseconds.
pub fn format_latency(latency_ms: f64) -> String {
    format!("{:.0} ms", latency_ms)
}

/// Minimal mode threshold in columns.
const MINIMAL_MODE_THRESHOLD: u16 = 60;

/// Check if minimal mode should be used based on terminal width.
pub fn is_minimal_mode(width: u16) -> bool {
    width < MINIMAL_MODE_THRESHOLD
}

const DOWNLOAD_COLOR: Color = Color::Cyan;
const UPLOAD_COLOR: Color = Color::LightBlue;

fn label_style() -> Style {
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
}

/// Render the TUI to the terminal.
///
/// This is the main entry point for rendering. It determines whether
/// to use normal or minimal mode based on terminal width.
pub fn render_frame(frame: &mut Frame, state: &TuiState) {
    if is_minimal_mode(frame.area().width) {
        render_minimal_frame(frame, state);
    } else {
        render_normal_frame(frame, state);
    }
}

/// Render the normal (full-width) dashboard layout.
fn render_normal_frame(frame: &mut Frame, state: &TuiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Current phase
            Constraint::Length(3), // Gauges
            Constraint::Length(3), // Metrics
            Constraint::Min(8),    // Chart
            Constraint::Length(7), // History
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_phase_indicator(frame, chunks[0], state);
    render_gauges(frame, chunks[1], state);
    render_metrics(frame, chunks[2], state);
    render_chart(frame, chunks[3], state);
    render_history(frame, chunks[4], state);
    render_status_bar(frame, chunks[5], state);
}

/// Render the minimal mode layout for narrow terminals.
pub fn render_minimal_frame(frame: &mut Frame, state: &TuiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Phase + speed
            Constraint::Min(2),    // Metrics/errors
        ])
        .split(frame.area());

    render_minimal_phase(frame, chunks[0], state);
    render_minimal_results(frame, chunks[1], state);
}

/// Text and style of the phase indicator.
fn phase_label(state: &TuiState) -> (&'static str, Style) {
    let yellow =
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    match state.phase {
        TestPhase::Idle if state.cancelled => ("■ Cancelled", yellow),
        TestPhase::Idle if state.last_result.is_some() => (
            "✓ Complete",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        TestPhase::Idle => ("◐ Ready", Style::default().fg(Color::Gray)),
        TestPhase::Ping => ("▶ Testing Ping...", yellow),
        TestPhase::Download => ("▶ Download Test", yellow),
        TestPhase::Upload => ("▶ Upload Test", yellow),
    }
}

/// Render the current test phase indicator.
pub fn render_phase_indicator(frame: &mut Frame, area: Rect, state: &TuiState) {
    let (phase_text, style) = phase_label(state);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let paragraph = Paragraph::new(phase_text).style(style);
    frame.render_widget(paragraph, inner);
}

/// Direction shown on the speed gauge.
///
/// While idle the gauge keeps showing the download speed of the last run.
fn gauge_direction(state: &TuiState) -> BandwidthDirection {
    state.phase.direction().unwrap_or(BandwidthDirection::Download)
}

fn gauge_ratio(value: f64, max: f64) -> f64 {
    if max <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    (value / max).clamp(0.0, 1.0)
}

/// Render the phase progress bar and the speed gauge side by side.
pub fn render_gauges(frame: &mut Frame, area: Rect, state: &TuiState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let progress = gauge_ratio(state.progress_percent, 100.0);
    let progress_gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(progress)
        .label(format!("{}%", (progress * 100.0) as u16));
    frame.render_widget(progress_gauge, chunks[0]);

    let direction = gauge_direction(state);
    let speed = state
        .bandwidth(direction)
        .current_speed_mbps
        .or_else(|| {
            state.last_result.as_ref().map(|r| match direction {
                BandwidthDirection::Download => r.download,
                BandwidthDirection::Upload => r.upload,
            })
        })
        .unwrap_or(0.0);
    let max = state.speed_limit(direction);

    let speed_gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Speed (max {} Mbps)", max)),
        )
        .gauge_style(Style::default().fg(speed_color(speed)))
        .ratio(gauge_ratio(speed, max))
        .label(format_speed(speed));
    frame.render_widget(speed_gauge, chunks[1]);
}

/// Render the download, upload and ping metrics.
pub fn render_metrics(frame: &mut Frame, area: Rect, state: &TuiState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let download = state.download.current_speed_mbps.unwrap_or(0.0);
    let upload = state.upload.current_speed_mbps.unwrap_or(0.0);
    let ping = state.ping_ms.unwrap_or(0.0);

    let metrics = [
        ("↓ Download", format_speed(download), speed_color(download)),
        ("↑ Upload", format_speed(upload), speed_color(upload)),
        ("◷ Ping", format_latency(ping), Color::White),
    ];

    let cells = metrics.into_iter().zip(chunks.iter());
    for ((label, value, color), chunk) in cells {
        let paragraph = Paragraph::new(Line::from(vec![
            Span::styled(format!("{}: ", label), label_style()),
            Span::styled(value, Style::default().fg(color)),
        ]))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, *chunk);
    }
}

/// Render the live speed chart of the current run.
pub fn render_chart(frame: &mut Frame, area: Rect, state: &TuiState) {
    let download = state.samples.series(BandwidthDirection::Download);
    let upload = state.samples.series(BandwidthDirection::Upload);

    let max_x = download
        .iter()
        .chain(upload.iter())
        .map(|(x, _)| *x)
        .fold(1.0, f64::max);
    let max_y = state.speed_limit(BandwidthDirection::Download);

    let datasets = vec![
        Dataset::default()
            .name("download")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(DOWNLOAD_COLOR))
            .data(&download),
        Dataset::default()
            .name("upload")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(UPLOAD_COLOR))
            .data(&upload),
    ];

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title("Speed (Mbps)"))
        .x_axis(
            Axis::default()
                .title("Time (s)")
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, max_x])
                .labels(["0".to_string(), format!("{:.1}", max_x)]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, max_y])
                .labels(["0".to_string(), format!("{}", max_y)]),
        );
    frame.render_widget(chart, area);
}

/// Render the recent results.
pub fn render_history(frame: &mut Frame, area: Rect, state: &TuiState) {
    let block = Block::default().borders(Borders::ALL).title("Test History");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.history.is_empty() {
        let paragraph = Paragraph::new("No test history yet")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, inner);
        return;
    }

    let lines: Vec<Line> = state
        .history
        .iter()
        .take(inner.height as usize)
        .map(|result| {
            Line::from(vec![
                Span::styled(
                    format!("{:<24}", result.date),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(
                    format!("↓ {:<12}", format_speed(result.download)),
                    Style::default().fg(speed_color(result.download)),
                ),
                Span::styled(
                    format!("↑ {:<12}", format_speed(result.upload)),
                    Style::default().fg(speed_color(result.upload)),
                ),
                Span::raw(format!("◷ {}", format_latency(result.ping))),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render the status bar at the bottom.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &TuiState) {
    if let Some(ref error) = state.error {
        let mut text = format!("Error: {}", error.message);
        if let Some(ref suggestion) = error.suggestion {
            text.push_str(&format!(" ({})", suggestion));
        }
        let paragraph =
            Paragraph::new(text).style(Style::default().fg(Color::Red));
        frame.render_widget(paragraph, area);
        return;
    }

    let status_text = if state.is_running() {
        "Testing...  [r] restart  [q] quit"
    } else {
        "[s] Start Test  [q] quit"
    };

    let style = Style::default().fg(Color::DarkGray);
    let paragraph = Paragraph::new(status_text).style(style);
    frame.render_widget(paragraph, area);
}

// --- Minimal mode rendering functions ---

/// Render compact phase indicator for minimal mode.
fn render_minimal_phase(frame: &mut Frame, area: Rect, state: &TuiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    let (label, style) = phase_label(state);
    let phase_text = if state.phase.direction().is_some() {
        format!("{} {}%", label, state.progress_percent as u16)
    } else {
        label.to_string()
    };

    let paragraph = Paragraph::new(phase_text).style(style);
    frame.render_widget(paragraph, chunks[0]);

    let (speed_text, color) = match state.phase.direction() {
        Some(direction) => match state.bandwidth(direction).current_speed_mbps {
            Some(speed) => (format_speed(speed), speed_color(speed)),
            None => (String::new(), Color::White),
        },
        None => (String::new(), Color::White),
    };

    let paragraph =
        Paragraph::new(speed_text).style(Style::default().fg(color));
    frame.render_widget(paragraph, chunks[1]);
}

/// Render compact results for minimal mode.
fn render_minimal_results(frame: &mut Frame, area: Rect, state: &TuiState) {
    // Check for error state first
    if let Some(ref error) = state.error {
        let paragraph = Paragraph::new(format!("Error: {}", error.message))
            .style(Style::default().fg(Color::Red));
        frame.render_widget(paragraph, area);
        return;
    }

    let mut lines = Vec::new();
    if let Some(speed) = state.download.current_speed_mbps {
        lines.push(Line::from(format!("↓ {}", format_speed(speed))));
    }
    if let Some(speed) = state.upload.current_speed_mbps {
        lines.push(Line::from(format!("↑ {}", format_speed(speed))));
    }
    if let Some(ping) = state.ping_ms {
        lines.push(Line::from(format!("◷ {}", format_latency(ping))));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::SpeedTestResult;
    use crate::tui::progress::ProgressEvent;
    use crate::simulator::state::SpeedSample;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use proptest::test_runner::Config as ProptestConfig;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn render_to_string(state: &TuiState, width: u16, height: u16) -> String {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();

        terminal.draw(|frame| render_frame(frame, state)).unwrap();

        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                let cell = buffer.cell((x, y)).unwrap();
                text.push_str(cell.symbol());
            }
            text.push('\n');
        }
        text
    }

    fn result(download: f64, upload: f64, ping: f64) -> SpeedTestResult {
        let at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        SpeedTestResult::at(at, download, upload, ping)
    }

    #[test]
    fn test_format_speed() {
        assert_eq!(format_speed(95.5), "95.5 Mbps");
        assert_eq!(format_speed(100.0), "100 Mbps");
        assert_eq!(format_speed(1.0), "1 Mbps");
        assert_eq!(format_speed(0.5), "500 Kbps");
        assert_eq!(format_speed(0.0), "0 Kbps");
    }

    #[test]
    fn test_format_latency() {
        assert_eq!(format_latency(25.0), "25 ms");
    }

    #[test]
    fn test_gauge_ratio_clamped() {
        assert_eq!(gauge_ratio(100.0, 200.0), 0.5);
        assert_eq!(gauge_ratio(300.0, 200.0), 1.0);
        assert_eq!(gauge_ratio(-1.0, 200.0), 0.0);
        assert_eq!(gauge_ratio(10.0, 0.0), 0.0);
    }

    // Speed color coding
    proptest! {
        #[test]
        fn prop_speed_color_coding_fast(speed in 100.0f64..=f64::MAX) {
            if speed.is_finite() {
                prop_assert_eq!(speed_color(speed), Color::Green);
            }
        }

        #[test]
        fn prop_speed_color_coding_moderate(speed in 25.0f64..100.0f64) {
            prop_assert_eq!(speed_color(speed), Color::Yellow);
        }

        #[test]
        fn prop_speed_color_coding_slow(speed in f64::MIN..25.0f64) {
            if speed.is_finite() {
                prop_assert_eq!(speed_color(speed), Color::Red);
            }
        }

        /// Property: speeds of at least 1 Mbps are shown in Mbps, slower
        /// ones in Kbps.
        #[test]
        fn prop_speed_unit_switch(speed in 0.0f64..200.0) {
            let formatted = format_speed(speed);
            if speed < 1.0 {
                prop_assert!(formatted.ends_with(" Kbps"));
            } else {
                prop_assert!(formatted.ends_with(" Mbps"));
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: For any terminal_width < 60, the layout mode SHALL be
        /// Minimal.
        #[test]
        fn prop_minimal_mode_below_threshold(width in 0u16..60) {
            prop_assert!(is_minimal_mode(width));
        }

        #[test]
        fn prop_normal_mode_at_or_above_threshold(width in 60u16..=u16::MAX) {
            prop_assert!(!is_minimal_mode(width));
        }
    }

    #[test]
    fn test_minimal_mode_boundary() {
        assert!(!is_minimal_mode(60));
        assert!(is_minimal_mode(59));
    }

    #[test]
    fn test_idle_dashboard_shows_empty_history() {
        let rendered = render_to_string(&TuiState::new(), 100, 30);

        assert!(rendered.contains("Ready"));
        assert!(rendered.contains("No test history yet"));
        assert!(rendered.contains("Start Test"));
    }

    #[test]
    fn test_running_dashboard_shows_live_values() {
        let mut state = TuiState::new();
        state.update_from_event(&ProgressEvent::RunStarted);
        state.update_from_event(
            &ProgressEvent::PingMeasurement { value_ms: 23.0 },
        );
        state.update_from_event(
            &ProgressEvent::PhaseChange(TestPhase::Download),
        );
        state.update_from_event(&ProgressEvent::SpeedSample {
            direction: BandwidthDirection::Download,
            speed_mbps: 87.5,
            progress_percent: 50.0,
            sample: SpeedSample::new(BandwidthDirection::Download, 4000, 87.5),
        });

        let rendered = render_to_string(&state, 100, 30);

        assert!(rendered.contains("Download Test"));
        assert!(rendered.contains("87.5 Mbps"));
        assert!(rendered.contains("23 ms"));
        assert!(rendered.contains("50%"));
        assert!(rendered.contains("restart"));
    }

    #[test]
    fn test_history_rows_are_rendered() {
        let mut state = TuiState::new();
        state.set_history(&[result(120.5, 48.2, 18.0), result(0.5, 0.2, 35.0)]);

        let rendered = render_to_string(&state, 100, 30);

        assert!(rendered.contains("3/14/2025, 9:26:53 AM"));
        assert!(rendered.contains("120.5 Mbps"));
        assert!(rendered.contains("500 Kbps"));
        assert!(rendered.contains("35 ms"));
    }

    #[test]
    fn test_minimal_layout_on_narrow_terminal() {
        let mut state = TuiState::new();
        state.update_from_event(&ProgressEvent::PhaseChange(TestPhase::Upload));
        state.update_from_event(&ProgressEvent::SpeedSample {
            direction: BandwidthDirection::Upload,
            speed_mbps: 42.1,
            progress_percent: 40.0,
            sample: SpeedSample::new(BandwidthDirection::Upload, 2000, 42.1),
        });

        let rendered = render_to_string(&state, 40, 10);

        assert!(rendered.contains("Upload Test 40%"));
        assert!(rendered.contains("42.1 Mbps"));
        assert!(!rendered.contains("Test History"));
    }

    #[test]
    fn test_error_is_shown_in_status_bar() {
        let mut state = TuiState::new();
        state.set_error("Could not save".to_string(), None);

        let rendered = render_to_string(&state, 100, 30);
        assert!(rendered.contains("Error: Could not save"));
    }
}
