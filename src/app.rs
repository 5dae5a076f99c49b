//! Command implementations.
//!
//! Each command opens the histories it needs from the [`AppConfig`],
//! does its work and prints in the selected [`DisplayMode`].

use colored::{ColoredString, Colorize};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{debug, info, warn};
use std::time::Duration;

use crate::calculator::{Calculator, CalculatorInput};
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::history::{
    HistoryStore, CALCULATOR_HISTORY_KEY, SPEED_TEST_HISTORY_KEY,
};
use crate::results::{CalculationResult, SpeedTestResult};
use crate::simulator::{
    RandomSignal, RunHandle, SignalSource, Simulator, SpeedTestSession,
};
use crate::stats::HistorySummary;
use crate::tui::{DisplayMode, Event, EventReader, TuiController};

/// Redraw interval of the dashboard (~30 FPS).
const RENDER_RATE: Duration = Duration::from_millis(33);

/// Which history to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum HistoryKind {
    /// Speed test results
    #[default]
    Speed,
    /// Transfer time calculations
    Calc,
}

fn signal_for(config: &AppConfig) -> RandomSignal {
    match config.seed {
        Some(seed) => {
            debug!("Using signal seed {}", seed);
            RandomSignal::seeded(seed)
        }
        None => RandomSignal::from_entropy(),
    }
}

/// Run the simulated speed test.
pub async fn run_speed_test(
    config: &AppConfig,
    mode: DisplayMode,
) -> Result<(), AppError> {
    let simulator =
        Simulator::new(config.simulator.clone(), signal_for(config));
    let history = config.open_history(SPEED_TEST_HISTORY_KEY);
    let session = SpeedTestSession::new(simulator, history);

    match mode {
        DisplayMode::Tui => run_dashboard(config, session).await,
        DisplayMode::Silent | DisplayMode::Json => {
            let result = run_headless(session).await?;
            print_speed_result(&result, mode)
        }
    }
}

/// Run once without a dashboard, stopping on Ctrl-C.
async fn run_headless<S: SignalSource>(
    mut session: SpeedTestSession<S>,
) -> Result<SpeedTestResult, AppError> {
    info!(
        "Running simulated speed test ({:?})",
        session_run_time(&session)
    );
    tokio::select! {
        result = session.run() => result,
        _ = tokio::signal::ctrl_c() => Err(AppError::cancelled()),
    }
}

fn session_run_time<S: SignalSource>(
    session: &SpeedTestSession<S>,
) -> Duration {
    session.simulator().config().nominal_run_time()
}

fn print_speed_result(
    result: &SpeedTestResult,
    mode: DisplayMode,
) -> Result<(), AppError> {
    if mode == DisplayMode::Json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!("{} {}", "Date:".bold().white(), result.date.bright_blue());
    let ping = format!("{} ms", result.ping);
    println!("{} {}", "Ping:".bold().white(), ping.bright_blue());
    println!(
        "{} {}",
        "Download:".bold().white(),
        colored_speed(result.download)
    );
    println!("{} {}", "Upload:".bold().white(), colored_speed(result.upload));
    Ok(())
}

fn colored_speed(speed_mbps: f64) -> ColoredString {
    let text = crate::tui::renderer::format_speed(speed_mbps);
    if speed_mbps >= 100.0 {
        text.green()
    } else if speed_mbps >= 25.0 {
        text.yellow()
    } else {
        text.red()
    }
}

/// What the dashboard does after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Continue,
    Start,
    Restart,
    Quit,
}

fn key_action(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        // Raw mode swallows SIGINT.
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Action::Quit
        }
        KeyCode::Char('r') => Action::Restart,
        KeyCode::Char('s') => Action::Start,
        _ => Action::Continue,
    }
}

fn handle_event(
    event: Option<Event>,
    controller: &mut TuiController,
) -> Result<Action, AppError> {
    match event {
        None => Ok(Action::Quit),
        Some(Event::Key(key)) => Ok(key_action(key)),
        Some(Event::Resize(width, _)) => {
            controller.resize(width);
            controller.render()?;
            Ok(Action::Continue)
        }
        Some(Event::Render) => {
            controller.render()?;
            Ok(Action::Continue)
        }
    }
}

/// Interactive dashboard: starts a run immediately, then follows keys.
async fn run_dashboard<S: SignalSource>(
    config: &AppConfig,
    session: SpeedTestSession<S>,
) -> Result<(), AppError> {
    let mut controller =
        TuiController::new(DisplayMode::Tui, &config.simulator);
    controller.set_history(session.history().items());
    let mut session = session.with_progress(controller.progress_callback());

    controller.init()?;
    let mut events = EventReader::new(RENDER_RATE);

    let outcome =
        dashboard_loop(&mut session, &mut controller, &mut events).await;

    events.stop();
    controller.cleanup()?;
    outcome
}

async fn dashboard_loop<S: SignalSource>(
    session: &mut SpeedTestSession<S>,
    controller: &mut TuiController,
    events: &mut EventReader,
) -> Result<(), AppError> {
    let mut pending: Option<RunHandle> = Some(session.start()?);

    loop {
        let action = match pending.take() {
            Some(handle) => {
                drive_with_events(session, handle, controller, events).await?
            }
            None => handle_event(events.next().await, controller)?,
        };

        match action {
            Action::Quit => {
                session.cancel();
                return Ok(());
            }
            Action::Restart => pending = Some(session.restart()),
            Action::Start if !session.is_running() => {
                pending = Some(session.start()?)
            }
            Action::Start | Action::Continue => {}
        }
        controller.render()?;
    }
}

/// Drive one run while serving terminal events.
///
/// Returns when the run ends or an event asks to leave it; the run is
/// cancelled in the latter case.
async fn drive_with_events<S: SignalSource>(
    session: &mut SpeedTestSession<S>,
    handle: RunHandle,
    controller: &mut TuiController,
    events: &mut EventReader,
) -> Result<Action, AppError> {
    let run_id = handle.id();
    let run = session.drive(handle);
    tokio::pin!(run);

    loop {
        tokio::select! {
            outcome = &mut run => {
                match outcome {
                    Ok(result) => {
                        debug!("Run #{} finished: {:?}", run_id, result)
                    }
                    Err(e) if e.is_cancelled() => {
                        debug!("Run #{} cancelled", run_id)
                    }
                    Err(e) => return Err(e),
                }
                return Ok(Action::Continue);
            }
            event = events.next() => {
                match handle_event(event, controller)? {
                    // A run is already in progress.
                    Action::Start | Action::Continue => {}
                    action => return Ok(action),
                }
            }
        }
    }
}

/// Calculate a transfer time and record it.
pub fn run_calculation(
    config: &AppConfig,
    input: CalculatorInput,
    json: bool,
) -> Result<(), AppError> {
    let mut calculator =
        Calculator::new(config.open_history(CALCULATOR_HISTORY_KEY));
    let result = calculator.calculate(input);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", describe_calculation(&result));
    }
    Ok(())
}

fn describe_calculation(calc: &CalculationResult) -> String {
    format!(
        "{} {} {} at {} {}: {}",
        calc.transfer_type.to_string().bold().white(),
        calc.file_size,
        calc.size_unit,
        calc.internet_speed,
        calc.speed_unit,
        calc.result.bright_blue()
    )
}

/// Print or clear a history.
pub fn run_history(
    config: &AppConfig,
    kind: HistoryKind,
    json: bool,
    clear: bool,
) -> Result<(), AppError> {
    match kind {
        HistoryKind::Speed => {
            let mut history: HistoryStore<SpeedTestResult> =
                config.open_history(SPEED_TEST_HISTORY_KEY);
            if clear {
                return clear_history(&mut history);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(history.items())?);
                return Ok(());
            }
            print_speed_history(history.items());
        }
        HistoryKind::Calc => {
            let mut history: HistoryStore<CalculationResult> =
                config.open_history(CALCULATOR_HISTORY_KEY);
            if clear {
                return clear_history(&mut history);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(history.items())?);
                return Ok(());
            }
            if history.is_empty() {
                println!("{}", "No calculation history yet".dimmed());
            }
            for calc in history.items() {
                println!(
                    "{}  {}",
                    calc.timestamp.dimmed(),
                    describe_calculation(calc)
                );
            }
        }
    }
    Ok(())
}

fn clear_history<T>(history: &mut HistoryStore<T>) -> Result<(), AppError>
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    let removed = history.len();
    history.clear()?;
    info!("Cleared {} entries from '{}'", removed, history.key());
    println!("Cleared {} entries", removed);
    Ok(())
}

fn print_speed_history(results: &[SpeedTestResult]) {
    if results.is_empty() {
        println!("{}", "No test history yet".dimmed());
        return;
    }

    for result in results {
        println!(
            "{}  {} {}  {} {}  {} {}",
            result.date.dimmed(),
            "↓".bold(),
            colored_speed(result.download),
            "↑".bold(),
            colored_speed(result.upload),
            "◷".bold(),
            format!("{} ms", result.ping)
        );
    }

    match HistorySummary::from_results(results) {
        Some(summary) => println!(
            "{} {} runs, ↓ {} ↑ {} ◷ {:.0} ms",
            "Median of".bold().white(),
            summary.runs,
            colored_speed(summary.download),
            colored_speed(summary.upload),
            summary.ping
        ),
        None => warn!("Could not summarize speed history"),
    }
}
