//! TUI controller for managing the display lifecycle.
//!
//! The TuiController manages the TUI lifecycle, including initialization,
//! rendering, and cleanup. It also provides a progress callback for
//! the speed test session to emit events.

use std::io::{self, Stdout};
use std::sync::{Arc, Mutex};

use crossterm::{
    cursor, execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::{backend::CrosstermBackend, Terminal};

use super::display_mode::DisplayMode;
use super::progress::{ProgressCallback, ProgressEvent};
use super::renderer::render_frame;
use super::state::TuiState;
use crate::errors::AppError;
use crate::results::SpeedTestResult;
use crate::simulator::config::SimulatorConfig;

fn terminal_error(e: io::Error) -> AppError {
    AppError::terminal(format!("terminal I/O failed: {}", e)).with_source(e)
}

/// Controller for the TUI display.
///
/// Manages the TUI lifecycle including initialization, rendering,
/// and cleanup. Provides a progress callback for the session.
pub struct TuiController {
    /// Current display mode
    mode: DisplayMode,
    /// Shared state for the TUI
    state: Arc<Mutex<TuiState>>,
    /// Terminal instance (only present in TUI mode)
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
    /// Whether the terminal has been initialized
    initialized: bool,
}

impl TuiController {
    /// Create a controller whose gauges follow `config`.
    pub fn new(mode: DisplayMode, config: &SimulatorConfig) -> Self {
        Self {
            mode,
            state: Arc::new(Mutex::new(TuiState::new().with_limits(config))),
            terminal: None,
            initialized: false,
        }
    }

    /// Initialize the TUI.
    ///
    /// In TUI mode, this enters the alternate screen and hides the cursor.
    /// In other modes, this is a no-op.
    pub fn init(&mut self) -> Result<(), AppError> {
        if self.mode != DisplayMode::Tui {
            return Ok(());
        }

        // Enable raw mode for terminal control
        enable_raw_mode().map_err(terminal_error)?;
        self.initialized = true;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)
            .map_err(terminal_error)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend).map_err(terminal_error)?;
        let size = terminal.size().map_err(terminal_error)?;
        self.terminal = Some(terminal);

        if let Ok(mut state) = self.state.lock() {
            state.terminal_width = size.width;
        }

        Ok(())
    }

    /// Clean up and restore terminal state.
    ///
    /// Leaves the alternate screen, shows the cursor and disables raw
    /// mode.
    pub fn cleanup(&mut self) -> Result<(), AppError> {
        if !self.initialized {
            return Ok(());
        }

        if let Some(ref mut terminal) = self.terminal {
            execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)
                .map_err(terminal_error)?;
        }

        disable_raw_mode().map_err(terminal_error)?;

        self.initialized = false;
        self.terminal = None;

        Ok(())
    }

    /// Replace the history shown below the chart.
    pub fn set_history(&mut self, history: &[SpeedTestResult]) {
        if let Ok(mut state) = self.state.lock() {
            state.set_history(history);
        }
    }

    /// Record a new terminal width.
    pub fn resize(&mut self, width: u16) {
        if let Ok(mut state) = self.state.lock() {
            state.terminal_width = width;
        }
    }

    /// Render the current state to the terminal.
    ///
    /// In TUI mode, this renders the dashboard. In other modes, this is
    /// a no-op.
    pub fn render(&mut self) -> Result<(), AppError> {
        if self.mode != DisplayMode::Tui {
            return Ok(());
        }

        if let Some(ref mut terminal) = self.terminal {
            // Clone state for rendering to avoid holding lock during draw
            let state = {
                let state_guard = self.state.lock().map_err(|e| {
                    AppError::terminal(format!("Failed to lock state: {}", e))
                })?;
                state_guard.clone()
            };

            terminal
                .draw(|frame| {
                    render_frame(frame, &state);
                })
                .map_err(terminal_error)?;
        }

        Ok(())
    }

    /// Get a progress callback for the session.
    ///
    /// The callback updates the shared TUI state in a non-blocking manner.
    pub fn progress_callback(&self) -> Arc<dyn ProgressCallback> {
        Arc::new(TuiProgressCallback {
            state: Arc::clone(&self.state),
        })
    }

    /// Get a reference to the shared state.
    #[cfg(test)]
    pub fn state(&self) -> Arc<Mutex<TuiState>> {
        Arc::clone(&self.state)
    }
}

impl Drop for TuiController {
    /// Restore the terminal even if cleanup() was not called.
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Updates the shared TUI state when progress events are received.
struct TuiProgressCallback {
    /// Shared state with the TuiController
    state: Arc<Mutex<TuiState>>,
}

impl ProgressCallback for TuiProgressCallback {
    fn on_progress(&self, event: ProgressEvent) {
        // Non-blocking: try to acquire lock, skip if unavailable
        if let Ok(mut state) = self.state.try_lock() {
            state.update_from_event(&event);
        }
    }
}
