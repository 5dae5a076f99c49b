//! Custom error types for speedlab.
//!
//! This module provides user-friendly error types that wrap underlying
//! errors with clear, actionable messages.

use std::error::Error;
use std::fmt;

/// Exit codes for the application.
pub mod exit_codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// History storage could not be read or written.
    pub const STORAGE_ERROR: i32 = 1;
    /// Configuration error (invalid arguments, unusable data directory).
    pub const CONFIG_ERROR: i32 = 3;
    /// The run was cancelled or rejected before producing a result.
    pub const RUN_ABORTED: i32 = 4;
    /// Terminal could not be set up or restored.
    pub const TERMINAL_ERROR: i32 = 5;
    /// Unknown/unexpected error.
    pub const UNKNOWN_ERROR: i32 = 99;
}

/// Categories of errors that can occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Reading or writing the backing store failed.
    Storage,
    /// A value could not be encoded or decoded as JSON.
    Serialization,
    /// Invalid configuration or arguments.
    Config,
    /// A run was requested while another one is still active.
    RunInProgress,
    /// The active run was cancelled before it completed.
    Cancelled,
    /// Terminal setup, drawing or restore failures.
    Terminal,
    /// Unknown or unexpected errors.
    Unknown,
}

impl ErrorKind {
    /// Get the exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::Storage => exit_codes::STORAGE_ERROR,
            ErrorKind::Serialization => exit_codes::STORAGE_ERROR,
            ErrorKind::Config => exit_codes::CONFIG_ERROR,
            ErrorKind::RunInProgress => exit_codes::RUN_ABORTED,
            ErrorKind::Cancelled => exit_codes::RUN_ABORTED,
            ErrorKind::Terminal => exit_codes::TERMINAL_ERROR,
            ErrorKind::Unknown => exit_codes::UNKNOWN_ERROR,
        }
    }

    /// Get a user-friendly description of this error kind.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorKind::Storage => "Storage error",
            ErrorKind::Serialization => "Serialization error",
            ErrorKind::Config => "Configuration error",
            ErrorKind::RunInProgress => "Run in progress",
            ErrorKind::Cancelled => "Run cancelled",
            ErrorKind::Terminal => "Terminal error",
            ErrorKind::Unknown => "Unknown error",
        }
    }
}

/// A user-friendly error type for speedlab operations.
#[derive(Debug)]
pub struct AppError {
    /// The kind of error.
    pub kind: ErrorKind,
    /// User-friendly error message.
    pub message: String,
    /// Optional suggestion for how to resolve the error.
    pub suggestion: Option<String>,
    /// The underlying error, if any.
    pub source: Option<Box<dyn Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), suggestion: None, source: None }
    }

    /// Add a suggestion for how to resolve the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add the underlying error source.
    pub fn with_source(
        mut self,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message).with_suggestion(
            "Check that the data directory exists and is writable, \
             or pass --data-dir.",
        )
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Create the error returned when a run is already active.
    pub fn run_in_progress() -> Self {
        Self::new(ErrorKind::RunInProgress, "a speed test is already running")
            .with_suggestion("Wait for it to finish or restart it.")
    }

    /// Create the error returned when a run was cancelled.
    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "the speed test was cancelled")
    }

    /// Create a terminal error.
    pub fn terminal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Terminal, message)
    }

    /// Returns true if this error is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.kind == ErrorKind::Cancelled
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.description(), self.message)?;

        if let Some(ref suggestion) = self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }

        Ok(())
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        AppError::storage(error.to_string()).with_source(error)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::serialization(error.to_string()).with_source(error)
    }
}

/// Format an error for user display.
///
/// This function creates a user-friendly error message that includes
/// the error description and any available suggestions.
pub fn format_error_for_display(error: &AppError) -> String {
    let mut output = format!("Error: {}", error.message);

    if let Some(ref suggestion) = error.suggestion {
        output.push_str(&format!("\n\nSuggestion: {}", suggestion));
    }

    output
}
