//! speedlab: a simulated internet speed test and file transfer time
//! calculator for the terminal.

pub mod app;
pub mod calculator;
pub mod config;
pub mod duration;
pub mod errors;
pub mod history;
pub mod results;
pub mod simulator;
pub mod stats;
pub mod tui;
pub mod units;
