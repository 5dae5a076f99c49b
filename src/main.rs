extern crate clap;

use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use log::{debug, LevelFilter};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use speedlab::app::{self, HistoryKind};
use speedlab::calculator::CalculatorInput;
use speedlab::config::{AppConfig, StorageConfig, DATA_DIR_ENV};
use speedlab::errors::{format_error_for_display, AppError};
use speedlab::results::TransferType;
use speedlab::tui::DisplayMode;
use speedlab::units::{SizeUnit, SpeedUnit};

#[derive(Parser)]
#[command(
    author,
    version,
    long_version = long_version(),
    about,
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,

    /// Directory holding the history files
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    /// Keep history in memory only, ignoring --data-dir
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the simulated speed test
    Test {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Calculate how long a transfer takes
    Calc {
        /// File size
        #[arg(long, default_value = "1")]
        size: String,

        /// Unit of the file size (KB, MB, GB, TB)
        #[arg(long, default_value = "MB")]
        size_unit: SizeUnit,

        /// Internet speed
        #[arg(long, default_value = "100")]
        speed: String,

        /// Unit of the internet speed (Kbps, Mbps, Gbps)
        #[arg(long, default_value = "Mbps")]
        speed_unit: SpeedUnit,

        /// Transfer direction (download, upload)
        #[arg(long = "type", default_value = "download")]
        transfer_type: TransferType,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show recent results
    History {
        /// Which history to show
        #[arg(value_enum, default_value_t = HistoryKind::Speed)]
        kind: HistoryKind,

        /// Print the history as JSON
        #[arg(long)]
        json: bool,

        /// Remove every entry
        #[arg(long)]
        clear: bool,
    },
}

fn long_version() -> String {
    match option_env!("SPEEDLAB_BUILD_GIT_HASH") {
        Some(hash) => format!("{} (rev {})", env!("CARGO_PKG_VERSION"), hash),
        None => env!("CARGO_PKG_VERSION").to_string(),
    }
}

fn init_logging(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

async fn dispatch(
    config: &mut AppConfig,
    command: Command,
    mode: DisplayMode,
) -> Result<(), AppError> {
    match command {
        Command::Test { seed, .. } => {
            config.seed = seed;
            app::run_speed_test(config, mode).await
        }
        Command::Calc {
            size,
            size_unit,
            speed,
            speed_unit,
            transfer_type,
            json,
        } => {
            let input = CalculatorInput::from_fields(
                &size,
                size_unit,
                transfer_type,
                &speed,
                speed_unit,
            );
            app::run_calculation(config, input, json)
        }
        Command::History { kind, json, clear } => {
            app::run_history(config, kind, json, clear)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli: Cli = Cli::parse();
    let command =
        cli.command.unwrap_or(Command::Test { json: false, seed: None });

    let mode = match command {
        Command::Test { json, .. } => {
            DisplayMode::detect(json, std::io::stdout().is_terminal())
        }
        _ => DisplayMode::Silent,
    };

    // Log lines would tear the alternate screen.
    let level = if mode.is_interactive() {
        LevelFilter::Error
    } else {
        cli.verbose.log_level_filter()
    };
    init_logging(level);

    let storage = if cli.ephemeral {
        StorageConfig::ephemeral()
    } else {
        StorageConfig::files(cli.data_dir)
    };
    let mut config = AppConfig { storage, ..Default::default() };
    debug!("Storage: {:?}", config.storage);

    let outcome = match config.validate() {
        Ok(()) => dispatch(&mut config, command, mode).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", format_error_for_display(&e));
            ExitCode::from(e.exit_code().clamp(1, 255) as u8)
        }
    }
}
