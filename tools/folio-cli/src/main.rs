//! Folio CLI: drive the portfolio motion engine from the terminal.
//!
//! Usage:
//!   folio replay <EVENTS>      Replay a scripted session against the page
//!   folio preview [OPTIONS]    Type a line out live in the terminal
//!   folio config show|init     Inspect or write the configuration file

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use folio_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "folio",
    about = "Portfolio motion engine: replay, preview and configure",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSONL event script against the portfolio page
    Replay {
        /// Path to the events file
        events: PathBuf,

        /// Write sampled scene frames to this JSONL trace
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Keep running until this time (ms), even after the last event
        #[arg(long)]
        until_ms: Option<f64>,

        /// Interval between sampled frames (ms)
        #[arg(long, default_value = "100")]
        sample_ms: f64,
    },

    /// Type a line of text out in real time
    Preview {
        /// Text to reveal
        #[arg(short, long, default_value = "React Developer")]
        text: String,

        /// Per-character delay (ms); defaults to the configured speed
        #[arg(long)]
        speed_ms: Option<f64>,

        /// Delay before the first character (ms); defaults to the configured delay
        #[arg(long)]
        delay_ms: Option<f64>,

        /// How long to keep the cursor blinking (seconds)
        #[arg(long, default_value = "4.0")]
        duration_secs: f64,
    },

    /// Inspect or write the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default configuration to the standard location
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load();
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    folio_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Replay {
            events,
            out,
            until_ms,
            sample_ms,
        } => commands::replay::run(&config, events, out, until_ms, sample_ms),
        Commands::Preview {
            text,
            speed_ms,
            delay_ms,
            duration_secs,
        } => commands::preview::run(&config, text, speed_ms, delay_ms, duration_secs).await,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&config),
            ConfigAction::Init { force } => commands::config::init(force),
        },
    }
}
