//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Gaze Recorder - eye-tracking recording pipeline with a simulated tracker
#[derive(Parser, Debug)]
#[command(
    name = "gaze-recorder",
    author,
    version,
    about = "Eye-tracking gaze recording pipeline",
    long_about = "Records gaze samples and experiment events to CSV or SQLite files.\n\n\
                  Runs without hardware: a scripted pointer (or a JSONL replay) stands in \n\
                  for the eye tracker, and recorded files can be checked for dropped samples."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "GAZE_RECORDER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "GAZE_RECORDER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a simulated session
    Simulate(SimulateArgs),

    /// Estimate dropped samples in a recorded file
    Check(CheckArgs),

    /// Validate configuration file without recording
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `simulate` command
#[derive(Parser, Debug, Clone)]
pub struct SimulateArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "recorder.toml",
        env = "GAZE_RECORDER_CONFIG"
    )]
    pub config: PathBuf,

    /// Recording length in seconds
    #[arg(short, long, default_value = "5", env = "GAZE_RECORDER_DURATION")]
    pub duration: f64,

    /// Override the output file from configuration (.csv, .db, .sqlite)
    #[arg(short, long, env = "GAZE_RECORDER_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Seconds between recorded events (0 = no events)
    #[arg(long, default_value = "1")]
    pub event_interval: f64,

    /// Seconds between intermediate saves (0 = save only at stop)
    #[arg(long, default_value = "0")]
    pub save_interval: f64,

    /// Run the calibration procedure before recording
    #[arg(long)]
    pub calibrate: bool,

    /// Replay recorded samples (JSONL) instead of the scripted pointer
    #[arg(long, env = "GAZE_RECORDER_REPLAY")]
    pub replay: Option<PathBuf>,

    /// Replay speed multiplier (1.0 = original speed)
    #[arg(long, default_value = "1.0")]
    pub replay_speed: f64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "GAZE_RECORDER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `check` command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Recorded file (.csv, .db, .sqlite)
    #[arg(short, long)]
    pub file: PathBuf,

    /// Sampling frequency the file was recorded at (Hz)
    #[arg(long, default_value = "120")]
    pub frequency: f64,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "recorder.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "recorder.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show calibration points and timing
    #[arg(long)]
    pub calibration: bool,

    /// Show UI animation and size settings
    #[arg(long)]
    pub ui: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_simulate() {
        let cli = Cli::parse_from([
            "gaze-recorder",
            "simulate",
            "--config",
            "lab.toml",
            "--duration",
            "2.5",
            "--calibrate",
        ]);
        match cli.command {
            Commands::Simulate(args) => {
                assert_eq!(args.config, PathBuf::from("lab.toml"));
                assert_eq!(args.duration, 2.5);
                assert!(args.calibrate);
                assert_eq!(args.event_interval, 1.0);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::parse_from(["gaze-recorder", "check", "--file", "a.csv", "--frequency", "60"]);
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.file, PathBuf::from("a.csv"));
                assert_eq!(args.frequency, 60.0);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
