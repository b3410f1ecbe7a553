//! Command line definition

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "arlearn", version, about = "Headless driver for the arlearn learning app")]
pub struct Cli {
    /// Log level, overridden by RUST_LOG
    #[arg(long, value_enum, default_value_t = LogLevelArg::Info, global = true)]
    pub log_level: LogLevelArg,

    #[arg(long, value_enum, default_value_t = LogFormatArg::Compact, global = true)]
    pub log_format: LogFormatArg,

    /// JSON config file; missing fields take their defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one topic from detection to the menu and print the final status
    Simulate(SimulateArgs),
    /// Inspect or edit stored progress
    Progress(ProgressArgs),
    /// List the embedded topics
    Topics,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Image target index to detect
    #[arg(long, default_value_t = 0)]
    pub target: u32,

    /// Press the advance control whenever the timeline is paused
    #[arg(long)]
    pub auto_advance: bool,

    /// Playback speed multiplier
    #[arg(long, default_value_t = 1.0)]
    pub rate: f64,

    /// Give up after this much simulated time
    #[arg(long, default_value_t = 300)]
    pub max_seconds: u64,

    /// Tick length in milliseconds
    #[arg(long, default_value_t = 100)]
    pub tick_ms: u64,

    /// Directory for file-backed progress
    #[arg(long)]
    pub store: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ProgressArgs {
    #[arg(long)]
    pub store: PathBuf,

    #[command(subcommand)]
    pub action: ProgressAction,
}

#[derive(Subcommand, Debug)]
pub enum ProgressAction {
    Show,
    Clear,
    /// Mark one topic completed
    Complete { topic: u8 },
    /// Replace the completed set
    Set { topics: Vec<u8> },
    CompleteAll,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
