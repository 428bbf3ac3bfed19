//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "checkpoint", version, about = "Weigh-and-speed checkpoint monitor")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/checkpoint.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Log level (error|warn|info|debug|trace); RUST_LOG overrides, falls back to [logging].level, then info
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the monitor: telemetry on stdout, barrier commands ('o'/'c') on stdin
    Run {
        /// Stop after this many milliseconds (default: run until Ctrl-C)
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,
        /// Enable real-time scheduling (SCHED_FIFO)
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Enable real-time mode on Linux.\n\nRequests SCHED_FIFO for the process so the sampling tasks are not preempted by ordinary workloads. Needs CAP_SYS_NICE or root; on failure a warning is logged and the monitor runs with normal scheduling. Ignored on other OSes."
        )]
        rt: bool,
        /// Real-time priority for SCHED_FIFO on Linux (1..=max)
        #[arg(
            long,
            value_name = "PRIO",
            long_help = "SCHED_FIFO priority when --rt is enabled (Linux only). Range is platform-defined (usually 1..=99) and out-of-range values are clamped. Default: the maximum."
        )]
        rt_prio: Option<i32>,
    },
    /// Validate config, initialize drivers and take one reading from each sensor
    SelfCheck,
}
