use std::path::PathBuf;

use clap::Parser;

use super::constants::{
    DEFAULT_LOOKBACK_HOURS, ENV_DEBUG, ENV_TOOL_TRUNCATE_LEN, ENV_TRUNCATE_LEN, ENV_VERBOSE,
};

#[derive(Parser, Debug)]
#[command(name = "tracescope")]
#[command(version, about = "Agent telemetry trace viewer", long_about = None)]
pub struct CliConfig {
    /// Input file with raw records (JSON array or JSON lines). Reads stdin if omitted.
    pub input: Option<PathBuf>,

    /// Render only this trace
    #[arg(long, short = 't')]
    pub trace_id: Option<String>,

    /// Scope the log-store query to one session (used with --show-query)
    #[arg(long, short = 's')]
    pub session_id: Option<String>,

    /// Emit the structured trace export as JSON instead of the tree view
    #[arg(long)]
    pub export_json: bool,

    /// Verbose mode: full tool content, span ids, service names
    #[arg(long, short = 'v', env = ENV_VERBOSE)]
    pub verbose: bool,

    /// Debug mode: per-record extraction diagnostics
    #[arg(long, env = ENV_DEBUG)]
    pub debug: bool,

    /// Truncation limit for ordinary content (characters)
    #[arg(long, env = ENV_TRUNCATE_LEN)]
    pub truncate_len: Option<usize>,

    /// Truncation limit for tool content (characters)
    #[arg(long, env = ENV_TOOL_TRUNCATE_LEN)]
    pub tool_truncate_len: Option<usize>,

    /// Print the log-store query for the current filters and exit
    #[arg(long)]
    pub show_query: bool,

    /// Lookback window for the log-store query, in hours
    #[arg(long, default_value_t = DEFAULT_LOOKBACK_HOURS)]
    pub lookback_hours: i64,
}

/// Parse CLI arguments.
pub fn parse() -> CliConfig {
    CliConfig::parse()
}
