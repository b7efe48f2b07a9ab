//! View configuration
//!
//! Explicit configuration values threaded into the normalizer and renderer
//! constructors. There is no process-wide toggle: test runs construct their
//! own `ViewConfig` per case.

use serde::{Deserialize, Serialize};

use super::cli::CliConfig;
use super::constants::{DEFAULT_TOOL_TRUNCATE_LEN, DEFAULT_TRUNCATE_LEN};

/// Rendering and diagnostics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Truncation limit (characters) for ordinary message content.
    pub truncate_len: usize,
    /// Truncation limit (characters) for tool inputs and results.
    pub tool_truncate_len: usize,
    /// Verbose mode: disables truncation for tool-tagged content and
    /// reveals span ids and service names.
    pub verbose: bool,
    /// Debug mode: emits per-record extraction diagnostics.
    pub debug: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            truncate_len: DEFAULT_TRUNCATE_LEN,
            tool_truncate_len: DEFAULT_TOOL_TRUNCATE_LEN,
            verbose: false,
            debug: false,
        }
    }
}

impl ViewConfig {
    /// Build the effective configuration from parsed CLI arguments.
    /// CLI values (which already carry env fallbacks) override defaults.
    pub fn from_cli(cli: &CliConfig) -> Self {
        let defaults = Self::default();
        Self {
            truncate_len: cli.truncate_len.unwrap_or(defaults.truncate_len),
            tool_truncate_len: cli.tool_truncate_len.unwrap_or(defaults.tool_truncate_len),
            verbose: cli.verbose,
            debug: cli.debug,
        }
    }

    /// Effective truncation limit for an item, `None` meaning unlimited.
    ///
    /// Keyed off the item's semantic tag: in verbose mode tool-tagged
    /// content is never truncated.
    pub fn limit_for(&self, tool_tagged: bool) -> Option<usize> {
        match (tool_tagged, self.verbose) {
            (true, true) => None,
            (true, false) => Some(self.tool_truncate_len),
            (false, _) => Some(self.truncate_len),
        }
    }
}
