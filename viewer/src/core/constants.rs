//! Application-wide constants

// Environment variables
pub const ENV_LOG: &str = "TRACESCOPE_LOG";
pub const ENV_TRUNCATE_LEN: &str = "TRACESCOPE_TRUNCATE_LEN";
pub const ENV_TOOL_TRUNCATE_LEN: &str = "TRACESCOPE_TOOL_TRUNCATE_LEN";
pub const ENV_VERBOSE: &str = "TRACESCOPE_VERBOSE";
pub const ENV_DEBUG: &str = "TRACESCOPE_DEBUG";

/// Default truncation length for ordinary message content (characters).
pub const DEFAULT_TRUNCATE_LEN: usize = 200;

/// Default truncation length for tool inputs/results (characters).
/// Shorter than ordinary content: tool payloads are usually JSON blobs.
pub const DEFAULT_TOOL_TRUNCATE_LEN: usize = 120;

// Duration band thresholds (milliseconds)
pub const BAND_FAST_MAX_MS: f64 = 100.0;
pub const BAND_NORMAL_MAX_MS: f64 = 1_000.0;
pub const BAND_SLOW_MAX_MS: f64 = 5_000.0;

/// Default lookback for log-store queries.
pub const DEFAULT_LOOKBACK_HOURS: i64 = 24;

/// Default log-store query result limit.
pub const DEFAULT_QUERY_LIMIT: usize = 10_000;
