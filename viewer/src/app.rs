//! Application shell
//!
//! Thin boundary glue: reads an already-fetched batch of raw records from a
//! file or stdin, runs the normalize/aggregate/render pipeline, and prints
//! the result. All interesting logic lives under `domain::traces`.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value as JsonValue;
use tracing_subscriber::EnvFilter;

use crate::core::cli;
use crate::core::config::ViewConfig;
use crate::core::constants::ENV_LOG;
use crate::core::error::ViewError;
use crate::data::query::{QueryBuilder, QueryWindow};
use crate::domain::traces::aggregate::aggregate;
use crate::domain::traces::export::export_to_string;
use crate::domain::traces::normalize::Normalizer;
use crate::domain::traces::render::Renderer;

pub struct App;

impl App {
    pub fn run() -> Result<()> {
        let cli = cli::parse();
        Self::init_logging(cli.debug);

        if cli.show_query {
            let mut builder = QueryBuilder::new();
            if let Some(trace_id) = &cli.trace_id {
                builder = builder.trace_id(trace_id);
            }
            if let Some(session_id) = &cli.session_id {
                builder = builder.session_id(session_id);
            }
            let window = QueryWindow::lookback(
                chrono::Utc::now(),
                chrono::Duration::hours(cli.lookback_hours),
            );
            println!("{}", builder.build());
            println!(
                "# window: {} .. {}",
                window.start.to_rfc3339(),
                window.end.to_rfc3339()
            );
            return Ok(());
        }

        let config = ViewConfig::from_cli(&cli);
        let records = read_records(cli.input.as_deref())?;
        tracing::debug!(records = records.len(), "Read record batch");

        let batch = Normalizer::new(config.debug).normalize_batch(&records);
        if config.debug {
            eprintln!(
                "# records={} spans={} logs={} items={} skipped={}",
                batch.stats.records,
                batch.stats.spans,
                batch.stats.logs,
                batch.stats.items,
                batch.stats.skipped
            );
        }

        let traces = match aggregate(&batch, cli.trace_id.as_deref()) {
            Ok(traces) => traces,
            // "Nothing happened" is not "something broke": targeted
            // message, successful exit
            Err(ViewError::NoData { scope }) => {
                println!("No telemetry found for {scope}.");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        if cli.export_json {
            println!("{}", export_to_string(&traces));
            return Ok(());
        }

        let renderer = Renderer::new(&config);
        for trace in &traces {
            println!("{}", renderer.render_trace(trace));
        }
        if traces.len() > 1 {
            println!("{}", renderer.render_summary(&traces));
        }
        Ok(())
    }

    fn init_logging(debug: bool) {
        tracing_subscriber::fmt()
            .with_env_filter(log_filter(debug))
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Effective log filter: the env var always wins; otherwise debug mode
/// lowers the default so the per-record extraction diagnostics
/// (`tracing::debug!` in the normalizer) actually reach stderr.
fn log_filter(debug: bool) -> EnvFilter {
    let fallback = if debug { "debug" } else { "warn" };
    EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Read a record batch: a JSON array, or JSON lines. Individual bad lines
/// are skipped with a diagnostic; an unreadable or wholly unparseable input
/// is a real error.
fn read_records(path: Option<&Path>) -> Result<Vec<JsonValue>> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(ViewError::Io)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).map_err(ViewError::Io)?;
            buf
        }
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        let records: Vec<JsonValue> = serde_json::from_str(trimmed)
            .map_err(|e| ViewError::InvalidInput(format!("record array: {e}")))?;
        return Ok(records);
    }

    let mut records = Vec::new();
    for (lineno, line) in trimmed.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(value) => records.push(value),
            Err(e) => {
                tracing::warn!(line = lineno + 1, error = %e, "Skipping unparseable record line");
            }
        }
    }
    if records.is_empty() {
        return Err(ViewError::InvalidInput("no parseable records in input".to_string()).into());
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_records_json_array() {
        let file = write_temp(r#"[{"traceId": "t1"}, {"traceId": "t2"}]"#);
        let records = read_records(Some(file.path())).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_read_records_json_lines_skips_bad_lines() {
        let file = write_temp("{\"traceId\": \"t1\"}\nnot json\n{\"traceId\": \"t2\"}\n");
        let records = read_records(Some(file.path())).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_read_records_empty_file() {
        let file = write_temp("");
        let records = read_records(Some(file.path())).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_read_records_invalid_array() {
        let file = write_temp("[{broken");
        assert!(read_records(Some(file.path())).is_err());
    }

    #[test]
    fn test_read_records_missing_file() {
        assert!(read_records(Some(Path::new("/nonexistent/records.json"))).is_err());
    }

    #[test]
    fn test_log_filter_debug_lowers_default() {
        // Debug mode must let the normalizer's per-record branch
        // diagnostics through; without it only warnings surface.
        assert_eq!(log_filter(true).to_string(), "debug");
        assert_eq!(log_filter(false).to_string(), "warn");
    }
}
