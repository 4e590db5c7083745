//! Structured telemetry for a bench run.
//!
//! Search and planner events from `sekai_core`, `sekai_recommend` and this crate are written as
//! JSON lines to `telemetry.jsonl` beside the summary table. `RUST_LOG` overrides the filter.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{Level, event};
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LoggingConfig, ResolvedOutputs};

const TELEMETRY_FILE: &str = "telemetry.jsonl";
const WORKSPACE_TARGETS: [&str; 3] = ["sekai_core", "sekai_recommend", "sekai_bench"];

/// Keeps the non-blocking writer alive; dropping it flushes pending telemetry.
pub struct LoggingGuard {
    _guard: WorkerGuard,
    pub run_id: String,
    pub telemetry_path: PathBuf,
}

pub fn telemetry_path(outputs: &ResolvedOutputs) -> PathBuf {
    outputs
        .summary_md
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(TELEMETRY_FILE)
}

/// Default filter: the configured level for the workspace crates, warnings for dependencies.
pub fn filter_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    std::iter::once("warn".to_string())
        .chain(
            WORKSPACE_TARGETS
                .iter()
                .map(|target| format!("{target}={level}")),
        )
        .collect::<Vec<_>>()
        .join(",")
}

pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
    run_id: &str,
) -> Result<Option<LoggingGuard>> {
    if !logging.enable_structured {
        return Ok(None);
    }

    let telemetry_path = telemetry_path(outputs);
    if let Some(dir) = telemetry_path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating telemetry directory at {}", dir.display()))?;
    }
    let file = File::create(&telemetry_path)
        .with_context(|| format!("creating telemetry file at {}", telemetry_path.display()))?;

    let (writer, guard) = non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(file);

    let level = logging.level().unwrap_or(Level::INFO);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(level)));

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .json()
        .with_current_span(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(writer)
        .finish();

    // Only the first run in a process installs its subscriber.
    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        event!(
            target: "sekai_bench::logging",
            Level::INFO,
            run_id,
            decision_details = logging.decision_details,
            "telemetry started"
        );
    }

    Ok(Some(LoggingGuard {
        _guard: guard,
        run_id: run_id.to_string(),
        telemetry_path,
    }))
}
