use std::path::PathBuf;

use clap::Parser;

use sekai_bench::config::{BenchmarkConfig, ResolvedOutputs};
use sekai_bench::logging::init_logging;
use sekai_bench::runner::ScenarioRunner;
use sekai_recommend::PlannerKind;

/// Scenario benchmarking harness for the deck planners.
#[derive(Debug, Parser)]
#[command(
    name = "sekai-bench",
    author,
    version,
    about = "Deterministic deck-search scenario harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Run only the named scenario (repeatable).
    #[arg(long = "scenario", value_name = "NAME")]
    scenarios: Vec<String>,

    /// Run only these planners (comma separated: branch_and_bound, greedy).
    #[arg(long, value_name = "LIST", value_delimiter = ',', value_parser = parse_planner)]
    planners: Vec<PlannerKind>,

    /// Override the per-search wall-clock cap.
    #[arg(long, value_name = "MS")]
    time_cap_ms: Option<u64>,

    /// Override the per-search node-expansion cap.
    #[arg(long, value_name = "NODES")]
    node_cap: Option<u64>,

    /// Override the number of decks kept per search.
    #[arg(long, value_name = "K")]
    top_k: Option<usize>,

    /// Override the RNG seed of every synthetic roster.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Exit after validating the configuration and master data (no scenario is run).
    #[arg(long)]
    validate_only: bool,

    /// Enable per-decision telemetry regardless of config.
    #[arg(long)]
    log_decision_details: bool,
}

fn parse_planner(raw: &str) -> Result<PlannerKind, String> {
    PlannerKind::parse(raw).ok_or_else(|| format!("unknown planner '{raw}'"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    config.retain_scenarios(&cli.scenarios)?;

    if !cli.planners.is_empty() {
        config.planners = cli.planners;
        if !config.planners.contains(&config.metrics.baseline) {
            config.metrics.baseline = config.planners[0];
        }
    }

    if let Some(time_cap_ms) = cli.time_cap_ms {
        config.search.time_cap_ms = Some(time_cap_ms);
    }

    if let Some(node_cap) = cli.node_cap {
        config.search.node_cap = Some(node_cap);
    }

    if let Some(top_k) = cli.top_k {
        config.search.top_k = top_k;
    }

    if let Some(seed) = cli.seed {
        config.override_roster_seed(seed);
    }

    if cli.log_decision_details {
        config.logging.decision_details = true;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let scenario_count = config.scenarios.len();
    let planner_count = config.planners.len();
    let run_id = config.run_id.clone();

    println!(
        "Loaded configuration '{run_id}' with {scenario_count} scenario{} and {planner_count} planner{}",
        if scenario_count == 1 { "" } else { "s" },
        if planner_count == 1 { "" } else { "s" },
    );

    let logging_guard = init_logging(&config.logging, &outputs, &run_id)?;
    let runner = ScenarioRunner::new(config, outputs)?;
    println!(
        "Master data: {} cards, {} musics",
        runner.data().catalog().len(),
        runner.data().musics().len()
    );

    if cli.validate_only {
        println!("Validation-only mode: scenario execution skipped.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Run complete for '{run_id}': {} scenarios × {} planners → {} rows at {}",
        summary.scenarios,
        summary.planners,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(guard) = logging_guard.as_ref() {
        println!("Telemetry log: {}", guard.telemetry_path.display());
    }

    Ok(())
}
