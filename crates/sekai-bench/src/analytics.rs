use std::collections::HashMap;
use std::fs;
use std::path::Path;

use sekai_core::music::MusicRecommendation;
use sekai_core::search::SearchStatus;
use sekai_recommend::PlannerKind;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::statistics::{Data, OrderStatistics, Statistics};
use thiserror::Error;

use crate::config::BenchmarkConfig;
use crate::runner::ScenarioRow;

const CONFIDENCE_Z: f64 = 1.96; // 95% CI

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("planner '{0}' produced rows but is not configured")]
    UnknownPlanner(String),
    #[error("baseline '{0}' has no row for scenario '{1}'")]
    MissingBaselineScenario(String, String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("statistics: {0}")]
    Stats(String),
}

pub struct AnalyticsCollector {
    baseline: PlannerKind,
    planners: HashMap<&'static str, PlannerAccumulator>,
    planner_order: Vec<PlannerKind>,
    baseline_objectives: HashMap<String, f64>,
    music_suggestions: Vec<ScenarioMusics>,
    latency_budget_ms: u64,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Self {
        let planners = config
            .planners
            .iter()
            .map(|kind| (kind.as_str(), PlannerAccumulator::new(*kind)))
            .collect();

        Self {
            baseline: config.metrics.baseline,
            planners,
            planner_order: config.planners.clone(),
            baseline_objectives: HashMap::new(),
            music_suggestions: Vec::new(),
            latency_budget_ms: config.metrics.latency_budget_ms,
        }
    }

    pub fn record(&mut self, row: &ScenarioRow) -> Result<(), AnalyticsError> {
        let acc = self
            .planners
            .get_mut(row.planner)
            .ok_or_else(|| AnalyticsError::UnknownPlanner(row.planner.to_string()))?;
        acc.record(row);

        if row.planner == self.baseline.as_str() {
            self.baseline_objectives
                .insert(row.scenario.clone(), row.best_objective);
        }
        Ok(())
    }

    pub fn record_music_suggestions(&mut self, scenario: &str, items: Vec<MusicRecommendation>) {
        self.music_suggestions.push(ScenarioMusics {
            scenario: scenario.to_string(),
            items,
        });
    }

    pub fn finalize(mut self) -> Result<AnalyticsSummary, AnalyticsError> {
        let baseline = self.baseline.as_str();
        let mut reports = Vec::new();
        let mut comparisons = Vec::new();

        for kind in &self.planner_order {
            let Some(acc) = self.planners.remove(kind.as_str()) else {
                continue;
            };

            if *kind == self.baseline {
                comparisons.push(ComparisonReport {
                    planner: baseline,
                    mean_gap_pct: 0.0,
                    worse_scenarios: 0,
                    p_value: 1.0,
                    sample_size: acc.runs(),
                });
            } else {
                let mut comparison = ComparisonAccumulator::new();
                for (scenario, objective) in &acc.objectives {
                    let reference = self.baseline_objectives.get(scenario).ok_or_else(|| {
                        AnalyticsError::MissingBaselineScenario(baseline.to_string(), scenario.clone())
                    })?;
                    comparison.record(*objective, *reference);
                }
                comparisons.push(comparison.into_report(kind.as_str())?);
            }

            reports.push(acc.into_report(self.latency_budget_ms));
        }

        Ok(AnalyticsSummary {
            baseline,
            planners: reports,
            comparisons,
            music_suggestions: self.music_suggestions,
            latency_budget_ms: self.latency_budget_ms,
        })
    }
}

struct PlannerAccumulator {
    kind: PlannerKind,
    statuses: HashMap<SearchStatus, usize>,
    latencies_ms: Vec<f64>,
    nodes: Vec<f64>,
    objectives: Vec<(String, f64)>,
}

impl PlannerAccumulator {
    fn new(kind: PlannerKind) -> Self {
        Self {
            kind,
            statuses: HashMap::new(),
            latencies_ms: Vec::new(),
            nodes: Vec::new(),
            objectives: Vec::new(),
        }
    }

    fn runs(&self) -> usize {
        self.latencies_ms.len()
    }

    fn record(&mut self, row: &ScenarioRow) {
        *self.statuses.entry(row.status).or_insert(0) += 1;
        self.latencies_ms.push(row.elapsed_ms);
        self.nodes.push(row.nodes_expanded as f64);
        self.objectives
            .push((row.scenario.clone(), row.best_objective));
    }

    fn into_report(self, latency_budget_ms: u64) -> PlannerReport {
        let count = |status: SearchStatus| self.statuses.get(&status).copied().unwrap_or(0);
        let avg_latency = mean_or_zero(&self.latencies_ms);
        let p95_latency = if self.latencies_ms.is_empty() {
            0.0
        } else {
            Data::new(self.latencies_ms.clone()).percentile(95)
        };

        PlannerReport {
            planner: self.kind.as_str(),
            runs: self.runs(),
            complete: count(SearchStatus::Complete),
            partial_timeout: count(SearchStatus::PartialTimeout),
            insufficient_roster: count(SearchStatus::InsufficientRoster),
            avg_latency_ms: avg_latency,
            p95_latency_ms: p95_latency,
            latency_ci95: confidence_interval(&self.latencies_ms),
            avg_nodes: mean_or_zero(&self.nodes),
            avg_objective: mean_or_zero(
                &self.objectives.iter().map(|(_, o)| *o).collect::<Vec<_>>(),
            ),
            over_budget: avg_latency > latency_budget_ms as f64,
        }
    }
}

/// Paired objectives of one planner against the baseline, one pair per scenario.
struct ComparisonAccumulator {
    diffs: Vec<f64>,
    gaps_pct: Vec<f64>,
    worse: usize,
}

impl ComparisonAccumulator {
    fn new() -> Self {
        Self {
            diffs: Vec::new(),
            gaps_pct: Vec::new(),
            worse: 0,
        }
    }

    fn record(&mut self, objective: f64, baseline: f64) {
        let diff = objective - baseline;
        self.diffs.push(diff);
        if baseline > 0.0 {
            self.gaps_pct.push(-diff / baseline * 100.0);
        }
        if diff < -1e-9 * baseline.abs().max(1.0) {
            self.worse += 1;
        }
    }

    fn into_report(self, planner: &'static str) -> Result<ComparisonReport, AnalyticsError> {
        let mean_gap_pct = mean_or_zero(&self.gaps_pct);
        let worse_scenarios = self.worse;
        let (p_value, sample_size) = wilcoxon_signed_rank(self.diffs)?;
        Ok(ComparisonReport {
            planner,
            mean_gap_pct,
            worse_scenarios,
            p_value,
            sample_size,
        })
    }
}

fn wilcoxon_signed_rank(diffs: Vec<f64>) -> Result<(f64, usize), AnalyticsError> {
    let diffs: Vec<f64> = diffs
        .into_iter()
        .filter(|d| d.abs() > f64::EPSILON)
        .collect();
    let n = diffs.len();
    if n == 0 {
        return Ok((1.0, 0));
    }

    let mut paired: Vec<(f64, f64)> = diffs.into_iter().map(|d| (d.abs(), d.signum())).collect();
    paired.sort_by(|a, b| a.0.total_cmp(&b.0));

    // Average ranks across ties
    let mut ranks = Vec::with_capacity(n);
    let mut tie_sizes = Vec::new();
    let mut i = 0;
    while i < paired.len() {
        let mut j = i;
        while j + 1 < paired.len() && (paired[j + 1].0 - paired[i].0).abs() < 1e-12 {
            j += 1;
        }
        let rank = (i + j + 2) as f64 / 2.0;
        for (_, sign) in &paired[i..=j] {
            ranks.push((rank, *sign));
        }
        if j > i {
            tie_sizes.push(j - i + 1);
        }
        i = j + 1;
    }

    let w_plus: f64 = ranks
        .iter()
        .filter(|(_, sign)| *sign > 0.0)
        .map(|(rank, _)| *rank)
        .sum();
    let w_minus: f64 = ranks
        .iter()
        .filter(|(_, sign)| *sign < 0.0)
        .map(|(rank, _)| *rank)
        .sum();

    let w = w_plus.min(w_minus);
    let n_f = n as f64;
    let mean_w = n_f * (n_f + 1.0) / 4.0;

    let tie_adjustment: f64 = tie_sizes
        .into_iter()
        .map(|count| {
            let c = count as f64;
            (c.powi(3) - c) / 48.0
        })
        .sum();
    let variance_w = n_f * (n_f + 1.0) * (2.0 * n_f + 1.0) / 24.0 - tie_adjustment;
    if variance_w <= 0.0 {
        return Ok((1.0, n));
    }

    let z = ((w - mean_w).abs() - 0.5) / variance_w.sqrt();
    let normal = Normal::new(0.0, 1.0).map_err(|e| AnalyticsError::Stats(e.to_string()))?;
    let p = 2.0 * (1.0 - normal.cdf(z));
    Ok((p.clamp(0.0, 1.0), n))
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioMusics {
    pub scenario: String,
    pub items: Vec<MusicRecommendation>,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub baseline: &'static str,
    pub planners: Vec<PlannerReport>,
    pub comparisons: Vec<ComparisonReport>,
    pub music_suggestions: Vec<ScenarioMusics>,
    pub latency_budget_ms: u64,
}

impl AnalyticsSummary {
    pub fn comparison(&self, planner: &str) -> Option<&ComparisonReport> {
        self.comparisons.iter().find(|c| c.planner == planner)
    }

    pub fn render_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Deck Search Summary\n\n");
        out.push_str(&format!(
            "Baseline planner: `{}`. Latency budget: {} ms average per scenario.\n\n",
            self.baseline, self.latency_budget_ms
        ));
        out.push_str("| Planner | Runs | Complete | Partial | Insufficient | Avg ms | p95 ms | 95% CI (ms) | Avg nodes | Avg objective | Gap vs baseline | Worse | p-value | Over Budget |\n");
        out.push_str("|---------|------|----------|---------|--------------|--------|--------|-------------|-----------|---------------|-----------------|-------|---------|-------------|\n");

        for report in &self.planners {
            let comparison = self.comparison(report.planner);
            out.push_str(&format!(
                "| {name} | {runs} | {complete} | {partial} | {insufficient} | {avg:.2} | {p95:.2} | [{ci_low:.2}, {ci_high:.2}] | {nodes:.0} | {objective:.1} | {gap:+.3}% | {worse} | {pval:.3} | {over} |\n",
                name = report.planner,
                runs = report.runs,
                complete = report.complete,
                partial = report.partial_timeout,
                insufficient = report.insufficient_roster,
                avg = report.avg_latency_ms,
                p95 = report.p95_latency_ms,
                ci_low = report.latency_ci95.0,
                ci_high = report.latency_ci95.1,
                nodes = report.avg_nodes,
                objective = report.avg_objective,
                gap = comparison.map(|c| c.mean_gap_pct).unwrap_or(0.0),
                worse = comparison.map(|c| c.worse_scenarios).unwrap_or(0),
                pval = comparison.map(|c| c.p_value).unwrap_or(1.0),
                over = if report.over_budget { "Yes" } else { "No" },
            ));
        }

        if !self.music_suggestions.is_empty() {
            out.push_str("\n## Suggested musics\n\n");
            out.push_str("| Scenario | Music | Difficulty | Value | Rank |\n");
            out.push_str("|----------|-------|------------|-------|------|\n");
            for entry in &self.music_suggestions {
                if entry.items.is_empty() {
                    out.push_str(&format!("| {} | - | - | - | - |\n", entry.scenario));
                }
                for item in &entry.items {
                    let label = if item.pinned { " (pinned)" } else { "" };
                    out.push_str(&format!(
                        "| {} | {} {}{} | {} | {:.2} | {} |\n",
                        entry.scenario,
                        item.music_id,
                        item.title,
                        label,
                        item.difficulty,
                        item.value,
                        item.rank,
                    ));
                }
            }
        }

        out
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        fs::write(path.as_ref(), self.render_markdown()).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannerReport {
    pub planner: &'static str,
    pub runs: usize,
    pub complete: usize,
    pub partial_timeout: usize,
    pub insufficient_roster: usize,
    pub avg_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub latency_ci95: (f64, f64),
    pub avg_nodes: f64,
    pub avg_objective: f64,
    pub over_budget: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub planner: &'static str,
    /// Mean shortfall against the baseline objective, in percent. Positive is worse.
    pub mean_gap_pct: f64,
    pub worse_scenarios: usize,
    pub p_value: f64,
    pub sample_size: usize,
}

fn mean_or_zero(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().mean()
    }
}

fn confidence_interval(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = mean_or_zero(values);
    if values.len() == 1 {
        return (mean, mean);
    }
    let std_error = values.iter().std_dev() / (values.len() as f64).sqrt();
    let margin = CONFIDENCE_Z * std_error;
    (mean - margin, mean + margin)
}
