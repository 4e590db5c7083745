use sekai_core::context::{LiveType, RankingCriterion};
use sekai_core::model::event::EventId;
use sekai_core::model::music::MusicId;
use sekai_core::model::unit::{CharacterId, character_name};
use sekai_core::roster::RosterEntry;
use sekai_core::search::{DEFAULT_DECK_SIZE, DEFAULT_TOP_K, MAX_DECK_SIZE, SearchBudget};
use sekai_recommend::PlannerKind;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const DEFAULT_LATENCY_BUDGET_MS: u64 = 500;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root benchmark configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BenchmarkConfig {
    pub run_id: String,
    /// Master data JSON. Relative paths resolve against the config file's directory.
    pub data: PathBuf,
    pub planners: Vec<PlannerKind>,
    pub scenarios: Vec<ScenarioConfig>,
    #[serde(default)]
    pub search: SearchConfig,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BenchmarkConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: BenchmarkConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        if let Some(base) = path.parent() {
            cfg.rebase_data(base);
        }
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        if self.data.as_os_str().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "data".to_string(),
                message: "master data path must not be empty".to_string(),
            });
        }
        validate_planners(&self.planners)?;
        self.search.validate()?;
        validate_scenarios(&self.scenarios)?;
        self.outputs.validate(&self.run_id)?;
        self.metrics.validate(&self.planners)?;
        self.logging.normalize();
        Ok(())
    }

    /// Resolve output templates (e.g., `{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: resolve_template(&self.run_id, &self.outputs.jsonl),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
        }
    }

    /// Keep only the named scenarios, in config order. Unknown names are an error.
    pub fn retain_scenarios(&mut self, names: &[String]) -> Result<(), ValidationError> {
        if names.is_empty() {
            return Ok(());
        }
        if let Some(missing) = names
            .iter()
            .find(|name| !self.scenarios.iter().any(|s| &s.name == *name))
        {
            return Err(ValidationError::InvalidField {
                field: "scenarios".to_string(),
                message: format!("scenario '{missing}' is not defined"),
            });
        }
        self.scenarios.retain(|s| names.contains(&s.name));
        Ok(())
    }

    /// Replace the seed of every synthetic roster.
    pub fn override_roster_seed(&mut self, seed: u64) {
        for scenario in &mut self.scenarios {
            if let Some(synthetic) = scenario.roster.synthetic.as_mut() {
                synthetic.seed = seed;
            }
        }
    }

    fn rebase_data(&mut self, base: &Path) {
        if self.data.is_relative() && !base.as_os_str().is_empty() {
            self.data = base.join(&self.data);
        }
    }
}

/// One recommendation request replayed against every planner.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScenarioConfig {
    pub name: String,
    pub music_id: MusicId,
    pub live_type: LiveType,
    #[serde(default)]
    pub event_id: Option<EventId>,
    #[serde(default)]
    pub challenge_character_id: Option<CharacterId>,
    #[serde(default)]
    pub criterion: RankingCriterion,
    #[serde(default = "default_deck_size")]
    pub deck_size: usize,
    /// Per-scenario override of `search.top_k`.
    #[serde(default)]
    pub top_k: Option<usize>,
    pub roster: RosterConfig,
}

impl ScenarioConfig {
    fn validate(&self, index: usize) -> Result<(), ValidationError> {
        let field = |name: &str| format!("scenarios[{index}].{name}");

        if self.name.trim().is_empty() || !self.name.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
            return Err(ValidationError::InvalidField {
                field: field("name"),
                message: "scenario name must be non-empty and use only alphanumerics, '.', '_' or '-'"
                    .to_string(),
            });
        }

        if self.deck_size == 0 || self.deck_size > MAX_DECK_SIZE {
            return Err(ValidationError::InvalidField {
                field: field("deck_size"),
                message: format!("deck size must be between 1 and {MAX_DECK_SIZE}"),
            });
        }

        if self.top_k == Some(0) {
            return Err(ValidationError::InvalidField {
                field: field("top_k"),
                message: "top_k must be at least 1".to_string(),
            });
        }

        match (self.live_type, self.challenge_character_id) {
            (LiveType::Challenge, None) => {
                return Err(ValidationError::InvalidField {
                    field: field("challenge_character_id"),
                    message: "challenge lives need a challenge character".to_string(),
                });
            }
            (LiveType::Challenge, Some(id)) if character_name(id).is_none() => {
                return Err(ValidationError::InvalidField {
                    field: field("challenge_character_id"),
                    message: format!("unknown character id {id}"),
                });
            }
            (LiveType::Challenge, Some(_)) | (_, None) => {}
            (_, Some(_)) => {
                return Err(ValidationError::InvalidField {
                    field: field("challenge_character_id"),
                    message: format!("only valid for challenge lives, not {}", self.live_type),
                });
            }
        }

        self.roster.validate(&field("roster"))
    }
}

fn default_deck_size() -> usize {
    DEFAULT_DECK_SIZE
}

/// Either an explicit card list or a seeded random sample of the catalog.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RosterConfig {
    #[serde(default)]
    pub cards: Vec<RosterEntry>,
    #[serde(default)]
    pub synthetic: Option<SyntheticRoster>,
}

impl RosterConfig {
    fn validate(&self, field: &str) -> Result<(), ValidationError> {
        match (&self.synthetic, self.cards.is_empty()) {
            (Some(_), false) => Err(ValidationError::InvalidField {
                field: field.to_string(),
                message: "set either cards or synthetic, not both".to_string(),
            }),
            (None, true) => Err(ValidationError::InvalidField {
                field: field.to_string(),
                message: "roster needs cards or a synthetic block".to_string(),
            }),
            (Some(synthetic), true) if synthetic.size == 0 => Err(ValidationError::InvalidField {
                field: format!("{field}.synthetic.size"),
                message: "synthetic roster size must be greater than zero".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct SyntheticRoster {
    pub size: usize,
    #[serde(default)]
    pub seed: u64,
    /// Highest skill level drawn; clamped to each skill's table.
    #[serde(default = "default_max_skill_level")]
    pub max_skill_level: u8,
    #[serde(default)]
    pub max_master_rank: u8,
}

fn default_max_skill_level() -> u8 {
    4
}

/// Search limits applied to every scenario.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct SearchConfig {
    #[serde(default)]
    pub time_cap_ms: Option<u64>,
    #[serde(default)]
    pub node_cap: Option<u64>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            time_cap_ms: None,
            node_cap: None,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl SearchConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.top_k == 0 {
            return Err(ValidationError::InvalidField {
                field: "search.top_k".to_string(),
                message: "top_k must be at least 1".to_string(),
            });
        }
        for (label, value) in [
            ("search.time_cap_ms", self.time_cap_ms),
            ("search.node_cap", self.node_cap),
        ] {
            if value == Some(0) {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "cap must be greater than zero (omit it for no cap)".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn budget(&self) -> SearchBudget {
        SearchBudget {
            time_cap_ms: self.time_cap_ms,
            node_cap: self.node_cap,
        }
    }
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (label, value) in [
            ("outputs.jsonl", &self.jsonl),
            ("outputs.summary_md", &self.summary_md),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "path must not be empty".to_string(),
                });
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "resolved path is invalid".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Metrics configuration block.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MetricsConfig {
    /// Planner whose objectives the others are compared against.
    #[serde(default)]
    pub baseline: PlannerKind,
    #[serde(default = "default_latency_budget_ms")]
    pub latency_budget_ms: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            baseline: PlannerKind::default(),
            latency_budget_ms: DEFAULT_LATENCY_BUDGET_MS,
        }
    }
}

impl MetricsConfig {
    fn validate(&self, planners: &[PlannerKind]) -> Result<(), ValidationError> {
        if !planners.contains(&self.baseline) {
            return Err(ValidationError::InvalidField {
                field: "metrics.baseline".to_string(),
                message: format!(
                    "baseline planner '{}' is not in the planners list",
                    self.baseline.as_str()
                ),
            });
        }

        if self.latency_budget_ms == 0 {
            return Err(ValidationError::InvalidField {
                field: "metrics.latency_budget_ms".to_string(),
                message: "latency budget must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

fn default_latency_budget_ms() -> u64 {
    DEFAULT_LATENCY_BUDGET_MS
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
    #[serde(default)]
    pub decision_details: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
            decision_details: false,
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn validate_planners(planners: &[PlannerKind]) -> Result<(), ValidationError> {
    if planners.is_empty() {
        return Err(ValidationError::InvalidField {
            field: "planners".to_string(),
            message: "at least one planner must be specified".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for planner in planners {
        if !seen.insert(*planner) {
            return Err(ValidationError::InvalidField {
                field: "planners".to_string(),
                message: format!("planner '{}' listed more than once", planner.as_str()),
            });
        }
    }
    Ok(())
}

fn validate_scenarios(scenarios: &[ScenarioConfig]) -> Result<(), ValidationError> {
    if scenarios.is_empty() {
        return Err(ValidationError::InvalidField {
            field: "scenarios".to_string(),
            message: "at least one scenario must be specified".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for (index, scenario) in scenarios.iter().enumerate() {
        scenario.validate(index)?;
        if !seen.insert(scenario.name.as_str()) {
            return Err(ValidationError::InvalidField {
                field: "scenarios".to_string(),
                message: format!("scenario name '{}' defined more than once", scenario.name),
            });
        }
    }
    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
