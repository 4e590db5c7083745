use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use sekai_core::catalog::{CardCatalog, DataError, MasterData};
use sekai_core::context::{LiveType, RankingCriterion};
use sekai_core::model::card::{Card, CardId};
use sekai_core::model::event::{EventId, MAX_MASTER_RANK};
use sekai_core::model::music::MusicId;
use sekai_core::music::recommend_musics;
use sekai_core::roster::{DEFAULT_SKILL_LEVEL, RosterEntry};
use sekai_core::search::SearchStatus;
use sekai_recommend::{
    DeckRecommender, PlannerKind, RecommendError, RecommendFeatures, RecommendRequest,
    RecommendResponse,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::analytics::{AnalyticsCollector, AnalyticsError};
use crate::config::{BenchmarkConfig, ResolvedOutputs, RosterConfig, ScenarioConfig, SyntheticRoster};

/// Replays every configured scenario against every configured planner.
pub struct ScenarioRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    data: Arc<MasterData>,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub scenarios: usize,
    pub planners: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
}

/// One JSONL row: a scenario solved by one planner.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioRow {
    pub run_id: String,
    pub scenario: String,
    pub planner: &'static str,
    pub music_id: MusicId,
    pub live_type: LiveType,
    pub event_id: Option<EventId>,
    /// Criterion actually ranked by, after fallbacks.
    pub criterion: RankingCriterion,
    pub roster_size: usize,
    pub deck_size: usize,
    pub status: SearchStatus,
    pub decks: usize,
    pub best_card_ids: Vec<CardId>,
    pub best_objective: f64,
    pub best_total_score: f64,
    pub best_event_points: f64,
    pub nodes_expanded: u64,
    pub elapsed_ms: f64,
}

impl ScenarioRow {
    fn new(
        run_id: &str,
        scenario: &ScenarioConfig,
        planner: PlannerKind,
        roster_size: usize,
        response: &RecommendResponse,
        elapsed_ms: f64,
    ) -> Self {
        let best = response.decks.first();
        Self {
            run_id: run_id.to_string(),
            scenario: scenario.name.clone(),
            planner: planner.as_str(),
            music_id: scenario.music_id,
            live_type: scenario.live_type,
            event_id: scenario.event_id,
            criterion: response.criterion,
            roster_size,
            deck_size: scenario.deck_size,
            status: response.status,
            decks: response.decks.len(),
            best_card_ids: best.map(|deck| deck.card_ids.clone()).unwrap_or_default(),
            best_objective: best.map(|deck| deck.objective).unwrap_or(0.0),
            best_total_score: best.map(|deck| deck.total_score).unwrap_or(0.0),
            best_event_points: best.map(|deck| deck.event_points).unwrap_or(0.0),
            nodes_expanded: response.nodes_expanded,
            elapsed_ms,
        }
    }
}

impl ScenarioRunner {
    /// Load master data and check every scenario's ids against it.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let data = load_master_data(&config.data)?;

        for scenario in &config.scenarios {
            if data.music(scenario.music_id).is_none() {
                return Err(RunnerError::UnknownReference {
                    scenario: scenario.name.clone(),
                    kind: "music",
                    id: scenario.music_id,
                });
            }
            if let Some(event_id) = scenario.event_id {
                if data.event(event_id).is_none() {
                    return Err(RunnerError::UnknownReference {
                        scenario: scenario.name.clone(),
                        kind: "event",
                        id: event_id,
                    });
                }
            }
        }

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            data: Arc::new(data),
        })
    }

    pub fn data(&self) -> &Arc<MasterData> {
        &self.data
    }

    /// Execute every scenario, streaming JSONL rows to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut analytics = AnalyticsCollector::new(&self.config);
        let mut rows_written = 0usize;
        let features = run_features(&self.config);

        for scenario in &self.config.scenarios {
            let roster = build_roster(self.data.catalog(), &scenario.roster);
            let request = self.request_for(scenario, roster);

            for &planner in &self.config.planners {
                let recommender = DeckRecommender::new(Arc::clone(&self.data))
                    .with_planner(planner.planner())
                    .with_features(features);

                let started = Instant::now();
                let response = recommender.recommend(&request).map_err(|source| {
                    RunnerError::Recommend {
                        scenario: scenario.name.clone(),
                        planner: planner.as_str(),
                        source,
                    }
                })?;
                let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

                let row = ScenarioRow::new(
                    &self.config.run_id,
                    scenario,
                    planner,
                    request.roster.len(),
                    &response,
                    elapsed_ms,
                );
                self.log_row(&row);

                serde_json::to_writer(&mut writer, &row)?;
                writer.write_all(b"\n")?;
                analytics.record(&row)?;
                rows_written += 1;
            }

            let suggestions = recommend_musics(
                self.data.musics(),
                self.data.music_metas(),
                scenario.live_type,
                scenario.criterion,
            );
            analytics.record_music_suggestions(&scenario.name, suggestions);
        }

        writer.flush()?;

        let summary = analytics.finalize()?;
        summary.write_markdown(&self.outputs.summary_md)?;

        Ok(RunSummary {
            scenarios: self.config.scenarios.len(),
            planners: self.config.planners.len(),
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
        })
    }

    fn request_for(&self, scenario: &ScenarioConfig, roster: Vec<RosterEntry>) -> RecommendRequest {
        let mut request = RecommendRequest::new(roster, scenario.music_id, scenario.live_type);
        request.event_id = scenario.event_id;
        request.challenge_character_id = scenario.challenge_character_id;
        request.criterion = scenario.criterion;
        request.deck_size = scenario.deck_size;
        request.top_k = scenario.top_k.unwrap_or(self.config.search.top_k);
        request.budget = Some(self.config.search.budget());
        request
    }

    fn log_row(&self, row: &ScenarioRow) {
        if !self.logging_enabled || !tracing::enabled!(Level::INFO) {
            return;
        }
        event!(
            target: "sekai_bench::runner",
            Level::INFO,
            run_id = %row.run_id,
            scenario = %row.scenario,
            planner = row.planner,
            status = %row.status,
            criterion = %row.criterion,
            best_objective = row.best_objective,
            nodes = row.nodes_expanded,
            elapsed_ms = row.elapsed_ms,
        );
    }
}

fn load_master_data(path: &Path) -> Result<MasterData, RunnerError> {
    let file = File::open(path).map_err(|source| RunnerError::ReadData {
        path: path.to_path_buf(),
        source,
    })?;
    MasterData::from_reader(BufReader::new(file)).map_err(|source| RunnerError::Data {
        path: path.to_path_buf(),
        source,
    })
}

fn build_roster(catalog: &CardCatalog, roster: &RosterConfig) -> Vec<RosterEntry> {
    match &roster.synthetic {
        Some(synthetic) => synthetic_roster(catalog, synthetic),
        None => roster.cards.clone(),
    }
}

/// Seeded sample of the catalog. The same seed and catalog always give the same roster.
pub fn synthetic_roster(catalog: &CardCatalog, synthetic: &SyntheticRoster) -> Vec<RosterEntry> {
    let mut rng = StdRng::seed_from_u64(synthetic.seed);
    let cards: Vec<&Card> = catalog.iter().collect();
    let mut chosen: Vec<&Card> = cards
        .choose_multiple(&mut rng, synthetic.size.min(cards.len()))
        .copied()
        .collect();
    chosen.sort_by_key(|card| card.id);

    let max_rank = synthetic.max_master_rank.min(MAX_MASTER_RANK);
    chosen
        .into_iter()
        .map(|card| {
            let levels: Vec<u8> = catalog
                .skill(card.skill_id)
                .map(|skill| skill.levels())
                .unwrap_or_default()
                .into_iter()
                .filter(|level| *level <= synthetic.max_skill_level)
                .collect();
            let skill_level = levels
                .choose(&mut rng)
                .copied()
                .unwrap_or(DEFAULT_SKILL_LEVEL);
            let master_rank = (0..=max_rank).collect::<Vec<u8>>();
            let master_rank = master_rank.choose(&mut rng).copied().unwrap_or(0);
            RosterEntry::new(card.id)
                .with_skill_level(skill_level)
                .with_master_rank(master_rank)
        })
        .collect()
}

/// Environment toggles, with decision details also switched on by the run's logging config.
fn run_features(config: &BenchmarkConfig) -> RecommendFeatures {
    let features = RecommendFeatures::from_env();
    features.with_decision_details(features.decision_details() || config.logging.decision_details)
}

fn ensure_parent(parent: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = parent {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to read master data {path:?}: {source}")]
    ReadData {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to load master data {path:?}: {source}")]
    Data {
        path: PathBuf,
        #[source]
        source: DataError,
    },
    #[error("scenario '{scenario}' references unknown {kind} {id}")]
    UnknownReference {
        scenario: String,
        kind: &'static str,
        id: u32,
    },
    #[error("scenario '{scenario}' failed under {planner}: {source}")]
    Recommend {
        scenario: String,
        planner: &'static str,
        #[source]
        source: RecommendError,
    },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
