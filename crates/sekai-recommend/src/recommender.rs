use crate::planner::{Planner, PlannerKind, RecommendFeatures};
use crate::request::{RecommendError, RecommendRequest, RecommendResponse};
use sekai_core::catalog::MasterData;
use sekai_core::context::{Context, LiveType, RankingCriterion};
use sekai_core::model::card::CardId;
use sekai_core::model::unit::CharacterId;
use sekai_core::music::{MusicRecommendation, recommend_musics};
use sekai_core::search::{SearchConstraints, SearchOutcome, SearchStatus};
use sekai_core::skill::{SkillProfile, format_skill_description};
use std::sync::Arc;
use tracing::{Level, event};

/// Entry point for deck recommendations over one loaded copy of the master data.
///
/// Cheap to share: the master data sits behind an `Arc` and nothing here is mutated after
/// construction.
pub struct DeckRecommender {
    data: Arc<MasterData>,
    planner: Box<dyn Planner>,
    features: RecommendFeatures,
}

impl DeckRecommender {
    pub fn new(data: Arc<MasterData>) -> Self {
        Self {
            data,
            planner: PlannerKind::from_env().planner(),
            features: RecommendFeatures::from_env(),
        }
    }

    pub fn with_planner(mut self, planner: Box<dyn Planner>) -> Self {
        self.planner = planner;
        self
    }

    pub fn with_features(mut self, features: RecommendFeatures) -> Self {
        self.features = features;
        self
    }

    pub fn data(&self) -> &Arc<MasterData> {
        &self.data
    }

    pub fn planner_name(&self) -> &'static str {
        self.planner.name()
    }

    pub fn recommend(&self, request: &RecommendRequest) -> Result<RecommendResponse, RecommendError> {
        request.validate()?;
        let music = self
            .data
            .music(request.music_id)
            .ok_or(RecommendError::NotFound {
                kind: "music",
                id: request.music_id,
            })?;

        let mut ctx = Context::new(music, request.live_type)
            .with_criterion(request.criterion)
            .with_area_bonuses(request.area_bonuses.clone());
        if let Some(event_id) = request.event_id {
            let event = self.data.event(event_id).ok_or(RecommendError::NotFound {
                kind: "event",
                id: event_id,
            })?;
            ctx = ctx.with_event(event);
        }
        if let Some(character_id) = request.challenge_character_id {
            ctx = ctx.with_challenge_character(character_id);
        }
        if let Some(bonus) = &request.costume_bonus {
            ctx = ctx.with_costume_bonus(bonus.clone());
        }
        if let Some(rules) = request.rules {
            ctx = ctx.with_rules(rules);
        }

        let criterion = ctx.criterion();
        if criterion != request.criterion {
            tracing::warn!(
                target: "sekai_recommend::decision",
                requested = %request.criterion,
                used = %criterion,
                live_type = %request.live_type,
                has_event = request.event_id.is_some(),
                reason = "criterion_fallback",
                message = "requested criterion unavailable; ranking by fallback"
            );
        }

        let constraints = SearchConstraints::for_context(&ctx)
            .with_deck_size(request.deck_size)
            .with_top_k(request.top_k)
            .with_budget(request.budget.unwrap_or(self.features.default_budget()));

        let outcome = self
            .planner
            .plan(self.data.catalog(), &request.roster, &ctx, &constraints)?;

        if outcome.status == SearchStatus::PartialTimeout {
            tracing::warn!(
                target: "sekai_recommend::decision",
                planner = self.planner.name(),
                nodes = outcome.nodes_expanded,
                elapsed_ms = outcome.elapsed.as_millis() as u64,
                decks = outcome.decks.len(),
                reason = "budget_exhausted",
                message = "search budget spent; returning best decks found"
            );
        }
        self.log_decision(request, criterion, &outcome);

        let catalog = self.data.catalog();
        let character_of = |card_id: CardId| -> CharacterId {
            catalog
                .lookup(card_id)
                .map(|card| card.character_id)
                .unwrap_or_default()
        };
        Ok(RecommendResponse::from_outcome(
            &outcome,
            criterion,
            self.planner.name(),
            character_of,
        ))
    }

    /// Music suggestions for a live type and criterion from the loaded PSPI metrics.
    pub fn recommend_musics(
        &self,
        live_type: LiveType,
        criterion: RankingCriterion,
    ) -> Vec<MusicRecommendation> {
        recommend_musics(self.data.musics(), self.data.music_metas(), live_type, criterion)
    }

    /// Skill text of a card at `level`, with placeholders filled in.
    pub fn describe_skill(&self, card_id: CardId, level: u8) -> Result<String, RecommendError> {
        let catalog = self.data.catalog();
        let card = catalog
            .lookup(card_id)
            .map_err(|_| RecommendError::NotFound {
                kind: "card",
                id: card_id,
            })?;
        let skill = catalog
            .skill(card.skill_id)
            .ok_or(RecommendError::NotFound {
                kind: "skill",
                id: card.skill_id,
            })?;
        SkillProfile::at_level(skill, level).map_err(|_| RecommendError::InvalidLevel {
            skill_id: skill.id,
            level,
        })?;
        Ok(format_skill_description(skill, level, Some(card.character_id)))
    }

    fn log_decision(
        &self,
        request: &RecommendRequest,
        criterion: RankingCriterion,
        outcome: &SearchOutcome,
    ) {
        if !tracing::enabled!(Level::INFO) {
            return;
        }

        event!(
            target: "sekai_recommend::search",
            Level::INFO,
            planner = self.planner.name(),
            status = %outcome.status,
            nodes = outcome.nodes_expanded,
            pruned = outcome.pruned,
            elapsed_us = outcome.elapsed.as_micros() as u64,
            roster = request.roster.len(),
            deck_size = request.deck_size,
        );

        if !self.features.decision_details() {
            return;
        }

        let best = outcome.best();
        let top_decks: Vec<Vec<CardId>> = outcome
            .decks
            .iter()
            .take(5)
            .map(|deck| deck.card_ids.clone())
            .collect();
        let top_objectives: Vec<f64> = outcome.decks.iter().take(5).map(|d| d.objective).collect();

        event!(
            target: "sekai_recommend::decision",
            Level::INFO,
            music_id = request.music_id,
            live_type = %request.live_type,
            event_id = request.event_id.map(i64::from).unwrap_or(-1),
            criterion = %criterion,
            status = %outcome.status,
            deck_count = outcome.decks.len(),
            best_cards = ?best.map(|deck| deck.card_ids.clone()).unwrap_or_default(),
            best_objective = best.map(|deck| deck.objective).unwrap_or(0.0),
            best_total = best.map(|deck| deck.total_score).unwrap_or(0.0),
            best_skill_percent = best.map(|deck| deck.breakdown.skill_percent).unwrap_or(0.0),
            top_decks = ?top_decks,
            top_objectives = ?top_objectives,
        );
    }
}
