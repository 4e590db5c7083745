//! Request/response boundary of the recommendation engine.

mod error;

pub use error::RecommendError;

use sekai_core::context::{AreaBonuses, CostumeBonus, LiveRules, LiveType, RankingCriterion};
use sekai_core::model::card::CardId;
use sekai_core::model::event::EventId;
use sekai_core::model::music::MusicId;
use sekai_core::model::unit::{CharacterId, character_name};
use sekai_core::roster::RosterEntry;
use sekai_core::score::SlotBreakdown;
use sekai_core::search::{
    CandidateDeck, DEFAULT_DECK_SIZE, DEFAULT_TOP_K, SearchBudget, SearchOutcome, SearchStatus,
};
use serde::{Deserialize, Serialize};

fn default_deck_size() -> usize {
    DEFAULT_DECK_SIZE
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendRequest {
    /// Owned cards; bare ids or `{card_id, skill_level, master_rank}` objects.
    pub roster: Vec<RosterEntry>,
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
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub area_bonuses: AreaBonuses,
    #[serde(default)]
    pub costume_bonus: Option<CostumeBonus>,
    #[serde(default)]
    pub budget: Option<SearchBudget>,
    #[serde(default)]
    pub rules: Option<LiveRules>,
}

impl RecommendRequest {
    pub fn new(roster: Vec<RosterEntry>, music_id: MusicId, live_type: LiveType) -> Self {
        Self {
            roster,
            music_id,
            live_type,
            event_id: None,
            challenge_character_id: None,
            criterion: RankingCriterion::default(),
            deck_size: DEFAULT_DECK_SIZE,
            top_k: DEFAULT_TOP_K,
            area_bonuses: AreaBonuses::default(),
            costume_bonus: None,
            budget: None,
            rules: None,
        }
    }

    /// Checks that do not need master data.
    pub fn validate(&self) -> Result<(), RecommendError> {
        match (self.live_type, self.challenge_character_id) {
            (LiveType::Challenge, None) => {
                return Err(RecommendError::InvalidRequest(
                    "challenge lives need challenge_character_id".into(),
                ));
            }
            (LiveType::Challenge, Some(id)) if character_name(id).is_none() => {
                return Err(RecommendError::NotFound {
                    kind: "character",
                    id,
                });
            }
            (live_type, Some(_)) if live_type != LiveType::Challenge => {
                return Err(RecommendError::InvalidRequest(format!(
                    "challenge_character_id is only valid for challenge lives, not {live_type}"
                )));
            }
            _ => {}
        }
        if let Some(bonus) = &self.costume_bonus {
            if !bonus.percent.is_finite() || bonus.percent < 0.0 {
                return Err(RecommendError::InvalidRequest(
                    "costume_bonus.percent must be a non-negative number".into(),
                ));
            }
        }
        if self.area_bonuses.0.values().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(RecommendError::InvalidRequest(
                "area_bonuses must be non-negative numbers".into(),
            ));
        }
        if let Some(field) = self.rules.as_ref().and_then(LiveRules::invalid_field) {
            return Err(RecommendError::InvalidRequest(format!(
                "rules.{field} must be a non-negative number"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotView {
    pub slot: usize,
    pub card_id: CardId,
    pub character: &'static str,
    pub base_power: u32,
    pub bonus_percent: f64,
    pub effective_power: f64,
    pub skill_percent: f64,
    pub skill_score: f64,
}

impl SlotView {
    fn new(slot: &SlotBreakdown, character_id: CharacterId) -> Self {
        Self {
            slot: slot.slot,
            card_id: slot.card_id,
            character: character_name(character_id).unwrap_or("unknown"),
            base_power: slot.base_power,
            bonus_percent: slot.bonus.total_percent(),
            effective_power: slot.effective_power,
            skill_percent: slot.skill_percent,
            skill_score: slot.skill_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedDeck {
    pub rank: usize,
    pub card_ids: Vec<CardId>,
    pub objective: f64,
    pub total_score: f64,
    pub base_score: f64,
    pub skill_score: f64,
    pub event_bonus_percent: f64,
    pub event_points: f64,
    pub efficiency: f64,
    pub slots: Vec<SlotView>,
}

impl RecommendedDeck {
    pub(crate) fn new<F>(rank: usize, deck: &CandidateDeck, character_of: F) -> Self
    where
        F: Fn(CardId) -> CharacterId,
    {
        let breakdown = &deck.breakdown;
        Self {
            rank,
            card_ids: deck.card_ids.clone(),
            objective: deck.objective,
            total_score: deck.total_score,
            base_score: breakdown.base_score,
            skill_score: breakdown.skill_score,
            event_bonus_percent: breakdown.event_bonus_percent,
            event_points: breakdown.event_points,
            efficiency: breakdown.efficiency,
            slots: breakdown
                .slots
                .iter()
                .map(|slot| SlotView::new(slot, character_of(slot.card_id)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendResponse {
    pub status: SearchStatus,
    /// Criterion actually ranked by, after fallbacks.
    pub criterion: RankingCriterion,
    pub planner: &'static str,
    pub decks: Vec<RecommendedDeck>,
    pub nodes_expanded: u64,
    pub elapsed_ms: u64,
}

impl RecommendResponse {
    pub(crate) fn from_outcome<F>(
        outcome: &SearchOutcome,
        criterion: RankingCriterion,
        planner: &'static str,
        character_of: F,
    ) -> Self
    where
        F: Fn(CardId) -> CharacterId,
    {
        Self {
            status: outcome.status,
            criterion,
            planner,
            decks: outcome
                .decks
                .iter()
                .enumerate()
                .map(|(index, deck)| RecommendedDeck::new(index + 1, deck, &character_of))
                .collect(),
            nodes_expanded: outcome.nodes_expanded,
            elapsed_ms: outcome.elapsed.as_millis() as u64,
        }
    }
}
