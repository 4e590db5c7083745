//! Deck search: candidate preparation, branch-and-bound, greedy baseline and ranking.

pub mod arrange;
pub mod budget;
pub mod greedy;
pub mod optimizer;
pub mod ranking;

pub use arrange::{Arrangement, best_arrangement};
pub use budget::SearchBudget;
pub use greedy::greedy;
pub use optimizer::search;
pub use ranking::{TopK, compare_decks, rank_decks};

use crate::bonus::BonusResolver;
use crate::catalog::{CardCatalog, CatalogError};
use crate::context::Context;
use crate::model::card::CardId;
use crate::model::unit::CharacterId;
use crate::roster::{RosterEntry, dedup_roster};
use crate::score::{DeckMember, ResolveError, ScoreBreakdown, score_deck};
use crate::skill::SkillError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_DECK_SIZE: usize = 5;
pub const MAX_DECK_SIZE: usize = 6;
pub const DEFAULT_TOP_K: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Complete,
    /// The budget ran out; decks are the best found before it did.
    PartialTimeout,
    /// Fewer eligible cards (or distinct characters) than deck slots.
    InsufficientRoster,
}

impl SearchStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            SearchStatus::Complete => "complete",
            SearchStatus::PartialTimeout => "partial_timeout",
            SearchStatus::InsufficientRoster => "insufficient_roster",
        }
    }
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConstraints {
    pub deck_size: usize,
    pub unique_characters: bool,
    pub top_k: usize,
    pub budget: SearchBudget,
}

impl Default for SearchConstraints {
    fn default() -> Self {
        Self {
            deck_size: DEFAULT_DECK_SIZE,
            unique_characters: true,
            top_k: DEFAULT_TOP_K,
            budget: SearchBudget::UNLIMITED,
        }
    }
}

impl SearchConstraints {
    pub fn for_context(ctx: &Context<'_>) -> Self {
        Self {
            unique_characters: ctx.unique_characters(),
            ..Self::default()
        }
    }

    pub fn with_deck_size(mut self, deck_size: usize) -> Self {
        self.deck_size = deck_size;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if self.deck_size == 0 || self.deck_size > MAX_DECK_SIZE {
            return Err(SearchError::InvalidDeckSize(self.deck_size));
        }
        if self.top_k == 0 {
            return Err(SearchError::InvalidTopK);
        }
        Ok(())
    }

    /// Checks the constraints together with the context they will run under.
    pub fn validate_for(&self, ctx: &Context<'_>) -> Result<(), SearchError> {
        self.validate()?;
        match ctx.invalid_field() {
            Some(field) => Err(SearchError::InvalidContext(field)),
            None => Ok(()),
        }
    }
}

/// A finished deck. `card_ids[i]` activates at slot `i`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateDeck {
    pub card_ids: Vec<CardId>,
    pub objective: f64,
    pub total_score: f64,
    pub breakdown: ScoreBreakdown,
}

impl CandidateDeck {
    /// Re-scores `members` in the given order.
    pub fn from_members(members: &[DeckMember], ctx: &Context<'_>) -> Self {
        let breakdown = score_deck(members, ctx);
        Self {
            card_ids: members.iter().map(|m| m.card_id).collect(),
            objective: breakdown.objective,
            total_score: breakdown.total_score,
            breakdown,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub status: SearchStatus,
    pub decks: Vec<CandidateDeck>,
    pub nodes_expanded: u64,
    /// Sibling loops cut short by the bound.
    pub pruned: u64,
    pub elapsed: Duration,
}

impl SearchOutcome {
    pub(crate) fn insufficient(elapsed: Duration) -> Self {
        Self {
            status: SearchStatus::InsufficientRoster,
            decks: Vec::new(),
            nodes_expanded: 0,
            pruned: 0,
            elapsed,
        }
    }

    pub fn best(&self) -> Option<&CandidateDeck> {
        self.decks.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    InvalidDeckSize(usize),
    InvalidTopK,
    /// A rule, music timing or bonus that is negative or not a number.
    InvalidContext(&'static str),
    Catalog(CatalogError),
    Skill(SkillError),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::InvalidDeckSize(size) => {
                write!(f, "deck size {size} is outside 1..={MAX_DECK_SIZE}")
            }
            SearchError::InvalidTopK => f.write_str("top_k must be at least 1"),
            SearchError::InvalidContext(field) => {
                write!(f, "{field} must be a non-negative number")
            }
            SearchError::Catalog(err) => err.fmt(f),
            SearchError::Skill(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for SearchError {}

impl From<ResolveError> for SearchError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Catalog(err) => SearchError::Catalog(err),
            ResolveError::Skill(err) => SearchError::Skill(err),
        }
    }
}

/// A roster card resolved for the search, with the per-card terms of the bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Candidate {
    pub member: DeckMember,
    pub power: f64,
    pub skill_bound: f64,
    pub event_bonus: f64,
}

/// Resolves the roster and sorts eligible cards by effective power desc, then id asc. Unknown
/// cards and undefined skill levels fail the whole request.
pub(crate) fn prepare_candidates(
    catalog: &CardCatalog,
    roster: &[RosterEntry],
    ctx: &Context<'_>,
    deck_size: usize,
) -> Result<Vec<Candidate>, SearchError> {
    let activations = ctx.music.activations(deck_size);
    let mut candidates = Vec::with_capacity(roster.len());
    let mut bonuses = BonusResolver::new(ctx);
    for entry in dedup_roster(roster) {
        let card = catalog.lookup(entry.card_id).map_err(SearchError::Catalog)?;
        if !ctx.is_eligible(card) {
            continue;
        }
        let member = DeckMember::resolve_with(catalog, &entry, &mut bonuses)?;
        candidates.push(Candidate {
            member,
            power: member.effective_power(),
            skill_bound: member.skill.upper_bound(deck_size, activations).max(0.0),
            event_bonus: member.bonus.event_bonus_percent.max(0.0),
        });
    }
    candidates.sort_by(|a, b| {
        b.power
            .total_cmp(&a.power)
            .then_with(|| a.member.card_id.cmp(&b.member.card_id))
    });
    Ok(candidates)
}

pub(crate) fn roster_is_sufficient(
    candidates: &[Candidate],
    deck_size: usize,
    unique_characters: bool,
) -> bool {
    if candidates.len() < deck_size {
        return false;
    }
    if !unique_characters {
        return true;
    }
    let distinct: BTreeSet<CharacterId> = candidates
        .iter()
        .map(|c| c.member.character_id)
        .collect();
    distinct.len() >= deck_size
}

/// Best ordering of `members`, fully re-scored.
pub(crate) fn finish_deck(members: &[DeckMember], ctx: &Context<'_>) -> Option<CandidateDeck> {
    best_arrangement(members, ctx).map(|arrangement| {
        CandidateDeck::from_members(&arrangement.members, ctx)
    })
}
