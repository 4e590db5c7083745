//! Deck scoring and the standalone reference evaluator.
//!
//! `total = Σ base_power × bonus_multiplier + Σ activation skill scores`, where each activation
//! scores `base_score × percent / 100 × skill_note_ratio × live skill factor`.

use crate::bonus::{BonusFactor, BonusResolver};
use crate::catalog::{CardCatalog, CatalogError};
use crate::context::{Context, RankingCriterion};
use crate::model::card::{Card, CardId};
use crate::model::unit::{CharacterId, Unit};
use crate::roster::RosterEntry;
use crate::skill::{DeckSkill, SkillError, SkillProfile, SkillSimulator};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    Catalog(CatalogError),
    Skill(SkillError),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Catalog(err) => err.fmt(f),
            ResolveError::Skill(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for ResolveError {}

impl From<CatalogError> for ResolveError {
    fn from(err: CatalogError) -> Self {
        ResolveError::Catalog(err)
    }
}

impl From<SkillError> for ResolveError {
    fn from(err: SkillError) -> Self {
        ResolveError::Skill(err)
    }
}

/// An owned card with its bonus and skill resolved for one context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeckMember {
    pub card_id: CardId,
    pub character_id: CharacterId,
    pub unit: Option<Unit>,
    pub base_power: u32,
    pub bonus: BonusFactor,
    pub skill: SkillProfile,
}

impl DeckMember {
    pub fn new(card: &Card, bonus: BonusFactor, skill: SkillProfile) -> Self {
        Self {
            card_id: card.id,
            character_id: card.character_id,
            unit: card.unit(),
            base_power: card.base_power(),
            bonus,
            skill,
        }
    }

    pub fn resolve(
        catalog: &CardCatalog,
        entry: &RosterEntry,
        ctx: &Context<'_>,
    ) -> Result<Self, ResolveError> {
        Self::resolve_with(catalog, entry, &mut BonusResolver::new(ctx))
    }

    /// Like [`DeckMember::resolve`], reusing bonuses already resolved for the request.
    pub fn resolve_with(
        catalog: &CardCatalog,
        entry: &RosterEntry,
        bonuses: &mut BonusResolver<'_, '_>,
    ) -> Result<Self, ResolveError> {
        let card = catalog.lookup(entry.card_id)?;
        let skill = catalog.skill_of(card)?;
        let profile = SkillProfile::at_level(skill, entry.skill_level)?;
        Ok(Self::new(card, bonuses.resolve(card, entry), profile))
    }

    pub fn effective_power(&self) -> f64 {
        self.bonus.apply(self.base_power)
    }

    pub fn deck_skill(&self) -> DeckSkill {
        DeckSkill {
            profile: self.skill,
            unit: self.unit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotBreakdown {
    pub slot: usize,
    pub card_id: CardId,
    pub base_power: u32,
    pub bonus: BonusFactor,
    pub bonus_multiplier: f64,
    pub effective_power: f64,
    pub skill_percent: f64,
    pub skill_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub slots: Vec<SlotBreakdown>,
    pub base_score: f64,
    pub bonus_multiplier: f64,
    pub skill_percent: f64,
    pub skill_score: f64,
    pub total_score: f64,
    pub event_bonus_percent: f64,
    pub event_points: f64,
    pub efficiency: f64,
    pub criterion: RankingCriterion,
    pub objective: f64,
}

/// Event points for one live; zero when the context earns none.
pub fn event_points(ctx: &Context<'_>, total_score: f64, event_bonus_percent: f64) -> f64 {
    if ctx.event.is_none() || !ctx.live_type.earns_event_points() {
        return 0.0;
    }
    let rules = &ctx.rules;
    let score_points = if rules.score_per_event_point > 0.0 {
        (total_score / rules.score_per_event_point).floor()
    } else {
        0.0
    };
    let raw = (rules.base_event_points + score_points) * (100.0 + event_bonus_percent) / 100.0;
    (raw * rules.point_rate(ctx.live_type)).floor()
}

/// Event points per hour of repeated play.
pub fn efficiency(ctx: &Context<'_>, points: f64) -> f64 {
    let cycle = ctx.music.duration_secs + ctx.rules.live_interval_secs;
    if cycle <= 0.0 {
        return 0.0;
    }
    points * 3600.0 / cycle
}

/// Value the search maximizes. Non-decreasing in both score and event bonus.
pub fn objective_value(ctx: &Context<'_>, total_score: f64, event_bonus_percent: f64) -> f64 {
    match ctx.criterion() {
        RankingCriterion::Score => total_score,
        RankingCriterion::Pt => event_points(ctx, total_score, event_bonus_percent),
        RankingCriterion::Efficiency => {
            efficiency(ctx, event_points(ctx, total_score, event_bonus_percent))
        }
    }
}

/// Re-score an ordered deck from scratch. Slot 0 is the leader.
pub fn score_deck(deck: &[DeckMember], ctx: &Context<'_>) -> ScoreBreakdown {
    let raw_power: f64 = deck.iter().map(|m| f64::from(m.base_power)).sum();
    let base_score: f64 = deck.iter().map(DeckMember::effective_power).sum();
    let skills: Vec<DeckSkill> = deck.iter().map(DeckMember::deck_skill).collect();
    let simulator = SkillSimulator::for_context(base_score, ctx);
    let run = simulator.run(&skills);

    let slots = deck
        .iter()
        .enumerate()
        .map(|(slot, member)| SlotBreakdown {
            slot,
            card_id: member.card_id,
            base_power: member.base_power,
            bonus: member.bonus,
            bonus_multiplier: member.bonus.multiplier(),
            effective_power: member.effective_power(),
            skill_percent: run.slot_percent(slot),
            skill_score: run.slot_score(slot),
        })
        .collect();

    let skill_score = run.total_score();
    let total_score = base_score + skill_score;
    let event_bonus_percent: f64 = deck.iter().map(|m| m.bonus.event_bonus_percent).sum();
    let points = event_points(ctx, total_score, event_bonus_percent);

    ScoreBreakdown {
        slots,
        base_score,
        bonus_multiplier: if raw_power > 0.0 {
            base_score / raw_power
        } else {
            1.0
        },
        skill_percent: run.total_percent(),
        skill_score,
        total_score,
        event_bonus_percent,
        event_points: points,
        efficiency: efficiency(ctx, points),
        criterion: ctx.criterion(),
        objective: objective_value(ctx, total_score, event_bonus_percent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::LiveType;
    use crate::model::event::Event;
    use crate::model::music::Music;

    fn music(encore: bool) -> Music {
        Music {
            id: 1,
            title: "m".into(),
            note_count: 1000,
            duration_secs: 90.0,
            skill_note_ratio: 0.1,
            encore,
            lyricist: String::new(),
            composer: String::new(),
        }
    }

    fn member(card_id: CardId, base_power: u32, event_bonus: f64, score_up: f64) -> DeckMember {
        DeckMember {
            card_id,
            character_id: card_id,
            unit: Unit::of_character(card_id),
            base_power,
            bonus: BonusFactor {
                event_bonus_percent: event_bonus,
                ..BonusFactor::NONE
            },
            skill: SkillProfile {
                score_up,
                ..SkillProfile::default()
            },
        }
    }

    #[test]
    fn total_is_power_plus_skill() {
        let music = music(false);
        let ctx = Context::new(&music, LiveType::Multi);
        let deck = [member(1, 10_000, 0.0, 100.0), member(5, 20_000, 0.0, 50.0)];
        let breakdown = score_deck(&deck, &ctx);
        assert_eq!(breakdown.base_score, 30_000.0);
        // (100 + 50)% of 30k over 10% of the notes
        assert!((breakdown.skill_score - 4_500.0).abs() < 1e-6);
        assert!((breakdown.total_score - 34_500.0).abs() < 1e-6);
        assert_eq!(breakdown.objective, breakdown.total_score);
        let slot_sum: f64 = breakdown
            .slots
            .iter()
            .map(|s| s.effective_power + s.skill_score)
            .sum();
        assert!((slot_sum - breakdown.total_score).abs() < 1e-6);
    }

    #[test]
    fn encore_counts_leader_twice() {
        let music = music(true);
        let ctx = Context::new(&music, LiveType::Multi);
        let deck = [member(1, 10_000, 0.0, 100.0), member(5, 10_000, 0.0, 50.0)];
        let breakdown = score_deck(&deck, &ctx);
        assert_eq!(breakdown.skill_percent, 250.0);
        assert_eq!(breakdown.slots[0].skill_percent, 200.0);
    }

    #[test]
    fn event_points_use_deck_event_bonus() {
        let music = music(false);
        let event: Event = serde_json::from_str(r#"{"id": 1, "name": "e"}"#).unwrap();
        let ctx = Context::new(&music, LiveType::Multi)
            .with_event(&event)
            .with_criterion(RankingCriterion::Pt);
        // 100 + floor(1_000_000 / 20_000) = 150, times 1.5
        assert_eq!(event_points(&ctx, 1_000_000.0, 50.0), 225.0);
        let eff = efficiency(&ctx, 225.0);
        assert!((eff - 225.0 * 30.0).abs() < 1e-9);

        let deck = [member(1, 10_000, 25.0, 0.0), member(5, 10_000, 25.0, 0.0)];
        let breakdown = score_deck(&deck, &ctx);
        assert_eq!(breakdown.event_bonus_percent, 50.0);
        assert_eq!(breakdown.criterion, RankingCriterion::Pt);
        assert_eq!(breakdown.objective, breakdown.event_points);
        assert_eq!(breakdown.event_points, (100.0f64 * 1.5).floor());
    }

    #[test]
    fn challenge_lives_earn_no_points() {
        let music = music(false);
        let event: Event = serde_json::from_str(r#"{"id": 1, "name": "e"}"#).unwrap();
        let ctx = Context::new(&music, LiveType::Challenge).with_event(&event);
        assert_eq!(event_points(&ctx, 2_000_000.0, 100.0), 0.0);
    }
}
