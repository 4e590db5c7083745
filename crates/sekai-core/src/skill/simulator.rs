//! Left-to-right skill activation over a deck.
//!
//! Boosts are carried in an explicit [`BoostCarry`] value threaded through the fold, so a
//! deck's evaluation depends only on the deck itself.

use super::SkillProfile;
use crate::context::Context;
use crate::model::unit::Unit;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeckSkill {
    pub profile: SkillProfile,
    pub unit: Option<Unit>,
}

/// Boost percentage waiting to be applied to upcoming activations.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoostCarry {
    pub next: f64,
    pub following: f64,
}

impl BoostCarry {
    pub fn received(self) -> f64 {
        self.next + self.following
    }

    /// Carry after `profile` fires: a boost-next replaces the pending one-shot boost, a
    /// boost-following accumulates.
    pub fn advance(self, profile: &SkillProfile) -> BoostCarry {
        BoostCarry {
            next: profile.boost_next,
            following: self.following + profile.boost_following,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SkillContribution {
    pub slot: usize,
    pub encore: bool,
    pub own_percent: f64,
    pub received_boost: f64,
    pub effective_percent: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkillRun {
    pub activations: Vec<SkillContribution>,
}

impl SkillRun {
    pub fn total_percent(&self) -> f64 {
        self.activations.iter().map(|a| a.effective_percent).sum()
    }

    pub fn total_score(&self) -> f64 {
        self.activations.iter().map(|a| a.score).sum()
    }

    /// Score from every activation of `slot` (two for the leader when there is an encore).
    pub fn slot_score(&self, slot: usize) -> f64 {
        self.activations
            .iter()
            .filter(|a| a.slot == slot)
            .map(|a| a.score)
            .sum()
    }

    pub fn slot_percent(&self, slot: usize) -> f64 {
        self.activations
            .iter()
            .filter(|a| a.slot == slot)
            .map(|a| a.effective_percent)
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillSimulator {
    base_score: f64,
    note_ratio: f64,
    skill_factor: f64,
    encore: bool,
}

impl SkillSimulator {
    pub fn new(base_score: f64, note_ratio: f64, skill_factor: f64, encore: bool) -> Self {
        Self {
            base_score,
            note_ratio,
            skill_factor,
            encore,
        }
    }

    pub fn for_context(base_score: f64, ctx: &Context<'_>) -> Self {
        Self::new(
            base_score,
            ctx.music.skill_note_ratio,
            ctx.skill_factor(),
            ctx.music.encore,
        )
    }

    /// Score produced by one activation at `percent`.
    pub fn score_for(&self, percent: f64) -> f64 {
        self.base_score * percent / 100.0 * self.note_ratio * self.skill_factor
    }

    /// Multiplier on base score for a deck whose activations sum to `total_percent`.
    pub fn score_multiplier(&self, total_percent: f64) -> f64 {
        1.0 + total_percent / 100.0 * self.note_ratio * self.skill_factor
    }

    pub fn activation_count(&self, deck_len: usize) -> usize {
        if self.encore && deck_len > 0 {
            deck_len + 1
        } else {
            deck_len
        }
    }

    fn fold<F>(&self, deck: &[DeckSkill], mut visit: F)
    where
        F: FnMut(usize, bool, f64, f64),
    {
        let counts = same_unit_counts(deck);
        let encore = if self.encore && !deck.is_empty() {
            Some(0)
        } else {
            None
        };
        let order = (0..deck.len())
            .map(|slot| (slot, false))
            .chain(encore.map(|slot| (slot, true)));

        let mut carry = BoostCarry::default();
        for (slot, is_encore) in order {
            let member = &deck[slot];
            let own = member.profile.own_percent(counts[slot]);
            visit(slot, is_encore, own, carry.received());
            carry = carry.advance(&member.profile);
        }
    }

    pub fn run(&self, deck: &[DeckSkill]) -> SkillRun {
        let mut activations = Vec::with_capacity(self.activation_count(deck.len()));
        self.fold(deck, |slot, encore, own, received| {
            let effective = own + received;
            activations.push(SkillContribution {
                slot,
                encore,
                own_percent: own,
                received_boost: received,
                effective_percent: effective,
                score: self.score_for(effective),
            });
        });
        SkillRun { activations }
    }

    /// Summed effective percentage without materializing the run.
    pub fn total_percent(&self, deck: &[DeckSkill]) -> f64 {
        let mut total = 0.0;
        self.fold(deck, |_, _, own, received| total += own + received);
        total
    }

    /// Contribution of the first activation at `slot_index`.
    pub fn evaluate(&self, deck: &[DeckSkill], slot_index: usize) -> Option<SkillContribution> {
        if slot_index >= deck.len() {
            return None;
        }
        self.run(deck)
            .activations
            .into_iter()
            .find(|a| a.slot == slot_index && !a.encore)
    }
}

fn same_unit_counts(deck: &[DeckSkill]) -> Vec<usize> {
    deck.iter()
        .map(|member| match member.unit {
            Some(unit) => deck.iter().filter(|m| m.unit == Some(unit)).count(),
            None => 1,
        })
        .collect()
}
