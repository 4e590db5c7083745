pub mod describe;
pub mod simulator;

pub use describe::format_skill_description;
pub use simulator::{BoostCarry, DeckSkill, SkillContribution, SkillRun, SkillSimulator};

use crate::model::skill::{Skill, SkillEffectType, SkillId};
use serde::Serialize;
use std::fmt;

/// Same-unit cards counted by `score_up_unit_count` skills.
pub const UNIT_COUNT_CAP: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkillError {
    InvalidLevel {
        skill_id: SkillId,
        level: u8,
        available: Vec<u8>,
    },
}

impl fmt::Display for SkillError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkillError::InvalidLevel {
                skill_id,
                level,
                available,
            } => write!(
                f,
                "invalid level {level} for skill {skill_id} (defined levels: {available:?})"
            ),
        }
    }
}

impl std::error::Error for SkillError {}

/// A skill flattened to the numbers the simulator needs at one level.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SkillProfile {
    pub skill_id: SkillId,
    pub level: u8,
    pub score_up: f64,
    pub unit_member_bonus: f64,
    pub boost_next: f64,
    pub boost_following: f64,
}

impl SkillProfile {
    pub fn at_level(skill: &Skill, level: u8) -> Result<Self, SkillError> {
        let mut profile = SkillProfile {
            skill_id: skill.id,
            level,
            ..SkillProfile::default()
        };

        for effect in &skill.skill_effects {
            let detail = effect
                .detail(level)
                .ok_or_else(|| SkillError::InvalidLevel {
                    skill_id: skill.id,
                    level,
                    available: skill.levels(),
                })?;
            let value = detail.activate_effect_value;
            match effect.skill_effect_type {
                SkillEffectType::ScoreUp
                | SkillEffectType::ScoreUpConditionLife
                | SkillEffectType::ScoreUpKeep => profile.score_up += value,
                SkillEffectType::ScoreUpUnitCount => {
                    profile.score_up += value;
                    profile.unit_member_bonus += effect.enhance_value().unwrap_or(0.0);
                }
                SkillEffectType::BoostNext => profile.boost_next += value,
                SkillEffectType::BoostFollowing => profile.boost_following += value,
                SkillEffectType::LifeRecovery | SkillEffectType::JudgmentUp => {}
            }
        }

        Ok(profile)
    }

    /// Score-up percentage of the skill itself, before any carried boost.
    pub fn own_percent(&self, same_unit_cards: usize) -> f64 {
        self.score_up + self.unit_member_bonus * same_unit_cards.min(UNIT_COUNT_CAP) as f64
    }

    pub fn is_order_sensitive(&self) -> bool {
        self.boost_next > 0.0 || self.boost_following > 0.0
    }

    /// Most this card can add to a deck's summed activation percentage, wherever it sits.
    /// The leader fires twice with an encore; a boost-next reaches at most one activation and a
    /// boost-following at most every other one.
    pub fn upper_bound(&self, deck_size: usize, activations: usize) -> f64 {
        let own = self.own_percent(deck_size);
        let own_activations = if activations > deck_size { 2.0 } else { 1.0 };
        let reach = activations.saturating_sub(1) as f64;
        let next = if activations > 1 { self.boost_next } else { 0.0 };
        own * own_activations + next + self.boost_following * reach
    }
}
