use serde::{Deserialize, Serialize};

pub type SkillId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillEffectType {
    ScoreUp,
    ScoreUpConditionLife,
    ScoreUpKeep,
    /// Value plus `enhance` for every deck card of the skill owner's unit.
    ScoreUpUnitCount,
    LifeRecovery,
    JudgmentUp,
    /// Adds the value to the score-up percentage of the next activation.
    BoostNext,
    /// Adds the value to the score-up percentage of every later activation.
    BoostFollowing,
}

impl SkillEffectType {
    pub const fn is_order_sensitive(self) -> bool {
        matches!(self, SkillEffectType::BoostNext | SkillEffectType::BoostFollowing)
    }

    pub const fn scores(self) -> bool {
        matches!(
            self,
            SkillEffectType::ScoreUp
                | SkillEffectType::ScoreUpConditionLife
                | SkillEffectType::ScoreUpKeep
                | SkillEffectType::ScoreUpUnitCount
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillEffectDetail {
    pub level: u8,
    #[serde(default)]
    pub activate_effect_duration: f64,
    pub activate_effect_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillEnhance {
    pub activate_effect_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillEffect {
    pub id: u32,
    pub skill_effect_type: SkillEffectType,
    pub skill_effect_details: Vec<SkillEffectDetail>,
    #[serde(default)]
    pub skill_enhance: Option<SkillEnhance>,
}

impl SkillEffect {
    /// Exact table lookup; levels are never interpolated.
    pub fn detail(&self, level: u8) -> Option<&SkillEffectDetail> {
        self.skill_effect_details.iter().find(|d| d.level == level)
    }

    pub fn enhance_value(&self) -> Option<f64> {
        self.skill_enhance.map(|e| e.activate_effect_value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: SkillId,
    #[serde(default)]
    pub description: String,
    pub skill_effects: Vec<SkillEffect>,
}

impl Skill {
    pub fn effect(&self, effect_id: u32) -> Option<&SkillEffect> {
        self.skill_effects.iter().find(|e| e.id == effect_id)
    }

    /// Levels defined by every effect of the skill.
    pub fn levels(&self) -> Vec<u8> {
        let mut levels: Vec<u8> = match self.skill_effects.first() {
            Some(first) => first.skill_effect_details.iter().map(|d| d.level).collect(),
            None => return Vec::new(),
        };
        levels.retain(|level| self.skill_effects.iter().all(|e| e.detail(*level).is_some()));
        levels.sort_unstable();
        levels.dedup();
        levels
    }

    pub fn max_level(&self) -> Option<u8> {
        self.levels().last().copied()
    }

    pub fn is_order_sensitive(&self) -> bool {
        self.skill_effects
            .iter()
            .any(|e| e.skill_effect_type.is_order_sensitive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SKILL_JSON: &str = r#"{
        "id": 12,
        "description": "Score +{{1;v}}% for {{1;d}} seconds",
        "skillEffects": [
            {
                "id": 1,
                "skillEffectType": "score_up",
                "skillEffectDetails": [
                    {"level": 1, "activateEffectDuration": 5, "activateEffectValue": 60},
                    {"level": 2, "activateEffectDuration": 5, "activateEffectValue": 70},
                    {"level": 3, "activateEffectDuration": 5, "activateEffectValue": 80}
                ]
            },
            {
                "id": 2,
                "skillEffectType": "boost_next",
                "skillEffectDetails": [
                    {"level": 1, "activateEffectValue": 10},
                    {"level": 2, "activateEffectValue": 15}
                ],
                "skillEnhance": {"activateEffectValue": 3}
            }
        ]
    }"#;

    #[test]
    fn parses_master_data_skill() {
        let skill: Skill = serde_json::from_str(SKILL_JSON).unwrap();
        assert_eq!(skill.skill_effects.len(), 2);
        assert_eq!(skill.effect(2).unwrap().enhance_value(), Some(3.0));
        assert_eq!(skill.effect(1).unwrap().detail(3).unwrap().activate_effect_value, 80.0);
        assert!(skill.effect(1).unwrap().detail(4).is_none());
    }

    #[test]
    fn levels_are_the_intersection_across_effects() {
        let skill: Skill = serde_json::from_str(SKILL_JSON).unwrap();
        assert_eq!(skill.levels(), vec![1, 2]);
        assert_eq!(skill.max_level(), Some(2));
        assert!(skill.is_order_sensitive());
    }
}
