use crate::model::card::Card;
use crate::model::event::Event;
use crate::model::music::Music;
use crate::model::unit::{CharacterId, Unit};
use core::fmt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveType {
    Solo,
    Multi,
    Auto,
    Cheerful,
    Challenge,
}

impl LiveType {
    pub const ALL: [LiveType; 5] = [
        LiveType::Solo,
        LiveType::Multi,
        LiveType::Auto,
        LiveType::Cheerful,
        LiveType::Challenge,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            LiveType::Solo => "solo",
            LiveType::Multi => "multi",
            LiveType::Auto => "auto",
            LiveType::Cheerful => "cheerful",
            LiveType::Challenge => "challenge",
        }
    }

    /// Challenge lives are single-character decks; everything else forbids repeats.
    pub const fn unique_characters(self) -> bool {
        !matches!(self, LiveType::Challenge)
    }

    pub const fn earns_event_points(self) -> bool {
        !matches!(self, LiveType::Challenge)
    }
}

impl fmt::Display for LiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LiveType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LiveType::ALL
            .iter()
            .copied()
            .find(|lt| lt.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown live type '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingCriterion {
    /// Event points per hour of play.
    Efficiency,
    /// Event points per live.
    Pt,
    #[default]
    Score,
}

impl RankingCriterion {
    pub const fn as_str(self) -> &'static str {
        match self {
            RankingCriterion::Efficiency => "efficiency",
            RankingCriterion::Pt => "pt",
            RankingCriterion::Score => "score",
        }
    }

    /// Point-based criteria need an event and a live type that earns points; solo play has no
    /// efficiency figure. Anything unsupported falls back to score.
    pub fn normalized(self, live_type: LiveType, has_event: bool) -> Self {
        match self {
            RankingCriterion::Score => RankingCriterion::Score,
            _ if !has_event || !live_type.earns_event_points() => RankingCriterion::Score,
            RankingCriterion::Efficiency if live_type == LiveType::Solo => RankingCriterion::Score,
            other => other,
        }
    }
}

impl fmt::Display for RankingCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scoring constants. Values are tunable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveRules {
    /// Flat points granted for finishing a live.
    pub base_event_points: f64,
    /// Score needed for each additional event point.
    pub score_per_event_point: f64,
    /// Lobby/result screen time added to a music's duration for efficiency.
    pub live_interval_secs: f64,
    /// Skill strength in auto lives relative to manual play.
    pub auto_skill_factor: f64,
    pub solo_point_rate: f64,
    pub multi_point_rate: f64,
    pub auto_point_rate: f64,
    pub cheerful_point_rate: f64,
}

impl Default for LiveRules {
    fn default() -> Self {
        Self {
            base_event_points: 100.0,
            score_per_event_point: 20_000.0,
            live_interval_secs: 30.0,
            auto_skill_factor: 0.8,
            solo_point_rate: 1.0,
            multi_point_rate: 1.0,
            auto_point_rate: 1.0,
            cheerful_point_rate: 1.25,
        }
    }
}

impl LiveRules {
    /// Name of the first field that is negative or not a number. Every rule scales a score
    /// term, so the search bound needs them all to be non-negative.
    pub fn invalid_field(&self) -> Option<&'static str> {
        [
            ("base_event_points", self.base_event_points),
            ("score_per_event_point", self.score_per_event_point),
            ("live_interval_secs", self.live_interval_secs),
            ("auto_skill_factor", self.auto_skill_factor),
            ("solo_point_rate", self.solo_point_rate),
            ("multi_point_rate", self.multi_point_rate),
            ("auto_point_rate", self.auto_point_rate),
            ("cheerful_point_rate", self.cheerful_point_rate),
        ]
        .into_iter()
        .find(|(_, value)| !value.is_finite() || *value < 0.0)
        .map(|(name, _)| name)
    }

    pub fn point_rate(&self, live_type: LiveType) -> f64 {
        match live_type {
            LiveType::Solo => self.solo_point_rate,
            LiveType::Multi => self.multi_point_rate,
            LiveType::Auto => self.auto_point_rate,
            LiveType::Cheerful => self.cheerful_point_rate,
            LiveType::Challenge => 0.0,
        }
    }

    pub fn skill_factor(&self, live_type: LiveType) -> f64 {
        match live_type {
            LiveType::Auto => self.auto_skill_factor,
            _ => 1.0,
        }
    }
}

/// Non-event power bonus per unit (area items).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaBonuses(pub BTreeMap<Unit, f64>);

impl AreaBonuses {
    pub fn percent_for(&self, unit: Option<Unit>) -> f64 {
        unit.and_then(|u| self.0.get(&u).copied()).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostumeBonus {
    pub character_ids: Vec<CharacterId>,
    pub percent: f64,
}

impl CostumeBonus {
    pub fn percent_for(&self, character_id: CharacterId) -> f64 {
        if self.character_ids.contains(&character_id) {
            self.percent
        } else {
            0.0
        }
    }
}

/// Inputs to a single optimization run. Immutable once built.
#[derive(Debug, Clone)]
pub struct Context<'a> {
    pub music: &'a Music,
    pub event: Option<&'a Event>,
    pub live_type: LiveType,
    pub challenge_character: Option<CharacterId>,
    pub requested_criterion: RankingCriterion,
    pub area_bonuses: AreaBonuses,
    pub costume_bonus: Option<CostumeBonus>,
    pub rules: LiveRules,
}

impl<'a> Context<'a> {
    pub fn new(music: &'a Music, live_type: LiveType) -> Self {
        Self {
            music,
            event: None,
            live_type,
            challenge_character: None,
            requested_criterion: RankingCriterion::Score,
            area_bonuses: AreaBonuses::default(),
            costume_bonus: None,
            rules: LiveRules::default(),
        }
    }

    pub fn with_event(mut self, event: &'a Event) -> Self {
        self.event = Some(event);
        self
    }

    pub fn with_challenge_character(mut self, character_id: CharacterId) -> Self {
        self.challenge_character = Some(character_id);
        self
    }

    pub fn with_criterion(mut self, criterion: RankingCriterion) -> Self {
        self.requested_criterion = criterion;
        self
    }

    pub fn with_area_bonuses(mut self, area_bonuses: AreaBonuses) -> Self {
        self.area_bonuses = area_bonuses;
        self
    }

    pub fn with_costume_bonus(mut self, costume_bonus: CostumeBonus) -> Self {
        self.costume_bonus = Some(costume_bonus);
        self
    }

    pub fn with_rules(mut self, rules: LiveRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn criterion(&self) -> RankingCriterion {
        self.requested_criterion
            .normalized(self.live_type, self.event.is_some())
    }

    pub fn unique_characters(&self) -> bool {
        self.live_type.unique_characters()
    }

    /// Challenge lives only admit the challenge character's cards.
    pub fn is_eligible(&self, card: &Card) -> bool {
        match (self.live_type, self.challenge_character) {
            (LiveType::Challenge, Some(character_id)) => card.character_id == character_id,
            _ => true,
        }
    }

    pub fn skill_factor(&self) -> f64 {
        self.rules.skill_factor(self.live_type)
    }

    /// First input that would make scores shrink as bonuses or skills grow.
    pub fn invalid_field(&self) -> Option<&'static str> {
        if let Some(field) = self.rules.invalid_field() {
            return Some(field);
        }
        if let Some(field) = self.music.invalid_field() {
            return Some(field);
        }
        if self
            .costume_bonus
            .as_ref()
            .is_some_and(|bonus| !bonus.percent.is_finite() || bonus.percent < 0.0)
        {
            return Some("costume_bonus.percent");
        }
        if self.area_bonuses.0.values().any(|v| !v.is_finite() || *v < 0.0) {
            return Some("area_bonuses");
        }
        None
    }
}
