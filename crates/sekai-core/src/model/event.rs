use crate::model::attribute::Attribute;
use crate::model::card::CardId;
use crate::model::rarity::Rarity;
use crate::model::unit::{CharacterId, Unit};
use serde::{Deserialize, Serialize};

pub type EventId = u32;

pub const MAX_MASTER_RANK: u8 = 5;

/// Percentages granted by an event. Defaults follow the usual event rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventBonusRates {
    pub character_percent: f64,
    pub attribute_percent: f64,
    pub limited_card_percent: f64,
    /// Per master-rank step, indexed by rarity.
    pub master_rank_step_percent: [f64; 5],
}

impl Default for EventBonusRates {
    fn default() -> Self {
        Self {
            character_percent: 25.0,
            attribute_percent: 25.0,
            limited_card_percent: 20.0,
            master_rank_step_percent: [0.5, 1.0, 2.0, 2.5, 2.5],
        }
    }
}

impl EventBonusRates {
    pub fn master_rank_percent(&self, rarity: Rarity, master_rank: u8) -> f64 {
        self.master_rank_step_percent[rarity.index()] * f64::from(master_rank.min(MAX_MASTER_RANK))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCharacterBonus {
    pub character_id: CharacterId,
    /// For virtual singers: the support unit the bonus is restricted to.
    #[serde(default)]
    pub unit: Option<Unit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub name: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub bonus_characters: Vec<EventCharacterBonus>,
    #[serde(default)]
    pub bonus_attribute: Option<Attribute>,
    #[serde(default)]
    pub limited_card_ids: Vec<CardId>,
    #[serde(default)]
    pub rates: EventBonusRates,
}

impl Event {
    /// Matches a card's character (and, for virtual singers with a unit restriction, its
    /// support unit) against the bonus character list.
    pub fn matches_character(&self, character_id: CharacterId, card_unit: Option<Unit>) -> bool {
        self.bonus_characters.iter().any(|bonus| {
            bonus.character_id == character_id
                && match bonus.unit {
                    Some(required) => card_unit == Some(required),
                    None => true,
                }
        })
    }

    pub fn matches_attribute(&self, attribute: Attribute) -> bool {
        self.bonus_attribute == Some(attribute)
    }

    pub fn is_limited_card(&self, card_id: CardId) -> bool {
        self.limited_card_ids.contains(&card_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> Event {
        Event {
            id: 120,
            name: "Test".into(),
            event_type: "marathon".into(),
            bonus_characters: vec![
                EventCharacterBonus {
                    character_id: 17,
                    unit: None,
                },
                EventCharacterBonus {
                    character_id: 21,
                    unit: Some(Unit::Nightcord),
                },
            ],
            bonus_attribute: Some(Attribute::Pure),
            limited_card_ids: vec![900],
            rates: EventBonusRates::default(),
        }
    }

    #[test]
    fn virtual_singer_match_requires_unit() {
        let event = event();
        assert!(event.matches_character(21, Some(Unit::Nightcord)));
        assert!(!event.matches_character(21, Some(Unit::LeoNeed)));
        assert!(!event.matches_character(21, Some(Unit::VirtualSinger)));
        assert!(event.matches_character(17, Some(Unit::Nightcord)));
        assert!(!event.matches_character(18, Some(Unit::Nightcord)));
    }

    #[test]
    fn master_rank_is_capped() {
        let rates = EventBonusRates::default();
        assert_eq!(rates.master_rank_percent(Rarity::Four, 2), 5.0);
        assert_eq!(rates.master_rank_percent(Rarity::Four, 9), 12.5);
        assert_eq!(rates.master_rank_percent(Rarity::One, 0), 0.0);
    }

    #[test]
    fn rates_default_when_absent() {
        let event: Event = serde_json::from_str(r#"{"id": 1, "name": "x"}"#).unwrap();
        assert_eq!(event.rates, EventBonusRates::default());
        assert!(event.bonus_characters.is_empty());
    }
}
