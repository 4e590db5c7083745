use crate::model::attribute::Attribute;
use crate::model::rarity::Rarity;
use crate::model::unit::{CharacterId, Unit};
use core::fmt;
use serde::{Deserialize, Serialize};

pub type CardId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CardPower {
    pub performance: u32,
    pub technique: u32,
    pub stamina: u32,
}

impl CardPower {
    pub const fn new(performance: u32, technique: u32, stamina: u32) -> Self {
        Self {
            performance,
            technique,
            stamina,
        }
    }

    pub const fn total(self) -> u32 {
        self.performance + self.technique + self.stamina
    }
}

/// Static card record from the master data. Never mutated after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub character_id: CharacterId,
    #[serde(rename = "cardRarityType")]
    pub rarity: Rarity,
    #[serde(rename = "attr")]
    pub attribute: Attribute,
    pub power: CardPower,
    pub skill_id: u32,
    #[serde(default)]
    pub support_unit: Option<Unit>,
    #[serde(default)]
    pub prefix: String,
}

impl Card {
    pub fn base_power(&self) -> u32 {
        self.power.total()
    }

    /// Unit the card counts toward: the support unit for virtual singers, otherwise the
    /// character's home unit.
    pub fn unit(&self) -> Option<Unit> {
        self.support_unit
            .or_else(|| Unit::of_character(self.character_id))
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} ({} {} c{})",
            self.id, self.rarity, self.attribute, self.character_id
        )
    }
}
