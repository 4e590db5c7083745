use core::fmt;
use serde::{Deserialize, Serialize};

/// Card rarity as it appears in the master data (`cardRarityType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Rarity {
    #[serde(rename = "rarity_1")]
    One = 0,
    #[serde(rename = "rarity_2")]
    Two = 1,
    #[serde(rename = "rarity_3")]
    Three = 2,
    #[serde(rename = "rarity_4")]
    Four = 3,
    #[serde(rename = "rarity_birthday")]
    Birthday = 4,
}

impl Rarity {
    pub const ALL: [Rarity; 5] = [
        Rarity::One,
        Rarity::Two,
        Rarity::Three,
        Rarity::Four,
        Rarity::Birthday,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Star count shown on the card frame; birthday cards display as four stars.
    pub const fn stars(self) -> u8 {
        match self {
            Rarity::One => 1,
            Rarity::Two => 2,
            Rarity::Three => 3,
            Rarity::Four | Rarity::Birthday => 4,
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rarity::Birthday => f.write_str("birthday"),
            other => write!(f, "{}*", other.stars()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Rarity;

    #[test]
    fn birthday_displays_separately() {
        assert_eq!(Rarity::Birthday.to_string(), "birthday");
        assert_eq!(Rarity::Three.to_string(), "3*");
        assert_eq!(Rarity::Birthday.stars(), 4);
    }

    #[test]
    fn parses_card_rarity_type() {
        let rarity: Rarity = serde_json::from_str("\"rarity_birthday\"").unwrap();
        assert_eq!(rarity, Rarity::Birthday);
        let rarity: Rarity = serde_json::from_str("\"rarity_2\"").unwrap();
        assert_eq!(rarity, Rarity::Two);
    }
}
