use crate::model::card::CardId;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SKILL_LEVEL: u8 = 1;

fn default_skill_level() -> u8 {
    DEFAULT_SKILL_LEVEL
}

/// One owned card. A bare card id deserializes to an entry with default levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RosterEntryRepr")]
pub struct RosterEntry {
    pub card_id: CardId,
    pub skill_level: u8,
    pub master_rank: u8,
}

impl RosterEntry {
    pub const fn new(card_id: CardId) -> Self {
        Self {
            card_id,
            skill_level: DEFAULT_SKILL_LEVEL,
            master_rank: 0,
        }
    }

    pub const fn with_skill_level(mut self, skill_level: u8) -> Self {
        self.skill_level = skill_level;
        self
    }

    pub const fn with_master_rank(mut self, master_rank: u8) -> Self {
        self.master_rank = master_rank;
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RosterEntryRepr {
    Id(CardId),
    Full {
        card_id: CardId,
        #[serde(default = "default_skill_level")]
        skill_level: u8,
        #[serde(default)]
        master_rank: u8,
    },
}

impl From<RosterEntryRepr> for RosterEntry {
    fn from(repr: RosterEntryRepr) -> Self {
        match repr {
            RosterEntryRepr::Id(card_id) => RosterEntry::new(card_id),
            RosterEntryRepr::Full {
                card_id,
                skill_level,
                master_rank,
            } => RosterEntry {
                card_id,
                skill_level,
                master_rank,
            },
        }
    }
}

/// Drop repeated card ids, keeping the first entry for each id.
pub fn dedup_roster(roster: &[RosterEntry]) -> Vec<RosterEntry> {
    let mut seen = std::collections::HashSet::with_capacity(roster.len());
    roster
        .iter()
        .copied()
        .filter(|entry| seen.insert(entry.card_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_ids_and_full_entries_both_parse() {
        let roster: Vec<RosterEntry> = serde_json::from_str(
            r#"[12, {"card_id": 13, "skill_level": 4}, {"card_id": 14, "master_rank": 3}]"#,
        )
        .unwrap();
        assert_eq!(roster[0], RosterEntry::new(12));
        assert_eq!(roster[1], RosterEntry::new(13).with_skill_level(4));
        assert_eq!(roster[2], RosterEntry::new(14).with_master_rank(3));
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let roster = vec![
            RosterEntry::new(5).with_skill_level(2),
            RosterEntry::new(6),
            RosterEntry::new(5).with_skill_level(4),
        ];
        let unique = dedup_roster(&roster);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].skill_level, 2);
    }
}
