use core::fmt;
use serde::{Deserialize, Serialize};

pub type CharacterId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Unit {
    #[serde(rename = "ln", alias = "light_sound")]
    LeoNeed = 0,
    #[serde(rename = "mmj", alias = "idol")]
    MoreMoreJump = 1,
    #[serde(rename = "vbs", alias = "street")]
    VividBadSquad = 2,
    #[serde(rename = "ws", alias = "theme_park")]
    WonderlandsShowtime = 3,
    #[serde(rename = "25ji", alias = "school_refusal")]
    Nightcord = 4,
    #[serde(rename = "vs", alias = "piapro")]
    VirtualSinger = 5,
}

const UNIT_MEMBERS: [(Unit, &[CharacterId]); 6] = [
    (Unit::LeoNeed, &[1, 2, 3, 4]),
    (Unit::MoreMoreJump, &[5, 6, 7, 8]),
    (Unit::VividBadSquad, &[9, 10, 11, 12]),
    (Unit::WonderlandsShowtime, &[13, 14, 15, 16]),
    (Unit::Nightcord, &[17, 18, 19, 20]),
    (Unit::VirtualSinger, &[21, 22, 23, 24, 25, 26]),
];

const CHARACTER_NAMES: [&str; 26] = [
    "Hoshino Ichika",
    "Tenma Saki",
    "Mochizuki Honami",
    "Hinomori Shiho",
    "Hanasato Minori",
    "Kiritani Haruka",
    "Momoi Airi",
    "Hinomori Shizuku",
    "Azusawa Kohane",
    "Shiraishi An",
    "Shinonome Akito",
    "Aoyagi Toya",
    "Tenma Tsukasa",
    "Otori Emu",
    "Kusanagi Nene",
    "Kamishiro Rui",
    "Yoisaki Kanade",
    "Asahina Mafuyu",
    "Shinonome Ena",
    "Akiyama Mizuki",
    "Hatsune Miku",
    "Kagamine Rin",
    "Kagamine Len",
    "Megurine Luka",
    "MEIKO",
    "KAITO",
];

impl Unit {
    pub const ALL: [Unit; 6] = [
        Unit::LeoNeed,
        Unit::MoreMoreJump,
        Unit::VividBadSquad,
        Unit::WonderlandsShowtime,
        Unit::Nightcord,
        Unit::VirtualSinger,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn short_name(self) -> &'static str {
        match self {
            Unit::LeoNeed => "ln",
            Unit::MoreMoreJump => "mmj",
            Unit::VividBadSquad => "vbs",
            Unit::WonderlandsShowtime => "ws",
            Unit::Nightcord => "25ji",
            Unit::VirtualSinger => "vs",
        }
    }

    pub fn members(self) -> &'static [CharacterId] {
        UNIT_MEMBERS[self.index()].1
    }

    /// Home unit of a character; `None` for ids outside the cast.
    pub fn of_character(character_id: CharacterId) -> Option<Unit> {
        UNIT_MEMBERS
            .iter()
            .find(|(_, members)| members.contains(&character_id))
            .map(|(unit, _)| *unit)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

pub fn character_name(character_id: CharacterId) -> Option<&'static str> {
    let index = usize::try_from(character_id).ok()?.checked_sub(1)?;
    CHARACTER_NAMES.get(index).copied()
}

pub fn is_virtual_singer(character_id: CharacterId) -> bool {
    Unit::of_character(character_id) == Some(Unit::VirtualSinger)
}
