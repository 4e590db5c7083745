pub mod attribute;
pub mod card;
pub mod event;
pub mod music;
pub mod rarity;
pub mod skill;
pub mod unit;

pub use attribute::Attribute;
pub use card::{Card, CardId, CardPower};
pub use event::{Event, EventBonusRates, EventCharacterBonus, EventId};
pub use music::{Music, MusicId};
pub use rarity::Rarity;
pub use skill::{Skill, SkillEffect, SkillEffectDetail, SkillEffectType, SkillEnhance, SkillId};
pub use unit::{CharacterId, Unit, character_name};
