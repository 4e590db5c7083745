//! Read-only index over the master data.
//!
//! The catalog is built once and shared between requests; nothing in here is mutated
//! after construction, so `&CardCatalog` can be handed to any number of threads.

use crate::model::card::{Card, CardId};
use crate::model::event::{Event, EventId};
use crate::model::music::{Music, MusicId};
use crate::model::rarity::Rarity;
use crate::model::skill::{Skill, SkillId};
use crate::model::unit::{CharacterId, Unit};
use crate::music::MusicMeta;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    NotFound(CardId),
    DuplicateCard(CardId),
    DuplicateSkill(SkillId),
    MissingSkill { card_id: CardId, skill_id: SkillId },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::NotFound(id) => write!(f, "card {id} not found in catalog"),
            CatalogError::DuplicateCard(id) => write!(f, "card {id} listed more than once"),
            CatalogError::DuplicateSkill(id) => write!(f, "skill {id} listed more than once"),
            CatalogError::MissingSkill { card_id, skill_id } => {
                write!(f, "card {card_id} references unknown skill {skill_id}")
            }
        }
    }
}

impl std::error::Error for CatalogError {}

#[derive(Debug, Clone, Default)]
pub struct CardCatalog {
    cards: Vec<Card>,
    by_id: HashMap<CardId, usize>,
    skills: HashMap<SkillId, Skill>,
}

impl CardCatalog {
    /// Index `cards` by id. Every card's skill must be present in `skills`.
    pub fn new(cards: Vec<Card>, skills: Vec<Skill>) -> Result<Self, CatalogError> {
        let mut skill_map = HashMap::with_capacity(skills.len());
        for skill in skills {
            let id = skill.id;
            if skill_map.insert(id, skill).is_some() {
                return Err(CatalogError::DuplicateSkill(id));
            }
        }

        let mut by_id = HashMap::with_capacity(cards.len());
        for (index, card) in cards.iter().enumerate() {
            if by_id.insert(card.id, index).is_some() {
                return Err(CatalogError::DuplicateCard(card.id));
            }
            if !skill_map.contains_key(&card.skill_id) {
                return Err(CatalogError::MissingSkill {
                    card_id: card.id,
                    skill_id: card.skill_id,
                });
            }
        }

        Ok(Self {
            cards,
            by_id,
            skills: skill_map,
        })
    }

    pub fn lookup(&self, id: CardId) -> Result<&Card, CatalogError> {
        self.by_id
            .get(&id)
            .map(|&index| &self.cards[index])
            .ok_or(CatalogError::NotFound(id))
    }

    pub fn contains(&self, id: CardId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Skill descriptor of a catalog card. Construction guarantees presence.
    pub fn skill_of(&self, card: &Card) -> Result<&Skill, CatalogError> {
        self.skills
            .get(&card.skill_id)
            .ok_or(CatalogError::MissingSkill {
                card_id: card.id,
                skill_id: card.skill_id,
            })
    }

    pub fn skill(&self, id: SkillId) -> Option<&Skill> {
        self.skills.get(&id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    pub fn by_character(&self, character_id: CharacterId) -> impl Iterator<Item = &Card> {
        self.cards
            .iter()
            .filter(move |card| card.character_id == character_id)
    }

    pub fn by_rarity(&self, rarity: Rarity) -> impl Iterator<Item = &Card> {
        self.cards.iter().filter(move |card| card.rarity == rarity)
    }

    pub fn by_unit(&self, unit: Unit) -> impl Iterator<Item = &Card> {
        self.cards.iter().filter(move |card| card.unit() == Some(unit))
    }
}

#[derive(Debug)]
pub enum DataError {
    Json(serde_json::Error),
    Catalog(CatalogError),
    InvalidMusic { music_id: MusicId, field: &'static str },
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Json(err) => write!(f, "failed to parse master data: {err}"),
            DataError::Catalog(err) => write!(f, "invalid master data: {err}"),
            DataError::InvalidMusic { music_id, field } => {
                write!(f, "music {music_id}: {field} must be a non-negative number")
            }
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Json(err) => Some(err),
            DataError::Catalog(err) => Some(err),
            DataError::InvalidMusic { .. } => None,
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Json(err)
    }
}

impl From<CatalogError> for DataError {
    fn from(err: CatalogError) -> Self {
        DataError::Catalog(err)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MasterDataFile {
    cards: Vec<Card>,
    skills: Vec<Skill>,
    #[serde(default)]
    musics: Vec<Music>,
    #[serde(default)]
    events: Vec<Event>,
    #[serde(default)]
    music_metas: Vec<MusicMeta>,
}

/// Everything an optimization request needs, already resident in memory.
#[derive(Debug, Clone, Default)]
pub struct MasterData {
    catalog: CardCatalog,
    musics: Vec<Music>,
    music_index: HashMap<MusicId, usize>,
    events: HashMap<EventId, Event>,
    music_metas: Vec<MusicMeta>,
}

impl MasterData {
    /// Later duplicates of a music or event id replace earlier ones. Musics with negative or
    /// non-numeric timings are rejected.
    pub fn new(
        catalog: CardCatalog,
        musics: Vec<Music>,
        events: Vec<Event>,
    ) -> Result<Self, DataError> {
        if let Some((music_id, field)) = musics
            .iter()
            .find_map(|music| music.invalid_field().map(|field| (music.id, field)))
        {
            return Err(DataError::InvalidMusic { music_id, field });
        }
        let mut list: Vec<Music> = Vec::with_capacity(musics.len());
        let mut music_index = HashMap::with_capacity(musics.len());
        for music in musics {
            match music_index.get(&music.id) {
                Some(&at) => list[at] = music,
                None => {
                    music_index.insert(music.id, list.len());
                    list.push(music);
                }
            }
        }
        Ok(Self {
            catalog,
            musics: list,
            music_index,
            events: events.into_iter().map(|e| (e.id, e)).collect(),
            music_metas: Vec::new(),
        })
    }

    pub fn with_music_metas(mut self, music_metas: Vec<MusicMeta>) -> Self {
        self.music_metas = music_metas;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, DataError> {
        let file: MasterDataFile = serde_json::from_str(json)?;
        Self::from_file(file)
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, DataError> {
        let file: MasterDataFile = serde_json::from_reader(reader)?;
        Self::from_file(file)
    }

    fn from_file(file: MasterDataFile) -> Result<Self, DataError> {
        let catalog = CardCatalog::new(file.cards, file.skills)?;
        Ok(Self::new(catalog, file.musics, file.events)?.with_music_metas(file.music_metas))
    }

    pub fn catalog(&self) -> &CardCatalog {
        &self.catalog
    }

    pub fn music(&self, id: MusicId) -> Option<&Music> {
        self.music_index.get(&id).map(|&at| &self.musics[at])
    }

    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.events.get(&id)
    }

    /// Musics in load order.
    pub fn musics(&self) -> &[Music] {
        &self.musics
    }

    pub fn music_metas(&self) -> &[MusicMeta] {
        &self.music_metas
    }
}
