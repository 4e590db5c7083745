//! Per-card power bonuses.
//!
//! All percentages are summed first and applied once to base power:
//! `effective = base * (1 + (event + support_unit + costume) / 100)`.

use crate::context::Context;
use crate::model::card::{Card, CardId};
use crate::roster::RosterEntry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BonusFactor {
    pub event_bonus_percent: f64,
    pub support_unit_bonus_percent: f64,
    pub costume_bonus_percent: f64,
}

impl BonusFactor {
    pub const NONE: BonusFactor = BonusFactor {
        event_bonus_percent: 0.0,
        support_unit_bonus_percent: 0.0,
        costume_bonus_percent: 0.0,
    };

    pub fn total_percent(self) -> f64 {
        self.event_bonus_percent + self.support_unit_bonus_percent + self.costume_bonus_percent
    }

    pub fn multiplier(self) -> f64 {
        1.0 + self.total_percent() / 100.0
    }

    pub fn apply(self, base_power: u32) -> f64 {
        f64::from(base_power) * self.multiplier()
    }
}

/// Pure bonus computation for one owned card under `ctx`.
pub fn resolve_bonus(card: &Card, entry: &RosterEntry, ctx: &Context<'_>) -> BonusFactor {
    BonusFactor {
        event_bonus_percent: event_bonus(card, entry, ctx),
        support_unit_bonus_percent: ctx.area_bonuses.percent_for(card.unit()),
        costume_bonus_percent: ctx
            .costume_bonus
            .as_ref()
            .map(|bonus| bonus.percent_for(card.character_id))
            .unwrap_or(0.0),
    }
}

fn event_bonus(card: &Card, entry: &RosterEntry, ctx: &Context<'_>) -> f64 {
    let Some(event) = ctx.event else {
        return 0.0;
    };
    let rates = &event.rates;
    let character_match = event.matches_character(card.character_id, card.unit());
    let attribute_match = event.matches_attribute(card.attribute);

    let mut percent = 0.0;
    if character_match {
        percent += rates.character_percent;
    }
    if attribute_match {
        percent += rates.attribute_percent;
    }
    if character_match || attribute_match {
        percent += rates.master_rank_percent(card.rarity, entry.master_rank);
    }
    if event.is_limited_card(card.id) {
        percent += rates.limited_card_percent;
    }
    percent
}

/// Request-scoped memo of [`resolve_bonus`] keyed by card and master rank.
pub struct BonusResolver<'c, 'a> {
    ctx: &'c Context<'a>,
    cache: HashMap<(CardId, u8), BonusFactor>,
    hits: usize,
}

impl<'c, 'a> BonusResolver<'c, 'a> {
    pub fn new(ctx: &'c Context<'a>) -> Self {
        Self {
            ctx,
            cache: HashMap::new(),
            hits: 0,
        }
    }

    pub fn resolve(&mut self, card: &Card, entry: &RosterEntry) -> BonusFactor {
        let key = (card.id, entry.master_rank);
        if let Some(found) = self.cache.get(&key) {
            self.hits += 1;
            return *found;
        }
        let factor = resolve_bonus(card, entry, self.ctx);
        self.cache.insert(key, factor);
        factor
    }

    pub fn cache_hits(&self) -> usize {
        self.hits
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
