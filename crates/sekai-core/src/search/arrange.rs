//! Activation order for a fixed set of cards.
//!
//! Carried boosts are flat percentages that do not depend on who receives them, so the only
//! positions that matter are those of boosting cards and, with an encore, the leader. Cards
//! without boosts are kept in card-id order in the remaining slots; that is also the smallest
//! card sequence among equally scoring orders.

use crate::context::Context;
use crate::model::card::CardId;
use crate::score::{DeckMember, objective_value};
use crate::skill::{DeckSkill, SkillSimulator};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub struct Arrangement {
    pub members: Vec<DeckMember>,
    pub objective: f64,
    /// Orders that were scored to find this one.
    pub evaluated: usize,
}

impl Arrangement {
    pub fn card_ids(&self) -> Vec<CardId> {
        self.members.iter().map(|m| m.card_id).collect()
    }
}

struct Search<'c, 'a> {
    ctx: &'c Context<'a>,
    simulator: SkillSimulator,
    base_score: f64,
    event_bonus: f64,
    best: Option<(Vec<DeckMember>, f64)>,
    evaluated: usize,
}

impl Search<'_, '_> {
    fn consider(&mut self, order: &[DeckMember]) {
        self.evaluated += 1;
        let skills: Vec<DeckSkill> = order.iter().map(DeckMember::deck_skill).collect();
        let percent = self.simulator.total_percent(&skills);
        let total = self.base_score * self.simulator.score_multiplier(percent);
        let objective = objective_value(self.ctx, total, self.event_bonus);

        let better = match &self.best {
            None => true,
            Some((held, held_objective)) => match objective.total_cmp(held_objective) {
                Ordering::Greater => true,
                Ordering::Less => false,
                Ordering::Equal => order
                    .iter()
                    .map(|m| m.card_id)
                    .lt(held.iter().map(|m| m.card_id)),
            },
        };
        if better {
            self.best = Some((order.to_vec(), objective));
        }
    }

    /// Fills `slots` past `prefix` with the plain cards in order and every placement of the
    /// boosting cards.
    fn fill(
        &mut self,
        slots: &mut Vec<DeckMember>,
        plain: &[DeckMember],
        boosting: &[DeckMember],
        used: &mut [bool],
        remaining: usize,
    ) {
        if remaining == 0 {
            let order = slots.clone();
            self.consider(&order);
            return;
        }
        if let Some((first, rest)) = plain.split_first() {
            slots.push(*first);
            self.fill(slots, rest, boosting, used, remaining - 1);
            slots.pop();
        }
        for index in 0..boosting.len() {
            if used[index] {
                continue;
            }
            used[index] = true;
            slots.push(boosting[index]);
            self.fill(slots, plain, boosting, used, remaining - 1);
            slots.pop();
            used[index] = false;
        }
    }
}

/// Best activation order for `members` under `ctx`. Ties go to the smaller card-id sequence.
/// Returns `None` for an empty deck.
pub fn best_arrangement(members: &[DeckMember], ctx: &Context<'_>) -> Option<Arrangement> {
    if members.is_empty() {
        return None;
    }
    let mut canonical = members.to_vec();
    canonical.sort_by_key(|m| m.card_id);

    let base_score: f64 = canonical.iter().map(DeckMember::effective_power).sum();
    let event_bonus: f64 = canonical.iter().map(|m| m.bonus.event_bonus_percent).sum();
    let mut search = Search {
        ctx,
        simulator: SkillSimulator::for_context(base_score, ctx),
        base_score,
        event_bonus,
        best: None,
        evaluated: 0,
    };

    let mut slots = Vec::with_capacity(canonical.len());
    if ctx.music.encore {
        for leader in 0..canonical.len() {
            let mut rest = canonical.clone();
            let head = rest.remove(leader);
            let (boosting, plain): (Vec<_>, Vec<_>) =
                rest.into_iter().partition(|m| m.skill.is_order_sensitive());
            slots.clear();
            slots.push(head);
            let mut used = vec![false; boosting.len()];
            let remaining = canonical.len() - 1;
            search.fill(&mut slots, &plain, &boosting, &mut used, remaining);
        }
    } else {
        let (boosting, plain): (Vec<_>, Vec<_>) = canonical
            .iter()
            .copied()
            .partition(|m| m.skill.is_order_sensitive());
        let mut used = vec![false; boosting.len()];
        search.fill(&mut slots, &plain, &boosting, &mut used, canonical.len());
    }

    let evaluated = search.evaluated;
    search.best.map(|(members, objective)| Arrangement {
        members,
        objective,
        evaluated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::BonusFactor;
    use crate::context::LiveType;
    use crate::model::music::Music;
    use crate::model::unit::Unit;
    use crate::skill::SkillProfile;

    fn music(encore: bool) -> Music {
        Music {
            id: 1,
            title: "m".into(),
            note_count: 1000,
            duration_secs: 100.0,
            skill_note_ratio: 0.1,
            encore,
            lyricist: String::new(),
            composer: String::new(),
        }
    }

    fn member(card_id: CardId, score_up: f64, boost_next: f64, boost_following: f64) -> DeckMember {
        DeckMember {
            card_id,
            character_id: card_id,
            unit: Unit::of_character(card_id),
            base_power: 10_000,
            bonus: BonusFactor::NONE,
            skill: SkillProfile {
                score_up,
                boost_next,
                boost_following,
                ..SkillProfile::default()
            },
        }
    }

    #[test]
    fn plain_cards_keep_id_order_without_encore() {
        let music = music(false);
        let ctx = Context::new(&music, LiveType::Multi);
        let deck = [member(9, 50.0, 0.0, 0.0), member(2, 80.0, 0.0, 0.0), member(5, 60.0, 0.0, 0.0)];
        let best = best_arrangement(&deck, &ctx).unwrap();
        assert_eq!(best.card_ids(), vec![2, 5, 9]);
        assert_eq!(best.evaluated, 1);
    }

    #[test]
    fn encore_puts_strongest_skill_first() {
        let music = music(true);
        let ctx = Context::new(&music, LiveType::Multi);
        let deck = [member(1, 50.0, 0.0, 0.0), member(2, 120.0, 0.0, 0.0), member(3, 60.0, 0.0, 0.0)];
        let best = best_arrangement(&deck, &ctx).unwrap();
        assert_eq!(best.card_ids(), vec![2, 1, 3]);
        assert_eq!(best.evaluated, 3);
    }

    #[test]
    fn boost_following_moves_to_front() {
        let music = music(false);
        let ctx = Context::new(&music, LiveType::Multi);
        let deck = [member(1, 50.0, 0.0, 0.0), member(2, 50.0, 0.0, 0.0), member(3, 10.0, 0.0, 20.0)];
        let best = best_arrangement(&deck, &ctx).unwrap();
        assert_eq!(best.card_ids(), vec![3, 1, 2]);
        // three placements of the single boosting card
        assert_eq!(best.evaluated, 3);
    }

    #[test]
    fn boost_next_never_sits_last_without_encore() {
        let music = music(false);
        let ctx = Context::new(&music, LiveType::Multi);
        let deck = [member(1, 50.0, 0.0, 0.0), member(2, 10.0, 40.0, 0.0)];
        let best = best_arrangement(&deck, &ctx).unwrap();
        assert_eq!(best.card_ids(), vec![2, 1]);
    }

    #[test]
    fn empty_deck_has_no_arrangement() {
        let music = music(true);
        let ctx = Context::new(&music, LiveType::Multi);
        assert!(best_arrangement(&[], &ctx).is_none());
    }
}
