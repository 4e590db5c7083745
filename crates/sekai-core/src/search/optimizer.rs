//! Branch-and-bound over card subsets.
//!
//! Candidates are sorted by effective power, so the best `r` powers left after index `j` are
//! the next `r` candidates. Skill and event-bonus maxima over each suffix are precomputed. The
//! deck total is `power × (1 + skill% × note_ratio × factor / 100)` and every criterion is
//! non-decreasing in total score and event bonus, so combining per-term maxima never
//! under-estimates a completion. The bound only shrinks as `j` advances, which lets a failed
//! bound end the whole sibling loop.

use super::budget::BudgetTracker;
use super::greedy::greedy_members;
use super::ranking::TopK;
use super::{
    Candidate, SearchConstraints, SearchError, SearchOutcome, SearchStatus, finish_deck,
    prepare_candidates, roster_is_sufficient,
};
use crate::catalog::CardCatalog;
use crate::context::Context;
use crate::model::unit::CharacterId;
use crate::roster::RosterEntry;
use crate::score::{DeckMember, objective_value};
use crate::skill::SkillSimulator;
use std::time::Instant;

/// Top `r` sums of each bound term over every suffix of the candidate list.
struct SuffixBounds {
    width: usize,
    power: Vec<f64>,
    skill: Vec<f64>,
    event: Vec<f64>,
}

impl SuffixBounds {
    fn build(candidates: &[Candidate], deck_size: usize) -> Self {
        let width = deck_size + 1;
        let rows = candidates.len() + 1;
        let mut bounds = SuffixBounds {
            width,
            power: vec![0.0; rows * width],
            skill: vec![0.0; rows * width],
            event: vec![0.0; rows * width],
        };
        let mut best_skill: Vec<f64> = Vec::with_capacity(width);
        let mut best_event: Vec<f64> = Vec::with_capacity(width);

        for i in (0..candidates.len()).rev() {
            keep_largest(&mut best_skill, candidates[i].skill_bound, deck_size);
            keep_largest(&mut best_event, candidates[i].event_bonus, deck_size);
            let (mut power, mut skill, mut event) = (0.0, 0.0, 0.0);
            for r in 1..width {
                power += candidates.get(i + r - 1).map_or(0.0, |c| c.power);
                skill += best_skill.get(r - 1).copied().unwrap_or(0.0);
                event += best_event.get(r - 1).copied().unwrap_or(0.0);
                let at = i * width + r;
                bounds.power[at] = power;
                bounds.skill[at] = skill;
                bounds.event[at] = event;
            }
        }
        bounds
    }

    fn at(&self, from: usize, take: usize) -> (f64, f64, f64) {
        let at = from * self.width + take;
        (self.power[at], self.skill[at], self.event[at])
    }
}

/// Inserts into a descending list holding at most `cap` values.
fn keep_largest(values: &mut Vec<f64>, value: f64, cap: usize) {
    let at = values.partition_point(|held| *held >= value);
    if at < cap {
        values.insert(at, value);
        values.truncate(cap);
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Partial {
    power: f64,
    skill: f64,
    event: f64,
}

impl Partial {
    fn with(self, candidate: &Candidate) -> Self {
        Partial {
            power: self.power + candidate.power,
            skill: self.skill + candidate.skill_bound,
            event: self.event + candidate.event_bonus,
        }
    }
}

struct BranchAndBound<'c, 'a> {
    ctx: &'c Context<'a>,
    deck_size: usize,
    unique_characters: bool,
    candidates: Vec<Candidate>,
    bounds: SuffixBounds,
    scale: SkillSimulator,
    top: TopK,
    budget: BudgetTracker,
    chosen: Vec<usize>,
    used_characters: Vec<CharacterId>,
    pruned: u64,
}

impl BranchAndBound<'_, '_> {
    fn upper_bound(&self, from: usize, take: usize, partial: Partial) -> f64 {
        let (power, skill, event) = self.bounds.at(from, take);
        let total = (partial.power + power) * self.scale.score_multiplier(partial.skill + skill);
        objective_value(self.ctx, total, partial.event + event)
    }

    fn expand(&mut self, from: usize, partial: Partial) {
        let take = self.deck_size - self.chosen.len();
        if take == 0 {
            self.complete();
            return;
        }

        for next in from..self.candidates.len() {
            if self.candidates.len() - next < take {
                break;
            }
            if let Some(threshold) = self.top.threshold() {
                let slack = 1e-9 * threshold.abs().max(1.0);
                if self.upper_bound(next, take, partial) + slack < threshold {
                    self.pruned += 1;
                    break;
                }
            }
            let candidate = self.candidates[next];
            let character = candidate.member.character_id;
            if self.unique_characters && self.used_characters.contains(&character) {
                continue;
            }
            if !self.budget.tick() {
                return;
            }

            self.chosen.push(next);
            self.used_characters.push(character);
            self.expand(next + 1, partial.with(&candidate));
            self.used_characters.pop();
            self.chosen.pop();

            if self.budget.exhausted() {
                return;
            }
        }
    }

    fn complete(&mut self) {
        let members: Vec<DeckMember> = self
            .chosen
            .iter()
            .map(|&index| self.candidates[index].member)
            .collect();
        if let Some(deck) = finish_deck(&members, self.ctx) {
            self.top.offer(deck);
        }
    }
}

/// Top-K decks for `roster` under `ctx`, ranked by the context's criterion.
///
/// The strongest greedy deck seeds the result set so that an exhausted budget still returns a
/// deck whenever the roster can fill one.
pub fn search(
    catalog: &CardCatalog,
    roster: &[RosterEntry],
    ctx: &Context<'_>,
    constraints: &SearchConstraints,
) -> Result<SearchOutcome, SearchError> {
    let start = Instant::now();
    constraints.validate_for(ctx)?;
    let deck_size = constraints.deck_size;
    let candidates = prepare_candidates(catalog, roster, ctx, deck_size)?;
    if !roster_is_sufficient(&candidates, deck_size, constraints.unique_characters) {
        return Ok(SearchOutcome::insufficient(start.elapsed()));
    }

    let mut top = TopK::new(constraints.top_k);
    if let Some(seed) = greedy_members(&candidates, deck_size, constraints.unique_characters)
        .and_then(|members| finish_deck(&members, ctx))
    {
        top.offer(seed);
    }

    let mut engine = BranchAndBound {
        ctx,
        deck_size,
        unique_characters: constraints.unique_characters,
        bounds: SuffixBounds::build(&candidates, deck_size),
        candidates,
        scale: SkillSimulator::for_context(0.0, ctx),
        top,
        budget: BudgetTracker::start(constraints.budget),
        chosen: Vec::with_capacity(deck_size),
        used_characters: Vec::with_capacity(deck_size),
        pruned: 0,
    };
    engine.expand(0, Partial::default());

    let status = if engine.budget.exhausted() {
        SearchStatus::PartialTimeout
    } else {
        SearchStatus::Complete
    };
    Ok(SearchOutcome {
        status,
        nodes_expanded: engine.budget.nodes(),
        pruned: engine.pruned,
        decks: engine.top.into_sorted_vec(),
        elapsed: start.elapsed(),
    })
}
