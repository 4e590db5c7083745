use super::{
    Candidate, SearchConstraints, SearchError, SearchOutcome, SearchStatus, finish_deck,
    prepare_candidates, roster_is_sufficient,
};
use crate::catalog::CardCatalog;
use crate::context::Context;
use crate::roster::RosterEntry;
use crate::score::DeckMember;
use std::time::Instant;

/// Highest-power cards first, skipping repeated characters when they are not allowed.
pub(crate) fn greedy_members(
    candidates: &[Candidate],
    deck_size: usize,
    unique_characters: bool,
) -> Option<Vec<DeckMember>> {
    let mut members: Vec<DeckMember> = Vec::with_capacity(deck_size);
    for candidate in candidates {
        if members.len() == deck_size {
            break;
        }
        let repeated = members
            .iter()
            .any(|m| m.character_id == candidate.member.character_id);
        if unique_characters && repeated {
            continue;
        }
        members.push(candidate.member);
    }
    (members.len() == deck_size).then_some(members)
}

/// Baseline planner: one deck of the strongest eligible cards in their best order.
pub fn greedy(
    catalog: &CardCatalog,
    roster: &[RosterEntry],
    ctx: &Context<'_>,
    constraints: &SearchConstraints,
) -> Result<SearchOutcome, SearchError> {
    let start = Instant::now();
    constraints.validate_for(ctx)?;
    let candidates = prepare_candidates(catalog, roster, ctx, constraints.deck_size)?;
    if !roster_is_sufficient(&candidates, constraints.deck_size, constraints.unique_characters) {
        return Ok(SearchOutcome::insufficient(start.elapsed()));
    }

    let decks: Vec<_> =
        greedy_members(&candidates, constraints.deck_size, constraints.unique_characters)
            .and_then(|members| finish_deck(&members, ctx))
            .into_iter()
            .collect();
    Ok(SearchOutcome {
        status: SearchStatus::Complete,
        nodes_expanded: decks.len() as u64,
        decks,
        pruned: 0,
        elapsed: start.elapsed(),
    })
}
