use super::Planner;
use sekai_core::catalog::CardCatalog;
use sekai_core::context::Context;
use sekai_core::roster::RosterEntry;
use sekai_core::search::{self, SearchConstraints, SearchError, SearchOutcome};

/// Strongest eligible cards in their best order. Returns a single deck.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyPlanner;

impl Planner for GreedyPlanner {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn plan(
        &self,
        catalog: &CardCatalog,
        roster: &[RosterEntry],
        ctx: &Context<'_>,
        constraints: &SearchConstraints,
    ) -> Result<SearchOutcome, SearchError> {
        search::greedy(catalog, roster, ctx, constraints)
    }
}
