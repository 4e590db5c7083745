use super::Planner;
use sekai_core::catalog::CardCatalog;
use sekai_core::context::Context;
use sekai_core::roster::RosterEntry;
use sekai_core::search::{self, SearchConstraints, SearchError, SearchOutcome};

/// Exact top-K search with bound pruning.
#[derive(Debug, Clone, Copy, Default)]
pub struct BranchAndBoundPlanner;

impl Planner for BranchAndBoundPlanner {
    fn name(&self) -> &'static str {
        "branch_and_bound"
    }

    fn plan(
        &self,
        catalog: &CardCatalog,
        roster: &[RosterEntry],
        ctx: &Context<'_>,
        constraints: &SearchConstraints,
    ) -> Result<SearchOutcome, SearchError> {
        search::search(catalog, roster, ctx, constraints)
    }
}
