mod branch_and_bound;
mod greedy;

pub use branch_and_bound::BranchAndBoundPlanner;
pub use greedy::GreedyPlanner;

use sekai_core::catalog::CardCatalog;
use sekai_core::context::Context;
use sekai_core::roster::RosterEntry;
use sekai_core::search::{SearchBudget, SearchConstraints, SearchError, SearchOutcome};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Deck selection strategy behind a recommendation.
pub trait Planner: Send + Sync {
    fn name(&self) -> &'static str;

    fn plan(
        &self,
        catalog: &CardCatalog,
        roster: &[RosterEntry],
        ctx: &Context<'_>,
        constraints: &SearchConstraints,
    ) -> Result<SearchOutcome, SearchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannerKind {
    #[default]
    BranchAndBound,
    Greedy,
}

impl PlannerKind {
    pub const ALL: [PlannerKind; 2] = [PlannerKind::BranchAndBound, PlannerKind::Greedy];

    pub const fn as_str(self) -> &'static str {
        match self {
            PlannerKind::BranchAndBound => "branch_and_bound",
            PlannerKind::Greedy => "greedy",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "branch_and_bound" | "bnb" | "exact" => Some(PlannerKind::BranchAndBound),
            "greedy" | "baseline" => Some(PlannerKind::Greedy),
            _ => None,
        }
    }

    pub fn from_env() -> Self {
        static CACHED: OnceLock<PlannerKind> = OnceLock::new();
        *CACHED.get_or_init(|| {
            std::env::var("SEKAI_PLANNER")
                .ok()
                .and_then(|raw| PlannerKind::parse(&raw))
                .unwrap_or_default()
        })
    }

    pub fn planner(self) -> Box<dyn Planner> {
        match self {
            PlannerKind::BranchAndBound => Box::new(BranchAndBoundPlanner),
            PlannerKind::Greedy => Box::new(GreedyPlanner),
        }
    }
}

/// Environment toggles for the recommendation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendFeatures {
    decision_details: bool,
    budget: SearchBudget,
}

impl Default for RecommendFeatures {
    fn default() -> Self {
        Self {
            decision_details: false,
            budget: SearchBudget::UNLIMITED,
        }
    }
}

impl RecommendFeatures {
    pub fn from_env() -> Self {
        static CACHED: OnceLock<RecommendFeatures> = OnceLock::new();
        *CACHED.get_or_init(|| Self::from_reader(|key| std::env::var(key).ok()))
    }

    pub const fn decision_details(self) -> bool {
        self.decision_details
    }

    /// Budget applied when a request does not carry its own.
    pub const fn default_budget(self) -> SearchBudget {
        self.budget
    }

    pub fn with_decision_details(mut self, enabled: bool) -> Self {
        self.decision_details = enabled;
        self
    }

    pub fn with_default_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }

    pub(crate) fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let decision_details = read("SEKAI_DECISION_DETAILS")
            .map(|raw| matches!(raw.trim(), "1" | "true" | "TRUE" | "on" | "ON"))
            .unwrap_or(false);

        let time_cap_ms = read("SEKAI_TIME_CAP_MS")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|value| *value > 0);

        let node_cap = read("SEKAI_NODE_CAP")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|value| *value > 0);

        Self {
            decision_details,
            budget: SearchBudget {
                time_cap_ms,
                node_cap,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn features_default_when_unset() {
        let features = RecommendFeatures::from_reader(|_| None);
        assert_eq!(features, RecommendFeatures::default());
        assert!(features.default_budget().is_unlimited());
    }

    #[test]
    fn features_read_flags_and_caps() {
        let mut vars = HashMap::new();
        vars.insert("SEKAI_DECISION_DETAILS".to_string(), "on".to_string());
        vars.insert("SEKAI_TIME_CAP_MS".to_string(), " 250 ".to_string());
        vars.insert("SEKAI_NODE_CAP".to_string(), "zero".to_string());

        let features = RecommendFeatures::from_reader(|key| vars.get(key).cloned());
        assert!(features.decision_details());
        assert_eq!(features.default_budget().time_cap_ms, Some(250));
        assert_eq!(features.default_budget().node_cap, None);
    }

    #[test]
    fn planner_kind_parses_aliases() {
        assert_eq!(PlannerKind::parse("BnB"), Some(PlannerKind::BranchAndBound));
        assert_eq!(PlannerKind::parse(" greedy"), Some(PlannerKind::Greedy));
        assert_eq!(PlannerKind::parse("random"), None);
        for kind in PlannerKind::ALL {
            assert_eq!(kind.planner().name(), kind.as_str());
        }
    }
}
