use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Limits on one search. `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchBudget {
    pub time_cap_ms: Option<u64>,
    pub node_cap: Option<u64>,
}

impl SearchBudget {
    pub const UNLIMITED: SearchBudget = SearchBudget {
        time_cap_ms: None,
        node_cap: None,
    };

    pub fn with_time_cap(mut self, time_cap: Duration) -> Self {
        self.time_cap_ms = Some(time_cap.as_millis() as u64);
        self
    }

    pub fn with_node_cap(mut self, node_cap: u64) -> Self {
        self.node_cap = Some(node_cap);
        self
    }

    pub fn is_unlimited(&self) -> bool {
        self.time_cap_ms.is_none() && self.node_cap.is_none()
    }
}

/// Cooperative budget checked at every node expansion.
#[derive(Debug)]
pub(crate) struct BudgetTracker {
    budget: SearchBudget,
    start: Instant,
    nodes: u64,
    exhausted: bool,
}

impl BudgetTracker {
    pub(crate) fn start(budget: SearchBudget) -> Self {
        Self {
            budget,
            start: Instant::now(),
            nodes: 0,
            exhausted: false,
        }
    }

    /// Counts one expansion. Returns false once the budget is spent; stays false afterwards.
    pub(crate) fn tick(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        if let Some(cap) = self.budget.node_cap {
            if self.nodes >= cap {
                self.exhausted = true;
                return false;
            }
        }
        if let Some(cap_ms) = self.budget.time_cap_ms {
            // clock reads are amortized over 256 expansions
            if self.nodes % 256 == 0 && self.elapsed().as_millis() as u64 >= cap_ms {
                self.exhausted = true;
                return false;
            }
        }
        self.nodes = self.nodes.saturating_add(1);
        true
    }

    pub(crate) fn exhausted(&self) -> bool {
        self.exhausted
    }

    pub(crate) fn nodes(&self) -> u64 {
        self.nodes
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
