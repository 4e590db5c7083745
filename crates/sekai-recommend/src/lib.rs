pub mod planner;
pub mod recommender;
pub mod request;

pub use planner::{BranchAndBoundPlanner, GreedyPlanner, Planner, PlannerKind, RecommendFeatures};
pub use recommender::DeckRecommender;
pub use request::{RecommendError, RecommendRequest, RecommendResponse, RecommendedDeck, SlotView};
