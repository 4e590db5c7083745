pub mod bonus;
pub mod catalog;
pub mod context;
pub mod model;
pub mod music;
pub mod roster;
pub mod score;
pub mod search;
pub mod skill;

pub use catalog::{CardCatalog, CatalogError, DataError, MasterData};
pub use context::{Context, LiveType, RankingCriterion};
pub use roster::RosterEntry;
pub use score::{DeckMember, ScoreBreakdown, score_deck};
pub use search::{
    CandidateDeck, SearchBudget, SearchConstraints, SearchError, SearchOutcome, SearchStatus,
};

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "sekai-deck"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
