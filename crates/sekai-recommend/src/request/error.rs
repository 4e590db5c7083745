use sekai_core::catalog::CatalogError;
use sekai_core::model::skill::SkillId;
use sekai_core::search::SearchError;
use sekai_core::skill::SkillError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecommendError {
    /// `kind` is one of `card`, `skill`, `music`, `event`, `character`.
    NotFound { kind: &'static str, id: u32 },
    InvalidLevel { skill_id: SkillId, level: u8 },
    InvalidRequest(String),
}

impl fmt::Display for RecommendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendError::NotFound { kind, id } => write!(f, "{kind} {id} not found"),
            RecommendError::InvalidLevel { skill_id, level } => {
                write!(f, "invalid level {level} for skill {skill_id}")
            }
            RecommendError::InvalidRequest(message) => write!(f, "invalid request: {message}"),
        }
    }
}

impl std::error::Error for RecommendError {}

impl From<SearchError> for RecommendError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Catalog(CatalogError::NotFound(id)) => {
                RecommendError::NotFound { kind: "card", id }
            }
            SearchError::Skill(SkillError::InvalidLevel {
                skill_id, level, ..
            }) => RecommendError::InvalidLevel { skill_id, level },
            other => RecommendError::InvalidRequest(other.to_string()),
        }
    }
}
