pub mod meta;

pub use meta::{MetaMode, MusicMeta, MusicRecommendation, recommend_musics};
