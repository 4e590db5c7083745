//! Music suggestions from precomputed PSPI metrics.

use crate::context::{LiveType, RankingCriterion};
use crate::model::music::{Music, MusicId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Musics always offered first for multi lives ranked by points.
pub const PINNED_MULTI_PT: [MusicId; 2] = [226, 448];
/// Length of the suggestion list, pinned entries included.
pub const RECOMMENDED_MUSIC_COUNT: usize = 2;
/// Rank reported for a music that has no metric.
pub const UNRANKED: usize = 999;

/// Per-music, per-difficulty metrics. Missing figures read as zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicMeta {
    pub music_id: MusicId,
    pub difficulty: String,
    pub pspi_pt_per_hour_multi: f64,
    pub pspi_pt_per_hour_auto: f64,
    pub pspi_multi_pt_max: f64,
    pub pspi_auto_pt_max: f64,
    pub pspi_solo_pt_max: f64,
    pub pspi_multi_score: f64,
    pub pspi_auto_score: f64,
    pub pspi_solo_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaMode {
    Multi,
    Auto,
    Solo,
}

impl MetaMode {
    pub const fn for_live_type(live_type: LiveType) -> Self {
        match live_type {
            LiveType::Multi | LiveType::Cheerful | LiveType::Challenge => MetaMode::Multi,
            LiveType::Auto => MetaMode::Auto,
            LiveType::Solo => MetaMode::Solo,
        }
    }
}

impl MusicMeta {
    /// The figure ranked for `mode` and `criterion`; solo has no efficiency figure.
    pub fn metric(&self, mode: MetaMode, criterion: RankingCriterion) -> Option<f64> {
        let value = match (criterion, mode) {
            (RankingCriterion::Efficiency, MetaMode::Multi) => self.pspi_pt_per_hour_multi,
            (RankingCriterion::Efficiency, MetaMode::Auto) => self.pspi_pt_per_hour_auto,
            (RankingCriterion::Efficiency, MetaMode::Solo) => return None,
            (RankingCriterion::Pt, MetaMode::Multi) => self.pspi_multi_pt_max,
            (RankingCriterion::Pt, MetaMode::Auto) => self.pspi_auto_pt_max,
            (RankingCriterion::Pt, MetaMode::Solo) => self.pspi_solo_pt_max,
            (RankingCriterion::Score, MetaMode::Multi) => self.pspi_multi_score,
            (RankingCriterion::Score, MetaMode::Auto) => self.pspi_auto_score,
            (RankingCriterion::Score, MetaMode::Solo) => self.pspi_solo_score,
        };
        Some(if value.is_finite() { value } else { 0.0 })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MusicRecommendation {
    pub music_id: MusicId,
    pub title: String,
    pub difficulty: String,
    pub value: f64,
    pub rank: usize,
    pub pinned: bool,
}

pub fn recommend_musics(
    musics: &[Music],
    metas: &[MusicMeta],
    live_type: LiveType,
    criterion: RankingCriterion,
) -> Vec<MusicRecommendation> {
    let mode = MetaMode::for_live_type(live_type);
    let solo_efficiency = mode == MetaMode::Solo && criterion == RankingCriterion::Efficiency;
    if musics.is_empty() || metas.is_empty() || solo_efficiency {
        return Vec::new();
    }
    let metric = |meta: &MusicMeta| meta.metric(mode, criterion).unwrap_or(0.0);

    let mut sorted: Vec<&MusicMeta> = metas.iter().collect();
    sorted.sort_by(|a, b| metric(*b).total_cmp(&metric(*a)));

    let mut ranks: HashMap<MusicId, usize> = HashMap::new();
    for meta in &sorted {
        let next = ranks.len() + 1;
        ranks.entry(meta.music_id).or_insert(next);
    }

    let pinned: &[MusicId] = if mode == MetaMode::Multi && criterion == RankingCriterion::Pt {
        &PINNED_MULTI_PT
    } else {
        &[]
    };

    let mut seen = HashSet::new();
    let mut result = Vec::new();
    let mut add = |music_id: MusicId, is_pinned: bool, result: &mut Vec<MusicRecommendation>| {
        if seen.contains(&music_id) {
            return;
        }
        let Some(meta) = sorted.iter().copied().find(|m| m.music_id == music_id) else {
            return;
        };
        let Some(music) = musics.iter().find(|m| m.id == music_id) else {
            return;
        };
        seen.insert(music_id);
        result.push(MusicRecommendation {
            music_id,
            title: music.title.clone(),
            difficulty: meta.difficulty.clone(),
            value: metric(meta),
            rank: ranks.get(&music_id).copied().unwrap_or(UNRANKED),
            pinned: is_pinned,
        });
    };

    for &music_id in pinned {
        add(music_id, true, &mut result);
    }
    for meta in &sorted {
        if result.len() >= RECOMMENDED_MUSIC_COUNT {
            break;
        }
        add(meta.music_id, false, &mut result);
    }
    result
}
