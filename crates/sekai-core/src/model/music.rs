use serde::{Deserialize, Serialize};

pub type MusicId = u32;

const DEFAULT_SKILL_NOTE_RATIO: f64 = 0.1;

fn default_skill_note_ratio() -> f64 {
    DEFAULT_SKILL_NOTE_RATIO
}

fn default_encore() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Music {
    pub id: MusicId,
    pub title: String,
    #[serde(default)]
    pub note_count: u32,
    pub duration_secs: f64,
    /// Fraction of the chart's notes covered by a single skill window.
    #[serde(default = "default_skill_note_ratio")]
    pub skill_note_ratio: f64,
    /// Whether the leader's skill fires again after the last deck slot.
    #[serde(default = "default_encore")]
    pub encore: bool,
    #[serde(default)]
    pub lyricist: String,
    #[serde(default)]
    pub composer: String,
}

impl Music {
    /// Name of the first timing field that is negative or not a number.
    pub fn invalid_field(&self) -> Option<&'static str> {
        [
            ("durationSecs", self.duration_secs),
            ("skillNoteRatio", self.skill_note_ratio),
        ]
        .into_iter()
        .find(|(_, value)| !value.is_finite() || *value < 0.0)
        .map(|(name, _)| name)
    }

    pub fn activations(&self, deck_size: usize) -> usize {
        if self.encore && deck_size > 0 {
            deck_size + 1
        } else {
            deck_size
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Music;

    #[test]
    fn defaults_apply_for_sparse_records() {
        let music: Music =
            serde_json::from_str(r#"{"id": 1, "title": "Tell Your World", "durationSecs": 127.0}"#)
                .unwrap();
        assert!(music.encore);
        assert_eq!(music.skill_note_ratio, 0.1);
        assert_eq!(music.activations(5), 6);
        assert_eq!(music.activations(0), 0);
    }
}
