//! Fills skill description templates.
//!
//! `{{id;t}}` reads effect `id` at the requested level: `d` duration, `v` value, `e` enhance,
//! `m` five times enhance plus value, `c` the owning character's name.
//! `{{a,b;t}}` combines two effects: `u`, `o`, `s` and `v` sum both values, `r` takes `b`
//! when positive and `a` otherwise. Placeholders that cannot be resolved stay verbatim.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::model::skill::Skill;
use crate::model::unit::{CharacterId, character_name};

static SINGLE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{\{([0-9]+);([A-Za-z0-9_]+)\}\}").ok());
static DOUBLE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{\{([0-9]+),([0-9]+);([A-Za-z0-9_]+)\}\}").ok());

enum Placeholder<'t> {
    Single { id: u32, kind: &'t str },
    Double { first: u32, second: u32, kind: &'t str },
}

/// Single-effect placeholders are replaced first, then combined ones, each in one pass
/// over the text.
pub fn format_skill_description(
    skill: &Skill,
    level: u8,
    character_id: Option<CharacterId>,
) -> String {
    let mut text = skill.description.clone();

    if let Some(single) = SINGLE.as_ref() {
        text = single
            .replace_all(&text, |caps: &Captures<'_>| {
                let placeholder = caps[1].parse::<u32>().ok().map(|id| Placeholder::Single {
                    id,
                    kind: caps.get(2).map_or("", |m| m.as_str()),
                });
                substitute(skill, level, character_id, placeholder, &caps[0])
            })
            .into_owned();
    }

    if let Some(double) = DOUBLE.as_ref() {
        text = double
            .replace_all(&text, |caps: &Captures<'_>| {
                let placeholder = match (caps[1].parse::<u32>(), caps[2].parse::<u32>()) {
                    (Ok(first), Ok(second)) => Some(Placeholder::Double {
                        first,
                        second,
                        kind: caps.get(3).map_or("", |m| m.as_str()),
                    }),
                    _ => None,
                };
                substitute(skill, level, character_id, placeholder, &caps[0])
            })
            .into_owned();
    }

    text
}

fn substitute(
    skill: &Skill,
    level: u8,
    character_id: Option<CharacterId>,
    placeholder: Option<Placeholder<'_>>,
    raw: &str,
) -> String {
    placeholder
        .and_then(|p| render(skill, level, character_id, p))
        .unwrap_or_else(|| raw.to_string())
}

fn render(
    skill: &Skill,
    level: u8,
    character_id: Option<CharacterId>,
    placeholder: Placeholder<'_>,
) -> Option<String> {
    match placeholder {
        Placeholder::Single { id, kind } => {
            if kind == "c" {
                if let Some(character_id) = character_id {
                    return character_name(character_id).map(str::to_string);
                }
            }
            let effect = skill.effect(id)?;
            let detail = effect.detail(level)?;
            let enhance = effect.enhance_value().filter(|v| *v != 0.0);
            match kind {
                "d" => Some(number(detail.activate_effect_duration)),
                "v" => Some(number(detail.activate_effect_value)),
                "e" => enhance.map(number),
                "m" => enhance.map(|e| number(e * 5.0 + detail.activate_effect_value)),
                _ => None,
            }
        }
        Placeholder::Double {
            first,
            second,
            kind,
        } => {
            let value_of = |effect_id: u32| {
                skill
                    .effect(effect_id)
                    .and_then(|e| e.detail(level))
                    .map(|d| d.activate_effect_value)
                    .unwrap_or(0.0)
            };
            let a = value_of(first);
            let b = value_of(second);
            match kind {
                "u" | "o" | "s" | "v" => Some(number(a + b)),
                "r" => Some(number(if b > 0.0 { b } else { a })),
                _ => None,
            }
        }
    }
}

fn number(value: f64) -> String {
    format!("{value}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::skill::{SkillEffect, SkillEffectDetail, SkillEffectType, SkillEnhance};

    fn skill(description: &str) -> Skill {
        let detail = |level: u8, duration: f64, value: f64| SkillEffectDetail {
            level,
            activate_effect_duration: duration,
            activate_effect_value: value,
        };
        Skill {
            id: 1,
            description: description.to_string(),
            skill_effects: vec![
                SkillEffect {
                    id: 1,
                    skill_effect_type: SkillEffectType::ScoreUpUnitCount,
                    skill_effect_details: vec![detail(1, 5.0, 60.0), detail(2, 5.0, 65.0)],
                    skill_enhance: Some(SkillEnhance {
                        activate_effect_value: 10.0,
                    }),
                },
                SkillEffect {
                    id: 2,
                    skill_effect_type: SkillEffectType::ScoreUp,
                    skill_effect_details: vec![detail(1, 5.0, 20.0), detail(2, 5.0, 0.0)],
                    skill_enhance: None,
                },
            ],
        }
    }

    #[test]
    fn single_placeholders_resolve_at_level() {
        let s = skill("{{1;d}}s: +{{1;v}}% (+{{1;e}}% per member, max {{1;m}}%)");
        assert_eq!(
            format_skill_description(&s, 2, None),
            "5s: +65% (+10% per member, max 115%)"
        );
    }

    #[test]
    fn double_placeholders_sum_or_pick() {
        let s = skill("{{1,2;u}} / {{1,2;r}}");
        assert_eq!(format_skill_description(&s, 1, None), "80 / 20");
        // second effect is zero at level 2, so `r` falls back to the first
        assert_eq!(format_skill_description(&s, 2, None), "65 / 65");
    }

    #[test]
    fn character_name_placeholder() {
        let s = skill("{{1;c}} sings");
        assert_eq!(format_skill_description(&s, 1, Some(18)), "Asahina Mafuyu sings");
    }

    #[test]
    fn unresolvable_placeholders_stay_verbatim() {
        let s = skill("{{2;e}} {{9;v}} {{1;x}} {{1;v}} {{a;v}} {{1;v");
        assert_eq!(
            format_skill_description(&s, 3, None),
            "{{2;e}} {{9;v}} {{1;x}} {{1;v}} {{a;v}} {{1;v"
        );
        assert_eq!(
            format_skill_description(&s, 1, None),
            "{{2;e}} {{9;v}} {{1;x}} 60 {{a;v}} {{1;v"
        );
    }

    #[test]
    fn stray_braces_do_not_hide_later_placeholders() {
        let s = skill("{{{1;v}}% and {{x {{1;d}}s");
        assert_eq!(format_skill_description(&s, 1, None), "{60% and {{x 5s");
    }

    #[test]
    fn combined_placeholder_after_unclosed_open() {
        let s = skill("{{ {{1,2;s}}%");
        assert_eq!(format_skill_description(&s, 1, None), "{{ 80%");
    }
}
