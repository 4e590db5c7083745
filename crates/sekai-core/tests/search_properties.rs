use sekai_core::bonus::resolve_bonus;
use sekai_core::catalog::CardCatalog;
use sekai_core::context::{AreaBonuses, Context, CostumeBonus, LiveType, RankingCriterion};
use sekai_core::model::attribute::Attribute;
use sekai_core::model::card::{Card, CardId, CardPower};
use sekai_core::model::event::{Event, EventBonusRates, EventCharacterBonus};
use sekai_core::model::music::Music;
use sekai_core::model::rarity::Rarity;
use sekai_core::model::skill::{Skill, SkillEffect, SkillEffectDetail, SkillEffectType, SkillEnhance};
use sekai_core::model::unit::{CharacterId, Unit};
use sekai_core::roster::RosterEntry;
use sekai_core::score::{DeckMember, score_deck};
use sekai_core::search::{SearchBudget, SearchConstraints, SearchStatus, greedy, search};
use std::collections::BTreeMap;

fn effect(id: u32, kind: SkillEffectType, value: f64, enhance: Option<f64>) -> SkillEffect {
    SkillEffect {
        id,
        skill_effect_type: kind,
        skill_effect_details: (1..=4)
            .map(|level| SkillEffectDetail {
                level,
                activate_effect_duration: 5.0,
                activate_effect_value: value + 10.0 * f64::from(level - 1),
            })
            .collect(),
        skill_enhance: enhance.map(|v| SkillEnhance {
            activate_effect_value: v,
        }),
    }
}

fn skills() -> Vec<Skill> {
    let skill = |id, effects| Skill {
        id,
        description: String::new(),
        skill_effects: effects,
    };
    vec![
        skill(1, vec![effect(1, SkillEffectType::ScoreUp, 80.0, None)]),
        skill(2, vec![
            effect(1, SkillEffectType::ScoreUp, 20.0, None),
            effect(2, SkillEffectType::BoostFollowing, 15.0, None),
        ]),
        skill(3, vec![
            effect(1, SkillEffectType::ScoreUp, 10.0, None),
            effect(2, SkillEffectType::BoostNext, 60.0, None),
        ]),
        skill(4, vec![effect(1, SkillEffectType::ScoreUpUnitCount, 40.0, Some(10.0))]),
        skill(5, vec![
            effect(1, SkillEffectType::ScoreUpConditionLife, 60.0, None),
            effect(2, SkillEffectType::LifeRecovery, 400.0, None),
        ]),
    ]
}

fn card(id: CardId, character_id: CharacterId, power: u32, skill_id: u32, attribute: Attribute) -> Card {
    Card {
        id,
        character_id,
        rarity: if id % 3 == 0 { Rarity::Three } else { Rarity::Four },
        attribute,
        power: CardPower::new(power / 3, power / 3, power - 2 * (power / 3)),
        skill_id,
        support_unit: if character_id > 20 { Some(Unit::Nightcord) } else { None },
        prefix: format!("card {id}"),
    }
}

fn catalog() -> CardCatalog {
    let cards = vec![
        card(1, 1, 31_000, 1, Attribute::Cute),
        card(2, 2, 29_500, 2, Attribute::Cool),
        card(3, 17, 30_200, 3, Attribute::Mysterious),
        card(4, 18, 28_800, 4, Attribute::Mysterious),
        card(5, 19, 27_900, 4, Attribute::Pure),
        card(6, 21, 30_500, 5, Attribute::Happy),
        card(7, 9, 32_000, 1, Attribute::Cool),
        card(8, 1, 26_000, 2, Attribute::Cute),
        card(9, 20, 29_000, 4, Attribute::Mysterious),
    ];
    CardCatalog::new(cards, skills()).unwrap()
}

fn roster() -> Vec<RosterEntry> {
    (1..=9)
        .map(|id| {
            RosterEntry::new(id)
                .with_skill_level(1 + (id % 4) as u8)
                .with_master_rank((id % 6) as u8)
        })
        .collect()
}

fn music(encore: bool) -> Music {
    Music {
        id: 74,
        title: "Hibana".into(),
        note_count: 900,
        duration_secs: 125.0,
        skill_note_ratio: 0.12,
        encore,
        lyricist: String::new(),
        composer: String::new(),
    }
}

fn event() -> Event {
    Event {
        id: 88,
        name: "Nightcord".into(),
        event_type: "marathon".into(),
        bonus_characters: vec![
            EventCharacterBonus {
                character_id: 17,
                unit: None,
            },
            EventCharacterBonus {
                character_id: 21,
                unit: Some(Unit::Nightcord),
            },
        ],
        bonus_attribute: Some(Attribute::Mysterious),
        limited_card_ids: vec![3],
        rates: EventBonusRates::default(),
    }
}

fn permutations(items: &[DeckMember]) -> Vec<Vec<DeckMember>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut out = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let head = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, head);
            out.push(tail);
        }
    }
    out
}

fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    fn walk(start: usize, n: usize, k: usize, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        for i in start..n {
            current.push(i);
            walk(i + 1, n, k, current, out);
            current.pop();
        }
    }
    let mut out = Vec::new();
    walk(0, n, k, &mut Vec::new(), &mut out);
    out
}

/// Best objective over every subset and every order, scored by the reference evaluator.
fn brute_force_best(catalog: &CardCatalog, ctx: &Context<'_>, deck_size: usize) -> f64 {
    let members: Vec<DeckMember> = roster()
        .iter()
        .map(|entry| DeckMember::resolve(catalog, entry, ctx).unwrap())
        .collect();
    let mut best = f64::MIN;
    for pick in combinations(members.len(), deck_size) {
        let chosen: Vec<DeckMember> = pick.iter().map(|&i| members[i]).collect();
        let mut characters: Vec<_> = chosen.iter().map(|m| m.character_id).collect();
        characters.sort_unstable();
        characters.dedup();
        if characters.len() < deck_size {
            continue;
        }
        for order in permutations(&chosen) {
            best = best.max(score_deck(&order, ctx).objective);
        }
    }
    best
}

fn contexts<'a>(plain: &'a Music, encore: &'a Music, event: &'a Event) -> Vec<Context<'a>> {
    let mut area = BTreeMap::new();
    area.insert(Unit::Nightcord, 15.0);
    vec![
        Context::new(plain, LiveType::Multi),
        Context::new(encore, LiveType::Multi),
        Context::new(encore, LiveType::Auto).with_area_bonuses(AreaBonuses(area)),
        Context::new(encore, LiveType::Cheerful)
            .with_event(event)
            .with_criterion(RankingCriterion::Pt),
        Context::new(plain, LiveType::Multi)
            .with_event(event)
            .with_criterion(RankingCriterion::Efficiency)
            .with_costume_bonus(CostumeBonus {
                character_ids: vec![1, 2],
                percent: 10.0,
            }),
    ]
}

#[test]
fn branch_and_bound_matches_exhaustive_search() {
    let catalog = catalog();
    let (plain, encore, event) = (music(false), music(true), event());
    for ctx in contexts(&plain, &encore, &event) {
        for deck_size in [3, 4] {
            let constraints = SearchConstraints::for_context(&ctx)
                .with_deck_size(deck_size)
                .with_top_k(3);
            let outcome = search(&catalog, &roster(), &ctx, &constraints).unwrap();
            assert_eq!(outcome.status, SearchStatus::Complete);
            let best = outcome.best().unwrap().objective;
            let expected = brute_force_best(&catalog, &ctx, deck_size);
            assert!(
                (best - expected).abs() <= 1e-6 * expected.abs().max(1.0),
                "{} / {deck_size}: search {best} vs exhaustive {expected}",
                ctx.live_type
            );
        }
    }
}

#[test]
fn declared_totals_match_reference_rescoring() {
    let catalog = catalog();
    let (plain, encore, event) = (music(false), music(true), event());
    let entries = roster();
    for ctx in contexts(&plain, &encore, &event) {
        let constraints = SearchConstraints::for_context(&ctx).with_deck_size(5);
        let outcome = search(&catalog, &entries, &ctx, &constraints).unwrap();
        assert!(!outcome.decks.is_empty());

        for deck in &outcome.decks {
            let mut ids = deck.card_ids.clone();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), deck.card_ids.len(), "repeated card in {:?}", deck.card_ids);

            let members: Vec<DeckMember> = deck
                .card_ids
                .iter()
                .map(|id| {
                    let entry = entries.iter().find(|e| e.card_id == *id).unwrap();
                    DeckMember::resolve(&catalog, entry, &ctx).unwrap()
                })
                .collect();
            let rescored = score_deck(&members, &ctx);
            assert_eq!(rescored, deck.breakdown);
            assert_eq!(rescored.total_score, deck.total_score);

            let power: f64 = deck
                .card_ids
                .iter()
                .map(|id| {
                    let card = catalog.lookup(*id).unwrap();
                    let entry = entries.iter().find(|e| e.card_id == *id).unwrap();
                    f64::from(card.base_power()) * resolve_bonus(card, entry, &ctx).multiplier()
                })
                .sum();
            let skill: f64 = deck.breakdown.slots.iter().map(|s| s.skill_score).sum();
            assert!((power + skill - deck.total_score).abs() < 1e-6);
        }
    }
}

#[test]
fn greedy_never_beats_branch_and_bound() {
    let catalog = catalog();
    let (plain, encore, event) = (music(false), music(true), event());
    for ctx in contexts(&plain, &encore, &event) {
        let constraints = SearchConstraints::for_context(&ctx).with_deck_size(5);
        let optimal = search(&catalog, &roster(), &ctx, &constraints).unwrap();
        let baseline = greedy(&catalog, &roster(), &ctx, &constraints).unwrap();
        assert_eq!(baseline.decks.len(), 1);
        assert!(baseline.decks[0].objective <= optimal.decks[0].objective);
    }
}

#[test]
fn identical_requests_serialize_identically() {
    let catalog = catalog();
    let (encore, event) = (music(true), event());
    let ctx = Context::new(&encore, LiveType::Cheerful)
        .with_event(&event)
        .with_criterion(RankingCriterion::Efficiency);
    let constraints = SearchConstraints::for_context(&ctx).with_deck_size(5);
    let first = search(&catalog, &roster(), &ctx, &constraints).unwrap();
    let second = search(&catalog, &roster(), &ctx, &constraints).unwrap();
    assert_eq!(
        serde_json::to_string(&first.decks).unwrap(),
        serde_json::to_string(&second.decks).unwrap()
    );
    assert_eq!(first.nodes_expanded, second.nodes_expanded);
}

#[test]
fn node_cap_returns_best_so_far() {
    let catalog = catalog();
    let encore = music(true);
    let ctx = Context::new(&encore, LiveType::Multi);
    let constraints = SearchConstraints::for_context(&ctx)
        .with_deck_size(5)
        .with_budget(SearchBudget::default().with_node_cap(2));
    let outcome = search(&catalog, &roster(), &ctx, &constraints).unwrap();
    assert_eq!(outcome.status, SearchStatus::PartialTimeout);
    assert_eq!(outcome.nodes_expanded, 2);
    assert!(!outcome.decks.is_empty());

    let unlimited = SearchConstraints::for_context(&ctx).with_deck_size(5);
    let full = search(&catalog, &roster(), &ctx, &unlimited).unwrap();
    assert_eq!(full.status, SearchStatus::Complete);
    assert!(outcome.decks[0].objective <= full.decks[0].objective);
}

#[test]
fn boosting_cards_are_ordered_before_their_targets() {
    let catalog = catalog();
    let plain = music(false);
    let ctx = Context::new(&plain, LiveType::Multi);
    let constraints = SearchConstraints::for_context(&ctx).with_deck_size(5).with_top_k(1);
    let outcome = search(&catalog, &roster(), &ctx, &constraints).unwrap();
    let best = outcome.best().unwrap();
    if let Some(at) = best.card_ids.iter().position(|id| *id == 2) {
        // a boost-following card reaches everyone after it
        assert_eq!(at, 0, "{:?}", best.card_ids);
    }
    if let Some(at) = best.card_ids.iter().position(|id| *id == 3) {
        assert!(at + 1 < best.card_ids.len(), "{:?}", best.card_ids);
    }
}
