use sekai_core::catalog::MasterData;
use sekai_core::context::{LiveRules, LiveType, RankingCriterion};
use sekai_core::roster::RosterEntry;
use sekai_core::search::{SearchBudget, SearchStatus};
use sekai_recommend::{
    DeckRecommender, GreedyPlanner, PlannerKind, RecommendError, RecommendFeatures, RecommendRequest,
};
use std::sync::Arc;
use std::thread;

const MASTER: &str = r#"{
    "skills": [
        {"id": 1, "description": "Score +{{1;v}}% for {{1;d}} seconds.", "skillEffects": [
            {"id": 1, "skillEffectType": "score_up", "skillEffectDetails": [
                {"level": 1, "activateEffectDuration": 5, "activateEffectValue": 60},
                {"level": 2, "activateEffectDuration": 5, "activateEffectValue": 80}]}]},
        {"id": 2, "description": "{{1;c}} boosts the next skill by {{2;v}}%.", "skillEffects": [
            {"id": 1, "skillEffectType": "score_up", "skillEffectDetails": [
                {"level": 1, "activateEffectValue": 20}]},
            {"id": 2, "skillEffectType": "boost_next", "skillEffectDetails": [
                {"level": 1, "activateEffectValue": 50}]}]}
    ],
    "cards": [
        {"id": 101, "characterId": 1, "cardRarityType": "rarity_4", "attr": "cool", "skillId": 1,
         "power": {"performance": 11000, "technique": 10000, "stamina": 9000}},
        {"id": 102, "characterId": 2, "cardRarityType": "rarity_4", "attr": "happy", "skillId": 2,
         "power": {"performance": 10000, "technique": 10500, "stamina": 9500}},
        {"id": 103, "characterId": 6, "cardRarityType": "rarity_3", "attr": "pure", "skillId": 1,
         "power": {"performance": 9000, "technique": 9000, "stamina": 9000}},
        {"id": 104, "characterId": 21, "cardRarityType": "rarity_birthday", "attr": "cute",
         "skillId": 2, "supportUnit": "ws",
         "power": {"performance": 9800, "technique": 9900, "stamina": 10000}},
        {"id": 105, "characterId": 13, "cardRarityType": "rarity_2", "attr": "mysterious",
         "skillId": 1, "power": {"performance": 7000, "technique": 7000, "stamina": 7000}},
        {"id": 106, "characterId": 14, "cardRarityType": "rarity_4", "attr": "cool", "skillId": 1,
         "power": {"performance": 10200, "technique": 10100, "stamina": 10000}},
        {"id": 107, "characterId": 21, "cardRarityType": "rarity_4", "attr": "cool", "skillId": 1,
         "power": {"performance": 9000, "technique": 9000, "stamina": 9000}}
    ],
    "musics": [
        {"id": 1, "title": "Sekai", "durationSecs": 100.0},
        {"id": 226, "title": "Pinned", "durationSecs": 90.0},
        {"id": 3, "title": "Third", "durationSecs": 150.0, "encore": false}
    ],
    "events": [{"id": 7, "name": "Wonder", "bonusCharacters": [{"characterId": 14}],
                "bonusAttribute": "cool"}],
    "musicMetas": [
        {"music_id": 3, "difficulty": "master", "pspi_multi_pt_max": 300.0, "pspi_solo_score": 2.0},
        {"music_id": 1, "difficulty": "expert", "pspi_multi_pt_max": 200.0, "pspi_solo_score": 3.0},
        {"music_id": 226, "difficulty": "master", "pspi_multi_pt_max": 100.0}
    ]
}"#;

fn recommender() -> DeckRecommender {
    let data = Arc::new(MasterData::from_json(MASTER).unwrap());
    DeckRecommender::new(data)
        .with_planner(PlannerKind::BranchAndBound.planner())
        .with_features(RecommendFeatures::default())
}

fn roster() -> Vec<RosterEntry> {
    [101, 102, 103, 104, 105, 106, 107]
        .into_iter()
        .map(RosterEntry::new)
        .collect()
}

#[test]
fn recommends_ranked_decks_with_breakdown() {
    let recommender = recommender();
    let mut request = RecommendRequest::new(roster(), 1, LiveType::Multi);
    request.event_id = Some(7);
    request.criterion = RankingCriterion::Pt;
    request.top_k = 3;

    let response = recommender.recommend(&request).unwrap();
    assert_eq!(response.status, SearchStatus::Complete);
    assert_eq!(response.criterion, RankingCriterion::Pt);
    assert_eq!(response.planner, "branch_and_bound");
    assert_eq!(response.decks.len(), 3);
    for (index, deck) in response.decks.iter().enumerate() {
        assert_eq!(deck.rank, index + 1);
        assert_eq!(deck.slots.len(), 5);
        assert_eq!(deck.objective, deck.event_points);
        let slot_total: f64 = deck
            .slots
            .iter()
            .map(|slot| slot.effective_power + slot.skill_score)
            .sum();
        assert!((slot_total - deck.total_score).abs() < 1e-6);
    }
    assert!(response.decks[0].objective >= response.decks[2].objective);
    // card 106 carries both the character and the attribute bonus
    assert!(response.decks[0].card_ids.contains(&106));
    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("\"status\":\"complete\""));
}

#[test]
fn unavailable_criteria_fall_back_to_score() {
    let recommender = recommender();
    let mut request = RecommendRequest::new(roster(), 1, LiveType::Solo);
    request.criterion = RankingCriterion::Efficiency;
    request.event_id = Some(7);
    let response = recommender.recommend(&request).unwrap();
    assert_eq!(response.criterion, RankingCriterion::Score);

    let mut no_event = RecommendRequest::new(roster(), 1, LiveType::Multi);
    no_event.criterion = RankingCriterion::Pt;
    let response = recommender.recommend(&no_event).unwrap();
    assert_eq!(response.criterion, RankingCriterion::Score);
    assert_eq!(response.decks[0].objective, response.decks[0].total_score);
}

#[test]
fn missing_ids_are_reported() {
    let recommender = recommender();
    let request = RecommendRequest::new(roster(), 99, LiveType::Multi);
    assert_eq!(
        recommender.recommend(&request).unwrap_err(),
        RecommendError::NotFound { kind: "music", id: 99 }
    );

    let mut request = RecommendRequest::new(roster(), 1, LiveType::Multi);
    request.event_id = Some(8);
    assert_eq!(
        recommender.recommend(&request).unwrap_err(),
        RecommendError::NotFound { kind: "event", id: 8 }
    );

    let request = RecommendRequest::new(vec![RosterEntry::new(555)], 1, LiveType::Multi);
    assert_eq!(
        recommender.recommend(&request).unwrap_err(),
        RecommendError::NotFound { kind: "card", id: 555 }
    );

    let request = RecommendRequest::new(
        vec![RosterEntry::new(101).with_skill_level(4)],
        1,
        LiveType::Multi,
    );
    assert_eq!(
        recommender.recommend(&request).unwrap_err(),
        RecommendError::InvalidLevel { skill_id: 1, level: 4 }
    );

    let mut request = RecommendRequest::new(roster(), 1, LiveType::Multi);
    request.deck_size = 9;
    assert!(matches!(
        recommender.recommend(&request),
        Err(RecommendError::InvalidRequest(_))
    ));
}

#[test]
fn negative_auto_skill_factor_fails_the_request() {
    let recommender = recommender();
    let mut request = RecommendRequest::new(roster(), 1, LiveType::Auto);
    request.deck_size = 1;
    request.rules = Some(LiveRules {
        auto_skill_factor: -1.0,
        ..LiveRules::default()
    });
    let err = recommender.recommend(&request).unwrap_err();
    assert!(matches!(err, RecommendError::InvalidRequest(ref msg) if msg.contains("auto_skill_factor")));
}

#[test]
fn small_rosters_are_reported_not_failed() {
    let recommender = recommender();
    let request = RecommendRequest::new(
        vec![RosterEntry::new(101), RosterEntry::new(102)],
        1,
        LiveType::Multi,
    );
    let response = recommender.recommend(&request).unwrap();
    assert_eq!(response.status, SearchStatus::InsufficientRoster);
    assert!(response.decks.is_empty());
}

#[test]
fn challenge_lives_use_one_character() {
    let recommender = recommender();
    let mut request = RecommendRequest::new(roster(), 1, LiveType::Challenge);
    request.challenge_character_id = Some(21);
    request.deck_size = 2;
    let response = recommender.recommend(&request).unwrap();
    assert_eq!(response.status, SearchStatus::Complete);
    assert_eq!(response.criterion, RankingCriterion::Score);
    let mut ids = response.decks[0].card_ids.clone();
    ids.sort_unstable();
    assert_eq!(ids, vec![104, 107]);
    assert!(response.decks[0].slots.iter().all(|s| s.character == "Hatsune Miku"));
}

#[test]
fn greedy_planner_is_never_better() {
    let data = Arc::new(MasterData::from_json(MASTER).unwrap());
    let exact = DeckRecommender::new(Arc::clone(&data))
        .with_planner(PlannerKind::BranchAndBound.planner());
    let greedy = DeckRecommender::new(data).with_planner(Box::new(GreedyPlanner));
    let request = RecommendRequest::new(roster(), 3, LiveType::Auto);
    let best = exact.recommend(&request).unwrap();
    let baseline = greedy.recommend(&request).unwrap();
    assert_eq!(baseline.planner, "greedy");
    assert_eq!(baseline.decks.len(), 1);
    assert!(baseline.decks[0].objective <= best.decks[0].objective);
}

#[test]
fn exhausted_budget_returns_partial_results() {
    let recommender = recommender();
    let mut request = RecommendRequest::new(roster(), 1, LiveType::Multi);
    request.budget = Some(SearchBudget::default().with_node_cap(1));
    let response = recommender.recommend(&request).unwrap();
    assert_eq!(response.status, SearchStatus::PartialTimeout);
    assert!(!response.decks.is_empty());
}

#[test]
fn shared_recommender_is_deterministic_across_threads() {
    let recommender = Arc::new(recommender());
    let mut request = RecommendRequest::new(roster(), 1, LiveType::Cheerful);
    request.event_id = Some(7);
    request.criterion = RankingCriterion::Efficiency;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let recommender = Arc::clone(&recommender);
            let request = request.clone();
            thread::spawn(move || {
                let response = recommender.recommend(&request).unwrap();
                serde_json::to_string(&response.decks).unwrap()
            })
        })
        .collect();
    let results: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.iter().all(|r| r == &results[0]));
}

#[test]
fn music_suggestions_and_skill_text() {
    let recommender = recommender();
    let picks = recommender.recommend_musics(LiveType::Multi, RankingCriterion::Pt);
    let ids: Vec<_> = picks.iter().map(|p| (p.music_id, p.pinned)).collect();
    assert_eq!(ids, vec![(226, true), (3, false)]);

    let picks = recommender.recommend_musics(LiveType::Solo, RankingCriterion::Score);
    assert_eq!(picks[0].music_id, 1);

    assert_eq!(
        recommender.describe_skill(101, 2).unwrap(),
        "Score +80% for 5 seconds."
    );
    assert_eq!(
        recommender.describe_skill(102, 1).unwrap(),
        "Tenma Saki boosts the next skill by 50%."
    );
    assert_eq!(
        recommender.describe_skill(102, 2).unwrap_err(),
        RecommendError::InvalidLevel { skill_id: 2, level: 2 }
    );
}
