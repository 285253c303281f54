use chrono::Duration;
use skill_rating::{
    database::{memory::InMemoryStore, RatingStore},
    model::{
        constants::DEFAULT_RATING,
        orchestrator::RatingUpdater,
        rating_lookup::RatingLookup,
        replay::{players_in_order, replay}
    },
    utils::test_utils::{base_time, doubles_set, generate_sets, guest, registered}
};

use crate::common::init_test_env;

/// Incremental per-set recomputes in chronological order, each evaluated when its
/// set was created, followed by one refresh of every player, end in the same
/// state as the pure replay.
#[tokio::test]
async fn test_incremental_recompute_matches_replay() {
    init_test_env();
    let sets = generate_sets(50, &[1, 2, 3, 4, 5, 6], 17);
    let updater = RatingUpdater::new(InMemoryStore::new());

    // Sets arrive one at a time, as they would when created
    for set in &sets {
        updater.store().insert_set(set.clone()).unwrap();
        let report = updater.recompute_set(set.id, set.created_at).await.unwrap();
        assert!(report.failures.is_empty());
    }

    let as_of = base_time() + Duration::days(50);
    for user_id in players_in_order(&sets) {
        updater.recompute_player(user_id, None, as_of).await.unwrap();
    }

    let expected = replay(&sets, as_of);
    for id in 1..=6 {
        assert_eq!(updater.current_rating(id).await.unwrap(), expected.rating(id));
        assert_eq!(updater.store().get_history(id).await.unwrap(), expected.history(id));
    }
}

/// Editing a past set and replaying gives the same ratings as if the set had
/// always had its new score.
#[tokio::test]
async fn test_edit_then_replay() {
    init_test_env();
    let mut sets = generate_sets(30, &[1, 2, 3, 4, 5], 4);
    let updater = RatingUpdater::new(InMemoryStore::with_sets(&sets).unwrap());
    let as_of = base_time() + Duration::days(30);
    updater.replay_all(as_of).await.unwrap();

    sets[10] = doubles_set(sets[10].id, (registered(1), registered(2)), (registered(3), registered(4)), (7, 0), 10);
    updater.store().insert_set(sets[10].clone()).unwrap();
    updater.replay_all(as_of).await.unwrap();

    let expected = replay(&sets, as_of);
    for id in 1..=5 {
        assert_eq!(updater.current_rating(id).await.unwrap(), expected.rating(id));
    }
}

/// Deleting a set and recomputing its former players drops it from their ratings
#[tokio::test]
async fn test_delete_then_recompute_players() {
    init_test_env();
    let set = doubles_set(1, (registered(1), guest(1)), (registered(2), guest(2)), (6, 0), 0);
    let updater = RatingUpdater::new(InMemoryStore::with_sets(&[set.clone()]).unwrap());
    updater.recompute_set(1, base_time()).await.unwrap();
    assert!(updater.current_rating(1).await.unwrap() > DEFAULT_RATING);

    let removed = updater.store().remove_set(1).unwrap().unwrap();
    for user_id in removed.registered_players() {
        updater.recompute_player(user_id, None, base_time()).await.unwrap();
    }

    assert_eq!(updater.current_rating(1).await.unwrap(), DEFAULT_RATING);
    assert_eq!(updater.current_rating(2).await.unwrap(), DEFAULT_RATING);
    assert_eq!(updater.store().get_history(1).await.unwrap().len(), 2);
}

/// The stronger pair by record is favoured by the predictor afterwards
#[tokio::test]
async fn test_predict_after_results() {
    init_test_env();
    let sets: Vec<_> = (1..=5)
        .map(|i| doubles_set(i, (registered(1), registered(2)), (registered(3), registered(4)), (6, 2), i as i64))
        .collect();
    let updater = RatingUpdater::new(InMemoryStore::with_sets(&sets).unwrap());
    updater.replay_all(base_time() + Duration::days(6)).await.unwrap();

    let prediction = updater
        .predict_match(&[registered(1), registered(2)], &[registered(3), registered(4)])
        .await
        .unwrap();

    assert!(prediction.team1_expected_win_pct > 0.5);
    assert_eq!(prediction.expected_score[0].team1_games, 6);
    assert_eq!(prediction.expected_score.len(), 3);
}
