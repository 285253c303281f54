use approx::assert_abs_diff_eq;
use chrono::Duration;
use serial_test::serial;
use skill_rating::{
    database::{db::DbClient, db_structs::RatingHistoryEntry, RatingStore, StoreError},
    model::{
        aggregator::SetWindow,
        constants::DEFAULT_RATING,
        orchestrator::RatingUpdater,
        rating_lookup::RatingLookup,
        replay::replay,
        structures::rating_source::RatingSource
    },
    utils::test_utils::{base_time, doubles_set, generate_set, generate_sets, guest, registered}
};

use super::test_helpers::TestDatabase;
use crate::common::init_test_env;

async fn connect(test_db: &TestDatabase) -> DbClient {
    DbClient::connect(&test_db.connection_string)
        .await
        .expect("Failed to connect")
}

#[tokio::test]
#[serial]
async fn test_get_set_keeps_score_order() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    let set = doubles_set(1, (registered(1), guest(1)), (registered(2), registered(3)), (6, 4), 0);
    test_db.seed_sets(&[set.clone()]).await.expect("Failed to seed test data");

    let db_client = connect(&test_db).await;

    assert_eq!(db_client.get_set(1).await.unwrap(), Some(set));
    assert_eq!(db_client.get_set(2).await.unwrap(), None);
}

#[tokio::test]
#[serial]
async fn test_malformed_score_is_rejected() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    test_db
        .seed_sets(&[generate_set(1, &[(registered(1), 6), (registered(2), 4)], 0)])
        .await
        .expect("Failed to seed test data");

    let client = test_db.get_client().await.unwrap();
    client
        .batch_execute(
            "ALTER TABLE set_scores DROP CONSTRAINT set_scores_one_participant;
            INSERT INTO set_scores (set_id, user_id, guest_id, games_won) VALUES (1, NULL, NULL, 3);"
        )
        .await
        .unwrap();

    let db_client = connect(&test_db).await;

    assert!(matches!(
        db_client.get_set(1).await,
        Err(StoreError::MalformedScore { set_id: 1, .. })
    ));
}

#[tokio::test]
#[serial]
async fn test_ratings_read_and_write() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    test_db
        .seed_sets(&[generate_set(1, &[(registered(1), 6), (registered(2), 4)], 0)])
        .await
        .expect("Failed to seed test data");

    let db_client = connect(&test_db).await;

    assert_eq!(db_client.get_rating(1).await.unwrap(), None);
    assert!(db_client.get_ratings(&[1, 2]).await.unwrap().is_empty());

    db_client.set_rating(1, 6.25, base_time()).await.unwrap();

    assert_eq!(db_client.get_rating(1).await.unwrap(), Some(6.25));
    let ratings = db_client.get_ratings(&[1, 2, 3]).await.unwrap();
    assert_eq!(ratings.len(), 1);
    assert_eq!(ratings.get(&1), Some(&6.25));

    assert!(matches!(
        db_client.set_rating(99, 6.0, base_time()).await,
        Err(StoreError::PlayerNotFound(99))
    ));

    db_client.reset_all_ratings().await.unwrap();
    assert_eq!(db_client.get_rating(1).await.unwrap(), Some(DEFAULT_RATING));
    assert_eq!(db_client.get_rating(2).await.unwrap(), Some(DEFAULT_RATING));
}

#[tokio::test]
#[serial]
async fn test_recent_sets_window_and_order() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    test_db
        .seed_sets(&[
            generate_set(1, &[(registered(1), 6), (registered(2), 4)], -400),
            generate_set(2, &[(registered(1), 6), (registered(2), 4)], -10),
            generate_set(3, &[(registered(1), 6), (registered(2), 4)], -10),
            generate_set(4, &[(registered(3), 6), (registered(2), 4)], -5),
            generate_set(5, &[(registered(1), 6), (registered(2), 4)], 2),
        ])
        .await
        .expect("Failed to seed test data");

    let db_client = connect(&test_db).await;

    let sets = db_client
        .get_recent_sets(1, &SetWindow::at(base_time()), 30)
        .await
        .unwrap();
    assert_eq!(sets.iter().map(|s| s.id).collect::<Vec<_>>(), vec![3, 2]);

    let limited = db_client
        .get_recent_sets(2, &SetWindow::at(base_time()), 2)
        .await
        .unwrap();
    assert_eq!(limited.iter().map(|s| s.id).collect::<Vec<_>>(), vec![4, 3]);

    let all = db_client.get_all_sets_chronological().await.unwrap();
    assert_eq!(all.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
#[serial]
async fn test_recent_sets_through_a_set_skip_later_ids_at_same_instant() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    let sets = vec![
        generate_set(4, &[(registered(1), 6), (registered(2), 4)], -1),
        generate_set(7, &[(registered(1), 6), (registered(2), 4)], 0),
        generate_set(8, &[(registered(1), 6), (registered(2), 4)], 0),
        generate_set(9, &[(registered(1), 6), (registered(2), 4)], 0),
    ];
    test_db.seed_sets(&sets).await.expect("Failed to seed test data");

    let db_client = connect(&test_db).await;

    let through = db_client
        .get_recent_sets(1, &SetWindow::through(&sets[2]), 30)
        .await
        .unwrap();
    assert_eq!(through.iter().map(|s| s.id).collect::<Vec<_>>(), vec![8, 7, 4]);

    let live = db_client
        .get_recent_sets(1, &SetWindow::at(base_time()), 30)
        .await
        .unwrap();
    assert_eq!(live.iter().map(|s| s.id).collect::<Vec<_>>(), vec![9, 8, 7, 4]);
}

#[tokio::test]
#[serial]
async fn test_history_round_trip() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    test_db
        .seed_sets(&[generate_set(1, &[(registered(1), 6), (registered(2), 4)], 0)])
        .await
        .expect("Failed to seed test data");

    let db_client = connect(&test_db).await;
    let entries = vec![
        RatingHistoryEntry {
            user_id: 1,
            rating: 5.8,
            previous_rating: None,
            set_id: Some(1),
            match_rating: Some(5.8),
            source: RatingSource::Match,
            created_at: base_time()
        },
        RatingHistoryEntry {
            user_id: 1,
            rating: 5.0,
            previous_rating: Some(5.8),
            set_id: None,
            match_rating: None,
            source: RatingSource::Recalculation,
            created_at: base_time() + Duration::days(1)
        },
    ];

    for entry in &entries {
        db_client.append_history(entry).await.unwrap();
    }

    assert_eq!(db_client.get_history(1).await.unwrap(), entries);
    assert!(db_client.get_history(2).await.unwrap().is_empty());

    db_client.clear_all_history().await.unwrap();
    assert!(db_client.get_history(1).await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_recompute_player_persists_everything() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    test_db
        .seed_sets(&[doubles_set(1, (registered(1), guest(1)), (registered(2), guest(2)), (6, 4), 0)])
        .await
        .expect("Failed to seed test data");

    let updater = RatingUpdater::new(connect(&test_db).await);

    updater.recompute_player(1, Some(1), base_time()).await.unwrap();
    // A second run overwrites the match record instead of adding one
    let result = updater.recompute_player(1, Some(1), base_time()).await.unwrap();

    assert_abs_diff_eq!(updater.current_rating(1).await.unwrap(), result.new_rating());

    let record = updater.store().get_match_rating(1, 1).await.unwrap().unwrap();
    assert_eq!(Some(&record), result.match_record.as_ref());

    let count: i64 = test_db
        .get_client()
        .await
        .unwrap()
        .query_one("SELECT COUNT(*) FROM match_ratings", &[])
        .await
        .unwrap()
        .get(0);
    assert_eq!(count, 1);
    assert_eq!(updater.store().get_history(1).await.unwrap().len(), 2);
}

#[tokio::test]
#[serial]
async fn test_replay_all_matches_pure_replay() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    let sets = generate_sets(40, &[1, 2, 3, 4, 5, 6], 31);
    test_db.seed_sets(&sets).await.expect("Failed to seed test data");

    let updater = RatingUpdater::new(connect(&test_db).await);

    let as_of = base_time() + Duration::days(40);
    let summary = updater.replay_all(as_of).await.unwrap();
    assert_eq!(summary.sets_processed, 40);
    assert!(summary.failures.is_empty());

    let expected = replay(&sets, as_of);
    for id in 1..=6 {
        assert_eq!(updater.current_rating(id).await.unwrap(), expected.rating(id));
        assert_eq!(updater.store().get_history(id).await.unwrap(), expected.history(id));
    }

    // Running it again changes nothing
    updater.replay_all(as_of).await.unwrap();
    for id in 1..=6 {
        assert_eq!(updater.current_rating(id).await.unwrap(), expected.rating(id));
    }
}
