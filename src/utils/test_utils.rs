use crate::{
    database::db_structs::{Score, Set, SetId},
    model::structures::participant::{GuestId, Participant, UserId}
};
use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

/// Fixed reference instant all generated sets are dated against
pub fn base_time() -> DateTime<FixedOffset> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap().fixed_offset()
}

pub fn registered(user_id: UserId) -> Participant {
    Participant::Registered(user_id)
}

pub fn guest(guest_id: GuestId) -> Participant {
    Participant::Guest(guest_id)
}

pub fn generate_scores(scores: &[(Participant, i32)]) -> Vec<Score> {
    scores
        .iter()
        .map(|(participant, games_won)| Score {
            participant: *participant,
            games_won: *games_won
        })
        .collect()
}

/// A set created `day_offset` days after [`base_time`] (negative for earlier)
pub fn generate_set(id: SetId, scores: &[(Participant, i32)], day_offset: i64) -> Set {
    Set {
        id,
        created_at: base_time() + Duration::days(day_offset),
        scores: generate_scores(scores)
    }
}

/// A doubles set: `team1` won `games.0` games, `team2` won `games.1`
pub fn doubles_set(
    id: SetId,
    team1: (Participant, Participant),
    team2: (Participant, Participant),
    games: (i32, i32),
    day_offset: i64
) -> Set {
    generate_set(
        id,
        &[(team1.0, games.0), (team1.1, games.0), (team2.0, games.1), (team2.1, games.1)],
        day_offset
    )
}

pub fn ratings_of(ratings: &[(UserId, f64)]) -> HashMap<UserId, f64> {
    ratings.iter().copied().collect()
}

/// Generates `n` random doubles sets between `player_ids`, one day apart starting at
/// [`base_time`]. Roughly one set in five has a guest standing in for a player.
///
/// At least four player ids are required.
pub fn generate_sets(n: i32, player_ids: &[UserId], seed: u64) -> Vec<Set> {
    if player_ids.len() < 4 {
        panic!("At least four players are needed for a doubles set");
    }

    // Seeded for reproducible results
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut pool = player_ids.to_vec();
    let mut sets = Vec::with_capacity(n as usize);

    for id in 1..=n {
        pool.shuffle(&mut rng);

        let mut players: Vec<Participant> = pool.iter().take(4).map(|id| registered(*id)).collect();
        if rng.random_bool(0.2) {
            let slot = rng.random_range(0..4);
            players[slot] = guest(id);
        }

        let winner_games = rng.random_range(4..=7);
        let loser_games = rng.random_range(0..winner_games);
        let games = if rng.random_bool(0.5) {
            (winner_games, loser_games)
        } else {
            (loser_games, winner_games)
        };

        sets.push(doubles_set(
            id,
            (players[0], players[1]),
            (players[2], players[3]),
            games,
            (id - 1) as i64
        ));
    }

    sets
}
