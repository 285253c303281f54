use serde::{Deserialize, Serialize};

use crate::{
    database::db_structs::Set,
    model::{
        constants::{ADJUSTMENT_FACTOR, DEFAULT_RATING},
        rating_lookup::RatingLookup,
        rating_utils::{clamp_rating, expected_win_pct, match_weight, mean_rating, team_rating},
        structures::participant::{Participant, UserId},
        teams::sides_for
    }
};

/// What one set says about one player's rating. Only an input to
/// aggregation, never the stored rating itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRatingSample {
    /// Performance-implied rating for this set alone, within the valid range
    pub match_rating: f64,
    pub expected_win_pct: f64,
    pub actual_win_pct: f64,
    pub match_weight: f64,
    /// The target's rating going into the set
    pub player_rating: f64,
    pub teammate_rating: f64,
    pub player_team_rating: f64,
    pub opponent_team_rating: f64,
    pub player_team_games: i32,
    pub opponent_games: i32
}

/// # Match rating
///
/// Rates `user_id`'s performance in a single set.
///
/// Steps:
/// 1. Find the player's score row and split the set into teammates and opponents by
///     equal `games_won`.
/// 2. Resolve ratings. Registered players use their current rating; guests (and a
///     missing teammate) are estimated as the mean rating of every other registered
///     player in the set.
/// 3. Compare the actual share of games won with the expected win probability of the
///     two team ratings and move the player's rating by the difference × 8.
///
/// Returns `None` when the player did not play the set or the set has no opponent.
pub fn calculate_match_rating<L: RatingLookup + ?Sized>(
    user_id: UserId,
    set: &Set,
    ratings: &L
) -> Option<MatchRatingSample> {
    let target = Participant::Registered(user_id);
    let sides = sides_for(&set.scores, target)?;

    if sides.opponents.is_empty() {
        return None;
    }

    let guest_rating = guest_rating_estimate(user_id, set, ratings);
    let resolve = |participant: &Participant| match participant {
        Participant::Registered(id) => ratings.rating(*id),
        Participant::Guest(_) => guest_rating
    };

    let player_rating = ratings.rating(user_id);
    let teammate_rating = sides.teammates.first().map(resolve).unwrap_or(guest_rating);
    let player_team_rating = team_rating(player_rating, teammate_rating);

    let opponent_ratings: Vec<f64> = sides.opponent_members().map(resolve).collect();
    let opponent_team_rating = mean_rating(&opponent_ratings).unwrap_or(DEFAULT_RATING);

    let player_team_games = sides.player_games;
    let opponent_games = sides.opponent_games();
    let total_games = player_team_games + opponent_games;

    let expected = expected_win_pct(player_team_rating, opponent_team_rating);
    let actual = if total_games == 0 {
        0.5
    } else {
        player_team_games as f64 / total_games as f64
    };

    Some(MatchRatingSample {
        match_rating: clamp_rating(player_rating + (actual - expected) * ADJUSTMENT_FACTOR),
        expected_win_pct: expected,
        actual_win_pct: actual,
        match_weight: match_weight(player_team_games as f64, opponent_games as f64, total_games as f64),
        player_rating,
        teammate_rating,
        player_team_rating,
        opponent_team_rating,
        player_team_games,
        opponent_games
    })
}

/// Guests have no history, so they are assumed to play at the level of the
/// registered players around them. Every registered player in the set other than
/// the target counts, whichever side they are on.
fn guest_rating_estimate<L: RatingLookup + ?Sized>(user_id: UserId, set: &Set, ratings: &L) -> f64 {
    let others: Vec<f64> = set
        .registered_players()
        .into_iter()
        .filter(|id| *id != user_id)
        .map(|id| ratings.rating(id))
        .collect();

    mean_rating(&others).unwrap_or(DEFAULT_RATING)
}
