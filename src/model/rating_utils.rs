use chrono::{DateTime, FixedOffset};

use crate::model::constants::{
    COMPETITIVENESS_GAME_SPAN, EXPECTED_SCORE_DIVISOR, FORMAT_BASE, FORMAT_GAME_SPAN, MATCH_AGE_LIMIT_DAYS,
    MAX_FORMAT_WEIGHT, MAX_RATING, MIN_COMPETITIVENESS, MIN_RATING
};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Probability that a side rated `player_rating` beats a side rated `opponent_rating`.
///
/// `E = 1 / (1 + 10^((opponent - player) / 2.5))`, so `E(a, b) + E(b, a) == 1`.
pub fn expected_win_pct(player_rating: f64, opponent_rating: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent_rating - player_rating) / EXPECTED_SCORE_DIVISOR))
}

/// Doubles team rating: the plain mean of both players.
pub fn team_rating(first: f64, second: f64) -> f64 {
    (first + second) / 2.0
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean_rating(ratings: &[f64]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }

    Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
}

/// How much a single match counts: competitiveness × format.
///
/// Close scores approach 1.0 competitiveness and blowouts floor at 0.5.
/// Longer matches count for more, capped at 1.5. The result is always positive.
pub fn match_weight(player_games: f64, opponent_games: f64, total_games: f64) -> f64 {
    let competitiveness =
        (1.0 - (player_games - opponent_games).abs() / COMPETITIVENESS_GAME_SPAN).max(MIN_COMPETITIVENESS);
    let format = (FORMAT_BASE + total_games / FORMAT_GAME_SPAN).min(MAX_FORMAT_WEIGHT);

    competitiveness * format
}

/// Linear decay from 1.0 for a match played at `now` down to 0.0 at
/// [`MATCH_AGE_LIMIT_DAYS`]. Anything at or past the limit weighs nothing,
/// a match dated after `now` weighs 1.0.
pub fn recency_weight(match_date: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> f64 {
    let age_days = now.signed_duration_since(match_date).num_seconds() as f64 / SECONDS_PER_DAY;
    let limit = MATCH_AGE_LIMIT_DAYS as f64;

    if age_days <= 0.0 {
        return 1.0;
    }

    if age_days >= limit {
        return 0.0;
    }

    1.0 - age_days / limit
}

pub fn clamp_rating(rating: f64) -> f64 {
    rating.clamp(MIN_RATING, MAX_RATING)
}
