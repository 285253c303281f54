use std::cmp::Ordering;

use chrono::{DateTime, Duration, FixedOffset};
use itertools::Itertools;
use serde::Serialize;

use crate::{
    database::db_structs::{Set, SetId},
    model::{
        constants::{DEFAULT_RATING, MATCH_AGE_LIMIT_DAYS, MAX_MATCHES_TO_CONSIDER},
        match_rating::calculate_match_rating,
        rating_lookup::RatingLookup,
        rating_utils::{clamp_rating, recency_weight},
        structures::participant::UserId
    }
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregatedRating {
    pub rating: f64,
    /// Sets which produced a sample
    pub samples_used: usize,
    /// Σ(match weight × recency weight)
    pub total_weight: f64
}

/// Start of the window of sets which may count towards a rating evaluated at `as_of`
pub fn window_start(as_of: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    as_of - Duration::days(MATCH_AGE_LIMIT_DAYS)
}

/// Bounds of the sets which may count towards a rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetWindow {
    pub since: DateTime<FixedOffset>,
    /// Evaluation instant, inclusive
    pub until: DateTime<FixedOffset>,
    /// Sets created exactly at `until` only count up to this id
    pub last_set_id: Option<SetId>
}

impl SetWindow {
    /// Every set within the age limit of `as_of`
    pub fn at(as_of: DateTime<FixedOffset>) -> SetWindow {
        SetWindow {
            since: window_start(as_of),
            until: as_of,
            last_set_id: None
        }
    }

    /// What a replay sees while processing `set`: every earlier set in
    /// `(created_at, id)` order and `set` itself, evaluated at its creation time
    pub fn through(set: &Set) -> SetWindow {
        SetWindow {
            last_set_id: Some(set.id),
            ..SetWindow::at(set.created_at)
        }
    }

    pub fn as_of(&self) -> DateTime<FixedOffset> {
        self.until
    }

    pub fn contains(&self, set: &Set) -> bool {
        if set.created_at < self.since || set.created_at > self.until {
            return false;
        }

        match self.last_set_id {
            Some(id) => set.created_at < self.until || set.id <= id,
            None => true
        }
    }
}

/// Picks the sets which qualify for a player's rating: sets the player took part
/// in within `window`, newest first by `(created_at, id)`, at most `limit` of them.
pub fn select_recent_sets<'a, I>(sets: I, user_id: UserId, window: &SetWindow, limit: usize) -> Vec<&'a Set>
where
    I: IntoIterator<Item = &'a Set>
{
    sets.into_iter()
        .filter(|s| window.contains(s) && s.has_player(user_id))
        .sorted_by(|a, b| newest_first(a, b))
        .take(limit)
        .collect()
}

/// Descending `(created_at, id)`
pub fn newest_first(a: &Set, b: &Set) -> Ordering {
    b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
}

/// # Player rating
///
/// Recency- and weight-adjusted mean of the player's recent match ratings.
///
/// `recent_sets` are expected newest-first, as returned by the store; at most
/// [`MAX_MATCHES_TO_CONSIDER`] are used. Sets without a sample are skipped. With no
/// samples, or samples weighing nothing in total, the player is rated
/// [`DEFAULT_RATING`].
pub fn aggregate_rating<L: RatingLookup + ?Sized>(
    user_id: UserId,
    recent_sets: &[Set],
    ratings: &L,
    as_of: DateTime<FixedOffset>
) -> AggregatedRating {
    let mut samples_used = 0;
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;

    for set in recent_sets.iter().take(MAX_MATCHES_TO_CONSIDER) {
        let Some(sample) = calculate_match_rating(user_id, set, ratings) else {
            continue;
        };

        let weight = sample.match_weight * recency_weight(set.created_at, as_of);
        weighted_sum += sample.match_rating * weight;
        total_weight += weight;
        samples_used += 1;
    }

    let rating = if total_weight > 0.0 {
        clamp_rating(weighted_sum / total_weight)
    } else {
        DEFAULT_RATING
    };

    AggregatedRating {
        rating,
        samples_used,
        total_weight
    }
}
