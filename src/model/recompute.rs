use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::{
    database::db_structs::{MatchRatingRecord, RatingHistoryEntry, Set},
    model::{
        aggregator::{aggregate_rating, AggregatedRating},
        constants::DEFAULT_RATING,
        match_rating::calculate_match_rating,
        rating_lookup::RatingLookup,
        structures::{participant::UserId, rating_source::RatingSource}
    }
};

/// Everything one player recompute writes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerRecompute {
    pub user_id: UserId,
    /// Rating before the recompute, default applied
    pub previous_rating: f64,
    pub aggregate: AggregatedRating,
    pub history_entry: RatingHistoryEntry,
    /// Present when a triggering set was given and produced a sample
    pub match_record: Option<MatchRatingRecord>
}

impl PlayerRecompute {
    pub fn new_rating(&self) -> f64 {
        self.aggregate.rating
    }
}

/// Recomputes one player's rating from their qualifying sets.
///
/// `ratings` must reflect every rating written so far; `recent_sets` are the sets
/// selected for the evaluation instant `as_of`. When `trigger` is given it is rated
/// once more, against the ratings going into the recompute, to produce the
/// per-match record.
///
/// A prior rating of exactly the default is logged as no prior rating at all.
pub fn recompute_player<L: RatingLookup + ?Sized>(
    user_id: UserId,
    recent_sets: &[Set],
    trigger: Option<&Set>,
    ratings: &L,
    as_of: DateTime<FixedOffset>
) -> PlayerRecompute {
    let previous_rating = ratings.rating(user_id);
    let aggregate = aggregate_rating(user_id, recent_sets, ratings, as_of);

    let match_record = trigger.and_then(|set| {
        calculate_match_rating(user_id, set, ratings).map(|sample| MatchRatingRecord {
            user_id,
            set_id: set.id,
            sample,
            computed_at: as_of
        })
    });

    let set_id = trigger.map(|s| s.id);
    let history_entry = RatingHistoryEntry {
        user_id,
        rating: aggregate.rating,
        previous_rating: if previous_rating == DEFAULT_RATING {
            None
        } else {
            Some(previous_rating)
        },
        set_id,
        match_rating: match_record.as_ref().map(|r| r.sample.match_rating),
        source: RatingSource::for_set(set_id),
        created_at: as_of
    };

    PlayerRecompute {
        user_id,
        previous_rating,
        aggregate,
        history_entry,
        match_record
    }
}
