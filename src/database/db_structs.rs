use crate::model::{
    match_rating::MatchRatingSample,
    structures::{
        participant::{Participant, UserId},
        rating_source::RatingSource
    }
};
use chrono::{DateTime, FixedOffset};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

pub type SetId = i32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub participant: Participant,
    pub games_won: i32
}

/// One scored set. Teams are not stored: players with equal `games_won`
/// within the same set are teammates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Set {
    pub id: SetId,
    pub created_at: DateTime<FixedOffset>,
    pub scores: Vec<Score>
}

impl Set {
    /// Registered players in order of first appearance, without duplicates.
    /// Guests are skipped as they have no stored rating.
    pub fn registered_players(&self) -> Vec<UserId> {
        self.scores
            .iter()
            .filter_map(|s| s.participant.user_id())
            .unique()
            .collect()
    }

    pub fn score_of(&self, user_id: UserId) -> Option<&Score> {
        self.scores
            .iter()
            .find(|s| s.participant == Participant::Registered(user_id))
    }

    pub fn has_player(&self, user_id: UserId) -> bool {
        self.score_of(user_id).is_some()
    }
}

/// Append-only log row written once per player recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingHistoryEntry {
    pub user_id: UserId,
    /// Rating after the update
    pub rating: f64,
    /// `None` when the prior rating was exactly the default
    pub previous_rating: Option<f64>,
    /// `None` for a recalculation without a triggering set
    pub set_id: Option<SetId>,
    pub match_rating: Option<f64>,
    pub source: RatingSource,
    pub created_at: DateTime<FixedOffset>
}

/// Persisted snapshot of a [`MatchRatingSample`], unique per `(user_id, set_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRatingRecord {
    pub user_id: UserId,
    pub set_id: SetId,
    #[serde(flatten)]
    pub sample: MatchRatingSample,
    pub computed_at: DateTime<FixedOffset>
}
