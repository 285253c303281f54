use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use crate::{
    database::db_structs::{MatchRatingRecord, RatingHistoryEntry, Set, SetId},
    model::{aggregator::SetWindow, structures::participant::UserId}
};

pub mod db;
pub mod db_structs;
pub mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Player {0} does not exist")]
    PlayerNotFound(UserId),

    #[error("Score {score_id} of set {set_id} must reference exactly one of a player or a guest")]
    MalformedScore { set_id: SetId, score_id: i32 },

    #[error("Unknown rating source {0}")]
    UnknownRatingSource(i16),

    #[error("Store unavailable: {0}")]
    Unavailable(String)
}

/// Persistence seam of the rating engine. Every read and write the engine
/// performs goes through here.
#[async_trait]
pub trait RatingStore: Send + Sync {
    async fn get_set(&self, set_id: SetId) -> Result<Option<Set>, StoreError>;

    /// The stored rating, `None` if the player has never been rated
    async fn get_rating(&self, user_id: UserId) -> Result<Option<f64>, StoreError>;

    /// Stored ratings for the given players. Players without a rating are absent.
    async fn get_ratings(&self, user_ids: &[UserId]) -> Result<HashMap<UserId, f64>, StoreError>;

    async fn set_rating(
        &self,
        user_id: UserId,
        rating: f64,
        updated_at: DateTime<FixedOffset>
    ) -> Result<(), StoreError>;

    /// Sets `user_id` took part in within `window`, newest first by
    /// `(created_at, id)`, at most `limit`.
    async fn get_recent_sets(&self, user_id: UserId, window: &SetWindow, limit: usize) -> Result<Vec<Set>, StoreError>;

    async fn append_history(&self, entry: &RatingHistoryEntry) -> Result<(), StoreError>;

    /// Oldest first
    async fn get_history(&self, user_id: UserId) -> Result<Vec<RatingHistoryEntry>, StoreError>;

    /// Inserts or overwrites the record keyed by `(user_id, set_id)`
    async fn upsert_match_rating(&self, record: &MatchRatingRecord) -> Result<(), StoreError>;

    async fn get_match_rating(&self, user_id: UserId, set_id: SetId) -> Result<Option<MatchRatingRecord>, StoreError>;

    /// Sets every player's rating to the default
    async fn reset_all_ratings(&self) -> Result<(), StoreError>;

    async fn clear_all_history(&self) -> Result<(), StoreError>;

    async fn clear_all_match_ratings(&self) -> Result<(), StoreError>;

    /// Ascending `(created_at, id)`
    async fn get_all_sets_chronological(&self) -> Result<Vec<Set>, StoreError>;
}
