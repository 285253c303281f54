use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard}
};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;

use crate::{
    database::{
        db_structs::{MatchRatingRecord, RatingHistoryEntry, Set, SetId},
        RatingStore, StoreError
    },
    model::{
        aggregator::{select_recent_sets, SetWindow},
        constants::DEFAULT_RATING,
        structures::participant::UserId
    }
};

#[derive(Debug, Clone, Default)]
struct PlayerRow {
    rating: Option<f64>,
    rating_updated_at: Option<DateTime<FixedOffset>>
}

#[derive(Debug, Default)]
struct State {
    players: IndexMap<UserId, PlayerRow>,
    sets: IndexMap<SetId, Set>,
    history: Vec<RatingHistoryEntry>,
    match_ratings: HashMap<(UserId, SetId), MatchRatingRecord>
}

/// [`RatingStore`] kept entirely in memory. Backs tests, benchmarks and
/// offline replays of exported set data.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>
}

impl InMemoryStore {
    pub fn new() -> InMemoryStore {
        InMemoryStore::default()
    }

    /// Builds a store holding `sets`, registering every player they reference
    pub fn with_sets(sets: &[Set]) -> Result<InMemoryStore, StoreError> {
        let store = InMemoryStore::new();
        for set in sets {
            store.insert_set(set.clone())?;
        }

        Ok(store)
    }

    pub fn add_player(&self, user_id: UserId) -> Result<(), StoreError> {
        self.state()?.players.entry(user_id).or_default();
        Ok(())
    }

    /// Inserts or replaces a set by id. Registered players it references are created
    /// if they do not exist yet.
    pub fn insert_set(&self, set: Set) -> Result<(), StoreError> {
        let mut state = self.state()?;
        for user_id in set.registered_players() {
            state.players.entry(user_id).or_default();
        }
        state.sets.insert(set.id, set);

        Ok(())
    }

    pub fn remove_set(&self, set_id: SetId) -> Result<Option<Set>, StoreError> {
        Ok(self.state()?.sets.shift_remove(&set_id))
    }

    /// Current ratings with the default applied, in player creation order
    pub fn ratings(&self) -> Result<IndexMap<UserId, f64>, StoreError> {
        Ok(self
            .state()?
            .players
            .iter()
            .map(|(id, row)| (*id, row.rating.unwrap_or(DEFAULT_RATING)))
            .collect())
    }

    pub fn rating_updated_at(&self, user_id: UserId) -> Result<Option<DateTime<FixedOffset>>, StoreError> {
        Ok(self
            .state()?
            .players
            .get(&user_id)
            .and_then(|row| row.rating_updated_at))
    }

    pub fn history_len(&self) -> Result<usize, StoreError> {
        Ok(self.state()?.history.len())
    }

    pub fn match_rating_count(&self) -> Result<usize, StoreError> {
        Ok(self.state()?.match_ratings.len())
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl RatingStore for InMemoryStore {
    async fn get_set(&self, set_id: SetId) -> Result<Option<Set>, StoreError> {
        Ok(self.state()?.sets.get(&set_id).cloned())
    }

    async fn get_rating(&self, user_id: UserId) -> Result<Option<f64>, StoreError> {
        Ok(self.state()?.players.get(&user_id).and_then(|row| row.rating))
    }

    async fn get_ratings(&self, user_ids: &[UserId]) -> Result<HashMap<UserId, f64>, StoreError> {
        let state = self.state()?;

        Ok(user_ids
            .iter()
            .filter_map(|id| {
                state
                    .players
                    .get(id)
                    .and_then(|row| row.rating)
                    .map(|rating| (*id, rating))
            })
            .collect())
    }

    async fn set_rating(
        &self,
        user_id: UserId,
        rating: f64,
        updated_at: DateTime<FixedOffset>
    ) -> Result<(), StoreError> {
        let mut state = self.state()?;
        let row = state
            .players
            .get_mut(&user_id)
            .ok_or(StoreError::PlayerNotFound(user_id))?;

        row.rating = Some(rating);
        row.rating_updated_at = Some(updated_at);

        Ok(())
    }

    async fn get_recent_sets(&self, user_id: UserId, window: &SetWindow, limit: usize) -> Result<Vec<Set>, StoreError> {
        let state = self.state()?;

        Ok(select_recent_sets(state.sets.values(), user_id, window, limit)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn append_history(&self, entry: &RatingHistoryEntry) -> Result<(), StoreError> {
        let mut state = self.state()?;
        if !state.players.contains_key(&entry.user_id) {
            return Err(StoreError::PlayerNotFound(entry.user_id));
        }
        state.history.push(entry.clone());

        Ok(())
    }

    async fn get_history(&self, user_id: UserId) -> Result<Vec<RatingHistoryEntry>, StoreError> {
        Ok(self
            .state()?
            .history
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn upsert_match_rating(&self, record: &MatchRatingRecord) -> Result<(), StoreError> {
        self.state()?
            .match_ratings
            .insert((record.user_id, record.set_id), record.clone());

        Ok(())
    }

    async fn get_match_rating(&self, user_id: UserId, set_id: SetId) -> Result<Option<MatchRatingRecord>, StoreError> {
        Ok(self.state()?.match_ratings.get(&(user_id, set_id)).cloned())
    }

    async fn reset_all_ratings(&self) -> Result<(), StoreError> {
        for row in self.state()?.players.values_mut() {
            row.rating = Some(DEFAULT_RATING);
            row.rating_updated_at = None;
        }

        Ok(())
    }

    async fn clear_all_history(&self) -> Result<(), StoreError> {
        self.state()?.history.clear();
        Ok(())
    }

    async fn clear_all_match_ratings(&self) -> Result<(), StoreError> {
        self.state()?.match_ratings.clear();
        Ok(())
    }

    async fn get_all_sets_chronological(&self) -> Result<Vec<Set>, StoreError> {
        let mut sets: Vec<Set> = self.state()?.sets.values().cloned().collect();
        sets.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(sets)
    }
}
