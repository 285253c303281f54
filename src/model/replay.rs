use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use itertools::Itertools;

use crate::{
    database::db_structs::{MatchRatingRecord, RatingHistoryEntry, Set, SetId},
    model::{
        aggregator::{select_recent_sets, SetWindow},
        constants::MAX_MATCHES_TO_CONSIDER,
        rating_lookup::RatingLookup,
        recompute::{recompute_player, PlayerRecompute},
        structures::participant::UserId
    },
    utils::progress_utils::progress_bar
};

/// In-memory result of a replay: ratings, their history and the per-match records.
#[derive(Debug, Default)]
pub struct RatingTracker {
    // Players in order of their first rating
    ratings: IndexMap<UserId, f64>,
    history: HashMap<UserId, Vec<RatingHistoryEntry>>,
    match_ratings: HashMap<(UserId, SetId), MatchRatingRecord>
}

impl RatingTracker {
    pub fn new() -> RatingTracker {
        RatingTracker::default()
    }

    /// Writes the outcome of one player recompute, the same way the store-backed
    /// orchestrator does.
    pub fn apply(&mut self, result: PlayerRecompute) {
        if let Some(record) = result.match_record {
            self.match_ratings.insert((record.user_id, record.set_id), record);
        }

        self.ratings.insert(result.user_id, result.aggregate.rating);
        self.history
            .entry(result.user_id)
            .or_default()
            .push(result.history_entry);
    }

    pub fn ratings(&self) -> &IndexMap<UserId, f64> {
        &self.ratings
    }

    pub fn history(&self, user_id: UserId) -> &[RatingHistoryEntry] {
        self.history.get(&user_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn match_rating(&self, user_id: UserId, set_id: SetId) -> Option<&MatchRatingRecord> {
        self.match_ratings.get(&(user_id, set_id))
    }

    pub fn match_rating_count(&self) -> usize {
        self.match_ratings.len()
    }
}

impl RatingLookup for RatingTracker {
    fn stored_rating(&self, user_id: UserId) -> Option<f64> {
        self.ratings.get(&user_id).copied()
    }
}

/// Registered players of `sets` in order of first appearance
pub fn players_in_order<'a, I>(sets: I) -> Vec<UserId>
where
    I: IntoIterator<Item = &'a Set>
{
    sets.into_iter()
        .flat_map(Set::registered_players)
        .unique()
        .collect()
}

/// # Replay
///
/// Rebuilds every rating from scratch out of raw set data. This is the
/// authority on what the ratings should be at `as_of`; stored ratings are a
/// materialised view of it.
///
/// Steps:
/// 1. Sort the sets by ascending `(created_at, id)`, regardless of input order
/// 2. For each set, recompute its registered players one after another in order of
///     first appearance, each seeing the ratings written before it. The set is
///     evaluated at its own creation time and only sees itself and earlier sets.
/// 3. Recompute every player once more at `as_of`, so sets which have since left
///     the window no longer count
pub fn replay(sets: &[Set], as_of: DateTime<FixedOffset>) -> RatingTracker {
    let mut chronological: Vec<&Set> = sets.iter().collect();
    chronological.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    // Every set each player took part in
    let mut participations: HashMap<UserId, Vec<&Set>> = HashMap::new();
    for set in chronological.iter().copied() {
        for user_id in set.registered_players() {
            participations.entry(user_id).or_default().push(set);
        }
    }

    let mut tracker = RatingTracker::new();
    let bar = progress_bar(chronological.len() as u64, "Replaying sets".to_string());

    for set in chronological.iter().copied() {
        let window = SetWindow::through(set);

        for user_id in set.registered_players() {
            let recent = recent_sets(&participations, user_id, &window);
            let result = recompute_player(user_id, &recent, Some(set), &tracker, window.as_of());
            tracker.apply(result);
        }

        if let Some(bar) = &bar {
            bar.inc(1);
        }
    }

    if let Some(bar) = bar {
        bar.finish();
    }

    let window = SetWindow::at(as_of);
    for user_id in players_in_order(chronological.iter().copied()) {
        let recent = recent_sets(&participations, user_id, &window);
        let result = recompute_player(user_id, &recent, None, &tracker, as_of);
        tracker.apply(result);
    }

    tracker
}

fn recent_sets(participations: &HashMap<UserId, Vec<&Set>>, user_id: UserId, window: &SetWindow) -> Vec<Set> {
    let candidates = participations.get(&user_id).map(Vec::as_slice).unwrap_or_default();

    select_recent_sets(candidates.iter().copied(), user_id, window, MAX_MATCHES_TO_CONSIDER)
        .into_iter()
        .cloned()
        .collect()
}
