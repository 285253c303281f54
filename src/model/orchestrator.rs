use chrono::{DateTime, FixedOffset};
use itertools::Itertools;
use tracing::{debug, error, info};

use crate::{
    database::{
        db_structs::{Set, SetId},
        RatingStore
    },
    model::{
        aggregator::SetWindow,
        constants::{DEFAULT_RATING, MAX_MATCHES_TO_CONSIDER},
        error::RatingError,
        predictor::{predict_match, MatchPrediction},
        recompute::{recompute_player, PlayerRecompute},
        replay::players_in_order,
        structures::participant::{Participant, UserId}
    },
    utils::progress_utils::progress_bar
};

/// Outcome of recomputing every registered player of one set
#[derive(Debug)]
pub struct SetRecomputeReport {
    pub set_id: SetId,
    pub updated: Vec<PlayerRecompute>,
    pub failures: Vec<(UserId, RatingError)>
}

#[derive(Debug, Default)]
pub struct ReplaySummary {
    pub sets_processed: usize,
    pub players_updated: usize,
    /// Players recomputed once more at the replay instant
    pub players_refreshed: usize,
    /// `None` as set id marks a failure in the final refresh
    pub failures: Vec<(Option<SetId>, UserId, RatingError)>
}

/// Keeps stored ratings, history and per-match records in step with set data.
///
/// Recomputes for the same player must not run concurrently; callers serialise
/// them.
pub struct RatingUpdater<S: RatingStore> {
    store: S
}

impl<S: RatingStore> RatingUpdater<S> {
    pub fn new(store: S) -> RatingUpdater<S> {
        RatingUpdater { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stored rating with the default applied
    pub async fn current_rating(&self, user_id: UserId) -> Result<f64, RatingError> {
        Ok(self.store.get_rating(user_id).await?.unwrap_or(DEFAULT_RATING))
    }

    /// # Per-player recompute
    ///
    /// Steps:
    /// 1. Load the triggering set, if any
    /// 2. Load the player's qualifying sets for `as_of` and every rating they reference
    /// 3. Aggregate the new rating
    /// 4. Upsert the match record, store the rating and append a history entry
    pub async fn recompute_player(
        &self,
        user_id: UserId,
        set_id: Option<SetId>,
        as_of: DateTime<FixedOffset>
    ) -> Result<PlayerRecompute, RatingError> {
        let trigger = match set_id {
            Some(id) => Some(self.store.get_set(id).await?.ok_or(RatingError::SetNotFound(id))?),
            None => None
        };

        self.recompute_for(user_id, trigger.as_ref(), SetWindow::at(as_of)).await
    }

    /// # Per-set recompute
    ///
    /// Recomputes every registered player of the set, in order of first appearance.
    /// A failure for one player is logged and collected; the remaining players are
    /// still recomputed.
    pub async fn recompute_set(
        &self,
        set_id: SetId,
        as_of: DateTime<FixedOffset>
    ) -> Result<SetRecomputeReport, RatingError> {
        let set = self
            .store
            .get_set(set_id)
            .await?
            .ok_or(RatingError::SetNotFound(set_id))?;

        Ok(self.recompute_loaded_set(&set, SetWindow::at(as_of)).await)
    }

    /// # Full historical replay
    ///
    /// Steps:
    /// 1. Reset every rating to the default
    /// 2. Clear all history and match records
    /// 3. Recompute every set oldest first, each evaluated at its own creation time
    ///     and blind to later sets
    /// 4. Recompute every player once more at `as_of`
    ///
    /// The stored state afterwards matches [`crate::model::replay::replay`] over the
    /// same sets and instant.
    pub async fn replay_all(&self, as_of: DateTime<FixedOffset>) -> Result<ReplaySummary, RatingError> {
        info!("Resetting ratings, history and match records");
        self.store.reset_all_ratings().await?;
        self.store.clear_all_history().await?;
        self.store.clear_all_match_ratings().await?;

        let sets = self.store.get_all_sets_chronological().await?;
        info!("Replaying {} sets", sets.len());

        let bar = progress_bar(sets.len() as u64, "Replaying sets".to_string());
        let mut summary = ReplaySummary::default();

        for set in &sets {
            let report = self.recompute_loaded_set(set, SetWindow::through(set)).await;

            summary.sets_processed += 1;
            summary.players_updated += report.updated.len();
            summary
                .failures
                .extend(report.failures.into_iter().map(|(user_id, e)| (Some(set.id), user_id, e)));

            if let Some(bar) = &bar {
                bar.inc(1);
            }
        }

        if let Some(bar) = bar {
            bar.finish();
        }

        let window = SetWindow::at(as_of);
        for user_id in players_in_order(&sets) {
            match self.recompute_for(user_id, None, window).await {
                Ok(_) => summary.players_refreshed += 1,
                Err(e) => {
                    error!("Failed to refresh rating of player {}: {}", user_id, e);
                    summary.failures.push((None, user_id, e));
                }
            }
        }

        info!(
            "Replay complete: {} sets, {} player updates, {} players refreshed, {} failures",
            summary.sets_processed,
            summary.players_updated,
            summary.players_refreshed,
            summary.failures.len()
        );

        Ok(summary)
    }

    /// Predicts a doubles match from the currently stored ratings
    pub async fn predict_match(
        &self,
        team1: &[Participant],
        team2: &[Participant]
    ) -> Result<MatchPrediction, RatingError> {
        let user_ids = team1
            .iter()
            .chain(team2)
            .filter_map(Participant::user_id)
            .unique()
            .collect_vec();
        let ratings = self.store.get_ratings(&user_ids).await?;

        predict_match(team1, team2, &ratings)
    }

    async fn recompute_loaded_set(&self, set: &Set, window: SetWindow) -> SetRecomputeReport {
        let mut report = SetRecomputeReport {
            set_id: set.id,
            updated: Vec::new(),
            failures: Vec::new()
        };

        for user_id in set.registered_players() {
            match self.recompute_for(user_id, Some(set), window).await {
                Ok(result) => report.updated.push(result),
                Err(e) => {
                    error!("Failed to recompute rating of player {} for set {}: {}", user_id, set.id, e);
                    report.failures.push((user_id, e));
                }
            }
        }

        debug!(
            "Set {} recomputed: {} updated, {} failed",
            set.id,
            report.updated.len(),
            report.failures.len()
        );

        report
    }

    async fn recompute_for(
        &self,
        user_id: UserId,
        trigger: Option<&Set>,
        window: SetWindow
    ) -> Result<PlayerRecompute, RatingError> {
        let as_of = window.as_of();
        let recent_sets = self
            .store
            .get_recent_sets(user_id, &window, MAX_MATCHES_TO_CONSIDER)
            .await?;

        // Everyone whose rating the aggregation or the match record may read
        let user_ids = std::iter::once(user_id)
            .chain(recent_sets.iter().chain(trigger).flat_map(Set::registered_players))
            .unique()
            .collect_vec();
        let ratings = self.store.get_ratings(&user_ids).await?;

        let result = recompute_player(user_id, &recent_sets, trigger, &ratings, as_of);

        if let Some(record) = &result.match_record {
            self.store.upsert_match_rating(record).await?;
        }
        self.store.set_rating(user_id, result.new_rating(), as_of).await?;
        self.store.append_history(&result.history_entry).await?;

        debug!(
            "Player {} rating {:.4} -> {:.4} from {} sets",
            user_id,
            result.previous_rating,
            result.new_rating(),
            result.aggregate.samples_used
        );

        Ok(result)
    }
}
