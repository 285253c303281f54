use super::{
    db_structs::{MatchRatingRecord, RatingHistoryEntry, Score, Set, SetId},
    RatingStore, StoreError
};
use crate::model::{
    aggregator::SetWindow,
    constants::DEFAULT_RATING,
    match_rating::MatchRatingSample,
    structures::{
        participant::{Participant, UserId},
        rating_source::RatingSource
    }
};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use itertools::Itertools;
use postgres_types::ToSql;
use std::{collections::HashMap, sync::Arc};
use tokio_postgres::{Client, Error, NoTls, Row};
use tracing::{debug, error, info};

const MATCH_RATING_COLUMNS: &str = "user_id, set_id, match_rating, expected_win_pct, actual_win_pct, \
    match_weight, player_rating, teammate_rating, player_team_rating, opponent_team_rating, \
    player_team_games, opponent_games, computed_at";

/// [`RatingStore`] backed by PostgreSQL.
#[derive(Clone)]
pub struct DbClient {
    client: Arc<Client>
}

impl DbClient {
    // Connect to the database and return a DbClient instance
    pub async fn connect(connection_str: &str) -> Result<Self, Error> {
        let (client, connection) = tokio_postgres::connect(connection_str, NoTls).await?;

        // Spawn the connection object to run in the background
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("connection error: {}", e);
            }
        });

        Ok(DbClient {
            client: Arc::new(client)
        })
    }

    /// Loads the scores of the given `(id, created_at)` set rows, keeping the row order.
    /// Scores are ordered by their id, which is the order participants appear in.
    async fn load_sets(&self, set_rows: &[Row]) -> Result<Vec<Set>, StoreError> {
        let mut sets: IndexMap<SetId, Set> = IndexMap::with_capacity(set_rows.len());
        for row in set_rows {
            let id: SetId = row.get("id");
            sets.insert(
                id,
                Set {
                    id,
                    created_at: row.get("created_at"),
                    scores: Vec::new()
                }
            );
        }

        if sets.is_empty() {
            return Ok(Vec::new());
        }

        let set_ids = sets.keys().copied().collect_vec();
        let score_rows = self
            .client
            .query(
                "SELECT id, set_id, user_id, guest_id, games_won FROM set_scores \
                WHERE set_id = ANY($1) ORDER BY id",
                &[&set_ids]
            )
            .await?;

        for row in score_rows {
            let set_id: SetId = row.get("set_id");
            let score = Self::score_from_row(&row)?;

            if let Some(set) = sets.get_mut(&set_id) {
                set.scores.push(score);
            }
        }

        Ok(sets.into_values().collect())
    }

    fn score_from_row(row: &Row) -> Result<Score, StoreError> {
        let participant = Participant::from_ids(row.get("user_id"), row.get("guest_id")).ok_or_else(|| {
            StoreError::MalformedScore {
                set_id: row.get("set_id"),
                score_id: row.get("id")
            }
        })?;

        Ok(Score {
            participant,
            games_won: row.get("games_won")
        })
    }

    fn history_from_row(row: &Row) -> Result<RatingHistoryEntry, StoreError> {
        let source: i16 = row.get("source");

        Ok(RatingHistoryEntry {
            user_id: row.get("user_id"),
            rating: row.get("rating"),
            previous_rating: row.get("previous_rating"),
            set_id: row.get("set_id"),
            match_rating: row.get("match_rating"),
            source: RatingSource::try_from(source).map_err(|_| StoreError::UnknownRatingSource(source))?,
            created_at: row.get("created_at")
        })
    }

    fn match_rating_from_row(row: &Row) -> MatchRatingRecord {
        MatchRatingRecord {
            user_id: row.get("user_id"),
            set_id: row.get("set_id"),
            sample: MatchRatingSample {
                match_rating: row.get("match_rating"),
                expected_win_pct: row.get("expected_win_pct"),
                actual_win_pct: row.get("actual_win_pct"),
                match_weight: row.get("match_weight"),
                player_rating: row.get("player_rating"),
                teammate_rating: row.get("teammate_rating"),
                player_team_rating: row.get("player_team_rating"),
                opponent_team_rating: row.get("opponent_team_rating"),
                player_team_games: row.get("player_team_games"),
                opponent_games: row.get("opponent_games")
            },
            computed_at: row.get("computed_at")
        }
    }

    async fn truncate_table(&self, table: &str) -> Result<(), StoreError> {
        self.client
            .execute(format!("TRUNCATE TABLE {} RESTART IDENTITY", table).as_str(), &[])
            .await?;

        info!("Truncated the {} table", table);
        Ok(())
    }

    // Access the underlying Client
    pub fn client(&self) -> Arc<Client> {
        Arc::clone(&self.client)
    }
}

#[async_trait]
impl RatingStore for DbClient {
    async fn get_set(&self, set_id: SetId) -> Result<Option<Set>, StoreError> {
        let rows = self
            .client
            .query("SELECT id, created_at FROM sets WHERE id = $1", &[&set_id])
            .await?;

        Ok(self.load_sets(&rows).await?.into_iter().next())
    }

    async fn get_rating(&self, user_id: UserId) -> Result<Option<f64>, StoreError> {
        let row = self
            .client
            .query_opt("SELECT rating FROM players WHERE id = $1", &[&user_id])
            .await?;

        Ok(row.and_then(|r| r.get::<_, Option<f64>>("rating")))
    }

    async fn get_ratings(&self, user_ids: &[UserId]) -> Result<HashMap<UserId, f64>, StoreError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = self
            .client
            .query(
                "SELECT id, rating FROM players WHERE id = ANY($1) AND rating IS NOT NULL",
                &[&user_ids]
            )
            .await?;

        Ok(rows
            .iter()
            .map(|row| (row.get::<_, UserId>("id"), row.get::<_, f64>("rating")))
            .collect())
    }

    async fn set_rating(
        &self,
        user_id: UserId,
        rating: f64,
        updated_at: DateTime<FixedOffset>
    ) -> Result<(), StoreError> {
        let updated = self
            .client
            .execute(
                "UPDATE players SET rating = $1, rating_updated_at = $2 WHERE id = $3",
                &[&rating, &updated_at, &user_id]
            )
            .await?;

        if updated == 0 {
            return Err(StoreError::PlayerNotFound(user_id));
        }

        Ok(())
    }

    async fn get_recent_sets(&self, user_id: UserId, window: &SetWindow, limit: usize) -> Result<Vec<Set>, StoreError> {
        let limit = limit as i64;
        let rows = self
            .client
            .query(
                "SELECT s.id, s.created_at FROM sets s \
                WHERE EXISTS (SELECT 1 FROM set_scores sc WHERE sc.set_id = s.id AND sc.user_id = $1) \
                AND s.created_at >= $2 AND s.created_at <= $3 \
                AND ($4::INTEGER IS NULL OR s.created_at < $3 OR s.id <= $4) \
                ORDER BY s.created_at DESC, s.id DESC LIMIT $5",
                &[&user_id, &window.since, &window.until, &window.last_set_id, &limit]
            )
            .await?;

        debug!("Found {} recent sets for player {}", rows.len(), user_id);
        self.load_sets(&rows).await
    }

    async fn append_history(&self, entry: &RatingHistoryEntry) -> Result<(), StoreError> {
        let values: &[&(dyn ToSql + Sync)] = &[
            &entry.user_id,
            &entry.rating,
            &entry.previous_rating,
            &entry.set_id,
            &entry.match_rating,
            &(entry.source as i16),
            &entry.created_at
        ];

        self.client
            .execute(
                "INSERT INTO rating_history (user_id, rating, previous_rating, set_id, match_rating, source, created_at) \
                VALUES ($1, $2, $3, $4, $5, $6, $7)",
                values
            )
            .await?;

        Ok(())
    }

    async fn get_history(&self, user_id: UserId) -> Result<Vec<RatingHistoryEntry>, StoreError> {
        let rows = self
            .client
            .query(
                "SELECT user_id, rating, previous_rating, set_id, match_rating, source, created_at \
                FROM rating_history WHERE user_id = $1 ORDER BY id",
                &[&user_id]
            )
            .await?;

        rows.iter().map(Self::history_from_row).collect()
    }

    async fn upsert_match_rating(&self, record: &MatchRatingRecord) -> Result<(), StoreError> {
        let sample = &record.sample;
        let values: &[&(dyn ToSql + Sync)] = &[
            &record.user_id,
            &record.set_id,
            &sample.match_rating,
            &sample.expected_win_pct,
            &sample.actual_win_pct,
            &sample.match_weight,
            &sample.player_rating,
            &sample.teammate_rating,
            &sample.player_team_rating,
            &sample.opponent_team_rating,
            &sample.player_team_games,
            &sample.opponent_games,
            &record.computed_at
        ];

        let query = format!(
            "INSERT INTO match_ratings ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
            ON CONFLICT (user_id, set_id) DO UPDATE SET \
            match_rating = EXCLUDED.match_rating, expected_win_pct = EXCLUDED.expected_win_pct, \
            actual_win_pct = EXCLUDED.actual_win_pct, match_weight = EXCLUDED.match_weight, \
            player_rating = EXCLUDED.player_rating, teammate_rating = EXCLUDED.teammate_rating, \
            player_team_rating = EXCLUDED.player_team_rating, opponent_team_rating = EXCLUDED.opponent_team_rating, \
            player_team_games = EXCLUDED.player_team_games, opponent_games = EXCLUDED.opponent_games, \
            computed_at = EXCLUDED.computed_at",
            MATCH_RATING_COLUMNS
        );

        self.client.execute(query.as_str(), values).await?;
        Ok(())
    }

    async fn get_match_rating(&self, user_id: UserId, set_id: SetId) -> Result<Option<MatchRatingRecord>, StoreError> {
        let query = format!(
            "SELECT {} FROM match_ratings WHERE user_id = $1 AND set_id = $2",
            MATCH_RATING_COLUMNS
        );
        let row = self.client.query_opt(query.as_str(), &[&user_id, &set_id]).await?;

        Ok(row.as_ref().map(Self::match_rating_from_row))
    }

    async fn reset_all_ratings(&self) -> Result<(), StoreError> {
        let updated = self
            .client
            .execute(
                "UPDATE players SET rating = $1, rating_updated_at = NULL",
                &[&DEFAULT_RATING]
            )
            .await?;

        info!("Reset the rating of {} players", updated);
        Ok(())
    }

    async fn clear_all_history(&self) -> Result<(), StoreError> {
        self.truncate_table("rating_history").await
    }

    async fn clear_all_match_ratings(&self) -> Result<(), StoreError> {
        self.truncate_table("match_ratings").await
    }

    async fn get_all_sets_chronological(&self) -> Result<Vec<Set>, StoreError> {
        info!("Fetching sets...");
        let rows = self
            .client
            .query("SELECT id, created_at FROM sets ORDER BY created_at, id", &[])
            .await?;

        let sets = self.load_sets(&rows).await?;
        info!("Fetched {} sets", sets.len());

        Ok(sets)
    }
}
