use serde::{Deserialize, Serialize};

use crate::model::{
    constants::{AVG_GAMES_PER_SET, DEFAULT_RATING, GAMES_TO_WIN_SET, PREDICTED_SETS},
    error::RatingError,
    rating_lookup::RatingLookup,
    rating_utils::{expected_win_pct, match_weight, team_rating},
    structures::participant::Participant
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetScore {
    pub team1_games: u32,
    pub team2_games: u32
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPrediction {
    pub team1_rating: f64,
    pub team2_rating: f64,
    pub team1_expected_win_pct: f64,
    pub team2_expected_win_pct: f64,
    /// Stylised score line, the same set repeated for every predicted set
    pub expected_score: Vec<SetScore>,
    /// Competitiveness indicator for display only
    pub match_weight: f64
}

/// # Match prediction
///
/// Estimates the outcome of a doubles match between two proposed teams. Guests and
/// players without a stored rating count as [`DEFAULT_RATING`].
///
/// The score line assumes [`AVG_GAMES_PER_SET`] games per set. The favourite (team 1
/// on an exact tie) takes 6 games and the other side gets the remaining 4 scaled by
/// its odds relative to the favourite's, so an even match reads 6-4.
///
/// Nothing is written; teams that are not exactly two players are rejected.
pub fn predict_match<L: RatingLookup + ?Sized>(
    team1: &[Participant],
    team2: &[Participant],
    ratings: &L
) -> Result<MatchPrediction, RatingError> {
    let team1_rating = resolve_team(1, team1, ratings)?;
    let team2_rating = resolve_team(2, team2, ratings)?;

    let team1_expected_win_pct = expected_win_pct(team1_rating, team2_rating);
    let team2_expected_win_pct = 1.0 - team1_expected_win_pct;

    let team1_expected_games = AVG_GAMES_PER_SET * team1_expected_win_pct;
    let team2_expected_games = AVG_GAMES_PER_SET * team2_expected_win_pct;

    let set_score = if team1_expected_win_pct >= team2_expected_win_pct {
        SetScore {
            team1_games: GAMES_TO_WIN_SET,
            team2_games: loser_games(team2_expected_win_pct, team1_expected_win_pct)
        }
    } else {
        SetScore {
            team1_games: loser_games(team1_expected_win_pct, team2_expected_win_pct),
            team2_games: GAMES_TO_WIN_SET
        }
    };

    Ok(MatchPrediction {
        team1_rating,
        team2_rating,
        team1_expected_win_pct,
        team2_expected_win_pct,
        expected_score: vec![set_score; PREDICTED_SETS],
        match_weight: match_weight(team1_expected_games, team2_expected_games, AVG_GAMES_PER_SET)
    })
}

fn resolve_team<L: RatingLookup + ?Sized>(
    team: u8,
    players: &[Participant],
    ratings: &L
) -> Result<f64, RatingError> {
    match players {
        [first, second] => Ok(team_rating(resolve(first, ratings), resolve(second, ratings))),
        _ => Err(RatingError::InvalidTeamSize {
            team,
            found: players.len()
        })
    }
}

fn resolve<L: RatingLookup + ?Sized>(participant: &Participant, ratings: &L) -> f64 {
    match participant {
        Participant::Registered(id) => ratings.rating(*id),
        Participant::Guest(_) => DEFAULT_RATING
    }
}

fn loser_games(loser_pct: f64, winner_pct: f64) -> u32 {
    let remaining = AVG_GAMES_PER_SET - GAMES_TO_WIN_SET as f64;
    let games = (remaining * loser_pct / winner_pct).round();

    games.clamp(0.0, GAMES_TO_WIN_SET as f64) as u32
}
