use crate::{database::db_structs::Score, model::structures::participant::Participant};
use serde::Serialize;

/// A team recovered from a set's score rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Team {
    pub games_won: i32,
    pub members: Vec<Participant>
}

/// Groups score rows into teams by equal `games_won`.
///
/// Teams are ordered by the first appearance of their score value and
/// members keep their row order. A set with a single group has no opponents.
pub fn infer_teams(scores: &[Score]) -> Vec<Team> {
    let mut teams: Vec<Team> = Vec::new();

    for score in scores {
        match teams.iter_mut().find(|t| t.games_won == score.games_won) {
            Some(team) => team.members.push(score.participant),
            None => teams.push(Team {
                games_won: score.games_won,
                members: vec![score.participant]
            })
        }
    }

    teams
}

/// The target's view of a set: who plays with them and who plays against them.
#[derive(Debug, Clone, PartialEq)]
pub struct Sides {
    pub player_games: i32,
    /// The target's group without the target itself
    pub teammates: Vec<Participant>,
    pub opponents: Vec<Team>
}

impl Sides {
    /// One `games_won` per opposing team, not per row
    pub fn opponent_games(&self) -> i32 {
        self.opponents.iter().map(|t| t.games_won).sum()
    }

    pub fn opponent_members(&self) -> impl Iterator<Item = &Participant> {
        self.opponents.iter().flat_map(|t| t.members.iter())
    }
}

/// Splits a set into sides relative to `target`. Returns `None` when the
/// target did not play the set.
pub fn sides_for(scores: &[Score], target: Participant) -> Option<Sides> {
    let player_games = scores.iter().find(|s| s.participant == target)?.games_won;

    let mut sides = Sides {
        player_games,
        teammates: Vec::new(),
        opponents: Vec::new()
    };

    for team in infer_teams(scores) {
        if team.games_won == player_games {
            let mut members = team.members;
            if let Some(pos) = members.iter().position(|p| *p == target) {
                members.remove(pos);
            }
            sides.teammates = members;
        } else {
            sides.opponents.push(team);
        }
    }

    Some(sides)
}
