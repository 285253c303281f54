use thiserror::Error;

use crate::database::{db_structs::SetId, StoreError};

#[derive(Debug, Error)]
pub enum RatingError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Set {0} not found")]
    SetNotFound(SetId),

    #[error("Team {team} must contain exactly 2 players, found {found}")]
    InvalidTeamSize { team: u8, found: usize }
}
