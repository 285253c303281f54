use std::collections::HashMap;

use indexmap::IndexMap;

use crate::model::{constants::DEFAULT_RATING, structures::participant::UserId};

/// Read access to current player ratings.
///
/// Implementors report what is stored; the default is applied on read by
/// [`RatingLookup::rating`], never persisted as a separate "unset" state.
pub trait RatingLookup {
    fn stored_rating(&self, user_id: UserId) -> Option<f64>;

    fn rating(&self, user_id: UserId) -> f64 {
        self.stored_rating(user_id).unwrap_or(DEFAULT_RATING)
    }
}

impl RatingLookup for HashMap<UserId, f64> {
    fn stored_rating(&self, user_id: UserId) -> Option<f64> {
        self.get(&user_id).copied()
    }
}

impl RatingLookup for IndexMap<UserId, f64> {
    fn stored_rating(&self, user_id: UserId) -> Option<f64> {
        self.get(&user_id).copied()
    }
}
