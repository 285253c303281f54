use serde_repr::{Deserialize_repr, Serialize_repr};
use std::convert::TryFrom;

/// What caused a rating history entry to be written.
#[derive(Deserialize_repr, Serialize_repr, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(strum_macros::EnumIter))]
#[repr(i16)]
pub enum RatingSource {
    /// Recomputed without a triggering set
    Recalculation = 0,
    /// Recomputed because a set was created, updated or replayed
    Match = 1
}

impl RatingSource {
    pub fn for_set(set_id: Option<i32>) -> RatingSource {
        match set_id {
            Some(_) => RatingSource::Match,
            None => RatingSource::Recalculation
        }
    }
}

impl TryFrom<i16> for RatingSource {
    type Error = ();

    fn try_from(v: i16) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(RatingSource::Recalculation),
            1 => Ok(RatingSource::Match),
            _ => Err(())
        }
    }
}
