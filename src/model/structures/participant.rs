use serde::{Deserialize, Serialize};
use std::{fmt, num::ParseIntError, str::FromStr};

pub type UserId = i32;
pub type GuestId = i32;

const GUEST_PREFIX: &str = "guest:";

/// Whoever occupies a score row: a registered player with a stored rating,
/// or an unregistered guest without one.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase", tag = "kind", content = "id")]
pub enum Participant {
    Registered(UserId),
    Guest(GuestId)
}

impl Participant {
    /// Builds a participant from the nullable id pair used by persistence.
    /// Returns `None` unless exactly one of the ids is present.
    pub fn from_ids(user_id: Option<UserId>, guest_id: Option<GuestId>) -> Option<Participant> {
        match (user_id, guest_id) {
            (Some(id), None) => Some(Participant::Registered(id)),
            (None, Some(id)) => Some(Participant::Guest(id)),
            _ => None
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Participant::Registered(id) => Some(*id),
            Participant::Guest(_) => None
        }
    }

    pub fn guest_id(&self) -> Option<GuestId> {
        match self {
            Participant::Registered(_) => None,
            Participant::Guest(id) => Some(*id)
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, Participant::Registered(_))
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Participant::Registered(id) => write!(f, "{}", id),
            Participant::Guest(id) => write!(f, "{}{}", GUEST_PREFIX, id)
        }
    }
}

impl FromStr for Participant {
    type Err = ParseIntError;

    /// Accepts `12` for a registered player and `guest:4` for a guest.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_prefix(GUEST_PREFIX) {
            Some(id) => Ok(Participant::Guest(id.parse()?)),
            None => Ok(Participant::Registered(s.parse()?))
        }
    }
}
