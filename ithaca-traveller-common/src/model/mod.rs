pub mod auth;
pub mod feature;
pub mod location;
pub mod post;
pub mod user;

use serde::{Deserialize, Serialize};
use std::{fmt::Display, marker::PhantomData};
use thiserror::Error;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ModelValidationError {
    #[error("Stored like count {0} is negative")]
    NegativeLikeCount(i64),
}

/// A required field was absent from a request body.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
#[error("missing parameter: {0}")]
pub struct MissingFieldError(pub &'static str);

pub fn require<T>(value: Option<T>, field: &'static str) -> Result<T, MissingFieldError> {
    value.ok_or(MissingFieldError(field))
}

/// Database-generated row id, tagged with the entity it belongs to.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Id<Marker>(i64, #[serde(skip)] PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self(id, PhantomData)
    }

    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> From<i64> for Id<Marker> {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl<Marker> From<Id<Marker>> for i64 {
    fn from(value: Id<Marker>) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Id, MissingFieldError, require, user::UserMarker};

    #[test]
    fn id_serializes_as_plain_integer() {
        let id = Id::<UserMarker>::new(42);

        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        assert_eq!(serde_json::from_str::<Id<UserMarker>>("7").unwrap(), Id::new(7));
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn require_names_the_missing_field() {
        assert_eq!(require(Some(3), "count"), Ok(3));
        assert_eq!(require::<u8>(None, "count"), Err(MissingFieldError("count")));
        assert_eq!(
            MissingFieldError("name").to_string(),
            "missing parameter: name"
        );
    }
}
