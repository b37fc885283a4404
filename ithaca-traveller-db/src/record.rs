use ithaca_traveller_common::model::{
    ModelValidationError,
    feature::PartialFeature,
    location::PartialLocation,
    post::PartialPost,
    user::{PartialUser, UserCredentials},
};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct FeatureRecord {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, PartialEq, Debug, FromRow)]
pub(crate) struct LocationRecord {
    pub id: i64,
    pub longitude: f64,
    pub latitude: f64,
    pub name: String,
    pub description: String,
    pub address: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct UserRecord {
    pub id: i64,
    pub username: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct CredentialsRecord {
    pub id: i64,
    pub username: String,
    pub password: Vec<u8>,
}

/// A post row joined with its like count.
#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct PostRecord {
    pub id: i64,
    pub timestamp: OffsetDateTime,
    pub comment: String,
    pub location_id: i64,
    pub user_id: i64,
    pub likes: i64,
}

impl From<FeatureRecord> for PartialFeature {
    fn from(value: FeatureRecord) -> Self {
        Self {
            id: value.id.into(),
            name: value.name,
        }
    }
}

impl From<LocationRecord> for PartialLocation {
    fn from(value: LocationRecord) -> Self {
        Self {
            id: value.id.into(),
            longitude: value.longitude,
            latitude: value.latitude,
            name: value.name,
            description: value.description,
            address: value.address,
        }
    }
}

impl From<UserRecord> for PartialUser {
    fn from(value: UserRecord) -> Self {
        Self {
            id: value.id.into(),
            username: value.username,
        }
    }
}

impl From<CredentialsRecord> for UserCredentials {
    fn from(value: CredentialsRecord) -> Self {
        Self {
            id: value.id.into(),
            username: value.username,
            password: value.password.into(),
        }
    }
}

impl TryFrom<PostRecord> for PartialPost {
    type Error = ModelValidationError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            timestamp: value.timestamp,
            comment: value.comment,
            location_id: value.location_id.into(),
            user_id: value.user_id.into(),
            likes: u64::try_from(value.likes)
                .map_err(|_| ModelValidationError::NegativeLikeCount(value.likes))?,
        })
    }
}
