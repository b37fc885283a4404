use crate::model::{Id, MissingFieldError, location::LocationMarker, require};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct FeatureMarker;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct PartialFeature {
    pub id: Id<FeatureMarker>,
    pub name: String,
}

/// Feature with the ids of the locations tagged with it. Locations are never embedded, so
/// feature and location views cannot expand into each other.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct Feature {
    pub id: Id<FeatureMarker>,
    pub name: String,
    pub locations: Vec<Id<LocationMarker>>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct FeatureBody {
    pub name: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct CreateFeature {
    pub name: String,
}

impl PartialFeature {
    #[must_use]
    pub fn with_locations(self, locations: Vec<Id<LocationMarker>>) -> Feature {
        Feature {
            id: self.id,
            name: self.name,
            locations,
        }
    }
}

impl TryFrom<FeatureBody> for CreateFeature {
    type Error = MissingFieldError;

    fn try_from(value: FeatureBody) -> Result<Self, Self::Error> {
        Ok(Self {
            name: require(value.name, "name")?,
        })
    }
}
