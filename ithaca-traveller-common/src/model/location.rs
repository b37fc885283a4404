use crate::model::{
    Id, MissingFieldError, feature::PartialFeature, post::PartialPost, require,
};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct LocationMarker;

#[derive(Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct PartialLocation {
    pub id: Id<LocationMarker>,
    pub longitude: f64,
    pub latitude: f64,
    pub name: String,
    pub description: String,
    pub address: Option<String>,
}

/// Location with its features and posts embedded one level deep.
#[derive(Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct Location {
    pub id: Id<LocationMarker>,
    pub longitude: f64,
    pub latitude: f64,
    pub name: String,
    pub description: String,
    pub address: Option<String>,
    pub features: Vec<PartialFeature>,
    pub posts: Vec<PartialPost>,
}

#[derive(Clone, PartialEq, Debug, Default, Deserialize)]
pub struct LocationBody {
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct CreateLocation {
    pub longitude: f64,
    pub latitude: f64,
    pub name: String,
    pub description: String,
    pub address: Option<String>,
}

/// Fields to overwrite on an existing location. `None` leaves the stored value untouched.
#[derive(Clone, PartialEq, Debug, Default, Deserialize)]
pub struct LocationUpdate {
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
}

impl PartialLocation {
    #[must_use]
    pub fn with_relations(
        self,
        features: Vec<PartialFeature>,
        posts: Vec<PartialPost>,
    ) -> Location {
        Location {
            id: self.id,
            longitude: self.longitude,
            latitude: self.latitude,
            name: self.name,
            description: self.description,
            address: self.address,
            features,
            posts,
        }
    }

    pub fn apply(&mut self, update: LocationUpdate) {
        if let Some(longitude) = update.longitude {
            self.longitude = longitude;
        }
        if let Some(latitude) = update.latitude {
            self.latitude = latitude;
        }
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(address) = update.address {
            self.address = Some(address);
        }
    }
}

impl LocationUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.longitude.is_none()
            && self.latitude.is_none()
            && self.name.is_none()
            && self.description.is_none()
            && self.address.is_none()
    }
}

impl TryFrom<LocationBody> for CreateLocation {
    type Error = MissingFieldError;

    fn try_from(value: LocationBody) -> Result<Self, Self::Error> {
        Ok(Self {
            longitude: require(value.longitude, "longitude")?,
            latitude: require(value.latitude, "latitude")?,
            name: require(value.name, "name")?,
            description: require(value.description, "description")?,
            address: value.address,
        })
    }
}
