use crate::model::{
    Id, MissingFieldError,
    auth::HashedPassword,
    post::{PartialPost, PostMarker},
    require,
};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct UserMarker;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct PartialUser {
    pub id: Id<UserMarker>,
    pub username: String,
}

/// User with authored posts embedded and liked posts referenced by id.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct User {
    pub id: Id<UserMarker>,
    pub username: String,
    pub posts: Vec<PartialPost>,
    pub liked_posts: Vec<Id<PostMarker>>,
}

/// Stored credentials; never serialized.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct UserCredentials {
    pub id: Id<UserMarker>,
    pub username: String,
    pub password: HashedPassword,
}

#[derive(Clone, Eq, PartialEq, Default, Hash, Deserialize)]
pub struct CredentialsBody {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreateUser {
    pub username: String,
    pub password: HashedPassword,
}

impl PartialUser {
    #[must_use]
    pub fn with_posts(self, posts: Vec<PartialPost>, liked_posts: Vec<Id<PostMarker>>) -> User {
        User {
            id: self.id,
            username: self.username,
            posts,
            liked_posts,
        }
    }
}

impl TryFrom<CredentialsBody> for Credentials {
    type Error = MissingFieldError;

    fn try_from(value: CredentialsBody) -> Result<Self, Self::Error> {
        Ok(Self {
            username: require(value.username, "username")?,
            password: require(value.password, "password")?,
        })
    }
}

impl std::fmt::Debug for CredentialsBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsBody")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}
