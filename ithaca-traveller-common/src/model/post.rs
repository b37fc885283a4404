use crate::model::{
    Id, MissingFieldError,
    location::{LocationMarker, PartialLocation},
    require,
    user::{PartialUser, UserMarker},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use time::OffsetDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct PartialPost {
    pub id: Id<PostMarker>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub comment: String,
    pub location_id: Id<LocationMarker>,
    pub user_id: Id<UserMarker>,
    pub likes: u64,
}

#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub comment: String,
    pub location: PartialLocation,
    pub author: PartialUser,
    pub liked_by: Vec<PartialUser>,
}

/// A post as seen by a particular user. `is_editable` is derived per request and never stored.
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct ViewedPost<P> {
    #[serde(flatten)]
    pub post: P,
    pub is_editable: bool,
}

pub trait Authored {
    fn author_id(&self) -> Id<UserMarker>;

    fn viewed_by(self, viewer: Id<UserMarker>) -> ViewedPost<Self>
    where
        Self: Sized,
    {
        let is_editable = self.author_id() == viewer;
        ViewedPost {
            post: self,
            is_editable,
        }
    }
}

impl Authored for PartialPost {
    fn author_id(&self) -> Id<UserMarker> {
        self.user_id
    }
}

impl Authored for Post {
    fn author_id(&self) -> Id<UserMarker> {
        self.author.id
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct PostBody {
    pub comment: Option<String>,
    pub location_id: Option<Id<LocationMarker>>,
    pub user_id: Option<Id<UserMarker>>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct CommentBody {
    pub comment: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreatePost {
    pub comment: String,
    pub location_id: Id<LocationMarker>,
    pub user_id: Id<UserMarker>,
    pub timestamp: OffsetDateTime,
}

impl CreatePost {
    pub fn from_body(body: PostBody, timestamp: OffsetDateTime) -> Result<Self, MissingFieldError> {
        Ok(Self {
            comment: require(body.comment, "comment")?,
            location_id: require(body.location_id, "location_id")?,
            user_id: require(body.user_id, "user_id")?,
            timestamp,
        })
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("invalid sort key: {0}")]
pub struct InvalidSortError(String);

/// Ordering applied to the posts listed under a location.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum PostSort {
    /// Newest first.
    Recent,
    /// Most liked first.
    Likes,
}

impl PostSort {
    /// Sorts in place. Posts comparing equal keep their relative order.
    pub fn sort(self, posts: &mut [PartialPost]) {
        match self {
            PostSort::Recent => posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
            PostSort::Likes => posts.sort_by(|a, b| b.likes.cmp(&a.likes)),
        }
    }
}

impl FromStr for PostSort {
    type Err = InvalidSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recent" => Ok(PostSort::Recent),
            "likes" => Ok(PostSort::Likes),
            other => Err(InvalidSortError(other.to_owned())),
        }
    }
}
