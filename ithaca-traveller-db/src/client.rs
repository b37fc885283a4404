use crate::record::{
    CredentialsRecord, FeatureRecord, LocationRecord, PostRecord, UserRecord,
};
use ithaca_traveller_common::model::{
    Id, ModelValidationError,
    feature::{CreateFeature, Feature, FeatureMarker, PartialFeature},
    location::{CreateLocation, Location, LocationMarker, LocationUpdate, PartialLocation},
    post::{CreatePost, PartialPost, Post, PostMarker, PostSort},
    user::{CreateUser, PartialUser, User, UserCredentials, UserMarker},
};
use sqlx::{
    Sqlite, SqliteExecutor, SqlitePool, Transaction,
    migrate::{MigrateError, Migrator},
    query, query_as, query_scalar,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use std::{str::FromStr, time::Duration};
use thiserror::Error;
use tracing::debug;

#[cfg(test)]
mod tests;

static MIGRATOR: Migrator = sqlx::migrate!();

/// How long a writer waits for the database lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

const POST_COLUMNS: &str = "
    SELECT
        posts.id,
        posts.timestamp,
        posts.comment,
        posts.location_id,
        posts.user_id,
        (SELECT COUNT(*) FROM post_likes WHERE post_likes.post_id = posts.id) AS likes
    FROM
        posts
";

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] MigrateError),
    #[error("Location with id {0} was not found.")]
    LocationNotFound(Id<LocationMarker>),
    #[error("Feature with id {0} was not found.")]
    FeatureNotFound(Id<FeatureMarker>),
    #[error("Post with id {0} was not found.")]
    PostNotFound(Id<PostMarker>),
    #[error("User with id {0} was not found.")]
    UserNotFound(Id<UserMarker>),
    #[error("Username {0:?} is already taken.")]
    UsernameTaken(String),
    #[error("Feature named {0:?} already exists.")]
    FeatureNameTaken(String),
    #[error("Location {location} already has feature {feature}.")]
    FeatureAlreadyAttached {
        feature: Id<FeatureMarker>,
        location: Id<LocationMarker>,
    },
    #[error("Location {location} does not have feature {feature}.")]
    FeatureNotAttached {
        feature: Id<FeatureMarker>,
        location: Id<LocationMarker>,
    },
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Entity store. Every mutating operation runs in its own transaction; dropping the
/// transaction on an early return rolls it back.
#[derive(Clone, Debug)]
pub struct DbClient {
    pool: SqlitePool,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        Self::migrated(pool).await
    }

    /// Private in-memory database. The pool holds exactly one connection that never expires,
    /// since every sqlite in-memory connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::migrated(pool).await
    }

    async fn migrated(pool: SqlitePool) -> Result<Self> {
        MIGRATOR.run(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Starts a transaction that holds the write lock from `BEGIN` on. Concurrent writers
    /// queue behind it for up to [`BUSY_TIMEOUT`] instead of failing on a lock upgrade.
    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    // Features

    pub async fn create_feature(&self, feature: &CreateFeature) -> Result<PartialFeature> {
        let mut tx = self.begin_write().await?;

        let taken: bool = query_scalar("SELECT EXISTS(SELECT 1 FROM features WHERE name = ?)")
            .bind(&feature.name)
            .fetch_one(&mut *tx)
            .await?;
        if taken {
            return Err(DbError::FeatureNameTaken(feature.name.clone()));
        }

        let record = query_as::<_, FeatureRecord>(
            "INSERT INTO features (name) VALUES (?) RETURNING id, name",
        )
        .bind(&feature.name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                DbError::FeatureNameTaken(feature.name.clone())
            } else {
                err.into()
            }
        })?;

        tx.commit().await?;
        debug!(feature_id = record.id, "Created feature");

        Ok(record.into())
    }

    pub async fn fetch_features(&self) -> Result<Vec<PartialFeature>> {
        let records = query_as::<_, FeatureRecord>("SELECT id, name FROM features ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(records.into_iter().map(PartialFeature::from).collect())
    }

    pub async fn fetch_feature(&self, feature_id: Id<FeatureMarker>) -> Result<Option<Feature>> {
        let mut tx = self.pool.begin().await?;

        let Some(record) =
            query_as::<_, FeatureRecord>("SELECT id, name FROM features WHERE id = ?")
                .bind(feature_id.get())
                .fetch_optional(&mut *tx)
                .await?
        else {
            return Ok(None);
        };
        let locations = fetch_feature_location_ids(&mut *tx, feature_id).await?;

        tx.commit().await?;
        Ok(Some(PartialFeature::from(record).with_locations(locations)))
    }

    pub async fn fetch_feature_by_name(&self, name: &str) -> Result<Option<Feature>> {
        let mut tx = self.pool.begin().await?;

        let Some(record) =
            query_as::<_, FeatureRecord>("SELECT id, name FROM features WHERE name = ?")
                .bind(name)
                .fetch_optional(&mut *tx)
                .await?
        else {
            return Ok(None);
        };
        let locations = fetch_feature_location_ids(&mut *tx, record.id.into()).await?;

        tx.commit().await?;
        Ok(Some(PartialFeature::from(record).with_locations(locations)))
    }

    /// Deletes the feature and its location links. Locations themselves are untouched.
    pub async fn delete_feature(&self, feature_id: Id<FeatureMarker>) -> Result<()> {
        let mut tx = self.begin_write().await?;

        query("DELETE FROM feature_locations WHERE feature_id = ?")
            .bind(feature_id.get())
            .execute(&mut *tx)
            .await?;
        let deleted = query("DELETE FROM features WHERE id = ?")
            .bind(feature_id.get())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(DbError::FeatureNotFound(feature_id));
        }

        tx.commit().await?;
        debug!(%feature_id, "Deleted feature");

        Ok(())
    }

    pub async fn attach_feature(
        &self,
        feature_id: Id<FeatureMarker>,
        location_id: Id<LocationMarker>,
    ) -> Result<()> {
        let mut tx = self.begin_write().await?;

        ensure_feature(&mut *tx, feature_id).await?;
        ensure_location(&mut *tx, location_id).await?;

        let already_attached = DbError::FeatureAlreadyAttached {
            feature: feature_id,
            location: location_id,
        };
        let attached: bool = query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM feature_locations WHERE feature_id = ? AND location_id = ?
            )",
        )
        .bind(feature_id.get())
        .bind(location_id.get())
        .fetch_one(&mut *tx)
        .await?;
        if attached {
            return Err(already_attached);
        }

        query("INSERT INTO feature_locations (feature_id, location_id) VALUES (?, ?)")
            .bind(feature_id.get())
            .bind(location_id.get())
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    already_attached
                } else {
                    err.into()
                }
            })?;

        tx.commit().await?;
        debug!(%feature_id, %location_id, "Attached feature");

        Ok(())
    }

    pub async fn detach_feature(
        &self,
        feature_id: Id<FeatureMarker>,
        location_id: Id<LocationMarker>,
    ) -> Result<()> {
        let mut tx = self.begin_write().await?;

        ensure_feature(&mut *tx, feature_id).await?;
        ensure_location(&mut *tx, location_id).await?;

        let deleted =
            query("DELETE FROM feature_locations WHERE feature_id = ? AND location_id = ?")
                .bind(feature_id.get())
                .bind(location_id.get())
                .execute(&mut *tx)
                .await?
                .rows_affected();
        if deleted == 0 {
            return Err(DbError::FeatureNotAttached {
                feature: feature_id,
                location: location_id,
            });
        }

        tx.commit().await?;
        debug!(%feature_id, %location_id, "Detached feature");

        Ok(())
    }

    // Locations

    pub async fn create_location(&self, location: &CreateLocation) -> Result<PartialLocation> {
        let mut tx = self.begin_write().await?;

        let record = query_as::<_, LocationRecord>(
            "
            INSERT INTO locations (longitude, latitude, name, description, address)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, longitude, latitude, name, description, address
            ",
        )
        .bind(location.longitude)
        .bind(location.latitude)
        .bind(&location.name)
        .bind(&location.description)
        .bind(location.address.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(location_id = record.id, "Created location");

        Ok(record.into())
    }

    pub async fn fetch_locations(&self) -> Result<Vec<PartialLocation>> {
        let records = query_as::<_, LocationRecord>(
            "
            SELECT id, longitude, latitude, name, description, address
            FROM locations
            ORDER BY id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(PartialLocation::from).collect())
    }

    pub async fn fetch_location(
        &self,
        location_id: Id<LocationMarker>,
    ) -> Result<Option<Location>> {
        let mut tx = self.pool.begin().await?;

        let Some(location) = fetch_partial_location(&mut *tx, location_id).await? else {
            return Ok(None);
        };

        let features = query_as::<_, FeatureRecord>(
            "
            SELECT
                features.id,
                features.name
            FROM
                features JOIN feature_locations ON feature_locations.feature_id = features.id
            WHERE
                feature_locations.location_id = ?
            ORDER BY
                features.id
            ",
        )
        .bind(location_id.get())
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(PartialFeature::from)
        .collect();

        let posts = fetch_posts_where(&mut *tx, "location_id", location_id.get()).await?;

        tx.commit().await?;
        Ok(Some(location.with_relations(features, posts)))
    }

    /// Reads the location, applies `update`, writes it back and returns the stored result.
    /// An empty update writes nothing.
    pub async fn update_location(
        &self,
        location_id: Id<LocationMarker>,
        update: LocationUpdate,
    ) -> Result<PartialLocation> {
        let mut tx = self.begin_write().await?;

        let mut location = fetch_partial_location(&mut *tx, location_id)
            .await?
            .ok_or(DbError::LocationNotFound(location_id))?;
        if update.is_empty() {
            return Ok(location);
        }
        location.apply(update);

        query(
            "
            UPDATE locations
            SET longitude = ?, latitude = ?, name = ?, description = ?, address = ?
            WHERE id = ?
            ",
        )
        .bind(location.longitude)
        .bind(location.latitude)
        .bind(&location.name)
        .bind(&location.description)
        .bind(location.address.as_deref())
        .bind(location_id.get())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(%location_id, "Updated location");

        fetch_partial_location(&self.pool, location_id)
            .await?
            .ok_or(DbError::LocationNotFound(location_id))
    }

    /// Deletes the location. Its posts, their likes and its feature links go with it.
    pub async fn delete_location(&self, location_id: Id<LocationMarker>) -> Result<()> {
        let mut tx = self.begin_write().await?;

        let deleted = query("DELETE FROM locations WHERE id = ?")
            .bind(location_id.get())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(DbError::LocationNotFound(location_id));
        }

        tx.commit().await?;
        debug!(%location_id, "Deleted location");

        Ok(())
    }

    // Posts

    pub async fn create_post(&self, post: &CreatePost) -> Result<Id<PostMarker>> {
        let mut tx = self.begin_write().await?;

        ensure_location(&mut *tx, post.location_id).await?;
        ensure_user(&mut *tx, post.user_id).await?;

        let post_id: i64 = query_scalar(
            "
            INSERT INTO posts (timestamp, comment, location_id, user_id)
            VALUES (?, ?, ?, ?)
            RETURNING id
            ",
        )
        .bind(post.timestamp)
        .bind(&post.comment)
        .bind(post.location_id.get())
        .bind(post.user_id.get())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(post_id, location_id = %post.location_id, user_id = %post.user_id, "Created post");

        Ok(post_id.into())
    }

    pub async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let mut tx = self.pool.begin().await?;

        let Some(record) = query_as::<_, PostRecord>(&format!("{POST_COLUMNS} WHERE posts.id = ?"))
            .bind(post_id.get())
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };
        let post = PartialPost::try_from(record)?;

        let location = fetch_partial_location(&mut *tx, post.location_id)
            .await?
            .ok_or(DbError::LocationNotFound(post.location_id))?;
        let author = fetch_partial_user(&mut *tx, post.user_id)
            .await?
            .ok_or(DbError::UserNotFound(post.user_id))?;
        let liked_by = query_as::<_, UserRecord>(
            "
            SELECT
                users.id,
                users.username
            FROM
                users JOIN post_likes ON post_likes.user_id = users.id
            WHERE
                post_likes.post_id = ?
            ORDER BY
                users.id
            ",
        )
        .bind(post_id.get())
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(PartialUser::from)
        .collect();

        tx.commit().await?;
        Ok(Some(Post {
            id: post.id,
            timestamp: post.timestamp,
            comment: post.comment,
            location,
            author,
            liked_by,
        }))
    }

    pub async fn post_exists(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let exists = query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?)")
            .bind(post_id.get())
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    /// Posts under a location in the requested order, or `None` if the location does not exist.
    pub async fn fetch_location_posts(
        &self,
        location_id: Id<LocationMarker>,
        sort: PostSort,
    ) -> Result<Option<Vec<PartialPost>>> {
        let mut tx = self.pool.begin().await?;

        if !location_exists(&mut *tx, location_id).await? {
            return Ok(None);
        }
        let mut posts = fetch_posts_where(&mut *tx, "location_id", location_id.get()).await?;

        tx.commit().await?;
        sort.sort(&mut posts);

        Ok(Some(posts))
    }

    pub async fn update_post_comment(&self, post_id: Id<PostMarker>, comment: &str) -> Result<()> {
        let mut tx = self.begin_write().await?;

        let updated = query("UPDATE posts SET comment = ? WHERE id = ?")
            .bind(comment)
            .bind(post_id.get())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if updated == 0 {
            return Err(DbError::PostNotFound(post_id));
        }

        tx.commit().await?;
        debug!(%post_id, "Updated post comment");

        Ok(())
    }

    pub async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<()> {
        let mut tx = self.begin_write().await?;

        let deleted = query("DELETE FROM posts WHERE id = ?")
            .bind(post_id.get())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(DbError::PostNotFound(post_id));
        }

        tx.commit().await?;
        debug!(%post_id, "Deleted post");

        Ok(())
    }

    /// Likes the post if the user has not liked it yet, otherwise removes the like.
    /// Returns whether the post is liked by the user afterwards.
    pub async fn toggle_like(
        &self,
        post_id: Id<PostMarker>,
        user_id: Id<UserMarker>,
    ) -> Result<bool> {
        let mut tx = self.begin_write().await?;

        ensure_post(&mut *tx, post_id).await?;
        ensure_user(&mut *tx, user_id).await?;

        let removed = query("DELETE FROM post_likes WHERE post_id = ? AND user_id = ?")
            .bind(post_id.get())
            .bind(user_id.get())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let liked = removed == 0;
        if liked {
            query("INSERT INTO post_likes (post_id, user_id) VALUES (?, ?)")
                .bind(post_id.get())
                .bind(user_id.get())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        debug!(%post_id, %user_id, liked, "Toggled like");

        Ok(liked)
    }

    // Users

    pub async fn create_user(&self, user: &CreateUser) -> Result<Id<UserMarker>> {
        let mut tx = self.begin_write().await?;

        let taken: bool = query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)")
            .bind(&user.username)
            .fetch_one(&mut *tx)
            .await?;
        if taken {
            return Err(DbError::UsernameTaken(user.username.clone()));
        }

        let user_id: i64 = query_scalar(
            "INSERT INTO users (username, password) VALUES (?, ?) RETURNING id",
        )
        .bind(&user.username)
        .bind(user.password.as_bytes())
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                DbError::UsernameTaken(user.username.clone())
            } else {
                err.into()
            }
        })?;

        tx.commit().await?;
        debug!(user_id, "Created user");

        Ok(user_id.into())
    }

    pub async fn fetch_users(&self) -> Result<Vec<PartialUser>> {
        let records = query_as::<_, UserRecord>("SELECT id, username FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(records.into_iter().map(PartialUser::from).collect())
    }

    pub async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let mut tx = self.pool.begin().await?;

        let Some(user) = fetch_partial_user(&mut *tx, user_id).await? else {
            return Ok(None);
        };
        let posts = fetch_posts_where(&mut *tx, "user_id", user_id.get()).await?;
        let liked_posts = query_scalar::<_, i64>(
            "SELECT post_id FROM post_likes WHERE user_id = ? ORDER BY post_id",
        )
        .bind(user_id.get())
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(Id::from)
        .collect();

        tx.commit().await?;
        Ok(Some(user.with_posts(posts, liked_posts)))
    }

    pub async fn user_exists(&self, user_id: Id<UserMarker>) -> Result<bool> {
        let exists = query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
            .bind(user_id.get())
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    pub async fn fetch_user_credentials(&self, username: &str) -> Result<Option<UserCredentials>> {
        let record = query_as::<_, CredentialsRecord>(
            "SELECT id, username, password FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(UserCredentials::from))
    }

    /// Deletes the user together with their posts and likes.
    pub async fn delete_user(&self, user_id: Id<UserMarker>) -> Result<()> {
        let mut tx = self.begin_write().await?;

        let deleted = query("DELETE FROM users WHERE id = ?")
            .bind(user_id.get())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(DbError::UserNotFound(user_id));
        }

        tx.commit().await?;
        debug!(%user_id, "Deleted user");

        Ok(())
    }
}

async fn fetch_feature_location_ids(
    executor: impl SqliteExecutor<'_>,
    feature_id: Id<FeatureMarker>,
) -> Result<Vec<Id<LocationMarker>>> {
    let ids = query_scalar::<_, i64>(
        "SELECT location_id FROM feature_locations WHERE feature_id = ? ORDER BY location_id",
    )
    .bind(feature_id.get())
    .fetch_all(executor)
    .await?;

    Ok(ids.into_iter().map(Id::from).collect())
}

async fn fetch_partial_location(
    executor: impl SqliteExecutor<'_>,
    location_id: Id<LocationMarker>,
) -> Result<Option<PartialLocation>> {
    let record = query_as::<_, LocationRecord>(
        "
        SELECT id, longitude, latitude, name, description, address
        FROM locations
        WHERE id = ?
        ",
    )
    .bind(location_id.get())
    .fetch_optional(executor)
    .await?;

    Ok(record.map(PartialLocation::from))
}

async fn fetch_partial_user(
    executor: impl SqliteExecutor<'_>,
    user_id: Id<UserMarker>,
) -> Result<Option<PartialUser>> {
    let record = query_as::<_, UserRecord>("SELECT id, username FROM users WHERE id = ?")
        .bind(user_id.get())
        .fetch_optional(executor)
        .await?;

    Ok(record.map(PartialUser::from))
}

/// Posts whose `column` equals `id`, in insertion order. `column` is always a literal.
async fn fetch_posts_where(
    executor: impl SqliteExecutor<'_>,
    column: &'static str,
    id: i64,
) -> Result<Vec<PartialPost>> {
    let records = query_as::<_, PostRecord>(&format!(
        "{POST_COLUMNS} WHERE posts.{column} = ? ORDER BY posts.id"
    ))
    .bind(id)
    .fetch_all(executor)
    .await?;

    let posts = records
        .into_iter()
        .map(PartialPost::try_from)
        .collect::<Result<_, _>>()?;
    Ok(posts)
}

async fn location_exists(
    executor: impl SqliteExecutor<'_>,
    location_id: Id<LocationMarker>,
) -> Result<bool> {
    let exists = query_scalar("SELECT EXISTS(SELECT 1 FROM locations WHERE id = ?)")
        .bind(location_id.get())
        .fetch_one(executor)
        .await?;

    Ok(exists)
}

async fn ensure_location(
    executor: impl SqliteExecutor<'_>,
    location_id: Id<LocationMarker>,
) -> Result<()> {
    if location_exists(executor, location_id).await? {
        Ok(())
    } else {
        Err(DbError::LocationNotFound(location_id))
    }
}

async fn ensure_feature(
    executor: impl SqliteExecutor<'_>,
    feature_id: Id<FeatureMarker>,
) -> Result<()> {
    let exists: bool = query_scalar("SELECT EXISTS(SELECT 1 FROM features WHERE id = ?)")
        .bind(feature_id.get())
        .fetch_one(executor)
        .await?;

    if exists {
        Ok(())
    } else {
        Err(DbError::FeatureNotFound(feature_id))
    }
}

async fn ensure_post(executor: impl SqliteExecutor<'_>, post_id: Id<PostMarker>) -> Result<()> {
    let exists: bool = query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?)")
        .bind(post_id.get())
        .fetch_one(executor)
        .await?;

    if exists {
        Ok(())
    } else {
        Err(DbError::PostNotFound(post_id))
    }
}

async fn ensure_user(executor: impl SqliteExecutor<'_>, user_id: Id<UserMarker>) -> Result<()> {
    let exists: bool = query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
        .bind(user_id.get())
        .fetch_one(executor)
        .await?;

    if exists {
        Ok(())
    } else {
        Err(DbError::UserNotFound(user_id))
    }
}
