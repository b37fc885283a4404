use crate::client::{DbClient, DbError};
use ithaca_traveller_common::model::{
    Id,
    auth::HashedPassword,
    feature::{CreateFeature, FeatureMarker},
    location::{CreateLocation, LocationMarker, LocationUpdate},
    post::{CreatePost, PostMarker, PostSort},
    user::{CreateUser, UserMarker},
};
use tempfile::TempDir;
use time::{Duration, OffsetDateTime, macros::datetime};

const EPOCH: OffsetDateTime = datetime!(2024-05-01 12:00 UTC);

async fn client() -> DbClient {
    DbClient::in_memory().await.unwrap()
}

/// A database file with a full connection pool, so operations really run side by side.
async fn file_client() -> (DbClient, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("store.db").display());
    let db = DbClient::connect(&url).await.unwrap();

    (db, dir)
}

/// Creates a user without paying for a password hash.
async fn cheap_user(db: &DbClient, username: &str) -> Result<Id<UserMarker>, DbError> {
    db.create_user(&CreateUser {
        username: username.to_owned(),
        password: HashedPassword::from(b"not a real hash".to_vec()),
    })
    .await
}

async fn location(db: &DbClient, name: &str) -> Id<LocationMarker> {
    db.create_location(&CreateLocation {
        longitude: -76.5,
        latitude: 42.44,
        name: name.to_owned(),
        description: format!("{name} description"),
        address: None,
    })
    .await
    .unwrap()
    .id
}

async fn feature(db: &DbClient, name: &str) -> Id<FeatureMarker> {
    db.create_feature(&CreateFeature {
        name: name.to_owned(),
    })
    .await
    .unwrap()
    .id
}

async fn user(db: &DbClient, username: &str) -> Id<UserMarker> {
    db.create_user(&CreateUser {
        username: username.to_owned(),
        password: HashedPassword::hash("password").unwrap(),
    })
    .await
    .unwrap()
}

async fn post(
    db: &DbClient,
    location_id: Id<LocationMarker>,
    user_id: Id<UserMarker>,
    minutes: i64,
) -> Id<PostMarker> {
    db.create_post(&CreatePost {
        comment: format!("written at minute {minutes}"),
        location_id,
        user_id,
        timestamp: EPOCH + Duration::minutes(minutes),
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn ids_start_at_one() {
    let db = client().await;

    assert_eq!(user(&db, "a").await, Id::new(1));
    assert_eq!(location(&db, "Commons").await, Id::new(1));
    assert_eq!(user(&db, "b").await, Id::new(2));
}

#[tokio::test]
async fn missing_ids_are_none() {
    let db = client().await;

    assert!(db.fetch_location(Id::new(1)).await.unwrap().is_none());
    assert!(db.fetch_feature(Id::new(1)).await.unwrap().is_none());
    assert!(db.fetch_post(Id::new(1)).await.unwrap().is_none());
    assert!(db.fetch_user(Id::new(1)).await.unwrap().is_none());
    assert!(
        db.fetch_location_posts(Id::new(1), PostSort::Recent)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn locations_are_listed_in_insertion_order() {
    let db = client().await;
    for name in ["Gorges", "Commons", "Arboretum"] {
        location(&db, name).await;
    }

    let names: Vec<_> = db
        .fetch_locations()
        .await
        .unwrap()
        .into_iter()
        .map(|location| location.name)
        .collect();
    assert_eq!(names, ["Gorges", "Commons", "Arboretum"]);
}

#[tokio::test]
async fn update_location_keeps_absent_fields() {
    let db = client().await;
    let location_id = location(&db, "Commons").await;

    let updated = db
        .update_location(
            location_id,
            LocationUpdate {
                name: Some("The Commons".to_owned()),
                address: Some("State St".to_owned()),
                ..LocationUpdate::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "The Commons");
    assert_eq!(updated.address.as_deref(), Some("State St"));
    assert_eq!(updated.description, "Commons description");

    let stored = db.fetch_location(location_id).await.unwrap().unwrap();
    assert_eq!(stored.name, "The Commons");
}

#[tokio::test]
async fn update_missing_location_is_not_found() {
    let db = client().await;

    let result = db
        .update_location(Id::new(9), LocationUpdate::default())
        .await;
    assert!(matches!(result, Err(DbError::LocationNotFound(id)) if id == Id::new(9)));
}

#[tokio::test]
async fn empty_update_returns_location_unchanged() {
    let db = client().await;
    let location_id = location(&db, "Commons").await;
    let before = db.fetch_location(location_id).await.unwrap().unwrap();

    let updated = db
        .update_location(location_id, LocationUpdate::default())
        .await
        .unwrap();

    assert_eq!(updated.name, before.name);
    assert_eq!(updated.description, before.description);
    assert_eq!(updated.address, before.address);
}

#[tokio::test]
async fn deleting_location_cascades_to_its_posts() {
    let db = client().await;
    let author = user(&db, "a").await;
    let doomed = location(&db, "Doomed").await;
    let kept = location(&db, "Kept").await;
    let doomed_posts = [post(&db, doomed, author, 0).await, post(&db, doomed, author, 1).await];
    let kept_post = post(&db, kept, author, 2).await;
    db.toggle_like(doomed_posts[0], author).await.unwrap();

    db.delete_location(doomed).await.unwrap();

    for post_id in doomed_posts {
        assert!(db.fetch_post(post_id).await.unwrap().is_none());
    }
    assert!(db.fetch_post(kept_post).await.unwrap().is_some());

    let author_view = db.fetch_user(author).await.unwrap().unwrap();
    assert_eq!(author_view.posts.len(), 1);
    assert!(author_view.liked_posts.is_empty());
}

#[tokio::test]
async fn deleting_user_cascades_to_posts_and_likes() {
    let db = client().await;
    let author = user(&db, "author").await;
    let fan = user(&db, "fan").await;
    let location_id = location(&db, "Commons").await;
    let own_post = post(&db, location_id, author, 0).await;
    let other_post = post(&db, location_id, fan, 1).await;
    db.toggle_like(other_post, author).await.unwrap();

    db.delete_user(author).await.unwrap();

    assert!(db.fetch_post(own_post).await.unwrap().is_none());
    let remaining = db.fetch_post(other_post).await.unwrap().unwrap();
    assert!(remaining.liked_by.is_empty());
    assert!(db.fetch_location(location_id).await.unwrap().is_some());
}

#[tokio::test]
async fn deleting_missing_entities_is_not_found() {
    let db = client().await;

    assert!(matches!(
        db.delete_location(Id::new(1)).await,
        Err(DbError::LocationNotFound(_))
    ));
    assert!(matches!(
        db.delete_user(Id::new(1)).await,
        Err(DbError::UserNotFound(_))
    ));
    assert!(matches!(
        db.delete_post(Id::new(1)).await,
        Err(DbError::PostNotFound(_))
    ));
    assert!(matches!(
        db.delete_feature(Id::new(1)).await,
        Err(DbError::FeatureNotFound(_))
    ));
}

#[tokio::test]
async fn attaching_twice_conflicts_and_keeps_one_link() {
    let db = client().await;
    let feature_id = feature(&db, "wifi").await;
    let location_id = location(&db, "Library").await;

    db.attach_feature(feature_id, location_id).await.unwrap();
    let second = db.attach_feature(feature_id, location_id).await;

    assert!(matches!(
        second,
        Err(DbError::FeatureAlreadyAttached { feature, location })
            if feature == feature_id && location == location_id
    ));
    let stored = db.fetch_feature(feature_id).await.unwrap().unwrap();
    assert_eq!(stored.locations, [location_id]);
}

#[tokio::test]
async fn attach_requires_both_sides() {
    let db = client().await;
    let feature_id = feature(&db, "wifi").await;
    let location_id = location(&db, "Library").await;

    assert!(matches!(
        db.attach_feature(Id::new(99), location_id).await,
        Err(DbError::FeatureNotFound(_))
    ));
    assert!(matches!(
        db.attach_feature(feature_id, Id::new(99)).await,
        Err(DbError::LocationNotFound(_))
    ));
}

#[tokio::test]
async fn detach_removes_only_the_link() {
    let db = client().await;
    let feature_id = feature(&db, "parking").await;
    let location_id = location(&db, "Mall").await;
    db.attach_feature(feature_id, location_id).await.unwrap();

    db.detach_feature(feature_id, location_id).await.unwrap();

    assert!(
        db.fetch_feature(feature_id)
            .await
            .unwrap()
            .unwrap()
            .locations
            .is_empty()
    );
    assert!(db.fetch_location(location_id).await.unwrap().is_some());
    assert!(matches!(
        db.detach_feature(feature_id, location_id).await,
        Err(DbError::FeatureNotAttached { .. })
    ));
}

#[tokio::test]
async fn deleting_feature_does_not_delete_locations() {
    let db = client().await;
    let feature_id = feature(&db, "views").await;
    let first = location(&db, "Lookout").await;
    let second = location(&db, "Tower").await;
    db.attach_feature(feature_id, first).await.unwrap();
    db.attach_feature(feature_id, second).await.unwrap();

    db.delete_feature(feature_id).await.unwrap();

    assert!(db.fetch_feature_by_name("views").await.unwrap().is_none());
    let lookout = db.fetch_location(first).await.unwrap().unwrap();
    assert!(lookout.features.is_empty());
    assert_eq!(db.fetch_locations().await.unwrap().len(), 2);
}

#[tokio::test]
async fn feature_names_are_unique() {
    let db = client().await;
    feature(&db, "wifi").await;

    let duplicate = db
        .create_feature(&CreateFeature {
            name: "wifi".to_owned(),
        })
        .await;
    assert!(matches!(duplicate, Err(DbError::FeatureNameTaken(name)) if name == "wifi"));
    assert_eq!(db.fetch_features().await.unwrap().len(), 1);
}

#[tokio::test]
async fn feature_lookup_by_name_lists_location_ids() {
    let db = client().await;
    let feature_id = feature(&db, "food").await;
    let first = location(&db, "Collegetown").await;
    location(&db, "Unrelated").await;
    let third = location(&db, "Commons").await;
    db.attach_feature(feature_id, third).await.unwrap();
    db.attach_feature(feature_id, first).await.unwrap();

    let found = db.fetch_feature_by_name("food").await.unwrap().unwrap();

    assert_eq!(found.id, feature_id);
    assert_eq!(found.locations, [first, third]);
}

#[tokio::test]
async fn duplicate_username_conflicts_and_adds_no_row() {
    let db = client().await;
    user(&db, "a").await;

    let duplicate = db
        .create_user(&CreateUser {
            username: "a".to_owned(),
            password: HashedPassword::hash("other").unwrap(),
        })
        .await;

    assert!(matches!(duplicate, Err(DbError::UsernameTaken(name)) if name == "a"));
    assert_eq!(db.fetch_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn stored_credentials_verify() {
    let db = client().await;
    let user_id = user(&db, "a").await;

    let credentials = db.fetch_user_credentials("a").await.unwrap().unwrap();

    assert_eq!(credentials.id, user_id);
    assert!(credentials.password.verify("password").unwrap());
    assert!(!credentials.password.verify("wrong").unwrap());
    assert!(db.fetch_user_credentials("b").await.unwrap().is_none());
}

#[tokio::test]
async fn create_post_requires_existing_references() {
    let db = client().await;
    let user_id = user(&db, "a").await;
    let location_id = location(&db, "Commons").await;

    let no_location = db
        .create_post(&CreatePost {
            comment: "hi".to_owned(),
            location_id: Id::new(42),
            user_id,
            timestamp: EPOCH,
        })
        .await;
    assert!(matches!(no_location, Err(DbError::LocationNotFound(_))));

    let no_user = db
        .create_post(&CreatePost {
            comment: "hi".to_owned(),
            location_id,
            user_id: Id::new(42),
            timestamp: EPOCH,
        })
        .await;
    assert!(matches!(no_user, Err(DbError::UserNotFound(_))));

    let location_view = db.fetch_location(location_id).await.unwrap().unwrap();
    assert!(location_view.posts.is_empty());
}

#[tokio::test]
async fn toggle_like_is_involutive() {
    let db = client().await;
    let author = user(&db, "author").await;
    let fan = user(&db, "fan").await;
    let location_id = location(&db, "Commons").await;
    let post_id = post(&db, location_id, author, 0).await;

    assert!(db.toggle_like(post_id, fan).await.unwrap());
    let liked = db.fetch_post(post_id).await.unwrap().unwrap();
    assert_eq!(liked.liked_by.len(), 1);
    assert_eq!(liked.liked_by[0].id, fan);

    assert!(!db.toggle_like(post_id, fan).await.unwrap());
    let unliked = db.fetch_post(post_id).await.unwrap().unwrap();
    assert!(unliked.liked_by.is_empty());
}

#[tokio::test]
async fn toggle_like_requires_existing_post_and_user() {
    let db = client().await;
    let user_id = user(&db, "a").await;
    let location_id = location(&db, "Commons").await;
    let post_id = post(&db, location_id, user_id, 0).await;

    assert!(matches!(
        db.toggle_like(Id::new(50), user_id).await,
        Err(DbError::PostNotFound(_))
    ));
    assert!(matches!(
        db.toggle_like(post_id, Id::new(50)).await,
        Err(DbError::UserNotFound(_))
    ));
}

#[tokio::test]
async fn location_posts_sort_by_recent_and_likes() {
    let db = client().await;
    let users = [user(&db, "a").await, user(&db, "b").await, user(&db, "c").await];
    let location_id = location(&db, "Commons").await;
    let oldest = post(&db, location_id, users[0], 0).await;
    let newest = post(&db, location_id, users[1], 20).await;
    let middle = post(&db, location_id, users[2], 10).await;
    for user_id in users {
        db.toggle_like(oldest, user_id).await.unwrap();
    }
    db.toggle_like(middle, users[0]).await.unwrap();

    let recent = db
        .fetch_location_posts(location_id, PostSort::Recent)
        .await
        .unwrap()
        .unwrap();
    let recent_ids: Vec<_> = recent.iter().map(|post| post.id).collect();
    assert_eq!(recent_ids, [newest, middle, oldest]);
    assert!(recent.windows(2).all(|pair| pair[0].timestamp >= pair[1].timestamp));

    let liked = db
        .fetch_location_posts(location_id, PostSort::Likes)
        .await
        .unwrap()
        .unwrap();
    let liked_counts: Vec<_> = liked.iter().map(|post| (post.id, post.likes)).collect();
    assert_eq!(liked_counts, [(oldest, 3), (middle, 1), (newest, 0)]);
}

#[tokio::test]
async fn like_ties_keep_insertion_order() {
    let db = client().await;
    let user_id = user(&db, "a").await;
    let location_id = location(&db, "Commons").await;
    let first = post(&db, location_id, user_id, 5).await;
    let second = post(&db, location_id, user_id, 0).await;

    let posts = db
        .fetch_location_posts(location_id, PostSort::Likes)
        .await
        .unwrap()
        .unwrap();

    let ids: Vec<_> = posts.iter().map(|post| post.id).collect();
    assert_eq!(ids, [first, second]);
}

#[tokio::test]
async fn post_full_view_embeds_location_and_author() {
    let db = client().await;
    let user_id = user(&db, "writer").await;
    let location_id = location(&db, "Falls").await;
    let post_id = post(&db, location_id, user_id, 3).await;

    let post = db.fetch_post(post_id).await.unwrap().unwrap();

    assert_eq!(post.location.id, location_id);
    assert_eq!(post.location.name, "Falls");
    assert_eq!(post.author.username, "writer");
    assert_eq!(post.timestamp, EPOCH + Duration::minutes(3));
}

#[tokio::test]
async fn update_post_comment_changes_only_comment() {
    let db = client().await;
    let user_id = user(&db, "a").await;
    let location_id = location(&db, "Commons").await;
    let post_id = post(&db, location_id, user_id, 0).await;

    db.update_post_comment(post_id, "edited").await.unwrap();

    let post = db.fetch_post(post_id).await.unwrap().unwrap();
    assert_eq!(post.comment, "edited");
    assert_eq!(post.timestamp, EPOCH);
    assert!(matches!(
        db.update_post_comment(Id::new(7), "x").await,
        Err(DbError::PostNotFound(_))
    ));
}

#[tokio::test]
async fn user_full_view_lists_posts_and_likes() {
    let db = client().await;
    let author = user(&db, "author").await;
    let location_id = location(&db, "Commons").await;
    let first = post(&db, location_id, author, 0).await;
    let second = post(&db, location_id, author, 1).await;
    db.toggle_like(second, author).await.unwrap();

    let view = db.fetch_user(author).await.unwrap().unwrap();

    let post_ids: Vec<_> = view.posts.iter().map(|post| post.id).collect();
    assert_eq!(post_ids, [first, second]);
    assert_eq!(view.liked_posts, [second]);
    assert!(db.user_exists(author).await.unwrap());
    assert!(db.post_exists(first).await.unwrap());
    assert!(!db.post_exists(Id::new(77)).await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_likes_all_land() {
    let (db, _dir) = file_client().await;
    let location_id = location(&db, "Commons").await;
    let author = cheap_user(&db, "author").await.unwrap();
    let post_id = post(&db, location_id, author, 0).await;
    let mut fans = Vec::new();
    for i in 0..20 {
        fans.push(cheap_user(&db, &format!("fan{i}")).await.unwrap());
    }

    let tasks: Vec<_> = fans
        .iter()
        .map(|&user_id| {
            let db = db.clone();
            tokio::spawn(async move { db.toggle_like(post_id, user_id).await })
        })
        .collect();
    for task in tasks {
        assert!(task.await.unwrap().unwrap());
    }

    let view = db.fetch_post(post_id).await.unwrap().unwrap();
    assert_eq!(view.liked_by.len(), fans.len());
    let posts = db
        .fetch_location_posts(location_id, PostSort::Likes)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(posts[0].likes, 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_user_creation_assigns_distinct_ids() {
    let (db, _dir) = file_client().await;

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let db = db.clone();
            tokio::spawn(async move { cheap_user(&db, &format!("walker{i}")).await })
        })
        .collect();
    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().unwrap());
    }

    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 20);
    assert_eq!(db.fetch_users().await.unwrap().len(), 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_duplicate_usernames_conflict_cleanly() {
    let (db, _dir) = file_client().await;

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let db = db.clone();
            tokio::spawn(async move { cheap_user(&db, "same").await })
        })
        .collect();
    let mut created = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => created += 1,
            Err(DbError::UsernameTaken(name)) => assert_eq!(name, "same"),
            Err(err) => panic!("unexpected error: {err}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(db.fetch_users().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_attachments_keep_one_link() {
    let (db, _dir) = file_client().await;
    let location_id = location(&db, "Library").await;
    let feature_id = feature(&db, "wifi").await;

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let db = db.clone();
            tokio::spawn(async move { db.attach_feature(feature_id, location_id).await })
        })
        .collect();
    let mut attached = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(()) => attached += 1,
            Err(DbError::FeatureAlreadyAttached { .. }) => {}
            Err(err) => panic!("unexpected error: {err}"),
        }
    }

    assert_eq!(attached, 1);
    let stored = db.fetch_feature(feature_id).await.unwrap().unwrap();
    assert_eq!(stored.locations, [location_id]);
}

#[tokio::test]
async fn failed_mutations_leave_no_rows() {
    let (db, _dir) = file_client().await;
    let location_id = location(&db, "Commons").await;
    let user_id = cheap_user(&db, "a").await.unwrap();
    let post_id = post(&db, location_id, user_id, 0).await;
    let feature_id = feature(&db, "wifi").await;

    let missing_author = db
        .create_post(&CreatePost {
            comment: "orphan".to_owned(),
            location_id,
            user_id: Id::new(99),
            timestamp: EPOCH,
        })
        .await;
    assert!(matches!(missing_author, Err(DbError::UserNotFound(_))));
    let missing_liker = db.toggle_like(post_id, Id::new(99)).await;
    assert!(matches!(missing_liker, Err(DbError::UserNotFound(_))));
    let missing_location = db.attach_feature(feature_id, Id::new(99)).await;
    assert!(matches!(missing_location, Err(DbError::LocationNotFound(_))));

    let posts = db
        .fetch_location_posts(location_id, PostSort::Recent)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].likes, 0);
    let stored = db.fetch_feature(feature_id).await.unwrap().unwrap();
    assert!(stored.locations.is_empty());
}
