use crate::server::{
    Empty, Result, ServerError, ServerRouter,
    extract::{Json, Query},
};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use ithaca_traveller_common::model::{
    Id,
    location::LocationMarker,
    post::{
        Authored, CommentBody, CreatePost, PartialPost, Post, PostBody, PostMarker, PostSort,
        ViewedPost,
    },
    require,
    user::UserMarker,
};
use ithaca_traveller_db::client::DbClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(create_post)
        .typed_get(get_post)
        .typed_post(update_post)
        .typed_delete(delete_post)
        .typed_get(get_location_posts)
        .typed_post(like_post)
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
struct ViewerQuery {
    user_id: Option<Id<UserMarker>>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
struct LocationPostsQuery {
    sort: Option<String>,
    user_id: Option<Id<UserMarker>>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
struct LikeBody {
    user_id: Option<Id<UserMarker>>,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/posts/", rejection(ServerError))]
struct PostsPath();

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct CreatePostResponse {
    post_id: Id<PostMarker>,
}

async fn create_post(
    PostsPath(): PostsPath,
    State(db): State<Arc<DbClient>>,
    Json(body): Json<PostBody>,
) -> Result<(StatusCode, Json<CreatePostResponse>)> {
    let post = CreatePost::from_body(body, OffsetDateTime::now_utc())?;
    let post_id = db.create_post(&post).await?;

    Ok((StatusCode::CREATED, Json(CreatePostResponse { post_id })))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/posts/{id}/", rejection(ServerError))]
struct PostPath {
    id: Id<PostMarker>,
}

async fn get_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<DbClient>>,
    Query(query): Query<ViewerQuery>,
) -> Result<Json<ViewedPost<Post>>> {
    let viewer = require(query.user_id, "user_id")?;
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(post.viewed_by(viewer)))
}

async fn update_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<DbClient>>,
    Json(body): Json<CommentBody>,
) -> Result<Json<Empty>> {
    let comment = require(body.comment, "comment")?;
    db.update_post_comment(id, &comment).await?;

    Ok(Json(Empty {}))
}

async fn delete_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Empty>> {
    db.delete_post(id).await?;

    Ok(Json(Empty {}))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/posts/locations/{id}/", rejection(ServerError))]
struct LocationPostsPath {
    id: Id<LocationMarker>,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
struct PostsResponse {
    posts: Vec<ViewedPost<PartialPost>>,
}

async fn get_location_posts(
    LocationPostsPath { id }: LocationPostsPath,
    State(db): State<Arc<DbClient>>,
    Query(query): Query<LocationPostsQuery>,
) -> Result<Json<PostsResponse>> {
    let sort: PostSort = require(query.sort, "sort")?.parse()?;
    let viewer = require(query.user_id, "user_id")?;

    let posts = db
        .fetch_location_posts(id, sort)
        .await?
        .ok_or(ServerError::LocationByIdNotFound(id))?
        .into_iter()
        .map(|post| post.viewed_by(viewer))
        .collect();

    Ok(Json(PostsResponse { posts }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/posts/{id}/like/", rejection(ServerError))]
struct LikePostPath {
    id: Id<PostMarker>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct LikeResponse {
    liked: bool,
}

async fn like_post(
    LikePostPath { id }: LikePostPath,
    State(db): State<Arc<DbClient>>,
    Json(body): Json<LikeBody>,
) -> Result<Json<LikeResponse>> {
    let user_id = require(body.user_id, "user_id")?;
    let liked = db.toggle_like(id, user_id).await?;

    Ok(Json(LikeResponse { liked }))
}
