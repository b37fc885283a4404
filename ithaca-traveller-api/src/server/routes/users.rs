use crate::server::{Empty, Result, ServerError, ServerRouter, extract::Json};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use ithaca_traveller_common::model::{
    Id,
    auth::HashedPassword,
    user::{CreateUser, Credentials, CredentialsBody, PartialUser, User, UserMarker},
};
use ithaca_traveller_db::client::DbClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(create_user)
        .typed_get(get_users)
        .typed_post(verify_user)
        .typed_get(get_user)
        .typed_delete(delete_user)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/users/", rejection(ServerError))]
struct UsersPath();

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct CreateUserResponse {
    user_id: Id<UserMarker>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct UsersResponse {
    users: Vec<PartialUser>,
}

async fn create_user(
    UsersPath(): UsersPath,
    State(db): State<Arc<DbClient>>,
    Json(body): Json<CredentialsBody>,
) -> Result<(StatusCode, Json<CreateUserResponse>)> {
    let Credentials { username, password } = Credentials::try_from(body)?;
    let user = CreateUser {
        username,
        password: HashedPassword::hash(&password)?,
    };
    let user_id = db.create_user(&user).await?;

    Ok((StatusCode::CREATED, Json(CreateUserResponse { user_id })))
}

async fn get_users(
    UsersPath(): UsersPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<UsersResponse>> {
    let users = db.fetch_users().await?;

    Ok(Json(UsersResponse { users }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/users/verify/", rejection(ServerError))]
struct VerifyUserPath();

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct VerifyResponse {
    verify: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<Id<UserMarker>>,
}

async fn verify_user(
    VerifyUserPath(): VerifyUserPath,
    State(db): State<Arc<DbClient>>,
    Json(body): Json<CredentialsBody>,
) -> Result<(StatusCode, Json<VerifyResponse>)> {
    let Credentials { username, password } = Credentials::try_from(body)?;
    let credentials = db
        .fetch_user_credentials(&username)
        .await?
        .ok_or(ServerError::UserByNameNotFound(username))?;

    if credentials.password.verify(&password)? {
        let response = VerifyResponse {
            verify: true,
            user_id: Some(credentials.id),
        };
        Ok((StatusCode::OK, Json(response)))
    } else {
        info!(user_id = %credentials.id, "Rejected password");
        let response = VerifyResponse {
            verify: false,
            user_id: None,
        };
        Ok((StatusCode::FORBIDDEN, Json(response)))
    }
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/users/{id}/", rejection(ServerError))]
struct UserPath {
    id: Id<UserMarker>,
}

async fn get_user(
    UserPath { id }: UserPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<User>> {
    let user = db
        .fetch_user(id)
        .await?
        .ok_or(ServerError::UserByIdNotFound(id))?;

    Ok(Json(user))
}

async fn delete_user(
    UserPath { id }: UserPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Empty>> {
    db.delete_user(id).await?;

    Ok(Json(Empty {}))
}
