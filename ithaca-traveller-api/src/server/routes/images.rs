use crate::{
    images::{ImageError, ImageKind, ImageStore},
    server::{Result, ServerError, ServerRouter, extract::Json},
};
use axum::{
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    routing::{RouterExt, TypedPath},
};
use ithaca_traveller_common::model::{Id, post::PostMarker, user::UserMarker};
use ithaca_traveller_db::client::DbClient;
use serde::{Deserialize, Serialize};
use std::{path::Path, sync::Arc};

pub fn routes(max_upload_bytes: usize) -> ServerRouter {
    ServerRouter::new()
        .typed_post(upload_post_image)
        .typed_get(get_post_image)
        .typed_delete(delete_post_image)
        .typed_post(upload_user_image)
        .typed_get(get_user_image)
        .typed_delete(delete_user_image)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct SavedResponse {
    saved: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct RemovedResponse {
    removed: String,
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn read_error(images: &ImageStore, err: MultipartError) -> ServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ImageError::TooLarge {
            limit: images.max_upload_bytes(),
        }
        .into()
    } else {
        err.into()
    }
}

/// Reads the `file` field of the upload and stores it.
async fn save_upload(
    images: &ImageStore,
    kind: ImageKind,
    id: i64,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SavedResponse>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| read_error(images, err))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(ToOwned::to_owned)
            .ok_or(ImageError::MissingFile)?;
        let bytes = field.bytes().await.map_err(|err| read_error(images, err))?;
        let saved = images.save(kind, id, &file_name, &bytes).await?;

        return Ok((
            StatusCode::CREATED,
            Json(SavedResponse {
                saved: display_path(&saved),
            }),
        ));
    }

    Err(ImageError::MissingFile.into())
}

async fn image_response(images: &ImageStore, kind: ImageKind, id: i64) -> Result<Response> {
    let image = images.load(kind, id).await?;

    Ok((TypedHeader(image.extension.content_type()), image.bytes).into_response())
}

async fn remove_image(
    images: &ImageStore,
    kind: ImageKind,
    id: i64,
) -> Result<Json<RemovedResponse>> {
    let removed = images.remove(kind, id).await?;

    Ok(Json(RemovedResponse {
        removed: display_path(&removed),
    }))
}

async fn ensure_post(db: &DbClient, id: Id<PostMarker>) -> Result<()> {
    if db.post_exists(id).await? {
        Ok(())
    } else {
        Err(ServerError::PostByIdNotFound(id))
    }
}

async fn ensure_user(db: &DbClient, id: Id<UserMarker>) -> Result<()> {
    if db.user_exists(id).await? {
        Ok(())
    } else {
        Err(ServerError::UserByIdNotFound(id))
    }
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/images/posts/{id}/", rejection(ServerError))]
struct PostImagePath {
    id: Id<PostMarker>,
}

async fn upload_post_image(
    PostImagePath { id }: PostImagePath,
    State(db): State<Arc<DbClient>>,
    State(images): State<Arc<ImageStore>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<SavedResponse>)> {
    ensure_post(&db, id).await?;

    save_upload(&images, ImageKind::Post, id.get(), multipart?).await
}

async fn get_post_image(
    PostImagePath { id }: PostImagePath,
    State(db): State<Arc<DbClient>>,
    State(images): State<Arc<ImageStore>>,
) -> Result<Response> {
    ensure_post(&db, id).await?;

    image_response(&images, ImageKind::Post, id.get()).await
}

async fn delete_post_image(
    PostImagePath { id }: PostImagePath,
    State(db): State<Arc<DbClient>>,
    State(images): State<Arc<ImageStore>>,
) -> Result<Json<RemovedResponse>> {
    ensure_post(&db, id).await?;

    remove_image(&images, ImageKind::Post, id.get()).await
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/images/users/{id}/", rejection(ServerError))]
struct UserImagePath {
    id: Id<UserMarker>,
}

async fn upload_user_image(
    UserImagePath { id }: UserImagePath,
    State(db): State<Arc<DbClient>>,
    State(images): State<Arc<ImageStore>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<SavedResponse>)> {
    ensure_user(&db, id).await?;

    save_upload(&images, ImageKind::User, id.get(), multipart?).await
}

async fn get_user_image(
    UserImagePath { id }: UserImagePath,
    State(db): State<Arc<DbClient>>,
    State(images): State<Arc<ImageStore>>,
) -> Result<Response> {
    ensure_user(&db, id).await?;

    image_response(&images, ImageKind::User, id.get()).await
}

async fn delete_user_image(
    UserImagePath { id }: UserImagePath,
    State(db): State<Arc<DbClient>>,
    State(images): State<Arc<ImageStore>>,
) -> Result<Json<RemovedResponse>> {
    ensure_user(&db, id).await?;

    remove_image(&images, ImageKind::User, id.get()).await
}
