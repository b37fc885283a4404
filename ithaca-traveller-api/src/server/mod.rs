use crate::{
    images::{ImageError, ImageStore},
    weather::{WeatherClient, WeatherError},
};
use axum::{
    Router,
    extract::{
        FromRef, Request,
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use extract::Json;
use ithaca_traveller_common::model::{
    Id, MissingFieldError,
    auth::PasswordHashError,
    feature::FeatureMarker,
    location::LocationMarker,
    post::{InvalidSortError, PostMarker},
    user::UserMarker,
};
use ithaca_traveller_db::client::{DbClient, DbError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

mod extract;
mod routes;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, Debug, FromRef)]
pub struct ServerState {
    pub db_client: Arc<DbClient>,
    pub images: Arc<ImageStore>,
    pub weather: Arc<WeatherClient>,
}

pub fn routes(max_upload_bytes: usize) -> ServerRouter {
    routes::routes(max_upload_bytes).fallback(fallback)
}

pub fn app(state: ServerState) -> Router {
    routes(state.images.max_upload_bytes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

/// Body of the `{}` answered by mutations that have nothing else to report.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, Serialize)]
pub struct Empty {}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("Query string rejected: {0}")]
    QueryRejection(#[from] QueryRejection),
    #[error("Multipart body rejected: {0}")]
    MultipartRejection(#[from] MultipartRejection),
    #[error("Multipart body could not be read: {0}")]
    Multipart(#[from] MultipartError),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error(transparent)]
    MissingField(#[from] MissingFieldError),
    #[error(transparent)]
    InvalidSort(#[from] InvalidSortError),
    #[error("Coordinates out of range: longitude {longitude}, latitude {latitude}")]
    InvalidCoordinates { longitude: f64, latitude: f64 },
    #[error(transparent)]
    PasswordHash(#[from] PasswordHashError),
    #[error(transparent)]
    Database(#[from] DbError),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Weather(#[from] WeatherError),
    #[error("Location with id {0} was not found.")]
    LocationByIdNotFound(Id<LocationMarker>),
    #[error("Feature with id {0} was not found.")]
    FeatureByIdNotFound(Id<FeatureMarker>),
    #[error("Feature named {0:?} was not found.")]
    FeatureByNameNotFound(String),
    #[error("Post with id {0} was not found.")]
    PostByIdNotFound(Id<PostMarker>),
    #[error("User with id {0} was not found.")]
    UserByIdNotFound(Id<UserMarker>),
    #[error("User named {0:?} was not found.")]
    UserByNameNotFound(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PathRejection(_)
            | ServerError::LocationByIdNotFound(_)
            | ServerError::FeatureByIdNotFound(_)
            | ServerError::FeatureByNameNotFound(_)
            | ServerError::PostByIdNotFound(_)
            | ServerError::UserByIdNotFound(_)
            | ServerError::UserByNameNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::JsonRejection(_)
            | ServerError::QueryRejection(_)
            | ServerError::MultipartRejection(_)
            | ServerError::Multipart(_)
            | ServerError::MissingField(_)
            | ServerError::InvalidSort(_)
            | ServerError::InvalidCoordinates { .. }
            | ServerError::Weather(_) => StatusCode::BAD_REQUEST,
            ServerError::Database(err) => match err {
                DbError::LocationNotFound(_)
                | DbError::FeatureNotFound(_)
                | DbError::PostNotFound(_)
                | DbError::UserNotFound(_) => StatusCode::NOT_FOUND,
                DbError::UsernameTaken(_)
                | DbError::FeatureNameTaken(_)
                | DbError::FeatureAlreadyAttached { .. }
                | DbError::FeatureNotAttached { .. } => StatusCode::BAD_REQUEST,
                DbError::Data(_) | DbError::Sqlx(_) | DbError::Migrate(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ServerError::Image(err) => match err {
                ImageError::MissingFile | ImageError::UnsupportedFile(_) => StatusCode::BAD_REQUEST,
                ImageError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                ImageError::NotFound => StatusCode::NOT_FOUND,
                ImageError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::JsonResponse(_) | ServerError::PasswordHash(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short message shown to clients. Internal details stay in the logs.
    pub fn message(&self) -> String {
        match self {
            ServerError::UnknownRoute(_) => "route not found".to_owned(),
            ServerError::PathRejection(_) => "resource not found".to_owned(),
            ServerError::JsonRejection(_) => "invalid request body".to_owned(),
            ServerError::QueryRejection(_) => "invalid query parameters".to_owned(),
            ServerError::MultipartRejection(_) | ServerError::Multipart(_) => {
                "file not uploaded".to_owned()
            }
            ServerError::MissingField(err) => err.to_string(),
            ServerError::InvalidSort(err) => err.to_string(),
            ServerError::InvalidCoordinates { .. } => "invalid coordinates".to_owned(),
            ServerError::Weather(_) => "failed to fetch weather".to_owned(),
            ServerError::LocationByIdNotFound(_) => "location not found".to_owned(),
            ServerError::FeatureByIdNotFound(_) | ServerError::FeatureByNameNotFound(_) => {
                "feature not found".to_owned()
            }
            ServerError::PostByIdNotFound(_) => "post not found".to_owned(),
            ServerError::UserByIdNotFound(_) | ServerError::UserByNameNotFound(_) => {
                "user not found".to_owned()
            }
            ServerError::Database(err) => match err {
                DbError::LocationNotFound(_) => "location not found".to_owned(),
                DbError::FeatureNotFound(_) => "feature not found".to_owned(),
                DbError::PostNotFound(_) => "post not found".to_owned(),
                DbError::UserNotFound(_) => "user not found".to_owned(),
                DbError::UsernameTaken(_) => "user already exist".to_owned(),
                DbError::FeatureNameTaken(_) => "feature already exist".to_owned(),
                DbError::FeatureAlreadyAttached { .. } => {
                    "location already has this feature".to_owned()
                }
                DbError::FeatureNotAttached { .. } => {
                    "location does not have this feature".to_owned()
                }
                DbError::Data(_) | DbError::Sqlx(_) | DbError::Migrate(_) => {
                    "internal server error".to_owned()
                }
            },
            ServerError::Image(err) => match err {
                ImageError::MissingFile => "file not uploaded".to_owned(),
                ImageError::UnsupportedFile(_) => "file not supported".to_owned(),
                ImageError::TooLarge { .. } => "file too large".to_owned(),
                ImageError::NotFound => "image not found".to_owned(),
                ImageError::Io(_) => "internal server error".to_owned(),
            },
            ServerError::JsonResponse(_) | ServerError::PasswordHash(_) => {
                "internal server error".to_owned()
            }
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!(error = %self, %status, "Replying with error");
        } else {
            warn!(error = %self, %status, "Replying with error");
        }

        let error_response = ErrorResponse {
            error: self.message(),
        };
        (status, Json(error_response)).into_response()
    }
}
