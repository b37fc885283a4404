use crate::server::{Empty, Result, ServerError, ServerRouter, extract::Json};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use ithaca_traveller_common::model::{
    Id,
    location::{
        CreateLocation, Location, LocationBody, LocationMarker, LocationUpdate, PartialLocation,
    },
};
use ithaca_traveller_db::client::DbClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(create_location)
        .typed_get(get_locations)
        .typed_get(get_location)
        .typed_post(update_location)
        .typed_delete(delete_location)
        .typed_get(get_locations_with_feature)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/locations/", rejection(ServerError))]
struct LocationsPath();

#[derive(Clone, PartialEq, Debug, Serialize)]
struct LocationsResponse {
    locations: Vec<PartialLocation>,
}

async fn create_location(
    LocationsPath(): LocationsPath,
    State(db): State<Arc<DbClient>>,
    Json(body): Json<LocationBody>,
) -> Result<(StatusCode, Json<PartialLocation>)> {
    let location = CreateLocation::try_from(body)?;
    let location = db.create_location(&location).await?;

    Ok((StatusCode::CREATED, Json(location)))
}

async fn get_locations(
    LocationsPath(): LocationsPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<LocationsResponse>> {
    let locations = db.fetch_locations().await?;

    Ok(Json(LocationsResponse { locations }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/locations/{id}/", rejection(ServerError))]
struct LocationPath {
    id: Id<LocationMarker>,
}

async fn get_location(
    LocationPath { id }: LocationPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Location>> {
    let location = db
        .fetch_location(id)
        .await?
        .ok_or(ServerError::LocationByIdNotFound(id))?;

    Ok(Json(location))
}

async fn update_location(
    LocationPath { id }: LocationPath,
    State(db): State<Arc<DbClient>>,
    Json(update): Json<LocationUpdate>,
) -> Result<Json<Empty>> {
    db.update_location(id, update).await?;

    Ok(Json(Empty {}))
}

async fn delete_location(
    LocationPath { id }: LocationPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Empty>> {
    db.delete_location(id).await?;

    Ok(Json(Empty {}))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/locations/features/{name}/", rejection(ServerError))]
struct LocationsWithFeaturePath {
    name: String,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct LocationRef {
    id: Id<LocationMarker>,
}

async fn get_locations_with_feature(
    LocationsWithFeaturePath { name }: LocationsWithFeaturePath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Vec<LocationRef>>> {
    let feature = db
        .fetch_feature_by_name(&name)
        .await?
        .ok_or(ServerError::FeatureByNameNotFound(name))?;

    let locations = feature
        .locations
        .into_iter()
        .map(|id| LocationRef { id })
        .collect();
    Ok(Json(locations))
}
