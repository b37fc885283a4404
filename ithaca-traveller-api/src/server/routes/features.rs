use crate::server::{Empty, Result, ServerError, ServerRouter, extract::Json};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use ithaca_traveller_common::model::{
    Id,
    feature::{CreateFeature, Feature, FeatureBody, FeatureMarker, PartialFeature},
    location::LocationMarker,
};
use ithaca_traveller_db::client::DbClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(create_feature)
        .typed_get(get_features)
        .typed_get(get_feature)
        .typed_delete(delete_feature)
        .typed_post(attach_feature)
        .typed_delete(detach_feature)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/features/", rejection(ServerError))]
struct FeaturesPath();

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct FeaturesResponse {
    features: Vec<PartialFeature>,
}

async fn create_feature(
    FeaturesPath(): FeaturesPath,
    State(db): State<Arc<DbClient>>,
    Json(body): Json<FeatureBody>,
) -> Result<(StatusCode, Json<PartialFeature>)> {
    let feature = CreateFeature::try_from(body)?;
    let feature = db.create_feature(&feature).await?;

    Ok((StatusCode::CREATED, Json(feature)))
}

async fn get_features(
    FeaturesPath(): FeaturesPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<FeaturesResponse>> {
    let features = db.fetch_features().await?;

    Ok(Json(FeaturesResponse { features }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/features/{id}/", rejection(ServerError))]
struct FeaturePath {
    id: Id<FeatureMarker>,
}

async fn get_feature(
    FeaturePath { id }: FeaturePath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Feature>> {
    let feature = db
        .fetch_feature(id)
        .await?
        .ok_or(ServerError::FeatureByIdNotFound(id))?;

    Ok(Json(feature))
}

async fn delete_feature(
    FeaturePath { id }: FeaturePath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Empty>> {
    db.delete_feature(id).await?;

    Ok(Json(Empty {}))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/features/{feature_id}/locations/{location_id}/", rejection(ServerError))]
struct FeatureLocationPath {
    feature_id: Id<FeatureMarker>,
    location_id: Id<LocationMarker>,
}

async fn attach_feature(
    FeatureLocationPath {
        feature_id,
        location_id,
    }: FeatureLocationPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Empty>> {
    db.attach_feature(feature_id, location_id).await?;

    Ok(Json(Empty {}))
}

async fn detach_feature(
    FeatureLocationPath {
        feature_id,
        location_id,
    }: FeatureLocationPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Empty>> {
    db.detach_feature(feature_id, location_id).await?;

    Ok(Json(Empty {}))
}
