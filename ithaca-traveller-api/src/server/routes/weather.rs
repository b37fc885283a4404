use crate::{
    server::{
        Result, ServerError, ServerRouter,
        extract::{Json, Query},
    },
    weather::{Weather, WeatherClient},
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use ithaca_traveller_common::model::require;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_get(get_weather)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/weather/", rejection(ServerError))]
struct WeatherPath();

#[derive(Copy, Clone, PartialEq, Debug, Default, Deserialize)]
struct CoordinatesQuery {
    longitude: Option<f64>,
    latitude: Option<f64>,
}

async fn get_weather(
    WeatherPath(): WeatherPath,
    State(weather): State<Arc<WeatherClient>>,
    Query(query): Query<CoordinatesQuery>,
) -> Result<Json<Weather>> {
    let longitude = require(query.longitude, "longitude")?;
    let latitude = require(query.latitude, "latitude")?;
    if !(-180.0..=180.0).contains(&longitude) || !(-90.0..=90.0).contains(&latitude) {
        return Err(ServerError::InvalidCoordinates {
            longitude,
            latitude,
        });
    }

    let weather = weather.fetch(longitude, latitude).await?;

    Ok(Json(weather))
}
