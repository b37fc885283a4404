use crate::{
    images::{DEFAULT_MAX_UPLOAD_BYTES, ImageStore},
    server::ServerState,
    weather::{DEFAULT_WEATHER_API_URL, WeatherClient, WeatherError},
};
use ithaca_traveller_db::client::{DbClient, DbError};
use serde::Deserialize;
use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    sync::Arc,
};
use thiserror::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod images;
mod server;
mod weather;

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("Error opening database: {0}")]
    Database(#[from] DbError),
    #[error("Error preparing image directory: {0}")]
    ImageDir(std::io::Error),
    #[error("Error building weather client: {0}")]
    Weather(#[from] WeatherError),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct Env {
    server_address: IpAddr,
    server_port: u16,
    #[serde(default = "default_database_url")]
    database_url: String,
    #[serde(default = "default_image_dir")]
    image_dir: PathBuf,
    #[serde(default = "default_image_max_bytes")]
    image_max_bytes: usize,
    weather_api_key: String,
    #[serde(default = "default_weather_api_url")]
    weather_api_url: String,
}

fn default_database_url() -> String {
    "sqlite://ithaca_traveller.db?mode=rwc".to_owned()
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("images")
}

fn default_image_max_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_weather_api_url() -> String {
    DEFAULT_WEATHER_API_URL.to_owned()
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "ithaca_traveller_api=debug,\
                ithaca_traveller_db=debug,\
                tower_http=debug,axum::rejection=trace,sqlx=warn"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn get_env() -> Result<Env, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    envy::from_env().map_err(InitError::from)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let env = get_env()?;

    let db_client = DbClient::connect(&env.database_url).await?;
    let images = ImageStore::open(env.image_dir)
        .await
        .map_err(InitError::ImageDir)?
        .with_max_upload_bytes(env.image_max_bytes);
    let weather = WeatherClient::new(env.weather_api_url, env.weather_api_key)?;

    let state = ServerState {
        db_client: Arc::new(db_client),
        images: Arc::new(images),
        weather: Arc::new(weather),
    };
    let app = server::app(state);

    let server_address = SocketAddr::new(env.server_address, env.server_port);
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    info!(%server_address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(InitError::TcpServe)?;

    Ok(())
}
