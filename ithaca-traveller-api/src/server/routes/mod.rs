use crate::server::ServerRouter;
use axum::routing::get;

mod features;
mod images;
mod locations;
mod posts;
mod users;
mod weather;

pub fn routes(max_upload_bytes: usize) -> ServerRouter {
    ServerRouter::new()
        .route("/", get(|| async { "Hello!" }))
        .merge(locations::routes())
        .merge(features::routes())
        .merge(posts::routes())
        .merge(users::routes())
        .merge(images::routes(max_upload_bytes))
        .merge(weather::routes())
}
