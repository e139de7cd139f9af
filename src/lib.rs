use anyhow::Result;
use axum::{
    Router,
    http::HeaderValue,
    routing::get,
};
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod library;
pub mod model;
pub mod workspace;

#[cfg(test)]
pub(crate) mod test_support;

use handler::AppState;

/// Credentialed CORS for a fixed list of front-end origins.
///
/// Wildcards are not allowed together with credentials, so methods and headers mirror
/// whatever the preflight request asks for.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).map_err(|e| anyhow::anyhow!("invalid allowed origin {o:?}: {e}"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

pub fn app(state: AppState, origins: &[String]) -> Result<Router> {
    let router = Router::new()
        .route("/", get(handler::root))
        .merge(library::routes())
        .merge(workspace::routes())
        .layer(cors_layer(origins)?)
        .with_state(state);

    Ok(router)
}
