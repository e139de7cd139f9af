use axum::{
    Router,
    routing::{get, post},
};

use super::handler;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/materials/", get(handler::search_materials))
        .route("/materials/", post(handler::create_material))
        .route("/materials/recent", get(handler::recent_materials))
        .route("/materials/:material_id", get(handler::get_material))
        .route(
            "/materials/:material_id/summaries",
            get(handler::list_material_summaries),
        )
        .route("/materials/:material_id/tags", get(handler::list_material_tags))
        .route("/materials/:material_id/tags", post(handler::tag_material))
        .route("/summaries/", post(handler::create_summary))
        .route("/tags/", get(handler::list_tags))
        .route("/tags/", post(handler::create_tag))
        .route("/tags/:tag_id/materials", get(handler::list_tag_materials))
}
