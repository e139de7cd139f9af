use std::sync::Arc;

use axum::Json;
use tracing::info;

use crate::api::MessageResponse;
use crate::db::Database;

pub const GREETING: &str = "Hello, FinSight AI Backend!";

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
}

pub async fn root() -> Json<MessageResponse> {
    info!("got root request");
    Json(MessageResponse::new(GREETING))
}
