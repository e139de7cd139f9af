use axum::{
    Router,
    routing::{delete, get, post, put},
};

use super::handler;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/", post(handler::create_user))
        .route("/users/:user_id", get(handler::get_user))
        .route("/users/:user_id/folders", get(handler::list_user_folders))
        .route("/folders/", get(handler::list_folders))
        .route("/folders/", post(handler::create_folder))
        .route("/folders/:folder_id", put(handler::update_folder))
        .route("/folders/:folder_id", delete(handler::delete_folder))
        .route("/schedules/", get(handler::list_schedules))
        .route("/schedules/", post(handler::create_schedule))
        .route("/schedules/:schedule_id", put(handler::update_schedule))
        .route("/schedules/:schedule_id", delete(handler::delete_schedule))
}
