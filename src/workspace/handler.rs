//! HTTP handlers for users, folders and schedules

use axum::{
    Json,
    extract::{Path, State},
};

use super::Workspace;
use crate::api::{
    FolderCreate, FolderResponse, FolderUpdate, MessageResponse, Payload, ScheduleCreate,
    ScheduleResponse, ScheduleUpdate, UserCreate, UserResponse, into_responses,
};
use crate::error::ApiError;
use crate::handler::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

// ============================================================================
// User Handlers
// ============================================================================

pub async fn create_user(
    State(state): State<AppState>,
    Payload(payload): Payload<UserCreate>,
) -> ApiResult<UserResponse> {
    let conn = state.db.writer().await.map_err(ApiError::unavailable)?;
    let ws = Workspace::new(&conn);

    let user = ws
        .create_user(payload)
        .await
        .map_err(|e| ApiError::store("create user", e))?;

    tracing::info!(user_id = %user.id, "created user");
    Ok(Json(user.into()))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<UserResponse> {
    let conn = state.db.session().map_err(ApiError::unavailable)?;
    let ws = Workspace::new(&conn);

    match ws.get_user(&user_id).await {
        Ok(Some(user)) => Ok(Json(user.into())),
        Ok(None) => Err(ApiError::NotFound("User")),
        Err(e) => Err(ApiError::store("get user", e)),
    }
}

pub async fn list_user_folders(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<FolderResponse>> {
    let conn = state.db.session().map_err(ApiError::unavailable)?;
    let ws = Workspace::new(&conn);

    let folders = ws
        .list_folders_by_owner(&user_id)
        .await
        .map_err(|e| ApiError::store("list user folders", e))?;

    Ok(Json(into_responses(folders)))
}

// ============================================================================
// Folder Handlers
// ============================================================================

pub async fn list_folders(State(state): State<AppState>) -> ApiResult<Vec<FolderResponse>> {
    let conn = state.db.session().map_err(ApiError::unavailable)?;
    let ws = Workspace::new(&conn);

    let folders = ws
        .list_folders()
        .await
        .map_err(|e| ApiError::store("list folders", e))?;

    Ok(Json(into_responses(folders)))
}

pub async fn create_folder(
    State(state): State<AppState>,
    Payload(payload): Payload<FolderCreate>,
) -> ApiResult<FolderResponse> {
    let conn = state.db.writer().await.map_err(ApiError::unavailable)?;
    let ws = Workspace::new(&conn);

    let folder = ws
        .create_folder(payload)
        .await
        .map_err(|e| ApiError::store("create folder", e))?;

    tracing::info!(folder_id = %folder.id, owner_id = %folder.owner_id, "created folder");
    Ok(Json(folder.into()))
}

pub async fn update_folder(
    State(state): State<AppState>,
    Path(folder_id): Path<String>,
    Payload(payload): Payload<FolderUpdate>,
) -> ApiResult<FolderResponse> {
    let conn = state.db.writer().await.map_err(ApiError::unavailable)?;
    let ws = Workspace::new(&conn);

    match ws.update_folder(&folder_id, payload).await {
        Ok(Some(folder)) => Ok(Json(folder.into())),
        Ok(None) => Err(ApiError::NotFound("Folder")),
        Err(e) => Err(ApiError::store("update folder", e)),
    }
}

pub async fn delete_folder(
    State(state): State<AppState>,
    Path(folder_id): Path<String>,
) -> ApiResult<MessageResponse> {
    let conn = state.db.writer().await.map_err(ApiError::unavailable)?;
    let ws = Workspace::new(&conn);

    match ws.delete_folder(&folder_id).await {
        Ok(true) => {
            tracing::info!(folder_id = %folder_id, "deleted folder");
            Ok(Json(MessageResponse::new("Folder deleted successfully")))
        }
        Ok(false) => Err(ApiError::NotFound("Folder")),
        Err(e) => Err(ApiError::store("delete folder", e)),
    }
}

// ============================================================================
// Schedule Handlers
// ============================================================================

pub async fn list_schedules(State(state): State<AppState>) -> ApiResult<Vec<ScheduleResponse>> {
    let conn = state.db.session().map_err(ApiError::unavailable)?;
    let ws = Workspace::new(&conn);

    let schedules = ws
        .list_schedules()
        .await
        .map_err(|e| ApiError::store("list schedules", e))?;

    Ok(Json(into_responses(schedules)))
}

pub async fn create_schedule(
    State(state): State<AppState>,
    Payload(payload): Payload<ScheduleCreate>,
) -> ApiResult<ScheduleResponse> {
    let conn = state.db.writer().await.map_err(ApiError::unavailable)?;
    let ws = Workspace::new(&conn);

    let schedule = ws
        .create_schedule(payload)
        .await
        .map_err(|e| ApiError::store("create schedule", e))?;

    tracing::info!(schedule_id = %schedule.id, folder_id = %schedule.folder_id, "created schedule");
    Ok(Json(schedule.into()))
}

pub async fn update_schedule(
    State(state): State<AppState>,
    Path(schedule_id): Path<String>,
    Payload(payload): Payload<ScheduleUpdate>,
) -> ApiResult<ScheduleResponse> {
    let conn = state.db.writer().await.map_err(ApiError::unavailable)?;
    let ws = Workspace::new(&conn);

    match ws.update_schedule(&schedule_id, payload).await {
        Ok(Some(schedule)) => Ok(Json(schedule.into())),
        Ok(None) => Err(ApiError::NotFound("Schedule")),
        Err(e) => Err(ApiError::store("update schedule", e)),
    }
}

pub async fn delete_schedule(
    State(state): State<AppState>,
    Path(schedule_id): Path<String>,
) -> ApiResult<MessageResponse> {
    let conn = state.db.writer().await.map_err(ApiError::unavailable)?;
    let ws = Workspace::new(&conn);

    match ws.delete_schedule(&schedule_id).await {
        Ok(true) => {
            tracing::info!(schedule_id = %schedule_id, "deleted schedule");
            Ok(Json(MessageResponse::new("Schedule deleted successfully")))
        }
        Ok(false) => Err(ApiError::NotFound("Schedule")),
        Err(e) => Err(ApiError::store("delete schedule", e)),
    }
}
