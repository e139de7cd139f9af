//! HTTP handlers for materials, summaries and tags

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};

use super::Library;
use crate::api::{
    KeywordParams, MaterialCreate, MaterialResponse, Payload, RecentParams, SummaryCreate,
    SummaryResponse, TagCreate, TagResponse, into_responses, query_params,
};
use crate::error::ApiError;
use crate::handler::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

// ============================================================================
// Material Handlers
// ============================================================================

pub async fn create_material(
    State(state): State<AppState>,
    Payload(payload): Payload<MaterialCreate>,
) -> ApiResult<MaterialResponse> {
    let conn = state.db.writer().await.map_err(ApiError::unavailable)?;
    let lib = Library::new(&conn);

    let material = lib
        .create_material(payload)
        .await
        .map_err(|e| ApiError::store("create material", e))?;

    tracing::info!(material_id = %material.id, "created material");
    Ok(Json(material.into()))
}

pub async fn search_materials(
    State(state): State<AppState>,
    params: Result<Query<KeywordParams>, QueryRejection>,
) -> ApiResult<Vec<MaterialResponse>> {
    let params = query_params(params)?;
    let conn = state.db.session().map_err(ApiError::unavailable)?;
    let lib = Library::new(&conn);

    let keyword = params.keyword.unwrap_or_default();
    let materials = lib
        .search_materials(&keyword)
        .await
        .map_err(|e| ApiError::store("search materials", e))?;

    Ok(Json(into_responses(materials)))
}

pub async fn recent_materials(
    State(state): State<AppState>,
    params: Result<Query<RecentParams>, QueryRejection>,
) -> ApiResult<Vec<MaterialResponse>> {
    let limit = query_params(params)?.limit()?;
    let conn = state.db.session().map_err(ApiError::unavailable)?;
    let lib = Library::new(&conn);

    let materials = lib
        .recent_materials(limit)
        .await
        .map_err(|e| ApiError::store("list recent materials", e))?;

    Ok(Json(into_responses(materials)))
}

pub async fn get_material(
    State(state): State<AppState>,
    Path(material_id): Path<String>,
) -> ApiResult<MaterialResponse> {
    let conn = state.db.session().map_err(ApiError::unavailable)?;
    let lib = Library::new(&conn);

    match lib.get_material(&material_id).await {
        Ok(Some(material)) => Ok(Json(material.into())),
        Ok(None) => Err(ApiError::NotFound("Material")),
        Err(e) => Err(ApiError::store("get material", e)),
    }
}

pub async fn list_material_summaries(
    State(state): State<AppState>,
    Path(material_id): Path<String>,
) -> ApiResult<Vec<SummaryResponse>> {
    let conn = state.db.session().map_err(ApiError::unavailable)?;
    let lib = Library::new(&conn);

    let summaries = lib
        .list_summaries_by_material(&material_id)
        .await
        .map_err(|e| ApiError::store("list summaries", e))?;

    Ok(Json(into_responses(summaries)))
}

pub async fn list_material_tags(
    State(state): State<AppState>,
    Path(material_id): Path<String>,
) -> ApiResult<Vec<TagResponse>> {
    let conn = state.db.session().map_err(ApiError::unavailable)?;
    let lib = Library::new(&conn);

    let tags = lib
        .tags_for_material(&material_id)
        .await
        .map_err(|e| ApiError::store("list material tags", e))?;

    Ok(Json(into_responses(tags)))
}

pub async fn tag_material(
    State(state): State<AppState>,
    Path(material_id): Path<String>,
    Payload(payload): Payload<TagCreate>,
) -> ApiResult<TagResponse> {
    let conn = state.db.writer().await.map_err(ApiError::unavailable)?;
    let lib = Library::new(&conn);

    match lib.tag_material(&material_id, &payload.name).await {
        Ok(Some(tag)) => {
            tracing::info!(material_id = %material_id, tag = %tag.name, "tagged material");
            Ok(Json(tag.into()))
        }
        Ok(None) => Err(ApiError::NotFound("Material")),
        Err(e) => Err(ApiError::store("tag material", e)),
    }
}

// ============================================================================
// Summary Handlers
// ============================================================================

pub async fn create_summary(
    State(state): State<AppState>,
    Payload(payload): Payload<SummaryCreate>,
) -> ApiResult<SummaryResponse> {
    let conn = state.db.writer().await.map_err(ApiError::unavailable)?;
    let lib = Library::new(&conn);

    let summary = lib
        .create_summary(payload)
        .await
        .map_err(|e| ApiError::store("create summary", e))?;

    tracing::info!(summary_id = %summary.id, material_id = %summary.material_id, "created summary");
    Ok(Json(summary.into()))
}

// ============================================================================
// Tag Handlers
// ============================================================================

pub async fn create_tag(
    State(state): State<AppState>,
    Payload(payload): Payload<TagCreate>,
) -> ApiResult<TagResponse> {
    let conn = state.db.writer().await.map_err(ApiError::unavailable)?;
    let lib = Library::new(&conn);

    let tag = lib
        .create_tag(payload)
        .await
        .map_err(|e| ApiError::store("create tag", e))?;

    Ok(Json(tag.into()))
}

pub async fn list_tags(State(state): State<AppState>) -> ApiResult<Vec<TagResponse>> {
    let conn = state.db.session().map_err(ApiError::unavailable)?;
    let lib = Library::new(&conn);

    let tags = lib
        .list_tags()
        .await
        .map_err(|e| ApiError::store("list tags", e))?;

    Ok(Json(into_responses(tags)))
}

pub async fn list_tag_materials(
    State(state): State<AppState>,
    Path(tag_id): Path<String>,
) -> ApiResult<Vec<MaterialResponse>> {
    let conn = state.db.session().map_err(ApiError::unavailable)?;
    let lib = Library::new(&conn);

    match lib.get_tag(&tag_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(ApiError::NotFound("Tag")),
        Err(e) => return Err(ApiError::store("get tag", e)),
    }

    let materials = lib
        .materials_for_tag(&tag_id)
        .await
        .map_err(|e| ApiError::store("list tag materials", e))?;

    Ok(Json(into_responses(materials)))
}
