//! Transport-facing request and response shapes.
//!
//! Request bodies are parsed with [`Payload`], which reports every rejected field as a
//! [`FieldError`] before a handler touches the database.

use axum::{
    body::Bytes,
    extract::{FromRequest, Query, Request, rejection::QueryRejection},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value as JsonValue;
use serde_path_to_error::Segment;
use uuid::Uuid;

use crate::error::{ApiError, FieldError};
use crate::model::{Folder, Material, Schedule, Summary, Tag, User};

pub const DEFAULT_RECENT_LIMIT: i64 = 10;

// ============================================================================
// Extraction
// ============================================================================

/// JSON body extractor with per-field validation errors.
#[derive(Debug)]
pub struct Payload<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            ApiError::invalid(FieldError::new(vec!["body".into()], e.body_text(), "body_error"))
        })?;
        parse_body(&bytes).map(Payload)
    }
}

pub fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize(&mut de).map_err(body_error)?;
    de.end().map_err(|e| {
        ApiError::invalid(FieldError::new(vec!["body".into()], strip_position(&e), "json_invalid"))
    })?;
    Ok(value)
}

fn body_error(err: serde_path_to_error::Error<serde_json::Error>) -> ApiError {
    let mut loc: Vec<JsonValue> = vec!["body".into()];
    for segment in err.path().iter() {
        match segment {
            Segment::Map { key } => loc.push(key.clone().into()),
            Segment::Seq { index } => loc.push((*index).into()),
            Segment::Enum { variant } => loc.push(variant.clone().into()),
            Segment::Unknown => {}
        }
    }

    let inner = err.inner();
    let message = strip_position(inner);

    let field_error = if let Some(field) = missing_field(&message) {
        loc.push(field.into());
        FieldError::new(loc, "Field required", "missing")
    } else if inner.is_data() {
        FieldError::new(loc, message, "type_error")
    } else {
        FieldError::new(loc, message, "json_invalid")
    };

    ApiError::invalid(field_error)
}

/// serde_json appends " at line X column Y" to every message.
fn strip_position(err: &serde_json::Error) -> String {
    let message = err.to_string();
    match message.rfind(" at line ") {
        Some(idx) => message[..idx].to_string(),
        None => message,
    }
}

fn missing_field(message: &str) -> Option<String> {
    let rest = message.strip_prefix("missing field `")?;
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}

/// Maps a query-string rejection onto the validation error shape.
pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    match query {
        Ok(Query(params)) => Ok(params),
        Err(rejection) => Err(ApiError::invalid(FieldError::new(
            vec!["query".into()],
            rejection.body_text(),
            "query_error",
        ))),
    }
}

// ============================================================================
// Query Parameters
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct KeywordParams {
    pub keyword: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecentParams {
    pub limit: Option<i64>,
}

impl RecentParams {
    /// Defaults to 10. There is no upper bound.
    pub fn limit(&self) -> Result<i64, ApiError> {
        match self.limit {
            None => Ok(DEFAULT_RECENT_LIMIT),
            Some(limit) if limit >= 0 => Ok(limit),
            Some(_) => Err(ApiError::invalid(FieldError::new(
                vec!["query".into(), "limit".into()],
                "Input should be greater than or equal to 0",
                "greater_than_equal",
            ))),
        }
    }
}

// ============================================================================
// Request Shapes
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct MaterialCreate {
    pub title: String,
    pub url: Option<String>,
    pub pdf_file: Option<String>,
    pub youtube_link: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryCreate {
    pub content: String,
    pub material_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagCreate {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FolderCreate {
    pub name: String,
    pub owner_id: Uuid,
}

/// Only fields present in the body are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FolderUpdate {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleCreate {
    pub name: String,
    pub cron_expression: String,
    pub target_url: String,
    pub folder_id: Uuid,
    pub owner_id: Uuid,
}

/// Only fields present in the body are applied. The owner cannot be changed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleUpdate {
    pub name: Option<String>,
    pub cron_expression: Option<String>,
    pub target_url: Option<String>,
    pub folder_id: Option<Uuid>,
}

// ============================================================================
// Response Shapes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(msg: &str) -> Self {
        MessageResponse {
            message: msg.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialResponse {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    pub pdf_file: Option<String>,
    pub youtube_link: Option<String>,
    pub created_at: String,
}

impl From<Material> for MaterialResponse {
    fn from(m: Material) -> Self {
        MaterialResponse {
            id: m.id,
            title: m.title,
            url: m.url,
            pdf_file: m.pdf_file,
            youtube_link: m.youtube_link,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub id: String,
    pub material_id: String,
    pub content: String,
    pub created_at: String,
}

impl From<Summary> for SummaryResponse {
    fn from(s: Summary) -> Self {
        SummaryResponse {
            id: s.id,
            material_id: s.material_id,
            content: s.content,
            created_at: s.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagResponse {
    pub id: String,
    pub name: String,
}

impl From<Tag> for TagResponse {
    fn from(t: Tag) -> Self {
        TagResponse { id: t.id, name: t.name }
    }
}

/// The password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        UserResponse {
            id: u.id,
            name: u.name,
            email: u.email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderResponse {
    pub id: String,
    pub name: String,
    pub owner_id: String,
}

impl From<Folder> for FolderResponse {
    fn from(f: Folder) -> Self {
        FolderResponse {
            id: f.id,
            name: f.name,
            owner_id: f.owner_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub id: String,
    pub name: String,
    pub cron_expression: String,
    pub target_url: String,
    pub folder_id: String,
    pub owner_id: String,
}

impl From<Schedule> for ScheduleResponse {
    fn from(s: Schedule) -> Self {
        ScheduleResponse {
            id: s.id,
            name: s.name,
            cron_expression: s.cron_expression,
            target_url: s.target_url,
            folder_id: s.folder_id,
            owner_id: s.owner_id,
        }
    }
}

pub fn into_responses<T, R: From<T>>(rows: Vec<T>) -> Vec<R> {
    rows.into_iter().map(R::from).collect()
}
