use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value as JsonValue;

/// One rejected field of a request.
///
/// `loc` starts with where the value came from (`body`, `query`) followed by the path
/// into the payload, e.g. `["body", "owner_id"]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub loc: Vec<JsonValue>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    pub fn new(loc: Vec<JsonValue>, msg: impl Into<String>, kind: impl Into<String>) -> Self {
        FieldError {
            loc,
            msg: msg.into(),
            kind: kind.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request validation failed: {0:?}")]
    Validation(Vec<FieldError>),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("store error: {0:#}")]
    Store(anyhow::Error),
    #[error("store unavailable: {0:#}")]
    Unavailable(anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ValidationBody {
    detail: Vec<FieldError>,
}

#[derive(Debug, Serialize)]
struct DetailBody {
    detail: String,
}

impl ApiError {
    pub fn invalid(error: FieldError) -> Self {
        ApiError::Validation(vec![error])
    }

    /// Logs the full cause chain and hides it from the caller.
    pub fn store(action: &str, err: anyhow::Error) -> Self {
        tracing::error!(error = %format!("{err:#}"), "failed to {action}");
        ApiError::Store(err)
    }

    pub fn unavailable(err: anyhow::Error) -> Self {
        tracing::error!(error = %format!("{err:#}"), "failed to open database session");
        ApiError::Unavailable(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ValidationBody { detail: errors }),
            )
                .into_response(),
            ApiError::NotFound(entity) => (
                StatusCode::NOT_FOUND,
                Json(DetailBody {
                    detail: format!("{entity} not found"),
                }),
            )
                .into_response(),
            ApiError::Store(_) | ApiError::Unavailable(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(DetailBody {
                    detail: "Internal Server Error".to_string(),
                }),
            )
                .into_response(),
        }
    }
}
