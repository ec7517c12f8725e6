//! HTTP error mapping
//!
//! Wraps [`CacheError`] so the engine stays free of any HTTP types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::CacheError;

/// A [`CacheError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub CacheError);

/// Result type returned by the handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::ZeroShards | CacheError::ZeroInterval => StatusCode::BAD_REQUEST,
            CacheError::NoRuntime | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.0.to_string()
        }));

        (self.status(), body).into_response()
    }
}
