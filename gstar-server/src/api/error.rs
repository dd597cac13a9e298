use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use gstar_core::GstarError;
use serde_json::json;

/// Transport view of [`GstarError`]. Every failure renders as
/// `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError(pub GstarError);

impl From<GstarError> for ApiError {
    fn from(err: GstarError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            GstarError::NotFound { .. } => StatusCode::NOT_FOUND,
            GstarError::BadRequest(_) | GstarError::Conflict(_) => StatusCode::BAD_REQUEST,
            GstarError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GstarError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GstarError::Upstream(_) => StatusCode::BAD_GATEWAY,
            GstarError::DataAccess(_)
            | GstarError::Io { .. }
            | GstarError::Serialization { .. }
            | GstarError::Config(_)
            | GstarError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match self.status() {
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => self.0.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed ({status}): {}", self.0);
        } else {
            tracing::debug!("Request rejected ({status}): {}", self.0);
        }

        let mut response = (status, Json(json!({ "detail": self.detail() }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
