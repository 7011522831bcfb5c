use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use metrics_engine::{DataError, SchemaError};

pub type Result<T> = std::result::Result<T, ApiError>;

/// Boundary error; serialized to the client as `{"error": "..."}` with the
/// appropriate status code.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) | ApiError::Schema(_) | ApiError::Data(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("request failed: {self:#}");
        }

        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
