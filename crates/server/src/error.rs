use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pdm_core::PredictError;
use serde_json::json;

/// HTTP-facing wrapper around [`PredictError`].
///
/// Produces `{"error": <message>, "code": <code>}` bodies.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub PredictError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PredictError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            PredictError::NoDataAvailable => StatusCode::NOT_FOUND,
            PredictError::ModelLoadFault(_) => StatusCode::SERVICE_UNAVAILABLE,
            PredictError::MissingInput
            | PredictError::StorageFault(_)
            | PredictError::InferenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, code = self.0.code(), "Request failed");
        }

        let body = json!({
            "error": self.0.to_string(),
            "code": self.0.code(),
        });

        (status, axum::Json(body)).into_response()
    }
}
