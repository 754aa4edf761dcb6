use axum::http::StatusCode;
use serde_json::json;

/// Failures of calendar, transition and achievement operations.
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    /// The backend rejected the call or could not be reached.
    #[error("backend call failed: {0}")]
    Network(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
}

impl CalendarError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }

    pub fn network(err: impl std::fmt::Display) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<std::io::Error> for CalendarError {
    fn from(err: std::io::Error) -> Self {
        Self::network(err)
    }
}

impl From<serde_json::Error> for CalendarError {
    fn from(err: serde_json::Error) -> Self {
        Self::network(err)
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "BAD_REQUEST",
            message: message.into(),
        }
    }
}

impl From<CalendarError> for AppError {
    fn from(err: CalendarError) -> Self {
        let (status, code) = match &err {
            CalendarError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            CalendarError::PreconditionFailed(_) => (StatusCode::CONFLICT, "PRECONDITION_FAILED"),
            CalendarError::Network(_) => (StatusCode::BAD_GATEWAY, "BACKEND_ERROR"),
        };
        Self {
            status,
            code,
            message: err.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, error = %self.message, "request failed");
        } else {
            tracing::warn!(code = self.code, error = %self.message, "request rejected");
        }
        let body = json!({
            "error": self.message,
            "code": self.code,
        });
        (self.status, axum::Json(body)).into_response()
    }
}
