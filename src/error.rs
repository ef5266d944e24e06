use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while serving CRM requests
#[derive(Debug, Error)]
pub enum Error {
    /// A required environment value is absent
    #[error("missing configuration value: {0}")]
    ConfigurationMissing(&'static str),

    /// A required request field is absent or malformed
    #[error("{0}")]
    ValidationFailed(String),

    /// The addressed tab or row does not exist
    #[error("{0}")]
    NotFound(String),

    /// Token exchange with the credential service failed
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The spreadsheet service rejected an operation
    #[error("spreadsheet service error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// Transport-level failure talking to the spreadsheet service
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Uploaded file could not be parsed as delimited text
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::ValidationFailed(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("request failed: {self}");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn status_mapping() {
        assert_eq!(
            Error::validation("missing field").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::not_found("no such tab").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Remote {
                status: 403,
                message: "denied".into()
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            Error::ConfigurationMissing("CRM_SHEET_ID").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
