//! Error responses of the relay endpoint

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sentinel_application::RelayError;
use sentinel_domain::ErrorBody;
use thiserror::Error;
use tracing::{error, warn};

/// Errors that end a relay request before any body is streamed.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Invalid JSON body: {0}")]
    InvalidJson(String),

    #[error("Request body exceeds the {limit}-byte limit.")]
    BodyTooLarge { limit: usize },

    /// The body could not be read at all.
    #[error("{0}")]
    UnreadableBody(String),

    #[error(transparent)]
    Relay(#[from] RelayError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::InvalidJson(_) | ApiError::UnreadableBody(_) => StatusCode::BAD_REQUEST,
            ApiError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Relay(RelayError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            ApiError::Relay(RelayError::PayloadTooLarge { .. })
            | ApiError::Relay(RelayError::HistoryTooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Relay(RelayError::Configuration(_))
            | ApiError::Relay(RelayError::Gateway(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), "Relay request failed: {}", self);
        } else {
            warn!(status = status.as_u16(), "Relay request rejected: {}", self);
        }
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_application::GatewayError;
    use sentinel_domain::DomainError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            ApiError::from(RelayError::from(DomainError::MissingInput)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::BodyTooLarge { limit: 1 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::from(RelayError::PayloadTooLarge { size: 2, limit: 1 }).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::from(RelayError::from(GatewayError::MissingCredential(
                "GEMINI_API_KEY".to_string()
            )))
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_message_passes_through() {
        assert_eq!(
            ApiError::from(RelayError::from(DomainError::MissingInput)).to_string(),
            "Missing files or language in request body."
        );
    }
}
