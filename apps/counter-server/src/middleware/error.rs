//! Error mapping - internal failures become generic JSON bodies.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use counter_core::BackendError;
use counter_shared::ErrorBody;

/// Application-level error type.
///
/// `Display` carries the internal detail for the request log; the body sent to
/// the client never does.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::MethodNotAllowed(_) => ErrorBody::method_not_allowed(),
            AppError::Backend(err) => {
                tracing::error!(error = %err, "Counter backend failed");
                ErrorBody::internal_error()
            }
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_rt::test]
    async fn test_backend_detail_is_not_leaked() {
        let err = AppError::from(BackendError::Transport("dial tcp 10.0.0.1: refused".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("refused"));

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        assert_eq!(&body[..], br#"{"error":"Internal error"}"#);
    }

    #[actix_rt::test]
    async fn test_method_not_allowed_body() {
        let err = AppError::MethodNotAllowed("PUT".into());
        assert_eq!(err.status_code(), StatusCode::METHOD_NOT_ALLOWED);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        assert_eq!(&body[..], br#"{"error":"Method not allowed"}"#);
    }
}
