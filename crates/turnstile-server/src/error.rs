//! Mapping of lifecycle errors onto HTTP responses.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use turnstile_core::AuthError;

/// Seconds a client should wait before retrying after a 503.
const RETRY_AFTER_SECS: &str = "1";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError::Auth(err) = self;
        match err {
            // Absent, expired and malformed all look the same to the client.
            AuthError::UnknownToken | AuthError::MalformedAuthHeader => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                "unauthorized",
            )
                .into_response(),
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "forbidden").into_response(),
            AuthError::Infrastructure(e) => {
                tracing::error!(error = %e, retryable = e.is_retryable(), "Session store failure");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    [(header::RETRY_AFTER, RETRY_AFTER_SECS)],
                    "service temporarily unavailable",
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turnstile_core::StoreError;

    #[test]
    fn maps_taxonomy_to_status_codes() {
        let cases = [
            (AuthError::UnknownToken, StatusCode::UNAUTHORIZED),
            (AuthError::MalformedAuthHeader, StatusCode::UNAUTHORIZED),
            (AuthError::Forbidden, StatusCode::FORBIDDEN),
            (
                AuthError::Infrastructure(StoreError::Unavailable("down".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn unavailable_response_asks_for_retry() {
        let resp = ApiError::from(AuthError::Infrastructure(StoreError::Timeout(
            std::time::Duration::from_secs(2),
        )))
        .into_response();
        assert_eq!(resp.headers().get(header::RETRY_AFTER).unwrap(), "1");
    }
}
