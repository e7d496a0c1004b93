//! Failures surfaced by the Discord and completion HTTP clients.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("unauthorized (401)")]
    Unauthorized,

    #[error("rate limited (429), retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Classify a non-success response. Consumes the body.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Self::from_parts(status, &body)
    }

    pub fn from_parts(status: StatusCode, body: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited {
                retry_after: parse_retry_after(body),
            },
            _ => ApiError::Status {
                status,
                body: body.to_string(),
            },
        }
    }

    /// Status-level failures the caller is expected to absorb.
    /// Transport and decode failures are not.
    pub fn is_http_failure(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthorized | ApiError::RateLimited { .. } | ApiError::Status { .. }
        )
    }
}

/// Reads `retry_after` (seconds, possibly fractional) from a 429 body.
fn parse_retry_after(body: &str) -> Option<Duration> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let secs = value.get("retry_after")?.as_f64()?;
    Duration::try_from_secs_f64(secs).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_is_classified() {
        let err = ApiError::from_parts(StatusCode::UNAUTHORIZED, "401: Unauthorized");
        assert!(matches!(err, ApiError::Unauthorized));
        assert!(err.is_http_failure());
    }

    #[test]
    fn test_rate_limit_reads_retry_after() {
        let body = r#"{"message": "You are being rate limited.", "retry_after": 3, "global": false}"#;
        let err = ApiError::from_parts(StatusCode::TOO_MANY_REQUESTS, body);
        match err {
            ApiError::RateLimited { retry_after } => {
                assert_eq!(retry_after, Some(Duration::from_secs(3)))
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_rate_limit_fractional_retry_after() {
        let err = ApiError::from_parts(StatusCode::TOO_MANY_REQUESTS, r#"{"retry_after": 0.25}"#);
        assert!(matches!(
            err,
            ApiError::RateLimited { retry_after: Some(d) } if d == Duration::from_millis(250)
        ));
    }

    #[test]
    fn test_rate_limit_without_usable_body() {
        for body in ["", "not json", r#"{"retry_after": "soon"}"#, r#"{"retry_after": -1}"#] {
            let err = ApiError::from_parts(StatusCode::TOO_MANY_REQUESTS, body);
            assert!(
                matches!(err, ApiError::RateLimited { retry_after: None }),
                "body {body:?}"
            );
        }
    }

    #[test]
    fn test_other_status_keeps_body() {
        let err = ApiError::from_parts(StatusCode::BAD_GATEWAY, "upstream down");
        let msg = err.to_string();
        assert!(msg.contains("502"));
        assert!(msg.contains("upstream down"));
        assert!(err.is_http_failure());
    }

    #[test]
    fn test_decode_is_not_http_failure() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ApiError::from(json_err);
        assert!(!err.is_http_failure());
    }
}
