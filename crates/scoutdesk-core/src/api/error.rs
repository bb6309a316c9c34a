use thiserror::Error;

use crate::auth::PermissionError;
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - session may be expired")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            409 => ApiError::Conflict(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }
}

/// Short message for the status bar.
pub fn friendly_message(err: &anyhow::Error) -> String {
    for cause in err.chain() {
        if let Some(api) = cause.downcast_ref::<ApiError>() {
            return match api {
                ApiError::Unauthorized => "Session expired. Press L to log in again.".to_string(),
                ApiError::AccessDenied(_) => "Access denied for this action.".to_string(),
                ApiError::NotFound(_) => "Record not found. Refresh with u.".to_string(),
                ApiError::Conflict(_) => "Record already exists or is still referenced.".to_string(),
                ApiError::RateLimited => "Too many requests. Try again in a moment.".to_string(),
                ApiError::ServerError(_) => "Server error. Try again later.".to_string(),
                ApiError::NetworkError(_) => "Network error. Check your connection.".to_string(),
                ApiError::InvalidResponse(_) => "Unexpected server response.".to_string(),
            };
        }
        if let Some(ValidationError::Invalid(errors)) = cause.downcast_ref::<ValidationError>() {
            return errors.summary().unwrap_or_else(|| "Invalid form".to_string());
        }
        if let Some(denied) = cause.downcast_ref::<PermissionError>() {
            return denied.to_string();
        }
        if cause.downcast_ref::<reqwest::Error>().is_some() {
            return "Network error. Check your connection.".to_string();
        }
    }
    err.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(ApiError::from_status(StatusCode::UNAUTHORIZED, ""), ApiError::Unauthorized));
        assert!(matches!(ApiError::from_status(StatusCode::CONFLICT, "dup"), ApiError::Conflict(b) if b == "dup"));
        assert!(matches!(ApiError::from_status(StatusCode::BAD_GATEWAY, ""), ApiError::ServerError(_)));
        assert!(matches!(ApiError::from_status(StatusCode::BAD_REQUEST, ""), ApiError::InvalidResponse(_)));
    }

    #[test]
    fn test_long_body_truncated() {
        let body = "ñ".repeat(400);
        match ApiError::from_status(StatusCode::NOT_FOUND, &body) {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("truncated, 800 total bytes"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_friendly_message_walks_context_chain() {
        let err = anyhow::Error::new(ApiError::Unauthorized).context("Failed to load scouts");
        assert_eq!(friendly_message(&err), "Session expired. Press L to log in again.");

        let plain = anyhow::anyhow!("Something else");
        assert_eq!(friendly_message(&plain), "Something else");
    }
}
