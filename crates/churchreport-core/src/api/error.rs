use serde::Deserialize;
use thiserror::Error;

/// Failure talking to ChurchTools. Every variant aborts the report.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Login token rejected - check CHURCHTOOLS_LOGIN_TOKEN")]
    Unauthorized,

    #[error("Missing permission: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Too many requests")]
    RateLimited,

    #[error("ChurchTools server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response (HTTP {status}): {message}")]
    Unexpected { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Longest response body quoted in an error message
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// ChurchTools error bodies look like `{"message": "...", "errors": [...]}`
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl ApiError {
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = error_message(body);
        let status = status.as_u16();
        match status {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::Server { status, message },
            _ => ApiError::Unexpected { status, message },
        }
    }
}

/// The `message` of a ChurchTools error body, or the raw body cut to a
/// readable length.
fn error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.message;
    }
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }

    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}
