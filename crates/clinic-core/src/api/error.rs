use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Session expired: {0}")]
    AuthExpired(String),

    #[error("Not logged in")]
    Unauthenticated,

    #[error("Login failed: {0}")]
    InvalidCredentials(String),

    #[error("Password change rejected: {0}")]
    InvalidOldPassword(String),

    #[error("Password reset rejected: {0}")]
    WrongAnswer(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request rejected ({code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
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
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..end],
                body.len()
            )
        }
    }

    /// Classify a non-success HTTP reply. The backend's `message`/`detail`
    /// field is preferred over the raw body.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = backend_message(body)
            .unwrap_or_else(|| Self::truncate_body(body));
        match status.as_u16() {
            400 => ApiError::BadRequest(message),
            401 => ApiError::Unauthorized(message),
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(message),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, message)),
        }
    }

    /// Message carried by a domain rejection, if this error is one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ApiError::AuthExpired(m)
            | ApiError::InvalidCredentials(m)
            | ApiError::InvalidOldPassword(m)
            | ApiError::WrongAnswer(m)
            | ApiError::NotFound(m)
            | ApiError::BadRequest(m)
            | ApiError::Unauthorized(m)
            | ApiError::AccessDenied(m)
            | ApiError::ServerError(m) => Some(m),
            ApiError::Rejected { message, .. } => Some(message),
            _ => None,
        }
    }

    /// True when the failure ended the local session.
    pub fn is_session_ending(&self) -> bool {
        matches!(self, ApiError::AuthExpired(_) | ApiError::Unauthenticated)
    }
}

/// Pull the user-facing message out of a JSON error body.
/// Django REST endpoints use `detail`, the clinic's own envelopes use `message`.
pub(crate) fn backend_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "detail"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|m| !m.is_empty())
        .map(str::to_string)
}
