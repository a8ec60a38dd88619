//! Payloads exchanged with the authentication endpoints.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::ApiError;

/// Status code the auth endpoints use for success.
pub const AUTH_SUCCESS: i64 = 999;

/// Reply envelope of the auth endpoints (`/token/`, `/token/refresh/`,
/// `/logout/`, password and security-question calls).
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthReply {
    pub status: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl AuthReply {
    pub fn parse(body: &str) -> Result<Self, ApiError> {
        serde_json::from_str(body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse auth reply: {}", e)))
    }

    pub fn is_success(&self) -> bool {
        self.status == AUTH_SUCCESS
    }

    /// Backend message, or `fallback` when the reply carried none.
    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

impl fmt::Debug for AuthReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthReply")
            .field("status", &self.status)
            .field("message", &self.message)
            .field("has_access", &self.access.is_some())
            .field("has_refresh", &self.refresh.is_some())
            .field("data", &self.data)
            .finish()
    }
}

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

#[derive(Serialize)]
pub(crate) struct ChangePasswordRequest<'a> {
    pub old_password: &'a str,
    pub new_password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct ResetPasswordRequest<'a> {
    pub username: &'a str,
    pub question_id: i64,
    pub answer: &'a str,
    pub new_password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct SecurityQuestionsRequest<'a> {
    pub questions: &'a [SecurityAnswer],
}

/// A security question as shown during password reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityQuestion {
    pub id: i64,
    pub question: String,
}

/// A question/answer pair registered by a logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityAnswer {
    pub question: String,
    pub answer: String,
}

impl SecurityAnswer {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.question.trim().is_empty() && !self.answer.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_reply() {
        let reply = AuthReply::parse(r#"{"status":999,"message":"ok","refresh":"r-token"}"#).unwrap();
        assert!(reply.is_success());
        assert_eq!(reply.refresh.as_deref(), Some("r-token"));
        assert_eq!(reply.access, None);
    }

    #[test]
    fn test_message_or() {
        let reply = AuthReply::parse(r#"{"status":1000,"message":"  "}"#).unwrap();
        assert!(!reply.is_success());
        assert_eq!(reply.message_or("fallback"), "fallback");

        let reply = AuthReply::parse(r#"{"status":1003,"message":"Refresh token blacklisted"}"#).unwrap();
        assert_eq!(reply.message_or("fallback"), "Refresh token blacklisted");
    }

    #[test]
    fn test_parse_rejects_non_envelope() {
        assert!(matches!(
            AuthReply::parse("<html>"),
            Err(ApiError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let reply = AuthReply::parse(r#"{"status":999,"access":"secret-a","refresh":"secret-r"}"#).unwrap();
        assert!(!format!("{:?}", reply).contains("secret"));
    }
}
