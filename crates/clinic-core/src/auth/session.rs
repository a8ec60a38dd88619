//! User-facing session flows: login, logout, password change and the
//! security-question password reset.

use reqwest::Response;
use tracing::{debug, info, warn};

use crate::api::error::backend_message;
use crate::api::{ApiError, AuthClient, PendingRequest, SessionEvent};
use crate::models::auth::{
    ChangePasswordRequest, LoginRequest, RefreshRequest, ResetPasswordRequest,
    SecurityQuestionsRequest,
};
use crate::models::{AuthReply, SecurityAnswer, SecurityQuestion};

const LOGIN_PATH: &str = "/token/";
const LOGOUT_PATH: &str = "/logout/";
const CHANGE_PASSWORD_PATH: &str = "/change-password/";
const RESET_PASSWORD_PATH: &str = "/reset-password/";
const SECURITY_QUESTIONS_PATH: &str = "/security-questions/";

const DEFAULT_LOGIN_FAILURE: &str = "Invalid username or password";
const DEFAULT_OLD_PASSWORD_FAILURE: &str = "Old password is incorrect";
const DEFAULT_NO_QUESTIONS: &str = "This user has not set any security questions";
const DEFAULT_WRONG_ANSWER: &str = "Security question answer is incorrect";
const DEFAULT_LOGOUT_FAILURE: &str = "Logout was not acknowledged by the server";

/// Auth endpoint reply, split by the `999` convention.
enum ReplyOutcome {
    Accepted(AuthReply),
    Rejected { status: i64, message: String },
}

impl ReplyOutcome {
    /// Read an auth endpoint response. A 4xx status counts as a rejection
    /// carrying the body's message; 5xx and other statuses are errors.
    async fn read(response: Response, fallback: &str) -> Result<Self, ApiError> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_client_error() {
            return Ok(ReplyOutcome::Rejected {
                status: i64::from(status.as_u16()),
                message: backend_message(&body).unwrap_or_else(|| fallback.to_string()),
            });
        }
        if !status.is_success() {
            return Err(ApiError::from_status(status, &body));
        }

        let reply = AuthReply::parse(&body)?;
        if reply.is_success() {
            Ok(ReplyOutcome::Accepted(reply))
        } else {
            Ok(ReplyOutcome::Rejected {
                status: reply.status,
                message: reply.message_or(fallback),
            })
        }
    }
}

/// Login/logout and account maintenance on top of an `AuthClient`.
#[derive(Clone)]
pub struct SessionApi {
    client: AuthClient,
}

impl SessionApi {
    pub fn new(client: AuthClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &AuthClient {
        &self.client
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.tokens().is_authenticated()
    }

    /// Log in with a username and password.
    ///
    /// A `999` reply hands out only a refresh token; it is stored and
    /// exchanged right away for the first access token. Resolves with the
    /// login reply itself.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthReply, ApiError> {
        let request = PendingRequest::post(LOGIN_PATH).json(&LoginRequest { username, password })?;
        let response = self.client.send_public(request).await?;

        let reply = match ReplyOutcome::read(response, DEFAULT_LOGIN_FAILURE).await? {
            ReplyOutcome::Accepted(reply) => reply,
            ReplyOutcome::Rejected { status, message } => {
                info!(username, status, "Login rejected");
                return Err(ApiError::InvalidCredentials(message));
            }
        };

        let refresh = reply
            .refresh
            .clone()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::InvalidResponse("Login reply carried no refresh token".to_string()))?;

        self.client.tokens().set_refresh(&refresh);
        self.client.refresher().refresh(&refresh).await?;

        info!(username, "Login successful");
        self.client.publish(SessionEvent::LoggedIn {
            username: username.to_string(),
        });
        Ok(reply)
    }

    /// Log out. The backend is told to blacklist the refresh token when both
    /// tokens are held; local tokens are cleared no matter what it says.
    /// A failed notification is returned after the local cleanup.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let notified = match self.client.tokens().pair() {
            Some(pair) => self.notify_logout(&pair.access, &pair.refresh).await,
            None => {
                debug!("No complete token pair, skipping logout notification");
                Ok(())
            }
        };

        self.client.tokens().clear();
        self.client.publish(SessionEvent::LoggedOut);

        if let Err(ref e) = notified {
            warn!(error = %e, "Logout notification failed, local session cleared anyway");
        } else {
            info!("Logged out");
        }
        notified
    }

    async fn notify_logout(&self, access: &str, refresh: &str) -> Result<(), ApiError> {
        let request = PendingRequest::post(LOGOUT_PATH)
            .json(&RefreshRequest { refresh })?
            .bearer(access);
        let response = self.client.send_public(request).await?;

        match ReplyOutcome::read(response, DEFAULT_LOGOUT_FAILURE).await? {
            ReplyOutcome::Accepted(_) => Ok(()),
            ReplyOutcome::Rejected { status, message } => Err(ApiError::Rejected {
                code: status,
                message,
            }),
        }
    }

    /// Change the logged-in user's password.
    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<AuthReply, ApiError> {
        if !self.is_authenticated() {
            return Err(ApiError::Unauthenticated);
        }

        let request = PendingRequest::post(CHANGE_PASSWORD_PATH).json(&ChangePasswordRequest {
            old_password,
            new_password,
        })?;

        let response = match self.client.send(request).await {
            Ok(response) => response,
            // 400 is the backend's "old password wrong" signal
            Err(ApiError::BadRequest(message)) => {
                return Err(ApiError::InvalidOldPassword(non_empty_or(
                    message,
                    DEFAULT_OLD_PASSWORD_FAILURE,
                )));
            }
            Err(e) => return Err(e),
        };

        match ReplyOutcome::read(response, DEFAULT_OLD_PASSWORD_FAILURE).await? {
            ReplyOutcome::Accepted(reply) => {
                info!("Password changed");
                Ok(reply)
            }
            ReplyOutcome::Rejected { message, .. } => Err(ApiError::InvalidOldPassword(message)),
        }
    }

    /// Security questions registered for `username`, for password reset.
    pub async fn security_questions(&self, username: &str) -> Result<Vec<SecurityQuestion>, ApiError> {
        let username = validate_username(username)?;
        let request = PendingRequest::get(format!("/user-security-questions/{}/", username));
        let response = self.client.send_public(request).await?;

        match ReplyOutcome::read(response, DEFAULT_NO_QUESTIONS).await? {
            ReplyOutcome::Accepted(reply) => {
                let data = reply.data.unwrap_or(serde_json::Value::Array(Vec::new()));
                let questions: Vec<SecurityQuestion> = serde_json::from_value(data).map_err(|e| {
                    ApiError::InvalidResponse(format!("Failed to parse security questions: {}", e))
                })?;
                if questions.is_empty() {
                    return Err(ApiError::NotFound(DEFAULT_NO_QUESTIONS.to_string()));
                }
                Ok(questions)
            }
            ReplyOutcome::Rejected { message, .. } => Err(ApiError::NotFound(message)),
        }
    }

    /// Reset a forgotten password by answering one security question.
    pub async fn reset_password(
        &self,
        username: &str,
        question_id: i64,
        answer: &str,
        new_password: &str,
    ) -> Result<AuthReply, ApiError> {
        let username = validate_username(username)?;
        let request = PendingRequest::post(RESET_PASSWORD_PATH).json(&ResetPasswordRequest {
            username,
            question_id,
            answer,
            new_password,
        })?;
        let response = self.client.send_public(request).await?;

        match ReplyOutcome::read(response, DEFAULT_WRONG_ANSWER).await? {
            ReplyOutcome::Accepted(reply) => {
                info!(username, "Password reset");
                Ok(reply)
            }
            ReplyOutcome::Rejected { message, .. } => Err(ApiError::WrongAnswer(message)),
        }
    }

    /// Register security questions for the logged-in user.
    pub async fn set_security_questions(
        &self,
        questions: &[SecurityAnswer],
    ) -> Result<AuthReply, ApiError> {
        if questions.is_empty() {
            return Err(ApiError::InvalidRequest("At least one security question is required".to_string()));
        }
        if questions.iter().any(|q| !q.is_complete()) {
            return Err(ApiError::InvalidRequest("Questions and answers must not be empty".to_string()));
        }
        if !self.is_authenticated() {
            return Err(ApiError::Unauthenticated);
        }

        let request = PendingRequest::post(SECURITY_QUESTIONS_PATH)
            .json(&SecurityQuestionsRequest { questions })?;
        let response = self.client.send(request).await?;

        match ReplyOutcome::read(response, "Failed to save security questions").await? {
            ReplyOutcome::Accepted(reply) => Ok(reply),
            ReplyOutcome::Rejected { status, message } => Err(ApiError::Rejected {
                code: status,
                message,
            }),
        }
    }
}

/// Usernames end up in a URL path segment.
fn validate_username(username: &str) -> Result<&str, ApiError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ApiError::InvalidRequest("Username is required".to_string()));
    }
    if username.contains(['/', '?', '#']) {
        return Err(ApiError::InvalidRequest(format!("Invalid username: {}", username)));
    }
    Ok(username)
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert_eq!(validate_username("  admin ").unwrap(), "admin");
        assert!(matches!(validate_username(""), Err(ApiError::InvalidRequest(_))));
        assert!(matches!(validate_username("a/b"), Err(ApiError::InvalidRequest(_))));
        assert!(matches!(validate_username("a?b"), Err(ApiError::InvalidRequest(_))));
    }

    #[test]
    fn test_non_empty_or() {
        assert_eq!(non_empty_or(" ".to_string(), "fallback"), "fallback");
        assert_eq!(non_empty_or("wrong".to_string(), "fallback"), "wrong");
    }
}
