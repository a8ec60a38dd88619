//! Session-aware HTTP client for the clinic backend.
//!
//! `AuthClient` attaches the current access token to every protected call
//! and recovers from a single 401 per request by refreshing the access token
//! and re-sending. When the refresh itself fails the session is torn down
//! and `SessionEvent::Expired` is published so the presentation layer can
//! send the user back to login.

use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::request::{PendingRequest, RequestBody};
use super::ApiError;
use crate::auth::{RefreshClient, TokenStore};

// ============================================================================
// Constants
// ============================================================================

/// Token refresh endpoint. Never triggers a refresh of its own.
pub const REFRESH_PATH: &str = "/token/refresh/";

/// Capacity of the session event channel. Slow subscribers lose the oldest
/// events, which is fine for notifications.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Session lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn { username: String },
    Refreshed,
    LoggedOut,
    /// The refresh token was rejected; the user has to log in again.
    Expired { reason: String },
}

/// Join the API base URL and an endpoint path.
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// HTTP client bound to one session's token store.
/// Clone is cheap: the connection pool, token store and event channel are shared.
#[derive(Clone)]
pub struct AuthClient {
    http: Client,
    base_url: String,
    tokens: Arc<TokenStore>,
    refresher: RefreshClient,
    events: broadcast::Sender<SessionEvent>,
}

impl AuthClient {
    /// Create a client for `api_base_url` with an overall request timeout.
    pub fn new(
        api_base_url: impl Into<String>,
        timeout: Duration,
        tokens: Arc<TokenStore>,
    ) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;
        let base_url = api_base_url.into().trim_end_matches('/').to_string();
        let refresher = RefreshClient::new(http.clone(), &base_url, Arc::clone(&tokens));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            http,
            base_url,
            tokens,
            refresher,
            events,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    pub fn refresher(&self) -> &RefreshClient {
        &self.refresher
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Publish a session event. Having no subscribers is fine.
    pub fn publish(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    /// Send a protected request.
    ///
    /// A 401 on a request that has not been retried yet (and is not the
    /// refresh call itself) triggers one token refresh and one re-send.
    /// Everything else that is not 2xx is returned as an error.
    pub async fn send(&self, mut request: PendingRequest) -> Result<Response, ApiError> {
        loop {
            // A pinned bearer only applies to the first attempt; the retry
            // uses the freshly refreshed token.
            let authorization = match request.explicit_authorization() {
                Some(pinned) if !request.is_retried() => Some(pinned.to_string()),
                _ => self.tokens.authorization(),
            };
            let response = self.dispatch(&request, authorization).await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }

            if status == StatusCode::UNAUTHORIZED
                && !request.is_retried()
                && request.path() != REFRESH_PATH
            {
                debug!(path = request.path(), "Got 401, refreshing access token");
                match self.refresher.refresh_stored().await {
                    Ok(_) => {
                        request.mark_retried();
                        self.publish(SessionEvent::Refreshed);
                        continue;
                    }
                    Err(e) => {
                        warn!(path = request.path(), error = %e, "Session expired");
                        self.tokens.clear();
                        self.publish(SessionEvent::Expired {
                            reason: e.to_string(),
                        });
                        return Err(e);
                    }
                }
            }

            return Err(Self::error_from(response).await);
        }
    }

    /// Send a request without the session token and without refresh
    /// handling. The response is returned whatever its status.
    pub async fn send_public(&self, request: PendingRequest) -> Result<Response, ApiError> {
        let authorization = request.explicit_authorization().map(str::to_string);
        self.dispatch(&request, authorization).await
    }

    /// `send` and decode the JSON body.
    pub async fn json<T: DeserializeOwned>(&self, request: PendingRequest) -> Result<T, ApiError> {
        let path = request.path().to_string();
        let response = self.send(request).await?;
        Self::decode(response, &path).await
    }

    pub(crate) async fn decode<T: DeserializeOwned>(
        response: Response,
        path: &str,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", path, e))
        })
    }

    /// Turn a non-success response into an error carrying the backend's message.
    pub(crate) async fn error_from(response: Response) -> ApiError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        ApiError::from_status(status, &body)
    }

    async fn dispatch(
        &self,
        request: &PendingRequest,
        authorization: Option<String>,
    ) -> Result<Response, ApiError> {
        let url = join_url(&self.base_url, request.path());
        let mut builder = self
            .http
            .request(request.method().clone(), &url)
            .header(header::ACCEPT, "application/json");

        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        if let Some(timeout) = request.timeout_override() {
            builder = builder.timeout(timeout);
        }
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }

        builder = match request.body() {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::File {
                field,
                file_name,
                mime,
                bytes,
            } => {
                let mut part = Part::bytes(bytes.clone()).file_name(file_name.clone());
                if let Some(mime) = mime {
                    part = part.mime_str(mime)?;
                }
                builder.multipart(Form::new().part(field.clone(), part))
            }
        };

        debug!(method = %request.method(), url = %url, retried = request.is_retried(), "Sending request");
        let response = builder.send().await?;
        if response.status().is_server_error() {
            info!(url = %url, status = %response.status(), "Backend returned server error");
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://h/api", "/token/"), "http://h/api/token/");
        assert_eq!(join_url("http://h/api/", "/token/"), "http://h/api/token/");
        assert_eq!(join_url("http://h/api", "doctors/"), "http://h/api/doctors/");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let client = AuthClient::new(
            "http://localhost:1/api/",
            Duration::from_secs(1),
            Arc::new(TokenStore::in_memory()),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:1/api");

        client.publish(SessionEvent::LoggedOut);

        let mut rx = client.subscribe();
        client.publish(SessionEvent::Refreshed);
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::Refreshed);
    }
}
