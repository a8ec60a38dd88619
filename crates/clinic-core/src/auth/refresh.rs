//! Exchange of a refresh token for a new access token.

use std::sync::Arc;

use reqwest::{header, Client};
use tracing::{debug, warn};

use super::TokenStore;
use crate::api::client::{join_url, REFRESH_PATH};
use crate::api::error::backend_message;
use crate::api::ApiError;
use crate::models::auth::RefreshRequest;
use crate::models::AuthReply;

/// Message used when the backend rejects a refresh token without saying why.
const DEFAULT_REFRESH_FAILURE: &str = "Refresh token expired or revoked, please log in again";

/// Posts refresh tokens to `/token/refresh/`.
///
/// Every outcome is reflected in the token store: success stores the new
/// access token before it is returned, any failure clears both tokens.
#[derive(Clone)]
pub struct RefreshClient {
    http: Client,
    url: String,
    tokens: Arc<TokenStore>,
}

impl RefreshClient {
    /// Build a refresh client sharing `http`'s connection pool.
    pub fn new(http: Client, api_base_url: &str, tokens: Arc<TokenStore>) -> Self {
        Self {
            http,
            url: join_url(api_base_url, REFRESH_PATH),
            tokens,
        }
    }

    /// Exchange `refresh_token` for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, ApiError> {
        match self.exchange(refresh_token).await {
            Ok(access) => {
                self.tokens.set_access(&access);
                debug!("Access token refreshed");
                Ok(access)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing stored tokens");
                self.tokens.clear();
                Err(e)
            }
        }
    }

    /// Refresh using the stored refresh token.
    pub async fn refresh_stored(&self) -> Result<String, ApiError> {
        match self.tokens.refresh() {
            Some(token) => self.refresh(&token).await,
            None => {
                debug!("No refresh token available");
                self.tokens.clear();
                Err(ApiError::Unauthenticated)
            }
        }
    }

    async fn exchange(&self, refresh_token: &str) -> Result<String, ApiError> {
        let response = self
            .http
            .post(&self.url)
            .header(header::ACCEPT, "application/json")
            .json(&RefreshRequest {
                refresh: refresh_token,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_client_error() {
            return Err(ApiError::AuthExpired(
                backend_message(&body).unwrap_or_else(|| DEFAULT_REFRESH_FAILURE.to_string()),
            ));
        }
        if !status.is_success() {
            return Err(ApiError::from_status(status, &body));
        }

        let reply = AuthReply::parse(&body)?;
        if !reply.is_success() {
            return Err(ApiError::AuthExpired(reply.message_or(DEFAULT_REFRESH_FAILURE)));
        }
        reply
            .access
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::AuthExpired("Refresh reply carried no access token".to_string()))
    }
}
