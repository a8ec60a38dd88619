//! clinic-core: session and API client for the campus clinic admin backend.
//!
//! The heart of the crate is the token lifecycle: a durable `TokenStore`,
//! the `RefreshClient` that trades refresh tokens for access tokens, and the
//! `AuthClient` that signs every protected call and recovers once from a 401.
//! `SessionApi` and `ClinicApi` build the user-facing flows and resource
//! calls on top of it.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;

use std::sync::Arc;

pub use api::{ApiError, AuthClient, ClinicApi, PendingRequest, SessionEvent};
pub use auth::{SessionApi, TokenPair, TokenStore};
pub use config::{Config, TokenBackendKind};

/// Session and resource APIs sharing one client and token store.
#[derive(Clone)]
pub struct Clinic {
    pub session: SessionApi,
    pub api: ClinicApi,
}

impl Clinic {
    /// Wire up the APIs for `config` over an already opened token store.
    pub fn new(config: &Config, tokens: TokenStore) -> Result<Self, ApiError> {
        let client = AuthClient::new(
            config.api_base_url.clone(),
            config.request_timeout(),
            Arc::new(tokens),
        )?;
        Ok(Self {
            session: SessionApi::new(client.clone()),
            api: ClinicApi::new(client, config.media_base_url.clone()),
        })
    }

    /// Open the configured token store and wire up the APIs.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let tokens = config.open_token_store()?;
        Ok(Self::new(config, tokens)?)
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SessionEvent> {
        self.session.client().subscribe()
    }
}
