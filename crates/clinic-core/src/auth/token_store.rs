use std::fmt;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::backend::{MemoryBackend, TokenBackend};

/// Storage key for the access token
pub const ACCESS_KEY: &str = "access_token";

/// Storage key for the refresh token
pub const REFRESH_KEY: &str = "refresh_token";

/// Access/refresh token pair. Both values are opaque to the client.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

#[derive(Default)]
struct TokenState {
    access: Option<String>,
    refresh: Option<String>,
}

/// Holds the session's tokens and writes every change through to a durable
/// backend.
///
/// The store is the explicit session object handed to the HTTP client: the
/// `Authorization` header of every protected call is derived from it at
/// dispatch time. There is no locking beyond the in-memory mirror, so
/// concurrent writers resolve as last writer wins.
pub struct TokenStore {
    backend: Box<dyn TokenBackend>,
    state: RwLock<TokenState>,
}

impl TokenStore {
    /// Open a store over `backend`, loading whatever tokens it already holds.
    /// Unreadable entries are treated as absent.
    pub fn open(backend: impl TokenBackend + 'static) -> Self {
        let read = |key: &str| match backend.read(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to load stored token");
                None
            }
        };
        let state = TokenState {
            access: read(ACCESS_KEY),
            refresh: read(REFRESH_KEY),
        };
        debug!(
            has_access = state.access.is_some(),
            has_refresh = state.refresh.is_some(),
            "Token store opened"
        );

        Self {
            backend: Box::new(backend),
            state: RwLock::new(state),
        }
    }

    /// A store that forgets everything when dropped.
    pub fn in_memory() -> Self {
        Self::open(MemoryBackend::new())
    }

    pub fn access(&self) -> Option<String> {
        self.read_state().access.clone()
    }

    pub fn refresh(&self) -> Option<String> {
        self.read_state().refresh.clone()
    }

    /// Replace the access token. The next dispatched request carries it.
    pub fn set_access(&self, token: &str) {
        self.write_state().access = Some(token.to_string());
        self.persist(ACCESS_KEY, Some(token));
    }

    pub fn set_refresh(&self, token: &str) {
        self.write_state().refresh = Some(token.to_string());
        self.persist(REFRESH_KEY, Some(token));
    }

    /// Drop both tokens, in memory and in the backend.
    pub fn clear(&self) {
        {
            let mut state = self.write_state();
            state.access = None;
            state.refresh = None;
        }
        self.persist(ACCESS_KEY, None);
        self.persist(REFRESH_KEY, None);
        debug!("Tokens cleared");
    }

    /// Authenticated iff an access token is present.
    pub fn is_authenticated(&self) -> bool {
        self.read_state().access.is_some()
    }

    /// Both tokens, when both are held.
    pub fn pair(&self) -> Option<TokenPair> {
        let state = self.read_state();
        match (&state.access, &state.refresh) {
            (Some(access), Some(refresh)) => Some(TokenPair {
                access: access.clone(),
                refresh: refresh.clone(),
            }),
            _ => None,
        }
    }

    /// `Authorization` header value for protected calls.
    pub fn authorization(&self) -> Option<String> {
        self.read_state()
            .access
            .as_ref()
            .map(|token| format!("Bearer {}", token))
    }

    fn persist(&self, key: &str, value: Option<&str>) {
        let result = match value {
            Some(value) => self.backend.write(key, value),
            None => self.backend.remove(key),
        };
        if let Err(e) = result {
            warn!(key, error = %e, "Failed to persist token change");
        }
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, TokenState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, TokenState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read_state();
        f.debug_struct("TokenStore")
            .field("has_access", &state.access.is_some())
            .field("has_refresh", &state.refresh.is_some())
            .finish()
    }
}
