//! Authentication module for managing the session's tokens.
//!
//! This module provides:
//! - `TokenStore`: access/refresh tokens written through to durable storage
//! - `FileBackend`, `KeyringBackend`, `MemoryBackend`: where tokens live
//! - `RefreshClient`: exchanges the refresh token for a new access token
//! - `SessionApi`: login, logout, password change and reset flows
//!
//! A session is "authenticated" exactly when an access token is stored.

pub mod backend;
pub mod refresh;
pub mod session;
pub mod token_store;

pub use backend::{FileBackend, KeyringBackend, MemoryBackend, TokenBackend};
pub use refresh::RefreshClient;
pub use session::SessionApi;
pub use token_store::{TokenPair, TokenStore, ACCESS_KEY, REFRESH_KEY};
