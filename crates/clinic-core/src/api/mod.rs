//! REST API client module for the clinic backend.
//!
//! This module provides the `AuthClient` that every backend call goes
//! through, and `ClinicApi` for the department, doctor, schedule and article
//! resources.
//!
//! Protected calls carry a JWT bearer token from the session's
//! `TokenStore`; a 401 is answered with one token refresh and one retry.

pub mod client;
pub mod error;
pub mod request;
pub mod resources;

pub use client::{AuthClient, SessionEvent};
pub use error::ApiError;
pub use request::{PendingRequest, RequestBody};
pub use resources::ClinicApi;
