//! Rebuildable description of an outbound call.

use std::time::Duration;

use reqwest::Method;
use serde::Serialize;

use super::ApiError;

/// Request body kept in a form that can be sent more than once.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    /// Single-file multipart upload
    File {
        field: String,
        file_name: String,
        mime: Option<String>,
        bytes: Vec<u8>,
    },
}

/// An outbound call plus its single-use retry flag.
///
/// The flag can only be raised, never lowered, so a request goes through the
/// refresh-and-retry path at most once.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: RequestBody,
    timeout: Option<Duration>,
    authorization: Option<String>,
    retried: bool,
}

impl PendingRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            timeout: None,
            authorization: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to encode request body: {}", e)))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    /// Attach a single file as a multipart form field.
    pub fn file(
        mut self,
        field: &str,
        file_name: &str,
        mime: Option<&str>,
        bytes: Vec<u8>,
    ) -> Self {
        self.body = RequestBody::File {
            field: field.to_string(),
            file_name: file_name.to_string(),
            mime: mime.map(str::to_string),
            bytes,
        };
        self
    }

    /// Override the client-wide timeout for this call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Send an explicit bearer token instead of the session's current one.
    pub fn bearer(mut self, token: &str) -> Self {
        self.authorization = Some(format!("Bearer {}", token));
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn timeout_override(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn explicit_authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }

    pub(crate) fn mark_retried(&mut self) {
        self.retried = true;
    }
}
