//! The `{code, message, type, data}` envelope returned by REST resources.

use serde::Deserialize;

use crate::api::ApiError;

/// Envelope codes that signal success.
pub const SUCCESS_CODES: [i64; 3] = [200, 201, 204];

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        SUCCESS_CODES.contains(&self.code)
    }

    /// Unwrap the payload of a successful envelope.
    pub fn into_data(self) -> Result<T, ApiError> {
        if !self.is_success() {
            return Err(ApiError::Rejected {
                code: self.code,
                message: self.message,
            });
        }
        self.data.ok_or_else(|| {
            ApiError::InvalidResponse(format!("Envelope {} carried no data", self.code))
        })
    }

    /// Check the code only, for calls whose payload is irrelevant.
    pub fn into_status(self) -> Result<(), ApiError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(ApiError::Rejected {
                code: self.code,
                message: self.message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::DeserializeOwned;

    /// Payload type with no `Default` impl.
    #[derive(Debug, Deserialize, PartialEq)]
    struct Room {
        id: i64,
    }

    fn parse<T: DeserializeOwned>(body: &str) -> Envelope<T> {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_payload_needs_only_deserialize() {
        let env: Envelope<Room> = parse(r#"{"code":200,"data":{"id":3}}"#);
        assert_eq!(env.into_data().unwrap(), Room { id: 3 });

        let env: Envelope<Room> = parse(r#"{"code":201,"message":"created"}"#);
        assert!(env.data.is_none());
    }

    #[test]
    fn test_success_envelope() {
        let env: Envelope<Vec<i64>> =
            serde_json::from_str(r#"{"code":200,"message":"ok","type":"department","data":[1,2]}"#).unwrap();
        assert_eq!(env.kind.as_deref(), Some("department"));
        assert_eq!(env.into_data().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_rejected_envelope() {
        let env: Envelope<serde_json::Value> =
            serde_json::from_str(r#"{"code":404,"message":"Department does not exist","data":null}"#).unwrap();
        match env.into_data() {
            Err(ApiError::Rejected { code, message }) => {
                assert_eq!(code, 404);
                assert_eq!(message, "Department does not exist");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_success_without_data() {
        let env: Envelope<serde_json::Value> =
            serde_json::from_str(r#"{"code":204,"message":"deleted"}"#).unwrap();
        assert!(env.into_status().is_ok());
    }
}
