//! Raw transport results.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// An undecoded response from the remote API.
///
/// # Examples
///
/// ```
/// use tollgate_interface::RawResponse;
///
/// let response = RawResponse::ok(br#"{"valid": true}"#.to_vec());
/// assert!(response.is_success());
///
/// let body: serde_json::Value = response.json().unwrap();
/// assert_eq!(body["valid"], true);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResponse {
    /// HTTP-like status code
    pub status: u16,
    /// Response body bytes
    pub body: Vec<u8>,
    /// Upstream retry-after hint in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl RawResponse {
    /// A response with the given status and body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
            retry_after_secs: None,
        }
    }

    /// A `200` response.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, body)
    }

    /// A `200` response whose body is the JSON encoding of `value`.
    pub fn json_body<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::ok(serde_json::to_vec(value)?))
    }

    /// Attach an upstream retry-after hint.
    pub fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after_secs = Some(secs);
        self
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as lossy UTF-8, for error messages.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_range() {
        assert!(RawResponse::new(204, Vec::new()).is_success());
        assert!(!RawResponse::new(301, Vec::new()).is_success());
        assert!(!RawResponse::new(503, Vec::new()).is_success());
    }

    #[test]
    fn test_json_body_round_trip() {
        let response = RawResponse::json_body(&json!({"name": "ACME LTD"})).unwrap();
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["name"], "ACME LTD");
    }

    #[test]
    fn test_json_rejects_garbage() {
        let response = RawResponse::ok(b"<html>".to_vec());
        assert!(response.json::<serde_json::Value>().is_err());
        assert_eq!(response.text(), "<html>");
    }
}
