use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

/// Status, parsed JSON body and headers of a `GET /api/v1/user` call
#[derive(Debug, Clone)]
pub struct SessionResponse {
    pub status: u16,
    pub body: Value,
    pub headers: HeaderMap,
}

impl SessionResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
            headers: HeaderMap::new(),
        }
    }

    /// Add a header; invalid names or values are ignored
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// 401 and 403 are the only statuses treated as authentication failures
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status, 401 | 403)
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// `message` field of an error body
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Malformed response body: {0}")]
    MalformedBody(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Client configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ClientError::Timeout(error.to_string())
        } else if error.is_decode() {
            ClientError::MalformedBody(error.to_string())
        } else if error.is_builder() {
            ClientError::Configuration(error.to_string())
        } else {
            ClientError::Network(error.to_string())
        }
    }
}

impl From<url::ParseError> for ClientError {
    fn from(error: url::ParseError) -> Self {
        ClientError::InvalidUrl(error.to_string())
    }
}
