//! Successful store responses

use serde_json::Value;

/// A successful response from the remote store
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// HTTP status code (2xx)
    pub status: u16,
    /// Decoded payload; `Value::Null` for empty responses
    pub body: Value,
}

impl Response {
    /// 200 with a payload.
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    /// 201 without a payload.
    pub fn created() -> Self {
        Self {
            status: 201,
            body: Value::Null,
        }
    }

    /// 204 without a payload.
    pub fn no_content() -> Self {
        Self {
            status: 204,
            body: Value::Null,
        }
    }

    /// Whether the response carries no payload.
    pub fn is_empty(&self) -> bool {
        match &self.body {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }
}
