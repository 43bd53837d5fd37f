//! Request-level extractors
//!
//! Identity is owned by the external provider; the client relays the signed-in
//! user's id in the `x-user-id` header and uploads are attributed to it.

use axum::http::{HeaderName, HeaderValue};
use axum_extra::headers::{self, Header};

static X_USER_ID: HeaderName = HeaderName::from_static("x-user-id");

/// Typed `x-user-id` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Header for UserId {
    fn name() -> &'static HeaderName {
        &X_USER_ID
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        I: Iterator<Item = &'i HeaderValue>,
    {
        let value = values
            .next()
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(headers::Error::invalid)?;

        Ok(UserId(value.to_string()))
    }

    fn encode<E>(&self, values: &mut E)
    where
        E: Extend<HeaderValue>,
    {
        if let Ok(value) = HeaderValue::from_str(&self.0) {
            values.extend(std::iter::once(value));
        }
    }
}
