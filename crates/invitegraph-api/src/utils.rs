//! Shared helpers for HTTP responses.

use axum::http::{header, HeaderName, HeaderValue};
use chrono::{SecondsFormat, Utc};

/// `Cache-Control` value for responses that must never be cached.
pub const NO_STORE: &str = "no-cache, no-store, must-revalidate";

/// Response header parts that disable client and proxy caching.
pub fn no_store() -> [(HeaderName, HeaderValue); 1] {
    [(header::CACHE_CONTROL, HeaderValue::from_static(NO_STORE))]
}

/// Current UTC time as ISO-8601 with millisecond precision (`2024-01-15T10:30:00.000Z`).
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_iso_shape() {
        let now = now_iso();
        assert!(now.ends_with('Z'));
        assert_eq!(now.len(), "2024-01-15T10:30:00.000Z".len());
        assert!(chrono::DateTime::parse_from_rfc3339(&now).is_ok());
    }

    #[test]
    fn test_no_store_header() {
        let [(name, value)] = no_store();
        assert_eq!(name, header::CACHE_CONTROL);
        assert_eq!(value, NO_STORE);
    }
}
