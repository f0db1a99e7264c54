//! Context carriers.
//!
//! A carrier is whatever transport structure the trace context rides in:
//! HTTP headers on the wire, or a plain map in tests and tools.

use std::collections::HashMap;

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};

/// Read side of a carrier.
pub trait Extractor {
    /// Get the value for a key. Keys are matched case-insensitively.
    fn get(&self, key: &str) -> Option<&str>;

    /// All keys currently present in the carrier.
    fn keys(&self) -> Vec<&str>;
}

/// Write side of a carrier.
pub trait Injector {
    /// Set a key, replacing any previous value.
    fn set(&mut self, key: &str, value: String);
}

impl Extractor for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<&str> {
        HashMap::get(self, &key.to_ascii_lowercase()).map(String::as_str)
    }

    fn keys(&self) -> Vec<&str> {
        HashMap::keys(self).map(String::as_str).collect()
    }
}

impl Injector for HashMap<String, String> {
    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_ascii_lowercase(), value);
    }
}

impl Extractor for HeaderMap {
    fn get(&self, key: &str) -> Option<&str> {
        HeaderMap::get(self, key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        HeaderMap::keys(self).map(HeaderName::as_str).collect()
    }
}

impl Injector for HeaderMap {
    fn set(&mut self, key: &str, value: String) {
        let name = match HeaderName::from_bytes(key.as_bytes()) {
            Ok(name) => name,
            Err(_) => {
                tracing::debug!(key, "Skipping carrier write: invalid header name");
                return;
            }
        };
        match HeaderValue::from_str(&value) {
            Ok(value) => {
                self.insert(name, value);
            }
            Err(_) => tracing::debug!(key, "Skipping carrier write: invalid header value"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_carrier_is_case_insensitive() {
        let mut carrier: HashMap<String, String> = HashMap::new();
        Injector::set(&mut carrier, "TraceParent", "value".to_string());

        assert_eq!(Extractor::get(&carrier, "traceparent"), Some("value"));
        assert_eq!(Extractor::get(&carrier, "TRACEPARENT"), Some("value"));
        assert_eq!(Extractor::keys(&carrier), vec!["traceparent"]);
    }

    #[test]
    fn test_header_carrier_overwrites() {
        let mut headers = HeaderMap::new();
        Injector::set(&mut headers, "traceparent", "first".to_string());
        Injector::set(&mut headers, "traceparent", "second".to_string());

        assert_eq!(headers.get_all("traceparent").iter().count(), 1);
        assert_eq!(Extractor::get(&headers, "traceparent"), Some("second"));
    }

    #[test]
    fn test_header_carrier_ignores_unencodable_values() {
        let mut headers = HeaderMap::new();
        Injector::set(&mut headers, "traceparent", "bad\nvalue".to_string());
        assert!(headers.is_empty());
    }
}
