// src/lro/response.rs

//! Minimal HTTP response shape consumed by the poller.

use std::collections::BTreeMap;
use std::time::Duration;

/// Status line, headers and an opaque body.
///
/// Header names are stored lowercased so lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn has_body(&self) -> bool {
        self.body.iter().any(|b| !b.is_ascii_whitespace())
    }

    /// Server-suggested delay before the next status request.
    ///
    /// Only whole seconds are understood; anything else is ignored.
    pub fn retry_after(&self) -> Option<Duration> {
        self.header("retry-after")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_is_whole_seconds() {
        let r = HttpResponse::new(202).with_header("Retry-After", "5");
        assert_eq!(r.retry_after(), Some(Duration::from_secs(5)));

        let r = HttpResponse::new(202).with_header("retry-after", " 12 ");
        assert_eq!(r.retry_after(), Some(Duration::from_secs(12)));
    }

    #[test]
    fn retry_after_ignores_dates_and_garbage() {
        let r = HttpResponse::new(202).with_header("Retry-After", "Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(r.retry_after(), None);

        let r = HttpResponse::new(202).with_header("Retry-After", "1.5");
        assert_eq!(r.retry_after(), None);

        assert_eq!(HttpResponse::new(202).retry_after(), None);
    }

    #[test]
    fn whitespace_body_counts_as_empty() {
        assert!(!HttpResponse::new(200).with_body("  \n").has_body());
        assert!(HttpResponse::new(200).with_body("{}").has_body());
    }
}
