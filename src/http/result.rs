//! Read-only view over one URL's terminal outcome.

use crate::base::neterror::NetError;
use crate::http::decoder::{parse_header_line, DecodedResponse};
use crate::http::orderedheaders::title_case;
use bytes::Bytes;
use cookie::Cookie;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Outcome of fetching one URL.
///
/// Always check [`http_code`](Self::http_code) before trusting the body:
/// failed URLs carry code `0`, an empty body and an [`error`](Self::error).
#[derive(Debug, Clone)]
pub struct FetchResult {
    url: String,
    code: u16,
    body: Bytes,
    header_lines: Vec<String>,
    headers: HashMap<String, String>,
    cookies: HashMap<String, String>,
    elapsed: Duration,
    error: Option<NetError>,
}

impl FetchResult {
    /// Build the view over a decoded response.
    pub fn from_response(url: impl Into<String>, response: DecodedResponse) -> Self {
        let mut headers = HashMap::new();
        let mut cookies = HashMap::new();

        for (name, value) in response.header_lines.iter().filter_map(|l| parse_header_line(l)) {
            if name.eq_ignore_ascii_case("set-cookie") {
                if let Some((k, v)) = parse_set_cookie(value) {
                    cookies.insert(k, v);
                }
            } else {
                // Last occurrence wins
                headers.insert(title_case(name), value.to_string());
            }
        }

        Self {
            url: url.into(),
            code: response.status_code,
            body: response.body,
            header_lines: response.header_lines,
            headers,
            cookies,
            elapsed: response.elapsed,
            error: None,
        }
    }

    /// Result for a URL that produced no usable response.
    pub fn failed(url: impl Into<String>, error: NetError, elapsed: Duration) -> Self {
        let mut result = Self::from_response(url, DecodedResponse::failure(elapsed));
        result.error = Some(error);
        result
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as UTF-8 text (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn http_code(&self) -> u16 {
        self.code
    }

    /// A URL only counts as a success on code 200.
    pub fn is_success(&self) -> bool {
        self.code == 200
    }

    /// Header value by name (case-insensitive). `Set-Cookie` is not listed here.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&title_case(name)).map(String::as_str)
    }

    /// All headers, keyed by title-cased name.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Raw header lines as received, without the status line.
    pub fn header_lines(&self) -> &[String] {
        &self.header_lines
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Elapsed seconds.
    pub fn time(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Why this URL failed, for connect failures and redirect-limit hits.
    pub fn error(&self) -> Option<&NetError> {
        self.error.as_ref()
    }

    pub(crate) fn with_error(mut self, error: NetError) -> Self {
        self.error = Some(error);
        self
    }
}

impl fmt::Display for FetchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.body))
    }
}

/// Cookie name and the value up to the first `;`.
fn parse_set_cookie(value: &str) -> Option<(String, String)> {
    match Cookie::parse(value) {
        Ok(c) => Some((c.name().to_string(), c.value().to_string())),
        Err(_) => {
            let pair = value.split(';').next()?;
            let (k, v) = pair.split_once('=')?;
            let k = k.trim();
            (!k.is_empty()).then(|| (k.to_string(), v.trim().to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(code: u16, lines: &[&str], body: &'static str) -> DecodedResponse {
        DecodedResponse {
            status_code: code,
            body: Bytes::from_static(body.as_bytes()),
            header_lines: lines.iter().map(|l| l.to_string()).collect(),
            elapsed: Duration::from_millis(1500),
        }
    }

    #[test]
    fn test_cookie_value_truncated() {
        let result = FetchResult::from_response(
            "http://a.test/",
            decoded(200, &["Set-Cookie: sid=abc123; Path=/; HttpOnly"], ""),
        );
        assert_eq!(result.cookie("sid"), Some("abc123"));
        assert_eq!(result.cookies().len(), 1);
        assert!(result.cookie("Path").is_none());
        assert!(result.cookie("HttpOnly").is_none());
        assert!(result.header("Set-Cookie").is_none());
    }

    #[test]
    fn test_headers_last_wins() {
        let result = FetchResult::from_response(
            "http://a.test/",
            decoded(200, &["X-Dup: 1", "x-dup: 2", "Content-Type: text/plain"], "ok"),
        );
        assert_eq!(result.header("X-DUP"), Some("2"));
        assert_eq!(result.headers().len(), 2);
        assert_eq!(result.header_lines().len(), 3);
    }

    #[test]
    fn test_accessors() {
        let result = FetchResult::from_response("http://a.test/", decoded(404, &[], "missing"));
        assert_eq!(result.http_code(), 404);
        assert!(!result.is_success());
        assert_eq!(result.text(), "missing");
        assert_eq!(result.to_string(), "missing");
        assert!((result.time() - 1.5).abs() < f64::EPSILON);
        assert!(result.error().is_none());
    }

    #[test]
    fn test_failed() {
        let result = FetchResult::failed(
            "http://a.test/",
            NetError::ConnectionRefused,
            Duration::ZERO,
        );
        assert_eq!(result.http_code(), 0);
        assert!(result.body().is_empty());
        assert_eq!(result.error(), Some(&NetError::ConnectionRefused));
    }

    #[test]
    fn test_set_cookie_fallback() {
        assert_eq!(
            parse_set_cookie("k=v; Secure"),
            Some(("k".to_string(), "v".to_string()))
        );
        assert_eq!(parse_set_cookie("; nothing"), None);
    }
}
