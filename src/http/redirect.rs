//! Redirect resolution.
//!
//! Decides, for a decoded response, whether the request is re-issued
//! against the `Location` target. Each originating URL owns one
//! [`RedirectChain`]; once it holds [`MAX_REDIRECTS`] targets any further
//! `Location` ends the task with a synthetic failure.

use crate::http::decoder::DecodedResponse;
use url::Url;

/// Maximum number of followed targets per originating URL.
pub const MAX_REDIRECTS: usize = 10;

/// Targets followed so far for one originating URL.
#[derive(Debug, Clone, Default)]
pub struct RedirectChain {
    targets: Vec<Url>,
}

impl RedirectChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.targets.len() >= MAX_REDIRECTS
    }
}

/// What to do after a response arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectDecision {
    /// The response is the final one for this URL.
    Terminal,
    /// Re-issue against `target`. `cookie` replaces the configured cookie
    /// for that single request only.
    Follow {
        target: Url,
        cookie: Option<String>,
    },
    /// Another `Location` arrived with a full chain.
    LimitExceeded,
}

#[derive(Debug, Clone, Copy)]
pub struct RedirectResolver {
    /// Only follow `3xx` responses instead of any response with `Location`.
    require_redirect_status: bool,
    /// Carry the hop's `Set-Cookie` values into the next request.
    carry_cookies: bool,
}

impl RedirectResolver {
    /// Raw socket behavior: any `Location` is followed and `Set-Cookie` is carried.
    pub fn socket() -> Self {
        Self {
            require_redirect_status: false,
            carry_cookies: true,
        }
    }

    /// Follow-location behavior of the native stack: `3xx` only, no cookie carry.
    pub fn native() -> Self {
        Self {
            require_redirect_status: true,
            carry_cookies: false,
        }
    }

    pub fn resolve(
        &self,
        response: &DecodedResponse,
        current: &Url,
        chain: &mut RedirectChain,
    ) -> RedirectDecision {
        if self.require_redirect_status && !(300..400).contains(&response.status_code) {
            return RedirectDecision::Terminal;
        }
        let Some(location) = response.location() else {
            return RedirectDecision::Terminal;
        };

        if chain.is_full() {
            tracing::warn!(url = %current, hops = chain.len(), "redirect limit reached");
            return RedirectDecision::LimitExceeded;
        }

        let target = match current.join(location) {
            Ok(t) if matches!(t.scheme(), "http" | "https") => t,
            _ => {
                tracing::warn!(url = %current, location, "ignoring unusable redirect target");
                return RedirectDecision::Terminal;
            }
        };

        let cookie = if self.carry_cookies {
            let pairs = response.set_cookie_pairs();
            (!pairs.is_empty()).then(|| pairs.join("; "))
        } else {
            None
        };

        tracing::debug!(from = %current, to = %target, hop = chain.len() + 1, "following redirect");
        chain.targets.push(target.clone());
        RedirectDecision::Follow { target, cookie }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::time::Duration;

    fn response(code: u16, lines: &[&str]) -> DecodedResponse {
        DecodedResponse {
            status_code: code,
            body: Bytes::new(),
            header_lines: lines.iter().map(|l| l.to_string()).collect(),
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_terminal_without_location() {
        let url = Url::parse("http://a.test/").unwrap();
        let mut chain = RedirectChain::new();
        let decision = RedirectResolver::socket().resolve(&response(200, &[]), &url, &mut chain);
        assert_eq!(decision, RedirectDecision::Terminal);
        assert!(chain.is_empty());
    }

    #[test]
    fn test_relative_location_with_cookie() {
        let url = Url::parse("http://a.test/dir/page").unwrap();
        let mut chain = RedirectChain::new();
        let resp = response(
            302,
            &["Location: next?x=1", "Set-Cookie: sid=1; Path=/", "Set-Cookie: t=2"],
        );
        let decision = RedirectResolver::socket().resolve(&resp, &url, &mut chain);
        assert_eq!(
            decision,
            RedirectDecision::Follow {
                target: Url::parse("http://a.test/dir/next?x=1").unwrap(),
                cookie: Some("sid=1; t=2".to_string()),
            }
        );
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_socket_follows_any_status() {
        let url = Url::parse("http://a.test/").unwrap();
        let mut chain = RedirectChain::new();
        let resp = response(200, &["Location: http://b.test/"]);
        let decision = RedirectResolver::socket().resolve(&resp, &url, &mut chain);
        assert!(matches!(decision, RedirectDecision::Follow { cookie: None, .. }));
    }

    #[test]
    fn test_native_requires_3xx_and_drops_cookies() {
        let url = Url::parse("http://a.test/").unwrap();
        let mut chain = RedirectChain::new();
        let resolver = RedirectResolver::native();

        let ok = response(200, &["Location: http://b.test/"]);
        assert_eq!(resolver.resolve(&ok, &url, &mut chain), RedirectDecision::Terminal);

        let moved = response(301, &["Location: http://b.test/", "Set-Cookie: a=1"]);
        assert!(matches!(
            resolver.resolve(&moved, &url, &mut chain),
            RedirectDecision::Follow { cookie: None, .. }
        ));
    }

    #[test]
    fn test_limit() {
        let url = Url::parse("http://a.test/").unwrap();
        let mut chain = RedirectChain::new();
        let resp = response(302, &["Location: /loop"]);
        let resolver = RedirectResolver::socket();

        for _ in 0..MAX_REDIRECTS {
            assert!(matches!(
                resolver.resolve(&resp, &url, &mut chain),
                RedirectDecision::Follow { .. }
            ));
        }
        assert!(chain.is_full());
        assert_eq!(
            resolver.resolve(&resp, &url, &mut chain),
            RedirectDecision::LimitExceeded
        );
        assert_eq!(chain.len(), MAX_REDIRECTS);
    }

    #[test]
    fn test_non_http_target_is_terminal() {
        let url = Url::parse("http://a.test/").unwrap();
        let mut chain = RedirectChain::new();
        let resp = response(302, &["Location: ftp://files.test/x"]);
        assert_eq!(
            RedirectResolver::socket().resolve(&resp, &url, &mut chain),
            RedirectDecision::Terminal
        );
    }
}
