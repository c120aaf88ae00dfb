//! Header helpers shared by the handlers.

use axum::http::{header::AUTHORIZATION, header::USER_AGENT, HeaderMap};
use std::net::{IpAddr, SocketAddr};

use crate::sessions::ClientContext;

/// Peers allowed to report the client address through `X-Forwarded-For` or
/// `X-Real-IP`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TrustedProxies {
    /// Forwarding headers are honoured whoever sends them.
    #[default]
    Any,
    /// Forwarding headers are honoured only from these peers; everyone else
    /// is identified by the socket address.
    Only(Vec<IpAddr>),
}

impl TrustedProxies {
    #[must_use]
    pub fn trusts(&self, peer: Option<IpAddr>) -> bool {
        match self {
            Self::Any => true,
            Self::Only(addrs) => peer.is_some_and(|ip| addrs.contains(&ip.to_canonical())),
        }
    }
}

/// Build the caller's binding metadata from `User-Agent` and the client IP.
pub(super) fn client_context(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    proxies: &TrustedProxies,
) -> ClientContext {
    let agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let peer_ip = peer.map(|addr| addr.ip().to_canonical());
    let forwarded = if proxies.trusts(peer_ip) {
        extract_client_ip(headers)
    } else {
        None
    };
    let ip = forwarded
        .or_else(|| peer_ip.map(|ip| ip.to_string()))
        .unwrap_or_default();
    ClientContext::new(agent, ip)
}

/// Extract a client IP from common proxy headers.
pub(super) fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub(super) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extract_client_ip_prefers_forwarded() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 5.6.7.8"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(extract_client_ip(&headers), Some("1.2.3.4".to_string()));
    }

    #[test]
    fn extract_client_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(extract_client_ip(&headers), Some("9.9.9.9".to_string()));
    }

    #[test]
    fn client_context_falls_back_to_peer_address() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("curl/8.0"));
        let peer = SocketAddr::from(([192, 0, 2, 10], 5555));
        let client = client_context(&headers, Some(peer), &TrustedProxies::Any);
        assert_eq!(client, ClientContext::new("curl/8.0", "192.0.2.10"));
    }

    #[test]
    fn client_context_tolerates_missing_metadata() {
        let client = client_context(&HeaderMap::new(), None, &TrustedProxies::Any);
        assert_eq!(client, ClientContext::new("", ""));
    }

    #[test]
    fn forwarded_headers_from_untrusted_peer_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7"));
        headers.insert("x-real-ip", HeaderValue::from_static("203.0.113.8"));
        let proxies = TrustedProxies::Only(vec![IpAddr::from([10, 0, 0, 1])]);

        let direct = SocketAddr::from(([198, 51, 100, 23], 40000));
        let client = client_context(&headers, Some(direct), &proxies);
        assert_eq!(client.ip, "198.51.100.23");

        let proxied = SocketAddr::from(([10, 0, 0, 1], 40000));
        let client = client_context(&headers, Some(proxied), &proxies);
        assert_eq!(client.ip, "203.0.113.7");

        let client = client_context(&headers, None, &proxies);
        assert_eq!(client.ip, "");
    }

    #[test]
    fn mapped_ipv6_peer_matches_ipv4_proxy() {
        let proxies = TrustedProxies::Only(vec![IpAddr::from([10, 0, 0, 1])]);
        let mapped: IpAddr = "::ffff:10.0.0.1".parse().unwrap();
        assert!(proxies.trusts(Some(mapped)));
        assert!(!proxies.trusts(None));
        assert!(TrustedProxies::Any.trusts(None));
    }

    #[test]
    fn bearer_token_requires_scheme_and_value() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer  "));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer_token(&headers), Some("abc.def".to_string()));
    }
}
