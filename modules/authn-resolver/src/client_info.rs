//! Client IP and device fingerprint derivation.
//!
//! The IP honors a trusted-proxy allowlist: `X-Forwarded-For` entries are only
//! believed when the connecting peer is one of our own reverse proxies, walked
//! right to left until the first address we did not add ourselves. The device
//! fingerprint is a stable hash over identifying request headers; it is the
//! stronger binding signal because it survives network roaming.

use std::net::IpAddr;

use http::HeaderMap;
use sha2::{Digest as _, Sha256};

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const FINGERPRINT_HEADERS: [&str; 3] = ["user-agent", "accept-language", "sec-ch-ua"];

/// Signals describing the requesting client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: Option<IpAddr>,
    pub device_fingerprint: Option<String>,
}

/// Derives [`ClientInfo`] from the connection peer and request headers.
#[derive(Debug, Clone)]
pub struct ClientInfoExtractor {
    trusted_proxies: Vec<IpAddr>,
}

impl ClientInfoExtractor {
    #[must_use]
    pub fn new(trusted_proxies: Vec<IpAddr>) -> Self {
        Self { trusted_proxies }
    }

    #[must_use]
    pub fn extract(&self, headers: &HeaderMap, peer: Option<IpAddr>) -> ClientInfo {
        ClientInfo {
            ip: self.client_ip(headers, peer),
            device_fingerprint: device_fingerprint(headers),
        }
    }

    fn client_ip(&self, headers: &HeaderMap, peer: Option<IpAddr>) -> Option<IpAddr> {
        let forwarded: Vec<IpAddr> = headers
            .get_all(X_FORWARDED_FOR)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .filter_map(|s| s.trim().parse().ok())
            .collect();

        match peer {
            Some(peer) if self.trusted_proxies.contains(&peer) => {
                // Walk the chain right to left, skipping hops we operate.
                forwarded
                    .iter()
                    .rev()
                    .find(|ip| !self.trusted_proxies.contains(ip))
                    .copied()
                    .or(Some(peer))
            }
            // Direct connection: forwarding headers are client-controlled
            // and must be ignored.
            Some(peer) => Some(peer),
            // No socket peer (in-process testing); best effort from headers.
            None => forwarded.first().copied(),
        }
    }
}

/// Stable fingerprint over identifying headers, or `None` when the request
/// carries no user agent at all.
fn device_fingerprint(headers: &HeaderMap) -> Option<String> {
    headers.get("user-agent")?;
    let mut hasher = Sha256::new();
    for name in FINGERPRINT_HEADERS {
        if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
            hasher.update(name.as_bytes());
            hasher.update(b":");
            hasher.update(value.as_bytes());
        }
        hasher.update(b"\n");
    }
    Some(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                http::header::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn direct_connection_ignores_forwarded_headers() {
        let extractor = ClientInfoExtractor::new(vec![]);
        let peer: IpAddr = "198.51.100.4".parse().unwrap();
        let info = extractor.extract(
            &headers(&[("x-forwarded-for", "203.0.113.9")]),
            Some(peer),
        );
        assert_eq!(info.ip, Some(peer));
    }

    #[test]
    fn trusted_proxy_yields_first_untrusted_hop_from_the_right() {
        let proxy: IpAddr = "10.0.0.1".parse().unwrap();
        let extractor = ClientInfoExtractor::new(vec![proxy]);
        let info = extractor.extract(
            &headers(&[("x-forwarded-for", "203.0.113.9, 10.0.0.1")]),
            Some(proxy),
        );
        assert_eq!(info.ip, Some("203.0.113.9".parse().unwrap()));
    }

    #[test]
    fn all_hops_trusted_falls_back_to_peer() {
        let proxy: IpAddr = "10.0.0.1".parse().unwrap();
        let extractor = ClientInfoExtractor::new(vec![proxy]);
        let info = extractor.extract(&headers(&[("x-forwarded-for", "10.0.0.1")]), Some(proxy));
        assert_eq!(info.ip, Some(proxy));
    }

    #[test]
    fn fingerprint_is_stable_and_header_sensitive() {
        let extractor = ClientInfoExtractor::new(vec![]);
        let a = extractor.extract(
            &headers(&[("user-agent", "Mozilla/5.0"), ("accept-language", "en-US")]),
            None,
        );
        let b = extractor.extract(
            &headers(&[("user-agent", "Mozilla/5.0"), ("accept-language", "en-US")]),
            None,
        );
        let c = extractor.extract(
            &headers(&[("user-agent", "Mozilla/5.0"), ("accept-language", "fr-FR")]),
            None,
        );
        assert_eq!(a.device_fingerprint, b.device_fingerprint);
        assert_ne!(a.device_fingerprint, c.device_fingerprint);
    }

    #[test]
    fn no_user_agent_means_no_fingerprint() {
        let extractor = ClientInfoExtractor::new(vec![]);
        let info = extractor.extract(&headers(&[("accept-language", "en-US")]), None);
        assert!(info.device_fingerprint.is_none());
    }
}
