use std::net::{IpAddr, Ipv4Addr};

use url::Url;

/// Why a candidate URL was refused before any network activity.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UrlRejection {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("scheme '{0}' is not allowed")]
    DisallowedScheme(String),

    #[error("host '{0}' is blocked")]
    PrivateAddressBlocked(String),
}

/// A validated absolute http/https URL. Rejected inputs never become one.
#[derive(Debug, Clone)]
pub struct FetchTarget {
    url: Url,
    raw: String,
}

impl FetchTarget {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Build a target directly, sidestepping the private-address block,
    /// so transport tests can point at a local listener.
    #[cfg(test)]
    pub fn from_url_unchecked(url: Url) -> Self {
        Self {
            raw: url.to_string(),
            url,
        }
    }
}

fn is_private_v4(v4: &Ipv4Addr) -> bool {
    let octets = v4.octets();
    octets[0] == 10
        || (octets[0] == 172 && (16..=31).contains(&octets[1]))
        || (octets[0] == 192 && octets[1] == 168)
}

/// Static request-time block against loopback and private ranges.
///
/// This never resolves DNS, so a public hostname that rebinds to a
/// private address after validation is not caught. Known limitation.
fn is_blocked_host(host: &str) -> bool {
    let host = host.trim_start_matches('[').trim_end_matches(']');

    if matches!(host, "localhost" | "127.0.0.1" | "0.0.0.0") {
        return true;
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return match ip {
            IpAddr::V4(v4) => v4.is_loopback() || v4.is_unspecified() || is_private_v4(&v4),
            IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
        };
    }

    host.contains("internal") || host.contains("private")
}

/// Gate a raw URL string before fetching. Pure function of its input.
pub fn validate(raw: &str) -> Result<FetchTarget, UrlRejection> {
    let url = Url::parse(raw).map_err(|err| UrlRejection::InvalidUrl(err.to_string()))?;

    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(UrlRejection::DisallowedScheme(scheme.to_string()));
    }

    let host = url.host_str().unwrap_or_default();
    if host.is_empty() {
        return Err(UrlRejection::InvalidUrl("url has no host".to_string()));
    }

    if is_blocked_host(host) {
        return Err(UrlRejection::PrivateAddressBlocked(host.to_string()));
    }

    Ok(FetchTarget {
        url,
        raw: raw.to_string(),
    })
}

/// Resolve a possibly relative reference against a base document URL.
///
/// `data:` references are never resolvable (they are not previewable
/// resources). A reference that fails standard resolution is kept only
/// if it already looks absolute.
pub fn resolve(reference: Option<&str>, base: &Url) -> Option<Url> {
    let reference = reference?.trim();
    if reference.is_empty() || reference.starts_with("data:") {
        return None;
    }

    match base.join(reference) {
        Ok(resolved) => Some(resolved),
        Err(_) if reference.starts_with("http") => Url::parse(reference).ok(),
        Err(_) => None,
    }
}
