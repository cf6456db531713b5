use crate::url_policy::UrlRejection;

/// Everything that can terminate a preview request without a record.
///
/// One classification per request, at the boundary where the failure
/// happened. No automatic retries; retry policy belongs to the caller.
#[derive(thiserror::Error, Debug)]
pub enum PreviewError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("scheme '{0}' is not allowed, only http and https are fetched")]
    DisallowedScheme(String),

    #[error("host '{0}' resolves into a blocked address range")]
    PrivateAddressBlocked(String),

    #[error("domain could not be resolved: {0}")]
    DomainNotFound(String),

    #[error("connection refused by origin: {0}")]
    ConnectionRefused(String),

    #[error("upstream request timed out")]
    UpstreamTimeout,

    #[error("upstream responded with status {0}")]
    UpstreamHttp(u16),

    #[error("bad upstream response: {0}")]
    UpstreamBadResponse(String),

    #[error("unexpected error: {0:?}")]
    Internal(#[from] anyhow::Error),
}

impl PreviewError {
    /// Stable machine-readable label for the JSON error body.
    pub fn label(&self) -> &'static str {
        match self {
            PreviewError::InvalidUrl(_) => "Invalid URL",
            PreviewError::DisallowedScheme(_) => "Disallowed Scheme",
            PreviewError::PrivateAddressBlocked(_) => "Blocked Host",
            PreviewError::DomainNotFound(_) => "Domain Not Found",
            PreviewError::ConnectionRefused(_) => "Connection Refused",
            PreviewError::UpstreamTimeout => "Request Timeout",
            PreviewError::UpstreamHttp(_) => "Upstream HTTP Error",
            PreviewError::UpstreamBadResponse(_) => "Bad Upstream Response",
            PreviewError::Internal(_) => "Internal Error",
        }
    }

    /// Status code for the JSON response. Upstream HTTP errors pass the
    /// origin's status through unchanged (clamped to the error range).
    pub fn status_code(&self) -> u16 {
        match self {
            PreviewError::InvalidUrl(_) | PreviewError::DisallowedScheme(_) => 400,
            PreviewError::PrivateAddressBlocked(_) => 403,
            PreviewError::DomainNotFound(_) => 404,
            PreviewError::ConnectionRefused(_) => 502,
            PreviewError::UpstreamTimeout => 408,
            PreviewError::UpstreamHttp(status) if (400..=599).contains(status) => *status,
            PreviewError::UpstreamHttp(_) => 502,
            PreviewError::UpstreamBadResponse(_) => 502,
            PreviewError::Internal(_) => 500,
        }
    }
}

impl From<UrlRejection> for PreviewError {
    fn from(rejection: UrlRejection) -> Self {
        match rejection {
            UrlRejection::InvalidUrl(msg) => PreviewError::InvalidUrl(msg),
            UrlRejection::DisallowedScheme(scheme) => PreviewError::DisallowedScheme(scheme),
            UrlRejection::PrivateAddressBlocked(host) => PreviewError::PrivateAddressBlocked(host),
        }
    }
}
