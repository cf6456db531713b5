use std::{error::Error, time::Duration};

use serde::Deserialize;
use url::Url;

use crate::error::PreviewError;
use crate::extract::types::{Candidate, SourceKind};
use crate::url_policy::FetchTarget;

const USER_AGENT_DEFAULT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0";

pub const DEFAULT_TIMEOUT_MS: u64 = 8_000;
pub const MAX_TIMEOUT_MS: u64 = 15_000;
const MANIFEST_TIMEOUT_MS: u64 = 3_000;
const REDIRECT_LIMIT: usize = 5;

/// What the transport hands to the extraction engine.
#[derive(Debug)]
pub struct FetchedPage {
    pub body: String,
    /// URL after redirects; extraction resolves references against this.
    pub final_url: Url,
    pub status: u16,
    pub content_type: Option<String>,
    pub server: Option<String>,
}

fn root_cause(error: &reqwest::Error) -> String {
    match error.source() {
        Some(e) => match e.source() {
            Some(e) => e.to_string(),
            None => e.to_string(),
        },
        None => error.to_string(),
    }
}

fn classify(error: reqwest::Error) -> PreviewError {
    if error.is_timeout() {
        return PreviewError::UpstreamTimeout;
    }

    let cause = root_cause(&error);
    let lowered = cause.to_lowercase();

    if lowered.contains("dns") || lowered.contains("failed to lookup") {
        return PreviewError::DomainNotFound(cause);
    }
    if lowered.contains("connection refused") || lowered.contains("refused") {
        return PreviewError::ConnectionRefused(cause);
    }

    PreviewError::UpstreamBadResponse(cause)
}

fn build_client(timeout_ms: u64) -> Result<reqwest::blocking::Client, PreviewError> {
    reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT_DEFAULT)
        .timeout(Duration::from_millis(timeout_ms))
        .redirect(reqwest::redirect::Policy::limited(REDIRECT_LIMIT))
        .build()
        .map_err(|err| PreviewError::Internal(err.into()))
}

fn header_value(resp: &reqwest::blocking::Response, name: &str) -> Option<String> {
    resp.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

/// Clamp a caller-requested timeout into the allowed window.
pub fn clamp_timeout(requested: Option<u64>) -> u64 {
    requested
        .unwrap_or(DEFAULT_TIMEOUT_MS)
        .clamp(100, MAX_TIMEOUT_MS)
}

/// Single fetch attempt for the target page. No retries here: a failed
/// fetch is classified once and ends the request.
pub fn fetch_page(target: &FetchTarget, timeout_ms: u64) -> Result<FetchedPage, PreviewError> {
    let host = target.hostname();
    log::debug!("{host}: requesting {}", target.url());

    let client = build_client(timeout_ms)?;
    let resp = client.get(target.url().clone()).send().map_err(|err| {
        let classified = classify(err);
        log::warn!("{host}: fetch failed: {classified}");
        classified
    })?;

    let status = resp.status();
    if status.is_client_error() || status.is_server_error() {
        log::debug!("{host}: upstream returned {status}");
        return Err(PreviewError::UpstreamHttp(status.as_u16()));
    }

    let final_url = resp.url().clone();
    let content_type = header_value(&resp, "content-type");
    let server = header_value(&resp, "server");
    let status = status.as_u16();

    let body = resp.text().map_err(classify)?;

    Ok(FetchedPage {
        body,
        final_url,
        status,
        content_type,
        server,
    })
}

#[derive(Debug, Deserialize)]
struct ManifestIcon {
    src: Option<String>,
    sizes: Option<String>,
    purpose: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WebAppManifest {
    #[serde(default)]
    icons: Vec<ManifestIcon>,
}

/// Best-effort icon harvest from a web-app manifest. Short timeout, and
/// every failure is swallowed into an empty candidate list; the primary
/// response never waits on or fails because of this.
pub fn fetch_manifest_icons(manifest_url: &Url) -> Vec<Candidate> {
    let client = match build_client(MANIFEST_TIMEOUT_MS) {
        Ok(client) => client,
        Err(_) => return Vec::new(),
    };

    let manifest: WebAppManifest = match client
        .get(manifest_url.clone())
        .send()
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.json())
    {
        Ok(manifest) => manifest,
        Err(err) => {
            log::debug!("manifest fetch skipped: {}", root_cause(&err));
            return Vec::new();
        }
    };

    manifest
        .icons
        .into_iter()
        .filter_map(|icon| {
            let src = icon.src?;
            Some(Candidate {
                url: src,
                kind: SourceKind::Manifest,
                sizes: icon.sizes,
                alt: None,
                purpose: icon.purpose,
            })
        })
        .collect()
}
