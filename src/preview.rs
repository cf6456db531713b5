use crate::config::Config;
use crate::error::PreviewError;
use crate::extract::doc::DocView;
use crate::extract::types::{MetadataRecord, ResponseInfo};
use crate::extract::{self, ExtractOptions};
use crate::fetch;
use crate::url_policy;

#[derive(Debug, Clone, Default)]
pub struct PreviewOpts {
    /// Requested fetch timeout in milliseconds; clamped by the fetch
    /// layer to its ceiling.
    pub timeout_ms: Option<u64>,
    pub extended: bool,
}

/// One full preview request: validate, fetch, extract, assemble.
///
/// Validation rejections short-circuit before any network call. After
/// the fetch everything is synchronous and pure, so the same page body
/// always produces the same record.
pub fn fetch_preview(
    raw_url: &str,
    opts: &PreviewOpts,
    config: &Config,
) -> Result<MetadataRecord, PreviewError> {
    let target = url_policy::validate(raw_url)?;
    log::debug!("preview requested for {}", target.raw());

    let timeout_ms = fetch::clamp_timeout(opts.timeout_ms.or(Some(config.default_timeout_ms)));
    let page = fetch::fetch_page(&target, timeout_ms)?;

    // References resolve against the post-redirect URL, not the input.
    let base = page.final_url.clone();
    let doc = DocView::parse(&page.body);

    let manifest_icons = if config.manifest_icons {
        extract::images::manifest_href(&doc)
            .and_then(|href| url_policy::resolve(Some(&href), &base))
            .map(|manifest_url| fetch::fetch_manifest_icons(&manifest_url))
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    let response_info = Some(ResponseInfo {
        status: page.status,
        content_type: page.content_type,
        server: page.server,
    });

    let record = extract::extract_record(
        &doc,
        &base,
        manifest_icons,
        response_info,
        &ExtractOptions {
            extended: opts.extended,
        },
    );

    log::debug!(
        "{}: extracted title={:?} images={} icons={}",
        target.hostname(),
        record.title,
        record.images.count,
        record.icons.count
    );

    Ok(record)
}
