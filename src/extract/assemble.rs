use url::Url;

use crate::extract::doc::DocView;
use crate::extract::facets;
use crate::extract::types::{
    IconFacet, ImageFacet, MetadataGroups, MetadataRecord, ResponseInfo,
};

/// Hostname with a single leading `www.` stripped. Only one, so
/// `www.www.example.com` keeps its second prefix.
pub fn domain_of(hostname: &str) -> String {
    hostname
        .strip_prefix("www.")
        .unwrap_or(hostname)
        .to_string()
}

/// siteName fallback chain: OG site name, application-name meta, the
/// first label of the domain, raw hostname.
fn site_name(doc: &DocView, hostname: &str, domain: &str) -> Option<String> {
    facets::site_name(doc)
        .or_else(|| {
            domain
                .split('.')
                .next()
                .filter(|label| !label.is_empty() && *label != domain)
                .map(|label| label.to_string())
        })
        .or_else(|| (!hostname.is_empty()).then(|| hostname.to_string()))
}

/// Pure merge of every facet into the output record. Each field is
/// independently optional; a missing field never aborts assembly.
pub fn assemble(
    doc: &DocView,
    base: &Url,
    images: ImageFacet,
    icons: IconFacet,
    response_info: Option<ResponseInfo>,
    extended: bool,
) -> MetadataRecord {
    let hostname = base.host_str().unwrap_or_default().to_string();
    let domain = domain_of(&hostname);

    MetadataRecord {
        success: true,
        url: base.to_string(),
        site_name: site_name(doc, &hostname, &domain),
        hostname,
        domain,
        title: facets::title(doc),
        description: facets::description(doc),
        metadata: MetadataGroups {
            basic: facets::basic(doc),
            dates: facets::dates(doc),
            social: facets::social(doc),
            appearance: facets::appearance(doc, extended),
            structure: facets::structure(doc, extended),
        },
        images,
        icons,
        response_info,
    }
}
