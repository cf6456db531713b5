use once_cell::sync::Lazy;
use scraper::Selector;

use crate::extract::doc::DocView;
use crate::extract::types::{Candidate, SourceKind};

static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// Minimum declared width for an in-document `<img>` to count as a
/// preview candidate. Canonical threshold for both modes.
pub const CONTENT_IMAGE_MIN_WIDTH: u32 = 300;

const APPLE_ICON_DEFAULT_SIZES: &str = "180x180";
const LINK_ICON_DEFAULT_SIZES: &str = "16x16";

fn usable_src(src: &str) -> bool {
    !src.is_empty() && !src.starts_with("data:")
}

fn apple_touch_icons(doc: &DocView) -> Vec<Candidate> {
    doc.links_with_rel("apple-touch-icon")
        .into_iter()
        .filter(|link| usable_src(&link.href))
        .map(|link| Candidate {
            url: link.href.clone(),
            kind: SourceKind::AppleTouchIcon,
            sizes: link
                .sizes
                .clone()
                .or_else(|| Some(APPLE_ICON_DEFAULT_SIZES.to_string())),
            alt: None,
            purpose: None,
        })
        .collect()
}

/// Union of every image source the document declares, in discovery
/// order: OG images, twitter images, apple touch icons, then content
/// `<img>` elements (largest by declared area, plus the first one wider
/// than the threshold). Data URIs never become candidates.
pub fn image_candidates(doc: &DocView) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    let og_alt = doc.meta_first(&["og:image:alt"]);
    for (idx, url) in doc.meta_all(&["og:image", "og:image:url"]).into_iter().enumerate() {
        if !usable_src(&url) {
            continue;
        }
        candidates.push(Candidate {
            url,
            kind: SourceKind::Og,
            sizes: None,
            alt: if idx == 0 { og_alt.clone() } else { None },
            purpose: None,
        });
    }

    let twitter_alt = doc.meta_first(&["twitter:image:alt"]);
    for (idx, url) in doc
        .meta_all(&["twitter:image", "twitter:image:src"])
        .into_iter()
        .enumerate()
    {
        if !usable_src(&url) {
            continue;
        }
        candidates.push(Candidate {
            url,
            kind: SourceKind::Twitter,
            sizes: None,
            alt: if idx == 0 { twitter_alt.clone() } else { None },
            purpose: None,
        });
    }

    candidates.extend(apple_touch_icons(doc));
    candidates.extend(content_images(doc));

    candidates
}

fn parse_dimension(value: Option<&str>) -> u32 {
    value
        .unwrap_or_default()
        .trim()
        .trim_end_matches("px")
        .parse()
        .unwrap_or(0)
}

/// Best-effort scan over `<img>` elements with declared dimensions.
fn content_images(doc: &DocView) -> Vec<Candidate> {
    let mut largest: Option<(u64, Candidate)> = None;
    let mut first_wide: Option<Candidate> = None;

    for element in doc.select(&IMG_SELECTOR) {
        let src = element.attr("src").unwrap_or_default();
        if !usable_src(src) {
            continue;
        }

        let width = parse_dimension(element.attr("width"));
        let height = parse_dimension(element.attr("height"));
        let area = u64::from(width) * u64::from(height);

        let candidate = Candidate {
            url: src.to_string(),
            kind: SourceKind::ContentImage,
            sizes: (width > 0 && height > 0).then(|| format!("{width}x{height}")),
            alt: element
                .attr("alt")
                .map(|alt| alt.trim().to_string())
                .filter(|alt| !alt.is_empty()),
            purpose: None,
        };

        if area > 0 && largest.as_ref().map_or(true, |(best, _)| area > *best) {
            largest = Some((area, candidate.clone()));
        }

        if first_wide.is_none() && width > CONTENT_IMAGE_MIN_WIDTH {
            first_wide = Some(candidate);
        }
    }

    let mut out = Vec::new();
    if let Some((_, candidate)) = largest {
        out.push(candidate);
    }
    if let Some(candidate) = first_wide {
        // May coincide with the largest; ranking dedups by resolved URL.
        out.push(candidate);
    }
    out
}

/// Union of standard icon links and apple touch icons. Manifest icons
/// are appended later by the pipeline, when the manifest fetch yields
/// any. Default size hints apply when the document declares none.
pub fn icon_candidates(doc: &DocView) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for link in doc.links_with_rel("icon") {
        if !usable_src(&link.href) {
            log::debug!("skipping data-uri icon");
            continue;
        }
        if link.rel.split_whitespace().any(|rel| rel.contains("apple-touch-icon")) {
            continue;
        }
        candidates.push(Candidate {
            url: link.href.clone(),
            kind: SourceKind::LinkIcon,
            sizes: link
                .sizes
                .clone()
                .or_else(|| Some(LINK_ICON_DEFAULT_SIZES.to_string())),
            alt: None,
            purpose: None,
        });
    }

    candidates.extend(apple_touch_icons(doc));

    candidates
}

/// Href of the web-app manifest link, when the document declares one.
pub fn manifest_href(doc: &DocView) -> Option<String> {
    doc.links_with_rel("manifest")
        .first()
        .map(|link| link.href.clone())
        .filter(|href| usable_src(href))
}
