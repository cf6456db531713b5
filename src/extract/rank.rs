use url::Url;

use crate::extract::types::{
    Candidate, IconEntry, IconFacet, ImageFacet, ImageSample, ResolvedCandidate, SourceKind,
};
use crate::url_policy;

pub const IMAGE_SAMPLE_CAP: usize = 3;
pub const ICON_LIST_CAP: usize = 5;

/// Resolve every candidate URL against the base, drop the ones that do
/// not resolve, and dedup by resolved URL keeping the first-seen kind.
pub fn resolve_and_dedup(candidates: Vec<Candidate>, base: &Url) -> Vec<ResolvedCandidate> {
    let mut resolved: Vec<ResolvedCandidate> = Vec::new();

    for candidate in candidates {
        let Some(url) = url_policy::resolve(Some(&candidate.url), base) else {
            continue;
        };
        let url = url.to_string();

        if resolved.iter().any(|seen| seen.url == url) {
            continue;
        }

        resolved.push(ResolvedCandidate {
            url,
            kind: candidate.kind,
            sizes: candidate.sizes,
            alt: candidate.alt,
            purpose: candidate.purpose,
        });
    }

    resolved
}

/// Declared pixel area from a `"WxH"` size hint. Handles the
/// space-separated multi-size form by taking the largest entry; `any`
/// and unparsable entries score zero.
pub fn sizes_area(sizes: Option<&str>) -> u64 {
    sizes
        .unwrap_or_default()
        .split_whitespace()
        .map(|entry| {
            let mut parts = entry.splitn(2, ['x', 'X']);
            let width: u64 = parts.next().and_then(|w| w.trim().parse().ok()).unwrap_or(0);
            let height: u64 = parts.next().and_then(|h| h.trim().parse().ok()).unwrap_or(0);
            width.saturating_mul(height)
        })
        .max()
        .unwrap_or(0)
}

fn icon_tier(kind: SourceKind) -> u8 {
    match kind {
        SourceKind::AppleTouchIcon => 3,
        SourceKind::Manifest => 2,
        _ => 1,
    }
}

/// Order icons best-first: apple touch > manifest > standard, then by
/// declared area. Stable, so ties keep discovery order.
pub fn rank_icons(icons: &mut [ResolvedCandidate]) {
    icons.sort_by_key(|icon| {
        let tier = icon_tier(icon.kind);
        let area = sizes_area(icon.sizes.as_deref());
        std::cmp::Reverse((tier, area))
    });
}

/// Primary image: first OG-sourced candidate when any exists, otherwise
/// the first candidate in discovery order.
fn primary_image(resolved: &[ResolvedCandidate]) -> Option<String> {
    resolved
        .iter()
        .find(|candidate| candidate.kind == SourceKind::Og)
        .or_else(|| resolved.first())
        .map(|candidate| candidate.url.clone())
}

pub fn image_facet(resolved: Vec<ResolvedCandidate>) -> ImageFacet {
    let primary = primary_image(&resolved);
    let count = resolved.len();

    let samples = resolved
        .into_iter()
        .take(IMAGE_SAMPLE_CAP)
        .map(|candidate| ImageSample {
            url: candidate.url,
            source: candidate.kind,
            sizes: candidate.sizes,
            alt: candidate.alt,
        })
        .collect();

    ImageFacet {
        primary,
        count,
        samples,
    }
}

/// Icon facet from ranked candidates. The primary always resolves:
/// when the document declares no usable icon, it falls back to
/// `/favicon.ico` on the base origin.
pub fn icon_facet(ranked: Vec<ResolvedCandidate>, base: &Url) -> IconFacet {
    let primary = ranked
        .first()
        .map(|icon| icon.url.clone())
        .or_else(|| base.join("/favicon.ico").ok().map(|u| u.to_string()))
        .unwrap_or_else(|| "/favicon.ico".to_string());

    let count = ranked.len();

    let all = ranked
        .into_iter()
        .take(ICON_LIST_CAP)
        .map(|icon| IconEntry {
            url: icon.url,
            source: icon.kind,
            sizes: icon.sizes,
            purpose: icon.purpose,
        })
        .collect();

    IconFacet {
        primary,
        count,
        all,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://site.test/page").unwrap()
    }

    fn candidate(url: &str, kind: SourceKind, sizes: Option<&str>) -> Candidate {
        Candidate {
            url: url.to_string(),
            kind,
            sizes: sizes.map(|s| s.to_string()),
            alt: None,
            purpose: None,
        }
    }

    #[test]
    fn test_og_image_resolved_and_primary() {
        let resolved = resolve_and_dedup(
            vec![candidate("/img.png", SourceKind::Og, None)],
            &base(),
        );
        let facet = image_facet(resolved);
        assert_eq!(facet.primary.as_deref(), Some("https://site.test/img.png"));
        assert_eq!(facet.samples[0].source, SourceKind::Og);
    }

    #[test]
    fn test_unresolvable_candidates_dropped() {
        let resolved = resolve_and_dedup(
            vec![
                candidate("data:image/png;base64,AA", SourceKind::Og, None),
                candidate("/ok.png", SourceKind::Twitter, None),
            ],
            &base(),
        );
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].url, "https://site.test/ok.png");
    }

    #[test]
    fn test_dedup_keeps_first_seen_kind() {
        let resolved = resolve_and_dedup(
            vec![
                candidate("/img.png", SourceKind::Twitter, None),
                candidate("https://site.test/img.png", SourceKind::Og, None),
            ],
            &base(),
        );
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].kind, SourceKind::Twitter);
    }

    #[test]
    fn test_primary_prefers_og_over_discovery_order() {
        let resolved = resolve_and_dedup(
            vec![
                candidate("/tw.png", SourceKind::Twitter, None),
                candidate("/og.png", SourceKind::Og, None),
            ],
            &base(),
        );
        let facet = image_facet(resolved);
        assert_eq!(facet.primary.as_deref(), Some("https://site.test/og.png"));
    }

    #[test]
    fn test_sizes_area() {
        assert_eq!(sizes_area(Some("32x32")), 1024);
        assert_eq!(sizes_area(Some("16x16 64x64")), 4096);
        assert_eq!(sizes_area(Some("any")), 0);
        assert_eq!(sizes_area(None), 0);
    }

    #[test]
    fn test_sizes_area_saturates_on_huge_hints() {
        // a hostile size hint must never panic or wrap
        assert_eq!(
            sizes_area(Some("10000000000x10000000000")),
            u64::MAX
        );
        let mut icons = resolve_and_dedup(
            vec![
                candidate("/huge.png", SourceKind::LinkIcon, Some("10000000000x10000000000")),
                candidate("/normal.png", SourceKind::LinkIcon, Some("32x32")),
            ],
            &base(),
        );
        rank_icons(&mut icons);
        assert_eq!(icons[0].url, "https://site.test/huge.png");
    }

    #[test]
    fn test_icon_ranking_tiers() {
        let mut icons = resolve_and_dedup(
            vec![
                candidate("/fav.ico", SourceKind::LinkIcon, Some("16x16")),
                candidate("/big.png", SourceKind::LinkIcon, Some("512x512")),
                candidate("/manifest-192.png", SourceKind::Manifest, Some("192x192")),
                candidate("/apple.png", SourceKind::AppleTouchIcon, Some("180x180")),
            ],
            &base(),
        );
        rank_icons(&mut icons);
        let order: Vec<_> = icons.iter().map(|icon| icon.url.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "https://site.test/apple.png",
                "https://site.test/manifest-192.png",
                "https://site.test/big.png",
                "https://site.test/fav.ico",
            ]
        );
    }

    #[test]
    fn test_icon_tie_keeps_discovery_order() {
        let mut icons = resolve_and_dedup(
            vec![
                candidate("/a.png", SourceKind::LinkIcon, Some("32x32")),
                candidate("/b.png", SourceKind::LinkIcon, Some("32x32")),
            ],
            &base(),
        );
        rank_icons(&mut icons);
        assert_eq!(icons[0].url, "https://site.test/a.png");
    }

    #[test]
    fn test_favicon_fallback() {
        let facet = icon_facet(Vec::new(), &base());
        assert_eq!(facet.primary, "https://site.test/favicon.ico");
        assert_eq!(facet.count, 0);
        assert!(facet.all.is_empty());
    }

    #[test]
    fn test_caps_and_counts() {
        let candidates: Vec<Candidate> = (0..7)
            .map(|i| candidate(&format!("/img{i}.png"), SourceKind::Og, None))
            .collect();
        let facet = image_facet(resolve_and_dedup(candidates, &base()));
        assert_eq!(facet.count, 7);
        assert_eq!(facet.samples.len(), IMAGE_SAMPLE_CAP);

        let icons: Vec<Candidate> = (0..9)
            .map(|i| candidate(&format!("/icon{i}.png"), SourceKind::LinkIcon, None))
            .collect();
        let facet = icon_facet(resolve_and_dedup(icons, &base()), &base());
        assert_eq!(facet.count, 9);
        assert_eq!(facet.all.len(), ICON_LIST_CAP);
    }
}
