pub mod assemble;
pub mod doc;
pub mod facets;
pub mod images;
pub mod rank;
pub mod types;

use url::Url;

use self::doc::DocView;
use self::types::{Candidate, MetadataRecord, ResponseInfo};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    /// Adds excerpt, headings, framework signals and charset/viewport/
    /// robots passthrough to the record.
    pub extended: bool,
}

/// Run the whole extraction engine over one parsed document.
///
/// Pure and read-only over `doc`: every extractor reads the same
/// immutable view, so repeated runs over the same document and base
/// produce identical records. `manifest_icons` are whatever the
/// best-effort manifest fetch yielded (possibly nothing) and are merged
/// before ranking like any other icon source.
pub fn extract_record(
    doc: &DocView,
    base: &Url,
    manifest_icons: Vec<Candidate>,
    response_info: Option<ResponseInfo>,
    opts: &ExtractOptions,
) -> MetadataRecord {
    let image_candidates = images::image_candidates(doc);
    let images = rank::image_facet(rank::resolve_and_dedup(image_candidates, base));

    let mut icon_candidates = images::icon_candidates(doc);
    icon_candidates.extend(manifest_icons);
    let mut ranked_icons = rank::resolve_and_dedup(icon_candidates, base);
    rank::rank_icons(&mut ranked_icons);
    let icons = rank::icon_facet(ranked_icons, base);

    assemble::assemble(doc, base, images, icons, response_info, opts.extended)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html lang="en"><head>
        <meta property="og:title" content="A Page">
        <meta property="og:image" content="/img.png">
        <link rel="icon" href="/fav.ico" sizes="32x32">
        <title>Plain Title</title>
    </head><body><h1>Header</h1></body></html>"#;

    #[test]
    fn test_end_to_end_extraction() {
        let doc = DocView::parse(PAGE);
        let base = Url::parse("https://site.test/page").unwrap();
        let record = extract_record(&doc, &base, Vec::new(), None, &ExtractOptions::default());

        assert_eq!(record.title.as_deref(), Some("A Page"));
        assert_eq!(
            record.images.primary.as_deref(),
            Some("https://site.test/img.png")
        );
        assert_eq!(record.icons.primary, "https://site.test/fav.ico");
        assert_eq!(record.metadata.structure.lang.as_deref(), Some("en"));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let doc = DocView::parse(PAGE);
        let base = Url::parse("https://site.test/page").unwrap();
        let opts = ExtractOptions { extended: true };

        let first = extract_record(&doc, &base, Vec::new(), None, &opts);
        let second = extract_record(&doc, &base, Vec::new(), None, &opts);

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_no_icons_falls_back_to_favicon() {
        let doc = DocView::parse("<html><head></head><body></body></html>");
        let base = Url::parse("https://site.test/page").unwrap();
        let record = extract_record(&doc, &base, Vec::new(), None, &ExtractOptions::default());
        assert_eq!(record.icons.primary, "https://site.test/favicon.ico");
        assert_eq!(record.icons.count, 0);
    }

    #[test]
    fn test_manifest_icons_outrank_plain_links() {
        let doc = DocView::parse(
            r#"<html><head><link rel="icon" href="/fav.ico" sizes="32x32"></head></html>"#,
        );
        let base = Url::parse("https://site.test/").unwrap();
        let manifest_icons = vec![Candidate {
            url: "/m-512.png".to_string(),
            kind: types::SourceKind::Manifest,
            sizes: Some("512x512".to_string()),
            alt: None,
            purpose: Some("maskable".to_string()),
        }];
        let record =
            extract_record(&doc, &base, manifest_icons, None, &ExtractOptions::default());
        assert_eq!(record.icons.primary, "https://site.test/m-512.png");
        assert_eq!(record.icons.count, 2);
        assert_eq!(record.icons.all[0].purpose.as_deref(), Some("maskable"));
    }
}
