use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static META_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("meta").unwrap());
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("link").unwrap());
static HTML_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("html").unwrap());

/// A `<link>` element, as much of it as extraction cares about.
#[derive(Debug, Clone)]
pub struct LinkEntry {
    pub rel: String,
    pub href: String,
    pub sizes: Option<String>,
}

/// Read-only view over one parsed document. Built once per request and
/// discarded after extraction; extractors only ever read from it.
///
/// Meta tags are collected in a single pass, keyed by `name` falling
/// back to `property`, preserving document order.
pub struct DocView {
    doc: Html,
    metas: Vec<(String, String)>,
    links: Vec<LinkEntry>,
}

impl DocView {
    pub fn parse(html: &str) -> Self {
        let doc = Html::parse_document(html);

        let mut metas = Vec::new();
        for element in doc.select(&META_SELECTOR) {
            let prop = element.attr("property").unwrap_or_default();
            let key = element.attr("name").unwrap_or(prop);
            let value = element.attr("content").unwrap_or_default();
            if !key.is_empty() && !value.is_empty() {
                metas.push((key.to_string(), value.to_string()));
            }
        }

        let mut links = Vec::new();
        for element in doc.select(&LINK_SELECTOR) {
            let rel = element.attr("rel").unwrap_or_default();
            let href = element.attr("href").unwrap_or_default();
            if rel.is_empty() || href.is_empty() {
                continue;
            }
            links.push(LinkEntry {
                rel: rel.to_ascii_lowercase(),
                href: href.to_string(),
                sizes: element.attr("sizes").map(|s| s.to_string()),
            });
        }

        Self { doc, metas, links }
    }

    /// First non-empty meta value, trying `keys` in priority order.
    pub fn meta_first(&self, keys: &[&str]) -> Option<String> {
        for key in keys {
            for (name, value) in &self.metas {
                if name.eq_ignore_ascii_case(key) {
                    let trimmed = value.trim();
                    if !trimmed.is_empty() {
                        return Some(trimmed.to_string());
                    }
                }
            }
        }
        None
    }

    /// All non-empty meta values for any of `keys`, in document order.
    pub fn meta_all(&self, keys: &[&str]) -> Vec<String> {
        self.metas
            .iter()
            .filter(|(name, _)| keys.iter().any(|key| name.eq_ignore_ascii_case(key)))
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .collect()
    }

    /// Links whose rel list contains `token` (e.g. "icon", "manifest").
    pub fn links_with_rel(&self, token: &str) -> Vec<&LinkEntry> {
        self.links
            .iter()
            .filter(|link| link.rel.split_whitespace().any(|rel| rel.contains(token)))
            .collect()
    }

    /// Trimmed text of the first element matching `selector`.
    pub fn first_text(&self, selector: &Selector) -> Option<String> {
        self.doc.select(selector).next().and_then(|element| {
            let text = element.text().collect::<String>();
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
    }

    /// Trimmed texts of every element matching `selector`.
    pub fn all_texts(&self, selector: &Selector) -> Vec<String> {
        self.doc
            .select(selector)
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
            .collect()
    }

    /// Attribute of the first element matching `selector`.
    pub fn first_attr(&self, selector: &Selector, attr: &str) -> Option<String> {
        self.doc
            .select(selector)
            .find_map(|element| element.attr(attr))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// `lang` attribute of the root `<html>` element.
    pub fn lang(&self) -> Option<String> {
        self.first_attr(&HTML_SELECTOR, "lang")
    }

    pub fn select<'a, 'b>(&'a self, selector: &'b Selector) -> scraper::html::Select<'a, 'b> {
        self.doc.select(selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_priority_order_beats_document_order() {
        let view = DocView::parse(
            r#"<html><head>
                <meta name="twitter:title" content="Twitter Title">
                <meta property="og:title" content="OG Title">
            </head></html>"#,
        );
        assert_eq!(
            view.meta_first(&["og:title", "twitter:title"]).as_deref(),
            Some("OG Title")
        );
    }

    #[test]
    fn test_meta_all_preserves_document_order() {
        let view = DocView::parse(
            r#"<html><head>
                <meta property="og:image" content="/a.png">
                <meta property="og:image:url" content="/b.png">
                <meta property="og:image" content="/c.png">
            </head></html>"#,
        );
        assert_eq!(
            view.meta_all(&["og:image", "og:image:url"]),
            vec!["/a.png", "/b.png", "/c.png"]
        );
    }

    #[test]
    fn test_empty_meta_content_treated_as_absent() {
        let view = DocView::parse(
            r#"<html><head><meta property="og:title" content="   "></head></html>"#,
        );
        assert!(view.meta_first(&["og:title"]).is_none());
    }

    #[test]
    fn test_links_with_rel() {
        let view = DocView::parse(
            r#"<html><head>
                <link rel="shortcut icon" href="/fav.ico">
                <link rel="stylesheet" href="/style.css">
                <link rel="apple-touch-icon" href="/apple.png" sizes="152x152">
            </head></html>"#,
        );
        let icons = view.links_with_rel("icon");
        assert_eq!(icons.len(), 2);
        assert_eq!(icons[0].href, "/fav.ico");
        assert_eq!(icons[1].sizes.as_deref(), Some("152x152"));
    }

    #[test]
    fn test_lang_attribute() {
        let view = DocView::parse(r#"<html lang="en-US"><head></head></html>"#);
        assert_eq!(view.lang().as_deref(), Some("en-US"));
    }
}
