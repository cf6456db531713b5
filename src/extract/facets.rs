use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Selector;

use crate::extract::doc::DocView;
use crate::extract::types::{
    AppearanceMeta, BasicMeta, DateMeta, HeadingGroup, SocialMeta, StructureMeta,
};

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static H1_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static H2_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").unwrap());
static H3_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h3").unwrap());
static P_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static CHARSET_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[charset]").unwrap());
static SCRIPT_SRC_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script[src]").unwrap());

const EXCERPT_MAX_CHARS: usize = 300;
const HEADINGS_PER_LEVEL: usize = 5;

/// Title fallback chain: OG, twitter card, `<title>`, first h1, first
/// h2, OG site name. First non-empty wins.
pub fn title(doc: &DocView) -> Option<String> {
    doc.meta_first(&["og:title", "twitter:title"])
        .or_else(|| doc.first_text(&TITLE_SELECTOR))
        .or_else(|| doc.first_text(&H1_SELECTOR))
        .or_else(|| doc.first_text(&H2_SELECTOR))
        .or_else(|| doc.meta_first(&["og:site_name"]))
}

pub fn description(doc: &DocView) -> Option<String> {
    doc.meta_first(&["og:description", "twitter:description", "description", "Description"])
}

pub fn site_name(doc: &DocView) -> Option<String> {
    doc.meta_first(&["og:site_name", "application-name"])
}

fn keywords(doc: &DocView) -> Option<Vec<String>> {
    let raw = doc.meta_first(&["keywords", "Keywords"])?;
    let list: Vec<String> = raw
        .split(',')
        .map(|word| word.trim().to_string())
        .filter(|word| !word.is_empty())
        .collect();
    (!list.is_empty()).then_some(list)
}

fn canonical_url(doc: &DocView) -> Option<String> {
    doc.links_with_rel("canonical")
        .first()
        .map(|link| link.href.clone())
        .or_else(|| doc.meta_first(&["og:url"]))
}

pub fn basic(doc: &DocView) -> BasicMeta {
    BasicMeta {
        canonical_url: canonical_url(doc),
        keywords: keywords(doc),
        author: doc.meta_first(&["author", "article:author"]),
        publisher: doc.meta_first(&["publisher", "article:publisher"]),
        content_type: doc.meta_first(&["og:type"]),
        locale: doc.meta_first(&["og:locale"]),
    }
}

/// Timestamps are passthrough strings; nothing here parses dates.
pub fn dates(doc: &DocView) -> DateMeta {
    DateMeta {
        published: doc.meta_first(&["article:published_time", "og:article:published_time", "date"]),
        modified: doc.meta_first(&["article:modified_time", "og:updated_time"]),
    }
}

pub fn social(doc: &DocView) -> SocialMeta {
    SocialMeta {
        twitter_card: doc.meta_first(&["twitter:card"]),
        twitter_site: doc.meta_first(&["twitter:site"]),
        twitter_creator: doc.meta_first(&["twitter:creator"]),
        fb_app_id: doc.meta_first(&["fb:app_id"]),
    }
}

pub fn appearance(doc: &DocView, extended: bool) -> AppearanceMeta {
    let mut meta = AppearanceMeta {
        theme_color: doc.meta_first(&["theme-color"]),
        ..Default::default()
    };

    if extended {
        meta.charset = doc.first_attr(&CHARSET_SELECTOR, "charset");
        meta.viewport = doc.meta_first(&["viewport"]);
        meta.robots = doc.meta_first(&["robots"]);
    }

    meta
}

/// (substring to look for in a script src, framework label)
const SCRIPT_SIGNATURES: &[(&str, &str)] = &[
    ("react", "react"),
    ("next", "nextjs"),
    ("nuxt", "nuxt"),
    ("vue", "vue"),
    ("angular", "angular"),
    ("svelte", "svelte"),
    ("jquery", "jquery"),
    ("wp-content", "wordpress"),
    ("wp-includes", "wordpress"),
];

// Leading product name of a generator string ("Hugo 0.118.2" -> "Hugo")
static GENERATOR_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*").unwrap());

/// Best-effort framework signatures from the generator meta and script
/// src attributes. Order of discovery, deduplicated.
fn frameworks(doc: &DocView, generator: Option<&str>) -> Option<Vec<String>> {
    let mut found: Vec<String> = Vec::new();

    if let Some(generator) = generator {
        if let Some(matched) = GENERATOR_NAME.find(generator.trim()) {
            let name = matched.as_str().trim().to_lowercase();
            if !name.is_empty() {
                found.push(name);
            }
        }
    }

    for element in doc.select(&SCRIPT_SRC_SELECTOR) {
        let src = element.attr("src").unwrap_or_default().to_lowercase();
        for (needle, label) in SCRIPT_SIGNATURES {
            if src.contains(needle) && !found.iter().any(|f| f == label) {
                found.push((*label).to_string());
            }
        }
    }

    (!found.is_empty()).then_some(found)
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    text.chars().take(max).collect()
}

fn headings(doc: &DocView) -> Option<HeadingGroup> {
    let mut group = HeadingGroup {
        h1: doc.all_texts(&H1_SELECTOR),
        h2: doc.all_texts(&H2_SELECTOR),
        h3: doc.all_texts(&H3_SELECTOR),
    };
    group.h1.truncate(HEADINGS_PER_LEVEL);
    group.h2.truncate(HEADINGS_PER_LEVEL);
    group.h3.truncate(HEADINGS_PER_LEVEL);

    (!group.h1.is_empty() || !group.h2.is_empty() || !group.h3.is_empty()).then_some(group)
}

fn excerpt(doc: &DocView) -> Option<String> {
    doc.first_text(&P_SELECTOR)
        .map(|text| truncate_chars(&text, EXCERPT_MAX_CHARS))
}

pub fn structure(doc: &DocView, extended: bool) -> StructureMeta {
    let generator = doc.meta_first(&["generator"]);

    let mut meta = StructureMeta {
        lang: doc.lang(),
        generator: generator.clone(),
        ..Default::default()
    };

    if extended {
        meta.frameworks = frameworks(doc, generator.as_deref());
        meta.headings = headings(doc);
        meta.excerpt = excerpt(doc);
    }

    meta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head(meta_tags: &str, body: &str) -> DocView {
        DocView::parse(&format!(
            "<html><head>{meta_tags}</head><body>{body}</body></html>"
        ))
    }

    #[test]
    fn test_title_prefers_og() {
        let doc = head(
            r#"<meta property="og:title" content="OG"><title>Plain</title>"#,
            "<h1>Heading</h1>",
        );
        assert_eq!(title(&doc).as_deref(), Some("OG"));
    }

    #[test]
    fn test_title_falls_through_to_h1() {
        let doc = head("", "<h1>  Heading Title </h1>");
        assert_eq!(title(&doc).as_deref(), Some("Heading Title"));
    }

    #[test]
    fn test_title_falls_through_to_h2_then_site_name() {
        let doc = head("", "<h2>Second Level</h2>");
        assert_eq!(title(&doc).as_deref(), Some("Second Level"));

        let doc = head(r#"<meta property="og:site_name" content="The Site">"#, "");
        assert_eq!(title(&doc).as_deref(), Some("The Site"));
    }

    #[test]
    fn test_description_chain() {
        let doc = head(
            r#"<meta name="description" content="plain">
               <meta name="twitter:description" content="tw">"#,
            "",
        );
        assert_eq!(description(&doc).as_deref(), Some("tw"));
    }

    #[test]
    fn test_keywords_split_and_trimmed() {
        let doc = head(r#"<meta name="keywords" content="rust, web , , preview">"#, "");
        assert_eq!(
            basic(&doc).keywords,
            Some(vec!["rust".to_string(), "web".to_string(), "preview".to_string()])
        );
    }

    #[test]
    fn test_keywords_omitted_when_empty() {
        let doc = head(r#"<meta name="keywords" content=" , ,">"#, "");
        assert!(basic(&doc).keywords.is_none());
    }

    #[test]
    fn test_canonical_link_preferred_over_og_url() {
        let doc = head(
            r#"<link rel="canonical" href="https://example.com/canon">
               <meta property="og:url" content="https://example.com/og">"#,
            "",
        );
        assert_eq!(
            basic(&doc).canonical_url.as_deref(),
            Some("https://example.com/canon")
        );
    }

    #[test]
    fn test_dates_passthrough() {
        let doc = head(
            r#"<meta property="article:published_time" content="not-a-real-date">"#,
            "",
        );
        assert_eq!(dates(&doc).published.as_deref(), Some("not-a-real-date"));
    }

    #[test]
    fn test_social_scalars() {
        let doc = head(
            r#"<meta name="twitter:card" content="summary_large_image">
               <meta name="twitter:site" content="@site">
               <meta property="fb:app_id" content="12345">"#,
            "",
        );
        let social = social(&doc);
        assert_eq!(social.twitter_card.as_deref(), Some("summary_large_image"));
        assert_eq!(social.twitter_site.as_deref(), Some("@site"));
        assert_eq!(social.fb_app_id.as_deref(), Some("12345"));
        assert!(social.twitter_creator.is_none());
    }

    #[test]
    fn test_extended_gates_appearance_passthrough() {
        let doc = head(
            r#"<meta charset="utf-8"><meta name="viewport" content="width=device-width">"#,
            "",
        );
        assert!(appearance(&doc, false).viewport.is_none());
        let extended = appearance(&doc, true);
        assert_eq!(extended.charset.as_deref(), Some("utf-8"));
        assert_eq!(extended.viewport.as_deref(), Some("width=device-width"));
    }

    #[test]
    fn test_framework_detection_from_scripts() {
        let doc = DocView::parse(
            r#"<html><head>
                <script src="/assets/react.production.min.js"></script>
                <script src="/wp-content/themes/x/app.js"></script>
            </head><body></body></html>"#,
        );
        let meta = structure(&doc, true);
        let frameworks = meta.frameworks.unwrap();
        assert!(frameworks.contains(&"react".to_string()));
        assert!(frameworks.contains(&"wordpress".to_string()));
    }

    #[test]
    fn test_generator_feeds_frameworks() {
        let doc = head(r#"<meta name="generator" content="Hugo 0.118.2">"#, "");
        let meta = structure(&doc, true);
        assert_eq!(meta.generator.as_deref(), Some("Hugo 0.118.2"));
        assert_eq!(meta.frameworks.unwrap()[0], "hugo");
    }

    #[test]
    fn test_excerpt_capped() {
        let long = "x".repeat(500);
        let doc = head("", &format!("<p>{long}</p>"));
        let meta = structure(&doc, true);
        assert_eq!(meta.excerpt.unwrap().chars().count(), EXCERPT_MAX_CHARS);
    }

    #[test]
    fn test_headings_by_level() {
        let doc = head("", "<h1>One</h1><h2>Two A</h2><h2>Two B</h2>");
        let headings = structure(&doc, true).headings.unwrap();
        assert_eq!(headings.h1, vec!["One"]);
        assert_eq!(headings.h2, vec!["Two A", "Two B"]);
        assert!(headings.h3.is_empty());
    }
}
