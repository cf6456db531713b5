use serde::{Deserialize, Serialize};

/// Where a candidate value was discovered in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Og,
    Twitter,
    AppleTouchIcon,
    LinkIcon,
    ContentImage,
    Manifest,
}

/// An extracted, not-yet-ranked image or icon candidate. The `url` is
/// raw as found in the document; resolution against the base happens in
/// the ranking step, and candidates that fail to resolve are dropped.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub url: String,
    pub kind: SourceKind,
    /// Declared size hint, "WxH" form (possibly space-separated list).
    pub sizes: Option<String>,
    pub alt: Option<String>,
    pub purpose: Option<String>,
}

/// A candidate whose URL resolved against the base document URL.
#[derive(Debug, Clone)]
pub struct ResolvedCandidate {
    pub url: String,
    pub kind: SourceKind,
    pub sizes: Option<String>,
    pub alt: Option<String>,
    pub purpose: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSample {
    pub url: String,
    pub source: SourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Image facet: `count` reflects all resolved candidates, `samples` is
/// capped for display.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFacet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    pub count: usize,
    pub samples: Vec<ImageSample>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconEntry {
    pub url: String,
    pub source: SourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

/// Icon facet: `primary` always holds a value, falling back to the
/// site-root `/favicon.ico`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconFacet {
    pub primary: String,
    pub count: usize,
    pub all: Vec<IconEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// Published/modified timestamps are passed through verbatim; no date
/// parsing or validation happens here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_card: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_site: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fb_app_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppearanceMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub robots: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingGroup {
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub h1: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub h2: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub h3: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frameworks: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headings: Option<HeadingGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataGroups {
    pub basic: BasicMeta,
    pub dates: DateMeta,
    pub social: SocialMeta,
    pub appearance: AppearanceMeta,
    pub structure: StructureMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseInfo {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
}

/// The final normalized record for one preview request. Assembled once,
/// never mutated afterwards, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    pub success: bool,
    pub url: String,
    pub hostname: String,
    /// Hostname with a single leading `www.` stripped.
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    pub metadata: MetadataGroups,
    pub images: ImageFacet,
    pub icons: IconFacet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_info: Option<ResponseInfo>,
}
