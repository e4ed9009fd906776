//! Resource type classification.
//!
//! # Responsibilities
//! - Map the client's `Accept` preference to a canonical type extension
//! - Append that extension to the destination path
//! - Reject anything whose final extension is not a supported type
//!
//! # Design Decisions
//! - Substring containment, not full media-range parsing
//! - Rules are an ordered table; first match wins
//! - The extension check runs on the final path, so a path that already
//!   carries a supported extension passes without a recognized `Accept`
//! - Query and fragment never reach the canonical endpoint

use std::fmt;

use thiserror::Error;
use url::Url;

/// Resource representations the upstream serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Json,
    Csv,
    Html,
    Tsv,
    Ttl,
}

impl ResourceType {
    pub const ALL: [ResourceType; 5] = [
        ResourceType::Json,
        ResourceType::Csv,
        ResourceType::Html,
        ResourceType::Tsv,
        ResourceType::Ttl,
    ];

    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            ResourceType::Json => "json",
            ResourceType::Csv => "csv",
            ResourceType::Html => "html",
            ResourceType::Tsv => "tsv",
            ResourceType::Ttl => "ttl",
        }
    }

    /// Exact, case-sensitive lookup by extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.extension() == ext)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// `Accept` substrings checked in order. The first rule with any matching
/// needle decides the suffix.
const NEGOTIATION_RULES: &[(&[&str], ResourceType)] = &[
    (&["application/json"], ResourceType::Json),
    (&["text/csv"], ResourceType::Csv),
    (&["text/html"], ResourceType::Html),
    (&["text/tab-separated-values", "text/tsv"], ResourceType::Tsv),
    (&["application/x-turtle", "text/ttl"], ResourceType::Ttl),
];

/// Resource type requested through content negotiation, if any.
pub fn negotiate(accept: &str) -> Option<ResourceType> {
    NEGOTIATION_RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| accept.contains(n)))
        .map(|(_, resource_type)| *resource_type)
}

/// Extension of the last path segment, without the dot. Empty when the
/// segment has no dot.
pub fn path_extension(path: &str) -> &str {
    let segment = path.rsplit('/').next().unwrap_or(path);
    match segment.rfind('.') {
        Some(idx) => &segment[idx + 1..],
        None => "",
    }
}

/// The request could not be mapped to a supported representation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown resource type: {path}")]
pub struct UnsupportedResourceType {
    /// The path after any negotiated suffix was applied.
    pub path: String,
}

/// A destination mapped onto its canonical, extension-suffixed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEndpoint {
    pub resource_type: ResourceType,
    pub endpoint: String,
}

impl ClassifiedEndpoint {
    pub fn as_str(&self) -> &str {
        &self.endpoint
    }

    pub fn into_string(self) -> String {
        self.endpoint
    }
}

/// Classify a destination URL using the client's `Accept` value.
pub fn classify(
    accept: Option<&str>,
    url: &Url,
) -> Result<ClassifiedEndpoint, UnsupportedResourceType> {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);

    let accept = accept.unwrap_or_default();
    tracing::debug!(accept = %accept, path = %url.path(), "Composing resource url");

    if let Some(negotiated) = negotiate(accept) {
        let path = format!("{}.{}", url.path(), negotiated.extension());
        url.set_path(&path);
    }

    match ResourceType::from_extension(path_extension(url.path())) {
        Some(resource_type) => Ok(ClassifiedEndpoint {
            resource_type,
            endpoint: url.into(),
        }),
        None => Err(UnsupportedResourceType {
            path: url.path().to_string(),
        }),
    }
}
