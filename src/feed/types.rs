//! Normalized feed data shared by the fetcher, parser and image resolver.

use std::collections::BTreeMap;

/// Placeholder link used when an item carries no usable URL.
pub const PLACEHOLDER_LINK: &str = "#";

/// Whether a source is the configured primary feed or one of its fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceRole {
    Primary,
    Fallback,
}

/// One configured feed endpoint. Immutable once built from configuration.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FeedSource {
    pub url: String,
    pub role: SourceRole,
    /// 0 for the primary, 1.. for fallbacks in configured order
    pub priority: usize,
}

impl FeedSource {
    pub fn primary(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            role: SourceRole::Primary,
            priority: 0,
        }
    }

    /// Builds the fallback list, numbering priorities from 1 in list order.
    pub fn fallbacks<I, S>(urls: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        urls.into_iter()
            .enumerate()
            .map(|(idx, url)| Self {
                url: url.into(),
                role: SourceRole::Fallback,
                priority: idx + 1,
            })
            .collect()
    }

    pub fn is_fallback(&self) -> bool {
        self.role == SourceRole::Fallback
    }
}

/// Raw response body handed from the fetcher to the parser.
#[derive(Debug, Clone)]
pub struct RawFeedDocument {
    /// URL the bytes were fetched from
    pub url: String,
    pub bytes: Vec<u8>,
    /// Charset from the `Content-Type` header, if the server declared one
    pub encoding: Option<String>,
}

impl RawFeedDocument {
    pub fn new(url: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            bytes: bytes.into(),
            encoding: None,
        }
    }
}

/// A whole parsed feed: channel metadata plus items in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedEnvelope {
    pub title: String,
    pub description: String,
    pub source_url: String,
    pub items: Vec<FeedItem>,
}

/// Item body fields, ordered by display preference.
///
/// The derived `Ord` is the preference order: description > summary > content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BodyField {
    Description,
    Summary,
    Content,
}

/// Kind of media descriptor attached directly to an item (outside its HTML body).
///
/// The derived `Ord` is the image lookup priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MediaKind {
    Enclosure,
    ItemImage,
    MediaContent,
    MediaThumbnail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHint {
    pub kind: MediaKind,
    pub url: String,
}

/// One article, normalized from either an RSS `<item>` or an Atom `<entry>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    /// Never empty; [`PLACEHOLDER_LINK`] when the source had no link
    pub link: String,
    pub body_fields: BTreeMap<BodyField, String>,
    /// Date text exactly as the feed wrote it; empty when absent
    pub published_raw: String,
    /// Sorted by [`MediaKind`], document order within a kind
    pub media_hints: Vec<MediaHint>,
}

impl FeedItem {
    /// The body text to display, following the description > summary > content preference.
    pub fn preferred_body(&self) -> Option<&str> {
        self.body_fields.values().next().map(String::as_str)
    }

    pub fn body(&self, field: BodyField) -> Option<&str> {
        self.body_fields.get(&field).map(String::as_str)
    }
}
