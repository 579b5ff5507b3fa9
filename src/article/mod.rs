//! Display-ready articles built from a parsed feed.
//!
//! [`build_articles`] keeps the first `max_items` items in document order,
//! reduces titles and bodies to plain text, parses dates best-effort and
//! resolves one image per article.

mod date;

pub use date::PublishedAt;

use serde::Serialize;

use crate::feed::{FeedEnvelope, FeedItem};
use crate::images::{CandidateScanner, ImageResolver};
use crate::util::{html_to_text, strip_control_chars};

/// Title used when an item has none.
pub const UNTITLED: &str = "No Title";

/// Default cap on articles per cycle.
pub const DEFAULT_MAX_ITEMS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedArticle {
    pub title: String,
    pub link: String,
    /// Plain text of the preferred body; empty when the item had none
    pub description: String,
    pub published_raw: String,
    pub published: PublishedAt,
    pub image_url: Option<String>,
}

impl ResolvedArticle {
    pub fn from_item<S: CandidateScanner>(item: &FeedItem, images: &ImageResolver<S>) -> Self {
        let title = plain_text(&item.title);
        let description = item.preferred_body().map(plain_text).unwrap_or_default();

        Self {
            title: if title.is_empty() { UNTITLED.to_owned() } else { title },
            link: item.link.clone(),
            description,
            published_raw: item.published_raw.clone(),
            published: PublishedAt::parse(&item.published_raw),
            image_url: images.resolve(item).map(String::from),
        }
    }
}

/// Builds at most `max_items` articles, in feed order.
pub fn build_articles<S: CandidateScanner>(
    envelope: &FeedEnvelope,
    images: &ImageResolver<S>,
    max_items: usize,
) -> Vec<ResolvedArticle> {
    let articles: Vec<_> = envelope
        .items
        .iter()
        .take(max_items)
        .map(|item| ResolvedArticle::from_item(item, images))
        .collect();

    tracing::debug!(
        source = %envelope.source_url,
        available = envelope.items.len(),
        built = articles.len(),
        with_images = articles.iter().filter(|a| a.image_url.is_some()).count(),
        "Built articles"
    );
    articles
}

fn plain_text(html: &str) -> String {
    strip_control_chars(&html_to_text(html)).into_owned()
}
