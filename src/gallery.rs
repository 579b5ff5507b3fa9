//! The presentation model handed to the front end.
//!
//! A [`Gallery`] is built once per load cycle from the orchestrator's result.
//! It serializes to JSON for an external presenter, or renders itself as a
//! plain-text listing via [`Gallery::text`].

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;

use crate::article::{build_articles, ResolvedArticle};
use crate::feed::{AllSourcesFailedError, LoadedFeed};
use crate::images::{CandidateScanner, ImageResolver};
use crate::util::{html_to_text, strip_control_chars, truncate_to_width};

pub const FETCH_FAILED_MESSAGE: &str =
    "Failed to fetch any RSS feed. Please check your internet connection and try again.";

const DEFAULT_TITLE: &str = "RSS Feed";
const DEFAULT_DESCRIPTION: &str = "Latest news and updates";
const NO_DESCRIPTION: &str = "No description available";
const NO_DATE: &str = "Date not available";
const NO_ARTICLES: &str = "No articles found in the RSS feed.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gallery {
    pub title: String,
    pub description: String,
    /// URL of the feed that was actually used
    pub source_url: Option<String>,
    pub used_fallback: bool,
    /// "Using fallback feed: ..." when a fallback supplied the articles
    pub fallback_notice: Option<String>,
    pub articles: Vec<ResolvedArticle>,
    /// User-facing message when no feed could be loaded
    pub error: Option<String>,
}

impl Gallery {
    pub fn build<S: CandidateScanner>(
        loaded: Result<LoadedFeed, AllSourcesFailedError>,
        images: &ImageResolver<S>,
        max_items: usize,
    ) -> Self {
        match loaded {
            Ok(loaded) => Self::from_feed(&loaded, images, max_items),
            Err(e) => Self::failed(&e),
        }
    }

    pub fn from_feed<S: CandidateScanner>(
        loaded: &LoadedFeed,
        images: &ImageResolver<S>,
        max_items: usize,
    ) -> Self {
        let envelope = &loaded.envelope;
        let used_fallback = loaded.used_fallback();

        Self {
            title: or_default(&envelope.title, DEFAULT_TITLE),
            description: or_default(&envelope.description, DEFAULT_DESCRIPTION),
            source_url: Some(loaded.used_source.url.clone()),
            used_fallback,
            fallback_notice: used_fallback
                .then(|| format!("Using fallback feed: {}", loaded.used_source.url)),
            articles: build_articles(envelope, images, max_items),
            error: None,
        }
    }

    pub fn failed(e: &AllSourcesFailedError) -> Self {
        tracing::debug!(error = %e, "Rendering fetch failure");
        Self {
            title: DEFAULT_TITLE.to_owned(),
            description: String::new(),
            source_url: None,
            used_fallback: false,
            fallback_notice: None,
            articles: Vec::new(),
            error: Some(FETCH_FAILED_MESSAGE.to_owned()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Plain-text listing with descriptions cut to `description_width` columns.
    pub fn text(&self, description_width: usize) -> TextListing<'_> {
        TextListing {
            gallery: self,
            description_width,
        }
    }
}

fn or_default(raw: &str, default: &str) -> String {
    let text = strip_control_chars(&html_to_text(raw)).into_owned();
    if text.is_empty() {
        default.to_owned()
    } else {
        text
    }
}

pub struct TextListing<'a> {
    gallery: &'a Gallery,
    description_width: usize,
}

impl fmt::Display for TextListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let gallery = self.gallery;

        if let Some(error) = &gallery.error {
            return writeln!(f, "Error: {error}");
        }

        writeln!(f, "{}", gallery.title)?;
        if !gallery.description.is_empty() {
            writeln!(f, "{}", gallery.description)?;
        }
        if let Some(notice) = &gallery.fallback_notice {
            writeln!(f, "{notice}")?;
        }
        if gallery.articles.is_empty() {
            writeln!(f)?;
            return writeln!(f, "{NO_ARTICLES}");
        }

        for (idx, article) in gallery.articles.iter().enumerate() {
            writeln!(f)?;
            writeln!(f, "{}. {}", idx + 1, article.title)?;
            writeln!(f, "   {}", article.link)?;
            if let Some(image) = &article.image_url {
                writeln!(f, "   Image: {image}")?;
            }
            let date = article.published.display();
            writeln!(f, "   {}", date.as_deref().unwrap_or(NO_DATE))?;

            let excerpt = if article.description.is_empty() {
                Cow::Borrowed(NO_DESCRIPTION)
            } else {
                truncate_to_width(&article.description, self.description_width)
            };
            writeln!(f, "   {excerpt}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use url::Url;

    use super::*;
    use crate::article::PublishedAt;
    use crate::feed::{FeedEnvelope, FeedSource};

    fn images() -> ImageResolver {
        ImageResolver::new(Url::parse("https://www.vox.com/").unwrap())
    }

    fn loaded(source: FeedSource, title: &str) -> LoadedFeed {
        LoadedFeed {
            envelope: FeedEnvelope {
                title: title.into(),
                description: String::new(),
                source_url: source.url.clone(),
                items: Vec::new(),
            },
            used_source: source,
        }
    }

    fn article(description: &str, published: &str) -> ResolvedArticle {
        ResolvedArticle {
            title: "Headline".into(),
            link: "https://www.vox.com/a".into(),
            description: description.into(),
            published_raw: published.into(),
            published: PublishedAt::parse(published),
            image_url: None,
        }
    }

    #[test]
    fn test_primary_feed_has_no_notice() {
        let gallery = Gallery::build(
            Ok(loaded(FeedSource::primary("https://www.vox.com/rss/index.xml"), "Vox")),
            &images(),
            20,
        );
        assert_eq!(gallery.title, "Vox");
        assert_eq!(gallery.description, DEFAULT_DESCRIPTION);
        assert!(!gallery.used_fallback);
        assert_eq!(gallery.fallback_notice, None);
        assert!(!gallery.is_error());
    }

    #[test]
    fn test_fallback_notice_names_source() {
        let source = FeedSource::fallbacks(["https://feeds.bbci.co.uk/news/rss.xml"]).remove(0);
        let gallery = Gallery::build(Ok(loaded(source, "")), &images(), 20);
        assert_eq!(gallery.title, DEFAULT_TITLE);
        assert!(gallery.used_fallback);
        assert_eq!(
            gallery.fallback_notice.as_deref(),
            Some("Using fallback feed: https://feeds.bbci.co.uk/news/rss.xml")
        );
    }

    #[test]
    fn test_failure_carries_user_message() {
        let gallery = Gallery::build(
            Err(AllSourcesFailedError {
                attempted: 4,
                skipped: 0,
            }),
            &images(),
            20,
        );
        assert!(gallery.is_error());
        assert!(gallery.articles.is_empty());
        assert_eq!(gallery.error.as_deref(), Some(FETCH_FAILED_MESSAGE));
        assert_eq!(gallery.text(120).to_string(), format!("Error: {FETCH_FAILED_MESSAGE}\n"));
    }

    #[test]
    fn test_text_listing() {
        let mut gallery = Gallery::failed(&AllSourcesFailedError {
            attempted: 1,
            skipped: 0,
        });
        gallery.error = None;
        gallery.title = "Vox".into();
        gallery.description = "News".into();
        gallery.articles = vec![
            article("A fairly long description of the story", "Mon, 19 Oct 2026 15:04:00 +0000"),
            article("", ""),
        ];

        let expected = "\
Vox
News

1. Headline
   https://www.vox.com/a
   October 19, 2026 at 3:04 PM
   A fairly...

2. Headline
   https://www.vox.com/a
   Date not available
   No description available
";
        assert_eq!(gallery.text(12).to_string(), expected);
    }

    #[test]
    fn test_text_listing_without_articles() {
        let gallery = Gallery::build(
            Ok(loaded(FeedSource::primary("https://www.vox.com/rss/index.xml"), "Vox")),
            &images(),
            20,
        );
        assert!(!gallery.is_error());
        assert_eq!(
            gallery.text(120).to_string(),
            format!("Vox\n{DEFAULT_DESCRIPTION}\n\n{NO_ARTICLES}\n")
        );
    }

    #[test]
    fn test_json_shape() {
        let gallery = Gallery::build(
            Ok(loaded(FeedSource::primary("https://www.vox.com/rss/index.xml"), "Vox")),
            &images(),
            20,
        );
        let json = serde_json::to_value(&gallery).unwrap();
        assert_eq!(json["title"], "Vox");
        assert_eq!(json["source_url"], "https://www.vox.com/rss/index.xml");
        assert_eq!(json["used_fallback"], false);
        assert!(json["error"].is_null());
        assert!(json["articles"].as_array().unwrap().is_empty());
    }
}
