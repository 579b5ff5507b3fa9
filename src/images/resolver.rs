use url::Url;

use crate::feed::{BodyField, FeedItem};
use crate::images::candidates::{CandidateScanner, ImageCandidate, RegexScanner};
use crate::util::validate_url;

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "svg"];

/// Picks one representative image per feed item.
///
/// Candidates come from the item's media descriptors first, then from its
/// HTML bodies (description, summary, content). The first candidate that
/// normalizes to an image-looking absolute URL wins.
#[derive(Debug, Clone)]
pub struct ImageResolver<S = RegexScanner> {
    /// Origin that root-relative paths are joined against
    base: Url,
    scanner: S,
}

impl ImageResolver<RegexScanner> {
    pub fn new(base: Url) -> Self {
        Self::with_scanner(base, RegexScanner)
    }
}

impl<S: CandidateScanner> ImageResolver<S> {
    pub fn with_scanner(base: Url, scanner: S) -> Self {
        Self { base, scanner }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// All candidates for `item`, in lookup priority order, unvalidated.
    pub fn candidates(&self, item: &FeedItem) -> Vec<ImageCandidate> {
        let mut out: Vec<ImageCandidate> = item
            .media_hints
            .iter()
            .map(|hint| ImageCandidate {
                url: hint.url.clone(),
                source: hint.kind.into(),
            })
            .collect();

        for field in [BodyField::Description, BodyField::Summary, BodyField::Content] {
            if let Some(body) = item.body(field) {
                self.scanner.scan(body, &mut out);
            }
        }
        out
    }

    /// Returns the first acceptable image URL, or `None` when nothing qualifies.
    pub fn resolve(&self, item: &FeedItem) -> Option<Url> {
        let found = self
            .candidates(item)
            .into_iter()
            .find_map(|candidate| self.normalize(&candidate.url).map(|url| (url, candidate.source)));

        match found {
            Some((url, source)) => {
                tracing::debug!(link = %item.link, image = %url, source = ?source, "Resolved article image");
                Some(url)
            }
            None => {
                tracing::debug!(link = %item.link, "No image found for article");
                None
            }
        }
    }

    fn normalize(&self, raw: &str) -> Option<Url> {
        let decoded = html_escape::decode_html_entities(raw);
        let trimmed = decoded.trim();
        if trimmed.is_empty() {
            return None;
        }

        let absolute = if let Some(rest) = trimmed.strip_prefix("//") {
            format!("https://{}", rest)
        } else if trimmed.starts_with('/') {
            self.base.join(trimmed).ok()?.into()
        } else {
            trimmed.to_owned()
        };

        // Keywords are matched case-sensitively on the text as written,
        // before parsing lowercases the host.
        let has_keyword = absolute.contains("image") || absolute.contains("photo");
        let url = validate_url(&absolute).ok()?;
        (has_keyword || has_image_extension(&url)).then_some(url)
    }
}

fn has_image_extension(url: &Url) -> bool {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|last| last.rsplit_once('.'))
        .is_some_and(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
