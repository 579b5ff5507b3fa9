//! Image candidates and the HTML scanners that produce them.

use std::sync::LazyLock;

use regex::Regex;

use crate::feed::MediaKind;

/// Where a candidate URL was found. Only used for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    Enclosure,
    MediaExtension,
    ItemImage,
    HtmlSrc,
    HtmlDataSrc,
    HtmlBackground,
}

impl From<MediaKind> for CandidateSource {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Enclosure => Self::Enclosure,
            MediaKind::ItemImage => Self::ItemImage,
            MediaKind::MediaContent | MediaKind::MediaThumbnail => Self::MediaExtension,
        }
    }
}

/// An unvalidated image URL as it appeared in the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    pub url: String,
    pub source: CandidateSource,
}

/// Finds image URLs in an HTML body.
///
/// Implementations append candidates to `out` in their own priority order.
pub trait CandidateScanner {
    fn scan(&self, html: &str, out: &mut Vec<ImageCandidate>);
}

static IMG_SRC_DOUBLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img[^>]+src="([^"]+)""#).expect("Invalid img src pattern")
});

static IMG_SRC_SINGLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<img[^>]+src='([^']+)'").expect("Invalid img src pattern")
});

static DATA_SRC_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)data-src="([^"]+)""#).expect("Invalid data-src pattern"));

static BACKGROUND_IMAGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)background-image:\s*url\(\s*["']?([^"')]+?)["']?\s*\)"#)
        .expect("Invalid background-image pattern")
});

/// Regex-based scanner. Best effort: it reads attribute text, not a DOM, so
/// unusual markup can be missed or misread.
///
/// Patterns run one after another over the whole body, so every
/// double-quoted `<img src>` precedes every single-quoted one, and so on.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexScanner;

impl CandidateScanner for RegexScanner {
    fn scan(&self, html: &str, out: &mut Vec<ImageCandidate>) {
        let patterns: [(&Regex, CandidateSource); 4] = [
            (&IMG_SRC_DOUBLE_PATTERN, CandidateSource::HtmlSrc),
            (&IMG_SRC_SINGLE_PATTERN, CandidateSource::HtmlSrc),
            (&DATA_SRC_PATTERN, CandidateSource::HtmlDataSrc),
            (&BACKGROUND_IMAGE_PATTERN, CandidateSource::HtmlBackground),
        ];

        for (pattern, source) in patterns {
            out.extend(pattern.captures_iter(html).filter_map(|caps| {
                caps.get(1).map(|m| ImageCandidate {
                    url: m.as_str().to_owned(),
                    source,
                })
            }));
        }
    }
}
