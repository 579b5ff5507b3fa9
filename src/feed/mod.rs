//! Feed loading: fetching, parsing and the fallback chain.
//!
//! - **Fetching** ([`fetcher`]): one HTTP GET per source with timeouts and a size cap
//! - **Parsing** ([`parser`]): RSS 2.0, RSS 1.0 and Atom into a [`FeedEnvelope`]
//! - **Fallback** ([`fallback`]): primary first, then each fallback in order
//!
//! # Example
//!
//! ```ignore
//! use rss_gallery::feed::FallbackOrchestrator;
//!
//! let orchestrator = FallbackOrchestrator::from_config(&config)?;
//! let (primary, fallbacks) = config.sources();
//! let loaded = orchestrator.load(&primary, &fallbacks).await?;
//! println!("{} items from {}", loaded.envelope.items.len(), loaded.used_source.url);
//! ```

mod fallback;
mod fetcher;
mod parser;
mod types;

pub use fallback::{AllSourcesFailedError, FallbackOrchestrator, LoadedFeed};
pub use fetcher::{build_client, FetchError, Fetcher};
pub use parser::{parse_feed, ParseError};
pub use types::{
    BodyField, FeedEnvelope, FeedItem, FeedSource, MediaHint, MediaKind, RawFeedDocument,
    SourceRole, PLACEHOLDER_LINK,
};
