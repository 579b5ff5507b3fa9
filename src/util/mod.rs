//! Utility functions for common operations.
//!
//! This module provides reusable utilities for:
//!
//! - **URL validation**: well-formedness checks for feed and image URLs
//! - **Text processing**: HTML stripping, control-character removal and
//!   Unicode-aware truncation for the text listing
//!
//! # Examples
//!
//! ```
//! use rss_gallery::util::{html_to_text, truncate_to_width, validate_url};
//!
//! let url = validate_url("https://example.com/feed.xml").unwrap();
//! assert_eq!(url.scheme(), "https");
//!
//! assert_eq!(html_to_text("<p>Tom &amp; Jerry</p>"), "Tom & Jerry");
//! assert_eq!(truncate_to_width("Long article title", 10), "Long ar...");
//! ```

mod text;
mod url_validator;

pub use text::{display_width, html_to_text, strip_control_chars, truncate_to_width};
pub use url_validator::{origin_of, validate_url, UrlValidationError};
