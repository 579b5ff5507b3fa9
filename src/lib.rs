//! Fetch an RSS or Atom feed with fallbacks and turn it into an image gallery.
//!
//! One load cycle: [`config::Config`] supplies the sources, the
//! [`feed::FallbackOrchestrator`] fetches and parses the first source that
//! works, [`article::build_articles`] resolves text, dates and images for the
//! first items, and [`gallery::Gallery`] is the model handed to a presenter.

pub mod article;
pub mod config;
pub mod feed;
pub mod gallery;
pub mod images;
pub mod util;
