//! Representative-image selection for feed items.
//!
//! [`ImageResolver`] gathers candidates from media descriptors and HTML
//! bodies, then keeps the first one that normalizes to an absolute image URL.
//! HTML scanning sits behind [`CandidateScanner`]; [`RegexScanner`] is the
//! default.

mod candidates;
mod resolver;

pub use candidates::{CandidateScanner, CandidateSource, ImageCandidate, RegexScanner};
pub use resolver::ImageResolver;
