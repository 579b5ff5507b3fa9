use thiserror::Error;
use url::Url;

/// Errors that can occur during URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed as an absolute URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
}

/// Validates that a string is a well-formed absolute HTTP(S) URL.
///
/// Used both for configured feed sources and for image candidates scraped
/// out of feed items, so it deliberately accepts any public or private host:
/// the only requirement is that a browser could load it.
///
/// # Errors
///
/// Returns [`UrlValidationError`] if:
/// - The URL cannot be parsed, including relative URLs ([`UrlValidationError::InvalidUrl`])
/// - The scheme is not `http` or `https` ([`UrlValidationError::UnsupportedScheme`])
/// - The URL has an empty host ([`UrlValidationError::MissingHost`])
///
/// # Examples
///
/// ```
/// use rss_gallery::util::validate_url;
///
/// let url = validate_url("https://example.com/feed.xml").unwrap();
/// assert_eq!(url.host_str(), Some("example.com"));
///
/// assert!(validate_url("images/photo.jpg").is_err());
/// assert!(validate_url("javascript:alert(1)").is_err());
/// ```
pub fn validate_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlValidationError::MissingHost),
    }
}

/// Returns the origin (`scheme://host[:port]/`) of a URL, used as the base for
/// resolving root-relative paths.
pub fn origin_of(url: &Url) -> Option<Url> {
    match url.origin() {
        origin @ url::Origin::Tuple(..) => Url::parse(&origin.ascii_serialization()).ok(),
        url::Origin::Opaque(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_urls() {
        assert!(validate_url("https://example.com/feed.xml").is_ok());
        assert!(validate_url("http://news.example.org").is_ok());
        assert!(validate_url("https://example.com:8443/img/a.png?w=300").is_ok());
    }

    #[test]
    fn test_invalid_schemes() {
        assert!(matches!(
            validate_url("ftp://example.com/a.jpg"),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            validate_url("data:image/png;base64,AAAA"),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_relative_urls_rejected() {
        assert!(matches!(
            validate_url("images/a.jpg"),
            Err(UrlValidationError::InvalidUrl(_))
        ));
        assert!(validate_url("").is_err());
    }

    #[test]
    fn test_local_hosts_accepted() {
        // Mock servers in tests and intranet feeds both live here
        assert!(validate_url("http://127.0.0.1:8080/feed").is_ok());
        assert!(validate_url("http://localhost/feed").is_ok());
    }

    #[test]
    fn test_origin_of_strips_path_and_query() {
        let url = Url::parse("https://www.vox.com/rss/index.xml?x=1").unwrap();
        let origin = origin_of(&url).unwrap();
        assert_eq!(origin.as_str(), "https://www.vox.com/");
    }

    #[test]
    fn test_origin_of_keeps_port() {
        let url = Url::parse("http://127.0.0.1:9000/feed").unwrap();
        assert_eq!(origin_of(&url).unwrap().as_str(), "http://127.0.0.1:9000/");
    }
}
