//! Target URL validation.
//!
//! Only absolute `http`/`https` URLs are fetched. Everything else (`file:`,
//! `data:`, `ftp:`, `javascript:`...) is refused before a socket is opened.

use url::Url;

use crate::error::{RelayError, RelayResult};

/// A target URL that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUrl {
    url: Url,
    origin: String,
}

impl ValidatedUrl {
    /// The full parsed URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The target's own origin, sent upstream as `Referer`.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

/// Validate the raw `url` query parameter.
pub fn validate(raw: Option<&str>) -> RelayResult<ValidatedUrl> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty());
    let raw = raw.ok_or(RelayError::MissingParameter)?;

    let url = Url::parse(raw).map_err(|_| RelayError::MalformedUrl)?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(RelayError::UnsupportedScheme(other.to_string())),
    }

    let origin = url.origin().ascii_serialization();
    Ok(ValidatedUrl { url, origin })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing() {
        assert!(matches!(validate(None), Err(RelayError::MissingParameter)));
        assert!(matches!(validate(Some("")), Err(RelayError::MissingParameter)));
        assert!(matches!(validate(Some("   ")), Err(RelayError::MissingParameter)));
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(validate(Some("not a url")), Err(RelayError::MalformedUrl)));
        assert!(matches!(
            validate(Some("/images/cat.png")),
            Err(RelayError::MalformedUrl)
        ));
        assert!(matches!(validate(Some("http://")), Err(RelayError::MalformedUrl)));
    }

    #[test]
    fn test_rejects_other_schemes() {
        for raw in [
            "file:///etc/passwd",
            "data:image/png;base64,iVBORw0KGgo=",
            "ftp://files.example.com/cat.png",
            "javascript:alert(1)",
            "gopher://example.com/",
        ] {
            match validate(Some(raw)) {
                Err(RelayError::UnsupportedScheme(_)) => {}
                other => panic!("{} should be rejected, got {:?}", raw, other),
            }
        }
    }

    #[test]
    fn test_accepts_http_and_https() {
        let v = validate(Some("https://cdn.example.com:8443/a/b.png?size=large")).unwrap();
        assert_eq!(v.origin(), "https://cdn.example.com:8443");
        assert_eq!(v.as_str(), "https://cdn.example.com:8443/a/b.png?size=large");

        let v = validate(Some("HTTP://Images.Example.com/x.gif")).unwrap();
        assert_eq!(v.url().scheme(), "http");
        assert_eq!(v.origin(), "http://images.example.com");
    }
}
