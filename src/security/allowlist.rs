//! Origin allowlist.
//!
//! Built once from configuration and never mutated afterwards. Matching is
//! exact string equality on the normalized `scheme://host[:port]` form; there
//! is no wildcard or suffix matching. An empty list allows nothing.

use url::Url;

/// Normalize a URL-ish string to its ASCII origin (`scheme://host[:port]`).
///
/// Default ports are elided and the host is lowercased. Returns `None` for
/// anything that is not an absolute http/https URL.
pub fn normalize_origin(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    web_origin(&url)
}

/// ASCII origin of an already parsed URL, if its scheme is http or https.
pub fn web_origin(url: &Url) -> Option<String> {
    match url.scheme() {
        "http" | "https" => {}
        _ => return None,
    }
    let origin = url.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

/// The set of origins permitted to use the relay.
#[derive(Debug, Clone, Default)]
pub struct OriginAllowlist {
    /// Normalized origins in configuration order.
    origins: Vec<String>,
}

impl OriginAllowlist {
    /// Build the allowlist from configured origin strings.
    ///
    /// Entries that do not normalize are skipped with a warning; config
    /// validation rejects them before this point in a normal startup.
    pub fn new<I, S>(configured: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut origins: Vec<String> = Vec::new();
        for raw in configured {
            let raw = raw.as_ref();
            match normalize_origin(raw) {
                Some(origin) if !origins.contains(&origin) => origins.push(origin),
                Some(_) => {}
                None => tracing::warn!(origin = %raw, "Ignoring unparseable allowed origin"),
            }
        }
        Self { origins }
    }

    /// Returns true if the normalized origin is a member.
    pub fn is_allowed(&self, origin: &str) -> bool {
        self.origins.iter().any(|o| o == origin)
    }

    /// The first configured origin, used as the CORS fallback value.
    pub fn first(&self) -> Option<&str> {
        self.origins.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_origin() {
        assert_eq!(
            normalize_origin("https://App.Example.com/gallery?x=1").as_deref(),
            Some("https://app.example.com")
        );
        assert_eq!(
            normalize_origin("http://localhost:5173/").as_deref(),
            Some("http://localhost:5173")
        );
        assert_eq!(
            normalize_origin("https://example.com:443").as_deref(),
            Some("https://example.com")
        );
        assert_eq!(normalize_origin("null"), None);
        assert_eq!(normalize_origin("file:///etc/passwd"), None);
        assert_eq!(normalize_origin("example.com"), None);
    }

    #[test]
    fn test_empty_allows_nothing() {
        let list = OriginAllowlist::new(Vec::<String>::new());
        assert!(list.is_empty());
        assert!(!list.is_allowed("https://example.com"));
        assert!(!list.is_allowed("*"));
        assert_eq!(list.first(), None);
    }

    #[test]
    fn test_exact_match_only() {
        let list = OriginAllowlist::new(["https://example.com/", "http://localhost:3000"]);
        assert!(list.is_allowed("https://example.com"));
        assert!(list.is_allowed("http://localhost:3000"));
        assert!(!list.is_allowed("https://sub.example.com"));
        assert!(!list.is_allowed("http://example.com"));
        assert!(!list.is_allowed("https://example.com.evil.net"));
        assert!(!list.is_allowed("http://localhost:3001"));
    }

    #[test]
    fn test_order_and_dedup() {
        let list = OriginAllowlist::new([
            "https://b.example.com",
            "https://a.example.com",
            "https://b.example.com/path",
            "garbage",
        ]);
        assert_eq!(list.len(), 2);
        assert_eq!(list.first(), Some("https://b.example.com"));
    }
}
