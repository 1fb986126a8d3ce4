//! Site lookup for index sync
//!
//! Page list documents carry the slug of the site a page belongs to.
//! Sites are identified by host plus path; a page URI's prefix is
//! matched against `host + path` (longest match wins) and falls back to
//! a bare host match.

use serde::{Deserialize, Serialize};

/// One configured site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    /// Short identifier used in index documents
    pub slug: String,
    /// Site host, without scheme
    pub host: String,
    /// Path under the host; empty or "/" for the root site
    pub path: String,
}

impl Site {
    /// Create a site
    pub fn new(slug: impl Into<String>, host: impl Into<String>, path: impl Into<String>) -> Self {
        Site {
            slug: slug.into(),
            host: host.into(),
            path: path.into(),
        }
    }

    /// The URI prefix this site owns: host plus path, no trailing slash
    pub fn prefix(&self) -> String {
        let path = self.path.trim_end_matches('/');
        if path.is_empty() || path == "/" {
            self.host.clone()
        } else if path.starts_with('/') {
            format!("{}{}", self.host, path)
        } else {
            format!("{}/{}", self.host, path)
        }
    }
}

/// Resolves URI prefixes to sites
#[derive(Debug, Clone, Default)]
pub struct SiteResolver {
    sites: Vec<Site>,
}

impl SiteResolver {
    /// Build a resolver over a fixed site set
    pub fn new(sites: Vec<Site>) -> Self {
        SiteResolver { sites }
    }

    /// Find the site whose prefix matches the given URI prefix,
    /// preferring the longest match
    pub fn by_prefix(&self, prefix: &str) -> Option<&Site> {
        self.sites
            .iter()
            .filter(|site| {
                let p = site.prefix();
                prefix == p || prefix.starts_with(&format!("{p}/"))
            })
            .max_by_key(|site| site.prefix().len())
    }

    /// Find a site by bare host
    pub fn by_host(&self, host: &str) -> Option<&Site> {
        self.sites.iter().find(|site| site.host == host)
    }

    /// Resolve a URI prefix to a site: longest prefix match first, then
    /// the host portion alone
    pub fn resolve(&self, prefix: &str) -> Option<&Site> {
        if let Some(site) = self.by_prefix(prefix) {
            return Some(site);
        }
        let host = prefix.split('/').next().unwrap_or(prefix);
        self.by_host(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> SiteResolver {
        SiteResolver::new(vec![
            Site::new("main", "example.com", "/"),
            Site::new("sub", "example.com", "/blog"),
            Site::new("other", "other.com", ""),
        ])
    }

    #[test]
    fn test_prefix_builds_host_and_path() {
        assert_eq!(Site::new("a", "h.com", "/").prefix(), "h.com");
        assert_eq!(Site::new("a", "h.com", "").prefix(), "h.com");
        assert_eq!(Site::new("a", "h.com", "/blog").prefix(), "h.com/blog");
        assert_eq!(Site::new("a", "h.com", "blog/").prefix(), "h.com/blog");
    }

    #[test]
    fn test_longest_prefix_wins() {
        let r = resolver();
        assert_eq!(r.resolve("example.com/blog").unwrap().slug, "sub");
        assert_eq!(r.resolve("example.com/blog/extra").unwrap().slug, "sub");
        assert_eq!(r.resolve("example.com").unwrap().slug, "main");
    }

    #[test]
    fn test_host_fallback() {
        let r = resolver();
        assert_eq!(r.resolve("other.com/whatever").unwrap().slug, "other");
    }

    #[test]
    fn test_unknown_prefix_is_none() {
        assert!(resolver().resolve("unknown.net").is_none());
    }
}
