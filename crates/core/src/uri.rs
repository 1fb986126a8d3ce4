//! Uri model for stored documents
//!
//! A uri is a string key of the form:
//!
//! ```text
//! [host/]prefix/{components|pages|lists|users}/name[/instances/id][@version]
//! ```
//!
//! Uris are constructed from HTTP path + host on every request and are never
//! persisted as an object, only as their string form (the KV key). All
//! functions here are pure and perform no I/O.
//!
//! ## Contract
//!
//! - The segment after `components/` and before the next `/` or `@` is the
//!   *component name*.
//! - A `@`-suffix, if present, is the *version*: `published`, `scheduled`, or
//!   an opaque draft identifier. No validation of version contents — any
//!   string is legal.
//! - Absence of a suffix means "latest/editable".
//! - Same name with a different `@version` suffix is a distinct KV key, not a
//!   mutation of one record.

/// Version suffix marking a published document
pub const PUBLISHED: &str = "published";

/// Version suffix marking a scheduled document
pub const SCHEDULED: &str = "scheduled";

/// Namespace segment for components
pub const COMPONENTS: &str = "components";

/// Namespace segment for pages
pub const PAGES: &str = "pages";

/// Namespace segment for lists
pub const LISTS: &str = "lists";

/// Namespace segment for users
pub const USERS: &str = "users";

/// Parsed view of a uri
///
/// Produced by [`parse`]; borrowed from the input string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUri<'a> {
    /// Site path before the namespace segment, if any
    pub prefix: Option<&'a str>,
    /// Component name, if the uri addresses a component
    pub component_name: Option<&'a str>,
    /// Version suffix after the last `@`, if any
    pub version: Option<&'a str>,
}

/// Parse a uri into its prefix, component name, and version
pub fn parse(uri: &str) -> ParsedUri<'_> {
    ParsedUri {
        prefix: prefix(uri),
        component_name: component(uri),
        version: version(uri),
    }
}

/// Version suffix: the substring after the last `@`, or `None` if no `@`
///
/// Any string is a legal version; no validation is performed.
///
/// # Examples
///
/// ```
/// use amphora_core::uri::version;
///
/// assert_eq!(version("site/components/a/instances/b@published"), Some("published"));
/// assert_eq!(version("site/components/a/instances/b@x1y2"), Some("x1y2"));
/// assert_eq!(version("site/components/a/instances/b"), None);
/// ```
pub fn version(uri: &str) -> Option<&str> {
    uri.rfind('@').map(|idx| &uri[idx + 1..])
}

/// Uri with any `@version` suffix removed
pub fn strip_version(uri: &str) -> &str {
    match uri.rfind('@') {
        Some(idx) => &uri[..idx],
        None => uri,
    }
}

/// Replace (or remove) the version suffix of a uri
///
/// `None` strips any existing suffix; `Some(v)` sets it.
pub fn replace_version(uri: &str, version: Option<&str>) -> String {
    let base = strip_version(uri);
    match version {
        Some(v) => format!("{base}@{v}"),
        None => base.to_string(),
    }
}

/// True if the uri carries exactly the `@published` suffix
pub fn is_published(uri: &str) -> bool {
    version(uri) == Some(PUBLISHED)
}

/// True if the uri carries exactly the `@scheduled` suffix
pub fn is_scheduled(uri: &str) -> bool {
    version(uri) == Some(SCHEDULED)
}

/// Component name: the segment after `components/` and before the next
/// `/`, `@`, or end of string; `None` if the component segment is absent
///
/// # Examples
///
/// ```
/// use amphora_core::uri::component;
///
/// assert_eq!(component("site/components/article/instances/a1"), Some("article"));
/// assert_eq!(component("site/components/article"), Some("article"));
/// assert_eq!(component("site/pages/foo"), None);
/// ```
pub fn component(uri: &str) -> Option<&str> {
    name_in_namespace(uri, COMPONENTS)
}

/// Page name: the pages analogue of [`component`]
pub fn page_name(uri: &str) -> Option<&str> {
    name_in_namespace(uri, PAGES)
}

/// Extract the name following a namespace segment
fn name_in_namespace<'a>(uri: &'a str, namespace: &str) -> Option<&'a str> {
    let start = namespace_offset(uri, namespace)? + namespace.len() + 1;
    let rest = uri.get(start..)?;
    let end = rest.find(['/', '@']).unwrap_or(rest.len());
    let name = &rest[..end];
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Byte offset of a namespace segment, honoring segment boundaries
///
/// Matches `namespace/` either at the start of the uri or preceded by `/`,
/// so a path segment like `fake-components/` never matches.
fn namespace_offset(uri: &str, namespace: &str) -> Option<usize> {
    let needle = format!("{namespace}/");
    let mut search = 0;
    while let Some(rel) = uri[search..].find(&needle) {
        let idx = search + rel;
        if idx == 0 || uri.as_bytes()[idx - 1] == b'/' {
            return Some(idx);
        }
        search = idx + needle.len();
    }
    None
}

/// Site prefix: everything between an optional scheme+host and the
/// `components/` segment, minus the trailing slash
///
/// Returns `None` if there is no `components/` segment or the prefix is
/// empty. A scheme prefix (`http://`) is stripped along with the host
/// before matching, so a bare-host uri with no path before `components/`
/// yields `None` (distinguishing "has site path" vs. "site root").
///
/// # Examples
///
/// ```
/// use amphora_core::uri::prefix;
///
/// assert_eq!(prefix("site/components/a/instances/b"), Some("site"));
/// assert_eq!(prefix("http://host.test/components/a"), None);
/// assert_eq!(prefix("http://host.test/site/components/a"), Some("site"));
/// assert_eq!(prefix("site/pages/foo"), None);
/// ```
pub fn prefix(uri: &str) -> Option<&str> {
    namespace_prefix(uri, COMPONENTS)
}

/// Site prefix of a page uri: the pages analogue of [`prefix`]
///
/// # Examples
///
/// ```
/// use amphora_core::uri::page_prefix;
///
/// assert_eq!(page_prefix("example.com/pages/abc"), Some("example.com"));
/// assert_eq!(page_prefix("example.com/blog/pages/abc"), Some("example.com/blog"));
/// assert_eq!(page_prefix("site/components/a"), None);
/// ```
pub fn page_prefix(uri: &str) -> Option<&str> {
    namespace_prefix(uri, PAGES)
}

fn namespace_prefix<'a>(uri: &'a str, namespace: &str) -> Option<&'a str> {
    let path = strip_scheme_and_host(uri);
    let idx = namespace_offset(path, namespace)?;
    if idx == 0 {
        return None;
    }
    let p = path[..idx].trim_end_matches('/');
    if p.is_empty() {
        None
    } else {
        Some(p)
    }
}

/// Strip a `scheme://host` head, leaving only the path
///
/// Without a scheme the uri is assumed to already be host-relative
/// (the HTTP layer hands us `host/path` keys, where the host is part of
/// the site prefix and stays).
fn strip_scheme_and_host(uri: &str) -> &str {
    if let Some(idx) = uri.find("://") {
        let after_scheme = &uri[idx + 3..];
        match after_scheme.find('/') {
            Some(slash) => &after_scheme[slash + 1..],
            None => "",
        }
    } else {
        uri
    }
}

/// True if the uri addresses the components namespace
pub fn is_component(uri: &str) -> bool {
    namespace_offset(uri, COMPONENTS).is_some()
}

/// True if the uri addresses the pages namespace
pub fn is_page(uri: &str) -> bool {
    namespace_offset(uri, PAGES).is_some()
}

/// True if the uri addresses the lists namespace
pub fn is_list(uri: &str) -> bool {
    namespace_offset(uri, LISTS).is_some()
}

/// True if the uri addresses the users namespace
pub fn is_user(uri: &str) -> bool {
    namespace_offset(uri, USERS).is_some()
}
