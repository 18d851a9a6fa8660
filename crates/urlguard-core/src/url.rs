//! `UrlContext`, `UrlValue`, and the IP-literal parser external primitive
//! (spec §4.4, §6).

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use crate::error::ResolverError;
use crate::resolver::{self, BaseUrl};
use crate::scheme::{PartRanges, SchemeRegistry};
use crate::verdict::CornerCaseSet;

/// RFC 2606 guarantees `example.org` will never be assigned; used as the
/// default base host so an inherited authority is syntactically
/// distinguishable from one the reference supplied itself.
pub const PLACEHOLDER_HOST: &str = "example.org.";
const DEFAULT_BASE_URL: &str = "http://example.org./";

/// `(registry, baseUrl)` (spec §6). Construction eagerly validates that the
/// base parses as absolute and hierarchical.
#[derive(Clone)]
pub struct UrlContext {
    registry: Arc<SchemeRegistry>,
    base: Arc<BaseUrl>,
}

impl UrlContext {
    /// The default context: `http://example.org./` against the built-in
    /// scheme registry.
    pub fn default_context() -> Self {
        Self::new(Arc::new(SchemeRegistry::with_builtins()), DEFAULT_BASE_URL)
            .expect("the built-in default base url must always parse")
    }

    pub fn new(registry: Arc<SchemeRegistry>, base_url: &str) -> Result<Self, ResolverError> {
        let colon = resolver::end_of_scheme(base_url)
            .ok_or_else(|| ResolverError::BaseMissingScheme(base_url.to_string()))?;
        let scheme_name = &base_url[..colon];
        let scheme = registry.lookup(scheme_name);
        if !scheme.is_hierarchical {
            return Err(ResolverError::BaseNotHierarchical(base_url.to_string(), scheme_name.to_string()));
        }
        let ranges = crate::scheme::decompose(&scheme, base_url, colon + 1, base_url.len())
            .ok_or_else(|| ResolverError::BaseUndecomposable(base_url.to_string()))?;
        if ranges.authority.is_none() {
            return Err(ResolverError::BaseMissingAuthority(base_url.to_string()));
        }
        Ok(Self {
            registry,
            base: Arc::new(BaseUrl { text: base_url.to_string(), scheme, ranges }),
        })
    }

    pub fn registry(&self) -> &SchemeRegistry {
        &self.registry
    }

    pub fn base_text(&self) -> &str {
        &self.base.text
    }
}

/// An immutable, per-evaluation URL: the original reference text, its
/// absolutized form, scheme, part ranges, and the resolution metadata the
/// top-level classifier and its sub-classifiers consult.
#[derive(Clone)]
pub struct UrlValue {
    context: UrlContext,
    original_url_text: String,
    url_text: String,
    scheme: crate::scheme::Scheme,
    ranges: Option<PartRanges>,
    inherits_placeholder_authority: bool,
    path_simplification_reached_roots_parent: bool,
    corner_cases: CornerCaseSet,
}

impl UrlValue {
    pub fn new(context: UrlContext, original_url_text: impl Into<String>) -> Self {
        let original_url_text = original_url_text.into();
        let outcome = resolver::absolutize(&context.registry, &context.base, &original_url_text);

        let placeholder_authority = PartRanges::slice(
            &outcome.url_text,
            outcome.ranges.as_ref().and_then(|r| r.authority),
        );
        let inherits_placeholder_authority =
            !outcome.reference_supplied_authority && placeholder_authority == Some(PLACEHOLDER_HOST);

        Self {
            context,
            original_url_text,
            url_text: outcome.url_text,
            scheme: outcome.scheme,
            ranges: outcome.ranges,
            inherits_placeholder_authority,
            path_simplification_reached_roots_parent: outcome.path_simplification_reached_roots_parent,
            corner_cases: outcome.corner_cases,
        }
    }

    pub fn context(&self) -> &UrlContext {
        &self.context
    }

    pub fn original_url_text(&self) -> &str {
        &self.original_url_text
    }

    pub fn url_text(&self) -> &str {
        &self.url_text
    }

    pub fn scheme(&self) -> &crate::scheme::Scheme {
        &self.scheme
    }

    pub fn ranges(&self) -> Option<&PartRanges> {
        self.ranges.as_ref()
    }

    pub fn inherits_placeholder_authority(&self) -> bool {
        self.inherits_placeholder_authority
    }

    pub fn path_simplification_reached_roots_parent(&self) -> bool {
        self.path_simplification_reached_roots_parent
    }

    pub fn corner_cases(&self) -> CornerCaseSet {
        self.corner_cases
    }

    pub fn authority(&self) -> Option<&str> {
        PartRanges::slice(&self.url_text, self.ranges.as_ref()?.authority)
    }

    pub fn path(&self) -> Option<&str> {
        PartRanges::slice(&self.url_text, self.ranges.as_ref()?.path)
    }

    pub fn query(&self) -> Option<&str> {
        PartRanges::slice(&self.url_text, self.ranges.as_ref()?.query)
    }

    pub fn fragment(&self) -> Option<&str> {
        PartRanges::slice(&self.url_text, self.ranges.as_ref()?.fragment)
    }

    pub fn content(&self) -> Option<&str> {
        PartRanges::slice(&self.url_text, self.ranges.as_ref()?.content)
    }

    pub fn content_media_type(&self) -> Option<&str> {
        PartRanges::slice(&self.url_text, self.ranges.as_ref()?.content_metadata)
    }
}

/// Equality per spec §4.4: `(originalUrlText, context)`. Contexts compare
/// by base text, which is sufficient because a `UrlContext`'s registry is
/// fixed at construction for any given base.
impl PartialEq for UrlValue {
    fn eq(&self, other: &Self) -> bool {
        self.original_url_text == other.original_url_text && self.context.base_text() == other.context.base_text()
    }
}

impl Eq for UrlValue {}

impl std::hash::Hash for UrlValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.original_url_text.hash(state);
        self.context.base_text().hash(state);
    }
}

/// True if `s` looks like a URI IP literal: a bracketed IPv6 address or a
/// dotted-quad IPv4 address.
pub fn is_uri_inet_address(s: &str) -> bool {
    parse_uri_inet_address(s).is_some()
}

/// Parses a URI IP literal. Bracketed `[...]` is parsed as IPv6 (without
/// the brackets); anything else is attempted as IPv4.
pub fn parse_uri_inet_address(s: &str) -> Option<InetAddress> {
    if let Some(inner) = s.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
        inner.parse::<Ipv6Addr>().ok().map(InetAddress::V6)
    } else {
        s.parse::<Ipv4Addr>().ok().map(InetAddress::V4)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InetAddress {
    V4(Ipv4Addr),
    V6(Ipv6Addr),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_base_is_placeholder_host() {
        let ctx = UrlContext::default_context();
        assert_eq!(ctx.base_text(), DEFAULT_BASE_URL);
    }

    #[test]
    fn resolves_relative_reference_against_default_context() {
        let ctx = UrlContext::default_context();
        let value = UrlValue::new(ctx, "/foo");
        assert_eq!(value.url_text(), "http://example.org./foo");
        assert!(value.inherits_placeholder_authority());
    }

    #[test]
    fn absolute_reference_does_not_inherit_placeholder_authority() {
        let ctx = UrlContext::default_context();
        let value = UrlValue::new(ctx, "http://example.com/foo");
        assert!(!value.inherits_placeholder_authority());
        assert_eq!(value.authority(), Some("example.com"));
    }

    #[test]
    fn range_consistency_matches_accessors() {
        let ctx = UrlContext::default_context();
        let value = UrlValue::new(ctx, "http://example.com/a/b?q=1#frag");
        let ranges = value.ranges().unwrap();
        assert_eq!(PartRanges::slice(value.url_text(), ranges.authority), value.authority());
        assert_eq!(PartRanges::slice(value.url_text(), ranges.path), value.path());
        assert_eq!(PartRanges::slice(value.url_text(), ranges.query), value.query());
        assert_eq!(PartRanges::slice(value.url_text(), ranges.fragment), value.fragment());
    }

    #[test]
    fn parses_ipv6_literal() {
        assert!(is_uri_inet_address("[::1]"));
        assert_eq!(parse_uri_inet_address("[::1]"), Some(InetAddress::V6(Ipv6Addr::LOCALHOST)));
    }

    #[test]
    fn parses_ipv4_literal() {
        assert!(is_uri_inet_address("127.0.0.1"));
        assert_eq!(parse_uri_inet_address("127.0.0.1"), Some(InetAddress::V4(Ipv4Addr::LOCALHOST)));
    }

    #[test]
    fn rejects_non_ip_host() {
        assert!(!is_uri_inet_address("example.com"));
    }
}
