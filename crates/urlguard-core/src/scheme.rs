//! The per-scheme structural descriptor, registry, and decompose/recompose
//! contract (spec §3, §4.2).

use std::collections::HashMap;

bitflags::bitflags! {
    /// Structural parts a scheme "naturally" carries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SchemeParts: u8 {
        const AUTHORITY = 1 << 0;
        const PATH = 1 << 1;
        const QUERY = 1 << 2;
        const CONTENT = 1 << 3;
    }
}

/// An immutable per-scheme structural descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheme {
    pub name: String,
    pub is_hierarchical: bool,
    /// -1 if the scheme has no default port.
    pub default_port: i32,
    pub parts: SchemeParts,
}

impl Scheme {
    pub fn naturally_has_authority(&self) -> bool {
        self.parts.contains(SchemeParts::AUTHORITY)
    }

    pub fn naturally_has_path(&self) -> bool {
        self.parts.contains(SchemeParts::PATH)
    }

    pub fn naturally_has_query(&self) -> bool {
        self.parts.contains(SchemeParts::QUERY)
    }

    pub fn naturally_has_content(&self) -> bool {
        self.parts.contains(SchemeParts::CONTENT)
    }

    fn hierarchical(name: &str, default_port: i32) -> Self {
        Self {
            name: name.to_string(),
            is_hierarchical: true,
            default_port,
            parts: SchemeParts::AUTHORITY | SchemeParts::PATH | SchemeParts::QUERY,
        }
    }

    fn opaque(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_hierarchical: false,
            default_port: -1,
            parts: SchemeParts::CONTENT,
        }
    }

    /// The sentinel scheme used for unrecognized scheme names: hierarchical,
    /// carries authority/path/query, no default port.
    pub fn unknown() -> Self {
        Self::hierarchical("", -1)
    }
}

/// Maps lowercase scheme names to [`Scheme`] descriptors. Built-ins are
/// compiled in; callers may register additional schemes, which are merged
/// by name (a later registration for the same name replaces the earlier
/// one).
#[derive(Debug, Clone)]
pub struct SchemeRegistry {
    schemes: HashMap<String, Scheme>,
}

impl SchemeRegistry {
    pub fn with_builtins() -> Self {
        let mut registry = Self { schemes: HashMap::new() };
        registry.register(Scheme::hierarchical("http", 80));
        registry.register(Scheme::hierarchical("https", 443));
        registry.register(Scheme::hierarchical("ftp", 21));
        registry.register(Scheme::hierarchical("file", -1));
        registry.register(Scheme::hierarchical("blob", -1));
        registry.register(Scheme::opaque("data"));
        registry.register(Scheme::opaque("javascript"));
        registry.register(Scheme::opaque("mailto"));
        registry.register(Scheme::opaque("about"));
        registry
    }

    pub fn register(&mut self, scheme: Scheme) {
        self.schemes.insert(scheme.name.to_ascii_lowercase(), scheme);
    }

    /// Looks up a scheme by name, case-insensitively. Unrecognized names
    /// resolve to [`Scheme::unknown`] (with `name` set for diagnostics).
    pub fn lookup(&self, name: &str) -> Scheme {
        let lower = name.to_ascii_lowercase();
        match self.schemes.get(&lower) {
            Some(scheme) => scheme.clone(),
            None => Scheme { name: lower, ..Scheme::unknown() },
        }
    }
}

impl Default for SchemeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Half-open character-offset ranges for every structural part of a URL
/// (spec §3 `PartRanges`). `None` signals absence. For hierarchical
/// schemes, `content`/`content_metadata` are never populated; for
/// non-hierarchical schemes `authority`/`path`/`query` are never populated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartRanges {
    pub authority: Option<(usize, usize)>,
    pub path: Option<(usize, usize)>,
    pub query: Option<(usize, usize)>,
    pub fragment: Option<(usize, usize)>,
    pub content: Option<(usize, usize)>,
    pub content_metadata: Option<(usize, usize)>,
}

impl PartRanges {
    pub fn slice<'a>(text: &'a str, range: Option<(usize, usize)>) -> Option<&'a str> {
        range.map(|(l, r)| &text[l..r])
    }
}

/// Partitions `text[left..right)` into its structural parts.
///
/// For hierarchical schemes: if the region begins with `//`, reads
/// `authority` up to the next `/`, `?`, or `#`; reads `path` up to the next
/// `?` or `#`; optionally reads `?…` as `query` up to `#`; optionally reads
/// `#…` as `fragment`.
///
/// For non-hierarchical schemes: `content` is the whole region up to the
/// first `#`; `fragment` is the remainder. `data:` schemes further split
/// content at the first unescaped `,` into `content_metadata`/`content`.
pub fn decompose(scheme: &Scheme, text: &str, left: usize, right: usize) -> Option<PartRanges> {
    if left > right || right > text.len() {
        return None;
    }
    let mut ranges = PartRanges::default();
    let mut cursor = left;

    if scheme.is_hierarchical {
        if text[cursor..right].starts_with("//") {
            let auth_start = cursor + 2;
            let auth_end = find_any(text, auth_start, right, &['/', '?', '#']).unwrap_or(right);
            ranges.authority = Some((auth_start, auth_end));
            cursor = auth_end;
        }
        let path_end = find_any(text, cursor, right, &['?', '#']).unwrap_or(right);
        ranges.path = Some((cursor, path_end));
        cursor = path_end;
    } else {
        let content_end = find_any(text, cursor, right, &['#']).unwrap_or(right);
        let (metadata, content) = split_data_content(scheme, text, cursor, content_end);
        ranges.content_metadata = metadata;
        ranges.content = Some(content);
        cursor = content_end;
    }

    if cursor < right && text.as_bytes()[cursor] == b'?' {
        let query_start = cursor + 1;
        let query_end = find_any(text, query_start, right, &['#']).unwrap_or(right);
        ranges.query = Some((query_start, query_end));
        cursor = query_end;
    }

    if cursor < right && text.as_bytes()[cursor] == b'#' {
        ranges.fragment = Some((cursor + 1, right));
    }

    Some(ranges)
}

fn split_data_content(
    scheme: &Scheme,
    text: &str,
    left: usize,
    right: usize,
) -> (Option<(usize, usize)>, (usize, usize)) {
    if scheme.name != "data" {
        return (None, (left, right));
    }
    match find_unescaped_comma(text, left, right) {
        Some(comma) => (Some((left, comma)), (comma + 1, right)),
        None => (None, (left, right)),
    }
}

fn find_unescaped_comma(text: &str, left: usize, right: usize) -> Option<usize> {
    text.as_bytes()[left..right]
        .iter()
        .position(|&b| b == b',')
        .map(|i| left + i)
}

fn find_any(text: &str, left: usize, right: usize, needles: &[char]) -> Option<usize> {
    text[left..right].find(needles).map(|i| left + i)
}

/// Reverses [`decompose`], writing the recomposed text into `out`.
///
/// Emits `//` before authority when the scheme naturally has one; inserts a
/// leading `/` when an authority was written and the path's first
/// character isn't `/`; emits `//` before a path that itself starts with
/// `//` when no authority was written (to avoid a path/authority
/// ambiguity); inserts `?`/`#` before query/fragment when not already
/// carried in the slice.
pub struct Parts<'a> {
    pub authority: Option<&'a str>,
    pub path: Option<&'a str>,
    pub query: Option<&'a str>,
    pub fragment: Option<&'a str>,
    pub content: Option<&'a str>,
    pub content_metadata: Option<&'a str>,
}

pub fn recompose(scheme: &Scheme, parts: &Parts<'_>, out: &mut String) {
    let mut wrote_authority = false;
    if scheme.is_hierarchical {
        if let Some(authority) = parts.authority {
            out.push_str("//");
            out.push_str(authority);
            wrote_authority = true;
        }
        if let Some(path) = parts.path {
            if wrote_authority && !path.is_empty() && !path.starts_with('/') {
                out.push('/');
            } else if !wrote_authority && path.starts_with("//") {
                out.push_str("//");
            }
            out.push_str(path);
        }
    } else {
        if let Some(metadata) = parts.content_metadata {
            out.push_str(metadata);
            out.push(',');
        }
        if let Some(content) = parts.content {
            out.push_str(content);
        }
    }
    if let Some(query) = parts.query {
        if !out.ends_with('?') {
            out.push('?');
        }
        out.push_str(query);
    }
    if let Some(fragment) = parts.fragment {
        if !out.ends_with('#') {
            out.push('#');
        }
        out.push_str(fragment);
    }
}
