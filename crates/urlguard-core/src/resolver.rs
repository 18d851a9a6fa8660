//! The URL reference resolver / absolutizer (spec §4.3).
//!
//! Turns a possibly-relative reference plus a base [`crate::UrlContext`]
//! into an absolute URL text, re-decomposed part ranges, and the set of
//! structural corner cases observed along the way.

use log::trace;

use crate::scheme::{self, Parts, PartRanges, Scheme, SchemeRegistry};
use crate::verdict::{CornerCase, CornerCaseSet};

/// The result of [`absolutize`]: the absolute text, its scheme, its
/// re-decomposed ranges, and resolution metadata.
#[derive(Debug, Clone)]
pub struct ResolveOutcome {
    pub url_text: String,
    pub scheme: Scheme,
    pub ranges: Option<PartRanges>,
    pub corner_cases: CornerCaseSet,
    pub path_simplification_reached_roots_parent: bool,
    /// True if the reference itself supplied an authority (branch A always
    /// does when its decomposition has one; branch B only when the
    /// reference's own authority, not the base's, was used).
    pub reference_supplied_authority: bool,
}

/// Everything the resolver needs from an already-validated absolute,
/// hierarchical base URL.
#[derive(Debug, Clone)]
pub struct BaseUrl {
    pub text: String,
    pub scheme: Scheme,
    pub ranges: PartRanges,
}

/// Finds the first `:` that occurs before any `/`, `?`, or `#` and is not
/// at position 0 — the boundary that marks a reference as "absolute"
/// (carrying its own scheme prefix) per spec §4.3.
pub fn end_of_scheme(s: &str) -> Option<usize> {
    for (i, b) in s.bytes().enumerate() {
        match b {
            b':' if i > 0 => return Some(i),
            b'/' | b'?' | b'#' => return None,
            _ => {}
        }
    }
    None
}

pub fn absolutize(registry: &SchemeRegistry, base: &BaseUrl, original_text: &str) -> ResolveOutcome {
    let (scheme, authority, path, query, fragment, content, content_metadata, reference_supplied_authority) =
        match end_of_scheme(original_text) {
            Some(colon) => absolute_reference(registry, original_text, colon),
            None => relative_reference(base, original_text),
        };

    let mut corner_cases = CornerCaseSet::empty();
    let mut reached_roots_parent = false;

    let normalized_path = path.map(|p| {
        if fixup_encoded_dots(&p) {
            corner_cases.insert_case(CornerCase::EncodedDotPathSegment);
            trace!("resolver: encoded dot path segment detected in {:?}", p);
        }
        let result = remove_dot_segments(&p);
        if result.reached_roots_parent {
            reached_roots_parent = true;
            trace!("resolver: path simplification reached root's parent");
        }
        if result.relative_merged_to_absolute {
            corner_cases.insert_case(CornerCase::RelativeUrlMergedToAbsolute);
            trace!("resolver: elided '..' rather than merging relative path to absolute");
        }
        result.path
    });

    if authority.is_none() && normalized_path.as_deref().is_some_and(|p| p.starts_with("//")) {
        corner_cases.insert_case(CornerCase::PathAuthorityAmbiguity);
        trace!("resolver: path/authority ambiguity (no authority, path starts with //)");
    }

    let mut url_text = String::new();
    url_text.push_str(&scheme.name);
    url_text.push(':');
    let scheme_colon_len = url_text.len();
    scheme::recompose(
        &scheme,
        &Parts {
            authority: authority.as_deref(),
            path: normalized_path.as_deref(),
            query: query.as_deref(),
            fragment: fragment.as_deref(),
            content: content.as_deref(),
            content_metadata: content_metadata.as_deref(),
        },
        &mut url_text,
    );

    let ranges = scheme::decompose(&scheme, &url_text, scheme_colon_len, url_text.len());

    ResolveOutcome {
        url_text,
        scheme,
        ranges,
        corner_cases,
        path_simplification_reached_roots_parent: reached_roots_parent,
        reference_supplied_authority,
    }
}

type BuiltParts = (Scheme, Option<String>, Option<String>, Option<String>, Option<String>, Option<String>, Option<String>, bool);

fn absolute_reference(registry: &SchemeRegistry, original_text: &str, colon: usize) -> BuiltParts {
    let scheme_name = &original_text[..colon];
    let scheme = registry.lookup(scheme_name);
    let ranges = scheme::decompose(&scheme, original_text, colon + 1, original_text.len()).unwrap_or_default();
    let authority = PartRanges::slice(original_text, ranges.authority).map(str::to_string);
    let has_authority = authority.is_some();
    (
        scheme,
        authority,
        PartRanges::slice(original_text, ranges.path).map(str::to_string),
        PartRanges::slice(original_text, ranges.query).map(str::to_string),
        PartRanges::slice(original_text, ranges.fragment).map(str::to_string),
        PartRanges::slice(original_text, ranges.content).map(str::to_string),
        PartRanges::slice(original_text, ranges.content_metadata).map(str::to_string),
        has_authority,
    )
}

fn relative_reference(base: &BaseUrl, original_text: &str) -> BuiltParts {
    let scheme = base.scheme.clone();
    let ref_ranges = scheme::decompose(&scheme, original_text, 0, original_text.len()).unwrap_or_default();

    let ref_authority = PartRanges::slice(original_text, ref_ranges.authority);
    let ref_path = PartRanges::slice(original_text, ref_ranges.path);
    let ref_query = PartRanges::slice(original_text, ref_ranges.query);
    let ref_fragment = PartRanges::slice(original_text, ref_ranges.fragment);
    let ref_content = PartRanges::slice(original_text, ref_ranges.content);
    let ref_content_metadata = PartRanges::slice(original_text, ref_ranges.content_metadata);

    let base_authority = PartRanges::slice(&base.text, base.ranges.authority);
    let base_path = PartRanges::slice(&base.text, base.ranges.path);
    let base_query = PartRanges::slice(&base.text, base.ranges.query);
    let base_content = PartRanges::slice(&base.text, base.ranges.content);
    let base_content_metadata = PartRanges::slice(&base.text, base.ranges.content_metadata);

    let mut used_given = false;

    let reference_supplied_authority = ref_authority.is_some();
    let authority = if let Some(a) = ref_authority {
        used_given = true;
        Some(a.to_string())
    } else {
        base_authority.map(str::to_string)
    };

    let path = match ref_path {
        Some(p) if p.starts_with('/') => {
            used_given = true;
            Some(p.to_string())
        }
        Some(p) if !p.is_empty() => {
            used_given = true;
            Some(merge_paths(base_authority.is_some(), base_path.unwrap_or(""), p))
        }
        _ => base_path.map(str::to_string),
    };

    let (content, content_metadata) = if ref_content.is_some() || ref_content_metadata.is_some() {
        used_given = true;
        (ref_content.map(str::to_string), ref_content_metadata.map(str::to_string))
    } else if !used_given {
        (base_content.map(str::to_string), base_content_metadata.map(str::to_string))
    } else {
        (None, None)
    };

    let query = if ref_query.is_some() {
        ref_query.map(str::to_string)
    } else if !used_given {
        base_query.map(str::to_string)
    } else {
        None
    };

    let fragment = ref_fragment.map(str::to_string);

    (scheme, authority, path, query, fragment, content, content_metadata, reference_supplied_authority)
}

/// RFC 3986 §5.2.3 `merge`.
fn merge_paths(base_has_authority: bool, base_path: &str, ref_path: &str) -> String {
    if base_has_authority && base_path.is_empty() {
        format!("/{ref_path}")
    } else {
        match base_path.rfind('/') {
            Some(pos) => format!("{}{}", &base_path[..=pos], ref_path),
            None => ref_path.to_string(),
        }
    }
}

/// Finds each `%2E`/`%2e` within `path`; if the enclosing `/`-bounded
/// segment decodes entirely to `.` or `..`, reports the corner case (§4.3.1).
/// Does not rewrite the path — default behavior only records the flag.
fn fixup_encoded_dots(path: &str) -> bool {
    path.split('/').any(|segment| {
        let lower = segment.to_ascii_lowercase();
        if !lower.contains("%2e") {
            return false;
        }
        matches!(decode_dot_tokens(segment).as_deref(), Some(".") | Some(".."))
    })
}

/// Decodes only `%2E`/`%2e` tokens within `segment`, leaving any other
/// byte untouched; used purely to test whether a segment is "dot-like".
fn decode_dot_tokens(segment: &str) -> Option<String> {
    let bytes = segment.as_bytes();
    let mut out = String::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() && bytes[i + 1..i + 3].eq_ignore_ascii_case(b"2e") {
            out.push('.');
            i += 3;
        } else {
            out.push(bytes[i] as char);
            i += 1;
        }
    }
    Some(out)
}

struct DotSegmentResult {
    path: String,
    reached_roots_parent: bool,
    relative_merged_to_absolute: bool,
}

/// RFC 3986 §5.2.4 `remove_dot_segments`, with the spec's deviation: when a
/// `/..` would pop past an empty output on a *relative* path (no leading
/// `/`), the `..` is elided instead of letting a synthetic leading `/`
/// stand.
fn remove_dot_segments(input: &str) -> DotSegmentResult {
    let is_relative = !input.starts_with('/');
    let mut out = String::new();
    let mut rem = input;
    let mut reached_roots_parent = false;
    let mut relative_merged_to_absolute = false;

    while !rem.is_empty() {
        if let Some(r) = rem.strip_prefix("../") {
            rem = r;
        } else if let Some(r) = rem.strip_prefix("./") {
            rem = r;
        } else if rem == ".." || rem == "." {
            rem = "";
        } else if rem.starts_with("/../") || rem == "/.." {
            let had_parent = pop_last_segment(&mut out);
            if !had_parent {
                reached_roots_parent = true;
            }
            if is_relative && !had_parent {
                relative_merged_to_absolute = true;
                rem = if rem.len() > 3 { &rem[4..] } else { "" };
            } else {
                rem = if rem.len() > 3 { &rem[3..] } else { "/" };
            }
        } else if rem.starts_with("/./") || rem == "/." {
            rem = if rem.len() > 2 { &rem[2..] } else { "/" };
        } else {
            let take = first_segment_len(rem);
            out.push_str(&rem[..take]);
            rem = &rem[take..];
        }
    }

    DotSegmentResult { path: out, reached_roots_parent, relative_merged_to_absolute }
}

/// Pops the last segment (and its preceding `/`, if any) from `out`.
/// Returns whether there was a segment to pop.
fn pop_last_segment(out: &mut String) -> bool {
    match out.rfind('/') {
        Some(pos) => {
            out.truncate(pos);
            true
        }
        None => {
            let had = !out.is_empty();
            out.clear();
            had
        }
    }
}

fn first_segment_len(rem: &str) -> usize {
    let bytes = rem.as_bytes();
    let mut i = if bytes.first() == Some(&b'/') { 1 } else { 0 };
    while i < bytes.len() && bytes[i] != b'/' {
        i += 1;
    }
    i
}
