//! Path-glob → regular-expression compiler (spec §4.6).

use regex::Regex;
use thiserror::Error;

use crate::percent::decode_all;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathGlobError {
    #[error("path glob {0:?} contains malformed percent-encoding")]
    MalformedPercentEncoding(String),
}

/// A compiled path glob: matches against the percent-decoded path.
#[derive(Debug, Clone)]
pub struct PathGlob {
    source: String,
    regex: Regex,
}

impl PathGlob {
    /// Compiles `glob`. Tokens are matched longest-first: `/**/` →
    /// `/(?:.*/)?`, a trailing `/**` → `/.*\z`, a bare `**` elsewhere →
    /// `.*`, `*` → `[^/]*`, a trailing `/?` → `/?`, and anything else is
    /// percent-decoded and regex-quoted literally. Rejects malformed
    /// percent-encoding eagerly.
    pub fn compile(glob: &str) -> Result<Self, PathGlobError> {
        let pattern = compile_pattern(glob)?;
        let regex = Regex::new(&format!("(?s)^{pattern}$"))
            .unwrap_or_else(|e| panic!("path glob compiler produced an invalid regex for {glob:?}: {e}"));
        Ok(Self { source: glob.to_string(), regex })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn matches_decoded_path(&self, decoded_path: &str) -> bool {
        self.regex.is_match(decoded_path)
    }
}

fn compile_pattern(glob: &str) -> Result<String, PathGlobError> {
    let bytes = glob.as_bytes();
    let mut out = String::new();
    let mut i = 0;
    let n = bytes.len();

    while i < n {
        if glob[i..].starts_with("/**/") {
            out.push_str("/(?:.*/)?");
            i += 4;
        } else if &glob[i..] == "/**" {
            out.push_str("/.*");
            i += 3;
        } else if glob[i..].starts_with("**") {
            out.push_str(".*");
            i += 2;
        } else if bytes[i] == b'*' {
            out.push_str("[^/]*");
            i += 1;
        } else if &glob[i..] == "/?" {
            out.push_str("/?");
            i += 2;
        } else {
            let literal_end = next_token_boundary(glob, i);
            let raw = &glob[i..literal_end];
            let decoded = decode_all(raw, false, true)
                .ok_or_else(|| PathGlobError::MalformedPercentEncoding(glob.to_string()))?;
            out.push_str(&regex::escape(&decoded));
            i = literal_end;
        }
    }
    Ok(out)
}

/// Finds the end of a run of literal (non-wildcard-introducing) characters
/// starting at `i`, so the literal run can be percent-decoded as a whole
/// before being regex-quoted.
fn next_token_boundary(glob: &str, start: usize) -> usize {
    let bytes = glob.as_bytes();
    let n = bytes.len();
    let mut i = start;
    while i < n {
        if bytes[i] == b'*' {
            break;
        }
        if bytes[i] == b'/' && (glob[i..].starts_with("/**/") || &glob[i..] == "/**" || &glob[i..] == "/?") {
            break;
        }
        i += 1;
    }
    if i == start {
        i = start + 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_star_segment_matches_zero_or_more_labels() {
        let glob = PathGlob::compile("/a/**/b").unwrap();
        assert!(glob.matches_decoded_path("/a/b"));
        assert!(glob.matches_decoded_path("/a/x/y/b"));
        assert!(!glob.matches_decoded_path("/a/b/c"));
    }

    #[test]
    fn trailing_double_star_matches_rest_of_path() {
        let glob = PathGlob::compile("/a/**").unwrap();
        assert!(glob.matches_decoded_path("/a/b/c"));
        assert!(glob.matches_decoded_path("/a/"));
    }

    #[test]
    fn single_star_matches_one_label_only() {
        let glob = PathGlob::compile("/a/*").unwrap();
        assert!(glob.matches_decoded_path("/a/b"));
        assert!(!glob.matches_decoded_path("/a/b/c"));
    }

    #[test]
    fn trailing_optional_slash() {
        let glob = PathGlob::compile("/a/b/?").unwrap();
        assert!(glob.matches_decoded_path("/a/b"));
        assert!(glob.matches_decoded_path("/a/b/"));
    }

    #[test]
    fn literal_percent_encoded_segment_is_decoded_before_matching() {
        let glob = PathGlob::compile("/a%2Fb").unwrap();
        assert!(glob.matches_decoded_path("/a/b"));
    }

    #[test]
    fn rejects_malformed_percent_encoding() {
        assert!(PathGlob::compile("/a%2").is_err());
    }
}
