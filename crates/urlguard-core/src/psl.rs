//! Public-suffix-aware domain name parsing (spec §6 "domain-name parser"
//! external primitive).
//!
//! Loads a [`publicsuffix::List`] once from a bundled snapshot and shares it
//! process-wide, the same "load once, share forever" shape as the teacher's
//! `static PSL_SETS: RwLock<Option<PslSets>>`. Hosts covered by the bundled
//! snapshot get an authoritative public-suffix boundary; hosts outside it
//! fall back to a last-two-labels heuristic, mirroring the teacher's
//! `fallback_etld1`.

use std::str::FromStr;
use std::sync::OnceLock;

use publicsuffix::{List, Psl};

const BUNDLED_LIST: &str = include_str!("../assets/public_suffix_list.dat");

fn psl_list() -> &'static List {
    static LIST: OnceLock<List> = OnceLock::new();
    LIST.get_or_init(|| List::from_str(BUNDLED_LIST).unwrap_or_else(|_| List::from_str("com\nnet\norg").unwrap()))
}

/// A parsed domain name: its labels (lowercase, post-IDN-ToUnicode) and,
/// if the bundled public suffix list recognizes one, the label count of
/// its public suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainName {
    labels: Vec<String>,
    suffix_label_count: Option<usize>,
}

impl DomainName {
    /// Parses `host` into labels and determines its public suffix, if any.
    /// `host` should already be lowercase/ToUnicode-normalized.
    pub fn parse(host: &str) -> Option<Self> {
        if host.is_empty() {
            return None;
        }
        let trimmed = host.trim_end_matches('.');
        if trimmed.is_empty() {
            return None;
        }
        let labels: Vec<String> = trimmed.split('.').map(str::to_string).collect();
        if labels.iter().any(|label| label.is_empty()) {
            return None;
        }
        let suffix_label_count = public_suffix_label_count(trimmed, &labels);
        Some(Self { labels, suffix_label_count })
    }

    pub fn parts(&self) -> &[String] {
        &self.labels
    }

    pub fn has_public_suffix(&self) -> bool {
        self.suffix_label_count.is_some()
    }

    /// The public suffix as its own `DomainName`, if one was recognized.
    pub fn public_suffix(&self) -> Option<DomainName> {
        let count = self.suffix_label_count?;
        let start = self.labels.len().checked_sub(count)?;
        Some(DomainName { labels: self.labels[start..].to_vec(), suffix_label_count: Some(count) })
    }
}

fn public_suffix_label_count(host: &str, labels: &[String]) -> Option<usize> {
    let list = psl_list();
    if let Some(suffix) = list.suffix(host.as_bytes()) {
        if suffix.is_known() {
            let count = suffix.as_bytes().iter().filter(|&&b| b == b'.').count() + 1;
            return Some(count);
        }
    }
    fallback_suffix_label_count(labels)
}

/// Common two-label public suffixes not covered by the bundled snapshot.
const COMMON_TWO_LABEL_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "me.uk", "ac.uk", "gov.uk", "net.uk", "sch.uk", "co.jp", "ne.jp", "or.jp",
    "ac.jp", "go.jp", "co.nz", "net.nz", "org.nz", "govt.nz", "ac.nz", "co.za", "org.za", "gov.za",
    "com.au", "net.au", "org.au", "gov.au", "edu.au", "com.br", "net.br", "org.br", "com.cn",
    "net.cn", "org.cn", "com.mx", "com.tw", "com.hk", "co.in", "co.kr",
];

fn fallback_suffix_label_count(labels: &[String]) -> Option<usize> {
    let n = labels.len();
    if n < 2 {
        return Some(n);
    }
    let last_two = format!("{}.{}", labels[n - 2], labels[n - 1]);
    if COMMON_TWO_LABEL_SUFFIXES.contains(&last_two.as_str()) {
        return Some(2);
    }
    Some(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_for_simple_domain() {
        let d = DomainName::parse("www.example.com").unwrap();
        assert_eq!(d.parts(), ["www", "example", "com"]);
        assert!(d.has_public_suffix());
        assert_eq!(d.public_suffix().unwrap().parts(), ["com"]);
    }

    #[test]
    fn recognizes_two_label_public_suffix() {
        let d = DomainName::parse("foo.example.co.uk").unwrap();
        assert_eq!(d.public_suffix().unwrap().parts(), ["co", "uk"]);
    }

    #[test]
    fn rejects_empty_host() {
        assert!(DomainName::parse("").is_none());
        assert!(DomainName::parse(".").is_none());
    }

    #[test]
    fn rejects_empty_label() {
        assert!(DomainName::parse("foo..com").is_none());
    }

    #[test]
    fn trailing_dot_is_stripped() {
        let d = DomainName::parse("example.com.").unwrap();
        assert_eq!(d.parts(), ["example", "com"]);
    }
}
