//! Grouped suffix-trie host-glob matcher (spec §3 `HostGlob`/`HostGlobMatcher`, §4.5).

use crate::psl::DomainName;
use crate::trie::Trie;

/// A compiled host glob: the wildcard flags plus its literal middle-label
/// sequence. `any_subdomain` (`**.`) and `a_subdomain` (`*.`) are mutually
/// exclusive; `any_public_suffix` (trailing `.*`) is independent of both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostGlob {
    pub any_subdomain: bool,
    pub a_subdomain: bool,
    pub any_public_suffix: bool,
    pub middle_parts: Vec<String>,
}

impl HostGlob {
    /// Parses a glob string like `**.example.com`, `*.example.com`,
    /// `example.*`, or a bare literal domain. Returns `None` for the
    /// literal `**` glob, which the caller should instead treat as
    /// "matches any host" (spec §4.5 "Specials").
    pub fn parse(glob: &str) -> Option<Self> {
        if glob == "**" {
            return None;
        }
        let mut rest = glob;
        let any_subdomain = rest.starts_with("**.");
        if any_subdomain {
            rest = &rest[3..];
        }
        let a_subdomain = !any_subdomain && rest.starts_with("*.");
        if a_subdomain {
            rest = &rest[2..];
        }
        let any_public_suffix = rest.ends_with(".*");
        if any_public_suffix {
            rest = &rest[..rest.len() - 2];
        }
        let middle_parts = rest.split('.').map(str::to_string).filter(|s| !s.is_empty()).collect();
        Some(Self { any_subdomain, a_subdomain, any_public_suffix, middle_parts })
    }

    fn flag_key(&self) -> u8 {
        (self.any_public_suffix as u8) << 2 | (self.any_subdomain as u8) << 1 | (self.a_subdomain as u8)
    }
}

/// Groups globs by their 3-bit flag key; each group's reversed-label
/// sequences share one trie.
#[derive(Debug)]
pub struct HostGlobMatcher {
    groups: Vec<GlobGroup>,
    matches_any_host: bool,
}

#[derive(Debug)]
struct GlobGroup {
    any_subdomain: bool,
    a_subdomain: bool,
    any_public_suffix: bool,
    trie: Trie<String, bool>,
}

impl HostGlobMatcher {
    pub fn build(globs: &[HostGlob], matches_any_host: bool) -> Self {
        let mut by_key: Vec<(u8, Vec<&HostGlob>)> = Vec::new();
        for glob in globs {
            let key = glob.flag_key();
            match by_key.iter_mut().find(|(k, _)| *k == key) {
                Some((_, members)) => members.push(glob),
                None => by_key.push((key, vec![glob])),
            }
        }
        let groups = by_key
            .into_iter()
            .map(|(_, members)| {
                let any_subdomain = members[0].any_subdomain;
                let a_subdomain = members[0].a_subdomain;
                let any_public_suffix = members[0].any_public_suffix;
                let entries = members.into_iter().map(|g| {
                    let reversed: Vec<String> = g.middle_parts.iter().rev().cloned().collect();
                    (reversed, true)
                });
                GlobGroup { any_subdomain, a_subdomain, any_public_suffix, trie: Trie::build(entries) }
            })
            .collect();
        Self { groups, matches_any_host }
    }

    pub fn matches(&self, name: &DomainName) -> bool {
        if self.matches_any_host {
            return true;
        }
        let parts = name.parts();
        let n = parts.len();

        for group in &self.groups {
            let mut right = n;
            if group.any_public_suffix {
                let Some(suffix) = name.public_suffix() else { continue };
                right = match n.checked_sub(suffix.parts().len()) {
                    Some(r) => r,
                    None => continue,
                };
            }
            let left = if group.any_subdomain {
                0
            } else if group.a_subdomain {
                1
            } else {
                0
            };
            if left > right {
                continue;
            }

            let mut node = &group.trie;
            let mut matched = false;
            let mut descent_failed = false;
            let mut i = right;
            loop {
                if group.any_subdomain && node.value() == Some(&true) {
                    matched = true;
                    break;
                }
                if i == left {
                    break;
                }
                i -= 1;
                match node.child(&parts[i]) {
                    Some(child) => node = child,
                    None => {
                        descent_failed = true;
                        break;
                    }
                }
            }
            if !matched && !group.any_subdomain && !descent_failed && i == left {
                matched = node.value() == Some(&true);
            }
            if matched {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(globs: &[&str]) -> HostGlobMatcher {
        let parsed: Vec<HostGlob> = globs.iter().map(|g| HostGlob::parse(g).unwrap()).collect();
        HostGlobMatcher::build(&parsed, false)
    }

    #[test]
    fn any_subdomain_matches_domain_itself_and_descendants() {
        let m = matcher(&["**.example.com"]);
        assert!(m.matches(&DomainName::parse("example.com").unwrap()));
        assert!(m.matches(&DomainName::parse("foo.bar.example.com").unwrap()));
        assert!(!m.matches(&DomainName::parse("example.org").unwrap()));
    }

    #[test]
    fn a_subdomain_matches_exactly_one_ancestor_label() {
        let m = matcher(&["*.example.com"]);
        assert!(m.matches(&DomainName::parse("foo.example.com").unwrap()));
        assert!(!m.matches(&DomainName::parse("foo.bar.example.com").unwrap()));
        assert!(!m.matches(&DomainName::parse("example.com").unwrap()));
    }

    #[test]
    fn literal_glob_matches_only_exact_domain() {
        let m = matcher(&["example.com"]);
        assert!(m.matches(&DomainName::parse("example.com").unwrap()));
        assert!(!m.matches(&DomainName::parse("foo.example.com").unwrap()));
    }

    #[test]
    fn bare_double_star_glob_is_not_a_middle_parts_entry() {
        assert!(HostGlob::parse("**").is_none());
    }

    #[test]
    fn matches_any_host_short_circuits() {
        let m = HostGlobMatcher::build(&[], true);
        assert!(m.matches(&DomainName::parse("anything.example").unwrap()));
    }
}
