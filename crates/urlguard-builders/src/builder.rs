//! Fluent builder façades over `urlguard-core`'s classifiers (spec §6).
//!
//! Builders are single-threaded accumulators; `build()` validates eagerly
//! (malformed path globs, a base url that won't resolve) and returns an
//! immutable, shareable classifier.

use std::collections::{HashMap, HashSet};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use log::warn;
use urlguard_core::authority::{AuthorityClassifier, PortPredicate, UsernamePredicate};
use urlguard_core::classifier::{Classify, UrlClassifier};
use urlguard_core::fragment::{FragmentClassifier, FragmentPredicate};
use urlguard_core::hostglob::{HostGlob, HostGlobMatcher};
use urlguard_core::pathglob::PathGlob;
use urlguard_core::query::{KeyPolicy, KeyPredicate, QueryClassifier, ValuePredicate};
use urlguard_core::CornerCaseSet;

use crate::error::BuildError;

/// Builds an [`AuthorityClassifier`] (spec §6 "Authority").
#[derive(Default)]
pub struct AuthorityBuilder {
    ipv4_allow: Option<HashSet<Ipv4Addr>>,
    ipv6_allow: Option<HashSet<Ipv6Addr>>,
    domain_allow: Option<HashSet<String>>,
    host_globs: Vec<HostGlob>,
    matches_any_host: bool,
    explicit_ports: Option<HashSet<i32>>,
    port_predicate: Option<PortPredicate>,
    username_predicate: Option<UsernamePredicate>,
}

impl AuthorityBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_ipv4(mut self, addrs: impl IntoIterator<Item = Ipv4Addr>) -> Self {
        self.ipv4_allow.get_or_insert_with(HashSet::new).extend(addrs);
        self
    }

    pub fn allow_ipv6(mut self, addrs: impl IntoIterator<Item = Ipv6Addr>) -> Self {
        self.ipv6_allow.get_or_insert_with(HashSet::new).extend(addrs);
        self
    }

    pub fn allow_domain(mut self, domains: impl IntoIterator<Item = String>) -> Self {
        self.domain_allow.get_or_insert_with(HashSet::new).extend(domains);
        self
    }

    pub fn allow_host_glob(mut self, glob: &str) -> Self {
        if let Some(parsed) = HostGlob::parse(glob) {
            self.host_globs.push(parsed);
        } else {
            self.matches_any_host = true;
        }
        self
    }

    pub fn match_any_host(mut self) -> Self {
        self.matches_any_host = true;
        self
    }

    pub fn allow_ports(mut self, ports: impl IntoIterator<Item = i32>) -> Self {
        self.explicit_ports.get_or_insert_with(HashSet::new).extend(ports);
        self
    }

    pub fn port_predicate(mut self, predicate: PortPredicate) -> Self {
        self.port_predicate = Some(predicate);
        self
    }

    pub fn username_predicate(mut self, predicate: UsernamePredicate) -> Self {
        self.username_predicate = Some(predicate);
        self
    }

    pub fn build(self) -> AuthorityClassifier {
        let host_glob_matcher =
            if self.host_globs.is_empty() { None } else { Some(HostGlobMatcher::build(&self.host_globs, false)) };
        AuthorityClassifier::new(
            self.ipv4_allow,
            self.ipv6_allow,
            self.domain_allow,
            host_glob_matcher,
            self.matches_any_host,
            self.explicit_ports,
            self.port_predicate,
            self.username_predicate,
        )
    }
}

/// Builds a [`QueryClassifier`] (spec §6 "Query").
#[derive(Default)]
pub struct QueryBuilder {
    may_key_set: Option<HashSet<String>>,
    may_key_predicate: Option<KeyPredicate>,
    once_key_set: Option<HashSet<String>>,
    once_key_predicate: Option<KeyPredicate>,
    must_keys: HashSet<String>,
    value_predicates: HashMap<String, ValuePredicate>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn may_have_keys(mut self, keys: impl IntoIterator<Item = String>) -> Self {
        self.may_key_set.get_or_insert_with(HashSet::new).extend(keys);
        self
    }

    pub fn may_have_keys_matching(mut self, predicate: KeyPredicate) -> Self {
        self.may_key_predicate = Some(predicate);
        self
    }

    pub fn may_not_repeat_keys(mut self, keys: impl IntoIterator<Item = String>) -> Self {
        self.once_key_set.get_or_insert_with(HashSet::new).extend(keys);
        self
    }

    pub fn may_not_repeat_keys_matching(mut self, predicate: KeyPredicate) -> Self {
        self.once_key_predicate = Some(predicate);
        self
    }

    pub fn must_have_keys(mut self, keys: impl IntoIterator<Item = String>) -> Self {
        self.must_keys.extend(keys);
        self
    }

    pub fn value_must_match(mut self, key: impl Into<String>, predicate: ValuePredicate) -> Self {
        self.value_predicates.insert(key.into(), predicate);
        self
    }

    pub fn build(self) -> QueryClassifier {
        if self.may_key_set.is_none() && self.may_key_predicate.is_none() {
            warn!("query builder has no mayHaveKeys constraint; every key is permitted");
        }
        QueryClassifier::new(
            KeyPolicy::new(self.may_key_set, self.may_key_predicate),
            KeyPolicy::new(self.once_key_set, self.once_key_predicate),
            self.must_keys,
            self.value_predicates,
        )
    }
}

/// Builds a [`FragmentClassifier`] (spec §6 "Fragment").
#[derive(Default)]
pub struct FragmentBuilder {
    predicate: Option<FragmentPredicate>,
    relative_url_classifier: Option<Arc<dyn Classify>>,
}

impl FragmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn predicate(mut self, predicate: FragmentPredicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn classify_as_relative_url(mut self, classifier: Arc<dyn Classify>) -> Self {
        self.relative_url_classifier = Some(classifier);
        self
    }

    pub fn build(self) -> FragmentClassifier {
        if self.predicate.is_none() && self.relative_url_classifier.is_none() {
            warn!("fragment builder has no predicate or relative-url classifier; every fragment is permitted");
        }
        FragmentClassifier::new(self.predicate, self.relative_url_classifier)
    }
}

/// Builds the top-level [`UrlClassifier`] (spec §6 "Top-level").
#[derive(Default)]
pub struct TopLevelBuilder {
    allowed_schemes: Option<HashSet<String>>,
    authority_classifier: Option<Arc<dyn Classify>>,
    positive_path_globs: Vec<PathGlob>,
    negative_path_globs: Vec<PathGlob>,
    media_type_classifier: Option<Arc<dyn Classify>>,
    content_classifier: Option<Arc<dyn Classify>>,
    query_classifier: Option<Arc<dyn Classify>>,
    fragment_classifier: Option<Arc<dyn Classify>>,
    allow_nul: bool,
    allow_root_parent: bool,
    tolerated_corner_cases: CornerCaseSet,
}

impl TopLevelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_schemes(mut self, schemes: impl IntoIterator<Item = String>) -> Self {
        self.allowed_schemes.get_or_insert_with(HashSet::new).extend(schemes);
        self
    }

    pub fn authority(mut self, classifier: Arc<dyn Classify>) -> Self {
        self.authority_classifier = Some(classifier);
        self
    }

    pub fn allow_path_matching(mut self, glob: &str) -> Result<Self, BuildError> {
        self.positive_path_globs.push(PathGlob::compile(glob)?);
        Ok(self)
    }

    pub fn deny_path_matching(mut self, glob: &str) -> Result<Self, BuildError> {
        self.negative_path_globs.push(PathGlob::compile(glob)?);
        Ok(self)
    }

    pub fn media_type(mut self, classifier: Arc<dyn Classify>) -> Self {
        self.media_type_classifier = Some(classifier);
        self
    }

    pub fn content(mut self, classifier: Arc<dyn Classify>) -> Self {
        self.content_classifier = Some(classifier);
        self
    }

    pub fn query(mut self, classifier: Arc<dyn Classify>) -> Self {
        self.query_classifier = Some(classifier);
        self
    }

    pub fn fragment(mut self, classifier: Arc<dyn Classify>) -> Self {
        self.fragment_classifier = Some(classifier);
        self
    }

    pub fn allow_nul(mut self, allow: bool) -> Self {
        self.allow_nul = allow;
        self
    }

    pub fn allow_root_parent(mut self, allow: bool) -> Self {
        self.allow_root_parent = allow;
        self
    }

    pub fn tolerate_corner_cases(mut self, tolerated: CornerCaseSet) -> Self {
        self.tolerated_corner_cases = tolerated;
        self
    }

    pub fn build(self) -> UrlClassifier {
        let authority_classifier = Some(
            self.authority_classifier
                .unwrap_or_else(|| Arc::new(AuthorityBuilder::new().match_any_host().build())),
        );
        UrlClassifier::new(
            self.allowed_schemes,
            authority_classifier,
            self.positive_path_globs,
            self.negative_path_globs,
            self.media_type_classifier,
            self.content_classifier,
            self.query_classifier,
            self.fragment_classifier,
            self.allow_nul,
            self.allow_root_parent,
            self.tolerated_corner_cases,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use urlguard_core::diagnostics::null_receiver;
    use urlguard_core::{Classification, UrlContext, UrlValue};

    #[test]
    fn top_level_builder_allows_configured_scheme_only() {
        let classifier = TopLevelBuilder::new().allow_schemes(["https".to_string()]).build();
        let ctx = UrlContext::default_context();
        let ok = UrlValue::new(ctx.clone(), "https://example.com/");
        let bad = UrlValue::new(ctx, "http://example.com/");
        assert_eq!(classifier.apply(&ok, null_receiver().as_ref()), Classification::Match);
        assert_eq!(classifier.apply(&bad, null_receiver().as_ref()), Classification::NotAMatch);
    }

    #[test]
    fn authority_builder_domain_allow_list() {
        let authority: Arc<dyn Classify> =
            Arc::new(AuthorityBuilder::new().allow_domain(["example.com".to_string()]).build());
        let classifier = TopLevelBuilder::new().authority(authority).build();
        let ctx = UrlContext::default_context();
        let ok = UrlValue::new(ctx.clone(), "http://example.com/");
        let bad = UrlValue::new(ctx, "http://evil.example/");
        assert_eq!(classifier.apply(&ok, null_receiver().as_ref()), Classification::Match);
        assert_eq!(classifier.apply(&bad, null_receiver().as_ref()), Classification::NotAMatch);
    }

    #[test]
    fn path_glob_builder_rejects_malformed_percent_encoding() {
        let result = TopLevelBuilder::new().allow_path_matching("/a%2");
        assert!(result.is_err());
    }

    #[test]
    fn unconfigured_authority_still_runs_structural_checks() {
        let classifier = TopLevelBuilder::new().allow_schemes(["https".to_string()]).build();
        let ctx = UrlContext::default_context();
        let ok = UrlValue::new(ctx.clone(), "https://example.com/");
        let bad_port = UrlValue::new(ctx.clone(), "https://example.com:999999/");
        let password = UrlValue::new(ctx, "https://user:pw@evil.example/");
        assert_eq!(classifier.apply(&ok, null_receiver().as_ref()), Classification::Match);
        assert_eq!(classifier.apply(&bad_port, null_receiver().as_ref()), Classification::Invalid);
        assert_eq!(classifier.apply(&password, null_receiver().as_ref()), Classification::Invalid);
    }
}
