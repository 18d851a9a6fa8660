//! A declarative JSON ruleset format (spec §6 builder option tables) that
//! deserializes into a fluent [`crate::builder`] tree and produces a built
//! [`urlguard_core::UrlClassifier`].
//!
//! Predicates can't be deserialized directly, so the option tables' set and
//! predicate slots are represented here by [`StringMatcher`]/[`PortMatcher`],
//! a small closed vocabulary of declarative matchers compiled at `build()`.

use std::collections::HashSet;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use regex::Regex;
use serde::Deserialize;
use urlguard_core::authority::{PortPredicate, UsernamePredicate};
use urlguard_core::fragment::FragmentPredicate;
use urlguard_core::query::{KeyPredicate, ValuePredicate};
use urlguard_core::{CornerCase, CornerCaseSet};

use crate::builder::{AuthorityBuilder, FragmentBuilder, QueryBuilder, TopLevelBuilder};
use crate::error::BuildError;

/// A declarative stand-in for a `Fn(&str) -> bool` predicate.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StringMatcher {
    OneOf { values: HashSet<String> },
    Regex { pattern: String },
    Prefix { prefix: String },
}

impl StringMatcher {
    fn compile(&self) -> Result<Arc<dyn Fn(&str) -> bool + Send + Sync>, BuildError> {
        Ok(match self {
            StringMatcher::OneOf { values } => {
                let values = values.clone();
                Arc::new(move |s: &str| values.contains(s))
            }
            StringMatcher::Prefix { prefix } => {
                let prefix = prefix.clone();
                Arc::new(move |s: &str| s.starts_with(prefix.as_str()))
            }
            StringMatcher::Regex { pattern } => {
                let re = Regex::new(pattern)
                    .map_err(|e| BuildError::ContradictoryOption("regex".to_string(), e.to_string()))?;
                Arc::new(move |s: &str| re.is_match(s))
            }
        })
    }
}

/// A declarative stand-in for a `Fn(i32) -> bool` port predicate.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PortMatcher {
    Range { min: i32, max: i32 },
}

impl PortMatcher {
    fn compile(&self) -> PortPredicate {
        match *self {
            PortMatcher::Range { min, max } => Arc::new(move |port: i32| port >= min && port <= max),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthoritySpec {
    pub allow_ipv4: Option<HashSet<Ipv4Addr>>,
    pub allow_ipv6: Option<HashSet<Ipv6Addr>>,
    pub allow_domains: Option<HashSet<String>>,
    pub allow_host_globs: Vec<String>,
    pub match_any_host: bool,
    pub allow_ports: Option<HashSet<i32>>,
    pub port_predicate: Option<PortMatcher>,
    pub username_predicate: Option<StringMatcher>,
}

impl AuthoritySpec {
    fn build(&self) -> Result<urlguard_core::authority::AuthorityClassifier, BuildError> {
        let mut builder = AuthorityBuilder::new();
        if let Some(ips) = &self.allow_ipv4 {
            builder = builder.allow_ipv4(ips.iter().copied());
        }
        if let Some(ips) = &self.allow_ipv6 {
            builder = builder.allow_ipv6(ips.iter().copied());
        }
        if let Some(domains) = &self.allow_domains {
            builder = builder.allow_domain(domains.iter().cloned());
        }
        for glob in &self.allow_host_globs {
            builder = builder.allow_host_glob(glob);
        }
        if self.match_any_host {
            builder = builder.match_any_host();
        }
        if let Some(ports) = &self.allow_ports {
            builder = builder.allow_ports(ports.iter().copied());
        }
        if let Some(predicate) = &self.port_predicate {
            builder = builder.port_predicate(predicate.compile());
        }
        if let Some(predicate) = &self.username_predicate {
            let compiled: UsernamePredicate = predicate.compile()?;
            builder = builder.username_predicate(compiled);
        }
        Ok(builder.build())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuerySpec {
    pub may_have_keys: Option<HashSet<String>>,
    pub may_have_keys_matching: Option<StringMatcher>,
    pub may_not_repeat_keys: Option<HashSet<String>>,
    pub may_not_repeat_keys_matching: Option<StringMatcher>,
    pub must_have_keys: HashSet<String>,
    pub value_must_match: std::collections::HashMap<String, StringMatcher>,
}

impl QuerySpec {
    fn build(&self) -> Result<urlguard_core::query::QueryClassifier, BuildError> {
        let mut builder = QueryBuilder::new();
        if let Some(keys) = &self.may_have_keys {
            builder = builder.may_have_keys(keys.iter().cloned());
        }
        if let Some(matcher) = &self.may_have_keys_matching {
            let compiled: KeyPredicate = matcher.compile()?;
            builder = builder.may_have_keys_matching(compiled);
        }
        if let Some(keys) = &self.may_not_repeat_keys {
            builder = builder.may_not_repeat_keys(keys.iter().cloned());
        }
        if let Some(matcher) = &self.may_not_repeat_keys_matching {
            let compiled: KeyPredicate = matcher.compile()?;
            builder = builder.may_not_repeat_keys_matching(compiled);
        }
        if !self.must_have_keys.is_empty() {
            builder = builder.must_have_keys(self.must_have_keys.iter().cloned());
        }
        for (key, matcher) in &self.value_must_match {
            let compiled: ValuePredicate = matcher.compile()?;
            builder = builder.value_must_match(key.clone(), compiled);
        }
        Ok(builder.build())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FragmentSpec {
    pub predicate: Option<FragmentMatcher>,
    pub classify_as_relative_url: Option<Box<RulesetSpec>>,
}

/// The fragment predicate sees `Option<&str>` rather than `&str`, so it gets
/// its own small matcher vocabulary instead of reusing [`StringMatcher`].
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FragmentMatcher {
    RequireAbsent,
    RequirePresent,
    OneOf { values: HashSet<String> },
}

impl FragmentMatcher {
    fn compile(&self) -> FragmentPredicate {
        match self {
            FragmentMatcher::RequireAbsent => Arc::new(|f: Option<&str>| f.is_none()),
            FragmentMatcher::RequirePresent => Arc::new(|f: Option<&str>| f.is_some()),
            FragmentMatcher::OneOf { values } => {
                let values = values.clone();
                Arc::new(move |f: Option<&str>| f.is_some_and(|f| values.contains(f)))
            }
        }
    }
}

impl FragmentSpec {
    fn build(&self) -> Result<urlguard_core::fragment::FragmentClassifier, BuildError> {
        let mut builder = FragmentBuilder::new();
        if let Some(predicate) = &self.predicate {
            builder = builder.predicate(predicate.compile());
        }
        if let Some(nested) = &self.classify_as_relative_url {
            let classifier = Arc::new(nested.build()?);
            builder = builder.classify_as_relative_url(classifier);
        }
        Ok(builder.build())
    }
}

/// Top-level ruleset document (spec §6 "Top-level" builder row).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RulesetSpec {
    pub allowed_schemes: Option<HashSet<String>>,
    pub authority: Option<AuthoritySpec>,
    pub allow_path_globs: Vec<String>,
    pub deny_path_globs: Vec<String>,
    pub query: Option<QuerySpec>,
    pub fragment: Option<FragmentSpec>,
    pub allow_nul: bool,
    pub allow_root_parent: bool,
    pub tolerate_corner_cases: Vec<String>,
}

impl RulesetSpec {
    pub fn from_json(text: &str) -> Result<Self, BuildError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn build(&self) -> Result<urlguard_core::UrlClassifier, BuildError> {
        let mut builder = TopLevelBuilder::new();
        if let Some(schemes) = &self.allowed_schemes {
            builder = builder.allow_schemes(schemes.iter().cloned());
        }
        if let Some(authority) = &self.authority {
            let classifier: Arc<dyn urlguard_core::Classify> = Arc::new(authority.build()?);
            builder = builder.authority(classifier);
        }
        for glob in &self.allow_path_globs {
            builder = builder.allow_path_matching(glob)?;
        }
        for glob in &self.deny_path_globs {
            builder = builder.deny_path_matching(glob)?;
        }
        if let Some(query) = &self.query {
            let classifier: Arc<dyn urlguard_core::Classify> = Arc::new(query.build()?);
            builder = builder.query(classifier);
        }
        if let Some(fragment) = &self.fragment {
            let classifier: Arc<dyn urlguard_core::Classify> = Arc::new(fragment.build()?);
            builder = builder.fragment(classifier);
        }
        builder = builder.allow_nul(self.allow_nul).allow_root_parent(self.allow_root_parent);

        let mut tolerated = CornerCaseSet::empty();
        for name in &self.tolerate_corner_cases {
            let case = match name.as_str() {
                "encoded_dot_path_segment" => CornerCase::EncodedDotPathSegment,
                "path_authority_ambiguity" => CornerCase::PathAuthorityAmbiguity,
                "relative_url_merged_to_absolute" => CornerCase::RelativeUrlMergedToAbsolute,
                other => {
                    return Err(BuildError::ContradictoryOption(
                        "tolerateCornerCases".to_string(),
                        format!("unknown corner case {other:?}"),
                    ))
                }
            };
            tolerated.insert_case(case);
        }
        builder = builder.tolerate_corner_cases(tolerated);

        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use urlguard_core::diagnostics::null_receiver;
    use urlguard_core::{Classification, UrlContext, UrlValue};

    #[test]
    fn minimal_scheme_allow_list_round_trips_through_json() {
        let spec = RulesetSpec::from_json(r#"{"allowedSchemes": ["https"]}"#).unwrap();
        let classifier = spec.build().unwrap();
        let ctx = UrlContext::default_context();
        let ok = UrlValue::new(ctx.clone(), "https://example.com/");
        let bad = UrlValue::new(ctx, "http://example.com/");
        assert_eq!(classifier.apply(&ok, null_receiver().as_ref()), Classification::Match);
        assert_eq!(classifier.apply(&bad, null_receiver().as_ref()), Classification::NotAMatch);
    }

    #[test]
    fn authority_host_glob_from_json() {
        let spec = RulesetSpec::from_json(
            r#"{"authority": {"allowHostGlobs": ["**.example.com"], "matchAnyHost": false}}"#,
        )
        .unwrap();
        let classifier = spec.build().unwrap();
        let ctx = UrlContext::default_context();
        let ok = UrlValue::new(ctx.clone(), "http://foo.example.com/");
        let bad = UrlValue::new(ctx, "http://evil.example/");
        assert_eq!(classifier.apply(&ok, null_receiver().as_ref()), Classification::Match);
        assert_eq!(classifier.apply(&bad, null_receiver().as_ref()), Classification::NotAMatch);
    }

    #[test]
    fn unknown_corner_case_name_is_rejected_eagerly() {
        let spec = RulesetSpec::from_json(r#"{"tolerateCornerCases": ["not_a_real_case"]}"#).unwrap();
        assert!(spec.build().is_err());
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(RulesetSpec::from_json("{not json").is_err());
    }
}
