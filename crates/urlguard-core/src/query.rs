//! Query classifier (spec §4.8).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::classifier::Classify;
use crate::diagnostics::Receiver;
use crate::percent;
use crate::url::UrlValue;
use crate::verdict::Classification;

pub type KeyPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;
pub type ValuePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// `mayHaveKeys`/`mayNotRepeatKeys` (spec §6 "Query" builder row): a set, a
/// predicate, or both (union).
#[derive(Default)]
pub struct KeyPolicy {
    set: Option<HashSet<String>>,
    predicate: Option<KeyPredicate>,
}

impl KeyPolicy {
    pub fn new(set: Option<HashSet<String>>, predicate: Option<KeyPredicate>) -> Self {
        Self { set, predicate }
    }

    fn allows(&self, key: &str) -> bool {
        match (&self.set, &self.predicate) {
            (None, None) => true,
            (Some(set), None) => set.contains(key),
            (None, Some(predicate)) => predicate(key),
            (Some(set), Some(predicate)) => set.contains(key) || predicate(key),
        }
    }

    fn is_configured(&self) -> bool {
        self.set.is_some() || self.predicate.is_some()
    }
}

pub struct QueryClassifier {
    may_key: KeyPolicy,
    once_key: KeyPolicy,
    must_keys: HashSet<String>,
    value_predicates: HashMap<String, ValuePredicate>,
}

impl QueryClassifier {
    pub fn new(
        may_key: KeyPolicy,
        once_key: KeyPolicy,
        must_keys: HashSet<String>,
        value_predicates: HashMap<String, ValuePredicate>,
    ) -> Self {
        Self { may_key, once_key, must_keys, value_predicates }
    }

    pub fn apply(&self, url: &UrlValue, diagnostics: &dyn Receiver) -> Classification {
        let raw = url.query().unwrap_or("");
        let raw = raw.strip_prefix('?').unwrap_or(raw);

        let mut seen: HashSet<String> = HashSet::new();

        for pair in raw.split('&') {
            if pair.is_empty() {
                continue;
            }
            let (raw_key, raw_value) = match pair.split_once('=') {
                Some((k, v)) => (k, Some(v)),
                None => (pair, None),
            };

            let key = match percent::decode_all(raw_key, true, false) {
                Some(key) => key,
                None => {
                    diagnostics.note("query-key-decode-failed", raw_key);
                    return Classification::Invalid;
                }
            };
            let value = match raw_value {
                Some(raw_value) => match percent::decode_all(raw_value, true, false) {
                    Some(value) => Some(value),
                    None => {
                        diagnostics.note("query-value-decode-failed", raw_value);
                        return Classification::Invalid;
                    }
                },
                None => None,
            };

            if !self.may_key.allows(&key) {
                diagnostics.note("query-key-not-allowed", &key);
                return Classification::NotAMatch;
            }

            if self.once_key.is_configured() && self.once_key.allows(&key) {
                if !seen.insert(key.clone()) {
                    diagnostics.note("query-key-repeated", &key);
                    return Classification::NotAMatch;
                }
            } else {
                seen.insert(key.clone());
            }

            if let Some(predicate) = self.value_predicates.get(&key) {
                if !predicate(value.as_deref().unwrap_or("")) {
                    diagnostics.note("query-value-rejected", &key);
                    return Classification::NotAMatch;
                }
            }
        }

        for required in &self.must_keys {
            if !seen.contains(required) {
                diagnostics.note("query-required-key-missing", required);
                return Classification::NotAMatch;
            }
        }

        Classification::Match
    }
}

impl Classify for QueryClassifier {
    fn classify(&self, url: &UrlValue, diagnostics: &dyn Receiver) -> Classification {
        self.apply(url, diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::null_receiver;
    use crate::url::UrlContext;

    fn classify(classifier: &QueryClassifier, reference: &str) -> Classification {
        let ctx = UrlContext::default_context();
        let value = UrlValue::new(ctx, reference);
        classifier.apply(&value, null_receiver().as_ref())
    }

    #[test]
    fn permissive_by_default() {
        let classifier = QueryClassifier::new(KeyPolicy::default(), KeyPolicy::default(), HashSet::new(), HashMap::new());
        assert_eq!(classify(&classifier, "http://example.com/?a=1&b=2"), Classification::Match);
    }

    #[test]
    fn may_key_set_rejects_unknown_keys() {
        let mut allow = HashSet::new();
        allow.insert("a".to_string());
        let classifier = QueryClassifier::new(
            KeyPolicy::new(Some(allow), None),
            KeyPolicy::default(),
            HashSet::new(),
            HashMap::new(),
        );
        assert_eq!(classify(&classifier, "http://example.com/?a=1"), Classification::Match);
        assert_eq!(classify(&classifier, "http://example.com/?b=1"), Classification::NotAMatch);
    }

    #[test]
    fn once_key_rejects_repeats() {
        let mut once = HashSet::new();
        once.insert("a".to_string());
        let classifier = QueryClassifier::new(
            KeyPolicy::default(),
            KeyPolicy::new(Some(once), None),
            HashSet::new(),
            HashMap::new(),
        );
        assert_eq!(classify(&classifier, "http://example.com/?a=1"), Classification::Match);
        assert_eq!(classify(&classifier, "http://example.com/?a=1&a=2"), Classification::NotAMatch);
    }

    #[test]
    fn must_keys_requires_presence() {
        let mut must = HashSet::new();
        must.insert("token".to_string());
        let classifier = QueryClassifier::new(KeyPolicy::default(), KeyPolicy::default(), must, HashMap::new());
        assert_eq!(classify(&classifier, "http://example.com/?token=x"), Classification::Match);
        assert_eq!(classify(&classifier, "http://example.com/?other=x"), Classification::NotAMatch);
    }

    #[test]
    fn value_predicate_gates_decoded_value() {
        let mut predicates: HashMap<String, ValuePredicate> = HashMap::new();
        predicates.insert("n".to_string(), Arc::new(|v: &str| v.parse::<i32>().is_ok()));
        let classifier = QueryClassifier::new(KeyPolicy::default(), KeyPolicy::default(), HashSet::new(), predicates);
        assert_eq!(classify(&classifier, "http://example.com/?n=42"), Classification::Match);
        assert_eq!(classify(&classifier, "http://example.com/?n=abc"), Classification::NotAMatch);
    }

    #[test]
    fn malformed_percent_encoding_is_invalid() {
        let classifier = QueryClassifier::new(KeyPolicy::default(), KeyPolicy::default(), HashSet::new(), HashMap::new());
        assert_eq!(classify(&classifier, "http://example.com/?a=%2"), Classification::Invalid);
    }
}
