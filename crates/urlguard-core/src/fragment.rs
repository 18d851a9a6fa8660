//! Fragment classifier (spec §4.8): a predicate over the optional fragment,
//! disjoined with an optional fragment-as-relative-URL re-classification.

use std::sync::Arc;

use crate::classifier::Classify;
use crate::diagnostics::Receiver;
use crate::percent;
use crate::url::{UrlContext, UrlValue};
use crate::verdict::Classification;

pub type FragmentPredicate = Arc<dyn Fn(Option<&str>) -> bool + Send + Sync>;

pub struct FragmentClassifier {
    predicate: Option<FragmentPredicate>,
    relative_url_classifier: Option<Arc<dyn Classify>>,
}

impl FragmentClassifier {
    pub fn new(predicate: Option<FragmentPredicate>, relative_url_classifier: Option<Arc<dyn Classify>>) -> Self {
        Self { predicate, relative_url_classifier }
    }

    pub fn apply(&self, url: &UrlValue, diagnostics: &dyn Receiver) -> Classification {
        // `UrlValue::fragment` strips the leading `#` and returns the raw,
        // still percent-encoded text; the predicate sees it decoded with
        // the `#` kept, per spec.
        let decoded = match url.fragment() {
            Some(raw) => match percent::decode_all(raw, false, false) {
                Some(decoded) => Some(decoded),
                None => {
                    diagnostics.note("fragment-decode-failed", raw);
                    return Classification::Invalid;
                }
            },
            None => None,
        };
        let decoded_with_hash = decoded.as_deref().map(|f| format!("#{f}"));

        let predicate_verdict = match &self.predicate {
            Some(predicate) => {
                if predicate(decoded_with_hash.as_deref()) {
                    Classification::Match
                } else {
                    diagnostics.note("fragment-predicate-rejected", decoded.as_deref().unwrap_or(""));
                    Classification::NotAMatch
                }
            }
            None => Classification::Match,
        };

        if predicate_verdict.is_match() {
            return Classification::Match;
        }

        match (&self.relative_url_classifier, decoded) {
            (Some(classifier), Some(fragment)) => {
                let ctx = UrlContext::default_context();
                let sub_value = UrlValue::new(ctx, &fragment);
                let verdict = classifier.classify(&sub_value, diagnostics);
                match verdict {
                    Classification::Invalid => Classification::Invalid,
                    Classification::Match => Classification::Match,
                    Classification::NotAMatch => predicate_verdict,
                }
            }
            _ => predicate_verdict,
        }
    }
}

impl Classify for FragmentClassifier {
    fn classify(&self, url: &UrlValue, diagnostics: &dyn Receiver) -> Classification {
        self.apply(url, diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::null_receiver;

    fn classify(classifier: &FragmentClassifier, reference: &str) -> Classification {
        let ctx = UrlContext::default_context();
        let value = UrlValue::new(ctx, reference);
        classifier.apply(&value, null_receiver().as_ref())
    }

    #[test]
    fn no_configuration_is_permissive() {
        let classifier = FragmentClassifier::new(None, None);
        assert_eq!(classify(&classifier, "http://example.com/#section"), Classification::Match);
        assert_eq!(classify(&classifier, "http://example.com/"), Classification::Match);
    }

    #[test]
    fn predicate_sees_absent_fragment_as_none() {
        let predicate: FragmentPredicate = Arc::new(|f| f.is_none());
        let classifier = FragmentClassifier::new(Some(predicate), None);
        assert_eq!(classify(&classifier, "http://example.com/"), Classification::Match);
        assert_eq!(classify(&classifier, "http://example.com/#x"), Classification::NotAMatch);
    }

    #[test]
    fn predicate_receives_fragment_with_leading_hash() {
        let predicate: FragmentPredicate = Arc::new(|f| f == Some("#section"));
        let classifier = FragmentClassifier::new(Some(predicate), None);
        assert_eq!(classify(&classifier, "http://example.com/#section"), Classification::Match);
    }

    #[test]
    fn predicate_rejection_falls_through_to_absent_relative_classifier() {
        let predicate: FragmentPredicate = Arc::new(|_| false);
        let classifier = FragmentClassifier::new(Some(predicate), None);
        assert_eq!(classify(&classifier, "http://example.com/#x"), Classification::NotAMatch);
    }

    #[test]
    fn predicate_receives_percent_decoded_fragment() {
        let predicate: FragmentPredicate = Arc::new(|f| f == Some("#section name"));
        let classifier = FragmentClassifier::new(Some(predicate), None);
        assert_eq!(classify(&classifier, "http://example.com/#section%20name"), Classification::Match);
    }

    #[test]
    fn malformed_percent_encoding_in_fragment_is_invalid() {
        let predicate: FragmentPredicate = Arc::new(|_| true);
        let classifier = FragmentClassifier::new(Some(predicate), None);
        assert_eq!(classify(&classifier, "http://example.com/#bad%2"), Classification::Invalid);
    }
}
