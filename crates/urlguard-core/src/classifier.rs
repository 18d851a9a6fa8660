//! The `or` combinator algebra and the top-level URL classifier (spec §4.9,
//! §4.11).

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::diagnostics::Receiver;
use crate::pathglob::PathGlob;
use crate::percent;
use crate::url::UrlValue;
use crate::verdict::{Classification, CornerCaseSet};

/// Anything that can render a verdict over a [`UrlValue`], buffering
/// diagnostics through `diagnostics`.
pub trait Classify: Send + Sync {
    fn classify(&self, url: &UrlValue, diagnostics: &dyn Receiver) -> Classification;

    /// Overridden by [`Or`] so `Or::new` can flatten nested `or`s without
    /// downcasting.
    fn as_or(&self) -> Option<&Or> {
        None
    }
}

/// The disjunction combinator (spec §4.11): flattens nested `or`s of the
/// same kind, canonicalizes zero/one operands, and evaluates left-to-right
/// with `Invalid` sticky until a later child returns `Match`.
pub struct Or {
    children: Vec<Arc<dyn Classify>>,
}

impl Or {
    pub fn new(operands: Vec<Arc<dyn Classify>>) -> Arc<dyn Classify> {
        let mut flat: Vec<Arc<dyn Classify>> = Vec::new();
        for operand in operands {
            match operand.as_or() {
                Some(or) => flat.extend(or.children.iter().cloned()),
                None => flat.push(operand),
            }
        }
        match flat.len() {
            0 => Arc::new(AlwaysNotAMatch),
            1 => flat.into_iter().next().unwrap(),
            _ => Arc::new(Or { children: flat }),
        }
    }

    pub fn children(&self) -> &[Arc<dyn Classify>] {
        &self.children
    }

    /// Structural equality on the child sequence: same length, same
    /// children in the same order. Children are compared by `Arc` identity
    /// since `Classify` carries no `PartialEq` bound.
    pub fn equals(&self, other: &Or) -> bool {
        self.children.len() == other.children.len()
            && self.children.iter().zip(other.children.iter()).all(|(a, b)| Arc::ptr_eq(a, b))
    }
}

impl Classify for Or {
    fn classify(&self, url: &UrlValue, diagnostics: &dyn Receiver) -> Classification {
        // Initial sentinel is MATCH ("none-so-far"); if no child ever
        // returns MATCH or INVALID, the loop falls through with the
        // sentinel still set, which must read back as NOT_A_MATCH.
        let mut running = Classification::Match;
        for child in &self.children {
            match child.classify(url, diagnostics) {
                Classification::Match => return Classification::Match,
                Classification::Invalid => running = Classification::Invalid,
                Classification::NotAMatch => {}
            }
        }
        match running {
            Classification::Invalid => Classification::Invalid,
            _ => Classification::NotAMatch,
        }
    }

    fn as_or(&self) -> Option<&Or> {
        Some(self)
    }
}

/// The canonical zero element for an empty `or` (spec §4.11 "Simplify").
struct AlwaysNotAMatch;

impl Classify for AlwaysNotAMatch {
    fn classify(&self, _url: &UrlValue, _diagnostics: &dyn Receiver) -> Classification {
        Classification::NotAMatch
    }
}

/// The top-level classifier: fixed evaluation order over the configured
/// sub-classifiers (spec §4.9, builder options in §6 "Top-level").
pub struct UrlClassifier {
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

impl UrlClassifier {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
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
    ) -> Self {
        Self {
            allowed_schemes,
            authority_classifier,
            positive_path_globs,
            negative_path_globs,
            media_type_classifier,
            content_classifier,
            query_classifier,
            fragment_classifier,
            allow_nul,
            allow_root_parent,
            tolerated_corner_cases,
        }
    }

    pub fn apply(&self, url: &UrlValue, diagnostics: &dyn Receiver) -> Classification {
        // 1. untolerated corner case.
        if url.corner_cases().has_untolerated(self.tolerated_corner_cases) {
            log::debug!("untolerated corner case for {}", url.url_text());
            diagnostics.note("untolerated-corner-case", url.url_text());
            return Classification::Invalid;
        }

        // 2. raw NUL.
        if !self.allow_nul && url.original_url_text().contains('\0') {
            log::debug!("nul byte in reference {}", url.original_url_text());
            diagnostics.note("nul-byte-in-reference", url.original_url_text());
            return Classification::Invalid;
        }

        // 3. undecomposable scheme.
        let Some(ranges) = url.ranges() else {
            log::debug!("scheme could not decompose {}", url.url_text());
            diagnostics.note("scheme-undecomposable", url.url_text());
            return Classification::Invalid;
        };

        // 4. scheme allow-list.
        if let Some(allowed) = &self.allowed_schemes {
            if !allowed.contains(&url.scheme().name) {
                log::debug!("scheme {} not in allow list", url.scheme().name);
                diagnostics.note("scheme-not-allowed", &url.scheme().name);
                return Classification::NotAMatch;
            }
        }

        // 5. authority.
        if url.scheme().naturally_has_authority() || ranges.authority.is_some() {
            if let Some(authority) = &self.authority_classifier {
                let verdict = run_step(authority.as_ref(), url, diagnostics);
                if !verdict.is_match() {
                    return verdict;
                }
            }
        }

        // 6. path.
        if let Some(raw_path) = url.path() {
            let decoded_path = match percent::decode_all(raw_path, false, false) {
                Some(decoded) => decoded,
                None => {
                    log::debug!("path failed to percent-decode: {raw_path}");
                    diagnostics.note("path-decode-failed", raw_path);
                    return Classification::Invalid;
                }
            };

            if url.path_simplification_reached_roots_parent() && !self.allow_root_parent {
                log::debug!("path simplification reached root's parent: {decoded_path}");
                diagnostics.note("path-reached-roots-parent", &decoded_path);
                return Classification::NotAMatch;
            }

            for glob in &self.negative_path_globs {
                if glob.matches_decoded_path(&decoded_path) {
                    log::debug!("path matched negative glob {}", glob.source());
                    diagnostics.note("path-matched-negative-glob", glob.source());
                    return Classification::NotAMatch;
                }
            }

            if !self.positive_path_globs.is_empty()
                && !self.positive_path_globs.iter().any(|glob| glob.matches_decoded_path(&decoded_path))
            {
                log::debug!("path matched no positive glob: {decoded_path}");
                diagnostics.note("path-matched-no-positive-glob", &decoded_path);
                return Classification::NotAMatch;
            }
        }

        // 7. media type.
        if url.content_media_type().is_some() {
            if let Some(classifier) = &self.media_type_classifier {
                let verdict = run_step(classifier.as_ref(), url, diagnostics);
                if !verdict.is_match() {
                    return verdict;
                }
            }
        }

        // 8. content.
        if url.scheme().naturally_has_content() || ranges.content.is_some() {
            if let Some(classifier) = &self.content_classifier {
                let verdict = run_step(classifier.as_ref(), url, diagnostics);
                if !verdict.is_match() {
                    return verdict;
                }
            }
        }

        // 9. query.
        if url.scheme().naturally_has_query() || ranges.query.is_some() {
            if let Some(classifier) = &self.query_classifier {
                let verdict = run_step(classifier.as_ref(), url, diagnostics);
                if !verdict.is_match() {
                    return verdict;
                }
            }
        }

        // 10. fragment: final verdict.
        match &self.fragment_classifier {
            Some(classifier) => run_step(classifier.as_ref(), url, diagnostics),
            None => Classification::Match,
        }
    }
}

impl Classify for UrlClassifier {
    fn classify(&self, url: &UrlValue, diagnostics: &dyn Receiver) -> Classification {
        self.apply(url, diagnostics)
    }
}

/// Buffers one step's diagnostics so they can be discarded on `MATCH`
/// without ever reaching `diagnostics` (spec §4.9's final paragraph /
/// §4.10's "flush" semantics, scoped to a single step).
struct StepBuffer {
    notes: Mutex<Vec<(String, String)>>,
}

impl Receiver for StepBuffer {
    fn note(&self, diagnostic: &str, context: &str) {
        self.notes.lock().unwrap().push((diagnostic.to_string(), context.to_string()));
    }
}

/// Runs one evaluation step through a per-step buffer, flushing into
/// `diagnostics` only on a non-`MATCH` verdict.
fn run_step(classifier: &dyn Classify, url: &UrlValue, diagnostics: &dyn Receiver) -> Classification {
    let step = StepBuffer { notes: Mutex::new(Vec::new()) };
    let verdict = classifier.classify(url, &step);
    if !verdict.is_match() {
        log::debug!("step short-circuited to {verdict:?} for {}", url.url_text());
        for (note, context) in step.notes.lock().unwrap().iter() {
            diagnostics.note(note, context);
        }
    }
    verdict
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::null_receiver;
    use crate::url::UrlContext;

    struct Always(Classification);

    impl Classify for Always {
        fn classify(&self, _url: &UrlValue, _diagnostics: &dyn Receiver) -> Classification {
            self.0
        }
    }

    fn value(reference: &str) -> UrlValue {
        UrlValue::new(UrlContext::default_context(), reference)
    }

    #[test]
    fn or_of_zero_operands_is_canonical_not_a_match() {
        let or = Or::new(vec![]);
        assert_eq!(or.classify(&value("http://example.com/"), null_receiver().as_ref()), Classification::NotAMatch);
    }

    #[test]
    fn or_of_one_operand_is_that_operand() {
        let child: Arc<dyn Classify> = Arc::new(Always(Classification::Invalid));
        let or = Or::new(vec![child.clone()]);
        assert!(Arc::ptr_eq(&or, &child));
    }

    #[test]
    fn later_match_overrides_earlier_invalid() {
        let a: Arc<dyn Classify> = Arc::new(Always(Classification::Invalid));
        let b: Arc<dyn Classify> = Arc::new(Always(Classification::Match));
        let or = Or::new(vec![a, b]);
        assert_eq!(or.classify(&value("http://example.com/"), null_receiver().as_ref()), Classification::Match);
    }

    #[test]
    fn not_a_match_does_not_override_invalid() {
        let a: Arc<dyn Classify> = Arc::new(Always(Classification::Invalid));
        let b: Arc<dyn Classify> = Arc::new(Always(Classification::NotAMatch));
        let or = Or::new(vec![a, b]);
        assert_eq!(or.classify(&value("http://example.com/"), null_receiver().as_ref()), Classification::Invalid);
    }

    #[test]
    fn all_children_not_a_match_is_not_a_match() {
        let a: Arc<dyn Classify> = Arc::new(Always(Classification::NotAMatch));
        let b: Arc<dyn Classify> = Arc::new(Always(Classification::NotAMatch));
        let or = Or::new(vec![a, b]);
        assert_eq!(or.classify(&value("http://example.com/"), null_receiver().as_ref()), Classification::NotAMatch);
    }

    #[test]
    fn nested_or_flattens() {
        let a: Arc<dyn Classify> = Arc::new(Always(Classification::NotAMatch));
        let b: Arc<dyn Classify> = Arc::new(Always(Classification::NotAMatch));
        let inner = Or::new(vec![a, b]);
        let c: Arc<dyn Classify> = Arc::new(Always(Classification::Match));
        let outer = Or::new(vec![inner, c]);
        let flattened = outer.as_or().expect("outer should still be an Or after flattening a 2-child inner");
        assert_eq!(flattened.children().len(), 3);
    }

    #[test]
    fn scheme_not_in_allow_list_is_not_a_match() {
        let mut allowed = HashSet::new();
        allowed.insert("https".to_string());
        let classifier = UrlClassifier::new(Some(allowed), None, vec![], vec![], None, None, None, None, false, false, CornerCaseSet::empty());
        assert_eq!(classifier.apply(&value("http://example.com/"), null_receiver().as_ref()), Classification::NotAMatch);
    }

    #[test]
    fn empty_classifier_matches_anything_well_formed() {
        let classifier = UrlClassifier::new(None, None, vec![], vec![], None, None, None, None, false, false, CornerCaseSet::empty());
        assert_eq!(classifier.apply(&value("http://example.com/a/b?q=1#f"), null_receiver().as_ref()), Classification::Match);
    }

    #[test]
    fn root_parent_overrun_is_not_a_match_unless_allowed() {
        let classifier = UrlClassifier::new(None, None, vec![], vec![], None, None, None, None, false, false, CornerCaseSet::empty());
        assert_eq!(classifier.apply(&value("http://example.com/../.."), null_receiver().as_ref()), Classification::NotAMatch);

        let lenient = UrlClassifier::new(None, None, vec![], vec![], None, None, None, None, false, true, CornerCaseSet::empty());
        assert_eq!(lenient.apply(&value("http://example.com/../.."), null_receiver().as_ref()), Classification::Match);
    }

    #[test]
    fn positive_path_glob_must_match() {
        let positive = vec![PathGlob::compile("/allowed/*").unwrap()];
        let classifier = UrlClassifier::new(None, None, positive, vec![], None, None, None, None, false, false, CornerCaseSet::empty());
        assert_eq!(classifier.apply(&value("http://example.com/allowed/x"), null_receiver().as_ref()), Classification::Match);
        assert_eq!(classifier.apply(&value("http://example.com/other"), null_receiver().as_ref()), Classification::NotAMatch);
    }
}
