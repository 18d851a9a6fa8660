//! The tri-state classification verdict and the corner-case flag set.

/// The result of classifying a URL reference against a ruleset.
///
/// `INVALID` signals structural rejection (an evasion attempt, a malformed
/// reference); `NOT_A_MATCH` signals a clean negative (well-formed, just not
/// on the allow-list). `invert()` swaps `Match`/`NotAMatch` and leaves
/// `Invalid` fixed, which is what lets the `or` combinator (see
/// [`crate::classifier`]) let a later `Match` override an `Invalid` without
/// ever letting a `NotAMatch` do the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Match,
    NotAMatch,
    Invalid,
}

impl Classification {
    pub fn invert(self) -> Self {
        match self {
            Self::Match => Self::NotAMatch,
            Self::NotAMatch => Self::Match,
            Self::Invalid => Self::Invalid,
        }
    }

    pub fn is_match(self) -> bool {
        matches!(self, Self::Match)
    }
}

/// A structural ambiguity observed while resolving a reference.
///
/// Stable identifiers so callers can selectively tolerate a corner case
/// via [`crate::classifier::UrlClassifier`]'s tolerated set instead of
/// having every reference exhibiting it rejected outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CornerCase {
    /// A path segment decoded to `.` or `..` with at least one `%2E`/`%2e`.
    EncodedDotPathSegment = 0,
    /// Neither base nor reference supplied an authority, and the resolved
    /// path starts with `//` (ambiguous with a network-path reference).
    PathAuthorityAmbiguity = 1,
    /// Dot-segment removal on a relative path would have navigated above
    /// the accumulated buffer; the `..` was elided rather than letting the
    /// path gain a synthetic leading `/`.
    RelativeUrlMergedToAbsolute = 2,
}

bitflags::bitflags! {
    /// The set of [`CornerCase`]s observed (or tolerated) for a reference.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CornerCaseSet: u8 {
        const ENCODED_DOT_PATH_SEGMENT = 1 << 0;
        const PATH_AUTHORITY_AMBIGUITY = 1 << 1;
        const RELATIVE_URL_MERGED_TO_ABSOLUTE = 1 << 2;
    }
}

impl CornerCaseSet {
    pub fn insert_case(&mut self, case: CornerCase) {
        self.insert(Self::from_bits_truncate(1 << case as u8));
    }

    pub fn contains_case(self, case: CornerCase) -> bool {
        self.contains(Self::from_bits_truncate(1 << case as u8))
    }

    /// True if any flag in `self` is absent from `tolerated`.
    pub fn has_untolerated(self, tolerated: CornerCaseSet) -> bool {
        !self.difference(tolerated).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invert_swaps_match_and_not_a_match() {
        assert_eq!(Classification::Match.invert(), Classification::NotAMatch);
        assert_eq!(Classification::NotAMatch.invert(), Classification::Match);
    }

    #[test]
    fn invert_fixes_invalid() {
        assert_eq!(Classification::Invalid.invert(), Classification::Invalid);
    }

    #[test]
    fn double_invert_is_identity() {
        for c in [Classification::Match, Classification::NotAMatch, Classification::Invalid] {
            assert_eq!(c.invert().invert(), c);
        }
    }

    #[test]
    fn corner_case_set_tracks_individual_flags() {
        let mut set = CornerCaseSet::empty();
        assert!(!set.contains_case(CornerCase::EncodedDotPathSegment));
        set.insert_case(CornerCase::EncodedDotPathSegment);
        assert!(set.contains_case(CornerCase::EncodedDotPathSegment));
        assert!(!set.contains_case(CornerCase::PathAuthorityAmbiguity));
    }

    #[test]
    fn has_untolerated_respects_tolerated_set() {
        let mut observed = CornerCaseSet::empty();
        observed.insert_case(CornerCase::EncodedDotPathSegment);
        assert!(observed.has_untolerated(CornerCaseSet::empty()));
        assert!(!observed.has_untolerated(CornerCaseSet::ENCODED_DOT_PATH_SEGMENT));
    }
}
