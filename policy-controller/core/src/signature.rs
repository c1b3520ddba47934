use chrono::{DateTime, Utc};

pub type Timestamp = DateTime<Utc>;

/// Bounds the revision time of a signature that may satisfy a requirement.
///
/// Either bound may be omitted. Both bounds are exclusive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RevisionWindow {
    pub min: Option<Timestamp>,
    pub max: Option<Timestamp>,
}

/// A policy's demand for a user-defined signature with a given tag.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SignatureRequirement {
    pub tag: String,
    pub revision_window: Option<RevisionWindow>,
}

/// The parts of a user-defined signature that requirements are matched against.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Signature<'s> {
    pub tag: &'s str,
    pub revision_time: Option<Timestamp>,
}

// === impl RevisionWindow ===

impl RevisionWindow {
    pub fn new(min: Option<Timestamp>, max: Option<Timestamp>) -> Self {
        Self { min, max }
    }

    /// Tests a revision time against the window.
    ///
    /// When both bounds are set the revision must fall strictly between them. Otherwise the
    /// upper bound is tried before the lower bound, and a revision that fails the one bound
    /// that is set does not match. A window without bounds matches no revision.
    pub fn contains(&self, revision: Timestamp) -> bool {
        match (self.min, self.max) {
            (Some(min), Some(max)) => min < revision && revision < max,
            (_, Some(max)) if revision < max => true,
            (Some(min), _) if revision > min => true,
            _ => false,
        }
    }
}

// === impl SignatureRequirement ===

impl SignatureRequirement {
    pub fn new(tag: impl Into<String>, revision_window: Option<RevisionWindow>) -> Self {
        Self {
            tag: tag.into(),
            revision_window,
        }
    }

    /// Returns true if the signature carries this requirement's tag and, when both sides
    /// carry revision information, its revision falls in the requirement's window.
    ///
    /// Signatures without a tag never satisfy a requirement.
    pub fn is_satisfied_by(&self, sig: Signature<'_>) -> bool {
        if sig.tag.is_empty() || sig.tag != self.tag {
            return false;
        }

        match (&self.revision_window, sig.revision_time) {
            (Some(window), Some(revision)) => window.contains(revision),
            _ => true,
        }
    }

    pub fn is_satisfied_by_any(&self, sigs: &[Signature<'_>]) -> bool {
        sigs.iter().any(|sig| self.is_satisfied_by(*sig))
    }
}

/// Returns true if every requirement is satisfied by at least one of `sigs`.
///
/// `sigs` must only hold signatures that are currently valid.
pub fn requirements_satisfied(reqs: &[SignatureRequirement], sigs: &[Signature<'_>]) -> bool {
    reqs.iter().all(|req| req.is_satisfied_by_any(sigs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ts(s: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(s)
            .expect("timestamp must parse")
            .with_timezone(&Utc)
    }

    fn window(min: Option<&str>, max: Option<&str>) -> Option<RevisionWindow> {
        Some(RevisionWindow::new(min.map(ts), max.map(ts)))
    }

    const REVISION: &str = "2020-06-16T18:32:01Z";

    #[rstest]
    #[case::within_min_and_max(
        "test",
        window(Some("2020-01-21T18:32:02Z"), Some("2020-10-23T18:32:02Z")),
        true
    )]
    #[case::outside_min_and_max(
        "test",
        window(Some("2021-01-21T18:32:02Z"), Some("2022-01-23T18:32:02Z")),
        false
    )]
    #[case::before_max(
        "test",
        window(None, Some("2022-01-23T18:32:02Z")),
        true
    )]
    #[case::after_max(
        "test",
        window(None, Some("2019-01-23T18:32:02Z")),
        false
    )]
    #[case::after_min(
        "test",
        window(Some("2019-01-23T18:32:02Z"), None),
        true
    )]
    #[case::before_min(
        "test",
        window(Some("2022-01-23T18:32:02Z"), None),
        false
    )]
    #[case::different_tag("testing", window(Some("2019-01-23T18:32:02Z"), None), false)]
    #[case::different_tag_no_window("testing", None, false)]
    #[case::matching_tag_no_window("test", None, true)]
    fn signature_with_revision(
        #[case] tag: &str,
        #[case] revision_window: Option<RevisionWindow>,
        #[case] expected: bool,
    ) {
        let req = SignatureRequirement::new(tag, revision_window);
        let sig = Signature {
            tag: "test",
            revision_time: Some(ts(REVISION)),
        };
        assert_eq!(req.is_satisfied_by(sig), expected);
    }

    #[test]
    fn signature_without_revision_ignores_window() {
        let req = SignatureRequirement::new("test", window(Some("2019-01-23T18:32:02Z"), None));
        let sig = Signature {
            tag: "test",
            revision_time: None,
        };
        assert!(req.is_satisfied_by(sig));
    }

    #[test]
    fn window_bounds_are_exclusive() {
        let req = SignatureRequirement::new("test", window(Some(REVISION), Some(REVISION)));
        let sig = Signature {
            tag: "test",
            revision_time: Some(ts(REVISION)),
        };
        assert!(!req.is_satisfied_by(sig));

        let req = SignatureRequirement::new("test", window(None, Some(REVISION)));
        assert!(!req.is_satisfied_by(sig));

        let req = SignatureRequirement::new("test", window(Some(REVISION), None));
        assert!(!req.is_satisfied_by(sig));
    }

    #[test]
    fn unbounded_window_only_matches_signatures_without_revision() {
        let req = SignatureRequirement::new("test", window(None, None));
        let sig = Signature {
            tag: "test",
            revision_time: Some(ts(REVISION)),
        };
        assert!(!req.is_satisfied_by(sig));

        let sig = Signature {
            tag: "test",
            revision_time: None,
        };
        assert!(req.is_satisfied_by(sig));
    }

    #[test]
    fn empty_tag_never_matches() {
        let req = SignatureRequirement::new("", None);
        let sig = Signature {
            tag: "",
            revision_time: None,
        };
        assert!(!req.is_satisfied_by(sig));
    }

    #[test]
    fn every_requirement_must_be_satisfied() {
        let a = Signature {
            tag: "a",
            revision_time: None,
        };
        let b = Signature {
            tag: "b",
            revision_time: Some(ts(REVISION)),
        };
        let reqs = vec![
            SignatureRequirement::new("a", None),
            SignatureRequirement::new("b", window(None, Some("2021-01-01T00:00:00Z"))),
        ];

        assert!(requirements_satisfied(&reqs, &[a, b]));
        assert!(!requirements_satisfied(&reqs, &[a]));
        assert!(!requirements_satisfied(&reqs, &[]));
        assert!(requirements_satisfied(&[], &[]));
    }
}
