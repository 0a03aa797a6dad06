//! Merging predicted annotations into an accepted set.
//!
//! The accepted set is append-only and seeded with the document's existing
//! (human-labeled) annotations. A predicted candidate either survives intact
//! or is discarded — overlapping spans are never fused into a union, and
//! nothing already accepted is ever removed or re-sorted.

use stitch_core::Annotation;

/// Boundary-inclusive overlap test between a candidate and one accepted
/// annotation.
///
/// A candidate whose start *or* end lands exactly on an accepted boundary
/// counts as overlapping, which favors rejecting borderline candidates over
/// accepting near-duplicates.
///
/// Known limitation: a candidate that strictly contains an accepted span,
/// with both endpoints outside it, is not detected. Datasets produced by
/// this tool depend on that behavior, so widening the predicate would
/// reclassify spans that earlier runs accepted.
#[must_use]
pub fn overlaps(candidate: &Annotation, accepted: &Annotation) -> bool {
    (candidate.start_offset >= accepted.start_offset
        && candidate.start_offset <= accepted.end_offset)
        || (candidate.end_offset >= accepted.start_offset
            && candidate.end_offset <= accepted.end_offset)
}

/// Check a candidate against every accepted annotation.
#[must_use]
pub fn overlaps_any(candidate: &Annotation, accepted: &[Annotation]) -> bool {
    accepted.iter().any(|a| overlaps(candidate, a))
}

/// Merge a candidate into the accepted set.
///
/// Appends the candidate (preserving discovery order) and returns `true`
/// when it conflicts with nothing; returns `false` and leaves the set
/// untouched otherwise.
pub fn reconcile(accepted: &mut Vec<Annotation>, candidate: Annotation) -> bool {
    if overlaps_any(&candidate, accepted) {
        return false;
    }
    accepted.push(candidate);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann(start: usize, end: usize) -> Annotation {
        Annotation::new("phone_num", start, end)
    }

    #[test]
    fn candidate_inside_existing_is_rejected() {
        let mut accepted = vec![ann(5, 10)];
        assert!(!reconcile(&mut accepted, ann(8, 12)));
        assert_eq!(accepted.len(), 1);
    }

    #[test]
    fn disjoint_candidate_is_appended() {
        let mut accepted = vec![ann(5, 10)];
        assert!(reconcile(&mut accepted, ann(11, 15)));
        assert_eq!(accepted.len(), 2);
        assert_eq!(accepted[1], ann(11, 15));
    }

    #[test]
    fn touching_boundary_is_rejected() {
        // start == existing.end counts as overlap; one past it does not.
        let existing = ann(5, 10);
        assert!(overlaps(&ann(10, 15), &existing));
        assert!(!overlaps(&ann(11, 15), &existing));
        // Symmetric at the other boundary.
        assert!(overlaps(&ann(0, 5), &existing));
        assert!(!overlaps(&ann(0, 4), &existing));
    }

    #[test]
    fn reconcile_is_idempotent() {
        let mut once = vec![ann(0, 3)];
        reconcile(&mut once, ann(10, 14));

        let mut twice = vec![ann(0, 3)];
        reconcile(&mut twice, ann(10, 14));
        // Second attempt overlaps the first copy and changes nothing.
        assert!(!reconcile(&mut twice, ann(10, 14)));
        assert_eq!(once, twice);
    }

    #[test]
    fn containment_gap_is_preserved() {
        // A candidate strictly containing an accepted span slips through:
        // neither of its endpoints falls inside [5, 10].
        let mut accepted = vec![ann(5, 10)];
        assert!(reconcile(&mut accepted, ann(2, 13)));
        assert_eq!(accepted.len(), 2);
    }

    #[test]
    fn rejection_checks_every_accepted_annotation() {
        let mut accepted = vec![ann(0, 3), ann(20, 25), ann(40, 45)];
        assert!(!reconcile(&mut accepted, ann(24, 30)));
        assert_eq!(accepted.len(), 3);
    }

    #[test]
    fn order_is_discovery_order_never_sorted() {
        let mut accepted = vec![ann(50, 55)];
        reconcile(&mut accepted, ann(30, 35));
        reconcile(&mut accepted, ann(0, 5));
        let starts: Vec<usize> = accepted.iter().map(|a| a.start_offset).collect();
        assert_eq!(starts, vec![50, 30, 0]);
    }
}
