//! Candidate selection.

use crate::directory::Candidate;

/// The closest candidate, or `None` if the slice is empty.
///
/// A candidate only displaces the current best when it is strictly closer,
/// so among equal distances the first in enumeration order wins.
pub fn nearest(candidates: &[Candidate]) -> Option<Candidate> {
    // min_by_key returns the first of several equal minimums
    candidates.iter().min_by_key(|c| c.distance).cloned()
}
