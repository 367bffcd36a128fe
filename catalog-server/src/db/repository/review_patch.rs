//! Review patch planning
//!
//! Applies a [`ReviewPatch`] to the reviews selected by a [`ReviewFilter`],
//! in memory. The repository persists the result with a compare-and-set
//! write, so this module never talks to the store.

use shared::models::{Review, ReviewFilter, ReviewPatch};

/// How many matching reviews a patch targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Only the first match in array order; no match is an error
    First,
    /// Every match; no match is a successful no-op
    All,
}

/// Patch the matching reviews in place, returning how many matched
pub fn apply(
    reviews: &mut [Review],
    filter: &ReviewFilter,
    patch: &ReviewPatch,
    cardinality: Cardinality,
) -> usize {
    let mut matched = 0;
    for review in reviews.iter_mut().filter(|r| filter.matches(r)) {
        patch.apply_to(review);
        matched += 1;
        if cardinality == Cardinality::First {
            break;
        }
    }
    matched
}
