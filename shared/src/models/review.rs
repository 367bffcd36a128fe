//! Review Model
//!
//! Reviews are embedded in their parent product document and have no
//! identity outside it. `review_id` is caller supplied and only unique by
//! convention, so every targeted update goes through a [`ReviewFilter`].

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Embedded review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Review {
    #[validate(length(min = 1, max = 64))]
    pub review_id: String,
    #[validate(length(min = 1, max = 64))]
    pub user_id: String,
    /// 1..=5, never clamped
    #[validate(range(min = 1, max = 5))]
    pub rating: u8,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
    pub verified: bool,
}

/// Partial review update (merge patch)
///
/// Absent fields are left unchanged. `review_id` is the match key and
/// cannot be patched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ReviewPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 64))]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

impl ReviewPatch {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none()
            && self.rating.is_none()
            && self.comment.is_none()
            && self.verified.is_none()
    }

    /// Merge the set fields into `review`
    pub fn apply_to(&self, review: &mut Review) {
        if let Some(user_id) = &self.user_id {
            review.user_id.clone_from(user_id);
        }
        if let Some(rating) = self.rating {
            review.rating = rating;
        }
        if let Some(comment) = &self.comment {
            review.comment = Some(comment.clone());
        }
        if let Some(verified) = self.verified {
            review.verified = verified;
        }
    }
}

/// Exact-match criteria over review fields
///
/// A review matches when every set field equals the review's value. An
/// empty filter matches every review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

impl ReviewFilter {
    /// Filter selecting reviews by their id
    pub fn by_review_id(review_id: impl Into<String>) -> Self {
        Self {
            review_id: Some(review_id.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.review_id.is_none()
            && self.user_id.is_none()
            && self.rating.is_none()
            && self.comment.is_none()
            && self.verified.is_none()
    }

    pub fn matches(&self, review: &Review) -> bool {
        self.review_id.as_ref().is_none_or(|v| *v == review.review_id)
            && self.user_id.as_ref().is_none_or(|v| *v == review.user_id)
            && self.rating.is_none_or(|v| v == review.rating)
            && self
                .comment
                .as_ref()
                .is_none_or(|v| review.comment.as_ref() == Some(v))
            && self.verified.is_none_or(|v| v == review.verified)
    }
}

impl fmt::Display for ReviewFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("any review");
        }
        let mut criteria = Vec::new();
        if let Some(v) = &self.review_id {
            criteria.push(format!("review_id = {v:?}"));
        }
        if let Some(v) = &self.user_id {
            criteria.push(format!("user_id = {v:?}"));
        }
        if let Some(v) = self.rating {
            criteria.push(format!("rating = {v}"));
        }
        if let Some(v) = &self.comment {
            criteria.push(format!("comment = {v:?}"));
        }
        if let Some(v) = self.verified {
            criteria.push(format!("verified = {v}"));
        }
        f.write_str(&criteria.join(", "))
    }
}

/// Body of `PATCH /products/{sku}/reviews/arrayfilters`
///
/// ```json
/// {
///   "filter_criteria": {"review_id": "r1001-1"},
///   "new_data": {"rating": 5}
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReviewArrayFilterUpdate {
    pub filter_criteria: ReviewFilter,
    #[validate(nested)]
    pub new_data: ReviewPatch,
}
