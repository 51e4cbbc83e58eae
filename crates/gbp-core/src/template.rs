//! Reply templates with review placeholders.
//!
//! Supported placeholders:
//!
//! | Placeholder       | Value                                            |
//! |-------------------|--------------------------------------------------|
//! | `{reviewer_name}` | reviewer display name, `Customer` when anonymous |
//! | `{star_rating}`   | number of stars (`0` when unspecified)           |
//! | `{comment}`       | review text, empty when absent                   |
//! | `{review_id}`     | review id, falling back to the resource name     |
//!
//! Unknown placeholders are left untouched.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::model::Review;

static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("Invalid placeholder regex"));

/// Name used when a review has no displayable reviewer name.
pub const ANONYMOUS_REVIEWER: &str = "Customer";

/// A reply text with `{placeholder}` slots filled from a review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTemplate {
    text: String,
}

impl ReplyTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Renders the template for one review.
    pub fn render(&self, review: &Review) -> String {
        PLACEHOLDER_REGEX
            .replace_all(&self.text, |caps: &Captures<'_>| {
                placeholder_value(&caps[1], review)
                    .map(Cow::into_owned)
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

impl Default for ReplyTemplate {
    fn default() -> Self {
        Self::new("Thank you for your review!")
    }
}

impl From<&str> for ReplyTemplate {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for ReplyTemplate {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

fn placeholder_value<'a>(key: &str, review: &'a Review) -> Option<Cow<'a, str>> {
    let value = match key {
        "reviewer_name" => Cow::Borrowed(review.reviewer_name().unwrap_or(ANONYMOUS_REVIEWER)),
        "star_rating" => Cow::Owned(
            review
                .star_rating
                .map(|r| r.stars())
                .unwrap_or_default()
                .to_string(),
        ),
        "comment" => Cow::Borrowed(review.comment.as_deref().unwrap_or_default()),
        "review_id" => Cow::Borrowed(review.review_id.as_deref().unwrap_or(&review.name)),
        _ => return None,
    };
    Some(value)
}
