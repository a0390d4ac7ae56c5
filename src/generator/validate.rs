use thiserror::Error;

use super::parse::HASHTAG;
use crate::domain::generated_post::DISCLOSURE_MARKER;

pub const MAX_BODY_CHARS: usize = 300;
pub const MIN_HASHTAGS: usize = 5;
pub const MAX_HASHTAGS: usize = 7;

/// One broken caption rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("body is {0} characters, at most 300 allowed")]
    BodyTooLong(usize),
    #[error("caption does not start with the PR disclosure")]
    MissingDisclosure,
    #[error("{0} hashtags, at least 5 required")]
    TooFewHashtags(usize),
    #[error("{0} hashtags, at most 7 allowed")]
    TooManyHashtags(usize),
}

/// Check a full caption against the posting rules. An empty list means the
/// caption may be published.
///
/// The body length is counted in characters with every hashtag removed.
pub fn validate_post_text(text: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let body_chars = HASHTAG.replace_all(text, "").trim().chars().count();
    if body_chars > MAX_BODY_CHARS {
        issues.push(ValidationIssue::BodyTooLong(body_chars));
    }

    if !text.trim_start().starts_with(DISCLOSURE_MARKER) {
        issues.push(ValidationIssue::MissingDisclosure);
    }

    let tag_count = HASHTAG.find_iter(text).count();
    if tag_count < MIN_HASHTAGS {
        issues.push(ValidationIssue::TooFewHashtags(tag_count));
    } else if tag_count > MAX_HASHTAGS {
        issues.push(ValidationIssue::TooManyHashtags(tag_count));
    }

    issues
}
