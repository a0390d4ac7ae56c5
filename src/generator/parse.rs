//! Pull a caption body and hashtags out of free-form model output.
//!
//! The body is taken from a labelled `Body:` section when there is one,
//! otherwise from the first text starting with the disclosure marker. In both
//! cases it runs until the hashtag section, a line starting with `#`, or the
//! end of the reply. Hashtags are collected from the whole reply.

use lazy_static::lazy_static;
use regex::Regex;

use crate::domain::generated_post::DISCLOSURE_MARKER;

/// Hashtags kept from a reply; later ones are dropped.
pub const MAX_HASHTAGS: usize = 7;

lazy_static! {
    pub(crate) static ref HASHTAG: Regex = Regex::new(r"#\w+").expect("hashtag pattern");
    static ref BODY_LABEL: Regex =
        Regex::new(r"(?im)^[^\w\n]*body[^\w\n]*\n").expect("body label pattern");
    static ref HASHTAG_LABEL: Regex =
        Regex::new(r"(?im)^[^\w\n]*hashtags?[^\w\n]*$").expect("hashtag label pattern");
    static ref MARKER_LINE: Regex =
        Regex::new(&format!(r"(?m)^[ \t]*{DISCLOSURE_MARKER}")).expect("marker line pattern");
}

/// Structured view of one model reply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedReply {
    pub body: String,
    pub hashtags: Vec<String>,
}

impl ParsedReply {
    /// A reply without a body cannot be used at all.
    pub fn succeeded(&self) -> bool {
        !self.body.is_empty()
    }
}

pub fn parse_reply(text: &str) -> ParsedReply {
    ParsedReply {
        body: extract_body(text).unwrap_or_default(),
        hashtags: extract_hashtags(text, MAX_HASHTAGS),
    }
}

/// Tag-shaped tokens in order of appearance, at most `limit`.
pub fn extract_hashtags(text: &str, limit: usize) -> Vec<String> {
    HASHTAG
        .find_iter(text)
        .take(limit)
        .map(|tag| tag.as_str().to_string())
        .collect()
}

fn extract_body(text: &str) -> Option<String> {
    labelled_body(text)
        .filter(|body| !body.is_empty())
        .or_else(|| marker_body(text))
        .filter(|body| !body.is_empty())
}

fn labelled_body(text: &str) -> Option<String> {
    let label = BODY_LABEL.find(text)?;
    Some(section_until_tags(&text[label.end()..]))
}

fn marker_body(text: &str) -> Option<String> {
    let start = match MARKER_LINE.find(text) {
        Some(line) => line.end() - DISCLOSURE_MARKER.len(),
        None => text.find(DISCLOSURE_MARKER)?,
    };
    Some(section_until_tags(&text[start..]))
}

/// Text up to the hashtag label, the first line opening with `#`, or the end.
fn section_until_tags(rest: &str) -> String {
    let label_start = HASHTAG_LABEL.find(rest).map(|label| label.start());
    let tag_line_start = rest.find("\n#");
    let end = [label_start, tag_line_start]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(rest.len());
    rest[..end].trim().to_string()
}
