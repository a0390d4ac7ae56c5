use serde::{Deserialize, Serialize};

/// Literal every caption must start with to mark sponsored content.
pub const DISCLOSURE_MARKER: &str = "PR";

/// Tone presets offered to the copy generator, in preference order.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PostStyle {
    Enthusiastic,
    #[default]
    Casual,
    Informative,
    Story,
}

impl PostStyle {
    pub const ALL: [PostStyle; 4] = [
        PostStyle::Enthusiastic,
        PostStyle::Casual,
        PostStyle::Informative,
        PostStyle::Story,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PostStyle::Enthusiastic => "enthusiastic",
            PostStyle::Casual => "casual",
            PostStyle::Informative => "informative",
            PostStyle::Story => "story",
        }
    }

    /// Writing instruction embedded in the prompt for this style.
    pub fn instruction(&self) -> &'static str {
        match self {
            PostStyle::Enthusiastic => {
                "Write with high energy and excitement, stressing what makes the product great."
            }
            PostStyle::Casual => "Write casually and warmly, as if talking to a friend.",
            PostStyle::Informative => {
                "Explain the product's features and how to use it clearly and simply."
            }
            PostStyle::Story => {
                "Write it as a first-hand experience, with a before-and-after feel."
            }
        }
    }
}

impl std::str::FromStr for PostStyle {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        PostStyle::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown post style `{value}`"))
    }
}

/// Marketing copy produced for one publish attempt.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeneratedPost {
    pub style: PostStyle,
    /// Free text that starts with the disclosure marker.
    pub body: String,
    /// Tags including the leading `#`, in order of appearance.
    pub hashtags: Vec<String>,
    /// Body followed by a blank line and the space-separated hashtags.
    pub full_text: String,
}

impl GeneratedPost {
    /// Assemble a post, deriving `full_text` from the body and hashtags.
    pub fn new(style: PostStyle, body: impl Into<String>, hashtags: Vec<String>) -> Self {
        let body = body.into();
        let full_text = if hashtags.is_empty() {
            body.clone()
        } else {
            format!("{body}\n\n{}", hashtags.join(" "))
        };
        Self {
            style,
            body,
            hashtags,
            full_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_text_joins_body_and_tags() {
        let post = GeneratedPost::new(
            PostStyle::Casual,
            "PR nice fan",
            vec!["#a".into(), "#b".into()],
        );
        assert_eq!(post.full_text, "PR nice fan\n\n#a #b");
    }

    #[test]
    fn style_parses_case_insensitively() {
        assert_eq!("Story".parse::<PostStyle>(), Ok(PostStyle::Story));
        assert!("loud".parse::<PostStyle>().is_err());
    }
}
