//! Marketing copy generation: prompt, parse, validate, retry.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};
use thiserror::Error;

use crate::domain::generated_post::{DISCLOSURE_MARKER, GeneratedPost, PostStyle};
use crate::domain::product::Product;

pub mod anthropic;
pub mod parse;
pub mod validate;

#[cfg(test)]
pub mod mock;

pub use anthropic::AnthropicClient;
pub use parse::{ParsedReply, parse_reply};
pub use validate::{ValidationIssue, validate_post_text};

/// Retries after the first attempt when nothing else is configured.
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_LANGUAGE: &str = "Japanese";

/// Failure of a single call to the text generation service.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("generation request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("generation API error ({kind}): {message}")]
    Api { kind: String, message: String },
    #[error("generation API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed generation response: {0}")]
    Malformed(String),
}

/// Text completion service used to draft captions.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GeneratorError>;
}

/// Why one generation attempt produced nothing usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    Service(String),
    EmptyBody,
    Invalid(Vec<ValidationIssue>),
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::Service(message) => write!(f, "service error: {message}"),
            AttemptFailure::EmptyBody => f.write_str("no body could be extracted"),
            AttemptFailure::Invalid(issues) => {
                let issues: Vec<String> = issues.iter().map(ToString::to_string).collect();
                write!(f, "invalid caption: {}", issues.join(", "))
            }
        }
    }
}

/// Every attempt failed; one entry per attempt in order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct GenerationError {
    pub attempts: Vec<AttemptFailure>,
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no valid caption after {} attempt(s)",
            self.attempts.len()
        )?;
        for (index, failure) in self.attempts.iter().enumerate() {
            write!(f, "; attempt {}: {failure}", index + 1)?;
        }
        Ok(())
    }
}

pub struct ContentGenerator {
    client: Arc<dyn TextGenerator>,
    language: String,
}

impl ContentGenerator {
    pub fn new(client: Arc<dyn TextGenerator>) -> Self {
        Self {
            client,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn build_prompt(&self, product: &Product, style: PostStyle) -> String {
        let price = product
            .price
            .map(|price| format!("{price} yen"))
            .unwrap_or_else(|| "unknown".to_string());
        let category = product.category.as_deref().unwrap_or("unknown");
        let description = product
            .description
            .as_deref()
            .unwrap_or("No description available.");

        format!(
            "You are a popular TikTok creator who introduces products.\n\
             Write the caption for a TikTok photo post about the product below, in {language}.\n\
             \n\
             Product\n\
             Name: {name}\n\
             Price: {price}\n\
             Category: {category}\n\
             Description: {description}\n\
             \n\
             Rules\n\
             - At most 300 characters, not counting hashtags (mandatory)\n\
             - Start with \"{marker}\" to disclose the promotion\n\
             - Use a few emoji (3 to 5)\n\
             - Describe concrete appeal and situations where the product helps\n\
             - Include one sentence inviting viewers to check it out on TikTok Shop\n\
             - Give between 5 and 7 hashtags\n\
             - {instruction}\n\
             \n\
             Output format\n\
             Body:\n\
             (the caption, starting with \"{marker}\")\n\
             \n\
             Hashtags:\n\
             #tag1 #tag2 #tag3 #tag4 #tag5 #tag6 #tag7\n\
             \n\
             Answer in exactly this format.",
            language = self.language,
            name = product.name,
            marker = DISCLOSURE_MARKER,
            instruction = style.instruction(),
        )
    }

    /// Produce a caption that passes validation, trying at most
    /// `max_retries + 1` times. Errors from the service are never propagated
    /// directly; they are recorded as the reason for that attempt.
    pub async fn generate(
        &self,
        product: &Product,
        style: PostStyle,
        max_retries: u32,
    ) -> Result<GeneratedPost, GenerationError> {
        let prompt = self.build_prompt(product, style);
        let mut attempts = Vec::new();

        for attempt in 1..=max_retries.saturating_add(1) {
            info!(
                "generating {} caption for {} (attempt {attempt})",
                style.as_str(),
                product.item_id
            );

            let failure = match self.client.complete(&prompt).await {
                Ok(reply) => {
                    let parsed = parse_reply(&reply);
                    if !parsed.succeeded() {
                        AttemptFailure::EmptyBody
                    } else {
                        let post = GeneratedPost::new(style, parsed.body, parsed.hashtags);
                        let issues = validate_post_text(&post.full_text);
                        if issues.is_empty() {
                            info!(
                                "caption ready: {} characters, {} hashtags",
                                post.body.chars().count(),
                                post.hashtags.len()
                            );
                            return Ok(post);
                        }
                        AttemptFailure::Invalid(issues)
                    }
                }
                Err(e) => AttemptFailure::Service(e.to_string()),
            };

            warn!("caption attempt {attempt} failed: {failure}");
            attempts.push(failure);
        }

        Err(GenerationError { attempts })
    }

    /// One caption per style, in the fixed style order, for up to `count`
    /// styles. Styles that fail are left out.
    pub async fn generate_variations(&self, product: &Product, count: usize) -> Vec<GeneratedPost> {
        let mut posts = Vec::new();
        for style in PostStyle::ALL.into_iter().take(count) {
            match self.generate(product, style, DEFAULT_MAX_RETRIES).await {
                Ok(post) => posts.push(post),
                Err(e) => warn!("skipping {} variation: {e}", style.as_str()),
            }
        }
        posts
    }
}
