//! Product research: ask the text service which products are trending and
//! keep the suggestions for the operator to source.

use log::{info, warn};

use crate::clock::Clock;
use crate::domain::research::{NewResearchLog, Recommendation, ResearchLog};
use crate::generator::TextGenerator;
use crate::repository::{ResearchLogReader, ResearchLogWriter};
use crate::services::ServiceResult;

pub const MIN_RECOMMENDATIONS: usize = 5;
pub const MAX_RECOMMENDATIONS: usize = 10;

/// Prompt asking for trending, affiliate-friendly products as a JSON array.
pub fn build_research_prompt(month: &str, language: &str) -> String {
    format!(
        "You are a marketing expert researching products that sell well on TikTok Shop.\n\
         \n\
         As of {month}, suggest between {MIN_RECOMMENDATIONS} and {MAX_RECOMMENDATIONS} products \
         likely to sell on TikTok Shop in Japan.\n\
         \n\
         Look at\n\
         - products people are talking about on TikTok\n\
         - products going viral on Instagram and X\n\
         - seasonal products in high demand\n\
         \n\
         Conditions\n\
         - Price between 1,000 and 10,000 yen\n\
         - Categories such as beauty, fashion, gadgets, health, household goods and kitchenware\n\
         - Likely to be available on Japanese TikTok Shop or similar stores\n\
         - Easy to introduce through affiliate posts\n\
         \n\
         Output format\n\
         Answer with a JSON array like this, writing the text fields in {language}:\n\
         [\n  {{\n    \"product_name\": \"generic product name\",\n    \"price_range\": \"2000-3000\",\n    \
         \"reason\": \"why it should sell, tied to a social media trend\",\n    \
         \"search_keywords\": [\"keyword 1\", \"keyword 2\"],\n    \
         \"target_audience\": \"who buys it\",\n    \"category\": \"category\"\n  }}\n]"
    )
}

/// Pull the JSON array out of a free-form reply.
///
/// Everything between the first `[` and the last `]` is parsed. Entries that
/// do not deserialize or have no product name are dropped; an unparseable
/// reply yields an empty list.
pub fn parse_recommendations(reply: &str) -> Vec<Recommendation> {
    let (Some(start), Some(end)) = (reply.find('['), reply.rfind(']')) else {
        warn!("research reply contains no JSON array");
        return Vec::new();
    };
    if end < start {
        warn!("research reply contains no JSON array");
        return Vec::new();
    }

    let entries: Vec<serde_json::Value> = match serde_json::from_str(&reply[start..=end]) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("research reply is not valid JSON: {e}");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<Recommendation>(entry).ok())
        .filter(|item| !item.product_name.trim().is_empty())
        .collect()
}

/// Ask for fresh recommendations and store them.
///
/// Returns `None`, storing nothing, when the reply held no usable entries.
pub async fn run_research<R>(
    repo: &R,
    generator: &dyn TextGenerator,
    clock: &dyn Clock,
    language: &str,
) -> ServiceResult<Option<ResearchLog>>
where
    R: ResearchLogWriter + ?Sized,
{
    let now = clock.now();
    let prompt = build_research_prompt(&now.format("%B %Y").to_string(), language);

    info!("requesting product research");
    let reply = generator.complete(&prompt).await?;

    let recommendations = parse_recommendations(&reply);
    if recommendations.is_empty() {
        warn!("research produced no recommendations");
        return Ok(None);
    }

    let log = repo.append_research_log(&NewResearchLog::new(recommendations, now.naive_utc()))?;
    info!(
        "stored {} recommendation(s) as research #{}",
        log.recommendations.len(),
        log.id
    );
    Ok(Some(log))
}

/// Recommendations of the most recent research run, empty when none ran yet.
pub fn latest_recommendations<R>(repo: &R) -> ServiceResult<Vec<Recommendation>>
where
    R: ResearchLogReader + ?Sized,
{
    Ok(repo
        .latest_research()?
        .map(|log| log.recommendations)
        .unwrap_or_default())
}

/// Numbered, human-readable listing for the terminal.
pub fn format_recommendations(recommendations: &[Recommendation]) -> String {
    if recommendations.is_empty() {
        return "No recommendations.".to_string();
    }

    fn or_unknown(value: &str) -> &str {
        if value.trim().is_empty() { "unknown" } else { value }
    }

    let mut lines = Vec::new();
    for (index, item) in recommendations.iter().enumerate() {
        lines.push(format!("{}. {}", index + 1, item.product_name));
        lines.push(format!("   Price range: {} yen", or_unknown(&item.price_range)));
        lines.push(format!("   Category: {}", or_unknown(&item.category)));
        lines.push(format!("   Audience: {}", or_unknown(&item.target_audience)));
        lines.push(format!("   Reason: {}", or_unknown(&item.reason)));
        if !item.search_keywords.is_empty() {
            lines.push(format!("   Keywords: {}", item.search_keywords.join(", ")));
        }
        lines.push(String::new());
    }
    lines.join("\n")
}
