// Ranking oracle implementation using OpenAI
//
// This is the infrastructure implementation of BaseRankingOracle.
// Selection policy (disjointness, caps, fallback) lives in the discovery
// domain - the oracle response is advisory and re-validated there.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rig::completion::Prompt;
use rig::providers::openai;

use super::{BaseRankingOracle, RankCandidate};

const DEFAULT_MODEL: &str = "gpt-4o";

/// OpenAI-backed term ranking
pub struct OpenAiRankingOracle {
    client: openai::Client,
    model: String,
}

impl OpenAiRankingOracle {
    pub fn new(api_key: &str, model: Option<String>) -> Self {
        let client = openai::Client::new(api_key);
        Self {
            client,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    fn build_prompt(
        candidates: &[RankCandidate],
        existing: &[String],
        max_terms: usize,
    ) -> String {
        let candidates_json =
            serde_json::to_string_pretty(candidates).unwrap_or_else(|_| "[]".to_string());
        let existing_json =
            serde_json::to_string(existing).unwrap_or_else(|_| "[]".to_string());

        format!(
            "You curate the classification categories of an e-commerce store.\n\
             From the candidate terms below, select the ones most worth adding \
             as new categories, based on how often and how recently shoppers \
             asked for them.\n\n\
             Candidates:\n{candidates_json}\n\n\
             Existing categories (never select these):\n{existing_json}\n\n\
             Select at most {max_terms} terms. Respond with a JSON array of \
             the selected term strings and nothing else, for example:\n\
             [\"term1\", \"term2\"]"
        )
    }
}

#[async_trait]
impl BaseRankingOracle for OpenAiRankingOracle {
    async fn rank(
        &self,
        candidates: &[RankCandidate],
        existing: &[String],
        max_terms: usize,
    ) -> Result<Vec<String>> {
        let prompt = Self::build_prompt(candidates, existing, max_terms);

        tracing::debug!(
            candidates = candidates.len(),
            existing = existing.len(),
            max_terms,
            model = %self.model,
            "Calling ranking oracle"
        );

        let agent = self
            .client
            .agent(&self.model)
            .preamble("You are a product taxonomy curator. You only output JSON.")
            .max_tokens(512)
            .build();

        let response = agent
            .prompt(prompt.as_str())
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, model = %self.model, "Ranking oracle call failed");
                e
            })
            .context("Failed to call ranking oracle")?;

        let selected = parse_selection(&response)
            .context("Failed to parse ranking oracle response")?;

        tracing::debug!(selected = selected.len(), "Ranking oracle responded");

        Ok(selected)
    }
}

/// Parse a JSON array of strings out of a model response, tolerating
/// markdown code fences around the payload.
fn parse_selection(response: &str) -> Result<Vec<String>> {
    let trimmed = response.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end_matches("```"))
        .unwrap_or(trimmed)
        .trim();

    let terms: Vec<String> = serde_json::from_str(body)
        .with_context(|| format!("response was not a JSON string array: {}", body))?;

    Ok(terms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn parse_plain_array() {
        let terms = parse_selection(r#"["vegan snacks", "cold brew"]"#).unwrap();
        assert_eq!(terms, vec!["vegan snacks", "cold brew"]);
    }

    #[test]
    fn parse_fenced_array() {
        let terms = parse_selection("```json\n[\"outdoor gear\"]\n```").unwrap();
        assert_eq!(terms, vec!["outdoor gear"]);
    }

    #[test]
    fn parse_empty_array() {
        let terms = parse_selection("[]").unwrap();
        assert!(terms.is_empty());
    }

    #[test]
    fn parse_rejects_prose() {
        assert!(parse_selection("I would pick vegan snacks.").is_err());
    }

    #[test]
    fn prompt_names_the_constraints() {
        let candidates = vec![RankCandidate {
            term: "vegan snacks".to_string(),
            count: 4,
            first_seen: Utc::now(),
            last_seen: Utc::now(),
            example_queries: vec!["vegan snack box".to_string()],
        }];
        let existing = vec!["beverages".to_string()];
        let prompt = OpenAiRankingOracle::build_prompt(&candidates, &existing, 5);
        assert!(prompt.contains("vegan snacks"));
        assert!(prompt.contains("beverages"));
        assert!(prompt.contains("at most 5"));
    }
}
