//! Encyclopedia lookup through the MediaWiki API.

use async_trait::async_trait;
use serde_json::Value;

use super::Tool;
use crate::config::WikipediaConfig;

const MAX_QUERY_CHARS: usize = 300;
const NO_RESULT: &str = "No good Wikipedia Search Result was found";

/// Search Wikipedia and summarise the top pages.
pub struct Wikipedia {
    client: reqwest::Client,
    config: WikipediaConfig,
}

impl Wikipedia {
    pub fn new(config: WikipediaConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("math-solver/0.1 (text-to-math assistant)")
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self { client, config })
    }

    async fn search_titles(&self, query: &str) -> anyhow::Result<Vec<String>> {
        let limit = self.config.top_k.to_string();
        let body: Value = self
            .client
            .get(&self.config.api_url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("format", "json"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(parse_search_titles(&body))
    }

    async fn summary(&self, title: &str) -> anyhow::Result<Option<String>> {
        let body: Value = self
            .client
            .get(&self.config.api_url)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("format", "json"),
                ("titles", title),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(parse_extract(&body))
    }
}

#[async_trait]
impl Tool for Wikipedia {
    fn name(&self) -> &str {
        "Wikipedia"
    }

    fn description(&self) -> &str {
        "A tool for searching the Internet to find various information on the topics mentioned"
    }

    async fn execute(&self, input: &str) -> anyhow::Result<String> {
        let query: String = input.trim().chars().take(MAX_QUERY_CHARS).collect();
        tracing::debug!(query = %query, "Wikipedia lookup");

        let titles = self.search_titles(&query).await?;
        let mut pages = Vec::new();
        for title in titles {
            if let Some(summary) = self.summary(&title).await? {
                pages.push((title, summary));
            }
        }

        Ok(format_pages(&pages, self.config.max_chars))
    }
}

fn parse_search_titles(body: &Value) -> Vec<String> {
    body["query"]["search"]
        .as_array()
        .map(|hits| {
            hits.iter()
                .filter_map(|hit| hit["title"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn parse_extract(body: &Value) -> Option<String> {
    body["query"]["pages"]
        .as_object()?
        .values()
        .filter_map(|page| page["extract"].as_str())
        .map(str::trim)
        .find(|extract| !extract.is_empty())
        .map(str::to_string)
}

fn format_pages(pages: &[(String, String)], max_chars: usize) -> String {
    if pages.is_empty() {
        return NO_RESULT.to_string();
    }
    pages
        .iter()
        .map(|(title, summary)| format!("Page: {}\nSummary: {}", title, summary))
        .collect::<Vec<_>>()
        .join("\n\n")
        .chars()
        .take(max_chars)
        .collect()
}
