//! SearXNG JSON search client.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::events::GraphError;

pub const SERVICE: &str = "search engine";
const TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    /// Snippet text.
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// Query `{base_url}/search` and keep the first `limit` hits that have a url.
pub async fn search(
    http: &Client,
    base_url: &str,
    query: &str,
    limit: usize,
    node: &str,
) -> Result<Vec<SearchHit>, GraphError> {
    let url = format!("{}/search", base_url.trim_end_matches('/'));
    debug!(%url, %query, "searching");

    let response = http
        .get(&url)
        .query(&[("q", query), ("format", "json")])
        .timeout(TIMEOUT)
        .send()
        .await
        .map_err(|e| GraphError::from_http(SERVICE, node, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(GraphError::Node {
            node: node.to_string(),
            message: format!("search returned {status}"),
        });
    }

    let body: SearchResponse =
        response.json().await.map_err(|e| GraphError::from_http(SERVICE, node, e))?;
    Ok(body
        .results
        .into_iter()
        .filter(|hit| !hit.url.is_empty())
        .take(limit)
        .collect())
}

/// Numbered markdown listing, `[n]` matching the citation markers.
pub fn format_hits(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No results found for '{query}'.\n");
    }
    let mut output = format!("Found {} results for '{query}':\n\n", hits.len());
    for (i, hit) in hits.iter().enumerate() {
        let title = if hit.title.is_empty() { hit.url.as_str() } else { hit.title.as_str() };
        output.push_str(&format!("[{}] [{}]({})\n", i + 1, title, hit.url));
        if !hit.content.is_empty() {
            output.push_str(&format!("    {}\n", hit.content.trim()));
        }
        output.push('\n');
    }
    output
}
