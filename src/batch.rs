//! Batch client that replays a file of reviews against a running service and records what
//! came back for each one.

use anyhow::{Context, Result};
use chrono::Local;
use html_escape::decode_html_entities;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::app::render::NO_NOTES_MESSAGE;
use crate::util::{preview, text_between};
use crate::TARGET_WEB_REQUEST;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000/analyze_comment";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Everything recorded about one review.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ReviewResult {
    pub review_number: usize,
    pub original_comment: String,
    pub extracted_notes: Vec<String>,
    pub suggested_perfume_count: usize,
    pub perfume_names: Vec<String>,
    pub similarity_scores: Vec<String>,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate numbers printed after a batch run.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchSummary {
    pub reviews: usize,
    pub total_notes: usize,
    pub total_perfumes: usize,
    pub average_suggestions: f64,
    pub top_perfumes: Vec<(String, usize)>,
}

pub fn extract_perfume_count(response: &Value) -> usize {
    response
        .get("perfumes")
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}

fn perfume_cards(response: &Value) -> impl Iterator<Item = &str> {
    response
        .get("perfumes")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
}

/// `brand - fragrance` for every perfume card in the response.
pub fn extract_perfume_names(response: &Value) -> Vec<String> {
    perfume_cards(response)
        .filter_map(|card| text_between(card, "Perfume:", "</div>"))
        .map(|name| decode_html_entities(name.trim()).into_owned())
        .collect()
}

/// The `matched/total` badge of every perfume card, as displayed.
pub fn extract_similarity_scores(response: &Value) -> Vec<String> {
    perfume_cards(response)
        .filter_map(|card| text_between(card, "Similarity:", "</span>"))
        .map(|score| score.trim().to_string())
        .collect()
}

/// The notes listed in the response's `notes_html` paragraph.
pub fn extract_reported_notes(response: &Value) -> Vec<String> {
    let Some(notes_html) = response.get("notes_html").and_then(Value::as_str) else {
        return Vec::new();
    };

    match text_between(notes_html, "<p>", "</p>").map(str::trim) {
        Some(text) if !text.is_empty() && text != NO_NOTES_MESSAGE => text
            .split(',')
            .map(|note| decode_html_entities(note.trim()).into_owned())
            .collect(),
        _ => Vec::new(),
    }
}

/// Reads a reviews file, one comment per line. Blank lines are skipped but still count
/// toward the line numbers used as `review_number`.
pub fn read_reviews(path: &Path) -> Result<Vec<(usize, String)>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read reviews file {}", path.display()))?;

    Ok(contents
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim().to_string()))
        .filter(|(_, line)| !line.is_empty())
        .collect())
}

pub fn build_result(review_number: usize, comment: &str, response: &Value) -> ReviewResult {
    ReviewResult {
        review_number,
        original_comment: comment.to_string(),
        extracted_notes: extract_reported_notes(response),
        suggested_perfume_count: extract_perfume_count(response),
        perfume_names: extract_perfume_names(response),
        similarity_scores: extract_similarity_scores(response),
        timestamp: Local::now().to_rfc3339(),
        error: response
            .get("error")
            .and_then(Value::as_str)
            .map(String::from),
    }
}

/// Posts reviews to the `/analyze_comment` endpoint of a running service.
pub struct BatchClient {
    client: reqwest::Client,
    api_url: String,
}

impl BatchClient {
    pub fn new(api_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
        })
    }

    /// Returns the service's JSON reply, or `{"error": ...}` when the request failed.
    pub async fn analyze_comment(&self, comment: &str) -> Value {
        let response = match self
            .client
            .post(&self.api_url)
            .json(&json!({ "text": comment }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(target: TARGET_WEB_REQUEST, "Request to {} failed: {}", self.api_url, e);
                return json!({ "error": e.to_string() });
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return json!({ "error": format!("HTTP {}: {}", status.as_u16(), body) });
        }

        match response.json::<Value>().await {
            Ok(value) => value,
            Err(e) => json!({ "error": format!("Invalid JSON response: {}", e) }),
        }
    }

    /// Sends every review in turn, pausing `delay` between requests.
    pub async fn process_reviews(
        &self,
        reviews: &[(usize, String)],
        total_lines: usize,
        delay: Duration,
    ) -> Vec<ReviewResult> {
        let mut results = Vec::with_capacity(reviews.len());

        for (review_number, review) in reviews {
            info!("[{}/{}] Processing: {}", review_number, total_lines, preview(review, 50));

            let response = self.analyze_comment(review).await;
            let result = build_result(*review_number, review, &response);

            if result.extracted_notes.is_empty() {
                info!("   Extracted notes: none");
            } else {
                info!("   Extracted notes: {}", result.extracted_notes.join(", "));
            }
            info!("   Suggested perfumes: {}", result.suggested_perfume_count);
            if let Some(error) = &result.error {
                warn!("   Error: {}", error);
            }

            results.push(result);

            if !delay.is_zero() {
                sleep(delay).await;
            }
        }

        results
    }
}

/// Totals across a run plus the `top_n` most suggested perfumes. Ties keep the order in
/// which the perfumes were first suggested.
pub fn summarize(results: &[ReviewResult], top_n: usize) -> BatchSummary {
    let total_notes = results.iter().map(|r| r.extracted_notes.len()).sum();
    let total_perfumes: usize = results.iter().map(|r| r.suggested_perfume_count).sum();
    let average_suggestions = if results.is_empty() {
        0.0
    } else {
        total_perfumes as f64 / results.len() as f64
    };

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for name in results.iter().flat_map(|r| r.perfume_names.iter()) {
        let count = counts.entry(name.as_str()).or_insert(0);
        if *count == 0 {
            first_seen.push(name.as_str());
        }
        *count += 1;
    }

    let mut top_perfumes: Vec<(String, usize)> = first_seen
        .into_iter()
        .map(|name| (name.to_string(), counts[name]))
        .collect();
    top_perfumes.sort_by(|a, b| b.1.cmp(&a.1));
    top_perfumes.truncate(top_n);

    BatchSummary {
        reviews: results.len(),
        total_notes,
        total_perfumes,
        average_suggestions,
        top_perfumes,
    }
}

/// `analysis_results_<model>_<timestamp>.json`, with path separators in the model name
/// replaced.
pub fn default_output_file(model: &str) -> String {
    let model = model.replace(['/', '\\', ':'], "_");
    format!(
        "analysis_results_{}_{}.json",
        model,
        Local::now().format("%Y%m%d_%H%M%S")
    )
}

pub fn write_results(path: &Path, results: &[ReviewResult]) -> Result<()> {
    let json = serde_json::to_string_pretty(results).context("Failed to serialize results")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::build_analysis_response;
    use crate::catalog::Perfume;
    use std::io::Write;

    fn notes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn service_response() -> Value {
        let catalog = vec![
            Perfume {
                brand: Some("Dolce & Gabbana".to_string()),
                fragrance: Some("Light Blue".to_string()),
                all_notes: notes(&["Lemon", "Apple"]),
                ..Perfume::default()
            },
            Perfume {
                brand: Some("Guerlain".to_string()),
                fragrance: Some("Shalimar".to_string()),
                all_notes: notes(&["Lemon", "Vanilla"]),
                ..Perfume::default()
            },
        ];
        serde_json::to_value(build_analysis_response(
            &notes(&["lemon", "vanilla"]),
            &catalog,
        ))
        .unwrap()
    }

    #[test]
    fn test_extract_from_service_response() {
        let response = service_response();
        assert_eq!(extract_perfume_count(&response), 2);
        assert_eq!(
            extract_perfume_names(&response),
            vec!["Guerlain - Shalimar", "Dolce & Gabbana - Light Blue"]
        );
        assert_eq!(extract_similarity_scores(&response), vec!["2/2", "1/2"]);
        assert_eq!(extract_reported_notes(&response), vec!["lemon", "vanilla"]);
    }

    #[test]
    fn test_extract_from_reply_only() {
        let response = json!({ "reply": "<h3>Error</h3><p>Please enter a comment.</p>" });
        assert_eq!(extract_perfume_count(&response), 0);
        assert!(extract_perfume_names(&response).is_empty());
        assert!(extract_reported_notes(&response).is_empty());

        let response = json!({ "notes_html": format!("<p>{}</p>", NO_NOTES_MESSAGE) });
        assert!(extract_reported_notes(&response).is_empty());
    }

    #[test]
    fn test_build_result_records_error() {
        let result = build_result(3, "smells nice", &json!({ "error": "HTTP 500: boom" }));
        assert_eq!(result.review_number, 3);
        assert_eq!(result.error.as_deref(), Some("HTTP 500: boom"));
        assert_eq!(result.suggested_perfume_count, 0);
    }

    #[test]
    fn test_read_reviews_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rose and oud").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  citrus  ").unwrap();

        let reviews = read_reviews(file.path()).unwrap();
        assert_eq!(
            reviews,
            vec![(1, "rose and oud".to_string()), (3, "citrus".to_string())]
        );
    }

    #[test]
    fn test_summarize() {
        let mut first = build_result(1, "a", &service_response());
        first.perfume_names = notes(&["B", "A"]);
        let mut second = build_result(2, "b", &json!({}));
        second.perfume_names = notes(&["A", "C"]);
        second.suggested_perfume_count = 2;

        let summary = summarize(&[first, second], 2);
        assert_eq!(summary.reviews, 2);
        assert_eq!(summary.total_notes, 2);
        assert_eq!(summary.total_perfumes, 4);
        assert_eq!(summary.average_suggestions, 2.0);
        assert_eq!(
            summary.top_perfumes,
            vec![("A".to_string(), 2), ("B".to_string(), 1)]
        );
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[], 5);
        assert_eq!(summary.average_suggestions, 0.0);
        assert!(summary.top_perfumes.is_empty());
    }

    #[test]
    fn test_default_output_file_sanitizes_model() {
        let name = default_output_file("openai/gpt-oss-120b");
        assert!(name.starts_with("analysis_results_openai_gpt-oss-120b_"));
        assert!(name.ends_with(".json"));
    }
}
