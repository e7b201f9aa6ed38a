//! Text-to-summary processing: prompt, LLM call, response cleanup, metadata.

use crate::agent::{AgentError, LlmClient};
use crate::summary::{ProcessingMetadata, SummaryOptions, SummaryResult};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Hard cap on summary size, in characters. Not tied to `max_length`.
pub const SUMMARY_CHAR_LIMIT: usize = 500;

const ELLIPSIS: &str = "...";

/// Turns didactic text into a simplified summary through an LLM.
///
/// Holds an immutable client handle and timeout; safe to share between
/// concurrent requests.
#[derive(Clone)]
pub struct SummaryProcessor {
    client: Arc<dyn LlmClient>,
    timeout: Duration,
}

impl SummaryProcessor {
    pub fn new(client: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// Summarise `text`. Makes exactly one provider call, bounded by the timeout.
    pub async fn process(
        &self,
        text: &str,
        options: &SummaryOptions,
    ) -> Result<SummaryResult, AgentError> {
        let start = Instant::now();
        let prompt = build_prompt(text, options);

        let raw = tokio::time::timeout(self.timeout, self.client.invoke(&prompt))
            .await
            .map_err(|_| AgentError::Timeout(self.timeout))??;
        debug!(raw_len = raw.len(), "received LLM response");

        let summary = truncate_summary(&normalize_response(&raw));
        let elapsed = start.elapsed().as_secs_f64();
        let metadata = ProcessingMetadata::compute(text, &summary, elapsed);

        info!(
            model = self.client.model_name(),
            original_length = metadata.original_length,
            summary_length = metadata.summary_length,
            elapsed_seconds = elapsed,
            "summary generated"
        );

        Ok(SummaryResult {
            summary,
            classification: String::new(),
            metadata: Some(metadata),
        })
    }
}

/// Build the instruction prompt around the caller's text
pub fn build_prompt(text: &str, options: &SummaryOptions) -> String {
    format!(
        r#"You are an assistant that writes simple, clear summaries in {language} to help {audience} who have reading difficulties understand the material.
If the text is written in another language, translate it to {language} before summarising.
Avoid complex technical terms and use accessible vocabulary and short sentences.

Return only the simplified summary as plain text. Do not wrap it in JSON, code blocks or any markdown formatting.

---

Original text:
{text}"#,
        language = options.language.prompt_name(),
        audience = options.education_level.audience(),
        text = text
    )
}

/// What the cleaned model output turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    /// A JSON object carrying a summary field
    Object { summary: String },
    /// A JSON string literal
    String { value: String },
    /// Anything else, kept as text
    Unparsed { raw: String },
}

/// Classify a fence-stripped, trimmed response
pub fn parse_response(cleaned: &str) -> ParsedResponse {
    match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Object(map)) => {
            // Older prompts asked for a "resumo" field
            match map
                .get("summary")
                .or_else(|| map.get("resumo"))
                .and_then(Value::as_str)
            {
                Some(summary) => ParsedResponse::Object {
                    summary: summary.to_string(),
                },
                None => ParsedResponse::Unparsed {
                    raw: cleaned.to_string(),
                },
            }
        }
        Ok(Value::String(value)) => ParsedResponse::String { value },
        _ => ParsedResponse::Unparsed {
            raw: cleaned.to_string(),
        },
    }
}

/// Reduce a raw LLM response to a plain-text summary. Never fails.
pub fn normalize_response(raw: &str) -> String {
    let cleaned = strip_code_fence(raw);
    match parse_response(&cleaned) {
        ParsedResponse::Object { summary } => summary.trim().to_string(),
        ParsedResponse::String { value } => value.trim().to_string(),
        ParsedResponse::Unparsed { raw } => raw,
    }
}

/// Strip a markdown code block wrapper and trim the result
fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();

    // Remove ```lang ... ``` or ``` ... ```
    if let Some(without_prefix) = trimmed.strip_prefix("```") {
        let body = match without_prefix.split_once('\n') {
            Some((tag, rest)) if is_language_tag(tag) => rest,
            _ => strip_inline_tag(without_prefix),
        };

        if let Some(end_idx) = body.rfind("```") {
            return body[..end_idx].trim().to_string();
        }
    }

    trimmed.to_string()
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.')
}

fn is_language_tag(line: &str) -> bool {
    line.trim().chars().all(is_tag_char)
}

/// One-line fences: drop a language tag sitting right before a JSON value
fn strip_inline_tag(body: &str) -> &str {
    let tag_len = body.find(|c: char| !is_tag_char(c)).unwrap_or(body.len());
    let rest = body[tag_len..].trim_start();
    if tag_len > 0 && rest.starts_with(['{', '[', '"']) {
        rest
    } else {
        body
    }
}

/// Cap a summary at [`SUMMARY_CHAR_LIMIT`] characters, marking the cut
pub fn truncate_summary(summary: &str) -> String {
    match summary.char_indices().nth(SUMMARY_CHAR_LIMIT) {
        Some((cut, _)) => format!("{}{}", &summary[..cut], ELLIPSIS),
        None => summary.to_string(),
    }
}
