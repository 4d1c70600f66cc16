//! LLM-backed span validator
//!
//! Sends the source text plus the reconciled candidate set to a
//! chat-completions endpoint and parses back per-candidate verdicts, newly
//! discovered spans, and an explanation. Transport failures are retried
//! with exponential backoff and jitter; an uninterpretable response is
//! terminal and never retried.
//!
//! Discovered spans are never trusted blindly: each one must satisfy the
//! value-fidelity invariant against the source text. A span whose offsets
//! are wrong is relocated once by exact substring search (models routinely
//! miscount positions) and dropped if it still fails.

use crate::config::schema::LlmConfig;
use crate::config::SecretString;
use crate::domain::errors::ValidatorError;
use crate::domain::span::{byte_to_char, char_slice, PiiCategory, PiiSpan, SpanSource};
use crate::validate::{Rejection, SpanValidator, Validation};
use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You are a PII (personally identifiable information) detection expert. \
You receive a document and a list of candidate PII spans found by automated rules. \
For every candidate decide whether it is real PII that should be redacted or a false positive \
(an example value, a book or module title, a form-field label, a public contact point). \
Then scan the document for PII the rules missed: emails, phone numbers, person names, \
physical addresses, social security numbers, credit card numbers.\n\
Character offsets are zero-based, end-exclusive, counted in characters.\n\
Respond with a single JSON object and nothing else:\n\
{\n\
  \"candidates\": [{\"index\": 0, \"accept\": true, \"reason\": \"brief explanation\"}],\n\
  \"discovered\": [{\"category\": \"email|phone|name|address|ssn|credit_card\", \
\"value\": \"exact text\", \"start\": 0, \"end\": 0, \"reason\": \"why this is PII\"}],\n\
  \"explanation\": \"2-3 sentence summary of what was found and why it was redacted\"\n\
}";

/// Validator backed by an OpenAI-compatible chat-completions service
pub struct LlmValidator {
    client: Client,
    base_url: String,
    model: String,
    api_key: SecretString,
    max_retries: usize,
    initial_delay_ms: u64,
    max_delay_ms: u64,
    backoff_multiplier: f64,
}

impl LlmValidator {
    /// Create a validator from configuration
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::MissingCredentials`] when no API key is
    /// configured, or a connection error if the HTTP client cannot be
    /// built.
    pub fn new(config: &LlmConfig) -> Result<Self, ValidatorError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            ValidatorError::MissingCredentials(
                "llm.api_key is not configured (set VEIL_LLM_API_KEY)".to_string(),
            )
        })?;

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ValidatorError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            max_retries: config.retry.max_retries,
            initial_delay_ms: config.retry.initial_delay_ms,
            max_delay_ms: config.retry.max_delay_ms,
            backoff_multiplier: config.retry.backoff_multiplier,
        })
    }

    /// One request/parse round against the service
    async fn request_verdicts(
        &self,
        text: &str,
        candidates: &[PiiSpan],
    ) -> Result<Validation, ValidatorError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user",
                    content: build_user_prompt(text, candidates),
                },
            ],
            temperature: 0.0,
        };

        let key: &str = self.api_key.expose_secret().as_ref();
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {key}"))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ValidatorError::Timeout(e.to_string())
                } else {
                    ValidatorError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => ValidatorError::RateLimited(body),
                s if s.is_server_error() => ValidatorError::ServerError {
                    status: s.as_u16(),
                    message: body,
                },
                s => ValidatorError::ClientError {
                    status: s.as_u16(),
                    message: body,
                },
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ValidatorError::MalformedResponse(e.to_string()))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                ValidatorError::MalformedResponse("response contains no choices".to_string())
            })?;

        let document: VerdictDocument = serde_json::from_str(strip_code_fence(&content))
            .map_err(|e| {
                ValidatorError::MalformedResponse(format!("verdict JSON did not parse: {e}"))
            })?;

        Ok(interpret_verdicts(text, candidates, document))
    }

    /// Backoff delay before the given retry attempt (1-based)
    fn backoff_delay(&self, attempt: usize) -> Duration {
        let base = self.initial_delay_ms as f64
            * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let capped = (base as u64).min(self.max_delay_ms);
        let jitter = rand::thread_rng().gen_range(0..=capped / 10 + 1);
        Duration::from_millis(capped + jitter)
    }
}

#[async_trait]
impl SpanValidator for LlmValidator {
    async fn validate(
        &self,
        text: &str,
        candidates: &[PiiSpan],
    ) -> Result<Validation, ValidatorError> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.request_verdicts(text, candidates).await {
                Ok(validation) => return Ok(validation),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) if attempt >= self.max_retries => {
                    return Err(ValidatorError::RetriesExhausted {
                        attempts: attempt,
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    let delay = self.backoff_delay(attempt);
                    tracing::warn!(
                        attempt = attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying validation request after transport error"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Build the user message: the document plus the candidate list as JSON
fn build_user_prompt(text: &str, candidates: &[PiiSpan]) -> String {
    let candidate_list: Vec<serde_json::Value> = candidates
        .iter()
        .enumerate()
        .map(|(index, span)| {
            serde_json::json!({
                "index": index,
                "category": span.category,
                "value": span.value,
                "start": span.start,
                "end": span.end,
            })
        })
        .collect();

    let payload = serde_json::json!({
        "document": text,
        "candidates": candidate_list,
    });

    format!(
        "Review the following document and candidate spans.\n\n{}",
        serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string())
    )
}

/// Remove a markdown code fence around the model's JSON, if present
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    if let Some((_, rest)) = trimmed.split_once("```json") {
        rest.split("```").next().unwrap_or(rest).trim()
    } else if let Some((_, rest)) = trimmed.split_once("```") {
        rest.split("```").next().unwrap_or(rest).trim()
    } else {
        trimmed
    }
}

/// Turn a parsed verdict document into the stage outcome
///
/// Candidates with no verdict in the response are treated as confirmed:
/// the stage fails closed toward redaction rather than silently dropping
/// detections the model forgot to mention.
fn interpret_verdicts(
    text: &str,
    candidates: &[PiiSpan],
    document: VerdictDocument,
) -> Validation {
    let verdicts: HashMap<usize, &CandidateVerdict> = document
        .candidates
        .iter()
        .map(|v| (v.index, v))
        .collect();

    let mut confirmed = Vec::new();
    let mut rejections = Vec::new();

    for (index, span) in candidates.iter().enumerate() {
        match verdicts.get(&index) {
            Some(verdict) if !verdict.accept => {
                rejections.push(Rejection {
                    span: span.clone(),
                    reason: verdict.reason.clone(),
                });
            }
            _ => confirmed.push(span.clone().into_confirmed()),
        }
    }

    let mut discovered = Vec::new();
    for found in document.discovered {
        let Ok(category) = found.category.parse::<PiiCategory>() else {
            tracing::warn!(
                category = %found.category,
                "Discarding discovered span with unknown category"
            );
            continue;
        };

        let Some((start, end)) = resolve_offsets(text, &found) else {
            tracing::warn!(
                category = %found.category,
                start = ?found.start,
                end = ?found.end,
                "Discarding discovered span that fails the value-fidelity check"
            );
            continue;
        };

        discovered.push(
            PiiSpan::new(category, found.value, start, end, SpanSource::LlmDiscovered)
                .into_confirmed(),
        );
    }

    Validation {
        confirmed,
        rejections,
        discovered,
        explanation: document.explanation,
    }
}

/// Resolve a discovered span's offsets against the source text
///
/// Accepts the reported offsets only when the covered slice equals the
/// reported value; otherwise relocates the value once by exact substring
/// search. Returns `None` when the value cannot be located.
fn resolve_offsets(text: &str, found: &DiscoveredSpan) -> Option<(usize, usize)> {
    if found.value.is_empty() {
        return None;
    }

    if let (Some(start), Some(end)) = (found.start, found.end) {
        if char_slice(text, start, end) == Some(found.value.as_str()) {
            return Some((start, end));
        }
    }

    let byte_start = text.find(&found.value)?;
    let start = byte_to_char(text, byte_start);
    Some((start, start + found.value.chars().count()))
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Verdict document the model returns as its message content
#[derive(Debug, Deserialize)]
struct VerdictDocument {
    #[serde(default)]
    candidates: Vec<CandidateVerdict>,
    #[serde(default)]
    discovered: Vec<DiscoveredSpan>,
    #[serde(default)]
    explanation: String,
}

#[derive(Debug, Deserialize)]
struct CandidateVerdict {
    index: usize,
    accept: bool,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct DiscoveredSpan {
    category: String,
    value: String,
    #[serde(default)]
    start: Option<usize>,
    #[serde(default)]
    end: Option<usize>,
    #[serde(default)]
    #[allow(dead_code)]
    reason: String,
}
