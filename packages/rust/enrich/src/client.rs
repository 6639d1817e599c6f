//! Remote location-model client.
//!
//! The production client posts one OpenAI-style chat-completions request to
//! OpenRouter and parses the model's JSON reply into structured locations.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use rolescout_shared::{Result, RoleScoutError, StructuredLocation};

/// Default chat-completions endpoint.
const OPENROUTER_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Remote-call ceiling.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const SYSTEM_PROMPT: &str = "You translate raw job-posting location strings into structured \
    geography. Reply with a single JSON object and nothing else.";

/// Resolves raw location strings through a remote language model.
#[async_trait]
pub trait LocationModelClient: Send + Sync {
    /// Resolve the full unique list in one remote call. The reply maps each
    /// input string to its structured location.
    async fn resolve_batch(
        &self,
        locations: &[String],
    ) -> Result<HashMap<String, StructuredLocation>>;

    /// Resolve a single raw string (the per-record fallback path).
    async fn resolve_one(&self, raw: &str) -> Result<Option<StructuredLocation>>;
}

// ---------------------------------------------------------------------------
// OpenRouter client
// ---------------------------------------------------------------------------

/// Chat-completions client against an OpenRouter-compatible endpoint.
pub struct OpenRouterClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenRouterClient {
    /// Build a client for the public OpenRouter endpoint.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::with_endpoint(OPENROUTER_ENDPOINT, api_key, model)
    }

    /// Build a client against a custom endpoint (tests, proxies).
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RoleScoutError::Enrichment(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    async fn complete(&self, user_prompt: String) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_prompt },
            ],
            "temperature": 0,
        });

        let started = std::time::Instant::now();
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RoleScoutError::Enrichment(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RoleScoutError::Enrichment(format!("HTTP {status}")));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| RoleScoutError::Enrichment(format!("malformed response: {e}")))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| RoleScoutError::Enrichment("response carried no choices".into()))?;

        debug!(
            model = %self.model,
            latency_ms = started.elapsed().as_millis() as u64,
            "location model replied"
        );
        Ok(content)
    }
}

#[async_trait]
impl LocationModelClient for OpenRouterClient {
    async fn resolve_batch(
        &self,
        locations: &[String],
    ) -> Result<HashMap<String, StructuredLocation>> {
        if locations.is_empty() {
            return Ok(HashMap::new());
        }

        let inputs = serde_json::to_string(locations)
            .map_err(|e| RoleScoutError::Enrichment(e.to_string()))?;
        let prompt = format!(
            "For each raw location string below, produce an object with the keys \
             \"city\", \"country\", \"region\" (continent or macro-region) and \
             \"confidence\" (a number between 0 and 1). Use the full country name. \
             Use \"Unknown\" for anything you cannot determine. Reply with one JSON \
             object keyed by the exact input strings.\n\nInput strings: {inputs}"
        );

        let content = self.complete(prompt).await?;
        parse_location_map(&content)
    }

    async fn resolve_one(&self, raw: &str) -> Result<Option<StructuredLocation>> {
        let batch = [raw.to_string()];
        let mut map = self.resolve_batch(&batch).await?;
        Ok(map.remove(raw))
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Parse the model's JSON map, tolerating surrounding prose or code fences,
/// and normalize every entry (`"Unknown"` → null, confidence clamped).
pub fn parse_location_map(content: &str) -> Result<HashMap<String, StructuredLocation>> {
    let start = content.find('{');
    let end = content.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => {
            let preview: String = content.chars().take(120).collect();
            return Err(RoleScoutError::Enrichment(format!(
                "no JSON object in model reply: {preview}"
            )));
        }
    };

    let raw: HashMap<String, StructuredLocation> = serde_json::from_str(json)
        .map_err(|e| RoleScoutError::Enrichment(format!("unparsable model reply: {e}")))?;

    Ok(raw
        .into_iter()
        .map(|(key, value)| (key, value.normalized()))
        .collect())
}
