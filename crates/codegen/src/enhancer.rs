//! External text-generation collaborator for complex loop bodies.

use anyhow::{anyhow, Result};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Port for whatever rewrites a loop skeleton into richer code. The
/// engine never requires one; every enhancement path falls back to the
/// plain skeleton when generation fails.
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &'static str;
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// OpenAI-compatible chat-completions client. Blocking with a hard
/// per-request timeout; a timeout surfaces as an ordinary error and the
/// caller's fallback takes over.
pub struct HttpTextGenerator {
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl HttpTextGenerator {
    pub fn new(endpoint: String, api_key: String, model: String) -> Self {
        Self {
            endpoint,
            api_key,
            model,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create from environment variables.
    /// Expects: LOOPFORGE_LLM_ENDPOINT, LOOPFORGE_LLM_API_KEY, LOOPFORGE_LLM_MODEL
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("LOOPFORGE_LLM_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let api_key = std::env::var("LOOPFORGE_LLM_API_KEY")
            .map_err(|_| anyhow!("LOOPFORGE_LLM_API_KEY not set"))?;
        let model =
            std::env::var("LOOPFORGE_LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self::new(endpoint, api_key, model))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl TextGenerator for HttpTextGenerator {
    fn name(&self) -> &'static str {
        "chat-completions"
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let request_body = serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a code generation assistant. Respond only with code, no prose, no markdown fences."
                },
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "temperature": 0.2,
            "max_tokens": 800
        });

        let response = ureq::post(&self.endpoint)
            .timeout(self.timeout)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("Content-Type", "application/json")
            .send_json(&request_body)?;

        let body: serde_json::Value = response.into_json()?;
        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow!("no content in generation response"))?;
        let content = content.trim();
        if content.is_empty() {
            return Err(anyhow!("generation response was empty"));
        }
        Ok(content.to_string())
    }
}
