use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::prompt;

/// Minimal client for the Ollama `/api/generate` and `/api/tags` endpoints.
#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'static str,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

/// Ollama lists `llama3` as `llama3:latest`.
fn model_matches(listed: &str, wanted: &str) -> bool {
    listed == wanted || (!wanted.contains(':') && listed == format!("{wanted}:latest"))
}

fn is_json(text: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(text).is_ok()
}

impl OllamaClient {
    pub fn new(base_url: String, model: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One non-streaming completion in JSON mode at temperature 0.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            format: "json",
            options: GenerateOptions { temperature: 0.0 },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to reach Ollama at {}", self.base_url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {status}: {}", body.trim());
        }

        let body: GenerateResponse = response
            .json()
            .await
            .context("Failed to decode Ollama response")?;
        Ok(body.response)
    }

    /// Ask until the model answers with parseable JSON. After a malformed
    /// answer the next attempt asks the model to repair it.
    pub async fn generate_json(&self, prompt: &str, attempts: usize) -> Result<String> {
        let mut answer = self.generate(prompt).await?;

        for attempt in 1..=attempts {
            if is_json(&answer) {
                debug!(attempt, model = %self.model, "Model returned valid JSON");
                return Ok(answer);
            }
            warn!(attempt, model = %self.model, "Model returned invalid JSON");
            if attempt < attempts {
                answer = self.generate(&prompt::build_retry_prompt(&answer)).await?;
            }
        }

        anyhow::bail!("No valid JSON from {} after {attempts} attempts", self.model)
    }

    /// Check that the server answers and has the configured model pulled.
    pub async fn ping(&self) -> Result<()> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach Ollama at {}", self.base_url))?;

        if !response.status().is_success() {
            anyhow::bail!("Ollama health check failed: {}", response.status());
        }

        let tags: TagsResponse = response.json().await.context("Failed to decode model list")?;
        if !tags.models.iter().any(|m| model_matches(&m.name, &self.model)) {
            anyhow::bail!("model {} is not available on the Ollama server", self.model);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_matching() {
        assert!(model_matches("llama3.1:8b", "llama3.1:8b"));
        assert!(model_matches("mistral:latest", "mistral"));
        assert!(!model_matches("mistral:7b", "mistral"));
        assert!(!model_matches("llama3:latest", "llama3.1"));
    }

    #[test]
    fn test_tags_payload() {
        let tags: TagsResponse =
            serde_json::from_str(r#"{"models":[{"name":"llama3.1:8b","size":1}]}"#).unwrap();
        assert_eq!(tags.models.len(), 1);
        assert_eq!(tags.models[0].name, "llama3.1:8b");
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateRequest {
            model: "m",
            prompt: "p",
            stream: false,
            format: "json",
            options: GenerateOptions { temperature: 0.0 },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["format"], "json");
        assert_eq!(value["stream"], false);
        assert_eq!(value["options"]["temperature"], 0.0);
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let client = OllamaClient::new(
            "http://127.0.0.1:9/".to_string(),
            "llama3.1:8b".to_string(),
            Duration::from_secs(2),
        )
        .unwrap();
        assert!(client.ping().await.is_err());
        assert!(client.generate_json("hi", 2).await.is_err());
    }
}
