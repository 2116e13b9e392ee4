use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::LanguageModel;
use super::types::ChatMessage;
use crate::core::config::ModelSettings;
use crate::core::errors::ApiError;

/// Client for any OpenAI-compatible endpoint (Groq, LM Studio, llama-server).
#[derive(Clone)]
pub struct OpenAiCompatProvider {
    base_url: String,
    api_key: Option<String>,
    chat_model: String,
    embedding_model: String,
    temperature: f64,
    max_tokens: u32,
    client: Client,
}

impl OpenAiCompatProvider {
    pub fn from_settings(settings: &ModelSettings) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: env::var(&settings.api_key_env).ok(),
            chat_model: settings.chat_model.clone(),
            embedding_model: settings.embedding_model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            client,
        })
    }

    fn request(&self, url: &str, body: &Value) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(url).json(body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }
}

#[async_trait]
impl LanguageModel for OpenAiCompatProvider {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        let url = format!("{}/v1/embeddings", self.base_url);

        let body = json!({
            "model": self.embedding_model,
            "input": inputs,
        });

        let res = self
            .request(&url, &body)
            .send()
            .await
            .map_err(|err| ApiError::EmbeddingService(err.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::EmbeddingService(format!("{}: {}", status, text)));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|err| ApiError::EmbeddingService(err.to_string()))?;

        parse_embeddings_payload(&payload)
    }

    async fn generate(&self, system: &str, user: &str) -> Result<String, ApiError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
        let body = json!({
            "model": self.chat_model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "stream": false,
        });

        let res = self
            .request(&url, &body)
            .send()
            .await
            .map_err(|err| ApiError::GenerationService(err.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::GenerationService(format!("{}: {}", status, text)));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|err| ApiError::GenerationService(err.to_string()))?;

        parse_chat_payload(&payload)
    }
}

fn parse_embeddings_payload(payload: &Value) -> Result<Vec<Vec<f32>>, ApiError> {
    let data = payload["data"]
        .as_array()
        .ok_or_else(|| ApiError::EmbeddingService("malformed response: missing data".to_string()))?;

    let mut embeddings = Vec::with_capacity(data.len());
    for item in data {
        let values = item["embedding"].as_array().ok_or_else(|| {
            ApiError::EmbeddingService("malformed response: missing embedding".to_string())
        })?;
        let vector: Vec<f32> = values
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect();
        if vector.len() != values.len() {
            return Err(ApiError::EmbeddingService(
                "malformed response: non-numeric embedding value".to_string(),
            ));
        }
        embeddings.push(vector);
    }

    Ok(embeddings)
}

fn parse_chat_payload(payload: &Value) -> Result<String, ApiError> {
    payload["choices"][0]["message"]["content"]
        .as_str()
        .map(|content| content.to_string())
        .ok_or_else(|| {
            ApiError::GenerationService("malformed response: missing message content".to_string())
        })
}
