// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// OpenAI Chat Completion Adapter
//
// Anti-Corruption Layer for the OpenAI and Azure OpenAI chat completion APIs.
// Also works with OpenAI-compatible servers (LM Studio, vLLM, etc.)

use crate::domain::config::{LlmConfig, LlmProviderType};
use crate::domain::llm::{ChatCompletion, ChatOptions, LLMError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const AZURE_API_VERSION: &str = "2024-06-01";

pub struct OpenAIChatAdapter {
    client: reqwest::Client,
    flavor: LlmProviderType,
    endpoint: String,
    api_key: String,
    model: String,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<ChatMessage>,
    temperature: f32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl OpenAIChatAdapter {
    pub fn new(
        flavor: LlmProviderType,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        options: ChatOptions,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            flavor,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            options,
        }
    }

    pub fn from_config(config: &LlmConfig) -> anyhow::Result<Self> {
        let api_key = config.resolve_api_key()?.unwrap_or_default();
        Ok(Self::new(
            config.provider_type,
            config.endpoint.clone(),
            api_key,
            config.model.clone(),
            config.options.clone(),
        ))
    }

    fn completions_url(&self) -> String {
        let base = self.endpoint.trim_end_matches('/');
        match self.flavor {
            LlmProviderType::OpenAI => format!("{}/chat/completions", base),
            LlmProviderType::AzureOpenAI => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                base, self.model, AZURE_API_VERSION
            ),
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.flavor {
            LlmProviderType::OpenAI => {
                request.header("Authorization", format!("Bearer {}", self.api_key))
            }
            LlmProviderType::AzureOpenAI => request.header("api-key", &self.api_key),
        }
    }
}

#[async_trait]
impl ChatCompletion for OpenAIChatAdapter {
    async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String, LLMError> {
        if prompt.is_empty() {
            return Err(LLMError::InvalidInput("Prompt cannot be empty".into()));
        }

        // Azure addresses the deployment in the URL instead of the body
        let model = match self.flavor {
            LlmProviderType::OpenAI => Some(self.model.as_str()),
            LlmProviderType::AzureOpenAI => None,
        };
        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Some(system_prompt.to_string()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Some(prompt.to_string()),
                },
            ],
            temperature: self.options.temperature,
            top_p: self.options.top_p,
            frequency_penalty: self.options.frequency_penalty,
            presence_penalty: self.options.presence_penalty,
            max_tokens: self.options.max_tokens,
        };

        let response = self
            .authorize(self.client.post(self.completions_url()))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| LLMError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(if status == 401 || status == 403 {
                LLMError::Authentication(error_text)
            } else if status == 429 {
                LLMError::RateLimit
            } else if status == 404 {
                LLMError::ModelNotFound(self.model.clone())
            } else {
                LLMError::Provider(format!("HTTP {}: {}", status, error_text))
            });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LLMError::Provider(format!("Failed to parse response: {}", e)))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LLMError::Provider("No response from model".into()))
    }

    async fn health_check(&self) -> Result<(), LLMError> {
        if self.endpoint.is_empty() {
            return Err(LLMError::Network("No endpoint configured".into()));
        }
        if self.api_key.is_empty() {
            return Err(LLMError::Authentication("No API key configured".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OK_BODY: &str = r#"{
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": "French"}, "finish_reason": "stop"}
        ],
        "usage": {"prompt_tokens": 10, "completion_tokens": 1, "total_tokens": 11}
    }"#;

    #[tokio::test]
    async fn test_openai_request_shape() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "gpt-4o-mini",
                "temperature": 0.0,
                "frequency_penalty": 0.7,
                "messages": [
                    {"role": "system", "content": "You detect languages."},
                    {"role": "user", "content": "Detect the language of: Bonjour"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(OK_BODY)
            .create_async()
            .await;

        let adapter = OpenAIChatAdapter::new(
            LlmProviderType::OpenAI,
            format!("{}/v1", server.url()),
            "sk-test",
            "gpt-4o-mini",
            ChatOptions::default(),
        );
        let answer = adapter
            .complete("You detect languages.", "Detect the language of: Bonjour")
            .await
            .unwrap();

        assert_eq!(answer, "French");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_azure_uses_deployment_url_and_api_key_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/openai/deployments/gpt-4o/chat/completions")
            .match_query(mockito::Matcher::UrlEncoded(
                "api-version".into(),
                AZURE_API_VERSION.into(),
            ))
            .match_header("api-key", "azure-key")
            .with_status(200)
            .with_body(OK_BODY)
            .create_async()
            .await;

        let adapter = OpenAIChatAdapter::new(
            LlmProviderType::AzureOpenAI,
            server.url(),
            "azure-key",
            "gpt-4o",
            ChatOptions::default(),
        );
        assert_eq!(adapter.complete("s", "p").await.unwrap(), "French");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_mapping() {
        let mut server = mockito::Server::new_async().await;
        let _unauthorized = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body("bad key")
            .create_async()
            .await;

        let adapter = OpenAIChatAdapter::new(
            LlmProviderType::OpenAI,
            server.url(),
            "wrong",
            "gpt-4o-mini",
            ChatOptions::default(),
        );
        assert!(matches!(
            adapter.complete("s", "p").await,
            Err(LLMError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn test_rate_limit_and_empty_choices() {
        let mut server = mockito::Server::new_async().await;
        let _limited = server
            .mock("POST", "/limited/chat/completions")
            .with_status(429)
            .create_async()
            .await;
        let _empty = server
            .mock("POST", "/empty/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let limited = OpenAIChatAdapter::new(
            LlmProviderType::OpenAI,
            format!("{}/limited", server.url()),
            "k",
            "m",
            ChatOptions::default(),
        );
        assert!(matches!(limited.complete("s", "p").await, Err(LLMError::RateLimit)));

        let empty = OpenAIChatAdapter::new(
            LlmProviderType::OpenAI,
            format!("{}/empty", server.url()),
            "k",
            "m",
            ChatOptions::default(),
        );
        assert!(matches!(empty.complete("s", "p").await, Err(LLMError::Provider(_))));
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected() {
        let adapter = OpenAIChatAdapter::new(
            LlmProviderType::OpenAI,
            "http://127.0.0.1:9",
            "k",
            "m",
            ChatOptions::default(),
        );
        assert!(matches!(
            adapter.complete("s", "").await,
            Err(LLMError::InvalidInput(_))
        ));
    }
}
