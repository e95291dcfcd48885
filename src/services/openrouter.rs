use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Trait for chat-completion providers (OpenRouter, OpenAI, etc.)
#[async_trait::async_trait]
pub trait LanguageModelService: Send + Sync {
    /// Single-turn completion: one system message, one user message,
    /// free-form text back.
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    content: String,
}

pub struct OpenRouterClient {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenRouterClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl LanguageModelService for OpenRouterClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            max_tokens: 1000,
        };

        log::info!("🤖 Sending request to OpenRouter with model: {}", self.model);
        log::debug!("📤 Prompt size: {} chars", user_prompt.len());

        let response = self
            .client
            .post("https://openrouter.ai/api/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", "https://github.com/foodhack-backend") // required by OpenRouter
            .header("X-Title", "FoodHack Backend")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        log::debug!("📥 OpenRouter response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await?;
            log::error!("❌ OpenRouter API error response: {}", error_text);
            anyhow::bail!("OpenRouter API error ({}): {}", status, error_text);
        }

        let chat_response: ChatResponse = response.json().await?;
        let content = chat_response
            .choices
            .into_iter()
            .next()
            .context("OpenRouter returned no choices")?
            .message
            .content;

        log::debug!("💬 OpenRouter reply size: {} chars", content.len());
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_wire_shape() {
        let request = ChatRequest {
            model: "meta-llama/llama-4-scout:free".to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: "You are a dietitian.".to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: "Analyze this meal.".to_string(),
                },
            ],
            max_tokens: 1000,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "Analyze this meal.");
        assert_eq!(value["max_tokens"], 1000);
    }

    #[test]
    fn test_chat_response_parses_content() {
        let json = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "{\"a\": 1}"}}
            ]
        }"#;

        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.choices[0].message.content, "{\"a\": 1}");
    }
}
