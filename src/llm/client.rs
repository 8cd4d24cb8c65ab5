// Chat completion client (OpenAI-compatible /chat/completions)

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::Message;

/// Default completion API base
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// One message in the completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageInput {
    pub role: String,
    pub content: String,
}

impl ChatMessageInput {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

impl From<&Message> for ChatMessageInput {
    fn from(m: &Message) -> Self {
        if m.is_user {
            ChatMessageInput::user(m.text.clone())
        } else {
            ChatMessageInput::assistant(m.text.clone())
        }
    }
}

/// Build the request messages: system prompt followed by the last `window`
/// messages of the (chronologically ordered) history
pub fn build_messages(
    system_prompt: &str,
    history: &[Message],
    window: usize,
) -> Vec<ChatMessageInput> {
    let start = history.len().saturating_sub(window);
    std::iter::once(ChatMessageInput::system(system_prompt))
        .chain(history[start..].iter().map(ChatMessageInput::from))
        .collect()
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChatMessageInput,
}

/// LLM client
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl LlmClient {
    pub fn new(api_key: Option<String>, base_url: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Request a completion for `messages` and return the reply text
    pub async fn chat_response(
        &self,
        messages: &[ChatMessageInput],
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or("OPENAI_API_KEY not configured")?;

        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0.7,
            "max_tokens": 400,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .timeout(std::time::Duration::from_secs(30))
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Completion request failed: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!("Completion API error ({}): {}", status, error_text).into());
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse completion response: {}", e))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or("Completion response had no content")?;

        Ok(text)
    }
}
