use anyhow::Context;
use axum::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AgentConfig;

/// Instructions prepended to every transcript sent to the model.
pub const SYSTEM_PROMPT: &str = "You are a friendly AI Campus Admin Assistant. \
Answer questions about students, departments and campus life. Use conversational \
language, present data in easy-to-read formats, and keep responses concise but \
informative.";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Gateway to the hosted model. Tool selection and everything else that happens
/// behind the completion endpoint is the provider's business, not ours.
#[async_trait]
pub trait AgentClient: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> anyhow::Result<String>;
}

#[derive(Clone)]
pub struct OpenAiAgent {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiAgent {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: String,
}

#[async_trait]
impl AgentClient for OpenAiAgent {
    async fn complete(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        let body = CompletionRequest {
            model: &self.model,
            temperature: 0.0,
            messages,
        };
        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("agent request failed")?
            .error_for_status()
            .context("agent returned error status")?;

        let completion: CompletionResponse =
            resp.json().await.context("agent response decode failed")?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .context("agent returned no choices")?;
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_lowercase() {
        let msg = ChatMessage {
            role: Role::Assistant,
            content: "hi".into(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    #[test]
    fn transcript_deserializes() {
        let json = r#"[{"role":"user","content":"how many students?"}]"#;
        let msgs: Vec<ChatMessage> = serde_json::from_str(json).unwrap();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].role, Role::User);
    }

    #[test]
    fn completion_response_shape() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"42 students"}}]}"#;
        let resp: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.choices[0].message.content, "42 students");
    }
}
