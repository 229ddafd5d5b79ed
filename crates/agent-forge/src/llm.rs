//! LLM gateway
//!
//! One chat-completion call per operation against an OpenAI-compatible
//! endpoint. The transport sits behind [`ChatBackend`] so the registry can be
//! driven by a scripted backend in tests.

use std::sync::Arc;
use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use forgeconf::DeepseekConfig;
use serde_json::Value;

use crate::error::{ForgeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// A chat-completion transport.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send `messages` and return the first choice's raw text.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// [`ChatBackend`] over `async-openai`, pointed at any OpenAI-compatible base URL.
pub struct OpenAiBackend {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiBackend {
    pub fn new(config: &DeepseekConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| ForgeError::Upstream(format!("failed to build HTTP client: {}", e)))?;

        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(config.base_url.trim_end_matches('/'));

        // No retries: the first transient error is returned as is.
        let no_retry = backoff::ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();

        let client = Client::with_config(openai_config)
            .with_http_client(http)
            .with_backoff(no_retry);

        Ok(Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let messages = messages
            .iter()
            .map(to_request_message)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(upstream)?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(upstream)?;

        let response = self.client.chat().create(request).await.map_err(upstream)?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ForgeError::Upstream("response contained no choices".to_string()))?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

fn to_request_message(
    message: &ChatMessage,
) -> std::result::Result<ChatCompletionRequestMessage, OpenAIError> {
    let message = match message.role {
        ChatRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(message.content.clone())
            .build()?
            .into(),
        ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(message.content.clone())
            .build()?
            .into(),
    };
    Ok(message)
}

fn upstream(e: OpenAIError) -> ForgeError {
    ForgeError::Upstream(e.to_string())
}

/// Front door for every completion the server issues.
#[derive(Clone)]
pub struct LlmGateway {
    backend: Arc<dyn ChatBackend>,
}

impl LlmGateway {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }

    pub fn from_config(config: &DeepseekConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(OpenAiBackend::new(config)?)))
    }

    /// Ask once and post-process the reply.
    ///
    /// `background` becomes its own user message ahead of the question when
    /// non-empty.
    #[tracing::instrument(
        name = "llm.complete",
        skip_all,
        fields(llm.messages = tracing::field::Empty, llm.reply_len = tracing::field::Empty)
    )]
    pub async fn complete(
        &self,
        system_prompt: &str,
        question: &str,
        background: Option<&str>,
    ) -> Result<String> {
        let messages = build_messages(system_prompt, question, background);
        tracing::Span::current().record("llm.messages", messages.len());

        let reply = self.backend.chat(&messages).await.inspect_err(|e| {
            tracing::warn!(error = %e, "Chat completion failed");
        })?;

        let text = unwrap_content_envelope(&reply);
        tracing::Span::current().record("llm.reply_len", text.len());
        Ok(text)
    }
}

/// `[system, user(background)?, user(question)]`
pub fn build_messages(system_prompt: &str, question: &str, background: Option<&str>) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(system_prompt)];
    if let Some(background) = background.filter(|b| !b.is_empty()) {
        messages.push(ChatMessage::user(background));
    }
    messages.push(ChatMessage::user(question));
    messages
}

/// Trim the reply; if it is a JSON object with a string `content` field,
/// return that field instead.
pub fn unwrap_content_envelope(reply: &str) -> String {
    let trimmed = reply.trim();

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        if let Some(Value::String(content)) = map.get("content") {
            return content.clone();
        }
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records what it was asked and replies with a canned string.
    struct Canned {
        reply: String,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    #[async_trait]
    impl ChatBackend for Canned {
        async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
            self.seen.lock().unwrap().push(messages.to_vec());
            Ok(self.reply.clone())
        }
    }

    fn canned(reply: &str) -> Arc<Canned> {
        Arc::new(Canned {
            reply: reply.to_string(),
            seen: Mutex::new(Vec::new()),
        })
    }

    #[test]
    fn test_messages_without_background() {
        let messages = build_messages("sys", "q", None);
        assert_eq!(messages, vec![ChatMessage::system("sys"), ChatMessage::user("q")]);

        let messages = build_messages("sys", "q", Some(""));
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn test_messages_with_background() {
        let messages = build_messages("sys", "q", Some("ctx"));
        assert_eq!(
            messages,
            vec![
                ChatMessage::system("sys"),
                ChatMessage::user("ctx"),
                ChatMessage::user("q"),
            ]
        );
    }

    #[test]
    fn test_unwrap_plain_text() {
        assert_eq!(unwrap_content_envelope("  Hello\n"), "Hello");
    }

    #[test]
    fn test_unwrap_envelope() {
        assert_eq!(unwrap_content_envelope(r#"  {"content":"Hi"}  "#), "Hi");
    }

    #[test]
    fn test_unwrap_leaves_other_json_alone() {
        assert_eq!(unwrap_content_envelope(r#"{"content": 42}"#), r#"{"content": 42}"#);
        assert_eq!(unwrap_content_envelope(r#"{"text":"Hi"}"#), r#"{"text":"Hi"}"#);
        assert_eq!(unwrap_content_envelope(r#"["content"]"#), r#"["content"]"#);
    }

    #[tokio::test]
    async fn test_complete_unwraps_reply() {
        let backend = canned("\n {\"content\":\"persona text\"} \n");
        let gateway = LlmGateway::new(backend.clone());

        let text = gateway.complete("sys", "question", Some("bg")).await.unwrap();

        assert_eq!(text, "persona text");
        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0][1], ChatMessage::user("bg"));
    }
}
