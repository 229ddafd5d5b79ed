//! Scripted chat backends for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{ForgeError, Result};
use crate::llm::{ChatBackend, ChatMessage};

/// Replays its script in order and records what it was sent. The last
/// entry repeats once the script runs out.
pub struct ScriptedBackend {
    script: Vec<std::result::Result<String, String>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedBackend {
    fn with_script(script: Vec<std::result::Result<String, String>>) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(reply: impl Into<String>) -> Self {
        Self::with_script(vec![Ok(reply.into())])
    }

    pub fn sequence<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_script(replies.into_iter().map(|r| Ok(r.into())).collect())
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_script(vec![Err(message.into())])
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let turn = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(messages.to_vec());
            calls.len() - 1
        };
        let step = self
            .script
            .get(turn)
            .or_else(|| self.script.last())
            .cloned()
            .unwrap_or_else(|| Err("empty script".to_string()));
        step.map_err(ForgeError::Upstream)
    }
}
