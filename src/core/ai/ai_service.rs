use super::models::{ChatMessage, ChatOutcome, GenerationConfig};
use crate::core::moderation::{ContentSurface, ModerationGate, ModerationLogStore};
use async_trait::async_trait;
use std::error::Error;
use std::sync::Arc;

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Sends a chat completion request to the text-generation backend and
    /// returns the reply text.
    async fn generate(
        &self,
        messages: &[ChatMessage],
        config: &GenerationConfig,
    ) -> Result<String, Box<dyn Error + Send + Sync>>;
}

// Lets the composition root pick a backend at runtime.
#[async_trait]
impl TextGenerator for Box<dyn TextGenerator> {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        config: &GenerationConfig,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        (**self).generate(messages, config).await
    }
}

/// Chat front door: every prompt goes through the moderation gate before it
/// can reach the generator.
pub struct GuardedChatService<G: TextGenerator, S: ModerationLogStore> {
    generator: G,
    gate: Arc<ModerationGate<S>>,
    system_prompt: String,
    config: GenerationConfig,
    max_history: usize,
}

impl<G: TextGenerator, S: ModerationLogStore> GuardedChatService<G, S> {
    pub fn new(
        generator: G,
        gate: Arc<ModerationGate<S>>,
        system_prompt: String,
        config: GenerationConfig,
        max_history: usize,
    ) -> Self {
        Self {
            generator,
            gate,
            system_prompt,
            config,
            max_history,
        }
    }

    /// Run one chat turn.
    ///
    /// `history` holds earlier turns, oldest first; only the last
    /// `max_history` of them are sent. The reply is passed through the
    /// word masker before it is returned.
    pub async fn chat(
        &self,
        user_id: Option<&str>,
        history: &[ChatMessage],
        prompt: &str,
    ) -> Result<ChatOutcome, Box<dyn Error + Send + Sync>> {
        let decision = self.gate.screen(ContentSurface::Chat, user_id, prompt).await;
        if !decision.allowed {
            return Ok(ChatOutcome::Blocked(decision));
        }

        let skip = history.len().saturating_sub(self.max_history);
        let mut messages = Vec::with_capacity(history.len() - skip + 2);
        messages.push(ChatMessage::system(self.system_prompt.as_str()));
        messages.extend(history[skip..].iter().cloned());
        messages.push(ChatMessage::user(prompt));

        tracing::debug!(
            model = %self.config.model,
            turns = messages.len(),
            "Sending prompt to text generator"
        );

        let reply = self.generator.generate(&messages, &self.config).await?;

        Ok(ChatOutcome::Reply(
            self.gate.engine().sanitize_text(reply.trim()),
        ))
    }
}
