use crate::agent::Agent;
use crate::prompts::PromptBuilder;
use crate::response_parser::{parse_beat, parse_opening};
use async_trait::async_trait;
use gstar_core::Result;
use gstar_core::story::{BeatRequest, GameOpening, NextBeat, OpeningRequest, StoryGenerator};
use std::sync::Arc;

/// [`StoryGenerator`] backed by a text [`Agent`].
///
/// Replies that cannot be parsed fail the call; nothing is retried.
pub struct GeminiStoryGenerator {
    agent: Arc<dyn Agent>,
    prompts: PromptBuilder,
}

impl GeminiStoryGenerator {
    pub fn new(agent: Arc<dyn Agent>) -> Result<Self> {
        Ok(Self {
            agent,
            prompts: PromptBuilder::new()?,
        })
    }
}

#[async_trait]
impl StoryGenerator for GeminiStoryGenerator {
    async fn open_game(&self, request: &OpeningRequest) -> Result<GameOpening> {
        let prompt = self.prompts.opening(request)?;
        let reply = self.agent.execute(&prompt).await?;
        let opening = parse_opening(&reply).inspect_err(|err| {
            tracing::warn!("Unusable opening reply from {}: {err}", self.agent.expertise());
            tracing::debug!("Raw reply: {reply}");
        })?;
        tracing::info!("Generated game opening '{}'", opening.title);
        Ok(opening)
    }

    async fn next_beat(&self, request: &BeatRequest) -> Result<NextBeat> {
        let prompt = self.prompts.next_beat(request)?;
        let reply = self.agent.execute(&prompt).await?;
        let beat = parse_beat(&reply).inspect_err(|err| {
            tracing::warn!("Unusable scene reply from {}: {err}", self.agent.expertise());
            tracing::debug!("Raw reply: {reply}");
        })?;
        Ok(beat)
    }
}
