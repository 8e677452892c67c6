//! Retrospective review agent

use std::sync::Arc;

use async_trait::async_trait;

use super::{RetrospectiveResponder, clean_reply};
use crate::Result;
use crate::llm::{GenerationRequest, TextGeneration};

const POST_GAME_PROMPT: &str = "You are Sky, a VALORANT analyst reviewing a player's game.
Evaluate the claim or question below. If it is a claim, say whether it holds up and why.
Finish with one concrete improvement. Keep it under four sentences.

Claim: {claim}

Review:";

/// Reviews past plays and evaluates general claims
pub struct PostGameAgent {
    llm: Arc<dyn TextGeneration>,
}

impl PostGameAgent {
    /// Create the agent over a backend
    #[must_use]
    pub fn new(llm: Arc<dyn TextGeneration>) -> Self {
        Self { llm }
    }

    /// Render the prompt sent to the model
    #[must_use]
    pub fn build_prompt(claim: &str) -> String {
        POST_GAME_PROMPT.replace("{claim}", claim)
    }
}

#[async_trait]
impl RetrospectiveResponder for PostGameAgent {
    async fn review(&self, claim: &str) -> Result<String> {
        tracing::debug!(claim, "post-game agent reviewing");
        let request = GenerationRequest::text(Self::build_prompt(claim));
        let reply = self.llm.generate(&request).await?;
        clean_reply("post-game agent", &reply)
    }
}
