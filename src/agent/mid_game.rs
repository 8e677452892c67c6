//! In-round decision agent

use std::sync::Arc;

use async_trait::async_trait;

use super::{LiveDecisionResponder, clean_reply};
use crate::Result;
use crate::llm::{GenerationRequest, TextGeneration};

const MID_GAME_PROMPT: &str = "You are Sky, a VALORANT in-round coach talking to a player mid-match.
Give one clear, actionable call for what to do right now. Two sentences at most.
Base it on the round data; if the data is missing, say what you would check first.

Round data: {round_data}

Question: {question}

Answer:";

/// Answers "what should I do now" with the current round snapshot
pub struct MidGameAgent {
    llm: Arc<dyn TextGeneration>,
}

impl MidGameAgent {
    /// Create the agent over a backend
    #[must_use]
    pub fn new(llm: Arc<dyn TextGeneration>) -> Self {
        Self { llm }
    }

    /// Render the prompt sent to the model
    #[must_use]
    pub fn build_prompt(round_data: &str, question: &str) -> String {
        MID_GAME_PROMPT
            .replace("{round_data}", round_data)
            .replace("{question}", question)
    }
}

#[async_trait]
impl LiveDecisionResponder for MidGameAgent {
    async fn respond(&self, round_data: &str, question: &str) -> Result<String> {
        tracing::debug!(question, "mid-game agent answering");
        let request = GenerationRequest::text(Self::build_prompt(round_data, question));
        let reply = self.llm.generate(&request).await?;
        clean_reply("mid-game agent", &reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_data_and_question() {
        let prompt = MidGameAgent::build_prompt("Round 3: 2v3, Spike: Planted A", "Retake or save?");
        assert!(prompt.contains("Round data: Round 3: 2v3, Spike: Planted A"));
        assert!(prompt.contains("Question: Retake or save?"));
        assert!(!prompt.contains("{round_data}"));
    }
}
