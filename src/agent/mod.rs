//! Responder agents
//!
//! Two independent text-in/text-out responders: one answers "what now"
//! questions from live round data, the other reviews past plays and
//! general claims from the question text alone.

mod mid_game;
mod post_game;

use async_trait::async_trait;

pub use mid_game::MidGameAgent;
pub use post_game::PostGameAgent;

use crate::Result;

/// Answers questions about the current round
#[async_trait]
pub trait LiveDecisionResponder: Send + Sync {
    /// Answer `question` given a round snapshot
    ///
    /// # Errors
    ///
    /// Returns error if the backing model call fails
    async fn respond(&self, round_data: &str, question: &str) -> Result<String>;
}

/// Answers questions about the past and evaluates claims
#[async_trait]
pub trait RetrospectiveResponder: Send + Sync {
    /// Review `claim`
    ///
    /// # Errors
    ///
    /// Returns error if the backing model call fails
    async fn review(&self, claim: &str) -> Result<String>;
}

/// Trim model output; an empty answer is an error
fn clean_reply(agent: &str, reply: &str) -> Result<String> {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        return Err(crate::Error::Agent(format!("{agent} returned an empty answer")));
    }
    Ok(trimmed.to_string())
}
