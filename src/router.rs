//! Query routing
//!
//! Classifies a spoken question into the responder that should answer it
//! and whether it needs a live game-state snapshot. Classification is a
//! single constrained-output LLM call; anything that goes wrong with it
//! collapses into [`RouteDecision::default`], so [`Router::classify`]
//! never fails.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::llm::{GenerationRequest, TextGeneration, extract_json_object};

/// Which responder answers a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// "What should I do right now" questions
    LiveDecision,
    /// Questions about the past, or general claims
    Retrospective,
}

impl Target {
    /// Parse a classifier label
    ///
    /// Accepts both the labels the prompt asks for and the enum names.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "mid_game" | "live_decision" => Some(Self::LiveDecision),
            "post_game" | "retrospective" => Some(Self::Retrospective),
            _ => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LiveDecision => write!(f, "live_decision"),
            Self::Retrospective => write!(f, "retrospective"),
        }
    }
}

/// Output of classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDecision {
    /// Responder to dispatch to
    pub target: Target,
    /// Whether to fetch a game-state snapshot first
    pub needs_data: bool,
}

impl Default for RouteDecision {
    fn default() -> Self {
        Self {
            target: Target::LiveDecision,
            needs_data: true,
        }
    }
}

/// Result of a classification attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The classifier produced a well-formed record
    Routed(RouteDecision),
    /// The classifier failed; the default decision applies
    Fallback {
        /// What went wrong, for logs
        reason: String,
    },
}

impl Classification {
    /// The decision to act on
    #[must_use]
    pub fn decision(&self) -> RouteDecision {
        match self {
            Self::Routed(decision) => *decision,
            Self::Fallback { .. } => RouteDecision::default(),
        }
    }

    /// Whether the default decision was substituted
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Raw classifier record
#[derive(Debug, Deserialize)]
struct RouteRecord {
    agent: String,
    needs_data: bool,
}

const ROUTER_PROMPT: &str = r#"Task: Classify the VALORANT question.

"agent":
- "mid_game" if it's about what to do RIGHT NOW in a round.
- "post_game" if it's about what happened in the PAST or a general claim.

"needs_data":
- true if it needs live round data.
- false otherwise.

Input: {input}

Return ONLY JSON: {"agent": "...", "needs_data": ...}"#;

/// Build the classification prompt for `input`
#[must_use]
pub fn build_prompt(input: &str) -> String {
    ROUTER_PROMPT.replace("{input}", input)
}

/// Parse a classifier reply into a decision
///
/// # Errors
///
/// Returns a description of the problem if the reply is not a
/// well-formed two-field record with a known label
pub fn parse_reply(reply: &str) -> std::result::Result<RouteDecision, String> {
    let json = extract_json_object(reply).ok_or_else(|| "no JSON object in reply".to_string())?;
    let record: RouteRecord = serde_json::from_str(json).map_err(|e| e.to_string())?;
    let target = Target::from_label(&record.agent)
        .ok_or_else(|| format!("unknown agent label: {}", record.agent))?;

    Ok(RouteDecision {
        target,
        needs_data: record.needs_data,
    })
}

/// Classifies queries via a text generation backend
pub struct Router {
    llm: Arc<dyn TextGeneration>,
}

impl Router {
    /// Create a router over a backend
    #[must_use]
    pub fn new(llm: Arc<dyn TextGeneration>) -> Self {
        Self { llm }
    }

    /// Classify `input`, reporting whether the fallback was used
    pub async fn classify_detailed(&self, input: &str) -> Classification {
        let request = GenerationRequest::text(build_prompt(input)).json();

        let reply = match self.llm.generate(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "classification request failed, using default route");
                return Classification::Fallback {
                    reason: e.to_string(),
                };
            }
        };

        match parse_reply(&reply) {
            Ok(decision) => {
                tracing::debug!(
                    route = %decision.target,
                    needs_data = decision.needs_data,
                    "query classified"
                );
                Classification::Routed(decision)
            }
            Err(reason) => {
                tracing::warn!(%reason, reply = %reply, "malformed classification, using default route");
                Classification::Fallback { reason }
            }
        }
    }

    /// Classify `input`; never fails
    pub async fn classify(&self, input: &str) -> RouteDecision {
        self.classify_detailed(input).await.decision()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::{Error, Result};

    /// Backend that replays one canned outcome and records prompts
    struct ScriptedLlm {
        reply: std::result::Result<String, String>,
        prompts: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedLlm {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGeneration for ScriptedLlm {
        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            self.prompts.lock().unwrap().push(request.clone());
            self.reply.clone().map_err(Error::Llm)
        }
    }

    #[tokio::test]
    async fn routes_live_decision() {
        let llm = ScriptedLlm::replying(r#"{"agent": "mid_game", "needs_data": true}"#);
        let router = Router::new(llm.clone());

        let decision = router.classify("What should I do right now?").await;
        assert_eq!(
            decision,
            RouteDecision {
                target: Target::LiveDecision,
                needs_data: true
            }
        );

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].json);
        assert!(prompts[0].prompt.contains("Input: What should I do right now?"));
    }

    #[tokio::test]
    async fn routes_retrospective_without_data() {
        let llm = ScriptedLlm::replying(r#"{"agent": "post_game", "needs_data": false}"#);
        let router = Router::new(llm);

        let classification = router.classify_detailed("Was my eco round a mistake?").await;
        assert_eq!(
            classification,
            Classification::Routed(RouteDecision {
                target: Target::Retrospective,
                needs_data: false
            })
        );
    }

    #[tokio::test]
    async fn backend_failure_falls_back() {
        let router = Router::new(ScriptedLlm::failing("connection refused"));

        let classification = router.classify_detailed("anything").await;
        assert!(classification.is_fallback());
        assert_eq!(classification.decision(), RouteDecision::default());
    }

    #[tokio::test]
    async fn malformed_replies_fall_back() {
        for reply in [
            "I think this is a mid game question",
            r#"{"agent": "mid_game"}"#,
            r#"{"needs_data": false}"#,
            r#"{"agent": "coach", "needs_data": false}"#,
            r#"{"agent": "post_game", "needs_data": "yes"}"#,
            "",
        ] {
            let router = Router::new(ScriptedLlm::replying(reply));
            let decision = router.classify("q").await;
            assert_eq!(
                decision,
                RouteDecision {
                    target: Target::LiveDecision,
                    needs_data: true
                },
                "reply: {reply:?}"
            );
        }
    }

    #[test]
    fn parses_fenced_reply_with_extra_fields() {
        let reply = "```json\n{\"agent\": \"POST_GAME\", \"needs_data\": true, \"why\": \"past\"}\n```";
        let decision = parse_reply(reply).unwrap();
        assert_eq!(decision.target, Target::Retrospective);
        assert!(decision.needs_data);
    }

    #[test]
    fn prompt_lists_both_labels() {
        let prompt = build_prompt("Should I rotate B?");
        assert!(prompt.contains("\"mid_game\""));
        assert!(prompt.contains("\"post_game\""));
        assert!(prompt.contains("Input: Should I rotate B?"));
        assert!(prompt.contains(r#"{"agent": "...", "needs_data": ...}"#));
    }
}
