//! Query and event dispatch
//!
//! Wires the router, the data provider, and the two responders into the
//! interactive `ask` path, and maps detected game events to fixed
//! reactions on the autonomous path.

use std::sync::Arc;

use crate::Result;
use crate::agent::{LiveDecisionResponder, RetrospectiveResponder};
use crate::data::DataProvider;
use crate::events::GameEventKind;
use crate::router::{Router, Target};

/// Round data handed to the live-decision responder when there is none
pub const NO_LIVE_DATA: &str = "No live data available.";

/// Prompt sent to the retrospective responder when a round ends
pub const ROUND_ENDED_PROMPT: &str = "The round has ended. Provide a brief, constructive feedback about the game performance and suggest improvements for the next round.";

/// Data query issued after a kill
pub const KILL_QUERY: &str = "current performance snapshot";

/// Data query issued after a death
pub const DEATH_QUERY: &str = "round end statistics";

/// Routes queries and events to responders
pub struct Orchestrator {
    router: Router,
    data: Arc<dyn DataProvider>,
    live: Arc<dyn LiveDecisionResponder>,
    retrospective: Arc<dyn RetrospectiveResponder>,
}

impl Orchestrator {
    /// Assemble an orchestrator from its collaborators
    #[must_use]
    pub fn new(
        router: Router,
        data: Arc<dyn DataProvider>,
        live: Arc<dyn LiveDecisionResponder>,
        retrospective: Arc<dyn RetrospectiveResponder>,
    ) -> Self {
        Self {
            router,
            data,
            live,
            retrospective,
        }
    }

    /// Answer a spoken or typed question
    ///
    /// Only the live-decision path consumes fetched data. A snapshot fetched
    /// for a retrospective query is dropped.
    ///
    /// # Errors
    ///
    /// Propagates data provider and responder failures unchanged
    pub async fn ask(&self, input: &str) -> Result<String> {
        let decision = self.router.classify(input).await;
        tracing::info!(
            route = %decision.target,
            needs_data = decision.needs_data,
            "routing query"
        );

        let data = if decision.needs_data {
            Some(self.data.fetch(input).await?)
        } else {
            None
        };

        match decision.target {
            Target::LiveDecision => {
                let round_data = data
                    .as_deref()
                    .filter(|d| !d.is_empty())
                    .unwrap_or(NO_LIVE_DATA);
                self.live.respond(round_data, input).await
            }
            Target::Retrospective => {
                if data.is_some() {
                    tracing::debug!("discarding snapshot fetched for retrospective query");
                }
                self.retrospective.review(input).await
            }
        }
    }

    /// React to a detected game event
    ///
    /// # Errors
    ///
    /// Propagates data provider and responder failures unchanged
    pub async fn handle_event(&self, kind: GameEventKind) -> Result<String> {
        tracing::info!(event = %kind, "handling game event");

        match kind {
            GameEventKind::RoundEnded => self.retrospective.review(ROUND_ENDED_PROMPT).await,
            GameEventKind::Kill => {
                let stats = self.data.fetch(KILL_QUERY).await?;
                Ok(format!(
                    "Good job on that kill! Here is a quick snapshot of your current game state: {stats}"
                ))
            }
            GameEventKind::Death => {
                let stats = self.data.fetch(DEATH_QUERY).await?;
                Ok(format!(
                    "Good game. You had a solid effort. Here are your stats for the round: {stats}"
                ))
            }
        }
    }

    /// React to an event given by its wire label
    ///
    /// Labels outside the closed set produce `None` without touching any
    /// collaborator.
    ///
    /// # Errors
    ///
    /// Propagates data provider and responder failures unchanged
    pub async fn handle_event_named(&self, label: &str) -> Result<Option<String>> {
        match GameEventKind::from_label(label) {
            Some(kind) => self.handle_event(kind).await.map(Some),
            None => {
                tracing::debug!(label, "ignoring unknown event label");
                Ok(None)
            }
        }
    }
}
