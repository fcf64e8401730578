use std::sync::{Mutex, MutexGuard};

use crate::backend::{Backend, HttpBackend};
use crate::candidate::Candidate;
use crate::config::BackendConfig;
use crate::diagnosis::DiagnosisTarget;
use crate::error::{BackendError, ResolutionError};
use crate::resolution::{Effect, Event, Phase, ResolutionState, transition};

/// Drives the resolution state machine against a [`Backend`].
///
/// Operations take `&self` so a new search can be started while an older
/// flow is still waiting on the network; the older flow's responses are
/// then discarded. State is only locked between awaits.
pub struct ResolutionController<B> {
    backend: B,
    state: Mutex<ResolutionState>,
}

impl ResolutionController<HttpBackend> {
    pub fn connect(config: BackendConfig) -> Result<Self, BackendError> {
        Ok(Self::new(HttpBackend::new(config)?))
    }
}

impl<B: Backend> ResolutionController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: Mutex::new(ResolutionState::default()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Snapshot of the current state for rendering.
    pub fn state(&self) -> ResolutionState {
        self.lock().clone()
    }

    /// Search for `query`; a single hit is diagnosed right away.
    /// Blank queries are ignored.
    pub async fn search(&self, query: &str) -> ResolutionState {
        self.run(Event::Search {
            query: query.to_string(),
        })
        .await
        .unwrap_or_else(|_| self.state())
    }

    /// Diagnose one of the candidates offered by the last search.
    pub async fn select_candidate(
        &self,
        candidate: &Candidate,
    ) -> Result<ResolutionState, ResolutionError> {
        let index = {
            let state = self.lock();
            if state.phase() != Phase::Disambiguating {
                return Err(ResolutionError::NotDisambiguating);
            }
            state
                .candidates()
                .iter()
                .position(|c| c == candidate)
                .ok_or(ResolutionError::UnknownCandidate)?
        };
        self.select_index(index).await
    }

    /// Diagnose the candidate at `index` in the current list.
    pub async fn select_index(&self, index: usize) -> Result<ResolutionState, ResolutionError> {
        self.run(Event::Select { index }).await
    }

    /// Diagnose a known username directly.
    pub async fn diagnose(&self, username: &str, node_ip: Option<&str>) -> ResolutionState {
        let target = DiagnosisTarget::new(username.trim(), node_ip.map(str::to_string));
        self.run(Event::Diagnose { target })
            .await
            .unwrap_or_else(|_| self.state())
    }

    async fn run(&self, event: Event) -> Result<ResolutionState, ResolutionError> {
        let mut effect = self.dispatch(event);
        loop {
            effect = match effect {
                Effect::None => break,
                Effect::Rejected(err) => return Err(err),
                Effect::Discarded { ticket } => {
                    tracing::debug!(?ticket, "discarded response from superseded request");
                    break;
                }
                Effect::FetchCandidates { ticket, query } => {
                    tracing::info!(%query, "searching subscribers");
                    let event = match self.backend.search(&query).await {
                        Ok(candidates) => {
                            tracing::debug!(count = candidates.len(), "search answered");
                            Event::SearchSucceeded { ticket, candidates }
                        }
                        Err(error) => {
                            tracing::warn!(%error, %query, "search request failed");
                            Event::SearchFailed { ticket }
                        }
                    };
                    self.dispatch(event)
                }
                Effect::FetchDiagnosis { ticket, target } => {
                    tracing::info!(
                        username = %target.username,
                        node_ip = target.node_ip.as_deref(),
                        "requesting diagnosis"
                    );
                    let event = match self.backend.diagnosis(&target).await {
                        Ok(record) => Event::DiagnosisSucceeded { ticket, record },
                        Err(error) => {
                            tracing::warn!(%error, username = %target.username, "diagnosis request failed");
                            Event::DiagnosisFailed { ticket }
                        }
                    };
                    self.dispatch(event)
                }
            };
        }
        Ok(self.state())
    }

    fn dispatch(&self, event: Event) -> Effect {
        let mut state = self.lock();
        let (next, effect) = transition(std::mem::take(&mut *state), event);
        *state = next;
        effect
    }

    fn lock(&self) -> MutexGuard<'_, ResolutionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
