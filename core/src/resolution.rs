//! Search → disambiguate → diagnose state machine.
//!
//! [`transition`] is a pure function from (state, event) to (state, effect).
//! It never performs I/O: it tells the caller which backend call to make
//! next through an [`Effect`], and the caller feeds the outcome back as
//! another [`Event`]. Every request carries a [`Ticket`]; outcomes whose
//! ticket is no longer current are discarded so a late response from an
//! abandoned flow can never overwrite newer state.

use serde::Serialize;

use crate::candidate::Candidate;
use crate::diagnosis::{DiagnosisRecord, DiagnosisTarget};
use crate::error::{ResolutionError, codes};

/// Monotonic request generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Ticket(u64);

impl Ticket {
    fn next(self) -> Self {
        Ticket(self.0 + 1)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Searching,
    Disambiguating,
    Diagnosing,
    Resolved,
    Failed,
}

/// Why a flow ended in [`Phase::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Failure {
    /// Search returned nothing; the operator should refine the query.
    NoMatch,
    /// Search request failed (transport, timeout or non-success status).
    Connection,
    /// Diagnosis request failed.
    Diagnosis,
}

impl Failure {
    pub fn message(self) -> &'static str {
        match self {
            Failure::NoMatch => "No se encontraron clientes con ese criterio.",
            Failure::Connection => "Error de conexión con el servidor.",
            Failure::Diagnosis => "Error al diagnosticar. Reintente la consulta.",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Failure::NoMatch => codes::NO_MATCH,
            Failure::Connection => codes::CONNECTION_ERROR,
            Failure::Diagnosis => codes::DIAGNOSIS_ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Operator submitted a free-text query.
    Search { query: String },
    SearchSucceeded {
        ticket: Ticket,
        candidates: Vec<Candidate>,
    },
    SearchFailed { ticket: Ticket },
    /// Operator picked a candidate by its position in the current list.
    Select { index: usize },
    /// Diagnose a known username directly, skipping search.
    Diagnose { target: DiagnosisTarget },
    DiagnosisSucceeded {
        ticket: Ticket,
        record: DiagnosisRecord,
    },
    DiagnosisFailed { ticket: Ticket },
}

/// What the driver of the machine has to do after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Nothing to do; the flow is idle or waiting for the operator.
    None,
    FetchCandidates { ticket: Ticket, query: String },
    FetchDiagnosis {
        ticket: Ticket,
        target: DiagnosisTarget,
    },
    /// The outcome belonged to a superseded request and was dropped.
    Discarded { ticket: Ticket },
    /// The event is not valid in the current state; state is unchanged.
    Rejected(ResolutionError),
}

/// Working state of one resolution flow, read by renderers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolutionState {
    query: String,
    phase: Phase,
    candidates: Vec<Candidate>,
    result: Option<DiagnosisRecord>,
    loading: bool,
    status: String,
    failure: Option<Failure>,
    target: Option<DiagnosisTarget>,
    ticket: Ticket,
}

impl ResolutionState {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Candidates awaiting a selection, in backend order.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn result(&self) -> Option<&DiagnosisRecord> {
        self.result.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Progress message; empty when there is nothing to report.
    pub fn status_message(&self) -> &str {
        &self.status
    }

    pub fn failure(&self) -> Option<Failure> {
        self.failure
    }

    pub fn error_message(&self) -> Option<&'static str> {
        self.failure.map(Failure::message)
    }

    /// Target of the latest diagnosis request, if any.
    pub fn target(&self) -> Option<&DiagnosisTarget> {
        self.target.as_ref()
    }

    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    fn awaits(&self, phase: Phase, ticket: Ticket) -> bool {
        self.phase == phase && self.ticket == ticket
    }

    fn begin_search(self, query: String) -> (Self, Effect) {
        let query = query.trim();
        if query.is_empty() {
            return (self, Effect::None);
        }

        let ticket = self.ticket.next();
        let next = ResolutionState {
            query: query.to_string(),
            phase: Phase::Searching,
            loading: true,
            status: "Escaneando padrón...".to_string(),
            ticket,
            ..ResolutionState::default()
        };
        let effect = Effect::FetchCandidates {
            ticket,
            query: next.query.clone(),
        };
        (next, effect)
    }

    fn apply_candidates(self, ticket: Ticket, mut candidates: Vec<Candidate>) -> (Self, Effect) {
        match candidates.len() {
            0 => (self.fail(Failure::NoMatch), Effect::None),
            1 => {
                let only = candidates.remove(0);
                let status = "Resultado único encontrado. Obteniendo diagnóstico...".to_string();
                self.begin_diagnosis(ticket, only.target(), status)
            }
            found => {
                let next = ResolutionState {
                    phase: Phase::Disambiguating,
                    candidates,
                    loading: false,
                    status: format!("Se encontraron {found} coincidencias. Seleccione una:"),
                    ..self
                };
                (next, Effect::None)
            }
        }
    }

    fn select(self, index: usize) -> (Self, Effect) {
        if self.phase != Phase::Disambiguating {
            return (self, Effect::Rejected(ResolutionError::NotDisambiguating));
        }
        let Some(target) = self.candidates.get(index).map(Candidate::target) else {
            return (self, Effect::Rejected(ResolutionError::UnknownCandidate));
        };

        let ticket = self.ticket.next();
        let status = probing_message(&target.username);
        self.begin_diagnosis(ticket, target, status)
    }

    fn begin_diagnosis(
        self,
        ticket: Ticket,
        target: DiagnosisTarget,
        status: String,
    ) -> (Self, Effect) {
        let next = ResolutionState {
            phase: Phase::Diagnosing,
            candidates: Vec::new(),
            result: None,
            loading: true,
            status,
            failure: None,
            target: Some(target.clone()),
            ticket,
            ..self
        };
        (next, Effect::FetchDiagnosis { ticket, target })
    }

    fn resolve(self, record: DiagnosisRecord) -> (Self, Effect) {
        let record = match &self.target {
            Some(target) => record.with_requested_username(target.username.clone()),
            None => record,
        };
        let next = ResolutionState {
            phase: Phase::Resolved,
            result: Some(record),
            loading: false,
            status: String::new(),
            ..self
        };
        (next, Effect::None)
    }

    fn fail(self, failure: Failure) -> Self {
        ResolutionState {
            phase: Phase::Failed,
            candidates: Vec::new(),
            result: None,
            loading: false,
            status: String::new(),
            failure: Some(failure),
            ..self
        }
    }
}

fn probing_message(username: &str) -> String {
    format!("Interrogando equipos para {username}...")
}

/// Apply one event to the state.
pub fn transition(state: ResolutionState, event: Event) -> (ResolutionState, Effect) {
    match event {
        Event::Search { query } => state.begin_search(query),
        Event::SearchSucceeded { ticket, candidates }
            if state.awaits(Phase::Searching, ticket) =>
        {
            state.apply_candidates(ticket, candidates)
        }
        Event::SearchFailed { ticket } if state.awaits(Phase::Searching, ticket) => {
            (state.fail(Failure::Connection), Effect::None)
        }
        Event::Select { index } => state.select(index),
        Event::Diagnose { target } => {
            let ticket = state.ticket.next();
            let status = probing_message(&target.username);
            state.begin_diagnosis(ticket, target, status)
        }
        Event::DiagnosisSucceeded { ticket, record }
            if state.awaits(Phase::Diagnosing, ticket) =>
        {
            state.resolve(record)
        }
        Event::DiagnosisFailed { ticket } if state.awaits(Phase::Diagnosing, ticket) => {
            (state.fail(Failure::Diagnosis), Effect::None)
        }
        Event::SearchSucceeded { ticket, .. }
        | Event::SearchFailed { ticket }
        | Event::DiagnosisSucceeded { ticket, .. }
        | Event::DiagnosisFailed { ticket } => (state, Effect::Discarded { ticket }),
    }
}
