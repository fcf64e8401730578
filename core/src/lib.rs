pub mod backend;
pub mod candidate;
pub mod config;
pub mod controller;
pub mod diagnosis;
pub mod error;
pub mod report;
pub mod resolution;
pub mod status;

pub use backend::{Backend, HttpBackend};
pub use candidate::{Candidate, Origin};
pub use config::BackendConfig;
pub use controller::ResolutionController;
pub use diagnosis::{DiagnosisRecord, DiagnosisTarget, Scalar};
pub use error::{BackendError, ConfigError, ResolutionError};
pub use resolution::{Failure, Phase, ResolutionState};
