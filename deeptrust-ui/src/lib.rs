//! deeptrust-ui client library
//!
//! Drives one analysis session at a time against the deeptrust-ai service:
//! - [`input`]: turns a local file or a URL into a submission with a preview
//! - [`boundary`]: the HTTP call to `/analyze-image`
//! - [`session`]: client session state and phase transitions
//! - [`ticker`]: progressive status labels while a request is in flight
//! - [`orchestrator`]: the state machine tying them together

pub mod boundary;
pub mod config;
pub mod error;
pub mod input;
pub mod orchestrator;
pub mod session;
pub mod ticker;

pub use boundary::{AnalysisBoundary, HttpBoundary};
pub use error::{BoundaryError, OrchestratorError};
pub use input::Submission;
pub use orchestrator::Orchestrator;
pub use session::{ClientSession, Phase, PhaseTransition};
