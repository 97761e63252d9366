//! Client session state machine
//!
//! Idle → Submitting → Loading → Result | Error; reset returns to Idle.

use chrono::{DateTime, Utc};
use deeptrust_common::AnalysisResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Accepts new input
    Idle,
    /// Request assembled and handed to the service boundary
    Submitting,
    /// Awaiting the service; the status ticker runs
    Loading,
    /// Validated result available
    Result,
    /// User-facing failure message available
    Error,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Result | Phase::Error)
    }

    /// A submission is outstanding
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Phase::Submitting | Phase::Loading)
    }
}

/// Phase change event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub session_id: Uuid,
    pub old_phase: Phase,
    pub new_phase: Phase,
    pub transitioned_at: DateTime<Utc>,
}

/// Transient state of one analysis, owned by the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSession {
    pub session_id: Uuid,
    pub phase: Phase,
    /// Data URI or URL of the submitted image; cleared on failure and reset
    pub preview_uri: Option<String>,
    /// Index into the status labels while loading
    pub scan_step_index: usize,
    pub result: Option<AnalysisResult>,
    pub error: Option<String>,
}

impl ClientSession {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            phase: Phase::Idle,
            preview_uri: None,
            scan_step_index: 0,
            result: None,
            error: None,
        }
    }

    /// Transition to new phase
    pub fn transition_to(&mut self, new_phase: Phase) -> PhaseTransition {
        let transition = PhaseTransition {
            session_id: self.session_id,
            old_phase: self.phase,
            new_phase,
            transitioned_at: Utc::now(),
        };
        self.phase = new_phase;
        transition
    }

    /// Loading → Result, keeping the preview
    pub fn complete(&mut self, result: AnalysisResult) -> PhaseTransition {
        self.result = Some(result);
        self.error = None;
        self.transition_to(Phase::Result)
    }

    /// Loading → Error, discarding the preview
    pub fn fail(&mut self, message: String) -> PhaseTransition {
        self.preview_uri = None;
        self.result = None;
        self.error = Some(message);
        self.transition_to(Phase::Error)
    }
}

impl Default for ClientSession {
    fn default() -> Self {
        Self::new()
    }
}
