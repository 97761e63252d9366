//! Client orchestrator
//!
//! Owns the single [`ClientSession`] and drives it through
//! Idle → Submitting → Loading → Result | Error.
//!
//! Each submission gets a cancellation token shared by its status ticker and its
//! network call. `reset` cancels that token, so a reset mid-flight aborts both and
//! the superseded `submit` returns [`OrchestratorError::Superseded`] without
//! touching the new session. Leaving `Loading` always stops the ticker first.
//! Dropping a `submit` future mid-flight cancels its token and returns the session
//! to Idle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use deeptrust_common::AnalysisResult;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::boundary::AnalysisBoundary;
use crate::config::ClientConfig;
use crate::error::OrchestratorError;
use crate::input::Submission;
use crate::session::{ClientSession, Phase, PhaseTransition};
use crate::ticker::Ticker;

const TRANSITION_CHANNEL_CAPACITY: usize = 64;

struct SessionState {
    session: ClientSession,
    cancel: CancellationToken,
    ticker: Option<Ticker>,
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Orchestrator {
    boundary: Arc<dyn AnalysisBoundary>,
    tick_interval: Duration,
    state: Arc<Mutex<SessionState>>,
    transitions: broadcast::Sender<PhaseTransition>,
    snapshots: Arc<watch::Sender<ClientSession>>,
}

impl Orchestrator {
    pub fn new(boundary: Arc<dyn AnalysisBoundary>, tick_interval: Duration) -> Self {
        let session = ClientSession::new();
        let (transitions, _) = broadcast::channel(TRANSITION_CHANNEL_CAPACITY);
        let (snapshots, _) = watch::channel(session.clone());

        Self {
            boundary,
            tick_interval,
            state: Arc::new(Mutex::new(SessionState {
                session,
                cancel: CancellationToken::new(),
                ticker: None,
            })),
            transitions,
            snapshots: Arc::new(snapshots),
        }
    }

    pub fn from_config(config: &ClientConfig, boundary: Arc<dyn AnalysisBoundary>) -> Self {
        Self::new(boundary, config.tick_interval())
    }

    /// Copy of the current session
    pub fn snapshot(&self) -> ClientSession {
        lock(&self.state).session.clone()
    }

    /// Phase transitions, in order, from now on
    pub fn subscribe(&self) -> broadcast::Receiver<PhaseTransition> {
        self.transitions.subscribe()
    }

    /// Latest session snapshot, updated on every transition and ticker step
    pub fn watch(&self) -> watch::Receiver<ClientSession> {
        self.snapshots.subscribe()
    }

    pub fn ticker_active(&self) -> bool {
        lock(&self.state).ticker.is_some()
    }

    /// Run one analysis to completion
    ///
    /// Replaces any finished session. Rejected with `Busy` while another
    /// submission is in flight.
    pub async fn submit(&self, submission: Submission) -> Result<AnalysisResult, OrchestratorError> {
        let Submission {
            request,
            preview_uri,
        } = submission;

        let (session_id, cancel) = {
            let mut state = lock(&self.state);
            if state.session.phase.is_in_flight() {
                tracing::warn!(session_id = %state.session.session_id, "Submit rejected, analysis in progress");
                return Err(OrchestratorError::Busy);
            }

            let mut session = ClientSession::new();
            session.preview_uri = Some(preview_uri);
            let cancel = CancellationToken::new();

            let mut events = vec![session.transition_to(Phase::Submitting)];
            events.push(session.transition_to(Phase::Loading));

            let ticker = Ticker::start(
                self.tick_interval,
                cancel.child_token(),
                self.step_callback(session.session_id),
            );

            state.session = session;
            state.cancel = cancel.clone();
            state.ticker = Some(ticker);
            self.publish(events, &state.session);

            (state.session.session_id, cancel)
        };
        let mut in_flight = InFlight {
            orchestrator: self,
            session_id,
            cancel: cancel.clone(),
            armed: true,
        };

        tracing::info!(
            %session_id,
            source = if request.image_base64.is_some() { "upload" } else { "url" },
            "Analysis submitted"
        );

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            outcome = self.boundary.analyze(request) => Some(outcome),
        };

        let Some(outcome) = outcome else {
            tracing::info!(%session_id, "Analysis superseded, request aborted");
            return Err(OrchestratorError::Superseded);
        };

        // Stop the ticker before any session mutation
        let ticker = {
            let mut state = lock(&self.state);
            if state.session.session_id != session_id {
                return Err(OrchestratorError::Superseded);
            }
            state.ticker.take()
        };
        if let Some(ticker) = ticker {
            ticker.stop().await;
        }

        let mut state = lock(&self.state);
        if state.session.session_id != session_id || cancel.is_cancelled() {
            return Err(OrchestratorError::Superseded);
        }

        let transition = match &outcome {
            Ok(result) => {
                tracing::info!(
                    %session_id,
                    verdict = %result.verdict,
                    confidence = result.confidence,
                    "Analysis result received"
                );
                state.session.complete(result.clone())
            }
            Err(err) => {
                tracing::warn!(%session_id, error = %err, "Analysis failed");
                state.session.fail(err.user_message())
            }
        };
        self.publish(vec![transition], &state.session);
        drop(state);
        in_flight.armed = false;

        outcome.map_err(OrchestratorError::from)
    }

    /// Discard the current session and return to Idle
    ///
    /// An in-flight submission is aborted along with its ticker.
    pub async fn reset(&self) {
        let ticker = {
            let mut state = lock(&self.state);
            if state.session.phase == Phase::Idle {
                return;
            }

            state.cancel.cancel();
            let ticker = state.ticker.take();
            let transition = state.session.transition_to(Phase::Idle);
            tracing::info!(session_id = %transition.session_id, from = ?transition.old_phase, "Session reset");

            state.session = ClientSession::new();
            state.cancel = CancellationToken::new();
            self.publish(vec![transition], &state.session);
            ticker
        };

        if let Some(ticker) = ticker {
            ticker.stop().await;
        }
    }

    /// Return an in-flight session to Idle after its `submit` future was dropped
    fn abandon(&self, session_id: Uuid, cancel: &CancellationToken) {
        cancel.cancel();

        let mut state = lock(&self.state);
        if state.session.session_id != session_id || !state.session.phase.is_in_flight() {
            return;
        }

        // The ticker's token is a child of `cancel`, so its task is already exiting
        drop(state.ticker.take());
        let transition = state.session.transition_to(Phase::Idle);
        tracing::info!(%session_id, from = ?transition.old_phase, "Analysis abandoned by caller");

        state.session = ClientSession::new();
        state.cancel = CancellationToken::new();
        self.publish(vec![transition], &state.session);
    }

    fn publish(&self, events: Vec<PhaseTransition>, session: &ClientSession) {
        for event in events {
            // No subscribers is fine
            let _ = self.transitions.send(event);
        }
        self.snapshots.send_replace(session.clone());
    }

    /// Ticker updates apply only to the same session while it is still loading
    fn step_callback(&self, session_id: Uuid) -> impl Fn(usize) + Send + 'static {
        let state = Arc::clone(&self.state);
        let snapshots = Arc::clone(&self.snapshots);

        move |step| {
            let mut state = lock(&state);
            if state.session.session_id != session_id || state.session.phase != Phase::Loading {
                return;
            }
            state.session.scan_step_index = step;
            snapshots.send_replace(state.session.clone());
        }
    }
}

/// Armed while a `submit` call owns the session; firing means the call was dropped
struct InFlight<'a> {
    orchestrator: &'a Orchestrator,
    session_id: Uuid,
    cancel: CancellationToken,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.orchestrator.abandon(self.session_id, &self.cancel);
        }
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        lock(&self.state).cancel.cancel();
    }
}
