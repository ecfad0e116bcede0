use std::{collections::HashMap, sync::Arc, time::Duration};

use analysis_backend::AnalysisBackend;
use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{
    domain::SessionId,
    error::{AnalysisError, ErrorKind},
    protocol::AnalysisResult,
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

const EVENTS_CHANNEL_CAPACITY: usize = 32;
const DEFAULT_MAX_SESSIONS: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Idle,
    Triggering,
    AwaitingResults,
    Succeeded,
    Failed,
}

impl WorkflowState {
    /// True while a trigger/fetch pipeline owns the session. The
    /// duplicate-submission guard is exactly this predicate; there is no
    /// separate in-progress flag.
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Triggering | Self::AwaitingResults)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Point-in-time view of one session's analysis lifecycle. `result` is
/// populated only in `Succeeded`, `error` only in `Failed`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSession {
    pub session_id: SessionId,
    pub state: WorkflowState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AnalysisError>,
    pub last_transition_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    /// Hard deadline for one trigger+fetch pipeline. `None` preserves the
    /// blocking-backend behavior of waiting indefinitely.
    pub deadline: Option<Duration>,
    /// Upper bound on retained session entries; entries with an active
    /// pipeline are never evicted to honor it.
    pub max_sessions: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            deadline: None,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// Caller bug; no entry is created and no state changes.
    #[error("invalid analysis request: {message}")]
    Validation { message: String },
    /// Informational notice, not a failure state: the session already has
    /// a pipeline in flight and the call was a no-op.
    #[error("analysis is already in progress for session {session_id}")]
    AlreadyInProgress { session_id: SessionId },
}

impl RequestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::AlreadyInProgress { .. } => ErrorKind::AlreadyInProgress,
        }
    }
}

struct SessionEntry {
    snapshot: AnalysisSession,
    events: broadcast::Sender<AnalysisSession>,
}

impl SessionEntry {
    fn new(session_id: SessionId) -> Self {
        let (events, _) = broadcast::channel(EVENTS_CHANNEL_CAPACITY);
        Self {
            snapshot: AnalysisSession {
                session_id,
                state: WorkflowState::Idle,
                result: None,
                error: None,
                last_transition_at: Utc::now(),
            },
            events,
        }
    }
}

struct ControllerState {
    registry: HashMap<SessionId, SessionEntry>,
    display_focus: Option<SessionId>,
}

/// Sequences and guards the two-step trigger/fetch protocol per session.
///
/// The registry is owned by the controller instance and passed around by
/// `Arc` reference; there is no process-global table. One pipeline runs
/// per session at a time, distinct sessions proceed independently, and
/// closing the display (the focus pointer) never discards workflow state.
pub struct AnalysisWorkflowController {
    backend: Arc<dyn AnalysisBackend>,
    config: ControllerConfig,
    inner: Mutex<ControllerState>,
}

impl AnalysisWorkflowController {
    pub fn new(backend: Arc<dyn AnalysisBackend>) -> Arc<Self> {
        Self::new_with_config(backend, ControllerConfig::default())
    }

    pub fn new_with_config(
        backend: Arc<dyn AnalysisBackend>,
        config: ControllerConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            backend,
            config,
            inner: Mutex::new(ControllerState {
                registry: HashMap::new(),
                display_focus: None,
            }),
        })
    }

    /// Starts the analysis pipeline for `session_id`, fire-and-forget:
    /// all pipeline outcomes are observed through [`snapshot`] and
    /// [`subscribe`], never through a return value.
    ///
    /// The guard check and the `Triggering` write happen under one
    /// registry lock, so a concurrent call for the same session cannot
    /// observe the pre-guard state in between.
    ///
    /// [`snapshot`]: Self::snapshot
    /// [`subscribe`]: Self::subscribe
    pub async fn request_analysis(
        self: &Arc<Self>,
        session_id: &SessionId,
    ) -> Result<(), RequestError> {
        if session_id.is_empty() {
            return Err(RequestError::Validation {
                message: "session id must not be empty".to_string(),
            });
        }

        {
            let mut inner = self.inner.lock().await;
            if let Some(entry) = inner.registry.get(session_id) {
                if entry.snapshot.state.is_in_flight() {
                    info!(
                        session_id = %session_id,
                        state = ?entry.snapshot.state,
                        "workflow: duplicate request suppressed"
                    );
                    return Err(RequestError::AlreadyInProgress {
                        session_id: session_id.clone(),
                    });
                }
            }

            let entry = ensure_entry(&mut inner.registry, session_id, self.config.max_sessions);
            entry.snapshot.state = WorkflowState::Triggering;
            entry.snapshot.result = None;
            entry.snapshot.error = None;
            entry.snapshot.last_transition_at = Utc::now();
            let _ = entry.events.send(entry.snapshot.clone());
        }
        info!(session_id = %session_id, "workflow: analysis requested");

        let controller = Arc::clone(self);
        let session_id = session_id.clone();
        tokio::spawn(async move {
            controller.run_pipeline(session_id).await;
        });

        Ok(())
    }

    /// Current state for the session, if the controller has ever seen it.
    /// Never blocks on the network and never starts work.
    pub async fn snapshot(&self, session_id: &SessionId) -> Option<AnalysisSession> {
        let inner = self.inner.lock().await;
        inner
            .registry
            .get(session_id)
            .map(|entry| entry.snapshot.clone())
    }

    /// Subscribes to every state transition for the session. An `Idle`
    /// entry is created lazily so callers may subscribe before the first
    /// request. Multiple receivers are independent; dropping the receiver
    /// unsubscribes.
    pub async fn subscribe(
        &self,
        session_id: &SessionId,
    ) -> broadcast::Receiver<AnalysisSession> {
        let mut inner = self.inner.lock().await;
        ensure_entry(&mut inner.registry, session_id, self.config.max_sessions)
            .events
            .subscribe()
    }

    /// Marks the session as the one currently displayed.
    pub async fn set_display_focus(&self, session_id: &SessionId) {
        let mut inner = self.inner.lock().await;
        inner.display_focus = Some(session_id.clone());
    }

    pub async fn display_focus(&self) -> Option<SessionId> {
        let inner = self.inner.lock().await;
        inner.display_focus.clone()
    }

    /// Unsets the focus pointer only, never the registry: in-flight or
    /// completed workflow state survives the display being closed, so a
    /// re-opened view observes it without re-triggering work.
    pub async fn clear_display_focus(&self) {
        let mut inner = self.inner.lock().await;
        inner.display_focus = None;
    }

    async fn run_pipeline(self: Arc<Self>, session_id: SessionId) {
        let outcome = match self.config.deadline {
            Some(deadline) => {
                match tokio::time::timeout(deadline, self.drive_backend(&session_id)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(AnalysisError::timeout(format!(
                        "analysis did not complete within {deadline:?}"
                    ))),
                }
            }
            None => self.drive_backend(&session_id).await,
        };

        match outcome {
            Ok(result) => {
                info!(
                    session_id = %session_id,
                    total_shots = result.total_shots,
                    "workflow: analysis succeeded"
                );
                self.transition(&session_id, |snapshot| {
                    snapshot.state = WorkflowState::Succeeded;
                    snapshot.result = Some(result);
                    snapshot.error = None;
                })
                .await;
            }
            Err(err) => {
                warn!(
                    session_id = %session_id,
                    kind = ?err.kind,
                    "workflow: analysis failed: {}",
                    err.message
                );
                self.transition(&session_id, |snapshot| {
                    snapshot.state = WorkflowState::Failed;
                    snapshot.result = None;
                    snapshot.error = Some(err);
                })
                .await;
            }
        }
    }

    async fn drive_backend(
        &self,
        session_id: &SessionId,
    ) -> Result<AnalysisResult, AnalysisError> {
        let ack = self.backend.trigger_analysis(session_id).await?;
        debug!(session_id = %session_id, message = %ack.message, "workflow: trigger acknowledged");

        self.transition(session_id, |snapshot| {
            snapshot.state = WorkflowState::AwaitingResults;
        })
        .await;

        self.backend.fetch_results(session_id).await
    }

    async fn transition<F>(&self, session_id: &SessionId, apply: F)
    where
        F: FnOnce(&mut AnalysisSession),
    {
        let mut inner = self.inner.lock().await;
        let Some(entry) = inner.registry.get_mut(session_id) else {
            // Entry can only be missing if an over-capacity registry was
            // forced to drop it; the pipeline outcome is then unobservable.
            warn!(session_id = %session_id, "workflow: transition for unknown session dropped");
            return;
        };
        apply(&mut entry.snapshot);
        entry.snapshot.last_transition_at = Utc::now();
        debug!(
            session_id = %session_id,
            state = ?entry.snapshot.state,
            "workflow: state transition"
        );
        let _ = entry.events.send(entry.snapshot.clone());
    }
}

/// Creates the entry lazily, evicting the least-recently-transitioned
/// non-in-flight entry when the registry is at capacity. An active
/// pipeline is never evicted; if every entry is in flight the bound is
/// exceeded and logged instead.
fn ensure_entry<'a>(
    registry: &'a mut HashMap<SessionId, SessionEntry>,
    session_id: &SessionId,
    max_sessions: usize,
) -> &'a mut SessionEntry {
    if !registry.contains_key(session_id) && registry.len() >= max_sessions {
        let candidate = registry
            .iter()
            .filter(|(_, entry)| !entry.snapshot.state.is_in_flight())
            .min_by_key(|(_, entry)| entry.snapshot.last_transition_at)
            .map(|(key, _)| key.clone());
        match candidate {
            Some(key) => {
                debug!(session_id = %key, "workflow: evicting idle session entry");
                registry.remove(&key);
            }
            None => {
                warn!(
                    registry_len = registry.len(),
                    max_sessions, "workflow: registry over capacity with all sessions in flight"
                );
            }
        }
    }

    registry
        .entry(session_id.clone())
        .or_insert_with(|| SessionEntry::new(session_id.clone()))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
