use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use tracing::{error, info, warn};

use super::{Form, Phase, SubmissionOutcome, SubmissionRequest, SubmitError};
use crate::coach::FeedbackGenerator;
use crate::consts::DEFAULT_TABLE;
use crate::events::{Event, EventBus};
use crate::leaderboard::Leaderboard;
use crate::store::RemoteStore;

/// Validates a submission, persists it while a coach comment is generated,
/// and refreshes the leaderboard once the write is confirmed.
pub struct Orchestrator {
    store: Arc<dyn RemoteStore>,
    feedback: FeedbackGenerator,
    leaderboard: Arc<Leaderboard>,
    events: Arc<EventBus>,
    phase: Mutex<Phase>,
}

/// Returns the orchestrator to `Idle` however `submit` ends.
struct IdleOnDrop<'a>(&'a Orchestrator);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.enter(Phase::Idle);
    }
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        feedback: FeedbackGenerator,
        leaderboard: Arc<Leaderboard>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            store,
            feedback,
            leaderboard,
            events,
            phase: Mutex::new(Phase::Idle),
        }
    }

    pub fn phase(&self) -> Phase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn leaderboard(&self) -> &Arc<Leaderboard> {
        &self.leaderboard
    }

    pub fn store(&self) -> &Arc<dyn RemoteStore> {
        &self.store
    }

    pub fn feedback(&self) -> &FeedbackGenerator {
        &self.feedback
    }

    fn enter(&self, phase: Phase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = phase;
        self.events.emit(Event::PhaseChanged { phase });
    }

    /// Handle one submission end to end.
    ///
    /// The outcome depends only on the insert: a failed write is a failure
    /// even when a comment was generated. On success the leaderboard has
    /// already been refreshed when this returns.
    pub async fn submit(&self, name: &str, score: i64) -> SubmissionOutcome {
        let _idle = IdleOnDrop(self);

        self.enter(Phase::Validating);
        let request = match self.validate(name, score) {
            Ok(request) => request,
            Err(e) => {
                warn!("submission rejected: {e}");
                return SubmissionOutcome::Failure(e);
            }
        };

        self.enter(Phase::InFlight);
        info!(name = %request.name, score = %request.score, "submitting");
        let outcome = self.dispatch(&request).await;

        self.enter(Phase::Reconciled {
            success: outcome.is_success(),
        });

        if outcome.is_success() {
            self.leaderboard.refresh().await;
        }
        outcome
    }

    fn validate(&self, name: &str, score: i64) -> Result<SubmissionRequest, SubmitError> {
        let request = SubmissionRequest::new(name, score)?;
        if !self.store.is_available() {
            return Err(SubmitError::Config);
        }
        Ok(request)
    }

    /// Run the comment and the insert side by side, then reconcile.
    async fn dispatch(&self, request: &SubmissionRequest) -> SubmissionOutcome {
        let comment = AssertUnwindSafe(self.feedback.generate(&request.name, request.score))
            .catch_unwind();
        let inserted =
            AssertUnwindSafe(self.store.insert(&request.name, request.score)).catch_unwind();

        match futures::future::join(comment, inserted).await {
            (Err(panic), _) | (_, Err(panic)) => {
                let detail = panic_message(panic.as_ref());
                error!("unexpected failure during submission: {detail}");
                SubmissionOutcome::Failure(SubmitError::Unexpected(detail))
            }
            (Ok(_discarded), Ok(Err(source))) => {
                warn!("submission not stored: {source}");
                let table = self.store.table().unwrap_or(DEFAULT_TABLE).to_string();
                SubmissionOutcome::Failure(SubmitError::Store { source, table })
            }
            (Ok(comment), Ok(Ok(()))) => {
                info!(name = %request.name, "submission stored");
                SubmissionOutcome::Success {
                    comment,
                    form: Form::default(),
                }
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Inténtalo de nuevo.".to_string()
    }
}
