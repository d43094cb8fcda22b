//! The generation controller and its public handle.
//!
//! [`GenerationController`] is a single actor task that owns the
//! [`GenerationState`], the last-submitted request, and the
//! [`PollScheduler`]. Every submit result and poll result is turned
//! into a [`JobEvent`] and run through the pure transition function,
//! strictly in arrival order; the returned effect starts or stops
//! polling. State-change notifications go out on a broadcast channel
//! for the presenter to render.
//!
//! Transport failures are never retried automatically. They surface as
//! `Failed` and recovery is an explicit user-initiated retry, so a
//! persistent outage stays visible instead of being papered over.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};

use dreamtrack_core::error::CoreError;
use dreamtrack_core::request::GenerationRequest;
use dreamtrack_core::state::GenerationState;
use dreamtrack_core::transition::{self, Effect, JobEvent, Transition};

use crate::api::{StatusOutcome, SubmitOutcome};
use crate::config::TrackerConfig;
use crate::scheduler::{PollScheduler, PollUpdate};
use crate::service::JobService;

/// Broadcast channel capacity for state-change notifications.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Errors surfaced by the tracker handle.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// `retry` was called before anything was ever submitted.
    #[error("No previous submission to retry")]
    NothingToRetry,

    /// The controller task has shut down.
    #[error("Tracker is shut down")]
    Closed,
}

/// Commands from the handle to the controller task.
enum Command {
    Submit {
        request: GenerationRequest,
    },
    Retry {
        reply: oneshot::Sender<Result<(), TrackerError>>,
    },
    State {
        reply: oneshot::Sender<GenerationState>,
    },
    Shutdown,
}

/// Clonable handle to a running generation tracker.
///
/// Created once via [`GenerationTracker::spawn`]; cheap to clone into
/// whatever drives the UI.
#[derive(Clone)]
pub struct GenerationTracker {
    command_tx: mpsc::UnboundedSender<Command>,
    event_tx: broadcast::Sender<GenerationState>,
}

impl GenerationTracker {
    /// Start the controller task and return its handle.
    pub fn spawn(service: Arc<dyn JobService>, config: TrackerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let controller = GenerationController {
            service: Arc::clone(&service),
            scheduler: PollScheduler::new(service, config.poll_interval, update_tx),
            state: GenerationState::Idle,
            last_request: None,
            event_tx: event_tx.clone(),
        };
        tokio::spawn(controller.run(command_rx, update_rx));

        Self {
            command_tx,
            event_tx,
        }
    }

    /// Submit a new generation request.
    ///
    /// Validation happens here, before anything is enqueued: an empty
    /// prompt returns [`CoreError::Validation`] and causes no state
    /// change at all. A valid prompt supersedes whatever job was being
    /// tracked before.
    pub fn submit(&self, prompt: &str) -> Result<(), TrackerError> {
        let request = GenerationRequest::new(prompt)?;
        self.command_tx
            .send(Command::Submit { request })
            .map_err(|_| TrackerError::Closed)
    }

    /// Re-submit the exact request of the last submission.
    ///
    /// Treated identically to a first-time submit. Fails with
    /// [`TrackerError::NothingToRetry`] if nothing was ever submitted.
    pub async fn retry(&self) -> Result<(), TrackerError> {
        let (reply, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command::Retry { reply })
            .map_err(|_| TrackerError::Closed)?;
        reply_rx.await.map_err(|_| TrackerError::Closed)?
    }

    /// Subscribe to state-change notifications.
    ///
    /// One message per observable transition; this is the presenter's
    /// input. Stale poll results and identical re-reports produce
    /// nothing here.
    pub fn subscribe(&self) -> broadcast::Receiver<GenerationState> {
        self.event_tx.subscribe()
    }

    /// Query the current state.
    pub async fn state(&self) -> Result<GenerationState, TrackerError> {
        let (reply, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command::State { reply })
            .map_err(|_| TrackerError::Closed)?;
        reply_rx.await.map_err(|_| TrackerError::Closed)
    }

    /// Stop polling and terminate the controller task.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(Command::Shutdown);
    }
}

/// The actor that owns all mutable tracker state.
struct GenerationController {
    service: Arc<dyn JobService>,
    scheduler: PollScheduler,
    state: GenerationState,
    /// Kept so that retry re-issues the exact original request.
    last_request: Option<GenerationRequest>,
    event_tx: broadcast::Sender<GenerationState>,
}

impl GenerationController {
    async fn run(
        mut self,
        mut command_rx: mpsc::UnboundedReceiver<Command>,
        mut update_rx: mpsc::UnboundedReceiver<PollUpdate>,
    ) {
        loop {
            tokio::select! {
                command = command_rx.recv() => match command {
                    Some(Command::Submit { request }) => self.handle_submit(request).await,
                    Some(Command::Retry { reply }) => {
                        let result = match self.last_request.clone() {
                            Some(request) => {
                                self.handle_submit(request).await;
                                Ok(())
                            }
                            None => Err(TrackerError::NothingToRetry),
                        };
                        let _ = reply.send(result);
                    }
                    Some(Command::State { reply }) => {
                        let _ = reply.send(self.state.clone());
                    }
                    Some(Command::Shutdown) | None => break,
                },
                Some(update) = update_rx.recv() => self.handle_poll_update(update),
            }
        }

        self.scheduler.stop();
        tracing::debug!("Generation controller stopped");
    }

    /// Run one submission to completion of the submit call.
    ///
    /// The superseded job's poll task is stopped before the request
    /// goes out, so its only trace can be an already-delivered update,
    /// which the job-id check discards.
    async fn handle_submit(&mut self, request: GenerationRequest) {
        self.apply(transition::apply(&self.state, JobEvent::SubmitStarted));
        self.last_request = Some(request.clone());

        tracing::info!(prompt = %request.prompt, "Submitting generation request");
        let event = match self.service.submit(&request).await {
            Ok(SubmitOutcome::Accepted {
                job_id,
                phase,
                video_url,
            }) => JobEvent::SubmitAccepted {
                job_id,
                phase,
                video_url,
            },
            Ok(SubmitOutcome::Rejected { reason }) => {
                tracing::warn!(reason = %reason, "Generation request rejected");
                JobEvent::SubmitRejected { reason }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Submit request failed");
                JobEvent::TransportFailed {
                    reason: e.to_string(),
                }
            }
        };
        self.apply(transition::apply(&self.state, event));
    }

    fn handle_poll_update(&mut self, update: PollUpdate) {
        let PollUpdate { job_id, outcome } = update;

        let event = match outcome {
            Ok(StatusOutcome::StillRunning { phase }) => JobEvent::StatusReported { job_id, phase },
            Ok(StatusOutcome::Finished { video_url }) => {
                JobEvent::StatusFinished { job_id, video_url }
            }
            Ok(StatusOutcome::Failed { reason }) => JobEvent::StatusFailed { job_id, reason },
            Ok(StatusOutcome::Unknown { state }) => {
                // Non-terminal by policy: leave state alone, keep polling.
                tracing::warn!(job_id = %job_id, state = %state, "Unrecognized job state reported");
                return;
            }
            Err(e) => {
                // A transport failure only fails the job still being
                // tracked; an error for a superseded job is stale noise.
                if !self.state.is_polling(&job_id) {
                    tracing::debug!(job_id = %job_id, "Discarding stale poll error");
                    return;
                }
                tracing::warn!(job_id = %job_id, error = %e, "Status poll failed");
                JobEvent::TransportFailed {
                    reason: e.to_string(),
                }
            }
        };

        self.apply(transition::apply(&self.state, event));
    }

    /// Execute a transition's effect, commit its state, and notify.
    fn apply(&mut self, transition: Transition) {
        let Transition {
            next,
            effect,
            notify,
        } = transition;

        match effect {
            Effect::StartPolling(job_id) => self.scheduler.start(job_id),
            Effect::StopPolling => self.scheduler.stop(),
            Effect::None => {}
        }

        self.state = next;
        if notify {
            tracing::info!(state = self.state.label(), "Generation state changed");
            let _ = self.event_tx.send(self.state.clone());
        }
    }
}
