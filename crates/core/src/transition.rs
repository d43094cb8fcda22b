//! The generation state machine.
//!
//! [`apply`] is the single place where a [`GenerationState`] may
//! change. The controller translates submit results and poll results
//! into [`JobEvent`]s, feeds them through here in arrival order, and
//! executes the returned [`Effect`] on its scheduler. Keeping the
//! table pure makes every row and every discard rule unit-testable
//! without timers or a network.

use crate::state::{GenerationState, JobId, JobPhase};

/// An observed fact about the tracked job, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    /// A new submission was requested (first submit or retry).
    SubmitStarted,
    /// The service accepted the submission. `video_url` is populated
    /// on the immediate-result path.
    SubmitAccepted {
        job_id: JobId,
        phase: JobPhase,
        video_url: Option<String>,
    },
    /// The service explicitly rejected the submission.
    SubmitRejected { reason: String },
    /// A poll reported the job still running in `phase`.
    StatusReported { job_id: JobId, phase: JobPhase },
    /// A poll reported the job finished with an artifact.
    StatusFinished { job_id: JobId, video_url: String },
    /// A poll reported the job failed on the service side.
    StatusFailed { job_id: JobId, reason: String },
    /// The submit or poll request itself failed (network, timeout,
    /// unparseable response).
    TransportFailed { reason: String },
}

/// Side effect the controller must perform after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    /// Begin polling `fetch_status` for this job.
    StartPolling(JobId),
    /// Cancel the active poll task.
    StopPolling,
}

/// Result of applying one event to the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: GenerationState,
    pub effect: Effect,
    /// Whether the presenter should be notified. False when the event
    /// was discarded as stale or re-reported an identical state.
    pub notify: bool,
}

/// Apply one event to the current state.
///
/// Poll events (`Status*`) carry the `JobId` they were fetched for and
/// are discarded unless the current state is `Queued`/`Processing`
/// for that exact job. This is what makes a slow response from a
/// superseded job harmless: it never mutates state and never renders.
pub fn apply(current: &GenerationState, event: JobEvent) -> Transition {
    match event {
        JobEvent::SubmitStarted => Transition {
            notify: !matches!(current, GenerationState::Submitting),
            effect: stop_if_polling(current),
            next: GenerationState::Submitting,
        },

        JobEvent::SubmitAccepted {
            job_id,
            phase,
            video_url,
        } => match video_url {
            // Immediate-result path: no polling is ever started.
            Some(video_url) => Transition {
                next: GenerationState::Completed { job_id, video_url },
                effect: Effect::None,
                notify: true,
            },
            None => Transition {
                next: running_state(job_id.clone(), phase),
                effect: Effect::StartPolling(job_id),
                notify: true,
            },
        },

        JobEvent::SubmitRejected { reason } => Transition {
            next: GenerationState::Failed {
                job_id: None,
                reason,
            },
            effect: Effect::None,
            notify: true,
        },

        JobEvent::StatusReported { job_id, phase } => {
            if !current.is_polling(&job_id) {
                return discard(current);
            }
            let next = running_state(job_id, phase);
            let notify = next != *current;
            Transition {
                next,
                effect: Effect::None,
                notify,
            }
        }

        JobEvent::StatusFinished { job_id, video_url } => {
            if !current.is_polling(&job_id) {
                return discard(current);
            }
            Transition {
                next: GenerationState::Completed { job_id, video_url },
                effect: Effect::StopPolling,
                notify: true,
            }
        }

        JobEvent::StatusFailed { job_id, reason } => {
            if !current.is_polling(&job_id) {
                return discard(current);
            }
            Transition {
                next: GenerationState::Failed {
                    job_id: Some(job_id),
                    reason,
                },
                effect: Effect::StopPolling,
                notify: true,
            }
        }

        JobEvent::TransportFailed { reason } => Transition {
            effect: stop_if_polling(current),
            next: GenerationState::Failed {
                job_id: current.job_id().cloned(),
                reason,
            },
            notify: true,
        },
    }
}

fn running_state(job_id: JobId, phase: JobPhase) -> GenerationState {
    match phase {
        JobPhase::Queued => GenerationState::Queued { job_id },
        JobPhase::Processing => GenerationState::Processing { job_id },
    }
}

fn stop_if_polling(current: &GenerationState) -> Effect {
    match current {
        GenerationState::Queued { .. } | GenerationState::Processing { .. } => Effect::StopPolling,
        _ => Effect::None,
    }
}

/// A stale or irrelevant event: state unchanged, nothing rendered.
fn discard(current: &GenerationState) -> Transition {
    Transition {
        next: current.clone(),
        effect: Effect::None,
        notify: false,
    }
}
