//! Job identifiers and the generation lifecycle state.

use serde::{Deserialize, Serialize};

/// Opaque job identifier assigned by the generation service on submit.
///
/// Used as the polling key and as the staleness check for poll results:
/// a result tagged with a `JobId` that no longer matches the tracked
/// job is discarded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-terminal phase reported by the service while a job is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobPhase {
    Queued,
    Processing,
}

/// Lifecycle of one tracked generation job.
///
/// Exactly one state is current per tracked session. A new submission
/// replaces it wholesale; there is no merging of old and new jobs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GenerationState {
    /// No job in flight (initial state).
    Idle,
    /// Submit request sent, awaiting the service response.
    Submitting,
    /// Accepted by the service, not yet started.
    Queued { job_id: JobId },
    /// Actively running on the service.
    Processing { job_id: JobId },
    /// Terminal success; carries the retrievable artifact location.
    Completed { job_id: JobId, video_url: String },
    /// Terminal failure. `job_id` is `None` when the failure happened
    /// before a job existed (submit rejected or submit transport error).
    Failed {
        job_id: Option<JobId>,
        reason: String,
    },
}

impl GenerationState {
    /// The job this state refers to, if one has been assigned.
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            Self::Idle | Self::Submitting => None,
            Self::Queued { job_id } | Self::Processing { job_id } => Some(job_id),
            Self::Completed { job_id, .. } => Some(job_id),
            Self::Failed { job_id, .. } => job_id.as_ref(),
        }
    }

    /// Whether this state ends the session: no further polls may be
    /// scheduled once a terminal state is reached.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }

    /// Whether `job_id` is the job currently being polled. Only
    /// `Queued` and `Processing` accept poll results; everything else
    /// treats them as stale.
    pub fn is_polling(&self, job_id: &JobId) -> bool {
        match self {
            Self::Queued { job_id: id } | Self::Processing { job_id: id } => id == job_id,
            _ => false,
        }
    }

    /// Short display label for logging and rendering.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::Queued { .. } => "queued",
            Self::Processing { .. } => "processing",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_id_accessor_per_variant() {
        let id = JobId::new("42");
        assert_eq!(GenerationState::Idle.job_id(), None);
        assert_eq!(GenerationState::Submitting.job_id(), None);
        assert_eq!(
            GenerationState::Queued { job_id: id.clone() }.job_id(),
            Some(&id)
        );
        assert_eq!(
            GenerationState::Completed {
                job_id: id.clone(),
                video_url: "/media/42.mp4".into()
            }
            .job_id(),
            Some(&id)
        );
        assert_eq!(
            GenerationState::Failed {
                job_id: None,
                reason: "rejected".into()
            }
            .job_id(),
            None
        );
    }

    #[test]
    fn terminal_states() {
        assert!(!GenerationState::Idle.is_terminal());
        assert!(!GenerationState::Submitting.is_terminal());
        assert!(!GenerationState::Queued {
            job_id: JobId::new("a")
        }
        .is_terminal());
        assert!(GenerationState::Completed {
            job_id: JobId::new("a"),
            video_url: "/v.mp4".into()
        }
        .is_terminal());
        assert!(GenerationState::Failed {
            job_id: None,
            reason: "x".into()
        }
        .is_terminal());
    }

    #[test]
    fn polling_only_in_running_states_with_matching_id() {
        let a = JobId::new("a");
        let b = JobId::new("b");

        let queued = GenerationState::Queued { job_id: a.clone() };
        assert!(queued.is_polling(&a));
        assert!(!queued.is_polling(&b));

        let completed = GenerationState::Completed {
            job_id: a.clone(),
            video_url: "/v.mp4".into(),
        };
        assert!(!completed.is_polling(&a));

        assert!(!GenerationState::Submitting.is_polling(&a));
    }
}
