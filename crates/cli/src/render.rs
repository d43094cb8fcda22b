//! Terminal presenter: a pure projection of state to a display line.

use dreamtrack_core::state::GenerationState;

/// Render one state as a human-readable line.
pub fn render(state: &GenerationState) -> String {
    match state {
        GenerationState::Idle => "Ready.".to_string(),
        GenerationState::Submitting => "Submitting generation request...".to_string(),
        GenerationState::Queued { job_id } => {
            format!("Job {job_id} queued, waiting for the service to start...")
        }
        GenerationState::Processing { job_id } => {
            format!("Job {job_id} processing...")
        }
        GenerationState::Completed { job_id, video_url } => {
            format!("Job {job_id} completed: {video_url}")
        }
        GenerationState::Failed {
            job_id: Some(job_id),
            reason,
        } => format!("Job {job_id} failed: {reason}"),
        GenerationState::Failed {
            job_id: None,
            reason,
        } => format!("Generation failed: {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use dreamtrack_core::state::JobId;

    use super::*;

    #[test]
    fn completed_line_carries_the_video_url() {
        let line = render(&GenerationState::Completed {
            job_id: JobId::new("42"),
            video_url: "/media/42.mp4".into(),
        });
        assert!(line.contains("42"));
        assert!(line.contains("/media/42.mp4"));
    }

    #[test]
    fn failed_line_without_a_job_id_still_explains() {
        let line = render(&GenerationState::Failed {
            job_id: None,
            reason: "connection refused".into(),
        });
        assert!(line.contains("connection refused"));
    }
}
