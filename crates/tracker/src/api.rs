//! REST client for the generation service HTTP endpoints.
//!
//! Wraps `POST /generate` and `GET /check-status/{id}` using
//! [`reqwest`]. This layer has no retries and no timers; all
//! resilience policy lives in the controller and scheduler. Transport
//! failures ([`ApiError`]) are kept distinct from business outcomes
//! ([`SubmitOutcome::Rejected`], [`StatusOutcome::Failed`]) so the
//! caller can tell them apart.

use serde::Deserialize;
use std::time::Duration;

use dreamtrack_core::request::GenerationRequest;
use dreamtrack_core::state::{JobId, JobPhase};

/// HTTP client for a single generation service.
pub struct GenerationApi {
    client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

/// Result of a submission, as the controller consumes it.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The service accepted the job. `video_url` is populated when the
    /// result was already available at submit time.
    Accepted {
        job_id: JobId,
        phase: JobPhase,
        video_url: Option<String>,
    },
    /// The service explicitly rejected the request.
    Rejected { reason: String },
}

/// Result of one status poll, as the controller consumes it.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusOutcome {
    /// The job is still running.
    StillRunning { phase: JobPhase },
    /// Terminal success with the artifact location.
    Finished { video_url: String },
    /// Terminal failure reported by the service.
    Failed { reason: String },
    /// The service reported a state string this client does not know.
    /// Non-terminal: the caller keeps polling and leaves state alone.
    Unknown { state: String },
}

/// Errors from the generation service REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, timeout) or the
    /// response body was not valid JSON.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status without a parseable
    /// business rejection in the body.
    #[error("Generation service error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The response parsed as JSON but violated the contract.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Wire shape of the `POST /generate` response.
#[derive(Debug, Deserialize)]
struct GenerateBody {
    success: bool,
    error: Option<String>,
    generation_id: Option<String>,
    state: Option<String>,
    video_url: Option<String>,
}

/// Wire shape of the `GET /check-status/{id}` response.
#[derive(Debug, Deserialize)]
struct StatusBody {
    state: String,
    video_url: Option<String>,
    failure_reason: Option<String>,
}

impl GenerationApi {
    /// Create a client for a generation service.
    ///
    /// * `base_url` - base HTTP URL, e.g. `http://localhost:5000`.
    pub fn new(base_url: String, request_timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            request_timeout,
        }
    }

    /// Submit a generation request.
    ///
    /// Sends `POST /generate`. A non-2xx response carrying a parseable
    /// `success: false` body is a business rejection; any other non-2xx
    /// is a transport-level [`ApiError::Api`].
    pub async fn submit(&self, request: &GenerationRequest) -> Result<SubmitOutcome, ApiError> {
        let response = self
            .client
            .post(format!("{}/generate", self.base_url))
            .timeout(self.request_timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            if let Some(reason) = rejection_reason(&body) {
                return Ok(SubmitOutcome::Rejected { reason });
            }
            return Err(ApiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        submit_outcome(response.json::<GenerateBody>().await?)
    }

    /// Fetch the current status of a job.
    ///
    /// Sends `GET /check-status/{id}`. Non-2xx responses are transport
    /// errors here; terminal failure is reported in the body instead.
    pub async fn fetch_status(&self, job_id: &JobId) -> Result<StatusOutcome, ApiError> {
        let response = self
            .client
            .get(format!("{}/check-status/{}", self.base_url, job_id))
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(status_outcome(response.json::<StatusBody>().await?))
    }
}

/// Extract the rejection reason from an error-status body, if it is a
/// well-formed `{"success": false, "error": ...}` payload.
fn rejection_reason(body: &str) -> Option<String> {
    let parsed: GenerateBody = serde_json::from_str(body).ok()?;
    if parsed.success {
        return None;
    }
    Some(
        parsed
            .error
            .unwrap_or_else(|| "Generation request rejected".to_string()),
    )
}

/// Map a successful `POST /generate` body to a [`SubmitOutcome`].
fn submit_outcome(body: GenerateBody) -> Result<SubmitOutcome, ApiError> {
    if !body.success {
        return Ok(SubmitOutcome::Rejected {
            reason: body
                .error
                .unwrap_or_else(|| "Generation request rejected".to_string()),
        });
    }

    let job_id = match body.generation_id {
        Some(id) => JobId::new(id),
        None => {
            return Err(ApiError::Malformed(
                "accepted response carried no generation_id".to_string(),
            ))
        }
    };

    // A job accepted as anything other than "processing" starts queued.
    let phase = match body.state.as_deref() {
        Some("processing") => JobPhase::Processing,
        _ => JobPhase::Queued,
    };

    Ok(SubmitOutcome::Accepted {
        job_id,
        phase,
        video_url: body.video_url,
    })
}

/// Map a `GET /check-status` body to a [`StatusOutcome`].
///
/// `completed` without a `video_url` is treated as a failure: the
/// artifact location is the entire point of completion.
fn status_outcome(body: StatusBody) -> StatusOutcome {
    match body.state.as_str() {
        "queued" => StatusOutcome::StillRunning {
            phase: JobPhase::Queued,
        },
        "processing" => StatusOutcome::StillRunning {
            phase: JobPhase::Processing,
        },
        "completed" => match body.video_url {
            Some(video_url) => StatusOutcome::Finished { video_url },
            None => StatusOutcome::Failed {
                reason: "Generation completed without a video URL".to_string(),
            },
        },
        "failed" => StatusOutcome::Failed {
            reason: body
                .failure_reason
                .unwrap_or_else(|| "Generation failed".to_string()),
        },
        other => StatusOutcome::Unknown {
            state: other.to_string(),
        },
    }
}
