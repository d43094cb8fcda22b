//! The seam between the controller and the network.

use async_trait::async_trait;

use dreamtrack_core::request::GenerationRequest;
use dreamtrack_core::state::JobId;

use crate::api::{ApiError, GenerationApi, StatusOutcome, SubmitOutcome};

/// The two network operations the tracker needs.
///
/// Implemented by [`GenerationApi`] for the real service; tests drive
/// the controller and scheduler through scripted implementations.
#[async_trait]
pub trait JobService: Send + Sync {
    async fn submit(&self, request: &GenerationRequest) -> Result<SubmitOutcome, ApiError>;

    async fn fetch_status(&self, job_id: &JobId) -> Result<StatusOutcome, ApiError>;
}

#[async_trait]
impl JobService for GenerationApi {
    async fn submit(&self, request: &GenerationRequest) -> Result<SubmitOutcome, ApiError> {
        GenerationApi::submit(self, request).await
    }

    async fn fetch_status(&self, job_id: &JobId) -> Result<StatusOutcome, ApiError> {
        GenerationApi::fetch_status(self, job_id).await
    }
}
