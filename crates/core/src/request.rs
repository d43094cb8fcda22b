//! The user-facing generation request and its validation.

use serde::Serialize;

use crate::error::CoreError;

/// Default aspect ratio sent with every submission.
pub const DEFAULT_ASPECT_RATIO: &str = "16:9";

/// One generation request, immutable once submitted.
///
/// Serialized as the body of `POST /generate`. Constructed only
/// through [`GenerationRequest::new`] so that an empty prompt never
/// reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub aspect_ratio: String,
    /// Whether the service should render a seamlessly looping video.
    #[serde(rename = "loop")]
    pub looping: bool,
}

impl GenerationRequest {
    /// Build a request from user input.
    ///
    /// Rejects empty or whitespace-only prompts with
    /// [`CoreError::Validation`]; nothing is sent in that case.
    pub fn new(prompt: impl Into<String>) -> Result<Self, CoreError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(CoreError::Validation(
                "Prompt must not be empty".to_string(),
            ));
        }
        Ok(Self {
            prompt,
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
            looping: false,
        })
    }
}
