//! Pure domain logic for the generation job tracker.
//!
//! No I/O and no async in this crate: job identifiers, the validated
//! generation request, the [`state::GenerationState`] tagged union, and
//! the [`transition`] function that drives it. The HTTP client, the
//! poll scheduler, and the controller live in `dreamtrack-tracker`.

pub mod error;
pub mod request;
pub mod state;
pub mod transition;
