//! Runtime layer for the generation job tracker.
//!
//! Provides the HTTP client for the generation service, the
//! [`service::JobService`] seam, the single-job [`scheduler`], and the
//! [`controller`] that owns the state machine and emits state-change
//! notifications for rendering.

pub mod api;
pub mod config;
pub mod controller;
pub mod scheduler;
pub mod service;
