//! # Client Components
//!
//! The client is split the same way the UI is:
//!
//! ## Verification Client ([`client`])
//! Does the one remote call: normalizes both images, posts the multipart
//! form and maps the response (or failure) into a result.
//!
//! ## Verification Screen ([`screen`])
//! Owns the two image slots and everything around the call:
//! - Missing-input guard before any request
//! - Single in-flight submission, with the trigger disabled meanwhile
//! - Cancellation on teardown
//! - Elapsed-time measurement
//! - Applying the result to the view state
//!
//! ## Metrics ([`metrics`])
//! Optional per-submission latency and outcome records.

pub mod client;
pub mod metrics;
pub mod screen;

pub use client::VerificationClient;
pub use metrics::SubmissionMetrics;
pub use screen::{Started, VerificationScreen, ViewState};
