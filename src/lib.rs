//! # face-verify
//!
//! Client for a remote face-verification service: acquire an ID-document
//! photo and a live photo, submit both in one multipart request, and
//! render the match result.

pub mod acquisition;
pub mod client;
pub mod common;
pub mod presentation;

pub use client::{VerificationClient, VerificationScreen};
pub use common::error::VerifyError;
pub use common::image::CapturedImage;
pub use common::messages::{VerificationOutcome, VerificationRequest, VerificationResult};
