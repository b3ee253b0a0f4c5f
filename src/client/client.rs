//! # Verification Client
//!
//! Turns one [`VerificationRequest`] into one [`VerificationResult`] with a
//! single HTTP call. No retry, no backoff, no queuing: one submission is
//! one attempt.
//!
//! ## Workflow
//!
//! 1. Normalize both images into binary parts (data URIs are decoded, blobs pass through)
//! 2. Build a multipart form with `id_image` and `live_image`
//! 3. `POST {base_url}{api_prefix}/verify`
//! 4. Parse the 2xx body against the strict schema, or pull `detail` out of the error body
//!
//! Every failure, whether normalization, 4xx/5xx, connection refused or
//! a malformed body, collapses into `VerificationResult::Failure` carrying
//! the single user-facing message.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let client = VerificationClient::new(&ServiceConfig::with_base_url("http://localhost:8000"))?;
//! let result = client.verify(&request).await;
//! ```

use log::{debug, error, info};
use reqwest::multipart::{Form, Part};

use crate::acquisition::Role;
use crate::common::config::ServiceConfig;
use crate::common::error::{Result, VerifyError};
use crate::common::image::ImagePart;
use crate::common::messages::{
    parse_error_detail, parse_success_body, VerificationOutcome, VerificationRequest,
    VerificationResult,
};

/// Stateless submitter bound to one service endpoint.
///
/// Holds nothing between calls except the pooled HTTP client, so it can be
/// shared behind an `Arc` by the screen that owns it.
pub struct VerificationClient {
    http: reqwest::Client,
    verify_url: String,
}

impl VerificationClient {
    /// Builds a client for the endpoint described by `config`.
    ///
    /// A request timeout is only set when `timeout_secs` is configured;
    /// otherwise calls wait for the service indefinitely.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            verify_url: config.verify_url(),
        })
    }

    pub fn verify_url(&self) -> &str {
        &self.verify_url
    }

    /// Submits both images and maps whatever happens into exactly one result.
    pub async fn verify(&self, request: &VerificationRequest) -> VerificationResult {
        let result = self.try_verify(request).await;

        match &result {
            Ok(outcome) => info!(
                "✅ Verification finished: verified={} confidence={:.4}",
                outcome.verified, outcome.confidence
            ),
            Err(e) => error!("❌ Verification error: {}", e.log_context()),
        }

        result.into()
    }

    /// Same as [`verify`](Self::verify) but keeps the typed error.
    pub async fn try_verify(&self, request: &VerificationRequest) -> Result<VerificationOutcome> {
        info!("Processing images for verification...");

        let document = request.document.normalize()?;
        let live = request.live.normalize()?;
        let form = build_form(document, live)?;

        info!("Sending verification request to {}", self.verify_url);

        let response = self.http.post(&self.verify_url).multipart(form).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        debug!("Service answered HTTP {} ({} bytes)", status, body.len());

        if !status.is_success() {
            return Err(VerifyError::Service {
                status: status.as_u16(),
                detail: parse_error_detail(&body),
            });
        }

        parse_success_body(&body)
    }
}

fn image_field(part: ImagePart) -> Result<Part> {
    Part::bytes(part.bytes)
        .file_name(part.file_name)
        .mime_str(&part.mime)
        .map_err(|e| VerifyError::image_processing(format!("invalid MIME type {}: {}", part.mime, e)))
}

/// Multipart body with the document under `id_image` and the live photo under `live_image`.
fn build_form(document: ImagePart, live: ImagePart) -> Result<Form> {
    Ok(Form::new()
        .part(Role::Document.field_name(), image_field(document)?)
        .part(Role::Live.field_name(), image_field(live)?))
}
