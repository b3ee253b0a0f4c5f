//! # Error Taxonomy
//!
//! Every failure a verification attempt can hit collapses into a single
//! user-facing string. The variants keep the extra context (HTTP status,
//! decode reason, file path) for log lines only; `Display` is what the
//! status banner shows.

use std::path::PathBuf;
use thiserror::Error;

/// Shown when the caller tries to verify without both photos.
pub const MISSING_INPUT_MESSAGE: &str = "Please provide both ID and person photos";

/// Shown for any image that cannot be turned into a binary payload.
pub const IMAGE_PROCESSING_MESSAGE: &str = "Failed to process image";

/// Fallback when the service gives no usable `detail`.
pub const VERIFICATION_FAILED_MESSAGE: &str = "Verification failed";

#[derive(Error, Debug)]
pub enum VerifyError {
    /// One of the two image slots is empty. Raised by the screen before any request.
    #[error("Please provide both ID and person photos")]
    MissingInput,

    /// A captured image is not a data URI or binary blob we can decode.
    #[error("Failed to process image")]
    ImageProcessing { reason: String },

    /// A local file selected for upload could not be read.
    #[error("Failed to process image")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The service answered with a non-2xx status.
    #[error("{}", .detail.as_deref().unwrap_or(VERIFICATION_FAILED_MESSAGE))]
    Service { status: u16, detail: Option<String> },

    /// Connection refused, reset, timed out, or the body could not be read.
    #[error("Verification failed")]
    Transport(#[from] reqwest::Error),

    /// The service answered 2xx but the body does not match the response schema.
    #[error("Verification failed: unexpected response from service")]
    MalformedResponse(String),
}

impl VerifyError {
    pub fn image_processing(reason: impl Into<String>) -> Self {
        VerifyError::ImageProcessing {
            reason: reason.into(),
        }
    }

    /// Context for logs; the `Display` output stays the user-facing string.
    pub fn log_context(&self) -> String {
        match self {
            VerifyError::MissingInput => "missing input".to_string(),
            VerifyError::ImageProcessing { reason } => format!("image processing: {}", reason),
            VerifyError::Unreadable { path, source } => {
                format!("cannot read {}: {}", path.display(), source)
            }
            VerifyError::Service { status, detail } => format!(
                "service returned HTTP {} ({})",
                status,
                detail.as_deref().unwrap_or("no detail")
            ),
            VerifyError::Transport(e) => format!("transport: {}", e),
            VerifyError::MalformedResponse(why) => format!("malformed response: {}", why),
        }
    }
}

pub type Result<T> = std::result::Result<T, VerifyError>;
