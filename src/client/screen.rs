//! # Verification Screen
//!
//! The screen owns both image slots, decides when a submission may start,
//! and holds everything the presentation layer reads: loading flag, error
//! string, last outcome, extracted faces and elapsed time.
//!
//! ## Rules
//!
//! - Both images must be present, otherwise a fixed guidance message is
//!   shown and no request is made.
//! - At most one submission is in flight; while it runs the trigger is
//!   disabled (`can_verify() == false`) and further starts are refused.
//! - Starting a submission clears the previous error, outcome, faces and
//!   elapsed time. A failed submission leaves them cleared.
//! - The in-flight call is a task tied to the screen's lifetime:
//!   `cancel()` or dropping the screen aborts it and its result is never
//!   applied.

use log::{info, warn};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::client::VerificationClient;
use super::metrics::SubmissionMetrics;
use crate::acquisition::{ImageSlot, Role};
use crate::common::error::{VerifyError, VERIFICATION_FAILED_MESSAGE};
use crate::common::messages::{
    ExtractedFaces, VerificationOutcome, VerificationRequest, VerificationResult,
};

/// What the presentation layer renders.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub loading: bool,
    pub error: Option<String>,
    pub result: Option<VerificationOutcome>,
    /// Only set when both extracted faces are valid images.
    pub faces: Option<ExtractedFaces>,
    /// Wall-clock time of the last submission, success or failure alike.
    pub elapsed: Option<Duration>,
}

/// Outcome of pressing the verify trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Started {
    /// A submission is now in flight.
    Submitted,
    /// An image is missing; the guidance message is shown instead.
    MissingInput,
    /// A submission is already in flight; the trigger is disabled.
    Busy,
}

/// The task yields its result together with the time from invocation to
/// resolution, so a late `finish_verification` does not inflate it.
struct InFlight {
    id: Uuid,
    handle: JoinHandle<(VerificationResult, Duration)>,
    started: Instant,
    started_at_ms: u64,
}

pub struct VerificationScreen {
    client: Arc<VerificationClient>,
    document: ImageSlot,
    live: ImageSlot,
    view: ViewState,
    in_flight: Option<InFlight>,
    metrics: Option<Arc<Mutex<SubmissionMetrics>>>,
}

impl VerificationScreen {
    pub fn new(client: Arc<VerificationClient>, document: ImageSlot, live: ImageSlot) -> Self {
        Self {
            client,
            document,
            live,
            view: ViewState::default(),
            in_flight: None,
            metrics: None,
        }
    }

    /// Records every completed submission into `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<Mutex<SubmissionMetrics>>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn slot(&self, role: Role) -> &ImageSlot {
        match role {
            Role::Document => &self.document,
            Role::Live => &self.live,
        }
    }

    pub fn slot_mut(&mut self, role: Role) -> &mut ImageSlot {
        match role {
            Role::Document => &mut self.document,
            Role::Live => &mut self.live,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether the verify trigger is enabled.
    pub fn can_verify(&self) -> bool {
        !self.is_busy() && self.document.image().is_some() && self.live.image().is_some()
    }

    /// Presses the verify trigger.
    ///
    /// Must be called from within a tokio runtime: the submission runs as a
    /// spawned task so the caller stays responsive.
    pub fn start_verification(&mut self) -> Started {
        if self.is_busy() {
            return Started::Busy;
        }

        let Some(request) =
            VerificationRequest::from_pair(self.document.image(), self.live.image())
        else {
            self.view.error = Some(VerifyError::MissingInput.to_string());
            return Started::MissingInput;
        };

        self.view = ViewState {
            loading: true,
            ..ViewState::default()
        };

        let id = Uuid::new_v4();
        let client = Arc::clone(&self.client);
        info!("🚀 Starting verification {}", id);

        let started = Instant::now();
        let started_at_ms = unix_millis();
        let handle = tokio::spawn(async move {
            let result = client.verify(&request).await;
            (result, started.elapsed())
        });

        self.in_flight = Some(InFlight {
            id,
            handle,
            started,
            started_at_ms,
        });

        Started::Submitted
    }

    /// Waits for the in-flight submission and applies its result.
    ///
    /// Returns `None` when nothing was in flight.
    pub async fn finish_verification(&mut self) -> Option<VerificationResult> {
        let in_flight = self.in_flight.as_mut()?;

        let (result, elapsed) = match (&mut in_flight.handle).await {
            Ok(finished) => finished,
            Err(e) => {
                warn!("Verification task {} did not complete: {}", in_flight.id, e);
                let failure = VerificationResult::Failure {
                    message: VERIFICATION_FAILED_MESSAGE.to_string(),
                };
                (failure, in_flight.started.elapsed())
            }
        };

        let in_flight = self.in_flight.take()?;

        if let Some(metrics) = &self.metrics {
            if let Ok(mut metrics) = metrics.lock() {
                metrics.record_submission(in_flight.id, in_flight.started_at_ms, elapsed, &result);
            }
        }

        self.apply(&result, elapsed);
        Some(result)
    }

    /// Presses the trigger and waits for the outcome.
    pub async fn verify(&mut self) -> Option<VerificationResult> {
        match self.start_verification() {
            Started::Submitted => self.finish_verification().await,
            Started::MissingInput | Started::Busy => None,
        }
    }

    /// Aborts the in-flight submission; its result is discarded.
    pub fn cancel(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            info!("Cancelling verification {}", in_flight.id);
            in_flight.handle.abort();
            self.view.loading = false;
        }
    }

    fn apply(&mut self, result: &VerificationResult, elapsed: Duration) {
        self.view.loading = false;
        self.view.elapsed = Some(elapsed);

        self.view.result = result.outcome().cloned();
        self.view.faces = result.outcome().and_then(|o| o.extracted_faces.clone());
        self.view.error = result.error_message().map(str::to_string);
    }
}

impl Drop for VerificationScreen {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.handle.abort();
        }
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
