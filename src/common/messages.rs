//! # Verification Protocol
//!
//! Request and result types exchanged with the verification service, plus
//! the strict JSON schema used to parse its responses.
//!
//! ## Wire format
//!
//! ```text
//! POST {base_url}/api/v1/verify      multipart: id_image, live_image
//!
//! 2xx  { "verified": bool, "confidence": number, "message"?: string,
//!        "faces"?: { "id_face"?: data-uri, "live_face"?: data-uri,
//!                    "id_box"?: [t, r, b, l], "live_box"?: [t, r, b, l] },
//!        "quality_scores"?: { "id": {...}, "live": {...} } }
//! else { "detail": string }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::{Result, VerifyError};
use super::image::{is_encoded_image, CapturedImage};

// ============================================================================
// REQUEST / RESULT
// ============================================================================

/// The two photographs submitted together. No cross-validation happens client-side.
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    /// Photo of the identity document, sent as `id_image`.
    pub document: CapturedImage,
    /// Live photo of the person, sent as `live_image`.
    pub live: CapturedImage,
}

impl VerificationRequest {
    /// Pairs two optional images, `None` unless both are present.
    pub fn from_pair(document: Option<&CapturedImage>, live: Option<&CapturedImage>) -> Option<Self> {
        Some(Self {
            document: document?.clone(),
            live: live?.clone(),
        })
    }
}

/// Faces cropped out by the service. Only built when both are valid encoded images.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFaces {
    pub id_face: CapturedImage,
    pub live_face: CapturedImage,
}

impl ExtractedFaces {
    /// Applies the fail-closed display rule: both strings must be present
    /// and each must be a well-formed image data URI.
    pub fn from_raw(id_face: Option<&str>, live_face: Option<&str>) -> Option<Self> {
        match (id_face, live_face) {
            (Some(id), Some(live)) if is_encoded_image(id) && is_encoded_image(live) => Some(Self {
                id_face: CapturedImage::DataUri(id.to_string()),
                live_face: CapturedImage::DataUri(live.to_string()),
            }),
            _ => None,
        }
    }
}

/// A successful answer from the service.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationOutcome {
    pub verified: bool,
    /// Match strength in `[0, 1]`.
    pub confidence: f64,
    pub message: String,
    pub extracted_faces: Option<ExtractedFaces>,
    pub id_box: Option<FaceBox>,
    pub live_box: Option<FaceBox>,
    pub quality: Option<QualityScores>,
}

/// Exactly one of these is produced per submission.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationResult {
    Success(VerificationOutcome),
    Failure { message: String },
}

impl VerificationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, VerificationResult::Success(_))
    }

    pub fn outcome(&self) -> Option<&VerificationOutcome> {
        match self {
            VerificationResult::Success(outcome) => Some(outcome),
            VerificationResult::Failure { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            VerificationResult::Success(_) => None,
            VerificationResult::Failure { message } => Some(message),
        }
    }
}

impl From<Result<VerificationOutcome>> for VerificationResult {
    fn from(result: Result<VerificationOutcome>) -> Self {
        match result {
            Ok(outcome) => VerificationResult::Success(outcome),
            Err(e) => VerificationResult::Failure {
                message: e.to_string(),
            },
        }
    }
}

// ============================================================================
// RESPONSE SCHEMA
// ============================================================================

/// Face location in the source photo, `[top, right, bottom, left]` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i64; 4]", into = "[i64; 4]")]
pub struct FaceBox {
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
    pub left: i64,
}

impl From<[i64; 4]> for FaceBox {
    fn from([top, right, bottom, left]: [i64; 4]) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}

impl From<FaceBox> for [i64; 4] {
    fn from(b: FaceBox) -> Self {
        [b.top, b.right, b.bottom, b.left]
    }
}

impl FaceBox {
    pub fn width(&self) -> i64 {
        self.right - self.left
    }

    pub fn height(&self) -> i64 {
        self.bottom - self.top
    }
}

/// Per-photo image quality the service measured before matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    #[serde(default)]
    pub quality_score: Option<f64>,
    #[serde(default)]
    pub is_usable: Option<bool>,
    /// Raw metrics such as brightness, contrast, sharpness, face_size.
    #[serde(default)]
    pub details: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScores {
    pub id: QualityReport,
    pub live: QualityReport,
}

#[derive(Debug, Deserialize)]
struct FacesBody {
    #[serde(default)]
    id_face: Option<String>,
    #[serde(default)]
    live_face: Option<String>,
    #[serde(default)]
    id_box: Option<FaceBox>,
    #[serde(default)]
    live_box: Option<FaceBox>,
}

#[derive(Debug, Deserialize)]
struct SuccessBody {
    verified: bool,
    confidence: f64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    faces: Option<FacesBody>,
    #[serde(default)]
    quality_scores: Option<QualityScores>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// Parses a 2xx body. Fields of the wrong type or a missing `verified` or
/// `confidence` are rejected. Confidence is a similarity and may fall
/// below zero for clearly different faces; any finite value is accepted.
pub fn parse_success_body(body: &[u8]) -> Result<VerificationOutcome> {
    let parsed: SuccessBody = serde_json::from_slice(body)
        .map_err(|e| VerifyError::MalformedResponse(e.to_string()))?;

    if !parsed.confidence.is_finite() {
        return Err(VerifyError::MalformedResponse(format!(
            "confidence {} is not finite",
            parsed.confidence
        )));
    }

    let (extracted_faces, id_box, live_box) = match parsed.faces {
        Some(faces) => (
            ExtractedFaces::from_raw(faces.id_face.as_deref(), faces.live_face.as_deref()),
            faces.id_box,
            faces.live_box,
        ),
        None => (None, None, None),
    };

    Ok(VerificationOutcome {
        verified: parsed.verified,
        confidence: parsed.confidence,
        message: parsed.message.unwrap_or_default(),
        extracted_faces,
        id_box,
        live_box,
        quality: parsed.quality_scores,
    })
}

/// Pulls `detail` out of an error body, if the body is JSON and has one.
pub fn parse_error_detail(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .filter(|d| !d.is_empty())
}
