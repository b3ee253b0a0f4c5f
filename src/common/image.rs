//! # Captured Images
//!
//! A [`CapturedImage`] is an acquired still in transmissible form: either a
//! self-describing data URI (`data:image/jpeg;base64,...`) or an in-memory
//! binary blob with its MIME type. Images are replaced wholesale on retake
//! and never mutated in place.
//!
//! Before submission each image is normalized into an [`ImagePart`], the
//! raw bytes that go into one multipart field.

use base64::alphabet;
use base64::engine::{general_purpose, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;

use super::error::{Result, VerifyError};

/// File name and MIME type given to parts decoded from a data URI.
pub const DATA_URI_FILE_NAME: &str = "image.jpg";
pub const DATA_URI_PART_MIME: &str = "image/jpeg";

/// Standard alphabet, padding optional. Browsers accept both forms.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes a data URI payload, ignoring ASCII whitespace such as the line
/// breaks of MIME-wrapped base64.
fn decode_base64(payload: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    LENIENT.decode(compact)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedImage {
    /// The raw data URI text, exactly as produced by capture or upload.
    DataUri(String),
    /// An opaque binary with its declared type.
    Blob {
        mime: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

/// One binary payload, ready to be placed in a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePart {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl CapturedImage {
    /// Encodes `bytes` as a base64 data URI of the given MIME type.
    pub fn data_uri(mime: &str, bytes: &[u8]) -> Self {
        CapturedImage::DataUri(format!(
            "data:{};base64,{}",
            mime,
            general_purpose::STANDARD.encode(bytes)
        ))
    }

    pub fn blob(mime: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        CapturedImage::Blob {
            mime: mime.into(),
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Best-effort MIME type, for logging.
    pub fn mime(&self) -> Option<&str> {
        match self {
            CapturedImage::DataUri(uri) => parse_header(uri).map(|(mime, _)| mime),
            CapturedImage::Blob { mime, .. } => Some(mime.as_str()),
        }
    }

    /// Converts the image into the binary payload that is actually sent.
    ///
    /// Data URIs are base64-decoded and typed as JPEG; blobs pass through
    /// unchanged. Anything else is an error, never a silent skip.
    pub fn normalize(&self) -> Result<ImagePart> {
        match self {
            CapturedImage::DataUri(uri) => {
                if !uri.starts_with("data:image") {
                    return Err(VerifyError::image_processing(
                        "unsupported image format: not an image data URI",
                    ));
                }

                let (_, payload) = uri.split_once(',').ok_or_else(|| {
                    VerifyError::image_processing("data URI has no payload separator")
                })?;

                let bytes = decode_base64(payload)
                    .map_err(|e| VerifyError::image_processing(format!("invalid base64: {}", e)))?;

                Ok(ImagePart {
                    file_name: DATA_URI_FILE_NAME.to_string(),
                    mime: DATA_URI_PART_MIME.to_string(),
                    bytes,
                })
            }
            CapturedImage::Blob {
                mime,
                file_name,
                bytes,
            } => Ok(ImagePart {
                file_name: file_name.clone(),
                mime: mime.clone(),
                bytes: bytes.clone(),
            }),
        }
    }
}

/// Splits `data:<mime>[;params],<payload>` into the MIME type and whether
/// the payload is base64.
fn parse_header(uri: &str) -> Option<(&str, bool)> {
    let rest = uri.strip_prefix("data:")?;
    let (header, _) = rest.split_once(',')?;
    let mut params = header.split(';');
    let mime = params.next()?;
    let is_base64 = params.any(|p| p.eq_ignore_ascii_case("base64"));
    Some((mime, is_base64))
}

/// Whether `s` is a syntactically valid encoded-image string: an
/// `image/<subtype>` data URI with a non-empty payload that decodes when
/// it is declared base64.
pub fn is_encoded_image(s: &str) -> bool {
    let Some((mime, is_base64)) = parse_header(s) else {
        return false;
    };

    match mime.strip_prefix("image/") {
        Some(subtype) if !subtype.is_empty() => {}
        _ => return false,
    }

    let payload = match s.split_once(',') {
        Some((_, payload)) if !payload.trim().is_empty() => payload,
        _ => return false,
    };

    !is_base64 || decode_base64(payload).is_ok()
}

/// Decodes the payload of an image data URI, returning `(mime, bytes)`.
pub fn decode_data_uri(s: &str) -> Option<(String, Vec<u8>)> {
    if !is_encoded_image(s) {
        return None;
    }
    let (mime, is_base64) = parse_header(s)?;
    let (_, payload) = s.split_once(',')?;
    let bytes = if is_base64 {
        decode_base64(payload).ok()?
    } else {
        payload.as_bytes().to_vec()
    };
    Some((mime.to_string(), bytes))
}
