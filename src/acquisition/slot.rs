//! # Image Slots
//!
//! One [`ImageSlot`] per role (document photo, live photo). A slot shows
//! either the camera preview / upload prompt (`Empty`) or the image it
//! holds (`Captured`). Recapturing replaces the image wholesale; there is
//! no intermediate "capturing" state.
//!
//! ```text
//! Empty ──capture/upload──▶ Captured ──capture/upload──▶ Captured
//!   ▲                          │
//!   └──────────clear───────────┘
//! ```

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, ImageFormat};
use log::{debug, info};
use std::path::Path;

use super::camera::{FrameSource, VideoConstraints};
use crate::common::config::CameraConfig;
use crate::common::error::{Result, VerifyError};
use crate::common::image::CapturedImage;

/// Which photograph a slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Document,
    Live,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Document => "ID Document",
            Role::Live => "Person Photo",
        }
    }

    /// Multipart field name used when the image is submitted.
    pub fn field_name(&self) -> &'static str {
        match self {
            Role::Document => "id_image",
            Role::Live => "live_image",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    Captured,
}

pub struct ImageSlot {
    role: Role,
    camera: Option<Box<dyn FrameSource>>,
    jpeg_quality: u8,
    image: Option<CapturedImage>,
}

impl ImageSlot {
    /// A slot without a camera; only `upload` can fill it.
    pub fn new(role: Role) -> Self {
        Self {
            role,
            camera: None,
            jpeg_quality: CameraConfig::default().jpeg_quality,
            image: None,
        }
    }

    /// A slot that owns `camera`, activated with the configured constraints.
    pub fn with_camera(role: Role, mut camera: Box<dyn FrameSource>, config: &CameraConfig) -> Self {
        camera.activate(VideoConstraints::from(config));
        Self {
            role,
            camera: Some(camera),
            jpeg_quality: config.jpeg_quality.clamp(1, 100),
            image: None,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> SlotState {
        if self.image.is_some() {
            SlotState::Captured
        } else {
            SlotState::Empty
        }
    }

    pub fn image(&self) -> Option<&CapturedImage> {
        self.image.as_ref()
    }

    /// Label of the capture button: "Capture ID Document" / "Retake ID Document".
    pub fn prompt(&self) -> String {
        match self.state() {
            SlotState::Empty => format!("Capture {}", self.role.label()),
            SlotState::Captured => format!("Retake {}", self.role.label()),
        }
    }

    /// Takes the current camera frame as a JPEG data URI.
    ///
    /// Returns `Ok(None)` and leaves the slot untouched when the camera has
    /// no frame yet (or the slot has no camera).
    pub fn capture(&mut self) -> Result<Option<&CapturedImage>> {
        let Some(frame) = self.camera.as_mut().and_then(|camera| camera.grab_frame()) else {
            debug!("{} capture: no frame available", self.role.label());
            return Ok(None);
        };

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.jpeg_quality)
            .encode(frame.as_raw(), frame.width(), frame.height(), ColorType::Rgb8)
            .map_err(|e| VerifyError::image_processing(format!("jpeg encoding failed: {}", e)))?;

        info!(
            "📸 Captured {} ({}x{}, {} bytes)",
            self.role.label(),
            frame.width(),
            frame.height(),
            jpeg.len()
        );

        self.image = Some(CapturedImage::data_uri("image/jpeg", &jpeg));
        Ok(self.image.as_ref())
    }

    /// Reads a local image file into a data URI of its declared type.
    ///
    /// Only files with an image extension are accepted; dimensions, size and
    /// content are not checked. On any failure the slot keeps its previous image.
    pub async fn upload(&mut self, path: impl AsRef<Path>) -> Result<&CapturedImage> {
        let path = path.as_ref();
        let mime = declared_image_mime(path).ok_or_else(|| {
            VerifyError::image_processing(format!("{} is not an image file", path.display()))
        })?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| VerifyError::Unreadable {
                path: path.to_path_buf(),
                source,
            })?;

        info!(
            "📤 Uploaded {} from {} ({}, {} bytes)",
            self.role.label(),
            path.display(),
            mime,
            bytes.len()
        );

        Ok(self.image.insert(CapturedImage::data_uri(&mime, &bytes)))
    }

    /// Places an already-acquired image in the slot.
    pub fn set(&mut self, image: CapturedImage) {
        self.image = Some(image);
    }

    /// Discards the current image so the preview / upload prompt shows again.
    pub fn clear(&mut self) {
        self.image = None;
    }
}

/// MIME type a file picker filtering on `image/*` would report for `path`.
fn declared_image_mime(path: &Path) -> Option<String> {
    let format = ImageFormat::from_path(path).ok()?;
    let mime = match format {
        ImageFormat::Jpeg => "image/jpeg".to_string(),
        ImageFormat::Png => "image/png".to_string(),
        ImageFormat::Gif => "image/gif".to_string(),
        ImageFormat::WebP => "image/webp".to_string(),
        ImageFormat::Bmp => "image/bmp".to_string(),
        ImageFormat::Tiff => "image/tiff".to_string(),
        ImageFormat::Ico => "image/x-icon".to_string(),
        ImageFormat::Avif => "image/avif".to_string(),
        _ => {
            let ext = path.extension()?.to_str()?.to_ascii_lowercase();
            format!("image/x-{}", ext)
        }
    };
    Some(mime)
}
