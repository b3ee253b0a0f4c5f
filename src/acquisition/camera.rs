//! # Camera Devices
//!
//! A camera is anything that can hand over the current frame. Constraints
//! (resolution target, facing, audio) are fixed once, when the device is
//! activated, and each acquisition slot owns its device exclusively.
//!
//! Two sources ship with the crate:
//! - [`SnapshotCamera`]: reads the latest frame a capture helper writes to
//!   disk (e.g. `fswebcam --no-banner /run/kiosk/frame.jpg` on a loop)
//! - [`StillCamera`]: serves a fixed in-memory frame

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage};
use log::{debug, warn};
use std::path::PathBuf;

use crate::common::config::{CameraConfig, Facing};

/// Device constraints requested at activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoConstraints {
    pub width: u32,
    pub height: u32,
    pub facing: Facing,
    pub audio: bool,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            facing: Facing::User,
            audio: false,
        }
    }
}

impl From<&CameraConfig> for VideoConstraints {
    fn from(config: &CameraConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            facing: config.facing,
            audio: config.audio,
        }
    }
}

/// A device that produces still frames.
pub trait FrameSource: Send {
    /// Called once before the first frame is requested.
    fn activate(&mut self, constraints: VideoConstraints);

    /// The current frame, or `None` while the device has nothing to show yet.
    fn grab_frame(&mut self) -> Option<RgbImage>;
}

/// Shrinks a frame to fit inside the target resolution, keeping its aspect ratio.
fn fit_to(frame: DynamicImage, constraints: &VideoConstraints) -> RgbImage {
    let (width, height) = frame.dimensions();
    if width > constraints.width || height > constraints.height {
        frame
            .resize(constraints.width, constraints.height, FilterType::Triangle)
            .to_rgb8()
    } else {
        frame.to_rgb8()
    }
}

/// Camera backed by a frame file that an external capture helper keeps
/// overwriting. A missing or half-written file means "no frame yet".
pub struct SnapshotCamera {
    path: PathBuf,
    constraints: Option<VideoConstraints>,
}

impl SnapshotCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            constraints: None,
        }
    }
}

impl FrameSource for SnapshotCamera {
    fn activate(&mut self, constraints: VideoConstraints) {
        if constraints.audio {
            warn!("Snapshot camera has no audio track; ignoring audio request");
        }
        debug!(
            "Activated snapshot camera {} at {}x{} ({:?})",
            self.path.display(),
            constraints.width,
            constraints.height,
            constraints.facing
        );
        self.constraints = Some(constraints);
    }

    fn grab_frame(&mut self) -> Option<RgbImage> {
        let constraints = self.constraints?;
        match image::open(&self.path) {
            Ok(frame) => Some(fit_to(frame, &constraints)),
            Err(e) => {
                debug!("No frame available at {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

/// Camera that always shows the same frame.
pub struct StillCamera {
    frame: Option<RgbImage>,
    constraints: Option<VideoConstraints>,
}

impl StillCamera {
    pub fn new(frame: RgbImage) -> Self {
        Self {
            frame: Some(frame),
            constraints: None,
        }
    }

    /// A camera that is active but never produces a frame.
    pub fn dark() -> Self {
        Self {
            frame: None,
            constraints: None,
        }
    }
}

impl FrameSource for StillCamera {
    fn activate(&mut self, constraints: VideoConstraints) {
        self.constraints = Some(constraints);
    }

    fn grab_frame(&mut self) -> Option<RgbImage> {
        let constraints = self.constraints?;
        let frame = self.frame.clone()?;
        Some(fit_to(DynamicImage::ImageRgb8(frame), &constraints))
    }
}
