//! # Image Acquisition
//!
//! Produces [`CapturedImage`](crate::common::image::CapturedImage)s from a
//! camera or a local file, one [`ImageSlot`] per role.
//!
//! - [`camera`]: the device abstraction and its fixed constraints
//! - [`slot`]: the per-role `Empty ⇄ Captured` state machine

pub mod camera;
pub mod slot;

pub use camera::{FrameSource, SnapshotCamera, StillCamera, VideoConstraints};
pub use slot::{ImageSlot, Role, SlotState};
