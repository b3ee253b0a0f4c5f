//! # Presentation
//!
//! Text renderers for what the screen shows. Each reads the
//! [`ViewState`](crate::client::ViewState) and returns the lines to print,
//! or `None` when that part of the screen is empty.

pub mod faces;
pub mod guide;
pub mod status;
pub mod timer;

pub use faces::{render_faces, save_faces};
pub use guide::render_guide;
pub use status::{format_confidence, render_status};
pub use timer::render_timer;
