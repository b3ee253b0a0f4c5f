//! # Common Components
//!
//! Shared types and utilities used by acquisition, submission and presentation.
//!
//! ## Modules
//!
//! - [`image`]: Captured images and their normalization into binary parts
//! - [`messages`]: Request/result types and the service's response schema
//! - [`error`]: The error taxonomy and its user-facing messages
//! - [`config`]: Configuration parsing utilities
//! - [`logging`]: Logger setup for the binaries

pub mod config;
pub mod error;
pub mod image;
pub mod logging;
pub mod messages;
