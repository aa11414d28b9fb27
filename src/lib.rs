//! Webcam hand-tracking pipeline with landmark overlay rendering.
//!
//! The library is organized around one camera-to-render pipeline: a [`camera::FrameSource`]
//! produces frames, the [`relay`] submits them to a [`sandbox::DetectorHost`] one at a time, and
//! the [`render`] module draws the returned landmarks onto an overlay canvas. [`session::Session`]
//! owns one instance of that pipeline, and [`panel::Panel`] exposes it (plus a few page-control
//! conveniences) as one-shot commands. The [`pose`] module is an independent HTTP endpoint that
//! persists named 3D coordinates.
//!
//! # Environment Variables
//!
//! * `HANDWAVE_CAMERA_NAME`: Forces the device to use for [`Camera`]s created without an explicit
//!   device name. If unset, the first device that supports a compatible image format will be used.
//! * `HANDWAVE_POSE_DB`: Path of the pose database used by the `pose_server` binary.
//! * `HANDWAVE_POSE_PORT`: Port the `pose_server` binary listens on (default 3000).
//!
//! [`Camera`]: camera::Camera

use log::LevelFilter;

pub mod camera;
pub mod hand;
pub mod image;
pub mod panel;
pub mod pose;
pub mod relay;
pub mod render;
pub mod sandbox;
pub mod session;

/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = LevelFilter::Debug;
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_PKG_NAME")), log_level)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// The calling crate and handwave will log at *debug* level; `RUST_LOG` overrides this.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
