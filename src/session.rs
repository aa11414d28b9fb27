//! Streaming session state.
//!
//! A [`Session`] is the lifetime of one active camera-to-render pipeline: the exclusive frame
//! source, the relay towards the detector, and the overlay canvas. Everything that varies with
//! "is a stream running" lives in this one value object.

use crate::camera::{Camera, CameraError, CameraOptions, FrameSource};
use crate::image::Image;
use crate::relay::Relay;
use crate::render::render;
use crate::sandbox::{DetectorHost, HandDetector};

/// Errors surfaced by session commands.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A start was requested while a session is already active (or still starting). The running
    /// session is left untouched; the camera is never acquired twice.
    #[error("a capture session is already active")]
    AlreadyActive,
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

struct ActiveSession {
    source: Box<dyn FrameSource>,
    relay: Relay,
    canvas: Image,
}

/// At most one capture pipeline, plus the last status line shown to the user.
pub struct Session {
    active: Option<ActiveSession>,
    status: String,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            active: None,
            status: "Click to activate the camera".to_string(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// The current human-readable status line.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// The overlay canvas of the active session, if any.
    pub fn canvas(&self) -> Option<&Image> {
        self.active.as_ref().map(|active| &active.canvas)
    }

    /// Starts capturing from the first supported camera.
    pub fn start(
        &mut self,
        options: CameraOptions,
        detector: Box<dyn HandDetector>,
    ) -> Result<(), SessionError> {
        self.start_with(
            move || Ok(Box::new(Camera::open(options)?) as Box<dyn FrameSource>),
            detector,
        )
    }

    /// Starts capturing from a caller-supplied frame source.
    ///
    /// `open` is only invoked when no session is active, so a duplicate start can never acquire
    /// the camera a second time. On failure the session stays inactive and the failure reason
    /// becomes the status line.
    pub fn start_with(
        &mut self,
        open: impl FnOnce() -> Result<Box<dyn FrameSource>, CameraError>,
        detector: Box<dyn HandDetector>,
    ) -> Result<(), SessionError> {
        if self.active.is_some() {
            log::warn!("ignoring start request, a session is already active");
            return Err(SessionError::AlreadyActive);
        }

        self.status = "Requesting camera access...".to_string();
        let source = match open() {
            Ok(source) => source,
            Err(e) => {
                self.status = format!("Error: {e}");
                return Err(e.into());
            }
        };

        let host = DetectorHost::spawn(detector).map_err(anyhow::Error::from)?;
        let relay = Relay::new(host);
        let resolution = source.resolution();
        self.active = Some(ActiveSession {
            source,
            relay,
            canvas: Image::new(resolution.width(), resolution.height()),
        });
        self.status = "Loading detector...".to_string();
        log::info!("session started at {resolution}");
        Ok(())
    }

    /// Runs one iteration of the relay loop and redraws the overlay if a result arrived.
    ///
    /// Returns the canvas when it was redrawn. Does nothing while the session is inactive; the
    /// session does not stop itself, that is always an explicit [`Session::stop`].
    pub fn tick(&mut self) -> Option<&Image> {
        let active = self.active.as_mut()?;

        match active.relay.tick(active.source.as_mut()) {
            Ok(Some(results)) => {
                self.status = render(&results, &mut active.canvas);
                Some(&active.canvas)
            }
            Ok(None) => {
                if let Some(msg) = active.relay.take_error() {
                    self.status = format!("Detector error: {msg}");
                }
                None
            }
            Err(e) => {
                log::error!("frame capture failed: {}", e);
                self.status = format!("Error: {e}");
                None
            }
        }
    }

    /// Stops the session: halts the detector, releases the camera, and discards the canvas.
    ///
    /// A no-op when no session is active.
    pub fn stop(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.relay.stop();
            // Dropping `active` releases the capture stream and joins the detector worker.
            self.status = "Camera stopped. Click to start again.".to_string();
            log::info!("session stopped");
        }
    }
}
