//! The frame relay loop.
//!
//! [`Relay::tick`] is one iteration of the capture-submit-receive cycle. The caller schedules it,
//! typically once per display refresh; keeping the scheduling outside makes the in-flight
//! invariant testable without timing dependence.

use crate::camera::FrameSource;
use crate::hand::DetectionResult;
use crate::sandbox::{DetectorHost, EncodedFrame, Event, Request};

/// JPEG quality used for frames crossing the detector boundary.
const JPEG_QUALITY: u8 = 80;

/// Handshake state of the detector behind the sandbox boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorState {
    /// Initialization requested, no ready signal yet. No frames may be submitted.
    NotReady,
    /// Ready and waiting for a frame.
    Idle,
    /// Exactly one frame is in flight.
    Processing,
    /// Terminal until a fresh initialization (i.e. a new relay).
    Error(String),
}

/// Relays camera frames to the detector, at most one in flight.
pub struct Relay {
    host: DetectorHost,
    state: DetectorState,
    error_reported: bool,
}

impl Relay {
    /// Creates a relay around a spawned detector host and requests detector initialization.
    pub fn new(host: DetectorHost) -> Self {
        host.send(Request::Init);
        Self {
            host,
            state: DetectorState::NotReady,
            error_reported: false,
        }
    }

    pub fn state(&self) -> &DetectorState {
        &self.state
    }

    /// Runs one iteration of the relay loop.
    ///
    /// Pending detector events are drained first: a ready signal unlocks frame submission, a
    /// result clears the in-flight slot, an error is terminal. Then, if the detector is idle, the
    /// current frame is grabbed, encoded and submitted. Frames are never queued; while a
    /// submission is outstanding, new frames are simply skipped.
    ///
    /// Returns the detection result delivered during this iteration, if any.
    pub fn tick(&mut self, source: &mut dyn FrameSource) -> anyhow::Result<Option<DetectionResult>> {
        let mut delivered = None;

        while let Some(event) = self.host.try_event() {
            match event {
                Event::Ready => {
                    if self.state == DetectorState::NotReady {
                        log::debug!("detector ready");
                        self.state = DetectorState::Idle;
                    }
                }
                Event::Results(results) => {
                    if self.state == DetectorState::Processing {
                        self.state = DetectorState::Idle;
                        delivered = Some(results);
                    } else {
                        log::trace!("dropping stale detection result");
                    }
                }
                Event::Error(msg) => {
                    log::error!("detector error: {}", msg);
                    self.state = DetectorState::Error(msg);
                }
            }
        }

        if self.state == DetectorState::Idle {
            let frame = source.grab()?;
            let encoded = EncodedFrame {
                resolution: frame.resolution(),
                jpeg: frame.encode_jpeg(JPEG_QUALITY)?,
            };
            self.host.send(Request::ProcessFrame(encoded));
            self.state = DetectorState::Processing;
        }

        Ok(delivered)
    }

    /// Returns the detector error message, the first time it is observed.
    pub fn take_error(&mut self) -> Option<String> {
        match &self.state {
            DetectorState::Error(msg) if !self.error_reported => {
                self.error_reported = true;
                Some(msg.clone())
            }
            _ => None,
        }
    }

    /// Instructs the detector to halt. In-flight frames are abandoned, not cancelled.
    pub fn stop(&mut self) {
        self.host.send(Request::Stop);
    }
}
