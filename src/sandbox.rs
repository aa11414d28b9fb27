//! The detector boundary.
//!
//! The hand-tracking model runs isolated on its own worker thread, behind a tagged message
//! protocol: the relay sends [`Request`]s ([`Init`], [`ProcessFrame`], [`Stop`]) and receives
//! [`Event`]s ([`Ready`], [`Results`], [`Error`]). Frames cross the boundary as encoded JPEG
//! stills, so the detector never shares memory with the capture side.
//!
//! [`Init`]: Request::Init
//! [`ProcessFrame`]: Request::ProcessFrame
//! [`Stop`]: Request::Stop
//! [`Ready`]: Event::Ready
//! [`Results`]: Event::Results
//! [`Error`]: Event::Error

use std::{
    panic::resume_unwind,
    thread::{self, JoinHandle},
};

use crossbeam_channel::{Receiver, Sender};

use crate::hand::DetectionResult;
use crate::image::{Image, Resolution};

/// The opaque hand-tracking capability.
///
/// Implementations receive a still image and return the landmark points of every detected hand.
/// The library ships no model of its own; [`NullDetector`] is a stand-in that never detects
/// anything.
pub trait HandDetector: Send {
    /// Loads whatever the detector needs before it can process frames.
    ///
    /// Called once per session, in response to [`Request::Init`].
    fn initialize(&mut self) -> anyhow::Result<()>;

    /// Runs detection on a single frame.
    fn detect(&mut self, frame: &Image) -> anyhow::Result<DetectionResult>;

    /// Instructs the detector to halt; no more frames will follow until a fresh `initialize`.
    fn halt(&mut self) {}
}

/// A detector that reports no hands. Used by the demo binary.
pub struct NullDetector;

impl HandDetector for NullDetector {
    fn initialize(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn detect(&mut self, _frame: &Image) -> anyhow::Result<DetectionResult> {
        Ok(DetectionResult::empty())
    }
}

/// A still camera frame, encoded for the trip across the detector boundary.
pub struct EncodedFrame {
    pub jpeg: Vec<u8>,
    pub resolution: Resolution,
}

/// Messages sent from the relay to the detector.
pub enum Request {
    Init,
    ProcessFrame(EncodedFrame),
    Stop,
}

/// Messages sent from the detector back to the relay.
#[derive(Debug)]
pub enum Event {
    Ready,
    Results(DetectionResult),
    Error(String),
}

/// A handle to the detector worker thread.
///
/// When dropped, the request channel is closed and the thread is joined. If the thread has
/// panicked, the panic will be forwarded to the thread dropping the host.
pub struct DetectorHost {
    requests: Option<Sender<Request>>,
    events: Receiver<Event>,
    handle: Option<JoinHandle<()>>,
}

impl DetectorHost {
    /// Spawns a worker thread that runs `detector` behind the message protocol.
    pub fn spawn(mut detector: Box<dyn HandDetector>) -> std::io::Result<Self> {
        let (req_tx, req_rx) = crossbeam_channel::unbounded::<Request>();
        let (evt_tx, evt_rx) = crossbeam_channel::unbounded();

        let handle = thread::Builder::new()
            .name("detector".into())
            .spawn(move || {
                for request in req_rx {
                    match request {
                        Request::Init => match detector.initialize() {
                            Ok(()) => {
                                evt_tx.send(Event::Ready).ok();
                            }
                            Err(e) => {
                                evt_tx.send(Event::Error(e.to_string())).ok();
                            }
                        },
                        Request::ProcessFrame(frame) => {
                            let result = Image::decode_jpeg(&frame.jpeg)
                                .and_then(|image| detector.detect(&image));
                            match result {
                                Ok(results) => {
                                    evt_tx.send(Event::Results(results)).ok();
                                }
                                Err(e) => {
                                    evt_tx.send(Event::Error(e.to_string())).ok();
                                }
                            }
                        }
                        Request::Stop => detector.halt(),
                    }
                }
                log::trace!("detector worker exiting");
            })?;

        Ok(Self {
            requests: Some(req_tx),
            events: evt_rx,
            handle: Some(handle),
        })
    }

    /// Sends a request to the detector.
    ///
    /// If the worker has exited, the request is silently dropped; the exit (and any panic) is
    /// handled when the host is dropped.
    pub fn send(&self, request: Request) {
        if let Some(requests) = &self.requests {
            requests.send(request).ok();
        }
    }

    /// Receives the next pending event from the detector, if any. Never blocks.
    pub fn try_event(&self) -> Option<Event> {
        self.events.try_recv().ok()
    }
}

impl Drop for DetectorHost {
    fn drop(&mut self) {
        // Close the channel to signal the thread to exit.
        drop(self.requests.take());

        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(()) => {}
                Err(payload) => {
                    if !thread::panicking() {
                        resume_unwind(payload);
                    }
                }
            }
        }
    }
}
