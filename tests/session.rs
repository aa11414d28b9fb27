//! Session lifecycle: exclusive camera ownership, stop/start behavior, error taxonomy.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use handwave::camera::{CameraError, FrameSource};
use handwave::hand::{DetectionResult, HandLandmarks};
use handwave::image::{Image, Resolution};
use handwave::sandbox::HandDetector;
use handwave::session::{Session, SessionError};

struct TrackedSource {
    grabs: Arc<AtomicUsize>,
    released: Arc<AtomicBool>,
}

impl FrameSource for TrackedSource {
    fn resolution(&self) -> Resolution {
        Resolution::new(64, 48)
    }

    fn grab(&mut self) -> anyhow::Result<Image> {
        self.grabs.fetch_add(1, Ordering::SeqCst);
        Ok(Image::new(64, 48))
    }
}

impl Drop for TrackedSource {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Always reports the same fixed number of hands.
struct FixedDetector {
    hands: usize,
}

impl HandDetector for FixedDetector {
    fn initialize(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn detect(&mut self, _frame: &Image) -> anyhow::Result<DetectionResult> {
        let hand = HandLandmarks::from_positions(std::array::from_fn(|i| {
            [0.1 + (i % 5) as f32 * 0.15, 0.1 + (i / 5) as f32 * 0.15, 0.0]
        }));
        Ok(DetectionResult::new(vec![hand; self.hands]))
    }
}

fn tick_until(session: &mut Session, mut done: impl FnMut(&Session) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        session.tick();
        if done(session) {
            return;
        }
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(1));
    }
}

struct Handles {
    grabs: Arc<AtomicUsize>,
    released: Arc<AtomicBool>,
    opens: Arc<AtomicUsize>,
}

fn start_tracked(session: &mut Session, hands: usize) -> Handles {
    let handles = Handles {
        grabs: Arc::new(AtomicUsize::new(0)),
        released: Arc::new(AtomicBool::new(false)),
        opens: Arc::new(AtomicUsize::new(0)),
    };
    let (grabs, released, opens) = (
        handles.grabs.clone(),
        handles.released.clone(),
        handles.opens.clone(),
    );
    session
        .start_with(
            move || {
                opens.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(TrackedSource { grabs, released }))
            },
            Box::new(FixedDetector { hands }),
        )
        .unwrap();
    handles
}

#[test]
fn results_update_status_and_canvas() {
    let mut session = Session::new();
    start_tracked(&mut session, 1);
    assert!(session.is_active());

    tick_until(&mut session, |s| s.status() == "Hand detected: 1 hand(s)");
    let canvas = session.canvas().unwrap();
    assert_eq!(canvas.resolution(), Resolution::new(64, 48));
}

#[test]
fn duplicate_start_never_reacquires_camera() {
    let mut session = Session::new();
    let handles = start_tracked(&mut session, 0);

    let second = session.start_with(
        || panic!("factory must not run while a session is active"),
        Box::new(FixedDetector { hands: 0 }),
    );
    assert!(matches!(second, Err(SessionError::AlreadyActive)));
    assert!(session.is_active());
    assert_eq!(handles.opens.load(Ordering::SeqCst), 1);
}

#[test]
fn stop_releases_camera_and_stops_capturing() {
    let mut session = Session::new();
    let handles = start_tracked(&mut session, 0);

    tick_until(&mut session, |s| s.status() == "No hands detected");
    assert!(handles.grabs.load(Ordering::SeqCst) >= 1);

    session.stop();
    assert!(!session.is_active());
    assert!(handles.released.load(Ordering::SeqCst));
    assert!(session.canvas().is_none());
    assert_eq!(session.status(), "Camera stopped. Click to start again.");

    // Further ticks are no-ops; no frames are captured after stop.
    let grabs = handles.grabs.load(Ordering::SeqCst);
    for _ in 0..10 {
        assert!(session.tick().is_none());
    }
    assert_eq!(handles.grabs.load(Ordering::SeqCst), grabs);

    // A fresh start works again.
    start_tracked(&mut session, 0);
    assert!(session.is_active());
}

#[test]
fn camera_failures_keep_session_inactive() {
    let mut session = Session::new();

    let err = session
        .start_with(
            || Err(CameraError::PermissionDenied),
            Box::new(FixedDetector { hands: 0 }),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Camera(CameraError::PermissionDenied)
    ));
    assert!(!session.is_active());
    assert_eq!(session.status(), "Error: camera permission denied");

    let err = session
        .start_with(
            || Err(CameraError::NoDevice),
            Box::new(FixedDetector { hands: 0 }),
        )
        .unwrap_err();
    assert!(matches!(err, SessionError::Camera(CameraError::NoDevice)));
    assert_eq!(session.status(), "Error: no camera found on this device");
}

#[test]
fn detector_failure_is_terminal_until_restarted() {
    struct Broken;
    impl HandDetector for Broken {
        fn initialize(&mut self) -> anyhow::Result<()> {
            anyhow::bail!("model load failed")
        }
        fn detect(&mut self, _: &Image) -> anyhow::Result<DetectionResult> {
            unreachable!()
        }
    }

    let mut session = Session::new();
    let grabs = Arc::new(AtomicUsize::new(0));
    let released = Arc::new(AtomicBool::new(false));
    let (g, r) = (grabs.clone(), released.clone());
    session
        .start_with(
            move || Ok(Box::new(TrackedSource { grabs: g, released: r })),
            Box::new(Broken),
        )
        .unwrap();

    tick_until(&mut session, |s| s.status().starts_with("Detector error:"));
    assert_eq!(session.status(), "Detector error: model load failed");
    assert_eq!(grabs.load(Ordering::SeqCst), 0);

    // No automatic retry, but stop + start recovers with a working detector.
    session.stop();
    start_tracked(&mut session, 2);
    tick_until(&mut session, |s| s.status() == "Hand detected: 2 hand(s)");
}
