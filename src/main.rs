use std::thread;
use std::time::{Duration, Instant};

use handwave::camera::CameraOptions;
use handwave::image::Resolution;
use handwave::sandbox::NullDetector;
use handwave::session::Session;

/// Stand-in for the display refresh interval driving the relay loop.
const TICK_INTERVAL: Duration = Duration::from_millis(16);

fn main() -> anyhow::Result<()> {
    handwave::init_logger!();

    let mut session = Session::new();
    session.start(
        CameraOptions::default().resolution(Resolution::RES_480P),
        Box::new(NullDetector),
    )?;
    log::info!("{}", session.status());

    let mut frames = 0u32;
    let mut last = Instant::now();
    loop {
        if session.tick().is_some() {
            frames += 1;
        }
        if last.elapsed() >= Duration::from_secs(5) {
            log::info!(
                "{} ({:.1} results/s)",
                session.status(),
                frames as f32 / last.elapsed().as_secs_f32(),
            );
            frames = 0;
            last = Instant::now();
        }
        thread::sleep(TICK_INTERVAL);
    }
}
