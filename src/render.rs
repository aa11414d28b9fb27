//! The overlay renderer.
//!
//! A pure function of `(detection result, canvas)`: clears the canvas, draws every hand's
//! skeleton and landmark points, and returns the one-line status summary. No state is retained
//! between frames.

use crate::hand::{DetectionResult, CONNECTIVITY};
use crate::image::{draw, Color, Image};

pub const POINT_RADIUS: u32 = 5;
pub const POINT_COLOR: Color = Color::RED;
pub const SKELETON_STROKE: u32 = 3;
pub const SKELETON_COLOR: Color = Color::GREEN;

/// Clears `canvas` and redraws it from `result`.
///
/// Per hand, the fixed skeleton segments are drawn first and the 21 landmark circles on top, so
/// point centers always show the point color. Landmark coordinates are normalized; the canvas is
/// expected to match the video's native resolution.
///
/// Returns the status summary for the result.
pub fn render(result: &DetectionResult, canvas: &mut Image) -> String {
    canvas.clear();

    let width = canvas.width() as f32;
    let height = canvas.height() as f32;

    for hand in result.hands() {
        for &(a, b) in &CONNECTIVITY {
            let [ax, ay, _] = hand.position(a);
            let [bx, by, _] = hand.position(b);
            draw::line(
                canvas,
                (ax * width) as i32,
                (ay * height) as i32,
                (bx * width) as i32,
                (by * height) as i32,
            )
            .color(SKELETON_COLOR)
            .stroke_width(SKELETON_STROKE);
        }

        for &[x, y, _] in hand.positions() {
            draw::circle(canvas, (x * width) as i32, (y * height) as i32)
                .color(POINT_COLOR)
                .radius(POINT_RADIUS);
        }
    }

    result.summary()
}
