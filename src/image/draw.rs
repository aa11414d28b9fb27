//! Freestanding overlay drawing functions.

use std::convert::Infallible;

use embedded_graphics::{
    draw_target::DrawTarget,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle, Rectangle},
};

use crate::image::{Color, Image};

/// Guard returned by [`circle`]; draws the filled circle when dropped and allows customization.
pub struct DrawCircle<'a> {
    image: &'a mut Image,
    x: i32,
    y: i32,
    radius: u32,
    color: Color,
}

impl DrawCircle<'_> {
    /// Sets the circle's fill color.
    pub fn color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    /// Sets the circle's radius, in pixels.
    ///
    /// By default, a radius of 5 is used.
    pub fn radius(&mut self, radius: u32) -> &mut Self {
        self.radius = radius;
        self
    }
}

impl Drop for DrawCircle<'_> {
    fn drop(&mut self) {
        match Circle::with_center(Point::new(self.x, self.y), self.radius * 2 + 1)
            .into_styled(PrimitiveStyle::with_fill(self.color))
            .draw(&mut Target(self.image))
        {
            Ok(_) => {}
            Err(infallible) => match infallible {},
        }
    }
}

/// Guard returned by [`line`]; draws the line when dropped and allows customization.
pub struct DrawLine<'a> {
    image: &'a mut Image,
    start_x: i32,
    start_y: i32,
    end_x: i32,
    end_y: i32,
    color: Color,
    stroke_width: u32,
}

impl DrawLine<'_> {
    /// Sets the line's color.
    pub fn color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    /// Sets the line's stroke width.
    ///
    /// By default, a stroke width of 1 is used.
    pub fn stroke_width(&mut self, width: u32) -> &mut Self {
        self.stroke_width = width;
        self
    }
}

impl Drop for DrawLine<'_> {
    fn drop(&mut self) {
        match Line::new(
            Point::new(self.start_x, self.start_y),
            Point::new(self.end_x, self.end_y),
        )
        .into_styled(PrimitiveStyle::with_stroke(self.color, self.stroke_width))
        .draw(&mut Target(self.image))
        {
            Ok(_) => {}
            Err(infallible) => match infallible {},
        }
    }
}

/// Draws a filled circle onto an image.
///
/// This is used to visualize individual landmark points.
pub fn circle(image: &mut Image, x: i32, y: i32) -> DrawCircle<'_> {
    DrawCircle {
        image,
        x,
        y,
        radius: 5,
        color: Color::RED,
    }
}

/// Draws a line onto an image.
pub fn line(image: &mut Image, start_x: i32, start_y: i32, end_x: i32, end_y: i32) -> DrawLine<'_> {
    DrawLine {
        image,
        start_x,
        start_y,
        end_x,
        end_y,
        color: Color::GREEN,
        stroke_width: 1,
    }
}

struct Target<'a>(&'a mut Image);

impl Dimensions for Target<'_> {
    fn bounding_box(&self) -> Rectangle {
        let (width, height) = (self.0.width(), self.0.height());

        Rectangle {
            top_left: Point { x: 0, y: 0 },
            size: Size { width, height },
        }
    }
}

impl DrawTarget for Target<'_> {
    type Color = Color;

    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = embedded_graphics::Pixel<Self::Color>>,
    {
        for pixel in pixels {
            if pixel.0.x >= 0
                && (pixel.0.x as u32) < self.0.width()
                && pixel.0.y >= 0
                && (pixel.0.y as u32) < self.0.height()
            {
                self.0.set(pixel.0.x as _, pixel.0.y as _, pixel.1);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_fills_center() {
        let mut image = Image::new(32, 32);
        circle(&mut image, 16, 16);
        assert_eq!(image.get(16, 16), Color::RED);
        assert_eq!(image.get(16, 13), Color::RED);
        assert_eq!(image.get(13, 16), Color::RED);
        assert_eq!(image.get(0, 0), Color::NULL);
    }

    #[test]
    fn line_covers_endpoints_and_midpoint() {
        let mut image = Image::new(32, 32);
        line(&mut image, 2, 2, 28, 2).color(Color::BLUE);
        assert_eq!(image.get(2, 2), Color::BLUE);
        assert_eq!(image.get(15, 2), Color::BLUE);
        assert_eq!(image.get(28, 2), Color::BLUE);
        assert_eq!(image.get(15, 10), Color::NULL);
    }

    #[test]
    fn drawing_clips_to_image_bounds() {
        let mut image = Image::new(8, 8);
        circle(&mut image, -2, -2);
        line(&mut image, -10, 4, 20, 4);
        assert_eq!(image.get(4, 4), Color::GREEN);
    }
}
