//! Scanline filling onto an RGBA frame, optionally gated by a subject mask.

use crate::camera::types::Frame;
use crate::render::color::{blend_over, Rgb};
use crate::render::geometry::{Point, Rect, Trapezoid};
use crate::segment::SegmentationMask;

/// Drawing surface over a frame. Pixels are sampled at their centres.
pub struct Canvas<'a> {
    frame: &'a mut Frame,
    mask: Option<(&'a SegmentationMask, f32)>,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut Frame) -> Self {
        Self { frame, mask: None }
    }

    /// Only draw where `mask` marks the subject at `threshold`.
    /// The mask must be the same size as the frame.
    pub fn with_mask(mut self, mask: &'a SegmentationMask, threshold: f32) -> Self {
        self.mask = Some((mask, threshold));
        self
    }

    /// Integer pixel range whose centres fall in `[lo, hi)`, clipped to `len`.
    fn pixel_range(lo: f32, hi: f32, len: u32) -> std::ops::Range<u32> {
        let start = (lo - 0.5).ceil().max(0.0);
        let end = (hi - 0.5).ceil().clamp(0.0, len as f32);
        if start >= end {
            return 0..0;
        }
        start as u32..end as u32
    }

    fn blend(&mut self, x: u32, y: u32, color: Rgb, alpha: f32) {
        if let Some((mask, threshold)) = self.mask {
            if !mask.is_subject(x, y, threshold) {
                return;
            }
        }
        if let Some(px) = self.frame.pixel_mut(x, y) {
            blend_over(px, color, alpha);
        }
    }

    /// Fill a trapezoid, asking `paint` for the colour of each pixel.
    pub fn fill_trapezoid(
        &mut self,
        shape: &Trapezoid,
        alpha: f32,
        mut paint: impl FnMut(u32, u32) -> Rgb,
    ) -> usize {
        let mut touched = 0;
        for y in Self::pixel_range(shape.top_y, shape.bottom_y, self.frame.height) {
            let Some((left, right)) = shape.span_at(y as f32 + 0.5) else {
                continue;
            };
            for x in Self::pixel_range(left, right, self.frame.width) {
                self.blend(x, y, paint(x, y), alpha);
                touched += 1;
            }
        }
        touched
    }

    pub fn fill_rect(&mut self, rect: &Rect, color: Rgb, alpha: f32) {
        for y in Self::pixel_range(rect.y0, rect.y1, self.frame.height) {
            for x in Self::pixel_range(rect.x0, rect.x1, self.frame.width) {
                self.blend(x, y, color, alpha);
            }
        }
    }

    pub fn fill_circle(&mut self, center: Point, radius: f32, color: Rgb, alpha: f32) {
        let r2 = radius * radius;
        for y in Self::pixel_range(center.y - radius, center.y + radius, self.frame.height) {
            let dy = y as f32 + 0.5 - center.y;
            for x in Self::pixel_range(center.x - radius, center.x + radius, self.frame.width) {
                let dx = x as f32 + 0.5 - center.x;
                if dx * dx + dy * dy <= r2 {
                    self.blend(x, y, color, alpha);
                }
            }
        }
    }

    /// One-pixel line between two points (Bresenham), clipped to the frame.
    ///
    /// Endpoints far outside the frame (or non-finite) are clipped before
    /// stepping, so the walk never exceeds the frame's perimeter.
    pub fn draw_line(&mut self, from: Point, to: Point, color: Rgb, alpha: f32) {
        let (w, h) = (i64::from(self.frame.width), i64::from(self.frame.height));
        let Some(((x0, y0), (x1, y1))) = clip_segment(from, to, w as f64, h as f64) else {
            return;
        };
        let snap = |v: f64, max: i64| (v.round() as i64).clamp(-1, max);
        let (mut x, mut y) = (snap(x0, w), snap(y0, h));
        let (x1, y1) = (snap(x1, w), snap(y1, h));
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            if x >= 0 && y >= 0 {
                self.blend(x as u32, y as u32, color, alpha);
            }
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }
}

const LEFT: u8 = 1;
const RIGHT: u8 = 2;
const ABOVE: u8 = 4;
const BELOW: u8 = 8;

/// Cohen-Sutherland clip of a segment to `[-1, w] x [-1, h]`, in `f64`.
/// Each clip pins one coordinate exactly on the boundary, so endpoints far
/// outside the frame collapse onto it. `None` when the segment misses the
/// rectangle or has a non-finite coordinate.
fn clip_segment(from: Point, to: Point, w: f64, h: f64) -> Option<((f64, f64), (f64, f64))> {
    let (mut x0, mut y0) = (f64::from(from.x), f64::from(from.y));
    let (mut x1, mut y1) = (f64::from(to.x), f64::from(to.y));
    if ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let outcode = |x: f64, y: f64| {
        let mut code = 0;
        if x < -1.0 {
            code |= LEFT;
        } else if x > w {
            code |= RIGHT;
        }
        if y < -1.0 {
            code |= ABOVE;
        } else if y > h {
            code |= BELOW;
        }
        code
    };

    let (mut c0, mut c1) = (outcode(x0, y0), outcode(x1, y1));
    // Two clips per endpoint suffice; rounding leftovers are clamped by the caller.
    for _ in 0..4 {
        if c0 | c1 == 0 {
            break;
        }
        if c0 & c1 != 0 {
            return None;
        }
        let out = if c0 != 0 { c0 } else { c1 };
        let (x, y) = if out & ABOVE != 0 {
            (x0 + (x1 - x0) * (-1.0 - y0) / (y1 - y0), -1.0)
        } else if out & BELOW != 0 {
            (x0 + (x1 - x0) * (h - y0) / (y1 - y0), h)
        } else if out & RIGHT != 0 {
            (w, y0 + (y1 - y0) * (w - x0) / (x1 - x0))
        } else {
            (-1.0, y0 + (y1 - y0) * (-1.0 - x0) / (x1 - x0))
        };
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        if out == c0 {
            (x0, y0) = (x, y);
            c0 = outcode(x0, y0);
        } else {
            (x1, y1) = (x, y);
            c1 = outcode(x1, y1);
        }
    }
    Some(((x0, y0), (x1, y1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = [255, 0, 0];

    fn black(w: u32, h: u32) -> Frame {
        Frame::filled(w, h, [0, 0, 0, 255], 0)
    }

    #[test]
    fn rect_fill_covers_pixel_centres_only() {
        let mut frame = black(10, 10);
        Canvas::new(&mut frame).fill_rect(
            &Rect {
                x0: 2.0,
                y0: 2.0,
                x1: 4.0,
                y1: 3.0,
            },
            RED,
            1.0,
        );
        assert_eq!(frame.pixel(2, 2), Some([255, 0, 0, 255]));
        assert_eq!(frame.pixel(3, 2), Some([255, 0, 0, 255]));
        assert_eq!(frame.pixel(4, 2), Some([0, 0, 0, 255]));
        assert_eq!(frame.pixel(2, 3), Some([0, 0, 0, 255]));
    }

    #[test]
    fn shapes_outside_frame_are_clipped() {
        let mut frame = black(4, 4);
        let mut canvas = Canvas::new(&mut frame);
        canvas.fill_rect(
            &Rect {
                x0: -10.0,
                y0: -10.0,
                x1: 100.0,
                y1: 1.0,
            },
            RED,
            1.0,
        );
        canvas.fill_circle(Point { x: -50.0, y: -50.0 }, 5.0, RED, 1.0);
        canvas.draw_line(Point { x: -3.0, y: 0.0 }, Point { x: 8.0, y: 0.0 }, RED, 1.0);
        assert_eq!(frame.pixel(3, 0), Some([255, 0, 0, 255]));
        assert_eq!(frame.pixel(3, 1), Some([0, 0, 0, 255]));
    }

    #[test]
    fn trapezoid_fill_counts_pixels() {
        let mut frame = black(10, 10);
        let touched = Canvas::new(&mut frame).fill_trapezoid(
            &Trapezoid {
                top_y: 0.0,
                bottom_y: 2.0,
                top_left: 0.0,
                top_right: 4.0,
                bottom_left: 0.0,
                bottom_right: 4.0,
            },
            1.0,
            |_, _| RED,
        );
        assert_eq!(touched, 8);
    }

    #[test]
    fn mask_gates_pixels() {
        let mut frame = black(2, 1);
        let mask = SegmentationMask::from_values(2, 1, vec![1.0, 0.2]).unwrap();
        Canvas::new(&mut frame).with_mask(&mask, 0.5).fill_rect(
            &Rect {
                x0: 0.0,
                y0: 0.0,
                x1: 2.0,
                y1: 1.0,
            },
            RED,
            1.0,
        );
        assert_eq!(frame.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(frame.pixel(1, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn circle_fill_is_round() {
        let mut frame = black(9, 9);
        Canvas::new(&mut frame).fill_circle(Point { x: 4.5, y: 4.5 }, 3.0, RED, 1.0);
        assert_eq!(frame.pixel(4, 4), Some([255, 0, 0, 255]));
        assert_eq!(frame.pixel(1, 1), Some([0, 0, 0, 255]));
    }

    #[test]
    fn diagonal_line_hits_both_ends() {
        let mut frame = black(5, 5);
        Canvas::new(&mut frame).draw_line(Point { x: 0.0, y: 0.0 }, Point { x: 4.0, y: 4.0 }, RED, 1.0);
        for i in 0..5 {
            assert_eq!(frame.pixel(i, i), Some([255, 0, 0, 255]));
        }
    }

    #[test]
    fn lines_to_far_away_points_are_clipped() {
        let mut frame = black(8, 8);
        Canvas::new(&mut frame).draw_line(
            Point { x: 1e30, y: 4.0 },
            Point { x: 2.0, y: 4.0 },
            RED,
            1.0,
        );
        assert_eq!(frame.pixel(7, 4), Some([255, 0, 0, 255]));
        assert_eq!(frame.pixel(2, 4), Some([255, 0, 0, 255]));
        assert_eq!(frame.pixel(1, 4), Some([0, 0, 0, 255]));
        assert_eq!(frame.pixel(7, 3), Some([0, 0, 0, 255]));
    }

    #[test]
    fn degenerate_lines_draw_nothing_or_stay_in_frame() {
        let mut frame = black(8, 8);
        let mut canvas = Canvas::new(&mut frame);
        canvas.draw_line(Point { x: -1e30, y: -1e30 }, Point { x: 1e30, y: 1e30 }, RED, 1.0);
        canvas.draw_line(Point { x: f32::NAN, y: 0.0 }, Point { x: 3.0, y: 3.0 }, RED, 1.0);
        canvas.draw_line(Point { x: 0.0, y: f32::INFINITY }, Point { x: 3.0, y: 3.0 }, RED, 1.0);
        canvas.draw_line(Point { x: 20.0, y: -5.0 }, Point { x: 30.0, y: -9.0 }, RED, 1.0);
        assert_eq!(frame.pixel(0, 7), Some([0, 0, 0, 255]));
        assert_eq!(frame.pixel(7, 0), Some([0, 0, 0, 255]));
        assert_eq!(frame.pixel(3, 0), Some([0, 0, 0, 255]));
    }
}
