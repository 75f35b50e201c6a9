//! Software implementation of [`DrawTarget`] over an RGBA buffer.

use super::font;
use super::layout::Rect;
use super::{BLACK, DrawTarget, blend};
use glam::Vec2;
use image::{Rgba, RgbaImage};

/// Raster frame buffer.
#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// Opaque black canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, BLACK),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.image.get_pixel(x, y)
    }

    fn plot(&mut self, x: i32, y: i32, colour: Rgba<u8>) {
        if x < 0 || y < 0 || x as u32 >= self.image.width() || y as u32 >= self.image.height() {
            return;
        }
        let dst = self.image.get_pixel_mut(x as u32, y as u32);
        *dst = blend(*dst, colour);
    }

    /// Clip a rectangle to the canvas, returning pixel bounds `x0..x1, y0..y1`.
    fn clip(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        let x0 = rect.x.max(0) as i64;
        let y0 = rect.y.max(0) as i64;
        let x1 = (rect.x as i64 + rect.w as i64).min(self.image.width() as i64);
        let y1 = (rect.y as i64 + rect.h as i64).min(self.image.height() as i64);
        (x0 < x1 && y0 < y1).then_some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

impl DrawTarget for Canvas {
    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn clear(&mut self, colour: Rgba<u8>) {
        for px in self.image.pixels_mut() {
            *px = colour;
        }
    }

    fn fill_rect(&mut self, rect: Rect, colour: Rgba<u8>) {
        let Some((x0, y0, x1, y1)) = self.clip(rect) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let dst = self.image.get_pixel_mut(x, y);
                *dst = blend(*dst, colour);
            }
        }
    }

    fn blit(&mut self, image: &RgbaImage, x: i32, y: i32) {
        let target = Rect::new(x, y, image.width(), image.height());
        let Some((x0, y0, x1, y1)) = self.clip(target) else {
            return;
        };
        for dy in y0..y1 {
            for dx in x0..x1 {
                let src = *image.get_pixel((dx as i32 - x) as u32, (dy as i32 - y) as u32);
                let dst = self.image.get_pixel_mut(dx, dy);
                *dst = blend(*dst, src);
            }
        }
    }

    fn blit_rotated(&mut self, image: &RgbaImage, centre: Vec2, angle: f32) {
        let (w, h) = (image.width() as f32, image.height() as f32);
        let half = Vec2::new(w, h) / 2.0;
        let radius = half.length().ceil() as i32 + 1;
        let (sin, cos) = angle.sin_cos();
        let cx = centre.x.floor() as i32;
        let cy = centre.y.floor() as i32;

        for py in cy - radius..=cy + radius {
            for px in cx - radius..=cx + radius {
                // Inverse-rotate the pixel centre back into image space.
                let d = Vec2::new(px as f32 + 0.5, py as f32 + 0.5) - centre;
                let src = Vec2::new(d.x * cos + d.y * sin, -d.x * sin + d.y * cos) + half;
                if src.x < 0.0 || src.y < 0.0 || src.x >= w || src.y >= h {
                    continue;
                }
                let colour = *image.get_pixel(src.x as u32, src.y as u32);
                self.plot(px, py, colour);
            }
        }
    }

    fn line(&mut self, from: Vec2, to: Vec2, colour: Rgba<u8>) {
        let (mut x0, mut y0) = (from.x.floor() as i32, from.y.floor() as i32);
        let (x1, y1) = (to.x.floor() as i32, to.y.floor() as i32);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.plot(x0, y0, colour);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn text(&mut self, x: i32, y: i32, text: &str, size: u32, colour: Rgba<u8>) {
        let scale = font::pixel_scale(size);
        // The bottom row of a glyph sits on the baseline.
        let top = y + 1 - (7 * scale) as i32;
        let mut squares = Vec::new();
        font::rasterize(text, size, |dx, dy, side| squares.push((dx, dy, side)));
        for (dx, dy, side) in squares {
            self.fill_rect(Rect::new(x + dx, top + dy, side, side), colour);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::WHITE;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn count(canvas: &Canvas, colour: Rgba<u8>) -> usize {
        canvas.image().pixels().filter(|&&p| p == colour).count()
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut canvas = Canvas::new(10, 10);
        canvas.fill_rect(Rect::new(-5, 8, 8, 8), RED);
        assert_eq!(count(&canvas, RED), 3 * 2);
        assert_eq!(canvas.pixel(0, 9), RED);
        assert_eq!(canvas.pixel(3, 9), BLACK);

        canvas.fill_rect(Rect::new(20, 20, 5, 5), WHITE);
        assert_eq!(count(&canvas, WHITE), 0);
    }

    #[test]
    fn test_blit_is_nearest_and_respects_alpha() {
        let mut sprite = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0]));
        sprite.put_pixel(1, 0, RED);

        let mut canvas = Canvas::new(4, 4);
        canvas.blit(&sprite, 1, 1);
        assert_eq!(canvas.pixel(2, 1), RED);
        assert_eq!(count(&canvas, RED), 1);

        // Partially off-canvas.
        canvas.blit(&sprite, 2, -1);
        assert_eq!(count(&canvas, RED), 1);
        canvas.blit(&sprite, -1, 3);
        assert_eq!(canvas.pixel(0, 3), RED);
    }

    #[test]
    fn test_blit_rotated_zero_matches_blit() {
        let mut sprite = RgbaImage::from_pixel(4, 2, WHITE);
        sprite.put_pixel(0, 0, RED);

        let mut rotated = Canvas::new(12, 12);
        rotated.blit_rotated(&sprite, Vec2::new(6.0, 6.0), 0.0);
        let mut plain = Canvas::new(12, 12);
        plain.blit(&sprite, 4, 5);

        assert_eq!(rotated.image(), plain.image());
    }

    #[test]
    fn test_blit_rotated_quarter_turn() {
        let sprite = RgbaImage::from_pixel(4, 2, WHITE);
        let mut canvas = Canvas::new(12, 12);
        canvas.blit_rotated(&sprite, Vec2::new(6.0, 6.0), std::f32::consts::FRAC_PI_2);

        // A 4x2 sprite turned a quarter becomes 2 wide and 4 tall.
        assert_eq!(count(&canvas, WHITE), 8);
        for y in 4..8 {
            assert_eq!(canvas.pixel(5, y), WHITE);
            assert_eq!(canvas.pixel(6, y), WHITE);
        }
    }

    #[test]
    fn test_line_covers_endpoints() {
        let mut canvas = Canvas::new(10, 10);
        canvas.line(Vec2::new(1.0, 1.0), Vec2::new(8.0, 4.0), RED);
        assert_eq!(canvas.pixel(1, 1), RED);
        assert_eq!(canvas.pixel(8, 4), RED);
        assert_eq!(count(&canvas, RED), 8);

        canvas.line(Vec2::new(3.0, 9.0), Vec2::new(3.0, 6.0), WHITE);
        assert_eq!(count(&canvas, WHITE), 4);
    }

    #[test]
    fn test_text_sits_on_baseline() {
        let mut canvas = Canvas::new(40, 20);
        canvas.text(2, 15, "1:", 8, WHITE);
        let lit: Vec<(u32, u32)> = canvas
            .image()
            .enumerate_pixels()
            .filter(|(_, _, p)| **p == WHITE)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!lit.is_empty());
        assert!(lit.iter().all(|&(x, y)| (2..14).contains(&x) && (9..=15).contains(&y)));
        // The stem of the "1" runs the full glyph height.
        assert!((9..=15).all(|y| canvas.pixel(4, y) == WHITE));
    }
}
