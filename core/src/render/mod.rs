//! Frame compositing.
//!
//! The compositor draws through the [`DrawTarget`] trait so its draw-call
//! sequence can be tested without pixels. [`Canvas`] is the software
//! implementation used for real output. All image blits are nearest-neighbour;
//! pixel art must never be filtered.

mod canvas;
mod compositor;
mod font;
mod heatline;
mod layout;

pub use canvas::Canvas;
pub use compositor::{Compositor, FrameContext};
pub use font::{GLYPH_ADVANCE, GLYPH_HEIGHT, text_width};
pub use heatline::HeatLines;
pub use layout::{Layout, Rect};

use glam::Vec2;
use image::{Rgba, RgbaImage};

pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Minimal drawing surface.
pub trait DrawTarget {
    fn size(&self) -> (u32, u32);

    fn clear(&mut self, colour: Rgba<u8>);

    /// Alpha-blended fill of a rectangle, clipped to the target.
    fn fill_rect(&mut self, rect: Rect, colour: Rgba<u8>);

    /// Alpha-blended copy with the image's top-left corner at `(x, y)`.
    fn blit(&mut self, image: &RgbaImage, x: i32, y: i32);

    /// Alpha-blended copy rotated by `angle` radians around `centre`.
    fn blit_rotated(&mut self, image: &RgbaImage, centre: Vec2, angle: f32);

    /// One pixel wide line, no anti-aliasing.
    fn line(&mut self, from: Vec2, to: Vec2, colour: Rgba<u8>);

    /// Text with its baseline at `y`. `size` is the glyph height in pixels.
    fn text(&mut self, x: i32, y: i32, text: &str, size: u32, colour: Rgba<u8>);
}

pub fn rgb(c: [u8; 3]) -> Rgba<u8> {
    Rgba([c[0], c[1], c[2], 255])
}

/// HSV to opaque RGBA. Hue in degrees, saturation and value in `0..=1`.
pub fn hsv(hue: f32, saturation: f32, value: f32) -> Rgba<u8> {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = value * saturation;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = value - c;
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_byte = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba([to_byte(r), to_byte(g), to_byte(b), 255])
}

/// Source-over blend of `src` onto `dst`.
pub fn blend(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let a = src[3] as u32;
    match a {
        0 => dst,
        255 => src,
        _ => {
            let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * (255 - a) + 127) / 255) as u8;
            let out_a = a + dst[3] as u32 * (255 - a) / 255;
            Rgba([
                mix(src[0], dst[0]),
                mix(src[1], dst[1]),
                mix(src[2], dst[2]),
                out_a as u8,
            ])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(hsv(0.0, 1.0, 1.0), Rgba([255, 0, 0, 255]));
        assert_eq!(hsv(120.0, 1.0, 1.0), Rgba([0, 255, 0, 255]));
        assert_eq!(hsv(240.0, 1.0, 1.0), Rgba([0, 0, 255, 255]));
        assert_eq!(hsv(360.0, 1.0, 1.0), Rgba([255, 0, 0, 255]));
        assert_eq!(hsv(0.0, 0.0, 0.5), Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn test_hsv_heat_range() {
        // Slowest runs sit at hue 15, fastest non-top at 110.
        assert_eq!(hsv(15.0, 1.0, 0.75), Rgba([191, 48, 0, 255]));
        assert_eq!(hsv(110.0, 1.0, 0.75), Rgba([32, 191, 0, 255]));
    }

    #[test]
    fn test_blend() {
        let dst = Rgba([0, 0, 0, 255]);
        assert_eq!(blend(dst, Rgba([255, 255, 255, 0])), dst);
        assert_eq!(blend(dst, Rgba([10, 20, 30, 255])), Rgba([10, 20, 30, 255]));
        let half = blend(dst, Rgba([255, 255, 255, 150]));
        assert_eq!(half, Rgba([150, 150, 150, 255]));
    }
}
