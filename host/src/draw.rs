//! Pixel-level compositing on RGB frames.
//!
//! Every function clips against the destination, so sprites and text that
//! hang over a frame edge are cut rather than rejected.

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage, RgbaImage};

/// Glyph cell edge of the bitmap font, before scaling
const GLYPH: i32 = 8;

/// `camera_weight * camera + (1 - camera_weight) * background`, with the
/// background stretched to the camera frame first.
pub fn blend(camera: &RgbImage, background: &RgbImage, camera_weight: f32) -> RgbImage {
    let (w, h) = camera.dimensions();
    let bg = fit(background, w, h);
    let bg_weight = 1.0 - camera_weight;

    let mut out = RgbImage::new(w, h);
    for ((o, c), b) in out.pixels_mut().zip(camera.pixels()).zip(bg.pixels()) {
        for i in 0..3 {
            let v = camera_weight * c[i] as f32 + bg_weight * b[i] as f32;
            o[i] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Stretches `img` to exactly `w` x `h` (a clone when already that size).
pub fn fit(img: &RgbImage, w: u32, h: u32) -> RgbImage {
    if img.dimensions() == (w, h) {
        img.clone()
    } else {
        imageops::resize(img, w, h, FilterType::Triangle)
    }
}

/// Opaque copy of `src` with its top-left corner at `(x, y)`.
pub fn paste(dst: &mut RgbImage, src: &RgbImage, x: i32, y: i32) {
    imageops::replace(dst, src, x as i64, y as i64);
}

/// Alpha-composites an RGBA sprite onto the frame.
pub fn overlay_rgba(dst: &mut RgbImage, src: &RgbaImage, x: i32, y: i32) {
    let (dw, dh) = (dst.width() as i32, dst.height() as i32);
    for (sx, sy, p) in src.enumerate_pixels() {
        let tx = x + sx as i32;
        let ty = y + sy as i32;
        if tx < 0 || ty < 0 || tx >= dw || ty >= dh {
            continue;
        }
        let a = p[3] as u32;
        if a == 0 {
            continue;
        }
        let d = dst.get_pixel_mut(tx as u32, ty as u32);
        if a == 255 {
            *d = Rgb([p[0], p[1], p[2]]);
            continue;
        }
        for i in 0..3 {
            d[i] = ((p[i] as u32 * a + d[i] as u32 * (255 - a) + 127) / 255) as u8;
        }
    }
}

/// Filled axis-aligned rectangle.
pub fn fill_rect(dst: &mut RgbImage, x: i32, y: i32, w: i32, h: i32, color: Rgb<u8>) {
    let (dw, dh) = (dst.width() as i32, dst.height() as i32);
    for ty in y.max(0)..(y + h).min(dh) {
        for tx in x.max(0)..(x + w).min(dw) {
            dst.put_pixel(tx as u32, ty as u32, color);
        }
    }
}

/// Filled circle centred on `(cx, cy)`.
pub fn fill_circle(dst: &mut RgbImage, cx: i32, cy: i32, radius: i32, color: Rgb<u8>) {
    let (dw, dh) = (dst.width() as i32, dst.height() as i32);
    let r2 = radius * radius;
    for ty in (cy - radius).max(0)..=(cy + radius).min(dh - 1) {
        for tx in (cx - radius).max(0)..=(cx + radius).min(dw - 1) {
            let (dx, dy) = (tx - cx, ty - cy);
            if dx * dx + dy * dy <= r2 {
                dst.put_pixel(tx as u32, ty as u32, color);
            }
        }
    }
}

/// Draws `text` with its bottom-left corner at `anchor`, each font pixel
/// blown up to a `scale` x `scale` block. Characters outside the basic
/// Latin set are skipped but still advance the pen.
pub fn draw_text(dst: &mut RgbImage, text: &str, anchor: (i32, i32), scale: i32, color: Rgb<u8>) {
    let (x0, baseline) = anchor;
    let top = baseline - GLYPH * scale;

    for (i, c) in text.chars().enumerate() {
        let Some(glyph) = BASIC_FONTS.get(c) else {
            continue;
        };
        let left = x0 + i as i32 * GLYPH * scale;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH {
                if bits & (1 << col) == 0 {
                    continue;
                }
                fill_rect(
                    dst,
                    left + col * scale,
                    top + row as i32 * scale,
                    scale,
                    scale,
                    color,
                );
            }
        }
    }
}
