//! Linear/sRGB transfer functions, framebuffer-to-PNG conversion, and output
//! filename assembly.

use crate::error::RenderError;
use crate::interval::Interval;
use crate::math::Color;
use image::{ImageBuffer, Rgb};
use std::time::{SystemTime, UNIX_EPOCH};

const OUTPUT_INTENSITY: Interval = Interval::new(0.0000, 0.9999);

#[inline]
pub fn linear_to_srgb(c: f64) -> f64 {
    if c <= 0.0031308 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// A linear-color accumulation buffer, one scanline-contiguous slice per
/// render worker.
pub struct Framebuffer {
    pub width: u32,
    pub height: u32,
    pixels: Vec<Color>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::zero(); (width as usize) * (height as usize)],
        }
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let idx = (y as usize) * (self.width as usize) + x as usize;
        self.pixels[idx] = color;
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[(y as usize) * (self.width as usize) + x as usize]
    }

    /// The backing pixel storage, row-major. Exposed so the renderer can
    /// split it into disjoint per-thread row chunks with `chunks_mut`.
    pub fn as_mut_slice(&mut self) -> &mut [Color] {
        &mut self.pixels
    }

    /// Converts to an 8-bit sRGB image: replace NaN with 0, clamp to
    /// `(0, 0.9999)`, apply the linear->sRGB transfer, scale by 256 and
    /// truncate.
    pub fn to_srgb_image(&self) -> ImageBuffer<Rgb<u8>, Vec<u8>> {
        let mut buf = ImageBuffer::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let linear = self.get(x, y).nan_to_zero();
                let r = (OUTPUT_INTENSITY.clamp(linear_to_srgb(linear.x)) * 256.0) as u8;
                let g = (OUTPUT_INTENSITY.clamp(linear_to_srgb(linear.y)) * 256.0) as u8;
                let b = (OUTPUT_INTENSITY.clamp(linear_to_srgb(linear.z)) * 256.0) as u8;
                buf.put_pixel(x, y, Rgb([r, g, b]));
            }
        }
        buf
    }

    pub fn write_png(&self, path: &str) -> Result<(), RenderError> {
        self.to_srgb_image()
            .save(path)
            .map_err(|source| RenderError::ImageWrite {
                path: path.to_string(),
                source,
            })
    }
}

/// `YYYYMMDD_HHMM` in UTC.
pub fn format_timestamp(now: SystemTime) -> String {
    let secs = now
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    let days = secs.div_euclid(86_400);
    let day_secs = secs.rem_euclid(86_400);
    let (year, month, day) = civil_from_days(days);
    let hour = day_secs / 3600;
    let minute = (day_secs % 3600) / 60;
    format!("{year:04}{month:02}{day:02}_{hour:02}{minute:02}")
}

/// Howard Hinnant's days-since-epoch to civil-calendar-date algorithm.
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = if month <= 2 { y + 1 } else { y };
    (year, month, day)
}

/// `{scene}_{timestamp}_spp{N}-depth{D}.png`.
pub fn output_filename(scene: &str, timestamp: &str, samples_per_pixel: u32, max_depth: u32) -> String {
    format!("{scene}_{timestamp}_spp{samples_per_pixel}-depth{max_depth}.png")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn srgb_to_linear(c: f64) -> f64 {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }

    #[test]
    fn linear_srgb_round_trip_within_tolerance() {
        for i in 0..=100 {
            let x = i as f64 / 100.0;
            let srgb = linear_to_srgb(x);
            let back = srgb_to_linear(srgb);
            assert!((back - x).abs() < 1e-6, "x={x} back={back}");
        }
    }

    #[test]
    fn civil_from_days_matches_known_epoch_date() {
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(civil_from_days(19_723), (2023, 12, 25));
    }

    #[test]
    fn output_filename_matches_template() {
        let name = output_filename("cornell", "20260101_0930", 64, 8);
        assert_eq!(name, "cornell_20260101_0930_spp64-depth8.png");
    }

    #[test]
    fn framebuffer_roundtrips_nan_as_black() {
        let mut fb = Framebuffer::new(2, 2);
        fb.set(0, 0, Color::new(f64::NAN, 0.5, 0.5));
        let img = fb.to_srgb_image();
        assert_eq!(img.get_pixel(0, 0)[0], 0);
    }
}
