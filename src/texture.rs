//! Texture variants. `ImageTexture` owns decoded bytes and applies the
//! inverse sRGB transfer function per channel so every sampler downstream of
//! this module only ever sees linear color.

use crate::math::{Color, Point3, Vec2};
use image::GenericImageView;

/// A constant-color texture.
#[derive(Debug, Clone, Copy)]
pub struct SolidColor {
    pub albedo: Color,
}

impl SolidColor {
    pub fn new(albedo: Color) -> Self {
        Self { albedo }
    }
}

/// A decoded, bilinearly-sampled image texture. Pixels are stored linear
/// (sRGB already removed at load time) so `value` never repeats the decode.
#[derive(Debug, Clone)]
pub struct ImageTexture {
    linear: Vec<Color>,
    width: usize,
    height: usize,
}

impl ImageTexture {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::error::RenderError> {
        let img = image::load_from_memory(bytes)
            .map_err(|source| crate::error::RenderError::TextureDecode { source })?;
        Ok(Self::from_dynamic_image(&img))
    }

    fn from_dynamic_image(img: &image::DynamicImage) -> Self {
        let (width, height) = img.dimensions();
        let mut linear = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let px = img.get_pixel(x, y);
                linear.push(Color::new(
                    srgb_to_linear(px[0] as f64 / 255.0),
                    srgb_to_linear(px[1] as f64 / 255.0),
                    srgb_to_linear(px[2] as f64 / 255.0),
                ));
            }
        }
        Self {
            linear,
            width: width as usize,
            height: height as usize,
        }
    }

    #[inline]
    fn texel(&self, x: usize, y: usize) -> Color {
        self.linear[y * self.width + x]
    }

    fn sample_bilinear(&self, u: f64, v: f64) -> Color {
        if self.linear.is_empty() {
            return Color::new(0.0, 1.0, 1.0);
        }

        let u = u.clamp(0.0, 1.0);
        let v = v.clamp(0.0, 1.0);

        let x = u * (self.width as f64 - 1.0);
        let y = (1.0 - v) * (self.height as f64 - 1.0);

        let x0 = x as usize;
        let y0 = y as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let tx = x - x0 as f64;
        let ty = y - y0 as f64;

        let c00 = self.texel(x0, y0);
        let c10 = self.texel(x1, y0);
        let c01 = self.texel(x0, y1);
        let c11 = self.texel(x1, y1);

        let c0 = c00 * (1.0 - tx) + c10 * tx;
        let c1 = c01 * (1.0 - tx) + c11 * tx;
        c0 * (1.0 - ty) + c1 * ty
    }
}

#[inline]
fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[derive(Debug, Clone)]
pub enum Texture {
    Solid(SolidColor),
    Image(ImageTexture),
}

impl Texture {
    pub fn solid(albedo: Color) -> Self {
        Texture::Solid(SolidColor::new(albedo))
    }

    pub fn value(&self, uv: Vec2, _p: Point3) -> Color {
        match self {
            Texture::Solid(s) => s.albedo,
            Texture::Image(i) => i.sample_bilinear(uv.x, uv.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_color_ignores_uv_and_position() {
        let tex = Texture::solid(Color::new(0.2, 0.4, 0.8));
        let a = tex.value(Vec2::new(0.0, 0.0), Point3::zero());
        let b = tex.value(Vec2::new(0.9, 0.3), Point3::new(5.0, -2.0, 1.0));
        assert_eq!(a, b);
        assert_eq!(a, Color::new(0.2, 0.4, 0.8));
    }

    #[test]
    fn srgb_to_linear_is_monotonic_and_endpoint_exact() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-9);
        let mut prev = 0.0;
        for i in 1..=100 {
            let c = i as f64 / 100.0;
            let lin = srgb_to_linear(c);
            assert!(lin > prev);
            prev = lin;
        }
    }

    #[test]
    fn single_texel_image_samples_constant() {
        let img = ImageTexture {
            linear: vec![Color::new(0.5, 0.5, 0.5)],
            width: 1,
            height: 1,
        };
        let c = img.sample_bilinear(0.37, 0.81);
        assert_eq!(c, Color::new(0.5, 0.5, 0.5));
    }
}
