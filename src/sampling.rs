//! RNG-driven sampling primitives and the local shading-frame transform.
//!
//! Every routine here is a pure function of an RNG plus (for the frame
//! transforms) a tangent/normal pair — none of it touches global state, so
//! callers can hand each worker thread its own RNG.

use crate::math::{Vec2, Vec3};
use rand::Rng;
use std::f64::consts::PI;

#[inline]
pub fn random_unit_01(rng: &mut impl Rng) -> f64 {
    rng.gen_range(0.0..1.0)
}

#[inline]
pub fn random_unit_01_pair(rng: &mut impl Rng) -> Vec2 {
    Vec2::new(random_unit_01(rng), random_unit_01(rng))
}

/// Rejection-sampled uniform point on the unit sphere, normalized.
pub fn random_unit_vector(rng: &mut impl Rng) -> Vec3 {
    loop {
        let p = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let len_sq = p.length_squared();
        if len_sq > 1e-160 && len_sq <= 1.0 {
            return p.normalized();
        }
    }
}

/// Shirley's concentric-disk mapping: maps a unit square sample to the unit
/// disk with low area distortion, preserving stratification.
pub fn sample_concentric_disk(u: Vec2) -> Vec2 {
    let offset = Vec2::new(2.0 * u.x - 1.0, 2.0 * u.y - 1.0);
    if offset.x == 0.0 && offset.y == 0.0 {
        return Vec2::zero();
    }

    let (radius, theta) = if offset.x.abs() > offset.y.abs() {
        (offset.x, (PI / 4.0) * (offset.y / offset.x))
    } else {
        (
            offset.y,
            (PI / 2.0) - (PI / 4.0) * (offset.x / offset.y),
        )
    };
    Vec2::new(radius * theta.cos(), radius * theta.sin())
}

/// Cosine-weighted hemisphere sample in the `+z` hemisphere. `pdf = cosθ/π`.
pub fn sample_cosine_hemisphere(u: Vec2) -> Vec3 {
    let d = sample_concentric_disk(u);
    let z = (1.0 - d.x * d.x - d.y * d.y).max(0.0).sqrt();
    Vec3::new(d.x, d.y, z)
}

#[inline]
pub fn cosine_hemisphere_pdf(cos_theta: f64) -> f64 {
    cos_theta * std::f64::consts::FRAC_1_PI
}

/// Radial-polar uniform disk sample: `r = √u.x`, `θ = 2π·u.y`.
pub fn sample_uniform_disk_polar(u: Vec2) -> Vec2 {
    let r = u.x.sqrt();
    let theta = 2.0 * PI * u.y;
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// An orthonormal shading frame: `+z = normal`, `+x = tangent`,
/// `+y = bitangent = n × t`.
#[derive(Debug, Clone, Copy)]
pub struct ShadingFrame {
    pub tangent: Vec3,
    pub bitangent: Vec3,
    pub normal: Vec3,
}

impl ShadingFrame {
    pub fn new(tangent: Vec3, normal: Vec3) -> Self {
        let bitangent = normal.cross(tangent);
        Self {
            tangent,
            bitangent,
            normal,
        }
    }

    pub fn world_to_local(&self, world: Vec3) -> Vec3 {
        Vec3::new(
            world.dot(self.tangent),
            world.dot(self.bitangent),
            world.dot(self.normal),
        )
    }

    pub fn local_to_world(&self, local: Vec3) -> Vec3 {
        (self.tangent * local.x + self.bitangent * local.y + self.normal * local.z).normalized()
    }
}
