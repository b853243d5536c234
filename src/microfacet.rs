//! Anisotropic Trowbridge-Reitz (GGX) microfacet distribution, visible-normal
//! importance sampling, and the complex-IOR Fresnel term for conductors.

use crate::math::Vec3;
use crate::sampling::sample_uniform_disk_polar;
use std::f64::consts::PI;

#[inline]
fn cos2_theta(w: Vec3) -> f64 {
    w.z * w.z
}

#[inline]
fn sin2_theta(w: Vec3) -> f64 {
    (1.0 - cos2_theta(w)).max(0.0)
}

#[inline]
fn tan2_theta(w: Vec3) -> f64 {
    sin2_theta(w) / cos2_theta(w)
}

#[inline]
fn abs_cos_theta(w: Vec3) -> f64 {
    w.z.abs()
}

#[inline]
fn cos_phi(w: Vec3) -> f64 {
    let sin_theta = sin2_theta(w).sqrt();
    if sin_theta == 0.0 {
        1.0
    } else {
        (w.x / sin_theta).clamp(-1.0, 1.0)
    }
}

#[inline]
fn sin_phi(w: Vec3) -> f64 {
    let sin_theta = sin2_theta(w).sqrt();
    if sin_theta == 0.0 {
        0.0
    } else {
        (w.y / sin_theta).clamp(-1.0, 1.0)
    }
}

fn same_hemisphere(w: Vec3, wp: Vec3) -> bool {
    w.z * wp.z > 0.0
}

fn face_forward(v: Vec3, n: Vec3) -> Vec3 {
    if v.dot(n) < 0.0 { -v } else { v }
}

/// A single-channel complex number, used only for the conductor Fresnel term.
#[derive(Debug, Clone, Copy)]
struct Complex {
    re: f64,
    im: f64,
}

impl Complex {
    fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    fn norm(self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    fn sqrt(self) -> Self {
        let n = self.norm().sqrt();
        if n == 0.0 {
            return Complex::new(0.0, 0.0);
        }
        let t1 = (0.5 * (n + self.re.abs())).sqrt();
        let t2 = 0.5 * self.im / t1;
        if self.re >= 0.0 {
            Complex::new(t1, t2)
        } else {
            Complex::new(t2.abs(), t1.copysign(self.im))
        }
    }
}

impl std::ops::Sub<Complex> for f64 {
    type Output = Complex;
    fn sub(self, z: Complex) -> Complex {
        Complex::new(self - z.re, -z.im)
    }
}

impl std::ops::Mul<Complex> for f64 {
    type Output = Complex;
    fn mul(self, z: Complex) -> Complex {
        Complex::new(self * z.re, self * z.im)
    }
}

impl std::ops::Sub for Complex {
    type Output = Complex;
    fn sub(self, rhs: Complex) -> Complex {
        Complex::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl std::ops::Add for Complex {
    type Output = Complex;
    fn add(self, rhs: Complex) -> Complex {
        Complex::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl std::ops::Mul for Complex {
    type Output = Complex;
    fn mul(self, rhs: Complex) -> Complex {
        Complex::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

impl std::ops::Div for Complex {
    type Output = Complex;
    fn div(self, rhs: Complex) -> Complex {
        let scale = 1.0 / (rhs.re * rhs.re + rhs.im * rhs.im);
        Complex::new(
            scale * (self.re * rhs.re + self.im * rhs.im),
            scale * (self.im * rhs.re - self.re * rhs.im),
        )
    }
}

/// Unpolarized Fresnel reflectance for a conductor with complex IOR `eta + i·k`.
pub fn fr_complex(cos_theta_i: f64, eta: f64, k: f64) -> f64 {
    let cos_theta_i = cos_theta_i.clamp(0.0, 1.0);
    let eta = Complex::new(eta, k);

    let sin2_theta_i = 1.0 - cos_theta_i * cos_theta_i;
    let sin2_theta_t = sin2_theta_i / (eta * eta);
    let cos_theta_t = (1.0 - sin2_theta_t).sqrt();

    let r_parl = (cos_theta_i * eta - cos_theta_t) / (cos_theta_i * eta + cos_theta_t);
    let r_perp = (cos_theta_i - eta * cos_theta_t) / (cos_theta_i + eta * cos_theta_t);
    (r_parl.norm() + r_perp.norm()) / 2.0
}

/// Anisotropic GGX microfacet distribution over local-frame half-vectors.
#[derive(Debug, Clone, Copy)]
pub struct TrowbridgeReitz {
    pub alpha_x: f64,
    pub alpha_y: f64,
}

impl TrowbridgeReitz {
    pub fn new(alpha_x: f64, alpha_y: f64) -> Self {
        Self { alpha_x, alpha_y }
    }

    pub fn d(&self, wm: Vec3) -> f64 {
        let tan2 = tan2_theta(wm);
        if tan2.is_infinite() {
            return 0.0;
        }
        let cos4_theta = cos2_theta(wm) * cos2_theta(wm);
        let e = tan2
            * ((cos_phi(wm) / self.alpha_x).powi(2) + (sin_phi(wm) / self.alpha_y).powi(2));
        1.0 / (PI * self.alpha_x * self.alpha_y * cos4_theta * (1.0 + e) * (1.0 + e))
    }

    fn lambda(&self, w: Vec3) -> f64 {
        let tan2 = tan2_theta(w);
        if tan2.is_infinite() {
            return 0.0;
        }
        let alpha2 = (cos_phi(w) * self.alpha_x).powi(2) + (sin_phi(w) * self.alpha_y).powi(2);
        ((1.0 + alpha2 * tan2).sqrt() - 1.0) / 2.0
    }

    pub fn g1(&self, w: Vec3) -> f64 {
        1.0 / (1.0 + self.lambda(w))
    }

    pub fn g(&self, wo: Vec3, wi: Vec3) -> f64 {
        1.0 / (1.0 + self.lambda(wo) + self.lambda(wi))
    }

    fn d_visible(&self, w: Vec3, wm: Vec3) -> f64 {
        self.g1(w) / abs_cos_theta(w) * self.d(wm) * w.dot(wm).abs()
    }

    fn pdf_wm(&self, w: Vec3, wm: Vec3) -> f64 {
        self.d_visible(w, wm)
    }

    /// PDF of `wi` given `wo` under reflection through this distribution.
    pub fn pdf(&self, wo: Vec3, wi: Vec3) -> f64 {
        if !same_hemisphere(wo, wi) {
            return 0.0;
        }
        let wm = wo + wi;
        if wm.length_squared() == 0.0 {
            return 0.0;
        }
        let wm = face_forward(wm.normalized(), Vec3::new(0.0, 0.0, 1.0));
        self.pdf_wm(wo, wm) / (4.0 * wo.dot(wm).abs())
    }

    /// Visible-normal importance sample of the microfacet normal around `w`.
    pub fn sample_wm(&self, w: Vec3, u: crate::math::Vec2) -> Vec3 {
        let mut wh = Vec3::new(self.alpha_x * w.x, self.alpha_y * w.y, w.z).normalized();
        if wh.z < 0.0 {
            wh = -wh;
        }

        let t1 = if wh.z < 0.99999 {
            Vec3::new(0.0, 0.0, 1.0).cross(wh).normalized()
        } else {
            Vec3::new(1.0, 0.0, 0.0)
        };
        let t2 = wh.cross(t1);

        let mut p = sample_uniform_disk_polar(u);
        let h = (1.0 - p.x * p.x).sqrt();
        p.y = (1.0 - (1.0 + wh.z) / 2.0) * h + ((1.0 + wh.z) / 2.0) * p.y;

        let pz = (1.0 - (p.x * p.x + p.y * p.y)).max(0.0).sqrt();
        let nh = t1 * p.x + t2 * p.y + wh * pz;
        Vec3::new(self.alpha_x * nh.x, self.alpha_y * nh.y, nh.z.max(1e-6)).normalized()
    }
}
