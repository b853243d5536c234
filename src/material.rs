//! BSDF variants. Each exposes the same small capability set —
//! `sample`/`eval`/`pdf`/`emitted`/`scatter` — as a closed enum rather than a
//! trait-object hierarchy, since the set of variants is fixed.

use crate::math::{Color, Point3, Ray, Vec2, Vec3};
use crate::microfacet::{fr_complex, TrowbridgeReitz};
use crate::sampling::{random_unit_01, sample_cosine_hemisphere, ShadingFrame};
use crate::texture::Texture;
use rand::Rng;
use std::f64::consts::PI;
use std::sync::Arc;

const INV_PI: f64 = std::f64::consts::FRAC_1_PI;
const INV_2PI: f64 = 1.0 / (2.0 * PI);

/// Everything a `sample`/`eval`/`pdf` call needs about the shading point.
pub struct MaterialEvalContext {
    pub p: Point3,
    pub uv: Vec2,
    /// Outgoing direction (point -> eye), already in the local shading frame.
    pub wo: Vec3,
    pub frame: ShadingFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFlags {
    Unset,
    Diffuse,
    Specular,
    GlossyReflection,
}

#[derive(Debug, Clone, Copy)]
pub struct MaterialSampleContext {
    pub wi: Vec3,
    pub wm: Vec3,
    pub f: Color,
    pub pdf: f64,
    pub flags: SampleFlags,
}

impl Default for MaterialSampleContext {
    fn default() -> Self {
        Self {
            wi: Vec3::zero(),
            wm: Vec3::zero(),
            f: Color::zero(),
            pdf: 0.0,
            flags: SampleFlags::Unset,
        }
    }
}

#[inline]
fn local_reflect(wo: Vec3, n: Vec3) -> Vec3 {
    -wo + n * 2.0 * wo.dot(n)
}

#[derive(Debug, Clone)]
pub struct PhongReflectance {
    pub kd: Arc<Texture>,
    pub ks: Arc<Texture>,
    pub ns: f64,
    pkd: f64,
    pks: f64,
}

impl PhongReflectance {
    pub fn new(kd: Arc<Texture>, ks: Arc<Texture>, ns: f64) -> Self {
        let (pkd, pks) = if ns <= 1.0 { (1.0, 0.0) } else { (0.6, 0.4) };
        Self {
            kd,
            ks,
            ns,
            pkd,
            pks,
        }
    }

    fn diffuse_pdf(&self, wi: Vec3) -> f64 {
        wi.z * INV_PI
    }

    fn specular_pdf(&self, wi: Vec3, ctx: &MaterialEvalContext) -> f64 {
        if wi.z <= 0.0 {
            return 0.0;
        }
        let r = local_reflect(ctx.wo, Vec3::new(0.0, 0.0, 1.0)).normalized();
        let cos_alpha = wi.dot(r);
        if cos_alpha <= 0.0 {
            return 0.0;
        }
        (self.ns + 1.0) * INV_2PI * cos_alpha.powf(self.ns)
    }
}

#[derive(Debug, Clone)]
pub struct CookTorrance {
    #[allow(dead_code)]
    pub texture: Arc<Texture>,
    pub distribution: TrowbridgeReitz,
    pub eta: Color,
    pub k: Color,
}

#[derive(Debug, Clone)]
pub enum Material {
    Lambertian { texture: Arc<Texture> },
    DiffuseLight { texture: Arc<Texture> },
    Phong(PhongReflectance),
    PerfectMirror,
    CookTorrance(CookTorrance),
    DebugMaterial { texture: Arc<Texture> },
}

impl Material {
    pub fn lambertian(texture: Arc<Texture>) -> Self {
        Material::Lambertian { texture }
    }

    pub fn diffuse_light(texture: Arc<Texture>) -> Self {
        Material::DiffuseLight { texture }
    }

    pub fn phong(kd: Arc<Texture>, ks: Arc<Texture>, ns: f64) -> Self {
        Material::Phong(PhongReflectance::new(kd, ks, ns))
    }

    pub fn perfect_mirror() -> Self {
        Material::PerfectMirror
    }

    pub fn cook_torrance(
        texture: Arc<Texture>,
        alpha_x: f64,
        alpha_y: f64,
        eta: Color,
        k: Color,
    ) -> Self {
        Material::CookTorrance(CookTorrance {
            texture,
            distribution: TrowbridgeReitz::new(alpha_x, alpha_y),
            eta,
            k,
        })
    }

    pub fn debug(texture: Arc<Texture>) -> Self {
        Material::DebugMaterial { texture }
    }

    pub fn emitted(&self, uv: Vec2, p: Point3) -> Color {
        match self {
            Material::DiffuseLight { texture } => texture.value(uv, p),
            Material::DebugMaterial { texture } => texture.value(uv, p),
            _ => Color::zero(),
        }
    }

    pub fn has_emission(&self) -> bool {
        matches!(self, Material::DiffuseLight { .. } | Material::DebugMaterial { .. })
    }

    pub fn emission(&self) -> Color {
        self.emitted(Vec2::zero(), Point3::zero())
    }

    pub fn skip_light_sampling(&self) -> bool {
        match self {
            Material::PerfectMirror => true,
            Material::Phong(p) => p.ns > 1.0,
            _ => false,
        }
    }

    /// Samples an incident direction in the local frame; `wi.z <= 0` means
    /// the sample is below the hemisphere and carries zero contribution.
    pub fn sample(&self, ctx: &MaterialEvalContext, rng: &mut impl Rng) -> MaterialSampleContext {
        match self {
            Material::Lambertian { texture } => {
                let mut wi = sample_cosine_hemisphere(crate::sampling::random_unit_01_pair(rng));
                while wi.z <= 0.0 {
                    wi = sample_cosine_hemisphere(crate::sampling::random_unit_01_pair(rng));
                }
                let pdf = wi.z * INV_PI;
                let f = texture.value(ctx.uv, ctx.p) * INV_PI;
                MaterialSampleContext {
                    wi,
                    wm: Vec3::zero(),
                    f,
                    pdf,
                    flags: SampleFlags::Diffuse,
                }
            }
            Material::DiffuseLight { .. } => MaterialSampleContext::default(),
            Material::Phong(p) => {
                let u = random_unit_01(rng);
                if u < p.pkd {
                    let mut wi =
                        sample_cosine_hemisphere(crate::sampling::random_unit_01_pair(rng));
                    while wi.z <= 0.0 {
                        wi = sample_cosine_hemisphere(crate::sampling::random_unit_01_pair(rng));
                    }
                    let f = p.kd.value(ctx.uv, ctx.p) * INV_PI;
                    let pdf = self.pdf(wi, ctx);
                    MaterialSampleContext {
                        wi,
                        wm: Vec3::zero(),
                        f,
                        pdf,
                        flags: SampleFlags::Diffuse,
                    }
                } else if u < p.pkd + p.pks {
                    let u1 = random_unit_01(rng);
                    let u2 = random_unit_01(rng);
                    let alpha = u1.powf(1.0 / (p.ns + 1.0)).acos();
                    let phi = 2.0 * PI * u2;
                    let (sin_a, cos_a) = alpha.sin_cos();
                    let (sin_p, cos_p) = phi.sin_cos();
                    let reflect_wi = Vec3::new(sin_a * cos_p, sin_a * sin_p, cos_a);

                    let r = local_reflect(ctx.wo, Vec3::new(0.0, 0.0, 1.0)).normalized();
                    let v = if r.x.abs() > 0.9 {
                        Vec3::new(0.0, 1.0, 0.0)
                    } else {
                        Vec3::new(1.0, 0.0, 0.0)
                    };
                    let t = v.cross(r).normalized();
                    let b = r.cross(t);
                    let wi = (t * reflect_wi.x + b * reflect_wi.y + r * reflect_wi.z).normalized();

                    let f = if wi.z > 0.0 {
                        let cos_alpha = wi.dot(r).max(0.0);
                        if cos_alpha > 0.0 {
                            p.ks.value(ctx.uv, ctx.p) * (p.ns + 2.0) * INV_2PI * cos_alpha.powf(p.ns)
                        } else {
                            Color::zero()
                        }
                    } else {
                        Color::zero()
                    };
                    let pdf = self.pdf(wi, ctx);
                    MaterialSampleContext {
                        wi,
                        wm: Vec3::zero(),
                        f,
                        pdf,
                        flags: SampleFlags::Specular,
                    }
                } else {
                    MaterialSampleContext::default()
                }
            }
            Material::PerfectMirror => {
                let wi = local_reflect(ctx.wo, Vec3::new(0.0, 0.0, 1.0));
                let cos_theta = wi.z;
                MaterialSampleContext {
                    wi,
                    wm: Vec3::zero(),
                    f: Color::ones() / cos_theta,
                    pdf: 1.0,
                    flags: SampleFlags::Specular,
                }
            }
            Material::CookTorrance(ct) => {
                if ctx.wo.z == 0.0 {
                    return MaterialSampleContext::default();
                }
                let u = crate::sampling::random_unit_01_pair(rng);
                let wm = ct.distribution.sample_wm(ctx.wo, u);
                let wi = local_reflect(ctx.wo, wm);
                if ctx.wo.z * wi.z <= 0.0 {
                    return MaterialSampleContext::default();
                }
                let pdf = ct.distribution.pdf(ctx.wo, wi);
                let cos_theta_o = ctx.wo.z.abs();
                let cos_theta_i = wi.z.abs();
                if cos_theta_i == 0.0 || cos_theta_o == 0.0 {
                    return MaterialSampleContext::default();
                }
                let cos_wo_wm = ctx.wo.dot(wm).abs();
                let f = Color::new(
                    fr_complex(cos_wo_wm, ct.eta.x, ct.k.x),
                    fr_complex(cos_wo_wm, ct.eta.y, ct.k.y),
                    fr_complex(cos_wo_wm, ct.eta.z, ct.k.z),
                ) * (ct.distribution.d(wm) * ct.distribution.g(ctx.wo, wi)
                    / (4.0 * cos_theta_i * cos_theta_o));
                MaterialSampleContext {
                    wi,
                    wm,
                    f,
                    pdf,
                    flags: SampleFlags::GlossyReflection,
                }
            }
            Material::DebugMaterial { .. } => MaterialSampleContext::default(),
        }
    }

    /// Deterministic BSDF evaluation for a known `wi`. For `PhongReflectance`
    /// this sums both lobes' contributions rather than redrawing a random
    /// number to choose one, so repeated calls for the same `wi` agree.
    pub fn eval(&self, wi: Vec3, ctx: &MaterialEvalContext) -> Color {
        match self {
            Material::Lambertian { texture } => texture.value(ctx.uv, ctx.p) * INV_PI,
            Material::DiffuseLight { .. } => Color::zero(),
            Material::Phong(p) => {
                if wi.z <= 0.0 {
                    return Color::zero();
                }
                let mut f = Color::zero();
                if p.pkd > 0.0 {
                    f += p.kd.value(ctx.uv, ctx.p) * INV_PI;
                }
                if p.pks > 0.0 {
                    let r = local_reflect(ctx.wo, Vec3::new(0.0, 0.0, 1.0)).normalized();
                    let cos_alpha = wi.dot(r).max(0.0);
                    if cos_alpha > 0.0 {
                        f += p.ks.value(ctx.uv, ctx.p)
                            * (p.ns + 2.0)
                            * INV_2PI
                            * cos_alpha.powf(p.ns);
                    }
                }
                f
            }
            Material::PerfectMirror => Color::zero(),
            Material::CookTorrance(ct) => {
                if ctx.wo.z * wi.z <= 0.0 {
                    return Color::zero();
                }
                let cos_theta_o = ctx.wo.z.abs();
                let cos_theta_i = wi.z.abs();
                if cos_theta_i == 0.0 || cos_theta_o == 0.0 {
                    return Color::zero();
                }
                let wm_raw = wi + ctx.wo;
                if wm_raw.length_squared() == 0.0 {
                    return Color::zero();
                }
                let wm = wm_raw.normalized();
                let cos_wo_wm = ctx.wo.dot(wm).abs();
                Color::new(
                    fr_complex(cos_wo_wm, ct.eta.x, ct.k.x),
                    fr_complex(cos_wo_wm, ct.eta.y, ct.k.y),
                    fr_complex(cos_wo_wm, ct.eta.z, ct.k.z),
                ) * (ct.distribution.d(wm) * ct.distribution.g(ctx.wo, wi)
                    / (4.0 * cos_theta_i * cos_theta_o))
            }
            Material::DebugMaterial { .. } => Color::zero(),
        }
    }

    pub fn pdf(&self, wi: Vec3, ctx: &MaterialEvalContext) -> f64 {
        match self {
            Material::Lambertian { .. } => wi.z * INV_PI,
            Material::DiffuseLight { .. } => 0.0,
            Material::Phong(p) => {
                if wi.z <= 0.0 {
                    return 0.0;
                }
                p.pkd * p.diffuse_pdf(wi) + p.pks * p.specular_pdf(wi, ctx)
            }
            Material::PerfectMirror => 1.0,
            Material::CookTorrance(ct) => ct.distribution.pdf(ctx.wo, wi),
            Material::DebugMaterial { .. } => 0.0,
        }
    }

    /// Convenience wrapper used by the integrator: samples, then builds the
    /// world-space scattered ray and `attenuation = f·cosθ/pdf`. `None` means
    /// the material absorbed (no valid scattered direction).
    pub fn scatter(
        &self,
        ray_in: &Ray,
        position: Point3,
        frame: ShadingFrame,
        uv: Vec2,
        rng: &mut impl Rng,
    ) -> Option<(Ray, Color)> {
        let wo = frame.world_to_local(-ray_in.direction).normalized();
        let ctx = MaterialEvalContext {
            p: position,
            uv,
            wo,
            frame,
        };
        let sample = self.sample(&ctx, rng);
        if sample.flags == SampleFlags::Unset {
            return None;
        }
        let cos_theta = sample.wi.z;
        let attenuation = if sample.pdf > 0.0 && cos_theta > 0.0 {
            sample.f * cos_theta / sample.pdf
        } else {
            Color::zero()
        };
        let scattered = Ray::new(position, frame.local_to_world(sample.wi));
        Some((scattered, attenuation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::Texture;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn frame() -> ShadingFrame {
        ShadingFrame::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0))
    }

    #[test]
    fn lambertian_pdf_matches_sample_pdf() {
        let mat = Material::lambertian(Arc::new(Texture::solid(Color::new(0.8, 0.8, 0.8))));
        let mut rng = SmallRng::seed_from_u64(1);
        let ctx = MaterialEvalContext {
            p: Point3::zero(),
            uv: Vec2::zero(),
            wo: Vec3::new(0.0, 0.0, 1.0),
            frame: frame(),
        };
        for _ in 0..100 {
            let s = mat.sample(&ctx, &mut rng);
            let pdf = mat.pdf(s.wi, &ctx);
            assert!((pdf - s.pdf).abs() < 1e-9);
        }
    }

    #[test]
    fn cook_torrance_pdf_matches_sample_pdf() {
        let mat = Material::cook_torrance(
            Arc::new(Texture::solid(Color::new(0.9, 0.9, 0.9))),
            0.3,
            0.3,
            Color::new(0.2, 0.92, 1.1),
            Color::new(3.9, 2.45, 2.14),
        );
        let mut rng = SmallRng::seed_from_u64(3);
        let ctx = MaterialEvalContext {
            p: Point3::zero(),
            uv: Vec2::zero(),
            wo: Vec3::new(0.2, 0.1, 0.96).normalized(),
            frame: frame(),
        };
        let mut checked = 0;
        while checked < 50 {
            let s = mat.sample(&ctx, &mut rng);
            if s.flags == SampleFlags::Unset {
                continue;
            }
            let pdf = mat.pdf(s.wi, &ctx);
            assert!((pdf - s.pdf).abs() < 1e-9);
            checked += 1;
        }
    }

    #[test]
    fn phong_pdf_matches_sample_pdf() {
        let mat = Material::phong(
            Arc::new(Texture::solid(Color::new(0.5, 0.5, 0.5))),
            Arc::new(Texture::solid(Color::new(0.5, 0.5, 0.5))),
            32.0,
        );
        let mut rng = SmallRng::seed_from_u64(4);
        let ctx = MaterialEvalContext {
            p: Point3::zero(),
            uv: Vec2::zero(),
            wo: Vec3::new(0.0, 0.0, 1.0),
            frame: frame(),
        };
        for _ in 0..100 {
            let s = mat.sample(&ctx, &mut rng);
            let pdf = mat.pdf(s.wi, &ctx);
            assert!((pdf - s.pdf).abs() < 1e-9);
        }
    }

    #[test]
    fn mirror_attenuation_is_unity() {
        let mat = Material::perfect_mirror();
        let ray = Ray::new(Point3::zero(), Vec3::new(0.0, 0.0, -1.0));
        let mut rng = SmallRng::seed_from_u64(2);
        let (_, attenuation) = mat
            .scatter(&ray, Point3::zero(), frame(), Vec2::zero(), &mut rng)
            .expect("mirror always scatters");
        assert!((attenuation.x - 1.0).abs() < 1e-9);
        assert!((attenuation.y - 1.0).abs() < 1e-9);
        assert!((attenuation.z - 1.0).abs() < 1e-9);
    }

    #[test]
    fn phong_eval_is_deterministic_across_repeated_calls() {
        let mat = Material::phong(
            Arc::new(Texture::solid(Color::new(0.5, 0.5, 0.5))),
            Arc::new(Texture::solid(Color::new(0.5, 0.5, 0.5))),
            32.0,
        );
        let ctx = MaterialEvalContext {
            p: Point3::zero(),
            uv: Vec2::zero(),
            wo: Vec3::new(0.0, 0.0, 1.0),
            frame: frame(),
        };
        let wi = Vec3::new(0.1, 0.0, 0.99).normalized();
        let a = mat.eval(wi, &ctx);
        let b = mat.eval(wi, &ctx);
        assert_eq!(a, b);
    }

    #[test]
    fn debug_material_emits_its_albedo() {
        let mat = Material::debug(Arc::new(Texture::solid(Color::new(1.0, 0.5, 0.25))));
        assert!(mat.has_emission());
        assert_eq!(mat.emission(), Color::new(1.0, 0.5, 0.25));
    }
}
