//! The `Hittable` capability set shared by triangles, primitive lists, and
//! BVH nodes.
//!
//! The set of implementors is closed (`Triangle`, `PrimitiveList`, `Bvh`), so
//! this is a plain trait rather than an open inheritance hierarchy — any of
//! the three can stand in for `world` or `lights` at the integrator boundary.

use crate::aabb::Aabb;
use crate::interval::Interval;
use crate::material::Material;
use crate::math::{Point3, Ray, Vec2, Vec3};
use rand::RngCore;
use std::sync::Arc;

/// Everything the integrator needs about a ray/surface intersection.
#[derive(Clone)]
pub struct HitRecord {
    pub position: Point3,
    pub t: f64,
    pub normal: Vec3,
    pub tangent: Vec3,
    pub uv: Vec2,
    pub material: Arc<Material>,
    pub front_face: bool,
}

impl HitRecord {
    /// Orients `normal` against `ray` and records which side was hit.
    /// `outward_normal` must already be unit length.
    pub fn set_face_normal(ray: &Ray, outward_normal: Vec3) -> (Vec3, bool) {
        let front_face = ray.direction.dot(outward_normal) < 0.0;
        let normal = if front_face {
            outward_normal
        } else {
            -outward_normal
        };
        (normal, front_face)
    }
}

pub trait Hittable: Send + Sync {
    fn hit(&self, ray: &Ray, domain: Interval) -> Option<HitRecord>;
    fn bounding_box(&self) -> Aabb;
    fn area(&self) -> f64;

    /// Uniform surface sample visible from `origin`. Returns the sample's
    /// `HitRecord` (normal oriented against the ray from `origin`) and the
    /// area-measure pdf `1/area` of that single sample, unless overridden by
    /// an aggregate with its own sampling weights.
    fn sample(&self, origin: Point3, rng: &mut dyn RngCore) -> (HitRecord, f64);
}
