//! Single-triangle geometry: plane-equation intersection and uniform area
//! sampling. This is the plane/barycentric-weight form, not Moller-Trumbore.

use crate::aabb::Aabb;
use crate::hittable::{HitRecord, Hittable};
use crate::interval::Interval;
use crate::material::Material;
use crate::math::{Point3, Ray, Vec2, Vec3};
use crate::sampling::random_unit_01;
use rand::RngCore;
use std::sync::Arc;

#[derive(Clone)]
pub struct Triangle {
    pub vertices: [Point3; 3],
    pub uvs: [Vec2; 3],
    pub material: Arc<Material>,
    edges: [Vec3; 2],
    normal: Vec3,
    tangent: Vec3,
    area: f64,
    /// Plane offset: `D = normal . v0`.
    plane_d: f64,
    /// Barycentric weight vector `w = n / (n.n)`.
    w: Vec3,
    bbox: Aabb,
}

impl Triangle {
    /// Builds plane/tangent/area/bbox once at construction, matching the
    /// precomputation `Triangle`'s C++ constructor performs. UV deltas that
    /// are (near-)collinear fall back to the default unit-square mapping
    /// `(0,0), (1,0), (1,1)` so the tangent stays well-defined.
    pub fn new(vertices: [Point3; 3], uvs: [Vec2; 3], material: Arc<Material>) -> Self {
        let e0 = vertices[1] - vertices[0];
        let e1 = vertices[2] - vertices[0];
        let n = e0.cross(e1);
        let normal = n.normalized();

        let delta_uv0 = uvs[1] - uvs[0];
        let delta_uv1 = uvs[2] - uvs[0];
        let denom = delta_uv0.x * delta_uv1.y - delta_uv1.x * delta_uv0.y;
        let uvs = if denom.abs() < 1e-12 {
            [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)]
        } else {
            uvs
        };
        let delta_uv0 = uvs[1] - uvs[0];
        let delta_uv1 = uvs[2] - uvs[0];
        let f = 1.0 / (delta_uv0.x * delta_uv1.y - delta_uv1.x * delta_uv0.y);
        let tangent = Vec3::new(
            f * (delta_uv1.y * e0.x - delta_uv0.y * e1.x),
            f * (delta_uv1.y * e0.y - delta_uv0.y * e1.y),
            f * (delta_uv1.y * e0.z - delta_uv0.y * e1.z),
        )
        .normalized();

        let area = n.length() * 0.5;
        let plane_d = normal.dot(vertices[0]);
        let w = n / n.dot(n);
        let bbox = Aabb::surrounding(
            Aabb::from_corners(vertices[0], vertices[1]),
            Aabb::from_corners(vertices[0], vertices[2]),
        );

        Self {
            vertices,
            uvs,
            material,
            edges: [e0, e1],
            normal,
            tangent,
            area,
            plane_d,
            w,
            bbox,
        }
    }

    fn is_interior(&self, alpha: f64, beta: f64) -> Option<Vec2> {
        if alpha < 0.0 || beta < 0.0 || alpha + beta > 1.0 {
            return None;
        }
        Some(self.uvs[0] * (1.0 - alpha - beta) + self.uvs[1] * alpha + self.uvs[2] * beta)
    }
}

impl Hittable for Triangle {
    fn hit(&self, ray: &Ray, domain: Interval) -> Option<HitRecord> {
        let denom = self.normal.dot(ray.direction);
        if denom.abs() < 1e-8 {
            return None;
        }
        let t = (self.plane_d - self.normal.dot(ray.origin)) / denom;
        if !domain.contains(t) {
            return None;
        }

        let p = ray.at(t);
        let v0p = p - self.vertices[0];
        let alpha = self.w.dot(v0p.cross(self.edges[1]));
        let beta = self.w.dot(self.edges[0].cross(v0p));
        let uv = self.is_interior(alpha, beta)?;

        let (normal, front_face) = HitRecord::set_face_normal(ray, self.normal);
        Some(HitRecord {
            position: p,
            t,
            normal,
            tangent: self.tangent,
            uv,
            material: self.material.clone(),
            front_face,
        })
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn area(&self) -> f64 {
        self.area
    }

    fn sample(&self, origin: Point3, rng: &mut dyn RngCore) -> (HitRecord, f64) {
        let x = random_unit_01(rng).sqrt();
        let y = random_unit_01(rng);
        let p = self.vertices[0] * (1.0 - x) + self.vertices[1] * (x * (1.0 - y)) + self.vertices[2] * (x * y);
        let direction = p - origin;
        let (normal, front_face) = HitRecord::set_face_normal(&Ray::new(origin, direction), self.normal);
        let record = HitRecord {
            position: p,
            t: direction.length(),
            normal,
            tangent: self.tangent,
            uv: Vec2::zero(),
            material: self.material.clone(),
            front_face,
        };
        (record, 1.0 / self.area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::Texture;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn flat_triangle() -> Triangle {
        Triangle::new(
            [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)],
            Arc::new(Material::lambertian(Arc::new(Texture::solid(Vec3::ones())))),
        )
    }

    #[test]
    fn scenario_triangle_intersection() {
        let tri = flat_triangle();
        let ray = Ray::new(Point3::new(0.25, 0.25, 1.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = tri.hit(&ray, Interval::new(0.0, f64::INFINITY)).unwrap();
        assert!((hit.t - 1.0).abs() < 1e-9);
        assert!((hit.position.x - 0.25).abs() < 1e-9);
        assert!((hit.position.y - 0.25).abs() < 1e-9);
        assert!((hit.position.z - 0.0).abs() < 1e-9);
    }

    #[test]
    fn sample_point_is_reachable_from_origin() {
        let tri = flat_triangle();
        let mut rng = SmallRng::seed_from_u64(5);
        let origin = Point3::new(0.2, 0.2, 2.0);
        for _ in 0..200 {
            let (record, pdf) = tri.sample(origin, &mut rng);
            assert!(pdf > 0.0);
            let dir = record.position - origin;
            let ray = Ray::new(origin, dir);
            let hit = tri.hit(&ray, Interval::new(0.0, f64::INFINITY));
            let hit = hit.expect("sampled point must lie on the triangle");
            assert!(hit.t <= 1.0 + 1e-6);
        }
    }

    #[test]
    fn degenerate_uv_falls_back_to_unit_square() {
        let tri = Triangle::new(
            [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            [Vec2::new(0.0, 0.0), Vec2::new(0.0, 0.0), Vec2::new(0.0, 0.0)],
            Arc::new(Material::lambertian(Arc::new(Texture::solid(Vec3::ones())))),
        );
        assert_eq!(tri.uvs, [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)]);
    }
}
