//! Flat aggregate over heterogeneous `Hittable`s: linear-scan hit, and
//! area-proportional sample dispatch.
//!
//! Note the pdf returned by `sample` is the child's own `1/area`, *not*
//! renormalized by the list's total area; `Bvh::sample` is the aggregate
//! that actually divides by its own total area.

use crate::aabb::Aabb;
use crate::hittable::{HitRecord, Hittable};
use crate::interval::Interval;
use crate::math::{Point3, Ray};
use crate::sampling::random_unit_01;
use rand::RngCore;

pub struct PrimitiveList {
    objects: Vec<Box<dyn Hittable>>,
    bbox: Aabb,
    area: f64,
}

impl PrimitiveList {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            bbox: Aabb::EMPTY,
            area: 0.0,
        }
    }

    pub fn add(&mut self, object: Box<dyn Hittable>) {
        self.area += object.area();
        self.bbox = Aabb::surrounding(self.bbox, object.bounding_box());
        self.objects.push(object);
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Default for PrimitiveList {
    fn default() -> Self {
        Self::new()
    }
}

impl Hittable for PrimitiveList {
    fn hit(&self, ray: &Ray, domain: Interval) -> Option<HitRecord> {
        let mut closest = domain.max;
        let mut best: Option<HitRecord> = None;
        for object in &self.objects {
            if let Some(record) = object.hit(ray, Interval::new(domain.min, closest)) {
                closest = record.t;
                best = Some(record);
            }
        }
        best
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn area(&self) -> f64 {
        self.area
    }

    fn sample(&self, origin: Point3, rng: &mut dyn RngCore) -> (HitRecord, f64) {
        let target = random_unit_01(rng) * self.area;
        let mut cumulative = 0.0;
        for object in &self.objects {
            cumulative += object.area();
            if target <= cumulative {
                return object.sample(origin, rng);
            }
        }
        self.objects
            .last()
            .expect("sample called on an empty PrimitiveList")
            .sample(origin, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use crate::math::{Point3, Vec2, Vec3};
    use crate::texture::Texture;
    use crate::triangle::Triangle;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn triangle_at(x: f64) -> Triangle {
        Triangle::new(
            [
                Point3::new(x, 0.0, 0.0),
                Point3::new(x + 1.0, 0.0, 0.0),
                Point3::new(x, 1.0, 0.0),
            ],
            [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)],
            Arc::new(Material::lambertian(Arc::new(Texture::solid(Vec3::ones())))),
        )
    }

    #[test]
    fn area_is_sum_of_children() {
        let mut list = PrimitiveList::new();
        list.add(Box::new(triangle_at(0.0)));
        list.add(Box::new(triangle_at(10.0)));
        assert!((list.area() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sample_always_lands_on_some_child() {
        let mut list = PrimitiveList::new();
        list.add(Box::new(triangle_at(0.0)));
        list.add(Box::new(triangle_at(10.0)));
        let mut rng = SmallRng::seed_from_u64(9);
        for _ in 0..200 {
            let (_, pdf) = list.sample(Point3::new(0.0, 0.0, 5.0), &mut rng);
            assert!(pdf > 0.0);
        }
    }
}
