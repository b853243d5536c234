//! Pinhole camera: orthonormal view basis plus deterministic primary-ray
//! generation — no lens jitter; pixel centers are fixed.

use crate::math::{Point3, Ray, Vec3};

pub struct CameraConfig {
    pub eye: Point3,
    pub look_at: Point3,
    pub up: Vec3,
    pub fovy_degrees: f64,
    pub image_width: u32,
    pub image_height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: Point3::new(0.0, 0.0, 0.0),
            look_at: Point3::new(0.0, 0.0, -1.0),
            up: Vec3::unit_y(),
            fovy_degrees: 90.0,
            image_width: 100,
            image_height: 100,
        }
    }
}

pub struct Camera {
    eye: Point3,
    pixel00: Point3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
}

impl Camera {
    pub fn new(config: &CameraConfig) -> Self {
        let image_width = config.image_width.max(1) as f64;
        let image_height = config.image_height.max(1) as f64;
        let aspect_ratio = image_width / image_height;

        let focal_length = (config.eye - config.look_at).length();
        let theta = config.fovy_degrees.to_radians();
        let h = (theta / 2.0).tan();

        let viewport_height = 2.0 * h * focal_length;
        let viewport_width = viewport_height * aspect_ratio;

        let w = (config.eye - config.look_at).normalized();
        let u = config.up.cross(w).normalized();
        let v = w.cross(u);

        let viewport_u = u * viewport_width;
        let viewport_v = -v * viewport_height;

        let pixel_delta_u = viewport_u / image_width;
        let pixel_delta_v = viewport_v / image_height;

        let viewport_upper_left =
            config.eye - w * focal_length - viewport_u / 2.0 - viewport_v / 2.0;
        let pixel00 = viewport_upper_left + (pixel_delta_u + pixel_delta_v) * 0.5;

        Self {
            eye: config.eye,
            pixel00,
            pixel_delta_u,
            pixel_delta_v,
        }
    }

    /// Ray through the center of pixel `(i, j)`. Deterministic: no sub-pixel
    /// jitter.
    pub fn get_ray(&self, i: u32, j: u32) -> Ray {
        let pixel_sample =
            self.pixel00 + self.pixel_delta_u * i as f64 + self.pixel_delta_v * j as f64;
        Ray::new(self.eye, pixel_sample - self.eye)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_ray_points_straight_down_view_axis() {
        let config = CameraConfig {
            eye: Point3::new(0.0, 0.0, 5.0),
            look_at: Point3::zero(),
            up: Vec3::unit_y(),
            fovy_degrees: 90.0,
            image_width: 101,
            image_height: 101,
        };
        let camera = Camera::new(&config);
        let ray = camera.get_ray(50, 50);
        let dir = ray.direction.normalized();
        assert!((dir.x).abs() < 1e-6);
        assert!((dir.y).abs() < 1e-6);
        assert!(dir.z < 0.0);
    }

    #[test]
    fn adjacent_pixel_rays_diverge() {
        let camera = Camera::new(&CameraConfig::default());
        let a = camera.get_ray(0, 0);
        let b = camera.get_ray(1, 0);
        assert!((a.direction - b.direction).length() > 1e-9);
    }
}
