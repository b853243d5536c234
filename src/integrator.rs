//! The recursive radiance estimator and its scanline-partitioned thread
//! pool. Next-event estimation is added to BSDF-sampled indirect light
//! without MIS weights, and paths are terminated by Russian roulette.

use crate::camera::Camera;
use crate::hittable::Hittable;
use crate::image_io::Framebuffer;
use crate::interval::Interval;
use crate::math::{Color, Ray};
use crate::sampling::{random_unit_01, ShadingFrame};
use log::info;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU32, Ordering};

/// `t` below which a primary ray is considered to originate exactly at a
/// surface, avoiding self-intersection.
const PRIMARY_EPSILON: f64 = 1e-4;
/// Shadow-ray epsilon, slightly looser than the primary-ray epsilon.
const SHADOW_EPSILON: f64 = 1e-3;
/// Visibility tolerance: the light sample counts as unoccluded only if the
/// nearest shadow-ray hit lands within this of the light itself.
const VISIBILITY_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub samples_per_pixel: u32,
    pub max_depth: i32,
    pub threads: usize,
    pub russian_roulette: f64,
    pub b_sample_lights: bool,
    pub background: Color,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 1,
            max_depth: 10,
            threads: 16,
            russian_roulette: 0.8,
            b_sample_lights: true,
            background: Color::zero(),
        }
    }
}

/// One term of the recursive estimator. `depth` counts remaining bounces.
fn ray_color(
    ray: &Ray,
    depth: i32,
    world: &dyn Hittable,
    lights: &dyn Hittable,
    config: &RenderConfig,
    rng: &mut SmallRng,
) -> Color {
    if depth < 0 {
        return Color::zero();
    }

    let Some(hit) = world.hit(ray, Interval::new(PRIMARY_EPSILON, f64::INFINITY)) else {
        return config.background;
    };

    if hit.material.has_emission() {
        return hit.material.emission();
    }

    let frame = ShadingFrame::new(hit.tangent, hit.normal);
    let wo = frame.world_to_local(-ray.direction).normalized();

    let mut direct = Color::zero();
    if config.b_sample_lights && !hit.material.skip_light_sampling() {
        let (light_record, pdf_lights) = lights.sample(hit.position, rng);
        let light_direction = (light_record.position - hit.position).normalized();
        let distance = (light_record.position - hit.position).length();

        let shadow_ray = Ray::new(hit.position, light_direction);
        let shadow_hit = world.hit(&shadow_ray, Interval::new(SHADOW_EPSILON, f64::INFINITY));

        let visible = hit.normal.dot(light_direction) > 0.0
            && light_record.front_face
            && shadow_hit
                .as_ref()
                .is_some_and(|n| distance - (hit.position - n.position).length() < VISIBILITY_TOLERANCE);

        if visible {
            let emission = light_record.material.emission();
            let local_wi = frame.world_to_local(light_direction);
            let local_light_normal = frame.world_to_local(light_record.normal);
            let ctx = crate::material::MaterialEvalContext {
                p: hit.position,
                uv: hit.uv,
                wo,
                frame,
            };
            let fr = hit.material.eval(local_wi, &ctx);
            let cos_theta = local_wi.z;
            let cos_theta_bar = local_light_normal.dot(-local_wi);
            direct = emission.hadamard(fr) * cos_theta * cos_theta_bar
                / (distance * distance)
                / pdf_lights;
        }
    }

    let mut scatter = Color::zero();
    if random_unit_01(rng) < config.russian_roulette {
        if let Some((scattered_ray, attenuation)) =
            hit.material.scatter(ray, hit.position, frame, hit.uv, rng)
        {
            if config.b_sample_lights {
                let scatter_hit =
                    world.hit(&scattered_ray, Interval::new(PRIMARY_EPSILON, f64::INFINITY));
                if let Some(scatter_hit) = scatter_hit {
                    let should_recurse = !scatter_hit.material.has_emission()
                        || hit.material.skip_light_sampling();
                    if should_recurse {
                        let recursive =
                            ray_color(&scattered_ray, depth - 1, world, lights, config, rng);
                        scatter = attenuation.hadamard(recursive) / config.russian_roulette;
                    }
                }
            } else {
                let recursive = ray_color(&scattered_ray, depth - 1, world, lights, config, rng);
                scatter = attenuation.hadamard(recursive) / config.russian_roulette;
            }
        }
    }

    direct + scatter
}

/// Renders `world`/`lights` through `camera` into a freshly-allocated
/// framebuffer, partitioning rows across `config.threads` OS threads. Each
/// thread seeds its own RNG — no RNG state is shared.
pub fn render(
    camera: &Camera,
    world: &(dyn Hittable + Sync),
    lights: &(dyn Hittable + Sync),
    config: &RenderConfig,
    width: u32,
    height: u32,
    seed: u64,
) -> Framebuffer {
    let mut framebuffer = Framebuffer::new(width, height);
    let thread_count = config.threads.max(1).min(height.max(1) as usize);
    let rows_per_thread = height.div_ceil(thread_count as u32).max(1);
    let remaining = AtomicU32::new(height);

    let row_stride = framebuffer.width as usize;
    let chunk_len = rows_per_thread as usize * row_stride;
    let mut chunks: Vec<&mut [Color]> = framebuffer
        .as_mut_slice()
        .chunks_mut(chunk_len.max(1))
        .collect();

    std::thread::scope(|scope| {
        for (thread_idx, chunk) in chunks.iter_mut().enumerate() {
            let y_start = thread_idx as u32 * rows_per_thread;
            let y_end = (y_start + rows_per_thread).min(height);
            let thread_seed = seed.wrapping_add(thread_idx as u64 * 0x9E37_79B9_7F4A_7C15);
            let config = config;
            let camera = camera;
            let chunk: &mut [Color] = chunk;
            let remaining = &remaining;
            scope.spawn(move || {
                let mut rng = SmallRng::seed_from_u64(thread_seed);
                for j in y_start..y_end {
                    for i in 0..width {
                        let ray = camera.get_ray(i, j);
                        let mut accum = Color::zero();
                        for _ in 0..config.samples_per_pixel.max(1) {
                            accum +=
                                ray_color(&ray, config.max_depth, world, lights, config, &mut rng);
                        }
                        let local_idx = (j - y_start) as usize * row_stride + i as usize;
                        chunk[local_idx] = accum / config.samples_per_pixel.max(1) as f64;
                    }
                    let left = remaining.fetch_sub(1, Ordering::Relaxed) - 1;
                    info!("scanlines remaining: {left}");
                }
            });
        }
    });

    framebuffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bvh::Bvh;
    use crate::camera::CameraConfig;
    use crate::material::Material;
    use crate::math::{Point3, Vec2, Vec3};
    use crate::texture::Texture;
    use crate::triangle::Triangle;
    use std::sync::Arc;

    fn floor_and_light() -> (Bvh, Bvh) {
        let lambertian = Arc::new(Material::lambertian(Arc::new(Texture::solid(Color::new(
            0.7, 0.7, 0.7,
        )))));
        let light_material = Arc::new(Material::diffuse_light(Arc::new(Texture::solid(
            Color::new(15.0, 15.0, 15.0),
        ))));

        let floor: Vec<Box<dyn Hittable>> = vec![
            Box::new(Triangle::new(
                [
                    Point3::new(-5.0, 0.0, -5.0),
                    Point3::new(5.0, 0.0, -5.0),
                    Point3::new(-5.0, 0.0, 5.0),
                ],
                [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)],
                lambertian.clone(),
            )),
            Box::new(Triangle::new(
                [
                    Point3::new(5.0, 0.0, -5.0),
                    Point3::new(5.0, 0.0, 5.0),
                    Point3::new(-5.0, 0.0, 5.0),
                ],
                [Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)],
                lambertian,
            )),
        ];

        let light_tris: Vec<Box<dyn Hittable>> = vec![Box::new(Triangle::new(
            [
                Point3::new(-1.0, 3.0, -1.0),
                Point3::new(1.0, 3.0, -1.0),
                Point3::new(-1.0, 3.0, 1.0),
            ],
            [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)],
            light_material.clone(),
        ))];

        let mut world_objects = Vec::new();
        world_objects.extend(floor);
        world_objects.push(Box::new(Triangle::new(
            [
                Point3::new(-1.0, 3.0, -1.0),
                Point3::new(1.0, 3.0, -1.0),
                Point3::new(-1.0, 3.0, 1.0),
            ],
            [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)],
            light_material,
        )) as Box<dyn Hittable>);

        (Bvh::build(world_objects), Bvh::build(light_tris))
    }

    #[test]
    fn miss_returns_background() {
        let (world, lights) = floor_and_light();
        let config = RenderConfig {
            background: Color::new(0.1, 0.2, 0.3),
            ..Default::default()
        };
        let mut rng = SmallRng::seed_from_u64(1);
        let ray = Ray::new(Point3::new(0.0, 100.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        let color = ray_color(&ray, config.max_depth, &world, &lights, &config, &mut rng);
        assert_eq!(color, config.background);
    }

    #[test]
    fn lit_floor_point_receives_nonzero_direct_light() {
        let (world, lights) = floor_and_light();
        let config = RenderConfig::default();
        let mut rng = SmallRng::seed_from_u64(2);
        let ray = Ray::new(Point3::new(0.0, 10.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        let mut total = Color::zero();
        for _ in 0..64 {
            total += ray_color(&ray, config.max_depth, &world, &lights, &config, &mut rng);
        }
        let avg = total / 64.0;
        assert!(avg.x + avg.y + avg.z > 0.0);
    }

    #[test]
    fn small_render_produces_no_nan_pixels() {
        let (world, lights) = floor_and_light();
        let camera = Camera::new(&CameraConfig {
            eye: Point3::new(0.0, 5.0, 10.0),
            look_at: Point3::new(0.0, 0.5, 0.0),
            up: Vec3::unit_y(),
            fovy_degrees: 40.0,
            image_width: 16,
            image_height: 16,
        });
        let config = RenderConfig {
            samples_per_pixel: 2,
            max_depth: 3,
            threads: 4,
            ..Default::default()
        };
        let fb = render(&camera, &world, &lights, &config, 16, 16, 7);
        for y in 0..16 {
            for x in 0..16 {
                let c = fb.get(x, y);
                assert!(!c.x.is_nan() && !c.y.is_nan() && !c.z.is_nan());
            }
        }
    }
}
