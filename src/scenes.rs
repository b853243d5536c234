//! Programmatic scene construction, standing in for a mesh-file-and-XML
//! loader: file parsing is not reimplemented, but the `world`/`lights` BVH
//! pair and camera a real loader would hand the integrator are built here
//! directly so the core renders end-to-end.
//!
//! Each builder returns a `SceneSetup` — a `world` (all primitives) and a
//! `lights` (emissive subset), each wrapped in a BVH, plus a camera and a
//! default render configuration.

use crate::bvh::Bvh;
use crate::camera::{Camera, CameraConfig};
use crate::hittable::Hittable;
use crate::integrator::RenderConfig;
use crate::material::Material;
use crate::math::{Color, Point3, Vec2, Vec3};
use crate::texture::Texture;
use crate::triangle::Triangle;
use std::sync::Arc;

/// A quad built from two triangles sharing a diagonal, vertices given
/// counter-clockwise as seen from the side the quad should face.
fn quad(corners: [Point3; 4], material: Arc<Material>) -> [Box<dyn Hittable>; 2] {
    let [a, b, c, d] = corners;
    let uv = [
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(1.0, 1.0),
    ];
    let uv2 = [
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 1.0),
    ];
    [
        Box::new(Triangle::new([a, b, c], uv, material.clone())),
        Box::new(Triangle::new([a, c, d], uv2, material)),
    ]
}

fn lambertian(color: Color) -> Arc<Material> {
    Arc::new(Material::lambertian(Arc::new(Texture::solid(color))))
}

fn diffuse_light(radiance: Color) -> Arc<Material> {
    Arc::new(Material::diffuse_light(Arc::new(Texture::solid(radiance))))
}

pub struct SceneSetup {
    pub world: Bvh,
    pub lights: Bvh,
    pub camera: Camera,
    pub config: RenderConfig,
}

/// A Cornell box: five lambertian walls (red/green side walls, white
/// floor/ceiling/back wall), one emissive ceiling quad, and two diffuse
/// boxes rendered here as axis-aligned blocks — the classic reference
/// scene for low-sample-count renders.
pub fn cornell_box(width: u32, height: u32) -> SceneSetup {
    let red = lambertian(Color::new(0.65, 0.05, 0.05));
    let green = lambertian(Color::new(0.12, 0.45, 0.15));
    let white = lambertian(Color::new(0.73, 0.73, 0.73));
    let light = diffuse_light(Color::new(15.0, 15.0, 15.0));

    let mut objects: Vec<Box<dyn Hittable>> = Vec::new();

    // Green wall (left, x = 0), red wall (right, x = 555), facing inward.
    objects.extend(quad(
        [
            Point3::new(555.0, 0.0, 0.0),
            Point3::new(555.0, 0.0, 555.0),
            Point3::new(555.0, 555.0, 555.0),
            Point3::new(555.0, 555.0, 0.0),
        ],
        green,
    ));
    objects.extend(quad(
        [
            Point3::new(0.0, 0.0, 555.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 555.0, 0.0),
            Point3::new(0.0, 555.0, 555.0),
        ],
        red,
    ));
    // Floor, ceiling, back wall: white.
    objects.extend(quad(
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(555.0, 0.0, 0.0),
            Point3::new(555.0, 0.0, 555.0),
            Point3::new(0.0, 0.0, 555.0),
        ],
        white.clone(),
    ));
    objects.extend(quad(
        [
            Point3::new(0.0, 555.0, 555.0),
            Point3::new(555.0, 555.0, 555.0),
            Point3::new(555.0, 555.0, 0.0),
            Point3::new(0.0, 555.0, 0.0),
        ],
        white.clone(),
    ));
    objects.extend(quad(
        [
            Point3::new(0.0, 0.0, 555.0),
            Point3::new(555.0, 0.0, 555.0),
            Point3::new(555.0, 555.0, 555.0),
            Point3::new(0.0, 555.0, 555.0),
        ],
        white.clone(),
    ));

    // Two diffuse blocks, modeled as axis-aligned boxes of triangles.
    objects.extend(aa_box(
        Point3::new(130.0, 0.0, 65.0),
        Point3::new(295.0, 165.0, 230.0),
        white.clone(),
    ));
    objects.extend(aa_box(
        Point3::new(265.0, 0.0, 295.0),
        Point3::new(430.0, 330.0, 460.0),
        white,
    ));

    // Ceiling light, slightly below the ceiling to avoid coplanar z-fighting.
    // Built twice: once as the sole occupant of `lights`, once folded into
    // `world` so the light quad is also an ordinary occluder/emitter hit by
    // primary and shadow rays (lights are a subset of world).
    let light_corners = [
        Point3::new(213.0, 554.0, 227.0),
        Point3::new(343.0, 554.0, 227.0),
        Point3::new(343.0, 554.0, 332.0),
        Point3::new(213.0, 554.0, 332.0),
    ];
    let lights_bvh = Bvh::build(quad(light_corners, light.clone()).into_iter().collect());
    objects.extend(quad(light_corners, light));
    let world_bvh = Bvh::build(objects);

    let camera = Camera::new(&CameraConfig {
        eye: Point3::new(278.0, 278.0, -800.0),
        look_at: Point3::new(278.0, 278.0, 0.0),
        up: Vec3::unit_y(),
        fovy_degrees: 40.0,
        image_width: width,
        image_height: height,
    });

    SceneSetup {
        world: world_bvh,
        lights: lights_bvh,
        camera,
        config: RenderConfig::default(),
    }
}

/// An axis-aligned box of 12 triangles spanning `[min, max]`.
fn aa_box(min: Point3, max: Point3, material: Arc<Material>) -> Vec<Box<dyn Hittable>> {
    let mut tris = Vec::new();
    // Front/back (z = min.z / max.z)
    tris.extend(quad(
        [
            Point3::new(min.x, min.y, max.z),
            Point3::new(max.x, min.y, max.z),
            Point3::new(max.x, max.y, max.z),
            Point3::new(min.x, max.y, max.z),
        ],
        material.clone(),
    ));
    tris.extend(quad(
        [
            Point3::new(max.x, min.y, min.z),
            Point3::new(min.x, min.y, min.z),
            Point3::new(min.x, max.y, min.z),
            Point3::new(max.x, max.y, min.z),
        ],
        material.clone(),
    ));
    // Left/right (x = min.x / max.x)
    tris.extend(quad(
        [
            Point3::new(min.x, min.y, min.z),
            Point3::new(min.x, min.y, max.z),
            Point3::new(min.x, max.y, max.z),
            Point3::new(min.x, max.y, min.z),
        ],
        material.clone(),
    ));
    tris.extend(quad(
        [
            Point3::new(max.x, min.y, max.z),
            Point3::new(max.x, min.y, min.z),
            Point3::new(max.x, max.y, min.z),
            Point3::new(max.x, max.y, max.z),
        ],
        material.clone(),
    ));
    // Top/bottom (y = max.y / min.y)
    tris.extend(quad(
        [
            Point3::new(min.x, max.y, max.z),
            Point3::new(max.x, max.y, max.z),
            Point3::new(max.x, max.y, min.z),
            Point3::new(min.x, max.y, min.z),
        ],
        material.clone(),
    ));
    tris.extend(quad(
        [
            Point3::new(min.x, min.y, min.z),
            Point3::new(max.x, min.y, min.z),
            Point3::new(max.x, min.y, max.z),
            Point3::new(min.x, min.y, max.z),
        ],
        material,
    ));
    tris
}

/// Scene: a mirror floor at `z=0` and an emissive ceiling quad at `z=2`,
/// with the camera sandwiched between the two at `z=1` looking straight
/// down at the mirror. A flat mirror only ever reflects back toward the
/// hemisphere the incident ray came from, so the
/// camera must sit between the reflector and the light for the bounced
/// ray to reach it (exactly how a Cornell-box mirror floor "sees" the
/// ceiling light). The center pixel should saturate to white after
/// tone-mapping, and the camera's own primary rays never reach the light
/// directly — they only ever travel away from it, toward the mirror.
pub fn mirror_echo(width: u32, height: u32) -> SceneSetup {
    let light = diffuse_light(Color::new(10.0, 10.0, 10.0));
    let mirror = Arc::new(Material::perfect_mirror());

    let light_corners = [
        Point3::new(-1.0, -1.0, 2.0),
        Point3::new(1.0, -1.0, 2.0),
        Point3::new(1.0, 1.0, 2.0),
        Point3::new(-1.0, 1.0, 2.0),
    ];
    let mirror_quad = quad(
        [
            Point3::new(-3.0, -3.0, 0.0),
            Point3::new(3.0, -3.0, 0.0),
            Point3::new(3.0, 3.0, 0.0),
            Point3::new(-3.0, 3.0, 0.0),
        ],
        mirror,
    );

    let lights_bvh = Bvh::build(quad(light_corners, light.clone()).into_iter().collect());
    let mut world_objects: Vec<Box<dyn Hittable>> = Vec::new();
    world_objects.extend(quad(light_corners, light));
    world_objects.extend(mirror_quad);
    let world_bvh = Bvh::build(world_objects);

    let camera = Camera::new(&CameraConfig {
        eye: Point3::new(0.0, 0.0, 1.0),
        look_at: Point3::new(0.0, 0.0, 0.0),
        up: Vec3::unit_y(),
        fovy_degrees: 20.0,
        image_width: width,
        image_height: height,
    });

    SceneSetup {
        world: world_bvh,
        lights: lights_bvh,
        camera,
        config: RenderConfig {
            background: Color::zero(),
            ..Default::default()
        },
    }
}

/// Scene: a small emissive disk (approximated by a quad) fully occluded
/// from the shade point by an opaque triangle between it and the light.
/// Direct contribution must be zero for every sample regardless of
/// material.
pub fn shadow_occlusion(width: u32, height: u32) -> SceneSetup {
    let white = lambertian(Color::new(0.8, 0.8, 0.8));
    let occluder = lambertian(Color::new(0.2, 0.2, 0.2));
    let light = diffuse_light(Color::new(20.0, 20.0, 20.0));

    let mut world_objects: Vec<Box<dyn Hittable>> = Vec::new();
    // Floor the shade point sits on.
    world_objects.extend(quad(
        [
            Point3::new(-5.0, 0.0, -5.0),
            Point3::new(5.0, 0.0, -5.0),
            Point3::new(5.0, 0.0, 5.0),
            Point3::new(-5.0, 0.0, 5.0),
        ],
        white,
    ));
    // Opaque occluder directly between floor center and the light above it.
    world_objects.push(Box::new(Triangle::new(
        [
            Point3::new(-3.0, 1.0, -3.0),
            Point3::new(3.0, 1.0, -3.0),
            Point3::new(0.0, 1.0, 3.0),
        ],
        [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.5, 1.0)],
        occluder,
    )));
    let light_quad = quad(
        [
            Point3::new(-1.0, 4.0, -1.0),
            Point3::new(1.0, 4.0, -1.0),
            Point3::new(1.0, 4.0, 1.0),
            Point3::new(-1.0, 4.0, 1.0),
        ],
        light,
    );
    let light_objects: Vec<Box<dyn Hittable>> = light_quad.into();
    let lights_bvh = Bvh::build(light_objects);
    world_objects.extend(quad(
        [
            Point3::new(-1.0, 4.0, -1.0),
            Point3::new(1.0, 4.0, -1.0),
            Point3::new(1.0, 4.0, 1.0),
            Point3::new(-1.0, 4.0, 1.0),
        ],
        diffuse_light(Color::new(20.0, 20.0, 20.0)),
    ));
    let world_bvh = Bvh::build(world_objects);

    let camera = Camera::new(&CameraConfig {
        eye: Point3::new(0.0, 2.0, 8.0),
        look_at: Point3::new(0.0, 0.5, 0.0),
        up: Vec3::unit_y(),
        fovy_degrees: 35.0,
        image_width: width,
        image_height: height,
    });

    SceneSetup {
        world: world_bvh,
        lights: lights_bvh,
        camera,
        config: RenderConfig::default(),
    }
}

/// A small gallery of primitives each using a different material variant,
/// including `DebugMaterial` (visualizing raw albedo as emission) for
/// inspecting each BSDF in isolation.
pub fn material_gallery(width: u32, height: u32) -> SceneSetup {
    let floor = lambertian(Color::new(0.5, 0.5, 0.5));
    let mirror = Arc::new(Material::perfect_mirror());
    let phong = Arc::new(Material::phong(
        Arc::new(Texture::solid(Color::new(0.6, 0.2, 0.2))),
        Arc::new(Texture::solid(Color::new(0.9, 0.9, 0.9))),
        64.0,
    ));
    let conductor = Arc::new(Material::cook_torrance(
        Arc::new(Texture::solid(Color::ones())),
        0.1,
        0.1,
        Color::new(0.2, 0.92, 1.1),
        Color::new(3.0, 2.5, 2.0),
    ));
    let debug = Arc::new(Material::debug(Arc::new(Texture::solid(Color::new(
        0.1, 0.8, 0.3,
    )))));
    let light = diffuse_light(Color::new(8.0, 8.0, 8.0));

    let mut world_objects: Vec<Box<dyn Hittable>> = Vec::new();
    world_objects.extend(quad(
        [
            Point3::new(-6.0, 0.0, -6.0),
            Point3::new(6.0, 0.0, -6.0),
            Point3::new(6.0, 0.0, 6.0),
            Point3::new(-6.0, 0.0, 6.0),
        ],
        floor,
    ));

    let centers = [-3.0, -1.0, 1.0, 3.0];
    let materials = [mirror, phong, conductor, debug];
    for (cx, mat) in centers.iter().zip(materials.into_iter()) {
        world_objects.push(Box::new(Triangle::new(
            [
                Point3::new(cx - 0.6, 0.0, 0.0),
                Point3::new(cx + 0.6, 0.0, 0.0),
                Point3::new(*cx, 1.2, 0.0),
            ],
            [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.5, 1.0)],
            mat,
        )));
    }

    let light_quad = quad(
        [
            Point3::new(-4.0, 5.0, -2.0),
            Point3::new(4.0, 5.0, -2.0),
            Point3::new(4.0, 5.0, 4.0),
            Point3::new(-4.0, 5.0, 4.0),
        ],
        light,
    );
    let lights_bvh = Bvh::build(light_quad.into());
    world_objects.extend(quad(
        [
            Point3::new(-4.0, 5.0, -2.0),
            Point3::new(4.0, 5.0, -2.0),
            Point3::new(4.0, 5.0, 4.0),
            Point3::new(-4.0, 5.0, 4.0),
        ],
        diffuse_light(Color::new(8.0, 8.0, 8.0)),
    ));
    let world_bvh = Bvh::build(world_objects);

    let camera = Camera::new(&CameraConfig {
        eye: Point3::new(0.0, 2.0, 9.0),
        look_at: Point3::new(0.0, 1.0, 0.0),
        up: Vec3::unit_y(),
        fovy_degrees: 45.0,
        image_width: width,
        image_height: height,
    });

    SceneSetup {
        world: world_bvh,
        lights: lights_bvh,
        camera,
        config: RenderConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::render;

    #[test]
    fn cornell_box_low_sample_render_has_no_nan_pixels() {
        let setup = cornell_box(32, 32);
        let config = RenderConfig {
            samples_per_pixel: 4,
            max_depth: 4,
            threads: 2,
            ..setup.config
        };
        let fb = render(
            &setup.camera,
            &setup.world,
            &setup.lights,
            &config,
            32,
            32,
            42,
        );
        let mut total = Color::zero();
        for y in 0..32 {
            for x in 0..32 {
                let c = fb.get(x, y);
                assert!(!c.x.is_nan() && !c.y.is_nan() && !c.z.is_nan());
                total += c;
            }
        }
        let avg = total / (32.0 * 32.0);
        assert!(avg.x + avg.y + avg.z > 0.0, "scene should not be fully black");
    }

    #[test]
    fn mirror_echo_center_pixel_saturates() {
        let setup = mirror_echo(17, 17);
        let config = RenderConfig {
            samples_per_pixel: 8,
            max_depth: 6,
            threads: 2,
            ..setup.config
        };
        let fb = render(
            &setup.camera,
            &setup.world,
            &setup.lights,
            &config,
            17,
            17,
            7,
        );
        let img = fb.to_srgb_image();
        let center = img.get_pixel(8, 8);
        assert_eq!(center[0], 255);
        assert_eq!(center[1], 255);
        assert_eq!(center[2], 255);
    }

    #[test]
    fn shadow_occlusion_blocks_all_direct_light() {
        use crate::hittable::Hittable as _;
        use crate::interval::Interval;
        use crate::math::Ray;
        use rand::rngs::SmallRng;
        use rand::SeedableRng;

        let setup = shadow_occlusion(8, 8);
        let shade_point = Point3::new(0.0, 0.0, 0.0);
        let mut rng = SmallRng::seed_from_u64(99);
        for _ in 0..64 {
            let (light_record, _pdf) = setup.lights.sample(shade_point, &mut rng);
            let to_light = (light_record.position - shade_point).normalized();
            let distance = (light_record.position - shade_point).length();
            let shadow_ray = Ray::new(shade_point, to_light);
            let hit = setup
                .world
                .hit(&shadow_ray, Interval::new(1e-3, f64::INFINITY));
            let unoccluded = hit
                .as_ref()
                .is_some_and(|n| distance - (shade_point - n.position).length() < 1e-3);
            assert!(!unoccluded, "occluder triangle must block the light sample");
        }
    }

    #[test]
    fn material_gallery_builds_and_renders_without_panicking() {
        let setup = material_gallery(12, 12);
        let config = RenderConfig {
            samples_per_pixel: 2,
            max_depth: 3,
            threads: 1,
            ..setup.config
        };
        let fb = render(
            &setup.camera,
            &setup.world,
            &setup.lights,
            &config,
            12,
            12,
            3,
        );
        for y in 0..12 {
            for x in 0..12 {
                let c = fb.get(x, y);
                assert!(!c.x.is_nan() && !c.y.is_nan() && !c.z.is_nan());
            }
        }
    }
}
