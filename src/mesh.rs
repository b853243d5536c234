//! A named group of triangles sharing one material — the unit a loader
//! would hand back per OBJ shape.

use crate::material::Material;
use crate::triangle::Triangle;
use std::sync::Arc;

pub struct Mesh {
    pub name: String,
    pub material: Arc<Material>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new(name: impl Into<String>, material: Arc<Material>, triangles: Vec<Triangle>) -> Self {
        Self {
            name: name.into(),
            material,
            triangles,
        }
    }

    /// Consumes the mesh, handing its triangles to the caller for flattening
    /// into a world or lights `Bvh`.
    pub fn into_triangles(self) -> Vec<Triangle> {
        self.triangles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Point3, Vec2, Vec3};
    use crate::texture::Texture;

    #[test]
    fn into_triangles_preserves_count_and_shared_material() {
        let material = Arc::new(Material::lambertian(Arc::new(Texture::solid(Vec3::ones()))));
        let tri = Triangle::new(
            [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)],
            material.clone(),
        );
        let mesh = Mesh::new("quad", material, vec![tri.clone(), tri]);
        assert_eq!(mesh.into_triangles().len(), 2);
    }
}
