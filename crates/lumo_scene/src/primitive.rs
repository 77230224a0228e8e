//! Triangle-mesh primitives handed over by the asset layer.

use lumo_math::{Mat4, Vec2, Vec3, Vec4};

use crate::error::SceneError;
use crate::material::Material;

/// An indexed triangle mesh with per-vertex shading attributes.
///
/// Positions are in object space; `transform` is baked into the
/// vertex data when the tracer builds its scene snapshot (positions by
/// the full matrix, normals and tangents by the inverse-transpose of
/// its 3x3 part).
#[derive(Clone, Debug)]
pub struct Primitive {
    /// Vertex positions (object space)
    pub positions: Vec<Vec3>,

    /// Vertex normals, one per position
    pub normals: Vec<Vec3>,

    /// Vertex tangents (xyz) with handedness sign in w; empty if unused
    pub tangents: Vec<Vec4>,

    /// Texture coordinates; empty if unused
    pub tex_coords: Vec<Vec2>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Model matrix
    pub transform: Mat4,

    /// Surface material
    pub material: Material,
}

impl Primitive {
    /// Create a primitive without tangents or texture coordinates.
    pub fn new(
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        indices: Vec<u32>,
        material: Material,
    ) -> Self {
        Self {
            positions,
            normals,
            tangents: Vec::new(),
            tex_coords: Vec::new(),
            indices,
            transform: Mat4::IDENTITY,
            material,
        }
    }

    /// Attach tangents and texture coordinates.
    pub fn with_uvs(mut self, tangents: Vec<Vec4>, tex_coords: Vec<Vec2>) -> Self {
        self.tangents = tangents;
        self.tex_coords = tex_coords;
        self
    }

    /// Set the model matrix.
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Build a quad (two triangles) centered at `center`, spanned by
    /// `edge_u` and `edge_v`, facing along `edge_u x edge_v`.
    ///
    /// Carries full attributes (normals, tangents, texcoords), so it
    /// works with both the textured and untextured shading paths.
    pub fn quad(center: Vec3, edge_u: Vec3, edge_v: Vec3, material: Material) -> Self {
        let normal = edge_u.cross(edge_v).normalize();
        let tangent = edge_u.normalize();
        let hu = edge_u * 0.5;
        let hv = edge_v * 0.5;

        Self {
            positions: vec![
                center - hu - hv,
                center + hu - hv,
                center + hu + hv,
                center - hu + hv,
            ],
            normals: vec![normal; 4],
            tangents: vec![Vec4::new(tangent.x, tangent.y, tangent.z, 1.0); 4],
            tex_coords: vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.0, 1.0),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
            transform: Mat4::IDENTITY,
            material,
        }
    }

    /// Build an axis-aligned box (12 triangles) centered at `center`
    /// with the given half extents, faces wound outward.
    pub fn cuboid(center: Vec3, half_extents: Vec3, material: Material) -> Self {
        let h = half_extents;
        // (face center offset, edge_u, edge_v); normal = edge_u x edge_v
        let faces = [
            (Vec3::new(0.0, 0.0, h.z), Vec3::X * 2.0 * h.x, Vec3::Y * 2.0 * h.y),
            (Vec3::new(0.0, 0.0, -h.z), Vec3::NEG_X * 2.0 * h.x, Vec3::Y * 2.0 * h.y),
            (Vec3::new(h.x, 0.0, 0.0), Vec3::NEG_Z * 2.0 * h.z, Vec3::Y * 2.0 * h.y),
            (Vec3::new(-h.x, 0.0, 0.0), Vec3::Z * 2.0 * h.z, Vec3::Y * 2.0 * h.y),
            (Vec3::new(0.0, h.y, 0.0), Vec3::X * 2.0 * h.x, Vec3::NEG_Z * 2.0 * h.z),
            (Vec3::new(0.0, -h.y, 0.0), Vec3::X * 2.0 * h.x, Vec3::Z * 2.0 * h.z),
        ];

        let mut mesh = Self::new(Vec::new(), Vec::new(), Vec::new(), material);
        for (offset, edge_u, edge_v) in faces {
            let face = Self::quad(center + offset, edge_u, edge_v, Material::default());
            let base = mesh.positions.len() as u32;
            mesh.positions.extend(face.positions);
            mesh.normals.extend(face.normals);
            mesh.tangents.extend(face.tangents);
            mesh.tex_coords.extend(face.tex_coords);
            mesh.indices.extend(face.indices.iter().map(|i| i + base));
        }
        mesh
    }

    /// Get the number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check internal consistency before the scene snapshot is built.
    ///
    /// `index` is this primitive's position in the scene list, used
    /// only for error reporting.
    pub fn validate(&self, index: usize) -> Result<(), SceneError> {
        if self.indices.is_empty() {
            return Err(SceneError::EmptyPrimitive { index });
        }
        if self.indices.len() % 3 != 0 {
            return Err(SceneError::BadIndexCount {
                index,
                count: self.indices.len(),
            });
        }

        let vertex_count = self.positions.len();
        for &vertex in &self.indices {
            if vertex as usize >= vertex_count {
                return Err(SceneError::IndexOutOfRange {
                    index,
                    vertex,
                    vertex_count,
                });
            }
        }

        if self.normals.len() != vertex_count {
            return Err(SceneError::AttributeCountMismatch {
                index,
                attribute: "normal",
                expected: vertex_count,
                found: self.normals.len(),
            });
        }
        if !self.tangents.is_empty() && self.tangents.len() != vertex_count {
            return Err(SceneError::AttributeCountMismatch {
                index,
                attribute: "tangent",
                expected: vertex_count,
                found: self.tangents.len(),
            });
        }
        if !self.tex_coords.is_empty() && self.tex_coords.len() != vertex_count {
            return Err(SceneError::AttributeCountMismatch {
                index,
                attribute: "texcoord",
                expected: vertex_count,
                found: self.tex_coords.len(),
            });
        }

        // The textured shading path samples all maps and needs a
        // tangent frame; a textured material on a mesh without these
        // attributes can never shade correctly.
        if self.material.is_textured()
            && (!self.material.has_complete_maps()
                || self.tangents.is_empty()
                || self.tex_coords.is_empty())
        {
            return Err(SceneError::MissingTextureAttributes { index });
        }

        Ok(())
    }
}
