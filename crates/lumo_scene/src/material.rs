//! PBR material definition for the path tracer.

use std::sync::Arc;

use lumo_math::Vec3;

use crate::texture::Texture;

/// A metallic-roughness material, looked up by geometry id during tracing.
///
/// `base_color` (and albedo texels) are stored in gamma space and
/// decoded by the tracer at shading time. Shared read-only across all
/// trace calls once the scene snapshot is built.
#[derive(Clone, Debug)]
pub struct Material {
    /// Base color (RGB, gamma space)
    pub base_color: Vec3,

    /// Roughness factor (0=smooth, 1=rough)
    pub roughness: f32,

    /// Metallic factor (0=dielectric, 1=metal)
    pub metallic: f32,

    /// Albedo texture; enables the textured shading path
    pub albedo_map: Option<Arc<Texture>>,

    /// Tangent-space normal map
    pub normal_map: Option<Arc<Texture>>,

    /// Roughness texture (sampled from the red channel)
    pub roughness_map: Option<Arc<Texture>>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: Vec3::new(0.5, 0.5, 0.5), // Grey default
            roughness: 0.5,
            metallic: 0.0,
            albedo_map: None,
            normal_map: None,
            roughness_map: None,
        }
    }
}

impl Material {
    /// Create an untextured material.
    pub fn new(base_color: Vec3, roughness: f32, metallic: f32) -> Self {
        Self {
            base_color,
            roughness,
            metallic,
            ..Default::default()
        }
    }

    /// Attach the texture set for the textured shading path.
    ///
    /// The tracer samples all three maps together, so they come as a
    /// unit; a material with only some of them is a scene-build error.
    pub fn with_maps(
        mut self,
        albedo: Arc<Texture>,
        normal: Arc<Texture>,
        roughness: Arc<Texture>,
    ) -> Self {
        self.albedo_map = Some(albedo);
        self.normal_map = Some(normal);
        self.roughness_map = Some(roughness);
        self
    }

    /// Check if this material uses the textured shading path.
    pub fn is_textured(&self) -> bool {
        self.albedo_map.is_some()
    }

    /// Check that the texture set is complete (all maps or none).
    pub fn has_complete_maps(&self) -> bool {
        match self.albedo_map {
            Some(_) => self.normal_map.is_some() && self.roughness_map.is_some(),
            None => true,
        }
    }
}
