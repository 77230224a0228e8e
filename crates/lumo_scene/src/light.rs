//! Light descriptors consumed by the tracer.

use lumo_math::Vec3;

/// A directional light.
///
/// `direction` points from the light toward the scene; illumination
/// therefore arrives along `-direction`. `color` is linear RGB and is
/// used directly by the tracer, unlike material base colors which get
/// gamma-decoded first.
#[derive(Clone, Copy, Debug)]
pub struct DirectionalLight {
    /// Direction the light shines in (from light toward scene)
    pub direction: Vec3,

    /// Light color (RGB, linear space)
    pub color: Vec3,

    /// Scalar intensity multiplier
    pub power: f32,
}

impl DirectionalLight {
    /// Create a new directional light. The direction is normalized.
    pub fn new(direction: Vec3, color: Vec3, power: f32) -> Self {
        Self {
            direction: direction.normalize(),
            color,
            power,
        }
    }

    /// Unit vector from a surface toward the light.
    #[inline]
    pub fn illumination_dir(&self) -> Vec3 {
        -self.direction
    }
}
