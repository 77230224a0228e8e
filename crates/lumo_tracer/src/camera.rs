//! Pinhole camera and primary-ray generation.

use lumo_math::{Mat4, Ray, Vec2, Vec3};

/// Pinhole camera described by a position, a world-to-camera view
/// matrix and a horizontal field of view in degrees.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Vec3,
    pub view: Mat4,
    pub hfov_deg: f32,
}

impl Camera {
    /// Camera at `position` looking toward `target` with `up` as the
    /// approximate up direction.
    pub fn look_at(position: Vec3, target: Vec3, up: Vec3, hfov_deg: f32) -> Self {
        Self {
            position,
            view: Mat4::look_at_rh(position, target, up),
            hfov_deg,
        }
    }

    /// Build the primary ray through pixel (x, y) of a width x height
    /// image.
    ///
    /// `jitter` offsets the sample point within the pixel, each
    /// component in [-0.5, 0.5); pass zero for the pixel center. The
    /// screen mapping puts `tan(fov/2)` on y and scales x by the
    /// width/height aspect, with y flipped so row 0 is the top of the
    /// image. Directions come out normalized.
    pub fn primary_ray(&self, x: u32, y: u32, width: u32, height: u32, jitter: Vec2) -> Ray {
        let scale = (self.hfov_deg.to_radians() * 0.5).tan();
        let aspect = width as f32 / height as f32;

        let sx = (x as f32 + 0.5 + jitter.x) / width as f32;
        let sy = (y as f32 + 0.5 + jitter.y) / height as f32;

        let px = (2.0 * sx - 1.0) * scale * aspect;
        let py = (1.0 - 2.0 * sy) * scale;

        // transform_vector3 drops the translation row, so the
        // transposed view acts as the camera-to-world rotation here.
        let direction = self
            .view
            .transpose()
            .transform_vector3(Vec3::new(px, py, -1.0))
            .normalize();

        Ray::new(self.position, direction)
    }
}
