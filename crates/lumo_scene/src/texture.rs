//! Texture storage and sampling for materials.
//!
//! Texels are kept as raw 0-1 floats exactly as decoded from the image
//! file. Color-space handling is the tracer's job: albedo texels are
//! gamma-decoded at shading time, uniformly with untextured base
//! colors, so no sRGB conversion happens here.

use std::path::Path;

use lumo_math::Vec3;
use thiserror::Error;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("failed to load texture: {0}")]
    LoadError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image decoding error: {0}")]
    ImageError(#[from] image::ImageError),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// A loaded texture with pixel data.
///
/// Stores pixels as RGBA floats in 0-1 range, row-major order.
#[derive(Clone, Debug)]
pub struct Texture {
    /// Texture width in pixels
    pub width: u32,

    /// Texture height in pixels
    pub height: u32,

    /// Pixel data, [R, G, B, A] per pixel
    pub pixels: Vec<[f32; 4]>,
}

impl Texture {
    /// Create a new texture from pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<[f32; 4]>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Create a solid color texture (1x1).
    pub fn solid_color(color: Vec3) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![[color.x, color.y, color.z, 1.0]],
        }
    }

    /// Load a texture from an image file.
    pub fn load(path: impl AsRef<Path>) -> TextureResult<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|e| {
            TextureError::LoadError(format!("failed to open {}: {}", path.display(), e))
        })?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let pixels: Vec<[f32; 4]> = rgba
            .pixels()
            .map(|p| {
                [
                    p[0] as f32 / 255.0,
                    p[1] as f32 / 255.0,
                    p[2] as f32 / 255.0,
                    p[3] as f32 / 255.0,
                ]
            })
            .collect();

        log::debug!(
            "Loaded texture: {} ({}x{})",
            path.display(),
            width,
            height
        );

        Ok(Texture::new(width, height, pixels))
    }

    /// Sample the texture at UV coordinates (bilinear filtering).
    ///
    /// UV coordinates are wrapped into [0, 1), with (0, 0) at the
    /// top-left of the image.
    pub fn sample(&self, u: f32, v: f32) -> Vec3 {
        // Wrap UV coordinates
        let u = u.rem_euclid(1.0);
        let v = v.rem_euclid(1.0);

        // Convert to pixel coordinates
        let x = u * (self.width as f32 - 1.0);
        let y = v * (self.height as f32 - 1.0);

        // Bilinear interpolation
        let x0 = x.floor() as u32;
        let y0 = y.floor() as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let fx = x.fract();
        let fy = y.fract();

        let p00 = self.get_pixel(x0, y0);
        let p10 = self.get_pixel(x1, y0);
        let p01 = self.get_pixel(x0, y1);
        let p11 = self.get_pixel(x1, y1);

        // Bilinear blend
        let top = Vec3::new(
            p00[0] * (1.0 - fx) + p10[0] * fx,
            p00[1] * (1.0 - fx) + p10[1] * fx,
            p00[2] * (1.0 - fx) + p10[2] * fx,
        );
        let bottom = Vec3::new(
            p01[0] * (1.0 - fx) + p11[0] * fx,
            p01[1] * (1.0 - fx) + p11[1] * fx,
            p01[2] * (1.0 - fx) + p11[2] * fx,
        );

        top * (1.0 - fy) + bottom * fy
    }

    /// Sample a single channel (for roughness maps).
    pub fn sample_channel(&self, u: f32, v: f32, channel: usize) -> f32 {
        let u = u.rem_euclid(1.0);
        let v = v.rem_euclid(1.0);

        let x = (u * (self.width as f32 - 1.0)) as u32;
        let y = (v * (self.height as f32 - 1.0)) as u32;

        self.get_pixel(x.min(self.width - 1), y.min(self.height - 1))[channel.min(3)]
    }

    /// Get pixel at integer coordinates.
    fn get_pixel(&self, x: u32, y: u32) -> [f32; 4] {
        let idx = (y * self.width + x) as usize;
        self.pixels
            .get(idx)
            .copied()
            .unwrap_or([0.0, 0.0, 0.0, 1.0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_color_texture() {
        let tex = Texture::solid_color(Vec3::new(1.0, 0.5, 0.0));
        assert_eq!(tex.width, 1);
        assert_eq!(tex.height, 1);

        let sample = tex.sample(0.5, 0.5);
        assert!((sample.x - 1.0).abs() < 0.001);
        assert!((sample.y - 0.5).abs() < 0.001);
        assert!((sample.z - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_bilinear_midpoint() {
        // 2x1 texture: black on the left, white on the right
        let tex = Texture::new(
            2,
            1,
            vec![[0.0, 0.0, 0.0, 1.0], [1.0, 1.0, 1.0, 1.0]],
        );

        let mid = tex.sample(0.5, 0.0);
        assert!((mid.x - 0.5).abs() < 0.001);
        assert!((mid.y - 0.5).abs() < 0.001);
        assert!((mid.z - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_sample_channel() {
        let tex = Texture::new(1, 1, vec![[0.25, 0.5, 0.75, 1.0]]);

        assert!((tex.sample_channel(0.0, 0.0, 0) - 0.25).abs() < 0.001);
        assert!((tex.sample_channel(0.0, 0.0, 1) - 0.5).abs() < 0.001);
        assert!((tex.sample_channel(0.0, 0.0, 2) - 0.75).abs() < 0.001);
    }

    #[test]
    fn test_uv_wrap() {
        let tex = Texture::solid_color(Vec3::new(0.3, 0.3, 0.3));

        // Out-of-range UVs wrap instead of clamping or panicking
        let sample = tex.sample(1.5, -0.25);
        assert!((sample.x - 0.3).abs() < 0.001);
    }
}
