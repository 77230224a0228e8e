//! Radiance accumulation and display conversion.
//!
//! The film sums raw per-pixel radiance across sample passes. Only
//! `resolve` produces a viewable image: it averages, applies Reinhard
//! tone mapping and gamma-encodes. No partial image is exposed while
//! accumulation is in flight.

use std::path::Path;

use lumo_math::Vec3;

use crate::shading::gamma_from_linear;
use crate::tile::Tile;

/// Accumulated per-pixel radiance sums for one trace.
pub struct Film {
    width: u32,
    height: u32,
    pixels: Vec<Vec3>,
}

impl Film {
    /// Create a film cleared to zero.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Vec3::ZERO; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reset all accumulator cells to zero.
    pub fn clear(&mut self) {
        self.pixels.fill(Vec3::ZERO);
    }

    /// Add one pass worth of samples for a tile.
    ///
    /// `samples` is row-major within the tile and must contain exactly
    /// `tile.pixel_count()` values.
    pub fn add_tile(&mut self, tile: &Tile, samples: &[Vec3]) {
        debug_assert_eq!(samples.len(), tile.pixel_count() as usize);

        for local_y in 0..tile.height {
            let row = ((tile.y + local_y) * self.width + tile.x) as usize;
            let src = (local_y * tile.width) as usize;
            for local_x in 0..tile.width as usize {
                self.pixels[row + local_x] += samples[src + local_x];
            }
        }
    }

    /// Raw accumulated sum at a pixel.
    pub fn sum(&self, x: u32, y: u32) -> Vec3 {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Average the accumulated sums and convert for display.
    ///
    /// Divides by `samples_per_pixel`, tone-maps with Reinhard
    /// `c / (c + 1)` per channel, then gamma-encodes.
    pub fn resolve(&self, samples_per_pixel: u32) -> Image {
        let inv = 1.0 / samples_per_pixel as f32;
        let pixels = self
            .pixels
            .iter()
            .map(|&sum| {
                let mean = sum * inv;
                let mapped = mean / (mean + Vec3::ONE);
                gamma_from_linear(mapped)
            })
            .collect();

        Image {
            width: self.width,
            height: self.height,
            pixels,
        }
    }
}

/// A resolved, display-encoded image.
pub struct Image {
    pub width: u32,
    pub height: u32,
    pixels: Vec<Vec3>,
}

impl Image {
    /// Encoded pixel value at (x, y), each channel in [0, 1].
    pub fn pixel(&self, x: u32, y: u32) -> Vec3 {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Convert to tightly packed 8-bit RGBA.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity((self.width * self.height * 4) as usize);
        for p in &self.pixels {
            bytes.push((p.x.clamp(0.0, 1.0) * 255.0) as u8);
            bytes.push((p.y.clamp(0.0, 1.0) * 255.0) as u8);
            bytes.push((p.z.clamp(0.0, 1.0) * 255.0) as u8);
            bytes.push(255);
        }
        bytes
    }

    /// Write the image to a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> image::ImageResult<()> {
        image::save_buffer(
            path,
            &self.to_rgba8(),
            self.width,
            self.height,
            image::ColorType::Rgba8,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_tile_accumulates() {
        let mut film = Film::new(4, 4);
        let tile = Tile::new(1, 1, 2, 2, 0);
        let samples = vec![Vec3::splat(0.5); 4];

        film.add_tile(&tile, &samples);
        film.add_tile(&tile, &samples);

        assert_eq!(film.sum(1, 1), Vec3::splat(1.0));
        assert_eq!(film.sum(2, 2), Vec3::splat(1.0));
        // Outside the tile stays zero
        assert_eq!(film.sum(0, 0), Vec3::ZERO);
        assert_eq!(film.sum(3, 3), Vec3::ZERO);
    }

    #[test]
    fn test_clear() {
        let mut film = Film::new(2, 2);
        let tile = Tile::new(0, 0, 2, 2, 0);
        film.add_tile(&tile, &vec![Vec3::ONE; 4]);
        film.clear();
        assert_eq!(film.sum(1, 1), Vec3::ZERO);
    }

    #[test]
    fn test_resolve_tone_mapping() {
        // Radiance 1.0 tone-maps to 0.5, gamma-encodes to 0.5^(1/2.2)
        let mut film = Film::new(1, 1);
        let tile = Tile::new(0, 0, 1, 1, 0);
        film.add_tile(&tile, &[Vec3::ONE]);

        let image = film.resolve(1);
        let expected = 0.5f32.powf(1.0 / 2.2);
        assert!((image.pixel(0, 0).x - expected).abs() < 1e-5);

        let bytes = image.to_rgba8();
        assert_eq!(bytes.len(), 4);
        assert_eq!(bytes[0], 186);
        assert_eq!(bytes[3], 255);
    }

    #[test]
    fn test_resolve_averages_samples() {
        // Two passes of radiance 3.0: mean 3, mapped 0.75
        let mut film = Film::new(1, 1);
        let tile = Tile::new(0, 0, 1, 1, 0);
        film.add_tile(&tile, &[Vec3::splat(3.0)]);
        film.add_tile(&tile, &[Vec3::splat(3.0)]);

        let image = film.resolve(2);
        let expected = 0.75f32.powf(1.0 / 2.2);
        assert!((image.pixel(0, 0).x - expected).abs() < 1e-5);
    }

    #[test]
    fn test_black_stays_black() {
        let film = Film::new(2, 2);
        let image = film.resolve(16);
        assert_eq!(image.pixel(0, 0), Vec3::ZERO);
        let bytes = image.to_rgba8();
        assert_eq!(&bytes[0..4], &[0, 0, 0, 255]);
    }
}
