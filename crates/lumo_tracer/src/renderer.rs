//! Top-level render loop: sample passes over parallel tiles.
//!
//! The outer loop over sample passes is sequential so passes
//! accumulate into one film; within a pass, tiles are traced in
//! parallel with rayon and each tile task gets its own seeded RNG, so
//! results are reproducible for a given seed regardless of thread
//! scheduling.

use lumo_math::{Vec2, Vec3};
use lumo_scene::DirectionalLight;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::accel::TracerScene;
use crate::camera::Camera;
use crate::film::{Film, Image};
use crate::gen_f32;
use crate::tile::{generate_tiles, Tile, DEFAULT_TILE_SIZE};
use crate::tracer::PathTracer;

/// Render parameters.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Number of sample passes per pixel
    pub samples_per_pixel: u32,
    /// Maximum path recursion depth
    pub max_depth: u32,
    /// Per-channel radiance clamp (firefly suppression)
    pub clamp: f32,
    /// Master seed for the per-task random streams
    pub seed: u64,
    /// Tile edge length in pixels
    pub tile_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            samples_per_pixel: 200,
            max_depth: 5,
            clamp: 15.0,
            seed: 0,
            tile_size: DEFAULT_TILE_SIZE,
        }
    }
}

/// splitmix64 mixer; turns correlated task keys into well-spread seeds.
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e3779b97f4a7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d049bb133111eb);
    x ^ (x >> 31)
}

/// RNG for one (pass, tile) task, derived from the master seed.
fn task_rng(seed: u64, pass: u32, tile_index: usize) -> StdRng {
    let key = seed ^ (((pass as u64) << 32) | tile_index as u64);
    StdRng::seed_from_u64(splitmix64(key))
}

/// Trace one sample for every pixel of a tile.
///
/// Returns radiance values in row-major order within the tile.
fn render_tile(
    tile: &Tile,
    camera: &Camera,
    tracer: &PathTracer,
    config: &RenderConfig,
    rng: &mut StdRng,
) -> Vec<Vec3> {
    let mut samples = Vec::with_capacity(tile.pixel_count() as usize);

    for local_y in 0..tile.height {
        for local_x in 0..tile.width {
            let x = tile.x + local_x;
            let y = tile.y + local_y;

            let jitter = Vec2::new(gen_f32(rng) - 0.5, gen_f32(rng) - 0.5);
            let ray = camera.primary_ray(x, y, config.width, config.height, jitter);
            samples.push(tracer.estimate_radiance(&ray, Vec3::ONE, 0, rng));
        }
    }

    samples
}

/// Trace the full image and resolve it for display.
///
/// Runs `samples_per_pixel` sequential passes; each pass traces all
/// tiles in parallel and merges them into the film before the next
/// pass starts.
pub fn render(
    scene: &TracerScene,
    light: &DirectionalLight,
    camera: &Camera,
    config: &RenderConfig,
) -> Image {
    let tracer = PathTracer::new(scene, light, config.max_depth, config.clamp);
    let tiles = generate_tiles(config.width, config.height, config.tile_size);
    let mut film = Film::new(config.width, config.height);

    log::info!(
        "Rendering {}x{} at {} spp, {} tiles, depth {}",
        config.width,
        config.height,
        config.samples_per_pixel,
        tiles.len(),
        config.max_depth
    );

    for pass in 0..config.samples_per_pixel {
        let results: Vec<(Tile, Vec<Vec3>)> = tiles
            .par_iter()
            .map(|tile| {
                let mut rng = task_rng(config.seed, pass, tile.index);
                (*tile, render_tile(tile, camera, &tracer, config, &mut rng))
            })
            .collect();

        for (tile, samples) in results {
            film.add_tile(&tile, &samples);
        }

        if (pass + 1) % 16 == 0 || pass + 1 == config.samples_per_pixel {
            log::debug!("Pass {}/{}", pass + 1, config.samples_per_pixel);
        }
    }

    film.resolve(config.samples_per_pixel)
}
