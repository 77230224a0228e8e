//! Lumo Tracer - offline/debug CPU path tracing.
//!
//! A unidirectional Monte Carlo path tracer with next-event estimation:
//! - Triangle BVH built once per scene, queried concurrently
//! - Lambert + Cook-Torrance/GGX shading with stochastic lobe selection
//! - Hard recursion cap and a firefly clamp
//! - Tile-parallel accumulation via rayon, per-task seeded RNG
//!
//! The intended reading order is bottom-up: `shading` (pure sampling
//! math), `accel` (intersection service), `tracer` (the recursive
//! estimator), then `renderer`/`film` (the per-pixel sample loop).

mod accel;
mod camera;
mod film;
mod renderer;
mod shading;
mod tile;
mod tracer;

pub use accel::{Hit, TracerScene};
pub use camera::Camera;
pub use film::{Film, Image};
pub use renderer::{render, RenderConfig};
pub use shading::{
    brdf_cook_torrance_ggx, brdf_lambert, gamma_from_linear, linear_from_gamma,
    orthonormal_basis, pdf_cosine_hemisphere, pdf_ggx, sample_cosine_hemisphere, sample_ggx,
};
pub use tile::{generate_tiles, Tile, DEFAULT_TILE_SIZE};
pub use tracer::{lobe_probabilities, PathTracer};

/// Re-export math and scene types used in the public API
pub use lumo_math::{Aabb, Interval, Ray, Vec3};

use rand::{Rng, RngCore};

/// Draw a uniform f32 in [0, 1) from a type-erased RNG.
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen()
}
