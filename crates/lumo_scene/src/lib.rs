//! Lumo Scene - renderer-facing scene data for the path tracer.
//!
//! This crate provides:
//!
//! - **Geometry**: [`Primitive`], an indexed triangle mesh with
//!   per-vertex normal / tangent / texcoord attributes and a model
//!   transform, as handed over by the asset layer.
//! - **Shading inputs**: [`Material`] and [`Texture`] (bilinear sampler).
//! - **Lighting**: [`DirectionalLight`].
//!
//! Everything here is immutable once the tracer's scene snapshot has
//! been built from it; rebuilding replaces the snapshot wholesale.

pub mod error;
pub mod light;
pub mod material;
pub mod primitive;
pub mod texture;

// Re-export commonly used types
pub use error::SceneError;
pub use light::DirectionalLight;
pub use material::Material;
pub use primitive::Primitive;
pub use texture::{Texture, TextureError};
