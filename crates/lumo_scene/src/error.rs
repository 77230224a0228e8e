//! Scene validation errors.
//!
//! These all indicate an inconsistency in the data handed over by the
//! asset layer. They are reported at scene build; tracing never starts
//! on a scene that failed validation.

use thiserror::Error;

/// Errors detected while validating primitives at scene build.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("scene contains no primitives")]
    NoGeometry,

    #[error("primitive {index} has no triangles")]
    EmptyPrimitive { index: usize },

    #[error("primitive {index}: index count {count} is not a multiple of 3")]
    BadIndexCount { index: usize, count: usize },

    #[error("primitive {index}: vertex index {vertex} out of range ({vertex_count} vertices)")]
    IndexOutOfRange {
        index: usize,
        vertex: u32,
        vertex_count: usize,
    },

    #[error("primitive {index}: {attribute} count {found} does not match vertex count {expected}")]
    AttributeCountMismatch {
        index: usize,
        attribute: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("primitive {index}: textured material requires tangents and texture coordinates")]
    MissingTextureAttributes { index: usize },
}
