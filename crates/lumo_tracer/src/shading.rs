//! Sampling and BRDF math for the path tracer.
//!
//! Everything here is pure and deterministic given its random inputs;
//! sampling functions take explicit uniform variates so callers control
//! the random stream.

use lumo_math::Vec3;
use std::f32::consts::PI;

/// Build a tangent/bitangent pair orthonormal to `normal`.
///
/// Picks a stable reference axis before Gram-Schmidt so the frame
/// stays well-defined when the normal lies on the X axis. The
/// returned frame is right-handed: `tangent x bitangent = normal`.
pub fn orthonormal_basis(normal: Vec3) -> (Vec3, Vec3) {
    let mut x_axis = Vec3::new(1.0, 0.0, 0.0);
    if (1.0 - normal.x).abs() < 1.0e-8 {
        x_axis = Vec3::new(0.0, 0.0, -1.0);
    } else if (1.0 + normal.x).abs() < 1.0e-8 {
        x_axis = Vec3::new(0.0, 0.0, 1.0);
    }

    let y_axis = normal.cross(x_axis).normalize();
    let x_axis = y_axis.cross(normal).normalize();
    (x_axis, y_axis)
}

/// Sample a direction from a cosine-weighted hemisphere around `normal`.
///
/// Disk-to-hemisphere mapping: r = sqrt(u1), phi = 2*pi*u2.
pub fn sample_cosine_hemisphere(normal: Vec3, u1: f32, u2: f32) -> Vec3 {
    let r = u1.sqrt();
    let phi = 2.0 * PI * u2;

    let x = r * phi.sin();
    let y = r * phi.cos();
    let z = (1.0 - x * x - y * y).max(0.0).sqrt();

    let (x_axis, y_axis) = orthonormal_basis(normal);
    (x * x_axis + y * y_axis + z * normal).normalize()
}

/// Density of [`sample_cosine_hemisphere`]: max(dot(n, wi), 0) / pi.
pub fn pdf_cosine_hemisphere(normal: Vec3, wi: Vec3) -> f32 {
    normal.dot(wi).max(0.0) / PI
}

/// Importance-sample the GGX normal distribution around `normal`.
///
/// alpha = roughness^2; the sampled direction lies in the upper
/// hemisphere and is used directly as the incident direction.
pub fn sample_ggx(normal: Vec3, roughness: f32, u1: f32, u2: f32) -> Vec3 {
    let alpha = roughness * roughness;
    let phi = 2.0 * PI * u1;
    let theta = ((1.0 - u2) / ((alpha * alpha - 1.0) * u2 + 1.0))
        .sqrt()
        .acos();

    let x = theta.sin() * phi.cos();
    let y = theta.sin() * phi.sin();
    let z = theta.cos();

    let (x_axis, y_axis) = orthonormal_basis(normal);
    (x * x_axis + y * y_axis + z * normal).normalize()
}

/// Density of [`sample_ggx`].
pub fn pdf_ggx(normal: Vec3, wi: Vec3, roughness: f32) -> f32 {
    let alpha = roughness * roughness;
    let alpha_sq = alpha * alpha;
    let cos_theta = normal.dot(wi).max(0.0);
    let denom = (alpha_sq - 1.0) * cos_theta * cos_theta + 1.0;
    alpha_sq * cos_theta / (PI * denom * denom)
}

/// Lambertian BRDF: diffuse albedo / pi.
pub fn brdf_lambert(diffuse: Vec3) -> Vec3 {
    diffuse / PI
}

/// Cook-Torrance specular BRDF with a GGX (Trowbridge-Reitz)
/// distribution, Schlick-GGX geometry term (k = alpha/2) and Schlick
/// Fresnel. The denominator is floored at 1e-8 to keep grazing angles
/// finite.
pub fn brdf_cook_torrance_ggx(n: Vec3, v: Vec3, l: Vec3, roughness: f32, f0: Vec3) -> Vec3 {
    let h = (v + l).normalize();

    let dot_nh = n.dot(h).max(0.0);
    let dot_nv = n.dot(v).max(0.0);
    let dot_nl = n.dot(l).max(0.0);
    let dot_vh = v.dot(h).max(0.0);

    let alpha = roughness * roughness;
    let alpha_sq = alpha * alpha;
    let denom = dot_nh * dot_nh * (alpha_sq - 1.0) + 1.0;
    let d = alpha_sq / (PI * denom * denom);

    let k = alpha / 2.0;
    let g_l = dot_nl / (dot_nl * (1.0 - k) + k);
    let g_v = dot_nv / (dot_nv * (1.0 - k) + k);
    let g = g_l * g_v;

    let f = f0 + (Vec3::ONE - f0) * (1.0 - dot_vh).powi(5);

    d * g * f / (4.0 * dot_nl * dot_nv).max(1e-8)
}

/// Decode an approximate-sRGB color to linear: pow(c, 2.2).
pub fn linear_from_gamma(c: Vec3) -> Vec3 {
    c.powf(2.2)
}

/// Encode a linear color for display: pow(c, 1/2.2).
pub fn gamma_from_linear(c: Vec3) -> Vec3 {
    c.powf(1.0 / 2.2)
}
