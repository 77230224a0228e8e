//! Recursive Monte Carlo radiance estimator.
//!
//! Unidirectional path tracing with next-event estimation toward a
//! single directional light. Each bounce evaluates the direct term
//! with a shadow ray, then stochastically picks one of the diffuse or
//! specular lobes (or absorbs) for the indirect bounce.

use lumo_math::{Interval, Ray, Vec3};
use lumo_scene::DirectionalLight;
use rand::RngCore;

use crate::accel::TracerScene;
use crate::gen_f32;
use crate::shading::{
    brdf_cook_torrance_ggx, brdf_lambert, linear_from_gamma, pdf_cosine_hemisphere, pdf_ggx,
    sample_cosine_hemisphere, sample_ggx,
};

/// Ray-origin offset that avoids self-intersection.
const SELF_INTERSECT_EPS: f32 = 0.001;

/// Roughness floor applied wherever the GGX lobe is evaluated; a true
/// zero makes the distribution singular.
const MIN_ROUGHNESS: f32 = 0.01;

/// Base reflectance of dielectrics.
const DIELECTRIC_F0: f32 = 0.04;

/// Split the lobe-selection budget between diffuse and specular.
///
/// `Pr` is the max channel of `diffuse + specular`; it is divided
/// between the two lobes in proportion to their channel sums, and the
/// remainder `1 - Pd - Ps` is the absorption probability. The
/// channel-max numerator with channel-sum ratios is a tuned heuristic,
/// kept as-is. A zero total means absorb with probability 1.
pub fn lobe_probabilities(diffuse: Vec3, specular: Vec3) -> (f32, f32) {
    let pr = (diffuse + specular).max_element();

    let sum_d = diffuse.x + diffuse.y + diffuse.z;
    let sum_s = specular.x + specular.y + specular.z;
    let total = sum_d + sum_s;
    if total <= 0.0 {
        return (0.0, 0.0);
    }

    (pr * sum_d / total, pr * sum_s / total)
}

/// Shading inputs decoded at a hit point.
struct ShadingPoint {
    normal: Vec3,
    diffuse: Vec3,
    f0: Vec3,
    roughness: f32,
}

/// The path tracer core. Borrows the scene snapshot and light;
/// cheap to copy into worker tasks.
#[derive(Clone, Copy)]
pub struct PathTracer<'a> {
    scene: &'a TracerScene,
    light: &'a DirectionalLight,
    max_depth: u32,
    clamp: f32,
}

impl<'a> PathTracer<'a> {
    pub fn new(
        scene: &'a TracerScene,
        light: &'a DirectionalLight,
        max_depth: u32,
        clamp: f32,
    ) -> Self {
        Self {
            scene,
            light,
            max_depth,
            clamp,
        }
    }

    /// Estimate the radiance arriving along `ray`.
    ///
    /// `throughput` is the path attenuation accumulated so far and
    /// `depth` the current bounce count; primary rays start at
    /// `(1,1,1)` and 0. The recursion is capped hard at `max_depth`
    /// and the result clamped to `[0, clamp]` per channel.
    pub fn estimate_radiance(
        &self,
        ray: &Ray,
        throughput: Vec3,
        depth: u32,
        rng: &mut dyn RngCore,
    ) -> Vec3 {
        if depth > self.max_depth {
            return Vec3::ZERO;
        }

        let hit = match self
            .scene
            .intersect(ray, Interval::new(SELF_INTERSECT_EPS, f32::INFINITY))
        {
            Some(hit) => hit,
            None => return Vec3::ZERO,
        };

        let hit_point = ray.at(hit.t);
        let wo = -ray.direction.normalize();
        let point = self.decode_shading_point(&hit);
        let normal = point.normal;

        let mut radiance = Vec3::ZERO;

        // Direct term: one shadow ray toward the light
        let to_light = self.light.illumination_dir();
        let shadow = Ray::new(hit_point + normal * SELF_INTERSECT_EPS, to_light);
        if !self
            .scene
            .is_occluded(&shadow, Interval::new(0.0, f32::INFINITY))
        {
            let n_dot_l = normal.dot(to_light).max(0.0);
            let brdf = brdf_lambert(point.diffuse)
                + brdf_cook_torrance_ggx(normal, wo, to_light, point.roughness, point.f0);
            radiance += throughput * brdf * n_dot_l * self.light.color * self.light.power;
        }

        // Indirect term: pick one lobe or absorb
        let (p_diffuse, p_specular) = lobe_probabilities(point.diffuse, point.f0);
        let xi = gen_f32(rng);

        if xi < p_diffuse {
            let wi = sample_cosine_hemisphere(normal, gen_f32(rng), gen_f32(rng));
            let pdf = pdf_cosine_hemisphere(normal, wi);
            if pdf > 1e-8 {
                let brdf = brdf_lambert(point.diffuse);
                let weight = throughput * normal.dot(wi).max(0.0) * brdf / (pdf * p_diffuse);
                let bounce = Ray::new(hit_point, wi);
                radiance += weight * self.estimate_radiance(&bounce, weight, depth + 1, rng);
            }
        } else if xi < p_diffuse + p_specular {
            let wi = sample_ggx(normal, point.roughness, gen_f32(rng), gen_f32(rng));
            let pdf = pdf_ggx(normal, wi, point.roughness);
            if pdf > 1e-8 {
                let brdf = brdf_cook_torrance_ggx(normal, wo, wi, point.roughness, point.f0);
                let weight = throughput * normal.dot(wi).max(0.0) * brdf / (pdf * p_specular);
                let bounce = Ray::new(hit_point, wi);
                radiance += weight * self.estimate_radiance(&bounce, weight, depth + 1, rng);
            }
        }
        // Anything else is absorption

        radiance.clamp(Vec3::ZERO, Vec3::splat(self.clamp))
    }

    /// Decode the shading inputs at a hit: interpolated (and possibly
    /// normal-mapped) normal, diffuse albedo, F0 and roughness.
    fn decode_shading_point(&self, hit: &crate::accel::Hit) -> ShadingPoint {
        let scene = self.scene;
        let mut normal = scene
            .interpolate_normal(hit.geom_id, hit.prim_id, hit.u, hit.v)
            .normalize();

        let material = scene.material(hit.geom_id);
        let mut roughness = material.roughness;

        let albedo = if let (Some(albedo_map), Some(normal_map), Some(roughness_map)) = (
            &material.albedo_map,
            &material.normal_map,
            &material.roughness_map,
        ) {
            let uv = scene.interpolate_tex_coord(hit.geom_id, hit.prim_id, hit.u, hit.v);

            roughness *= roughness_map.sample_channel(uv.x, uv.y, 0);

            // Tangent frame from the interpolated tangent; handedness
            // is already baked into the vector at scene build
            let t4 = scene.interpolate_tangent(hit.geom_id, hit.prim_id, hit.u, hit.v);
            let tangent = Vec3::new(t4.x, t4.y, t4.z).normalize();
            let bitangent = normal.cross(tangent).normalize();

            let texel = normal_map.sample(uv.x, uv.y);
            let tangent_normal =
                Vec3::new(texel.x * 2.0 - 1.0, texel.y * 2.0 - 1.0, texel.z);
            normal = (tangent_normal.x * tangent
                + tangent_normal.y * bitangent
                + tangent_normal.z * normal)
                .normalize();

            linear_from_gamma(albedo_map.sample(uv.x, uv.y))
                * linear_from_gamma(material.base_color)
        } else {
            linear_from_gamma(material.base_color)
        };

        let diffuse = albedo * (1.0 - material.metallic);
        let f0 = Vec3::splat(DIELECTRIC_F0).lerp(albedo, material.metallic);

        ShadingPoint {
            normal,
            diffuse,
            f0,
            roughness: roughness.max(MIN_ROUGHNESS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumo_scene::{Material, Primitive, Texture};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f32::consts::PI;
    use std::sync::Arc;

    /// Quad at y=1 facing downward (-Y), lit from below.
    fn ceiling_scene(material: Material) -> (TracerScene, DirectionalLight) {
        let quad = Primitive::quad(Vec3::new(0.0, 1.0, 0.0), Vec3::X * 2.0, Vec3::Z * 2.0, material);
        let scene = TracerScene::build(&[quad]).unwrap();
        // Shines upward, so surfaces facing -Y are lit head-on
        let light = DirectionalLight::new(Vec3::Y, Vec3::ONE, PI);
        (scene, light)
    }

    fn white_diffuse() -> Material {
        Material::new(Vec3::ONE, 1.0, 0.0)
    }

    #[test]
    fn test_depth_cap_returns_black() {
        let (scene, light) = ceiling_scene(white_diffuse());
        let tracer = PathTracer::new(&scene, &light, 5, 15.0);
        let mut rng = StdRng::seed_from_u64(1);

        let ray = Ray::new(Vec3::ZERO, Vec3::Y);
        let result = tracer.estimate_radiance(&ray, Vec3::ONE, 6, &mut rng);
        assert_eq!(result, Vec3::ZERO);
    }

    #[test]
    fn test_miss_returns_black() {
        let (scene, light) = ceiling_scene(white_diffuse());
        let tracer = PathTracer::new(&scene, &light, 5, 15.0);
        let mut rng = StdRng::seed_from_u64(2);

        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Y);
        let result = tracer.estimate_radiance(&ray, Vec3::ONE, 0, &mut rng);
        assert_eq!(result, Vec3::ZERO);
    }

    #[test]
    fn test_head_on_diffuse_quad() {
        // White Lambertian quad lit head-on by a light of power pi:
        // the diffuse term alone contributes pi * (1/pi) = 1 and the
        // residual dielectric specular adds F0/4, so every sample is
        // deterministic at ~1.01 (indirect rays always escape).
        let (scene, light) = ceiling_scene(white_diffuse());
        let tracer = PathTracer::new(&scene, &light, 5, 15.0);
        let mut rng = StdRng::seed_from_u64(3);

        let ray = Ray::new(Vec3::ZERO, Vec3::Y);
        for _ in 0..32 {
            let result = tracer.estimate_radiance(&ray, Vec3::ONE, 0, &mut rng);
            assert!((result.x - 1.01).abs() < 1e-3, "radiance = {result:?}");
            assert!((result.y - 1.01).abs() < 1e-3);
            assert!((result.z - 1.01).abs() < 1e-3);
        }
    }

    #[test]
    fn test_shadowed_quad_is_black() {
        // A second quad below blocks the shadow ray; with depth capped
        // at 0 there is no indirect path either.
        let ceiling = Primitive::quad(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::X * 2.0,
            Vec3::Z * 2.0,
            white_diffuse(),
        );
        let blocker = Primitive::quad(
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::X * 2.0,
            Vec3::Z * 2.0,
            white_diffuse(),
        );
        let scene = TracerScene::build(&[ceiling, blocker]).unwrap();
        let light = DirectionalLight::new(Vec3::Y, Vec3::ONE, PI);

        let tracer = PathTracer::new(&scene, &light, 0, 15.0);
        let mut rng = StdRng::seed_from_u64(4);

        // Start above the blocker so only the ceiling is hit first
        let ray = Ray::new(Vec3::ZERO, Vec3::Y);
        let result = tracer.estimate_radiance(&ray, Vec3::ONE, 0, &mut rng);
        assert_eq!(result, Vec3::ZERO);
    }

    #[test]
    fn test_textured_quad_matches_decoded_albedo() {
        // Solid 0.5 albedo texel on a white base color, identity
        // normal map, full roughness. Expected direct term:
        // power * (albedo/pi * pi + F0/4) with albedo = 0.5^2.2.
        let albedo = Arc::new(Texture::solid_color(Vec3::splat(0.5)));
        let normal = Arc::new(Texture::solid_color(Vec3::new(0.5, 0.5, 1.0)));
        let rough = Arc::new(Texture::solid_color(Vec3::ONE));
        let material = Material::new(Vec3::ONE, 1.0, 0.0).with_maps(albedo, normal, rough);

        let (scene, light) = ceiling_scene(material);
        let tracer = PathTracer::new(&scene, &light, 5, 15.0);
        let mut rng = StdRng::seed_from_u64(5);

        let expected = 0.5f32.powf(2.2) + 0.01;
        let ray = Ray::new(Vec3::ZERO, Vec3::Y);
        for _ in 0..16 {
            let result = tracer.estimate_radiance(&ray, Vec3::ONE, 0, &mut rng);
            assert!(
                (result.x - expected).abs() < 1e-3,
                "radiance = {result:?}, expected {expected}"
            );
        }
    }

    #[test]
    fn test_clamp_bounds_output() {
        let (scene, light_unused) = ceiling_scene(white_diffuse());
        // Absurdly bright light to force the clamp
        let light = DirectionalLight::new(light_unused.direction, Vec3::ONE, 1.0e6);
        let tracer = PathTracer::new(&scene, &light, 5, 15.0);
        let mut rng = StdRng::seed_from_u64(6);

        let ray = Ray::new(Vec3::ZERO, Vec3::Y);
        let result = tracer.estimate_radiance(&ray, Vec3::ONE, 0, &mut rng);
        assert_eq!(result, Vec3::splat(15.0));
    }

    #[test]
    fn test_lobe_probabilities_white_diffuse() {
        // diffuse (1,1,1), specular (.04,.04,.04): Pr = 1.04,
        // Pd = 1.04 * 3 / 3.12 = 1, Ps = 0.04
        let (pd, ps) = lobe_probabilities(Vec3::ONE, Vec3::splat(0.04));
        assert!((pd - 1.0).abs() < 1e-5);
        assert!((ps - 0.04).abs() < 1e-5);
    }

    #[test]
    fn test_lobe_probabilities_metal_never_diffuse() {
        // A metal has zero diffuse albedo, so the diffuse lobe must
        // never be selected.
        let f0 = Vec3::new(0.9, 0.6, 0.3);
        let (pd, ps) = lobe_probabilities(Vec3::ZERO, f0);
        assert_eq!(pd, 0.0);
        assert!((ps - 0.9).abs() < 1e-5);

        let mut rng = StdRng::seed_from_u64(7);
        let mut diffuse_picks = 0u32;
        let mut specular_picks = 0u32;
        for _ in 0..10_000 {
            let xi = gen_f32(&mut rng);
            if xi < pd {
                diffuse_picks += 1;
            } else if xi < pd + ps {
                specular_picks += 1;
            }
        }
        assert_eq!(diffuse_picks, 0);
        // Ps = 0.9, so roughly 9000 of 10000 draws pick specular
        assert!((8700..=9300).contains(&specular_picks), "{specular_picks}");
    }

    #[test]
    fn test_lobe_probabilities_black_absorbs() {
        let (pd, ps) = lobe_probabilities(Vec3::ZERO, Vec3::ZERO);
        assert_eq!((pd, ps), (0.0, 0.0));
    }
}
