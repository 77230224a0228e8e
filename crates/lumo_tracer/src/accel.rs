//! Scene snapshot: triangle BVH plus the geometry-id material table.
//!
//! Built once per scene load from pre-transformed world-space triangle
//! data, then queried read-only (and concurrently) for the lifetime of
//! tracing. Rebuilding produces a new value, so a rebuild can never
//! race in-flight queries.

use lumo_math::{Aabb, Interval, Mat3, Ray, Vec2, Vec3, Vec4};
use lumo_scene::{Material, Primitive, SceneError};

/// Maximum triangles per leaf node before splitting.
const LEAF_MAX_SIZE: usize = 4;

/// Result of a nearest-hit intersection query.
///
/// `geom_id` indexes the material table and the per-geometry attribute
/// arrays; the two are populated together at build, so lookups by a
/// `Hit`'s ids always succeed.
#[derive(Debug, Clone, Copy)]
pub struct Hit {
    /// Geometry (primitive mesh) identifier
    pub geom_id: u32,
    /// Triangle index within the geometry
    pub prim_id: u32,
    /// Barycentric coordinates of the hit
    pub u: f32,
    pub v: f32,
    /// Hit distance along the (normalized) ray direction
    pub t: f32,
}

/// Baked per-geometry vertex data used for attribute interpolation.
struct Geometry {
    normals: Vec<Vec3>,
    tangents: Vec<Vec4>,
    tex_coords: Vec<Vec2>,
    indices: Vec<u32>,
}

impl Geometry {
    /// Vertex indices of a triangle.
    #[inline]
    fn triangle(&self, prim_id: u32) -> (usize, usize, usize) {
        let base = prim_id as usize * 3;
        (
            self.indices[base] as usize,
            self.indices[base + 1] as usize,
            self.indices[base + 2] as usize,
        )
    }
}

/// A world-space triangle owned by the BVH.
struct TriRef {
    geom_id: u32,
    prim_id: u32,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    bbox: Aabb,
}

impl TriRef {
    fn new(geom_id: u32, prim_id: u32, v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        let min = v0.min(v1).min(v2);
        let max = v0.max(v1).max(v2);
        // from_points pads thin dimensions, so flat triangles are fine
        let bbox = Aabb::from_points(min, max);
        Self {
            geom_id,
            prim_id,
            v0,
            v1,
            v2,
            bbox,
        }
    }
}

/// Möller-Trumbore ray-triangle intersection.
///
/// Returns (t, u, v) when the ray hits inside the triangle and the
/// given interval.
fn intersect_triangle(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3, ray_t: Interval) -> Option<(f32, f32, f32)> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);

    // Ray is parallel to triangle
    if a.abs() < 1e-8 {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);

    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);

    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    if !ray_t.contains(t) {
        return None;
    }

    Some((t, u, v))
}

/// BVH node - either a branch with two children or a leaf with triangles.
enum BvhNode {
    Branch {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Aabb,
    },
    Leaf {
        tris: Vec<TriRef>,
        bbox: Aabb,
    },
}

impl BvhNode {
    /// Recursive BVH construction.
    ///
    /// Median-split: sort triangles by centroid on the longest axis of
    /// the centroid bounds, split in half, recurse. `tris` is never
    /// empty (the scene build rejects empty geometry first).
    fn build(mut tris: Vec<TriRef>) -> Self {
        let n = tris.len();

        let bounds = tris
            .iter()
            .fold(Aabb::EMPTY, |acc, t| Aabb::surrounding(&acc, &t.bbox));

        if n <= LEAF_MAX_SIZE {
            return BvhNode::Leaf { tris, bbox: bounds };
        }

        // Choose split axis based on centroid spread
        let centroid_bounds = tris.iter().fold(Aabb::EMPTY, |acc, t| {
            let c = t.bbox.centroid();
            Aabb::surrounding(&acc, &Aabb::from_points(c, c))
        });
        let axis = centroid_bounds.longest_axis();

        tris.sort_unstable_by(|a, b| {
            let a_c = a.bbox.centroid();
            let b_c = b.bbox.centroid();
            let a_val = match axis {
                0 => a_c.x,
                1 => a_c.y,
                _ => a_c.z,
            };
            let b_val = match axis {
                0 => b_c.x,
                1 => b_c.y,
                _ => b_c.z,
            };
            a_val.partial_cmp(&b_val).unwrap_or(std::cmp::Ordering::Equal)
        });

        let mid = n / 2;
        let right_tris = tris.split_off(mid);
        let left_tris = tris;

        BvhNode::Branch {
            left: Box::new(Self::build(left_tris)),
            right: Box::new(Self::build(right_tris)),
            bbox: bounds,
        }
    }

    /// Nearest-hit traversal; tightens the interval as hits are found.
    fn hit(&self, ray: &Ray, ray_t: Interval, rec: &mut Option<Hit>) -> bool {
        match self {
            BvhNode::Leaf { tris, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return false;
                }

                let mut hit_anything = false;
                let mut closest = ray_t.max;

                for tri in tris {
                    let interval = Interval::new(ray_t.min, closest);
                    if let Some((t, u, v)) =
                        intersect_triangle(ray, tri.v0, tri.v1, tri.v2, interval)
                    {
                        hit_anything = true;
                        closest = t;
                        *rec = Some(Hit {
                            geom_id: tri.geom_id,
                            prim_id: tri.prim_id,
                            u,
                            v,
                            t,
                        });
                    }
                }
                hit_anything
            }

            BvhNode::Branch { left, right, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return false;
                }

                let hit_left = left.hit(ray, ray_t, rec);

                // Only check right up to the closest hit so far
                let right_max = if hit_left {
                    rec.as_ref().map_or(ray_t.max, |h| h.t)
                } else {
                    ray_t.max
                };
                let hit_right = right.hit(ray, Interval::new(ray_t.min, right_max), rec);

                hit_left || hit_right
            }
        }
    }

    /// Any-hit traversal for shadow rays; stops at the first hit.
    fn occluded(&self, ray: &Ray, ray_t: Interval) -> bool {
        match self {
            BvhNode::Leaf { tris, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return false;
                }
                tris.iter().any(|tri| {
                    intersect_triangle(ray, tri.v0, tri.v1, tri.v2, ray_t).is_some()
                })
            }

            BvhNode::Branch { left, right, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return false;
                }
                left.occluded(ray, ray_t) || right.occluded(ray, ray_t)
            }
        }
    }
}

/// Immutable scene snapshot: the intersection service plus the
/// geometry-id material table, built together in one pass.
pub struct TracerScene {
    root: BvhNode,
    geometries: Vec<Geometry>,
    materials: Vec<Material>,
    triangle_count: usize,
}

impl TracerScene {
    /// Build a snapshot from the asset layer's primitives.
    ///
    /// Transforms are baked here: positions by the model matrix,
    /// normals and tangents by the inverse-transpose of its 3x3 part
    /// (renormalized), and the tangent handedness sign folded into the
    /// tangent vector.
    pub fn build(primitives: &[Primitive]) -> Result<Self, SceneError> {
        if primitives.is_empty() {
            return Err(SceneError::NoGeometry);
        }

        let mut geometries = Vec::with_capacity(primitives.len());
        let mut materials = Vec::with_capacity(primitives.len());
        let mut tris = Vec::new();

        for (index, prim) in primitives.iter().enumerate() {
            prim.validate(index)?;

            let geom_id = index as u32;
            let normal_matrix = Mat3::from_mat4(prim.transform).inverse().transpose();

            let positions: Vec<Vec3> = prim
                .positions
                .iter()
                .map(|&p| prim.transform.transform_point3(p))
                .collect();
            let normals: Vec<Vec3> = prim
                .normals
                .iter()
                .map(|&n| (normal_matrix * n).normalize())
                .collect();
            let tangents: Vec<Vec4> = prim
                .tangents
                .iter()
                .map(|&t| {
                    let baked = normal_matrix * (Vec3::new(t.x, t.y, t.z) * t.w);
                    Vec4::new(baked.x, baked.y, baked.z, 1.0)
                })
                .collect();

            for (prim_id, tri) in prim.indices.chunks(3).enumerate() {
                tris.push(TriRef::new(
                    geom_id,
                    prim_id as u32,
                    positions[tri[0] as usize],
                    positions[tri[1] as usize],
                    positions[tri[2] as usize],
                ));
            }

            geometries.push(Geometry {
                normals,
                tangents,
                tex_coords: prim.tex_coords.clone(),
                indices: prim.indices.clone(),
            });
            materials.push(prim.material.clone());
        }

        let triangle_count = tris.len();
        let root = BvhNode::build(tris);

        log::info!(
            "Built scene snapshot: {} geometries, {} triangles",
            geometries.len(),
            triangle_count
        );

        Ok(Self {
            root,
            geometries,
            materials,
            triangle_count,
        })
    }

    /// Find the nearest hit along the ray within `ray_t`.
    pub fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<Hit> {
        let mut rec = None;
        self.root.hit(ray, ray_t, &mut rec);
        rec
    }

    /// Test whether anything blocks the ray within `ray_t`.
    pub fn is_occluded(&self, ray: &Ray, ray_t: Interval) -> bool {
        self.root.occluded(ray, ray_t)
    }

    /// Material of a geometry.
    ///
    /// Ids come from [`Hit`]s produced by this snapshot; the tables are
    /// populated in lockstep at build, so the lookup always succeeds.
    #[inline]
    pub fn material(&self, geom_id: u32) -> &Material {
        &self.materials[geom_id as usize]
    }

    /// Interpolate the shading normal at a hit (not normalized).
    pub fn interpolate_normal(&self, geom_id: u32, prim_id: u32, u: f32, v: f32) -> Vec3 {
        let geo = &self.geometries[geom_id as usize];
        let (i0, i1, i2) = geo.triangle(prim_id);
        let w = 1.0 - u - v;
        geo.normals[i0] * w + geo.normals[i1] * u + geo.normals[i2] * v
    }

    /// Interpolate the tangent (xyz baked with handedness, w = 1).
    pub fn interpolate_tangent(&self, geom_id: u32, prim_id: u32, u: f32, v: f32) -> Vec4 {
        let geo = &self.geometries[geom_id as usize];
        let (i0, i1, i2) = geo.triangle(prim_id);
        let w = 1.0 - u - v;
        geo.tangents[i0] * w + geo.tangents[i1] * u + geo.tangents[i2] * v
    }

    /// Interpolate the texture coordinate at a hit.
    pub fn interpolate_tex_coord(&self, geom_id: u32, prim_id: u32, u: f32, v: f32) -> Vec2 {
        let geo = &self.geometries[geom_id as usize];
        let (i0, i1, i2) = geo.triangle(prim_id);
        let w = 1.0 - u - v;
        geo.tex_coords[i0] * w + geo.tex_coords[i1] * u + geo.tex_coords[i2] * v
    }

    /// Total triangle count across all geometries.
    pub fn triangle_count(&self) -> usize {
        self.triangle_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumo_math::Mat4;
    use lumo_scene::Material;

    fn quad_at_z(z: f32) -> Primitive {
        // Unit quad in the XY plane facing +Z
        Primitive::quad(
            Vec3::new(0.0, 0.0, z),
            Vec3::X,
            Vec3::Y,
            Material::default(),
        )
    }

    #[test]
    fn test_intersect_quad() {
        let scene = TracerScene::build(&[quad_at_z(-2.0)]).unwrap();

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let hit = scene
            .intersect(&ray, Interval::new(0.001, f32::INFINITY))
            .expect("ray through quad center should hit");

        assert_eq!(hit.geom_id, 0);
        assert!((hit.t - 2.0).abs() < 1e-4);

        let n = scene
            .interpolate_normal(hit.geom_id, hit.prim_id, hit.u, hit.v)
            .normalize();
        assert!((n - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_nearest_hit_wins() {
        let scene = TracerScene::build(&[quad_at_z(-5.0), quad_at_z(-2.0)]).unwrap();

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let hit = scene
            .intersect(&ray, Interval::new(0.001, f32::INFINITY))
            .unwrap();

        assert_eq!(hit.geom_id, 1);
        assert!((hit.t - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_miss() {
        let scene = TracerScene::build(&[quad_at_z(-2.0)]).unwrap();

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0));
        assert!(scene
            .intersect(&ray, Interval::new(0.001, f32::INFINITY))
            .is_none());
    }

    #[test]
    fn test_occlusion() {
        let scene = TracerScene::build(&[quad_at_z(-2.0)]).unwrap();

        let blocked = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        assert!(scene.is_occluded(&blocked, Interval::new(0.0, f32::INFINITY)));

        let clear = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0));
        assert!(!scene.is_occluded(&clear, Interval::new(0.0, f32::INFINITY)));
    }

    #[test]
    fn test_transform_baking() {
        let quad = quad_at_z(0.0).with_transform(Mat4::from_translation(Vec3::new(0.0, 0.0, -3.0)));
        let scene = TracerScene::build(&[quad]).unwrap();

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let hit = scene
            .intersect(&ray, Interval::new(0.001, f32::INFINITY))
            .expect("translated quad should be hit at z=-3");
        assert!((hit.t - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_normals_under_nonuniform_scale() {
        // Scaling the quad in X must leave its +Z normal intact only
        // because normals go through the inverse-transpose.
        let quad = quad_at_z(-2.0).with_transform(Mat4::from_scale(Vec3::new(4.0, 1.0, 1.0)));
        let scene = TracerScene::build(&[quad]).unwrap();

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let hit = scene
            .intersect(&ray, Interval::new(0.001, f32::INFINITY))
            .unwrap();
        let n = scene
            .interpolate_normal(hit.geom_id, hit.prim_id, hit.u, hit.v)
            .normalize();
        assert!((n - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_tex_coord_interpolation() {
        let scene = TracerScene::build(&[quad_at_z(-2.0)]).unwrap();

        // Quad center has uv (0.5, 0.5)
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let hit = scene
            .intersect(&ray, Interval::new(0.001, f32::INFINITY))
            .unwrap();
        let uv = scene.interpolate_tex_coord(hit.geom_id, hit.prim_id, hit.u, hit.v);
        assert!((uv - Vec2::splat(0.5)).length() < 1e-4);
    }

    #[test]
    fn test_empty_scene_rejected() {
        assert!(matches!(
            TracerScene::build(&[]),
            Err(SceneError::NoGeometry)
        ));
    }

    #[test]
    fn test_many_triangles_bvh() {
        // Grid of quads so the BVH actually branches
        let mut prims = Vec::new();
        for i in 0..8 {
            for j in 0..8 {
                prims.push(Primitive::quad(
                    Vec3::new(i as f32 * 2.0, j as f32 * 2.0, -4.0),
                    Vec3::X,
                    Vec3::Y,
                    Material::default(),
                ));
            }
        }
        let scene = TracerScene::build(&prims).unwrap();
        assert_eq!(scene.triangle_count(), 128);

        // Hit the quad at (6, 4)
        let ray = Ray::new(Vec3::new(6.0, 4.0, 0.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = scene
            .intersect(&ray, Interval::new(0.001, f32::INFINITY))
            .expect("grid quad should be hit");
        assert!((hit.t - 4.0).abs() < 1e-4);
        assert_eq!(hit.geom_id, 3 * 8 + 2);
    }
}
