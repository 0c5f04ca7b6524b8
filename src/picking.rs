//! Ray picking.
//!
//! Builds a world-space ray from a screen point and the active camera, then
//! tests it against mesh geometry under each node's CURRENT world matrix,
//! so a scaled or repositioned model is hit where it is drawn rather than
//! where its raw geometry lives. A per-node bounding-box test prefilters before
//! the per-triangle Möller–Trumbore pass.

use glam::{Mat4, Vec2, Vec3};

use crate::assets::AssetServer;
use crate::resources::BoundingBox;
use crate::scene::{Camera, NodeHandle, Scene};

#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Nearest intersection found by a pick query.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub node: NodeHandle,
    pub distance: f32,
}

/// Screen point (pixels, origin top-left) → normalized device coordinates.
#[must_use]
pub fn ndc_from_screen(position: Vec2, viewport: Vec2) -> Vec2 {
    Vec2::new(
        (position.x / viewport.x) * 2.0 - 1.0,
        -((position.y / viewport.y) * 2.0 - 1.0),
    )
}

impl Ray {
    /// Unprojects an NDC point through the camera into a world-space ray.
    #[must_use]
    pub fn from_camera(camera: &Camera, ndc: Vec2) -> Self {
        Self::from_view_projection_inverse(&camera.view_projection_inverse(), ndc)
    }

    /// wgpu clip space has depth in [0, 1]; unproject at both planes and
    /// shoot through them.
    #[must_use]
    pub fn from_view_projection_inverse(inverse: &Mat4, ndc: Vec2) -> Self {
        let near = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        Self {
            origin: near,
            direction: (far - near).normalize_or_zero(),
        }
    }

    /// Slab test; returns the entry distance when the ray hits the box.
    #[must_use]
    pub fn intersect_aabb(&self, bbox: &BoundingBox) -> Option<f32> {
        let inv_dir = self.direction.recip();
        let t1 = (bbox.min - self.origin) * inv_dir;
        let t2 = (bbox.max - self.origin) * inv_dir;

        let t_min = t1.min(t2);
        let t_max = t1.max(t2);

        let t_enter = t_min.max_element();
        let t_exit = t_max.min_element();

        if t_enter <= t_exit && t_exit >= 0.0 {
            Some(t_enter.max(0.0))
        } else {
            None
        }
    }

    /// Möller–Trumbore, double-sided. Returns the hit distance along the
    /// ray, if any.
    #[must_use]
    pub fn intersect_triangle(&self, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
        const EPSILON: f32 = 1e-7;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);

        if det.abs() < EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = self.origin - v0;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(q) * inv_det;
        (t > EPSILON).then_some(t)
    }
}

/// Nearest intersection between a ray and the meshes under `root`
/// (inclusive), using current world matrices. Invisible nodes are skipped.
#[must_use]
pub fn intersect_subtree(
    ray: &Ray,
    scene: &Scene,
    assets: &AssetServer,
    root: NodeHandle,
) -> Option<RayHit> {
    let mut nearest: Option<RayHit> = None;
    let mut stack = vec![root];

    while let Some(handle) = stack.pop() {
        let Some(node) = scene.get_node(handle) else {
            continue;
        };
        if !node.visible {
            continue;
        }
        stack.extend_from_slice(node.children());

        let Some(geometry) = node
            .mesh
            .and_then(|key| scene.meshes.get(key))
            .and_then(|mesh| assets.get_geometry(mesh.geometry))
        else {
            continue;
        };

        let world = node.transform.world_matrix();
        let world_bbox = geometry.bounding_box.transform(world);
        if ray.intersect_aabb(&world_bbox).is_none() {
            continue;
        }

        for [a, b, c] in geometry.triangles() {
            let v0 = world.transform_point3(a);
            let v1 = world.transform_point3(b);
            let v2 = world.transform_point3(c);
            if let Some(distance) = ray.intersect_triangle(v0, v1, v2) {
                let closer = nearest.is_none_or(|hit| distance < hit.distance);
                if closer {
                    nearest = Some(RayHit {
                        node: handle,
                        distance,
                    });
                }
            }
        }
    }

    nearest
}
