//! Ray Picking Tests
//!
//! Screen-point unprojection, triangle and AABB intersection, and scene
//! queries against transformed nodes.

use glam::{Affine3A, Vec2, Vec3};

use vitrine::assets::AssetServer;
use vitrine::picking::{intersect_subtree, ndc_from_screen, Ray};
use vitrine::resources::{BoundingBox, Geometry, MaterialKind, Mesh};
use vitrine::scene::{Camera, Node, Scene};

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

// ============================================================================
// Screen → NDC mapping
// ============================================================================

#[test]
fn ndc_center_is_origin() {
    let ndc = ndc_from_screen(Vec2::new(200.0, 250.0), Vec2::new(400.0, 500.0));
    assert!(approx(ndc.x, 0.0) && approx(ndc.y, 0.0));
}

#[test]
fn ndc_corners() {
    let viewport = Vec2::new(400.0, 500.0);
    let top_left = ndc_from_screen(Vec2::ZERO, viewport);
    assert!(approx(top_left.x, -1.0) && approx(top_left.y, 1.0));

    let bottom_right = ndc_from_screen(viewport, viewport);
    assert!(approx(bottom_right.x, 1.0) && approx(bottom_right.y, -1.0));
}

// ============================================================================
// Triangle intersection
// ============================================================================

fn z_facing_triangle() -> (Vec3, Vec3, Vec3) {
    (
        Vec3::new(-1.0, -1.0, 0.0),
        Vec3::new(1.0, -1.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
    )
}

#[test]
fn ray_hits_triangle_head_on() {
    let (v0, v1, v2) = z_facing_triangle();
    let ray = Ray {
        origin: Vec3::new(0.0, 0.0, 5.0),
        direction: Vec3::NEG_Z,
    };
    let distance = ray.intersect_triangle(v0, v1, v2).expect("hit");
    assert!(approx(distance, 5.0));
}

#[test]
fn ray_hits_backface_too() {
    // Double-sided: winding must not matter for the silhouette test.
    let (v0, v1, v2) = z_facing_triangle();
    let ray = Ray {
        origin: Vec3::new(0.0, 0.0, -5.0),
        direction: Vec3::Z,
    };
    assert!(ray.intersect_triangle(v0, v1, v2).is_some());
}

#[test]
fn ray_misses_beside_triangle() {
    let (v0, v1, v2) = z_facing_triangle();
    let ray = Ray {
        origin: Vec3::new(3.0, 0.0, 5.0),
        direction: Vec3::NEG_Z,
    };
    assert!(ray.intersect_triangle(v0, v1, v2).is_none());
}

#[test]
fn triangle_behind_ray_is_not_hit() {
    let (v0, v1, v2) = z_facing_triangle();
    let ray = Ray {
        origin: Vec3::new(0.0, 0.0, -5.0),
        direction: Vec3::NEG_Z,
    };
    assert!(ray.intersect_triangle(v0, v1, v2).is_none());
}

// ============================================================================
// AABB intersection
// ============================================================================

#[test]
fn aabb_hit_and_miss() {
    let bbox = BoundingBox {
        min: Vec3::splat(-1.0),
        max: Vec3::splat(1.0),
    };

    let hit = Ray {
        origin: Vec3::new(0.0, 0.0, 5.0),
        direction: Vec3::NEG_Z,
    };
    assert!(approx(hit.intersect_aabb(&bbox).expect("hit"), 4.0));

    let miss = Ray {
        origin: Vec3::new(5.0, 0.0, 5.0),
        direction: Vec3::NEG_Z,
    };
    assert!(miss.intersect_aabb(&bbox).is_none());

    let behind = Ray {
        origin: Vec3::new(0.0, 0.0, 5.0),
        direction: Vec3::Z,
    };
    assert!(behind.intersect_aabb(&bbox).is_none());
}

#[test]
fn aabb_from_inside_reports_zero_entry() {
    let bbox = BoundingBox {
        min: Vec3::splat(-1.0),
        max: Vec3::splat(1.0),
    };
    let ray = Ray {
        origin: Vec3::ZERO,
        direction: Vec3::Z,
    };
    assert!(approx(ray.intersect_aabb(&bbox).expect("inside"), 0.0));
}

// ============================================================================
// Camera unprojection
// ============================================================================

#[test]
fn center_ray_points_down_view_axis() {
    let mut camera = Camera::new_perspective(50.0, 0.8, 0.1, 1000.0);
    camera.update_view(&Affine3A::from_translation(Vec3::new(0.0, 0.0, 5.0)));

    let ray = Ray::from_camera(&camera, Vec2::ZERO);
    assert!(ray.direction.z < -0.999, "looking down -Z, got {:?}", ray.direction);
    assert!(approx(ray.direction.x, 0.0));
}

#[test]
fn off_center_rays_diverge() {
    let mut camera = Camera::new_perspective(50.0, 1.0, 0.1, 1000.0);
    camera.update_view(&Affine3A::from_translation(Vec3::new(0.0, 0.0, 5.0)));

    let left = Ray::from_camera(&camera, Vec2::new(-1.0, 0.0));
    let right = Ray::from_camera(&camera, Vec2::new(1.0, 0.0));
    assert!(left.direction.x < -0.1);
    assert!(right.direction.x > 0.1);
}

// ============================================================================
// Scene queries with world transforms
// ============================================================================

fn quad_geometry() -> Geometry {
    Geometry::new(
        "quad",
        vec![
            Vec3::new(-0.5, -0.5, 0.0),
            Vec3::new(0.5, -0.5, 0.0),
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::new(-0.5, 0.5, 0.0),
        ],
        None,
        Some(vec![0, 1, 2, 0, 2, 3]),
    )
}

fn quad_scene(position: Vec3, scale: f32) -> (Scene, AssetServer, vitrine::scene::NodeHandle) {
    let mut assets = AssetServer::new();
    let geometry = assets.add_geometry(quad_geometry());
    let material = assets.add_material(MaterialKind::default());

    let mut scene = Scene::new();
    let root = scene.add_node(Node::new("avatar"));
    scene.add_mesh_to_parent(Mesh::new("quad", geometry, material), root);

    let node = scene.get_node_mut(root).unwrap();
    node.transform.position = position;
    node.transform.scale = Vec3::splat(scale);
    scene.update();

    (scene, assets, root)
}

#[test]
fn hit_uses_current_world_transform() {
    // The quad geometry straddles the origin, but the node moved it to
    // x = 2. A ray at the old location must miss; one at the new must hit.
    let (scene, assets, root) = quad_scene(Vec3::new(2.0, 0.0, 0.0), 1.0);

    let at_new = Ray {
        origin: Vec3::new(2.0, 0.0, 5.0),
        direction: Vec3::NEG_Z,
    };
    let hit = intersect_subtree(&at_new, &scene, &assets, root).expect("hit");
    assert!(approx(hit.distance, 5.0));

    let at_old = Ray {
        origin: Vec3::new(0.0, 0.0, 5.0),
        direction: Vec3::NEG_Z,
    };
    assert!(intersect_subtree(&at_old, &scene, &assets, root).is_none());
}

#[test]
fn scaled_model_has_larger_silhouette() {
    let (scene, assets, root) = quad_scene(Vec3::ZERO, 4.0);

    // x = 1.5 is outside the unit quad but inside the 4x-scaled one.
    let ray = Ray {
        origin: Vec3::new(1.5, 0.0, 5.0),
        direction: Vec3::NEG_Z,
    };
    assert!(intersect_subtree(&ray, &scene, &assets, root).is_some());
}

#[test]
fn invisible_nodes_are_skipped() {
    let (mut scene, assets, root) = quad_scene(Vec3::ZERO, 1.0);
    // Hide the mesh child.
    let child = scene.get_node(root).unwrap().children()[0];
    scene.get_node_mut(child).unwrap().visible = false;

    let ray = Ray {
        origin: Vec3::new(0.0, 0.0, 5.0),
        direction: Vec3::NEG_Z,
    };
    assert!(intersect_subtree(&ray, &scene, &assets, root).is_none());
}

#[test]
fn nearest_of_stacked_meshes_wins() {
    let mut assets = AssetServer::new();
    let geometry = assets.add_geometry(quad_geometry());
    let material = assets.add_material(MaterialKind::default());

    let mut scene = Scene::new();
    let root = scene.add_node(Node::new("avatar"));
    let near = scene.add_mesh_to_parent(Mesh::new("near", geometry, material), root);
    let far = scene.add_mesh_to_parent(Mesh::new("far", geometry, material), root);
    scene.get_node_mut(near).unwrap().transform.position = Vec3::new(0.0, 0.0, 1.0);
    scene.get_node_mut(far).unwrap().transform.position = Vec3::new(0.0, 0.0, -1.0);
    scene.update();

    let ray = Ray {
        origin: Vec3::new(0.0, 0.0, 5.0),
        direction: Vec3::NEG_Z,
    };
    let hit = intersect_subtree(&ray, &scene, &assets, root).expect("hit");
    assert_eq!(hit.node, near);
    assert!(approx(hit.distance, 4.0));
}
