//! Viewer Tests
//!
//! Tests for:
//! - Surface sizing with the capped device pixel ratio
//! - Scale policy (tiered and fit-to) over the full extent range
//! - Material darkening policy across both material variants
//! - Resize idempotence
//! - End-to-end click interaction against a mock asset

use glam::{Quat, Vec2, Vec3};

use vitrine::animation::{
    AnimationClip, InterpolationMode, KeyframeTrack, TargetPath, Track, TrackData, TrackMeta,
};
use vitrine::app::input::Input;
use vitrine::assets::{ModelAsset, ModelNode, ModelPrimitive};
use vitrine::config::{ClipMatchRule, MaterialPolicy, ScalePolicy, ViewerConfig};
use vitrine::interaction::TriggerPhase;
use vitrine::resources::{BasicMaterialData, Geometry, MaterialKind, PhysicalMaterialData};
use vitrine::viewer::{surface_extent, Viewer};

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

// ============================================================================
// Surface sizing
// ============================================================================

#[test]
fn surface_matches_logical_size_at_ratio_one() {
    assert_eq!(surface_extent((400, 500), 1.0, 2.0), (400, 500));
}

#[test]
fn surface_scales_with_pixel_ratio() {
    assert_eq!(surface_extent((400, 500), 2.0, 2.0), (800, 1000));
    assert_eq!(surface_extent((400, 500), 1.5, 2.0), (600, 750));
}

#[test]
fn surface_pixel_ratio_caps_at_two() {
    // A 3x display renders at the 2x cap, like the canvas contract.
    assert_eq!(surface_extent((400, 500), 3.0, 2.0), (800, 1000));
}

#[test]
fn surface_never_degenerates() {
    assert_eq!(surface_extent((0, 0), 1.0, 2.0), (1, 1));
    assert_eq!(surface_extent((10, 10), 0.0, 2.0), (10, 10));
}

// ============================================================================
// Scale policy
// ============================================================================

#[test]
fn tiered_scale_shrinks_large_models() {
    let policy = ScalePolicy::default();
    let scale = policy.scale_for(4.0);
    assert!(approx(scale * 4.0, 1.8), "4-unit model lands at 1.8");
}

#[test]
fn tiered_scale_grows_small_models() {
    let policy = ScalePolicy::default();
    let scale = policy.scale_for(0.2);
    assert!(approx(scale * 0.2, 2.5), "0.2-unit model lands at 2.5");
}

#[test]
fn tiered_scale_default_band() {
    let policy = ScalePolicy::default();
    assert!(approx(policy.scale_for(1.0), 1.5));
    assert!(approx(policy.scale_for(2.0), 1.5));
    assert!(approx(policy.scale_for(0.5), 1.5));
}

#[test]
fn fit_to_scale_normalizes_any_extent() {
    let policy = ScalePolicy::FitTo(1.5);
    for m in [0.01_f32, 0.5, 1.0, 7.3, 400.0] {
        assert!(approx(policy.scale_for(m) * m, 1.5), "m={m}");
    }
}

#[test]
fn scaled_extent_stays_in_target_range_for_all_extents() {
    // Property from the sizing contract: for any m > 0 the scaled size is
    // bounded (here by the default band 0.75..=3.0).
    let policy = ScalePolicy::default();
    let mut m = 0.001_f32;
    while m < 1000.0 {
        let scaled = policy.scale_for(m) * m;
        assert!(
            (0.74..=3.01).contains(&scaled),
            "m={m}: scaled extent {scaled} out of range"
        );
        m *= 1.37;
    }
}

#[test]
fn degenerate_extent_gets_identity_scale() {
    let policy = ScalePolicy::default();
    assert!(approx(policy.scale_for(0.0), 1.0));
    assert!(approx(policy.scale_for(f32::NAN), 1.0));
}

// ============================================================================
// Clip match rules
// ============================================================================

#[test]
fn substring_rule_matches_any_fragment() {
    let rule = ClipMatchRule::any_of(&["wave", "003"]);
    assert!(rule.matches("mixamo.com wave"));
    assert!(rule.matches("clip.003"));
    assert!(!rule.matches("stumble"));
}

#[test]
fn exact_rule_requires_full_name() {
    let rule = ClipMatchRule::Exact("mixamo.com:003".to_string());
    assert!(rule.matches("mixamo.com:003"));
    assert!(!rule.matches("mixamo.com:0031"));
    assert!(!rule.matches("003"));
}

// ============================================================================
// Material policy
// ============================================================================

#[test]
fn physical_material_is_darkened_and_flattened() {
    let policy = MaterialPolicy::default();
    let mut material = MaterialKind::Physical(PhysicalMaterialData {
        color: Vec3::splat(0.5),
        emissive: Vec3::splat(0.2),
        metalness: 0.9,
        roughness: 0.1,
        opacity: 0.5,
        transparent: true,
    });
    material.apply_policy(&policy);

    let MaterialKind::Physical(m) = material else {
        panic!("variant must be preserved");
    };
    assert!(approx(m.color.x, 0.35), "30% darker, got {}", m.color.x);
    assert!(approx(m.metalness, 0.4));
    assert!(approx(m.roughness, 0.6));
    assert_eq!(m.emissive, Vec3::ZERO);
    assert!(!m.transparent);
    assert!(approx(m.opacity, 1.0));
}

#[test]
fn near_black_colors_clamp_to_floor() {
    let policy = MaterialPolicy::default();
    let mut material = MaterialKind::Physical(PhysicalMaterialData {
        color: Vec3::splat(0.05),
        ..Default::default()
    });
    material.apply_policy(&policy);
    assert_eq!(material.color(), policy.dark_floor);
}

#[test]
fn basic_material_gets_color_treatment_only() {
    let policy = MaterialPolicy::default();
    let mut material = MaterialKind::Basic(BasicMaterialData {
        color: Vec3::ONE,
        opacity: 0.3,
        transparent: true,
    });
    material.apply_policy(&policy);

    let MaterialKind::Basic(m) = material else {
        panic!("variant must be preserved");
    };
    assert!(approx(m.color.x, 0.7));
    assert!(!m.transparent);
    assert!(approx(m.opacity, 1.0));
}

// ============================================================================
// Mock asset plumbing
// ============================================================================

/// Unit quad in the XY plane, centered at the origin.
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

fn hold_clip(name: &str, duration: f32) -> AnimationClip {
    AnimationClip::new(
        name.to_string(),
        vec![Track {
            meta: TrackMeta {
                node_index: 0,
                target: TargetPath::Translation,
            },
            data: TrackData::Vector3(KeyframeTrack::new(
                vec![0.0, duration],
                vec![Vec3::ZERO, Vec3::ZERO],
                InterpolationMode::Linear,
            )),
        }],
    )
}

fn mock_asset(clips: Vec<AnimationClip>) -> ModelAsset {
    ModelAsset {
        name: "mock.glb".to_string(),
        nodes: vec![ModelNode {
            name: "root".to_string(),
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            children: vec![],
            primitives: vec![ModelPrimitive {
                geometry: quad_geometry(),
                material_index: 0,
            }],
            skin: None,
        }],
        roots: vec![0],
        materials: vec![MaterialKind::default()],
        skins: vec![],
        clips,
    }
}

fn viewer_with(clips: Vec<AnimationClip>) -> Viewer {
    let config = ViewerConfig::default();
    let (w, h) = config.window_size;
    let mut viewer = Viewer::new(config, w as f32 / h as f32);
    viewer.insert_model(mock_asset(clips));
    viewer
}

const VIEWPORT: Vec2 = Vec2::new(400.0, 500.0);
const CENTER: Vec2 = Vec2::new(200.0, 250.0);
const CORNER: Vec2 = Vec2::new(5.0, 5.0);

// ============================================================================
// Model insertion
// ============================================================================

#[test]
fn insert_applies_scale_policy() {
    let viewer = viewer_with(vec![]);
    let root = viewer.model_root().expect("model inserted");
    let scale = viewer.scene.get_node(root).unwrap().transform.scale;
    // Quad extent 1.0 sits in the default band.
    assert!(approx(scale.x, 1.5), "got {scale}");
}

#[test]
fn insert_is_once_only() {
    let mut viewer = viewer_with(vec![]);
    let root = viewer.model_root().unwrap();
    let again = viewer.insert_model(mock_asset(vec![]));
    assert_eq!(root, again, "second insert is ignored");
    assert_eq!(viewer.assets.geometry_count(), 1);
}

#[test]
fn insert_without_clips_disables_interaction() {
    let mut viewer = viewer_with(vec![]);
    assert!(!viewer.has_interaction());
    assert!(!viewer.handle_pointer_down(CENTER, VIEWPORT));
}

#[test]
fn single_matching_clip_is_not_enough() {
    let mut viewer = viewer_with(vec![hold_clip("wave", 2.0)]);
    assert!(!viewer.has_interaction());
    assert!(!viewer.handle_pointer_down(CENTER, VIEWPORT));
}

#[test]
fn both_clips_enable_interaction() {
    let viewer = viewer_with(vec![hold_clip("wave", 2.0), hold_clip("stumble", 6.0)]);
    assert!(viewer.has_interaction());
    assert_eq!(viewer.trigger_phase(), Some(TriggerPhase::Idle));
}

// ============================================================================
// Resize handling
// ============================================================================

#[test]
fn resize_updates_aspect_to_final_size() {
    let mut viewer = viewer_with(vec![]);

    // A storm of resize events: only the final size matters, and repeats
    // converge on the same state.
    for i in 1..200_u32 {
        viewer.handle_resize(100 + i, 100);
    }
    viewer.handle_resize(640, 480);
    viewer.handle_resize(640, 480);

    let camera = viewer.scene.active_camera_ref().unwrap();
    assert!(approx(camera.aspect, 640.0 / 480.0));
}

#[test]
fn degenerate_resize_is_ignored() {
    let mut viewer = viewer_with(vec![]);
    let before = viewer.scene.active_camera_ref().unwrap().aspect;
    viewer.handle_resize(0, 480);
    viewer.handle_resize(640, 0);
    let after = viewer.scene.active_camera_ref().unwrap().aspect;
    assert!(approx(before, after));
}

// ============================================================================
// End-to-end click interaction
// ============================================================================

#[test]
fn click_on_avatar_starts_reaction() {
    let mut viewer = viewer_with(vec![hold_clip("wave", 2.0), hold_clip("stumble", 6.0)]);

    assert!(viewer.handle_pointer_down(CENTER, VIEWPORT));
    assert_eq!(viewer.trigger_phase(), Some(TriggerPhase::Reacting));
}

#[test]
fn click_outside_silhouette_never_triggers() {
    let mut viewer = viewer_with(vec![hold_clip("wave", 2.0), hold_clip("stumble", 6.0)]);

    assert!(!viewer.handle_pointer_down(CORNER, VIEWPORT));
    assert_eq!(viewer.trigger_phase(), Some(TriggerPhase::Idle));
}

#[test]
fn rapid_clicks_trigger_exactly_once() {
    let mut viewer = viewer_with(vec![hold_clip("wave", 2.0), hold_clip("stumble", 6.0)]);
    let input = Input::new();

    let mut accepted = 0;
    for _ in 0..30 {
        if viewer.handle_pointer_down(CENTER, VIEWPORT) {
            accepted += 1;
        }
        viewer.update(&input, 0.1);
    }
    // 30 clicks over 3 seconds fall inside one 5-second guard window.
    assert_eq!(accepted, 1);
}

#[test]
fn guard_window_reopens_after_five_units() {
    let mut viewer = viewer_with(vec![hold_clip("wave", 2.0), hold_clip("stumble", 6.0)]);
    let input = Input::new();

    assert!(viewer.handle_pointer_down(CENTER, VIEWPORT));
    for _ in 0..52 {
        viewer.update(&input, 0.1);
    }
    assert_eq!(viewer.trigger_phase(), Some(TriggerPhase::Idle));
    assert!(viewer.handle_pointer_down(CENTER, VIEWPORT));
}
