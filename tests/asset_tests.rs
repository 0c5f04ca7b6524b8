//! Asset Loading Tests
//!
//! Progress percentage derivation, status line transitions, source
//! classification and GLB decoding against a hand-built binary fixture.

use glam::Vec3;

use vitrine::assets::gltf::parse_model;
use vitrine::assets::{load_model_blocking, ByteSource};
use vitrine::config::ClipRules;
use vitrine::errors::ViewerError;
use vitrine::resources::MaterialKind;
use vitrine::status::{percent_complete, StatusDisplay, StatusTone, LOAD_FAILURE_TEXT};

// ============================================================================
// Progress percentage
// ============================================================================

#[test]
fn percent_is_floor_of_fraction() {
    assert_eq!(percent_complete(0, Some(100)), Some(0));
    assert_eq!(percent_complete(50, Some(200)), Some(25));
    // 1/3 = 33.33… → 33, never rounded up.
    assert_eq!(percent_complete(1, Some(3)), Some(33));
    assert_eq!(percent_complete(999, Some(1000)), Some(99));
    assert_eq!(percent_complete(1000, Some(1000)), Some(100));
}

#[test]
fn percent_unknown_total_is_none() {
    assert_eq!(percent_complete(5, None), None);
    assert_eq!(percent_complete(5, Some(0)), None);
}

#[test]
fn percent_clamps_overshoot() {
    assert_eq!(percent_complete(200, Some(100)), Some(100));
}

// ============================================================================
// Status line
// ============================================================================

#[test]
fn status_shows_progress_then_hides() {
    let mut status = StatusDisplay::new();
    assert!(status.is_visible());

    status.set_progress(Some(42));
    assert_eq!(status.text(), "LOADING... 42%");
    assert_eq!(status.tone(), StatusTone::Info);

    status.finish();
    assert!(!status.is_visible());
}

#[test]
fn status_failure_is_the_fixed_string() {
    let mut status = StatusDisplay::new();
    status.set_progress(Some(80));
    status.fail();

    assert!(status.is_visible());
    assert_eq!(status.text(), LOAD_FAILURE_TEXT);
    assert_eq!(status.tone(), StatusTone::Error);
}

// ============================================================================
// Source classification
// ============================================================================

#[test]
fn urls_and_paths_are_classified() {
    assert!(matches!(
        ByteSource::parse("https://example.com/a/b.glb"),
        Ok(ByteSource::Http(_))
    ));
    assert!(matches!(
        ByteSource::parse("models/avatar.glb"),
        Ok(ByteSource::File(_))
    ));
}

#[test]
fn source_filename_strips_directories() {
    assert_eq!(
        ByteSource::source_filename("https://example.com/a/b.glb"),
        "b.glb"
    );
    assert_eq!(ByteSource::source_filename("models/avatar.glb"), "avatar.glb");
}

// ============================================================================
// GLB fixture
// ============================================================================

/// Assembles a GLB container from a JSON chunk and an optional BIN chunk.
fn build_glb(json: &str, bin: &[u8]) -> Vec<u8> {
    let mut json_bytes = json.as_bytes().to_vec();
    while json_bytes.len() % 4 != 0 {
        json_bytes.push(b' ');
    }
    let mut bin_bytes = bin.to_vec();
    while bin_bytes.len() % 4 != 0 {
        bin_bytes.push(0);
    }

    let mut total = 12 + 8 + json_bytes.len();
    if !bin_bytes.is_empty() {
        total += 8 + bin_bytes.len();
    }

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2_u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());

    out.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(b"JSON");
    out.extend_from_slice(&json_bytes);

    if !bin_bytes.is_empty() {
        out.extend_from_slice(&(bin_bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(b"BIN\0");
        out.extend_from_slice(&bin_bytes);
    }
    out
}

/// One triangle, one red material, one "wave" translation clip.
fn avatar_glb() -> Vec<u8> {
    let json = r#"{
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"nodes": [0]}],
        "nodes": [{"name": "root", "mesh": 0}],
        "meshes": [{"name": "tri", "primitives": [{"attributes": {"POSITION": 0}, "material": 0}]}],
        "materials": [{"pbrMetallicRoughness": {"baseColorFactor": [1.0, 0.0, 0.0, 1.0], "metallicFactor": 0.2, "roughnessFactor": 0.8}}],
        "animations": [{"name": "wave", "channels": [{"sampler": 0, "target": {"node": 0, "path": "translation"}}], "samplers": [{"input": 1, "output": 2, "interpolation": "LINEAR"}]}],
        "accessors": [
            {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [-1.0, 0.0, 0.0], "max": [1.0, 2.0, 0.0]},
            {"bufferView": 1, "componentType": 5126, "count": 2, "type": "SCALAR", "min": [0.0], "max": [1.0]},
            {"bufferView": 2, "componentType": 5126, "count": 2, "type": "VEC3"}
        ],
        "bufferViews": [
            {"buffer": 0, "byteOffset": 0, "byteLength": 36},
            {"buffer": 0, "byteOffset": 36, "byteLength": 8},
            {"buffer": 0, "byteOffset": 44, "byteLength": 24}
        ],
        "buffers": [{"byteLength": 68}]
    }"#;

    let mut bin = Vec::new();
    // Positions: a triangle spanning x in [-1, 1], y in [0, 2].
    for v in [
        [-1.0_f32, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 2.0, 0.0],
    ] {
        for c in v {
            bin.extend_from_slice(&c.to_le_bytes());
        }
    }
    // Keyframe times 0, 1.
    for t in [0.0_f32, 1.0] {
        bin.extend_from_slice(&t.to_le_bytes());
    }
    // Translation values.
    for v in [[0.0_f32, 0.0, 0.0], [0.0, 1.0, 0.0]] {
        for c in v {
            bin.extend_from_slice(&c.to_le_bytes());
        }
    }
    assert_eq!(bin.len(), 68);

    build_glb(json, &bin)
}

#[test]
fn glb_decodes_hierarchy_geometry_and_material() {
    let asset = parse_model(&avatar_glb(), "fixture.glb").expect("decode");

    assert_eq!(asset.name, "fixture.glb");
    assert_eq!(asset.nodes.len(), 1);
    assert_eq!(asset.roots, vec![0]);

    let node = &asset.nodes[0];
    assert_eq!(node.name, "root");
    assert_eq!(node.primitives.len(), 1);

    let geometry = &node.primitives[0].geometry;
    assert_eq!(geometry.positions.len(), 3);
    assert_eq!(geometry.triangle_count(), 1);
    assert!((geometry.bounding_box.max_extent() - 2.0).abs() < 1e-5);
    // Missing normals are generated.
    assert_eq!(geometry.normals.len(), 3);

    let material = &asset.materials[node.primitives[0].material_index];
    let MaterialKind::Physical(m) = material else {
        panic!("PBR material expected");
    };
    assert!((m.color - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
    assert!((m.metalness - 0.2).abs() < 1e-5);
    assert!((m.roughness - 0.8).abs() < 1e-5);
}

#[test]
fn glb_decodes_animation_clips() {
    let asset = parse_model(&avatar_glb(), "fixture.glb").expect("decode");

    assert_eq!(asset.clips.len(), 1);
    let clip = &asset.clips[0];
    assert_eq!(clip.name, "wave");
    assert!((clip.duration - 1.0).abs() < 1e-5);
    assert_eq!(clip.tracks.len(), 1);
    assert_eq!(clip.tracks[0].meta.node_index, 0);
}

#[test]
fn default_rules_find_idle_but_not_reaction() {
    let asset = parse_model(&avatar_glb(), "fixture.glb").expect("decode");
    let rules = ClipRules::default();

    assert_eq!(asset.find_clip(&rules.idle), Some(0));
    assert_eq!(asset.find_clip(&rules.reaction), None);
}

#[test]
fn garbage_bytes_are_a_gltf_error() {
    let err = parse_model(b"definitely not a model", "junk.bin").unwrap_err();
    assert!(matches!(err, ViewerError::GltfError(_)), "got {err:?}");
}

#[test]
fn meshless_asset_is_rejected() {
    let json = r#"{
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"nodes": [0]}],
        "nodes": [{"name": "empty"}]
    }"#;
    let glb = build_glb(json, &[]);
    let err = parse_model(&glb, "empty.glb").unwrap_err();
    assert!(matches!(err, ViewerError::NoGeometry), "got {err:?}");
}

// ============================================================================
// End-to-end load
// ============================================================================

#[test]
fn file_load_reports_progress_and_decodes() {
    let path = std::env::temp_dir().join("vitrine_fixture_progress.glb");
    std::fs::write(&path, avatar_glb()).expect("write fixture");

    let mut reports: Vec<(u64, Option<u64>)> = Vec::new();
    let asset = load_model_blocking(path.to_str().unwrap(), |loaded, total| {
        reports.push((loaded, total));
    })
    .expect("load");

    assert_eq!(asset.nodes.len(), 1);
    assert!(!reports.is_empty());
    let (last_loaded, last_total) = *reports.last().unwrap();
    assert_eq!(Some(last_loaded), last_total, "final report is complete");
    assert_eq!(percent_complete(last_loaded, last_total), Some(100));
    // Loaded byte counts only ever grow.
    assert!(reports.windows(2).all(|w| w[0].0 <= w[1].0));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn missing_file_fails_and_status_shows_fixed_text() {
    let err = load_model_blocking("/nonexistent/vitrine/avatar.glb", |_, _| {}).unwrap_err();
    assert!(matches!(err, ViewerError::IoError(_)), "got {err:?}");

    // The presentation layer's failure policy: fixed text, error tone.
    let mut status = StatusDisplay::new();
    status.fail();
    assert_eq!(status.text(), LOAD_FAILURE_TEXT);
}
