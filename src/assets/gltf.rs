//! Binary glTF decoding.
//!
//! Turns a `.glb`/`.gltf` payload into a [`ModelAsset`]: node hierarchy,
//! per-primitive geometry, capability-tagged materials, skins and animation
//! clips. Primitives that cannot be read (non-triangle modes, missing
//! positions) are skipped rather than failing the whole asset; an asset
//! with no usable triangles at all is rejected.

use glam::{Mat4, Quat, Vec3};
use gltf::animation::util::ReadOutputs;
use gltf::mesh::Mode;

use crate::animation::{AnimationClip, InterpolationMode, KeyframeTrack, TargetPath, Track, TrackData, TrackMeta};
use crate::assets::{ModelAsset, ModelNode, ModelPrimitive, ModelSkin};
use crate::errors::{Result, ViewerError};
use crate::resources::{BasicMaterialData, Geometry, MaterialKind, PhysicalMaterialData};

/// Decodes a glTF payload from memory.
pub fn parse_model(bytes: &[u8], name: &str) -> Result<ModelAsset> {
    let (document, buffers, _images) = gltf::import_slice(bytes)?;

    let mut materials: Vec<MaterialKind> =
        document.materials().map(|m| convert_material(&m)).collect();
    // Primitives without a material reference fall back to this one.
    let default_material_index = materials.len();
    materials.push(MaterialKind::default());

    let mut nodes = Vec::with_capacity(document.nodes().len());
    for node in document.nodes() {
        let (translation, rotation, scale) = node.transform().decomposed();

        let mut primitives = Vec::new();
        if let Some(mesh) = node.mesh() {
            let mesh_name = mesh.name().unwrap_or("mesh");
            for (prim_index, primitive) in mesh.primitives().enumerate() {
                if primitive.mode() != Mode::Triangles {
                    log::warn!(
                        "skipping non-triangle primitive {prim_index} of mesh '{mesh_name}'"
                    );
                    continue;
                }
                let reader =
                    primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &*d.0));

                let Some(positions) = reader.read_positions() else {
                    log::warn!("skipping primitive {prim_index} of '{mesh_name}': no positions");
                    continue;
                };
                let positions: Vec<Vec3> = positions.map(Vec3::from).collect();
                let normals: Option<Vec<Vec3>> =
                    reader.read_normals().map(|it| it.map(Vec3::from).collect());
                let indices: Option<Vec<u32>> =
                    reader.read_indices().map(|it| it.into_u32().collect());

                let mut geometry = Geometry::new(
                    format!("{mesh_name}.{prim_index}"),
                    positions,
                    normals,
                    indices,
                );
                if let (Some(joints), Some(weights)) =
                    (reader.read_joints(0), reader.read_weights(0))
                {
                    geometry = geometry.with_skinning(
                        joints.into_u16().collect(),
                        weights.into_f32().collect(),
                    );
                }

                let material_index = primitive
                    .material()
                    .index()
                    .unwrap_or(default_material_index);
                primitives.push(ModelPrimitive {
                    geometry,
                    material_index,
                });
            }
        }

        nodes.push(ModelNode {
            name: node.name().unwrap_or("").to_string(),
            translation: Vec3::from(translation),
            rotation: Quat::from_array(rotation),
            scale: Vec3::from(scale),
            children: node.children().map(|c| c.index()).collect(),
            primitives,
            skin: node.skin().map(|s| s.index()),
        });
    }

    if nodes.iter().all(|n| n.primitives.is_empty()) {
        return Err(ViewerError::NoGeometry);
    }

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| ViewerError::GltfError("asset contains no scene".to_string()))?;
    let roots: Vec<usize> = scene.nodes().map(|n| n.index()).collect();

    let skins: Vec<ModelSkin> = document
        .skins()
        .map(|skin| {
            let joint_nodes: Vec<usize> = skin.joints().map(|j| j.index()).collect();
            let reader = skin.reader(|buffer| buffers.get(buffer.index()).map(|d| &*d.0));
            let inverse_bind_matrices: Vec<Mat4> = reader
                .read_inverse_bind_matrices()
                .map(|it| it.map(|m| Mat4::from_cols_array_2d(&m)).collect())
                .unwrap_or_else(|| vec![Mat4::IDENTITY; joint_nodes.len()]);
            ModelSkin {
                name: skin.name().unwrap_or("skin").to_string(),
                joint_nodes,
                inverse_bind_matrices,
            }
        })
        .collect();

    let clips: Vec<AnimationClip> = document
        .animations()
        .map(|anim| convert_clip(&anim, &buffers))
        .collect();

    log::info!(
        "decoded model '{}': {} nodes, {} materials, {} skins, {} clips",
        name,
        nodes.len(),
        materials.len(),
        skins.len(),
        clips.len()
    );

    Ok(ModelAsset {
        name: name.to_string(),
        nodes,
        roots,
        materials,
        skins,
        clips,
    })
}

fn convert_material(material: &gltf::Material) -> MaterialKind {
    let pbr = material.pbr_metallic_roughness();
    let base = pbr.base_color_factor();
    let color = Vec3::new(base[0], base[1], base[2]);
    let opacity = base[3];
    let transparent = matches!(material.alpha_mode(), gltf::material::AlphaMode::Blend);

    if material.unlit() {
        MaterialKind::Basic(BasicMaterialData {
            color,
            opacity,
            transparent,
        })
    } else {
        let emissive = Vec3::from(material.emissive_factor());
        MaterialKind::Physical(PhysicalMaterialData {
            color,
            opacity,
            metalness: pbr.metallic_factor(),
            roughness: pbr.roughness_factor(),
            emissive,
            transparent,
        })
    }
}

fn convert_clip(animation: &gltf::Animation, buffers: &[gltf::buffer::Data]) -> AnimationClip {
    let name = animation
        .name()
        .map(ToString::to_string)
        .unwrap_or_else(|| format!("animation.{}", animation.index()));

    let mut tracks = Vec::new();
    for channel in animation.channels() {
        let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(|d| &*d.0));
        let Some(inputs) = reader.read_inputs() else {
            continue;
        };
        let times: Vec<f32> = inputs.collect();
        if times.is_empty() {
            continue;
        }

        let interpolation = match channel.sampler().interpolation() {
            gltf::animation::Interpolation::Linear => InterpolationMode::Linear,
            gltf::animation::Interpolation::Step => InterpolationMode::Step,
            gltf::animation::Interpolation::CubicSpline => InterpolationMode::CubicSpline,
        };
        let node_index = channel.target().node().index();

        let Some(outputs) = reader.read_outputs() else {
            continue;
        };
        let (target, data) = match outputs {
            ReadOutputs::Translations(it) => (
                TargetPath::Translation,
                TrackData::Vector3(KeyframeTrack::new(
                    times,
                    it.map(Vec3::from).collect(),
                    interpolation,
                )),
            ),
            ReadOutputs::Rotations(rotations) => (
                TargetPath::Rotation,
                TrackData::Quaternion(KeyframeTrack::new(
                    times,
                    rotations.into_f32().map(Quat::from_array).collect(),
                    interpolation,
                )),
            ),
            ReadOutputs::Scales(it) => (
                TargetPath::Scale,
                TrackData::Vector3(KeyframeTrack::new(
                    times,
                    it.map(Vec3::from).collect(),
                    interpolation,
                )),
            ),
            // Morph target weights are not animated by this viewer.
            ReadOutputs::MorphTargetWeights(_) => continue,
        };

        tracks.push(Track {
            meta: TrackMeta { node_index, target },
            data,
        });
    }

    AnimationClip::new(name, tracks)
}
