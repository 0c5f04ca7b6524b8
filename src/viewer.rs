//! The viewer context.
//!
//! [`Viewer`] owns everything one avatar view needs (scene, assets, mixer,
//! orbit controls, click trigger) as a plain value. Nothing lives in
//! module globals, so callers can run several independent viewers and tear
//! one down by dropping it.

use std::sync::Arc;

use glam::{Vec2, Vec3};

use crate::animation::{AnimationAction, AnimationMixer, Binder, LoopMode};
use crate::app::input::Input;
use crate::assets::{AssetServer, ModelAsset};
use crate::config::ViewerConfig;
use crate::interaction::{ReactionTrigger, TriggerPhase};
use crate::picking::{self, ndc_from_screen, Ray};
use crate::resources::{MaterialKind, Mesh};
use crate::scene::{AmbientLight, Camera, Light, Node, NodeHandle, Scene, Skeleton};
use crate::utils::orbit_control::OrbitControls;

/// Drawing-surface pixel dimensions for a logical size: scaled by the
/// device pixel ratio capped at `cap`, never zero.
#[must_use]
pub fn surface_extent(logical: (u32, u32), scale_factor: f64, cap: f64) -> (u32, u32) {
    let ratio = if scale_factor > 0.0 {
        scale_factor.min(cap)
    } else {
        1.0
    };
    let width = (f64::from(logical.0) * ratio).round().max(1.0) as u32;
    let height = (f64::from(logical.1) * ratio).round().max(1.0) as u32;
    (width, height)
}

/// One avatar view: scene, camera rig, animation state and interaction.
pub struct Viewer {
    pub config: ViewerConfig,
    pub scene: Scene,
    pub assets: AssetServer,
    pub mixer: AnimationMixer,
    pub controls: OrbitControls,

    camera_node: NodeHandle,
    model_root: Option<NodeHandle>,
    trigger: Option<ReactionTrigger>,
}

impl Viewer {
    /// Builds the empty stage: camera framing, light rig, orbit controls.
    /// The model arrives later via [`Viewer::insert_model`].
    #[must_use]
    pub fn new(config: ViewerConfig, aspect: f32) -> Self {
        let mut scene = Scene::new();

        let framing = &config.camera;
        let camera = Camera::new_perspective(
            framing.fov_degrees,
            aspect,
            framing.near,
            framing.far,
        );
        let camera_node = scene.add_camera(camera);
        if let Some(node) = scene.get_node_mut(camera_node) {
            node.transform.position = framing.position;
            node.transform.look_at(framing.target, Vec3::Y);
        }
        scene.active_camera = Some(camera_node);

        let rig = &config.lights;
        scene.ambient = AmbientLight {
            color: rig.ambient_color,
            intensity: rig.ambient_intensity,
        };
        for lamp in [&rig.key, &rig.fill, &rig.front] {
            let handle = scene.add_light(Light::new_directional(lamp.color, lamp.intensity));
            if let Some(node) = scene.get_node_mut(handle) {
                node.transform.position = lamp.position;
            }
        }
        scene.add_light(Light::new_hemisphere(
            rig.hemisphere.sky_color,
            rig.hemisphere.ground_color,
            rig.hemisphere.intensity,
        ));

        let controls = OrbitControls::from_pose(framing.target, framing.position, &config.orbit);

        Self {
            config,
            scene,
            assets: AssetServer::new(),
            mixer: AnimationMixer::new(),
            controls,
            camera_node,
            model_root: None,
            trigger: None,
        }
    }

    #[must_use]
    pub fn camera_node(&self) -> NodeHandle {
        self.camera_node
    }

    #[must_use]
    pub fn model_root(&self) -> Option<NodeHandle> {
        self.model_root
    }

    /// Whether the click interaction is live (both clips were found).
    #[must_use]
    pub fn has_interaction(&self) -> bool {
        self.trigger.is_some()
    }

    #[must_use]
    pub fn trigger_phase(&self) -> Option<TriggerPhase> {
        self.trigger.as_ref().map(ReactionTrigger::phase)
    }

    /// Inserts the loaded model into the scene: applies the material
    /// darkening policy, wires the node hierarchy under a fresh root,
    /// registers skeletons, rigs the idle/reaction actions and applies the
    /// scale policy. A model is inserted at most once per viewer; repeated
    /// calls are ignored.
    pub fn insert_model(&mut self, asset: ModelAsset) -> NodeHandle {
        if let Some(existing) = self.model_root {
            log::warn!("insert_model called twice; keeping the existing model");
            return existing;
        }

        let ModelAsset {
            name,
            nodes,
            roots,
            materials,
            skins,
            clips,
        } = asset;

        let material_handles: Vec<_> = materials
            .into_iter()
            .map(|mut material| {
                material.apply_policy(&self.config.material_policy);
                self.assets.add_material(material)
            })
            .collect();

        let root = self.scene.add_node(Node::new("Avatar"));

        // Hierarchy first: create every node detached, then wire children,
        // so forward references in the asset's child lists resolve.
        let mut node_map = Vec::with_capacity(nodes.len());
        for model_node in &nodes {
            let mut node = Node::new(&model_node.name);
            node.transform.position = model_node.translation;
            node.transform.rotation = model_node.rotation;
            node.transform.scale = model_node.scale;
            node_map.push(self.scene.insert_detached(node));
        }
        for (index, model_node) in nodes.iter().enumerate() {
            for &child in &model_node.children {
                if let Some(&child_handle) = node_map.get(child) {
                    self.scene.attach(child_handle, node_map[index]);
                }
            }
        }
        for &root_index in &roots {
            if let Some(&handle) = node_map.get(root_index) {
                self.scene.attach(handle, root);
            }
        }

        let skeleton_keys: Vec<_> = skins
            .iter()
            .map(|skin| {
                let bones = skin
                    .joint_nodes
                    .iter()
                    .filter_map(|&j| node_map.get(j).copied())
                    .collect();
                self.scene.add_skeleton(Skeleton::new(
                    &skin.name,
                    bones,
                    skin.inverse_bind_matrices.clone(),
                ))
            })
            .collect();

        let fallback_material = match material_handles.last() {
            Some(&handle) => handle,
            None => self.assets.add_material(MaterialKind::default()),
        };

        for (index, model_node) in nodes.into_iter().enumerate() {
            let owner = node_map[index];
            let skin_key = model_node.skin.and_then(|s| skeleton_keys.get(s).copied());
            let single = model_node.primitives.len() == 1;

            for primitive in model_node.primitives {
                let geometry = self.assets.add_geometry(primitive.geometry);
                let material = material_handles
                    .get(primitive.material_index)
                    .copied()
                    .unwrap_or(fallback_material);
                let mesh = Mesh::new(&model_node.name, geometry, material);

                let mesh_node = if single {
                    let key = self.scene.meshes.insert(mesh);
                    if let Some(node) = self.scene.get_node_mut(owner) {
                        node.mesh = Some(key);
                    }
                    owner
                } else {
                    self.scene.add_mesh_to_parent(mesh, owner)
                };
                if let Some(node) = self.scene.get_node_mut(mesh_node) {
                    node.skin = skin_key;
                }
            }
        }

        self.rig_animations(clips, &node_map);

        // Scale the whole model per policy, based on its untransformed
        // world bounds, and keep it centered at the origin.
        self.scene.update();
        if let Some(bbox) = self.scene.bbox_of_subtree(root, &self.assets) {
            let max_extent = bbox.max_extent();
            let scale = self.config.scale_policy.scale_for(max_extent);
            if let Some(node) = self.scene.get_node_mut(root) {
                node.transform.scale = Vec3::splat(scale);
                node.transform.position = Vec3::ZERO;
            }
            log::info!("model '{name}' extent {max_extent:.3}, scale {scale:.3}");
        }
        self.scene.update();

        self.model_root = Some(root);
        root
    }

    /// Looks up the idle and reaction clips per the configured matching
    /// rules and registers their actions. The idle loop starts immediately
    /// when present; the trigger exists only when BOTH clips resolved.
    fn rig_animations(&mut self, clips: Vec<crate::animation::AnimationClip>, node_map: &[NodeHandle]) {
        let idle_index = clips
            .iter()
            .position(|c| self.config.clips.idle.matches(&c.name));
        // The reaction must be a different clip; a rule that happens to
        // match the idle clip counts as a miss.
        let reaction_index = clips
            .iter()
            .position(|c| self.config.clips.reaction.matches(&c.name))
            .filter(|&i| Some(i) != idle_index);

        let mut make_action = |index: usize| {
            let clip = Arc::new(clips[index].clone());
            let bindings = Binder::bind(&clip, node_map);
            let mut action = AnimationAction::new(clip);
            action.bindings = bindings;
            action
        };

        let idle_id = idle_index.map(|i| {
            let mut action = make_action(i);
            action.loop_mode = LoopMode::Loop;
            self.mixer.add_action(action)
        });
        let reaction_id = reaction_index.map(|i| {
            let mut action = make_action(i);
            action.loop_mode = LoopMode::Once;
            action.weight = 0.0;
            action.paused = true;
            self.mixer.add_action(action)
        });

        self.trigger = match (idle_id, reaction_id) {
            (Some(idle), Some(reaction)) => Some(ReactionTrigger::new(
                idle,
                reaction,
                self.config.timings,
            )),
            _ => {
                log::info!("click interaction disabled: required clips not found");
                None
            }
        };
    }

    /// Pointer-down on the drawing surface. Casts a ray through the click
    /// point; a hit on the avatar starts the reaction cycle. Returns
    /// whether the click was consumed.
    pub fn handle_pointer_down(&mut self, position: Vec2, viewport: Vec2) -> bool {
        let Some(trigger) = &mut self.trigger else {
            return false;
        };
        if !trigger.accepts_clicks() {
            return false;
        }
        let Some(root) = self.model_root else {
            return false;
        };
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return false;
        }
        let Some(camera) = self.scene.active_camera_ref() else {
            return false;
        };

        let ray = Ray::from_camera(camera, ndc_from_screen(position, viewport));
        if picking::intersect_subtree(&ray, &self.scene, &self.assets, root).is_some() {
            trigger.try_trigger(&mut self.mixer)
        } else {
            false
        }
    }

    /// Viewport resize: recompute the camera aspect ratio. O(1) and
    /// idempotent: repeated events with the same size converge on the same
    /// state and accumulate nothing.
    pub fn handle_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if let Some((_, camera)) = self.scene.active_camera_bundle() {
            camera.aspect = width as f32 / height as f32;
            camera.update_projection_matrix();
        }
    }

    /// Per-frame update: orbit controls → animation blend → trigger
    /// deadlines → scene matrices.
    pub fn update(&mut self, input: &Input, dt: f32) {
        if let Some((transform, camera)) = self.scene.active_camera_bundle() {
            let fov_degrees = camera.fov.to_degrees();
            self.controls.update(transform, input, fov_degrees, dt);
        }

        self.mixer.update(dt, &mut self.scene);
        if let Some(trigger) = &mut self.trigger {
            trigger.update(&mut self.mixer);
        }

        self.scene.update();
    }
}
