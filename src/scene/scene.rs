use glam::{Affine3A, Vec3};
use slotmap::SlotMap;

use crate::assets::AssetServer;
use crate::resources::{BoundingBox, Mesh};
use crate::scene::camera::Camera;
use crate::scene::light::Light;
use crate::scene::node::Node;
use crate::scene::skeleton::Skeleton;
use crate::scene::{CameraKey, LightKey, MeshKey, NodeHandle, SkeletonKey};

/// Scene-wide ambient term, applied uniformly to every surface.
#[derive(Debug, Clone, Copy)]
pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 0.0,
        }
    }
}

/// The scene graph plus its component storages.
///
/// Pure data: no GPU state lives here. The renderer reads nodes and
/// components each frame; the mixer and viewer write transforms.
pub struct Scene {
    pub nodes: SlotMap<NodeHandle, Node>,
    pub root_nodes: Vec<NodeHandle>,

    pub meshes: SlotMap<MeshKey, Mesh>,
    pub cameras: SlotMap<CameraKey, Camera>,
    pub lights: SlotMap<LightKey, Light>,
    pub skeletons: SlotMap<SkeletonKey, Skeleton>,

    pub ambient: AmbientLight,
    pub active_camera: Option<NodeHandle>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root_nodes: Vec::new(),
            meshes: SlotMap::with_key(),
            cameras: SlotMap::with_key(),
            lights: SlotMap::with_key(),
            skeletons: SlotMap::with_key(),
            ambient: AmbientLight::default(),
            active_camera: None,
        }
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Adds a node as a scene root.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        handle
    }

    /// Inserts a node without attaching it anywhere. Meant for bulk model
    /// insertion where the hierarchy is wired up afterwards via [`attach`].
    ///
    /// [`attach`]: Scene::attach
    pub fn insert_detached(&mut self, node: Node) -> NodeHandle {
        self.nodes.insert(node)
    }

    /// Adds a node under an existing parent.
    pub fn add_to_parent(&mut self, child: Node, parent: NodeHandle) -> NodeHandle {
        let handle = self.nodes.insert(child);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(handle);
        }
        if let Some(c) = self.nodes.get_mut(handle) {
            c.parent = Some(parent);
        }
        handle
    }

    /// Re-parents `child` under `parent`, detaching it from its previous
    /// parent or from the root list.
    pub fn attach(&mut self, child: NodeHandle, parent: NodeHandle) {
        if child == parent {
            log::warn!("cannot attach a node to itself");
            return;
        }

        let old_parent = self.nodes.get(child).and_then(|n| n.parent);
        if let Some(p) = old_parent {
            if let Some(n) = self.nodes.get_mut(p) {
                if let Some(i) = n.children.iter().position(|&x| x == child) {
                    n.children.remove(i);
                }
            }
        } else if let Some(i) = self.root_nodes.iter().position(|&x| x == child) {
            self.root_nodes.remove(i);
        }

        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(child);
        } else {
            log::error!("attach: parent node not found");
            self.root_nodes.push(child);
            return;
        }

        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
            c.transform.mark_dirty();
        }
    }

    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    // ========================================================================
    // Component helpers
    // ========================================================================

    pub fn add_mesh_to_parent(&mut self, mesh: Mesh, parent: NodeHandle) -> NodeHandle {
        let mut node = Node::new(&mesh.name);
        node.mesh = Some(self.meshes.insert(mesh));
        self.add_to_parent(node, parent)
    }

    pub fn add_camera(&mut self, camera: Camera) -> NodeHandle {
        let mut node = Node::new("Camera");
        node.camera = Some(self.cameras.insert(camera));
        self.add_node(node)
    }

    pub fn add_light(&mut self, light: Light) -> NodeHandle {
        let mut node = Node::new("Light");
        node.light = Some(self.lights.insert(light));
        self.add_node(node)
    }

    pub fn add_skeleton(&mut self, skeleton: Skeleton) -> SkeletonKey {
        self.skeletons.insert(skeleton)
    }

    /// The active camera's `(Transform, Camera)` pair, for orbit controls
    /// and projection updates.
    pub fn active_camera_bundle(
        &mut self,
    ) -> Option<(&mut crate::scene::Transform, &mut Camera)> {
        let node_handle = self.active_camera?;
        let camera_key = self.nodes.get(node_handle)?.camera?;
        let camera = self.cameras.get_mut(camera_key)?;
        let transform = &mut self.nodes.get_mut(node_handle)?.transform;
        Some((transform, camera))
    }

    #[must_use]
    pub fn active_camera_ref(&self) -> Option<&Camera> {
        let node = self.get_node(self.active_camera?)?;
        self.cameras.get(node.camera?)
    }

    /// Iterates lights together with their nodes' world matrices.
    pub fn iter_active_lights(&self) -> impl Iterator<Item = (&Light, &Affine3A)> {
        self.nodes.values().filter_map(move |node| {
            let light = node.light.and_then(|key| self.lights.get(key))?;
            Some((light, &node.transform.world_matrix))
        })
    }

    // ========================================================================
    // Per-frame update
    // ========================================================================

    /// Refreshes world matrices, the active camera's view and all skeleton
    /// joint palettes. Call once per frame before picking or rendering.
    pub fn update(&mut self) {
        self.update_world_matrices();
        self.update_active_camera_view();
        self.update_skeletons();
    }

    /// Iterative top-down world matrix propagation (no recursion, so deep
    /// imported hierarchies cannot overflow the stack).
    pub fn update_world_matrices(&mut self) {
        let mut stack: Vec<(NodeHandle, Affine3A, bool)> = self
            .root_nodes
            .iter()
            .map(|&h| (h, Affine3A::IDENTITY, false))
            .collect();

        while let Some((handle, parent_world, parent_changed)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(handle) else {
                continue;
            };

            let local_changed = node.transform.update_local_matrix();
            let changed = local_changed || parent_changed;
            if changed {
                let world = parent_world * node.transform.local_matrix;
                node.transform.set_world_matrix(world);
            }

            let world = node.transform.world_matrix;
            let children = node.children.clone();
            for child in children {
                stack.push((child, world, changed));
            }
        }
    }

    fn update_active_camera_view(&mut self) {
        let Some(node_handle) = self.active_camera else {
            return;
        };
        let Some(node) = self.nodes.get(node_handle) else {
            return;
        };
        let world = node.transform.world_matrix;
        if let Some(camera) = node.camera.and_then(|key| self.cameras.get_mut(key)) {
            camera.update_view(&world);
        }
    }

    /// Recomputes every bound skeleton's joint palette from the current
    /// world matrices.
    pub fn update_skeletons(&mut self) {
        // Collect (skeleton, mesh-root inverse) first to split the borrow.
        let mut tasks = Vec::new();
        for node in self.nodes.values() {
            if let Some(skeleton_key) = node.skin {
                tasks.push((skeleton_key, node.transform.world_matrix.inverse()));
            }
        }

        let nodes = &self.nodes;
        for (skeleton_key, root_inv) in tasks {
            if let Some(skeleton) = self.skeletons.get_mut(skeleton_key) {
                skeleton.compute_joint_matrices(nodes, root_inv);
            }
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// World-space bounding box of a node and all its descendants, based on
    /// mesh geometry and current world matrices.
    #[must_use]
    pub fn bbox_of_subtree(&self, root: NodeHandle, assets: &AssetServer) -> Option<BoundingBox> {
        let mut combined: Option<BoundingBox> = None;
        let mut stack = vec![root];

        while let Some(handle) = stack.pop() {
            let Some(node) = self.get_node(handle) else {
                continue;
            };

            if let Some(geometry) = node
                .mesh
                .and_then(|key| self.meshes.get(key))
                .and_then(|mesh| assets.get_geometry(mesh.geometry))
            {
                let world_bbox = geometry
                    .bounding_box
                    .transform(&node.transform.world_matrix);
                combined = Some(match combined {
                    Some(existing) => existing.union(&world_bbox),
                    None => world_bbox,
                });
            }

            stack.extend_from_slice(&node.children);
        }

        combined
    }
}
