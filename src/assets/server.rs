use slotmap::{new_key_type, SlotMap};

use crate::resources::{Geometry, MaterialKind};

new_key_type! {
    pub struct GeometryHandle;
    pub struct MaterialHandle;
}

/// Owns geometry and material payloads; scene meshes reference them by
/// handle. One server is shared by the scene, the picker and the renderer.
pub struct AssetServer {
    geometries: SlotMap<GeometryHandle, Geometry>,
    materials: SlotMap<MaterialHandle, MaterialKind>,
}

impl Default for AssetServer {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetServer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            geometries: SlotMap::with_key(),
            materials: SlotMap::with_key(),
        }
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryHandle {
        self.geometries.insert(geometry)
    }

    #[must_use]
    pub fn get_geometry(&self, handle: GeometryHandle) -> Option<&Geometry> {
        self.geometries.get(handle)
    }

    pub fn add_material(&mut self, material: MaterialKind) -> MaterialHandle {
        self.materials.insert(material)
    }

    #[must_use]
    pub fn get_material(&self, handle: MaterialHandle) -> Option<&MaterialKind> {
        self.materials.get(handle)
    }

    pub fn get_material_mut(&mut self, handle: MaterialHandle) -> Option<&mut MaterialKind> {
        self.materials.get_mut(handle)
    }

    #[must_use]
    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }
}
