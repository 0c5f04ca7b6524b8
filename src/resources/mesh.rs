use crate::assets::{GeometryHandle, MaterialHandle};

/// A renderable: one geometry shaded with one material. Attached to scene
/// nodes by key; the payloads live in the [`crate::AssetServer`].
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub geometry: GeometryHandle,
    pub material: MaterialHandle,
}

impl Mesh {
    #[must_use]
    pub fn new(name: impl Into<String>, geometry: GeometryHandle, material: MaterialHandle) -> Self {
        Self {
            name: name.into(),
            geometry,
            material,
        }
    }
}
