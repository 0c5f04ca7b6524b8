//! Asset loading and ownership.
//!
//! [`load_model`] is the single suspending load operation: it fetches the
//! payload (file or HTTP) with byte progress reported through a callback,
//! then decodes it into a [`ModelAsset`], a CPU-side description of the
//! model that [`crate::Viewer::insert_model`] turns into live scene content
//! exactly once.

pub mod gltf;
pub mod io;
pub mod server;

pub use io::ByteSource;
pub use server::{AssetServer, GeometryHandle, MaterialHandle};

use glam::{Mat4, Quat, Vec3};

use crate::animation::AnimationClip;
use crate::config::ClipMatchRule;
use crate::errors::Result;
use crate::resources::{Geometry, MaterialKind};

/// One triangle primitive of a model node.
#[derive(Debug, Clone)]
pub struct ModelPrimitive {
    pub geometry: Geometry,
    /// Index into [`ModelAsset::materials`].
    pub material_index: usize,
}

/// One node of the model hierarchy, in asset space.
#[derive(Debug, Clone)]
pub struct ModelNode {
    pub name: String,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    /// Indices into [`ModelAsset::nodes`].
    pub children: Vec<usize>,
    pub primitives: Vec<ModelPrimitive>,
    /// Index into [`ModelAsset::skins`] when this node's mesh is skinned.
    pub skin: Option<usize>,
}

/// A skin: joint node indices plus their inverse bind matrices.
#[derive(Debug, Clone)]
pub struct ModelSkin {
    pub name: String,
    pub joint_nodes: Vec<usize>,
    pub inverse_bind_matrices: Vec<Mat4>,
}

/// The decoded model: hierarchy, geometry, tagged materials, skins and
/// named animation clips. Owned data, detached from any scene.
#[derive(Debug, Clone)]
pub struct ModelAsset {
    pub name: String,
    pub nodes: Vec<ModelNode>,
    /// Indices of the hierarchy roots.
    pub roots: Vec<usize>,
    pub materials: Vec<MaterialKind>,
    pub skins: Vec<ModelSkin>,
    pub clips: Vec<AnimationClip>,
}

impl ModelAsset {
    /// Finds the first clip whose name satisfies `rule`. A miss is an
    /// expected outcome, not an error: callers degrade the feature that
    /// needed the clip.
    #[must_use]
    pub fn find_clip(&self, rule: &ClipMatchRule) -> Option<usize> {
        self.clips.iter().position(|clip| rule.matches(&clip.name))
    }

    pub fn clip_names(&self) -> impl Iterator<Item = &str> {
        self.clips.iter().map(|clip| clip.name.as_str())
    }
}

/// Fetches and decodes a model. Progress is reported as
/// `(bytes_loaded, total)` while the payload streams in; decode happens
/// after the last byte. Resolves once with the asset or once with a typed
/// error.
pub async fn load_model(
    source: &str,
    mut on_progress: impl FnMut(u64, Option<u64>),
) -> Result<ModelAsset> {
    let reader = ByteSource::parse(source)?;
    let bytes = reader.read(&mut on_progress).await?;
    gltf::parse_model(&bytes, ByteSource::source_filename(source))
}

/// Synchronous wrapper around [`load_model`] for callers without a runtime,
/// e.g. the window shell blocking its init flow on the load.
pub fn load_model_blocking(
    source: &str,
    on_progress: impl FnMut(u64, Option<u64>),
) -> Result<ModelAsset> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(load_model(source, on_progress))
}
