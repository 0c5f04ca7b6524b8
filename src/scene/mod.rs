//! Scene graph: nodes with TRS transforms and parent/child links, plus
//! component storages for meshes, cameras, lights and skeletons.

pub mod camera;
pub mod light;
pub mod node;
pub mod scene;
pub mod skeleton;
pub mod transform;

pub use camera::Camera;
pub use light::{Light, LightKind};
pub use node::Node;
pub use scene::{AmbientLight, Scene};
pub use skeleton::Skeleton;
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
    pub struct MeshKey;
    pub struct CameraKey;
    pub struct LightKey;
    pub struct SkeletonKey;
}
