use glam::{Affine3A, Mat4};
use slotmap::SlotMap;
use uuid::Uuid;

use crate::scene::{Node, NodeHandle};

/// A skeleton: an ordered bone list plus the inverse bind matrices that map
/// mesh space into each bone's local space.
///
/// `bones[i]` corresponds to `joint_matrices[i]`, which the renderer uploads
/// as the shader's joint palette.
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub id: Uuid,
    pub name: String,

    pub bones: Vec<NodeHandle>,
    pub(crate) inverse_bind_matrices: Vec<Mat4>,

    /// Recomputed every frame from the bones' world matrices.
    pub(crate) joint_matrices: Vec<Mat4>,
}

impl Skeleton {
    #[must_use]
    pub fn new(name: &str, bones: Vec<NodeHandle>, inverse_bind_matrices: Vec<Mat4>) -> Self {
        let count = bones.len();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            bones,
            inverse_bind_matrices,
            joint_matrices: vec![Mat4::IDENTITY; count],
        }
    }

    #[must_use]
    pub fn joint_matrices(&self) -> &[Mat4] {
        &self.joint_matrices
    }

    /// Rebuilds the joint palette for this frame.
    ///
    /// `root_matrix_inv` is the inverse world matrix of the node carrying the
    /// skinned mesh, so the palette lands back in that mesh's local space.
    pub fn compute_joint_matrices(
        &mut self,
        nodes: &SlotMap<NodeHandle, Node>,
        root_matrix_inv: Affine3A,
    ) {
        for (i, &bone) in self.bones.iter().enumerate() {
            let Some(bone_node) = nodes.get(bone) else {
                continue;
            };
            let Some(ibm) = self.inverse_bind_matrices.get(i) else {
                continue;
            };
            let bone_world = bone_node.transform.world_matrix;
            self.joint_matrices[i] = Mat4::from(root_matrix_inv * bone_world) * *ibm;
        }
    }
}
