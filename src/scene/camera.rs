use glam::{Affine3A, Mat4, Vec3};
use uuid::Uuid;

/// Perspective camera component.
///
/// Projection parameters are public; the cached matrices are refreshed by
/// [`Camera::update_projection_matrix`] and the scene's world-matrix pass.
#[derive(Debug, Clone)]
pub struct Camera {
    pub uuid: Uuid,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    pub(crate) world_matrix: Affine3A,
    pub(crate) view_matrix: Mat4,
    pub(crate) projection_matrix: Mat4,
    pub(crate) view_projection_matrix: Mat4,
}

impl Camera {
    #[must_use]
    pub fn new_perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut cam = Self {
            uuid: Uuid::new_v4(),
            fov: fov_degrees.to_radians(),
            aspect,
            near,
            far,
            world_matrix: Affine3A::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            view_projection_matrix: Mat4::IDENTITY,
        };
        cam.update_projection_matrix();
        cam
    }

    /// Recomputes the projection matrix from fov/aspect/near/far.
    ///
    /// Called after any of those change, notably on every viewport resize,
    /// which makes resize handling O(1) regardless of scene size.
    pub fn update_projection_matrix(&mut self) {
        // glam's perspective_rh targets WGPU's [0, 1] clip-space depth.
        self.projection_matrix = Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far);
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    /// Derives view matrices from the camera node's world transform.
    pub fn update_view(&mut self, world_transform: &Affine3A) {
        self.world_matrix = *world_transform;
        self.view_matrix = Mat4::from(*world_transform).inverse();
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    #[inline]
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.view_projection_matrix
    }

    /// Inverse view-projection, used to unproject screen points into rays.
    #[must_use]
    pub fn view_projection_inverse(&self) -> Mat4 {
        self.view_projection_matrix.inverse()
    }

    #[inline]
    #[must_use]
    pub fn world_position(&self) -> Vec3 {
        self.world_matrix.translation.into()
    }
}
