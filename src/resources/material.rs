//! Capability-tagged materials.
//!
//! The source asset's materials are folded into an explicit tagged union
//! instead of probing "does this material have a roughness property" at
//! runtime: [`MaterialKind::Physical`] has a metal/rough response,
//! [`MaterialKind::Basic`] is shaded flat. Policy application is an
//! exhaustive match, so adding a variant forces every policy site to decide.

use glam::Vec3;

use crate::config::MaterialPolicy;

/// Metallic/roughness surface data (the glTF PBR default).
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalMaterialData {
    pub color: Vec3,
    pub opacity: f32,
    pub metalness: f32,
    pub roughness: f32,
    pub emissive: Vec3,
    pub transparent: bool,
}

impl Default for PhysicalMaterialData {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            opacity: 1.0,
            metalness: 0.0,
            roughness: 1.0,
            emissive: Vec3::ZERO,
            transparent: false,
        }
    }
}

/// Unlit color data (glTF `KHR_materials_unlit`).
#[derive(Debug, Clone, PartialEq)]
pub struct BasicMaterialData {
    pub color: Vec3,
    pub opacity: f32,
    pub transparent: bool,
}

impl Default for BasicMaterialData {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            opacity: 1.0,
            transparent: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MaterialKind {
    Physical(PhysicalMaterialData),
    Basic(BasicMaterialData),
}

impl Default for MaterialKind {
    fn default() -> Self {
        MaterialKind::Physical(PhysicalMaterialData::default())
    }
}

impl MaterialKind {
    #[must_use]
    pub fn color(&self) -> Vec3 {
        match self {
            MaterialKind::Physical(m) => m.color,
            MaterialKind::Basic(m) => m.color,
        }
    }

    /// Rewrites the material per the viewer's darkening policy.
    ///
    /// Near-black colors are clamped to the policy floor; everything else is
    /// scaled down by the darken factor. The physical response is pushed to
    /// the policy's metalness/roughness; basic materials only get the color
    /// and opacity treatment since they carry no surface response.
    pub fn apply_policy(&mut self, policy: &MaterialPolicy) {
        match self {
            MaterialKind::Physical(m) => {
                m.color = darken(m.color, policy);
                m.metalness = policy.metalness;
                m.roughness = policy.roughness;
                if policy.clear_emissive {
                    m.emissive = Vec3::ZERO;
                }
                if policy.force_opaque {
                    m.transparent = false;
                    m.opacity = 1.0;
                }
            }
            MaterialKind::Basic(m) => {
                m.color = darken(m.color, policy);
                if policy.force_opaque {
                    m.transparent = false;
                    m.opacity = 1.0;
                }
            }
        }
    }
}

fn darken(color: Vec3, policy: &MaterialPolicy) -> Vec3 {
    if color.max_element() < policy.dark_threshold {
        policy.dark_floor
    } else {
        color * policy.darken_factor
    }
}
