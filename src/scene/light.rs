use glam::Vec3;
use uuid::Uuid;

/// Directional lights aim at the scene origin from their node's position,
/// matching how the viewer's light rig is authored.
#[derive(Debug, Clone)]
pub enum LightKind {
    Directional,
    /// Sky color from above fading to a ground color from below.
    Hemisphere { ground_color: Vec3 },
}

#[derive(Debug, Clone)]
pub struct Light {
    pub uuid: Uuid,
    pub color: Vec3,
    pub intensity: f32,
    pub kind: LightKind,
}

impl Light {
    #[must_use]
    pub fn new_directional(color: Vec3, intensity: f32) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            color,
            intensity,
            kind: LightKind::Directional,
        }
    }

    #[must_use]
    pub fn new_hemisphere(sky_color: Vec3, ground_color: Vec3, intensity: f32) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            color: sky_color,
            intensity,
            kind: LightKind::Hemisphere { ground_color },
        }
    }
}
