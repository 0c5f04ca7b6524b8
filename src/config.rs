//! Viewer configuration.
//!
//! The upstream art direction shipped as several forked copies of the same
//! viewer, differing only in lighting constants, camera framing, material
//! darkening and clip-name matching. Those differences are consolidated here
//! as one explicit configuration value consumed by [`crate::Viewer`].

use glam::Vec3;

/// Top-level configuration for a viewer instance.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub window_title: String,
    /// Requested logical window size. A zero dimension falls back to
    /// [`ViewerConfig::fallback_size`].
    pub window_size: (u32, u32),
    /// Dimensions used when the requested size is degenerate.
    pub fallback_size: (u32, u32),
    /// Device-pixel-ratio cap applied when sizing the drawing surface.
    pub pixel_ratio_cap: f64,
    /// Clear color (linear RGBA).
    pub background: [f64; 4],

    pub camera: CameraFraming,
    pub orbit: OrbitSettings,
    pub lights: LightRig,
    pub scale_policy: ScalePolicy,
    pub material_policy: MaterialPolicy,
    pub clips: ClipRules,
    pub timings: InteractionTimings,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window_title: "Avatar Viewer".into(),
            window_size: (400, 500),
            fallback_size: (400, 500),
            pixel_ratio_cap: 2.0,
            background: [0.02, 0.02, 0.03, 1.0],
            camera: CameraFraming::default(),
            orbit: OrbitSettings::default(),
            lights: LightRig::default(),
            scale_policy: ScalePolicy::default(),
            material_policy: MaterialPolicy::default(),
            clips: ClipRules::default(),
            timings: InteractionTimings::default(),
        }
    }
}

/// Initial camera placement and projection.
#[derive(Debug, Clone)]
pub struct CameraFraming {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for CameraFraming {
    fn default() -> Self {
        Self {
            fov_degrees: 50.0,
            near: 0.1,
            far: 1000.0,
            position: Vec3::new(0.0, 0.5, 5.0),
            target: Vec3::ZERO,
        }
    }
}

/// Orbit control limits and feel.
#[derive(Debug, Clone)]
pub struct OrbitSettings {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Polar angle limits, measured from the +Y axis.
    pub min_polar: f32,
    pub max_polar: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        use std::f32::consts::PI;
        Self {
            rotate_speed: 1.0,
            zoom_speed: 0.05,
            pan_speed: 1.0,
            enable_damping: true,
            damping_factor: 0.1,
            enable_zoom: true,
            enable_pan: false,
            min_distance: 2.5,
            max_distance: 10.0,
            min_polar: PI / 8.0,
            max_polar: PI - PI / 8.0,
        }
    }
}

/// One directional lamp of the rig. Lamps aim at the scene origin.
#[derive(Debug, Clone)]
pub struct LampSpec {
    pub color: Vec3,
    pub intensity: f32,
    pub position: Vec3,
}

/// Hemisphere fill: sky color from above, ground color from below.
#[derive(Debug, Clone)]
pub struct HemisphereSpec {
    pub sky_color: Vec3,
    pub ground_color: Vec3,
    pub intensity: f32,
}

/// The fixed light rig built around the avatar.
#[derive(Debug, Clone)]
pub struct LightRig {
    pub ambient_color: Vec3,
    pub ambient_intensity: f32,
    pub key: LampSpec,
    pub fill: LampSpec,
    pub front: LampSpec,
    pub hemisphere: HemisphereSpec,
}

impl Default for LightRig {
    fn default() -> Self {
        Self {
            ambient_color: Vec3::ONE,
            ambient_intensity: 0.3,
            key: LampSpec {
                color: Vec3::ONE,
                intensity: 0.8,
                position: Vec3::new(5.0, 10.0, 5.0),
            },
            fill: LampSpec {
                color: Vec3::ONE,
                intensity: 0.4,
                position: Vec3::new(-5.0, 5.0, -5.0),
            },
            front: LampSpec {
                color: Vec3::ONE,
                intensity: 0.3,
                position: Vec3::new(0.0, 5.0, 10.0),
            },
            hemisphere: HemisphereSpec {
                sky_color: Vec3::ONE,
                ground_color: Vec3::splat(0.267),
                intensity: 0.6,
            },
        }
    }
}

/// How the model is scaled to fit the frame, as a function of its
/// bounding-box maximum extent `m`.
#[derive(Debug, Clone)]
pub enum ScalePolicy {
    /// Oversized models shrink toward `large_target`, tiny models grow toward
    /// `small_target`, everything in between gets a fixed default scale.
    Tiered {
        large_threshold: f32,
        large_target: f32,
        small_threshold: f32,
        small_target: f32,
        default_scale: f32,
    },
    /// Always normalize so the maximum extent becomes the given target size.
    FitTo(f32),
}

impl Default for ScalePolicy {
    fn default() -> Self {
        ScalePolicy::Tiered {
            large_threshold: 2.0,
            large_target: 1.8,
            small_threshold: 0.5,
            small_target: 2.5,
            default_scale: 1.5,
        }
    }
}

impl ScalePolicy {
    /// Computes the uniform scale factor for a model of maximum extent `m`.
    /// Degenerate extents yield the identity scale.
    #[must_use]
    pub fn scale_for(&self, max_extent: f32) -> f32 {
        if !(max_extent.is_finite() && max_extent > 0.0) {
            return 1.0;
        }
        match *self {
            ScalePolicy::Tiered {
                large_threshold,
                large_target,
                small_threshold,
                small_target,
                default_scale,
            } => {
                if max_extent > large_threshold {
                    large_target / max_extent
                } else if max_extent < small_threshold {
                    small_target / max_extent
                } else {
                    default_scale
                }
            }
            ScalePolicy::FitTo(target) => target / max_extent,
        }
    }
}

/// Material rewrite applied to every loaded material.
///
/// Colors darker than `dark_threshold` (on their brightest channel) are
/// clamped to `dark_floor`; everything else is multiplied by
/// `darken_factor`. Surface response is pushed toward the configured
/// metalness/roughness and emissive contribution is stripped.
#[derive(Debug, Clone)]
pub struct MaterialPolicy {
    pub darken_factor: f32,
    pub dark_threshold: f32,
    pub dark_floor: Vec3,
    pub metalness: f32,
    pub roughness: f32,
    pub clear_emissive: bool,
    pub force_opaque: bool,
}

impl Default for MaterialPolicy {
    fn default() -> Self {
        Self {
            darken_factor: 0.7,
            dark_threshold: 0.133,
            dark_floor: Vec3::splat(0.067),
            metalness: 0.4,
            roughness: 0.6,
            clear_emissive: true,
            force_opaque: true,
        }
    }
}

/// How a named animation clip is looked up in the loaded asset.
///
/// The upstream variants never agreed on one rule (substring vs exact
/// match), so the rule is part of the configuration rather than hardcoded.
#[derive(Debug, Clone)]
pub enum ClipMatchRule {
    /// Any of the given fragments appearing anywhere in the clip name.
    Substring(Vec<String>),
    /// The clip name equals the given string.
    Exact(String),
}

impl ClipMatchRule {
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match self {
            ClipMatchRule::Substring(fragments) => {
                fragments.iter().any(|f| name.contains(f.as_str()))
            }
            ClipMatchRule::Exact(expected) => name == expected,
        }
    }

    /// Convenience constructor for the substring rule.
    #[must_use]
    pub fn any_of(fragments: &[&str]) -> Self {
        ClipMatchRule::Substring(fragments.iter().map(ToString::to_string).collect())
    }
}

/// Which clips drive the idle loop and the click reaction.
#[derive(Debug, Clone)]
pub struct ClipRules {
    pub idle: ClipMatchRule,
    pub reaction: ClipMatchRule,
}

impl Default for ClipRules {
    fn default() -> Self {
        Self {
            idle: ClipMatchRule::any_of(&["wave", "003"]),
            reaction: ClipMatchRule::any_of(&["stumble", "005"]),
        }
    }
}

/// Timings of the click-triggered reaction cycle, in seconds.
#[derive(Debug, Clone, Copy)]
pub struct InteractionTimings {
    /// Blend from idle into the reaction clip.
    pub crossfade_in: f32,
    /// Time after the click at which the idle clip starts blending back.
    pub reaction_hold: f32,
    /// Blend from the reaction clip back to idle.
    pub crossfade_out: f32,
    /// Extra time after the blend-back starts before the next click is
    /// accepted again.
    pub guard_tail: f32,
}

impl Default for InteractionTimings {
    fn default() -> Self {
        Self {
            crossfade_in: 0.3,
            reaction_hold: 4.0,
            crossfade_out: 1.0,
            guard_tail: 1.0,
        }
    }
}
