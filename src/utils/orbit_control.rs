use glam::{Vec2, Vec3};
use winit::event::MouseButton;

use crate::app::input::Input;
use crate::config::OrbitSettings;
use crate::scene::transform::Transform;

/// Damped orbit controls: left-drag rotates around a target point,
/// scroll zooms within distance limits, right-drag pans (when enabled).
/// Polar angle is clamped so the camera cannot flip over the poles.
pub struct OrbitControls {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar: f32,
    pub max_polar: f32,

    pub center: Vec3,
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,

    rotate_delta: Vec2,
}

impl OrbitControls {
    /// Builds controls whose spherical state reproduces the given camera
    /// pose (position orbiting `center`).
    #[must_use]
    pub fn from_pose(center: Vec3, position: Vec3, settings: &OrbitSettings) -> Self {
        let offset = position - center;
        let radius = offset
            .length()
            .clamp(settings.min_distance, settings.max_distance);
        let phi = if radius > 0.0 {
            (offset.y / offset.length().max(1e-6)).clamp(-1.0, 1.0).acos()
        } else {
            std::f32::consts::FRAC_PI_2
        };
        let theta = offset.x.atan2(offset.z);

        Self {
            rotate_speed: settings.rotate_speed,
            zoom_speed: settings.zoom_speed,
            pan_speed: settings.pan_speed,
            enable_damping: settings.enable_damping,
            damping_factor: settings.damping_factor,
            enable_zoom: settings.enable_zoom,
            enable_pan: settings.enable_pan,
            min_distance: settings.min_distance,
            max_distance: settings.max_distance,
            min_polar: settings.min_polar,
            max_polar: settings.max_polar,

            center,
            radius,
            theta,
            phi: phi.clamp(settings.min_polar, settings.max_polar),

            rotate_delta: Vec2::ZERO,
        }
    }

    /// Advances the orbit from this frame's input and writes the resulting
    /// pose into the camera's transform.
    pub fn update(&mut self, transform: &mut Transform, input: &Input, fov_degrees: f32, dt: f32) {
        let screen_height = input.screen_size.y.max(1.0);

        if input.is_button_pressed(MouseButton::Left) {
            let rotate_per_pixel = 2.0 * std::f32::consts::PI / screen_height;
            self.rotate_delta.x -= input.cursor_delta.x * rotate_per_pixel * self.rotate_speed;
            self.rotate_delta.y -= input.cursor_delta.y * rotate_per_pixel * self.rotate_speed;
        }

        if self.enable_damping {
            // Frame-rate independent damping: retention decays per 60Hz frame.
            let target_fps = 60.0;
            let retention = (1.0 - self.damping_factor).powf(dt * target_fps);
            let applied = self.rotate_delta * (1.0 - retention);

            self.theta += applied.x;
            self.phi += applied.y;
            self.rotate_delta *= retention;
        } else {
            self.theta += self.rotate_delta.x;
            self.phi += self.rotate_delta.y;
            self.rotate_delta = Vec2::ZERO;
        }

        self.phi = self.phi.clamp(self.min_polar, self.max_polar);

        if self.enable_zoom && input.scroll_delta.y != 0.0 {
            let scale = (1.0 - self.zoom_speed).powf(input.scroll_delta.y.abs());
            if input.scroll_delta.y > 0.0 {
                self.radius *= scale;
            } else {
                self.radius /= scale;
            }
            self.radius = self.radius.clamp(self.min_distance, self.max_distance);
        }

        if self.enable_pan && input.is_button_pressed(MouseButton::Right) {
            let half_fov = fov_degrees.to_radians() / 2.0;
            let target_world_height = 2.0 * self.radius * half_fov.tan();
            let pixels_to_world = target_world_height / screen_height;

            let offset = self.offset_direction();
            let forward = -offset.normalize_or_zero();
            let right = forward.cross(Vec3::Y).normalize_or_zero();
            let up = right.cross(forward).normalize_or_zero();

            self.center += (right * -input.cursor_delta.x + up * input.cursor_delta.y)
                * pixels_to_world
                * self.pan_speed;
        }

        transform.position = self.center + self.offset_direction() * self.radius;
        transform.look_at(self.center, Vec3::Y);
    }

    fn offset_direction(&self) -> Vec3 {
        let sin_phi = self.phi.sin();
        Vec3::new(
            sin_phi * self.theta.sin(),
            self.phi.cos(),
            sin_phi * self.theta.cos(),
        )
    }
}
