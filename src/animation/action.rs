use std::sync::Arc;

use glam::{Quat, Vec3};

use crate::animation::binding::PropertyBinding;
use crate::animation::clip::{AnimationClip, TrackData};
use crate::animation::tracks::KeyframeCursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// Play to the end once, then hold the last frame (auto-pauses).
    Once,
    Loop,
}

/// A weight ramp toward a target, advanced by the mixer clock.
#[derive(Debug, Clone, Copy)]
struct Fade {
    target: f32,
    /// Weight change per second; sign points at the target.
    rate: f32,
}

/// One playing (or fading) instance of a clip.
///
/// Time advance and fading are driven by [`AnimationAction::update`]; the
/// mixer samples the bound tracks afterwards and blends by `weight`.
#[derive(Debug, Clone)]
pub struct AnimationAction {
    clip: Arc<AnimationClip>,

    pub time: f32,
    pub time_scale: f32,
    pub weight: f32,
    pub loop_mode: LoopMode,
    pub paused: bool,
    pub enabled: bool,

    pub bindings: Vec<PropertyBinding>,
    pub(crate) track_cursors: Vec<KeyframeCursor>,

    fade: Option<Fade>,
}

impl AnimationAction {
    #[must_use]
    pub fn new(clip: Arc<AnimationClip>) -> Self {
        let track_count = clip.tracks.len();
        Self {
            clip,
            time: 0.0,
            time_scale: 1.0,
            weight: 1.0,
            loop_mode: LoopMode::Loop,
            paused: false,
            enabled: true,
            bindings: Vec::new(),
            track_cursors: vec![KeyframeCursor::default(); track_count],
            fade: None,
        }
    }

    #[must_use]
    pub fn clip(&self) -> &Arc<AnimationClip> {
        &self.clip
    }

    /// Rewinds to the start and clears the paused flag, like pressing play
    /// from the top. The current weight and any running fade are kept.
    pub fn reset(&mut self) {
        self.time = 0.0;
        self.paused = false;
        self.enabled = true;
        for cursor in &mut self.track_cursors {
            *cursor = KeyframeCursor::default();
        }
    }

    /// Ramps the weight from its current value to 1 over `duration`.
    pub fn fade_in(&mut self, duration: f32) {
        self.enabled = true;
        self.start_fade(1.0, duration);
    }

    /// Ramps the weight from its current value to 0 over `duration`.
    pub fn fade_out(&mut self, duration: f32) {
        self.start_fade(0.0, duration);
    }

    fn start_fade(&mut self, target: f32, duration: f32) {
        if duration <= 0.0 {
            self.weight = target;
            self.fade = None;
            return;
        }
        let rate = (target - self.weight) / duration;
        self.fade = Some(Fade { target, rate });
    }

    #[must_use]
    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    /// Advances the fade and the clip time by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if let Some(fade) = self.fade {
            self.weight += fade.rate * dt;
            let arrived = (fade.rate >= 0.0 && self.weight >= fade.target)
                || (fade.rate < 0.0 && self.weight <= fade.target);
            if arrived {
                self.weight = fade.target;
                self.fade = None;
            }
        }

        if self.paused || !self.enabled {
            return;
        }

        let duration = self.clip.duration;
        if duration <= 0.0 {
            return;
        }

        self.time += dt * self.time_scale;

        match self.loop_mode {
            LoopMode::Once => {
                if self.time >= duration {
                    self.time = duration;
                    self.paused = true;
                } else if self.time < 0.0 {
                    self.time = 0.0;
                    self.paused = true;
                }
            }
            LoopMode::Loop => {
                if self.time >= duration {
                    self.time %= duration;
                } else if self.time < 0.0 {
                    self.time = duration + (self.time % duration);
                }
            }
        }
    }

    /// Samples the given track at the current time.
    pub fn sample_track(&mut self, track_index: usize) -> Option<TrackValue> {
        let track = self.clip.tracks.get(track_index)?;
        let cursor = self.track_cursors.get_mut(track_index)?;

        Some(match &track.data {
            TrackData::Vector3(t) => TrackValue::Vector3(t.sample_with_cursor(self.time, cursor)),
            TrackData::Quaternion(t) => {
                TrackValue::Quaternion(t.sample_with_cursor(self.time, cursor))
            }
        })
    }
}

pub enum TrackValue {
    Vector3(Vec3),
    Quaternion(Quat),
}
