use std::collections::HashMap;

use glam::{Quat, Vec3};

use crate::animation::action::{AnimationAction, TrackValue};
use crate::animation::binding::TargetPath;
use crate::scene::{NodeHandle, Scene};

/// Stable identifier of an action registered with a mixer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionId(usize);

/// Weighted blend accumulator for one (node, property) slot.
enum BlendSlot {
    Vector3 { value: Vec3, weight: f32 },
    Quaternion { value: Quat, weight: f32 },
}

/// Drives a set of actions and writes their weight-blended result into the
/// scene's node transforms.
///
/// Blending is a progressive weighted average: each contribution is folded
/// in at `w / accumulated_w`, so two actions crossfading sum to a stable
/// pose without normalization passes. The mixer also keeps a monotonic
/// clock (`time`), which the interaction layer uses for its deadlines.
pub struct AnimationMixer {
    actions: Vec<AnimationAction>,
    time: f32,
}

impl Default for AnimationMixer {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationMixer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            time: 0.0,
        }
    }

    /// Accumulated mixer time in seconds.
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn add_action(&mut self, action: AnimationAction) -> ActionId {
        self.actions.push(action);
        ActionId(self.actions.len() - 1)
    }

    #[must_use]
    pub fn action(&self, id: ActionId) -> Option<&AnimationAction> {
        self.actions.get(id.0)
    }

    pub fn action_mut(&mut self, id: ActionId) -> Option<&mut AnimationAction> {
        self.actions.get_mut(id.0)
    }

    /// Restarts `to` from its beginning and blends the pose from `from` to
    /// `to` over `duration` seconds.
    pub fn crossfade(&mut self, from: ActionId, to: ActionId, duration: f32) {
        if let Some(action) = self.actions.get_mut(to.0) {
            action.reset();
            action.fade_in(duration);
        }
        if let Some(action) = self.actions.get_mut(from.0) {
            action.fade_out(duration);
        }
    }

    /// Advances all actions by `dt` and applies the blended pose to the
    /// scene. Call once per frame, before the scene's matrix update.
    pub fn update(&mut self, dt: f32, scene: &mut Scene) {
        self.time += dt;

        for action in &mut self.actions {
            action.update(dt);
        }

        let mut slots: HashMap<(NodeHandle, TargetPath), BlendSlot> = HashMap::new();

        for action in &mut self.actions {
            // Paused actions still hold their pose while they fade; only a
            // zero weight removes an action from the blend.
            if !action.enabled || action.weight <= f32::EPSILON {
                continue;
            }
            let weight = action.weight;

            let binding_count = action.bindings.len();
            for i in 0..binding_count {
                let (track_index, node, target) = {
                    let b = &action.bindings[i];
                    (b.track_index, b.node, b.target)
                };
                let Some(value) = action.sample_track(track_index) else {
                    continue;
                };

                let slot = slots.entry((node, target));
                match value {
                    TrackValue::Vector3(v) => {
                        slot.and_modify(|s| {
                            if let BlendSlot::Vector3 { value, weight: acc } = s {
                                *acc += weight;
                                *value = value.lerp(v, weight / *acc);
                            }
                        })
                        .or_insert(BlendSlot::Vector3 { value: v, weight });
                    }
                    TrackValue::Quaternion(q) => {
                        slot.and_modify(|s| {
                            if let BlendSlot::Quaternion { value, weight: acc } = s {
                                *acc += weight;
                                *value = value.slerp(q, weight / *acc);
                            }
                        })
                        .or_insert(BlendSlot::Quaternion { value: q, weight });
                    }
                }
            }
        }

        for ((node_handle, target), slot) in slots {
            let Some(node) = scene.get_node_mut(node_handle) else {
                continue;
            };
            match (target, slot) {
                (TargetPath::Translation, BlendSlot::Vector3 { value, .. }) => {
                    node.transform.position = value;
                }
                (TargetPath::Scale, BlendSlot::Vector3 { value, .. }) => {
                    node.transform.scale = value;
                }
                (TargetPath::Rotation, BlendSlot::Quaternion { value, .. }) => {
                    node.transform.rotation = value;
                }
                _ => continue,
            }
            node.transform.mark_dirty();
        }
    }
}
