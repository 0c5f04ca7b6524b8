use crate::animation::binding::PropertyBinding;
use crate::animation::clip::AnimationClip;
use crate::scene::NodeHandle;

/// Resolves a clip's track targets against the scene.
///
/// Clips address nodes by their index in the source asset; `node_map` is the
/// asset-index → scene-handle table produced when the model was inserted.
/// Tracks pointing outside the map are silently dropped, so a clip authored
/// against a richer hierarchy still binds what it can.
pub struct Binder;

impl Binder {
    #[must_use]
    pub fn bind(clip: &AnimationClip, node_map: &[NodeHandle]) -> Vec<PropertyBinding> {
        let mut bindings = Vec::with_capacity(clip.tracks.len());

        for (track_index, track) in clip.tracks.iter().enumerate() {
            let Some(&node) = node_map.get(track.meta.node_index) else {
                continue;
            };
            bindings.push(PropertyBinding {
                track_index,
                node,
                target: track.meta.target,
            });
        }

        bindings
    }
}
