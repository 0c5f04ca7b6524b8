//! Reaction Trigger Tests
//!
//! The click-triggered crossfade cycle from the interaction contract:
//! idle → reacting on a qualifying click, timed blend back, guard release
//! exactly once per cycle, and graceful no-ops when clips are missing.

use std::sync::Arc;

use glam::Vec3;

use vitrine::animation::{
    AnimationAction, AnimationClip, AnimationMixer, Binder, InterpolationMode, KeyframeTrack,
    LoopMode, TargetPath, Track, TrackData, TrackMeta,
};
use vitrine::config::InteractionTimings;
use vitrine::interaction::{ReactionTrigger, TriggerPhase};
use vitrine::scene::{Node, Scene};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn clip(name: &str, duration: f32, x: f32) -> Arc<AnimationClip> {
    Arc::new(AnimationClip::new(
        name.to_string(),
        vec![Track {
            meta: TrackMeta {
                node_index: 0,
                target: TargetPath::Translation,
            },
            data: TrackData::Vector3(KeyframeTrack::new(
                vec![0.0, duration],
                vec![Vec3::new(x, 0.0, 0.0), Vec3::new(x, 0.0, 0.0)],
                InterpolationMode::Linear,
            )),
        }],
    ))
}

struct Rig {
    scene: Scene,
    mixer: AnimationMixer,
    trigger: ReactionTrigger,
    idle_id: vitrine::animation::ActionId,
    reaction_id: vitrine::animation::ActionId,
}

impl Rig {
    fn new() -> Self {
        let mut scene = Scene::new();
        let node = scene.add_node(Node::new("hips"));
        let node_map = [node];

        let mut mixer = AnimationMixer::new();

        let mut idle = AnimationAction::new(clip("wave", 2.0, 0.0));
        idle.bindings = Binder::bind(idle.clip(), &node_map);
        idle.loop_mode = LoopMode::Loop;
        let idle_id = mixer.add_action(idle);

        let mut reaction = AnimationAction::new(clip("stumble", 6.0, 10.0));
        reaction.bindings = Binder::bind(reaction.clip(), &node_map);
        reaction.loop_mode = LoopMode::Once;
        reaction.weight = 0.0;
        reaction.paused = true;
        let reaction_id = mixer.add_action(reaction);

        let trigger = ReactionTrigger::new(idle_id, reaction_id, InteractionTimings::default());

        Self {
            scene,
            mixer,
            trigger,
            idle_id,
            reaction_id,
        }
    }

    fn step(&mut self, dt: f32) {
        self.mixer.update(dt, &mut self.scene);
        self.trigger.update(&mut self.mixer);
    }

    fn step_for(&mut self, total: f32, dt: f32) {
        let steps = (total / dt).round() as usize;
        for _ in 0..steps {
            self.step(dt);
        }
    }

    fn idle_weight(&self) -> f32 {
        self.mixer.action(self.idle_id).unwrap().weight
    }

    fn reaction_weight(&self) -> f32 {
        self.mixer.action(self.reaction_id).unwrap().weight
    }
}

// ============================================================================
// Trigger lifecycle
// ============================================================================

#[test]
fn starts_idle_and_accepts_clicks() {
    let rig = Rig::new();
    assert_eq!(rig.trigger.phase(), TriggerPhase::Idle);
    assert!(rig.trigger.accepts_clicks());
}

#[test]
fn click_enters_reacting_and_blends_in() {
    let mut rig = Rig::new();

    assert!(rig.trigger.try_trigger(&mut rig.mixer));
    assert_eq!(rig.trigger.phase(), TriggerPhase::Reacting);

    // 0.3s crossfade-in: reaction fully weighted, idle gone.
    rig.step_for(0.3, 0.05);
    assert!(approx(rig.reaction_weight(), 1.0), "got {}", rig.reaction_weight());
    assert!(approx(rig.idle_weight(), 0.0), "got {}", rig.idle_weight());
}

#[test]
fn clicks_during_reaction_are_ignored() {
    let mut rig = Rig::new();

    assert!(rig.trigger.try_trigger(&mut rig.mixer));
    // Rapid repeat clicks within the guard window all bounce.
    for _ in 0..10 {
        rig.step(0.1);
        assert!(!rig.trigger.try_trigger(&mut rig.mixer));
    }
    assert_eq!(rig.trigger.phase(), TriggerPhase::Reacting);
}

#[test]
fn blend_back_starts_at_hold_deadline() {
    let mut rig = Rig::new();
    rig.trigger.try_trigger(&mut rig.mixer);

    // Just before the 4s hold: reaction still owns the pose.
    rig.step_for(3.9, 0.1);
    assert!(approx(rig.reaction_weight(), 1.0));

    // Cross the deadline, then let the 1s blend-back finish.
    rig.step_for(1.2, 0.1);
    assert!(approx(rig.idle_weight(), 1.0), "idle back, got {}", rig.idle_weight());
    assert!(approx(rig.reaction_weight(), 0.0));
}

#[test]
fn guard_releases_five_units_after_click() {
    let mut rig = Rig::new();
    rig.trigger.try_trigger(&mut rig.mixer);

    // 4.9s in: still guarded.
    rig.step_for(4.9, 0.1);
    assert_eq!(rig.trigger.phase(), TriggerPhase::Reacting);
    assert!(!rig.trigger.try_trigger(&mut rig.mixer));

    // Past 5.0s: a new cycle is accepted.
    rig.step_for(0.2, 0.1);
    assert_eq!(rig.trigger.phase(), TriggerPhase::Idle);
    assert!(rig.trigger.try_trigger(&mut rig.mixer));
}

#[test]
fn exactly_one_release_per_cycle() {
    let mut rig = Rig::new();
    rig.trigger.try_trigger(&mut rig.mixer);

    // Many extra updates after both deadlines passed must not re-fire the
    // blend-back: the idle weight stays settled at 1.
    rig.step_for(6.0, 0.1);
    let settled = rig.idle_weight();
    assert!(approx(settled, 1.0));

    for _ in 0..50 {
        rig.step(0.1);
        assert!(approx(rig.idle_weight(), 1.0), "no double-fire");
        assert_eq!(rig.trigger.phase(), TriggerPhase::Idle);
    }
}

#[test]
fn full_cycle_can_repeat() {
    let mut rig = Rig::new();

    for _ in 0..3 {
        assert!(rig.trigger.try_trigger(&mut rig.mixer));
        rig.step_for(5.2, 0.1);
        assert_eq!(rig.trigger.phase(), TriggerPhase::Idle);
        assert!(approx(rig.idle_weight(), 1.0));
    }
}

#[test]
fn one_big_step_services_both_deadlines() {
    let mut rig = Rig::new();
    rig.trigger.try_trigger(&mut rig.mixer);

    // A single oversized frame past both deadlines lands back in Idle.
    rig.step(10.0);
    assert_eq!(rig.trigger.phase(), TriggerPhase::Idle);
    assert!(rig.trigger.accepts_clicks());
}

#[test]
fn reaction_pose_drives_node_during_cycle() {
    let mut rig = Rig::new();
    let node = rig.scene.root_nodes[0];

    rig.step_for(0.5, 0.1);
    let x_idle = rig.scene.get_node(node).unwrap().transform.position.x;
    assert!(approx(x_idle, 0.0));

    rig.trigger.try_trigger(&mut rig.mixer);
    rig.step_for(1.0, 0.1);
    let x_reacting = rig.scene.get_node(node).unwrap().transform.position.x;
    assert!(approx(x_reacting, 10.0), "got {x_reacting}");
}
