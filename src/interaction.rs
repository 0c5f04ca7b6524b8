//! The click-triggered reaction cycle.
//!
//! A qualifying click crossfades the looping idle clip into a one-shot
//! reaction clip, then back, on a fixed timeline:
//!
//! ```text
//! click          +hold               +hold+tail
//!   |--- fade in --|--- fade back ------|
//!   Reacting ...........................  Idle
//! ```
//!
//! While the cycle runs further clicks are ignored: no re-entry, no
//! queueing. Deadlines are expressed in mixer time, so the whole cycle is
//! deterministic under test-driven clocks and each deadline fires exactly
//! once.

use crate::animation::{ActionId, AnimationMixer, LoopMode};
use crate::config::InteractionTimings;

/// Externally observable phase of the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerPhase {
    /// Accepting clicks; the idle clip loops.
    Idle,
    /// A reaction cycle is in flight; clicks are ignored.
    Reacting,
}

/// State machine driving the idle ⇄ reaction crossfade.
///
/// Constructed only when both clips were found in the asset; when either is
/// missing the viewer simply has no trigger and clicks are no-ops.
pub struct ReactionTrigger {
    idle: ActionId,
    reaction: ActionId,
    timings: InteractionTimings,

    phase: TriggerPhase,
    /// Mixer-time deadline for the blend back to idle.
    return_at: Option<f32>,
    /// Mixer-time deadline for accepting clicks again.
    release_at: Option<f32>,
}

impl ReactionTrigger {
    #[must_use]
    pub fn new(idle: ActionId, reaction: ActionId, timings: InteractionTimings) -> Self {
        Self {
            idle,
            reaction,
            timings,
            phase: TriggerPhase::Idle,
            return_at: None,
            release_at: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> TriggerPhase {
        self.phase
    }

    /// Whether a qualifying click would currently be accepted.
    #[must_use]
    pub fn accepts_clicks(&self) -> bool {
        self.phase == TriggerPhase::Idle
    }

    /// Starts a reaction cycle if one is not already running. Returns
    /// whether the click was consumed.
    ///
    /// The caller has already established that the click hit the avatar.
    pub fn try_trigger(&mut self, mixer: &mut AnimationMixer) -> bool {
        if self.phase == TriggerPhase::Reacting {
            return false;
        }

        if let Some(action) = mixer.action_mut(self.reaction) {
            action.loop_mode = LoopMode::Once;
        }
        mixer.crossfade(self.idle, self.reaction, self.timings.crossfade_in);

        self.phase = TriggerPhase::Reacting;
        self.return_at = Some(mixer.time() + self.timings.reaction_hold);
        self.release_at = None;
        true
    }

    /// Services due deadlines. Call once per frame after the mixer update.
    pub fn update(&mut self, mixer: &mut AnimationMixer) {
        let now = mixer.time();

        if let Some(deadline) = self.return_at {
            if now >= deadline {
                // Taking the deadline before acting guarantees the blend
                // back fires once even if updates race the timeline.
                self.return_at = None;
                mixer.crossfade(self.reaction, self.idle, self.timings.crossfade_out);
                self.release_at = Some(deadline + self.timings.guard_tail);
            }
        }

        if let Some(deadline) = self.release_at {
            if now >= deadline {
                self.release_at = None;
                self.phase = TriggerPhase::Idle;
            }
        }
    }
}
