//! Timed status-effect bookkeeping for a single actor.

use mazecrawl_core::{EffectTemplate, StatusEffectType};
use rand::Rng;

/// Duration sentinel marking an effect instance that never expires.
pub const INFINITE_DURATION: i32 = -1;

/// Single active effect instance afflicting an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActiveEffect {
    /// Effect being tracked.
    pub effect: StatusEffectType,
    /// Turns remaining; [`INFINITE_DURATION`] never decays.
    pub remaining: i32,
    /// Magnitude consumers read when deriving stats.
    pub potency: i32,
}

/// Ordered collection of the effects currently afflicting one actor.
///
/// The stack only tracks durations and potencies; applying a potency to
/// derived stats (health loss from poison, speed from haste) is the
/// consuming subsystem's job.
#[derive(Clone, Debug, Default)]
pub struct EffectStack {
    effects: Vec<ActiveEffect>,
}

impl EffectStack {
    /// Creates an empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            effects: Vec::new(),
        }
    }

    /// Active instances in stable insertion order.
    #[must_use]
    pub fn effects(&self) -> &[ActiveEffect] {
        &self.effects
    }

    /// Reports whether any instance of `effect` is active.
    #[must_use]
    pub fn has(&self, effect: StatusEffectType) -> bool {
        self.effects.iter().any(|active| active.effect == effect)
    }

    /// Rolls `template.chance` and, on success, applies the template.
    ///
    /// Non-stackable templates refresh an existing instance of the same
    /// type to the longer of the two durations (infinite wins) and
    /// overwrite its potency; stackable templates always add an
    /// independent instance. A failed roll leaves the stack untouched.
    ///
    /// Returns whether the effect took hold.
    pub fn apply<R: Rng + ?Sized>(&mut self, template: &EffectTemplate, rng: &mut R) -> bool {
        if !rng.gen_bool(template.chance.clamp(0.0, 1.0)) {
            return false;
        }

        let remaining = normalize_duration(template.duration);
        if !template.stackable {
            if let Some(existing) = self
                .effects
                .iter_mut()
                .find(|active| active.effect == template.effect)
            {
                existing.remaining = longer(existing.remaining, remaining);
                existing.potency = template.potency;
                return true;
            }
        }

        self.effects.push(ActiveEffect {
            effect: template.effect,
            remaining,
            potency: template.potency,
        });
        true
    }

    /// Advances one game turn: every finite duration decrements once, in
    /// stable insertion order, and instances crossing to zero or below
    /// are removed. Removal is terminal; an instance never reappears.
    ///
    /// Returns the effect type of each instance that expired this turn.
    pub fn tick(&mut self) -> Vec<StatusEffectType> {
        let mut expired = Vec::new();
        self.effects.retain_mut(|active| {
            if active.remaining == INFINITE_DURATION {
                return true;
            }
            active.remaining -= 1;
            if active.remaining <= 0 {
                expired.push(active.effect);
                return false;
            }
            true
        });
        expired
    }
}

fn normalize_duration(duration: i32) -> i32 {
    if duration < 0 {
        INFINITE_DURATION
    } else {
        duration
    }
}

fn longer(a: i32, b: i32) -> i32 {
    if a == INFINITE_DURATION || b == INFINITE_DURATION {
        INFINITE_DURATION
    } else {
        a.max(b)
    }
}
