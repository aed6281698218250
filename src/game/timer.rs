//! Delayed One-Shot Effects
//!
//! Every suspension in the combat core is a cancellable one-shot timer keyed
//! by (fighter, effect kind): "revert the attack window in 12 ticks", "drop
//! the dash primes in 12 ticks", "rotate the hurtbox flat in 24 ticks".
//!
//! Timers are processed once per tick in the main loop, after input and hit
//! resolution - no callback ever runs concurrently with the tick. Scheduling
//! an effect kind that is already pending for the same fighter replaces the
//! stale entry, so a fresh attack window can never be cut short by the revert
//! of a dead one.

use serde::{Deserialize, Serialize};

use crate::collab::AnimFlag;
use crate::game::state::FighterId;

/// Effect applied when a timer fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerEffect {
    /// Close the attack window: revert action to Idle and lower `flag`.
    EndAttackWindow {
        /// Attack animation flag to lower
        flag: AnimFlag,
    },
    /// Drop all dash-eligibility primes (the grace window ended).
    ClearDashPrimes,
    /// Lower a transient animation flag (dash/back-step/side-dodge).
    ClearAnimFlag(AnimFlag),
    /// Rotate the hurtbox flat so juggle follow-ups connect.
    ReorientHurtbox,
}

/// Cancellation key class for an effect.
///
/// One pending timer per (fighter, kind); all `EndAttackWindow` entries share
/// a kind regardless of which button opened the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerKind {
    /// Attack window revert
    AttackRevert,
    /// Dash grace expiry
    DashGrace,
    /// A specific transient animation flag
    AnimFlagClear(AnimFlag),
    /// Hurtbox re-orientation
    HurtboxReorient,
}

impl TimerEffect {
    /// The cancellation key class of this effect.
    pub fn kind(&self) -> TimerKind {
        match self {
            TimerEffect::EndAttackWindow { .. } => TimerKind::AttackRevert,
            TimerEffect::ClearDashPrimes => TimerKind::DashGrace,
            TimerEffect::ClearAnimFlag(flag) => TimerKind::AnimFlagClear(*flag),
            TimerEffect::ReorientHurtbox => TimerKind::HurtboxReorient,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct PendingTimer {
    due: u32,
    seq: u64,
    fighter: FighterId,
    effect: TimerEffect,
}

/// The per-bout timer queue.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TimerQueue {
    pending: Vec<PendingTimer>,
    next_seq: u64,
}

impl TimerQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `effect` for `fighter`, `delay` ticks from `now`.
    ///
    /// Replaces any pending timer with the same (fighter, kind) - the
    /// replacement IS the cancellation token.
    pub fn schedule(&mut self, now: u32, delay: u32, fighter: FighterId, effect: TimerEffect) {
        self.cancel(fighter, effect.kind());
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(PendingTimer {
            due: now.saturating_add(delay),
            seq,
            fighter,
            effect,
        });
    }

    /// Cancel a pending timer. Returns whether one was pending.
    pub fn cancel(&mut self, fighter: FighterId, kind: TimerKind) -> bool {
        let before = self.pending.len();
        self.pending
            .retain(|t| !(t.fighter == fighter && t.effect.kind() == kind));
        self.pending.len() != before
    }

    /// Whether a timer of this kind is pending for the fighter.
    pub fn is_scheduled(&self, fighter: FighterId, kind: TimerKind) -> bool {
        self.pending
            .iter()
            .any(|t| t.fighter == fighter && t.effect.kind() == kind)
    }

    /// Drop every pending timer for a fighter (KO, replay stop).
    pub fn clear_fighter(&mut self, fighter: FighterId) {
        self.pending.retain(|t| t.fighter != fighter);
    }

    /// Pop every timer due at or before `now`, in (due, schedule) order.
    pub fn drain_due(&mut self, now: u32) -> Vec<(FighterId, TimerEffect)> {
        let mut due: Vec<PendingTimer> = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].due <= now {
                due.push(self.pending.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|t| (t.due, t.seq));
        due.into_iter().map(|t| (t.fighter, t.effect)).collect()
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
