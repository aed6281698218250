//! Fighter State Machine
//!
//! Converts press/release edges into ActionState/JuggleState updates and
//! schedules the transient attack-window timers. The same code path serves
//! live input and replayed input - a replayed event is indistinguishable from
//! a live one by the time it reaches here.

use tracing::{debug, trace};

use crate::collab::{AnimFlag, FighterRig, HurtboxOrientation, Pose};
use crate::game::events::CombatEvent;
use crate::game::input::{Button, InputEvent, InputEventKind};
use crate::game::state::{ActionState, AttackKind, BoutState, FighterId, JuggleState};
use crate::game::timer::{TimerEffect, TimerQueue};
use crate::{ATTACK_WINDOW_TICKS, DASH_GRACE_TICKS};

/// Dash-variant animation flag for a double-tapped movement button.
fn dash_variant(button: Button) -> Option<AnimFlag> {
    match button {
        Button::Forward => Some(AnimFlag::Dash),
        Button::Back => Some(AnimFlag::BackStep),
        Button::Crouch => Some(AnimFlag::SideDodgeRight),
        Button::Jump => Some(AnimFlag::SideDodgeLeft),
        _ => None,
    }
}

/// Action a movement button holds the fighter in while pressed.
fn movement_action(button: Button) -> Option<ActionState> {
    match button {
        Button::Forward => Some(ActionState::StepForward),
        Button::Back => Some(ActionState::StepBack),
        Button::Crouch => Some(ActionState::Crouch),
        Button::Jump => Some(ActionState::Jump),
        _ => None,
    }
}

/// Change a fighter's action, emitting an event when it actually changes.
fn set_action(bout: &mut BoutState, fighter: FighterId, to: ActionState) {
    let tick = bout.tick;
    let state = bout.fighter_mut(fighter);
    if state.action != to {
        let from = state.action;
        state.action = to;
        bout.push_event(CombatEvent::action_changed(tick, fighter, from, to));
    }
}

/// Feed one input event (live or replayed) through the transition table.
pub fn apply_input_event(
    bout: &mut BoutState,
    timers: &mut TimerQueue,
    rig: &mut FighterRig,
    fighter: FighterId,
    event: &InputEvent,
) {
    match event.kind {
        InputEventKind::Press(button) => {
            if let Some(kind) = button.attack_kind() {
                start_attack(bout, timers, rig, fighter, button, kind);
            } else {
                movement_press(bout, timers, rig, fighter, button);
            }
        }
        InputEventKind::Release(button) => {
            if button.is_movement() {
                movement_release(bout, timers, rig, fighter, button);
            }
            // Attack buttons act on press only; the window timer owns the exit.
        }
        InputEventKind::AxisSample(axis, value) => {
            // Axis input is recorded and replayed but drives no transition.
            trace!(?axis, value, "axis sample carries no state transition");
        }
    }
}

/// Open an attack window, unless one is already running.
fn start_attack(
    bout: &mut BoutState,
    timers: &mut TimerQueue,
    rig: &mut FighterRig,
    fighter: FighterId,
    button: Button,
    kind: AttackKind,
) {
    let now = bout.tick;
    if bout.fighter(fighter).attack_active(now) {
        // No buffering, no canceling: overlapping presses are dropped.
        debug!(?button, "attack press ignored, window already active");
        return;
    }

    // A jab thrown from a crouch is the launching uppercut.
    let uppercut =
        kind == AttackKind::Hand && bout.fighter(fighter).action == ActionState::Crouch;

    let flag = button.anim_flag();
    rig.animation.set_flag(flag, true);

    set_action(bout, fighter, ActionState::attack_for(kind));
    let state = bout.fighter_mut(fighter);
    state.attack_until = Some(now + ATTACK_WINDOW_TICKS);
    if uppercut {
        state.juggle = JuggleState::Rising;
    }

    // Replaces any stale revert from a previous window.
    timers.schedule(
        now,
        ATTACK_WINDOW_TICKS,
        fighter,
        TimerEffect::EndAttackWindow { flag },
    );

    bout.push_event(CombatEvent::attack_started(now, fighter, kind, button));
}

/// Movement button went down: walk flag, dash variant, held action.
fn movement_press(
    bout: &mut BoutState,
    timers: &mut TimerQueue,
    rig: &mut FighterRig,
    fighter: FighterId,
    button: Button,
) {
    let now = bout.tick;

    // Double-tap within the grace window fires the dash variant.
    if bout.fighter(fighter).is_primed(button) {
        if let Some(variant) = dash_variant(button) {
            rig.animation.set_flag(variant, true);
            timers.schedule(
                now,
                DASH_GRACE_TICKS,
                fighter,
                TimerEffect::ClearAnimFlag(variant),
            );
        }
    }

    // Jump arms its prime on the way down, the other three on release.
    if button == Button::Jump {
        bout.fighter_mut(fighter).prime(button);
        timers.schedule(now, DASH_GRACE_TICKS, fighter, TimerEffect::ClearDashPrimes);
    }

    rig.animation.set_flag(button.anim_flag(), true);

    // The attack window owns the action until its timer reverts it.
    if !bout.fighter(fighter).attack_active(now) {
        if let Some(action) = movement_action(button) {
            set_action(bout, fighter, action);
        }
    }
}

/// Movement button came up: drop the walk flag, arm the dash prime.
fn movement_release(
    bout: &mut BoutState,
    timers: &mut TimerQueue,
    rig: &mut FighterRig,
    fighter: FighterId,
    button: Button,
) {
    let now = bout.tick;
    rig.animation.set_flag(button.anim_flag(), false);

    if button != Button::Jump {
        bout.fighter_mut(fighter).prime(button);
        timers.schedule(now, DASH_GRACE_TICKS, fighter, TimerEffect::ClearDashPrimes);
    }

    // Leaving the held movement returns to neutral unless something
    // (attack window, reaction) took the action over in the meantime.
    if !bout.fighter(fighter).attack_active(now) {
        if movement_action(button) == Some(bout.fighter(fighter).action) {
            set_action(bout, fighter, ActionState::Idle);
        }
    }
}

/// Apply a fired timer effect. Runs after input and hit resolution, so a hit
/// registered this tick cannot be overridden by a stale revert.
pub fn apply_timer_effect(
    bout: &mut BoutState,
    rig: &mut FighterRig,
    fighter: FighterId,
    effect: TimerEffect,
) {
    match effect {
        TimerEffect::EndAttackWindow { flag } => {
            rig.animation.set_flag(flag, false);
            let tick = bout.tick;
            let state = bout.fighter_mut(fighter);
            state.attack_until = None;
            // The uppercut designation lives exactly as long as its window.
            if state.juggle == JuggleState::Rising {
                state.juggle = JuggleState::Grounded;
            }
            // Revert unless a reaction or juggle transition preempted the window.
            if state.action.is_attack() {
                let from = state.action;
                state.action = ActionState::Idle;
                bout.push_event(CombatEvent::timer_revert(
                    tick,
                    fighter,
                    from,
                    ActionState::Idle,
                ));
            }
        }
        TimerEffect::ClearDashPrimes => {
            bout.fighter_mut(fighter).clear_primes();
        }
        TimerEffect::ClearAnimFlag(flag) => {
            rig.animation.set_flag(flag, false);
        }
        TimerEffect::ReorientHurtbox => {
            rig.colliders.set_hurtbox(HurtboxOrientation::Flat);
        }
    }
}

/// Ground contact: the juggle ends, whatever else is going on.
pub fn apply_ground_contact(bout: &mut BoutState, rig: &mut FighterRig, fighter: FighterId) {
    let was_airborne = bout.fighter(fighter).juggle == JuggleState::AirborneJuggled;
    let tick = bout.tick;

    let state = bout.fighter_mut(fighter);
    state.juggle = JuggleState::Grounded;
    rig.animation.set_flag(AnimFlag::Floating, false);

    if was_airborne {
        bout.push_event(CombatEvent::ground_contact(tick, fighter));
    }
}

/// Fold the animation rig's current pose back into ActionState.
///
/// Several states (neutral, crouch, walks, knockdown, guard) are owned by the
/// animation graph; the machine reads them back each tick instead of guessing
/// clip boundaries. Skipped while an attack window is forcing the action.
pub fn sync_pose(bout: &mut BoutState, rig: &FighterRig, fighter: FighterId) {
    const POSE_ACTIONS: [(Pose, ActionState); 6] = [
        (Pose::Idle, ActionState::Idle),
        (Pose::Sit, ActionState::Crouch),
        (Pose::WalkFwd, ActionState::StepForward),
        (Pose::WalkBwd, ActionState::StepBack),
        (Pose::Lay, ActionState::Prone),
        (Pose::Guard, ActionState::Guard),
    ];

    if bout.fighter(fighter).attack_active(bout.tick) {
        return;
    }

    for (pose, action) in POSE_ACTIONS {
        if rig.animation.is_current(pose) {
            set_action(bout, fighter, action);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::testkit::{recording_rig, RigLogHandle};
    use crate::game::state::BoutPhase;

    struct Harness {
        bout: BoutState,
        timers: TimerQueue,
        rig: FighterRig,
        log: RigLogHandle,
    }

    impl Harness {
        fn new() -> Self {
            let mut bout = BoutState::new();
            bout.phase = BoutPhase::Fighting;
            let (rig, log) = recording_rig();
            Self {
                bout,
                timers: TimerQueue::new(),
                rig,
                log,
            }
        }

        fn feed(&mut self, event: InputEvent) {
            apply_input_event(
                &mut self.bout,
                &mut self.timers,
                &mut self.rig,
                FighterId::P1,
                &event,
            );
        }

        fn run_timers(&mut self) {
            for (fighter, effect) in self.timers.drain_due(self.bout.tick) {
                apply_timer_effect(&mut self.bout, &mut self.rig, fighter, effect);
            }
        }

        fn action(&self) -> ActionState {
            self.bout.fighter(FighterId::P1).action
        }

        fn juggle(&self) -> JuggleState {
            self.bout.fighter(FighterId::P1).juggle
        }
    }

    #[test]
    fn test_walk_cycle() {
        let mut h = Harness::new();

        h.feed(InputEvent::press(0, Button::Forward));
        assert_eq!(h.action(), ActionState::StepForward);
        assert_eq!(h.log.borrow().flags.get(&AnimFlag::WalkFwd), Some(&true));

        h.bout.tick = 30;
        h.feed(InputEvent::release(30, Button::Forward));
        assert_eq!(h.action(), ActionState::Idle);
        assert_eq!(h.log.borrow().flags.get(&AnimFlag::WalkFwd), Some(&false));
    }

    #[test]
    fn test_double_tap_dash() {
        let mut h = Harness::new();

        h.feed(InputEvent::press(0, Button::Forward));
        h.bout.tick = 5;
        h.feed(InputEvent::release(5, Button::Forward));

        // Re-press inside the grace window: dash variant fires.
        h.bout.tick = 10;
        h.feed(InputEvent::press(10, Button::Forward));
        assert_eq!(h.log.borrow().flags.get(&AnimFlag::Dash), Some(&true));

        // The dash flag clears on its own timer.
        h.bout.tick = 10 + DASH_GRACE_TICKS;
        h.run_timers();
        assert_eq!(h.log.borrow().flags.get(&AnimFlag::Dash), Some(&false));
    }

    #[test]
    fn test_dash_prime_expires() {
        let mut h = Harness::new();

        h.feed(InputEvent::press(0, Button::Forward));
        h.bout.tick = 5;
        h.feed(InputEvent::release(5, Button::Forward));

        // Grace window passes; the prime is dropped.
        h.bout.tick = 5 + DASH_GRACE_TICKS;
        h.run_timers();

        h.feed(InputEvent::press(h.bout.tick, Button::Forward));
        assert_eq!(h.log.borrow().flags.get(&AnimFlag::Dash), None);
        assert_eq!(h.action(), ActionState::StepForward);
    }

    #[test]
    fn test_back_double_tap_is_backstep() {
        let mut h = Harness::new();

        h.feed(InputEvent::press(0, Button::Back));
        h.bout.tick = 4;
        h.feed(InputEvent::release(4, Button::Back));
        h.bout.tick = 8;
        h.feed(InputEvent::press(8, Button::Back));

        assert_eq!(h.log.borrow().flags.get(&AnimFlag::BackStep), Some(&true));
        assert_eq!(h.action(), ActionState::StepBack);
    }

    #[test]
    fn test_jump_primes_on_press() {
        let mut h = Harness::new();

        h.feed(InputEvent::press(0, Button::Jump));
        assert_eq!(h.action(), ActionState::Jump);

        // Second press inside the grace window triggers the side dodge.
        h.bout.tick = 6;
        h.feed(InputEvent::release(6, Button::Jump));
        h.bout.tick = 8;
        h.feed(InputEvent::press(8, Button::Jump));
        assert_eq!(
            h.log.borrow().flags.get(&AnimFlag::SideDodgeLeft),
            Some(&true)
        );
    }

    #[test]
    fn test_attack_window_exclusivity() {
        let mut h = Harness::new();

        h.feed(InputEvent::press(0, Button::JabRight));
        assert_eq!(h.action(), ActionState::HandAttack);
        assert_eq!(h.log.borrow().flags.get(&AnimFlag::JabRight), Some(&true));

        // Movement during the window changes nothing.
        h.bout.tick = 4;
        h.feed(InputEvent::press(4, Button::Forward));
        assert_eq!(h.action(), ActionState::HandAttack);

        // Still forced just before expiry.
        h.bout.tick = ATTACK_WINDOW_TICKS - 1;
        h.run_timers();
        assert_eq!(h.action(), ActionState::HandAttack);

        // Reverts exactly at the deadline.
        h.bout.tick = ATTACK_WINDOW_TICKS;
        h.run_timers();
        assert_eq!(h.action(), ActionState::Idle);
        assert_eq!(h.log.borrow().flags.get(&AnimFlag::JabRight), Some(&false));
    }

    #[test]
    fn test_overlapping_attack_press_is_ignored() {
        let mut h = Harness::new();

        h.feed(InputEvent::press(0, Button::JabRight));
        h.bout.tick = 3;
        h.feed(InputEvent::press(3, Button::KickLeft));

        // Still the jab; the kick press vanished (no buffering).
        assert_eq!(h.action(), ActionState::HandAttack);
        assert_eq!(h.log.borrow().flags.get(&AnimFlag::KickLeft), None);

        // And the window still ends on the jab's schedule.
        h.bout.tick = ATTACK_WINDOW_TICKS;
        h.run_timers();
        assert_eq!(h.action(), ActionState::Idle);
    }

    #[test]
    fn test_new_attack_cancels_stale_revert() {
        let mut h = Harness::new();

        h.feed(InputEvent::press(0, Button::JabRight));

        // First window ends; fighter back to neutral.
        h.bout.tick = ATTACK_WINDOW_TICKS;
        h.run_timers();
        assert_eq!(h.action(), ActionState::Idle);

        // Second attack right after: its window must run the full length,
        // not get cut by any leftover timer from the first.
        h.feed(InputEvent::press(h.bout.tick, Button::KickRight));
        let second_start = h.bout.tick;

        h.bout.tick = second_start + ATTACK_WINDOW_TICKS - 1;
        h.run_timers();
        assert_eq!(h.action(), ActionState::FootAttack);

        h.bout.tick = second_start + ATTACK_WINDOW_TICKS;
        h.run_timers();
        assert_eq!(h.action(), ActionState::Idle);
    }

    #[test]
    fn test_crouch_jab_is_uppercut() {
        let mut h = Harness::new();

        h.feed(InputEvent::press(0, Button::Crouch));
        assert_eq!(h.action(), ActionState::Crouch);

        h.bout.tick = 5;
        h.feed(InputEvent::press(5, Button::JabLeft));
        assert_eq!(h.action(), ActionState::HandAttack);
        assert_eq!(h.juggle(), JuggleState::Rising);

        // The designation dies with the window.
        h.bout.tick = 5 + ATTACK_WINDOW_TICKS;
        h.run_timers();
        assert_eq!(h.juggle(), JuggleState::Grounded);
    }

    #[test]
    fn test_standing_kick_is_not_uppercut() {
        let mut h = Harness::new();
        h.feed(InputEvent::press(0, Button::KickRight));
        assert_eq!(h.juggle(), JuggleState::Grounded);
    }

    #[test]
    fn test_revert_skipped_when_reaction_preempted() {
        let mut h = Harness::new();

        h.feed(InputEvent::press(0, Button::JabRight));

        // A hit reaction lands mid-window (dispatched by the opponent's hit
        // resolution) and takes the action over.
        {
            let state = h.bout.fighter_mut(FighterId::P1);
            state.action = ActionState::HandReaction;
            state.attack_until = None;
        }

        h.bout.tick = ATTACK_WINDOW_TICKS;
        h.run_timers();

        // The revert lowered the anim flag but left the reaction alone.
        assert_eq!(h.action(), ActionState::HandReaction);
        assert_eq!(h.log.borrow().flags.get(&AnimFlag::JabRight), Some(&false));
    }

    #[test]
    fn test_axis_sample_is_inert() {
        let mut h = Harness::new();
        use crate::core::fixed::FIXED_HALF;
        use crate::game::input::Axis;

        h.feed(InputEvent::axis(0, Axis::Horizontal, FIXED_HALF));
        assert_eq!(h.action(), ActionState::Idle);
        assert!(h.timers.is_empty());
    }

    #[test]
    fn test_ground_contact_resets_juggle() {
        let mut h = Harness::new();
        h.bout.fighter_mut(FighterId::P1).juggle = JuggleState::AirborneJuggled;

        apply_ground_contact(&mut h.bout, &mut h.rig, FighterId::P1);

        assert_eq!(h.juggle(), JuggleState::Grounded);
        assert_eq!(h.log.borrow().flags.get(&AnimFlag::Floating), Some(&false));
        assert_eq!(h.bout.pending_events.len(), 1);
    }

    #[test]
    fn test_pose_sync_folds_animation_states() {
        let mut h = Harness::new();
        h.bout.fighter_mut(FighterId::P1).action = ActionState::HandReaction;

        // Animator finished the reaction and is back on idle.
        h.log.borrow_mut().pose = Some(Pose::Idle);
        sync_pose(&mut h.bout, &h.rig, FighterId::P1);
        assert_eq!(h.action(), ActionState::Idle);

        // Knockdown clip reports Lay.
        h.log.borrow_mut().pose = Some(Pose::Lay);
        sync_pose(&mut h.bout, &h.rig, FighterId::P1);
        assert_eq!(h.action(), ActionState::Prone);
    }

    #[test]
    fn test_pose_sync_skipped_during_attack_window() {
        let mut h = Harness::new();
        h.feed(InputEvent::press(0, Button::JabRight));

        h.log.borrow_mut().pose = Some(Pose::Idle);
        sync_pose(&mut h.bout, &h.rig, FighterId::P1);

        // The window owns the action; the pose cannot pull it back to Idle.
        assert_eq!(h.action(), ActionState::HandAttack);
    }
}
