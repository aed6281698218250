//! Bout Tick Driver
//!
//! One logical update per rendered frame. Phase order inside a tick is a
//! hard guarantee:
//!
//! 1. replay toggle handling
//! 2. pose synchronization from the animation rigs
//! 3. input - live capture+record, or replay drain, through the same machine
//! 4. hit resolution for this tick's contact reports
//! 5. ground-contact juggle resets
//! 6. timer-expiry effects
//! 7. Mealy output recomputation (contact zones, hurtbox, hit-possible flag)
//!
//! A hit registered this tick can therefore never be overridden by a stale
//! timer from a previous tick, and outputs are always derived from the
//! post-update state.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::collab::{AnimFlag, FighterRig, Pose};
use crate::game::events::CombatEvent;
use crate::game::hit::{self, ContactReport};
use crate::game::input::{Button, FrameSample, InputCapture};
use crate::game::machine;
use crate::game::state::{ActionState, BoutPhase, BoutState, FighterId};
use crate::game::timeline::{InputTimeline, ReplayError};
use crate::game::timer::TimerQueue;

/// Everything the outside world feeds into one tick.
#[derive(Clone, Debug, Default)]
pub struct TickInputs {
    /// Raw device frame per fighter (live input).
    pub frames: BTreeMap<FighterId, FrameSample>,
    /// Contact-zone overlaps reported by the collider layer.
    pub contacts: Vec<ContactReport>,
    /// Fighters whose bodies touched the ground this tick.
    pub grounded: Vec<FighterId>,
    /// The single replay on/off control was pressed this tick.
    pub toggle_replay: bool,
}

impl TickInputs {
    /// No input at all this tick.
    pub fn none() -> Self {
        Self::default()
    }

    /// Builder-style device frame.
    pub fn with_frame(mut self, fighter: FighterId, frame: FrameSample) -> Self {
        self.frames.insert(fighter, frame);
        self
    }

    /// Builder-style contact report.
    pub fn with_contact(mut self, report: ContactReport) -> Self {
        self.contacts.push(report);
        self
    }

    /// Builder-style ground contact.
    pub fn with_grounded(mut self, fighter: FighterId) -> Self {
        self.grounded.push(fighter);
        self
    }

    /// Builder-style replay toggle.
    pub fn with_toggle(mut self) -> Self {
        self.toggle_replay = true;
        self
    }
}

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick
    pub events: Vec<CombatEvent>,
    /// Whether a replay session is active after this tick
    pub replay_active: bool,
}

/// Bout configuration.
#[derive(Clone, Copy, Debug)]
pub struct BoutConfig {
    /// Retention window for the input timeline, in ticks.
    pub retention_ticks: u32,
    /// Which fighter the record/replay control surface is bound to.
    pub recorded_fighter: FighterId,
}

impl Default for BoutConfig {
    fn default() -> Self {
        Self {
            retention_ticks: crate::RETENTION_WINDOW_TICKS,
            recorded_fighter: FighterId::P1,
        }
    }
}

/// A running bout: state, timers, rigs, and the input timeline.
///
/// Single-threaded and cooperative; every mutation happens inside
/// [`Bout::tick`].
pub struct Bout {
    /// Shared combat state (both fighters).
    pub state: BoutState,
    timers: TimerQueue,
    rigs: BTreeMap<FighterId, FighterRig>,
    timeline: InputTimeline,
    captures: BTreeMap<FighterId, InputCapture>,
    recorded: FighterId,
}

impl Bout {
    /// Wire up a bout from two fully-built rigs.
    pub fn new(rig_p1: FighterRig, rig_p2: FighterRig, config: BoutConfig) -> Self {
        let mut rigs = BTreeMap::new();
        rigs.insert(FighterId::P1, rig_p1);
        rigs.insert(FighterId::P2, rig_p2);

        let mut captures = BTreeMap::new();
        for id in FighterId::BOTH {
            captures.insert(id, InputCapture::new());
        }

        Self {
            state: BoutState::new(),
            timers: TimerQueue::new(),
            rigs,
            timeline: InputTimeline::with_retention(config.retention_ticks),
            captures,
            recorded: config.recorded_fighter,
        }
    }

    /// Begin combat: inputs start recording and transitions start flowing.
    pub fn start(&mut self) {
        self.state.phase = BoutPhase::Fighting;
        info!(tick = self.state.tick, "bout started");
    }

    /// Knock the bout out: fighters pin to neutral, zones go cold,
    /// pending timers die.
    pub fn knockout(&mut self) {
        self.state.phase = BoutPhase::KnockedOut;
        for id in FighterId::BOTH {
            self.reset_fighter(id);
        }
        info!(tick = self.state.tick, "knockout");
    }

    /// The input timeline (recorded events).
    pub fn timeline(&self) -> &InputTimeline {
        &self.timeline
    }

    /// Whether a replay is currently driving the recorded fighter.
    pub fn is_replaying(&self) -> bool {
        self.timeline.is_replaying()
    }

    /// Current action of a fighter.
    pub fn action_of(&self, id: FighterId) -> ActionState {
        self.state.fighter(id).action
    }

    /// Run one simulation tick.
    pub fn tick(&mut self, io: &TickInputs) -> TickResult {
        let mut result = TickResult::default();

        match self.state.phase {
            BoutPhase::Waiting => {
                // Pre-fight: nothing records, nothing moves.
                return result;
            }
            BoutPhase::KnockedOut => {
                // Zones are forced cold every tick while someone is down.
                self.refresh_outputs();
                return result;
            }
            BoutPhase::Fighting => {}
        }

        // 0. Advance tick counter
        self.state.tick += 1;
        let now = self.state.tick;

        // 1. Replay toggle
        if io.toggle_replay {
            self.handle_replay_toggle(now);
        }

        // 2. Pose sync (animation-owned states fold back first)
        for id in FighterId::BOTH {
            if let Some(rig) = self.rigs.get(&id) {
                machine::sync_pose(&mut self.state, rig, id);
            }
        }

        // 3. Input
        for id in FighterId::BOTH {
            if id == self.recorded && self.timeline.is_replaying() {
                self.step_replay(now);
            } else {
                self.apply_live_input(now, id, io);
            }
        }

        // 4. Hit resolution
        for report in &io.contacts {
            hit::process_contact(&mut self.state, &mut self.timers, &mut self.rigs, *report);
        }

        // 5. Ground contacts
        for id in &io.grounded {
            if let Some(rig) = self.rigs.get_mut(id) {
                machine::apply_ground_contact(&mut self.state, rig, *id);
            }
        }

        // 6. Timer-expiry effects
        for (fighter, effect) in self.timers.drain_due(now) {
            if let Some(rig) = self.rigs.get_mut(&fighter) {
                machine::apply_timer_effect(&mut self.state, rig, fighter, effect);
            }
        }

        // 7. Mealy outputs
        self.refresh_outputs();

        result.events = self.state.take_events();
        result.replay_active = self.timeline.is_replaying();
        result
    }

    /// Toggle between recording and replaying.
    fn handle_replay_toggle(&mut self, now: u32) {
        if self.timeline.is_replaying() {
            let discarded = self.timeline.stop_replay();
            self.reset_fighter(self.recorded);
            self.state
                .push_event(CombatEvent::replay_aborted(now, self.recorded));
            info!(discarded, "replay toggled off");
        } else {
            match self.timeline.start_replay(now) {
                Ok(count) => {
                    // Replay starts from a clean slate, exactly like a
                    // recording would.
                    self.reset_fighter(self.recorded);
                    self.state
                        .push_event(CombatEvent::replay_started(now, self.recorded, count));
                    info!(events = count, "replay toggled on");
                }
                Err(ReplayError::EmptyBuffer) => {
                    // Recovered locally: keep recording as if nothing happened.
                    warn!("replay requested with an empty buffer; staying live");
                }
            }
        }
    }

    /// Drain due replay events into the state machine.
    fn step_replay(&mut self, now: u32) {
        let batch = self.timeline.step_replay(now);
        if let Some(rig) = self.rigs.get_mut(&self.recorded) {
            for event in &batch.events {
                debug!(?event, "replaying input");
                machine::apply_input_event(&mut self.state, &mut self.timers, rig, self.recorded, event);
            }
        }
        if batch.complete {
            self.state
                .push_event(CombatEvent::replay_finished(now, self.recorded));
            info!("replay finished");
        }
    }

    /// Capture a fighter's live frame; record it if this fighter's timeline
    /// is rolling, and apply it either way.
    fn apply_live_input(&mut self, now: u32, id: FighterId, io: &TickInputs) {
        let frame = io.frames.get(&id).copied().unwrap_or_default();
        let events = match self.captures.get_mut(&id) {
            Some(capture) => capture.capture(now, frame),
            None => Vec::new(),
        };

        if id == self.recorded {
            // Prune before append so the buffer never exceeds the window by
            // more than one tick's worth of events.
            self.timeline.prune(now);
            for event in &events {
                self.timeline.record(*event);
            }
        }

        if let Some(rig) = self.rigs.get_mut(&id) {
            for event in &events {
                machine::apply_input_event(&mut self.state, &mut self.timers, rig, id, event);
            }
        }
    }

    /// Pin a fighter back to neutral: action idle, primes dropped, pending
    /// timers dead, transient animation flags lowered.
    fn reset_fighter(&mut self, id: FighterId) {
        self.timers.clear_fighter(id);
        self.state.fighter_mut(id).reset_to_idle();
        if let Some(capture) = self.captures.get_mut(&id) {
            capture.reset();
        }
        if let Some(rig) = self.rigs.get_mut(&id) {
            for button in Button::ALL {
                rig.animation.set_flag(button.anim_flag(), false);
            }
        }
    }

    /// Recompute every derived output from current state.
    ///
    /// Pure function of (ActionState, JuggleState, dash pose, phase) - zones
    /// and hurtbox never drift because they are never stored.
    fn refresh_outputs(&mut self) {
        let phase = self.state.phase;
        for id in FighterId::BOTH {
            let (action, juggle) = {
                let fighter = self.state.fighter(id);
                (fighter.action, fighter.juggle)
            };
            let Some(rig) = self.rigs.get_mut(&id) else {
                continue;
            };

            let in_dash = rig.animation.is_current(Pose::Dash);
            for (zone, enabled) in hit::zones_enabled(action, in_dash, phase) {
                rig.colliders.set_zone_enabled(zone, enabled);
            }
            rig.colliders.set_hurtbox(hit::hurtbox_for(action, juggle));
            rig.animation
                .set_flag(AnimFlag::HitPossible, action != ActionState::StepBack);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::testkit::{recording_rig, RigLogHandle};
    use crate::collab::ContactZone;
    use crate::game::hit::HitZone;
    use crate::game::state::JuggleState;
    use crate::ATTACK_WINDOW_TICKS;

    fn bout() -> (Bout, RigLogHandle, RigLogHandle) {
        let (rig_p1, log_p1) = recording_rig();
        let (rig_p2, log_p2) = recording_rig();
        let mut bout = Bout::new(rig_p1, rig_p2, BoutConfig::default());
        bout.start();
        (bout, log_p1, log_p2)
    }

    fn held(buttons: &[Button]) -> FrameSample {
        let mut frame = FrameSample::new();
        for b in buttons {
            frame.set_held(*b, true);
        }
        frame
    }

    /// Drive the scenario from the design notes: forward 0-1s, jab at 1.5s,
    /// replay toggled at 10s.
    fn record_scenario(bout: &mut Bout) {
        // Ticks are 60 Hz: the press lands on the first simulated tick.
        for tick in 1..=600u32 {
            let frame = if (1..61).contains(&tick) {
                held(&[Button::Forward])
            } else if tick == 91 {
                held(&[Button::JabRight])
            } else {
                FrameSample::new()
            };
            let io = TickInputs::none().with_frame(FighterId::P1, frame);
            let io = if tick == 600 { io.with_toggle() } else { io };
            bout.tick(&io);
        }
    }

    #[test]
    fn test_live_walk_and_attack() {
        let (mut bout, log_p1, _) = bout();

        bout.tick(&TickInputs::none().with_frame(FighterId::P1, held(&[Button::Forward])));
        assert_eq!(bout.action_of(FighterId::P1), ActionState::StepForward);

        bout.tick(&TickInputs::none().with_frame(FighterId::P1, held(&[Button::JabRight])));
        // Forward released and jab pressed on the same tick: attack wins.
        assert_eq!(bout.action_of(FighterId::P1), ActionState::HandAttack);

        // Hands are hot, feet are not.
        {
            let log = log_p1.borrow();
            assert_eq!(log.zones.get(&ContactZone::HandRight), Some(&true));
            assert_eq!(log.zones.get(&ContactZone::HandLeft), Some(&true));
            assert_eq!(log.zones.get(&ContactZone::FootRight), Some(&false));
        }

        // Idle frames until the window expires; zones go cold again.
        for _ in 0..ATTACK_WINDOW_TICKS {
            bout.tick(&TickInputs::none());
        }
        assert_eq!(bout.action_of(FighterId::P1), ActionState::Idle);
        assert_eq!(
            log_p1.borrow().zones.get(&ContactZone::HandRight),
            Some(&false)
        );
    }

    #[test]
    fn test_timeline_records_edges_only() {
        let (mut bout, _, _) = bout();

        // Forward held 60 ticks, then released: exactly two events.
        for tick in 1..=90u32 {
            let frame = if tick <= 60 {
                held(&[Button::Forward])
            } else {
                FrameSample::new()
            };
            bout.tick(&TickInputs::none().with_frame(FighterId::P1, frame));
        }

        assert_eq!(bout.timeline().len(), 2);
    }

    #[test]
    fn test_replay_scenario_drives_states() {
        let (mut bout, _, _) = bout();
        record_scenario(&mut bout);
        assert!(bout.is_replaying());

        // Replay re-maps the timeline origin to the toggle tick (600): the
        // recorded press(1) fires at 601, release(61) at 661, jab(91) at 691.
        let mut actions = Vec::new();
        for _ in 601..=760u32 {
            bout.tick(&TickInputs::none());
            actions.push(bout.action_of(FighterId::P1));
        }
        let at = |tick: u32| actions[(tick - 601) as usize];

        assert_eq!(at(601), ActionState::StepForward);
        assert_eq!(at(660), ActionState::StepForward);
        assert_eq!(at(661), ActionState::Idle);
        assert_eq!(at(690), ActionState::Idle);
        assert_eq!(at(691), ActionState::HandAttack);
        assert_eq!(at(691 + ATTACK_WINDOW_TICKS - 1), ActionState::HandAttack);
        assert_eq!(at(691 + ATTACK_WINDOW_TICKS), ActionState::Idle);

        // Buffer drained: replay stopped on its own.
        assert!(!bout.is_replaying());
    }

    #[test]
    fn test_replay_determinism() {
        let run = || {
            let (mut bout, _, _) = bout();
            record_scenario(&mut bout);

            let mut trace = Vec::new();
            for _ in 0..200u32 {
                bout.tick(&TickInputs::none());
                trace.push(bout.action_of(FighterId::P1));
            }
            (trace, bout.state.compute_hash())
        };

        let (trace_a, hash_a) = run();
        let (trace_b, hash_b) = run();
        assert_eq!(trace_a, trace_b);
        assert_eq!(hash_a, hash_b);
    }

    #[test]
    fn test_toggle_with_empty_buffer_is_recovered() {
        let (mut bout, _, _) = bout();

        let before = bout.action_of(FighterId::P1);
        let result = bout.tick(&TickInputs::none().with_toggle());

        // The empty-buffer error is swallowed locally; nothing changed.
        assert!(!bout.is_replaying());
        assert!(!result.replay_active);
        assert_eq!(bout.action_of(FighterId::P1), before);
    }

    #[test]
    fn test_toggle_off_mid_replay_resets_to_idle() {
        let (mut bout, _, _) = bout();
        record_scenario(&mut bout);
        assert!(bout.is_replaying());

        // A few replay ticks in, toggle off early.
        for _ in 0..10 {
            bout.tick(&TickInputs::none());
        }
        assert_eq!(bout.action_of(FighterId::P1), ActionState::StepForward);

        bout.tick(&TickInputs::none().with_toggle());
        assert!(!bout.is_replaying());
        assert_eq!(bout.action_of(FighterId::P1), ActionState::Idle);
    }

    #[test]
    fn test_opponent_stays_live_during_replay() {
        let (mut bout, _, _) = bout();
        record_scenario(&mut bout);
        assert!(bout.is_replaying());

        bout.tick(&TickInputs::none().with_frame(FighterId::P2, held(&[Button::Crouch])));
        assert_eq!(bout.action_of(FighterId::P2), ActionState::Crouch);
    }

    #[test]
    fn test_hit_this_tick_beats_stale_revert() {
        let (mut bout, _, _) = bout();

        // P1 jabs; P2 crouch-jabs into an uppercut a few ticks later.
        bout.tick(&TickInputs::none().with_frame(FighterId::P1, held(&[Button::JabRight])));
        bout.tick(&TickInputs::none().with_frame(FighterId::P2, held(&[Button::Crouch])));
        bout.tick(&TickInputs::none().with_frame(
            FighterId::P2,
            held(&[Button::Crouch, Button::JabLeft]),
        ));

        // On the tick P1's window would revert, P2's uppercut connects.
        // Hit resolution runs before timer expiry, so the reaction wins.
        for _ in 0..ATTACK_WINDOW_TICKS {
            let report = ContactReport {
                attacker: FighterId::P2,
                defender: FighterId::P1,
                zone: HitZone::Head,
            };
            bout.tick(&TickInputs::none().with_contact(report));
            if bout.state.fighter(FighterId::P1).juggle == JuggleState::AirborneJuggled {
                break;
            }
        }

        assert_eq!(
            bout.state.fighter(FighterId::P1).juggle,
            JuggleState::AirborneJuggled
        );
        assert_eq!(bout.action_of(FighterId::P1), ActionState::UppercutReaction);
    }

    #[test]
    fn test_ground_contact_ends_juggle() {
        let (mut bout, log_p1, _) = bout();
        bout.state.fighter_mut(FighterId::P1).juggle = JuggleState::AirborneJuggled;

        bout.tick(&TickInputs::none().with_grounded(FighterId::P1));

        assert_eq!(bout.state.fighter(FighterId::P1).juggle, JuggleState::Grounded);
        assert_eq!(log_p1.borrow().flags.get(&AnimFlag::Floating), Some(&false));
    }

    #[test]
    fn test_knockout_forces_zones_cold() {
        let (mut bout, log_p1, _) = bout();

        bout.tick(&TickInputs::none().with_frame(FighterId::P1, held(&[Button::JabRight])));
        assert_eq!(
            log_p1.borrow().zones.get(&ContactZone::HandRight),
            Some(&true)
        );

        bout.knockout();
        bout.tick(&TickInputs::none());

        let log = log_p1.borrow();
        for zone in ContactZone::ALL {
            assert_eq!(log.zones.get(&zone), Some(&false));
        }
    }

    #[test]
    fn test_backstep_lowers_hit_possible() {
        let (mut bout, log_p1, _) = bout();

        bout.tick(&TickInputs::none().with_frame(FighterId::P1, held(&[Button::Back])));
        assert_eq!(
            log_p1.borrow().flags.get(&AnimFlag::HitPossible),
            Some(&false)
        );

        bout.tick(&TickInputs::none());
        assert_eq!(
            log_p1.borrow().flags.get(&AnimFlag::HitPossible),
            Some(&true)
        );
    }

    #[test]
    fn test_waiting_phase_is_inert() {
        let (rig_p1, _) = recording_rig();
        let (rig_p2, _) = recording_rig();
        let mut bout = Bout::new(rig_p1, rig_p2, BoutConfig::default());

        let result = bout.tick(&TickInputs::none().with_frame(FighterId::P1, held(&[Button::Forward])));

        assert_eq!(bout.state.tick, 0);
        assert!(result.events.is_empty());
        assert!(bout.timeline().is_empty());
    }
}
