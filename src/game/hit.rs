//! Hit Resolution
//!
//! Decides what a contact-zone overlap means: which cue to play, whether the
//! defender launches into a juggle, and what impulse the physics body gets.
//! `resolve_contact` is a total pure function over the two fighters' states;
//! `process_contact` applies the outcome to the bout and the defender's rig.
//!
//! Known gap, kept on purpose: low-zone hits resolve to nothing. The combat
//! design never finished the low game, and silently inventing one here would
//! change balance.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::collab::{
    AnimFlag, AnimTrigger, AudioCue, ContactZone, FighterRig, HurtboxOrientation,
};
use crate::core::fixed::{AIR_HIT_IMPULSE, LAUNCH_IMPULSE};
use crate::core::vec3::FixedVec3;
use crate::game::events::CombatEvent;
use crate::game::state::{ActionState, AttackKind, BoutPhase, BoutState, FighterId, FighterState, JuggleState};
use crate::game::timer::{TimerEffect, TimerQueue};
use crate::HURTBOX_REORIENT_TICKS;

/// Where a hit landed on the defender's body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HitZone {
    /// Head
    Head = 0,
    /// Torso
    Mid = 1,
    /// Legs (resolution is a documented no-op)
    Low = 2,
}

/// A contact-zone overlap reported by the collider layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactReport {
    /// Fighter whose contact zone overlapped
    pub attacker: FighterId,
    /// Fighter who was touched
    pub defender: FighterId,
    /// Zone of the defender's body that was touched
    pub zone: HitZone,
}

/// What a resolved contact does to the defender.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HitOutcome {
    /// Cue class to play, if the hit connected.
    pub cue: Option<AudioCue>,
    /// Reaction state to force on the defender, if any.
    pub reaction: Option<ActionState>,
    /// Defender escalates to an airborne juggle (launch impulse, once).
    pub launch: bool,
    /// Defender was already airborne: velocity reset + small upward impulse.
    pub air_hit: bool,
}

impl HitOutcome {
    /// The no-op outcome.
    pub const IGNORED: HitOutcome = HitOutcome {
        cue: None,
        reaction: None,
        launch: false,
        air_hit: false,
    };

    /// Whether the contact did anything at all.
    pub fn connected(&self) -> bool {
        *self != Self::IGNORED
    }
}

/// Cue class for an attack kind landing on a zone.
///
/// Low returns None: see the module gap note.
fn cue_for(kind: AttackKind, zone: HitZone) -> Option<AudioCue> {
    match (kind, zone) {
        (AttackKind::Hand, HitZone::Head) => Some(AudioCue::HandHead),
        (AttackKind::Hand, HitZone::Mid) => Some(AudioCue::HandMid),
        (AttackKind::Foot, HitZone::Head) => Some(AudioCue::FootHead),
        (AttackKind::Foot, HitZone::Mid) => Some(AudioCue::FootMid),
        (_, HitZone::Low) => None,
    }
}

/// Resolve a contact into an outcome. Pure; total over all state pairs.
///
/// The rules, in gate order:
/// - the attacker must actually be inside an attack window;
/// - a back-stepping defender has evaded (the hit-possible flag is down);
/// - a downed defender presents no hurtbox;
/// - low-zone contacts resolve to nothing (documented gap);
/// - an airborne defender takes an air hit, never a second launch;
/// - a launching (uppercut) hand attack puts a grounded defender airborne;
/// - guarding soaks the impulse and the reaction but still makes noise.
pub fn resolve_contact(
    attacker: &FighterState,
    defender: &FighterState,
    zone: HitZone,
) -> HitOutcome {
    let Some(kind) = attacker.action.attack_kind() else {
        return HitOutcome::IGNORED;
    };

    if defender.action == ActionState::StepBack || defender.action == ActionState::Prone {
        return HitOutcome::IGNORED;
    }

    let Some(cue) = cue_for(kind, zone) else {
        return HitOutcome::IGNORED;
    };

    if defender.juggle == JuggleState::AirborneJuggled {
        // Re-entry guard: a juggled fighter is hit again but never re-launched.
        return HitOutcome {
            cue: Some(cue),
            reaction: None,
            launch: false,
            air_hit: true,
        };
    }

    if attacker.juggle.launches() && kind == AttackKind::Hand {
        return HitOutcome {
            cue: Some(cue),
            reaction: Some(ActionState::UppercutReaction),
            launch: true,
            air_hit: false,
        };
    }

    if defender.action == ActionState::Guard {
        return HitOutcome {
            cue: Some(cue),
            reaction: None,
            launch: false,
            air_hit: false,
        };
    }

    HitOutcome {
        cue: Some(cue),
        reaction: Some(ActionState::reaction_for(kind)),
        launch: false,
        air_hit: false,
    }
}

/// Apply one contact report to the bout.
///
/// Reads both fighters through the bout handle, resolves, then mutates the
/// defender and drives the defender's rig. Outside the Fighting phase the
/// request is an invalid transition and is ignored silently.
pub fn process_contact(
    bout: &mut BoutState,
    timers: &mut TimerQueue,
    rigs: &mut BTreeMap<FighterId, FighterRig>,
    report: ContactReport,
) {
    if bout.phase != BoutPhase::Fighting {
        debug!(?report, "hit-reaction ignored outside Fighting phase");
        return;
    }

    let outcome = {
        let attacker = bout.fighter(report.attacker);
        let defender = bout.fighter(report.defender);
        resolve_contact(attacker, defender, report.zone)
    };

    if !outcome.connected() {
        trace!(?report, "contact resolved to nothing");
        return;
    }

    let tick = bout.tick;
    let Some(rig) = rigs.get_mut(&report.defender) else {
        return;
    };

    if let Some(cue) = outcome.cue {
        rig.audio.play_one_shot(cue);
        bout.push_event(CombatEvent::hit_landed(
            tick,
            report.defender,
            report.attacker,
            report.zone,
            cue,
        ));
    }

    if outcome.air_hit {
        rig.physics.reset_velocity();
        rig.physics.apply_impulse(FixedVec3::UP.scale(AIR_HIT_IMPULSE));
        rig.animation.fire_trigger(AnimTrigger::AirHit);
        bout.push_event(CombatEvent::air_hit(tick, report.defender));
    }

    if outcome.launch {
        rig.physics.set_gravity_enabled(true);
        rig.physics.apply_impulse(FixedVec3::UP.scale(LAUNCH_IMPULSE));
        rig.animation.fire_trigger(AnimTrigger::UpperHit);
        rig.animation.set_flag(AnimFlag::Floating, true);
        timers.schedule(
            tick,
            HURTBOX_REORIENT_TICKS,
            report.defender,
            TimerEffect::ReorientHurtbox,
        );
        bout.push_event(CombatEvent::launched(tick, report.defender));
    }

    if let Some(reaction) = outcome.reaction {
        let defender = bout.fighter_mut(report.defender);
        defender.action = reaction;
        // A reaction preempts any attack window the defender had open.
        defender.attack_until = None;
        if outcome.launch {
            defender.juggle = JuggleState::AirborneJuggled;
        }
    }
}

/// Contact-zone activation policy.
///
/// Purely derived, recomputed every tick: hands are hot exactly during a hand
/// attack window, feet during a foot attack window, and nothing is hot during
/// a dash transition or outside the Fighting phase.
pub fn zones_enabled(
    action: ActionState,
    in_dash: bool,
    phase: BoutPhase,
) -> [(ContactZone, bool); 4] {
    let kind = if phase == BoutPhase::Fighting && !in_dash {
        action.attack_kind()
    } else {
        None
    };

    let hands = kind == Some(AttackKind::Hand);
    let feet = kind == Some(AttackKind::Foot);

    [
        (ContactZone::HandRight, hands),
        (ContactZone::HandLeft, hands),
        (ContactZone::FootRight, feet),
        (ContactZone::FootLeft, feet),
    ]
}

/// Hurtbox orientation policy: downed and juggled fighters lie flat.
pub fn hurtbox_for(action: ActionState, juggle: JuggleState) -> HurtboxOrientation {
    if action == ActionState::Prone || juggle == JuggleState::AirborneJuggled {
        HurtboxOrientation::Flat
    } else {
        HurtboxOrientation::Upright
    }
}
