//! Combat Events
//!
//! Events generated during simulation, for logs and replay verification.
//! Two runs of the same timeline must produce identical event streams.

use serde::{Deserialize, Serialize};

use crate::collab::AudioCue;
use crate::game::hit::HitZone;
use crate::game::input::Button;
use crate::game::state::{ActionState, AttackKind, FighterId};

/// Priority for event ordering inside one tick.
///
/// Lower value = earlier processing phase. Mirrors the tick ordering
/// guarantee: input-driven changes, then hits, then timer effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Input-driven action changes
    ActionChange = 0,
    /// Hit resolution results
    HitReaction = 1,
    /// Launches and air hits
    Launch = 2,
    /// Timer-expiry effects
    Timer = 3,
    /// Replay lifecycle
    Replay = 4,
    /// Lowest priority
    Other = 255,
}

/// Combat event data.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum CombatEventData {
    /// The fighter's action state changed.
    ActionChanged {
        /// Previous state
        from: ActionState,
        /// New state
        to: ActionState,
    },

    /// An attack window opened.
    AttackStarted {
        /// Hand or foot family
        kind: AttackKind,
        /// Button that started it
        button: Button,
    },

    /// A contact-zone overlap resolved into a hit.
    HitLanded {
        /// Who threw the attack
        attacker: FighterId,
        /// Where it landed on the defender
        zone: HitZone,
        /// Cue class played
        cue: AudioCue,
    },

    /// The defender was launched into a juggle.
    Launched,

    /// The defender was struck while already airborne.
    AirHit,

    /// The fighter touched the ground, resetting the juggle state.
    GroundContact,

    /// Replay started from a snapshot.
    ReplayStarted {
        /// Events in the snapshot
        event_count: usize,
    },

    /// Replay drained its queue and stopped on its own.
    ReplayFinished,

    /// Replay was toggled off before the queue drained.
    ReplayAborted,
}

/// A combat event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CombatEvent {
    /// Tick when the event occurred
    pub tick: u32,

    /// Processing priority
    pub priority: EventPriority,

    /// Fighter the event belongs to (defender for hits)
    pub fighter: FighterId,

    /// Event data
    pub data: CombatEventData,
}

impl CombatEvent {
    /// Create a new event.
    pub fn new(tick: u32, priority: EventPriority, fighter: FighterId, data: CombatEventData) -> Self {
        Self {
            tick,
            priority,
            fighter,
            data,
        }
    }

    /// Create an action-changed event.
    pub fn action_changed(tick: u32, fighter: FighterId, from: ActionState, to: ActionState) -> Self {
        Self::new(
            tick,
            EventPriority::ActionChange,
            fighter,
            CombatEventData::ActionChanged { from, to },
        )
    }

    /// Create an attack-started event.
    pub fn attack_started(tick: u32, fighter: FighterId, kind: AttackKind, button: Button) -> Self {
        Self::new(
            tick,
            EventPriority::ActionChange,
            fighter,
            CombatEventData::AttackStarted { kind, button },
        )
    }

    /// Create an action-changed event caused by a timer expiry.
    pub fn timer_revert(tick: u32, fighter: FighterId, from: ActionState, to: ActionState) -> Self {
        Self::new(
            tick,
            EventPriority::Timer,
            fighter,
            CombatEventData::ActionChanged { from, to },
        )
    }

    /// Create a hit-landed event (fighter = defender).
    pub fn hit_landed(
        tick: u32,
        defender: FighterId,
        attacker: FighterId,
        zone: HitZone,
        cue: AudioCue,
    ) -> Self {
        Self::new(
            tick,
            EventPriority::HitReaction,
            defender,
            CombatEventData::HitLanded { attacker, zone, cue },
        )
    }

    /// Create a launched event.
    pub fn launched(tick: u32, defender: FighterId) -> Self {
        Self::new(tick, EventPriority::Launch, defender, CombatEventData::Launched)
    }

    /// Create an air-hit event.
    pub fn air_hit(tick: u32, defender: FighterId) -> Self {
        Self::new(tick, EventPriority::Launch, defender, CombatEventData::AirHit)
    }

    /// Create a ground-contact event.
    pub fn ground_contact(tick: u32, fighter: FighterId) -> Self {
        Self::new(tick, EventPriority::Other, fighter, CombatEventData::GroundContact)
    }

    /// Create a replay-started event.
    pub fn replay_started(tick: u32, fighter: FighterId, event_count: usize) -> Self {
        Self::new(
            tick,
            EventPriority::Replay,
            fighter,
            CombatEventData::ReplayStarted { event_count },
        )
    }

    /// Create a replay-finished event.
    pub fn replay_finished(tick: u32, fighter: FighterId) -> Self {
        Self::new(tick, EventPriority::Replay, fighter, CombatEventData::ReplayFinished)
    }

    /// Create a replay-aborted event.
    pub fn replay_aborted(tick: u32, fighter: FighterId) -> Self {
        Self::new(tick, EventPriority::Replay, fighter, CombatEventData::ReplayAborted)
    }
}

impl PartialEq for CombatEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick && self.priority == other.priority && self.fighter == other.fighter
    }
}

impl Eq for CombatEvent {}

impl PartialOrd for CombatEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CombatEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: tick, then priority, then fighter
        self.tick
            .cmp(&other.tick)
            .then(self.priority.cmp(&other.priority))
            .then(self.fighter.cmp(&other.fighter))
    }
}
