//! Combat State Definitions
//!
//! All state types for a bout. Per-fighter state lives inside [`BoutState`]
//! and is reached through [`FighterId`] handles - the opponent's hit
//! resolution reads it through the bout, never through globals.
//!
//! Uses BTreeMap for deterministic iteration order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::hash::{compute_state_hash, StateHash, StateHasher};
use crate::game::events::CombatEvent;
use crate::game::input::Button;

// =============================================================================
// FIGHTER ID
// =============================================================================

/// Handle for one of the two fighters in a bout.
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FighterId(pub u8);

impl FighterId {
    /// First fighter.
    pub const P1: FighterId = FighterId(0);

    /// Second fighter.
    pub const P2: FighterId = FighterId(1);

    /// Both fighters, in processing order.
    pub const BOTH: [FighterId; 2] = [FighterId::P1, FighterId::P2];

    /// The other fighter in the bout.
    #[inline]
    pub fn opponent(self) -> FighterId {
        if self == FighterId::P1 {
            FighterId::P2
        } else {
            FighterId::P1
        }
    }
}

// =============================================================================
// ACTION STATE
// =============================================================================

/// Which attack family an attack state belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AttackKind {
    /// Jabs - contact through the hand zones
    Hand = 0,
    /// Kicks - contact through the foot zones
    Foot = 1,
}

/// The fighter's discrete combat/movement mode.
///
/// Exactly one value per fighter at any instant. Mutated only by the owning
/// fighter's state machine and by hit-reaction dispatch from the opponent's
/// attacks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ActionState {
    /// Neutral stance
    #[default]
    Idle = 0,
    /// Walking toward the opponent
    StepForward = 1,
    /// Walking away (also lowers the hit-possible flag)
    StepBack = 2,
    /// Crouching
    Crouch = 3,
    /// Jumping
    Jump = 4,
    /// Knocked down
    Prone = 5,
    /// Guarding
    Guard = 6,
    /// Hand attack window active
    HandAttack = 7,
    /// Foot attack window active
    FootAttack = 8,
    /// Reacting to a hand hit
    HandReaction = 9,
    /// Reacting to a foot hit
    FootReaction = 10,
    /// Reacting to an uppercut launch
    UppercutReaction = 11,
}

impl ActionState {
    /// The attack family this state carries, if it is an attack.
    #[inline]
    pub fn attack_kind(self) -> Option<AttackKind> {
        match self {
            ActionState::HandAttack => Some(AttackKind::Hand),
            ActionState::FootAttack => Some(AttackKind::Foot),
            _ => None,
        }
    }

    /// Whether an attack window owns this state.
    #[inline]
    pub fn is_attack(self) -> bool {
        self.attack_kind().is_some()
    }

    /// Whether this is a hit-reaction state.
    #[inline]
    pub fn is_reaction(self) -> bool {
        matches!(
            self,
            ActionState::HandReaction | ActionState::FootReaction | ActionState::UppercutReaction
        )
    }

    /// Attack state for a family.
    #[inline]
    pub fn attack_for(kind: AttackKind) -> ActionState {
        match kind {
            AttackKind::Hand => ActionState::HandAttack,
            AttackKind::Foot => ActionState::FootAttack,
        }
    }

    /// Reaction state for the attack family that landed.
    #[inline]
    pub fn reaction_for(kind: AttackKind) -> ActionState {
        match kind {
            AttackKind::Hand => ActionState::HandReaction,
            AttackKind::Foot => ActionState::FootReaction,
        }
    }
}

// =============================================================================
// JUGGLE STATE
// =============================================================================

/// Airborne/combo sub-state, orthogonal to [`ActionState`].
///
/// `Rising` marks the attacker's uppercut designation; `AirborneJuggled` marks
/// the defender riding a launch. Ground contact resets to `Grounded`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum JuggleState {
    /// On the ground, no combo state
    #[default]
    Grounded = 0,
    /// Performing a launching (uppercut-class) attack
    Rising = 1,
    /// Airborne after being launched; follow-up hits juggle
    AirborneJuggled = 2,
    /// Special attack active
    SpecialActive = 3,
}

impl JuggleState {
    /// Whether hits from this fighter qualify to launch the defender.
    #[inline]
    pub fn launches(self) -> bool {
        self == JuggleState::Rising
    }
}

// =============================================================================
// FIGHTER STATE
// =============================================================================

/// State of a single fighter.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FighterState {
    /// Which fighter this is
    pub id: FighterId,

    /// Current discrete action
    pub action: ActionState,

    /// Current juggle sub-state
    pub juggle: JuggleState,

    /// Tick at which the active attack window expires (None = no window).
    /// While set, `action` is forced and further attack presses are dropped.
    pub attack_until: Option<u32>,

    /// Dash-eligibility primes, one bit per movement button.
    /// Set on release, cleared together by the grace timer.
    dash_primes: u8,
}

impl FighterState {
    /// Create a fighter in neutral stance.
    pub fn new(id: FighterId) -> Self {
        Self {
            id,
            action: ActionState::Idle,
            juggle: JuggleState::Grounded,
            attack_until: None,
            dash_primes: 0,
        }
    }

    /// Whether an attack window is forcing `action` at `now`.
    #[inline]
    pub fn attack_active(&self, now: u32) -> bool {
        self.attack_until.is_some_and(|until| now < until)
    }

    /// Mark a movement button dash-eligible.
    pub fn prime(&mut self, button: Button) {
        debug_assert!(button.is_movement());
        self.dash_primes |= 1 << (button as u8);
    }

    /// Whether a movement button was released within the grace window.
    #[inline]
    pub fn is_primed(&self, button: Button) -> bool {
        self.dash_primes & (1 << (button as u8)) != 0
    }

    /// Drop all dash primes (the grace timer fired).
    pub fn clear_primes(&mut self) {
        self.dash_primes = 0;
    }

    /// Force the fighter back to neutral (KO, replay stop).
    /// Juggle state is owned by ground contact and survives the reset.
    pub fn reset_to_idle(&mut self) {
        self.action = ActionState::Idle;
        self.attack_until = None;
        self.dash_primes = 0;
    }

    /// Hash this fighter's state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.id.0);
        hasher.update_u8(self.action as u8);
        hasher.update_u8(self.juggle as u8);
        hasher.update_u32(self.attack_until.unwrap_or(u32::MAX));
        hasher.update_u8(self.dash_primes);
    }
}

// =============================================================================
// BOUT PHASE & STATE
// =============================================================================

/// Current phase of the bout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoutPhase {
    /// Pre-fight; fighters are pinned to neutral
    #[default]
    Waiting,
    /// Active combat
    Fighting,
    /// A fighter is down; contact zones are forced cold
    KnockedOut,
}

/// Complete state of one bout.
///
/// Uses BTreeMap for deterministic iteration order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BoutState {
    /// Current tick
    pub tick: u32,

    /// Current phase
    pub phase: BoutPhase,

    /// Both fighters (BTreeMap for deterministic iteration)
    pub fighters: BTreeMap<FighterId, FighterState>,

    /// Events generated this tick (cleared each tick)
    #[serde(skip)]
    pub pending_events: Vec<CombatEvent>,
}

impl BoutState {
    /// Create a fresh bout with both fighters in neutral.
    pub fn new() -> Self {
        let mut fighters = BTreeMap::new();
        for id in FighterId::BOTH {
            fighters.insert(id, FighterState::new(id));
        }
        Self {
            tick: 0,
            phase: BoutPhase::Waiting,
            fighters,
            pending_events: Vec::new(),
        }
    }

    /// Shared read access to a fighter.
    pub fn fighter(&self, id: FighterId) -> &FighterState {
        self.fighters.get(&id).expect("bout always holds both fighters")
    }

    /// Mutable access to a fighter.
    pub fn fighter_mut(&mut self, id: FighterId) -> &mut FighterState {
        self.fighters
            .get_mut(&id)
            .expect("bout always holds both fighters")
    }

    /// Queue an event for this tick.
    pub fn push_event(&mut self, event: CombatEvent) {
        self.pending_events.push(event);
    }

    /// Drain the events generated this tick.
    pub fn take_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Hash the bout for replay verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, |hasher| {
            hasher.update_u8(match self.phase {
                BoutPhase::Waiting => 0,
                BoutPhase::Fighting => 1,
                BoutPhase::KnockedOut => 2,
            });
            for fighter in self.fighters.values() {
                fighter.hash_into(hasher);
            }
        })
    }
}

impl Default for BoutState {
    fn default() -> Self {
        Self::new()
    }
}
