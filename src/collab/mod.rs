//! External Collaborator Seams
//!
//! The combat core drives an animation rig, a physics body, contact-zone
//! colliders, and an audio player, but owns none of them. Each capability is a
//! narrow trait; the engine adapter implements them against whatever runtime
//! hosts the fight.
//!
//! Every flag, pose, and cue is an enum - never a string key - so a typo is a
//! compile error, not a silently dead animation parameter.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::vec3::FixedVec3;

// =============================================================================
// COLLABORATOR VOCABULARY
// =============================================================================

/// Boolean animation parameters the core may raise or lower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AnimFlag {
    /// Forward walk cycle
    WalkFwd = 0,
    /// Backward walk cycle
    WalkBwd = 1,
    /// Crouch
    Sit = 2,
    /// Jump
    Jump = 3,
    /// Right jab
    JabRight = 4,
    /// Left jab
    JabLeft = 5,
    /// Right kick
    KickRight = 6,
    /// Left kick
    KickLeft = 7,
    /// Forward dash (double-tap forward)
    Dash = 8,
    /// Back step dash (double-tap back)
    BackStep = 9,
    /// Side dodge, left lane (double-tap jump)
    SideDodgeLeft = 10,
    /// Side dodge, right lane (double-tap crouch)
    SideDodgeRight = 11,
    /// Airborne juggle loop
    Floating = 12,
    /// Whether incoming hits may connect (lowered while back-stepping)
    HitPossible = 13,
}

/// One-shot animation triggers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AnimTrigger {
    /// Launched by an uppercut
    UpperHit = 0,
    /// Struck while already airborne
    AirHit = 1,
}

/// Animation states the core reads back from the rig.
///
/// Several action states are animation-owned: the machine folds the current
/// pose into `ActionState` each tick rather than guessing when a clip ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Pose {
    /// Neutral stance
    Idle = 0,
    /// Crouching
    Sit = 1,
    /// Walking forward
    WalkFwd = 2,
    /// Walking backward
    WalkBwd = 3,
    /// Knocked down / lying
    Lay = 4,
    /// Guard stance
    Guard = 5,
    /// Dash transition (contact zones stay cold here)
    Dash = 6,
}

/// Orientation of the fighter's hurtbox.
///
/// Juggled and downed fighters present a flat hurtbox so follow-up hits
/// connect the way the combo system expects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HurtboxOrientation {
    /// Standing hurtbox
    #[default]
    Upright = 0,
    /// Rotated flat (airborne or downed)
    Flat = 1,
}

/// A hit-detection region on the attacker's body.
///
/// Enabled/disabled is derived from `ActionState` every tick - never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ContactZone {
    /// Right hand
    HandRight = 0,
    /// Left hand
    HandLeft = 1,
    /// Right foot
    FootRight = 2,
    /// Left foot
    FootLeft = 3,
}

impl ContactZone {
    /// All zones, in activation-policy order.
    pub const ALL: [ContactZone; 4] = [
        ContactZone::HandRight,
        ContactZone::HandLeft,
        ContactZone::FootRight,
        ContactZone::FootLeft,
    ];

    /// Whether this zone belongs to the hands.
    #[inline]
    pub fn is_hand(self) -> bool {
        matches!(self, ContactZone::HandRight | ContactZone::HandLeft)
    }
}

/// Audio cue classes, grouped by attack kind and hit zone.
///
/// The discriminants are the clip slots the sound bank reserves for them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AudioCue {
    /// Hand attack to the head
    HandHead = 1,
    /// Hand attack to the torso
    HandMid = 2,
    /// Foot attack to the head
    FootHead = 4,
    /// Foot attack to the torso
    FootMid = 5,
}

impl AudioCue {
    /// Clip slot in the fighter's sound bank.
    #[inline]
    pub fn clip_index(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for AudioCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} (clip {})", self, self.clip_index())
    }
}

// =============================================================================
// CAPABILITY TRAITS
// =============================================================================

/// Animation rig: flag/trigger writes plus current-state queries.
pub trait AnimationDriver {
    /// Raise or lower a boolean animation parameter.
    fn set_flag(&mut self, flag: AnimFlag, value: bool);

    /// Fire a one-shot trigger.
    fn fire_trigger(&mut self, trigger: AnimTrigger);

    /// Whether the rig is currently playing the given state.
    fn is_current(&self, pose: Pose) -> bool;
}

/// Physics body: the core only pushes impulses and toggles gravity.
pub trait PhysicsBody {
    /// Apply an instantaneous impulse.
    fn apply_impulse(&mut self, impulse: FixedVec3);

    /// Enable or disable gravity on the body.
    fn set_gravity_enabled(&mut self, enabled: bool);

    /// Zero the body's velocity (used before air-hit impulses).
    fn reset_velocity(&mut self);
}

/// Contact-zone colliders plus the fighter's own hurtbox.
pub trait ContactColliders {
    /// Enable or disable one contact zone.
    fn set_zone_enabled(&mut self, zone: ContactZone, enabled: bool);

    /// Re-orient the hurtbox (upright vs. flat).
    fn set_hurtbox(&mut self, orientation: HurtboxOrientation);
}

/// One-shot audio playback.
pub trait AudioPlayer {
    /// Play the cue's clip once.
    fn play_one_shot(&mut self, cue: AudioCue);
}

// =============================================================================
// FIGHTER RIG
// =============================================================================

/// Rig construction failures.
///
/// A missing collaborator is fatal at initialization - the core never
/// null-propagates a half-wired fighter into the tick loop.
#[derive(Debug, Error)]
pub enum RigError {
    /// A required collaborator handle was never provided.
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),
}

/// The bundle of collaborator handles for one fighter.
pub struct FighterRig {
    /// Animation rig handle
    pub animation: Box<dyn AnimationDriver>,
    /// Physics body handle
    pub physics: Box<dyn PhysicsBody>,
    /// Collider handle
    pub colliders: Box<dyn ContactColliders>,
    /// Audio handle
    pub audio: Box<dyn AudioPlayer>,
}

impl FighterRig {
    /// Start building a rig.
    pub fn builder() -> FighterRigBuilder {
        FighterRigBuilder::default()
    }
}

/// Builder for [`FighterRig`]; `build` fails fast on any absent handle.
#[derive(Default)]
pub struct FighterRigBuilder {
    animation: Option<Box<dyn AnimationDriver>>,
    physics: Option<Box<dyn PhysicsBody>>,
    colliders: Option<Box<dyn ContactColliders>>,
    audio: Option<Box<dyn AudioPlayer>>,
}

impl FighterRigBuilder {
    /// Provide the animation driver.
    pub fn animation(mut self, driver: impl AnimationDriver + 'static) -> Self {
        self.animation = Some(Box::new(driver));
        self
    }

    /// Provide the physics body.
    pub fn physics(mut self, body: impl PhysicsBody + 'static) -> Self {
        self.physics = Some(Box::new(body));
        self
    }

    /// Provide the contact colliders.
    pub fn colliders(mut self, colliders: impl ContactColliders + 'static) -> Self {
        self.colliders = Some(Box::new(colliders));
        self
    }

    /// Provide the audio player.
    pub fn audio(mut self, audio: impl AudioPlayer + 'static) -> Self {
        self.audio = Some(Box::new(audio));
        self
    }

    /// Validate that every collaborator is present.
    pub fn build(self) -> Result<FighterRig, RigError> {
        Ok(FighterRig {
            animation: self
                .animation
                .ok_or(RigError::MissingCollaborator("animation"))?,
            physics: self.physics.ok_or(RigError::MissingCollaborator("physics"))?,
            colliders: self
                .colliders
                .ok_or(RigError::MissingCollaborator("colliders"))?,
            audio: self.audio.ok_or(RigError::MissingCollaborator("audio"))?,
        })
    }
}

// =============================================================================
// TEST DOUBLES
// =============================================================================
