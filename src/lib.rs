//! # Iron Ring Combat Core
//!
//! Deterministic input-recording/replay and combat-state-machine layer for
//! the Iron Ring fighting game.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    IRON RING COMBAT CORE                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Deterministic primitives                 │
//! │  ├── fixed.rs     - Q16.16 fixed-point arithmetic            │
//! │  ├── vec3.rs      - 3D impulse vectors with fixed-point      │
//! │  └── hash.rs      - State hashing for replay verification    │
//! │                                                              │
//! │  collab/          - External collaborator seams              │
//! │  └── mod.rs       - Animation/physics/collider/audio traits  │
//! │                                                              │
//! │  game/            - Combat logic (deterministic)             │
//! │  ├── input.rs     - Edge capture and normalization           │
//! │  ├── timeline.rs  - Input recording and replay               │
//! │  ├── timer.rs     - Cancellable one-shot effects             │
//! │  ├── state.rs     - Fighter and bout state                   │
//! │  ├── machine.rs   - Fighter state machine                    │
//! │  ├── hit.rs       - Hit resolution and contact-zone policy   │
//! │  ├── events.rs    - Combat event stream                      │
//! │  └── tick.rs      - Per-tick driver and ordering guarantee   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **100% deterministic**:
//! - No floating-point arithmetic in combat logic
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies; all time is integer ticks
//!
//! Replaying a recorded timeline with identical tick timing produces an
//! **identical sequence of action states** on any platform - that is the
//! contract the replay feature is built on.
//!
//! Rendering, animation clips, physics integration, and audio assets live on
//! the far side of the `collab` traits; the core drives and reads them but
//! owns none of their data.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod collab;
pub mod core;
pub mod game;

// Re-export commonly used types
pub use crate::collab::{AnimFlag, AnimTrigger, AudioCue, ContactZone, FighterRig, Pose, RigError};
pub use crate::core::fixed::{Fixed, FIXED_HALF, FIXED_ONE, FIXED_SCALE};
pub use crate::core::vec3::FixedVec3;
pub use crate::game::state::{ActionState, BoutState, FighterId, FighterState, JuggleState};
pub use crate::game::tick::{Bout, BoutConfig, TickInputs, TickResult};
pub use crate::game::timeline::{InputTimeline, ReplayError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;

/// Default input retention window: 5 minutes of gameplay at 60 Hz.
pub const RETENTION_WINDOW_TICKS: u32 = 5 * 60 * TICK_RATE;

/// Attack window: 0.2 seconds. Once a jab or kick starts, the action state is
/// forced for exactly this long, then reverts to idle.
pub const ATTACK_WINDOW_TICKS: u32 = 12;

/// Dash grace window: 0.2 seconds between release and re-press.
pub const DASH_GRACE_TICKS: u32 = 12;

/// Delay before a launched fighter's hurtbox is rotated flat: 0.4 seconds.
pub const HURTBOX_REORIENT_TICKS: u32 = 24;
