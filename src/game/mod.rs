//! Combat Logic Module
//!
//! All simulation code. 100% deterministic.
//!
//! ## Module Structure
//!
//! - `input`: input sources, events, per-tick edge capture
//! - `timeline`: bounded input recording and deterministic replay
//! - `timer`: cancellable one-shot effects, drained once per tick
//! - `state`: fighter and bout state
//! - `machine`: the fighter state machine (transition table)
//! - `hit`: contact-zone policy and hit-reaction dispatch
//! - `events`: combat events for logs and replay verification
//! - `tick`: the per-tick driver and its ordering guarantee

pub mod events;
pub mod hit;
pub mod input;
pub mod machine;
pub mod state;
pub mod tick;
pub mod timeline;
pub mod timer;

// Re-export key types
pub use events::CombatEvent;
pub use hit::{ContactReport, HitOutcome, HitZone};
pub use input::{Axis, Button, FrameSample, InputCapture, InputEvent, InputEventKind};
pub use state::{ActionState, AttackKind, BoutPhase, BoutState, FighterId, FighterState, JuggleState};
pub use tick::{Bout, BoutConfig, TickInputs, TickResult};
pub use timeline::{InputTimeline, ReplayBatch, ReplayError};
pub use timer::{TimerEffect, TimerQueue};
