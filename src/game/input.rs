//! Input Capture and Normalization
//!
//! Turns raw per-tick device samples into the discrete event stream the
//! timeline records: one event per press/release edge, never one per frame
//! while a button is held, and axis samples only past the dead zone.

use serde::{Deserialize, Serialize};

use crate::collab::AnimFlag;
use crate::core::fixed::{beyond_deadzone, Fixed};
use crate::game::state::AttackKind;

// =============================================================================
// INPUT SOURCES
// =============================================================================

/// Logical action buttons.
///
/// These are action tags, not key codes - the adapter layer owns the physical
/// binding (keyboard, pad, whatever).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Button {
    /// Walk toward the opponent
    Forward = 0,
    /// Walk away from the opponent
    Back = 1,
    /// Crouch
    Crouch = 2,
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
}

impl Button {
    /// All buttons, in capture order.
    pub const ALL: [Button; 8] = [
        Button::Forward,
        Button::Back,
        Button::Crouch,
        Button::Jump,
        Button::JabRight,
        Button::JabLeft,
        Button::KickRight,
        Button::KickLeft,
    ];

    /// Bit for this button in a [`FrameSample`] mask.
    #[inline]
    const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// Which attack family this button starts, if any.
    #[inline]
    pub fn attack_kind(self) -> Option<AttackKind> {
        match self {
            Button::JabRight | Button::JabLeft => Some(AttackKind::Hand),
            Button::KickRight | Button::KickLeft => Some(AttackKind::Foot),
            _ => None,
        }
    }

    /// Whether this is one of the four movement buttons.
    #[inline]
    pub fn is_movement(self) -> bool {
        matches!(
            self,
            Button::Forward | Button::Back | Button::Crouch | Button::Jump
        )
    }

    /// The animation flag this button drives directly.
    #[inline]
    pub fn anim_flag(self) -> AnimFlag {
        match self {
            Button::Forward => AnimFlag::WalkFwd,
            Button::Back => AnimFlag::WalkBwd,
            Button::Crouch => AnimFlag::Sit,
            Button::Jump => AnimFlag::Jump,
            Button::JabRight => AnimFlag::JabRight,
            Button::JabLeft => AnimFlag::JabLeft,
            Button::KickRight => AnimFlag::KickRight,
            Button::KickLeft => AnimFlag::KickLeft,
        }
    }
}

/// Continuous input axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Axis {
    /// Left/right stick deflection
    Horizontal = 0,
    /// Up/down stick deflection
    Vertical = 1,
}

impl Axis {
    /// Both axes, in capture order.
    pub const ALL: [Axis; 2] = [Axis::Horizontal, Axis::Vertical];
}

// =============================================================================
// INPUT EVENTS
// =============================================================================

/// What happened on an input source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEventKind {
    /// Button went down this tick.
    Press(Button),
    /// Button came up this tick.
    Release(Button),
    /// Axis deflection past the dead zone (value in [-1, +1] fixed-point).
    AxisSample(Axis, Fixed),
}

/// A single timestamped input event. Immutable once recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEvent {
    /// Tick since recording started.
    pub tick: u32,
    /// The transition or sample.
    pub kind: InputEventKind,
}

impl InputEvent {
    /// Create a press event.
    pub const fn press(tick: u32, button: Button) -> Self {
        Self {
            tick,
            kind: InputEventKind::Press(button),
        }
    }

    /// Create a release event.
    pub const fn release(tick: u32, button: Button) -> Self {
        Self {
            tick,
            kind: InputEventKind::Release(button),
        }
    }

    /// Create an axis sample event.
    pub const fn axis(tick: u32, axis: Axis, value: Fixed) -> Self {
        Self {
            tick,
            kind: InputEventKind::AxisSample(axis, value),
        }
    }
}

// =============================================================================
// FRAME SAMPLES & EDGE CAPTURE
// =============================================================================

/// Raw device state for a single tick.
///
/// Packed the same way a wire format would pack action flags: one bit per
/// button, plus the two axis deflections.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSample {
    /// Held-button mask (bit = `Button as u8`).
    buttons: u8,
    /// Axis deflections, indexed by `Axis as u8`.
    axes: [Fixed; 2],
}

impl FrameSample {
    /// An idle frame: nothing held, sticks centered.
    pub const fn new() -> Self {
        Self {
            buttons: 0,
            axes: [0; 2],
        }
    }

    /// Is the button held in this frame?
    #[inline]
    pub fn is_held(&self, button: Button) -> bool {
        self.buttons & button.bit() != 0
    }

    /// Set or clear a held button.
    #[inline]
    pub fn set_held(&mut self, button: Button, held: bool) {
        if held {
            self.buttons |= button.bit();
        } else {
            self.buttons &= !button.bit();
        }
    }

    /// Builder-style held button, for tests and demos.
    pub fn with_held(mut self, button: Button) -> Self {
        self.set_held(button, true);
        self
    }

    /// Axis deflection.
    #[inline]
    pub fn axis(&self, axis: Axis) -> Fixed {
        self.axes[axis as usize]
    }

    /// Set an axis deflection.
    #[inline]
    pub fn set_axis(&mut self, axis: Axis, value: Fixed) {
        self.axes[axis as usize] = value;
    }

    /// Check if this is an idle frame (no input).
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.buttons == 0 && self.axes == [0; 2]
    }
}

/// Diffs consecutive device frames into input events.
///
/// Buttons produce exactly one event per physical transition; axis samples
/// are emitted every frame they clear the dead zone. This is the recording
/// filter the timeline relies on to stay edge-sparse.
#[derive(Clone, Debug, Default)]
pub struct InputCapture {
    last: FrameSample,
}

impl InputCapture {
    /// Create a capture with nothing held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff `frame` against the previous one, producing this tick's events.
    ///
    /// Buttons are scanned in `Button::ALL` order, then axes, so the event
    /// order inside a tick is deterministic.
    pub fn capture(&mut self, tick: u32, frame: FrameSample) -> Vec<InputEvent> {
        let mut events = Vec::new();

        for button in Button::ALL {
            let was = self.last.is_held(button);
            let now = frame.is_held(button);
            if now && !was {
                events.push(InputEvent::press(tick, button));
            } else if !now && was {
                events.push(InputEvent::release(tick, button));
            }
        }

        for axis in Axis::ALL {
            let value = frame.axis(axis);
            if beyond_deadzone(value) {
                events.push(InputEvent::axis(tick, axis, value));
            }
        }

        self.last = frame;
        events
    }

    /// Forget held state, e.g. when replay takes over the fighter.
    pub fn reset(&mut self) {
        self.last = FrameSample::new();
    }
}
