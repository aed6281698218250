//! Input Timeline
//!
//! A bounded, append-only record of input events with deterministic replay.
//! Recording evicts from the front (retention window) and appends at the
//! back; replay drains a snapshot from the front. Both directions are O(1)
//! amortized per event, and memory is bounded by retention window x max
//! event rate.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::hash::{StateHash, StateHasher};
use crate::game::input::{InputEvent, InputEventKind};
use crate::RETENTION_WINDOW_TICKS;

/// Replay failures.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Replay was requested with zero recorded events.
    /// Recovered locally: the controller aborts back to recording.
    #[error("no recorded input available for replay")]
    EmptyBuffer,
}

/// One `step_replay` result: the events that just came due, and whether the
/// snapshot is now drained.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplayBatch {
    /// Events whose recorded tick has been reached, in FIFO order.
    pub events: Vec<InputEvent>,
    /// True once the snapshot is empty; the caller should return to recording.
    pub complete: bool,
}

/// An in-flight replay: a snapshot of the buffer plus its start tick.
///
/// The snapshot is a copy, so recording that continues after `start_replay`
/// can never mutate what is being replayed.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct ReplaySession {
    queue: VecDeque<InputEvent>,
    started_tick: u32,
}

/// Ordered, retention-bounded sequence of input events.
///
/// Insertion order is time order: `record` is append-only and the recording
/// tick counter never runs backwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputTimeline {
    /// Maximum age of retained events, in ticks.
    retention_ticks: u32,
    /// The recorded events, oldest first.
    events: VecDeque<InputEvent>,
    /// Active replay, if any.
    #[serde(skip)]
    replay: Option<ReplaySession>,
}

impl InputTimeline {
    /// Create a timeline with the default retention window (5 minutes).
    pub fn new() -> Self {
        Self::with_retention(RETENTION_WINDOW_TICKS)
    }

    /// Create a timeline with a custom retention window in ticks.
    pub fn with_retention(retention_ticks: u32) -> Self {
        Self {
            retention_ticks,
            events: VecDeque::new(),
            replay: None,
        }
    }

    /// Retention window in ticks.
    pub fn retention_ticks(&self) -> u32 {
        self.retention_ticks
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the record buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether a replay session is active.
    pub fn is_replaying(&self) -> bool {
        self.replay.is_some()
    }

    /// Iterate the recorded events, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &InputEvent> {
        self.events.iter()
    }

    /// Append an event.
    ///
    /// The caller records with a monotonic tick counter, so appends arrive in
    /// time order; that invariant is what makes front-eviction and FIFO
    /// replay correct.
    pub fn record(&mut self, event: InputEvent) {
        debug_assert!(
            self.events.back().is_none_or(|last| last.tick <= event.tick),
            "input events must be recorded in tick order"
        );
        self.events.push_back(event);
    }

    /// Evict every leading event older than the retention window.
    ///
    /// Runs every recording tick, before new appends, so the buffer never
    /// exceeds the window by more than one tick's worth of events.
    pub fn prune(&mut self, now: u32) {
        while let Some(front) = self.events.front() {
            if now.saturating_sub(front.tick) > self.retention_ticks {
                self.events.pop_front();
            } else {
                break;
            }
        }
    }

    /// Snapshot the buffer and begin replaying it.
    ///
    /// Fails with [`ReplayError::EmptyBuffer`] when nothing was recorded;
    /// the buffer and any fighter state are left untouched in that case.
    pub fn start_replay(&mut self, now: u32) -> Result<usize, ReplayError> {
        if self.events.is_empty() {
            return Err(ReplayError::EmptyBuffer);
        }

        let queue = self.events.clone();
        let count = queue.len();
        self.replay = Some(ReplaySession {
            queue,
            started_tick: now,
        });
        debug!(events = count, started_tick = now, "replay snapshot taken");
        Ok(count)
    }

    /// Pop every snapshot event due at `now`, in recorded (FIFO) order.
    ///
    /// An event is due once its recorded tick is at or before the elapsed
    /// replay time. When the snapshot drains, the session ends on its own
    /// and the batch reports `complete`.
    pub fn step_replay(&mut self, now: u32) -> ReplayBatch {
        let Some(session) = self.replay.as_mut() else {
            return ReplayBatch {
                events: Vec::new(),
                complete: true,
            };
        };

        let elapsed = now.saturating_sub(session.started_tick);
        let mut events = Vec::new();
        while let Some(front) = session.queue.front() {
            if front.tick <= elapsed {
                // Front exists, so pop cannot fail.
                if let Some(event) = session.queue.pop_front() {
                    events.push(event);
                }
            } else {
                break;
            }
        }

        let complete = session.queue.is_empty();
        if complete {
            self.replay = None;
        }
        ReplayBatch { events, complete }
    }

    /// Abandon an in-flight replay, discarding whatever was still queued.
    ///
    /// Returns the number of discarded events. The caller resets the fighter
    /// to neutral.
    pub fn stop_replay(&mut self) -> usize {
        match self.replay.take() {
            Some(session) => {
                let discarded = session.queue.len();
                debug!(discarded, "replay stopped early");
                discarded
            }
            None => 0,
        }
    }

    /// Hash the recorded events for verification.
    pub fn content_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_timeline();
        hasher.update_u32(self.events.len() as u32);
        for event in &self.events {
            hasher.update_u32(event.tick);
            match event.kind {
                InputEventKind::Press(button) => {
                    hasher.update_u8(0);
                    hasher.update_u8(button as u8);
                }
                InputEventKind::Release(button) => {
                    hasher.update_u8(1);
                    hasher.update_u8(button as u8);
                }
                InputEventKind::AxisSample(axis, value) => {
                    hasher.update_u8(2);
                    hasher.update_u8(axis as u8);
                    hasher.update_fixed(value);
                }
            }
        }
        hasher.finalize()
    }
}

impl Default for InputTimeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::game::input::{Axis, Button};
    use crate::core::fixed::FIXED_HALF;

    fn press(tick: u32) -> InputEvent {
        InputEvent::press(tick, Button::JabRight)
    }

    #[test]
    fn test_record_keeps_fifo_order() {
        let mut timeline = InputTimeline::new();
        timeline.record(press(0));
        timeline.record(InputEvent::release(60, Button::JabRight));
        timeline.record(InputEvent::axis(60, Axis::Horizontal, FIXED_HALF));

        let ticks: Vec<u32> = timeline.events().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![0, 60, 60]);
    }

    #[test]
    fn test_prune_front_eviction() {
        let mut timeline = InputTimeline::with_retention(100);
        timeline.record(press(0));
        timeline.record(press(50));
        timeline.record(press(150));

        timeline.prune(150);
        // Tick 0 is 150 ticks old - out. Tick 50 is exactly 100 - stays.
        assert_eq!(timeline.len(), 2);

        timeline.prune(250);
        // Tick 50 is now 200 ticks old - out. Tick 150 is exactly 100 - stays.
        assert_eq!(timeline.len(), 1);

        timeline.prune(251);
        assert!(timeline.is_empty());
    }

    #[test]
    fn test_start_replay_empty_buffer() {
        let mut timeline = InputTimeline::new();
        let result = timeline.start_replay(600);
        assert!(matches!(result, Err(ReplayError::EmptyBuffer)));
        assert!(!timeline.is_replaying());
    }

    #[test]
    fn test_replay_snapshot_isolation() {
        let mut timeline = InputTimeline::new();
        timeline.record(press(0));

        let count = timeline.start_replay(600).unwrap();
        assert_eq!(count, 1);

        // Recording that continues after the snapshot must not leak into it.
        timeline.record(press(601));

        let batch = timeline.step_replay(600);
        assert_eq!(batch.events, vec![press(0)]);
        assert!(batch.complete);

        // The record buffer still holds both events.
        assert_eq!(timeline.len(), 2);
    }

    #[test]
    fn test_step_replay_timing() {
        let mut timeline = InputTimeline::new();
        timeline.record(press(0));
        timeline.record(press(60));
        timeline.record(press(90));

        timeline.start_replay(600).unwrap();

        // Elapsed 0: only the tick-0 event is due.
        let batch = timeline.step_replay(600);
        assert_eq!(batch.events, vec![press(0)]);
        assert!(!batch.complete);

        // Elapsed 59: nothing new.
        let batch = timeline.step_replay(659);
        assert!(batch.events.is_empty());
        assert!(!batch.complete);

        // Elapsed 95: both remaining events come due in FIFO order.
        let batch = timeline.step_replay(695);
        assert_eq!(batch.events, vec![press(60), press(90)]);
        assert!(batch.complete);
        assert!(!timeline.is_replaying());
    }

    #[test]
    fn test_stop_replay_discards_queue() {
        let mut timeline = InputTimeline::new();
        timeline.record(press(0));
        timeline.record(press(60));

        timeline.start_replay(600).unwrap();
        let batch = timeline.step_replay(600);
        assert_eq!(batch.events.len(), 1);

        let discarded = timeline.stop_replay();
        assert_eq!(discarded, 1);
        assert!(!timeline.is_replaying());

        // Stopping again is a no-op.
        assert_eq!(timeline.stop_replay(), 0);
    }

    #[test]
    fn test_content_hash_tracks_events() {
        let mut a = InputTimeline::new();
        let mut b = InputTimeline::new();
        a.record(press(0));
        b.record(press(0));
        assert_eq!(a.content_hash(), b.content_hash());

        b.record(press(10));
        assert_ne!(a.content_hash(), b.content_hash());
    }

    proptest! {
        /// For all record sequences, the timeline never holds two events with
        /// out-of-order ticks.
        #[test]
        fn prop_events_stay_ordered(gaps in prop::collection::vec(0u32..100, 0..200)) {
            let mut timeline = InputTimeline::new();
            let mut tick = 0u32;
            for gap in gaps {
                tick += gap;
                timeline.record(press(tick));
            }

            let ticks: Vec<u32> = timeline.events().map(|e| e.tick).collect();
            for pair in ticks.windows(2) {
                prop_assert!(pair[0] <= pair[1]);
            }
        }

        /// After prune(now), no retained event is older than the retention
        /// window.
        #[test]
        fn prop_prune_respects_retention(
            gaps in prop::collection::vec(0u32..500, 1..100),
            retention in 1u32..2000,
            extra in 0u32..5000,
        ) {
            let mut timeline = InputTimeline::with_retention(retention);
            let mut tick = 0u32;
            for gap in &gaps {
                tick += gap;
                timeline.record(press(tick));
            }

            let now = tick + extra;
            timeline.prune(now);

            for event in timeline.events() {
                prop_assert!(now - event.tick <= retention);
            }
        }
    }
}
