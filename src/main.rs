//! Iron Ring Combat Core Demo
//!
//! Drives a scripted bout against logging collaborators, exercises the
//! replay toggle, and verifies replay determinism by hashing two identical
//! runs.

use anyhow::Result;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use iron_ring::collab::{
    AnimFlag, AnimTrigger, AnimationDriver, AudioCue, AudioPlayer, ContactColliders, ContactZone,
    FighterRig, HurtboxOrientation, PhysicsBody, Pose,
};
use iron_ring::core::vec3::FixedVec3;
use iron_ring::game::hit::{ContactReport, HitZone};
use iron_ring::game::input::{Button, FrameSample};
use iron_ring::game::state::FighterId;
use iron_ring::game::tick::{Bout, BoutConfig, TickInputs};
use iron_ring::{TICK_RATE, VERSION};

/// Animation driver that just logs writes.
struct LogAnimation(&'static str);

impl AnimationDriver for LogAnimation {
    fn set_flag(&mut self, flag: AnimFlag, value: bool) {
        debug!(fighter = self.0, ?flag, value, "anim flag");
    }

    fn fire_trigger(&mut self, trigger: AnimTrigger) {
        debug!(fighter = self.0, ?trigger, "anim trigger");
    }

    fn is_current(&self, _pose: Pose) -> bool {
        // The demo has no animation graph; every pose query misses.
        false
    }
}

/// Physics body that just logs impulses.
struct LogPhysics(&'static str);

impl PhysicsBody for LogPhysics {
    fn apply_impulse(&mut self, impulse: FixedVec3) {
        info!(fighter = self.0, ?impulse, "impulse");
    }

    fn set_gravity_enabled(&mut self, enabled: bool) {
        debug!(fighter = self.0, enabled, "gravity");
    }

    fn reset_velocity(&mut self) {
        debug!(fighter = self.0, "velocity reset");
    }
}

/// Collider layer that just logs zone toggles.
struct LogColliders(&'static str);

impl ContactColliders for LogColliders {
    fn set_zone_enabled(&mut self, zone: ContactZone, enabled: bool) {
        if enabled {
            debug!(fighter = self.0, ?zone, "zone hot");
        }
    }

    fn set_hurtbox(&mut self, orientation: HurtboxOrientation) {
        debug!(fighter = self.0, ?orientation, "hurtbox");
    }
}

/// Audio player that just logs cues.
struct LogAudio(&'static str);

impl AudioPlayer for LogAudio {
    fn play_one_shot(&mut self, cue: AudioCue) {
        info!(fighter = self.0, %cue, "audio");
    }
}

fn demo_rig(name: &'static str) -> Result<FighterRig> {
    Ok(FighterRig::builder()
        .animation(LogAnimation(name))
        .physics(LogPhysics(name))
        .colliders(LogColliders(name))
        .audio(LogAudio(name))
        .build()?)
}

/// Scripted device frames: walk in, jab, then a crouch jab (the uppercut).
fn p1_frame(tick: u32) -> FrameSample {
    let mut frame = FrameSample::new();
    match tick {
        1..=60 => frame.set_held(Button::Forward, true),
        90..=95 => frame.set_held(Button::JabRight, true),
        120..=150 => {
            frame.set_held(Button::Crouch, true);
            if tick >= 130 {
                frame.set_held(Button::JabLeft, true);
            }
        }
        _ => {}
    }
    frame
}

/// The uppercut connects while P1's hand window is open.
fn contacts_for(tick: u32) -> Vec<ContactReport> {
    if tick == 131 {
        vec![ContactReport {
            attacker: FighterId::P1,
            defender: FighterId::P2,
            zone: HitZone::Head,
        }]
    } else {
        Vec::new()
    }
}

/// Run the scripted bout for `ticks` ticks, returning the bout.
fn run_scripted(ticks: u32) -> Result<(Bout, usize)> {
    let mut bout = Bout::new(demo_rig("P1")?, demo_rig("P2")?, BoutConfig::default());
    bout.start();

    let mut total_events = 0;
    for t in 1..=ticks {
        let mut io = TickInputs::none().with_frame(FighterId::P1, p1_frame(t));
        for report in contacts_for(t) {
            io = io.with_contact(report);
        }
        // The launched fighter lands shortly after the juggle.
        if t == 200 {
            io = io.with_grounded(FighterId::P2);
        }
        let result = bout.tick(&io);
        for event in &result.events {
            info!(event = %serde_json::to_string(event)?, "combat event");
        }
        total_events += result.events.len();
    }
    Ok((bout, total_events))
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Iron Ring Combat Core v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    info!("=== Scripted Bout ===");
    let (mut bout, total_events) = run_scripted(360)?;
    info!(
        recorded = bout.timeline().len(),
        events = total_events,
        "recording complete"
    );
    info!(
        "Timeline Hash: {}",
        hex::encode(bout.timeline().content_hash())
    );

    info!("=== Replay ===");
    bout.tick(&TickInputs::none().with_toggle());
    let mut replay_ticks = 0u32;
    while bout.is_replaying() {
        let result = bout.tick(&TickInputs::none());
        for event in &result.events {
            info!(event = %serde_json::to_string(event)?, "replayed event");
        }
        replay_ticks += 1;
    }
    info!(replay_ticks, "replay drained");

    // Verify determinism: the same script must hash identically.
    info!("=== Verifying Determinism ===");
    let (bout_a, _) = run_scripted(360)?;
    let (bout_b, _) = run_scripted(360)?;

    let hash_a = bout_a.state.compute_hash();
    let hash_b = bout_b.state.compute_hash();
    info!("Run A State Hash: {}", hex::encode(hash_a));
    info!("Run B State Hash: {}", hex::encode(hash_b));

    if hash_a == hash_b {
        info!("DETERMINISM VERIFIED: Hashes match!");
    } else {
        info!("DETERMINISM FAILURE: Hashes differ!");
    }

    Ok(())
}
