//! Drives a pursuer around a headless arena with a saved policy.
//!
//! Usage: `cargo run --example headless_chase -- policy.json --seconds 30`

use clap::Parser;
use gridchase::bridge::{ArenaScene, InferenceBridge, SimulatedArena, TargetMotion};
use gridchase::config::BridgeConfig;
use glam::Vec3;
use std::path::PathBuf;

const FRAME_RATE: f32 = 60.0;

#[derive(Parser)]
#[command(name = "headless_chase")]
#[command(about = "Drive a pursuer in a headless arena with a saved policy", long_about = None)]
struct Args {
    /// Policy artifact written by train_tabular
    #[arg(default_value = "pursuer_policy.json")]
    policy: PathBuf,

    /// Simulated seconds to run
    #[arg(long, default_value_t = 20.0)]
    seconds: f32,

    /// Orbit radius of the target, in world units
    #[arg(long, default_value_t = 10.0)]
    radius: f32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let seconds = args.seconds;

    // No policy, no game loop.
    let bridge = InferenceBridge::load(&args.policy, BridgeConfig::default())?;

    let mut arena = SimulatedArena::new(Vec3::new(-20.0, 1.0, -20.0), Vec3::new(10.0, 1.0, 0.0))
        .with_motion(TargetMotion::Orbit {
            radius: args.radius,
            angular_speed: 0.3,
        });

    let dt = 1.0 / FRAME_RATE;
    let frames = (seconds * FRAME_RATE) as u32;
    let mut closest = arena.separation();
    for frame in 0..frames {
        arena.advance(dt);
        bridge.per_frame_update(&mut arena, dt);
        closest = closest.min(arena.separation());

        if frame % FRAME_RATE as u32 == 0 {
            let p = arena.pursuer_position();
            let t = arena.target_position();
            println!(
                "t={:>5.1}s pursuer=({:>6.2}, {:>6.2}) target=({:>6.2}, {:>6.2}) gap={:.2}",
                arena.elapsed(),
                p.x,
                p.z,
                t.x,
                t.z,
                arena.separation()
            );
        }
    }

    println!("🏁 closest approach {closest:.2} over {seconds}s");
    Ok(())
}
