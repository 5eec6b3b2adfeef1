//! Trains a tabular pursuer and writes its artifact.
//!
//! Usage: `cargo run --example train_tabular -- --out policy.json --config config.json`

use clap::Parser;
use gridchase::config::Config;
use gridchase::env::{Env, GridPursuitEnv, RenderFrame, VecEnv};
use gridchase::eval::{EvalSummary, evaluate};
use gridchase::inference::{Policy, save_policy};
use gridchase::learner::{Learner, QLearner};
use gridchase::train::{Callback, RenderCallback, train};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "train_tabular")]
#[command(about = "Train a tabular pursuit policy and save it", long_about = None)]
struct Args {
    /// Where to write the policy artifact
    #[arg(long, default_value = "pursuer_policy.json")]
    out: PathBuf,

    /// JSON config file; defaults apply to anything it leaves out
    #[arg(long)]
    config: Option<PathBuf>,

    /// Evaluation episodes after training
    #[arg(long, default_value_t = 10)]
    eval_episodes: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };

    let env_config = config.env.clone();
    let base_seed = config.train.seed.unwrap_or(0);
    let mut envs = VecEnv::try_new(
        |i| GridPursuitEnv::with_seed(env_config.clone(), base_seed.wrapping_add(i as u64)),
        config.train.num_envs,
    )?;
    let mut learner = QLearner::new(config.env.grid_size, config.learner.clone())?;
    let mut callbacks: Vec<Box<dyn Callback<GridPursuitEnv>>> = vec![Box::new(RenderCallback::new(
        config.train.render_freq,
        |frame: &RenderFrame| println!("{}", frame.as_text()),
    ))];

    println!("🚀 Training on a {0}x{0} grid", config.env.grid_size);
    let stats = train(&mut envs, &mut learner, &config.train, &mut callbacks).await?;
    envs.close()?;
    println!(
        "✅ {} steps, {} episodes, {} captures in {:?}",
        stats.total_steps, stats.total_episodes, stats.captures, stats.training_time
    );

    let policy = learner.policy();
    let mut eval_env = GridPursuitEnv::with_seed(config.env.clone(), base_seed)?;
    let reports = evaluate(
        &policy,
        &mut eval_env,
        args.eval_episodes,
        Some(base_seed.wrapping_add(10_000)),
    )?;
    let summary = EvalSummary::from_reports(&reports);
    println!(
        "📊 capture rate {:.0}%, mean steps {:.1}, mean return {:.2}",
        summary.capture_rate * 100.0,
        summary.mean_steps,
        summary.mean_return
    );

    let sample = policy.predict(&eval_env.reset(Some(base_seed))?.0, true);
    println!("🎯 greedy action at a fresh start: {:?}", sample.0);

    save_policy(&args.out, &learner.into_artifact())?;
    println!("💾 Policy written to {}", args.out.display());
    Ok(())
}
