//! Command-line front end for the self-play trainer.

mod checkpoint;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, ValueEnum};

use azchess_core::{Oracle, Trainer, TrainerConfig, UniformOracle};
use checkpoint::CheckpointLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Run the self-play / training loop.
    Train,
    /// Play a single demonstration self-play game.
    Play,
}

#[derive(Parser, Debug)]
#[command(name = "azchess", version, about = "AlphaZero-style chess self-play engine")]
struct Args {
    /// What to do.
    #[arg(value_enum)]
    mode: Mode,

    /// Enable debug logging.
    #[arg(short, long)]
    debug: bool,

    /// Directory for the checkpoint log.
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    #[arg(long, default_value_t = TrainerConfig::default().num_iterations)]
    num_iterations: usize,

    #[arg(long, default_value_t = TrainerConfig::default().num_selfplay_iterations)]
    num_selfplay_iterations: usize,

    #[arg(long, default_value_t = TrainerConfig::default().num_searches)]
    num_searches: usize,

    #[arg(long, default_value_t = TrainerConfig::default().num_epochs)]
    num_epochs: usize,

    #[arg(long, default_value_t = TrainerConfig::default().batch_size)]
    batch_size: usize,

    #[arg(long, default_value_t = TrainerConfig::default().temperature)]
    temperature: f64,

    #[arg(long, default_value_t = TrainerConfig::default().dirichlet_epsilon)]
    dirichlet_epsilon: f64,

    #[arg(long, default_value_t = TrainerConfig::default().dirichlet_alpha)]
    dirichlet_alpha: f64,

    #[arg(long, default_value_t = TrainerConfig::default().c_puct)]
    c_puct: f64,

    #[arg(long, default_value_t = TrainerConfig::default().history_length)]
    history_length: usize,

    #[arg(long, default_value_t = TrainerConfig::default().seed)]
    seed: u64,
}

impl Args {
    fn config(&self) -> TrainerConfig {
        TrainerConfig {
            num_iterations: self.num_iterations,
            num_selfplay_iterations: self.num_selfplay_iterations,
            num_searches: self.num_searches,
            num_epochs: self.num_epochs,
            batch_size: self.batch_size,
            temperature: self.temperature,
            dirichlet_epsilon: self.dirichlet_epsilon,
            dirichlet_alpha: self.dirichlet_alpha,
            c_puct: self.c_puct,
            history_length: self.history_length,
            seed: self.seed,
        }
    }
}

fn main() -> ExitCode {
    // A missing or unknown mode exits 1, not clap's default 2.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(1);
        }
    };

    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, default_filter),
    );

    let result = match args.mode {
        Mode::Train => run_training(&args),
        Mode::Play => run_play(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

/// The learn loop: self-play games, training epochs, checkpoint log.
///
/// The uniform oracle stands in for the policy/value network; a real
/// deployment wires its own `Oracle` implementation here.
fn run_training(args: &Args) -> Result<()> {
    let config = args.config();
    config.validate()?;
    log::info!(
        "training: {} iterations, {} games/iteration, {} searches/move",
        config.num_iterations,
        config.num_selfplay_iterations,
        config.num_searches
    );

    let checkpoint_log = CheckpointLog::open(&args.log_dir)?;
    let num_iterations = config.num_iterations;
    let mut trainer = Trainer::new(UniformOracle, config)?;

    for iteration in 1..=num_iterations {
        log::info!("=== iteration {iteration} of {num_iterations} ===");
        let stats = trainer.run_iteration()?;
        log::info!(
            "iteration {iteration}: {} games, {} examples",
            stats.games,
            stats.examples
        );
        trainer.oracle_mut().checkpoint(iteration)?;
        checkpoint_log.record(iteration)?;
    }

    log::info!("all {num_iterations} iterations complete");
    Ok(())
}

/// One demonstration self-play game with the stand-in oracle.
fn run_play(args: &Args) -> Result<()> {
    let config = args.config();
    config.validate()?;
    let mut trainer = Trainer::new(UniformOracle, config)?;
    let examples = trainer.self_play()?;
    println!("self-play game finished after {} plies", examples.len());
    Ok(())
}
