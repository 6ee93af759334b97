use std::path::PathBuf;

use cfr::{
    eval,
    games::{
        kuhn::Kuhn,
        Game,
    },
    strategy::StrategyMap,
};
use clap::Parser;
use itertools::Itertools;
use rand::SeedableRng;
use wyhash::WyRng;

/// Evaluates trained average strategies: expected payoffs and exploitability.
#[derive(Parser)]
struct AppArgs {
    /// Random seed used to initialize the random generator.
    #[clap(long, short, value_parser)]
    seed: Option<u32>,

    /// Path to the binary average-strategy file for player 0.
    #[clap(long, value_parser)]
    strategy_path_0: PathBuf,

    /// Path to the binary average-strategy file for player 1.
    #[clap(long, value_parser)]
    strategy_path_1: PathBuf,
}

fn main() -> Result<(), cfr::Error> {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    let args = AppArgs::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = WyRng::seed_from_u64(seed as u64);

    let maps =
        vec![StrategyMap::load(&args.strategy_path_0)?, StrategyMap::load(&args.strategy_path_1)?];
    let strategies: Vec<&dyn eval::Strategy<Kuhn>> =
        maps.iter().map(|m| m as &dyn eval::Strategy<Kuhn>).collect();

    let mut game = Kuhn::new();
    game.reset(&mut rng, false);

    let payoffs = eval::expected_payoffs(&game, &strategies)?;
    println!("expected player payoffs: ({})", payoffs.iter().map(|p| p.to_string()).join(","));

    game.reset(&mut rng, false);
    let exploitability = eval::exploitability(&game, &strategies)?;
    println!("strategy exploitability: {}", exploitability);

    Ok(())
}
