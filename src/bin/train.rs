use cfr::{
    games::kuhn::Kuhn,
    solvers::{
        Mode,
        Trainer,
    },
};
use clap::Parser;

/// Computes an approximate Nash equilibrium of Kuhn Poker with CFR.
#[derive(Parser)]
struct AppArgs {
    /// A variant of the CFR algorithm computing an equilibrium.
    #[clap(long, short, value_enum, default_value_t = Mode::Standard)]
    algorithm: Mode,

    /// Number of iterations of CFR.
    #[clap(long, short, value_parser)]
    iteration: u64,

    /// Random seed used to initialize the random generator.
    #[clap(long, short, value_parser)]
    seed: Option<u32>,
}

fn main() -> Result<(), cfr::Error> {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    let args = AppArgs::parse();
    let seed = args.seed.unwrap_or_else(rand::random);

    let mut trainer = Trainer::new(Kuhn::new(), args.algorithm, seed);
    trainer.train(args.iteration)
}
