pub mod eval;
pub mod games;
pub mod solvers;
pub mod strategy;

use crate::solvers::Mode;

/// Errors surfaced by training, evaluation and persistence. None of these are
/// recoverable in-process; callers report them and exit.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("game contract violated: {0}")]
    IllFormed(String),

    #[error("{0} sampling cannot train against a fixed-strategy player")]
    IncompatibleMode(Mode),

    #[error("no strategy entry for info set {0:?}")]
    MissingStrategy(Vec<u8>),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("strategy codec error: {0}")]
    Codec(#[from] bincode::Error),
}
