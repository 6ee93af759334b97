use std::{
    collections::HashMap,
    fs::File,
    io::{
        BufReader,
        BufWriter,
    },
    path::Path,
};

use crate::Error;

/// A trained average-strategy table in its read-only, persisted form: one
/// probability vector per info-set key, the action count implied by the
/// vector length. Regrets and strategy sums do not survive persistence.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StrategyMap {
    strategies: HashMap<Vec<u8>, Vec<f64>>,
}

impl StrategyMap {
    pub fn new(strategies: HashMap<Vec<u8>, Vec<f64>>) -> Self {
        StrategyMap {
            strategies,
        }
    }

    pub fn get(&self, key: &[u8]) -> Result<&[f64], Error> {
        match self.strategies.get(key) {
            Some(strategy) => Ok(strategy),
            None => Err(Error::MissingStrategy(key.to_vec())),
        }
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &Vec<f64>)> {
        self.strategies.iter()
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let file = File::create(path)?;
        bincode::serialize_into(BufWriter::new(file), &self.strategies)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)?;
        let strategies = bincode::deserialize_from(BufReader::new(file))?;
        Ok(StrategyMap {
            strategies,
        })
    }
}
