use std::path::PathBuf;

use itertools::Itertools;
use log::{
    debug,
    info,
};
use rand::{
    Rng,
    SeedableRng,
};
use rand_distr::{
    Distribution,
    WeightedIndex,
};
use wyhash::WyRng;

use crate::{
    games::Game,
    solvers::{
        node::NodeMap,
        Mode,
    },
    strategy::StrategyMap,
    Error,
};

// Exploration mixed into the learner's sampling distribution under outcome
// sampling, so every action keeps positive sampling probability.
const OUTCOME_EXPLORATION: f64 = 0.6;

const LOG_INTERVAL: u64 = 1_000;
const PERSIST_INTERVAL: u64 = 10_000_000;

fn sample_index<R: Rng>(rng: &mut R, probs: &[f64]) -> usize {
    let dist = WeightedIndex::new(probs).unwrap_or_else(|e| {
        panic!("invalid action distribution: {}: {:?}", e, probs);
    });
    dist.sample(rng)
}

/// Runs one of the four CFR recursions over a game, accumulating regrets and
/// average strategies per info set. Players with a pre-loaded fixed strategy
/// are not trained; they act according to their loaded average strategy.
pub struct Trainer<G>
where
    G: Game,
{
    game: G,
    mode: Mode,
    nodes: NodeMap,
    fixed_strategies: Vec<Option<StrategyMap>>,
    rng: WyRng,
    touched_nodes: u64,
    utils: Vec<f64>,
    out_dir: PathBuf,
}

impl<G> Trainer<G>
where
    G: Game,
{
    pub fn new(game: G, mode: Mode, seed: u32) -> Self {
        Self::with_fixed_strategies(game, mode, seed, (0..G::player_count()).map(|_| None).collect())
    }

    /// `fixed_strategies` carries one optional entry per player; `Some` makes
    /// that player act out the loaded strategy instead of learning.
    pub fn with_fixed_strategies(
        game: G,
        mode: Mode,
        seed: u32,
        fixed_strategies: Vec<Option<StrategyMap>>,
    ) -> Self {
        assert_eq!(G::player_count(), fixed_strategies.len());
        Trainer {
            game,
            mode,
            nodes: NodeMap::new(),
            fixed_strategies,
            rng: WyRng::seed_from_u64(seed as u64),
            touched_nodes: 0,
            utils: vec![0.0; G::player_count()],
            out_dir: PathBuf::from("..").join("strategies").join(G::name()),
        }
    }

    pub fn with_output_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = out_dir.into();
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn nodes(&self) -> &NodeMap {
        &self.nodes
    }

    pub fn touched_nodes(&self) -> u64 {
        self.touched_nodes
    }

    pub fn average_strategies(&mut self) -> StrategyMap {
        StrategyMap::new(self.nodes.average_strategies())
    }

    /// The full training loop: `iterations` outer iterations with progress
    /// logging and periodic persistence, plus a final write of the average
    /// strategies.
    pub fn train(&mut self, iterations: u64) -> Result<(), Error> {
        for i in 0..iterations {
            self.run_iteration(i)?;
            if i % LOG_INTERVAL == 0 {
                info!(
                    "iteration: {}, cumulative nodes touched: {}, infosets num: {}, expected payoffs: ({})",
                    i,
                    self.touched_nodes,
                    self.nodes.len(),
                    self.utils.iter().map(|u| format!("{:.6}", u)).join(","),
                );
            }
            if i != 0 && i % PERSIST_INTERVAL == 0 {
                self.write_strategy(Some(i))?;
            }
        }
        self.write_strategy(None)
    }

    /// One outer iteration: every learning player in turn runs the recursion
    /// selected by the mode. `standard` expands chance inside the recursion;
    /// the sampling modes let the reset sample the deal up front.
    pub fn run_iteration(&mut self, iteration: u64) -> Result<(), Error> {
        for p in 0..G::player_count() {
            if self.fixed_strategies[p].is_some() {
                continue;
            }
            self.utils[p] = match self.mode {
                Mode::Standard => {
                    self.game.reset(&mut self.rng, false);
                    let root = self.game.clone();
                    let util = self.cfr(&root, p, 1.0, 1.0)?;
                    self.nodes.refresh_strategies();
                    util
                }
                Mode::Chance => {
                    self.game.reset(&mut self.rng, true);
                    let root = self.game.clone();
                    let util = self.chance_sampling_cfr(&root, p, 1.0, 1.0)?;
                    self.nodes.refresh_strategies();
                    util
                }
                Mode::External => {
                    self.game.reset(&mut self.rng, true);
                    let root = self.game.clone();
                    self.external_sampling_cfr(&root, p)?
                }
                Mode::Outcome => {
                    self.game.reset(&mut self.rng, true);
                    let root = self.game.clone();
                    self.outcome_sampling_cfr(&root, p, iteration, 1.0, 1.0, 1.0)?.0
                }
            };
        }
        Ok(())
    }

    fn action_count(game: &G) -> Result<usize, Error> {
        let action_count = game.action_count();
        if action_count == 0 {
            return Err(Error::IllFormed("no legal actions at a non-terminal state".to_string()));
        }
        Ok(action_count)
    }

    /// Vanilla CFR. `pi` is the learner's own reach probability, `po` the
    /// reach contributed by everyone else including chance; regrets are
    /// weighted by `po`, the average strategy by `pi`. Strategies read here
    /// are refreshed in a batch at the end of the iteration, not inline.
    fn cfr(&mut self, game: &G, learner: usize, pi: f64, po: f64) -> Result<f64, Error> {
        self.touched_nodes += 1;

        if game.is_terminal() {
            return Ok(game.payoff(learner));
        }

        let action_count = Self::action_count(game)?;
        if game.is_chance() {
            let mut node_util = 0.0;
            for a in 0..action_count {
                let mut next = game.clone();
                next.apply_action(a);
                let prob = next.chance_probability();
                node_util += prob * self.cfr(&next, learner, pi, po * prob)?;
            }
            return Ok(node_util);
        }

        let player = game.current_player();
        let key = game.info_set_key();
        if let Some(fixed) = &self.fixed_strategies[player] {
            let strategy = fixed.get(&key)?.to_vec();
            let mut node_util = 0.0;
            for (a, prob) in strategy.iter().enumerate() {
                let mut next = game.clone();
                next.apply_action(a);
                node_util += prob * self.cfr(&next, learner, pi, po * prob)?;
            }
            return Ok(node_util);
        }

        let strategy = self.nodes.node_mut(&key, action_count).strategy().to_vec();
        let mut utils = vec![0.0; action_count];
        let mut node_util = 0.0;
        for (a, util) in utils.iter_mut().enumerate() {
            let mut next = game.clone();
            next.apply_action(a);
            *util = if player == learner {
                self.cfr(&next, learner, pi * strategy[a], po)?
            } else {
                self.cfr(&next, learner, pi, po * strategy[a])?
            };
            node_util += strategy[a] * *util;
        }

        if player == learner {
            let node = self.nodes.node_mut(&key, action_count);
            for (a, util) in utils.iter().enumerate() {
                node.add_regret(a, po * (util - node_util));
            }
            node.accumulate_strategy(&strategy, pi);
        }

        Ok(node_util)
    }

    /// Chance-sampling CFR: the deal was sampled by the iteration's reset, so
    /// chance nodes are only reached in games with interior chance events and
    /// are sampled through. Fixed-strategy players act as random simulators
    /// here, sampling a single action instead of being averaged over.
    fn chance_sampling_cfr(
        &mut self,
        game: &G,
        learner: usize,
        pi: f64,
        po: f64,
    ) -> Result<f64, Error> {
        self.touched_nodes += 1;

        if game.is_terminal() {
            return Ok(game.payoff(learner));
        }

        let action_count = Self::action_count(game)?;
        if game.is_chance() {
            let action = self.rng.gen_range(0..action_count);
            let mut next = game.clone();
            next.apply_action(action);
            return self.chance_sampling_cfr(&next, learner, pi, po);
        }

        let player = game.current_player();
        let key = game.info_set_key();
        if let Some(fixed) = &self.fixed_strategies[player] {
            let strategy = fixed.get(&key)?;
            let action = sample_index(&mut self.rng, strategy);
            let mut next = game.clone();
            next.apply_action(action);
            return self.chance_sampling_cfr(&next, learner, pi, po);
        }

        let strategy = self.nodes.node_mut(&key, action_count).strategy().to_vec();
        let mut utils = vec![0.0; action_count];
        let mut node_util = 0.0;
        for (a, util) in utils.iter_mut().enumerate() {
            let mut next = game.clone();
            next.apply_action(a);
            *util = if player == learner {
                self.chance_sampling_cfr(&next, learner, pi * strategy[a], po)?
            } else {
                self.chance_sampling_cfr(&next, learner, pi, po * strategy[a])?
            };
            node_util += strategy[a] * *util;
        }

        if player == learner {
            let node = self.nodes.node_mut(&key, action_count);
            for (a, util) in utils.iter().enumerate() {
                node.add_regret(a, po * (util - node_util));
            }
            node.accumulate_strategy(&strategy, pi);
        }

        Ok(node_util)
    }

    /// External-sampling MCCFR. No reach probabilities are carried: the
    /// counterfactual weighting comes from sampling every non-learner action.
    /// Strategies are refreshed on entry, and the average strategy is
    /// accumulated on the opponents' turns to keep it unbiased.
    fn external_sampling_cfr(&mut self, game: &G, learner: usize) -> Result<f64, Error> {
        self.touched_nodes += 1;

        if game.is_terminal() {
            return Ok(game.payoff(learner));
        }

        let action_count = Self::action_count(game)?;
        if game.is_chance() {
            let action = self.rng.gen_range(0..action_count);
            let mut next = game.clone();
            next.apply_action(action);
            return self.external_sampling_cfr(&next, learner);
        }

        let player = game.current_player();
        if self.fixed_strategies[player].is_some() {
            return Err(Error::IncompatibleMode(Mode::External));
        }

        let key = game.info_set_key();
        let node = self.nodes.node_mut(&key, action_count);
        node.refresh_strategy();
        let strategy = node.strategy().to_vec();

        if player != learner {
            let action = sample_index(&mut self.rng, &strategy);
            let mut next = game.clone();
            next.apply_action(action);
            let util = self.external_sampling_cfr(&next, learner)?;

            self.nodes.node_mut(&key, action_count).accumulate_strategy(&strategy, 1.0);
            return Ok(util);
        }

        let mut utils = vec![0.0; action_count];
        let mut node_util = 0.0;
        for (a, util) in utils.iter_mut().enumerate() {
            let mut next = game.clone();
            next.apply_action(a);
            *util = self.external_sampling_cfr(&next, learner)?;
            node_util += strategy[a] * *util;
        }

        let node = self.nodes.node_mut(&key, action_count);
        for (a, util) in utils.iter().enumerate() {
            node.add_regret(a, util - node_util);
        }

        Ok(node_util)
    }

    /// Outcome-sampling MCCFR. A single trajectory is sampled per call; `s`
    /// is the product of sampling probabilities along it, and the returned
    /// tail is the product of the acting players' strategy probabilities from
    /// this node to the terminal. Terminal payoffs are divided by `s`, which
    /// makes the estimator unbiased.
    fn outcome_sampling_cfr(
        &mut self,
        game: &G,
        learner: usize,
        iteration: u64,
        pi: f64,
        po: f64,
        s: f64,
    ) -> Result<(f64, f64), Error> {
        self.touched_nodes += 1;

        if game.is_terminal() {
            return Ok((game.payoff(learner) / s, 1.0));
        }

        let action_count = Self::action_count(game)?;
        if game.is_chance() {
            let action = self.rng.gen_range(0..action_count);
            let mut next = game.clone();
            next.apply_action(action);
            let prob = next.chance_probability();
            return self.outcome_sampling_cfr(&next, learner, iteration, pi, po * prob, s * prob);
        }

        let player = game.current_player();
        if self.fixed_strategies[player].is_some() {
            return Err(Error::IncompatibleMode(Mode::Outcome));
        }

        let key = game.info_set_key();
        let node = self.nodes.node_mut(&key, action_count);
        node.refresh_strategy();
        let strategy = node.strategy().to_vec();

        let probability: Vec<f64> = if player == learner {
            strategy
                .iter()
                .map(|p| OUTCOME_EXPLORATION / action_count as f64 + (1.0 - OUTCOME_EXPLORATION) * p)
                .collect()
        } else {
            strategy.clone()
        };
        let chosen = sample_index(&mut self.rng, &probability);

        let mut next = game.clone();
        next.apply_action(chosen);
        let (next_pi, next_po) = if player == learner {
            (pi * strategy[chosen], po)
        } else {
            (pi, po * strategy[chosen])
        };
        let (util, tail) = self.outcome_sampling_cfr(
            &next,
            learner,
            iteration,
            next_pi,
            next_po,
            s * probability[chosen],
        )?;

        let node = self.nodes.node_mut(&key, action_count);
        if player == learner {
            let w = util * po;
            for a in 0..action_count {
                let regret = if a == chosen {
                    w * (1.0 - strategy[chosen]) * tail
                } else {
                    -w * tail * strategy[chosen]
                };
                node.add_regret(a, regret);
            }
        } else {
            node.accumulate_strategy(&strategy, po / s);
        }

        Ok((util, tail * strategy[chosen]))
    }

    /// Persists the current average strategies as
    /// `strategy[_<iteration>]_<mode>.bin` under the output directory,
    /// creating the directory if needed.
    pub fn write_strategy(&mut self, iteration: Option<u64>) -> Result<(), Error> {
        let strategies = self.average_strategies();
        if log::log_enabled!(log::Level::Debug) {
            for (key, strategy) in strategies.iter().sorted_by(|(a, _), (b, _)| a.cmp(b)) {
                debug!("{:?}: {:?}", key, strategy);
            }
        }

        std::fs::create_dir_all(&self.out_dir)?;
        let file_name = match iteration {
            Some(i) => format!("strategy_{}_{}.bin", i, self.mode),
            None => format!("strategy_{}.bin", self.mode),
        };
        let path = self.out_dir.join(file_name);
        strategies.save(&path)?;
        info!("wrote {} info sets to {}", strategies.len(), path.display());
        Ok(())
    }
}
