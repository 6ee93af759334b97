use std::collections::HashMap;

use crate::{
    games::Game,
    strategy::StrategyMap,
    Error,
};

/// A fixed strategy profile entry consumed by the evaluator: an action
/// distribution for the acting player of any non-terminal state.
pub trait Strategy<G: Game> {
    fn get_strategy(&self, game: &G) -> Result<Vec<f64>, Error>;
}

impl<G: Game> Strategy<G> for StrategyMap {
    fn get_strategy(&self, game: &G) -> Result<Vec<f64>, Error> {
        Ok(self.get(&game.info_set_key())?.to_vec())
    }
}

/// Plays every action with equal probability. Useful as an untrained
/// baseline.
pub struct UniformStrategy;

impl<G: Game> Strategy<G> for UniformStrategy {
    fn get_strategy(&self, game: &G) -> Result<Vec<f64>, Error> {
        Ok(vec![1.0 / game.action_count() as f64; game.action_count()])
    }
}

/// Every concrete state consistent with an info set, paired with the reach
/// probability contributed by chance and the players other than the one the
/// info set belongs to.
pub type InfoSets<G> = HashMap<Vec<u8>, Vec<(G, f64)>>;

/// Expected payoff of every player under the given profile, by full-tree
/// expansion from `game`, which must be a root state.
pub fn expected_payoffs<G: Game>(
    game: &G,
    strategies: &[&dyn Strategy<G>],
) -> Result<Vec<f64>, Error> {
    if game.is_terminal() {
        return Ok((0..G::player_count()).map(|p| game.payoff(p)).collect());
    }

    let action_count = game.action_count();
    let mut node_utils = vec![0.0; G::player_count()];
    if game.is_chance() {
        for a in 0..action_count {
            let mut next = game.clone();
            next.apply_action(a);
            let prob = next.chance_probability();
            let utils = expected_payoffs(&next, strategies)?;
            for (node_util, util) in node_utils.iter_mut().zip(utils) {
                *node_util += prob * util;
            }
        }
        return Ok(node_utils);
    }

    let strategy = strategies[game.current_player()].get_strategy(game)?;
    for a in 0..action_count {
        let mut next = game.clone();
        next.apply_action(a);
        let utils = expected_payoffs(&next, strategies)?;
        for (node_util, util) in node_utils.iter_mut().zip(utils) {
            *node_util += strategy[a] * util;
        }
    }
    Ok(node_utils)
}

/// Phase 1 of the best-response computation: enumerate the whole tree and
/// record, for every info set of `player`, the states it contains and their
/// reach probabilities. `player`'s own actions do not scale the reach; chance
/// and the other players' strategies do.
pub fn collect_info_sets<G: Game>(
    game: &G,
    player: usize,
    strategies: &[&dyn Strategy<G>],
    reach: f64,
    info_sets: &mut InfoSets<G>,
) -> Result<(), Error> {
    if game.is_terminal() {
        return Ok(());
    }

    let action_count = game.action_count();
    if game.is_chance() {
        for a in 0..action_count {
            let mut next = game.clone();
            next.apply_action(a);
            let prob = next.chance_probability();
            collect_info_sets(&next, player, strategies, reach * prob, info_sets)?;
        }
        return Ok(());
    }

    let actor = game.current_player();
    if actor == player {
        info_sets.entry(game.info_set_key()).or_default().push((game.clone(), reach));
        for a in 0..action_count {
            let mut next = game.clone();
            next.apply_action(a);
            collect_info_sets(&next, player, strategies, reach, info_sets)?;
        }
    } else {
        let strategy = strategies[actor].get_strategy(game)?;
        for a in 0..action_count {
            let mut next = game.clone();
            next.apply_action(a);
            collect_info_sets(&next, player, strategies, reach * strategy[a], info_sets)?;
        }
    }
    Ok(())
}

/// Phase 2: value of `player`'s best response against the rest of the
/// profile. The response is pure and chosen per info set by aggregating
/// action values over every state the info set contains; it is memoized in
/// `best_responses` (ties go to the lowest action index).
pub fn best_response_value<G: Game>(
    game: &G,
    player: usize,
    strategies: &[&dyn Strategy<G>],
    best_responses: &mut HashMap<Vec<u8>, Vec<f64>>,
    reach: f64,
    info_sets: &InfoSets<G>,
) -> Result<f64, Error> {
    if game.is_terminal() {
        return Ok(game.payoff(player));
    }

    let action_count = game.action_count();
    if game.is_chance() {
        let mut node_util = 0.0;
        for a in 0..action_count {
            let mut next = game.clone();
            next.apply_action(a);
            let prob = next.chance_probability();
            node_util += prob
                * best_response_value(
                    &next,
                    player,
                    strategies,
                    best_responses,
                    reach * prob,
                    info_sets,
                )?;
        }
        return Ok(node_util);
    }

    let actor = game.current_player();
    if actor != player {
        let strategy = strategies[actor].get_strategy(game)?;
        let mut node_util = 0.0;
        for a in 0..action_count {
            let mut next = game.clone();
            next.apply_action(a);
            node_util += strategy[a]
                * best_response_value(
                    &next,
                    player,
                    strategies,
                    best_responses,
                    reach * strategy[a],
                    info_sets,
                )?;
        }
        return Ok(node_util);
    }

    let key = game.info_set_key();
    if !best_responses.contains_key(&key) {
        let mut action_values = vec![0.0; action_count];
        for (member, member_reach) in &info_sets[&key] {
            for (a, action_value) in action_values.iter_mut().enumerate() {
                let mut next = member.clone();
                next.apply_action(a);
                let util = best_response_value(
                    &next,
                    player,
                    strategies,
                    best_responses,
                    *member_reach,
                    info_sets,
                )?;
                *action_value += member_reach * util;
            }
        }
        let mut best = 0;
        for a in 1..action_count {
            if action_values[a] > action_values[best] {
                best = a;
            }
        }
        let mut response = vec![0.0; action_count];
        response[best] = 1.0;
        best_responses.insert(key.clone(), response);
    }

    let response = best_responses[&key].clone();
    let mut node_util = 0.0;
    for a in 0..action_count {
        if response[a] == 0.0 {
            continue;
        }
        let mut next = game.clone();
        next.apply_action(a);
        node_util += response[a]
            * best_response_value(&next, player, strategies, best_responses, reach, info_sets)?;
    }
    Ok(node_util)
}

/// Value of `player`'s best response against the profile, from a root state.
pub fn best_response<G: Game>(
    game: &G,
    player: usize,
    strategies: &[&dyn Strategy<G>],
) -> Result<f64, Error> {
    let mut info_sets: InfoSets<G> = HashMap::new();
    collect_info_sets(game, player, strategies, 1.0, &mut info_sets)?;
    let mut best_responses = HashMap::new();
    best_response_value(game, player, strategies, &mut best_responses, 1.0, &info_sets)
}

/// Sum of best-response values across players. Zero at a Nash equilibrium of
/// a zero-sum game, positive otherwise.
pub fn exploitability<G: Game>(
    game: &G,
    strategies: &[&dyn Strategy<G>],
) -> Result<f64, Error> {
    let mut total = 0.0;
    for p in 0..G::player_count() {
        total += best_response(game, p, strategies)?;
    }
    Ok(total)
}
