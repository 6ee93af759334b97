use rand::Rng;

pub mod kuhn;

/// The capability set the solvers require from a game.
///
/// A value of the implementing type is one concrete game state. States must be
/// cheap to clone: the recursions clone once per explored action. All actions,
/// including chance outcomes, are dense ids in `[0, action_count())`.
pub trait Game: Clone + std::fmt::Debug {
    fn name() -> &'static str;

    fn player_count() -> usize;

    /// Returns to a fresh root. With `skip_chance == false` the chance player
    /// is left to act; with `skip_chance == true` a concrete deal is sampled
    /// from `rng` and the first player is to act.
    fn reset<R: Rng>(&mut self, rng: &mut R, skip_chance: bool);

    fn is_terminal(&self) -> bool;

    fn is_chance(&self) -> bool;

    /// The acting player. Unspecified at terminal states.
    fn current_player(&self) -> usize;

    /// Number of legal actions; at chance nodes, the number of enumerable
    /// chance outcomes.
    fn action_count(&self) -> usize;

    /// Advances this state by `action`. At a chance node the action selects a
    /// concrete chance outcome.
    fn apply_action(&mut self, action: usize);

    /// Probability of the chance outcome that produced this state. Only
    /// defined immediately after an `apply_action` from a chance node.
    fn chance_probability(&self) -> f64;

    /// Payoff for `player`. Only defined when `is_terminal()`.
    fn payoff(&self, player: usize) -> f64;

    /// Identifier of the acting player's information set. Two states map to
    /// the same key if and only if that player cannot distinguish them. The
    /// bytes are opaque to the solver.
    fn info_set_key(&self) -> Vec<u8>;
}
