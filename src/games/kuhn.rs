use rand::{
    seq::SliceRandom,
    Rng,
};

use super::Game;

pub const NUM_PLAYERS: usize = 2;
const NUM_CARDS: usize = NUM_PLAYERS + 1;
const CHANCE_ACTION_COUNT: usize = factorial(NUM_CARDS);
// Longest possible line: everyone checks up to the last player, who bets,
// then everyone else responds.
const MAX_TURNS: usize = 2 * NUM_PLAYERS;
const CHANCE_PLAYER: usize = NUM_PLAYERS + 1;

pub const PASS: usize = 0;
pub const BET: usize = 1;
const ACTION_COUNT: usize = 2;

const fn factorial(n: usize) -> usize {
    let mut product = 1;
    let mut i = 2;
    while i <= n {
        product *= i;
        i += 1;
    }
    product
}

fn argmax(values: &[i32]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// Kuhn Poker with `NUM_PLAYERS` players and `NUM_PLAYERS + 1` cards.
///
/// Each player antes 1 chip and is dealt one card. A single betting round of
/// fixed size 1 follows; the best card among the players still in takes the
/// pot. A chance action id encodes a full deal as a permutation index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Kuhn {
    cards: [u8; NUM_CARDS],
    // Public betting history; entry `t` is the action taken on turn `t`,
    // turns start at 1.
    actions: [u8; MAX_TURNS],
    payoffs: [i32; NUM_PLAYERS],
    current_player: usize,
    turn: usize,
    // Turn of the first bet; 0 while nobody has bet.
    first_bet_turn: usize,
    bet_count: usize,
    over: bool,
    chance_denominator: usize,
}

impl Kuhn {
    pub fn new() -> Self {
        Kuhn {
            cards: std::array::from_fn(|i| i as u8),
            actions: [0; MAX_TURNS],
            payoffs: [0; NUM_PLAYERS],
            current_player: CHANCE_PLAYER,
            turn: 0,
            first_bet_turn: 0,
            bet_count: 0,
            over: false,
            chance_denominator: 0,
        }
    }

    fn start_play(&mut self) {
        self.turn = 0;
        self.current_player = 0;
        self.first_bet_turn = 0;
        self.bet_count = 0;
        self.over = false;
        self.payoffs = [0; NUM_PLAYERS];
    }

    fn settle(&mut self, player: usize) {
        if self.bet_count == NUM_PLAYERS {
            // Everyone bet: showdown for the full pot.
            let in_play: Vec<i32> = self.cards[..NUM_PLAYERS].iter().map(|c| *c as i32).collect();
            let winner = argmax(&in_play);
            self.payoffs = [-2; NUM_PLAYERS];
            self.payoffs[winner] = 2 * (NUM_PLAYERS as i32 - 1);
            self.over = true;
            return;
        }

        let terminal_pass = (self.first_bet_turn != 0
            && self.turn - self.first_bet_turn == NUM_PLAYERS - 1)
            || (self.turn == NUM_PLAYERS
                && self.first_bet_turn == 0
                && self.actions[self.turn] == PASS as u8);
        if !terminal_pass {
            return;
        }

        if self.bet_count == 0 {
            // Everyone passed: showdown for the antes.
            let in_play: Vec<i32> = self.cards[..NUM_PLAYERS].iter().map(|c| *c as i32).collect();
            let winner = argmax(&in_play);
            self.payoffs = [-1; NUM_PLAYERS];
            self.payoffs[winner] = NUM_PLAYERS as i32 - 1;
        } else if self.bet_count == 1 {
            // A single bet folded everyone else out; `player` is the bettor.
            self.payoffs = [-1; NUM_PLAYERS];
            self.payoffs[player] = NUM_PLAYERS as i32 - 1;
        } else {
            // Several bettors: showdown among them, the rest lose an ante.
            let mut cards = [-1i32; NUM_PLAYERS];
            let mut is_bet = [false; NUM_PLAYERS];
            for t in 0..self.turn {
                if self.actions[t + 1] == BET as u8 {
                    cards[t % NUM_PLAYERS] = self.cards[t % NUM_PLAYERS] as i32;
                    is_bet[t % NUM_PLAYERS] = true;
                }
            }
            let winner = argmax(&cards);
            self.payoffs[winner] =
                2 * (self.bet_count as i32 - 1) + (NUM_PLAYERS - self.bet_count) as i32;
            for i in 0..NUM_PLAYERS {
                if !is_bet[i] {
                    self.payoffs[i] = -1;
                } else if i != winner {
                    self.payoffs[i] = -2;
                }
            }
        }
        self.over = true;
    }
}

impl Default for Kuhn {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for Kuhn {
    fn name() -> &'static str {
        "kuhn"
    }

    #[inline]
    fn player_count() -> usize {
        NUM_PLAYERS
    }

    fn reset<R: Rng>(&mut self, rng: &mut R, skip_chance: bool) {
        if !skip_chance {
            self.current_player = CHANCE_PLAYER;
            return;
        }
        self.cards = std::array::from_fn(|i| i as u8);
        self.cards.shuffle(rng);
        self.start_play();
    }

    #[inline]
    fn is_terminal(&self) -> bool {
        self.over
    }

    #[inline]
    fn is_chance(&self) -> bool {
        self.current_player == CHANCE_PLAYER
    }

    #[inline]
    fn current_player(&self) -> usize {
        self.current_player
    }

    #[inline]
    fn action_count(&self) -> usize {
        if self.is_chance() {
            CHANCE_ACTION_COUNT
        } else {
            ACTION_COUNT
        }
    }

    fn apply_action(&mut self, action: usize) {
        if self.current_player == CHANCE_PLAYER {
            debug_assert!(action < CHANCE_ACTION_COUNT);
            // Decode the permutation id with a factorial-base Fisher-Yates.
            self.cards = std::array::from_fn(|i| i as u8);
            let mut a = action;
            for c1 in (1..NUM_CARDS).rev() {
                let c2 = a % (c1 + 1);
                self.cards.swap(c1, c2);
                a /= c1 + 1;
            }
            self.chance_denominator = CHANCE_ACTION_COUNT;
            self.start_play();
            return;
        }

        debug_assert!(action < ACTION_COUNT);
        debug_assert!(!self.over);
        self.turn += 1;
        self.bet_count += action;
        self.actions[self.turn] = action as u8;
        if self.first_bet_turn == 0 && action == BET {
            self.first_bet_turn = self.turn;
        }

        let player = self.turn % NUM_PLAYERS;
        if self.turn > 1 {
            self.settle(player);
        }
        self.current_player = player;
    }

    #[inline]
    fn chance_probability(&self) -> f64 {
        debug_assert!(self.chance_denominator != 0);
        1.0 / self.chance_denominator as f64
    }

    fn payoff(&self, player: usize) -> f64 {
        debug_assert!(self.over);
        self.payoffs[player] as f64
    }

    fn info_set_key(&self) -> Vec<u8> {
        let mut key = Vec::with_capacity(self.turn + 1);
        key.push(self.cards[self.current_player]);
        key.extend_from_slice(&self.actions[1..=self.turn]);
        key
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use wyhash::WyRng;

    use super::*;

    fn deal(cards: [u8; NUM_CARDS]) -> Kuhn {
        for a in 0..CHANCE_ACTION_COUNT {
            let mut game = Kuhn::new();
            game.apply_action(a);
            if game.cards == cards {
                return game;
            }
        }
        panic!("no chance action deals {:?}", cards);
    }

    fn play(mut game: Kuhn, line: &[usize]) -> Kuhn {
        for act in line {
            game.apply_action(*act);
        }
        game
    }

    #[test]
    fn fresh_game_is_a_chance_node() {
        let game = Kuhn::new();
        assert!(game.is_chance());
        assert!(!game.is_terminal());
        assert_eq!(CHANCE_ACTION_COUNT, game.action_count());
    }

    #[test]
    fn chance_actions_enumerate_every_deal() {
        let mut deals = std::collections::HashSet::new();
        for a in 0..CHANCE_ACTION_COUNT {
            let mut game = Kuhn::new();
            game.apply_action(a);
            assert!(!game.is_chance());
            assert_eq!(0, game.current_player());
            assert!((game.chance_probability() - 1.0 / 6.0).abs() < 1e-12);
            deals.insert(game.cards);
        }
        assert_eq!(CHANCE_ACTION_COUNT, deals.len());
    }

    #[test]
    fn reset_with_skip_deals_a_permutation() {
        let mut rng = WyRng::seed_from_u64(7);
        let mut game = Kuhn::new();
        game.reset(&mut rng, true);
        assert_eq!(0, game.current_player());
        let mut sorted = game.cards;
        sorted.sort();
        assert_eq!([0, 1, 2], sorted);
    }

    #[test]
    fn both_pass_goes_to_showdown_for_antes() {
        let game = play(deal([2, 0, 1]), &[PASS, PASS]);
        assert!(game.is_terminal());
        assert_eq!(1.0, game.payoff(0));
        assert_eq!(-1.0, game.payoff(1));
    }

    #[test]
    fn both_bet_goes_to_showdown_for_full_pot() {
        let game = play(deal([0, 2, 1]), &[BET, BET]);
        assert!(game.is_terminal());
        assert_eq!(-2.0, game.payoff(0));
        assert_eq!(2.0, game.payoff(1));
    }

    #[test]
    fn bet_then_pass_folds_the_opponent_out() {
        // Holding the worst card wins by betting when the opponent folds.
        let game = play(deal([0, 2, 1]), &[BET, PASS]);
        assert!(game.is_terminal());
        assert_eq!(1.0, game.payoff(0));
        assert_eq!(-1.0, game.payoff(1));
    }

    #[test]
    fn pass_bet_reopens_the_action() {
        let game = play(deal([2, 1, 0]), &[PASS, BET]);
        assert!(!game.is_terminal());
        assert_eq!(0, game.current_player());

        let folded = play(game.clone(), &[PASS]);
        assert!(folded.is_terminal());
        assert_eq!(-1.0, folded.payoff(0));
        assert_eq!(1.0, folded.payoff(1));

        let called = play(game, &[BET]);
        assert!(called.is_terminal());
        assert_eq!(2.0, called.payoff(0));
        assert_eq!(-2.0, called.payoff(1));
    }

    #[test]
    fn info_set_key_hides_the_opponent_card() {
        let a = deal([1, 0, 2]);
        let b = deal([1, 2, 0]);
        assert_eq!(a.info_set_key(), b.info_set_key());
        assert_eq!(vec![1], a.info_set_key());

        let a = play(a, &[PASS]);
        let b = play(b, &[PASS]);
        assert_ne!(a.info_set_key(), b.info_set_key());
        assert_eq!(vec![0, PASS as u8], a.info_set_key());
        assert_eq!(vec![2, PASS as u8], b.info_set_key());
    }

    #[test]
    fn payoffs_are_zero_sum_on_every_line() {
        for a in 0..CHANCE_ACTION_COUNT {
            for line in
                [[PASS, PASS].as_slice(), &[PASS, BET, PASS], &[PASS, BET, BET], &[BET, PASS], &[BET, BET]]
            {
                let mut game = Kuhn::new();
                game.apply_action(a);
                let game = play(game, line);
                assert!(game.is_terminal(), "line {:?} should end the game", line);
                let total: f64 = (0..NUM_PLAYERS).map(|p| game.payoff(p)).sum();
                assert_eq!(0.0, total);
            }
        }
    }
}
