use std::collections::HashMap;

use more_asserts::{
    debug_assert_ge,
    debug_assert_gt,
};

/// Per-information-set regret and strategy accumulators.
///
/// `strategy()` never rederives on its own: the vanilla and chance-sampling
/// recursions read a strategy that is only refreshed in a batch at the end of
/// each outer iteration, while the external- and outcome-sampling recursions
/// call `refresh_strategy()` on entry to every visited node.
pub struct Node {
    regret_sum: Vec<f64>,
    current_strategy: Vec<f64>,
    strategy_sum: Vec<f64>,
    average_strategy: Vec<f64>,
    strategy_dirty: bool,
    average_dirty: bool,
}

impl Node {
    pub fn new(action_count: usize) -> Self {
        debug_assert_gt!(action_count, 0);
        Node {
            regret_sum: vec![0.0; action_count],
            current_strategy: vec![1.0 / action_count as f64; action_count],
            strategy_sum: vec![0.0; action_count],
            average_strategy: vec![0.0; action_count],
            strategy_dirty: false,
            average_dirty: true,
        }
    }

    #[inline]
    pub fn action_count(&self) -> usize {
        self.regret_sum.len()
    }

    #[inline]
    pub fn strategy(&self) -> &[f64] {
        &self.current_strategy
    }

    /// Regret matching: the current strategy becomes the normalized positive
    /// part of the cumulative regrets, or uniform when no regret is positive.
    pub fn refresh_strategy(&mut self) {
        if !self.strategy_dirty {
            return;
        }
        let mut normalizing_sum = 0.0;
        for (s, reg) in self.current_strategy.iter_mut().zip(self.regret_sum.iter()) {
            *s = reg.max(0.0);
            normalizing_sum += *s;
        }
        debug_assert!(normalizing_sum.is_finite());
        if normalizing_sum > 0.0 {
            for s in self.current_strategy.iter_mut() {
                *s /= normalizing_sum;
            }
        } else {
            let uniform = 1.0 / self.action_count() as f64;
            self.current_strategy.fill(uniform);
        }
        self.strategy_dirty = false;
    }

    pub fn accumulate_strategy(&mut self, strategy: &[f64], weight: f64) {
        debug_assert_ge!(weight, 0.0);
        for (sum, s) in self.strategy_sum.iter_mut().zip(strategy.iter()) {
            *sum += weight * s;
        }
        self.average_dirty = true;
    }

    pub fn average_strategy(&mut self) -> &[f64] {
        if self.average_dirty {
            let normalizing_sum: f64 = self.strategy_sum.iter().sum();
            if normalizing_sum > 0.0 {
                for (avg, sum) in self.average_strategy.iter_mut().zip(self.strategy_sum.iter()) {
                    *avg = sum / normalizing_sum;
                }
            } else {
                let uniform = 1.0 / self.action_count() as f64;
                self.average_strategy.fill(uniform);
            }
            self.average_dirty = false;
        }
        &self.average_strategy
    }

    #[inline]
    pub fn add_regret(&mut self, action: usize, delta: f64) {
        self.regret_sum[action] += delta;
        self.strategy_dirty = true;
    }

    #[inline]
    pub fn regret(&self, action: usize) -> f64 {
        self.regret_sum[action]
    }

    #[inline]
    pub fn strategy_sums(&self) -> &[f64] {
        &self.strategy_sum
    }
}

/// Owning map from info-set key to its [`Node`], created lazily on first
/// visit. Keys are raw bytes compared and hashed byte-wise.
#[derive(Default)]
pub struct NodeMap {
    nodes: HashMap<Vec<u8>, Node>,
}

impl NodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_mut(&mut self, key: &[u8], action_count: usize) -> &mut Node {
        if !self.nodes.contains_key(key) {
            self.nodes.insert(key.to_vec(), Node::new(action_count));
        }
        self.nodes.get_mut(key).unwrap()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &Node)> {
        self.nodes.iter()
    }

    pub fn refresh_strategies(&mut self) {
        for node in self.nodes.values_mut() {
            node.refresh_strategy();
        }
    }

    /// Extracts the average strategy of every node, the only state that
    /// survives persistence.
    pub fn average_strategies(&mut self) -> HashMap<Vec<u8>, Vec<f64>> {
        self.nodes.iter_mut().map(|(key, node)| (key.clone(), node.average_strategy().to_vec())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(expected: &[f64], actual: &[f64]) {
        assert_eq!(expected.len(), actual.len());
        for (e, a) in expected.iter().zip(actual.iter()) {
            assert!((e - a).abs() < 1e-9, "expected {:?}, got {:?}", expected, actual);
        }
    }

    #[test]
    fn fresh_node_is_uniform() {
        let node = Node::new(3);
        assert_eq!(3, node.action_count());
        assert_close(&[1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0], node.strategy());
    }

    #[test]
    fn positive_regret_takes_the_whole_strategy() {
        let mut node = Node::new(3);
        node.add_regret(0, 1.0);
        node.refresh_strategy();
        assert_close(&[1.0, 0.0, 0.0], node.strategy());
    }

    #[test]
    fn all_non_positive_regrets_fall_back_to_uniform() {
        let mut node = Node::new(3);
        node.add_regret(0, -5.0);
        node.refresh_strategy();
        assert_close(&[1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0], node.strategy());
    }

    #[test]
    fn regret_matching_normalizes_the_positive_part() {
        let mut node = Node::new(3);
        node.add_regret(0, 3.0);
        node.add_regret(1, -1.0);
        node.add_regret(2, 1.0);
        node.refresh_strategy();
        assert_close(&[0.75, 0.0, 0.25], node.strategy());
        assert_eq!(3.0, node.regret(0));
        assert_eq!(-1.0, node.regret(1));
    }

    #[test]
    fn strategy_is_not_rederived_without_refresh() {
        let mut node = Node::new(2);
        node.add_regret(0, 1.0);
        assert_close(&[0.5, 0.5], node.strategy());
        node.refresh_strategy();
        assert_close(&[1.0, 0.0], node.strategy());
        // A second refresh with no new regret is a no-op.
        node.refresh_strategy();
        assert_close(&[1.0, 0.0], node.strategy());
    }

    #[test]
    fn average_strategy_normalizes_accumulated_weight() {
        let mut node = Node::new(2);
        node.accumulate_strategy(&[0.5, 0.5], 2.0);
        node.accumulate_strategy(&[0.5, 0.5], 2.0);
        assert_close(&[0.5, 0.5], node.average_strategy());
    }

    #[test]
    fn average_strategy_of_an_untouched_node_is_uniform() {
        let mut node = Node::new(4);
        assert_close(&[0.25; 4], node.average_strategy());
    }

    #[test]
    fn average_strategy_cache_tracks_new_accumulation() {
        let mut node = Node::new(2);
        node.accumulate_strategy(&[1.0, 0.0], 1.0);
        assert_close(&[1.0, 0.0], node.average_strategy());
        node.accumulate_strategy(&[0.0, 1.0], 3.0);
        assert_close(&[0.25, 0.75], node.average_strategy());
    }

    #[test]
    fn strategy_sums_are_monotone_and_non_negative() {
        let mut node = Node::new(2);
        node.accumulate_strategy(&[0.3, 0.7], 1.0);
        let before = node.strategy_sums().to_vec();
        node.accumulate_strategy(&[0.9, 0.1], 0.5);
        for (b, a) in before.iter().zip(node.strategy_sums().iter()) {
            assert!(*a >= *b);
            assert!(*a >= 0.0);
        }
        // Zero weight accumulates nothing.
        let before = node.strategy_sums().to_vec();
        node.accumulate_strategy(&[1.0, 0.0], 0.0);
        assert_eq!(before, node.strategy_sums());
    }

    #[test]
    fn node_map_creates_nodes_lazily() {
        let mut nodes = NodeMap::new();
        assert!(nodes.is_empty());
        nodes.node_mut(b"a", 2).add_regret(0, 1.0);
        nodes.node_mut(b"a", 2).add_regret(0, 1.0);
        nodes.node_mut(b"b", 3);
        assert_eq!(2, nodes.len());
        assert_eq!(2.0, nodes.node_mut(b"a", 2).regret(0));
        assert_eq!(3, nodes.node_mut(b"b", 3).action_count());
    }
}
