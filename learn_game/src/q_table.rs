use crate::board::StateKey;
use crate::config::Hyperparameters;
use crate::error::GameError;
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::{prelude::SliceRandom, Rng, SeedableRng};
use std::collections::HashMap;
use std::ops::Deref;

/// Value of any (state, action) pair the table has never stored.
pub const DEFAULT_VALUE: f64 = 0.0;

/// Action values of a single state, keyed by cell index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Moves {
    moves: HashMap<usize, f64>,
}

/// Tabular action-value function: state -> action -> estimated return.
///
/// Reads never insert. The table only grows through [`QTable::set`], so its
/// size is exactly the number of states that have been updated.
#[derive(Clone, Debug, Default)]
pub struct QTable {
    qtable: HashMap<StateKey, Moves>,
}

impl Deref for Moves {
    type Target = HashMap<usize, f64>;
    fn deref(&self) -> &<Self as Deref>::Target {
        &self.moves
    }
}

impl Deref for QTable {
    type Target = HashMap<StateKey, Moves>;
    fn deref(&self) -> &<Self as Deref>::Target {
        &self.qtable
    }
}

impl Moves {
    pub fn value(&self, action: usize) -> f64 {
        self.moves.get(&action).copied().unwrap_or(DEFAULT_VALUE)
    }

    /// Highest value among `legal`, or `None` when `legal` is empty.
    pub fn max_value(&self, legal: &[usize]) -> Option<f64> {
        legal
            .iter()
            .map(|&action| self.value(action))
            .max_by(|value1, value2| value1.total_cmp(value2))
    }

    /// Every action of `legal` sharing the highest value, in the order given.
    pub fn best_actions(&self, legal: &[usize]) -> Vec<usize> {
        legal
            .iter()
            .copied()
            .max_set_by(|&action1, &action2| self.value(action1).total_cmp(&self.value(action2)))
    }
}

impl QTable {
    pub fn new() -> Self {
        QTable {
            qtable: HashMap::with_capacity(5_000),
        }
    }

    pub fn value(&self, state: &StateKey, action: usize) -> f64 {
        self.qtable
            .get(state)
            .map_or(DEFAULT_VALUE, |moves| moves.value(action))
    }

    pub fn moves(&self, state: &StateKey) -> Option<&Moves> {
        self.qtable.get(state)
    }

    pub fn set(&mut self, state: StateKey, action: usize, value: f64) {
        self.qtable.entry(state).or_default().moves.insert(action, value);
    }

    /// Highest value over `legal` in `state`; `None` when `legal` is empty.
    pub fn max_value(&self, state: &StateKey, legal: &[usize]) -> Option<f64> {
        match self.qtable.get(state) {
            Some(moves) => moves.max_value(legal),
            None if legal.is_empty() => None,
            None => Some(DEFAULT_VALUE),
        }
    }

    pub fn best_actions(&self, state: &StateKey, legal: &[usize]) -> Vec<usize> {
        match self.qtable.get(state) {
            Some(moves) => moves.best_actions(legal),
            None => legal.to_vec(),
        }
    }

    /// Epsilon-greedy selection: a uniformly random legal action with
    /// probability `epsilon`, otherwise a uniformly random one among the best.
    pub fn epsilon_greedy<R: Rng>(
        &self,
        state: &StateKey,
        legal: &[usize],
        epsilon: f64,
        rng: &mut R,
    ) -> Result<usize, GameError> {
        if rng.gen::<f64>() < epsilon {
            return legal.choose(rng).copied().ok_or(GameError::NoLegalActions);
        }
        self.best_actions(state, legal)
            .choose(rng)
            .copied()
            .ok_or(GameError::NoLegalActions)
    }

    /// Total number of stored (state, action) pairs.
    pub fn num_entries(&self) -> usize {
        self.qtable.values().map(|moves| moves.len()).sum()
    }
}

/// Tabular Q-learning agent. Owns its table and its random generator.
#[derive(Debug, Clone)]
pub struct QLearningAgent {
    q: QTable,
    pub alpha: f64,
    pub gamma: f64,
    pub epsilon: f64,
    rng: StdRng,
}

impl QLearningAgent {
    pub fn new(hyperparameters: Hyperparameters) -> Self {
        Self::with_rng(hyperparameters, StdRng::from_entropy())
    }

    pub fn with_seed(hyperparameters: Hyperparameters, seed: u64) -> Self {
        Self::with_rng(hyperparameters, StdRng::seed_from_u64(seed))
    }

    fn with_rng(hyperparameters: Hyperparameters, rng: StdRng) -> Self {
        QLearningAgent {
            q: QTable::new(),
            alpha: hyperparameters.alpha,
            gamma: hyperparameters.gamma,
            epsilon: hyperparameters.epsilon,
            rng,
        }
    }

    pub fn hyperparameters(&self) -> Hyperparameters {
        Hyperparameters {
            alpha: self.alpha,
            gamma: self.gamma,
            epsilon: self.epsilon,
        }
    }

    pub fn q_table(&self) -> &QTable {
        &self.q
    }

    pub fn choose_action(
        &mut self,
        state: &StateKey,
        legal: &[usize],
        epsilon: f64,
    ) -> Result<usize, GameError> {
        self.q.epsilon_greedy(state, legal, epsilon, &mut self.rng)
    }

    /// One-step Q-learning update. An empty `next_legal` marks a terminal
    /// transition, where the target is the reward alone.
    ///
    /// Returns the new value of `(state, action)`.
    pub fn update(
        &mut self,
        state: StateKey,
        action: usize,
        reward: f64,
        next_state: &StateKey,
        next_legal: &[usize],
    ) -> f64 {
        let current = self.q.value(&state, action);
        let target = match self.q.max_value(next_state, next_legal) {
            Some(next_max) => reward + self.gamma * next_max,
            None => reward,
        };
        let updated = current + self.alpha * (target - current);
        self.q.set(state, action, updated);
        updated
    }
}
