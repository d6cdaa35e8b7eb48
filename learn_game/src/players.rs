use crate::board::{GameState, Mark, StateKey};
use crate::error::GameError;
use crate::q_table::QLearningAgent;
use rand::prelude::SliceRandom;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

/// Anything that can pick a move for a given side of a game.
pub trait Player {
    fn get_name(&self) -> &str;
    fn choose_move(&mut self, state: &GameState, mark: Mark) -> Result<usize, GameError>;
}

impl<P: Player + ?Sized> Player for &mut P {
    fn get_name(&self) -> &str {
        (**self).get_name()
    }
    fn choose_move(&mut self, state: &GameState, mark: Mark) -> Result<usize, GameError> {
        (**self).choose_move(state, mark)
    }
}

/// Plays uniformly at random among the legal moves.
#[derive(Debug)]
pub struct RandomPlayer {
    pub name: String,
    rng: StdRng,
}

impl RandomPlayer {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
    fn with_rng(rng: StdRng) -> Self {
        RandomPlayer {
            name: "random".to_owned(),
            rng,
        }
    }
}

impl Default for RandomPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Player for RandomPlayer {
    fn get_name(&self) -> &str {
        &self.name
    }
    fn choose_move(&mut self, state: &GameState, _mark: Mark) -> Result<usize, GameError> {
        if state.is_done() {
            return Err(GameError::GameOver);
        }
        state
            .legal_actions()
            .choose(&mut self.rng)
            .copied()
            .ok_or(GameError::NoLegalActions)
    }
}

const WIN_SCORE: i32 = 10;

/// Exhaustive minimax search, optionally with alpha-beta pruning.
///
/// Ties between equally scored moves go to the lowest cell index. With
/// `depth_sensitive` set, wins score `10 - depth` and losses `depth - 10`,
/// so faster wins and slower losses are preferred.
#[derive(Debug)]
pub struct MinimaxPlayer {
    pub name: String,
    pruning: bool,
    depth_sensitive: bool,
    cache: HashMap<(StateKey, Mark), usize>,
}

impl Default for MinimaxPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl MinimaxPlayer {
    pub fn new() -> Self {
        Self::with_options(true, true)
    }

    pub fn with_options(pruning: bool, depth_sensitive: bool) -> Self {
        MinimaxPlayer {
            name: "minimax".to_owned(),
            pruning,
            depth_sensitive,
            cache: HashMap::new(),
        }
    }

    pub fn pruning(&self) -> bool {
        self.pruning
    }

    pub fn depth_sensitive(&self) -> bool {
        self.depth_sensitive
    }

    /// Best move for `agent` in `state`, assuming the opponent plays optimally.
    pub fn select_move(&self, state: &GameState, agent: Mark) -> Result<usize, GameError> {
        if state.is_done() {
            return Err(GameError::GameOver);
        }
        if !agent.is_player() {
            return Err(GameError::NotAPlayer(agent));
        }
        let mut best: Option<(usize, i32)> = None;
        let mut alpha = i32::MIN;
        for mv in state.legal_actions() {
            let mut next = state.clone();
            next.apply_move(mv, agent)?;
            let score = self.minimax(&next, agent, 0, false, alpha, i32::MAX)?;
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((mv, score));
                alpha = score;
            }
        }
        let (mv, score) = best.ok_or(GameError::NoLegalActions)?;
        log::trace!("minimax picked {} for {:?} with score {}", mv, agent, score);
        Ok(mv)
    }

    fn minimax(
        &self,
        state: &GameState,
        agent: Mark,
        depth: i32,
        is_max: bool,
        mut alpha: i32,
        mut beta: i32,
    ) -> Result<i32, GameError> {
        if state.is_done() {
            return Ok(self.score(state.winner(), agent, depth));
        }
        let mover = if is_max { agent } else { agent.other() };
        let mut best = if is_max { i32::MIN } else { i32::MAX };
        for mv in state.legal_actions() {
            let mut next = state.clone();
            next.apply_move(mv, mover)?;
            let value = self.minimax(&next, agent, depth + 1, !is_max, alpha, beta)?;
            if is_max {
                best = best.max(value);
                alpha = alpha.max(best);
            } else {
                best = best.min(value);
                beta = beta.min(best);
            }
            if self.pruning && beta <= alpha {
                break;
            }
        }
        Ok(best)
    }

    fn score(&self, winner: Mark, agent: Mark, depth: i32) -> i32 {
        if winner == agent {
            if self.depth_sensitive {
                WIN_SCORE - depth
            } else {
                1
            }
        } else if winner == agent.other() {
            if self.depth_sensitive {
                depth - WIN_SCORE
            } else {
                -1
            }
        } else {
            0
        }
    }
}

impl Player for MinimaxPlayer {
    fn get_name(&self) -> &str {
        &self.name
    }
    fn choose_move(&mut self, state: &GameState, mark: Mark) -> Result<usize, GameError> {
        let key = (state.state_key(), mark);
        if let Some(&mv) = self.cache.get(&key) {
            if !state.is_done() {
                return Ok(mv);
            }
        }
        let mv = self.select_move(state, mark)?;
        self.cache.insert(key, mv);
        Ok(mv)
    }
}

/// A trained agent playing without learning. Holds the agent by shared
/// reference, so its table cannot change while it plays.
#[derive(Debug)]
pub struct QLearningPlayer<'a> {
    pub name: String,
    agent: &'a QLearningAgent,
    epsilon: f64,
    rng: StdRng,
}

impl<'a> QLearningPlayer<'a> {
    pub fn new(agent: &'a QLearningAgent, epsilon: f64) -> Self {
        Self::with_rng(agent, epsilon, StdRng::from_entropy())
    }
    pub fn with_seed(agent: &'a QLearningAgent, epsilon: f64, seed: u64) -> Self {
        Self::with_rng(agent, epsilon, StdRng::seed_from_u64(seed))
    }
    fn with_rng(agent: &'a QLearningAgent, epsilon: f64, rng: StdRng) -> Self {
        QLearningPlayer {
            name: "q-learning".to_owned(),
            agent,
            epsilon,
            rng,
        }
    }
}

impl Player for QLearningPlayer<'_> {
    fn get_name(&self) -> &str {
        &self.name
    }
    fn choose_move(&mut self, state: &GameState, _mark: Mark) -> Result<usize, GameError> {
        if state.is_done() {
            return Err(GameError::GameOver);
        }
        self.agent.q_table().epsilon_greedy(
            &state.state_key(),
            &state.legal_actions(),
            self.epsilon,
            &mut self.rng,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::config::Hyperparameters;
    use proptest::prelude::*;

    fn state_from(cells: [i8; 9]) -> GameState {
        GameState::from_board(Board::from_cells(cells).unwrap())
    }

    fn all_variants() -> Vec<MinimaxPlayer> {
        vec![
            MinimaxPlayer::with_options(true, true),
            MinimaxPlayer::with_options(true, false),
            MinimaxPlayer::with_options(false, true),
            MinimaxPlayer::with_options(false, false),
        ]
    }

    #[test]
    fn minimax_blocks_the_only_threat() {
        // O O .
        // . . X
        // . X .
        let state = state_from([-1, -1, 0, 0, 0, 1, 0, 1, 0]);
        for player in all_variants() {
            assert_eq!(player.select_move(&state, Mark::Cross), Ok(2));
        }
    }

    #[test]
    fn depth_sensitivity_prefers_the_fastest_win() {
        // O O .
        // X X .
        // . . .
        // Playing 2 also wins by force, but only two plies later.
        let state = state_from([-1, -1, 0, 1, 1, 0, 0, 0, 0]);
        let fast = MinimaxPlayer::with_options(true, true);
        let plain = MinimaxPlayer::with_options(true, false);
        assert_eq!(fast.select_move(&state, Mark::Cross), Ok(5));
        assert_eq!(plain.select_move(&state, Mark::Cross), Ok(2));
        assert_eq!(
            MinimaxPlayer::with_options(false, false).select_move(&state, Mark::Cross),
            Ok(2)
        );
    }

    #[test]
    fn empty_board_opens_in_the_corner() {
        // every opening draws, so the first one found wins the tie
        let state = GameState::new();
        assert_eq!(MinimaxPlayer::new().select_move(&state, Mark::Cross), Ok(0));
        assert_eq!(
            MinimaxPlayer::with_options(true, false).select_move(&state, Mark::Cross),
            Ok(0)
        );
    }

    #[test]
    fn search_rejects_finished_games_and_empty_marks() {
        let won = state_from([1, 1, 1, -1, -1, 0, 0, 0, 0]);
        let player = MinimaxPlayer::new();
        assert_eq!(player.select_move(&won, Mark::Nought), Err(GameError::GameOver));
        assert_eq!(
            player.select_move(&GameState::new(), Mark::Empty),
            Err(GameError::NotAPlayer(Mark::Empty))
        );
    }

    #[test]
    fn minimax_self_play_draws() {
        let mut cross = MinimaxPlayer::new();
        let mut nought = MinimaxPlayer::with_options(true, false);
        let mut state = GameState::new();
        let mut mark = Mark::Cross;
        while !state.is_done() {
            let mv = if mark == Mark::Cross {
                cross.choose_move(&state, mark).unwrap()
            } else {
                nought.choose_move(&state, mark).unwrap()
            };
            state.apply_move(mv, mark).unwrap();
            mark = mark.other();
        }
        assert_eq!(state.winner(), Mark::Empty);
    }

    #[test]
    fn cached_answers_match_fresh_search() {
        let state = state_from([1, 0, 0, 0, -1, 0, 0, 0, 0]);
        let mut player = MinimaxPlayer::new();
        let first = player.choose_move(&state, Mark::Cross).unwrap();
        let second = player.choose_move(&state, Mark::Cross).unwrap();
        assert_eq!(first, second);
        assert_eq!(player.select_move(&state, Mark::Cross), Ok(first));
    }

    #[test]
    fn random_player_only_plays_legal_moves() {
        let state = state_from([1, -1, 1, 0, -1, 0, 1, 0, -1]);
        let mut player = RandomPlayer::with_seed(3);
        for _ in 0..50 {
            let mv = player.choose_move(&state, Mark::Cross).unwrap();
            assert!(state.legal_actions().contains(&mv));
        }
        let done = state_from([1, 1, 1, -1, -1, 0, 0, 0, 0]);
        assert_eq!(player.choose_move(&done, Mark::Nought), Err(GameError::GameOver));
    }

    #[test]
    fn q_learning_player_follows_the_table() {
        let mut agent = QLearningAgent::with_seed(Hyperparameters::default(), 5);
        let start = GameState::new().state_key();
        let next = state_from([0, 0, 0, 0, 1, 0, 0, 0, 0]).state_key();
        agent.update(start, 4, 1.0, &next, &[]);

        let mut player = QLearningPlayer::with_seed(&agent, 0.0, 9);
        for _ in 0..10 {
            assert_eq!(player.choose_move(&GameState::new(), Mark::Cross), Ok(4));
        }
        assert_eq!(agent.q_table().len(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn pruning_never_changes_the_move(picks in prop::collection::vec(0usize..9, 2..7)) {
            let mut state = GameState::new();
            let mut mark = Mark::Cross;
            for pick in picks {
                if state.is_done() {
                    break;
                }
                let legal = state.legal_actions();
                state.apply_move(legal[pick % legal.len()], mark).unwrap();
                mark = mark.other();
            }
            prop_assume!(!state.is_done());
            for depth_sensitive in [true, false] {
                let pruned = MinimaxPlayer::with_options(true, depth_sensitive);
                let plain = MinimaxPlayer::with_options(false, depth_sensitive);
                prop_assert_eq!(
                    pruned.select_move(&state, mark),
                    plain.select_move(&state, mark)
                );
            }
        }

        #[test]
        fn legal_actions_match_empty_cells(picks in prop::collection::vec(0usize..9, 0..9)) {
            let mut state = GameState::new();
            let mut mark = Mark::Cross;
            for pick in picks {
                if state.is_done() {
                    break;
                }
                let legal = state.legal_actions();
                state.apply_move(legal[pick % legal.len()], mark).unwrap();
                mark = mark.other();
            }
            let expected: Vec<usize> = (0..9)
                .filter(|&index| state.board().get(index) == Some(Mark::Empty))
                .collect();
            prop_assert_eq!(state.legal_actions(), expected);
        }
    }
}
