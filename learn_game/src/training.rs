use crate::board::{GameState, Mark};
use crate::config::{EvaluationConfig, TrainingConfig};
use crate::error::GameError;
use crate::players::{Player, QLearningPlayer, RandomPlayer};
use crate::q_table::QLearningAgent;
use crate::{Game, OutcomeStats};

/// Reward handed to the learner once a game is over.
pub fn terminal_reward(winner: Mark, me: Mark, draw_reward: f64) -> f64 {
    if winner == Mark::Empty {
        draw_reward
    } else if winner == me {
        1.0
    } else {
        -1.0
    }
}

fn random_opponent(seed: Option<u64>) -> RandomPlayer {
    match seed {
        Some(seed) => RandomPlayer::with_seed(seed.wrapping_add(1)),
        None => RandomPlayer::new(),
    }
}

/// Trains a fresh agent for `config.episodes` episodes against `opponent`.
pub fn train(
    config: &TrainingConfig,
    opponent: &mut dyn Player,
) -> Result<(QLearningAgent, OutcomeStats), GameError> {
    let mut agent = match config.seed {
        Some(seed) => QLearningAgent::with_seed(config.hyperparameters, seed),
        None => QLearningAgent::new(config.hyperparameters),
    };
    let mut state = GameState::new();
    let mut stats = OutcomeStats::default();
    for episode in 0..config.episodes {
        let winner = learn_episode(&mut agent, opponent, &mut state, config)?;
        stats.record(winner, config.agent_mark);
        agent.epsilon = config.epsilon_min.max(agent.epsilon * config.epsilon_decay);
        if config.log_every > 0 && (episode + 1) % config.log_every == 0 {
            log::info!(
                "Episode {}/{} vs {} | W:{} L:{} D:{} | epsilon={:.3}",
                episode + 1,
                config.episodes,
                opponent.get_name(),
                stats.wins,
                stats.losses,
                stats.draws,
                agent.epsilon
            );
        }
    }
    log::info!(
        "training finished, Q-table holds {} states",
        agent.q_table().len()
    );
    Ok((agent, stats))
}

pub fn train_vs_random(config: &TrainingConfig) -> Result<(QLearningAgent, OutcomeStats), GameError> {
    let mut opponent = random_opponent(config.seed);
    train(config, &mut opponent)
}

/// Plays one training game and returns its winner.
///
/// The agent is updated once per own move. When the opponent still has to
/// reply, the update waits for that reply and bootstraps from the position
/// the agent faces next.
pub fn learn_episode(
    agent: &mut QLearningAgent,
    opponent: &mut dyn Player,
    state: &mut GameState,
    config: &TrainingConfig,
) -> Result<Mark, GameError> {
    let me = config.agent_mark;
    if !me.is_player() {
        return Err(GameError::NotAPlayer(me));
    }
    let rival = me.other();
    state.reset();
    if rival == Mark::Cross {
        let opening = opponent.choose_move(state, rival)?;
        state.apply_move(opening, rival)?;
    }
    loop {
        let current_state_key = state.state_key();
        let epsilon = agent.epsilon;
        let action = agent.choose_action(&current_state_key, &state.legal_actions(), epsilon)?;

        let outcome = state.apply_move(action, me)?;
        if outcome.done {
            let reward = terminal_reward(state.winner(), me, config.draw_reward);
            agent.update(current_state_key, action, reward, &outcome.state, &[]);
            break;
        }

        let reply = opponent.choose_move(state, rival)?;
        let outcome = state.apply_move(reply, rival)?;
        if outcome.done {
            let reward = terminal_reward(state.winner(), me, config.draw_reward);
            agent.update(current_state_key, action, reward, &outcome.state, &[]);
            break;
        }
        agent.update(
            current_state_key,
            action,
            0.0,
            &outcome.state,
            &state.legal_actions(),
        );
    }
    Ok(state.winner())
}

/// Plays `config.games` games with a frozen agent and counts the results.
pub fn evaluate(
    agent: &QLearningAgent,
    opponent: &mut dyn Player,
    config: &EvaluationConfig,
) -> Result<OutcomeStats, GameError> {
    let me = config.agent_mark;
    if !me.is_player() {
        return Err(GameError::NotAPlayer(me));
    }
    let mut player = match config.seed {
        Some(seed) => QLearningPlayer::with_seed(agent, config.epsilon, seed),
        None => QLearningPlayer::new(agent, config.epsilon),
    };
    let mut stats = OutcomeStats::default();
    for _ in 0..config.games {
        let mut game = if me == Mark::Cross {
            Game::new(Box::new(&mut player), Box::new(&mut *opponent))
        } else {
            Game::new(Box::new(&mut *opponent), Box::new(&mut player))
        };
        let winner = game.play()?;
        stats.record(winner, me);
    }
    log::debug!(
        "evaluation vs {} over {} games: {}",
        opponent.get_name(),
        config.games,
        stats
    );
    Ok(stats)
}

pub fn evaluate_vs_random(
    agent: &QLearningAgent,
    config: &EvaluationConfig,
) -> Result<OutcomeStats, GameError> {
    let mut opponent = random_opponent(config.seed);
    evaluate(agent, &mut opponent, config)
}
