use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use learn_game::board::Mark;
use learn_game::config::{EvaluationConfig, TrainingConfig};
use learn_game::players::{MinimaxPlayer, Player, RandomPlayer};
use learn_game::{evaluate_vs_random, train, Game};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about = "Tic-tac-toe with minimax search and tabular Q-learning")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train a Q-learning agent, then evaluate it against a random opponent.
    Train {
        /// JSON file with a training configuration.
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        episodes: Option<usize>,
        #[arg(long, value_enum, default_value_t = Opponent::Random)]
        opponent: Opponent,
        /// Number of evaluation games.
        #[arg(long, default_value_t = 1_000)]
        games: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Let two minimax players play each other from the empty board.
    Duel {
        #[arg(long)]
        no_pruning: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Opponent {
    Random,
    Minimax,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match Cli::parse().command {
        Command::Train {
            config,
            episodes,
            opponent,
            games,
            seed,
        } => {
            let mut training = match config {
                Some(path) => TrainingConfig::load(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => TrainingConfig::default(),
            };
            if let Some(episodes) = episodes {
                training.episodes = episodes;
            }
            if seed.is_some() {
                training.seed = seed;
            }
            let mut opponent: Box<dyn Player> = match opponent {
                Opponent::Random => match training.seed {
                    Some(seed) => Box::new(RandomPlayer::with_seed(seed.wrapping_add(1))),
                    None => Box::new(RandomPlayer::new()),
                },
                Opponent::Minimax => Box::new(MinimaxPlayer::new()),
            };
            let (agent, training_stats) = train(&training, opponent.as_mut())?;
            log::info!("training results: {}", training_stats);

            let evaluation = EvaluationConfig {
                games,
                agent_mark: training.agent_mark,
                seed: training.seed,
                ..EvaluationConfig::default()
            };
            let stats = evaluate_vs_random(&agent, &evaluation)?;
            log::info!("evaluation vs random: {}", stats);
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Duel { no_pruning } => {
            let mut game = Game::new(
                Box::new(MinimaxPlayer::with_options(!no_pruning, true)),
                Box::new(MinimaxPlayer::with_options(!no_pruning, true)),
            );
            let winner = game.play()?;
            println!("{}\n", game.state);
            match winner {
                Mark::Empty => println!("The game ended in a draw."),
                mark => println!("{} wins.", mark.as_char()),
            }
        }
    }
    Ok(())
}
