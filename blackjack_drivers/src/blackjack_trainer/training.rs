use std::error::Error;
use std::fs;
use std::path::Path;

use self::private::Statistics;
use blackjack_drivers::persistence::{load_policy, save_policy, save_q_table};
use blackjack_drivers::{Config, ConfigTraining};
use blackjack_rl::episode::{Episode, EpisodeGenerator};
use blackjack_rl::learning::{
    train, DoubleQLearning, EpsilonSchedule, Exploration, Learner, MonteCarlo, QLearning,
    TrainingEventHandler,
};
use blackjack_rl::report::{evaluate_policy, pair_chart, policy_chart};
use blackjack_rl::strategy::generate_basic_strategy;
use blackjack_rl::table::Table;
use blackjack_rl::{Policy, Rule};
use indicatif::{ProgressBar, ProgressStyle};

mod private {
    /// Running results in units of the bet.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Statistics {
        current_reward: f64,
        total_hands: u64,

        last_reward: f64,
        last_hands: u64,

        min_reward: f64,
    }

    impl Statistics {
        pub fn record(&mut self, hands: u64, reward: f64) {
            self.total_hands += hands;
            self.current_reward += reward;
            if self.min_reward > self.current_reward {
                self.min_reward = self.current_reward;
            }
        }

        pub fn get_current_reward(&self) -> f64 {
            self.current_reward
        }

        pub fn get_rate(&self) -> f64 {
            if self.total_hands == 0 {
                0.0
            } else {
                self.current_reward / self.total_hands as f64
            }
        }

        /// Average reward per hand since the last call.
        pub fn get_delta_rate(&mut self) -> f64 {
            let reward = self.current_reward - self.last_reward;
            let hands = self.total_hands - self.last_hands;
            self.last_reward = self.current_reward;
            self.last_hands = self.total_hands;
            if hands == 0 {
                0.0
            } else {
                reward / hands as f64
            }
        }

        pub fn get_min_reward(&self) -> f64 {
            self.min_reward
        }
    }
}

const EPISODES_PER_REFRESH: u64 = 10_000;

struct ProgressHandler {
    bar: ProgressBar,
    stat: Statistics,
}

impl ProgressHandler {
    fn new(episodes: u64) -> Result<Self, Box<dyn Error>> {
        let bar = ProgressBar::new(episodes);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
                .progress_chars("#>-"),
        );
        Ok(ProgressHandler {
            bar,
            stat: Statistics::default(),
        })
    }
}

impl TrainingEventHandler for ProgressHandler {
    fn on_episode(&mut self, episode_index: u64, episode: &Episode) {
        self.stat
            .record(episode.hand_rewards.len() as u64, episode.total_reward());

        if (episode_index + 1) % EPISODES_PER_REFRESH == 0 {
            self.bar.inc(EPISODES_PER_REFRESH);
            self.bar.set_message(format!(
                "Rate: {:.4}% (last {:.4}%). Reward: {:.1}. Min: {:.1}.",
                self.stat.get_rate() * 100.0,
                self.stat.get_delta_rate() * 100.0,
                self.stat.get_current_reward(),
                self.stat.get_min_reward(),
            ));
        }
    }
}

fn load_or_basic(policy: Option<&Path>) -> Result<Policy, Box<dyn Error>> {
    match policy {
        Some(path) => Ok(load_policy(path)?),
        None => Ok(generate_basic_strategy()),
    }
}

fn initial_policy(training: &ConfigTraining) -> Result<Option<Policy>, Box<dyn Error>> {
    match training.init_policy.as_deref() {
        None => Ok(None),
        Some("basic") => Ok(Some(generate_basic_strategy())),
        Some(path) => Ok(Some(load_policy(Path::new(path))?)),
    }
}

fn build_learner(training: &ConfigTraining) -> Result<Box<dyn Learner>, Box<dyn Error>> {
    let schedule = EpsilonSchedule {
        start: training.epsilon,
        min: training.epsilon_min,
        decay: training.epsilon_decay,
    };
    let init_policy = initial_policy(training)?;
    let seed = training.seed;

    let learner: Box<dyn Learner> = match training.method.as_str() {
        "mc_exploring_starts" => {
            let learner = MonteCarlo::new(Exploration::ExploringStarts, seed);
            Box::new(match init_policy {
                Some(policy) => learner.with_policy(policy),
                None => learner,
            })
        }
        "mc_epsilon_greedy" => {
            let learner = MonteCarlo::new(Exploration::EpsilonGreedy(schedule), seed);
            Box::new(match init_policy {
                Some(policy) => learner.with_policy(policy),
                None => learner,
            })
        }
        "q_learning" => {
            let alpha = training.alpha.unwrap_or(0.01);
            let learner = QLearning::new(alpha, schedule, seed);
            Box::new(match init_policy {
                Some(policy) => learner.with_policy(policy),
                None => learner,
            })
        }
        "double_q_learning" => {
            let learner = DoubleQLearning::new(training.alpha, schedule, seed);
            Box::new(match init_policy {
                Some(policy) => learner.with_policy(policy),
                None => learner,
            })
        }
        other => return Err(format!("Unknown training method {}", other).into()),
    };
    Ok(learner)
}

pub fn train_from_config(config: &Config) -> Result<(), Box<dyn Error>> {
    let rule: Rule = config.rule.clone().try_into()?;
    let training = &config.training;
    let generator = EpisodeGenerator {
        split_credit: training.split_credit()?,
        bet: training.bet,
        bankroll: training.bank,
    };
    let mut table = Table::with_seed(&rule, training.bank, training.seed);
    let mut learner = build_learner(training)?;
    let mut handler = ProgressHandler::new(training.episodes)?;

    log::info!(
        "Training {} for {} episodes with {:?} split credit",
        training.method,
        training.episodes,
        generator.split_credit
    );
    let summary = train(
        &mut table,
        &generator,
        learner.as_mut(),
        training.episodes,
        &mut handler,
    )?;
    handler.bar.finish();
    println!(
        "Finished {} episodes, {} hands, average reward per hand {:.6}",
        summary.episodes,
        summary.hands,
        summary.average_reward_per_hand()
    );

    let output_dir = Path::new(&training.output_dir);
    fs::create_dir_all(output_dir)?;
    let policy_path = output_dir.join(format!("policy_{}.yml", training.method));
    let q_path = output_dir.join(format!("q_{}.yml", training.method));
    save_policy(learner.policy(), &policy_path)?;
    save_q_table(learner.q_table(), &q_path)?;
    log::info!(
        "Saved policy to {} and action values to {}",
        policy_path.display(),
        q_path.display()
    );

    println!("{}", policy_chart(learner.policy(), false));
    println!("{}", policy_chart(learner.policy(), true));
    println!("{}", pair_chart(learner.policy()));
    Ok(())
}

pub fn evaluate_from_config(config: &Config, policy: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let rule: Rule = config.rule.clone().try_into()?;
    let policy = load_or_basic(policy)?;
    let evaluation = &config.evaluation;
    let metrics = evaluate_policy(
        &rule,
        &policy,
        evaluation.rounds,
        evaluation.number_of_threads,
        evaluation.seed,
    )?;
    println!("{}", metrics);
    Ok(())
}

pub fn print_charts(policy: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let policy = load_or_basic(policy)?;
    println!("{}", policy_chart(&policy, false));
    println!("{}", policy_chart(&policy, true));
    println!("{}", pair_chart(&policy));
    Ok(())
}
