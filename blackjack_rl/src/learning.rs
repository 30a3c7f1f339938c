pub mod exploring_starts;
pub mod monte_carlo;
pub mod q_learning;

use serde::{Deserialize, Serialize};

use crate::{
    episode::{Episode, EpisodeGenerator},
    shoe::CardSource,
    strategy::Strategy,
    table::Table,
    BlackjackError, Policy, QTable,
};

pub use exploring_starts::{generate_exploring_starts, ExploringStart};
pub use monte_carlo::{Exploration, MonteCarlo};
pub use q_learning::{DoubleQLearning, QLearning};

/// A tabular learner. It plays the rounds it learns from, hence the
/// `Strategy` bound.
pub trait Learner: Strategy {
    /// Updates the estimates and the greedy policy from one round.
    fn learn(&mut self, episode: &Episode);

    fn policy(&self) -> &Policy;

    fn q_table(&self) -> &QTable;

    /// Called before each episode is generated.
    fn begin_episode(&mut self, _episode_index: u64) {}

    /// The start to force for this episode, if the learner uses exploring
    /// starts.
    fn exploring_start(&self, _episode_index: u64) -> Option<ExploringStart> {
        None
    }
}

/// `max(min, start * decay^i)` for episode `i`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonSchedule {
    pub start: f64,
    pub min: f64,
    pub decay: f64,
}

impl EpsilonSchedule {
    pub fn constant(epsilon: f64) -> Self {
        EpsilonSchedule {
            start: epsilon,
            min: epsilon,
            decay: 1.0,
        }
    }

    pub fn value(&self, episode_index: u64) -> f64 {
        let exponent = episode_index.min(i32::MAX as u64) as i32;
        (self.start * self.decay.powi(exponent)).max(self.min)
    }
}

impl Default for EpsilonSchedule {
    fn default() -> Self {
        EpsilonSchedule {
            start: 1.0,
            min: 0.01,
            decay: 0.99999,
        }
    }
}

pub trait TrainingEventHandler {
    fn on_episode(&mut self, _episode_index: u64, _episode: &Episode) {}
}

impl TrainingEventHandler for () {}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrainingSummary {
    pub episodes: u64,
    pub hands: u64,
    pub total_reward: f64,
}

impl TrainingSummary {
    pub fn average_reward_per_hand(&self) -> f64 {
        if self.hands == 0 {
            0.0
        } else {
            self.total_reward / self.hands as f64
        }
    }
}

/// Online training: every episode updates the learner before the next one is
/// generated.
pub fn train<S, L, H>(
    table: &mut Table<S>,
    generator: &EpisodeGenerator,
    learner: &mut L,
    episodes: u64,
    handler: &mut H,
) -> Result<TrainingSummary, BlackjackError>
where
    S: CardSource,
    L: Learner + ?Sized,
    H: TrainingEventHandler + ?Sized,
{
    let mut summary = TrainingSummary::default();

    for episode_index in 0..episodes {
        learner.begin_episode(episode_index);
        let episode = match learner.exploring_start(episode_index) {
            Some(start) => generator.generate_with_start(table, learner, &start)?,
            None => generator.generate(table, learner)?,
        };
        learner.learn(&episode);
        handler.on_episode(episode_index, &episode);

        summary.episodes += 1;
        summary.hands += episode.hand_rewards.len() as u64;
        summary.total_reward += episode.total_reward();
    }

    log::info!(
        "Trained {} episodes ({} hands), average reward per hand {:.4}, {} states learnt",
        summary.episodes,
        summary.hands,
        summary.average_reward_per_hand(),
        learner.q_table().len()
    );
    Ok(summary)
}
