use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{
    exploring_starts::generate_exploring_starts, EpsilonSchedule, ExploringStart, Learner,
};
use crate::{
    episode::Episode,
    strategy::{epsilon_greedy, Strategy},
    Action, BaseState, Policy, QTable,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Exploration {
    /// Cycles through every exploring start. Decisions after the forced one
    /// follow the greedy policy.
    ExploringStarts,
    EpsilonGreedy(EpsilonSchedule),
}

/// First-visit Monte Carlo control with incremental means.
pub struct MonteCarlo {
    q: QTable,
    counts: HashMap<(BaseState, Action), u64>,
    policy: Policy,
    exploration: Exploration,
    starts: Vec<ExploringStart>,
    epsilon: f64,
    rng: StdRng,
}

impl MonteCarlo {
    pub fn new(exploration: Exploration, seed: u64) -> Self {
        let starts = match exploration {
            Exploration::ExploringStarts => generate_exploring_starts(),
            Exploration::EpsilonGreedy(_) => Vec::new(),
        };
        MonteCarlo {
            q: QTable::new(),
            counts: HashMap::new(),
            policy: Policy::new(),
            exploration,
            starts,
            epsilon: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Starts from an existing policy, e.g. basic strategy. States the policy
    /// knows are played greedily before they have any estimate.
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn visits(&self, state: &BaseState, action: Action) -> u64 {
        self.counts.get(&(*state, action)).copied().unwrap_or(0)
    }
}

impl Strategy for MonteCarlo {
    fn make_decision(&mut self, state: &BaseState, actions: &[Action]) -> Action {
        epsilon_greedy(&mut self.rng, self.epsilon, &self.policy, state, actions)
    }
}

impl Learner for MonteCarlo {
    fn learn(&mut self, episode: &Episode) {
        for (trajectory, reward) in episode.iter() {
            let mut visited = HashSet::new();
            for &(state, action) in trajectory {
                if !visited.insert((state, action)) {
                    continue;
                }
                let count = self.counts.entry((state, action)).or_insert(0);
                *count += 1;
                let count = *count as f64;

                let value = &mut self.q[&state][action];
                *value += (reward - *value) / count;

                if let Some(best) = self.q.best_action(&state) {
                    self.policy.insert(state, best);
                }
            }
        }

        // Insurance is estimated from the side bet alone. It is never a
        // greedy candidate, so the policy is left alone.
        if let Some(state) = episode.insurance_state {
            let count = self.counts.entry((state, Action::Insurance)).or_insert(0);
            *count += 1;
            let count = *count as f64;
            let value = &mut self.q[&state][Action::Insurance];
            *value += (episode.insurance_reward - *value) / count;
        }
    }

    fn policy(&self) -> &Policy {
        &self.policy
    }

    fn q_table(&self) -> &QTable {
        &self.q
    }

    fn begin_episode(&mut self, episode_index: u64) {
        self.epsilon = match self.exploration {
            Exploration::ExploringStarts => 0.0,
            Exploration::EpsilonGreedy(schedule) => schedule.value(episode_index),
        };
    }

    fn exploring_start(&self, episode_index: u64) -> Option<ExploringStart> {
        if self.starts.is_empty() {
            return None;
        }
        let index = (episode_index % self.starts.len() as u64) as usize;
        Some(self.starts[index])
    }
}
