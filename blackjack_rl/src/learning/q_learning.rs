use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{EpsilonSchedule, Learner};
use crate::{
    episode::{Episode, Trajectory},
    strategy::{epsilon_greedy, Strategy},
    Action, BaseState, Policy, QTable,
};

/// Target of transition `t`: the greedy value of the next state of the same
/// hand, or the hand's return for the last transition. Intermediate rewards
/// are 0.
fn bootstrap_target<F>(trajectory: &Trajectory, t: usize, reward: f64, next_value: F) -> f64
where
    F: FnOnce(&BaseState) -> f64,
{
    match trajectory.get(t + 1) {
        Some((next_state, _)) => next_value(next_state),
        None => reward,
    }
}

/// One-step Q-learning with a fixed step size.
pub struct QLearning {
    q: QTable,
    policy: Policy,
    alpha: f64,
    schedule: EpsilonSchedule,
    epsilon: f64,
    rng: StdRng,
}

impl QLearning {
    pub fn new(alpha: f64, schedule: EpsilonSchedule, seed: u64) -> Self {
        QLearning {
            q: QTable::new(),
            policy: Policy::new(),
            alpha,
            schedule,
            epsilon: schedule.value(0),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl Strategy for QLearning {
    fn make_decision(&mut self, state: &BaseState, actions: &[Action]) -> Action {
        epsilon_greedy(&mut self.rng, self.epsilon, &self.policy, state, actions)
    }
}

impl Learner for QLearning {
    fn learn(&mut self, episode: &Episode) {
        for (trajectory, reward) in episode.iter() {
            for (t, &(state, action)) in trajectory.iter().enumerate() {
                let target =
                    bootstrap_target(trajectory, t, reward, |next| self.q.max_value(next));
                let value = &mut self.q[&state][action];
                *value += self.alpha * (target - *value);

                if let Some(best) = self.q.best_action(&state) {
                    self.policy.insert(state, best);
                }
            }
        }

        if let Some(state) = episode.insurance_state {
            let value = &mut self.q[&state][Action::Insurance];
            *value += self.alpha * (episode.insurance_reward - *value);
        }
    }

    fn policy(&self) -> &Policy {
        &self.policy
    }

    fn q_table(&self) -> &QTable {
        &self.q
    }

    fn begin_episode(&mut self, episode_index: u64) {
        self.epsilon = self.schedule.value(episode_index);
    }
}

/// Double Q-learning. A fair coin picks the table to update; that table picks
/// the greedy action of the next state and the other table values it.
pub struct DoubleQLearning {
    q1: QTable,
    q2: QTable,
    /// `q1 + q2`, used for behaviour and the greedy policy.
    combined: QTable,
    visits: HashMap<(BaseState, Action), u64>,
    policy: Policy,
    /// `None` means a step size of `1 / visits`.
    alpha: Option<f64>,
    schedule: EpsilonSchedule,
    epsilon: f64,
    rng: StdRng,
}

impl DoubleQLearning {
    pub fn new(alpha: Option<f64>, schedule: EpsilonSchedule, seed: u64) -> Self {
        DoubleQLearning {
            q1: QTable::new(),
            q2: QTable::new(),
            combined: QTable::new(),
            visits: HashMap::new(),
            policy: Policy::new(),
            alpha,
            schedule,
            epsilon: schedule.value(0),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn tables(&self) -> (&QTable, &QTable) {
        (&self.q1, &self.q2)
    }

    /// Counts the visit and returns the step size for it.
    fn step_size(&mut self, state: BaseState, action: Action) -> f64 {
        let visits = self.visits.entry((state, action)).or_insert(0);
        *visits += 1;
        self.alpha.unwrap_or(1.0 / *visits as f64)
    }
}

impl Strategy for DoubleQLearning {
    fn make_decision(&mut self, state: &BaseState, actions: &[Action]) -> Action {
        epsilon_greedy(&mut self.rng, self.epsilon, &self.policy, state, actions)
    }
}

impl Learner for DoubleQLearning {
    fn learn(&mut self, episode: &Episode) {
        for (trajectory, reward) in episode.iter() {
            for (t, &(state, action)) in trajectory.iter().enumerate() {
                let step = self.step_size(state, action);
                let (updated, other) = if self.rng.gen::<bool>() {
                    (&mut self.q1, &self.q2)
                } else {
                    (&mut self.q2, &self.q1)
                };

                let target = bootstrap_target(trajectory, t, reward, |next| {
                    updated
                        .best_action(next)
                        .map_or(0.0, |best| other.get(next, best))
                });

                let value = &mut updated[&state][action];
                *value += step * (target - *value);

                self.combined[&state][action] =
                    self.q1.get(&state, action) + self.q2.get(&state, action);
                if let Some(best) = self.combined.best_action(&state) {
                    self.policy.insert(state, best);
                }
            }
        }

        // The side bet ends at once, so its target is the same for both
        // tables.
        if let Some(state) = episode.insurance_state {
            let step = self.step_size(state, Action::Insurance);
            let updated = if self.rng.gen::<bool>() {
                &mut self.q1
            } else {
                &mut self.q2
            };
            let value = &mut updated[&state][Action::Insurance];
            *value += step * (episode.insurance_reward - *value);
            self.combined[&state][Action::Insurance] = self.q1.get(&state, Action::Insurance)
                + self.q2.get(&state, Action::Insurance);
        }
    }

    fn policy(&self) -> &Policy {
        &self.policy
    }

    fn q_table(&self) -> &QTable {
        &self.combined
    }

    fn begin_episode(&mut self, episode_index: u64) {
        self.epsilon = self.schedule.value(episode_index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(player_total: u8) -> BaseState {
        BaseState {
            player_total,
            dealer_upcard: 7,
            usable_ace: false,
            splitable: false,
            can_double: false,
        }
    }

    fn episode(trajectory: Vec<(BaseState, Action)>, reward: f64) -> Episode {
        Episode {
            sub_episodes: vec![trajectory],
            hand_rewards: vec![reward],
            rewards: vec![reward],
            insurance_state: None,
            insurance_reward: 0.0,
        }
    }

    #[test]
    fn test_bootstrap() {
        let mut learner = QLearning::new(0.5, EpsilonSchedule::constant(0.1), 1);
        let s12 = state(12);
        let s18 = state(18);
        let round = episode(vec![(s12, Action::Hit), (s18, Action::Stand)], 1.0);

        learner.learn(&round);
        // The next state has no estimate yet, so the first transition learns 0.
        assert_eq!(learner.q_table().get(&s12, Action::Hit), 0.0);
        assert_eq!(learner.q_table().get(&s18, Action::Stand), 0.5);

        learner.learn(&round);
        assert_eq!(learner.q_table().get(&s12, Action::Hit), 0.25);
        assert_eq!(learner.q_table().get(&s18, Action::Stand), 0.75);
        assert_eq!(learner.policy().get(&s18), Some(Action::Stand));
        assert_eq!(learner.policy().get(&s12), Some(Action::Hit));
    }

    #[test]
    fn last_transition_uses_the_return() {
        let mut learner = QLearning::new(1.0, EpsilonSchedule::constant(0.0), 1);
        let s = state(20);
        learner.learn(&episode(vec![(s, Action::Stand)], -1.0));
        assert_eq!(learner.q_table().get(&s, Action::Stand), -1.0);
        assert_eq!(learner.policy().get(&s), Some(Action::Hit));
    }

    #[test]
    fn insurance_is_not_bootstrapped() {
        let mut learner = QLearning::new(0.5, EpsilonSchedule::constant(0.0), 1);
        let s = state(19);
        let mut round = episode(vec![(s, Action::Stand)], -1.0);
        round.insurance_state = Some(s);
        round.insurance_reward = 1.0;
        learner.learn(&round);
        assert_eq!(learner.q_table().get(&s, Action::Insurance), 0.5);
        assert_eq!(learner.q_table().get(&s, Action::Stand), -0.5);

        let mut double = DoubleQLearning::new(None, EpsilonSchedule::constant(0.0), 5);
        double.learn(&round);
        assert_eq!(double.q_table().get(&s, Action::Insurance), 1.0);
        assert_eq!(double.q_table().get(&s, Action::Stand), -1.0);
    }

    #[test]
    fn double_q_updates_one_table_per_transition() {
        let mut learner = DoubleQLearning::new(None, EpsilonSchedule::constant(0.1), 7);
        let s = state(19);
        learner.learn(&episode(vec![(s, Action::Stand)], 1.0));

        let (q1, q2) = learner.tables();
        let q1_value = q1.get(&s, Action::Stand);
        let q2_value = q2.get(&s, Action::Stand);
        assert_eq!(q1_value + q2_value, 1.0);
        assert!(q1_value == 0.0 || q2_value == 0.0);
        assert_eq!(learner.q_table().get(&s, Action::Stand), 1.0);
        assert_eq!(learner.policy().get(&s), Some(Action::Stand));
    }

    #[test]
    fn double_q_step_size_follows_visits() {
        let mut learner = DoubleQLearning::new(None, EpsilonSchedule::constant(0.1), 3);
        let s = state(17);
        for reward in [1.0, -1.0, 1.0, -1.0] {
            learner.learn(&episode(vec![(s, Action::Stand)], reward));
        }
        // Whatever the coin flips were, each table holds a weighted mean of
        // returns in [-1, 1].
        let (q1, q2) = learner.tables();
        assert!(q1.get(&s, Action::Stand).abs() <= 1.0);
        assert!(q2.get(&s, Action::Stand).abs() <= 1.0);
        let combined = learner.q_table().get(&s, Action::Stand);
        assert_eq!(
            combined,
            q1.get(&s, Action::Stand) + q2.get(&s, Action::Stand)
        );
    }

    #[test]
    fn double_q_bootstraps_from_the_other_table() {
        let mut learner = DoubleQLearning::new(Some(1.0), EpsilonSchedule::constant(0.0), 11);
        let s12 = state(12);
        let s20 = state(20);
        let round = episode(vec![(s12, Action::Hit), (s20, Action::Stand)], 1.0);
        for _ in 0..50 {
            learner.learn(&round);
        }
        // With a step size of 1 both tables end up at 1 for the last
        // transition, and the first transition copies it.
        let (q1, q2) = learner.tables();
        assert_eq!(q1.get(&s20, Action::Stand), 1.0);
        assert_eq!(q2.get(&s20, Action::Stand), 1.0);
        assert_eq!(q1.get(&s12, Action::Hit), 1.0);
        assert_eq!(q2.get(&s12, Action::Hit), 1.0);
    }
}
