use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::{Action, BaseState, Policy};

/// Picks actions during a round.
pub trait Strategy {
    /// Chooses one of `actions` for `state`. `actions` is never empty and
    /// always holds the legal actions of the current hand.
    fn make_decision(&mut self, state: &BaseState, actions: &[Action]) -> Action;
}

/// Uniform choice among the legal actions.
pub(crate) fn random_action(rng: &mut StdRng, actions: &[Action]) -> Action {
    actions.choose(rng).copied().unwrap_or(Action::Stand)
}

/// With probability `epsilon`, or when `policy` has no legal answer for the
/// state, a uniform random legal action. Otherwise the policy's action.
pub(crate) fn epsilon_greedy(
    rng: &mut StdRng,
    epsilon: f64,
    policy: &Policy,
    state: &BaseState,
    actions: &[Action],
) -> Action {
    if epsilon > 0.0 && rng.gen::<f64>() < epsilon {
        return random_action(rng, actions);
    }
    match policy.get(state) {
        Some(action) if actions.contains(&action) => action,
        _ => random_action(rng, actions),
    }
}

/// Plays a fixed policy, optionally with some exploration.
pub struct PolicyFollower<'a> {
    policy: &'a Policy,
    epsilon: f64,
    rng: StdRng,
}

impl<'a> PolicyFollower<'a> {
    pub fn new(policy: &'a Policy, epsilon: f64, seed: u64) -> Self {
        PolicyFollower {
            policy,
            epsilon,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn greedy(policy: &'a Policy, seed: u64) -> Self {
        Self::new(policy, 0.0, seed)
    }
}

impl<'a> Strategy for PolicyFollower<'a> {
    fn make_decision(&mut self, state: &BaseState, actions: &[Action]) -> Action {
        epsilon_greedy(&mut self.rng, self.epsilon, self.policy, state, actions)
    }
}

pub struct RandomStrategy {
    rng: StdRng,
}

impl RandomStrategy {
    pub fn new(seed: u64) -> Self {
        RandomStrategy {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Strategy for RandomStrategy {
    fn make_decision(&mut self, _: &BaseState, actions: &[Action]) -> Action {
        random_action(&mut self.rng, actions)
    }
}

/// The chart is (preferred, fallback). The fallback is used when the preferred
/// action is not allowed, e.g. doubling a hand with three cards.
type ChartEntry = (Action, Action);

pub struct BasicStrategy {
    hard_charts: [[ChartEntry; 10]; 14],
    soft_charts: [[ChartEntry; 10]; 9],
    pair_charts: [[ChartEntry; 10]; 10],
}

impl Default for BasicStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl BasicStrategy {
    /// Basic strategy for a multi-deck game where the dealer stands on soft 17.
    /// Surrender is not offered, so surrender entries play their fallback.
    pub fn new() -> BasicStrategy {
        const H: ChartEntry = (Action::Hit, Action::Hit);
        const S: ChartEntry = (Action::Stand, Action::Stand);
        const P: ChartEntry = (Action::Split, Action::Hit);
        const DH: ChartEntry = (Action::Double, Action::Hit);
        const DS: ChartEntry = (Action::Double, Action::Stand);
        const PS: ChartEntry = (Action::Split, Action::Stand);

        // Columns: Ace, 2, 3, ..., 10.
        let hard_charts = [
            [H, H, H, H, H, H, H, H, H, H], // 5
            [H, H, H, H, H, H, H, H, H, H],
            [H, H, H, H, H, H, H, H, H, H],
            [H, H, H, H, H, H, H, H, H, H],
            [H, H, DH, DH, DH, DH, H, H, H, H],
            [H, DH, DH, DH, DH, DH, DH, DH, DH, H],
            [DH, DH, DH, DH, DH, DH, DH, DH, DH, DH],
            [H, H, H, S, S, S, H, H, H, H],
            [H, S, S, S, S, S, H, H, H, H],
            [H, S, S, S, S, S, H, H, H, H],
            [H, S, S, S, S, S, H, H, H, H],
            [H, S, S, S, S, S, H, H, H, H],
            [S, S, S, S, S, S, S, S, S, S], // 17
            [S, S, S, S, S, S, S, S, S, S], // 18, 18+
        ];
        let soft_charts = [
            [H, H, H, H, DH, DH, H, H, H, H], // Ace + 2
            [H, H, H, H, DH, DH, H, H, H, H],
            [H, H, H, DH, DH, DH, H, H, H, H],
            [H, H, H, DH, DH, DH, H, H, H, H],
            [H, H, DH, DH, DH, DH, H, H, H, H],
            [H, DS, DS, DS, DS, DS, S, S, H, H],
            [S, S, S, S, S, DS, S, S, S, S],
            [S, S, S, S, S, S, S, S, S, S], // Ace + 9
            [S, S, S, S, S, S, S, S, S, S], // Ace + 10
        ];
        let pair_charts = [
            [P, P, P, P, P, P, P, P, P, P], // Double Ace
            [H, P, P, P, P, P, P, H, H, H], // Double 2
            [H, P, P, P, P, P, P, H, H, H],
            [H, H, H, H, P, P, H, H, H, H],
            [H, DH, DH, DH, DH, DH, DH, DH, DH, H],
            [H, P, P, P, P, P, H, H, H, H],
            [H, P, P, P, P, P, P, H, H, H],
            [P, P, P, P, P, P, P, P, P, P],
            [S, PS, PS, PS, PS, PS, S, PS, PS, S],
            [S, S, S, S, S, S, S, S, S, S], // Double 10
        ];

        BasicStrategy {
            hard_charts,
            soft_charts,
            pair_charts,
        }
    }

    fn chart_entry(&self, state: &BaseState) -> ChartEntry {
        let col = if state.dealer_upcard >= 11 {
            0
        } else {
            state.dealer_upcard.clamp(2, 10) as usize - 1
        };

        if state.splitable {
            // Pair
            let row = if state.usable_ace {
                0
            } else {
                (state.player_total / 2).clamp(2, 10) as usize - 1
            };
            self.pair_charts[row][col]
        } else if state.usable_ace && state.player_total >= 13 {
            // Soft hand
            let row = (state.player_total.min(21) - 13) as usize;
            self.soft_charts[row][col]
        } else if state.usable_ace {
            // Soft 12 only happens with two aces that cannot be split.
            (Action::Hit, Action::Hit)
        } else {
            // Hard hand
            let row = {
                if state.player_total <= 5 {
                    0
                } else if state.player_total >= 18 {
                    13
                } else {
                    state.player_total - 5
                }
            } as usize;
            self.hard_charts[row][col]
        }
    }

    /// The chart decision limited to the actions the state allows.
    pub fn decide(&self, state: &BaseState) -> Action {
        let (preferred, fallback) = self.chart_entry(state);
        let actions = state.candidate_actions();
        if actions.contains(&preferred) {
            preferred
        } else if actions.contains(&fallback) {
            fallback
        } else {
            Action::Hit
        }
    }
}

impl Strategy for BasicStrategy {
    fn make_decision(&mut self, state: &BaseState, actions: &[Action]) -> Action {
        let (preferred, fallback) = self.chart_entry(state);
        if actions.contains(&preferred) {
            preferred
        } else if actions.contains(&fallback) {
            fallback
        } else {
            Action::Stand
        }
    }
}

/// Every state a two-or-more-card hand can be in, against every up card.
pub fn all_states() -> Vec<BaseState> {
    let mut states = Vec::new();
    for dealer_upcard in 2..=11 {
        for usable_ace in [false, true] {
            for splitable in [false, true] {
                for can_double in [false, true] {
                    let totals = if usable_ace { 12..=21 } else { 4..=21 };
                    for player_total in totals {
                        if splitable
                            && (if usable_ace {
                                player_total != 12
                            } else {
                                player_total % 2 == 1 || player_total > 20
                            })
                        {
                            continue;
                        }
                        states.push(BaseState {
                            player_total,
                            dealer_upcard,
                            usable_ace,
                            splitable,
                            can_double,
                        });
                    }
                }
            }
        }
    }
    states
}

/// Basic strategy as a policy over every state, usable to seed learners or as
/// a baseline.
pub fn generate_basic_strategy() -> Policy {
    let strategy = BasicStrategy::new();
    all_states()
        .into_iter()
        .map(|state| (state, strategy.decide(&state)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(player_total: u8, dealer_upcard: u8, usable_ace: bool) -> BaseState {
        BaseState {
            player_total,
            dealer_upcard,
            usable_ace,
            splitable: false,
            can_double: true,
        }
    }

    #[test]
    fn test_hard_hands() {
        let strategy = BasicStrategy::new();
        assert_eq!(strategy.decide(&state(16, 10, false)), Action::Hit);
        assert_eq!(strategy.decide(&state(16, 6, false)), Action::Stand);
        assert_eq!(strategy.decide(&state(11, 11, false)), Action::Double);
        assert_eq!(strategy.decide(&state(12, 2, false)), Action::Hit);
        assert_eq!(strategy.decide(&state(20, 11, false)), Action::Stand);
    }

    #[test]
    fn double_falls_back_when_not_allowed() {
        let strategy = BasicStrategy::new();
        let mut s = state(11, 6, false);
        s.can_double = false;
        assert_eq!(strategy.decide(&s), Action::Hit);

        let mut soft_18 = state(18, 4, true);
        assert_eq!(strategy.decide(&soft_18), Action::Double);
        soft_18.can_double = false;
        assert_eq!(strategy.decide(&soft_18), Action::Stand);
    }

    #[test]
    fn test_pairs() {
        let strategy = BasicStrategy::new();
        let aces = BaseState {
            player_total: 12,
            dealer_upcard: 10,
            usable_ace: true,
            splitable: true,
            can_double: true,
        };
        assert_eq!(strategy.decide(&aces), Action::Split);

        let tens = BaseState {
            player_total: 20,
            usable_ace: false,
            ..aces
        };
        assert_eq!(strategy.decide(&tens), Action::Stand);

        let fives = BaseState {
            player_total: 10,
            usable_ace: false,
            dealer_upcard: 9,
            ..aces
        };
        assert_eq!(strategy.decide(&fives), Action::Double);
    }

    #[test]
    fn strategy_respects_legal_actions() {
        let mut strategy = BasicStrategy::new();
        let s = state(11, 6, false);
        assert_eq!(
            strategy.make_decision(&s, &[Action::Stand, Action::Hit]),
            Action::Hit
        );
    }

    #[test]
    fn basic_strategy_covers_every_state() {
        let policy = generate_basic_strategy();
        let states = all_states();
        assert_eq!(policy.len(), states.len());
        for state in &states {
            let action = policy.get(state).unwrap();
            assert!(state.candidate_actions().contains(&action), "{}", state);
        }
    }

    #[test]
    fn random_strategy_stays_legal() {
        let mut strategy = RandomStrategy::new(3);
        let s = state(13, 5, false);
        for _ in 0..100 {
            let action = strategy.make_decision(&s, &[Action::Stand, Action::Hit]);
            assert!(action == Action::Stand || action == Action::Hit);
        }
    }

    #[test]
    fn follower_uses_policy_and_explores_unknown_states() {
        let known = state(15, 10, false);
        let policy: Policy = [(known, Action::Hit)].into_iter().collect();
        let mut follower = PolicyFollower::greedy(&policy, 1);
        for _ in 0..20 {
            assert_eq!(
                follower.make_decision(&known, &[Action::Stand, Action::Hit]),
                Action::Hit
            );
        }

        let unknown = state(14, 10, false);
        let mut seen_stand = false;
        let mut seen_hit = false;
        for _ in 0..100 {
            match follower.make_decision(&unknown, &[Action::Stand, Action::Hit]) {
                Action::Stand => seen_stand = true,
                Action::Hit => seen_hit = true,
                action => panic!("unexpected {}", action),
            }
        }
        assert!(seen_stand && seen_hit);
    }

    #[test]
    fn follower_never_plays_illegal_policy_action() {
        let s = state(11, 6, false);
        let policy: Policy = [(s, Action::Double)].into_iter().collect();
        let mut follower = PolicyFollower::greedy(&policy, 1);
        for _ in 0..20 {
            let action = follower.make_decision(&s, &[Action::Stand, Action::Hit]);
            assert_ne!(action, Action::Double);
        }
    }
}
