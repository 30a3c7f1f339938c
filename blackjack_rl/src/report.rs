use std::fmt::Write;

use rayon::prelude::*;
use serde::Serialize;

use crate::{
    episode::{EpisodeGenerator, SplitCredit},
    hand::PlayerHand,
    strategy::PolicyFollower,
    table::Table,
    Action, BaseState, BlackjackError, Policy, Rule,
};

/// Aggregate results of played rounds. Rewards are in units of the bet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub rounds: u64,
    pub hands: u64,
    pub wins: u64,
    pub pushes: u64,
    pub losses: u64,
    pub blackjacks: u64,
    pub double_wins: u64,
    pub double_losses: u64,
    pub total_reward: f64,
    pub insurance_reward: f64,
}

impl Metrics {
    /// Records one finished round. `rewards` are the per-hand outcomes in the
    /// order of `hands`.
    pub fn record_round(&mut self, hands: &[PlayerHand], rewards: &[f64], insurance_reward: f64) {
        self.rounds += 1;
        for (hand, &reward) in hands.iter().zip(rewards) {
            self.hands += 1;
            self.total_reward += reward;
            if hand.is_blackjack() && reward > 0.0 {
                self.blackjacks += 1;
            } else if hand.is_doubled() && reward > 0.0 {
                self.double_wins += 1;
            } else if hand.is_doubled() && reward < 0.0 {
                self.double_losses += 1;
            } else if reward > 0.0 {
                self.wins += 1;
            } else if reward < 0.0 {
                self.losses += 1;
            } else {
                self.pushes += 1;
            }
        }
        self.insurance_reward += insurance_reward;
    }

    pub fn merge(&mut self, other: &Metrics) {
        self.rounds += other.rounds;
        self.hands += other.hands;
        self.wins += other.wins;
        self.pushes += other.pushes;
        self.losses += other.losses;
        self.blackjacks += other.blackjacks;
        self.double_wins += other.double_wins;
        self.double_losses += other.double_losses;
        self.total_reward += other.total_reward;
        self.insurance_reward += other.insurance_reward;
    }

    fn per_hand(&self, count: u64) -> f64 {
        if self.hands == 0 {
            0.0
        } else {
            count as f64 / self.hands as f64
        }
    }

    pub fn win_rate(&self) -> f64 {
        self.per_hand(self.wins)
    }

    pub fn push_rate(&self) -> f64 {
        self.per_hand(self.pushes)
    }

    pub fn loss_rate(&self) -> f64 {
        self.per_hand(self.losses)
    }

    pub fn blackjack_rate(&self) -> f64 {
        self.per_hand(self.blackjacks)
    }

    pub fn double_win_rate(&self) -> f64 {
        self.per_hand(self.double_wins)
    }

    pub fn double_loss_rate(&self) -> f64 {
        self.per_hand(self.double_losses)
    }

    pub fn average_gain_per_hand(&self) -> f64 {
        if self.hands == 0 {
            0.0
        } else {
            self.total_reward / self.hands as f64
        }
    }

    /// Average net result of a round, insurance included.
    pub fn average_gain_per_round(&self) -> f64 {
        if self.rounds == 0 {
            0.0
        } else {
            (self.total_reward + self.insurance_reward) / self.rounds as f64
        }
    }
}

impl std::fmt::Display for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Rounds: {}. Hands: {}.", self.rounds, self.hands)?;
        writeln!(
            f,
            "Win: {:.2}%. Push: {:.2}%. Loss: {:.2}%. Blackjack: {:.2}%.",
            self.win_rate() * 100.0,
            self.push_rate() * 100.0,
            self.loss_rate() * 100.0,
            self.blackjack_rate() * 100.0,
        )?;
        writeln!(
            f,
            "Double win: {:.2}%. Double loss: {:.2}%.",
            self.double_win_rate() * 100.0,
            self.double_loss_rate() * 100.0,
        )?;
        write!(
            f,
            "Average gain per hand: {:.6}. Per round: {:.6}.",
            self.average_gain_per_hand(),
            self.average_gain_per_round(),
        )
    }
}

fn resolve_number_of_threads(number_of_threads: usize) -> usize {
    if number_of_threads == 0 {
        let parallelism = std::thread::available_parallelism();
        match parallelism {
            Ok(n) => n.get(),
            Err(_) => 1,
        }
    } else {
        number_of_threads
    }
}

/// Plays `rounds` rounds greedily with `policy` and collects the results.
/// Workers run on their own table with a shoe seeded from `seed` and their
/// index, so a run is reproducible for a given number of threads. A thread
/// count of 0 uses every available core.
pub fn evaluate_policy(
    rule: &Rule,
    policy: &Policy,
    rounds: u64,
    number_of_threads: usize,
    seed: u64,
) -> Result<Metrics, BlackjackError> {
    let number_of_threads = resolve_number_of_threads(number_of_threads);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(number_of_threads)
        .build()?;

    let workers = number_of_threads as u64;
    let partials: Vec<Result<Metrics, BlackjackError>> = pool.install(|| {
        (0..workers)
            .into_par_iter()
            .map(|worker| {
                let share = rounds / workers + u64::from(worker < rounds % workers);
                evaluate_worker(rule, policy, share, seed.wrapping_add(worker))
            })
            .collect()
    });

    let mut metrics = Metrics::default();
    for partial in partials {
        metrics.merge(&partial?);
    }
    log::info!(
        "Evaluated {} rounds on {} threads, average gain per hand {:.6}",
        metrics.rounds,
        number_of_threads,
        metrics.average_gain_per_hand()
    );
    Ok(metrics)
}

fn evaluate_worker(
    rule: &Rule,
    policy: &Policy,
    rounds: u64,
    seed: u64,
) -> Result<Metrics, BlackjackError> {
    let mut table = Table::with_seed(rule, 0.0, seed);
    let mut follower = PolicyFollower::greedy(policy, seed);
    let generator = EpisodeGenerator::new(SplitCredit::PerHand);
    let mut metrics = Metrics::default();

    for _ in 0..rounds {
        let episode = generator.generate(&mut table, &mut follower)?;
        metrics.record_round(
            table.player().completed_hands(),
            &episode.hand_rewards,
            episode.insurance_reward,
        );
    }
    Ok(metrics)
}

fn action_symbol(action: Option<Action>) -> char {
    match action {
        Some(Action::Stand) => 'S',
        Some(Action::Hit) => 'H',
        Some(Action::Double) => 'D',
        Some(Action::Split) => 'P',
        Some(Action::Insurance) => 'I',
        None => '.',
    }
}

/// Text grid of the policy: one row per player total, one column per dealer
/// up card (A last). Two-card hands that can double, without pairs.
pub fn policy_chart(policy: &Policy, usable_ace: bool) -> String {
    let totals = if usable_ace { 13..=21 } else { 5..=21 };
    let mut chart = String::new();
    let _ = writeln!(
        chart,
        "{} hands\n      2  3  4  5  6  7  8  9  T  A",
        if usable_ace { "Soft" } else { "Hard" }
    );
    for player_total in totals {
        let _ = write!(chart, "{:>4} ", player_total);
        for dealer_upcard in 2..=11 {
            let state = BaseState {
                player_total,
                dealer_upcard,
                usable_ace,
                splitable: false,
                can_double: true,
            };
            let _ = write!(chart, "  {}", action_symbol(policy.get(&state)));
        }
        chart.push('\n');
    }
    chart
}

/// Same as `policy_chart` for splittable pairs, one row per pair.
pub fn pair_chart(policy: &Policy) -> String {
    let mut chart = String::from("Pairs\n      2  3  4  5  6  7  8  9  T  A\n");
    for card_point in 2..=11u8 {
        let (player_total, usable_ace) = if card_point == 11 {
            (12, true)
        } else {
            (card_point * 2, false)
        };
        let label = if card_point == 11 {
            String::from("A,A")
        } else {
            format!("{},{}", card_point, card_point)
        };
        let _ = write!(chart, "{:>5}", label);
        for dealer_upcard in 2..=11 {
            let state = BaseState {
                player_total,
                dealer_upcard,
                usable_ace,
                splitable: true,
                can_double: true,
            };
            let _ = write!(chart, "  {}", action_symbol(policy.get(&state)));
        }
        chart.push('\n');
    }
    chart
}
