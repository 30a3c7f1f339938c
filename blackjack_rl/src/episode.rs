use serde_enum_str::{Deserialize_enum_str, Serialize_enum_str};

use crate::{
    learning::exploring_starts::ExploringStart,
    shoe::CardSource,
    strategy::Strategy,
    table::{Table, TablePhase},
    Action, BaseState, BlackjackError,
};

/// Decisions taken for one hand, in order.
pub type Trajectory = Vec<(BaseState, Action)>;

/// One full round. Sub-episodes, hand rewards and learning rewards are all
/// indexed by the order in which the hands were played.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Episode {
    pub sub_episodes: Vec<Trajectory>,
    /// Outcome of each hand on its own, in units of the bet.
    pub hand_rewards: Vec<f64>,
    /// Return credited to each sub-episode after split credit propagation.
    pub rewards: Vec<f64>,
    /// State in which insurance was bought. The side bet is settled on its
    /// own, so it never appears in a sub-episode.
    pub insurance_state: Option<BaseState>,
    pub insurance_reward: f64,
}

impl Episode {
    pub fn len(&self) -> usize {
        self.sub_episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sub_episodes.is_empty()
    }

    /// Pairs every sub-episode with its learning reward.
    pub fn iter(&self) -> impl Iterator<Item = (&Trajectory, f64)> {
        self.sub_episodes.iter().zip(self.rewards.iter().copied())
    }

    /// Net result of the round, insurance included.
    pub fn total_reward(&self) -> f64 {
        self.hand_rewards.iter().sum::<f64>() + self.insurance_reward
    }
}

/// How the outcome of hands created by a split flows back to earlier hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_enum_str, Deserialize_enum_str)]
pub enum SplitCredit {
    /// Every hand is credited with its own outcome plus the outcome of all
    /// hands played after it.
    Cascade,
    /// Every hand keeps its own outcome.
    PerHand,
}

impl Default for SplitCredit {
    fn default() -> Self {
        SplitCredit::Cascade
    }
}

/// Walks from the last hand to the first, adding each reward into the one
/// before it. This is a suffix sum over the whole round, so hands that never
/// split are credited with later outcomes too.
pub fn propagate_split_credit(rewards: &mut [f64]) {
    for i in (0..rewards.len().saturating_sub(1)).rev() {
        rewards[i] += rewards[i + 1];
    }
}

/// Plays full rounds on a table and records them as episodes.
#[derive(Debug, Clone, Copy)]
pub struct EpisodeGenerator {
    pub split_credit: SplitCredit,
    pub bet: f64,
    /// Bank given back to the player whenever it cannot cover a round with the
    /// maximum number of doubled splits.
    pub bankroll: f64,
}

impl Default for EpisodeGenerator {
    fn default() -> Self {
        EpisodeGenerator {
            split_credit: SplitCredit::default(),
            bet: 1.0,
            bankroll: 1000.0,
        }
    }
}

impl EpisodeGenerator {
    pub fn new(split_credit: SplitCredit) -> Self {
        EpisodeGenerator {
            split_credit,
            ..Default::default()
        }
    }

    /// Deals a round and plays it with `strategy`.
    pub fn generate<S, T>(
        &self,
        table: &mut Table<S>,
        strategy: &mut T,
    ) -> Result<Episode, BlackjackError>
    where
        S: CardSource,
        T: Strategy + ?Sized,
    {
        self.refill_bank(table);
        table.deal(self.bet)?;
        self.play(table, strategy, None)
    }

    /// Deals the start's cards and forces its action as the first decision.
    /// Later decisions come from `strategy`.
    pub fn generate_with_start<S, T>(
        &self,
        table: &mut Table<S>,
        strategy: &mut T,
        start: &ExploringStart,
    ) -> Result<Episode, BlackjackError>
    where
        S: CardSource,
        T: Strategy + ?Sized,
    {
        self.refill_bank(table);
        table.deal_with(self.bet, start.player_cards, start.dealer_up_card)?;
        self.play(table, strategy, Some(start.action))
    }

    fn refill_bank<S: CardSource>(&self, table: &mut Table<S>) {
        let worst_case = self.bet * 2.0 * table.rule().max_hands.max(1) as f64 + self.bet;
        if table.bank() < worst_case {
            log::debug!(
                "Bank {} cannot cover a full round, refilling to {}",
                table.bank(),
                self.bankroll
            );
            table.set_bank(self.bankroll.max(worst_case));
        }
    }

    fn play<S, T>(
        &self,
        table: &mut Table<S>,
        strategy: &mut T,
        mut forced: Option<Action>,
    ) -> Result<Episode, BlackjackError>
    where
        S: CardSource,
        T: Strategy + ?Sized,
    {
        let mut sub_episodes: Vec<Trajectory> = Vec::new();
        let mut insurance_state = None;

        while table.phase() == TablePhase::PlayerTurn {
            let state = table.state()?;
            let actions = table.possible_actions();
            let action = match forced.take() {
                Some(action) if actions.contains(&action) => action,
                Some(action) => {
                    return Err(BlackjackError::InvalidAction(format!(
                        "start action {} is not allowed in state {}",
                        action, state
                    )))
                }
                None => strategy.make_decision(&state, &actions),
            };

            if action == Action::Insurance {
                insurance_state = Some(state);
            } else {
                let index = table.current_index();
                while sub_episodes.len() <= index {
                    sub_episodes.push(Vec::new());
                }
                sub_episodes[index].push((state, action));
            }
            table.step(action)?;
        }

        let hand_rewards = table.finish()?;
        if sub_episodes.len() > hand_rewards.len() {
            return Err(BlackjackError::RewardCountMismatch {
                expected: sub_episodes.len(),
                actual: hand_rewards.len(),
            });
        }
        // Hands completed without a decision, e.g. a natural.
        sub_episodes.resize_with(hand_rewards.len(), Vec::new);

        let mut rewards = hand_rewards.clone();
        if self.split_credit == SplitCredit::Cascade {
            propagate_split_credit(&mut rewards);
        }
        let insurance_reward = table.insurance_reward();
        table.new_round()?;

        Ok(Episode {
            sub_episodes,
            hand_rewards,
            rewards,
            insurance_state,
            insurance_reward,
        })
    }
}
