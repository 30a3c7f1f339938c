use std::collections::VecDeque;

use crate::{card::Card, hand::PlayerHand, BlackjackError};

/// The player's side of the table: the bank, the hand being played, the split
/// hands waiting their turn and the hands already completed this round.
///
/// Hands are played in the order `completed`, `current`, `pending`, so the
/// index of the current hand is the number of completed hands.
#[derive(Debug, Clone, Default)]
pub struct Player {
    bank: f64,
    current: Option<PlayerHand>,
    pending: VecDeque<PlayerHand>,
    completed: Vec<PlayerHand>,
    insurance_bet: f64,
}

impl Player {
    pub fn new(bank: f64) -> Player {
        Player {
            bank,
            ..Default::default()
        }
    }

    /// Starts a round with the two dealt cards. The bet is taken from the bank.
    pub fn init_hand(&mut self, cards: [Card; 2], bet: f64) -> Result<(), BlackjackError> {
        if !bet.is_finite() || bet < 0.0 {
            return Err(BlackjackError::InvalidAction(format!(
                "bet must be non-negative, got {}",
                bet
            )));
        }
        if bet > self.bank {
            return Err(BlackjackError::InvalidAction(format!(
                "cannot bet {} with {} in the bank",
                bet, self.bank
            )));
        }
        self.reset();
        self.bank -= bet;
        self.current = Some(PlayerHand::with_cards(&cards, bet));
        Ok(())
    }

    pub fn hit(&mut self, card: Card) -> Result<(), BlackjackError> {
        self.current_hand_mut()?.add_card(card);
        Ok(())
    }

    /// Puts a second stake on the current hand and draws exactly one card.
    pub fn double(&mut self, card: Card) -> Result<(), BlackjackError> {
        let bank = self.bank;
        let hand = self.current_hand_mut()?;
        if hand.len() != 2 {
            return Err(BlackjackError::InvalidAction(format!(
                "can only double down on two cards, hand has {}",
                hand.len()
            )));
        }
        let bet = hand.bet();
        if bank < bet {
            return Err(BlackjackError::InvalidAction(format!(
                "cannot double {} with {} in the bank",
                bet, bank
            )));
        }
        hand.add_bet(bet)?;
        hand.mark_as_doubled();
        hand.add_card(card);
        self.bank -= bet;
        Ok(())
    }

    /// Splits the current pair. The current hand keeps its first card and gets
    /// `first`; the new hand gets the second card plus `second` and is played
    /// right after the current one.
    pub fn split(&mut self, first: Card, second: Card) -> Result<(), BlackjackError> {
        let bank = self.bank;
        let hand = self.current_hand_mut()?;
        let bet = hand.bet();
        if bank < bet {
            return Err(BlackjackError::InvalidAction(format!(
                "cannot put another {} on a split with {} in the bank",
                bet, bank
            )));
        }
        let mut new_hand = hand.split()?;
        hand.add_card(first);
        new_hand.add_card(second);
        self.bank -= bet;
        self.pending.push_front(new_hand);
        Ok(())
    }

    pub fn insure(&mut self, amount: f64) -> Result<(), BlackjackError> {
        if self.insurance_bet > 0.0 {
            return Err(BlackjackError::InvalidAction(String::from(
                "insurance has already been taken",
            )));
        }
        if !amount.is_finite() || amount < 0.0 || amount > self.bank {
            return Err(BlackjackError::InvalidAction(format!(
                "cannot insure {} with {} in the bank",
                amount, self.bank
            )));
        }
        self.bank -= amount;
        self.insurance_bet = amount;
        Ok(())
    }

    /// Completes the current hand and moves on to the next split hand if any.
    pub fn done_with_hand(&mut self) -> Result<(), BlackjackError> {
        let hand = self.current.take().ok_or_else(|| {
            BlackjackError::InvalidAction(String::from("there is no hand being played"))
        })?;
        self.completed.push(hand);
        self.current = self.pending.pop_front();
        Ok(())
    }

    /// Pays every completed hand. Rewards are in units of each hand's unit bet
    /// and must come in the order the hands were completed. Returns the amount
    /// credited to the bank.
    pub fn pay_out(&mut self, rewards: &[f64]) -> Result<f64, BlackjackError> {
        if rewards.len() != self.completed.len() {
            return Err(BlackjackError::RewardCountMismatch {
                expected: self.completed.len(),
                actual: rewards.len(),
            });
        }
        let returned: f64 = self
            .completed
            .iter()
            .zip(rewards)
            .map(|(hand, reward)| hand.bet() + reward * hand.unit_bet())
            .sum();
        self.bank += returned;
        Ok(returned)
    }

    /// Settles the insurance side bet. Returns the signed result in money.
    pub fn settle_insurance(&mut self, dealer_blackjack: bool, payout: f64) -> f64 {
        let stake = std::mem::take(&mut self.insurance_bet);
        if dealer_blackjack {
            self.bank += stake * (1.0 + payout);
            stake * payout
        } else {
            -stake
        }
    }

    pub fn is_all_done(&self) -> bool {
        !self.completed.is_empty() && self.current.is_none()
    }

    pub fn current_hand(&self) -> Option<&PlayerHand> {
        self.current.as_ref()
    }

    fn current_hand_mut(&mut self) -> Result<&mut PlayerHand, BlackjackError> {
        self.current.as_mut().ok_or_else(|| {
            BlackjackError::InvalidAction(String::from("there is no hand being played"))
        })
    }

    pub fn current_index(&self) -> usize {
        self.completed.len()
    }

    pub fn hand_count(&self) -> usize {
        self.completed.len() + self.pending.len() + usize::from(self.current.is_some())
    }

    pub fn completed_hands(&self) -> &[PlayerHand] {
        &self.completed
    }

    /// All hands of the round in playing order.
    pub fn all_hands(&self) -> impl Iterator<Item = &PlayerHand> {
        self.completed
            .iter()
            .chain(self.current.iter())
            .chain(self.pending.iter())
    }

    pub fn bank(&self) -> f64 {
        self.bank
    }

    pub fn set_bank(&mut self, bank: f64) {
        self.bank = bank;
    }

    pub fn reset(&mut self) {
        self.current = None;
        self.pending.clear();
        self.completed.clear();
        self.insurance_bet = 0.0;
    }
}
