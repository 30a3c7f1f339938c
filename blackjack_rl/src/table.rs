use std::cmp::Ordering;

use blackjack_macros::allowed_phase;

use crate::{
    card::Card,
    dealer::Dealer,
    hand::PlayerHand,
    player::Player,
    shoe::{CardSource, Shoe},
    Action, BaseState, BlackjackError, Rule, NUMBER_OF_ACTIONS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TablePhase {
    Dealing,
    PlayerTurn,
    DealerTurn,
    Summary,
}

/// Simulates a single-seat Blackjack table.
///
/// A round goes `Dealing -> PlayerTurn -> DealerTurn -> Summary`, and
/// `new_round` brings the table back to `Dealing`. Every public operation is
/// only allowed in one phase.
pub struct Table<S: CardSource = Shoe> {
    rule: Rule,
    source: S,
    player: Player,
    dealer: Dealer,
    phase: TablePhase,

    bet: f64,
    /// Insurance is only on offer before the first decision of a round.
    insurance_offered: bool,
    rewards: Vec<f64>,
    insurance_reward: f64,
}

impl Table<Shoe> {
    /// A table dealing from a freshly shuffled shoe built from the rule.
    pub fn new(rule: &Rule, bank: f64) -> Self {
        let mut shoe = Shoe::new(rule.number_of_decks, rule.cut_card_proportion);
        shoe.shuffle();
        Self::with_source(rule, bank, shoe)
    }

    pub fn with_seed(rule: &Rule, bank: f64, seed: u64) -> Self {
        let mut shoe = Shoe::with_seed(rule.number_of_decks, rule.cut_card_proportion, seed);
        shoe.shuffle();
        Self::with_source(rule, bank, shoe)
    }
}

impl<S: CardSource> Table<S> {
    /// Uses `source` as is, without shuffling it.
    pub fn with_source(rule: &Rule, bank: f64, source: S) -> Self {
        Self {
            rule: *rule,
            source,
            player: Player::new(bank),
            dealer: Dealer::new(),
            phase: TablePhase::Dealing,
            bet: 0.0,
            insurance_offered: false,
            rewards: Vec::new(),
            insurance_reward: 0.0,
        }
    }

    /// Deals player, dealer, player, dealer. The dealer's first card is the up
    /// card. A natural is completed right away.
    #[allowed_phase(Dealing)]
    pub fn deal(&mut self, bet: f64) -> Result<(), BlackjackError> {
        let player_first = self.source.deal_card();
        let up_card = self.source.deal_card();
        let player_second = self.source.deal_card();
        let hole_card = self.source.deal_card();
        self.start_round(bet, [player_first, player_second], up_card, hole_card)
    }

    /// Deals the given player cards and dealer up card. The chosen cards are
    /// taken out of the card source when it can pick cards, and the hole card
    /// still comes from it.
    #[allowed_phase(Dealing)]
    pub fn deal_with(
        &mut self,
        bet: f64,
        player_cards: [Card; 2],
        up_card: Card,
    ) -> Result<(), BlackjackError> {
        let first = self.take_chosen(player_cards[0]);
        let up_card = self.take_chosen(up_card);
        let second = self.take_chosen(player_cards[1]);
        let hole_card = self.source.deal_card();
        self.start_round(bet, [first, second], up_card, hole_card)
    }

    /// The learning state of the current hand, before any action is applied.
    #[allowed_phase(PlayerTurn)]
    pub fn state(&self) -> Result<BaseState, BlackjackError> {
        let hand = self.current_hand()?;
        Ok(BaseState {
            player_total: hand.points(),
            dealer_upcard: self.dealer.face_point()?,
            usable_ace: hand.is_soft(),
            splitable: self.can_split(hand),
            can_double: self.can_double(hand),
        })
    }

    /// Legal actions for the current hand. Empty outside the player's turn.
    pub fn possible_actions(&self) -> Vec<Action> {
        let mut actions = Vec::with_capacity(NUMBER_OF_ACTIONS);
        if self.phase != TablePhase::PlayerTurn {
            return actions;
        }
        let hand = match self.player.current_hand() {
            Some(hand) => hand,
            None => return actions,
        };
        actions.push(Action::Stand);
        actions.push(Action::Hit);
        if self.can_double(hand) {
            actions.push(Action::Double);
        }
        if self.can_split(hand) {
            actions.push(Action::Split);
        }
        if self.can_insure() {
            actions.push(Action::Insurance);
        }
        actions
    }

    /// Applies `action` to the current hand. Actions outside
    /// `possible_actions()` are rejected without touching the table.
    #[allowed_phase(PlayerTurn)]
    pub fn step(&mut self, action: Action) -> Result<(), BlackjackError> {
        if !self.possible_actions().contains(&action) {
            return Err(BlackjackError::InvalidAction(format!(
                "{} is not allowed for hand {} against {}",
                action,
                self.current_hand()?,
                self.dealer
            )));
        }

        match action {
            Action::Stand => self.player.done_with_hand()?,
            Action::Hit => {
                let card = self.source.deal_card();
                self.player.hit(card)?;
            }
            Action::Double => {
                let card = self.source.deal_card();
                self.player.double(card)?;
                self.player.done_with_hand()?;
            }
            Action::Split => {
                let first = self.source.deal_card();
                let second = self.source.deal_card();
                self.player.split(first, second)?;
            }
            Action::Insurance => self.player.insure(self.bet / 2.0)?,
        }
        self.insurance_offered = true;
        self.skip_finished_hands()
    }

    /// Dealer plays, every completed hand is rewarded and paid, insurance is
    /// settled. Rewards are in units of the initial bet, in playing order.
    #[allowed_phase(DealerTurn)]
    pub fn finish(&mut self) -> Result<Vec<f64>, BlackjackError> {
        self.dealer
            .play(&mut self.source, self.rule.dealer_hit_on_soft17);

        let rewards: Vec<f64> = self
            .player
            .completed_hands()
            .iter()
            .map(|hand| self.hand_reward(hand))
            .collect();
        self.player.pay_out(&rewards)?;

        let insurance_money = self
            .player
            .settle_insurance(self.dealer.is_blackjack(), self.rule.payout_insurance);
        self.insurance_reward = if self.bet > 0.0 {
            insurance_money / self.bet
        } else {
            0.0
        };

        log::debug!("Dealer's hand: {}", self.dealer);
        for (i, hand) in self.player.completed_hands().iter().enumerate() {
            log::debug!("Player's hand {}: {}", i, hand);
        }
        log::debug!("Final rewards: {:?}", rewards);

        self.rewards = rewards.clone();
        self.phase = TablePhase::Summary;
        Ok(rewards)
    }

    /// Reshuffles the card source if the cut card was reached and gets ready
    /// for the next deal.
    #[allowed_phase(Summary)]
    pub fn new_round(&mut self) -> Result<(), BlackjackError> {
        self.source.reshuffle_if_needed();
        self.phase = TablePhase::Dealing;
        Ok(())
    }

    pub fn phase(&self) -> TablePhase {
        self.phase
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn dealer(&self) -> &Dealer {
        &self.dealer
    }

    pub fn bank(&self) -> f64 {
        self.player.bank()
    }

    pub fn set_bank(&mut self, bank: f64) {
        self.player.set_bank(bank);
    }

    /// Index of the hand being played, in playing order.
    pub fn current_index(&self) -> usize {
        self.player.current_index()
    }

    pub fn hand_count(&self) -> usize {
        self.player.hand_count()
    }

    /// How many more splits the hand count allows.
    pub fn split_budget(&self) -> usize {
        (self.rule.max_hands as usize).saturating_sub(self.player.hand_count())
    }

    /// True once every player hand is completed.
    pub fn is_terminal(&self) -> bool {
        self.player.is_all_done()
    }

    /// Rewards of the last finished round.
    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    /// Insurance result of the last finished round, in units of the bet.
    pub fn insurance_reward(&self) -> f64 {
        self.insurance_reward
    }

    fn start_round(
        &mut self,
        bet: f64,
        player_cards: [Card; 2],
        up_card: Card,
        hole_card: Card,
    ) -> Result<(), BlackjackError> {
        self.player.init_hand(player_cards, bet)?;
        self.dealer.deal(up_card, hole_card);
        self.bet = bet;
        self.insurance_offered = false;
        self.rewards.clear();
        self.insurance_reward = 0.0;
        self.phase = TablePhase::PlayerTurn;
        self.skip_finished_hands()
    }

    fn take_chosen(&mut self, card: Card) -> Card {
        self.source.take_card(card.point()).unwrap_or(card)
    }

    fn current_hand(&self) -> Result<&PlayerHand, BlackjackError> {
        self.player.current_hand().ok_or_else(|| {
            BlackjackError::InvalidAction(String::from("there is no hand being played"))
        })
    }

    /// Completes hands that need no decision, then hands the turn to the
    /// dealer once nothing is left to play.
    fn skip_finished_hands(&mut self) -> Result<(), BlackjackError> {
        while let Some(hand) = self.player.current_hand() {
            if !self.is_hand_finished(hand) {
                break;
            }
            self.player.done_with_hand()?;
        }
        if self.player.is_all_done() {
            self.phase = TablePhase::DealerTurn;
        }
        Ok(())
    }

    fn is_hand_finished(&self, hand: &PlayerHand) -> bool {
        hand.is_blackjack() || hand.is_bust() || (self.rule.stand_on_21 && hand.points() == 21)
    }

    fn can_double(&self, hand: &PlayerHand) -> bool {
        hand.len() == 2
            && hand.is_initial()
            && self.player.bank() >= hand.bet()
            && self.rule.double_policy.allows(hand.points())
            && (self.rule.allow_das || !hand.hand().is_from_split())
    }

    fn can_split(&self, hand: &PlayerHand) -> bool {
        hand.is_pair()
            && self.player.hand_count() < self.rule.max_hands as usize
            && self.player.bank() >= hand.bet()
    }

    fn can_insure(&self) -> bool {
        self.rule.allow_insurance
            && !self.insurance_offered
            && self.dealer.up_card().map_or(false, |card| card.is_ace())
            && self.player.bank() >= self.bet / 2.0
    }

    fn hand_reward(&self, hand: &PlayerHand) -> f64 {
        let dealer_blackjack = self.dealer.is_blackjack();
        let reward = if hand.is_blackjack() {
            if dealer_blackjack {
                0.0
            } else {
                self.rule.payout_blackjack
            }
        } else if dealer_blackjack || hand.is_bust() {
            -1.0
        } else if self.dealer.is_bust() {
            1.0
        } else {
            match hand.points().cmp(&self.dealer.reveal_hand()) {
                Ordering::Greater => 1.0,
                Ordering::Less => -1.0,
                Ordering::Equal => 0.0,
            }
        };

        if hand.is_doubled() {
            2.0 * reward
        } else {
            reward
        }
    }
}
