use crate::{card::Card, BlackjackError};

/// An ordered group of cards. Totals are derived from the cards on demand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hand {
    cards: Vec<Card>,
    /// Hands produced by a split never count as blackjack.
    from_split: bool,
}

impl Hand {
    pub fn new() -> Hand {
        Hand {
            cards: Vec::with_capacity(3),
            from_split: false,
        }
    }

    pub fn with_cards(cards: &[Card]) -> Hand {
        Hand {
            cards: cards.to_vec(),
            from_split: false,
        }
    }

    pub fn add_card(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Best total not above 21, counting as many aces as 11 as possible.
    /// When nothing keeps the total at 21 or below, every ace counts 1.
    pub fn points(&self) -> u8 {
        self.evaluate().0
    }

    /// True if an ace is still counted as 11.
    pub fn is_soft(&self) -> bool {
        self.evaluate().1
    }

    pub fn is_bust(&self) -> bool {
        self.points() > 21
    }

    pub fn is_blackjack(&self) -> bool {
        !self.from_split && self.cards.len() == 2 && self.points() == 21
    }

    /// Two cards of equal point value. A King and a Queen make a pair.
    pub fn is_pair(&self) -> bool {
        self.cards.len() == 2 && self.cards[0].point() == self.cards[1].point()
    }

    pub fn is_from_split(&self) -> bool {
        self.from_split
    }

    /// Moves the second card of a pair into a new hand. Both hands are marked
    /// as split hands afterwards.
    pub fn split(&mut self) -> Result<Hand, BlackjackError> {
        if !self.is_pair() {
            return Err(BlackjackError::InvalidAction(format!(
                "cannot split a hand that is not a pair: {}",
                self
            )));
        }
        let mut new_hand = Hand::new();
        new_hand.from_split = true;
        if let Some(card) = self.cards.pop() {
            new_hand.cards.push(card);
        }
        self.from_split = true;
        Ok(new_hand)
    }

    pub fn clear(&mut self) {
        self.cards.clear();
        self.from_split = false;
    }

    fn evaluate(&self) -> (u8, bool) {
        let mut hard_total: u16 = 0;
        let mut has_ace = false;
        for card in &self.cards {
            if card.is_ace() {
                has_ace = true;
                hard_total += 1;
            } else {
                hard_total += card.point() as u16;
            }
        }
        // Two aces at 11 would already be 22, so at most one ace is promoted.
        if has_ace && hard_total + 10 <= 21 {
            ((hard_total + 10) as u8, true)
        } else {
            (hard_total.min(u8::MAX as u16) as u8, false)
        }
    }
}

impl std::fmt::Display for Hand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, card) in self.cards.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", card)?;
        }
        write!(f, "] ({})", self.points())
    }
}

/// A hand owned by the player, with the stake riding on it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerHand {
    hand: Hand,
    /// Total stake on this hand, including the doubling stake.
    bet: f64,
    doubled: bool,
    /// True until the hand gets a third card. Gates double and split.
    is_initial: bool,
}

impl PlayerHand {
    pub fn new(bet: f64) -> PlayerHand {
        PlayerHand {
            hand: Hand::new(),
            bet,
            doubled: false,
            is_initial: true,
        }
    }

    pub fn with_cards(cards: &[Card], bet: f64) -> PlayerHand {
        PlayerHand {
            hand: Hand::with_cards(cards),
            bet,
            doubled: false,
            is_initial: cards.len() <= 2,
        }
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub fn add_card(&mut self, card: Card) {
        if self.hand.len() >= 2 {
            self.is_initial = false;
        }
        self.hand.add_card(card);
    }

    pub fn split(&mut self) -> Result<PlayerHand, BlackjackError> {
        let hand = self.hand.split()?;
        self.is_initial = true;
        Ok(PlayerHand {
            hand,
            bet: self.bet,
            doubled: false,
            is_initial: true,
        })
    }

    pub fn add_bet(&mut self, amount: f64) -> Result<(), BlackjackError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(BlackjackError::InvalidAction(format!(
                "bet amount must be non-negative, got {}",
                amount
            )));
        }
        self.bet += amount;
        Ok(())
    }

    pub fn mark_as_doubled(&mut self) {
        self.doubled = true;
    }

    pub fn bet(&self) -> f64 {
        self.bet
    }

    /// The stake one reward unit stands for. Rewards of doubled hands already
    /// carry the factor 2, so the unit is half of the doubled stake.
    pub fn unit_bet(&self) -> f64 {
        if self.doubled {
            self.bet / 2.0
        } else {
            self.bet
        }
    }

    pub fn is_doubled(&self) -> bool {
        self.doubled
    }

    pub fn is_initial(&self) -> bool {
        self.is_initial
    }

    pub fn cards(&self) -> &[Card] {
        self.hand.cards()
    }

    pub fn len(&self) -> usize {
        self.hand.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hand.is_empty()
    }

    pub fn points(&self) -> u8 {
        self.hand.points()
    }

    pub fn is_soft(&self) -> bool {
        self.hand.is_soft()
    }

    pub fn is_bust(&self) -> bool {
        self.hand.is_bust()
    }

    pub fn is_blackjack(&self) -> bool {
        self.hand.is_blackjack()
    }

    pub fn is_pair(&self) -> bool {
        self.hand.is_pair()
    }
}

impl std::fmt::Display for PlayerHand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} bet {}", self.hand, self.bet)?;
        if self.doubled {
            write!(f, " doubled")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Suit;

    fn card(face_value: u8) -> Card {
        Card::new(face_value, Suit::Spade)
    }

    fn hand_of(face_values: &[u8]) -> Hand {
        let cards: Vec<Card> = face_values.iter().map(|v| card(*v)).collect();
        Hand::with_cards(&cards)
    }

    /// Exhaustive reference: best total over all ways of counting aces.
    fn best_total(face_values: &[u8]) -> u8 {
        let aces = face_values.iter().filter(|v| **v == 1).count() as u16;
        let others: u16 = face_values
            .iter()
            .filter(|v| **v != 1)
            .map(|v| card(*v).point() as u16)
            .sum();
        let mut best = None;
        for elevens in 0..=aces {
            let total = others + elevens * 11 + (aces - elevens);
            if total <= 21 && best.map_or(true, |b| total > b) {
                best = Some(total);
            }
        }
        best.unwrap_or(others + aces) as u8
    }

    #[test]
    fn ace_king_is_soft_blackjack() {
        let hand = hand_of(&[1, 13]);
        assert_eq!(hand.points(), 21);
        assert!(hand.is_blackjack());
        assert!(hand.is_soft());
    }

    #[test]
    fn three_kings_bust() {
        let mut hand = hand_of(&[13, 13]);
        hand.add_card(card(13));
        assert_eq!(hand.points(), 30);
        assert!(hand.is_bust());
        assert!(!hand.is_blackjack());
    }

    #[test]
    fn hands_without_aces_sum_simply() {
        let samples: [&[u8]; 4] = [&[2, 3], &[10, 12, 5], &[9, 7, 4], &[1, 4, 3]];
        for values in samples {
            let hand = hand_of(values);
            let simple: u16 = values.iter().map(|v| card(*v).point() as u16).sum();
            if values.contains(&1) {
                assert_eq!(hand.points() as u16, simple);
                assert!(hand.is_soft());
            } else {
                assert_eq!(hand.points() as u16, simple);
                assert!(!hand.is_soft());
            }
        }
    }

    #[test]
    fn multiple_aces_take_best_subset() {
        let samples: [&[u8]; 8] = [
            &[1, 1],
            &[1, 1, 1],
            &[1, 1, 9],
            &[1, 1, 10],
            &[1, 1, 1, 1, 7],
            &[1, 5, 1, 13],
            &[1, 1, 13, 13],
            &[1, 1, 1, 8],
        ];
        for values in samples {
            assert_eq!(hand_of(values).points(), best_total(values), "{:?}", values);
        }
        assert!(hand_of(&[1, 1]).is_soft());
        assert_eq!(hand_of(&[1, 1]).points(), 12);
        assert!(!hand_of(&[1, 1, 10]).is_soft());
        assert_eq!(hand_of(&[1, 1, 13, 13]).points(), 22);
    }

    #[test]
    fn blackjack_needs_exactly_two_cards() {
        assert!(!hand_of(&[7, 7, 7]).is_blackjack());
        assert!(!hand_of(&[1, 5, 5]).is_blackjack());
        assert!(hand_of(&[11, 1]).is_blackjack());
    }

    #[test]
    fn split_pair_of_ten_valued_cards() {
        let mut hand = Hand::with_cards(&[card(13), Card::new(12, Suit::Heart)]);
        assert!(hand.is_pair());
        let original_points: u16 = hand.cards().iter().map(|c| c.point() as u16).sum();
        let other = hand.split().unwrap();
        assert_eq!(hand.len(), 1);
        assert_eq!(other.len(), 1);
        assert_eq!(hand.cards()[0], card(13));
        assert_eq!(other.cards()[0], Card::new(12, Suit::Heart));
        assert_eq!(
            hand.cards()[0].point() as u16 + other.cards()[0].point() as u16,
            original_points
        );
    }

    #[test]
    fn split_hands_are_never_blackjack() {
        let mut hand = hand_of(&[1, 1]);
        let mut other = hand.split().unwrap();
        hand.add_card(card(13));
        other.add_card(card(9));
        assert_eq!(hand.points(), 21);
        assert!(!hand.is_blackjack());
        assert_eq!(other.points(), 20);
        assert!(other.is_soft());
        assert!(!other.is_blackjack());
    }

    #[test]
    fn split_rejects_non_pairs() {
        assert!(hand_of(&[9, 10]).split().is_err());
        assert!(hand_of(&[5, 5, 5]).split().is_err());
        assert!(hand_of(&[5]).split().is_err());
    }

    #[test]
    fn player_hand_bet_bookkeeping() {
        let mut hand = PlayerHand::with_cards(&[card(5), card(6)], 10.0);
        assert!(hand.is_initial());
        assert!(hand.add_bet(-1.0).is_err());
        assert!(hand.add_bet(f64::NAN).is_err());
        hand.add_bet(10.0).unwrap();
        hand.mark_as_doubled();
        hand.add_card(card(9));
        assert!(!hand.is_initial());
        assert!(hand.is_doubled());
        assert_eq!(hand.bet(), 20.0);
        assert_eq!(hand.unit_bet(), 10.0);
    }

    #[test]
    fn player_split_keeps_bet() {
        let mut hand = PlayerHand::with_cards(&[card(8), card(8)], 5.0);
        let mut other = hand.split().unwrap();
        hand.add_card(card(3));
        other.add_card(card(2));
        assert_eq!(other.bet(), 5.0);
        assert!(hand.is_initial());
        assert!(other.is_initial());
        assert_eq!(hand.points(), 11);
        assert_eq!(other.points(), 10);
    }
}
