use crate::{card::Card, hand::Hand, shoe::CardSource, BlackjackError};

/// The dealer's hand. The hole card stays out of the hand until the player
/// side of the round is resolved.
#[derive(Debug, Clone, Default)]
pub struct Dealer {
    hand: Hand,
    hole_card: Option<Card>,
}

impl Dealer {
    pub fn new() -> Dealer {
        Dealer {
            hand: Hand::new(),
            hole_card: None,
        }
    }

    pub fn deal(&mut self, up_card: Card, hole_card: Card) {
        self.hand.clear();
        self.hand.add_card(up_card);
        self.hole_card = Some(hole_card);
    }

    pub fn up_card(&self) -> Result<Card, BlackjackError> {
        self.hand.cards().first().copied().ok_or_else(|| {
            BlackjackError::InvalidAction(String::from("dealer has not been dealt yet"))
        })
    }

    /// Point of the face-up card, Ace as 11.
    pub fn face_point(&self) -> Result<u8, BlackjackError> {
        Ok(self.up_card()?.point())
    }

    pub fn is_revealed(&self) -> bool {
        self.hole_card.is_none() && !self.hand.is_empty()
    }

    pub fn reveal(&mut self) {
        if let Some(card) = self.hole_card.take() {
            self.hand.add_card(card);
        }
    }

    /// Reveals the hole card and draws until the dealer must stand.
    pub fn play<S: CardSource>(&mut self, source: &mut S, hit_soft17: bool) {
        self.reveal();
        while !self.must_stand(hit_soft17) {
            self.hand.add_card(source.deal_card());
        }
    }

    fn must_stand(&self, hit_soft17: bool) -> bool {
        let points = self.hand.points();
        if points > 17 {
            true
        } else if points < 17 {
            false
        } else if !self.hand.is_soft() {
            true
        } else {
            !hit_soft17
        }
    }

    /// Points of the cards shown so far.
    pub fn reveal_hand(&self) -> u8 {
        self.hand.points()
    }

    /// Always false while the hole card is hidden.
    pub fn is_blackjack(&self) -> bool {
        self.is_revealed() && self.hand.is_blackjack()
    }

    pub fn is_bust(&self) -> bool {
        self.hand.is_bust()
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }
}

impl std::fmt::Display for Dealer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.hole_card.is_some() {
            write!(f, "{} + hidden card", self.hand)
        } else {
            write!(f, "{}", self.hand)
        }
    }
}
