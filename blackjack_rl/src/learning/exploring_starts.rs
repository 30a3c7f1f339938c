use crate::{
    card::{Card, Suit},
    Action,
};

/// A forced beginning of a round: the player's two cards, the dealer's up
/// card and the first action taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExploringStart {
    pub player_cards: [Card; 2],
    pub dealer_up_card: Card,
    pub action: Action,
}

const SOFT_ACTIONS: [Action; 3] = [Action::Stand, Action::Hit, Action::Double];
const PAIR_ACTIONS: [Action; 4] = [Action::Split, Action::Stand, Action::Hit, Action::Double];
const HARD_ACTIONS: [Action; 3] = [Action::Stand, Action::Hit, Action::Double];

/// Every two-card start worth a decision, against every up card:
/// - Ace with 2 to 9, played with Stand, Hit or Double;
/// - a pair of every point value, played with Split, Stand, Hit or Double;
/// - two different cards from 2 to 10, played with Stand, Hit or Double.
pub fn generate_exploring_starts() -> Vec<ExploringStart> {
    let mut player_hands: Vec<([u8; 2], &[Action])> = Vec::new();
    for other in 2..=9 {
        player_hands.push(([11, other], &SOFT_ACTIONS));
    }
    for point in 2..=11 {
        player_hands.push(([point, point], &PAIR_ACTIONS));
    }
    for first in 2..=10 {
        for second in (first + 1)..=10 {
            player_hands.push(([first, second], &HARD_ACTIONS));
        }
    }

    let mut starts = Vec::new();
    for dealer_point in 2..=11 {
        for (points, actions) in &player_hands {
            for action in actions.iter() {
                let player_cards = [
                    card_of(points[0], Suit::Spade),
                    card_of(points[1], Suit::Heart),
                ];
                starts.push(ExploringStart {
                    player_cards,
                    dealer_up_card: card_of(dealer_point, Suit::Club),
                    action: *action,
                });
            }
        }
    }
    starts
}

/// Only called with points 2..=11, which always have a card.
fn card_of(point: u8, suit: Suit) -> Card {
    Card::from_point(point, suit).unwrap_or_default()
}
