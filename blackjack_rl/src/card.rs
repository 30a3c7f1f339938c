use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

use crate::BlackjackError;

static FACE_VALUE_TO_POINT: [u8; 13] = [11, 2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 10, 10];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize)]
pub enum Suit {
    Diamond = 0,
    Club,
    Heart,
    Spade,
}

/// Represents a card in the real world with a suit and a face value.
/// Face values run from 1 (Ace) to 13 (King).
/// Outside the crate cards come from `from_point` or the integer encoding, so
/// a face value is always valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Card {
    pub(crate) face_value: u8,
    pub(crate) suit: Suit,
}

impl Card {
    pub(crate) fn new(face_value: u8, suit: Suit) -> Card {
        debug_assert!((1..=13).contains(&face_value));
        Card { face_value, suit }
    }

    pub fn face_value(&self) -> u8 {
        self.face_value
    }

    pub fn suit(&self) -> Suit {
        self.suit
    }

    /// Builds the plainest card worth `point`: 2 to 9 as themselves, 10 as a
    /// Ten, and 1 or 11 as an Ace.
    pub fn from_point(point: u8, suit: Suit) -> Result<Card, BlackjackError> {
        match point {
            1 | 11 => Ok(Card::new(1, suit)),
            2..=10 => Ok(Card::new(point, suit)),
            _ => Err(BlackjackError::InvalidCards(format!(
                "no card is worth {} points",
                point
            ))),
        }
    }

    /// Nominal blackjack point. Ace counts 11 here; hands reduce it to 1.
    pub fn point(&self) -> u8 {
        FACE_VALUE_TO_POINT[(self.face_value - 1) as usize]
    }

    pub fn is_ace(&self) -> bool {
        self.face_value == 1
    }
}

impl Default for Card {
    fn default() -> Self {
        Card {
            face_value: 1,
            suit: Suit::Diamond,
        }
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let suit = match self.suit {
            Suit::Diamond => 'D',
            Suit::Club => 'C',
            Suit::Heart => 'H',
            Suit::Spade => 'S',
        };
        let value = match self.face_value {
            1 => 'A',
            2 => '2',
            3 => '3',
            4 => '4',
            5 => '5',
            6 => '6',
            7 => '7',
            8 => '8',
            9 => '9',
            10 => 'T',
            11 => 'J',
            12 => 'Q',
            13 => 'K',
            _ => '?',
        };
        write!(f, "{}{}", suit, value)
    }
}

impl From<Card> for u8 {
    fn from(card: Card) -> u8 {
        card.suit as u8 * 13 + card.face_value - 1
    }
}

impl TryFrom<u8> for Card {
    type Error = BlackjackError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let suit = match value / 13 {
            0 => Suit::Diamond,
            1 => Suit::Club,
            2 => Suit::Heart,
            3 => Suit::Spade,
            _ => {
                return Err(BlackjackError::InvalidCards(format!(
                    "{} is not a card index",
                    value
                )))
            }
        };
        Ok(Card {
            suit,
            face_value: value % 13 + 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn points_by_rank() {
        let points: Vec<u8> = (1..=13).map(|v| Card::new(v, Suit::Spade).point()).collect();
        assert_eq!(points, vec![11, 2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 10, 10]);
    }

    #[test]
    fn card_equality_uses_suit_and_rank() {
        assert_eq!(Card::new(13, Suit::Club), Card::new(13, Suit::Club));
        assert_ne!(Card::new(13, Suit::Club), Card::new(13, Suit::Heart));
        assert_ne!(Card::new(13, Suit::Club), Card::new(12, Suit::Club));
    }

    #[test]
    fn card_index_covers_whole_deck() {
        for suit in Suit::iter() {
            for face_value in 1..=13 {
                let card = Card::new(face_value, suit);
                let index: u8 = card.into();
                assert!(index < 52);
                assert_eq!(Card::try_from(index).unwrap(), card);
            }
        }
        assert!(Card::try_from(52).is_err());
    }

    #[test]
    fn from_point() {
        assert!(Card::from_point(11, Suit::Heart).unwrap().is_ace());
        assert!(Card::from_point(1, Suit::Heart).unwrap().is_ace());
        assert_eq!(Card::from_point(10, Suit::Heart).unwrap().point(), 10);
        assert!(Card::from_point(12, Suit::Heart).is_err());
        assert_eq!(Card::new(10, Suit::Spade).to_string(), "ST");
    }

    #[test]
    fn decoding_rejects_impossible_cards() {
        use serde::de::value::{Error, U8Deserializer};
        use serde::de::IntoDeserializer;

        let king_of_spades: U8Deserializer<Error> = 51u8.into_deserializer();
        let card = Card::deserialize(king_of_spades).unwrap();
        assert_eq!((card.face_value(), card.suit()), (13, Suit::Spade));

        let out_of_deck: U8Deserializer<Error> = 60u8.into_deserializer();
        assert!(Card::deserialize(out_of_deck).is_err());
    }
}
