use crate::{
    card::{Card, Suit},
    BlackjackError,
};

use strum::IntoEnumIterator;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Where the table gets its cards from.
pub trait CardSource {
    fn deal_card(&mut self) -> Card;

    /// Called between rounds, never in the middle of a hand. Returns true if
    /// the source was reshuffled.
    fn reshuffle_if_needed(&mut self) -> bool {
        false
    }

    /// Takes a card worth `point` out of the undealt cards, so a card picked
    /// by the caller still leaves the source at most once per shuffle.
    /// Sources that cannot pick cards return `None`.
    fn take_card(&mut self, _point: u8) -> Option<Card> {
        None
    }
}

/// Represents a shoe in the real world.
#[derive(Debug, Clone)]
pub struct Shoe {
    number_of_decks: u8,
    cut_card_index: usize,
    cards: Vec<Card>,
    current_index: usize,
    rng: StdRng,
}

impl Shoe {
    /// Creates a new shoe with ordered cards.
    pub fn new(number_of_decks: u8, cut_card_proportion: f64) -> Shoe {
        Self::with_rng(
            number_of_decks,
            cut_card_proportion,
            StdRng::from_entropy(),
        )
    }

    /// Creates a new shoe with ordered cards whose shuffles are reproducible.
    pub fn with_seed(number_of_decks: u8, cut_card_proportion: f64, seed: u64) -> Shoe {
        Self::with_rng(
            number_of_decks,
            cut_card_proportion,
            StdRng::seed_from_u64(seed),
        )
    }

    fn with_rng(number_of_decks: u8, cut_card_proportion: f64, rng: StdRng) -> Shoe {
        let number_of_decks = number_of_decks.max(1);
        let mut cards = Vec::with_capacity(number_of_decks as usize * 52);
        for _ in 0..number_of_decks {
            for suit in Suit::iter() {
                for face_value in 1..=13 {
                    cards.push(Card { face_value, suit });
                }
            }
        }
        let proportion = cut_card_proportion.clamp(0.0, 1.0);
        Shoe {
            number_of_decks,
            cut_card_index: (proportion * cards.len() as f64) as usize,
            cards,
            current_index: 0,
            rng,
        }
    }

    /// Returns the dealt cards back into the shoe, shuffles, and burns the
    /// top card.
    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut self.rng);
        self.current_index = 1;
    }

    /// Returns the dealt cards back into the shoe and shuffles, making sure the
    /// given cards come out first. Cards are given in points (1 or 11 is an
    /// Ace, 10 is any ten-valued card). No card is burnt, so the first deal
    /// returns `firsts[0]`.
    pub fn shuffle_with_firsts(&mut self, firsts: &[u8]) -> Result<(), BlackjackError> {
        let mut counts = [self.number_of_decks; 52];
        let mut ordered = Vec::with_capacity(self.cards.len());

        for point in firsts {
            let card_integer = find_suitable_card(&counts, *point).ok_or_else(|| {
                BlackjackError::InvalidCards(format!(
                    "the shoe has no card left worth {} for {:?}",
                    point, firsts
                ))
            })?;
            counts[card_integer as usize] -= 1;
            ordered.push(Card::try_from(card_integer)?);
        }

        for suit in Suit::iter() {
            for face_value in 1..=13 {
                let card = Card { face_value, suit };
                let card_integer: u8 = card.into();
                for _ in 0..counts[card_integer as usize] {
                    ordered.push(card);
                }
            }
        }

        ordered[firsts.len()..].shuffle(&mut self.rng);
        self.cards = ordered;
        self.current_index = 0;
        Ok(())
    }

    /// Checks if the cut card has been reached.
    pub fn reached_cut_card(&self) -> bool {
        self.current_index >= self.cut_card_index
    }

    pub fn remaining(&self) -> usize {
        self.cards.len() - self.current_index
    }

    pub fn number_of_decks(&self) -> u8 {
        self.number_of_decks
    }
}

impl CardSource for Shoe {
    fn deal_card(&mut self) -> Card {
        if self.current_index >= self.cards.len() {
            log::warn!("Shoe ran out of cards in the middle of a hand, reshuffling");
            self.shuffle();
        }
        let card = self.cards[self.current_index];
        self.current_index += 1;
        card
    }

    fn reshuffle_if_needed(&mut self) -> bool {
        if self.reached_cut_card() {
            log::debug!(
                "Cut card reached with {} cards left, reshuffling",
                self.remaining()
            );
            self.shuffle();
            true
        } else {
            false
        }
    }

    /// Picks the matching card nearest the back of the shoe and moves it to
    /// the front, keeping the order of every other undealt card.
    fn take_card(&mut self, point: u8) -> Option<Card> {
        let undealt = &mut self.cards[self.current_index..];
        let position = undealt.iter().rposition(|card| card.point() == point)?;
        undealt[..=position].rotate_right(1);
        let card = undealt[0];
        self.current_index += 1;
        Some(card)
    }
}

fn find_suitable_card(counts: &[u8; 52], point: u8) -> Option<u8> {
    let (lo, hi) = match point {
        1 | 11 => (1, 1),
        10 => (10, 13),
        2..=9 => (point, point),
        _ => return None,
    };

    for face_value in lo..=hi {
        for suit in Suit::iter() {
            let card: u8 = Card { face_value, suit }.into();
            if counts[card as usize] > 0 {
                return Some(card);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number_of_cards_is_correct(shoe: &Shoe) -> bool {
        let mut counts = [0u8; 52];
        for card in &shoe.cards {
            let card_integer: u8 = (*card).into();
            counts[card_integer as usize] += 1;
        }
        counts.iter().all(|c| *c == shoe.number_of_decks)
    }

    #[test]
    fn new_shoe_is_ordered() {
        let number_of_decks = 3;
        let shoe = Shoe::new(number_of_decks, 0.5);
        assert!(number_of_cards_is_correct(&shoe));
        assert_eq!(shoe.cards.len(), number_of_decks as usize * 52);
        for suit in Suit::iter() {
            for face_value in 1..=13 {
                let card = Card { face_value, suit };
                let card_integer: u8 = card.into();
                for i in 0..number_of_decks {
                    assert_eq!(card, shoe.cards[card_integer as usize + 52 * i as usize]);
                }
            }
        }
    }

    #[test]
    fn shuffle_burns_one_card() {
        let mut shoe = Shoe::with_seed(1, 0.5, 7);
        shoe.shuffle();
        assert!(number_of_cards_is_correct(&shoe));
        assert_eq!(shoe.remaining(), 51);
        let burnt = shoe.cards[0];
        let dealt: Vec<Card> = (0..51).map(|_| shoe.deal_card()).collect();
        assert!(!dealt.contains(&burnt));
    }

    #[test]
    fn each_card_dealt_at_most_once_per_shuffle() {
        let mut shoe = Shoe::with_seed(1, 1.0, 3);
        shoe.shuffle();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..51 {
            let card = shoe.deal_card();
            assert!(seen.insert(card), "{} dealt twice", card);
        }
    }

    #[test]
    fn test_shuffle_with_firsts() {
        let mut shoe = Shoe::with_seed(1, 0.5, 11);
        let mut firsts = vec![11, 2, 6, 6, 9];
        shoe.shuffle_with_firsts(&firsts).unwrap();
        assert!(number_of_cards_is_correct(&shoe));
        for point in &firsts {
            assert_eq!(shoe.deal_card().point(), *point);
        }

        firsts = vec![9, 10, 10, 10, 10, 10];
        shoe.shuffle_with_firsts(&firsts).unwrap();
        assert!(number_of_cards_is_correct(&shoe));
        for point in &firsts {
            assert_eq!(shoe.deal_card().point(), *point);
        }
    }

    #[test]
    fn invalid_firsts_are_rejected() {
        let mut shoe = Shoe::with_seed(1, 0.5, 1);
        assert!(shoe.shuffle_with_firsts(&[6, 6, 6, 6, 6]).is_err());
        assert!(shoe.shuffle_with_firsts(&[10; 17]).is_err());
        assert!(shoe.shuffle_with_firsts(&[0]).is_err());
    }

    #[test]
    fn reshuffles_only_after_cut_card() {
        let mut shoe = Shoe::with_seed(1, 0.5, 5);
        shoe.shuffle();
        assert!(!shoe.reshuffle_if_needed());
        while !shoe.reached_cut_card() {
            shoe.deal_card();
        }
        assert!(shoe.reshuffle_if_needed());
        assert_eq!(shoe.remaining(), 51);
    }

    #[test]
    fn taken_cards_leave_the_shoe() {
        let mut shoe = Shoe::with_seed(1, 1.0, 13);
        shoe.shuffle_with_firsts(&[2, 3, 4]).unwrap();
        let ace = shoe.take_card(11).unwrap();
        assert!(ace.is_ace());
        assert_eq!(shoe.remaining(), 51);

        let dealt: Vec<Card> = (0..51).map(|_| shoe.deal_card()).collect();
        let points: Vec<u8> = dealt[..3].iter().map(|card| card.point()).collect();
        assert_eq!(points, vec![2, 3, 4]);
        assert!(!dealt.contains(&ace));

        shoe.shuffle_with_firsts(&[11, 11, 11, 11]).unwrap();
        for _ in 0..4 {
            shoe.deal_card();
        }
        assert_eq!(shoe.take_card(11), None);
    }

    #[test]
    fn empty_shoe_recovers() {
        let mut shoe = Shoe::with_seed(1, 1.0, 9);
        shoe.shuffle();
        for _ in 0..51 {
            shoe.deal_card();
        }
        assert_eq!(shoe.remaining(), 0);
        shoe.deal_card();
        assert_eq!(shoe.remaining(), 50);
    }
}
