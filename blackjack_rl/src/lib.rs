pub mod card;
pub mod dealer;
pub mod episode;
mod error;
pub mod hand;
pub mod learning;
pub mod player;
pub mod report;
pub mod shoe;
mod state;
pub mod strategy;
pub mod table;

use serde::{Deserialize, Serialize};
use serde_enum_str::{Deserialize_enum_str, Serialize_enum_str};
use strum_macros::{Display, EnumIter, EnumString};

pub use error::BlackjackError;
pub use state::{ActionValues, BaseState, Policy, QTable};

/// House rules of a table.
#[derive(Clone, Copy, Debug)]
pub struct Rule {
    pub number_of_decks: u8,
    pub cut_card_proportion: f64,
    /// Maximum number of hands a player may hold after splitting.
    pub max_hands: u8,
    pub double_policy: DoublePolicy,
    pub allow_das: bool,
    pub dealer_hit_on_soft17: bool,
    pub allow_insurance: bool,
    /// A hand reaching 21 is completed without asking for a decision.
    pub stand_on_21: bool,

    pub payout_blackjack: f64,
    pub payout_insurance: f64,
}

impl Default for Rule {
    fn default() -> Self {
        Rule {
            number_of_decks: 6,
            cut_card_proportion: 0.8,
            max_hands: 4,
            double_policy: DoublePolicy::AnyTwo,
            allow_das: true,
            dealer_hit_on_soft17: false,
            allow_insurance: true,
            stand_on_21: false,
            payout_blackjack: 1.5,
            payout_insurance: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize_enum_str, Deserialize_enum_str)]
pub enum DoublePolicy {
    AnyTwo,
    NineTenElevenOnly,
    TenElevenOnly,
}

impl DoublePolicy {
    /// Checks whether a two-card hand totalling `points` may be doubled.
    pub fn allows(&self, points: u8) -> bool {
        match self {
            DoublePolicy::AnyTwo => true,
            DoublePolicy::NineTenElevenOnly => (9..=11).contains(&points),
            DoublePolicy::TenElevenOnly => (10..=11).contains(&points),
        }
    }
}

pub const NUMBER_OF_ACTIONS: usize = 5;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
)]
#[strum(ascii_case_insensitive)]
pub enum Action {
    Stand = 0,
    Hit,
    Double,
    Split,
    Insurance,
}

impl Action {
    pub fn index(&self) -> usize {
        *self as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn action_indices_are_dense() {
        for (i, action) in Action::iter().enumerate() {
            assert_eq!(action.index(), i);
        }
        assert_eq!(Action::iter().count(), NUMBER_OF_ACTIONS);
    }

    #[test]
    fn parse_action_ignoring_case() {
        assert_eq!("hit".parse::<Action>().unwrap(), Action::Hit);
        assert_eq!("SPLIT".parse::<Action>().unwrap(), Action::Split);
        assert!("surrender".parse::<Action>().is_err());
        assert_eq!(Action::Double.to_string(), "Double");
    }

    #[test]
    fn double_policy_from_string() {
        let policy: DoublePolicy = "TenElevenOnly".parse().unwrap();
        assert_eq!(policy, DoublePolicy::TenElevenOnly);
        assert!(policy.allows(11));
        assert!(!policy.allows(9));
        assert!(DoublePolicy::AnyTwo.allows(17));
    }
}
