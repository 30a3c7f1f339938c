use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::{Action, NUMBER_OF_ACTIONS};

/// Canonical learning key of a decision point: the current hand against the
/// dealer's up card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BaseState {
    pub player_total: u8,
    /// Ace counts 11.
    pub dealer_upcard: u8,
    pub usable_ace: bool,
    pub splitable: bool,
    pub can_double: bool,
}

impl BaseState {
    /// Actions a greedy policy may pick in this state. Insurance is a side bet
    /// and never part of it.
    pub fn candidate_actions(&self) -> Vec<Action> {
        let mut actions = vec![Action::Stand, Action::Hit];
        if self.can_double {
            actions.push(Action::Double);
        }
        if self.splitable {
            actions.push(Action::Split);
        }
        actions
    }
}

impl std::fmt::Display for BaseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} vs {}",
            if self.usable_ace { "soft" } else { "hard" },
            self.player_total,
            self.dealer_upcard
        )?;
        if self.splitable {
            write!(f, " pair")?;
        }
        if self.can_double {
            write!(f, " double")?;
        }
        Ok(())
    }
}

/// One estimate per action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionValues([f64; NUMBER_OF_ACTIONS]);

impl ActionValues {
    /// The best of `actions`. Ties go to the action listed first.
    pub fn best_of(&self, actions: &[Action]) -> Option<Action> {
        let mut best: Option<Action> = None;
        for action in actions {
            match best {
                Some(b) if self[b] >= self[*action] => {}
                _ => best = Some(*action),
            }
        }
        best
    }
}

impl Index<Action> for ActionValues {
    type Output = f64;
    fn index(&self, index: Action) -> &Self::Output {
        &self.0[index.index()]
    }
}

impl IndexMut<Action> for ActionValues {
    fn index_mut(&mut self, index: Action) -> &mut Self::Output {
        &mut self.0[index.index()]
    }
}

/// Action-value estimates. Reading a state that was never written gives 0 for
/// every action.
#[derive(Debug, Default, Clone)]
pub struct QTable {
    data: HashMap<BaseState, ActionValues>,
}

impl QTable {
    pub fn new() -> QTable {
        QTable {
            data: HashMap::new(),
        }
    }

    pub fn get(&self, state: &BaseState, action: Action) -> f64 {
        self.data.get(state).map_or(0.0, |values| values[action])
    }

    pub fn values(&self, state: &BaseState) -> ActionValues {
        self.data.get(state).copied().unwrap_or_default()
    }

    /// Greedy action over the state's candidate actions.
    pub fn best_action(&self, state: &BaseState) -> Option<Action> {
        self.values(state).best_of(&state.candidate_actions())
    }

    /// Value of the greedy action, 0 for unseen states.
    pub fn max_value(&self, state: &BaseState) -> f64 {
        let values = self.values(state);
        values
            .best_of(&state.candidate_actions())
            .map_or(0.0, |action| values[action])
    }

    pub fn contains_state(&self, state: &BaseState) -> bool {
        self.data.contains_key(state)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BaseState, &ActionValues)> {
        self.data.iter()
    }

    pub fn states(&self) -> impl Iterator<Item = &BaseState> {
        self.data.keys()
    }
}

impl Index<&BaseState> for QTable {
    type Output = ActionValues;
    fn index(&self, index: &BaseState) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<&BaseState> for QTable {
    fn index_mut(&mut self, index: &BaseState) -> &mut Self::Output {
        self.data.entry(*index).or_default()
    }
}

impl FromIterator<(BaseState, ActionValues)> for QTable {
    fn from_iter<I: IntoIterator<Item = (BaseState, ActionValues)>>(iter: I) -> Self {
        QTable {
            data: iter.into_iter().collect(),
        }
    }
}

/// Decision per state.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Policy {
    data: HashMap<BaseState, Action>,
}

impl Policy {
    pub fn new() -> Policy {
        Policy {
            data: HashMap::new(),
        }
    }

    pub fn get(&self, state: &BaseState) -> Option<Action> {
        self.data.get(state).copied()
    }

    pub fn insert(&mut self, state: BaseState, action: Action) -> Option<Action> {
        self.data.insert(state, action)
    }

    pub fn contains_state(&self, state: &BaseState) -> bool {
        self.data.contains_key(state)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BaseState, &Action)> {
        self.data.iter()
    }
}

impl FromIterator<(BaseState, Action)> for Policy {
    fn from_iter<I: IntoIterator<Item = (BaseState, Action)>>(iter: I) -> Self {
        Policy {
            data: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(player_total: u8, splitable: bool, can_double: bool) -> BaseState {
        BaseState {
            player_total,
            dealer_upcard: 10,
            usable_ace: false,
            splitable,
            can_double,
        }
    }

    #[test]
    fn states_are_keys_by_value() {
        let mut q = QTable::new();
        q[&state(16, false, true)][Action::Hit] = 0.25;
        let same = state(16, false, true);
        assert_eq!(q[&same][Action::Hit], 0.25);
        assert_eq!(q.get(&same, Action::Stand), 0.0);
        assert_eq!(q.get(&state(16, false, false), Action::Hit), 0.0);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn candidate_actions_follow_flags() {
        assert_eq!(
            state(12, false, false).candidate_actions(),
            vec![Action::Stand, Action::Hit]
        );
        assert_eq!(
            state(16, true, true).candidate_actions(),
            vec![Action::Stand, Action::Hit, Action::Double, Action::Split]
        );
    }

    #[test]
    fn best_action_ignores_unavailable_actions() {
        let mut q = QTable::new();
        let s = state(11, false, false);
        q[&s][Action::Double] = 5.0;
        q[&s][Action::Stand] = -0.5;
        q[&s][Action::Hit] = 0.1;
        assert_eq!(q.best_action(&s), Some(Action::Hit));
        assert_eq!(q.max_value(&s), 0.1);
        assert_eq!(q.max_value(&state(5, false, false)), 0.0);
    }

    #[test]
    fn ties_go_to_first_candidate() {
        let q = QTable::new();
        assert_eq!(q.best_action(&state(20, true, true)), Some(Action::Stand));
    }
}
