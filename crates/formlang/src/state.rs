//! State labels and dense state sets.

use std::fmt;
use std::sync::Arc;

use fixedbitset::FixedBitSet;
use indexmap::IndexSet;

/// An automaton state: an interned string label compared by value.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct State(Arc<str>);

impl State {
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        State(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for State {
    fn from(label: &str) -> Self {
        State::new(label)
    }
}

impl From<String> for State {
    fn from(label: String) -> Self {
        State::new(label)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

/// Returns a state labeled `hint` that does not occur in `used`, falling
/// back to `hint1`, `hint2`, ... when the plain hint is taken.
pub fn fresh_state<'a>(used: impl IntoIterator<Item = &'a State>, hint: &str) -> State {
    let used: IndexSet<&str> = used.into_iter().map(State::as_str).collect();
    if !used.contains(hint) {
        return State::new(hint);
    }
    let mut index = 1usize;
    loop {
        let candidate = format!("{hint}{index}");
        if !used.contains(candidate.as_str()) {
            return State::new(candidate);
        }
        index += 1;
    }
}

/// The canonical label of a set of states: member labels sorted and joined
/// between braces, e.g. `{q0,q1}`. The empty set prints as `{}`.
///
/// Subset construction and minimization name their merged states with this
/// label so that repeated runs over the same input produce byte-identical
/// automata, not merely equivalent ones.
pub fn state_set_label<'a>(members: impl IntoIterator<Item = &'a State>) -> State {
    let mut labels: Vec<&str> = members.into_iter().map(State::as_str).collect();
    labels.sort_unstable();
    State::new(format!("{{{}}}", labels.join(",")))
}

/// A set of densely numbered states backed by a bit set.
///
/// Algorithms that work on one automaton at a time (minimization, subset
/// construction) number its states `0..n` once and then manipulate these
/// sets instead of label collections.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StateSet {
    bits: FixedBitSet,
}

impl StateSet {
    /// Create a new empty state set with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bits: FixedBitSet::with_capacity(capacity),
        }
    }

    /// Create a state set containing a single state.
    pub fn singleton(state: usize, capacity: usize) -> Self {
        let mut set = Self::with_capacity(capacity);
        set.insert(state);
        set
    }

    /// Insert a state into the set.
    pub fn insert(&mut self, state: usize) {
        if state >= self.bits.len() {
            self.bits.grow(state + 1);
        }
        self.bits.insert(state);
    }

    /// Check if the set contains a state.
    pub fn contains(&self, state: usize) -> bool {
        state < self.bits.len() && self.bits.contains(state)
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.bits.is_clear()
    }

    /// Get the number of states in the set.
    pub fn len(&self) -> usize {
        self.bits.count_ones(..)
    }

    /// Iterate over all states in the set in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.ones()
    }

    /// Union this set with another, modifying self in place.
    pub fn union_with(&mut self, other: &StateSet) {
        if other.bits.len() > self.bits.len() {
            self.bits.grow(other.bits.len());
        }
        self.bits.union_with(&other.bits);
    }

    /// Check if this set intersects with another.
    pub fn intersects(&self, other: &StateSet) -> bool {
        self.bits.intersection(&other.bits).next().is_some()
    }

    /// Create a new set that is the intersection of this set and another.
    pub fn intersection(&self, other: &StateSet) -> StateSet {
        let mut result = self.clone();
        let max_len = result.bits.len().max(other.bits.len());
        result.bits.grow(max_len);
        result.bits.intersect_with(&other.bits);
        result
    }

    /// Create a new set with states not in other.
    pub fn difference(&self, other: &StateSet) -> StateSet {
        let mut result = self.clone();
        result.bits.difference_with(&other.bits);
        result
    }

    /// Remove a state from the set.
    pub fn remove(&mut self, state: usize) {
        if state < self.bits.len() {
            self.bits.set(state, false);
        }
    }

    /// Clear all states from the set.
    pub fn clear(&mut self) {
        self.bits.clear();
    }
}

impl fmt::Debug for StateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<usize> for StateSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let items: Vec<usize> = iter.into_iter().collect();
        let capacity = items.iter().copied().max().map_or(0, |m| m + 1);
        let mut set = Self::with_capacity(capacity);
        for state in items {
            set.insert(state);
        }
        set
    }
}
