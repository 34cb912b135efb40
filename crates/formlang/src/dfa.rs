//! Deterministic finite automata.
//!
//! A [`Dfa`] is validated on construction: the transition function must be
//! deterministic and total over the declared alphabet. Values are never
//! mutated after construction; every transformation returns a new
//! automaton.

use std::collections::BTreeSet;
use std::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::error::ValidationError;
use crate::nfa::Nfa;
use crate::state::{State, fresh_state};
use crate::symbol::Symbol;

/// A deterministic finite automaton (Q, Σ, δ, q0, F) with total δ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dfa {
    states: IndexSet<State>,
    alphabet: IndexSet<Symbol>,
    delta: IndexMap<(State, Symbol), State>,
    initial: State,
    accepting: IndexSet<State>,
}

/// Which product automaton to build from two DFAs over the same alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductKind {
    Union,
    Intersection,
    SymmetricDifference,
}

impl Dfa {
    /// Build and validate a DFA from a generic description.
    ///
    /// Fails if the initial state, an accepting state, a transition
    /// endpoint or a transition symbol is undeclared, if two transitions
    /// share a source state and symbol, or if some (state, symbol) pair
    /// has no transition at all. A non-total description is rejected,
    /// never silently completed; see [`Dfa::new_with_trap`].
    pub fn new(
        states: impl IntoIterator<Item = State>,
        alphabet: impl IntoIterator<Item = Symbol>,
        transitions: impl IntoIterator<Item = (State, Symbol, State)>,
        initial: State,
        accepting: impl IntoIterator<Item = State>,
    ) -> Result<Self, ValidationError> {
        let dfa = Self::new_partial(states, alphabet, transitions, initial, accepting)?;
        for q in &dfa.states {
            for a in &dfa.alphabet {
                if !dfa.delta.contains_key(&(q.clone(), a.clone())) {
                    return Err(ValidationError::NotTotal(q.clone(), a.clone()));
                }
            }
        }
        Ok(dfa)
    }

    /// Build a DFA from a possibly partial description, completing the
    /// transition function with a fresh trap state that loops to itself on
    /// every symbol.
    pub fn new_with_trap(
        states: impl IntoIterator<Item = State>,
        alphabet: impl IntoIterator<Item = Symbol>,
        transitions: impl IntoIterator<Item = (State, Symbol, State)>,
        initial: State,
        accepting: impl IntoIterator<Item = State>,
    ) -> Result<Self, ValidationError> {
        let mut dfa = Self::new_partial(states, alphabet, transitions, initial, accepting)?;
        let missing: Vec<(State, Symbol)> = dfa
            .states
            .iter()
            .flat_map(|q| dfa.alphabet.iter().map(move |a| (q.clone(), a.clone())))
            .filter(|key| !dfa.delta.contains_key(key))
            .collect();
        if !missing.is_empty() {
            let trap = fresh_state(&dfa.states, "trap");
            dfa.states.insert(trap.clone());
            for (q, a) in missing {
                dfa.delta.insert((q, a), trap.clone());
            }
            for a in &dfa.alphabet {
                dfa.delta.insert((trap.clone(), a.clone()), trap.clone());
            }
        }
        Ok(dfa)
    }

    /// Validates everything except totality.
    fn new_partial(
        states: impl IntoIterator<Item = State>,
        alphabet: impl IntoIterator<Item = Symbol>,
        transitions: impl IntoIterator<Item = (State, Symbol, State)>,
        initial: State,
        accepting: impl IntoIterator<Item = State>,
    ) -> Result<Self, ValidationError> {
        let states: IndexSet<State> = states.into_iter().collect();
        let alphabet: IndexSet<Symbol> = alphabet.into_iter().collect();
        let accepting: IndexSet<State> = accepting.into_iter().collect();

        if !states.contains(&initial) {
            return Err(ValidationError::UndeclaredState(initial));
        }
        for q in &accepting {
            if !states.contains(q) {
                return Err(ValidationError::UndeclaredState(q.clone()));
            }
        }

        let mut delta = IndexMap::new();
        for (p, a, q) in transitions {
            if !states.contains(&p) {
                return Err(ValidationError::UndeclaredState(p));
            }
            if !states.contains(&q) {
                return Err(ValidationError::UndeclaredState(q));
            }
            if !alphabet.contains(&a) {
                return Err(ValidationError::UndeclaredSymbol(a));
            }
            if delta.insert((p.clone(), a.clone()), q).is_some() {
                return Err(ValidationError::NotDeterministic(p, a));
            }
        }

        Ok(Dfa {
            states,
            alphabet,
            delta,
            initial,
            accepting,
        })
    }

    /// Assembles a DFA that is total and consistent by construction.
    pub(crate) fn from_parts(
        states: IndexSet<State>,
        alphabet: IndexSet<Symbol>,
        delta: IndexMap<(State, Symbol), State>,
        initial: State,
        accepting: IndexSet<State>,
    ) -> Self {
        Dfa {
            states,
            alphabet,
            delta,
            initial,
            accepting,
        }
    }

    pub fn states(&self) -> &IndexSet<State> {
        &self.states
    }

    pub fn alphabet(&self) -> &IndexSet<Symbol> {
        &self.alphabet
    }

    pub fn initial(&self) -> &State {
        &self.initial
    }

    pub fn accepting(&self) -> &IndexSet<State> {
        &self.accepting
    }

    pub fn transitions(&self) -> impl Iterator<Item = (&State, &Symbol, &State)> + '_ {
        self.delta.iter().map(|((p, a), q)| (p, a, q))
    }

    /// The successor of `q` on `a`. Total for declared states and symbols.
    pub fn target(&self, q: &State, a: &Symbol) -> &State {
        self.delta
            .get(&(q.clone(), a.clone()))
            .expect("transition function is total after validation")
    }

    /// Runs the automaton over `word` and reports acceptance.
    ///
    /// A word containing a character outside the alphabet is a validation
    /// error at this boundary: δ is not defined for it.
    pub fn accepts(&self, word: &str) -> Result<bool, ValidationError> {
        let mut q = &self.initial;
        for ch in word.chars() {
            let a = Symbol::from(ch);
            if !self.alphabet.contains(&a) {
                return Err(ValidationError::UndeclaredSymbol(a));
            }
            q = self.target(q, &a);
        }
        Ok(self.accepting.contains(q))
    }

    /// The visited-state trace of a run: (state, remaining input) rows,
    /// starting at the initial state with the full word left to read.
    pub fn simulate(&self, word: &str) -> Result<Vec<(State, String)>, ValidationError> {
        let mut q = self.initial.clone();
        let mut rows = vec![(q.clone(), word.to_string())];
        let chars: Vec<char> = word.chars().collect();
        for (k, ch) in chars.iter().enumerate() {
            let a = Symbol::from(*ch);
            if !self.alphabet.contains(&a) {
                return Err(ValidationError::UndeclaredSymbol(a));
            }
            q = self.target(&q, &a).clone();
            rows.push((q.clone(), chars[k + 1..].iter().collect()));
        }
        Ok(rows)
    }

    /// All accepted words of length at most `n`.
    pub fn words_up_to(&self, n: usize) -> BTreeSet<String> {
        let mut words = BTreeSet::new();
        if self.accepting.contains(&self.initial) {
            words.insert(String::new());
        }
        let mut frontier: BTreeSet<(State, String)> =
            BTreeSet::from([(self.initial.clone(), String::new())]);
        for _ in 0..n {
            let mut next = BTreeSet::new();
            for (q, word) in &frontier {
                for a in &self.alphabet {
                    let q1 = self.target(q, a).clone();
                    let mut extended = word.clone();
                    extended.push_str(a.as_str());
                    if self.accepting.contains(&q1) {
                        words.insert(extended.clone());
                    }
                    next.insert((q1, extended));
                }
            }
            frontier = next;
        }
        words
    }

    /// The automaton accepting the complement language.
    pub fn complement(&self) -> Dfa {
        let accepting = self
            .states
            .iter()
            .filter(|q| !self.accepting.contains(*q))
            .cloned()
            .collect();
        Dfa {
            accepting,
            ..self.clone()
        }
    }

    /// Synchronized product of two DFAs over the same alphabet.
    pub fn product(&self, other: &Dfa, kind: ProductKind) -> Dfa {
        assert_eq!(
            self.alphabet, other.alphabet,
            "product requires identical alphabets"
        );

        let pair_state = |p: &State, q: &State| State::new(format!("({p},{q})"));

        let mut states = IndexSet::new();
        let mut accepting = IndexSet::new();
        let mut delta = IndexMap::new();
        for p in &self.states {
            for q in &other.states {
                let pq = pair_state(p, q);
                let is_final = match kind {
                    ProductKind::Union => {
                        self.accepting.contains(p) || other.accepting.contains(q)
                    }
                    ProductKind::Intersection => {
                        self.accepting.contains(p) && other.accepting.contains(q)
                    }
                    ProductKind::SymmetricDifference => {
                        self.accepting.contains(p) != other.accepting.contains(q)
                    }
                };
                if is_final {
                    accepting.insert(pq.clone());
                }
                for a in &self.alphabet {
                    let target = pair_state(self.target(p, a), other.target(q, a));
                    delta.insert((pq.clone(), a.clone()), target);
                }
                states.insert(pq);
            }
        }

        let initial = pair_state(&self.initial, &other.initial);
        Dfa::from_parts(states, self.alphabet.clone(), delta, initial, accepting)
    }

    pub fn union(&self, other: &Dfa) -> Dfa {
        self.product(other, ProductKind::Union)
    }

    pub fn intersection(&self, other: &Dfa) -> Dfa {
        self.product(other, ProductKind::Intersection)
    }

    pub fn symmetric_difference(&self, other: &Dfa) -> Dfa {
        self.product(other, ProductKind::SymmetricDifference)
    }

    /// The NFA accepting the reverse language: edges flipped, a fresh
    /// initial state wired by ε to the old accepting states.
    pub fn reverse(&self) -> Nfa {
        let q0 = fresh_state(&self.states, "q");
        let mut states = self.states.clone();
        states.insert(q0.clone());

        let mut delta: IndexMap<(State, Option<Symbol>), IndexSet<State>> = IndexMap::new();
        for ((p, a), q) in &self.delta {
            delta
                .entry((q.clone(), Some(a.clone())))
                .or_default()
                .insert(p.clone());
        }
        delta.insert((q0.clone(), None), self.accepting.clone());

        let accepting = IndexSet::from([self.initial.clone()]);
        Nfa::from_parts(states, self.alphabet.clone(), delta, q0, accepting)
    }

    /// States reachable from the initial state.
    pub fn reachable_states(&self) -> IndexSet<State> {
        let mut reachable = IndexSet::new();
        let mut todo = vec![self.initial.clone()];
        while let Some(q) = todo.pop() {
            if !reachable.insert(q.clone()) {
                continue;
            }
            for a in &self.alphabet {
                let q1 = self.target(&q, a);
                if !reachable.contains(q1) {
                    todo.push(q1.clone());
                }
            }
        }
        reachable
    }

    /// Restriction to the reachable part; the result is still total.
    pub fn remove_unreachable(&self) -> Dfa {
        let reachable = self.reachable_states();
        let delta = self
            .delta
            .iter()
            .filter(|((p, _), _)| reachable.contains(p))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let accepting = self
            .accepting
            .iter()
            .filter(|q| reachable.contains(*q))
            .cloned()
            .collect();
        Dfa::from_parts(
            reachable,
            self.alphabet.clone(),
            delta,
            self.initial.clone(),
            accepting,
        )
    }

    /// True if the automata differ only in state names: a bijection chase
    /// from the initial pair that respects transitions and acceptance.
    pub fn isomorphic(&self, other: &Dfa) -> bool {
        if self.alphabet != other.alphabet || self.states.len() != other.states.len() {
            return false;
        }
        let mut forward: IndexMap<State, State> = IndexMap::new();
        let mut backward: IndexMap<State, State> = IndexMap::new();
        let mut todo = vec![(self.initial.clone(), other.initial.clone())];
        while let Some((p, q)) = todo.pop() {
            if self.accepting.contains(&p) != other.accepting.contains(&q) {
                return false;
            }
            match (forward.get(&p), backward.get(&q)) {
                (Some(mapped), _) => {
                    if *mapped != q {
                        return false;
                    }
                    continue;
                }
                (None, Some(_)) => return false,
                (None, None) => {
                    forward.insert(p.clone(), q.clone());
                    backward.insert(q.clone(), p.clone());
                }
            }
            for a in &self.alphabet {
                todo.push((self.target(&p, a).clone(), other.target(&q, a).clone()));
            }
        }
        forward.len() == self.states.len()
    }
}

impl fmt::Display for Dfa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Q = {}", crate::state::state_set_label(&self.states))?;
        let mut symbols: Vec<&str> = self.alphabet.iter().map(Symbol::as_str).collect();
        symbols.sort_unstable();
        writeln!(f, "Sigma = {{{}}}", symbols.join(","))?;
        let mut rows: Vec<String> = self
            .delta
            .iter()
            .map(|((p, a), q)| format!("delta({p}, {a}) = {q}"))
            .collect();
        rows.sort_unstable();
        for row in rows {
            writeln!(f, "{row}")?;
        }
        writeln!(f, "q0 = {}", self.initial)?;
        write!(f, "F = {}", crate::state::state_set_label(&self.accepting))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn state(s: &str) -> State {
        State::from(s)
    }

    pub(crate) fn symbol(s: &str) -> Symbol {
        Symbol::from(s)
    }

    /// Accepts words over {a, b} that end in b.
    pub(crate) fn ends_in_b() -> Dfa {
        Dfa::new(
            [state("S"), state("T")],
            [symbol("a"), symbol("b")],
            [
                (state("S"), symbol("a"), state("S")),
                (state("S"), symbol("b"), state("T")),
                (state("T"), symbol("a"), state("S")),
                (state("T"), symbol("b"), state("T")),
            ],
            state("S"),
            [state("T")],
        )
        .unwrap()
    }

    #[test]
    fn test_accepts_word() {
        let d = ends_in_b();
        assert!(d.accepts("abab").unwrap());
        assert!(!d.accepts("abaa").unwrap());
        assert!(!d.accepts("").unwrap());
        assert!(matches!(
            d.accepts("abc"),
            Err(ValidationError::UndeclaredSymbol(_))
        ));
    }

    #[test]
    fn test_simulate_word() {
        let d = ends_in_b();
        let trace: Vec<State> = d.simulate("abab").unwrap().into_iter().map(|r| r.0).collect();
        let expected: Vec<State> = ["S", "S", "T", "S", "T"].map(state).to_vec();
        assert_eq!(trace, expected);
    }

    #[test]
    fn test_words_up_to() {
        let d = ends_in_b();
        let words = d.words_up_to(3);
        let expected: BTreeSet<String> = ["b", "ab", "bb", "aab", "abb", "bab", "bbb"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(words, expected);
    }

    #[test]
    fn test_validation_rejects_non_total() {
        let result = Dfa::new(
            [state("q0"), state("q1")],
            [symbol("a"), symbol("b")],
            [
                (state("q0"), symbol("a"), state("q0")),
                (state("q0"), symbol("b"), state("q1")),
                (state("q1"), symbol("a"), state("q0")),
            ],
            state("q0"),
            [state("q1")],
        );
        assert_eq!(
            result,
            Err(ValidationError::NotTotal(state("q1"), symbol("b")))
        );
    }

    #[test]
    fn test_validation_rejects_nondeterminism() {
        let result = Dfa::new(
            [state("q0")],
            [symbol("a")],
            [
                (state("q0"), symbol("a"), state("q0")),
                (state("q0"), symbol("a"), state("q0")),
            ],
            state("q0"),
            [],
        );
        assert_eq!(
            result,
            Err(ValidationError::NotDeterministic(state("q0"), symbol("a")))
        );
    }

    #[test]
    fn test_trap_completion() {
        let d = Dfa::new_with_trap(
            [state("q0"), state("q1")],
            [symbol("a"), symbol("b")],
            [
                (state("q0"), symbol("a"), state("q1")),
                (state("q1"), symbol("a"), state("q1")),
                (state("q1"), symbol("b"), state("q1")),
            ],
            state("q0"),
            [state("q1")],
        )
        .unwrap();
        // one trap state added, self-looping on every symbol
        assert_eq!(d.states().len(), 3);
        let trap = state("trap");
        assert_eq!(d.target(&state("q0"), &symbol("b")), &trap);
        assert_eq!(d.target(&trap, &symbol("a")), &trap);
        assert_eq!(d.target(&trap, &symbol("b")), &trap);
        assert!(!d.accepts("b").unwrap());
        assert!(d.accepts("a").unwrap());
    }

    #[test]
    fn test_complement_and_products() {
        let d = ends_in_b();
        let c = d.complement();
        assert!(c.accepts("abaa").unwrap());
        assert!(!c.accepts("abab").unwrap());

        let n = 4;
        let union = d.union(&c);
        let inter = d.intersection(&c);
        let all: BTreeSet<String> =
            crate::language::words_up_to(d.alphabet(), n);
        assert_eq!(union.words_up_to(n), all);
        assert_eq!(inter.words_up_to(n), BTreeSet::new());

        let sym = d.symmetric_difference(&d);
        assert_eq!(sym.words_up_to(n), BTreeSet::new());
    }

    #[test]
    fn test_reverse() {
        let d = ends_in_b();
        let r = d.reverse();
        // reversed language: words starting with b
        assert!(r.accepts("b"));
        assert!(r.accepts("baba"));
        assert!(!r.accepts("ab"));
        assert!(!r.accepts(""));
    }

    #[test]
    fn test_remove_unreachable() {
        let d = Dfa::new(
            [state("q0"), state("q1"), state("dead")],
            [symbol("a")],
            [
                (state("q0"), symbol("a"), state("q1")),
                (state("q1"), symbol("a"), state("q1")),
                (state("dead"), symbol("a"), state("dead")),
            ],
            state("q0"),
            [state("q1")],
        )
        .unwrap();
        let trimmed = d.remove_unreachable();
        assert_eq!(trimmed.states().len(), 2);
        assert_eq!(trimmed.words_up_to(2), d.words_up_to(2));
    }

    #[test]
    fn test_isomorphic_is_name_blind() {
        let d = ends_in_b();
        let renamed = Dfa::new(
            [state("x"), state("y")],
            [symbol("a"), symbol("b")],
            [
                (state("x"), symbol("a"), state("x")),
                (state("x"), symbol("b"), state("y")),
                (state("y"), symbol("a"), state("x")),
                (state("y"), symbol("b"), state("y")),
            ],
            state("x"),
            [state("y")],
        )
        .unwrap();
        assert!(d.isomorphic(&renamed));
        assert!(!d.isomorphic(&d.complement()));
    }
}
