//! Nondeterministic finite automata with ε-transitions.
//!
//! Transition inputs are `Option<Symbol>`, with `None` standing for ε, so
//! the "ε is not part of the alphabet" invariant is structural rather than
//! checked.

use std::collections::BTreeSet;
use std::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::error::ValidationError;
use crate::ident::IdGen;
use crate::state::State;
use crate::symbol::{Symbol, display_input};

/// A nondeterministic finite automaton (Q, Σ, δ, q0, F) where δ maps
/// (state, symbol-or-ε) to a set of successor states and may be partial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nfa {
    states: IndexSet<State>,
    alphabet: IndexSet<Symbol>,
    delta: IndexMap<(State, Option<Symbol>), IndexSet<State>>,
    initial: State,
    accepting: IndexSet<State>,
}

impl Nfa {
    /// Build and validate an NFA from a generic description. `None` as the
    /// transition symbol denotes an ε-move.
    pub fn new(
        states: impl IntoIterator<Item = State>,
        alphabet: impl IntoIterator<Item = Symbol>,
        transitions: impl IntoIterator<Item = (State, Option<Symbol>, State)>,
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

        let mut delta: IndexMap<(State, Option<Symbol>), IndexSet<State>> = IndexMap::new();
        for (p, a, q) in transitions {
            if !states.contains(&p) {
                return Err(ValidationError::UndeclaredState(p));
            }
            if !states.contains(&q) {
                return Err(ValidationError::UndeclaredState(q));
            }
            if let Some(sym) = &a {
                if !alphabet.contains(sym) {
                    return Err(ValidationError::UndeclaredSymbol(sym.clone()));
                }
            }
            delta.entry((p, a)).or_default().insert(q);
        }

        Ok(Nfa {
            states,
            alphabet,
            delta,
            initial,
            accepting,
        })
    }

    pub(crate) fn from_parts(
        states: IndexSet<State>,
        alphabet: IndexSet<Symbol>,
        delta: IndexMap<(State, Option<Symbol>), IndexSet<State>>,
        initial: State,
        accepting: IndexSet<State>,
    ) -> Self {
        Nfa {
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

    pub fn transitions(&self) -> impl Iterator<Item = (&State, Option<&Symbol>, &State)> + '_ {
        self.delta
            .iter()
            .flat_map(|((p, a), qs)| qs.iter().map(move |q| (p, a.as_ref(), q)))
    }

    /// The successor set of `q` on the given input, empty when δ is
    /// undefined there.
    pub fn targets(&self, q: &State, a: Option<&Symbol>) -> IndexSet<State> {
        self.delta
            .get(&(q.clone(), a.cloned()))
            .cloned()
            .unwrap_or_default()
    }

    /// The least set containing `set` that is closed under ε-transitions.
    ///
    /// Worklist fixed point; terminates on every finite automaton, ε-cycles
    /// included, because each state enters the result at most once.
    pub fn epsilon_closure(&self, set: &IndexSet<State>) -> IndexSet<State> {
        let mut closure = set.clone();
        let mut todo: Vec<State> = set.iter().cloned().collect();
        while let Some(q) = todo.pop() {
            for q1 in self.targets(&q, None) {
                if closure.insert(q1.clone()) {
                    todo.push(q1);
                }
            }
        }
        closure
    }

    /// ε-closure of a single state.
    pub fn epsilon_closure_of(&self, q: &State) -> IndexSet<State> {
        self.epsilon_closure(&IndexSet::from([q.clone()]))
    }

    /// All states reachable from an element of `set` via one `a`-move,
    /// without closing under ε afterwards.
    pub fn step(&self, set: &IndexSet<State>, a: &Symbol) -> IndexSet<State> {
        let mut result = IndexSet::new();
        for q in set {
            result.extend(self.targets(q, Some(a)));
        }
        result
    }

    /// Runs the subset simulation over `word`. Characters outside the
    /// alphabet simply lead nowhere.
    pub fn accepts(&self, word: &str) -> bool {
        let mut current = self.epsilon_closure_of(&self.initial);
        for ch in word.chars() {
            let a = Symbol::from(ch);
            current = self.epsilon_closure(&self.step(&current, &a));
        }
        current.iter().any(|q| self.accepting.contains(q))
    }

    /// All accepted words of length at most `n`.
    pub fn words_up_to(&self, n: usize) -> BTreeSet<String> {
        // cache per-state closures and closure-composed single steps once
        let closures: IndexMap<State, IndexSet<State>> = self
            .states
            .iter()
            .map(|q| (q.clone(), self.epsilon_closure_of(q)))
            .collect();
        let mut closed_step: IndexMap<(State, Symbol), IndexSet<State>> = IndexMap::new();
        for ((q, a), targets) in &self.delta {
            let Some(sym) = a else {
                continue;
            };
            let mut closed = IndexSet::new();
            for target in targets {
                closed.extend(closures[target].iter().cloned());
            }
            closed_step.insert((q.clone(), sym.clone()), closed);
        }
        let can_terminate = |q: &State| {
            closures[q].iter().any(|r| self.accepting.contains(r))
        };

        let mut words = BTreeSet::new();
        if can_terminate(&self.initial) {
            words.insert(String::new());
        }

        let mut frontier: IndexMap<State, BTreeSet<String>> = IndexMap::new();
        for q in &closures[&self.initial] {
            frontier.entry(q.clone()).or_default().insert(String::new());
        }

        for _ in 0..n {
            let mut next: IndexMap<State, BTreeSet<String>> = IndexMap::new();
            for (q, prefixes) in &frontier {
                for a in &self.alphabet {
                    let Some(targets) = closed_step.get(&(q.clone(), a.clone())) else {
                        continue;
                    };
                    let extended: BTreeSet<String> = prefixes
                        .iter()
                        .map(|w| format!("{w}{}", a.as_str()))
                        .collect();
                    for q1 in targets {
                        if can_terminate(q1) {
                            words.extend(extended.iter().cloned());
                        }
                        next.entry(q1.clone())
                            .or_default()
                            .extend(extended.iter().cloned());
                    }
                }
            }
            frontier = next;
        }
        words
    }
}

/// Kleene star of an NFA: a fresh accepting initial state, plus ε-moves
/// from every accepting state back to the old initial state.
pub fn nfa_repetition(n: &Nfa, ids: &mut IdGen) -> Nfa {
    let q0 = State::new(ids.generate("q"));
    let mut states = n.states.clone();
    states.insert(q0.clone());

    let mut accepting = n.accepting.clone();
    accepting.insert(q0.clone());

    let mut delta = n.delta.clone();
    for q in &accepting {
        delta
            .entry((q.clone(), None))
            .or_default()
            .insert(n.initial.clone());
    }

    Nfa::from_parts(states, n.alphabet.clone(), delta, q0, accepting)
}

/// Union of two NFAs with disjoint state sets: a fresh initial state with
/// ε-branches to both old initial states.
pub fn nfa_union(n1: &Nfa, n2: &Nfa, ids: &mut IdGen) -> Nfa {
    assert!(
        n1.states.is_disjoint(&n2.states),
        "union requires disjoint state sets"
    );
    let q0 = State::new(ids.generate("q"));
    let mut states = n1.states.clone();
    states.extend(n2.states.iter().cloned());
    states.insert(q0.clone());

    let mut alphabet = n1.alphabet.clone();
    alphabet.extend(n2.alphabet.iter().cloned());

    let mut delta = n1.delta.clone();
    delta.extend(n2.delta.iter().map(|(k, v)| (k.clone(), v.clone())));
    delta.insert(
        (q0.clone(), None),
        IndexSet::from([n1.initial.clone(), n2.initial.clone()]),
    );

    let mut accepting = n1.accepting.clone();
    accepting.extend(n2.accepting.iter().cloned());

    Nfa::from_parts(states, alphabet, delta, q0, accepting)
}

/// Concatenation of two NFAs with disjoint state sets: ε-bridges from the
/// first automaton's accepting states to the second's initial state.
pub fn nfa_concatenation(n1: &Nfa, n2: &Nfa) -> Nfa {
    assert!(
        n1.states.is_disjoint(&n2.states),
        "concatenation requires disjoint state sets"
    );
    let mut states = n1.states.clone();
    states.extend(n2.states.iter().cloned());

    let mut alphabet = n1.alphabet.clone();
    alphabet.extend(n2.alphabet.iter().cloned());

    let mut delta = n1.delta.clone();
    delta.extend(n2.delta.iter().map(|(k, v)| (k.clone(), v.clone())));
    for q in &n1.accepting {
        delta
            .entry((q.clone(), None))
            .or_default()
            .insert(n2.initial.clone());
    }

    Nfa::from_parts(
        states,
        alphabet,
        delta,
        n1.initial.clone(),
        n2.accepting.clone(),
    )
}

impl fmt::Display for Nfa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Q = {}", crate::state::state_set_label(&self.states))?;
        let mut symbols: Vec<&str> = self.alphabet.iter().map(Symbol::as_str).collect();
        symbols.sort_unstable();
        writeln!(f, "Sigma = {{{}}}", symbols.join(","))?;
        let mut rows: Vec<String> = self
            .delta
            .iter()
            .map(|((p, a), qs)| {
                format!(
                    "delta({p}, {}) = {}",
                    display_input(a.as_ref()),
                    crate::state::state_set_label(qs)
                )
            })
            .collect();
        rows.sort_unstable();
        for row in rows {
            writeln!(f, "{row}")?;
        }
        writeln!(f, "q0 = {}", self.initial)?;
        write!(f, "F = {}", crate::state::state_set_label(&self.accepting))
    }
}
