//! Deterministic single-tape Turing machines.

use std::collections::BTreeSet;
use std::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::error::ValidationError;
use crate::language;
use crate::state::State;
use crate::symbol::Symbol;

/// Head movement after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Left => "L",
            Direction::Right => "R",
        })
    }
}

/// A Turing machine (Q, Σ, Γ, δ, q0, q_accept, q_reject) with Σ ⊆ Γ and a
/// blank symbol in Γ∖Σ. δ is partial; scanning a symbol with no
/// transition is an implicit move to the reject state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tm {
    states: IndexSet<State>,
    alphabet: IndexSet<Symbol>,
    tape_alphabet: IndexSet<Symbol>,
    delta: IndexMap<(State, Symbol), (State, Symbol, Direction)>,
    initial: State,
    accept: State,
    reject: State,
    blank: Symbol,
}

/// One snapshot of a run: state, tape contents and head position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TmSnapshot {
    pub state: State,
    pub tape: Vec<Symbol>,
    pub head: usize,
}

impl Tm {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        states: impl IntoIterator<Item = State>,
        alphabet: impl IntoIterator<Item = Symbol>,
        tape_alphabet: impl IntoIterator<Item = Symbol>,
        transitions: impl IntoIterator<Item = (State, Symbol, State, Symbol, Direction)>,
        initial: State,
        accept: State,
        reject: State,
        blank: Symbol,
    ) -> Result<Self, ValidationError> {
        let states: IndexSet<State> = states.into_iter().collect();
        let alphabet: IndexSet<Symbol> = alphabet.into_iter().collect();
        let tape_alphabet: IndexSet<Symbol> = tape_alphabet.into_iter().collect();

        for q in [&initial, &accept, &reject] {
            if !states.contains(q) {
                return Err(ValidationError::UndeclaredState(q.clone()));
            }
        }
        if accept == reject {
            return Err(ValidationError::AcceptEqualsReject(accept));
        }
        if alphabet.contains(&blank) {
            return Err(ValidationError::BlankInInputAlphabet(blank));
        }
        if !tape_alphabet.contains(&blank) {
            return Err(ValidationError::UndeclaredSymbol(blank));
        }
        for a in &alphabet {
            if !tape_alphabet.contains(a) {
                return Err(ValidationError::InputSymbolNotOnTape(a.clone()));
            }
        }

        let mut delta = IndexMap::new();
        for (p, scanned, q, written, direction) in transitions {
            if !states.contains(&p) {
                return Err(ValidationError::UndeclaredState(p));
            }
            if !states.contains(&q) {
                return Err(ValidationError::UndeclaredState(q));
            }
            if !tape_alphabet.contains(&scanned) {
                return Err(ValidationError::UndeclaredSymbol(scanned));
            }
            if !tape_alphabet.contains(&written) {
                return Err(ValidationError::UndeclaredSymbol(written));
            }
            if delta
                .insert((p.clone(), scanned.clone()), (q, written, direction))
                .is_some()
            {
                return Err(ValidationError::NotDeterministic(p, scanned));
            }
        }

        Ok(Tm {
            states,
            alphabet,
            tape_alphabet,
            delta,
            initial,
            accept,
            reject,
            blank,
        })
    }

    pub fn states(&self) -> &IndexSet<State> {
        &self.states
    }

    pub fn alphabet(&self) -> &IndexSet<Symbol> {
        &self.alphabet
    }

    pub fn blank(&self) -> &Symbol {
        &self.blank
    }

    /// One transition from `state`, mutating the tape. Missing entries in
    /// δ move to the reject state, writing the scanned symbol back and
    /// moving right. Not defined on the accept/reject states.
    pub fn step(&self, state: &State, tape: &mut Vec<Symbol>, head: usize) -> (State, usize) {
        assert!(
            *state != self.accept && *state != self.reject,
            "no transitions out of the halting states"
        );
        let scanned = tape[head].clone();
        let (next, written, direction) = self
            .delta
            .get(&(state.clone(), scanned.clone()))
            .cloned()
            .unwrap_or((self.reject.clone(), scanned, Direction::Right));
        tape[head] = written;
        let head = match direction {
            Direction::Left => head.saturating_sub(1),
            Direction::Right => head + 1,
        };
        if head == tape.len() {
            tape.push(self.blank.clone());
        }
        (next, head)
    }

    fn initial_tape(&self, word: &str) -> Vec<Symbol> {
        let mut tape: Vec<Symbol> = word.chars().map(Symbol::from).collect();
        if tape.is_empty() {
            tape.push(self.blank.clone());
        }
        tape
    }

    /// Run for at most `max_steps` transitions: `Some(true)` on accept,
    /// `Some(false)` on reject, `None` when still undecided at the bound.
    pub fn accepts(&self, word: &str, max_steps: usize) -> Option<bool> {
        let mut tape = self.initial_tape(word);
        let mut head = 0;
        let mut state = self.initial.clone();
        for _ in 0..max_steps {
            (state, head) = self.step(&state, &mut tape, head);
            if state == self.accept {
                return Some(true);
            }
            if state == self.reject {
                return Some(false);
            }
        }
        None
    }

    /// The run trace up to a halting state or the step bound.
    pub fn simulate(&self, word: &str, max_steps: usize) -> Vec<TmSnapshot> {
        let mut tape = self.initial_tape(word);
        let mut head = 0;
        let mut state = self.initial.clone();
        let mut trace = vec![TmSnapshot {
            state: state.clone(),
            tape: tape.clone(),
            head,
        }];
        for _ in 0..max_steps {
            (state, head) = self.step(&state, &mut tape, head);
            trace.push(TmSnapshot {
                state: state.clone(),
                tape: tape.clone(),
                head,
            });
            if state == self.accept || state == self.reject {
                break;
            }
        }
        trace
    }

    /// All words of length at most `n` accepted within `max_steps`, by
    /// exhaustive enumeration of the input alphabet.
    pub fn words_up_to(&self, n: usize, max_steps: usize) -> BTreeSet<String> {
        language::words_up_to(&self.alphabet, n)
            .into_iter()
            .filter(|word| self.accepts(word, max_steps) == Some(true))
            .collect()
    }
}

impl fmt::Display for Tm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Q = {}", crate::state::state_set_label(&self.states))?;
        let symbols = |set: &IndexSet<Symbol>| {
            let mut labels: Vec<&str> = set.iter().map(Symbol::as_str).collect();
            labels.sort_unstable();
            format!("{{{}}}", labels.join(","))
        };
        writeln!(f, "Sigma = {}", symbols(&self.alphabet))?;
        writeln!(f, "Gamma = {}", symbols(&self.tape_alphabet))?;
        let mut rows: Vec<String> = self
            .delta
            .iter()
            .map(|((p, a), (q, b, d))| format!("delta({p}, {a}) = ({q}, {b}, {d})"))
            .collect();
        rows.sort_unstable();
        for row in rows {
            writeln!(f, "{row}")?;
        }
        writeln!(f, "q0 = {}", self.initial)?;
        writeln!(f, "q_accept = {}", self.accept)?;
        write!(f, "q_reject = {}", self.reject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(s: &str) -> State {
        State::from(s)
    }

    fn symbol(s: &str) -> Symbol {
        Symbol::from(s)
    }

    /// Accepts words of even length over {a} by alternating between two
    /// states until the blank is reached.
    fn even_length_machine() -> Tm {
        let blank = symbol("_");
        Tm::new(
            ["even", "odd", "yes", "no"].map(State::from),
            [symbol("a")],
            [symbol("a"), blank.clone()],
            [
                (
                    state("even"),
                    symbol("a"),
                    state("odd"),
                    symbol("a"),
                    Direction::Right,
                ),
                (
                    state("odd"),
                    symbol("a"),
                    state("even"),
                    symbol("a"),
                    Direction::Right,
                ),
                (
                    state("even"),
                    blank.clone(),
                    state("yes"),
                    blank.clone(),
                    Direction::Right,
                ),
                (
                    state("odd"),
                    blank.clone(),
                    state("no"),
                    blank.clone(),
                    Direction::Right,
                ),
            ],
            state("even"),
            state("yes"),
            state("no"),
            blank,
        )
        .unwrap()
    }

    #[test]
    fn test_accepts() {
        let t = even_length_machine();
        assert_eq!(t.accepts("", 100), Some(true));
        assert_eq!(t.accepts("a", 100), Some(false));
        assert_eq!(t.accepts("aa", 100), Some(true));
        assert_eq!(t.accepts("aaa", 100), Some(false));
    }

    #[test]
    fn test_words_up_to() {
        let t = even_length_machine();
        let expected: BTreeSet<String> =
            ["", "aa", "aaaa"].into_iter().map(String::from).collect();
        assert_eq!(t.words_up_to(5, 100), expected);
    }

    #[test]
    fn test_missing_transition_rejects() {
        let blank = symbol("_");
        let t = Tm::new(
            ["start", "yes", "no"].map(State::from),
            [symbol("a")],
            [symbol("a"), blank.clone()],
            [(
                state("start"),
                blank.clone(),
                state("yes"),
                blank.clone(),
                Direction::Right,
            )],
            state("start"),
            state("yes"),
            state("no"),
            blank,
        )
        .unwrap();
        // no transition on `a`: implicit reject
        assert_eq!(t.accepts("a", 100), Some(false));
        assert_eq!(t.accepts("", 100), Some(true));
    }

    #[test]
    fn test_undecided_within_bound() {
        let blank = symbol("_");
        // runs right forever over blanks
        let t = Tm::new(
            ["run", "yes", "no"].map(State::from),
            [symbol("a")],
            [symbol("a"), blank.clone()],
            [
                (
                    state("run"),
                    blank.clone(),
                    state("run"),
                    blank.clone(),
                    Direction::Right,
                ),
                (
                    state("run"),
                    symbol("a"),
                    state("run"),
                    symbol("a"),
                    Direction::Right,
                ),
            ],
            state("run"),
            state("yes"),
            state("no"),
            blank,
        )
        .unwrap();
        assert_eq!(t.accepts("aaa", 50), None);
    }

    #[test]
    fn test_validation() {
        let blank = symbol("_");
        let result = Tm::new(
            ["q", "q"].map(State::from),
            [symbol("a")],
            [symbol("a"), blank.clone()],
            [],
            state("q"),
            state("q"),
            state("q"),
            blank,
        );
        assert_eq!(
            result,
            Err(ValidationError::AcceptEqualsReject(state("q")))
        );

        let result = Tm::new(
            ["s", "y", "n"].map(State::from),
            [symbol("a"), symbol("_")],
            [symbol("a"), symbol("_")],
            [],
            state("s"),
            state("y"),
            state("n"),
            symbol("_"),
        );
        assert_eq!(
            result,
            Err(ValidationError::BlankInInputAlphabet(symbol("_")))
        );
    }

    #[test]
    fn test_simulate_trace() {
        let t = even_length_machine();
        let trace = t.simulate("aa", 100);
        assert_eq!(trace.first().unwrap().state, state("even"));
        assert_eq!(trace.last().unwrap().state, state("yes"));
        assert_eq!(trace.len(), 4);
    }
}
