//! Pushdown automata.

use std::collections::BTreeSet;
use std::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::error::ValidationError;
use crate::state::State;
use crate::symbol::{Symbol, display_input};

/// A pushdown automaton (Q, Σ, Γ, δ, q0, F). δ maps
/// (state, input-or-ε, pop-or-ε) to a set of (state, push-or-ε) pairs and
/// may be partial. The machine starts on an empty stack and accepts by
/// final state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pda {
    pub(crate) states: IndexSet<State>,
    pub(crate) alphabet: IndexSet<Symbol>,
    pub(crate) stack_alphabet: IndexSet<Symbol>,
    pub(crate) delta: IndexMap<(State, Option<Symbol>, Option<Symbol>), IndexSet<(State, Option<Symbol>)>>,
    pub(crate) initial: State,
    pub(crate) accepting: IndexSet<State>,
}

/// An instantaneous description: the current state and stack, top last.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Configuration {
    pub state: State,
    pub stack: Vec<Symbol>,
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stack: Vec<&str> = self.stack.iter().map(Symbol::as_str).collect();
        write!(f, "({}, [{}])", self.state, stack.join(""))
    }
}

impl Pda {
    /// Build and validate a PDA from a generic description. Transitions
    /// are (source, input, pop, target, push) with `None` for ε.
    pub fn new(
        states: impl IntoIterator<Item = State>,
        alphabet: impl IntoIterator<Item = Symbol>,
        stack_alphabet: impl IntoIterator<Item = Symbol>,
        transitions: impl IntoIterator<
            Item = (State, Option<Symbol>, Option<Symbol>, State, Option<Symbol>),
        >,
        initial: State,
        accepting: impl IntoIterator<Item = State>,
    ) -> Result<Self, ValidationError> {
        let states: IndexSet<State> = states.into_iter().collect();
        let alphabet: IndexSet<Symbol> = alphabet.into_iter().collect();
        let stack_alphabet: IndexSet<Symbol> = stack_alphabet.into_iter().collect();
        let accepting: IndexSet<State> = accepting.into_iter().collect();

        if !states.contains(&initial) {
            return Err(ValidationError::UndeclaredState(initial));
        }
        for q in &accepting {
            if !states.contains(q) {
                return Err(ValidationError::UndeclaredState(q.clone()));
            }
        }

        let mut delta: IndexMap<_, IndexSet<(State, Option<Symbol>)>> = IndexMap::new();
        for (p, a, pop, q, push) in transitions {
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
            for stack_sym in [&pop, &push].into_iter().flatten() {
                if !stack_alphabet.contains(stack_sym) {
                    return Err(ValidationError::UndeclaredSymbol(stack_sym.clone()));
                }
            }
            delta.entry((p, a, pop)).or_default().insert((q, push));
        }

        Ok(Pda {
            states,
            alphabet,
            stack_alphabet,
            delta,
            initial,
            accepting,
        })
    }

    pub fn states(&self) -> &IndexSet<State> {
        &self.states
    }

    pub fn alphabet(&self) -> &IndexSet<Symbol> {
        &self.alphabet
    }

    pub fn stack_alphabet(&self) -> &IndexSet<Symbol> {
        &self.stack_alphabet
    }

    pub fn initial(&self) -> &State {
        &self.initial
    }

    pub fn accepting(&self) -> &IndexSet<State> {
        &self.accepting
    }

    /// Transitions flattened to (source, input, pop, target, push) rows.
    pub fn transitions(
        &self,
    ) -> impl Iterator<Item = (&State, Option<&Symbol>, Option<&Symbol>, &State, Option<&Symbol>)> + '_
    {
        self.delta.iter().flat_map(|((p, a, pop), moves)| {
            moves
                .iter()
                .map(move |(q, push)| (p, a.as_ref(), pop.as_ref(), q, push.as_ref()))
        })
    }

    /// Whether the stack admits popping `pop` (ε pops always apply).
    fn can_pop(stack: &[Symbol], pop: Option<&Symbol>) -> bool {
        match pop {
            None => true,
            Some(u) => stack.last() == Some(u),
        }
    }

    /// The stack after popping `pop` and pushing `push`.
    fn pop_push(stack: &[Symbol], pop: Option<&Symbol>, push: Option<&Symbol>) -> Vec<Symbol> {
        let mut next: Vec<Symbol> = match pop {
            None => stack.to_vec(),
            Some(_) => stack[..stack.len() - 1].to_vec(),
        };
        if let Some(v) = push {
            next.push(v.clone());
        }
        next
    }

    /// All configurations reachable from `set` by ε-transitions alone.
    ///
    /// Unlike the NFA case this fixed point is not bounded by |Q|: an
    /// ε-cycle that pushes on every lap generates infinitely many
    /// configurations. The closure is capped, and blowing the cap is a
    /// loud failure instead of a hang.
    pub fn epsilon_closure(&self, set: &BTreeSet<Configuration>) -> BTreeSet<Configuration> {
        const CLOSURE_BOUND: usize = 1 << 16;
        let mut closure = set.clone();
        let mut todo: Vec<Configuration> = set.iter().cloned().collect();
        while let Some(source) = todo.pop() {
            assert!(
                closure.len() <= CLOSURE_BOUND,
                "ε-closure exceeded {CLOSURE_BOUND} configurations; an ε-cycle keeps growing the stack"
            );
            for ((p, a, pop), moves) in &self.delta {
                if *p != source.state || a.is_some() {
                    continue;
                }
                if !Self::can_pop(&source.stack, pop.as_ref()) {
                    continue;
                }
                for (q, push) in moves {
                    let target = Configuration {
                        state: q.clone(),
                        stack: Self::pop_push(&source.stack, pop.as_ref(), push.as_ref()),
                    };
                    if closure.insert(target.clone()) {
                        todo.push(target);
                    }
                }
            }
        }
        closure
    }

    /// All configurations reachable from `set` by consuming `a` once,
    /// without closing under ε afterwards.
    pub fn step(&self, set: &BTreeSet<Configuration>, a: &Symbol) -> BTreeSet<Configuration> {
        let mut result = BTreeSet::new();
        for source in set {
            for ((p, input, pop), moves) in &self.delta {
                if *p != source.state || input.as_ref() != Some(a) {
                    continue;
                }
                if !Self::can_pop(&source.stack, pop.as_ref()) {
                    continue;
                }
                for (q, push) in moves {
                    result.insert(Configuration {
                        state: q.clone(),
                        stack: Self::pop_push(&source.stack, pop.as_ref(), push.as_ref()),
                    });
                }
            }
        }
        result
    }

    /// Subset simulation over configurations.
    pub fn accepts(&self, word: &str) -> bool {
        let start = Configuration {
            state: self.initial.clone(),
            stack: Vec::new(),
        };
        let mut current = self.epsilon_closure(&BTreeSet::from([start]));
        for ch in word.chars() {
            let a = Symbol::from(ch);
            current = self.epsilon_closure(&self.step(&current, &a));
        }
        current.iter().any(|c| self.accepting.contains(&c.state))
    }

    /// All accepted words of length at most `n`.
    pub fn words_up_to(&self, n: usize) -> BTreeSet<String> {
        let mut words = BTreeSet::new();

        let start = Configuration {
            state: self.initial.clone(),
            stack: Vec::new(),
        };
        let mut frontier: IndexMap<Configuration, BTreeSet<String>> = IndexMap::new();
        for config in self.epsilon_closure(&BTreeSet::from([start])) {
            if self.accepting.contains(&config.state) {
                words.insert(String::new());
            }
            frontier.entry(config).or_default().insert(String::new());
        }

        for _ in 0..n {
            let mut next: IndexMap<Configuration, BTreeSet<String>> = IndexMap::new();
            for (config, prefixes) in &frontier {
                for a in &self.alphabet {
                    let reached = self.epsilon_closure(
                        &self.step(&BTreeSet::from([config.clone()]), a),
                    );
                    if reached.is_empty() {
                        continue;
                    }
                    let extended: BTreeSet<String> = prefixes
                        .iter()
                        .map(|w| format!("{w}{}", a.as_str()))
                        .collect();
                    for target in reached {
                        if self.accepting.contains(&target.state) {
                            words.extend(extended.iter().cloned());
                        }
                        next.entry(target).or_default().extend(extended.iter().cloned());
                    }
                }
            }
            frontier = next;
        }
        words
    }
}

impl fmt::Display for Pda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Q = {}", crate::state::state_set_label(&self.states))?;
        let symbols = |set: &IndexSet<Symbol>| {
            let mut labels: Vec<&str> = set.iter().map(Symbol::as_str).collect();
            labels.sort_unstable();
            format!("{{{}}}", labels.join(","))
        };
        writeln!(f, "Sigma = {}", symbols(&self.alphabet))?;
        writeln!(f, "Gamma = {}", symbols(&self.stack_alphabet))?;
        let mut rows: Vec<String> = self
            .transitions()
            .map(|(p, a, pop, q, push)| {
                format!(
                    "delta({p}, {}, {}) = ({q}, {})",
                    display_input(a),
                    display_input(pop),
                    display_input(push)
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

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn state(s: &str) -> State {
        State::from(s)
    }

    pub(crate) fn symbol(s: &str) -> Symbol {
        Symbol::from(s)
    }

    /// Sipser 3rd edition figure 2.15: { 0^n 1^n | n >= 0 }, bottom marker
    /// `$`, accepting in q1 (empty word) and q4.
    pub(crate) fn zeros_then_ones() -> Pda {
        let (q1, q2, q3, q4) = (state("q1"), state("q2"), state("q3"), state("q4"));
        let (zero, one, dollar) = (symbol("0"), symbol("1"), symbol("$"));
        Pda::new(
            [q1.clone(), q2.clone(), q3.clone(), q4.clone()],
            [zero.clone(), one.clone()],
            [zero.clone(), dollar.clone()],
            [
                (q1.clone(), None, None, q2.clone(), Some(dollar.clone())),
                (q2.clone(), Some(zero.clone()), None, q2.clone(), Some(zero.clone())),
                (q2.clone(), Some(one.clone()), Some(zero.clone()), q3.clone(), None),
                (q3.clone(), Some(one.clone()), Some(zero.clone()), q3.clone(), None),
                (q3.clone(), None, Some(dollar.clone()), q4.clone(), None),
            ],
            q1.clone(),
            [q1, q4],
        )
        .unwrap()
    }

    /// Sipser figure 2.19: even-length palindromes over {0, 1}.
    pub(crate) fn even_palindromes() -> Pda {
        let (q1, q2, q3, q4) = (state("q1"), state("q2"), state("q3"), state("q4"));
        let (zero, one, dollar) = (symbol("0"), symbol("1"), symbol("$"));
        Pda::new(
            [q1.clone(), q2.clone(), q3.clone(), q4.clone()],
            [zero.clone(), one.clone()],
            [zero.clone(), one.clone(), dollar.clone()],
            [
                (q1.clone(), None, None, q2.clone(), Some(dollar.clone())),
                (q2.clone(), Some(zero.clone()), None, q2.clone(), Some(zero.clone())),
                (q2.clone(), Some(one.clone()), None, q2.clone(), Some(one.clone())),
                (q2.clone(), None, None, q3.clone(), None),
                (q3.clone(), Some(zero.clone()), Some(zero.clone()), q3.clone(), None),
                (q3.clone(), Some(one.clone()), Some(one.clone()), q3.clone(), None),
                (q3.clone(), None, Some(dollar.clone()), q4.clone(), None),
            ],
            q1.clone(),
            [q4],
        )
        .unwrap()
    }

    #[test]
    fn test_accepts_word() {
        let p = zeros_then_ones();
        assert!(p.accepts(""));
        assert!(p.accepts("01"));
        assert!(p.accepts("0011"));
        assert!(!p.accepts("0"));
        assert!(!p.accepts("10"));
        assert!(!p.accepts("001"));
    }

    #[test]
    fn test_words_up_to() {
        let p = zeros_then_ones();
        let expected: BTreeSet<String> =
            ["", "01", "0011"].into_iter().map(String::from).collect();
        assert_eq!(p.words_up_to(4), expected);
    }

    #[test]
    fn test_palindrome_words() {
        let p = even_palindromes();
        assert!(p.accepts("00"));
        assert!(p.accepts("0110"));
        assert!(!p.accepts("0"));
        let expected: BTreeSet<String> = ["", "00", "11", "0000", "0110", "1001", "1111"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(p.words_up_to(4), expected);
    }

    #[test]
    fn test_epsilon_closure_applies_stack_effects() {
        let p = zeros_then_ones();
        let start = Configuration {
            state: state("q1"),
            stack: Vec::new(),
        };
        let closure = p.epsilon_closure(&BTreeSet::from([start]));
        // q1 with empty stack, plus q2 with $ pushed
        assert_eq!(closure.len(), 2);
        assert!(closure.contains(&Configuration {
            state: state("q2"),
            stack: vec![symbol("$")],
        }));
    }

    #[test]
    fn test_validation_rejects_undeclared_stack_symbol() {
        let result = Pda::new(
            [state("q0")],
            [symbol("a")],
            [symbol("x")],
            [(state("q0"), Some(symbol("a")), None, state("q0"), Some(symbol("y")))],
            state("q0"),
            [],
        );
        assert_eq!(
            result,
            Err(ValidationError::UndeclaredSymbol(symbol("y")))
        );
    }
}
