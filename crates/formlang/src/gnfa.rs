//! Generalized NFAs and DFA-to-regexp conversion by state elimination.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use log::debug;

use crate::dfa::Dfa;
use crate::regexp::Regexp;
use crate::state::{State, fresh_state};
use crate::symbol::Symbol;

/// A generalized NFA: every ordered state pair carries a regular
/// expression, with absent pairs reading as `Zero`. Only used as the
/// intermediate representation of [`dfa_to_regexp`].
#[derive(Debug, Clone)]
pub struct Gnfa {
    states: IndexSet<State>,
    alphabet: IndexSet<Symbol>,
    delta: IndexMap<(State, State), Regexp>,
    start: State,
    accept: State,
}

impl Gnfa {
    pub fn states(&self) -> &IndexSet<State> {
        &self.states
    }

    pub fn alphabet(&self) -> &IndexSet<Symbol> {
        &self.alphabet
    }

    pub fn start(&self) -> &State {
        &self.start
    }

    pub fn accept(&self) -> &State {
        &self.accept
    }

    /// The label on the edge from `p` to `q`; `Zero` when absent.
    pub fn edge(&self, p: &State, q: &State) -> Regexp {
        self.delta
            .get(&(p.clone(), q.clone()))
            .cloned()
            .unwrap_or(Regexp::Zero)
    }

    /// Rip out every state other than start and accept, folding each
    /// transitive path through the removed state into the direct edges:
    /// new(i,j) = old(i,j) + old(i,rip) . old(rip,rip)* . old(rip,j),
    /// simplified as it goes. Afterwards only the start→accept edge
    /// remains.
    pub fn eliminate(&mut self) {
        let rippable: Vec<State> = self
            .states
            .iter()
            .filter(|q| **q != self.start && **q != self.accept)
            .cloned()
            .collect();

        for rip in rippable {
            self.states.shift_remove(&rip);
            let self_loop = self.edge(&rip, &rip);
            debug!("ripping state {rip}");

            let sources: Vec<State> = self
                .states
                .iter()
                .filter(|q| **q != self.accept)
                .cloned()
                .collect();
            let targets: Vec<State> = self
                .states
                .iter()
                .filter(|q| **q != self.start)
                .cloned()
                .collect();

            for i in &sources {
                let into_rip = self.edge(i, &rip);
                for j in &targets {
                    let out_of_rip = self.edge(&rip, j);
                    let direct = self.edge(i, j);
                    let folded = Regexp::sum(
                        Regexp::concat(
                            into_rip.clone(),
                            Regexp::concat(
                                Regexp::iteration(self_loop.clone()),
                                out_of_rip,
                            ),
                        ),
                        direct,
                    )
                    .simplify();
                    self.delta.insert((i.clone(), j.clone()), folded);
                }
            }

            self.delta
                .retain(|(p, q), _| *p != rip && *q != rip);
        }

        let result = self.edge(&self.start.clone(), &self.accept.clone());
        self.delta.clear();
        self.delta
            .insert((self.start.clone(), self.accept.clone()), result);
    }
}

impl fmt::Display for Gnfa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Q = {}", crate::state::state_set_label(&self.states))?;
        let mut rows: Vec<String> = self
            .delta
            .iter()
            .map(|((p, q), r)| format!("delta({p}, {q}) = {r}"))
            .collect();
        rows.sort_unstable();
        for row in rows {
            writeln!(f, "{row}")?;
        }
        writeln!(f, "q_start = {}", self.start)?;
        write!(f, "q_accept = {}", self.accept)
    }
}

/// Wrap a DFA as a GNFA: fresh start and accept states bridged with `One`
/// edges, and parallel symbol edges between the same state pair folded
/// into a `Sum`.
pub fn dfa_to_gnfa(dfa: &Dfa) -> Gnfa {
    let start = fresh_state(dfa.states(), "start");
    let accept = fresh_state(dfa.states().iter().chain([&start]), "accept");

    let mut states = dfa.states().clone();
    states.insert(start.clone());
    states.insert(accept.clone());

    let mut delta: IndexMap<(State, State), Regexp> = IndexMap::new();
    delta.insert((start.clone(), dfa.initial().clone()), Regexp::One);
    for q in dfa.accepting() {
        delta.insert((q.clone(), accept.clone()), Regexp::One);
    }
    for (p, a, q) in dfa.transitions() {
        let symbol = Regexp::symbol(a.clone());
        match delta.get_mut(&(p.clone(), q.clone())) {
            Some(existing) => {
                *existing = Regexp::sum(existing.clone(), symbol);
            }
            None => {
                delta.insert((p.clone(), q.clone()), symbol);
            }
        }
    }

    Gnfa {
        states,
        alphabet: dfa.alphabet().clone(),
        delta,
        start,
        accept,
    }
}

/// Convert a DFA to a regular expression denoting the same language.
pub fn dfa_to_regexp(dfa: &Dfa) -> Regexp {
    let mut gnfa = dfa_to_gnfa(dfa);
    gnfa.eliminate();
    gnfa.edge(&gnfa.start().clone(), &gnfa.accept().clone())
}
