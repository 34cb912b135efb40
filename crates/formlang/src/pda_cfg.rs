//! PDA normal forms and the PDA-to-CFG construction.
//!
//! The Sipser triple construction needs its input in single-accepting-state
//! and push/pop form, and (unless told the machine already accepts on empty
//! stack) wrapped with a bottom marker. Each normal form is derivable on
//! its own; [`pda_to_cfg`] applies the missing ones to a private copy.

use indexmap::{IndexMap, IndexSet};
use log::debug;

use crate::cfg::{Alternative, Cfg, Rule, Sym, Terminal, Variable};
use crate::pda::Pda;
use crate::state::{State, fresh_state};
use crate::symbol::Symbol;

/// True if every transition either pushes exactly one stack symbol or pops
/// exactly one, never both and never neither.
pub fn is_push_pop(pda: &Pda) -> bool {
    pda.transitions()
        .all(|(_, _, pop, _, push)| pop.is_some() != push.is_some())
}

/// A stack symbol not declared in `used`: drawn from a list of marker
/// glyphs, falling back to indexed `$` names.
fn fresh_stack_symbol(used: &IndexSet<Symbol>) -> Symbol {
    for candidate in ["$", "@", "#", "*", "&", "!", "?"] {
        let symbol = Symbol::from(candidate);
        if !used.contains(&symbol) {
            return symbol;
        }
    }
    let mut index = 0usize;
    loop {
        let symbol = Symbol::new(format!("${index}"));
        if !used.contains(&symbol) {
            return symbol;
        }
        index += 1;
    }
}

/// Give the PDA exactly one accepting state, wiring each old accepting
/// state to a fresh one by an ε-move that leaves the stack alone.
pub fn to_single_accepting_state_in_place(pda: &mut Pda) {
    if pda.accepting.len() == 1 {
        return;
    }
    let accept = fresh_state(&pda.states, "q_accept");
    pda.states.insert(accept.clone());
    for q in std::mem::take(&mut pda.accepting) {
        pda.delta
            .entry((q, None, None))
            .or_default()
            .insert((accept.clone(), None));
    }
    pda.accepting = IndexSet::from([accept]);
}

pub fn to_single_accepting_state(pda: &Pda) -> Pda {
    let mut p = pda.clone();
    to_single_accepting_state_in_place(&mut p);
    p
}

/// Split every transition that pushes and pops at once, or does neither,
/// through a fresh intermediate state, using a fresh placeholder stack
/// symbol for the do-nothing case. Implies a single accepting state.
pub fn to_push_pop_in_place(pda: &mut Pda) {
    to_single_accepting_state_in_place(pda);

    let placeholder = fresh_stack_symbol(&pda.stack_alphabet);
    pda.stack_alphabet.insert(placeholder.clone());

    let old_delta = std::mem::take(&mut pda.delta);
    let mut delta: IndexMap<_, IndexSet<(State, Option<Symbol>)>> = IndexMap::new();
    for ((p, a, pop), moves) in old_delta {
        for (q, push) in moves {
            match (&pop, &push) {
                (Some(_), None) | (None, Some(_)) => {
                    delta
                        .entry((p.clone(), a.clone(), pop.clone()))
                        .or_default()
                        .insert((q, push));
                }
                (None, None) => {
                    let mid = fresh_state(&pda.states, "M");
                    pda.states.insert(mid.clone());
                    delta
                        .entry((p.clone(), a.clone(), None))
                        .or_default()
                        .insert((mid.clone(), Some(placeholder.clone())));
                    delta
                        .entry((mid, None, Some(placeholder.clone())))
                        .or_default()
                        .insert((q, None));
                }
                (Some(_), Some(_)) => {
                    let mid = fresh_state(&pda.states, "M");
                    pda.states.insert(mid.clone());
                    delta
                        .entry((p.clone(), a.clone(), pop.clone()))
                        .or_default()
                        .insert((mid.clone(), None));
                    delta
                        .entry((mid, None, None))
                        .or_default()
                        .insert((q, push));
                }
            }
        }
    }
    pda.delta = delta;
}

pub fn to_push_pop(pda: &Pda) -> Pda {
    let mut p = pda.clone();
    to_push_pop_in_place(&mut p);
    p
}

/// Make acceptance coincide with an empty stack: a fresh bottom marker is
/// pushed by a new initial state and popped on the way into a new, single
/// accepting state.
pub fn to_accept_on_empty_stack_in_place(pda: &mut Pda) {
    let bottom = fresh_stack_symbol(&pda.stack_alphabet);
    pda.stack_alphabet.insert(bottom.clone());

    let initial = fresh_state(&pda.states, "q_initial");
    pda.states.insert(initial.clone());
    pda.delta
        .entry((initial.clone(), None, None))
        .or_default()
        .insert((pda.initial.clone(), Some(bottom.clone())));
    pda.initial = initial;

    let accept = fresh_state(&pda.states, "q_accept");
    pda.states.insert(accept.clone());
    for q in std::mem::take(&mut pda.accepting) {
        pda.delta
            .entry((q, None, Some(bottom.clone())))
            .or_default()
            .insert((accept.clone(), None));
    }
    pda.accepting = IndexSet::from([accept]);
}

pub fn to_accept_on_empty_stack(pda: &Pda) -> Pda {
    let mut p = pda.clone();
    to_accept_on_empty_stack_in_place(&mut p);
    p
}

fn pair_variable(p: &State, q: &State) -> Variable {
    Variable::new(format!("{p}'{q}"))
}

/// Convert a PDA to a context-free grammar generating the same language
/// (Sipser 3rd ed., p. 122).
///
/// A variable A_pq derives exactly the words that take the machine from p
/// with an empty stack to q with an empty stack. Three rule families:
/// A_pq → a A_rs b for a push transition (p,a) → (r, push u) matched with
/// a pop transition (s,b, pop u) → q; A_pq → A_pr A_rq for every state
/// triple; A_pp → ε for every state. The start variable pairs the initial
/// with the single accepting state.
///
/// Pass `accepts_on_empty_stack = true` when the machine already accepts
/// exactly on empty stack; otherwise a bottom-marker wrapper is applied
/// first. The result is generally far from Chomsky form; clean it with
/// the grammar transforms before enumeration.
pub fn pda_to_cfg(pda: &Pda, accepts_on_empty_stack: bool) -> Cfg {
    let mut pda = pda.clone();
    if pda.accepting.len() != 1 {
        to_single_accepting_state_in_place(&mut pda);
    }
    if !is_push_pop(&pda) {
        to_push_pop_in_place(&mut pda);
    }
    if !accepts_on_empty_stack {
        to_accept_on_empty_stack_in_place(&mut pda);
    }
    debug!("normalized PDA:\n{pda}");

    let accept = pda.accepting.first().expect("single accepting state").clone();

    let variables: IndexSet<Variable> = pda
        .states
        .iter()
        .flat_map(|p| pda.states.iter().map(move |q| pair_variable(p, q)))
        .collect();
    let terminals: IndexSet<Terminal> = pda
        .alphabet
        .iter()
        .map(|a| Terminal::new(a.as_str()))
        .collect();
    let start = pair_variable(&pda.initial, &accept);

    // group push and pop transitions by the stack symbol they touch
    type Row = (State, Option<Symbol>, State);
    let mut pushes: IndexMap<Symbol, Vec<Row>> = IndexMap::new();
    let mut pops: IndexMap<Symbol, Vec<Row>> = IndexMap::new();
    for (p, a, pop, q, push) in pda.transitions() {
        match (pop, push) {
            (None, Some(u)) => pushes
                .entry(u.clone())
                .or_default()
                .push((p.clone(), a.cloned(), q.clone())),
            (Some(u), None) => pops
                .entry(u.clone())
                .or_default()
                .push((p.clone(), a.cloned(), q.clone())),
            _ => unreachable!("push/pop form established above"),
        }
    }

    let terminal_sym = |a: &Option<Symbol>| -> Option<Sym> {
        a.as_ref().map(|sym| Sym::Term(Terminal::new(sym.as_str())))
    };

    let mut rules: Vec<Rule> = Vec::new();
    for (u, push_rows) in &pushes {
        let Some(pop_rows) = pops.get(u) else {
            continue;
        };
        for (p, a, r) in push_rows {
            for (s, b, q) in pop_rows {
                let mut body = Vec::new();
                body.extend(terminal_sym(a));
                body.push(Sym::Var(pair_variable(r, s)));
                body.extend(terminal_sym(b));
                rules.push(Rule::new(pair_variable(p, q), Alternative(body)));
            }
        }
    }
    for p in &pda.states {
        for q in &pda.states {
            for r in &pda.states {
                rules.push(Rule::new(
                    pair_variable(p, q),
                    Alternative(vec![
                        Sym::Var(pair_variable(p, r)),
                        Sym::Var(pair_variable(r, q)),
                    ]),
                ));
            }
        }
    }
    for p in &pda.states {
        rules.push(Rule::new(pair_variable(p, p), Alternative::epsilon()));
    }

    Cfg::new(variables, terminals, rules, start)
        .expect("triple construction only uses declared symbols")
}
