//! Thompson-style translation of regular expressions to NFAs.

use indexmap::{IndexMap, IndexSet};

use crate::ident::IdGen;
use crate::nfa::{Nfa, nfa_concatenation, nfa_repetition, nfa_union};
use crate::regexp::Regexp;
use crate::state::State;
use crate::symbol::Symbol;

/// Convert a regular expression to an NFA by structural recursion.
///
/// Every constructor gets a fresh-state gadget: `Zero` a lone
/// non-accepting state, `One` a lone accepting state, a symbol two states
/// joined by one labeled transition; sums, concatenations and iterations
/// are wired out of the operand automata with ε-moves. One identifier
/// generator is threaded through the whole recursion, so state names are
/// unique across the entire construction and sub-automata are disjoint by
/// construction.
pub fn regexp_to_nfa(regexp: &Regexp) -> Nfa {
    let mut ids = IdGen::new();
    let alphabet = regexp.symbols();
    translate(regexp, &alphabet, &mut ids)
}

fn translate(regexp: &Regexp, alphabet: &IndexSet<Symbol>, ids: &mut IdGen) -> Nfa {
    match regexp {
        Regexp::Zero => {
            let q0 = State::new(ids.generate("q"));
            Nfa::from_parts(
                IndexSet::from([q0.clone()]),
                alphabet.clone(),
                IndexMap::new(),
                q0,
                IndexSet::new(),
            )
        }
        Regexp::One => {
            let q0 = State::new(ids.generate("q"));
            Nfa::from_parts(
                IndexSet::from([q0.clone()]),
                alphabet.clone(),
                IndexMap::new(),
                q0.clone(),
                IndexSet::from([q0]),
            )
        }
        Regexp::Symbol(a) => {
            let q0 = State::new(ids.generate("q"));
            let q1 = State::new(ids.generate("q"));
            let delta = IndexMap::from([(
                (q0.clone(), Some(a.clone())),
                IndexSet::from([q1.clone()]),
            )]);
            Nfa::from_parts(
                IndexSet::from([q0.clone(), q1.clone()]),
                alphabet.clone(),
                delta,
                q0,
                IndexSet::from([q1]),
            )
        }
        Regexp::Iteration(operand) => {
            let inner = translate(operand, alphabet, ids);
            nfa_repetition(&inner, ids)
        }
        Regexp::Sum(left, right) => {
            let left = translate(left, alphabet, ids);
            let right = translate(right, alphabet, ids);
            nfa_union(&left, &right, ids)
        }
        Regexp::Concat(left, right) => {
            let left = translate(left, alphabet, ids);
            let right = translate(right, alphabet, ids);
            nfa_concatenation(&left, &right)
        }
    }
}
