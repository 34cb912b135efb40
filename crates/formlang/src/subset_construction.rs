//! Subset construction: converting an ε-NFA to an equivalent DFA.

use indexmap::{IndexMap, IndexSet};

use crate::dfa::Dfa;
use crate::nfa::Nfa;
use crate::state::{State, state_set_label};

/// Convert an NFA to a DFA using the powerset construction.
///
/// Each DFA state stands for a set of NFA states and carries that set's
/// canonical label (sorted members between braces), so converting the same
/// NFA twice yields byte-identical automata. The start state is the
/// ε-closure of the NFA's initial state; a subset state accepts iff it
/// contains an accepting NFA state; the successor of a subset on `a` is
/// the ε-closure of its combined `a`-targets. The result is total: the
/// empty subset, labeled `{}`, serves as the trap.
pub fn nfa_to_dfa(nfa: &Nfa) -> Dfa {
    // map each subset, keyed by its sorted member list, to its DFA state
    let mut state_mapping: IndexMap<Vec<State>, State> = IndexMap::new();
    let mut states: IndexSet<State> = IndexSet::new();
    let mut accepting: IndexSet<State> = IndexSet::new();
    let mut delta: IndexMap<(State, crate::symbol::Symbol), State> = IndexMap::new();

    let sorted_key = |set: &IndexSet<State>| {
        let mut key: Vec<State> = set.iter().cloned().collect();
        key.sort_unstable();
        key
    };
    let is_accepting =
        |set: &IndexSet<State>| set.iter().any(|q| nfa.accepting().contains(q));

    let initial_set = nfa.epsilon_closure_of(nfa.initial());
    let initial = state_set_label(&initial_set);
    state_mapping.insert(sorted_key(&initial_set), initial.clone());
    states.insert(initial.clone());
    if is_accepting(&initial_set) {
        accepting.insert(initial.clone());
    }

    let mut worklist: Vec<IndexSet<State>> = vec![initial_set];

    while let Some(current_set) = worklist.pop() {
        let current = state_mapping[&sorted_key(&current_set)].clone();

        for a in nfa.alphabet() {
            let next_set = nfa.epsilon_closure(&nfa.step(&current_set, a));
            let key = sorted_key(&next_set);

            let next = if let Some(existing) = state_mapping.get(&key) {
                existing.clone()
            } else {
                let label = state_set_label(&next_set);
                state_mapping.insert(key, label.clone());
                states.insert(label.clone());
                if is_accepting(&next_set) {
                    accepting.insert(label.clone());
                }
                worklist.push(next_set);
                label
            };

            delta.insert((current.clone(), a.clone()), next);
        }
    }

    Dfa::from_parts(states, nfa.alphabet().clone(), delta, initial, accepting)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nfa::tests::{state, three_ones};
    use crate::symbol::Symbol;

    #[test]
    fn test_subset_construction_basic() {
        // 0 -a-> 1, 0 -a-> 2, 1 -b-> 3(final), 2 -b-> 3(final)
        let a = Symbol::from("a");
        let b = Symbol::from("b");
        let nfa = Nfa::new(
            ["0", "1", "2", "3"].map(State::from),
            [a.clone(), b.clone()],
            [
                (state("0"), Some(a.clone()), state("1")),
                (state("0"), Some(a.clone()), state("2")),
                (state("1"), Some(b.clone()), state("3")),
                (state("2"), Some(b.clone()), state("3")),
            ],
            state("0"),
            [state("3")],
        )
        .unwrap();

        let dfa = nfa_to_dfa(&nfa);
        assert_eq!(dfa.initial().as_str(), "{0}");
        assert!(dfa.accepts("ab").unwrap());
        assert!(!dfa.accepts("a").unwrap());
        assert!(!dfa.accepts("abb").unwrap());
        // {1,2} after a, {3} after ab, plus the {} trap
        assert!(dfa.states().contains(&state("{1,2}")));
        assert!(dfa.states().contains(&state("{3}")));
        assert!(dfa.states().contains(&state("{}")));
    }

    #[test]
    fn test_subset_construction_with_epsilon() {
        // 0 -ε-> 1 -a-> 2(final); the symbol is only reachable through ε
        let a = Symbol::from("a");
        let nfa = Nfa::new(
            ["0", "1", "2"].map(State::from),
            [a.clone()],
            [
                (state("0"), None, state("1")),
                (state("1"), Some(a.clone()), state("2")),
            ],
            state("0"),
            [state("2")],
        )
        .unwrap();

        let dfa = nfa_to_dfa(&nfa);
        assert_eq!(dfa.initial().as_str(), "{0,1}");
        assert!(dfa.accepts("a").unwrap());
        assert!(!dfa.accepts("").unwrap());
        assert!(!dfa.accepts("aa").unwrap());
    }

    #[test]
    fn test_result_is_total_and_equivalent() {
        let nfa = three_ones();
        let dfa = nfa_to_dfa(&nfa);
        // Dfa::from_parts output must satisfy the totality contract
        for q in dfa.states() {
            for a in dfa.alphabet() {
                let _ = dfa.target(q, a);
            }
        }
        for n in 0..=5 {
            assert_eq!(dfa.words_up_to(n), nfa.words_up_to(n), "length bound {n}");
        }
    }

    #[test]
    fn test_canonical_labels_are_reproducible() {
        let nfa = three_ones();
        let d1 = nfa_to_dfa(&nfa);
        let d2 = nfa_to_dfa(&nfa);
        assert_eq!(d1, d2);
        assert_eq!(d1.to_string(), d2.to_string());
    }
}
