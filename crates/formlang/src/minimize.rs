//! DFA minimization.
//!
//! Two independent algorithms over the same quotient builder: a
//! table-filling distinguishability fixed point ([`minimize`]) and
//! Hopcroft's partition refinement ([`minimize_hopcroft`]). They compute
//! the same coarsest congruence and therefore identical automata, which
//! makes each a test oracle for the other. Both drop unreachable states
//! first; merged states carry the canonical `{..}` label of their class.

use std::collections::VecDeque;

use indexmap::{IndexMap, IndexSet};
use log::debug;

use crate::dfa::Dfa;
use crate::state::{State, StateSet, state_set_label};
use crate::symbol::Symbol;

/// Minimize via the table-filling algorithm.
///
/// `table[i][j]` (i ≤ j) starts as "equivalent iff both or neither
/// accepting" and pairs are marked distinguishable whenever some symbol
/// leads them to a pair already marked. The loop reaches a fixed point
/// after at most |Q|² passes.
pub fn minimize(dfa: &Dfa) -> Dfa {
    let dfa = dfa.remove_unreachable();
    let states: Vec<State> = dfa.states().iter().cloned().collect();
    let index: IndexMap<State, usize> = states
        .iter()
        .enumerate()
        .map(|(i, q)| (q.clone(), i))
        .collect();
    let n = states.len();

    let mut table = vec![vec![false; n]; n];
    for i in 0..n {
        for j in i..n {
            table[i][j] =
                dfa.accepting().contains(&states[i]) == dfa.accepting().contains(&states[j]);
        }
    }

    let mut changed = true;
    while changed {
        changed = false;
        for i in 0..n {
            for j in i + 1..n {
                if !table[i][j] {
                    continue;
                }
                for a in dfa.alphabet() {
                    let k = index[dfa.target(&states[i], a)];
                    let l = index[dfa.target(&states[j], a)];
                    if !table[k.min(l)][k.max(l)] {
                        debug!(
                            "states {} and {} distinguished on {a}",
                            states[i], states[j]
                        );
                        table[i][j] = false;
                        changed = true;
                        break;
                    }
                }
            }
        }
    }

    let mut classes: Vec<Vec<usize>> = Vec::new();
    let mut assigned = vec![false; n];
    for i in 0..n {
        if assigned[i] {
            continue;
        }
        let mut class = vec![i];
        assigned[i] = true;
        for j in i + 1..n {
            if table[i][j] {
                class.push(j);
                assigned[j] = true;
            }
        }
        classes.push(class);
    }

    quotient_dfa(&dfa, &states, &classes)
}

/// Minimize via Hopcroft's partition refinement.
///
/// The partition starts as {accepting, non-accepting}; a worklist of
/// (splitter block, symbol) pairs drives refinement. When a block splits,
/// the larger half stays in place (any stale worklist reference keeps
/// pointing at it) and the smaller half is enqueued for every symbol —
/// the smaller-half rule that the running-time bound depends on.
pub fn minimize_hopcroft(dfa: &Dfa) -> Dfa {
    let dfa = dfa.remove_unreachable();
    let states: Vec<State> = dfa.states().iter().cloned().collect();
    let index: IndexMap<State, usize> = states
        .iter()
        .enumerate()
        .map(|(i, q)| (q.clone(), i))
        .collect();
    let n = states.len();

    // predecessor sets per (state, symbol)
    let mut reverse: IndexMap<(usize, Symbol), StateSet> = IndexMap::new();
    for (p, a, q) in dfa.transitions() {
        reverse
            .entry((index[q], a.clone()))
            .or_insert_with(|| StateSet::with_capacity(n))
            .insert(index[p]);
    }
    let predecessors = |targets: &StateSet, a: &Symbol| {
        let mut result = StateSet::with_capacity(n);
        for t in targets.iter() {
            if let Some(sources) = reverse.get(&(t, a.clone())) {
                result.union_with(sources);
            }
        }
        result
    };

    let accepting: StateSet = (0..n)
        .filter(|i| dfa.accepting().contains(&states[*i]))
        .collect();
    let non_accepting: StateSet = (0..n)
        .filter(|i| !dfa.accepting().contains(&states[*i]))
        .collect();

    let mut partitions: Vec<StateSet> = [accepting, non_accepting]
        .into_iter()
        .filter(|block| !block.is_empty())
        .collect();

    let mut worklist: VecDeque<(usize, Symbol)> = VecDeque::new();
    for idx in 0..partitions.len() {
        for a in dfa.alphabet() {
            worklist.push_back((idx, a.clone()));
        }
    }

    while let Some((splitter_idx, a)) = worklist.pop_front() {
        let splitter = partitions[splitter_idx].clone();
        let movers = predecessors(&splitter, &a);
        if movers.is_empty() {
            continue;
        }

        let mut splits = Vec::new();
        for (block_idx, block) in partitions.iter().enumerate() {
            if block.len() < 2 {
                continue;
            }
            let inside = block.intersection(&movers);
            let outside = block.difference(&movers);
            if !inside.is_empty() && !outside.is_empty() {
                // larger half stays at block_idx, smaller half is enqueued
                let (keep, add) = if inside.len() <= outside.len() {
                    (outside, inside)
                } else {
                    (inside, outside)
                };
                splits.push((block_idx, keep, add));
            }
        }

        for (block_idx, keep, add) in splits {
            debug!(
                "block {block_idx} split on {a}: {} + {} states",
                keep.len(),
                add.len()
            );
            let new_idx = partitions.len();
            partitions[block_idx] = keep;
            partitions.push(add);
            for b in dfa.alphabet() {
                worklist.push_back((new_idx, b.clone()));
            }
        }
    }

    let classes: Vec<Vec<usize>> = partitions
        .iter()
        .map(|block| block.iter().collect())
        .collect();
    quotient_dfa(&dfa, &states, &classes)
}

/// Collapse each class of equivalent states into one canonically labeled
/// state; transitions and acceptance are read off a representative.
fn quotient_dfa(dfa: &Dfa, states: &[State], classes: &[Vec<usize>]) -> Dfa {
    let mut class_of = vec![0usize; states.len()];
    for (class_idx, class) in classes.iter().enumerate() {
        for &member in class {
            class_of[member] = class_idx;
        }
    }
    let labels: Vec<State> = classes
        .iter()
        .map(|class| state_set_label(class.iter().map(|&i| &states[i])))
        .collect();
    let index: IndexMap<State, usize> = states
        .iter()
        .enumerate()
        .map(|(i, q)| (q.clone(), i))
        .collect();

    let mut new_states = IndexSet::new();
    let mut accepting = IndexSet::new();
    let mut delta = IndexMap::new();
    for (class_idx, class) in classes.iter().enumerate() {
        let label = &labels[class_idx];
        new_states.insert(label.clone());
        if class.iter().any(|&i| dfa.accepting().contains(&states[i])) {
            accepting.insert(label.clone());
        }
        let representative = &states[class[0]];
        for a in dfa.alphabet() {
            let target = dfa.target(representative, a);
            let target_label = labels[class_of[index[target]]].clone();
            delta.insert((label.clone(), a.clone()), target_label);
        }
    }

    let initial = labels[class_of[index[dfa.initial()]]].clone();
    Dfa::from_parts(new_states, dfa.alphabet().clone(), delta, initial, accepting)
}
