//! Seeded random automata and expressions for bulk cross-check tests.
//!
//! The generator is a self-contained xorshift64* so the 1000-instance
//! minimization cross-check and the regexp round-trip sweep are exactly
//! reproducible from their seeds; nothing here reads OS entropy or the
//! clock.

use indexmap::{IndexMap, IndexSet};

use crate::dfa::Dfa;
use crate::nfa::Nfa;
use crate::regexp::Regexp;
use crate::state::State;
use crate::symbol::Symbol;

/// A deterministic pseudo-random number generator (xorshift64*).
#[derive(Debug, Clone)]
pub struct Prng {
    state: u64,
}

impl Prng {
    pub fn new(seed: u64) -> Self {
        // xorshift must not start at zero
        Prng {
            state: seed.max(1),
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// A uniform value in `0..bound`; `bound` must be positive.
    pub fn below(&mut self, bound: usize) -> usize {
        (self.next_u64() % bound as u64) as usize
    }

    /// True with probability `numerator / denominator`.
    pub fn chance(&mut self, numerator: usize, denominator: usize) -> bool {
        self.below(denominator) < numerator
    }
}

/// A random total DFA with states `q0..q{n-1}`, uniformly random
/// transitions and each state accepting with probability 1/2.
pub fn random_dfa(rng: &mut Prng, alphabet: &[Symbol], n: usize) -> Dfa {
    let states: Vec<State> = (0..n).map(|i| State::new(format!("q{i}"))).collect();

    let mut delta = IndexMap::new();
    for q in &states {
        for a in alphabet {
            let target = states[rng.below(n)].clone();
            delta.insert((q.clone(), a.clone()), target);
        }
    }

    let accepting: IndexSet<State> = states
        .iter()
        .filter(|_| rng.chance(1, 2))
        .cloned()
        .collect();

    Dfa::from_parts(
        states.iter().cloned().collect(),
        alphabet.iter().cloned().collect(),
        delta,
        states[0].clone(),
        accepting,
    )
}

/// A random NFA with states `q0..q{n-1}`: for every state and every input
/// (ε included) up to two successors, and each state accepting with
/// probability 1/2.
pub fn random_nfa(rng: &mut Prng, alphabet: &[Symbol], n: usize) -> Nfa {
    let states: Vec<State> = (0..n).map(|i| State::new(format!("q{i}"))).collect();

    let mut inputs: Vec<Option<Symbol>> = alphabet.iter().cloned().map(Some).collect();
    inputs.push(None);

    let mut delta: IndexMap<(State, Option<Symbol>), IndexSet<State>> = IndexMap::new();
    for q in &states {
        for a in &inputs {
            let count = rng.below(3.min(n + 1));
            let mut successors = IndexSet::new();
            while successors.len() < count {
                successors.insert(states[rng.below(n)].clone());
            }
            if !successors.is_empty() {
                delta.insert((q.clone(), a.clone()), successors);
            }
        }
    }

    let accepting: IndexSet<State> = states
        .iter()
        .filter(|_| rng.chance(1, 2))
        .cloned()
        .collect();

    Nfa::from_parts(
        states.iter().cloned().collect(),
        alphabet.iter().cloned().collect(),
        delta,
        states[0].clone(),
        accepting,
    )
}

/// A random regular expression with the given number of operator nodes.
pub fn random_regexp(rng: &mut Prng, alphabet: &[Symbol], size: usize) -> Regexp {
    if size == 0 {
        let roll = rng.below(100);
        if roll < 15 {
            Regexp::Zero
        } else if roll < 30 {
            Regexp::One
        } else {
            Regexp::Symbol(alphabet[rng.below(alphabet.len())].clone())
        }
    } else if size == 1 {
        Regexp::iteration(random_regexp(rng, alphabet, 0))
    } else {
        let roll = rng.below(100);
        if roll < 33 {
            Regexp::iteration(random_regexp(rng, alphabet, size - 1))
        } else {
            let k = rng.below(size - 1);
            let left = random_regexp(rng, alphabet, k);
            let right = random_regexp(rng, alphabet, size - k - 2);
            if roll < 66 {
                Regexp::concat(left, right)
            } else {
                Regexp::sum(left, right)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alphabet() -> Vec<Symbol> {
        vec![Symbol::from("a"), Symbol::from("b")]
    }

    #[test]
    fn test_prng_is_deterministic() {
        let mut a = Prng::new(7);
        let mut b = Prng::new(7);
        for _ in 0..100 {
            assert_eq!(a.below(1000), b.below(1000));
        }
    }

    #[test]
    fn test_random_dfa_is_well_formed() {
        let mut rng = Prng::new(1);
        for _ in 0..50 {
            let d = random_dfa(&mut rng, &alphabet(), 5);
            assert_eq!(d.states().len(), 5);
            for q in d.states() {
                for a in d.alphabet() {
                    assert!(d.states().contains(d.target(q, a)));
                }
            }
        }
    }

    #[test]
    fn test_random_nfa_is_well_formed() {
        let mut rng = Prng::new(2);
        for _ in 0..50 {
            let n = random_nfa(&mut rng, &alphabet(), 5);
            assert_eq!(n.states().len(), 5);
            for (p, _, q) in n.transitions() {
                assert!(n.states().contains(p));
                assert!(n.states().contains(q));
            }
        }
    }

    #[test]
    fn test_random_regexp_size() {
        let mut rng = Prng::new(3);
        for size in 0..8 {
            let r = random_regexp(&mut rng, &alphabet(), size);
            assert!(r.size() <= size);
        }
    }
}
