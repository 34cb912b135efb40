//! Transformation and decision algorithms of formal language theory.
//!
//! Five language representations — DFA, NFA, PDA, context-free grammar and
//! regular expression — plus Turing machines, with the classical bridges
//! between them:
//! - Subset construction with ε-closure (NFA → DFA)
//! - DFA minimization, twice over: table filling and Hopcroft refinement
//! - The Chomsky-normal-form pipeline and CYK membership/derivation
//! - PDA normal forms and the Sipser PDA → CFG construction
//! - Thompson regexp → NFA translation and GNFA state elimination
//!   (DFA → regexp)
//!
//! Every representation validates its structure once, at construction, and
//! is immutable afterwards; transforms either take `&mut` exclusively or
//! clone first. `words_up_to` on each representation enumerates the
//! accepted language up to a length bound, which is how equivalence of
//! conversions is checked everywhere.

mod cfg;
mod chomsky;
mod cyk;
mod dfa;
mod error;
mod gnfa;
mod ident;
pub mod language;
mod minimize;
mod nfa;
mod pda;
mod pda_cfg;
pub mod random;
mod regexp;
mod state;
mod subset_construction;
mod symbol;
mod thompson;
mod tm;

pub use cfg::{Alternative, Cfg, Rule, Sym, Terminal, Variable, cfg_to_dfa, cfg_to_nfa};
pub use chomsky::{
    add_start_variable, add_start_variable_in_place, binarize_rules, binarize_rules_in_place,
    eliminate_mixed_terminals, eliminate_mixed_terminals_in_place, eliminate_unit_rules,
    eliminate_unit_rules_in_place, fresh_variable, remove_epsilon_rules,
    remove_epsilon_rules_in_place, to_chomsky, to_chomsky_in_place,
};
pub use cyk::{CykTable, DerivationOrder, SententialForm, cyk_matrix, derive_word};
pub use dfa::{Dfa, ProductKind};
pub use error::{ConversionError, DeriveError, PreconditionError, ValidationError};
pub use gnfa::{Gnfa, dfa_to_gnfa, dfa_to_regexp};
pub use ident::IdGen;
pub use minimize::{minimize, minimize_hopcroft};
pub use nfa::{Nfa, nfa_concatenation, nfa_repetition, nfa_union};
pub use pda::{Configuration, Pda};
pub use pda_cfg::{
    is_push_pop, pda_to_cfg, to_accept_on_empty_stack, to_accept_on_empty_stack_in_place,
    to_push_pop, to_push_pop_in_place, to_single_accepting_state,
    to_single_accepting_state_in_place,
};
pub use regexp::Regexp;
pub use state::{State, StateSet, fresh_state, state_set_label};
pub use subset_construction::nfa_to_dfa;
pub use symbol::Symbol;
pub use thompson::regexp_to_nfa;
pub use tm::{Direction, Tm, TmSnapshot};

#[cfg(test)]
mod tests {
    //! Cross-representation properties that tie the conversions together.

    use super::*;
    use crate::random::{Prng, random_dfa, random_nfa, random_regexp};

    fn alphabet() -> Vec<Symbol> {
        vec![Symbol::from("a"), Symbol::from("b")]
    }

    #[test]
    fn test_nfa_to_dfa_equivalence_sweep() {
        let mut rng = Prng::new(11);
        for _ in 0..100 {
            let n = random_nfa(&mut rng, &alphabet(), 5);
            let d = nfa_to_dfa(&n);
            assert_eq!(d.words_up_to(4), n.words_up_to(4), "for NFA:\n{n}");
        }
    }

    #[test]
    fn test_minimize_preserves_language_of_converted_nfas() {
        let mut rng = Prng::new(23);
        for _ in 0..50 {
            let n = random_nfa(&mut rng, &alphabet(), 4);
            let d = nfa_to_dfa(&n);
            let m = minimize(&d);
            assert_eq!(m.words_up_to(4), d.words_up_to(4));
            assert!(m.states().len() <= d.states().len());
        }
    }

    #[test]
    fn test_dfa_regexp_round_trip() {
        let mut rng = Prng::new(37);
        for _ in 0..100 {
            let d = random_dfa(&mut rng, &alphabet(), 4);
            let r = dfa_to_regexp(&d);
            let n = regexp_to_nfa(&r);
            let d2 = nfa_to_dfa(&n);
            let bound = 4;
            let expected = d.words_up_to(bound);
            assert_eq!(n.words_up_to(bound), expected, "regexp {r} diverges");
            assert_eq!(d2.words_up_to(bound), expected);
        }
    }

    #[test]
    fn test_regexp_to_nfa_equivalence_sweep() {
        let mut rng = Prng::new(41);
        for _ in 0..100 {
            let r = random_regexp(&mut rng, &alphabet(), 4);
            let n = regexp_to_nfa(&r);
            for bound in 0..=3 {
                assert_eq!(n.words_up_to(bound), r.words_up_to(bound), "regexp {r}");
            }
        }
    }
}
