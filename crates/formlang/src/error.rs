//! Error types.
//!
//! Three disjoint families: structural problems caught when a value is
//! built ([`ValidationError`]), algorithms invoked on a value that is not
//! in the required normal form ([`PreconditionError`]), and requests for a
//! witness that does not exist ([`DeriveError`]). Algorithms never raise
//! validation errors internally; a value that passed construction stays
//! valid for its lifetime.

use thiserror::Error;

use crate::state::State;
use crate::symbol::Symbol;

/// A structural problem in the description of an automaton or grammar,
/// reported by constructors and never recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("state `{0}` is not declared")]
    UndeclaredState(State),
    #[error("symbol `{0}` is not declared")]
    UndeclaredSymbol(Symbol),
    #[error("variable `{0}` is not declared")]
    UndeclaredVariable(String),
    #[error("terminal `{0}` is not declared")]
    UndeclaredTerminal(String),
    #[error("the automaton is not total: no transition for state `{0}` on symbol `{1}`")]
    NotTotal(State, Symbol),
    #[error("the automaton is not deterministic: duplicate transition for state `{0}` on symbol `{1}`")]
    NotDeterministic(State, Symbol),
    #[error("the accept state and the reject state are both `{0}`")]
    AcceptEqualsReject(State),
    #[error("the blank symbol `{0}` must not occur in the input alphabet")]
    BlankInInputAlphabet(Symbol),
    #[error("the input alphabet symbol `{0}` is missing from the tape alphabet")]
    InputSymbolNotOnTape(Symbol),
    #[error("the grammar has no rules")]
    EmptyGrammar,
}

/// An algorithm was invoked on a value that is not in the normal form it
/// requires. Callers are expected to normalize first; the algorithms do
/// not silently convert (convenience wrappers that do are documented as
/// such).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("rule `{0}` is not in Chomsky normal form")]
    NotChomsky(String),
    #[error("a transition out of state `{0}` is neither a push nor a pop")]
    NotPushPop(State),
    #[error("alternative `{0}` is not right-linear")]
    NotRightLinear(String),
}

/// The requested witness does not exist. This is a reported failure, not
/// a fatal error; callers are expected to check acceptance first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeriveError {
    #[error("the word `{0}` is not generated by the grammar")]
    WordNotInLanguage(String),
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
}

/// Failure of a representation-to-representation bridge, which can trip
/// over either a normal-form precondition or a structural problem in the
/// value it builds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
}
