//! Context-free grammars.

use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::dfa::Dfa;
use crate::error::{ConversionError, PreconditionError, ValidationError};
use crate::nfa::Nfa;
use crate::state::State;
use crate::symbol::Symbol;

/// A grammar variable (nonterminal): an interned string label.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(Arc<str>);

impl Variable {
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        Variable(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Variable {
    fn from(label: &str) -> Self {
        Variable::new(label)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

/// A grammar terminal: an interned string label.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Terminal(Arc<str>);

impl Terminal {
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        Terminal(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Terminal {
    fn from(label: &str) -> Self {
        Terminal::new(label)
    }
}

impl From<char> for Terminal {
    fn from(ch: char) -> Self {
        Terminal::new(ch.to_string())
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

/// One symbol of a sentential form: statically either a variable or a
/// terminal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sym {
    Var(Variable),
    Term(Terminal),
}

impl Sym {
    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Sym::Var(v) => Some(v),
            Sym::Term(_) => None,
        }
    }

    pub fn as_terminal(&self) -> Option<&Terminal> {
        match self {
            Sym::Var(_) => None,
            Sym::Term(t) => Some(t),
        }
    }
}

impl fmt::Display for Sym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sym::Var(v) => write!(f, "{v}"),
            Sym::Term(t) => write!(f, "{t}"),
        }
    }
}

/// The right-hand side of one rule: an ordered, possibly empty sequence
/// of symbols. The empty sequence is the ε-alternative.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Alternative(pub Vec<Sym>);

impl Alternative {
    pub fn epsilon() -> Self {
        Alternative(Vec::new())
    }

    pub fn symbols(&self) -> &[Sym] {
        &self.0
    }

    pub fn is_epsilon(&self) -> bool {
        self.0.is_empty()
    }

    /// A single variable: the body of a unit rule.
    pub fn is_unit(&self) -> bool {
        matches!(self.0.as_slice(), [Sym::Var(_)])
    }

    /// A single terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self.0.as_slice(), [Sym::Term(_)])
    }

    /// ε, a single terminal, or exactly two variables.
    pub fn is_chomsky(&self) -> bool {
        matches!(
            self.0.as_slice(),
            [] | [Sym::Term(_)] | [Sym::Var(_), Sym::Var(_)]
        )
    }

    pub fn terminals(&self) -> impl Iterator<Item = &Terminal> + '_ {
        self.0.iter().filter_map(Sym::as_terminal)
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> + '_ {
        self.0.iter().filter_map(Sym::as_variable)
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("ε");
        }
        let parts: Vec<String> = self.0.iter().map(|s| s.to_string()).collect();
        f.write_str(&parts.join("."))
    }
}

/// One production rule: a variable and one alternative for it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rule {
    pub variable: Variable,
    pub alternative: Alternative,
}

impl Rule {
    pub fn new(variable: Variable, alternative: Alternative) -> Self {
        Rule {
            variable,
            alternative,
        }
    }

    pub fn is_chomsky(&self) -> bool {
        self.alternative.is_chomsky()
    }

    pub fn is_epsilon(&self) -> bool {
        self.alternative.is_epsilon()
    }

    pub fn is_unit(&self) -> bool {
        self.alternative.is_unit()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.variable, self.alternative)
    }
}

/// A context-free grammar (V, Σ, R, S). Rule order is significant: it is
/// the declaration order that derivation extraction commits to.
#[derive(Clone, Debug)]
pub struct Cfg {
    pub(crate) variables: IndexSet<Variable>,
    pub(crate) terminals: IndexSet<Terminal>,
    pub(crate) rules: Vec<Rule>,
    pub(crate) start: Variable,
}

impl PartialEq for Cfg {
    /// Grammars are equal when they declare the same sets, share the start
    /// variable and have the same rules up to order.
    fn eq(&self, other: &Self) -> bool {
        let sorted = |g: &Cfg| {
            let mut rules = g.rules.clone();
            rules.sort_by(|a, b| {
                (&a.variable, &a.alternative).cmp(&(&b.variable, &b.alternative))
            });
            rules
        };
        self.variables == other.variables
            && self.terminals == other.terminals
            && self.start == other.start
            && sorted(self) == sorted(other)
    }
}

impl Eq for Cfg {}

impl Cfg {
    /// Build and validate a grammar from declared variable and terminal
    /// sets, a rule list and a start variable.
    pub fn new(
        variables: impl IntoIterator<Item = Variable>,
        terminals: impl IntoIterator<Item = Terminal>,
        rules: impl IntoIterator<Item = Rule>,
        start: Variable,
    ) -> Result<Self, ValidationError> {
        let variables: IndexSet<Variable> = variables.into_iter().collect();
        let terminals: IndexSet<Terminal> = terminals.into_iter().collect();
        let rules: Vec<Rule> = rules.into_iter().collect();

        if !variables.contains(&start) {
            return Err(ValidationError::UndeclaredVariable(start.to_string()));
        }
        for rule in &rules {
            if !variables.contains(&rule.variable) {
                return Err(ValidationError::UndeclaredVariable(
                    rule.variable.to_string(),
                ));
            }
            for v in rule.alternative.variables() {
                if !variables.contains(v) {
                    return Err(ValidationError::UndeclaredVariable(v.to_string()));
                }
            }
            for t in rule.alternative.terminals() {
                if !terminals.contains(t) {
                    return Err(ValidationError::UndeclaredTerminal(t.to_string()));
                }
            }
        }

        Ok(Cfg {
            variables,
            terminals,
            rules,
            start,
        })
    }

    /// Build a grammar from a bare rule list: the variables are the
    /// left-hand sides, the terminals are the terminals used, the start
    /// variable is the first rule's left-hand side.
    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Result<Self, ValidationError> {
        let rules: Vec<Rule> = rules.into_iter().collect();
        let Some(first) = rules.first() else {
            return Err(ValidationError::EmptyGrammar);
        };
        let start = first.variable.clone();
        let variables: IndexSet<Variable> = rules.iter().map(|r| r.variable.clone()).collect();
        let terminals: IndexSet<Terminal> = rules
            .iter()
            .flat_map(|r| r.alternative.terminals().cloned())
            .collect();
        Cfg::new(variables, terminals, rules, start)
    }

    pub fn variables(&self) -> &IndexSet<Variable> {
        &self.variables
    }

    pub fn terminals(&self) -> &IndexSet<Terminal> {
        &self.terminals
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn start(&self) -> &Variable {
        &self.start
    }

    /// Variables in order of first appearance on a left-hand side.
    pub fn ordered_variables(&self) -> Vec<Variable> {
        let mut seen = IndexSet::new();
        for rule in &self.rules {
            seen.insert(rule.variable.clone());
        }
        seen.into_iter().collect()
    }

    /// All alternatives declared for `variable`, in rule order.
    pub fn alternatives_of(&self, variable: &Variable) -> Vec<&Alternative> {
        self.rules
            .iter()
            .filter(|r| r.variable == *variable)
            .map(|r| &r.alternative)
            .collect()
    }

    /// True when every rule is A → BC or A → a, ε occurs only as an
    /// alternative of the start variable, and the start variable occurs on
    /// no right-hand side.
    pub fn is_chomsky(&self) -> bool {
        self.rules.iter().all(|r| {
            r.is_chomsky()
                && r.alternative.variables().all(|v| *v != self.start)
                && (!r.is_epsilon() || r.variable == self.start)
        })
    }

    /// A rule violating the Chomsky shape, if any.
    pub(crate) fn chomsky_witness(&self) -> Option<&Rule> {
        self.rules.iter().find(|r| {
            !r.is_chomsky()
                || r.alternative.variables().any(|v| *v == self.start)
                || (r.is_epsilon() && r.variable != self.start)
        })
    }

    /// Variables that derive ε, as a fixed point: a variable is nullable
    /// iff some alternative consists solely of nullable variables.
    pub fn nullable_variables(&self) -> IndexSet<Variable> {
        let mut nullable: IndexSet<Variable> = IndexSet::new();
        let mut changed = true;
        while changed {
            changed = false;
            for rule in &self.rules {
                if nullable.contains(&rule.variable) {
                    continue;
                }
                let all_nullable = rule.alternative.symbols().iter().all(|s| match s {
                    Sym::Var(v) => nullable.contains(v),
                    Sym::Term(_) => false,
                });
                if all_nullable {
                    nullable.insert(rule.variable.clone());
                    changed = true;
                }
            }
        }
        nullable
    }

    /// Variables reachable from `variable` through a chain of unit rules,
    /// excluding `variable` itself.
    pub fn derivable_variables(&self, variable: &Variable) -> IndexSet<Variable> {
        let mut reachable: IndexSet<Variable> = IndexSet::new();
        for rule in &self.rules {
            if rule.variable == *variable {
                if let [Sym::Var(b)] = rule.alternative.symbols() {
                    reachable.insert(b.clone());
                }
            }
        }
        let mut changed = true;
        while changed {
            changed = false;
            for rule in &self.rules {
                if let [Sym::Var(b)] = rule.alternative.symbols() {
                    if reachable.contains(&rule.variable) && reachable.insert(b.clone()) {
                        changed = true;
                    }
                }
            }
        }
        reachable.shift_remove(variable);
        reachable
    }

    /// Variables that derive at least one terminal word.
    pub fn productive_variables(&self) -> IndexSet<Variable> {
        let mut productive: IndexSet<Variable> = IndexSet::new();
        let mut changed = true;
        while changed {
            changed = false;
            for rule in &self.rules {
                if productive.contains(&rule.variable) {
                    continue;
                }
                let all_productive = rule.alternative.symbols().iter().all(|s| match s {
                    Sym::Var(v) => productive.contains(v),
                    Sym::Term(_) => true,
                });
                if all_productive {
                    productive.insert(rule.variable.clone());
                    changed = true;
                }
            }
        }
        productive
    }

    /// Drop every rule that mentions an unproductive variable. The start
    /// variable stays declared even when unproductive (the grammar then
    /// has the empty language).
    pub fn remove_unproductive_in_place(&mut self) {
        let productive = self.productive_variables();
        self.rules.retain(|rule| {
            productive.contains(&rule.variable)
                && rule.alternative.variables().all(|v| productive.contains(v))
        });
        let start = self.start.clone();
        self.variables
            .retain(|v| productive.contains(v) || *v == start);
    }

    pub fn remove_unproductive(&self) -> Cfg {
        let mut g = self.clone();
        g.remove_unproductive_in_place();
        g
    }

    /// Drop rules of the shape A → A.
    pub fn remove_self_cycles_in_place(&mut self) {
        self.rules.retain(|rule| {
            !matches!(rule.alternative.symbols(), [Sym::Var(v)] if *v == rule.variable)
        });
    }

    pub fn remove_self_cycles(&self) -> Cfg {
        let mut g = self.clone();
        g.remove_self_cycles_in_place();
        g
    }
}

impl fmt::Display for Cfg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut grouped: IndexMap<Variable, Vec<String>> = IndexMap::new();
        for rule in &self.rules {
            grouped
                .entry(rule.variable.clone())
                .or_default()
                .push(rule.alternative.to_string());
        }
        let mut first = true;
        for (variable, alternatives) in grouped {
            if !first {
                writeln!(f)?;
            }
            first = false;
            write!(f, "{variable} -> {}", alternatives.join(" | "))?;
        }
        Ok(())
    }
}

/// Interpret a right-linear grammar (alternatives of the shape `aB`, or ε)
/// as a DFA: variables become states, the missing transitions are
/// completed with a trap state.
pub fn cfg_to_dfa(grammar: &Cfg) -> Result<Dfa, ConversionError> {
    let states: Vec<State> = grammar
        .variables
        .iter()
        .map(|v| State::new(v.as_str()))
        .collect();
    let alphabet: Vec<Symbol> = grammar
        .terminals
        .iter()
        .map(|t| Symbol::new(t.as_str()))
        .collect();

    let mut transitions = Vec::new();
    let mut accepting = Vec::new();
    for rule in &grammar.rules {
        let q = State::new(rule.variable.as_str());
        match rule.alternative.symbols() {
            [] => accepting.push(q),
            [Sym::Term(a), Sym::Var(b)] => {
                transitions.push((q, Symbol::new(a.as_str()), State::new(b.as_str())));
            }
            _ => {
                return Err(
                    PreconditionError::NotRightLinear(rule.alternative.to_string()).into(),
                );
            }
        }
    }

    let initial = State::new(grammar.start.as_str());
    Ok(Dfa::new_with_trap(states, alphabet, transitions, initial, accepting)?)
}

/// Interpret a right-linear grammar (alternatives `aB`, `B`, or ε) as an
/// NFA, with unit alternatives becoming ε-moves.
pub fn cfg_to_nfa(grammar: &Cfg) -> Result<Nfa, ConversionError> {
    let states: Vec<State> = grammar
        .variables
        .iter()
        .map(|v| State::new(v.as_str()))
        .collect();
    let alphabet: Vec<Symbol> = grammar
        .terminals
        .iter()
        .map(|t| Symbol::new(t.as_str()))
        .collect();

    let mut transitions = Vec::new();
    let mut accepting = Vec::new();
    for rule in &grammar.rules {
        let q = State::new(rule.variable.as_str());
        match rule.alternative.symbols() {
            [] => accepting.push(q),
            [Sym::Var(b)] => transitions.push((q, None, State::new(b.as_str()))),
            [Sym::Term(a), Sym::Var(b)] => {
                transitions.push((q, Some(Symbol::new(a.as_str())), State::new(b.as_str())));
            }
            _ => {
                return Err(
                    PreconditionError::NotRightLinear(rule.alternative.to_string()).into(),
                );
            }
        }
    }

    let initial = State::new(grammar.start.as_str());
    Ok(Nfa::new(states, alphabet, transitions, initial, accepting)?)
}


#[cfg(test)]
mod tests {
    use super::testing::{alt, grammar};
    use super::*;

    #[test]
    fn test_validation_rejects_undeclared() {
        let rules = vec![Rule::new(Variable::from("S"), alt("aT"))];
        assert_eq!(
            Cfg::from_rules(rules),
            Err(ValidationError::UndeclaredVariable("T".to_string()))
        );
    }

    #[test]
    fn test_ordered_variables_and_display() {
        let g = grammar("S -> aS | bT\nT -> aS | bT | _");
        assert_eq!(
            g.ordered_variables(),
            vec![Variable::from("S"), Variable::from("T")]
        );
        assert_eq!(g.to_string(), "S -> a.S | b.T\nT -> a.S | b.T | ε");
    }

    #[test]
    fn test_is_chomsky() {
        let g = grammar("S -> AB | BC\nA -> BA | a\nB -> CC | b\nC -> AB | a");
        assert!(g.is_chomsky());

        let with_eps = grammar("S -> AB\nA -> a | _\nB -> b");
        assert!(!with_eps.is_chomsky());

        let start_on_rhs = grammar("S -> AS | a\nA -> a");
        assert!(!start_on_rhs.is_chomsky());
    }

    #[test]
    fn test_nullable_variables() {
        let g = grammar("S -> aS | bT\nT -> aS | bT | aTU | _\nU -> bU | _");
        let nullable = g.nullable_variables();
        assert_eq!(nullable.len(), 2);
        assert!(nullable.contains(&Variable::from("T")));
        assert!(nullable.contains(&Variable::from("U")));
    }

    #[test]
    fn test_derivable_variables() {
        let g = grammar("S -> Aa | B\nA -> b | B\nB -> A | a");
        let vars = |labels: &[&str]| -> IndexSet<Variable> {
            labels.iter().map(|l| Variable::from(*l)).collect()
        };
        assert_eq!(g.derivable_variables(&Variable::from("S")), vars(&["A", "B"]));
        assert_eq!(g.derivable_variables(&Variable::from("A")), vars(&["B"]));
        assert_eq!(g.derivable_variables(&Variable::from("B")), vars(&["A"]));

        let g = grammar("S -> A | b\nA -> A | B | a\nB -> S | c");
        assert_eq!(g.derivable_variables(&Variable::from("S")), vars(&["A", "B"]));
        assert_eq!(g.derivable_variables(&Variable::from("A")), vars(&["B", "S"]));
        assert_eq!(g.derivable_variables(&Variable::from("B")), vars(&["S", "A"]));
    }

    #[test]
    fn test_productive_variables() {
        let g = grammar("S -> AB | a\nA -> AA\nB -> b");
        let productive = g.productive_variables();
        assert!(productive.contains(&Variable::from("S")));
        assert!(productive.contains(&Variable::from("B")));
        assert!(!productive.contains(&Variable::from("A")));

        let trimmed = g.remove_unproductive();
        assert_eq!(trimmed.rules().len(), 2);
        assert!(trimmed.variables().contains(&Variable::from("S")));
        assert!(!trimmed.variables().contains(&Variable::from("A")));
    }

    #[test]
    fn test_remove_self_cycles() {
        let g = grammar("S -> S | a");
        let trimmed = g.remove_self_cycles();
        assert_eq!(trimmed.rules().len(), 1);
    }

    #[test]
    fn test_cfg_to_dfa() {
        // words over {a, b} ending in b
        let g = grammar("S -> aS | bT\nT -> aS | bT | _");
        let d = cfg_to_dfa(&g).unwrap();
        assert!(d.accepts("abab").unwrap());
        assert!(!d.accepts("abaa").unwrap());

        let not_linear = grammar("S -> aSb | _");
        assert!(matches!(
            cfg_to_dfa(&not_linear),
            Err(ConversionError::Precondition(
                PreconditionError::NotRightLinear(_)
            ))
        ));
    }

    #[test]
    fn test_cfg_to_nfa() {
        let g = grammar("S -> aT | bU\nT -> U | bV\nU -> aV | V\nV -> bV | _");
        let n = cfg_to_nfa(&g).unwrap();
        for word in ["a", "ab", "abb", "b", "bb", "aab", "aa", "bab"] {
            assert!(n.accepts(word), "expected {word} accepted");
        }
        assert!(!n.accepts("aba"));
    }

    #[test]
    fn test_grammar_equality_ignores_rule_order() {
        let g1 = grammar("S -> a | b");
        let g2 = grammar("S -> b | a");
        assert_eq!(g1, g2);
    }
}
