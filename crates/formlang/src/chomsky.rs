//! Conversion of context-free grammars to Chomsky normal form.
//!
//! Five phases, applied in order: fresh start variable, ε-rule removal,
//! unit-rule elimination, binarization, and the factoring of terminals out
//! of long alternatives. Each phase exists in a mutating form (taking the
//! grammar by `&mut`) and a pure form that clones first; no phase ever
//! touches caller-owned data through a shared reference.

use indexmap::{IndexMap, IndexSet};
use log::debug;

use crate::cfg::{Alternative, Cfg, Rule, Sym, Terminal, Variable};

/// A variable not yet declared in `grammar`: the hint itself when free,
/// otherwise the first free capital letter, otherwise the hint with an
/// increasing index appended.
pub fn fresh_variable(grammar: &Cfg, hint: &str) -> Variable {
    let taken = |label: &str| grammar.variables().contains(&Variable::new(label));
    if !taken(hint) {
        return Variable::new(hint);
    }
    if grammar.variables().len() < 26 {
        for letter in 'A'..='Z' {
            let label = letter.to_string();
            if !taken(&label) {
                return Variable::new(label);
            }
        }
    }
    let mut index = 0usize;
    loop {
        let label = format!("{hint}{index}");
        if !taken(&label) {
            return Variable::new(label);
        }
        index += 1;
    }
}

/// Phase 1: introduce a fresh start variable S₀ with the single rule
/// S₀ → S, breaking any rule that mentions the start on its right side.
pub fn add_start_variable_in_place(grammar: &mut Cfg, hint: &str) {
    let start = fresh_variable(grammar, hint);
    let old = grammar.start.clone();
    grammar
        .rules
        .insert(0, Rule::new(start.clone(), Alternative(vec![Sym::Var(old)])));
    grammar.variables.insert(start.clone());
    grammar.start = start;
}

pub fn add_start_variable(grammar: &Cfg, hint: &str) -> Cfg {
    let mut g = grammar.clone();
    add_start_variable_in_place(&mut g, hint);
    g
}

/// Every way of deleting or keeping each nullable-variable occurrence
/// in `symbols`, the fully kept version first.
fn expand_nullable(symbols: &[Sym], nullable: &IndexSet<Variable>) -> Vec<Vec<Sym>> {
    let Some((head, tail)) = symbols.split_first() else {
        return vec![Vec::new()];
    };
    let expanded_tail = expand_nullable(tail, nullable);
    let mut result: Vec<Vec<Sym>> = expanded_tail
        .iter()
        .map(|tail| {
            let mut kept = vec![head.clone()];
            kept.extend(tail.iter().cloned());
            kept
        })
        .collect();
    if matches!(head, Sym::Var(v) if nullable.contains(v)) {
        result.extend(expanded_tail);
    }
    result
}

/// Phase 2: remove ε-rules. Every rule is replaced by all expansions
/// over its nullable-variable occurrences; empty expansions survive only
/// on the start variable. Duplicates are dropped, keeping first
/// occurrences in order.
pub fn remove_epsilon_rules_in_place(grammar: &mut Cfg) {
    let nullable = grammar.nullable_variables();
    debug!("nullable variables: {nullable:?}");

    let mut seen: IndexSet<Rule> = IndexSet::new();
    for rule in &grammar.rules {
        for symbols in expand_nullable(rule.alternative.symbols(), &nullable) {
            if symbols.is_empty()
                && nullable.contains(&rule.variable)
                && rule.variable != grammar.start
            {
                continue;
            }
            seen.insert(Rule::new(rule.variable.clone(), Alternative(symbols)));
        }
    }
    grammar.rules = seen.into_iter().collect();
}

pub fn remove_epsilon_rules(grammar: &Cfg) -> Cfg {
    let mut g = grammar.clone();
    remove_epsilon_rules_in_place(&mut g);
    g
}

/// Phase 3: eliminate unit rules A → B by copying every non-unit rule of
/// every unit-reachable variable onto A, then deleting all unit rules.
pub fn eliminate_unit_rules_in_place(grammar: &mut Cfg) {
    let mut result: IndexSet<Rule> = grammar.rules.iter().cloned().collect();
    for variable in grammar.ordered_variables() {
        let reachable = grammar.derivable_variables(&variable);
        for rule in &grammar.rules {
            if reachable.contains(&rule.variable) && !rule.is_unit() {
                result.insert(Rule::new(variable.clone(), rule.alternative.clone()));
            }
        }
    }
    grammar.rules = result.into_iter().filter(|rule| !rule.is_unit()).collect();
    put_start_rule_first(grammar);
}

pub fn eliminate_unit_rules(grammar: &Cfg) -> Cfg {
    let mut g = grammar.clone();
    eliminate_unit_rules_in_place(&mut g);
    g
}

fn put_start_rule_first(grammar: &mut Cfg) {
    if let Some(position) = grammar
        .rules
        .iter()
        .position(|r| r.variable == grammar.start)
    {
        grammar.rules.swap(0, position);
    }
}

/// Phase 4: binarize. A rule A → u₁u₂…uₙ with n > 2 becomes a chain
/// A → u₁P₁, P₁ → u₂P₂, …, Pₙ₋₂ → uₙ₋₁uₙ over fresh variables.
pub fn binarize_rules_in_place(grammar: &mut Cfg) {
    let mut appended: Vec<Rule> = Vec::new();
    for index in 0..grammar.rules.len() {
        let symbols = grammar.rules[index].alternative.symbols().to_vec();
        let n = symbols.len();
        if n <= 2 {
            continue;
        }
        let hint = grammar.rules[index].variable.to_string();
        let mut chain: Vec<Variable> = Vec::with_capacity(n - 2);
        for _ in 0..n - 2 {
            let fresh = fresh_variable(grammar, &hint);
            grammar.variables.insert(fresh.clone());
            chain.push(fresh);
        }
        for k in 0..n - 3 {
            appended.push(Rule::new(
                chain[k].clone(),
                Alternative(vec![symbols[k + 1].clone(), Sym::Var(chain[k + 1].clone())]),
            ));
        }
        appended.push(Rule::new(
            chain[n - 3].clone(),
            Alternative(symbols[n - 2..].to_vec()),
        ));
        grammar.rules[index].alternative =
            Alternative(vec![symbols[0].clone(), Sym::Var(chain[0].clone())]);
    }
    grammar.rules.extend(appended);
}

pub fn binarize_rules(grammar: &Cfg) -> Cfg {
    let mut g = grammar.clone();
    binarize_rules_in_place(&mut g);
    g
}

/// Phase 5: factor terminals out of alternatives of length two or more,
/// each terminal through one proxy variable with a unit terminal rule.
/// The same terminal maps to the same proxy throughout the grammar.
pub fn eliminate_mixed_terminals_in_place(grammar: &mut Cfg) {
    let mut proxies: IndexMap<Terminal, Variable> = IndexMap::new();
    for index in 0..grammar.rules.len() {
        if grammar.rules[index].alternative.symbols().len() < 2 {
            continue;
        }
        let symbols = grammar.rules[index].alternative.symbols().to_vec();
        let mut replaced = Vec::with_capacity(symbols.len());
        for sym in symbols {
            match sym {
                Sym::Var(_) => replaced.push(sym),
                Sym::Term(terminal) => {
                    let proxy = match proxies.get(&terminal) {
                        Some(existing) => existing.clone(),
                        None => {
                            let hint = terminal.as_str().to_uppercase();
                            let fresh = fresh_variable(grammar, &hint);
                            grammar.variables.insert(fresh.clone());
                            proxies.insert(terminal.clone(), fresh.clone());
                            fresh
                        }
                    };
                    replaced.push(Sym::Var(proxy));
                }
            }
        }
        grammar.rules[index].alternative = Alternative(replaced);
    }
    for (terminal, proxy) in proxies {
        grammar
            .rules
            .push(Rule::new(proxy, Alternative(vec![Sym::Term(terminal)])));
    }
}

pub fn eliminate_mixed_terminals(grammar: &Cfg) -> Cfg {
    let mut g = grammar.clone();
    eliminate_mixed_terminals_in_place(&mut g);
    g
}

/// The full pipeline. The result satisfies [`Cfg::is_chomsky`].
pub fn to_chomsky_in_place(grammar: &mut Cfg) {
    add_start_variable_in_place(grammar, "S");
    debug!("after start variable:\n{grammar}");
    remove_epsilon_rules_in_place(grammar);
    debug!("after epsilon removal:\n{grammar}");
    eliminate_unit_rules_in_place(grammar);
    debug!("after unit elimination:\n{grammar}");
    binarize_rules_in_place(grammar);
    debug!("after binarization:\n{grammar}");
    eliminate_mixed_terminals_in_place(grammar);
    debug!("after terminal factoring:\n{grammar}");
}

pub fn to_chomsky(grammar: &Cfg) -> Cfg {
    let mut g = grammar.clone();
    to_chomsky_in_place(&mut g);
    g
}
