//! CYK membership and derivation extraction for Chomsky-form grammars.

use std::collections::BTreeSet;
use std::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::chomsky::to_chomsky;
use crate::error::{DeriveError, PreconditionError};
use crate::cfg::{Cfg, Sym, Terminal, Variable};

/// The CYK dynamic-programming table: `cell(i, j)` holds every variable
/// that derives the (inclusive) span `w[i..=j]`.
#[derive(Debug, Clone)]
pub struct CykTable {
    n: usize,
    cells: IndexMap<(usize, usize), IndexSet<Variable>>,
}

impl CykTable {
    pub fn word_len(&self) -> usize {
        self.n
    }

    pub fn cell(&self, i: usize, j: usize) -> IndexSet<Variable> {
        self.cells.get(&(i, j)).cloned().unwrap_or_default()
    }

    /// Whether the table witnesses acceptance for the given start variable.
    pub fn accepted(&self, start: &Variable) -> bool {
        self.n > 0 && self.cell(0, self.n - 1).contains(start)
    }
}

impl fmt::Display for CykTable {
    /// The lower-triangular rendering used on paper: the bottom row holds
    /// the single-symbol spans, the top cell the whole word.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let render = |vars: IndexSet<Variable>| {
            let mut labels: Vec<&str> = vars.iter().map(Variable::as_str).collect();
            labels.sort_unstable();
            format!("{{{}}}", labels.join(","))
        };
        let width = (0..self.n)
            .flat_map(|i| (i..self.n).map(move |j| render(self.cell(i, j)).len()))
            .max()
            .unwrap_or(2);
        let mut lines = Vec::new();
        for span in 0..self.n {
            let row: Vec<String> = (span..self.n)
                .map(|j| format!("{:<width$}", render(self.cell(j - span, j))))
                .collect();
            lines.push(row.join("  "));
        }
        lines.reverse();
        f.write_str(lines.join("\n").trim_end())
    }
}

/// Compute the CYK table of `word` for a grammar that must already be in
/// Chomsky normal form; a grammar that is not is a precondition failure,
/// not something this function repairs.
pub fn cyk_matrix(grammar: &Cfg, word: &str) -> Result<CykTable, PreconditionError> {
    if let Some(witness) = grammar.chomsky_witness() {
        return Err(PreconditionError::NotChomsky(witness.to_string()));
    }

    let chars: Vec<Terminal> = word.chars().map(Terminal::from).collect();
    let n = chars.len();
    let mut cells: IndexMap<(usize, usize), IndexSet<Variable>> = IndexMap::new();

    for (i, terminal) in chars.iter().enumerate() {
        let derivers: IndexSet<Variable> = grammar
            .rules()
            .iter()
            .filter(|r| {
                matches!(r.alternative.symbols(), [Sym::Term(t)] if t == terminal)
            })
            .map(|r| r.variable.clone())
            .collect();
        cells.insert((i, i), derivers);
    }

    for span in 1..n {
        for i in 0..n - span {
            let j = i + span;
            let mut derivers = IndexSet::new();
            for k in i..j {
                let left = &cells[&(i, k)];
                let right = &cells[&(k + 1, j)];
                for rule in grammar.rules() {
                    if let [Sym::Var(b), Sym::Var(c)] = rule.alternative.symbols() {
                        if left.contains(b) && right.contains(c) {
                            derivers.insert(rule.variable.clone());
                        }
                    }
                }
            }
            cells.insert((i, j), derivers);
        }
    }

    Ok(CykTable { n, cells })
}

/// Whether the expanded variable is replaced at its leftmost or rightmost
/// occurrence when a derivation is linearized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivationOrder {
    Leftmost,
    Rightmost,
}

/// One step of a derivation: a sentential form.
pub type SententialForm = Vec<Sym>;

/// Extract one derivation of `word` as a sequence of sentential forms,
/// starting at `[S]` and ending at the word itself.
///
/// When several productions witness a table entry, the first one in rule
/// declaration order wins. That makes the result deterministic but not
/// canonical: it is one derivation among possibly many, and tests must
/// not assume a particular tree beyond this policy.
pub fn derive_word(
    grammar: &Cfg,
    word: &str,
    order: DerivationOrder,
) -> Result<Vec<SententialForm>, DeriveError> {
    let table = cyk_matrix(grammar, word)?;
    let start = grammar.start().clone();

    if word.is_empty() {
        let has_epsilon_rule = grammar
            .rules()
            .iter()
            .any(|r| r.variable == start && r.is_epsilon());
        if !has_epsilon_rule {
            return Err(DeriveError::WordNotInLanguage(word.to_string()));
        }
        return Ok(vec![vec![Sym::Var(start)], Vec::new()]);
    }
    if !table.accepted(&start) {
        return Err(DeriveError::WordNotInLanguage(word.to_string()));
    }

    // parse tree in an arena; spans are half-open
    struct Node {
        sym: Sym,
        children: Vec<usize>,
    }
    let chars: Vec<Terminal> = word.chars().map(Terminal::from).collect();
    let n = chars.len();
    let mut nodes = vec![Node {
        sym: Sym::Var(start.clone()),
        children: Vec::new(),
    }];
    let mut todo: Vec<(usize, usize, usize)> = vec![(0, 0, n)];

    while let Some((index, p, q)) = todo.pop() {
        let Sym::Var(variable) = nodes[index].sym.clone() else {
            continue;
        };
        if q - p == 1 {
            let leaf = nodes.len();
            nodes.push(Node {
                sym: Sym::Term(chars[p].clone()),
                children: Vec::new(),
            });
            nodes[index].children.push(leaf);
            continue;
        }
        let witness = (p + 1..q)
            .find_map(|m| {
                grammar
                    .rules()
                    .iter()
                    .filter(|r| r.variable == variable)
                    .find_map(|r| match r.alternative.symbols() {
                        [Sym::Var(b), Sym::Var(c)]
                            if table.cell(p, m - 1).contains(b)
                                && table.cell(m, q - 1).contains(c) =>
                        {
                            Some((b.clone(), c.clone(), m))
                        }
                        _ => None,
                    })
            })
            .expect("accepted span has a witnessing production");
        let (b, c, m) = witness;
        let left = nodes.len();
        nodes.push(Node {
            sym: Sym::Var(b),
            children: Vec::new(),
        });
        let right = nodes.len();
        nodes.push(Node {
            sym: Sym::Var(c),
            children: Vec::new(),
        });
        nodes[index].children.push(left);
        nodes[index].children.push(right);
        todo.push((left, p, m));
        todo.push((right, m, q));
    }

    // linearize the tree into sentential forms
    let mut form: SententialForm = vec![Sym::Var(start)];
    let mut result = vec![form.clone()];
    let mut agenda: Vec<usize> = vec![0];
    while !agenda.is_empty() {
        let index = match order {
            DerivationOrder::Leftmost => agenda.remove(0),
            DerivationOrder::Rightmost => agenda.pop().expect("agenda is non-empty"),
        };
        let node = &nodes[index];
        if node.children.is_empty() {
            continue;
        }
        let replacement: Vec<Sym> = node
            .children
            .iter()
            .map(|child| nodes[*child].sym.clone())
            .collect();
        let position = match order {
            DerivationOrder::Leftmost => form
                .iter()
                .position(|s| *s == node.sym)
                .expect("expanded symbol occurs in the form"),
            DerivationOrder::Rightmost => form
                .iter()
                .rposition(|s| *s == node.sym)
                .expect("expanded symbol occurs in the form"),
        };
        form.splice(position..position + 1, replacement);
        result.push(form.clone());
        match order {
            DerivationOrder::Leftmost => {
                for (offset, child) in node.children.clone().into_iter().enumerate() {
                    agenda.insert(offset, child);
                }
            }
            DerivationOrder::Rightmost => {
                agenda.extend(node.children.clone());
            }
        }
    }

    Ok(result)
}

impl Cfg {
    /// Membership via CYK. A grammar that is not yet in Chomsky normal
    /// form is converted on a private copy first — this is the documented
    /// convenience entry point, unlike [`cyk_matrix`] which refuses.
    pub fn accepts(&self, word: &str) -> bool {
        if !self.is_chomsky() {
            return to_chomsky(self).accepts(word);
        }
        if word.is_empty() {
            return self
                .rules()
                .iter()
                .any(|r| r.variable == *self.start() && r.is_epsilon());
        }
        cyk_matrix(self, word)
            .expect("grammar is in Chomsky form")
            .accepted(self.start())
    }

    /// All generated words of length at most `n`, enumerated over the
    /// Chomsky form by expanding sentential forms of variables.
    pub fn words_up_to(&self, n: usize) -> BTreeSet<String> {
        if !self.is_chomsky() {
            return to_chomsky(self).words_up_to(n);
        }

        let mut words = BTreeSet::new();
        if self
            .rules()
            .iter()
            .any(|r| r.variable == *self.start() && r.is_epsilon())
        {
            words.insert(String::new());
        }
        if n == 0 {
            return words;
        }

        // unit terminal productions and binary variable productions
        let mut unit: IndexMap<Variable, Vec<Terminal>> = IndexMap::new();
        let mut binary: IndexMap<Variable, Vec<[Variable; 2]>> = IndexMap::new();
        for rule in self.rules() {
            match rule.alternative.symbols() {
                [Sym::Term(t)] => unit
                    .entry(rule.variable.clone())
                    .or_default()
                    .push(t.clone()),
                [Sym::Var(b), Sym::Var(c)] => binary
                    .entry(rule.variable.clone())
                    .or_default()
                    .push([b.clone(), c.clone()]),
                _ => {}
            }
        }

        // every word readable off a fully variable form
        fn terminal_words(
            form: &[Variable],
            unit: &IndexMap<Variable, Vec<Terminal>>,
        ) -> BTreeSet<String> {
            let Some((head, tail)) = form.split_first() else {
                return BTreeSet::from([String::new()]);
            };
            let heads: Vec<&Terminal> = unit.get(head).map(|ts| ts.iter().collect()).unwrap_or_default();
            let tails = terminal_words(tail, unit);
            heads
                .iter()
                .flat_map(|t| {
                    tails
                        .iter()
                        .map(move |w| format!("{}{w}", t.as_str()))
                })
                .collect()
        }

        let mut forms: BTreeSet<Vec<Variable>> = BTreeSet::from([vec![self.start().clone()]]);
        words.extend(terminal_words(&[self.start().clone()], &unit));

        for _ in 2..=n {
            let mut next: BTreeSet<Vec<Variable>> = BTreeSet::new();
            for form in &forms {
                for (position, variable) in form.iter().enumerate() {
                    for [b, c] in binary.get(variable).into_iter().flatten() {
                        let mut expanded = Vec::with_capacity(form.len() + 1);
                        expanded.extend(form[..position].iter().cloned());
                        expanded.push(b.clone());
                        expanded.push(c.clone());
                        expanded.extend(form[position + 1..].iter().cloned());
                        next.insert(expanded);
                    }
                }
            }
            for form in &next {
                words.extend(terminal_words(form, &unit));
            }
            forms = next;
        }

        words
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::testing::grammar;
    use crate::language;

    /// The Chomsky-form grammar from Sipser used throughout: it generates
    /// "baaba" among others.
    fn sipser_grammar() -> Cfg {
        grammar("S -> AB | BC\nA -> BA | a\nB -> CC | b\nC -> AB | a")
    }

    #[test]
    fn test_cyk_matrix_baaba() {
        let g = sipser_grammar();
        assert!(g.is_chomsky());
        let table = cyk_matrix(&g, "baaba").unwrap();

        // the classical table for this word, bottom row first
        let cell = |i: usize, j: usize| {
            let mut labels: Vec<String> =
                table.cell(i, j).iter().map(|v| v.to_string()).collect();
            labels.sort();
            labels.join(",")
        };
        assert_eq!(cell(0, 0), "B");
        assert_eq!(cell(1, 1), "A,C");
        assert_eq!(cell(2, 2), "A,C");
        assert_eq!(cell(3, 3), "B");
        assert_eq!(cell(4, 4), "A,C");
        assert_eq!(cell(0, 1), "A,S");
        assert_eq!(cell(1, 2), "B");
        assert_eq!(cell(2, 3), "C,S");
        assert_eq!(cell(3, 4), "A,S");
        assert_eq!(cell(0, 2), "");
        assert_eq!(cell(1, 3), "B");
        assert_eq!(cell(2, 4), "B");
        assert_eq!(cell(0, 3), "");
        assert_eq!(cell(1, 4), "A,C,S");
        assert_eq!(cell(0, 4), "A,C,S");
        assert!(table.accepted(g.start()));
    }

    #[test]
    fn test_cyk_requires_chomsky() {
        let g = grammar("S -> aSb | _");
        assert!(matches!(
            cyk_matrix(&g, "ab"),
            Err(PreconditionError::NotChomsky(_))
        ));
    }

    #[test]
    fn test_accepts_word() {
        let g = sipser_grammar();
        assert!(g.accepts("baaba"));
        assert!(!g.accepts("baab"));

        // auto-conversion convenience for non-Chomsky grammars
        let g = grammar("S -> aSb | _");
        assert!(g.accepts(""));
        assert!(g.accepts("ab"));
        assert!(g.accepts("aabb"));
        assert!(!g.accepts("abab"));

        let g = grammar("S -> AS | b\nA -> a");
        assert!(g.accepts("b"));
        assert!(g.accepts("ab"));
        assert!(!g.accepts("a"));
    }

    #[test]
    fn test_empty_word_is_a_distinct_case() {
        let g = grammar("S -> _");
        assert!(g.accepts(""));
        let g = grammar("S -> a");
        assert!(!g.accepts(""));
    }

    #[test]
    fn test_derive_word_leftmost() {
        let g = grammar("S -> AB\nA -> a\nB -> b");
        let forms = derive_word(&g, "ab", DerivationOrder::Leftmost).unwrap();
        let rendered: Vec<String> = forms
            .iter()
            .map(|form| {
                form.iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .collect();
        assert_eq!(rendered, ["S", "AB", "aB", "ab"]);
    }

    #[test]
    fn test_derive_word_rightmost() {
        let g = grammar("S -> AB\nA -> a\nB -> b");
        let forms = derive_word(&g, "ab", DerivationOrder::Rightmost).unwrap();
        let rendered: Vec<String> = forms
            .iter()
            .map(|form| {
                form.iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .collect();
        assert_eq!(rendered, ["S", "AB", "Ab", "ab"]);
    }

    #[test]
    fn test_derive_word_ends_at_word() {
        let g = sipser_grammar();
        let forms = derive_word(&g, "baaba", DerivationOrder::Leftmost).unwrap();
        assert_eq!(forms.first().unwrap(), &vec![Sym::Var(Variable::from("S"))]);
        let last: String = forms
            .last()
            .unwrap()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(last, "baaba");
        // leftmost: each step rewrites at or after the frontier of terminals
        for window in forms.windows(2) {
            assert!(window[1].len() >= window[0].len());
        }
    }

    #[test]
    fn test_derive_word_rejects_outside_language() {
        let g = sipser_grammar();
        assert!(matches!(
            derive_word(&g, "bb", DerivationOrder::Leftmost),
            Err(DeriveError::WordNotInLanguage(_))
        ));
        assert!(matches!(
            derive_word(&g, "", DerivationOrder::Leftmost),
            Err(DeriveError::WordNotInLanguage(_))
        ));
    }

    #[test]
    fn test_words_up_to_agrees_with_membership() {
        let g = grammar("S -> T | U\nT -> aTb | _\nU -> bUa | _");
        let bound = 5;
        let words = g.words_up_to(bound);
        assert!(words.iter().all(|w| w.chars().count() <= bound));
        for word in language::words_up_to(
            &[crate::symbol::Symbol::from("a"), crate::symbol::Symbol::from("b")]
                .into_iter()
                .collect(),
            bound,
        ) {
            assert_eq!(g.accepts(&word), words.contains(&word), "word {word}");
        }
    }

    #[test]
    fn test_table_display_is_triangular() {
        let g = sipser_grammar();
        let table = cyk_matrix(&g, "ab").unwrap();
        let text = table.to_string();
        assert_eq!(text.lines().count(), 2);
    }
}
