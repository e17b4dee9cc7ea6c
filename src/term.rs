//! Core term types for the rule learner.
//!
//! A [`Term`] is either a logical variable or a ground constant. Literals
//! apply a [`Predicate`] to terms, a [`Clause`] is an ordered conjunction of
//! literals, and a [`Fact`] is a ground, weighted atom from the fact base or
//! the example set.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Name reserved for the anonymous variable: bound while proving, never reused.
pub const ANONYMOUS: &str = "_";

// ---------------------------------------------------------------------------
// Term
// ---------------------------------------------------------------------------

/// A literal argument: a logical variable or a ground constant.
///
/// Equality and hashing consider both the variant and the name, so
/// `Variable("a")` and `Constant("a")` are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    Variable(String),
    Constant(String),
}

impl Term {
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    /// Create a constant. Double quotes are stripped from the name; they are
    /// added back when the constant is printed.
    pub fn constant(name: impl AsRef<str>) -> Self {
        Self::Constant(name.as_ref().replace('"', ""))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Variable(name) | Self::Constant(name) => name,
        }
    }

    pub fn is_ground(&self) -> bool {
        matches!(self, Self::Constant(_))
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_))
    }

    /// `true` for the anonymous variable `_`.
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Variable(name) if name == ANONYMOUS)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(name) => write!(f, "{name}"),
            Self::Constant(name) => write!(f, "\"{name}\""),
        }
    }
}

// ---------------------------------------------------------------------------
// Predicate
// ---------------------------------------------------------------------------

/// A relation name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Predicate(String);

impl Predicate {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Predicate {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

// ---------------------------------------------------------------------------
// Literal
// ---------------------------------------------------------------------------

/// Usage-frequency hints per predicate, consulted when ordering candidates.
pub type UsageHints = HashMap<Predicate, usize>;

/// One relation application with concrete argument terms.
///
/// A literal carries no weight of its own. Weights live on the [`Fact`] rows
/// it matches: weighted proving reports the mean weight of those rows, so an
/// unweighted fact contributes the default `1.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    pub predicate: Predicate,
    pub arguments: Vec<Term>,
}

impl Literal {
    pub fn new(predicate: impl Into<Predicate>, arguments: Vec<Term>) -> Self {
        Self {
            predicate: predicate.into(),
            arguments,
        }
    }

    pub fn constant_count(&self) -> usize {
        self.arguments.iter().filter(|t| t.is_ground()).count()
    }

    /// Argument positions not filled by a constant.
    pub fn open_positions(&self) -> usize {
        self.arguments.len() - self.constant_count()
    }

    /// Named variables of this literal, in argument order, excluding `_`.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.arguments.iter().filter_map(|t| match t {
            Term::Variable(name) if name != ANONYMOUS => Some(name.as_str()),
            _ => None,
        })
    }

    /// Search order for candidate literals: fewer open positions first, then
    /// more constants first, then the usage hint of the predicate (absent
    /// hints sort last). Remaining ties fall back to the structural order so
    /// the result is total.
    pub fn search_cmp(&self, other: &Self, hints: &UsageHints) -> Ordering {
        let hint = |l: &Literal| {
            hints
                .get(&l.predicate)
                .copied()
                .unwrap_or(usize::MAX)
        };
        self.open_positions()
            .cmp(&other.open_positions())
            .then_with(|| other.constant_count().cmp(&self.constant_count()))
            .then_with(|| hint(self).cmp(&hint(other)))
            .then_with(|| self.cmp(other))
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.predicate)?;
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

// ---------------------------------------------------------------------------
// Clause
// ---------------------------------------------------------------------------

/// An ordered conjunction of body literals.
///
/// The head is implicit: it is supplied as the initial variable bindings when
/// the clause is proved against an example.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    pub fn new(literals: Vec<Literal>) -> Self {
        Self { literals }
    }

    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn push(&mut self, literal: Literal) {
        self.literals.push(literal);
    }

    /// This clause followed by one more literal.
    pub fn extended(&self, literal: Literal) -> Self {
        let mut literals = Vec::with_capacity(self.literals.len() + 1);
        literals.extend_from_slice(&self.literals);
        literals.push(literal);
        Self { literals }
    }

    /// Distinct named variables, in order of first occurrence.
    pub fn variables(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for name in self.literals.iter().flat_map(Literal::variables) {
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
        seen
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Literal> {
        self.literals.iter()
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, literal) in self.literals.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{literal}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Clause {
    type Item = &'a Literal;
    type IntoIter = std::slice::Iter<'a, Literal>;

    fn into_iter(self) -> Self::IntoIter {
        self.literals.iter()
    }
}

impl From<Vec<Literal>> for Clause {
    fn from(literals: Vec<Literal>) -> Self {
        Self::new(literals)
    }
}

// ---------------------------------------------------------------------------
// Fact
// ---------------------------------------------------------------------------

/// A ground, weighted atom: one background fact or one training example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub weight: f64,
    pub predicate: Predicate,
    pub arguments: Vec<String>,
}

/// Training examples share the fact representation; their predicate must be
/// the learning target.
pub type Example = Fact;

impl Fact {
    /// Create a fact with the default weight of 1.0.
    pub fn new(predicate: impl Into<Predicate>, arguments: Vec<String>) -> Self {
        Self {
            weight: 1.0,
            predicate: predicate.into(),
            arguments,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn arity(&self) -> usize {
        self.arguments.len()
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}({}).", self.weight, self.predicate, self.arguments.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Term {
        Term::variable(name)
    }

    #[test]
    fn variable_display_is_raw() {
        let a = var("A");
        assert_eq!(a.name(), "A");
        assert!(!a.is_ground());
        assert_eq!(a.to_string(), "A");
    }

    #[test]
    fn constant_display_is_quoted_and_strips_quotes() {
        let c = Term::constant("const");
        assert!(c.is_ground());
        assert_eq!(c.to_string(), "\"const\"");
        assert_eq!(Term::constant("\"const\""), c);
    }

    #[test]
    fn variable_and_constant_with_same_name_differ() {
        assert_ne!(var("a"), Term::constant("a"));
    }

    #[test]
    fn anonymous_variable_is_detected() {
        assert!(var("_").is_anonymous());
        assert!(!var("A").is_anonymous());
        assert!(!Term::constant("_").is_anonymous());
    }

    #[test]
    fn literal_display() {
        let lit = Literal::new("relation", vec![var("A"), var("B")]);
        assert_eq!(lit.to_string(), "relation(A, B)");
        let lit = Literal::new("gender", vec![var("A"), Term::constant("male")]);
        assert_eq!(lit.to_string(), "gender(A, \"male\")");
    }

    #[test]
    fn literal_variables_skip_anonymous_and_constants() {
        let lit = Literal::new("r", vec![var("_"), var("A"), Term::constant("c")]);
        assert_eq!(lit.variables().collect::<Vec<_>>(), vec!["A"]);
        assert_eq!(lit.open_positions(), 2);
        assert_eq!(lit.constant_count(), 1);
    }

    #[test]
    fn search_order_prefers_fewer_open_positions_then_constants() {
        let hints = UsageHints::new();
        let one_open = Literal::new("p", vec![var("A")]);
        let two_open = Literal::new("q", vec![var("A"), var("B")]);
        let one_open_with_const = Literal::new("r", vec![var("A"), Term::constant("c")]);

        assert_eq!(one_open.search_cmp(&two_open, &hints), Ordering::Less);
        assert_eq!(
            one_open_with_const.search_cmp(&one_open, &hints),
            Ordering::Less
        );
    }

    #[test]
    fn search_order_puts_unhinted_predicates_last() {
        let mut hints = UsageHints::new();
        hints.insert(Predicate::new("z"), 40);
        let hinted = Literal::new("z", vec![var("A")]);
        let unhinted = Literal::new("a", vec![var("A")]);
        assert_eq!(hinted.search_cmp(&unhinted, &hints), Ordering::Less);
    }

    #[test]
    fn clause_display_joins_literals() {
        let clause = Clause::new(vec![
            Literal::new("childof", vec![var("B"), var("A")]),
            Literal::new("male", vec![var("B")]),
        ]);
        assert_eq!(clause.to_string(), "childof(B, A), male(B)");
        assert_eq!(clause.variables(), vec!["B", "A"]);
    }

    #[test]
    fn fact_defaults_to_unit_weight() {
        let fact = Fact::new("relation", vec!["a".into(), "b".into()]);
        assert_eq!(fact.weight, 1.0);
        assert_eq!(fact.arity(), 2);
        assert_eq!(fact.clone().with_weight(2.3).weight, 2.3);
    }
}
