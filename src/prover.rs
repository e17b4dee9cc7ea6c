//! Deductive matcher: evaluate a clause against a fact store.
//!
//! Proving is a single forward pass of relational filtering. Each literal
//! restricts its relation to the rows compatible with the current bindings,
//! then rebinds every named variable it mentions to the values seen in the
//! surviving rows (latest wins). A literal with no surviving rows ends the
//! pass: it and every later literal score zero. There is no backtracking.
//!
//! Weighted proving runs two passes. The first derives bindings while
//! ignoring weights; the second starts from those bindings and reports, per
//! literal, the mean weight of the rows that survive.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::store::{FactStore, FactView, Row};
use crate::term::{ANONYMOUS, Literal, Term};

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// Admissible ground values per variable name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    values: HashMap<String, BTreeSet<String>>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind each head variable to the example argument at the same position.
    pub fn from_head<V, A>(variables: &[V], arguments: &[A]) -> Self
    where
        V: AsRef<str>,
        A: AsRef<str>,
    {
        variables
            .iter()
            .zip(arguments)
            .map(|(v, a)| (v.as_ref().to_string(), [a.as_ref().to_string()]))
            .collect()
    }

    /// Replace the values bound to `name`.
    pub fn bind(&mut self, name: impl Into<String>, values: BTreeSet<String>) {
        self.values.insert(name.into(), values);
    }

    pub fn get(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S, I> FromIterator<(S, I)> for Bindings
where
    S: Into<String>,
    I: IntoIterator,
    I::Item: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (S, I)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(name, values)| {
                    let values = values.into_iter().map(Into::into).collect();
                    (name.into(), values)
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Prover
// ---------------------------------------------------------------------------

/// How match strength is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weighting {
    /// Single pass; a matched literal scores 1.0. Used during clause search.
    Ignore,
    /// Two passes; a matched literal scores the mean weight of its rows.
    Weighted,
}

/// Column constraint for one literal argument.
enum Constraint<'b> {
    Exact(&'b str),
    OneOf(&'b BTreeSet<String>),
}

impl Constraint<'_> {
    fn admits(&self, value: &str) -> bool {
        match self {
            Constraint::Exact(expected) => *expected == value,
            Constraint::OneOf(values) => values.contains(value),
        }
    }
}

/// Evaluates clauses against a fact view.
#[derive(Debug, Clone, Copy)]
pub struct Prover<'a> {
    view: FactView<'a>,
}

impl<'a> Prover<'a> {
    pub fn new(store: &'a FactStore) -> Self {
        Self { view: store.view() }
    }

    pub fn with_view(view: FactView<'a>) -> Self {
        Self { view }
    }

    /// Per-literal match strength of `clause` under the initial bindings.
    pub fn prove(&self, initial: &Bindings, clause: &[Literal], weighting: Weighting) -> Vec<f64> {
        let (strengths, settled) = self.propagate(initial, clause, false);
        match weighting {
            Weighting::Ignore => strengths,
            Weighting::Weighted => self.propagate(&settled, clause, true).0,
        }
    }

    /// One forward pass. Returns the strengths and the final bindings.
    fn propagate(
        &self,
        seed: &Bindings,
        clause: &[Literal],
        weighted: bool,
    ) -> (Vec<f64>, Bindings) {
        let mut bindings = seed.clone();
        let mut strengths = vec![0.0; clause.len()];

        for (index, literal) in clause.iter().enumerate() {
            let Some(rows) = self.view.rows(&literal.predicate) else {
                tracing::trace!(literal = %literal, "no relation for predicate");
                return (strengths, bindings);
            };

            let matched: Vec<&Row> = {
                let constraints: Vec<(usize, Constraint<'_>)> = literal
                    .arguments
                    .iter()
                    .enumerate()
                    .filter_map(|(i, arg)| match arg {
                        Term::Constant(value) => Some((i, Constraint::Exact(value))),
                        Term::Variable(name) if name != ANONYMOUS => {
                            bindings.get(name).map(|values| (i, Constraint::OneOf(values)))
                        }
                        Term::Variable(_) => None,
                    })
                    .collect();

                rows.filter(|row| {
                    constraints.iter().all(|(i, constraint)| {
                        row.values.get(*i).is_some_and(|v| constraint.admits(v))
                    })
                })
                .collect()
            };

            if matched.is_empty() {
                tracing::trace!(literal = %literal, index, "literal failed");
                return (strengths, bindings);
            }

            for (i, arg) in literal.arguments.iter().enumerate() {
                if let Term::Variable(name) = arg {
                    if name != ANONYMOUS {
                        let column = matched
                            .iter()
                            .filter_map(|row| row.values.get(i).cloned())
                            .collect();
                        bindings.bind(name.as_str(), column);
                    }
                }
            }

            strengths[index] = if weighted {
                let total: f64 = matched.iter().map(|r| r.weight).sum();
                total / matched.len() as f64
            } else {
                1.0
            };
        }

        (strengths, bindings)
    }
}
