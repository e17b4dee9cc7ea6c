//! Fact store: ground facts compiled into per-predicate relations.
//!
//! Each [`Relation`] is a table of rows; a row holds the argument values of
//! one fact and its weight. Duplicate facts are kept as separate rows and
//! contribute independently to weight aggregation.
//!
//! [`FactView`] is the read-only window the prover works through. It can
//! hide one row, which is how leave-one-out proving excludes the example
//! under evaluation from a recursive target relation.

use std::collections::HashMap;

use crate::error::GrammarResult;
use crate::grammar::parse_facts;
use crate::term::{Fact, Predicate, UsageHints};

// ---------------------------------------------------------------------------
// Relations
// ---------------------------------------------------------------------------

/// One fact as a table row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub values: Vec<String>,
    pub weight: f64,
}

/// All rows of one predicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Relation {
    rows: Vec<Row>,
}

impl Relation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the relation has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of the weight column.
    pub fn total_weight(&self) -> f64 {
        self.rows.iter().map(|r| r.weight).sum()
    }
}

// ---------------------------------------------------------------------------
// Fact store
// ---------------------------------------------------------------------------

/// Background knowledge grouped by predicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactStore {
    relations: HashMap<Predicate, Relation>,
}

impl FactStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile facts into relations.
    pub fn compile(facts: impl IntoIterator<Item = Fact>) -> Self {
        let mut store = Self::new();
        store.extend(facts);
        store
    }

    /// Parse fact lines and compile them.
    pub fn from_lines<I, S>(lines: I) -> GrammarResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::compile(parse_facts(lines)?))
    }

    /// Append one fact as a new row of its predicate's relation.
    pub fn insert(&mut self, fact: Fact) {
        self.relations.entry(fact.predicate).or_default().push(Row {
            values: fact.arguments,
            weight: fact.weight,
        });
    }

    /// Append facts, creating relations as needed.
    pub fn extend(&mut self, facts: impl IntoIterator<Item = Fact>) {
        for fact in facts {
            self.insert(fact);
        }
    }

    /// Union of the rows of both stores.
    pub fn merge(&self, other: &FactStore) -> FactStore {
        let mut merged = self.clone();
        for (predicate, relation) in &other.relations {
            let target = merged.relations.entry(predicate.clone()).or_default();
            for row in relation.rows() {
                target.push(row.clone());
            }
        }
        merged
    }

    pub fn relation(&self, predicate: &Predicate) -> Option<&Relation> {
        self.relations.get(predicate)
    }

    pub fn predicates(&self) -> impl Iterator<Item = &Predicate> {
        self.relations.keys()
    }

    /// Number of relations.
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    /// Whether the store holds no relations.
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Row count per predicate, used to order candidate literals.
    pub fn usage_hints(&self) -> UsageHints {
        self.relations
            .iter()
            .map(|(p, r)| (p.clone(), r.len()))
            .collect()
    }

    /// A view of the whole store.
    pub fn view(&self) -> FactView<'_> {
        FactView {
            store: self,
            excluded: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// One row of one relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowRef {
    pub predicate: Predicate,
    pub index: usize,
}

/// Read-only view of a store, optionally hiding one row.
#[derive(Debug, Clone, Copy)]
pub struct FactView<'a> {
    store: &'a FactStore,
    excluded: Option<&'a RowRef>,
}

impl<'a> FactView<'a> {
    /// The same view with `row` hidden.
    pub fn excluding(self, row: &'a RowRef) -> Self {
        Self {
            store: self.store,
            excluded: Some(row),
        }
    }

    pub fn store(&self) -> &'a FactStore {
        self.store
    }

    /// Visible rows of a predicate, or `None` when it has no relation.
    pub fn rows(&self, predicate: &Predicate) -> Option<impl Iterator<Item = &'a Row> + 'a> {
        let relation = self.store.relation(predicate)?;
        let hidden = self
            .excluded
            .filter(|r| &r.predicate == predicate)
            .map(|r| r.index);
        Some(
            relation
                .rows()
                .iter()
                .enumerate()
                .filter(move |(i, _)| Some(*i) != hidden)
                .map(|(_, row)| row),
        )
    }
}
